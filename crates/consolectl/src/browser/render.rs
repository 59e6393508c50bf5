use super::columns::Column;
use super::fetch::FetchState;
use super::filter::MessageQuery;
use super::table::{DetailTab, Selection, TableState};
use console_models::Message;
use std::fmt::Write;

/// Number of characters of a key shown in the messages table.
pub const KEY_PREVIEW_CHARS: usize = 40;
/// Number of characters of a value shown in the messages table.
pub const VALUE_PREVIEW_CHARS: usize = 149;

const EMPTY: &str = "-";

/// Preview `text` in at most `max` characters, followed by an ellipsis
/// if it was truncated. Line breaks are shown as spaces.
pub fn preview(text: Option<&str>, max: usize) -> String {
    let text = match text {
        Some(text) if !text.is_empty() => text,
        _ => return EMPTY.to_string(),
    };

    let mut out: String = text
        .chars()
        .take(max)
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect();

    if text.chars().nth(max).is_some() {
        out.push('…');
    }
    out
}

/// Render the table cell of `message` for `column`.
pub fn cell(message: &Message, column: Column) -> String {
    match column {
        Column::OffsetPartition => format!("{} / {}", message.offset, message.partition),
        Column::Size => ::size::Size::from_bytes(message.size).to_string(),
        Column::Key => preview(message.key.as_deref(), KEY_PREVIEW_CHARS),
        Column::Timestamp => message
            .timestamp
            .with_timezone(&chrono::Local)
            .format("%Y-%m-%d %H:%M:%S%.3f %:z")
            .to_string(),
        Column::TimestampUtc => message
            .timestamp
            .format("%Y-%m-%d %H:%M:%S%.3fZ")
            .to_string(),
        Column::Headers if message.headers.is_empty() => EMPTY.to_string(),
        Column::Headers => serde_json::to_string(&message.headers).unwrap_or_default(),
        Column::Value => preview(message.value.as_deref(), VALUE_PREVIEW_CHARS),
    }
}

/// Render `messages` as a table of the visible columns of `state`,
/// marking the selected message.
pub fn messages_table(messages: &[Message], state: &TableState) -> comfy_table::Table {
    let columns = state.visible_columns();

    let mut headers = vec![""];
    headers.extend(columns.iter().map(Column::header));
    let mut table = crate::new_table(headers);

    for message in messages {
        let marker = if state.is_selected(message) { "▶" } else { "" };
        let mut row = vec![marker.to_string()];
        row.extend(columns.iter().map(|column| cell(message, *column)));
        table.add_row(row);
    }
    table
}

/// Render the detail panel of the selected message.
pub fn detail(selection: &Selection) -> String {
    let Selection { message, tab } = selection;
    let mut out = String::new();

    let tabs = [
        (DetailTab::Value, "value"),
        (DetailTab::Key, "key"),
        (DetailTab::Headers, "headers"),
    ]
    .into_iter()
    .map(|(t, name)| if t == *tab { format!("[{name}]") } else { name.to_string() })
    .collect::<Vec<_>>()
    .join(" ");

    _ = writeln!(
        out,
        "Message at offset {} of partition {}    {tabs}",
        message.offset, message.partition
    );
    _ = writeln!(
        out,
        "Timestamp: {}{}",
        message.timestamp.to_rfc3339(),
        message
            .timestamp_type
            .as_ref()
            .map(|t| format!(" ({t})"))
            .unwrap_or_default(),
    );
    _ = writeln!(out, "Size: {}", ::size::Size::from_bytes(message.size));
    out.push('\n');

    let body = match tab {
        DetailTab::Value => pretty(message.value.as_deref()),
        DetailTab::Key => pretty(message.key.as_deref()),
        DetailTab::Headers if message.headers.is_empty() => EMPTY.to_string(),
        DetailTab::Headers => serde_json::to_string_pretty(&message.headers).unwrap_or_default(),
    };
    out.push_str(&body);
    out
}

// Pretty-print `text` if it's JSON, or else return it as-is.
fn pretty(text: Option<&str>) -> String {
    let Some(text) = text.filter(|t| !t.is_empty()) else {
        return EMPTY.to_string();
    };
    serde_json::from_str::<serde_json::Value>(text)
        .ok()
        .and_then(|doc| serde_json::to_string_pretty(&doc).ok())
        .unwrap_or_else(|| text.to_string())
}

/// Render the status line of a browsing session.
pub fn status(topic: &str, query: &MessageQuery, state: &FetchState, paused: bool) -> String {
    let mut parts = vec![
        topic.to_string(),
        match query.partition {
            Some(partition) => format!("partition {partition}"),
            None => "all partitions".to_string(),
        },
        query.filter.to_string(),
        format!("limit {}", query.limit),
        format!("{} messages", state.messages.len()),
    ];

    if state.is_refreshing {
        parts.push("refreshing…".to_string());
    }
    if let Some(updated) = state.last_updated {
        parts.push(format!(
            "updated {}",
            updated.with_timezone(&chrono::Local).format("%H:%M:%S")
        ));
    }
    if paused {
        parts.push("paused".to_string());
    }
    if let Some(err) = &state.last_error {
        parts.push(err.to_string());
    }
    parts.join(" | ")
}
