use super::columns::{self, Column};
use super::fetch::{FetchCoordinator, FetchState, MessageSource, PollHandle};
use super::filter::FilterKind;
use super::table::DetailTab;
use super::{render, MessageBrowser, PreferenceStore};
use anyhow::Context;
use console_models::{Message, MessageId};
use std::io::Write;
use std::num::NonZeroU32;
use std::time::Duration;
use tokio::io::AsyncBufReadExt;

pub const HELP: &str = "\
Commands:
  offset <n>                    Show messages from offset <n>
  timestamp <rfc3339>           Show messages from a point in time
  epoch <seconds>               Show messages from seconds since the Unix epoch
  latest                        Show the latest messages
  partition <n>|all             Show a single partition, or all partitions
  limit <n>                     Show at most <n> messages
  select <partition> <offset> [value|key|headers]
                                Show the details of a message
  deselect                      Close the message details
  columns <id>...|reset         Choose the columns of the table
  refresh                       Fetch messages now
  pause | resume                Stop or restart periodic refreshes
  help                          Show this help
  quit                          Exit the browser";

/// SessionCommand is a command of an interactive browsing session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    Filter(FilterKind, String),
    Latest,
    Partition(Option<i32>),
    Limit(NonZeroU32),
    Select(MessageId, Option<DetailTab>),
    Deselect,
    Columns(Vec<Column>),
    ResetColumns,
    Refresh,
    Pause,
    Resume,
    Help,
    Quit,
}

impl std::str::FromStr for SessionCommand {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let command = words.next().unwrap_or_default();
        let args: Vec<&str> = words.collect();

        let cmd = match (command, args.as_slice()) {
            ("offset", args) => SessionCommand::Filter(FilterKind::Offset, args.join(" ")),
            ("timestamp", args) => SessionCommand::Filter(FilterKind::Timestamp, args.join(" ")),
            ("epoch", args) => SessionCommand::Filter(FilterKind::Epoch, args.join(" ")),
            ("latest", []) => SessionCommand::Latest,
            ("partition", ["all"]) => SessionCommand::Partition(None),
            ("partition", [partition]) => SessionCommand::Partition(Some(
                partition
                    .parse()
                    .map_err(|_| format!("invalid partition '{partition}'"))?,
            )),
            ("limit", [limit]) => SessionCommand::Limit(
                limit
                    .parse()
                    .map_err(|_| format!("invalid limit '{limit}': expected a positive integer"))?,
            ),
            ("select", [partition, offset, tab @ ..]) if tab.len() <= 1 => {
                let id = MessageId {
                    partition: partition
                        .parse()
                        .map_err(|_| format!("invalid partition '{partition}'"))?,
                    offset: offset
                        .parse()
                        .map_err(|_| format!("invalid offset '{offset}'"))?,
                };
                let tab = tab.first().map(|tab| tab.parse()).transpose()?;
                SessionCommand::Select(id, tab)
            }
            ("deselect", []) => SessionCommand::Deselect,
            ("columns", ["reset"]) => SessionCommand::ResetColumns,
            ("columns", ids) if !ids.is_empty() => {
                SessionCommand::Columns(columns::parse_columns(ids)?)
            }
            ("refresh", []) => SessionCommand::Refresh,
            ("pause", []) => SessionCommand::Pause,
            ("resume", []) => SessionCommand::Resume,
            ("help" | "?", []) => SessionCommand::Help,
            ("quit" | "exit", []) => SessionCommand::Quit,
            _ => return Err(format!("unrecognized command '{}', try 'help'", line.trim())),
        };
        Ok(cmd)
    }
}

/// Outcome of handling a SessionCommand.
#[derive(Debug, PartialEq)]
pub enum Outcome {
    /// The session should be re-rendered.
    Render,
    /// A notice should be shown to the user.
    Notice(String),
    Quit,
}

/// Apply `command` to the `browser`, where `messages` are currently listed.
pub fn handle<P: PreferenceStore>(
    browser: &mut MessageBrowser<P>,
    poll: &PollHandle,
    messages: &[Message],
    command: SessionCommand,
) -> anyhow::Result<Outcome> {
    tracing::debug!(?command, "handling session command");

    match command {
        SessionCommand::Filter(kind, raw) => {
            let mode = browser.apply_filter(kind, &raw)?;
            return Ok(Outcome::Notice(format!("showing {mode}")));
        }
        SessionCommand::Latest => browser.set_latest(),
        SessionCommand::Partition(partition) => browser.set_partition(partition)?,
        SessionCommand::Limit(limit) => browser.set_limit(limit),
        SessionCommand::Select(id, tab) => browser.select_message(messages, id, tab)?,
        SessionCommand::Deselect => browser.deselect_message(),
        SessionCommand::Columns(columns) => browser.set_columns(columns),
        SessionCommand::ResetColumns => browser.reset_columns(),
        SessionCommand::Refresh => poll.refresh(),
        SessionCommand::Pause => {
            poll.pause();
            return Ok(Outcome::Notice("paused periodic refreshes".to_string()));
        }
        SessionCommand::Resume => poll.resume(),
        SessionCommand::Help => return Ok(Outcome::Notice(HELP.to_string())),
        SessionCommand::Quit => return Ok(Outcome::Quit),
    }
    Ok(Outcome::Render)
}

/// Render the complete screen of a session.
pub fn screen<P: PreferenceStore>(
    browser: &MessageBrowser<P>,
    state: &FetchState,
    paused: bool,
) -> String {
    let mut out = render::status(browser.topic(), &browser.query(), state, paused);
    out.push('\n');
    out.push_str(&render::messages_table(&state.messages, browser.table()).to_string());
    out.push('\n');

    if let Some(selection) = browser.table().selection() {
        out.push('\n');
        out.push_str(&render::detail(selection));
        out.push('\n');
    }
    out
}

/// Run an interactive session which reads commands from `input`
/// until it's closed or the user quits.
pub async fn run<S, P, R>(
    mut browser: MessageBrowser<P>,
    coordinator: FetchCoordinator<S>,
    interval: Duration,
    input: R,
) -> anyhow::Result<()>
where
    S: MessageSource,
    P: PreferenceStore,
    R: tokio::io::AsyncBufRead + Unpin,
{
    let poll = coordinator.poll(browser.queries(), interval);
    let mut updates = coordinator.subscribe();
    let mut lines = input.lines();

    println!("Browsing messages of '{}'. Type 'help' for commands.", browser.topic());

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = updates.borrow_and_update().clone();
                browser.reconcile(&state.messages);
                print_screen(&screen(&browser, &state, poll.is_paused()))?;
            }
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read command")? else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }

                let command = match line.parse::<SessionCommand>() {
                    Ok(command) => command,
                    Err(err) => {
                        println!("error: {err}");
                        continue;
                    }
                };
                let state = updates.borrow().clone();

                match handle(&mut browser, &poll, &state.messages, command) {
                    Ok(Outcome::Render) => print_screen(&screen(&browser, &state, poll.is_paused()))?,
                    Ok(Outcome::Notice(notice)) => println!("{notice}"),
                    Ok(Outcome::Quit) => break,
                    Err(err) => println!("error: {err:#}"),
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    poll.shutdown().await;
    Ok(())
}

fn print_screen(screen: &str) -> anyhow::Result<()> {
    use crossterm::tty::IsTty;

    let mut stdout = std::io::stdout().lock();
    if stdout.is_tty() {
        crossterm::execute!(
            stdout,
            crossterm::terminal::Clear(crossterm::terminal::ClearType::All),
            crossterm::cursor::MoveTo(0, 0)
        )?;
    }
    stdout.write_all(screen.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::browser::columns::MemoryPreferenceStore;
    use crate::browser::filter::{FilterMode, MessageQuery};
    use crate::browser::table::test::message;
    use console_client::records::RecordsQuery;
    use std::future::Future;

    struct EmptySource;

    impl MessageSource for EmptySource {
        fn fetch(
            &self,
            _query: &RecordsQuery,
        ) -> impl Future<Output = Result<Vec<Message>, console_client::Error>> + Send {
            std::future::ready(Ok(Vec::new()))
        }
    }

    #[test]
    fn commands_parse() {
        let cases = [
            ("offset 10", SessionCommand::Filter(FilterKind::Offset, "10".to_string())),
            ("offset", SessionCommand::Filter(FilterKind::Offset, String::new())),
            ("epoch -1", SessionCommand::Filter(FilterKind::Epoch, "-1".to_string())),
            ("latest", SessionCommand::Latest),
            ("partition all", SessionCommand::Partition(None)),
            ("  partition 2 ", SessionCommand::Partition(Some(2))),
            ("limit 20", SessionCommand::Limit(NonZeroU32::new(20).unwrap())),
            (
                "select 1 40",
                SessionCommand::Select(MessageId { partition: 1, offset: 40 }, None),
            ),
            (
                "select 1 40 headers",
                SessionCommand::Select(
                    MessageId { partition: 1, offset: 40 },
                    Some(DetailTab::Headers),
                ),
            ),
            ("columns offset value", SessionCommand::Columns(vec![Column::OffsetPartition, Column::Value])),
            ("columns reset", SessionCommand::ResetColumns),
            ("quit", SessionCommand::Quit),
        ];
        for (line, expect) in cases {
            assert_eq!(line.parse::<SessionCommand>(), Ok(expect), "{line}");
        }

        for line in ["", "limit 0", "limit", "select 1", "select 1 x", "select 1 2 body", "columns", "columns sparkles", "launch"] {
            assert!(line.parse::<SessionCommand>().is_err(), "{line}");
        }
    }

    #[tokio::test]
    async fn commands_update_the_browser() {
        let mut browser = MessageBrowser::new(
            "orders".to_string(),
            2,
            MessageQuery::default(),
            MemoryPreferenceStore::default(),
        );
        let coordinator = FetchCoordinator::new(EmptySource);
        let poll = coordinator.poll(browser.queries(), Duration::from_secs(60));
        let listed = vec![message(1, 40, "hello")];

        let outcome = handle(&mut browser, &poll, &listed, "timestamp 2024-01-02T03:04:05Z".parse().unwrap());
        assert_eq!(
            outcome.unwrap(),
            Outcome::Notice("showing from 2024-01-02T03:04:05Z".to_string())
        );

        // Invalid input is an error, and changes nothing.
        assert!(handle(&mut browser, &poll, &listed, "offset x".parse().unwrap()).is_err());
        assert!(matches!(browser.query().filter, FilterMode::Timestamp(_)));

        let err = handle(&mut browser, &poll, &listed, "partition 5".parse().unwrap()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "partition 5 is out of range, as the topic has 2 partitions"
        );

        handle(&mut browser, &poll, &listed, "select 1 40".parse().unwrap()).unwrap();
        handle(&mut browser, &poll, &listed, "columns key".parse().unwrap()).unwrap();

        let state = FetchState {
            messages: std::sync::Arc::new(listed.clone()),
            ..Default::default()
        };
        let rendered = screen(&browser, &state, false);
        assert!(rendered.starts_with("orders | all partitions | from 2024-01-02T03:04:05Z"), "{rendered}");
        assert!(rendered.contains("key-40"));
        assert!(rendered.contains("Message at offset 40 of partition 1"));

        handle(&mut browser, &poll, &listed, SessionCommand::Pause).unwrap();
        assert!(poll.is_paused());
        handle(&mut browser, &poll, &listed, SessionCommand::Resume).unwrap();
        assert!(!poll.is_paused());

        assert_eq!(
            handle(&mut browser, &poll, &listed, SessionCommand::Quit).unwrap(),
            Outcome::Quit
        );
        poll.shutdown().await;
    }
}
