use super::columns::{self, Column, PreferenceStore, ALL_COLUMNS};
use console_models::{Message, MessageId};

/// DetailTab is the part of a selected message which its detail panel shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetailTab {
    #[default]
    Value,
    Key,
    Headers,
}

impl std::str::FromStr for DetailTab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "value" => Ok(DetailTab::Value),
            "key" => Ok(DetailTab::Key),
            "headers" => Ok(DetailTab::Headers),
            other => Err(format!(
                "unknown detail tab '{other}', expected one of: value, key, headers"
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub message: Message,
    pub tab: DetailTab,
}

/// TableState is the presentation state of the messages table:
/// which columns are shown, and which message (if any) is selected.
#[derive(Debug)]
pub struct TableState {
    selected_columns: Vec<Column>,
    selection: Option<Selection>,
}

impl TableState {
    /// Build a TableState using the columns persisted in `store`.
    pub fn load(store: &impl PreferenceStore) -> Self {
        Self {
            selected_columns: columns::load_columns(store),
            selection: None,
        }
    }

    pub fn selected_columns(&self) -> &[Column] {
        &self.selected_columns
    }

    /// Selected columns, in display order.
    pub fn visible_columns(&self) -> Vec<Column> {
        ALL_COLUMNS
            .into_iter()
            .filter(|column| self.selected_columns.contains(column))
            .collect()
    }

    /// Select and persist `columns`. A failure to persist is logged, and
    /// the selection still applies to this session.
    pub fn set_columns(&mut self, store: &impl PreferenceStore, columns: Vec<Column>) {
        if let Err(err) = columns::save_columns(store, &columns) {
            tracing::warn!(?err, "failed to persist selected columns");
        }
        self.selected_columns = columns;
    }

    /// Restore the default columns, removing any persisted selection.
    pub fn reset_columns(&mut self, store: &impl PreferenceStore) {
        if let Err(err) = columns::reset_columns(store) {
            tracing::warn!(?err, "failed to reset persisted columns");
        }
        self.selected_columns = columns::DEFAULT_COLUMNS.to_vec();
    }

    /// Select `message`, showing its `tab` or else its value.
    pub fn select_message(&mut self, message: Message, tab: Option<DetailTab>) {
        self.selection = Some(Selection {
            message,
            tab: tab.unwrap_or_default(),
        });
    }

    pub fn deselect_message(&mut self) {
        self.selection = None;
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn selected_id(&self) -> Option<MessageId> {
        self.selection.as_ref().map(|s| s.message.id())
    }

    pub fn is_selected(&self, message: &Message) -> bool {
        self.selected_id() == Some(message.id())
    }

    /// Reconcile the selection with a freshly fetched list of `messages`,
    /// dropping it if the selected message is no longer listed.
    /// Returns true if the selection was dropped.
    pub fn reconcile(&mut self, messages: &[Message]) -> bool {
        let Some(id) = self.selected_id() else {
            return false;
        };
        if messages.iter().any(|m| m.id() == id) {
            false
        } else {
            tracing::debug!(%id, "selected message is no longer listed");
            self.selection = None;
            true
        }
    }
}
