//! Interactive browsing of the messages of a topic.
//!
//! A browsing session is composed of a [`FilterController`] which positions
//! the listing, a [`FetchCoordinator`] which fetches and publishes messages
//! of the current [`MessageQuery`], and a [`TableState`] which tracks the
//! displayed columns and the selected message. [`MessageBrowser`] ties
//! these together, and [`session`] drives it from line-oriented commands.

pub mod columns;
pub mod fetch;
pub mod filter;
pub mod render;
pub mod session;
pub mod table;

pub use columns::{Column, DirPreferenceStore, PreferenceStore};
pub use fetch::{FetchCoordinator, FetchState, MessageSource};
pub use filter::{FilterController, FilterKind, FilterMode, InputError, MessageQuery};
pub use table::{DetailTab, TableState};

use console_client::records::RecordsQuery;
use console_models::{Message, MessageId};
use std::future::Future;
use std::num::NonZeroU32;
use tokio::sync::watch;

/// TopicRecords is a MessageSource of the records of a topic.
pub struct TopicRecords {
    pub client: console_client::Client,
    pub kafka_id: String,
    pub topic_id: String,
}

impl MessageSource for TopicRecords {
    fn fetch(
        &self,
        query: &RecordsQuery,
    ) -> impl Future<Output = Result<Vec<Message>, console_client::Error>> + Send {
        self.client
            .list_records(&self.kafka_id, &self.topic_id, query)
    }
}

/// MessageBrowser is the state of a session browsing the messages of a topic.
/// Every change of its query is published to observers of `queries()`.
pub struct MessageBrowser<P> {
    topic: String,
    partition_count: usize,
    filter: FilterController,
    query: watch::Sender<MessageQuery>,
    table: TableState,
    preferences: P,
}

impl<P: PreferenceStore> MessageBrowser<P> {
    pub fn new(topic: String, partition_count: usize, query: MessageQuery, preferences: P) -> Self {
        let table = TableState::load(&preferences);
        let (query_tx, _) = watch::channel(query);

        Self {
            topic,
            partition_count,
            filter: FilterController::new(query.filter),
            query: query_tx,
            table,
            preferences,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn query(&self) -> MessageQuery {
        *self.query.borrow()
    }

    pub fn queries(&self) -> watch::Receiver<MessageQuery> {
        self.query.subscribe()
    }

    pub fn table(&self) -> &TableState {
        &self.table
    }

    /// Select a single partition to browse, or all partitions if None.
    pub fn set_partition(&mut self, partition: Option<i32>) -> Result<(), InputError> {
        if let Some(partition) = partition {
            if partition < 0 || partition as usize >= self.partition_count {
                return Err(InputError::Partition {
                    partition,
                    count: self.partition_count,
                });
            }
        }
        self.publish(|query| query.partition = partition);
        Ok(())
    }

    pub fn set_limit(&mut self, limit: NonZeroU32) {
        self.publish(|query| query.limit = limit);
    }

    /// Apply raw filter input of `kind`. See [`FilterController::apply_input`].
    pub fn apply_filter(&mut self, kind: FilterKind, raw: &str) -> Result<FilterMode, InputError> {
        let mode = self.filter.apply_input(kind, raw)?;
        self.publish(|query| query.filter = mode);
        Ok(mode)
    }

    pub fn set_latest(&mut self) {
        self.filter.set_latest();
        self.publish(|query| query.filter = FilterMode::Latest);
    }

    pub fn set_columns(&mut self, columns: Vec<Column>) {
        self.table.set_columns(&self.preferences, columns);
    }

    pub fn reset_columns(&mut self) {
        self.table.reset_columns(&self.preferences);
    }

    /// Select the message `id` of the listed `messages`.
    pub fn select_message(
        &mut self,
        messages: &[Message],
        id: MessageId,
        tab: Option<DetailTab>,
    ) -> Result<(), InputError> {
        let message = messages
            .iter()
            .find(|m| m.id() == id)
            .ok_or(InputError::NotListed(id))?;

        self.table.select_message(message.clone(), tab);
        Ok(())
    }

    pub fn deselect_message(&mut self) {
        self.table.deselect_message();
    }

    /// Reconcile the selected message with freshly fetched `messages`.
    pub fn reconcile(&mut self, messages: &[Message]) -> bool {
        self.table.reconcile(messages)
    }

    // Update the current query, notifying observers only if it changed.
    fn publish(&self, update: impl FnOnce(&mut MessageQuery)) {
        self.query.send_if_modified(|query| {
            let before = *query;
            update(query);
            *query != before
        });
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::browser::columns::MemoryPreferenceStore;
    use crate::browser::table::test::message;

    fn browser() -> MessageBrowser<MemoryPreferenceStore> {
        MessageBrowser::new(
            "orders".to_string(),
            3,
            MessageQuery::default(),
            MemoryPreferenceStore::default(),
        )
    }

    #[test]
    fn partitions_are_bounded_by_the_topic() {
        let mut browser = browser();

        browser.set_partition(Some(2)).unwrap();
        assert_eq!(browser.query().partition, Some(2));

        assert_eq!(
            browser.set_partition(Some(3)),
            Err(InputError::Partition { partition: 3, count: 3 })
        );
        assert!(browser.set_partition(Some(-1)).is_err());
        assert_eq!(browser.query().partition, Some(2));

        browser.set_partition(None).unwrap();
        assert_eq!(browser.query().partition, None);
    }

    #[test]
    fn only_changed_queries_are_published() {
        let mut browser = browser();
        let mut queries = browser.queries();

        browser.set_latest();
        assert!(!queries.has_changed().unwrap());

        browser.apply_filter(FilterKind::Offset, "100").unwrap();
        assert!(queries.has_changed().unwrap());
        assert_eq!(queries.borrow_and_update().filter, FilterMode::Offset(100));

        // Malformed input changes nothing.
        assert!(browser.apply_filter(FilterKind::Offset, "x").is_err());
        assert!(!queries.has_changed().unwrap());

        browser.set_limit(NonZeroU32::new(5).unwrap());
        assert_eq!(queries.borrow_and_update().limit.get(), 5);
    }

    #[test]
    fn messages_are_selected_from_the_listing() {
        let mut browser = browser();
        let listed = vec![message(0, 1, "a"), message(1, 1, "b")];
        let id = MessageId { partition: 1, offset: 1 };

        browser.select_message(&listed, id, Some(DetailTab::Key)).unwrap();
        assert_eq!(browser.table().selected_id(), Some(id));

        let missing = MessageId { partition: 2, offset: 1 };
        assert_eq!(
            browser.select_message(&listed, missing, None),
            Err(InputError::NotListed(missing))
        );

        assert!(browser.reconcile(&listed[..1]));
        assert_eq!(browser.table().selected_id(), None);
    }
}
