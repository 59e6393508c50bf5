use super::filter::MessageQuery;
use chrono::{DateTime, Utc};
use console_client::{records::RecordsQuery, ErrorKind};
use console_models::Message;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Notify};
use tokio_util::sync::CancellationToken;

/// Shortest period between polls of messages.
pub const MIN_POLL_PERIOD: Duration = Duration::from_millis(100);

/// MessageSource fetches pages of messages.
pub trait MessageSource: Send + Sync + 'static {
    fn fetch(
        &self,
        query: &RecordsQuery,
    ) -> impl Future<Output = Result<Vec<Message>, console_client::Error>> + Send;
}

/// FetchState is a snapshot of the messages of a browsing session
/// and of the fetches which produce them.
#[derive(Debug, Clone, Default)]
pub struct FetchState {
    /// Messages of the most recently committed, successful fetch.
    pub messages: Arc<Vec<Message>>,
    /// Is the most recently issued fetch still outstanding?
    pub is_refreshing: bool,
    /// Time of the last successful fetch.
    pub last_updated: Option<DateTime<Utc>>,
    /// Error of the last fetch, if it failed.
    pub last_error: Option<FetchError>,
    /// Ticket of the most recently issued fetch.
    pub issued: u64,
    /// Ticket of the most recently committed fetch.
    pub committed: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchError {
    pub kind: ErrorKind,
    pub message: String,
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.kind {
            ErrorKind::Configuration => "configuration error",
            ErrorKind::Network => "network error",
            ErrorKind::Backend => "backend error",
            ErrorKind::SchemaValidation => "invalid response",
        };
        write!(f, "{kind}: {}", self.message)
    }
}

/// Outcome of a completed fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commit {
    /// The fetch was the latest issued, and its result was applied.
    Applied,
    /// A later fetch was issued before this one completed,
    /// and its result was discarded.
    Stale,
}

/// FetchCoordinator issues fetches of messages and publishes their results
/// as a FetchState. Every fetch takes a ticket when it's issued, and only
/// the result of the latest-issued fetch is ever applied.
pub struct FetchCoordinator<S> {
    source: Arc<S>,
    state: Arc<watch::Sender<FetchState>>,
}

impl<S> Clone for FetchCoordinator<S> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            state: self.state.clone(),
        }
    }
}

impl<S: MessageSource> FetchCoordinator<S> {
    pub fn new(source: S) -> Self {
        let (state, _) = watch::channel(FetchState::default());
        Self {
            source: Arc::new(source),
            state: Arc::new(state),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<FetchState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> FetchState {
        self.state.borrow().clone()
    }

    /// Issue a fetch of `query`. Its ticket is taken when fetch is called
    /// (not when the returned future is first polled), so it's superseded
    /// by any later call regardless of which completes first.
    pub fn fetch(&self, query: &MessageQuery) -> impl Future<Output = Commit> + Send + 'static {
        let ticket = self.begin();
        let records = query.to_records_query();
        let this = self.clone();

        async move {
            tracing::debug!(ticket, ?records, "fetching messages");
            let result = this.source.fetch(&records).await;
            this.commit(ticket, result)
        }
    }

    fn begin(&self) -> u64 {
        let mut ticket = 0;
        self.state.send_modify(|state| {
            state.issued += 1;
            state.is_refreshing = true;
            ticket = state.issued;
        });
        ticket
    }

    fn commit(
        &self,
        ticket: u64,
        result: Result<Vec<Message>, console_client::Error>,
    ) -> Commit {
        let mut commit = Commit::Stale;

        self.state.send_if_modified(|state| {
            if ticket != state.issued {
                tracing::debug!(ticket, latest = state.issued, "discarding stale fetch");
                return false;
            }
            state.is_refreshing = false;
            state.committed = ticket;

            match result {
                Ok(messages) => {
                    tracing::debug!(ticket, count = messages.len(), "fetched messages");
                    state.messages = Arc::new(messages);
                    state.last_updated = Some(Utc::now());
                    state.last_error = None;
                }
                Err(err) => {
                    let kind = err.kind();
                    let message = format!("{:#}", anyhow::Error::new(err));
                    tracing::warn!(ticket, ?kind, %message, "failed to fetch messages");
                    state.last_error = Some(FetchError { kind, message });
                }
            }
            commit = Commit::Applied;
            true
        });

        commit
    }

    /// Poll messages of the current query of `queries` every `period`,
    /// and immediately whenever the query changes. Polling continues until
    /// the returned PollHandle is shut down or dropped.
    /// Periods shorter than `MIN_POLL_PERIOD` are raised to it.
    pub fn poll(&self, queries: watch::Receiver<MessageQuery>, period: Duration) -> PollHandle {
        let period = period.max(MIN_POLL_PERIOD);
        let cancel = CancellationToken::new();
        let paused = Arc::new(AtomicBool::new(false));
        let trigger = Arc::new(Notify::new());

        let task = tokio::spawn(poll_loop(
            self.clone(),
            queries,
            period,
            cancel.clone(),
            paused.clone(),
            trigger.clone(),
        ));

        PollHandle {
            cancel,
            paused,
            trigger,
            task: Some(task),
        }
    }
}

async fn poll_loop<S: MessageSource>(
    coordinator: FetchCoordinator<S>,
    mut queries: watch::Receiver<MessageQuery>,
    period: Duration,
    cancel: CancellationToken,
    paused: Arc<AtomicBool>,
    trigger: Arc<Notify>,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        // Ticks are skipped while paused, but changed queries and
        // explicit refreshes are always fetched.
        let forced = tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => false,
            _ = trigger.notified() => true,
            changed = queries.changed() => match changed {
                Ok(()) => {
                    ticker.reset();
                    true
                }
                Err(_) => break,
            },
        };
        if !forced && paused.load(Ordering::Relaxed) {
            continue;
        }

        let query = *queries.borrow_and_update();
        let fetch = coordinator.fetch(&query);
        let cancel = cancel.child_token();

        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => tracing::debug!("cancelled outstanding fetch"),
                commit = fetch => tracing::trace!(?commit, "polled messages"),
            }
        });
    }
    tracing::debug!("stopped polling messages");
}

/// PollHandle controls background polling of messages.
/// Dropping it stops polling and cancels outstanding fetches.
pub struct PollHandle {
    cancel: CancellationToken,
    paused: Arc<AtomicBool>,
    trigger: Arc<Notify>,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl PollHandle {
    pub fn pause(&self) {
        self.paused.store(true, Ordering::Relaxed);
    }

    /// Resume polling, beginning with an immediate fetch.
    pub fn resume(&self) {
        self.paused.store(false, Ordering::Relaxed);
        self.trigger.notify_one();
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Relaxed)
    }

    /// Fetch now, even if paused.
    pub fn refresh(&self) {
        self.trigger.notify_one();
    }

    pub async fn shutdown(mut self) {
        self.cancel.cancel();

        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                tracing::warn!(?err, "message polling task failed");
            }
        }
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
