use chrono::{DateTime, SecondsFormat, Utc};
use console_client::records::RecordsQuery;
use std::num::NonZeroU32;

/// FilterMode is the single active way in which a listing of messages is
/// positioned within a topic. Setting any one mode replaces all others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterMode {
    /// The most recent messages.
    #[default]
    Latest,
    /// Messages at or after an offset.
    Offset(i64),
    /// Messages at or after a point in time.
    Timestamp(DateTime<Utc>),
    /// Messages at or after a number of seconds since the Unix epoch.
    Epoch(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    Offset,
    Timestamp,
    Epoch,
}

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum InputError {
    #[error("invalid offset '{0}': expected an integer")]
    Offset(String),
    #[error("invalid timestamp '{0}': expected an RFC 3339 timestamp like 2024-01-02T03:04:05Z")]
    Timestamp(String),
    #[error("partition {partition} is out of range, as the topic has {count} partitions")]
    Partition { partition: i32, count: usize },
    #[error("message {0} is not listed")]
    NotListed(console_models::MessageId),
}

impl FilterMode {
    /// Derive the mode from separately-supplied values, as when they're
    /// passed as command-line arguments. An offset takes precedence over a
    /// timestamp, which takes precedence over an epoch. An epoch which is
    /// negative or beyond the range of timestamps is ignored.
    pub fn from_parts(
        offset: Option<i64>,
        timestamp: Option<DateTime<Utc>>,
        epoch: Option<i64>,
    ) -> Self {
        match (offset, timestamp, epoch.filter(|epoch| is_valid_epoch(*epoch))) {
            (Some(offset), _, _) => FilterMode::Offset(offset),
            (None, Some(timestamp), _) => FilterMode::Timestamp(timestamp),
            (None, None, Some(epoch)) => FilterMode::Epoch(epoch),
            (None, None, None) => FilterMode::Latest,
        }
    }

    pub fn offset(&self) -> Option<i64> {
        match self {
            FilterMode::Offset(offset) => Some(*offset),
            _ => None,
        }
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            FilterMode::Timestamp(timestamp) => Some(*timestamp),
            _ => None,
        }
    }

    pub fn epoch(&self) -> Option<i64> {
        match self {
            FilterMode::Epoch(epoch) => Some(*epoch),
            _ => None,
        }
    }
}

impl std::fmt::Display for FilterMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FilterMode::Latest => f.write_str("latest messages"),
            FilterMode::Offset(offset) => write!(f, "from offset {offset}"),
            FilterMode::Timestamp(ts) => {
                write!(f, "from {}", ts.to_rfc3339_opts(SecondsFormat::Secs, true))
            }
            FilterMode::Epoch(epoch) => write!(f, "from epoch {epoch}"),
        }
    }
}

/// FilterController owns the FilterMode of a browsing session,
/// and applies user edits to it. It performs no I/O.
#[derive(Debug, Default, Clone)]
pub struct FilterController {
    mode: FilterMode,
}

impl FilterController {
    pub fn new(mode: FilterMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> FilterMode {
        self.mode
    }

    pub fn set_offset(&mut self, offset: Option<i64>) {
        self.mode = offset.map_or(FilterMode::Latest, FilterMode::Offset);
    }

    pub fn set_timestamp(&mut self, timestamp: Option<DateTime<Utc>>) {
        self.mode = timestamp.map_or(FilterMode::Latest, FilterMode::Timestamp);
    }

    /// Negative epochs, and epochs beyond the range of timestamps,
    /// are treated as absent.
    pub fn set_epoch(&mut self, epoch: Option<i64>) {
        self.mode = match epoch {
            Some(epoch) if is_valid_epoch(epoch) => FilterMode::Epoch(epoch),
            _ => FilterMode::Latest,
        };
    }

    pub fn set_latest(&mut self) {
        self.mode = FilterMode::Latest;
    }

    /// Apply raw user input for a filter of `kind`. Blank input reverts to
    /// Latest. Malformed offsets and timestamps are errors which leave the
    /// mode unchanged, while an epoch which isn't a non-negative integer is
    /// treated as absent.
    pub fn apply_input(&mut self, kind: FilterKind, raw: &str) -> Result<FilterMode, InputError> {
        let raw = raw.trim();

        if raw.is_empty() {
            self.set_latest();
            return Ok(self.mode);
        }

        match kind {
            FilterKind::Offset => {
                let offset = raw
                    .parse::<i64>()
                    .map_err(|_| InputError::Offset(raw.to_string()))?;
                self.set_offset(Some(offset));
            }
            FilterKind::Timestamp => {
                let timestamp = DateTime::parse_from_rfc3339(raw)
                    .map_err(|_| InputError::Timestamp(raw.to_string()))?;
                self.set_timestamp(Some(timestamp.with_timezone(&Utc)));
            }
            FilterKind::Epoch => self.set_epoch(raw.parse::<i64>().ok()),
        }
        Ok(self.mode)
    }
}

fn is_valid_epoch(epoch: i64) -> bool {
    epoch >= 0 && DateTime::<Utc>::from_timestamp(epoch, 0).is_some()
}

/// MessageQuery is the complete description of a page of messages to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageQuery {
    pub partition: Option<i32>,
    pub limit: NonZeroU32,
    pub filter: FilterMode,
}

pub const DEFAULT_LIMIT: NonZeroU32 = match NonZeroU32::new(50) {
    Some(limit) => limit,
    None => unreachable!(),
};

impl Default for MessageQuery {
    fn default() -> Self {
        Self {
            partition: None,
            limit: DEFAULT_LIMIT,
            filter: FilterMode::Latest,
        }
    }
}

impl MessageQuery {
    pub fn to_records_query(&self) -> RecordsQuery {
        let (offset, timestamp) = match self.filter {
            FilterMode::Latest => (None, None),
            FilterMode::Offset(offset) => (Some(offset), None),
            FilterMode::Timestamp(timestamp) => (None, Some(timestamp)),
            FilterMode::Epoch(epoch) => (None, DateTime::<Utc>::from_timestamp(epoch, 0)),
        };

        RecordsQuery {
            partition: self.partition,
            limit: self.limit.get(),
            offset,
            timestamp,
        }
    }
}
