use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex;

/// Column is a column of the messages table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Column {
    #[serde(rename = "offset-partition", alias = "offset")]
    OffsetPartition,
    #[serde(rename = "size")]
    Size,
    #[serde(rename = "key")]
    Key,
    /// Timestamp in the local time zone.
    #[serde(rename = "timestamp")]
    Timestamp,
    #[serde(rename = "timestampUTC")]
    TimestampUtc,
    #[serde(rename = "headers")]
    Headers,
    #[serde(rename = "value")]
    Value,
}

/// All columns, in the order in which they're displayed.
pub const ALL_COLUMNS: [Column; 7] = [
    Column::OffsetPartition,
    Column::Size,
    Column::Key,
    Column::Timestamp,
    Column::TimestampUtc,
    Column::Headers,
    Column::Value,
];

pub const DEFAULT_COLUMNS: [Column; 4] = [
    Column::OffsetPartition,
    Column::TimestampUtc,
    Column::Key,
    Column::Value,
];

/// Preference key under which selected columns are stored.
pub const COLUMNS_KEY: &str = "message-browser-columns";

impl Column {
    pub fn id(&self) -> &'static str {
        match self {
            Column::OffsetPartition => "offset-partition",
            Column::Size => "size",
            Column::Key => "key",
            Column::Timestamp => "timestamp",
            Column::TimestampUtc => "timestampUTC",
            Column::Headers => "headers",
            Column::Value => "value",
        }
    }

    pub fn header(&self) -> &'static str {
        match self {
            Column::OffsetPartition => "Offset / Partition",
            Column::Size => "Size",
            Column::Key => "Key",
            Column::Timestamp => "Timestamp",
            Column::TimestampUtc => "Timestamp (UTC)",
            Column::Headers => "Headers",
            Column::Value => "Value",
        }
    }
}

impl std::fmt::Display for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

impl std::str::FromStr for Column {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "offset" {
            return Ok(Column::OffsetPartition);
        }
        ALL_COLUMNS
            .into_iter()
            .find(|column| column.id() == s)
            .ok_or_else(|| {
                let ids: Vec<_> = ALL_COLUMNS.iter().map(Column::id).collect();
                format!("unknown column '{s}', expected one of: {}", ids.join(", "))
            })
    }
}

/// ColumnMask is a compact set of columns, which are always
/// iterated in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ColumnMask(u8);

impl ColumnMask {
    pub fn new(columns: &[Column]) -> Self {
        Self(columns.iter().fold(0, |mask, column| mask | Self::bit(*column)))
    }

    pub fn columns(self) -> impl Iterator<Item = Column> {
        ALL_COLUMNS
            .into_iter()
            .filter(move |column| self.0 & Self::bit(*column) != 0)
    }

    fn bit(column: Column) -> u8 {
        1 << column as u8
    }
}

/// Parse user-provided column ids. Duplicates are dropped.
pub fn parse_columns<S: AsRef<str>>(ids: &[S]) -> Result<Vec<Column>, String> {
    let mut columns = Vec::with_capacity(ids.len());
    for id in ids {
        let column: Column = id.as_ref().parse()?;
        if !columns.contains(&column) {
            columns.push(column);
        }
    }
    if columns.is_empty() {
        return Err("at least one column must be selected".to_string());
    }
    Ok(columns)
}

/// PreferenceStore is a durable store of small, named preference values.
/// Writes are last-write-wins.
pub trait PreferenceStore {
    fn get(&self, key: &str) -> std::io::Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> std::io::Result<()>;
    fn remove(&self, key: &str) -> std::io::Result<()>;
}

/// DirPreferenceStore keeps each preference as a file of a directory.
#[derive(Debug, Clone)]
pub struct DirPreferenceStore {
    dir: PathBuf,
}

impl DirPreferenceStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl PreferenceStore for DirPreferenceStore {
    fn get(&self, key: &str) -> std::io::Result<Option<String>> {
        match std::fs::read_to_string(self.path(key)) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    fn set(&self, key: &str, value: &str) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(self.path(key), value)
    }

    fn remove(&self, key: &str) -> std::io::Result<()> {
        match std::fs::remove_file(self.path(key)) {
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            result => result,
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryPreferenceStore {
    fn values(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        // A poisoned map is still consistent, as every update is a single insert or remove.
        self.values.lock().unwrap_or_else(|err| err.into_inner())
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get(&self, key: &str) -> std::io::Result<Option<String>> {
        Ok(self.values().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> std::io::Result<()> {
        self.values().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> std::io::Result<()> {
        self.values().remove(key);
        Ok(())
    }
}

/// Load the persisted column selection, falling back to DEFAULT_COLUMNS
/// if it's absent or can't be read or parsed.
pub fn load_columns(store: &impl PreferenceStore) -> Vec<Column> {
    let raw = match store.get(COLUMNS_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return DEFAULT_COLUMNS.to_vec(),
        Err(err) => {
            tracing::debug!(?err, "failed to read persisted columns");
            return DEFAULT_COLUMNS.to_vec();
        }
    };

    let ids: Vec<serde_json::Value> = match serde_json::from_str(&raw) {
        Ok(ids) => ids,
        Err(err) => {
            tracing::debug!(?err, %raw, "persisted columns are not a JSON array");
            return DEFAULT_COLUMNS.to_vec();
        }
    };

    let mut columns = Vec::with_capacity(ids.len());
    for id in ids {
        match id.as_str().and_then(|id| id.parse::<Column>().ok()) {
            Some(column) if !columns.contains(&column) => columns.push(column),
            Some(_) => (),
            None => tracing::debug!(%id, "ignoring unknown persisted column"),
        }
    }

    if columns.is_empty() {
        DEFAULT_COLUMNS.to_vec()
    } else {
        columns
    }
}

pub fn save_columns(store: &impl PreferenceStore, columns: &[Column]) -> std::io::Result<()> {
    store.set(COLUMNS_KEY, &serde_json::to_string(columns)?)
}

pub fn reset_columns(store: &impl PreferenceStore) -> std::io::Result<()> {
    store.remove(COLUMNS_KEY)
}
