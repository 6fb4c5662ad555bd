//! Watch-list table
//!
//! Loaded once from a header-prefixed CSV file:
//!
//! ```text
//! name,type,address,description
//! player_x,f32,0x80452C10,horizontal position
//! lives,u8,0x80453001,
//! ```
//!
//! Rows with an unknown type or an unparsable address are rejected here, at
//! load time, so the sampler only ever sees the four supported types. A later
//! row with an already used name replaces the earlier one.

use super::ValueType;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchListEntry {
    pub name: String,
    pub value_type: ValueType,
    pub address: u32,
    pub description: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum WatchListError {
    #[error("failed to read watch list {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("watch list {0} contains no entries")]
    Empty(PathBuf),
}

/// Reason a single row was rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RowError {
    #[error("expected at least 3 columns, found {0}")]
    MissingColumns(usize),

    #[error("empty name")]
    EmptyName,

    #[error("unsupported type '{0}'")]
    UnsupportedType(String),

    #[error("invalid address '{0}'")]
    InvalidAddress(String),
}

/// Immutable name → address table
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WatchList {
    entries: BTreeMap<String, WatchListEntry>,
}

impl WatchList {
    /// Reads and parses the CSV file at `path`
    pub async fn load(path: &Path) -> Result<Self, WatchListError> {
        let content =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| WatchListError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;

        let watch_list = Self::parse(&content);
        if watch_list.is_empty() {
            return Err(WatchListError::Empty(path.to_path_buf()));
        }
        info!(
            "Loaded {} watch list entries from {}",
            watch_list.len(),
            path.display()
        );
        Ok(watch_list)
    }

    /// Like [`load`](Self::load) but a missing or empty file yields an empty table
    pub async fn load_or_empty(path: &Path) -> Self {
        match Self::load(path).await {
            Ok(watch_list) => watch_list,
            Err(e) => {
                warn!("{}; continuing with an empty watch list", e);
                Self::default()
            }
        }
    }

    /// Parses CSV content; the first line is a header and is skipped
    pub fn parse(content: &str) -> Self {
        let mut entries = BTreeMap::new();

        for (index, line) in content.lines().enumerate().skip(1) {
            if line.trim().is_empty() {
                continue;
            }
            match parse_row(line) {
                Ok(entry) => {
                    debug!(
                        "Watching {} ({}) at {:#010x}",
                        entry.name, entry.value_type, entry.address
                    );
                    if let Some(previous) = entries.insert(entry.name.clone(), entry) {
                        warn!(
                            "Watch list line {}: '{}' defined twice, keeping the later row",
                            index + 1,
                            previous.name
                        );
                    }
                }
                Err(e) => warn!("Watch list line {} rejected: {}", index + 1, e),
            }
        }

        Self { entries }
    }

    pub fn from_entries(entries: impl IntoIterator<Item = WatchListEntry>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|entry| (entry.name.clone(), entry))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&WatchListEntry> {
        self.entries.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &WatchListEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn parse_row(line: &str) -> Result<WatchListEntry, RowError> {
    let columns: Vec<&str> = line.splitn(4, ',').map(str::trim).collect();
    if columns.len() < 3 {
        return Err(RowError::MissingColumns(columns.len()));
    }

    let name = columns[0];
    if name.is_empty() {
        return Err(RowError::EmptyName);
    }
    let value_type: ValueType = columns[1].parse()?;
    let address =
        parse_address(columns[2]).ok_or_else(|| RowError::InvalidAddress(columns[2].to_string()))?;
    let description = columns
        .get(3)
        .filter(|d| !d.is_empty())
        .map(|d| d.to_string());

    Ok(WatchListEntry {
        name: name.to_string(),
        value_type,
        address,
        description,
    })
}

/// Parses an integer literal in any base: `0x`, `0o`, `0b` prefixes or decimal
///
/// `_` separators between digits are accepted; decimal literals may not have
/// leading zeros.
pub fn parse_address(literal: &str) -> Option<u32> {
    let literal = literal.trim();
    let (digits, radix) = match literal.get(..2) {
        Some("0x" | "0X") => (&literal[2..], 16),
        Some("0o" | "0O") => (&literal[2..], 8),
        Some("0b" | "0B") => (&literal[2..], 2),
        _ => (literal, 10),
    };

    let digits = if radix != 10 {
        digits.strip_prefix('_').unwrap_or(digits)
    } else {
        digits
    };
    if digits.is_empty()
        || digits.starts_with(['_', '+', '-'])
        || digits.ends_with('_')
        || digits.contains("__")
    {
        return None;
    }

    let cleaned: String = digits.chars().filter(|c| *c != '_').collect();
    if radix == 10 && cleaned.starts_with('0') && cleaned.bytes().any(|b| b != b'0') {
        return None;
    }
    u32::from_str_radix(&cleaned, radix).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "name,type,address,description
player_x,f32,0x80452C10,horizontal position
lives,u8,0x80453001,
timer, u16 ,2151940096,frames left, counting down
score,u32,0o20010000000
";

    #[test]
    fn parses_rows_after_header() {
        let watch_list = WatchList::parse(SAMPLE);
        assert_eq!(watch_list.len(), 4);

        let player_x = watch_list.get("player_x").unwrap();
        assert_eq!(player_x.value_type, ValueType::F32);
        assert_eq!(player_x.address, 0x8045_2C10);
        assert_eq!(player_x.description.as_deref(), Some("horizontal position"));

        let timer = watch_list.get("timer").unwrap();
        assert_eq!(timer.value_type, ValueType::U16);
        assert_eq!(timer.address, 0x8044_0000);
        assert_eq!(timer.description.as_deref(), Some("frames left, counting down"));

        assert_eq!(watch_list.get("lives").unwrap().description, None);
        assert_eq!(watch_list.get("score").unwrap().address, 0x8020_0000);
    }

    #[test]
    fn rejects_unsupported_types_at_load() {
        let watch_list = WatchList::parse(
            "name,type,address,description\nspeed,f64,0x80000000,\nok,u8,0x80000004,\n",
        );
        assert_eq!(watch_list.len(), 1);
        assert!(watch_list.get("speed").is_none());
        assert_eq!(parse_row("speed,s8,0x0"), Err(RowError::UnsupportedType("s8".into())));
    }

    #[test]
    fn rejects_malformed_rows() {
        assert_eq!(parse_row("lonely"), Err(RowError::MissingColumns(1)));
        assert_eq!(parse_row(",u8,0x0"), Err(RowError::EmptyName));
        assert_eq!(
            parse_row("x,u8,0xZZ"),
            Err(RowError::InvalidAddress("0xZZ".into()))
        );
    }

    #[test]
    fn later_duplicate_replaces_earlier() {
        let watch_list =
            WatchList::parse("header\nhp,u8,0x80000000,\nhp,u16,0x80000010,\n");
        assert_eq!(watch_list.len(), 1);
        let hp = watch_list.get("hp").unwrap();
        assert_eq!(hp.value_type, ValueType::U16);
        assert_eq!(hp.address, 0x8000_0010);
    }

    #[test]
    fn header_only_file_is_empty() {
        assert!(WatchList::parse("name,type,address,description\n\n").is_empty());
        assert!(WatchList::parse("").is_empty());
    }

    #[test]
    fn address_literals_in_any_base() {
        assert_eq!(parse_address("0x80000000"), Some(0x8000_0000));
        assert_eq!(parse_address("0X1f"), Some(31));
        assert_eq!(parse_address("0o17"), Some(15));
        assert_eq!(parse_address("0b1010"), Some(10));
        assert_eq!(parse_address("1234"), Some(1234));
        assert_eq!(parse_address("0"), Some(0));
        assert_eq!(parse_address("0x8000_0000"), Some(0x8000_0000));
        assert_eq!(parse_address(" 42 "), Some(42));

        assert_eq!(parse_address("0777"), None);
        assert_eq!(parse_address("0x"), None);
        assert_eq!(parse_address("-1"), None);
        assert_eq!(parse_address("1__0"), None);
        assert_eq!(parse_address("0x100000000"), None);
    }

    #[tokio::test]
    async fn missing_file_loads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.csv");
        assert!(matches!(
            WatchList::load(&path).await,
            Err(WatchListError::Io { .. })
        ));
        assert!(WatchList::load_or_empty(&path).await.is_empty());
    }

    #[tokio::test]
    async fn header_only_file_is_a_config_fault() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("watch_list.csv");
        std::fs::write(&path, "name,type,address,description\n").unwrap();
        assert!(matches!(
            WatchList::load(&path).await,
            Err(WatchListError::Empty(_))
        ));
    }
}
