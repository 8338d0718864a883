//! Durable storage for bookmarks (single snapshot file) and navigation
//! history (one append-only log file per calendar day).
//!
//! Records are line oriented with hex-encoded string fields, so arbitrary
//! bookmark names and destinations never collide with the field or record
//! separators, and a truncated trailing record is detectable.

use mb_core::DayKey;
use mb_core::Destination;
use mb_core::HistoryEntry;
use mb_core::ShellError;
use mb_core::ShellResult;
use std::collections::BTreeMap;
use std::fs;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

mod bookmarks;

pub use bookmarks::Bookmarks;

const BOOKMARKS_FILE: &str = "bookmarks.kv";
const BOOKMARKS_TEMP_FILE: &str = "bookmarks.kv.tmp";
const HISTORY_FILE_PREFIX: &str = "search_history_";
const HISTORY_FILE_SUFFIX: &str = ".log";

/// Result of replaying one day's history log.
///
/// `truncated` is set when a malformed record cut the read short; `entries`
/// then holds the valid prefix rather than nothing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HistoryReadOutcome {
    pub entries: Vec<HistoryEntry>,
    pub truncated: bool,
}

/// File-backed store owning the shell's storage root.
///
/// Cloning shares the writer mutex, so every handle serializes its disk
/// writes through the same point and appends from concurrently navigating
/// tabs never interleave.
#[derive(Debug, Clone)]
pub struct PersistentStore {
    root: PathBuf,
    writer: Arc<Mutex<()>>,
}

impl PersistentStore {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            writer: Arc::new(Mutex::new(())),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Reads the bookmark snapshot. A missing file yields an empty mapping;
    /// an unreadable or undecodable file is an error so callers can fall
    /// back to empty and warn instead of silently dropping bookmarks.
    pub fn load_bookmarks(&self) -> ShellResult<BTreeMap<String, Destination>> {
        let path = self.bookmarks_path();
        if !path.exists() {
            return Ok(BTreeMap::new());
        }

        let content = fs::read_to_string(&path).map_err(|error| {
            ShellError::new(
                "store.bookmarks_read_failed",
                format!("failed to read bookmark snapshot `{}`: {error}", path.display()),
            )
        })?;

        let mut map = BTreeMap::new();
        for (index, line) in content.lines().enumerate() {
            if line.is_empty() {
                continue;
            }

            let record = decode_bookmark_record(line).ok_or_else(|| {
                ShellError::new(
                    "store.bookmarks_corrupt",
                    format!(
                        "invalid bookmark record at `{}` line {}",
                        path.display(),
                        index + 1
                    ),
                )
            })?;
            map.insert(record.0, record.1);
        }

        Ok(map)
    }

    /// Replaces the bookmark snapshot with the given mapping.
    ///
    /// The snapshot is written to a temp file and renamed into place, so a
    /// crash mid-write leaves the previous good snapshot intact. History
    /// appends deliberately skip this: losing a partial last history record
    /// is tolerable, losing every bookmark is not.
    pub fn save_bookmarks(&self, map: &BTreeMap<String, Destination>) -> ShellResult<()> {
        self.ensure_root()?;

        let mut encoded = String::new();
        for (name, destination) in map {
            encoded.push_str(&encode_hex(name));
            encoded.push('\t');
            encoded.push_str(&encode_hex(destination.as_str()));
            encoded.push('\n');
        }

        let temp_path = self.root.join(BOOKMARKS_TEMP_FILE);
        let final_path = self.bookmarks_path();
        let _guard = self.writer_guard();

        fs::write(&temp_path, encoded).map_err(|error| {
            ShellError::new(
                "store.bookmarks_write_failed",
                format!(
                    "failed to write bookmark snapshot `{}`: {error}",
                    temp_path.display()
                ),
            )
        })?;

        fs::rename(&temp_path, &final_path).map_err(|error| {
            ShellError::new(
                "store.bookmarks_write_failed",
                format!(
                    "failed to replace bookmark snapshot `{}`: {error}",
                    final_path.display()
                ),
            )
        })
    }

    /// Appends one history record to the given day's log, creating the log
    /// file on the day's first navigation. Serialized by the writer mutex.
    pub fn append_history_entry(&self, day: DayKey, entry: &HistoryEntry) -> ShellResult<()> {
        self.ensure_root()?;

        let path = self.history_path(day);
        let record = format!("{}\t{}\n", encode_hex(entry.destination.as_str()), entry.timestamp);
        let _guard = self.writer_guard();

        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&path)
            .map_err(|error| {
                ShellError::new(
                    "store.history_append_failed",
                    format!("failed to open history log `{}`: {error}", path.display()),
                )
            })?;

        file.write_all(record.as_bytes()).map_err(|error| {
            ShellError::new(
                "store.history_append_failed",
                format!("failed to append to history log `{}`: {error}", path.display()),
            )
        })
    }

    /// Replays one day's log in append order. Stops at the first malformed
    /// record and returns the valid prefix with the `truncated` flag set.
    pub fn read_history_log(&self, day: DayKey) -> ShellResult<HistoryReadOutcome> {
        let path = self.history_path(day);
        if !path.exists() {
            return Ok(HistoryReadOutcome::default());
        }

        let content = fs::read_to_string(&path).map_err(|error| {
            ShellError::new(
                "store.history_read_failed",
                format!("failed to read history log `{}`: {error}", path.display()),
            )
        })?;

        let mut outcome = HistoryReadOutcome::default();
        for line in content.lines() {
            if line.is_empty() {
                continue;
            }

            let Some(entry) = decode_history_record(line) else {
                outcome.truncated = true;
                break;
            };
            outcome.entries.push(entry);
        }

        Ok(outcome)
    }

    /// All days with an existing log file, most recent first.
    pub fn list_history_days(&self) -> ShellResult<Vec<DayKey>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let listing = fs::read_dir(&self.root).map_err(|error| {
            ShellError::new(
                "store.history_list_failed",
                format!(
                    "failed to list storage root `{}`: {error}",
                    self.root.display()
                ),
            )
        })?;

        let mut days = Vec::new();
        for dir_entry in listing {
            let dir_entry = dir_entry.map_err(|error| {
                ShellError::new(
                    "store.history_list_failed",
                    format!(
                        "failed to list storage root `{}`: {error}",
                        self.root.display()
                    ),
                )
            })?;

            let file_name = dir_entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            if let Some(day) = history_day_from_file_name(name) {
                days.push(day);
            }
        }

        days.sort_unstable_by(|left, right| right.cmp(left));
        Ok(days)
    }

    fn bookmarks_path(&self) -> PathBuf {
        self.root.join(BOOKMARKS_FILE)
    }

    fn history_path(&self, day: DayKey) -> PathBuf {
        self.root
            .join(format!("{HISTORY_FILE_PREFIX}{day}{HISTORY_FILE_SUFFIX}"))
    }

    fn ensure_root(&self) -> ShellResult<()> {
        fs::create_dir_all(&self.root).map_err(|error| {
            ShellError::new(
                "store.root_create_failed",
                format!(
                    "failed to create storage root `{}`: {error}",
                    self.root.display()
                ),
            )
        })
    }

    fn writer_guard(&self) -> MutexGuard<'_, ()> {
        match self.writer.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

fn history_day_from_file_name(name: &str) -> Option<DayKey> {
    let stem = name
        .strip_prefix(HISTORY_FILE_PREFIX)?
        .strip_suffix(HISTORY_FILE_SUFFIX)?;
    DayKey::parse(stem)
}

fn decode_bookmark_record(line: &str) -> Option<(String, Destination)> {
    let (name_hex, destination_hex) = line.split_once('\t')?;
    let name = decode_hex(name_hex)?;
    let destination = decode_hex(destination_hex)?;
    Some((name, Destination::from_stored(destination)))
}

fn decode_history_record(line: &str) -> Option<HistoryEntry> {
    let (destination_hex, timestamp) = line.split_once('\t')?;
    let destination = decode_hex(destination_hex)?;
    let timestamp = timestamp.parse::<i64>().ok()?;
    Some(HistoryEntry::new(
        Destination::from_stored(destination),
        timestamp,
    ))
}

fn encode_hex(value: &str) -> String {
    let mut out = String::with_capacity(value.len().saturating_mul(2));
    for byte in value.as_bytes() {
        out.push(hex_char(byte >> 4));
        out.push(hex_char(byte & 0x0f));
    }
    out
}

fn decode_hex(value: &str) -> Option<String> {
    if value.len() % 2 != 0 {
        return None;
    }

    let raw = value.as_bytes();
    let mut decoded = Vec::with_capacity(raw.len() / 2);
    let mut index = 0_usize;
    while index < raw.len() {
        let high = hex_nibble(raw[index])?;
        let low = hex_nibble(raw[index + 1])?;
        decoded.push((high << 4) | low);
        index += 2;
    }

    String::from_utf8(decoded).ok()
}

fn hex_char(value: u8) -> char {
    match value {
        0..=9 => (b'0' + value) as char,
        10..=15 => (b'a' + (value - 10)) as char,
        _ => '0',
    }
}

fn hex_nibble(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::HistoryReadOutcome;
    use super::PersistentStore;
    use super::decode_hex;
    use super::encode_hex;
    use super::history_day_from_file_name;
    use mb_core::DayKey;
    use mb_core::Destination;
    use mb_core::HistoryEntry;
    use std::collections::BTreeMap;
    use std::time::SystemTime;
    use std::time::UNIX_EPOCH;
    use time::macros::date;

    fn temp_store_root(tag: &str) -> std::path::PathBuf {
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|value| value.as_nanos())
            .unwrap_or_default();
        std::env::temp_dir().join(format!("marlin-store-test-{tag}-{stamp}"))
    }

    fn sample_day() -> DayKey {
        DayKey::from_date(date!(2024 - 05 - 01))
    }

    #[test]
    fn hex_fields_round_trip_arbitrary_text() {
        let original = "name with\ttab and\nnewline \u{20AC}";
        let decoded = decode_hex(&encode_hex(original));
        assert_eq!(decoded.as_deref(), Some(original));
    }

    #[test]
    fn bookmarks_round_trip_through_snapshot() {
        let root = temp_store_root("bookmark-roundtrip");
        let store = PersistentStore::new(root.clone());

        let mut map = BTreeMap::new();
        map.insert(
            "docs".to_owned(),
            Destination::from_stored("https://docs.rs"),
        );
        map.insert(
            "search".to_owned(),
            Destination::from_stored("https://www.google.com/search?q=rust&hl=en"),
        );

        assert!(store.save_bookmarks(&map).is_ok());
        assert_eq!(store.load_bookmarks(), Ok(map));

        let _ = std::fs::remove_dir_all(root);
    }

    #[test]
    fn missing_snapshot_loads_as_empty_mapping() {
        let store = PersistentStore::new(temp_store_root("bookmark-missing"));
        assert_eq!(store.load_bookmarks(), Ok(BTreeMap::new()));
    }

    #[test]
    fn corrupt_snapshot_is_reported_not_swallowed() {
        let root = temp_store_root("bookmark-corrupt");
        std::fs::create_dir_all(&root).unwrap_or_else(|_| unreachable!());
        std::fs::write(root.join("bookmarks.kv"), "not hex at all\n")
            .unwrap_or_else(|_| unreachable!());

        let store = PersistentStore::new(root.clone());
        let loaded = store.load_bookmarks();
        assert!(loaded.is_err());
        if let Err(error) = loaded {
            assert_eq!(error.code, "store.bookmarks_corrupt");
        }

        let _ = std::fs::remove_dir_all(root);
    }

    #[test]
    fn snapshot_save_leaves_no_temp_file_behind() {
        let root = temp_store_root("bookmark-temp");
        let store = PersistentStore::new(root.clone());

        let mut map = BTreeMap::new();
        map.insert("a".to_owned(), Destination::from_stored("http://a.example"));
        assert!(store.save_bookmarks(&map).is_ok());
        assert!(!root.join("bookmarks.kv.tmp").exists());
        assert!(root.join("bookmarks.kv").exists());

        let _ = std::fs::remove_dir_all(root);
    }

    #[test]
    fn snapshot_save_replaces_stale_temp_file() {
        let root = temp_store_root("bookmark-stale-temp");
        std::fs::create_dir_all(&root).unwrap_or_else(|_| unreachable!());
        std::fs::write(root.join("bookmarks.kv.tmp"), "garbage from a crash")
            .unwrap_or_else(|_| unreachable!());

        let store = PersistentStore::new(root.clone());
        let mut map = BTreeMap::new();
        map.insert("a".to_owned(), Destination::from_stored("http://a.example"));
        assert!(store.save_bookmarks(&map).is_ok());
        assert_eq!(store.load_bookmarks(), Ok(map));

        let _ = std::fs::remove_dir_all(root);
    }

    #[test]
    fn history_appends_replay_in_insertion_order() {
        let root = temp_store_root("history-order");
        let store = PersistentStore::new(root.clone());
        let day = sample_day();

        for index in 0..5_i64 {
            let entry = HistoryEntry::new(
                Destination::from_stored(format!("http://example.com/{index}")),
                1_714_500_000 + index,
            );
            assert!(store.append_history_entry(day, &entry).is_ok());
        }

        let outcome = store.read_history_log(day).unwrap_or_default();
        assert!(!outcome.truncated);
        assert_eq!(outcome.entries.len(), 5);
        for (index, entry) in outcome.entries.iter().enumerate() {
            assert_eq!(
                entry.destination.as_str(),
                format!("http://example.com/{index}")
            );
        }

        let _ = std::fs::remove_dir_all(root);
    }

    #[test]
    fn history_appends_stay_in_their_own_day() {
        let root = temp_store_root("history-days");
        let store = PersistentStore::new(root.clone());
        let first = DayKey::from_date(date!(2024 - 05 - 01));
        let second = DayKey::from_date(date!(2024 - 05 - 02));

        let entry = HistoryEntry::new(Destination::from_stored("http://example.com"), 1);
        assert!(store.append_history_entry(first, &entry).is_ok());

        let other_day = store.read_history_log(second).unwrap_or_default();
        assert!(other_day.entries.is_empty());
        let same_day = store.read_history_log(first).unwrap_or_default();
        assert_eq!(same_day.entries, vec![entry]);

        let _ = std::fs::remove_dir_all(root);
    }

    #[test]
    fn truncated_log_yields_valid_prefix_with_flag() {
        let root = temp_store_root("history-truncated");
        let store = PersistentStore::new(root.clone());
        let day = sample_day();

        let entry = HistoryEntry::new(Destination::from_stored("http://example.com"), 7);
        assert!(store.append_history_entry(day, &entry).is_ok());
        assert!(store.append_history_entry(day, &entry).is_ok());

        // Simulate a crash mid-append: half a hex field, no separator.
        let path = root.join(format!("search_history_{day}.log"));
        let mut content = std::fs::read_to_string(&path).unwrap_or_default();
        content.push_str("687474703a2f2f");
        std::fs::write(&path, content).unwrap_or_else(|_| unreachable!());

        let outcome = store.read_history_log(day).unwrap_or_default();
        assert!(outcome.truncated);
        assert_eq!(outcome.entries.len(), 2);

        let _ = std::fs::remove_dir_all(root);
    }

    #[test]
    fn malformed_middle_record_stops_the_read() {
        let root = temp_store_root("history-malformed");
        std::fs::create_dir_all(&root).unwrap_or_else(|_| unreachable!());
        let day = sample_day();
        let good = format!("{}\t10\n", super::encode_hex("http://a.example"));
        let content = format!("{good}oops no tab\n{good}");
        std::fs::write(root.join(format!("search_history_{day}.log")), content)
            .unwrap_or_else(|_| unreachable!());

        let store = PersistentStore::new(root.clone());
        let outcome = store.read_history_log(day).unwrap_or_default();
        assert!(outcome.truncated);
        assert_eq!(outcome.entries.len(), 1);

        let _ = std::fs::remove_dir_all(root);
    }

    #[test]
    fn missing_log_reads_as_empty_not_error() {
        let store = PersistentStore::new(temp_store_root("history-missing"));
        assert_eq!(
            store.read_history_log(sample_day()),
            Ok(HistoryReadOutcome::default())
        );
    }

    #[test]
    fn history_days_list_most_recent_first() {
        let root = temp_store_root("history-list");
        let store = PersistentStore::new(root.clone());
        let entry = HistoryEntry::new(Destination::from_stored("http://example.com"), 1);

        for day in [
            DayKey::from_date(date!(2024 - 04 - 29)),
            DayKey::from_date(date!(2024 - 05 - 02)),
            DayKey::from_date(date!(2024 - 05 - 01)),
        ] {
            assert!(store.append_history_entry(day, &entry).is_ok());
        }

        let days = store.list_history_days().unwrap_or_default();
        assert_eq!(
            days,
            vec![
                DayKey::from_date(date!(2024 - 05 - 02)),
                DayKey::from_date(date!(2024 - 05 - 01)),
                DayKey::from_date(date!(2024 - 04 - 29)),
            ]
        );

        let _ = std::fs::remove_dir_all(root);
    }

    #[test]
    fn unrelated_files_are_not_listed_as_history_days() {
        let root = temp_store_root("history-list-noise");
        std::fs::create_dir_all(&root).unwrap_or_else(|_| unreachable!());
        std::fs::write(root.join("bookmarks.kv"), "").unwrap_or_else(|_| unreachable!());
        std::fs::write(root.join("search_history_nonsense.log"), "")
            .unwrap_or_else(|_| unreachable!());

        let store = PersistentStore::new(root.clone());
        assert_eq!(store.list_history_days(), Ok(Vec::new()));

        let _ = std::fs::remove_dir_all(root);
    }

    #[test]
    fn history_file_name_parsing_is_strict() {
        assert!(history_day_from_file_name("search_history_2024-05-01.log").is_some());
        assert!(history_day_from_file_name("search_history_2024-05-01.txt").is_none());
        assert!(history_day_from_file_name("history_2024-05-01.log").is_none());
        assert!(history_day_from_file_name("bookmarks.kv").is_none());
    }
}
