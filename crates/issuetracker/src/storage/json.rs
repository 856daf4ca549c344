//! JSON file-based storage implementation.
//!
//! All data is stored as JSON files in a `data/` directory with atomic writes.

use crate::domain::Issue;
use crate::errors::TrackerError;
use crate::storage::lock::{FileLocker, LockGuard};
use crate::storage::{IssueStore, Sequences};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

const DATA_DIR: &str = "data";
const ISSUES_DIR: &str = "data/issues";
const INDEX_FILE: &str = "data/index.json";
const LOCK_FILE: &str = "data/.lock";

pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Index of all issues in the repository
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Index {
    /// Schema version for future migrations
    schema_version: u32,
    /// Next issue and comment ids
    #[serde(flatten)]
    sequences: Sequences,
    /// All issue ids, ascending
    all_ids: Vec<i64>,
}

impl Default for Index {
    fn default() -> Self {
        Self {
            schema_version: 1,
            sequences: Sequences::default(),
            all_ids: Vec::new(),
        }
    }
}

/// JSON file-based storage for issues.
///
/// This implementation stores each issue as a separate JSON file in
/// `data/issues/`, with the id index and sequences in `data/index.json`.
/// All file writes are atomic (write to temp file, then rename), and every
/// mutation runs under an exclusive lock on `data/.lock` so that the issue
/// file and the index change together.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    root: PathBuf,
    locker: FileLocker,
}

impl JsonFileStorage {
    /// Create a new JSON file storage instance at the given root path
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            locker: FileLocker::new(DEFAULT_LOCK_TIMEOUT),
        }
    }

    /// Use a different lock timeout
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.locker = FileLocker::new(timeout);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn issue_path(&self, id: i64) -> PathBuf {
        self.root.join(ISSUES_DIR).join(format!("{}.json", id))
    }

    fn lock_exclusive(&self) -> Result<LockGuard> {
        self.locker.lock_exclusive(&self.root.join(LOCK_FILE))
    }

    fn lock_shared(&self) -> Result<LockGuard> {
        self.locker.lock_shared(&self.root.join(LOCK_FILE))
    }

    fn write_json<T: Serialize>(&self, path: &Path, data: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(data).context("Failed to serialize data")?;

        // Atomic write: write to temp file, then rename
        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, json).context("Failed to write temporary file")?;
        fs::rename(&temp_path, path).context("Failed to rename temporary file")?;

        Ok(())
    }

    fn read_json<T: for<'de> Deserialize<'de>>(&self, path: &Path) -> Result<T> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to deserialize {}", path.display()))
    }

    fn load_index(&self) -> Result<Index> {
        let index_path = self.root.join(INDEX_FILE);
        self.read_json(&index_path)
    }

    fn save_index(&self, index: &Index) -> Result<()> {
        let index_path = self.root.join(INDEX_FILE);
        self.write_json(&index_path, index)
    }

    fn load_issue(&self, id: i64) -> Result<Issue> {
        self.read_json(&self.issue_path(id))
    }
}

impl IssueStore for JsonFileStorage {
    fn init(&self) -> Result<()> {
        let issues_dir = self.root.join(ISSUES_DIR);
        fs::create_dir_all(&issues_dir).context("Failed to create issues directory")?;

        let _lock = self.lock_exclusive()?;

        // Create index.json if it doesn't exist
        let index_path = self.root.join(INDEX_FILE);
        if !index_path.exists() {
            debug!("Initializing issue store at {}", self.root.join(DATA_DIR).display());
            self.save_index(&Index::default())?;
        }

        Ok(())
    }

    // Write order keeps the index authoritative: sequences are persisted
    // before any id they hand out is used, an issue file exists before the
    // index lists it, and the index drops an id before its file goes away.
    fn save(&self, mut issue: Issue) -> Result<Issue> {
        let _lock = self.lock_exclusive()?;
        let mut index = self.load_index()?;

        let stored = match issue.id {
            Some(id) if index.all_ids.binary_search(&id).is_err() => {
                return Err(anyhow::Error::new(TrackerError::not_found(id)));
            }
            Some(id) => Some(self.load_issue(id)?),
            None => None,
        };

        let before = index.sequences.clone();
        index.sequences.prepare(&mut issue, stored.as_ref())?;
        let id = issue
            .id
            .context("Issue id missing after sequence assignment")?;

        if index.sequences != before {
            self.save_index(&index)?;
        }

        self.write_json(&self.issue_path(id), &issue)?;

        if let Err(pos) = index.all_ids.binary_search(&id) {
            index.all_ids.insert(pos, id);
            if let Err(e) = self.save_index(&index) {
                // Unlisted files are never read
                let _ = fs::remove_file(self.issue_path(id));
                return Err(e);
            }
        }

        Ok(issue)
    }

    fn find_all(&self) -> Result<Vec<Issue>> {
        let _lock = self.lock_shared()?;
        let index = self.load_index()?;
        index.all_ids.iter().map(|id| self.load_issue(*id)).collect()
    }

    fn find_by_id(&self, id: i64) -> Result<Option<Issue>> {
        let _lock = self.lock_shared()?;
        let index = self.load_index()?;
        if index.all_ids.binary_search(&id).is_err() {
            return Ok(None);
        }
        self.load_issue(id).map(Some)
    }

    fn delete_by_id(&self, id: i64) -> Result<()> {
        let _lock = self.lock_exclusive()?;

        let mut index = self.load_index()?;
        if let Ok(pos) = index.all_ids.binary_search(&id) {
            index.all_ids.remove(pos);
            self.save_index(&index)?;
        }

        // The index no longer lists the id, so the delete has taken effect
        let issue_path = self.issue_path(id);
        if issue_path.exists() {
            if let Err(e) = fs::remove_file(&issue_path) {
                warn!("Failed to remove {}: {}", issue_path.display(), e);
            }
        }

        Ok(())
    }
}
