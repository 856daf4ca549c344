//! In-memory storage implementation.
//!
//! This backend keeps all issues in RAM. It backs the server's `memory`
//! storage mode and makes service and API tests fast and isolated.

use crate::domain::Issue;
use crate::errors::TrackerError;
use crate::storage::{IssueStore, Sequences};
use anyhow::{anyhow, Result};
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
struct State {
    issues: BTreeMap<i64, Issue>,
    sequences: Sequences,
}

/// In-memory storage backend.
///
/// All data is lost when the last clone is dropped. Uses `Arc<RwLock<>>` for
/// shared interior mutability - clones share the same data, and each
/// mutation runs under a single write guard.
///
/// # Examples
///
/// ```
/// use issuetracker::domain::Issue;
/// use issuetracker::storage::{InMemoryStorage, IssueStore};
///
/// let storage = InMemoryStorage::new();
/// let saved = storage.save(Issue::new(1)).unwrap();
/// assert_eq!(saved.id, Some(1));
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryStorage {
    state: Arc<RwLock<State>>,
}

impl InMemoryStorage {
    /// Create a new, empty in-memory storage instance.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|_| anyhow!("In-memory store lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|_| anyhow!("In-memory store lock poisoned"))
    }
}

impl IssueStore for InMemoryStorage {
    fn init(&self) -> Result<()> {
        // No initialization needed for in-memory storage
        Ok(())
    }

    fn save(&self, mut issue: Issue) -> Result<Issue> {
        let mut state = self.write()?;

        let stored = match issue.id {
            Some(id) => match state.issues.get(&id) {
                Some(stored) => Some(stored.clone()),
                None => return Err(anyhow::Error::new(TrackerError::not_found(id))),
            },
            None => None,
        };

        state.sequences.prepare(&mut issue, stored.as_ref())?;
        if let Some(id) = issue.id {
            state.issues.insert(id, issue.clone());
        }
        Ok(issue)
    }

    fn find_all(&self) -> Result<Vec<Issue>> {
        Ok(self.read()?.issues.values().cloned().collect())
    }

    fn find_by_id(&self, id: i64) -> Result<Option<Issue>> {
        Ok(self.read()?.issues.get(&id).cloned())
    }

    fn delete_by_id(&self, id: i64) -> Result<()> {
        self.write()?.issues.remove(&id);
        Ok(())
    }
}
