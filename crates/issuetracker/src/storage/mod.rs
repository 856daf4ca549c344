//! Storage abstraction layer for persisting issues.
//!
//! This module defines the `IssueStore` trait that abstracts storage operations,
//! allowing different backends (JSON files, in-memory) to be used
//! interchangeably.

use crate::domain::{Issue, Resolution};
use crate::query::{Comparison, IssueField, Specification};
use crate::errors::TrackerError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub mod json;
pub mod lock;
pub mod memory;

// Re-export for convenience
pub use json::JsonFileStorage;
pub use lock::FileLocker;
pub use memory::InMemoryStorage;

/// Trait for storage backends that persist issues.
///
/// This trait allows the services to be decoupled from the specific storage
/// implementation. Implementations must be `Clone` to support shared access
/// patterns, and every mutation must be atomic: a failed `save` or
/// `delete_by_id` leaves the store unchanged.
///
/// Backends report typed failures (such as updating an unknown id) by
/// wrapping a [`TrackerError`](crate::errors::TrackerError) in the returned
/// `anyhow::Error`.
///
/// # Examples
///
/// ```
/// use issuetracker::domain::Issue;
/// use issuetracker::storage::{InMemoryStorage, IssueStore};
///
/// let storage = InMemoryStorage::new();
/// storage.init().unwrap();
///
/// let saved = storage.save(Issue::new(7)).unwrap();
/// let loaded = storage.find_by_id(saved.id.unwrap()).unwrap().unwrap();
/// assert_eq!(loaded.number, Some(7));
/// ```
pub trait IssueStore: Clone {
    /// Initialize the storage backend (idempotent).
    ///
    /// Creates necessary directories and files.
    fn init(&self) -> Result<()>;

    /// Insert or update an issue.
    ///
    /// An issue without an id is inserted under the next id from the store's
    /// sequence. An issue with an id replaces the stored issue with that id.
    /// Comments without an id are assigned one, and every comment's
    /// back-reference is pointed at the issue.
    ///
    /// Returns the persisted state, including generated ids.
    ///
    /// # Errors
    ///
    /// Returns a wrapped `TrackerError::NotFound` if the issue has an id that
    /// is not stored, a wrapped `TrackerError::BadRequest` if a comment
    /// carries an id that is not stored on this issue, or an error if the
    /// issue cannot be persisted.
    fn save(&self, issue: Issue) -> Result<Issue>;

    /// All issues, ordered by id ascending.
    ///
    /// # Errors
    ///
    /// Returns an error if issues cannot be loaded.
    fn find_all(&self) -> Result<Vec<Issue>>;

    /// Load an issue by id, `None` if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the issue exists but cannot be loaded.
    fn find_by_id(&self, id: i64) -> Result<Option<Issue>>;

    /// Delete an issue by id. Deleting an absent id is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the issue cannot be removed.
    fn delete_by_id(&self, id: i64) -> Result<()>;

    /// All issues with the given resolution, ordered by id.
    ///
    /// # Errors
    ///
    /// Same as [`IssueStore::find_all`].
    fn find_all_by_resolution(&self, resolution: Resolution) -> Result<Vec<Issue>> {
        let spec = Specification::condition(
            IssueField::Resolution,
            Comparison::Equals(resolution.into()),
        );
        self.find_all_matching(&spec)
    }

    /// All issues matching `spec`, ordered by id.
    ///
    /// # Errors
    ///
    /// Same as [`IssueStore::find_all`].
    fn find_all_matching(&self, spec: &Specification) -> Result<Vec<Issue>> {
        Ok(spec.filter(self.find_all()?))
    }

    /// Number of issues matching `spec`.
    ///
    /// # Errors
    ///
    /// Same as [`IssueStore::find_all`].
    fn count_matching(&self, spec: &Specification) -> Result<u64> {
        let count = self
            .find_all()?
            .iter()
            .filter(|issue| spec.is_satisfied_by(issue))
            .count();
        Ok(count as u64)
    }

    /// Total number of stored issues.
    ///
    /// # Errors
    ///
    /// Same as [`IssueStore::find_all`].
    fn count(&self) -> Result<u64> {
        self.count_matching(&Specification::all())
    }
}

/// Id sequences shared by both backends.
///
/// Ids start at 1 and are only ever handed out by the sequence. A client may
/// keep the id of a comment already stored on the same issue, but never
/// introduce one of its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Sequences {
    next_issue_id: i64,
    next_comment_id: i64,
}

impl Default for Sequences {
    fn default() -> Self {
        Self {
            next_issue_id: 1,
            next_comment_id: 1,
        }
    }
}

impl Sequences {
    /// Assign an id if the issue has none, then number and relink its comments.
    ///
    /// `stored` is the persisted version of the issue on update, `None` on
    /// insert. Nothing changes, in the issue or the sequences, unless the
    /// whole call succeeds.
    ///
    /// # Errors
    ///
    /// Returns a wrapped `TrackerError::BadRequest` if a comment id is not
    /// among `stored`'s comments or appears twice, or an error if a sequence
    /// is exhausted.
    pub(crate) fn prepare(&mut self, issue: &mut Issue, stored: Option<&Issue>) -> Result<()> {
        let mut seen = HashSet::new();
        for id in issue.comments.iter().filter_map(|c| c.id) {
            let attached = stored.is_some_and(|s| s.comments.iter().any(|c| c.id == Some(id)));
            if !attached || !seen.insert(id) {
                return Err(anyhow::Error::new(TrackerError::foreign_comment(id)));
            }
        }

        let mut next = self.clone();
        let issue_id = match issue.id {
            Some(id) => id,
            None => take(&mut next.next_issue_id, "issue")?,
        };
        let unnumbered = issue.comments.iter().filter(|c| c.id.is_none()).count();
        let comment_ids = (0..unnumbered)
            .map(|_| take(&mut next.next_comment_id, "comment"))
            .collect::<Result<Vec<_>>>()?;

        *self = next;
        issue.id = Some(issue_id);
        let unnumbered = issue.comments.iter_mut().filter(|c| c.id.is_none());
        for (comment, id) in unnumbered.zip(comment_ids) {
            comment.id = Some(id);
        }
        issue.relink_comments();
        Ok(())
    }
}

fn take(counter: &mut i64, name: &str) -> Result<i64> {
    let id = *counter;
    *counter = id
        .checked_add(1)
        .with_context(|| format!("The {} id sequence is exhausted", name))?;
    Ok(id)
}
