//! Issue service: validation plus persistence.
//!
//! Thin layer over an [`IssueStore`]. Field constraints are checked before
//! any mutation reaches the store, and storage errors are mapped into
//! [`TrackerError`].

use crate::domain::{Issue, Resolution};
use crate::errors::TrackerError;
use crate::storage::IssueStore;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct IssueService<S: IssueStore> {
    storage: S,
}

impl<S: IssueStore> IssueService<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Validate and persist an issue.
    ///
    /// Inserts when the issue has no id, otherwise updates it.
    ///
    /// # Errors
    ///
    /// - `BadRequest` (`validation`) when `number` is missing; nothing is written
    /// - `NotFound` when updating an id that is not stored
    /// - `Storage` for any backend failure
    pub fn save(&self, issue: Issue) -> Result<Issue, TrackerError> {
        debug!("Request to save Issue : {:?}", issue);
        issue.validate()?;
        self.storage.save(issue).map_err(TrackerError::from_store)
    }

    /// All issues, in id order.
    pub fn find_all(&self) -> Result<Vec<Issue>, TrackerError> {
        debug!("Request to get all Issues");
        self.storage.find_all().map_err(TrackerError::from_store)
    }

    pub fn find_one(&self, id: i64) -> Result<Option<Issue>, TrackerError> {
        debug!("Request to get Issue : {}", id);
        self.storage.find_by_id(id).map_err(TrackerError::from_store)
    }

    /// Delete by id; a missing id is not an error.
    pub fn delete(&self, id: i64) -> Result<(), TrackerError> {
        debug!("Request to delete Issue : {}", id);
        self.storage
            .delete_by_id(id)
            .map_err(TrackerError::from_store)
    }

    /// Issues with resolution NEW
    pub fn find_all_open_issues(&self) -> Result<Vec<Issue>, TrackerError> {
        debug!("Request to get all open Issues");
        self.storage
            .find_all_by_resolution(Resolution::New)
            .map_err(TrackerError::from_store)
    }

    /// Issues with resolution REVIEWED
    pub fn find_all_reviewed_issues(&self) -> Result<Vec<Issue>, TrackerError> {
        debug!("Request to get all reviewed Issues");
        self.storage
            .find_all_by_resolution(Resolution::Reviewed)
            .map_err(TrackerError::from_store)
    }
}
