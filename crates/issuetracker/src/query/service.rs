//! Criteria-based issue search.
//!
//! [`IssueQueryService`] turns an [`IssueCriteria`] into a [`Specification`]
//! and runs it against an [`IssueStore`].

use super::criteria::IssueCriteria;
use super::page::{Page, PageRequest, Sort};
use super::specification::Specification;
use crate::domain::Issue;
use crate::errors::TrackerError;
use crate::storage::IssueStore;
use tracing::debug;

/// Read-only search over issues
#[derive(Debug, Clone)]
pub struct IssueQueryService<S: IssueStore> {
    storage: S,
}

impl<S: IssueStore> IssueQueryService<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Predicate for `criteria`; `None` matches every issue
    pub fn create_specification(&self, criteria: Option<&IssueCriteria>) -> Specification {
        criteria
            .map(IssueCriteria::to_specification)
            .unwrap_or_default()
    }

    /// Issues matching `criteria`, in id order.
    ///
    /// # Errors
    ///
    /// `TrackerError::Storage` if the store cannot be read.
    pub fn find_by_criteria(
        &self,
        criteria: Option<&IssueCriteria>,
    ) -> Result<Vec<Issue>, TrackerError> {
        debug!("find by criteria : {}", describe_criteria(criteria));
        let spec = self.create_specification(criteria);
        self.storage
            .find_all_matching(&spec)
            .map_err(TrackerError::from_store)
    }

    /// Issues matching `criteria`, ordered by `sort`.
    ///
    /// # Errors
    ///
    /// Same as [`IssueQueryService::find_by_criteria`].
    pub fn find_by_criteria_sorted(
        &self,
        criteria: Option<&IssueCriteria>,
        sort: &Sort,
    ) -> Result<Vec<Issue>, TrackerError> {
        let mut issues = self.find_by_criteria(criteria)?;
        sort.apply(&mut issues);
        Ok(issues)
    }

    /// One page of issues matching `criteria`.
    ///
    /// # Errors
    ///
    /// Same as [`IssueQueryService::find_by_criteria`].
    pub fn find_by_criteria_paged(
        &self,
        criteria: Option<&IssueCriteria>,
        page: &PageRequest,
    ) -> Result<Page<Issue>, TrackerError> {
        debug!(
            "find by criteria : {}, page: {}, size: {}",
            describe_criteria(criteria),
            page.page,
            page.size
        );
        let mut issues = self
            .storage
            .find_all_matching(&self.create_specification(criteria))
            .map_err(TrackerError::from_store)?;
        page.sort.apply(&mut issues);
        Ok(Page::slice(issues, page))
    }

    /// Number of issues matching `criteria`.
    ///
    /// # Errors
    ///
    /// Same as [`IssueQueryService::find_by_criteria`].
    pub fn count_by_criteria(&self, criteria: Option<&IssueCriteria>) -> Result<u64, TrackerError> {
        debug!("count by criteria : {}", describe_criteria(criteria));
        let spec = self.create_specification(criteria);
        self.storage
            .count_matching(&spec)
            .map_err(TrackerError::from_store)
    }
}

fn describe_criteria(criteria: Option<&IssueCriteria>) -> String {
    match criteria {
        Some(criteria) if !criteria.is_empty() => criteria.to_string(),
        _ => "none".to_string(),
    }
}
