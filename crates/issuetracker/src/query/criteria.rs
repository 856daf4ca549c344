//! Request-shaped filter bag for issue searches.
//!
//! [`IssueCriteria`] holds one optional filter per queryable field. It is
//! usually bound from flat query-string pairs of the form
//! `<field>.<operator>=<value>`:
//!
//! ```text
//! number.equals=5
//! priority.in=SHOWSTOPPER,EMERGENCY
//! reportedDate.specified=true
//! commentId.equals=12
//! ```

use super::field::{FilterKind, IssueField};
use super::filter::{Filter, Operator, RangeFilter};
use super::specification::Specification;
use crate::domain::{Priority, Resolution};
use crate::errors::TrackerError;
use chrono::{DateTime, Utc};
use std::fmt;
use tracing::debug;

/// Parameters handled by paging and sorting rather than by criteria
const PAGING_PARAMS: [&str; 3] = ["page", "size", "sort"];

/// Optional per-field filters; absent filters impose no constraint
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IssueCriteria {
    pub id: Option<Filter<i64>>,
    pub number: Option<RangeFilter<i32>>,
    pub priority: Option<Filter<Priority>>,
    pub resolution: Option<Filter<Resolution>>,
    pub reviewer_id: Option<RangeFilter<i64>>,
    pub reported_date: Option<RangeFilter<DateTime<Utc>>>,
    pub comment_id: Option<Filter<i64>>,
    pub user_id: Option<Filter<i64>>,
}

impl IssueCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no filter is set
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Bind criteria from decoded query-string pairs.
    ///
    /// Unknown fields, unknown operators and range operators on equality-only
    /// fields are skipped. Paging parameters (`page`, `size`, `sort`) are left
    /// for [`PageRequest`](super::page::PageRequest).
    ///
    /// # Errors
    ///
    /// Returns `BadRequest` with key `badfilter` when a value cannot be parsed
    /// as the field's type.
    pub fn from_query_pairs<K, V>(pairs: &[(K, V)]) -> Result<Self, TrackerError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut criteria = Self::default();
        for (key, value) in pairs {
            criteria.bind(key.as_ref(), value.as_ref())?;
        }
        Ok(criteria)
    }

    fn bind(&mut self, key: &str, raw: &str) -> Result<(), TrackerError> {
        if PAGING_PARAMS.contains(&key) {
            return Ok(());
        }

        let Some((name, op_name)) = key.split_once('.') else {
            debug!("Ignoring query parameter without operator: {}", key);
            return Ok(());
        };
        let Some(field) = IssueField::from_name(name) else {
            debug!("Ignoring filter on unknown field: {}", key);
            return Ok(());
        };
        let Some(op) = Operator::parse(op_name) else {
            debug!("Ignoring unknown filter operator: {}", key);
            return Ok(());
        };
        if op.is_range() && field.kind() == FilterKind::Equality {
            debug!("Ignoring range operator on equality-only field: {}", key);
            return Ok(());
        }

        let bound = match field {
            IssueField::Id => bind_slot(&mut self.id, |f| f.bind(op, raw)),
            IssueField::Number => bind_slot(&mut self.number, |f| f.bind(op, raw)),
            IssueField::Priority => bind_slot(&mut self.priority, |f| f.bind(op, raw)),
            IssueField::Resolution => bind_slot(&mut self.resolution, |f| f.bind(op, raw)),
            IssueField::ReviewerId => bind_slot(&mut self.reviewer_id, |f| f.bind(op, raw)),
            IssueField::ReportedDate => bind_slot(&mut self.reported_date, |f| f.bind(op, raw)),
            IssueField::CommentId => bind_slot(&mut self.comment_id, |f| f.bind(op, raw)),
            IssueField::UserId => bind_slot(&mut self.user_id, |f| f.bind(op, raw)),
        };

        bound
            .map(|_| ())
            .map_err(|msg| TrackerError::bad_filter(format!("Invalid value for {}: {}", key, msg)))
    }

    /// Conjunction of every present filter
    pub fn to_specification(&self) -> Specification {
        let parts = [
            self.id.as_ref().map(|f| f.to_specification(IssueField::Id)),
            self.number
                .as_ref()
                .map(|f| f.to_specification(IssueField::Number)),
            self.priority
                .as_ref()
                .map(|f| f.to_specification(IssueField::Priority)),
            self.resolution
                .as_ref()
                .map(|f| f.to_specification(IssueField::Resolution)),
            self.reviewer_id
                .as_ref()
                .map(|f| f.to_specification(IssueField::ReviewerId)),
            self.reported_date
                .as_ref()
                .map(|f| f.to_specification(IssueField::ReportedDate)),
            self.comment_id
                .as_ref()
                .map(|f| f.to_specification(IssueField::CommentId)),
            self.user_id
                .as_ref()
                .map(|f| f.to_specification(IssueField::UserId)),
        ];

        parts
            .into_iter()
            .flatten()
            .fold(Specification::all(), Specification::and)
    }
}

// Creates the filter on first use; a binding that did not apply leaves an
// absent slot absent.
fn bind_slot<F: Default>(
    slot: &mut Option<F>,
    bind: impl FnOnce(&mut F) -> Result<bool, String>,
) -> Result<bool, String> {
    let was_empty = slot.is_none();
    let filter = slot.get_or_insert_with(F::default);
    let bound = bind(filter);
    if was_empty && !matches!(bound, Ok(true)) {
        *slot = None;
    }
    bound
}

impl fmt::Display for IssueCriteria {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = Vec::new();
        if let Some(v) = &self.id {
            parts.push(format!("id={:?}", v));
        }
        if let Some(v) = &self.number {
            parts.push(format!("number={:?}", v));
        }
        if let Some(v) = &self.priority {
            parts.push(format!("priority={:?}", v));
        }
        if let Some(v) = &self.resolution {
            parts.push(format!("resolution={:?}", v));
        }
        if let Some(v) = &self.reviewer_id {
            parts.push(format!("reviewerId={:?}", v));
        }
        if let Some(v) = &self.reported_date {
            parts.push(format!("reportedDate={:?}", v));
        }
        if let Some(v) = &self.comment_id {
            parts.push(format!("commentId={:?}", v));
        }
        if let Some(v) = &self.user_id {
            parts.push(format!("userId={:?}", v));
        }
        write!(f, "IssueCriteria{{{}}}", parts.join(", "))
    }
}
