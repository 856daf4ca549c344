//! Field table for issue queries.
//!
//! Every queryable field is listed once in [`FIELDS`] with its wire name,
//! value type, the filter family it supports, and an accessor that extracts
//! its value rows from an issue. Criteria binding, predicate evaluation and
//! sorting all go through this table.

use crate::domain::{Issue, Priority, Resolution};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;

/// A comparable value extracted from an issue or parsed from a filter
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Long(i64),
    Integer(i32),
    Instant(DateTime<Utc>),
    Priority(Priority),
    Resolution(Resolution),
}

/// Values only compare within the same variant.
///
/// Enum values order by their wire name, matching how a string-mapped enum
/// column sorts.
impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Value::Long(a), Value::Long(b)) => a.partial_cmp(b),
            (Value::Integer(a), Value::Integer(b)) => a.partial_cmp(b),
            (Value::Instant(a), Value::Instant(b)) => a.partial_cmp(b),
            (Value::Priority(a), Value::Priority(b)) => a.as_str().partial_cmp(b.as_str()),
            (Value::Resolution(a), Value::Resolution(b)) => a.as_str().partial_cmp(b.as_str()),
            _ => None,
        }
    }
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Long(_) => ValueType::Long,
            Value::Integer(_) => ValueType::Integer,
            Value::Instant(_) => ValueType::Instant,
            Value::Priority(_) => ValueType::Priority,
            Value::Resolution(_) => ValueType::Resolution,
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Long(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Instant(v)
    }
}

impl From<Priority> for Value {
    fn from(v: Priority) -> Self {
        Value::Priority(v)
    }
}

impl From<Resolution> for Value {
    fn from(v: Resolution) -> Self {
        Value::Resolution(v)
    }
}

/// Filter family a field accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterKind {
    /// equals, notEquals, in, notIn, specified
    Equality,
    /// Equality operators plus greaterThan, greaterThanOrEqual, lessThan,
    /// lessThanOrEqual
    Range,
}

/// Semantic type of a field's values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Long,
    Integer,
    Instant,
    Priority,
    Resolution,
}

/// A queryable issue field or relation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueField {
    Id,
    Number,
    Priority,
    Resolution,
    ReviewerId,
    ReportedDate,
    /// Id of any attached comment (left join over comments)
    CommentId,
    /// Id of the reporting user (left join over user)
    UserId,
}

/// One row of the field table
pub struct FieldSpec {
    pub field: IssueField,
    /// Name used in query strings and sort parameters
    pub name: &'static str,
    pub value_type: ValueType,
    pub kind: FilterKind,
    /// Whether the field is reached through a relation join
    pub relation: bool,
    /// Value rows for an issue; `None` stands for SQL NULL
    pub accessor: fn(&Issue) -> Vec<Option<Value>>,
}

pub static FIELDS: [FieldSpec; 8] = [
    FieldSpec {
        field: IssueField::Id,
        name: "id",
        value_type: ValueType::Long,
        kind: FilterKind::Equality,
        relation: false,
        accessor: id_rows,
    },
    FieldSpec {
        field: IssueField::Number,
        name: "number",
        value_type: ValueType::Integer,
        kind: FilterKind::Range,
        relation: false,
        accessor: number_rows,
    },
    FieldSpec {
        field: IssueField::Priority,
        name: "priority",
        value_type: ValueType::Priority,
        kind: FilterKind::Equality,
        relation: false,
        accessor: priority_rows,
    },
    FieldSpec {
        field: IssueField::Resolution,
        name: "resolution",
        value_type: ValueType::Resolution,
        kind: FilterKind::Equality,
        relation: false,
        accessor: resolution_rows,
    },
    FieldSpec {
        field: IssueField::ReviewerId,
        name: "reviewerId",
        value_type: ValueType::Long,
        kind: FilterKind::Range,
        relation: false,
        accessor: reviewer_id_rows,
    },
    FieldSpec {
        field: IssueField::ReportedDate,
        name: "reportedDate",
        value_type: ValueType::Instant,
        kind: FilterKind::Range,
        relation: false,
        accessor: reported_date_rows,
    },
    FieldSpec {
        field: IssueField::CommentId,
        name: "commentId",
        value_type: ValueType::Long,
        kind: FilterKind::Equality,
        relation: true,
        accessor: comment_id_rows,
    },
    FieldSpec {
        field: IssueField::UserId,
        name: "userId",
        value_type: ValueType::Long,
        kind: FilterKind::Equality,
        relation: true,
        accessor: user_id_rows,
    },
];

fn id_rows(issue: &Issue) -> Vec<Option<Value>> {
    vec![issue.id.map(Value::from)]
}

fn number_rows(issue: &Issue) -> Vec<Option<Value>> {
    vec![issue.number.map(Value::from)]
}

fn priority_rows(issue: &Issue) -> Vec<Option<Value>> {
    vec![issue.priority.map(Value::from)]
}

fn resolution_rows(issue: &Issue) -> Vec<Option<Value>> {
    vec![issue.resolution.map(Value::from)]
}

fn reviewer_id_rows(issue: &Issue) -> Vec<Option<Value>> {
    vec![issue.reviewer_id.map(Value::from)]
}

fn reported_date_rows(issue: &Issue) -> Vec<Option<Value>> {
    vec![issue.reported_date.map(Value::from)]
}

// Left join: an issue without comments still yields one all-NULL row.
fn comment_id_rows(issue: &Issue) -> Vec<Option<Value>> {
    if issue.comments.is_empty() {
        return vec![None];
    }
    issue
        .comments
        .iter()
        .map(|c| c.id.map(Value::from))
        .collect()
}

fn user_id_rows(issue: &Issue) -> Vec<Option<Value>> {
    vec![issue.user.as_ref().map(|u| Value::Long(u.id))]
}

impl IssueField {
    /// This field's row in the table
    pub fn spec(self) -> &'static FieldSpec {
        FIELDS
            .iter()
            .find(|spec| spec.field == self)
            .unwrap_or_else(|| unreachable!("every IssueField has a table row"))
    }

    /// Look a field up by its query-string name
    pub fn from_name(name: &str) -> Option<IssueField> {
        FIELDS
            .iter()
            .find(|spec| spec.name == name)
            .map(|spec| spec.field)
    }

    pub fn name(self) -> &'static str {
        self.spec().name
    }

    pub fn kind(self) -> FilterKind {
        self.spec().kind
    }

    pub fn is_relation(self) -> bool {
        self.spec().relation
    }

    /// Value rows this field contributes for `issue`
    pub fn rows(self, issue: &Issue) -> Vec<Option<Value>> {
        (self.spec().accessor)(issue)
    }

    /// Single value of a non-relation field
    pub fn scalar(self, issue: &Issue) -> Option<Value> {
        self.rows(issue).into_iter().next().flatten()
    }
}
