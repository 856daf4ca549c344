//! Core domain types for the issue tracker.
//!
//! This module defines the issue entity, the comment and user records it
//! relates to, and the closed enumerations for priority and resolution.

use crate::errors::TrackerError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Entity name used in error keys and alert headers
pub const ISSUE_ENTITY: &str = "issue";

/// Issue severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    /// Blocks a release outright
    Showstopper,
    /// Needs a fix right away
    Emergency,
    High,
    Low,
    Routine,
    /// Parked for a later cycle
    Defer,
}

impl Priority {
    /// All variants in declaration order
    pub const ALL: [Priority; 6] = [
        Priority::Showstopper,
        Priority::Emergency,
        Priority::High,
        Priority::Low,
        Priority::Routine,
        Priority::Defer,
    ];

    /// Wire name of this priority (e.g. "SHOWSTOPPER")
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Showstopper => "SHOWSTOPPER",
            Priority::Emergency => "EMERGENCY",
            Priority::High => "HIGH",
            Priority::Low => "LOW",
            Priority::Routine => "ROUTINE",
            Priority::Defer => "DEFER",
        }
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Priority::ALL
            .iter()
            .find(|p| p.as_str() == s)
            .copied()
            .ok_or_else(|| invalid_value("priority", s, Priority::ALL.map(|p| p.as_str())))
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn invalid_value<const N: usize>(kind: &str, value: &str, valid: [&str; N]) -> String {
    format!(
        "Invalid {}: '{}'. Valid values: {}",
        kind,
        value,
        valid.join(", ")
    )
}

/// Triage state of an issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Resolution {
    /// Reported, not yet triaged
    New,
    Released,
    Duplicate,
    Tested,
    Fixed,
    PartiallyFixed,
    /// Fix has been reviewed
    Reviewed,
    CannotReproduce,
}

impl Resolution {
    /// All variants in declaration order
    pub const ALL: [Resolution; 8] = [
        Resolution::New,
        Resolution::Released,
        Resolution::Duplicate,
        Resolution::Tested,
        Resolution::Fixed,
        Resolution::PartiallyFixed,
        Resolution::Reviewed,
        Resolution::CannotReproduce,
    ];

    /// Wire name of this resolution (e.g. "PARTIALLY_FIXED")
    pub fn as_str(&self) -> &'static str {
        match self {
            Resolution::New => "NEW",
            Resolution::Released => "RELEASED",
            Resolution::Duplicate => "DUPLICATE",
            Resolution::Tested => "TESTED",
            Resolution::Fixed => "FIXED",
            Resolution::PartiallyFixed => "PARTIALLY_FIXED",
            Resolution::Reviewed => "REVIEWED",
            Resolution::CannotReproduce => "CANNOT_REPRODUCE",
        }
    }
}

impl FromStr for Resolution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Resolution::ALL
            .iter()
            .find(|r| r.as_str() == s)
            .copied()
            .ok_or_else(|| invalid_value("resolution", s, Resolution::ALL.map(|r| r.as_str())))
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user account referenced by issues
///
/// Users are managed elsewhere; an issue only stores the reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub login: Option<String>,
}

impl User {
    pub fn new(id: i64) -> Self {
        Self { id, login: None }
    }
}

/// A comment attached to an issue
///
/// `issue_id` is the back-reference to the owning issue. It is kept in sync
/// by [`Issue::add_comment`], [`Issue::remove_comment`] and by the store when
/// the issue is persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub issue_id: Option<i64>,
}

impl Comment {
    /// Create an unsaved comment with the given text
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..Default::default()
        }
    }
}

/// Identity equality: only two saved comments with the same id are equal.
impl PartialEq for Comment {
    fn eq(&self, other: &Self) -> bool {
        matches!((self.id, other.id), (Some(a), Some(b)) if a == b)
    }
}

/// An issue tracked by the system
///
/// `id` is `None` until the issue is first persisted. Equality is identity
/// based, see the `PartialEq` impl below.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    /// Store-generated identifier
    #[serde(default)]
    pub id: Option<i64>,
    /// Issue number; required
    #[serde(default)]
    pub number: Option<i32>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub resolution: Option<Resolution>,
    /// Reference to an external reviewer (not a managed relation)
    #[serde(default)]
    pub reviewer_id: Option<i64>,
    #[serde(default)]
    pub reported_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub user: Option<User>,
}

impl Issue {
    /// Create an unsaved issue with the given number
    pub fn new(number: i32) -> Self {
        Self {
            number: Some(number),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = Some(resolution);
        self
    }

    pub fn with_reviewer_id(mut self, reviewer_id: i64) -> Self {
        self.reviewer_id = Some(reviewer_id);
        self
    }

    pub fn with_reported_date(mut self, reported_date: DateTime<Utc>) -> Self {
        self.reported_date = Some(reported_date);
        self
    }

    pub fn with_user(mut self, user: User) -> Self {
        self.user = Some(user);
        self
    }

    /// Attach a comment, pointing its back-reference at this issue
    pub fn add_comment(&mut self, mut comment: Comment) -> &mut Self {
        comment.issue_id = self.id;
        self.comments.push(comment);
        self
    }

    /// Detach a comment by id and clear its back-reference
    ///
    /// Returns the detached comment, or `None` if no comment with that id
    /// is attached.
    pub fn remove_comment(&mut self, comment_id: i64) -> Option<Comment> {
        let pos = self
            .comments
            .iter()
            .position(|c| c.id == Some(comment_id))?;
        let mut comment = self.comments.remove(pos);
        comment.issue_id = None;
        Some(comment)
    }

    /// Point every attached comment's back-reference at this issue's id
    pub fn relink_comments(&mut self) {
        let id = self.id;
        for comment in &mut self.comments {
            comment.issue_id = id;
        }
    }

    /// Check the entity's field constraints
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::BadRequest` if `number` is missing.
    pub fn validate(&self) -> Result<(), TrackerError> {
        if self.number.is_none() {
            return Err(TrackerError::bad_request(
                "validation",
                "Field 'number' must not be null",
            ));
        }
        Ok(())
    }

    /// Whether every stored field (id included) matches `other`
    ///
    /// Unlike `==`, this compares values rather than identity.
    pub fn same_fields(&self, other: &Issue) -> bool {
        self.id == other.id
            && self.number == other.number
            && self.description == other.description
            && self.priority == other.priority
            && self.resolution == other.resolution
            && self.reviewer_id == other.reviewer_id
            && self.reported_date == other.reported_date
            && self.user == other.user
            && self.comments.len() == other.comments.len()
            && self
                .comments
                .iter()
                .zip(&other.comments)
                .all(|(a, b)| a.id == b.id && a.description == b.description && a.date == b.date)
    }
}

/// Identity equality: only two saved issues with the same id are equal.
///
/// An unsaved issue is not equal to anything, itself included, so `Issue`
/// deliberately does not implement `Eq`.
impl PartialEq for Issue {
    fn eq(&self, other: &Self) -> bool {
        matches!((self.id, other.id), (Some(a), Some(b)) if a == b)
    }
}
