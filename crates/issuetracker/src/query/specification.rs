//! Composable predicates over issues.
//!
//! A [`Specification`] is a small expression tree of field conditions joined
//! by AND. Evaluation follows SQL three-valued logic collapsed to a boolean:
//! a null value satisfies only `Specified(false)`, and every comparison
//! against null is false.
//!
//! Relation fields yield several rows (one per related record, or a single
//! null row when there are none). A condition on a relation holds when any of
//! its rows satisfies it, so an issue appears at most once in a result.

use super::field::{IssueField, Value};
use crate::domain::Issue;

/// One comparison applied to a field value
#[derive(Debug, Clone, PartialEq)]
pub enum Comparison {
    Equals(Value),
    NotEquals(Value),
    In(Vec<Value>),
    NotIn(Vec<Value>),
    Specified(bool),
    GreaterThan(Value),
    GreaterThanOrEqual(Value),
    LessThan(Value),
    LessThanOrEqual(Value),
}

impl Comparison {
    /// Test a single (possibly null) value
    pub fn test(&self, value: Option<&Value>) -> bool {
        let Some(value) = value else {
            return matches!(self, Comparison::Specified(false));
        };

        match self {
            Comparison::Specified(specified) => *specified,
            Comparison::Equals(expected) => value == expected,
            Comparison::NotEquals(expected) => value != expected,
            Comparison::In(list) => list.contains(value),
            Comparison::NotIn(list) => !list.contains(value),
            Comparison::GreaterThan(bound) => value > bound,
            Comparison::GreaterThanOrEqual(bound) => value >= bound,
            Comparison::LessThan(bound) => value < bound,
            Comparison::LessThanOrEqual(bound) => value <= bound,
        }
    }
}

/// A comparison bound to a field
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub field: IssueField,
    pub comparison: Comparison,
}

impl Condition {
    pub fn matches(&self, issue: &Issue) -> bool {
        self.field
            .rows(issue)
            .iter()
            .any(|row| self.comparison.test(row.as_ref()))
    }
}

/// Predicate tree over issues
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Specification {
    /// Matches every issue
    #[default]
    All,
    Condition(Condition),
    And(Box<Specification>, Box<Specification>),
}

impl Specification {
    pub fn all() -> Self {
        Specification::All
    }

    pub fn condition(field: IssueField, comparison: Comparison) -> Self {
        Specification::Condition(Condition { field, comparison })
    }

    /// Conjoin with another specification; `All` is the identity
    pub fn and(self, other: Specification) -> Specification {
        match (self, other) {
            (Specification::All, other) => other,
            (this, Specification::All) => this,
            (this, other) => Specification::And(Box::new(this), Box::new(other)),
        }
    }

    pub fn is_satisfied_by(&self, issue: &Issue) -> bool {
        match self {
            Specification::All => true,
            Specification::Condition(cond) => cond.matches(issue),
            Specification::And(left, right) => {
                left.is_satisfied_by(issue) && right.is_satisfied_by(issue)
            }
        }
    }

    /// Keep the issues this specification matches, preserving order
    pub fn filter(&self, issues: Vec<Issue>) -> Vec<Issue> {
        issues
            .into_iter()
            .filter(|issue| self.is_satisfied_by(issue))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Comment, Priority, Resolution, User};

    fn issue_with_comments(ids: &[i64]) -> Issue {
        let mut issue = Issue::new(1);
        for id in ids {
            let mut comment = Comment::new(format!("comment {}", id));
            comment.id = Some(*id);
            issue.add_comment(comment);
        }
        issue
    }

    #[test]
    fn test_null_only_matches_unspecified() {
        let issue = Issue::new(1);
        let field = IssueField::ReviewerId;

        assert!(Specification::condition(field, Comparison::Specified(false))
            .is_satisfied_by(&issue));
        assert!(!Specification::condition(field, Comparison::Specified(true))
            .is_satisfied_by(&issue));
        assert!(!Specification::condition(field, Comparison::NotEquals(Value::Long(5)))
            .is_satisfied_by(&issue));
        assert!(!Specification::condition(field, Comparison::NotIn(vec![Value::Long(5)]))
            .is_satisfied_by(&issue));
        assert!(!Specification::condition(field, Comparison::LessThan(Value::Long(5)))
            .is_satisfied_by(&issue));
    }

    #[test]
    fn test_range_comparisons() {
        let issue = Issue::new(5);
        let check = |c: Comparison| {
            Specification::condition(IssueField::Number, c).is_satisfied_by(&issue)
        };

        assert!(check(Comparison::GreaterThan(Value::Integer(4))));
        assert!(!check(Comparison::GreaterThan(Value::Integer(5))));
        assert!(check(Comparison::GreaterThanOrEqual(Value::Integer(5))));
        assert!(check(Comparison::LessThan(Value::Integer(6))));
        assert!(!check(Comparison::LessThan(Value::Integer(5))));
        assert!(check(Comparison::LessThanOrEqual(Value::Integer(5))));
    }

    #[test]
    fn test_in_and_not_in() {
        let issue = Issue::new(1).with_priority(Priority::High);
        let field = IssueField::Priority;
        let high = Value::Priority(Priority::High);
        let low = Value::Priority(Priority::Low);

        assert!(Specification::condition(field, Comparison::In(vec![low.clone(), high.clone()]))
            .is_satisfied_by(&issue));
        assert!(!Specification::condition(field, Comparison::In(vec![]))
            .is_satisfied_by(&issue));
        assert!(!Specification::condition(field, Comparison::NotIn(vec![high]))
            .is_satisfied_by(&issue));
        assert!(Specification::condition(field, Comparison::NotIn(vec![low]))
            .is_satisfied_by(&issue));
    }

    #[test]
    fn test_relation_matches_any_row() {
        let issue = issue_with_comments(&[10, 11]);
        let field = IssueField::CommentId;

        assert!(Specification::condition(field, Comparison::Equals(Value::Long(11)))
            .is_satisfied_by(&issue));
        assert!(!Specification::condition(field, Comparison::Equals(Value::Long(12)))
            .is_satisfied_by(&issue));
        // Row 11 differs from 10, so the issue still matches
        assert!(Specification::condition(field, Comparison::NotEquals(Value::Long(10)))
            .is_satisfied_by(&issue));
        assert!(Specification::condition(field, Comparison::Specified(true))
            .is_satisfied_by(&issue));
        assert!(!Specification::condition(field, Comparison::Specified(false))
            .is_satisfied_by(&issue));
    }

    #[test]
    fn test_relation_without_rows_is_null() {
        let issue = issue_with_comments(&[]);
        let field = IssueField::CommentId;

        assert!(Specification::condition(field, Comparison::Specified(false))
            .is_satisfied_by(&issue));
        assert!(!Specification::condition(field, Comparison::NotEquals(Value::Long(1)))
            .is_satisfied_by(&issue));

        let no_user = Issue::new(1);
        let with_user = Issue::new(1).with_user(User::new(7));
        let spec = Specification::condition(IssueField::UserId, Comparison::Equals(Value::Long(7)));
        assert!(!spec.is_satisfied_by(&no_user));
        assert!(spec.is_satisfied_by(&with_user));
    }

    #[test]
    fn test_and_with_all_is_identity() {
        let cond = Specification::condition(
            IssueField::Resolution,
            Comparison::Equals(Value::Resolution(Resolution::New)),
        );
        assert_eq!(Specification::all().and(cond.clone()), cond);
        assert_eq!(cond.clone().and(Specification::all()), cond);
        assert_eq!(Specification::all().and(Specification::all()), Specification::All);
    }

    #[test]
    fn test_and_requires_both() {
        let spec = Specification::condition(IssueField::Number, Comparison::Equals(Value::Integer(1)))
            .and(Specification::condition(
                IssueField::Resolution,
                Comparison::Equals(Value::Resolution(Resolution::New)),
            ));

        assert!(spec.is_satisfied_by(&Issue::new(1).with_resolution(Resolution::New)));
        assert!(!spec.is_satisfied_by(&Issue::new(1).with_resolution(Resolution::Fixed)));
        assert!(!spec.is_satisfied_by(&Issue::new(2).with_resolution(Resolution::New)));
    }

    #[test]
    fn test_filter_preserves_order() {
        let issues = vec![Issue::new(3), Issue::new(1), Issue::new(2)];
        let spec = Specification::condition(IssueField::Number, Comparison::NotEquals(Value::Integer(1)));
        let numbers: Vec<_> = spec
            .filter(issues)
            .into_iter()
            .map(|i| i.number.unwrap())
            .collect();
        assert_eq!(numbers, vec![3, 2]);
    }
}
