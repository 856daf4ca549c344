//! Property-based tests for criteria filtering
//!
//! For randomly generated stores and filters, the query service must return
//! exactly the issues that a direct field-by-field evaluation selects, and
//! the count must agree with the result size.

use super::*;
use crate::domain::{Comment, Issue, Priority, Resolution, User};
use crate::storage::{InMemoryStorage, IssueStore};
use chrono::{DateTime, TimeZone, Utc};
use proptest::prelude::*;

fn day(n: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(n * 86_400, 0).unwrap()
}

// Generator for stored issues with sparse optional fields
fn issue_strategy() -> impl Strategy<Value = Issue> {
    (
        0i32..10,
        prop::option::of(prop::sample::select(Priority::ALL.to_vec())),
        prop::option::of(prop::sample::select(Resolution::ALL.to_vec())),
        prop::option::of(0i64..5),
        prop::option::of(0i64..4),
        prop::option::of(0i64..10),
        0usize..3,
    )
        .prop_map(|(number, priority, resolution, reviewer_id, user_id, reported, comments)| {
            let mut issue = Issue::new(number);
            issue.reported_date = reported.map(day);
            issue.priority = priority;
            issue.resolution = resolution;
            issue.reviewer_id = reviewer_id;
            issue.user = user_id.map(User::new);
            for n in 0..comments {
                issue.add_comment(Comment::new(format!("comment {}", n)));
            }
            issue
        })
}

fn seeded(issues: Vec<Issue>) -> (InMemoryStorage, Vec<Issue>) {
    let storage = InMemoryStorage::new();
    let saved = issues
        .into_iter()
        .map(|issue| storage.save(issue).unwrap())
        .collect();
    (storage, saved)
}

fn ids(issues: &[Issue]) -> Vec<i64> {
    issues.iter().filter_map(|i| i.id).collect()
}

fn check(
    storage: &InMemoryStorage,
    all: &[Issue],
    criteria: &IssueCriteria,
    expected: impl Fn(&Issue) -> bool,
) -> Result<(), TestCaseError> {
    let service = IssueQueryService::new(storage.clone());
    let found = service.find_by_criteria(Some(criteria)).unwrap();
    let direct: Vec<Issue> = all.iter().filter(|i| expected(i)).cloned().collect();

    prop_assert_eq!(ids(&found), ids(&direct));
    prop_assert_eq!(
        service.count_by_criteria(Some(criteria)).unwrap(),
        direct.len() as u64
    );
    Ok(())
}

// Property 1: number range bounds select exactly the matching numbers
proptest! {
    #[test]
    fn prop_number_range_matches_direct_evaluation(
        issues in prop::collection::vec(issue_strategy(), 0..12),
        low in 0i32..10,
        high in 0i32..10,
    ) {
        let (storage, all) = seeded(issues);
        let criteria = IssueCriteria {
            number: Some(RangeFilter {
                greater_than_or_equal: Some(low),
                less_than: Some(high),
                ..Default::default()
            }),
            ..Default::default()
        };

        check(&storage, &all, &criteria, |i| {
            i.number.is_some_and(|n| n >= low && n < high)
        })?;
    }
}

// Property 2: resolution.in selects exactly the listed, non-null resolutions
proptest! {
    #[test]
    fn prop_resolution_in_matches_direct_evaluation(
        issues in prop::collection::vec(issue_strategy(), 0..12),
        wanted in prop::collection::vec(prop::sample::select(Resolution::ALL.to_vec()), 0..4),
    ) {
        let (storage, all) = seeded(issues);
        let criteria = IssueCriteria {
            resolution: Some(Filter::is_in(wanted.clone())),
            ..Default::default()
        };

        check(&storage, &all, &criteria, |i| {
            i.resolution.is_some_and(|r| wanted.contains(&r))
        })?;
    }
}

// Property 3: specified and notEquals follow null semantics
proptest! {
    #[test]
    fn prop_reviewer_null_semantics(
        issues in prop::collection::vec(issue_strategy(), 0..12),
        specified in any::<bool>(),
        excluded in 0i64..5,
    ) {
        let (storage, all) = seeded(issues);

        let criteria = IssueCriteria {
            reviewer_id: Some(RangeFilter::from(Filter::specified(specified))),
            ..Default::default()
        };
        check(&storage, &all, &criteria, |i| i.reviewer_id.is_some() == specified)?;

        let criteria = IssueCriteria {
            reviewer_id: Some(RangeFilter::from(Filter::not_equals(excluded))),
            ..Default::default()
        };
        check(&storage, &all, &criteria, |i| {
            i.reviewer_id.is_some_and(|r| r != excluded)
        })?;
    }
}

// Property 4: relation filters match when any related row matches
proptest! {
    #[test]
    fn prop_relation_filters_match_any_row(
        issues in prop::collection::vec(issue_strategy(), 0..12),
        comment_id in 1i64..20,
        user_id in 0i64..4,
    ) {
        let (storage, all) = seeded(issues);

        let criteria = IssueCriteria {
            comment_id: Some(Filter::equals(comment_id)),
            ..Default::default()
        };
        check(&storage, &all, &criteria, |i| {
            i.comments.iter().any(|c| c.id == Some(comment_id))
        })?;

        let criteria = IssueCriteria {
            comment_id: Some(Filter::specified(false)),
            user_id: Some(Filter::not_equals(user_id)),
            ..Default::default()
        };
        check(&storage, &all, &criteria, |i| {
            i.comments.is_empty() && i.user.as_ref().is_some_and(|u| u.id != user_id)
        })?;
    }
}

// Property 5: priority notIn plus equals precedence
proptest! {
    #[test]
    fn prop_priority_filters(
        issues in prop::collection::vec(issue_strategy(), 0..12),
        excluded in prop::collection::vec(prop::sample::select(Priority::ALL.to_vec()), 0..3),
        chosen in prop::sample::select(Priority::ALL.to_vec()),
    ) {
        let (storage, all) = seeded(issues);

        let criteria = IssueCriteria {
            priority: Some(Filter::not_in(excluded.clone())),
            ..Default::default()
        };
        check(&storage, &all, &criteria, |i| {
            i.priority.is_some_and(|p| !excluded.contains(&p))
        })?;

        // equals wins over notIn
        let criteria = IssueCriteria {
            priority: Some(Filter {
                equals: Some(chosen),
                not_in_values: Some(vec![chosen]),
                ..Default::default()
            }),
            ..Default::default()
        };
        check(&storage, &all, &criteria, |i| i.priority == Some(chosen))?;
    }
}

// Property 6: reportedDate bounds compare instants, and unset dates never match
proptest! {
    #[test]
    fn prop_reported_date_range_matches_direct_evaluation(
        issues in prop::collection::vec(issue_strategy(), 0..12),
        after in 0i64..10,
        until in 0i64..10,
        on in 0i64..10,
    ) {
        let (storage, all) = seeded(issues);

        let criteria = IssueCriteria {
            reported_date: Some(RangeFilter {
                greater_than: Some(day(after)),
                less_than_or_equal: Some(day(until)),
                ..Default::default()
            }),
            ..Default::default()
        };
        check(&storage, &all, &criteria, |i| {
            i.reported_date.is_some_and(|d| d > day(after) && d <= day(until))
        })?;

        let criteria = IssueCriteria {
            reported_date: Some(RangeFilter::from(Filter::equals(day(on)))),
            ..Default::default()
        };
        check(&storage, &all, &criteria, |i| i.reported_date == Some(day(on)))?;
    }
}
