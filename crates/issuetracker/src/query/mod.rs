//! Criteria-based issue queries.
//!
//! Layers, bottom-up:
//! - [`field`]: the table of queryable fields and their value accessors
//! - [`specification`]: composable predicates over issues
//! - [`filter`]: typed per-field filters that translate into specifications
//! - [`criteria`]: the filter bag bound from query strings
//! - [`page`]: paging and sorting
//! - [`service`]: the query service that runs criteria against a store
//!
//! # Examples
//!
//! ```
//! use issuetracker::domain::{Issue, Resolution};
//! use issuetracker::query::{IssueCriteria, IssueQueryService};
//! use issuetracker::storage::{InMemoryStorage, IssueStore};
//!
//! let storage = InMemoryStorage::new();
//! storage.save(Issue::new(1).with_resolution(Resolution::New)).unwrap();
//! storage.save(Issue::new(2).with_resolution(Resolution::Fixed)).unwrap();
//!
//! let criteria = IssueCriteria::from_query_pairs(&[("resolution.in", "NEW,RELEASED")]).unwrap();
//! let service = IssueQueryService::new(storage);
//! assert_eq!(service.count_by_criteria(Some(&criteria)).unwrap(), 1);
//! ```

pub mod criteria;
pub mod field;
pub mod filter;
pub mod page;
pub mod service;
pub mod specification;

#[cfg(test)]
mod criteria_proptests;

pub use criteria::IssueCriteria;
pub use field::{FieldSpec, FilterKind, IssueField, Value, ValueType, FIELDS};
pub use filter::{Filter, FilterValue, Operator, RangeFilter};
pub use page::{Direction, Page, PageRequest, Sort, SortOrder};
pub use service::IssueQueryService;
pub use specification::{Comparison, Condition, Specification};
