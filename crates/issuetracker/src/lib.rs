//! Issue Tracker Library
//!
//! Core of the issue tracker: the issue entity, storage backends, the
//! criteria query engine and the issue service. The HTTP API lives in the
//! `issuetracker-server` crate.

pub mod config;
pub mod domain;
pub mod errors;
pub mod query;
pub mod service;
pub mod storage;

// Re-export commonly used types
pub use config::{EffectiveConfig, StorageBackend, TrackerConfig};
pub use domain::{Comment, Issue, Priority, Resolution, User};
pub use errors::TrackerError;
pub use query::{IssueCriteria, IssueQueryService, Page, PageRequest, Sort};
pub use service::IssueService;
pub use storage::{InMemoryStorage, IssueStore, JsonFileStorage};
