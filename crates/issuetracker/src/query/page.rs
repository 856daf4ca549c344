//! Paging and sorting of query results.
//!
//! Bound from the `page`, `size` and `sort` query parameters:
//!
//! ```text
//! page=0&size=20&sort=number,desc&sort=id
//! ```
//!
//! Results always start in id order; sort orders are applied on top with a
//! stable sort, so ties keep id order.

use super::field::IssueField;
use crate::domain::Issue;
use crate::errors::TrackerError;
use serde::Serialize;
use std::cmp::Ordering;

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const MAX_PAGE_SIZE: usize = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    fn parse(raw: &str) -> Option<Direction> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "asc" => Some(Direction::Asc),
            "desc" => Some(Direction::Desc),
            _ => None,
        }
    }
}

/// Sort by one field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortOrder {
    pub field: IssueField,
    pub direction: Direction,
}

impl SortOrder {
    pub fn asc(field: IssueField) -> Self {
        Self {
            field,
            direction: Direction::Asc,
        }
    }

    pub fn desc(field: IssueField) -> Self {
        Self {
            field,
            direction: Direction::Desc,
        }
    }

    // Nulls last ascending, first descending.
    fn compare(&self, a: &Issue, b: &Issue) -> Ordering {
        let ordering = match (self.field.scalar(a), self.field.scalar(b)) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        };
        match self.direction {
            Direction::Asc => ordering,
            Direction::Desc => ordering.reverse(),
        }
    }
}

/// Ordered list of sort orders; earlier orders take priority
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sort {
    pub orders: Vec<SortOrder>,
}

impl Sort {
    pub fn unsorted() -> Self {
        Self::default()
    }

    pub fn by(orders: Vec<SortOrder>) -> Self {
        Self { orders }
    }

    pub fn is_unsorted(&self) -> bool {
        self.orders.is_empty()
    }

    /// Parse every `sort` parameter in `pairs`.
    ///
    /// Each value is `field[,field...][,asc|desc]`; the direction applies to
    /// every field named in that value.
    ///
    /// # Errors
    ///
    /// `badfilter` for an unknown field or a relation field.
    pub fn from_query_pairs<K, V>(pairs: &[(K, V)]) -> Result<Self, TrackerError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut orders = Vec::new();
        for (key, value) in pairs {
            if key.as_ref() == "sort" {
                orders.extend(parse_sort(value.as_ref())?);
            }
        }
        Ok(Self { orders })
    }

    /// Sort `issues` in place: id ascending first, then each order
    pub fn apply(&self, issues: &mut [Issue]) {
        issues.sort_by_key(|issue| issue.id);
        if self.orders.is_empty() {
            return;
        }
        issues.sort_by(|a, b| {
            self.orders
                .iter()
                .map(|order| order.compare(a, b))
                .find(|ordering| ordering.is_ne())
                .unwrap_or(Ordering::Equal)
        });
    }
}

fn parse_sort(raw: &str) -> Result<Vec<SortOrder>, TrackerError> {
    let mut parts: Vec<&str> = raw
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();

    let direction = match parts.last().and_then(|last| Direction::parse(last)) {
        Some(direction) => {
            parts.pop();
            direction
        }
        None => Direction::Asc,
    };

    parts
        .into_iter()
        .map(|name| match IssueField::from_name(name) {
            Some(field) if !field.is_relation() => Ok(SortOrder { field, direction }),
            _ => Err(TrackerError::bad_filter(format!(
                "Cannot sort by '{}'",
                name
            ))),
        })
        .collect()
}

/// A page request: zero-based page index, page size and sort
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub size: usize,
    pub sort: Sort,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            size: DEFAULT_PAGE_SIZE,
            sort: Sort::unsorted(),
        }
    }
}

impl PageRequest {
    pub fn of(page: usize, size: usize) -> Self {
        Self {
            page,
            size: size.clamp(1, MAX_PAGE_SIZE),
            sort: Sort::unsorted(),
        }
    }

    pub fn with_sort(mut self, sort: Sort) -> Self {
        self.sort = sort;
        self
    }

    /// Bind a page request if `page` or `size` is present.
    ///
    /// `size` is capped at [`MAX_PAGE_SIZE`]. Returns `Ok(None)` for an
    /// unpaged request.
    ///
    /// # Errors
    ///
    /// `badfilter` for a non-numeric `page`/`size`, a zero `size`, or a bad
    /// `sort`.
    pub fn from_query_pairs<K, V>(pairs: &[(K, V)]) -> Result<Option<Self>, TrackerError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut page = None;
        let mut size = None;
        for (key, value) in pairs {
            match key.as_ref() {
                "page" => page = Some(parse_number("page", value.as_ref())?),
                "size" => size = Some(parse_number("size", value.as_ref())?),
                _ => {}
            }
        }

        if page.is_none() && size.is_none() {
            return Ok(None);
        }
        let size = size.unwrap_or(DEFAULT_PAGE_SIZE);
        if size == 0 {
            return Err(TrackerError::bad_filter("Page size must be at least 1"));
        }

        let sort = Sort::from_query_pairs(pairs)?;
        Ok(Some(
            Self::of(page.unwrap_or(0), size.min(MAX_PAGE_SIZE)).with_sort(sort),
        ))
    }

    pub fn offset(&self) -> usize {
        self.page.saturating_mul(self.size)
    }
}

fn parse_number(name: &str, raw: &str) -> Result<usize, TrackerError> {
    raw.trim()
        .parse()
        .map_err(|_| TrackerError::bad_filter(format!("Invalid {}: '{}'", name, raw)))
}

/// One page of results plus totals
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub total_elements: u64,
    pub page: usize,
    pub size: usize,
    pub total_pages: u64,
}

impl<T> Page<T> {
    /// Cut the requested page out of the full, already sorted result
    pub fn slice(all: Vec<T>, request: &PageRequest) -> Self {
        let total_elements = all.len() as u64;
        let content = all
            .into_iter()
            .skip(request.offset())
            .take(request.size)
            .collect();
        Self {
            content,
            total_elements,
            page: request.page,
            size: request.size,
            total_pages: total_elements.div_ceil(request.size as u64),
        }
    }
}
