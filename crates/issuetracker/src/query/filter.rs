//! Typed per-field filters.
//!
//! A filter is a bag of optional operators. [`Filter`] carries the equality
//! family, [`RangeFilter`] adds ordering bounds. Both bind themselves from
//! query-string operator/value pairs and translate into a [`Specification`].
//!
//! Translation precedence: `equals` wins over everything else, then `in`;
//! otherwise all remaining operators that are set are ANDed.

use super::field::{IssueField, Value};
use super::specification::{Comparison, Specification};
use crate::domain::{Priority, Resolution};
use chrono::{DateTime, Utc};

/// Filter operator as written after the dot in `<field>.<operator>=<value>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Equals,
    NotEquals,
    In,
    NotIn,
    Specified,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
}

impl Operator {
    /// Parse an operator name, accepting the legacy `...OrEqualThan` spellings
    pub fn parse(name: &str) -> Option<Operator> {
        let op = match name {
            "equals" => Operator::Equals,
            "notEquals" => Operator::NotEquals,
            "in" => Operator::In,
            "notIn" => Operator::NotIn,
            "specified" => Operator::Specified,
            "greaterThan" => Operator::GreaterThan,
            "greaterThanOrEqual" | "greaterOrEqualThan" | "greaterOrEqual" => {
                Operator::GreaterThanOrEqual
            }
            "lessThan" => Operator::LessThan,
            "lessThanOrEqual" | "lessOrEqualThan" | "lessOrEqual" => Operator::LessThanOrEqual,
            _ => return None,
        };
        Some(op)
    }

    /// Whether the operator needs an ordered field
    pub fn is_range(self) -> bool {
        matches!(
            self,
            Operator::GreaterThan
                | Operator::GreaterThanOrEqual
                | Operator::LessThan
                | Operator::LessThanOrEqual
        )
    }
}

/// A type that can be filtered on: parseable from a query-string value and
/// convertible into a comparable [`Value`].
pub trait FilterValue: Clone + Into<Value> {
    fn parse_value(raw: &str) -> Result<Self, String>;
}

impl FilterValue for i64 {
    fn parse_value(raw: &str) -> Result<Self, String> {
        raw.trim()
            .parse()
            .map_err(|_| format!("'{}' is not a valid long", raw))
    }
}

impl FilterValue for i32 {
    fn parse_value(raw: &str) -> Result<Self, String> {
        raw.trim()
            .parse()
            .map_err(|_| format!("'{}' is not a valid integer", raw))
    }
}

impl FilterValue for DateTime<Utc> {
    fn parse_value(raw: &str) -> Result<Self, String> {
        DateTime::parse_from_rfc3339(raw.trim())
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| format!("'{}' is not a valid ISO-8601 instant: {}", raw, e))
    }
}

impl FilterValue for Priority {
    fn parse_value(raw: &str) -> Result<Self, String> {
        raw.trim().parse()
    }
}

impl FilterValue for Resolution {
    fn parse_value(raw: &str) -> Result<Self, String> {
        raw.trim().parse()
    }
}

fn parse_list<T: FilterValue>(raw: &str) -> Result<Vec<T>, String> {
    raw.split(',')
        .filter(|part| !part.trim().is_empty())
        .map(T::parse_value)
        .collect()
}

fn parse_bool(raw: &str) -> Result<bool, String> {
    match raw.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(format!("'{}' is not a valid boolean", other)),
    }
}

fn values<T: FilterValue>(list: &[T]) -> Vec<Value> {
    list.iter().cloned().map(Into::into).collect()
}

/// Equality-family filter
#[derive(Debug, Clone, PartialEq)]
pub struct Filter<T> {
    pub equals: Option<T>,
    pub not_equals: Option<T>,
    pub in_values: Option<Vec<T>>,
    pub not_in_values: Option<Vec<T>>,
    /// `Some(true)`: field is not null; `Some(false)`: field is null
    pub specified: Option<bool>,
}

impl<T> Default for Filter<T> {
    fn default() -> Self {
        Self {
            equals: None,
            not_equals: None,
            in_values: None,
            not_in_values: None,
            specified: None,
        }
    }
}

impl<T: FilterValue> Filter<T> {
    pub fn equals(value: T) -> Self {
        Self {
            equals: Some(value),
            ..Default::default()
        }
    }

    pub fn not_equals(value: T) -> Self {
        Self {
            not_equals: Some(value),
            ..Default::default()
        }
    }

    pub fn is_in(values: Vec<T>) -> Self {
        Self {
            in_values: Some(values),
            ..Default::default()
        }
    }

    pub fn not_in(values: Vec<T>) -> Self {
        Self {
            not_in_values: Some(values),
            ..Default::default()
        }
    }

    pub fn specified(specified: bool) -> Self {
        Self {
            specified: Some(specified),
            ..Default::default()
        }
    }

    /// Bind one operator from its raw query-string value.
    ///
    /// Repeated `in`/`notIn` parameters accumulate; other operators keep the
    /// last value. Range operators are rejected with `Ok(false)` so the
    /// caller can skip them.
    pub fn bind(&mut self, op: Operator, raw: &str) -> Result<bool, String> {
        match op {
            Operator::Equals => self.equals = Some(T::parse_value(raw)?),
            Operator::NotEquals => self.not_equals = Some(T::parse_value(raw)?),
            Operator::In => self
                .in_values
                .get_or_insert_with(Vec::new)
                .extend(parse_list(raw)?),
            Operator::NotIn => self
                .not_in_values
                .get_or_insert_with(Vec::new)
                .extend(parse_list(raw)?),
            Operator::Specified => self.specified = Some(parse_bool(raw)?),
            _ => return Ok(false),
        }
        Ok(true)
    }

    /// Translate into a predicate over `field`
    pub fn to_specification(&self, field: IssueField) -> Specification {
        if let Some(value) = &self.equals {
            return Specification::condition(field, Comparison::Equals(value.clone().into()));
        }
        if let Some(list) = &self.in_values {
            return Specification::condition(field, Comparison::In(values(list)));
        }
        self.remaining_specification(field)
    }

    fn remaining_specification(&self, field: IssueField) -> Specification {
        let mut spec = Specification::all();
        if let Some(specified) = self.specified {
            spec = spec.and(Specification::condition(
                field,
                Comparison::Specified(specified),
            ));
        }
        if let Some(value) = &self.not_equals {
            spec = spec.and(Specification::condition(
                field,
                Comparison::NotEquals(value.clone().into()),
            ));
        }
        if let Some(list) = &self.not_in_values {
            spec = spec.and(Specification::condition(
                field,
                Comparison::NotIn(values(list)),
            ));
        }
        spec
    }
}

/// Filter for ordered fields: the equality family plus bounds
#[derive(Debug, Clone, PartialEq)]
pub struct RangeFilter<T> {
    pub filter: Filter<T>,
    pub greater_than: Option<T>,
    pub greater_than_or_equal: Option<T>,
    pub less_than: Option<T>,
    pub less_than_or_equal: Option<T>,
}

impl<T> Default for RangeFilter<T> {
    fn default() -> Self {
        Self {
            filter: Filter::default(),
            greater_than: None,
            greater_than_or_equal: None,
            less_than: None,
            less_than_or_equal: None,
        }
    }
}

impl<T: FilterValue> From<Filter<T>> for RangeFilter<T> {
    fn from(filter: Filter<T>) -> Self {
        Self {
            filter,
            ..Default::default()
        }
    }
}

impl<T: FilterValue> RangeFilter<T> {
    pub fn greater_than(value: T) -> Self {
        Self {
            greater_than: Some(value),
            ..Default::default()
        }
    }

    pub fn greater_than_or_equal(value: T) -> Self {
        Self {
            greater_than_or_equal: Some(value),
            ..Default::default()
        }
    }

    pub fn less_than(value: T) -> Self {
        Self {
            less_than: Some(value),
            ..Default::default()
        }
    }

    pub fn less_than_or_equal(value: T) -> Self {
        Self {
            less_than_or_equal: Some(value),
            ..Default::default()
        }
    }

    /// Bind one operator from its raw query-string value.
    pub fn bind(&mut self, op: Operator, raw: &str) -> Result<bool, String> {
        match op {
            Operator::GreaterThan => self.greater_than = Some(T::parse_value(raw)?),
            Operator::GreaterThanOrEqual => {
                self.greater_than_or_equal = Some(T::parse_value(raw)?)
            }
            Operator::LessThan => self.less_than = Some(T::parse_value(raw)?),
            Operator::LessThanOrEqual => self.less_than_or_equal = Some(T::parse_value(raw)?),
            _ => return self.filter.bind(op, raw),
        }
        Ok(true)
    }

    /// Translate into a predicate over `field`
    pub fn to_specification(&self, field: IssueField) -> Specification {
        if self.filter.equals.is_some() || self.filter.in_values.is_some() {
            return self.filter.to_specification(field);
        }

        let mut spec = self.filter.remaining_specification(field);
        let bounds: [(&Option<T>, fn(Value) -> Comparison); 4] = [
            (&self.greater_than, Comparison::GreaterThan),
            (&self.greater_than_or_equal, Comparison::GreaterThanOrEqual),
            (&self.less_than, Comparison::LessThan),
            (&self.less_than_or_equal, Comparison::LessThanOrEqual),
        ];
        for (bound, comparison) in bounds {
            if let Some(value) = bound {
                spec = spec.and(Specification::condition(
                    field,
                    comparison(value.clone().into()),
                ));
            }
        }
        spec
    }
}
