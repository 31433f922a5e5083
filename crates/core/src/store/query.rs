//! Declarative query AST and its evaluation over JSON snapshots.
//!
//! Filters name a dotted field path, an operator, and a JSON value, and are
//! combined AND-wise. A path segment that lands on an array matches when
//! ANY element matches (this is what makes `entries.account_id` work on
//! transactions). Disjunction is expressed with the `In` operator.

use std::cmp::Ordering;

use chrono::DateTime;
use ledgerkit_shared::PageRequest;
use serde_json::Value;

/// Comparison operator for a filter predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    /// Field equals the value.
    Eq,
    /// Field equals one of the values in a JSON array.
    In,
    /// Field is strictly greater than the value.
    Gt,
    /// Field is strictly less than the value.
    Lt,
    /// Field is greater than or equal to the value.
    Gte,
    /// Field is less than or equal to the value.
    Lte,
}

/// One filter predicate.
#[derive(Debug, Clone)]
pub struct Filter {
    /// Dotted field path into the entity snapshot.
    pub field: String,
    /// Comparison operator.
    pub op: FilterOp,
    /// Comparison value (a JSON array for `In`).
    pub value: Value,
}

impl Filter {
    /// Creates a filter predicate.
    pub fn new(field: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }
}

/// Sort key specification.
#[derive(Debug, Clone)]
pub struct SortKey {
    /// Dotted field path to sort by.
    pub field: String,
    /// Sort descending instead of ascending.
    pub descending: bool,
}

/// A declarative query: AND-combined filters, sort keys, pagination.
#[derive(Debug, Clone, Default)]
pub struct Query {
    /// Filter predicates, all of which must match.
    pub filters: Vec<Filter>,
    /// Sort keys, applied in order; ties break by id ascending.
    pub sort: Vec<SortKey>,
    /// Optional pagination window.
    pub page: Option<PageRequest>,
}

impl Query {
    /// Creates an empty query matching everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a filter predicate.
    #[must_use]
    pub fn filter(mut self, field: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::new(field, op, value));
        self
    }

    /// Adds a sort key.
    #[must_use]
    pub fn sort_by(mut self, field: impl Into<String>, descending: bool) -> Self {
        self.sort.push(SortKey {
            field: field.into(),
            descending,
        });
        self
    }

    /// Sets the pagination window.
    #[must_use]
    pub fn paginate(mut self, page: PageRequest) -> Self {
        self.page = Some(page);
        self
    }

    /// Returns true if the snapshot satisfies every filter.
    #[must_use]
    pub fn matches(&self, state: &Value) -> bool {
        self.filters.iter().all(|filter| filter_matches(filter, state))
    }

    /// Compares two snapshots under this query's sort keys.
    ///
    /// Returns `Ordering::Equal` when all keys tie; callers are expected to
    /// preserve a deterministic base order in that case.
    #[must_use]
    pub fn compare(&self, left: &Value, right: &Value) -> Ordering {
        for key in &self.sort {
            let lhs = field_values(left, &key.field);
            let rhs = field_values(right, &key.field);
            let ordering = compare_optional(lhs.first().copied(), rhs.first().copied());
            let ordering = if key.descending {
                ordering.reverse()
            } else {
                ordering
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

fn filter_matches(filter: &Filter, state: &Value) -> bool {
    let candidates = field_values(state, &filter.field);
    candidates
        .iter()
        .any(|actual| op_matches(filter.op, actual, &filter.value))
}

fn op_matches(op: FilterOp, actual: &Value, expected: &Value) -> bool {
    match op {
        FilterOp::Eq => values_equal(actual, expected),
        FilterOp::In => expected
            .as_array()
            .is_some_and(|options| options.iter().any(|option| values_equal(actual, option))),
        FilterOp::Gt => compare_values(actual, expected) == Some(Ordering::Greater),
        FilterOp::Lt => compare_values(actual, expected) == Some(Ordering::Less),
        FilterOp::Gte => matches!(
            compare_values(actual, expected),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        FilterOp::Lte => matches!(
            compare_values(actual, expected),
            Some(Ordering::Less | Ordering::Equal)
        ),
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match compare_values(a, b) {
        Some(ordering) => ordering == Ordering::Equal,
        None => a == b,
    }
}

/// Compares two JSON scalars.
///
/// Strings that both parse as RFC 3339 timestamps compare temporally, which
/// keeps date filters correct across differing sub-second precision.
fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64().partial_cmp(&y.as_f64()),
        (Value::String(x), Value::String(y)) => {
            match (
                DateTime::parse_from_rfc3339(x),
                DateTime::parse_from_rfc3339(y),
            ) {
                (Ok(dx), Ok(dy)) => Some(dx.cmp(&dy)),
                _ => Some(x.cmp(y)),
            }
        }
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn compare_optional(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(x), Some(y)) => compare_values(x, y).unwrap_or(Ordering::Equal),
    }
}

/// Resolves a dotted path inside a snapshot, flattening arrays along the
/// way, so `entries.account_id` yields the account id of every entry.
fn field_values<'a>(state: &'a Value, path: &str) -> Vec<&'a Value> {
    let mut current = vec![state];
    for segment in path.split('.') {
        let mut next = Vec::new();
        for value in current {
            match value {
                Value::Object(map) => {
                    if let Some(child) = map.get(segment) {
                        next.push(child);
                    }
                }
                Value::Array(items) => {
                    for item in items {
                        if let Some(child) = item.get(segment) {
                            next.push(child);
                        }
                    }
                }
                _ => {}
            }
        }
        current = next;
    }
    // A trailing array (e.g. metadata.tags) flattens into its elements.
    current
        .into_iter()
        .flat_map(|value| match value {
            Value::Array(items) => items.iter().collect::<Vec<_>>(),
            other => vec![other],
        })
        .collect()
}
