//! Composition functions applied to captured values before they are emitted.
//!
//! Every function passes null through untouched, so a missing value stays
//! missing all the way to the row instead of raising an error.

use std::{cmp::Ordering, fmt, sync::Arc};

use rust_decimal::{Decimal, prelude::FromPrimitive, prelude::ToPrimitive};

use crate::{
    ast::Pattern,
    value::{Value, compare_values},
};

/// Caller-supplied value transform.
pub type ValueFn = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

/// Caller-supplied ordering for `sort_by`.
pub type Comparator = Arc<dyn Fn(&Value, &Value) -> Ordering + Send + Sync>;

/// Capture group selector for [`Compose::Capture`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Group {
    Index(usize),
    Name(String),
}

impl From<&str> for Group {
    /// Digits select a group by position, anything else by name.
    fn from(s: &str) -> Self {
        match s.parse::<usize>() {
            Ok(i) => Group::Index(i),
            Err(_) => Group::Name(s.to_string()),
        }
    }
}

/// Running numeric total: exact while it fits a [`Decimal`], a float past
/// that.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Exact(Decimal),
    Approx(f64),
}

impl Number {
    pub const ZERO: Number = Number::Exact(Decimal::ZERO);

    pub fn from_f64(n: f64) -> Self {
        Decimal::from_f64(n).map_or(Number::Approx(n), Number::Exact)
    }

    pub fn to_f64(self) -> f64 {
        match self {
            Number::Exact(d) => d.to_f64().unwrap_or(f64::NAN),
            Number::Approx(n) => n,
        }
    }

    /// Sum of both sides; overflowing the decimal range continues in `f64`.
    pub fn plus(self, other: Number) -> Number {
        if let (Number::Exact(a), Number::Exact(b)) = (self, other)
            && let Some(total) = a.checked_add(b)
        {
            return Number::Exact(total);
        }
        Number::Approx(self.to_f64() + other.to_f64())
    }

    /// Whole results come back as integers, the rest as floats.
    fn into_value(self) -> Value {
        match self {
            Number::Exact(d) if d.is_integer() => match d.to_i64() {
                Some(n) => Value::Integer(n),
                None => Value::Float(self.to_f64()),
            },
            number => Value::Float(number.to_f64()),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Exact(d) => write!(f, "{d}"),
            Number::Approx(n) => write!(f, "{n}"),
        }
    }
}

/// One stage of a capture's composition chain.
#[derive(Clone)]
pub enum Compose {
    /// Numeric total, starting from `start`
    Sum { start: Number },

    /// Numeric mean
    Avg,

    /// Stringify and concatenate the non-null elements
    Join(String),

    /// Ascending sort, nulls dropped
    Sort,

    /// Descending sort, nulls dropped
    SortDesc,

    /// Sort with a caller-supplied ordering, nulls dropped
    SortBy(Comparator),

    /// Drop repeated elements, keeping first occurrences
    Uniq,

    /// Number of elements; `compact` ignores nulls
    Count { compact: bool },

    /// Every match of the pattern (or of its groups), element-wise on lists
    Match(Pattern),

    /// Selected groups of the first match, element-wise on lists
    Capture { pattern: Pattern, groups: Vec<Group> },

    /// Caller function applied element-wise
    Map(ValueFn),

    /// Caller function applied to the whole value
    Custom(ValueFn),
}

impl fmt::Debug for Compose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Compose::Sum { start } => write!(f, "Sum({start})"),
            Compose::Avg => f.write_str("Avg"),
            Compose::Join(sep) => write!(f, "Join({sep:?})"),
            Compose::Sort => f.write_str("Sort"),
            Compose::SortDesc => f.write_str("SortDesc"),
            Compose::SortBy(_) => f.write_str("SortBy(<fn>)"),
            Compose::Uniq => f.write_str("Uniq"),
            Compose::Count { compact } => write!(f, "Count(compact: {compact})"),
            Compose::Match(p) => write!(f, "Match(/{}/)", p.as_str()),
            Compose::Capture { pattern, groups } => {
                write!(f, "Capture(/{}/, {groups:?})", pattern.as_str())
            }
            Compose::Map(_) => f.write_str("Map(<fn>)"),
            Compose::Custom(_) => f.write_str("Custom(<fn>)"),
        }
    }
}

impl Compose {
    pub fn sum() -> Self {
        Compose::Sum {
            start: Number::ZERO,
        }
    }

    pub fn sum_from(start: f64) -> Self {
        Compose::Sum {
            start: Number::from_f64(start),
        }
    }

    pub fn matching(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Compose::Match(Pattern::new(pattern)?))
    }

    pub fn capture<G: Into<Group>>(
        pattern: &str,
        groups: impl IntoIterator<Item = G>,
    ) -> Result<Self, regex::Error> {
        Ok(Compose::Capture {
            pattern: Pattern::new(pattern)?,
            groups: groups.into_iter().map(Into::into).collect(),
        })
    }

    pub fn map(f: impl Fn(&Value) -> Value + Send + Sync + 'static) -> Self {
        Compose::Map(Arc::new(f))
    }

    pub fn custom(f: impl Fn(&Value) -> Value + Send + Sync + 'static) -> Self {
        Compose::Custom(Arc::new(f))
    }

    /// Run this stage.
    pub fn apply(&self, value: Value) -> Value {
        if value.is_null() && !matches!(self, Compose::Custom(_)) {
            return Value::Null;
        }

        match self {
            Compose::Sum { start } => {
                elements(&value)
                    .iter()
                    .fold(*start, |acc, item| acc.plus(to_number(item)))
                    .into_value()
            }
            Compose::Avg => {
                let items = elements(&value);
                if items.is_empty() {
                    return Value::Null;
                }
                let total = items
                    .iter()
                    .fold(Number::ZERO, |acc, item| acc.plus(to_number(item)));
                let mean = match total {
                    Number::Exact(d) => d
                        .checked_div(Decimal::from(items.len()))
                        .and_then(|m| m.to_f64()),
                    Number::Approx(_) => None,
                };
                Value::Float(mean.unwrap_or_else(|| total.to_f64() / items.len() as f64))
            }
            Compose::Join(sep) => match value {
                Value::Array(items) => Value::String(
                    items
                        .iter()
                        .filter(|item| !item.is_null())
                        .map(Value::as_string)
                        .collect::<Vec<_>>()
                        .join(sep),
                ),
                scalar => scalar,
            },
            Compose::Sort => sorted(value, compare_values),
            Compose::SortDesc => sorted(value, |a, b| compare_values(b, a)),
            Compose::SortBy(cmp) => sorted(value, |a, b| cmp(a, b)),
            Compose::Uniq => match value {
                Value::Array(items) => {
                    let mut seen: Vec<Value> = Vec::with_capacity(items.len());
                    for item in items {
                        if !seen.contains(&item) {
                            seen.push(item);
                        }
                    }
                    Value::Array(seen)
                }
                scalar => scalar,
            },
            Compose::Count { compact } => {
                let items = elements(&value);
                let count = if *compact {
                    items.iter().filter(|item| !item.is_null()).count()
                } else {
                    items.len()
                };
                Value::Integer(count as i64)
            }
            Compose::Match(pattern) => element_wise(value, |text| scan(pattern, text)),
            Compose::Capture { pattern, groups } => {
                element_wise(value, |text| capture(pattern, groups, text))
            }
            Compose::Map(f) => match value {
                Value::Array(items) => Value::Array(items.iter().map(|item| f(item)).collect()),
                scalar => f(&scalar),
            },
            Compose::Custom(f) => f(&value),
        }
    }
}

/// Run a chain of stages, each consuming the previous output.
pub fn apply_chain(chain: &[Compose], value: Value) -> Value {
    chain.iter().fold(value, |acc, stage| stage.apply(acc))
}

/// A list's elements, or a scalar as a one-element list.
fn elements(value: &Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items.clone(),
        Value::Null => Vec::new(),
        scalar => vec![scalar.clone()],
    }
}

/// Numeric view of an element. Anything that is not a number (or a string
/// holding one) counts as zero; numbers past the decimal range stay floats.
fn to_number(value: &Value) -> Number {
    match value {
        Value::Integer(n) => Number::Exact(Decimal::from(*n)),
        Value::Float(n) => Number::from_f64(*n),
        Value::String(s) => {
            let s = s.trim();
            match s.parse::<Decimal>() {
                Ok(d) => Number::Exact(d),
                Err(_) => s.parse::<f64>().map_or(Number::ZERO, Number::from_f64),
            }
        }
        _ => Number::ZERO,
    }
}

fn sorted(value: Value, cmp: impl Fn(&Value, &Value) -> Ordering) -> Value {
    match value {
        Value::Array(items) => {
            let mut items: Vec<Value> = items.into_iter().filter(|v| !v.is_null()).collect();
            items.sort_by(|a, b| cmp(a, b));
            Value::Array(items)
        }
        scalar => scalar,
    }
}

/// Apply a text function to a value, or to each non-null element of a list.
fn element_wise(value: Value, f: impl Fn(&str) -> Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(
            items
                .iter()
                .filter(|item| !item.is_null())
                .map(|item| f(&item.as_string()))
                .collect(),
        ),
        scalar => f(&scalar.as_string()),
    }
}

/// All matches; with groups, every group of every match.
fn scan(pattern: &Pattern, text: &str) -> Value {
    let regex = pattern.regex();
    let mut found = Vec::new();
    for caps in regex.captures_iter(text) {
        if caps.len() == 1 {
            found.push(Value::String(caps[0].to_string()));
        } else {
            for group in caps.iter().skip(1) {
                found.push(
                    group
                        .map(|m| Value::String(m.as_str().to_string()))
                        .unwrap_or(Value::Null),
                );
            }
        }
    }
    if found.is_empty() {
        Value::Null
    } else {
        Value::sequester(found)
    }
}

/// Selected groups of the first match. No selectors means every group.
fn capture(pattern: &Pattern, groups: &[Group], text: &str) -> Value {
    let Some(caps) = pattern.regex().captures(text) else {
        return Value::Null;
    };
    let text_of = |m: Option<regex::Match>| {
        m.map(|m| Value::String(m.as_str().to_string()))
            .unwrap_or(Value::Null)
    };

    let picked: Vec<Value> = if groups.is_empty() {
        (1..caps.len()).map(|i| text_of(caps.get(i))).collect()
    } else {
        groups
            .iter()
            .map(|group| match group {
                Group::Index(i) => text_of(caps.get(*i)),
                Group::Name(name) => text_of(caps.name(name)),
            })
            .collect()
    };

    if picked.is_empty() {
        text_of(caps.get(0))
    } else {
        Value::sequester(picked)
    }
}
