use std::sync::LazyLock;

use regex::Regex;

use crate::value::Value;

static SELECTOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(-?\d+)(?:(\.\.\.|\.\.|-|\+)(-?\d+)?)?$").expect("selector pattern is valid")
});

/// One selector inside an index spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
    /// Single position (`3`, `-1`)
    Index(i64),

    /// Bounded range (`1-3`, `1..3` inclusive, `1...3` exclusive)
    Range { start: i64, end: i64, inclusive: bool },

    /// Open range to the last element (`2+`)
    From(i64),
}

/// Comma-separated list of selectors applied to a list.
///
/// # Examples
///
/// ```
/// use djc::ast::{IndexSpec, Selector};
///
/// let spec = IndexSpec::parse("0,2..3,-1+").unwrap();
/// assert_eq!(spec.selectors()[1], Selector::Range { start: 2, end: 3, inclusive: true });
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
    selectors: Vec<Selector>,
}

impl IndexSpec {
    /// Parse the text between the brackets. Returns the offending selector
    /// on failure.
    pub fn parse(text: &str) -> Result<Self, String> {
        let mut selectors = Vec::new();
        for part in text.split(',') {
            let part = part.trim();
            selectors.push(parse_selector(part).ok_or_else(|| part.to_string())?);
        }
        Ok(IndexSpec { selectors })
    }

    /// Spec selecting one position.
    pub fn single(position: i64) -> Self {
        IndexSpec {
            selectors: vec![Selector::Index(position)],
        }
    }

    pub fn selectors(&self) -> &[Selector] {
        &self.selectors
    }

    /// Resolve every selector against `items` and concatenate the picks.
    ///
    /// A single position outside the list contributes null; a range is
    /// clipped to the list. The result is sequestered.
    pub fn resolve(&self, items: &[Value]) -> Value {
        let len = items.len() as i64;
        let mut picked = Vec::new();

        for selector in &self.selectors {
            match *selector {
                Selector::Index(n) => {
                    let value = normalize(n, len)
                        .and_then(|i| items.get(i))
                        .cloned()
                        .unwrap_or(Value::Null);
                    picked.push(value);
                }
                Selector::Range { start, end, inclusive } => {
                    let end = clamp(end, len) + i64::from(inclusive);
                    picked.extend(slice(items, clamp(start, len), end));
                }
                Selector::From(start) => {
                    picked.extend(slice(items, clamp(start, len), len));
                }
            }
        }

        Value::sequester(picked)
    }

    /// Positions selected in a list of `len` elements, in selection order.
    /// Out-of-range single positions are skipped.
    pub fn positions(&self, len: usize) -> Vec<usize> {
        let n = len as i64;
        let mut out = Vec::new();
        for selector in &self.selectors {
            match *selector {
                Selector::Index(i) => {
                    if let Some(i) = normalize(i, n).filter(|i| *i < len) {
                        out.push(i);
                    }
                }
                Selector::Range { start, end, inclusive } => {
                    let end = (clamp(end, n) + i64::from(inclusive)).min(n);
                    out.extend((clamp(start, n)..end.max(0)).map(|i| i as usize));
                }
                Selector::From(start) => {
                    out.extend((clamp(start, n)..n).map(|i| i as usize));
                }
            }
        }
        out
    }
}

fn parse_selector(part: &str) -> Option<Selector> {
    let caps = SELECTOR.captures(part)?;
    let start: i64 = caps[1].parse().ok()?;
    let end = caps.get(3).map(|m| m.as_str().parse::<i64>()).transpose().ok()?;

    match (caps.get(2).map(|m| m.as_str()), end) {
        (None, None) => Some(Selector::Index(start)),
        (Some("+"), None) => Some(Selector::From(start)),
        (Some("..."), Some(end)) => Some(Selector::Range { start, end, inclusive: false }),
        (Some(".." | "-"), Some(end)) => Some(Selector::Range { start, end, inclusive: true }),
        _ => None,
    }
}

/// Position of `n` in a list of `len`, counting negatives from the end.
fn normalize(n: i64, len: i64) -> Option<usize> {
    let i = if n < 0 { len + n } else { n };
    (i >= 0).then_some(i as usize)
}

/// Like `normalize` but saturating into `0..=len`.
fn clamp(n: i64, len: i64) -> i64 {
    let i = if n < 0 { len + n } else { n };
    i.clamp(0, len)
}

fn slice(items: &[Value], start: i64, end: i64) -> Vec<Value> {
    let end = end.min(items.len() as i64);
    if start >= end {
        return Vec::new();
    }
    items[start as usize..end as usize].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(n: i64) -> Vec<Value> {
        (0..n).map(Value::Integer).collect()
    }

    #[test]
    fn test_parse_forms() {
        let spec = IndexSpec::parse("1, -2, 1-3, 1..3, 1...3, 4+").unwrap();
        assert_eq!(
            spec.selectors(),
            &[
                Selector::Index(1),
                Selector::Index(-2),
                Selector::Range { start: 1, end: 3, inclusive: true },
                Selector::Range { start: 1, end: 3, inclusive: true },
                Selector::Range { start: 1, end: 3, inclusive: false },
                Selector::From(4),
            ]
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(IndexSpec::parse("a").unwrap_err(), "a");
        assert_eq!(IndexSpec::parse("1,").unwrap_err(), "");
        assert_eq!(IndexSpec::parse("1..").unwrap_err(), "1..");
        assert_eq!(IndexSpec::parse("2+5").unwrap_err(), "2+5");
    }

    #[test]
    fn test_resolve_single_and_out_of_range() {
        let items = list(3);
        assert_eq!(IndexSpec::parse("1").unwrap().resolve(&items), Value::Integer(1));
        assert_eq!(IndexSpec::parse("-1").unwrap().resolve(&items), Value::Integer(2));
        assert_eq!(IndexSpec::parse("3").unwrap().resolve(&items), Value::Null);
        assert_eq!(IndexSpec::parse("-4").unwrap().resolve(&items), Value::Null);
    }

    #[test]
    fn test_resolve_ranges() {
        let items = list(5);
        assert_eq!(
            IndexSpec::parse("1..3").unwrap().resolve(&items),
            Value::Array(list(4)[1..].to_vec())
        );
        assert_eq!(
            IndexSpec::parse("1...3").unwrap().resolve(&items),
            Value::Array(vec![Value::Integer(1), Value::Integer(2)])
        );
        assert_eq!(
            IndexSpec::parse("-2+").unwrap().resolve(&items),
            Value::Array(vec![Value::Integer(3), Value::Integer(4)])
        );
        assert_eq!(
            IndexSpec::parse("3..10").unwrap().resolve(&items),
            Value::Array(vec![Value::Integer(3), Value::Integer(4)])
        );
        assert_eq!(IndexSpec::parse("7+").unwrap().resolve(&items), Value::Array(vec![]));
    }

    #[test]
    fn test_positions() {
        let spec = IndexSpec::parse("0,-1,9,1...3").unwrap();
        assert_eq!(spec.positions(4), vec![0, 3, 1, 2]);
    }
}
