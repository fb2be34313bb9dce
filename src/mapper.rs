//! Relational merge.
//!
//! A [`MergeRule`] joins the objects selected by its left path with the
//! values selected by its right path wherever every matcher agrees, then
//! folds each matched right value into its left object. Rules run in
//! declaration order and mutate the document in place, so later rules and
//! the projection see earlier merges.

use std::collections::BTreeSet;

use tracing::debug;

use crate::{
    ast::Token,
    builder::BuildError,
    evaluator::{EvalError, Evaluator},
    location::Location,
    parser,
    value::Value,
};

/// A parsed path together with the text it was written as.
#[derive(Debug, Clone, PartialEq)]
pub struct RulePath {
    pub text: String,
    pub token: Token,
}

impl RulePath {
    fn parse(text: &str, rule: &str) -> Result<Self, BuildError> {
        let token = parser::parse(text).map_err(|source| BuildError::Path {
            node: rule.to_string(),
            source,
        })?;
        Ok(RulePath {
            text: text.to_string(),
            token,
        })
    }
}

/// One equi-join between two parts of a document.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeRule {
    pub left: RulePath,
    pub right: RulePath,
    /// `(left key, right key)` pairs, all of which must be equal
    pub matchers: Vec<(RulePath, RulePath)>,
    /// Field of the left object receiving the matches; `None` merges the
    /// matched object's fields into the left object instead
    pub target: Option<String>,
}

impl MergeRule {
    pub fn new(
        left: &str,
        right: &str,
        matchers: &[(&str, &str)],
        target: Option<&str>,
    ) -> Result<Self, BuildError> {
        let label = format!("{left} <- {right}");
        if matchers.is_empty() {
            return Err(BuildError::NoMatchers { rule: label });
        }

        let matchers = matchers
            .iter()
            .map(|(lk, rk)| Ok((RulePath::parse(lk, &label)?, RulePath::parse(rk, &label)?)))
            .collect::<Result<Vec<_>, BuildError>>()?;

        Ok(MergeRule {
            left: RulePath::parse(left, &label)?,
            right: RulePath::parse(right, &label)?,
            matchers,
            target: target.map(str::to_string),
        })
    }

    pub fn label(&self) -> String {
        format!("{} <- {}", self.left.text, self.right.text)
    }
}

/// Applies merge rules to documents.
///
/// # Examples
///
/// ```
/// use djc::{Mapper, Value};
/// use serde_json::json;
///
/// let mapper = Mapper::builder()
///     .merge("orders", "customers")
///     .on("customer_id", "id")
///     .into_field("customer")
///     .build()
///     .unwrap();
///
/// let mut doc = Value::from(json!({
///     "orders": [{"customer_id": 1}],
///     "customers": [{"id": 1, "name": "Ada"}]
/// }));
/// mapper.apply(&mut doc).unwrap();
///
/// assert_eq!(
///     doc.get("orders").unwrap(),
///     &Value::from(json!([{"customer_id": 1, "customer": {"id": 1, "name": "Ada"}}]))
/// );
/// ```
#[derive(Debug, Clone, Default)]
pub struct Mapper {
    rules: Vec<MergeRule>,
    evaluator: Evaluator,
}

impl Mapper {
    pub fn new(rules: Vec<MergeRule>) -> Self {
        Mapper {
            rules,
            evaluator: Evaluator::new(),
        }
    }

    pub fn builder() -> MapperBuilder {
        MapperBuilder::default()
    }

    pub fn with_evaluator(mut self, evaluator: Evaluator) -> Self {
        self.evaluator = evaluator;
        self
    }

    pub fn rules(&self) -> &[MergeRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Run every rule, in order, against `document`.
    pub fn apply(&self, document: &mut Value) -> Result<(), EvalError> {
        for rule in &self.rules {
            self.apply_rule(rule, document)?;
        }
        Ok(())
    }

    fn apply_rule(&self, rule: &MergeRule, document: &mut Value) -> Result<(), EvalError> {
        let lefts = self.left_objects(rule, document)?;
        let rights = match self.evaluator.evaluate(&rule.right.token, document)? {
            Value::Array(items) => items,
            Value::Null => Vec::new(),
            value => vec![value],
        };

        if lefts.is_empty() || rights.is_empty() {
            debug!(rule = %rule.label(), lefts = lefts.len(), rights = rights.len(), "nothing to merge");
            return Ok(());
        }

        let mut pairs: Option<BTreeSet<(usize, usize)>> = None;
        for (lk, rk) in &rule.matchers {
            let matched = self.match_pairs(lk, rk, &lefts, &rights, document)?;
            pairs = Some(match pairs {
                Some(previous) => previous.intersection(&matched).copied().collect(),
                None => matched,
            });
        }
        let pairs = pairs.unwrap_or_default();

        debug!(
            rule = %rule.label(),
            lefts = lefts.len(),
            rights = rights.len(),
            matches = pairs.len(),
            "merging"
        );

        // Pairs are ordered by left then right, so each left's matches are
        // contiguous and in right order.
        let mut pending: Vec<(usize, Vec<&Value>)> = Vec::new();
        for (l, r) in pairs {
            match pending.last_mut() {
                Some((last, matches)) if *last == l => matches.push(&rights[r]),
                _ => pending.push((l, vec![&rights[r]])),
            }
        }

        for (l, matches) in pending {
            let Some(Value::Object(object)) = lefts[l].get_mut(document) else {
                continue;
            };
            match &rule.target {
                Some(field) => {
                    let value = Value::sequester(matches.into_iter().cloned().collect());
                    object.insert(field.clone(), value);
                }
                None => {
                    for matched in matches {
                        match matched {
                            Value::Object(fields) => {
                                for (key, value) in fields {
                                    object.insert(key.clone(), value.clone());
                                }
                            }
                            other => {
                                debug!(rule = %rule.label(), kind = other.type_name(), "skipping non-object match");
                            }
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Addresses of the left objects, with located lists expanded one level.
    fn left_objects(&self, rule: &MergeRule, document: &Value) -> Result<Vec<Location>, EvalError> {
        let mut lefts: Vec<Location> = Vec::new();
        for location in self.evaluator.locate(&rule.left.token, document)? {
            let expanded = match location.get(document) {
                Some(Value::Array(items)) => (0..items.len()).map(|i| location.index(i)).collect(),
                Some(_) => vec![location],
                None => Vec::new(),
            };
            for candidate in expanded {
                let is_object = matches!(candidate.get(document), Some(Value::Object(_)));
                if is_object && !lefts.contains(&candidate) {
                    lefts.push(candidate);
                }
            }
        }
        Ok(lefts)
    }

    /// Every `(left, right)` pair whose keys are equal and non-null.
    fn match_pairs(
        &self,
        lk: &RulePath,
        rk: &RulePath,
        lefts: &[Location],
        rights: &[Value],
        document: &Value,
    ) -> Result<BTreeSet<(usize, usize)>, EvalError> {
        let mut right_keys = Vec::with_capacity(rights.len());
        for right in rights {
            right_keys.push(self.evaluator.eval(&rk.token, right, document)?);
        }

        let mut pairs = BTreeSet::new();
        for (l, location) in lefts.iter().enumerate() {
            let node = location.get(document).unwrap_or(&Value::Null);
            let left_key = self.evaluator.eval(&lk.token, node, document)?;
            if left_key.is_null() {
                continue;
            }
            for (r, right_key) in right_keys.iter().enumerate() {
                if !right_key.is_null() && left_key.loose_eq(right_key) {
                    pairs.insert((l, r));
                }
            }
        }
        Ok(pairs)
    }
}

/// Fluent construction of a [`Mapper`].
///
/// `on` and `into_field` refine the most recent `merge`.
#[derive(Debug, Clone, Default)]
pub struct MapperBuilder {
    rules: Vec<PendingRule>,
    error: Option<BuildError>,
}

#[derive(Debug, Clone)]
struct PendingRule {
    left: String,
    right: String,
    matchers: Vec<(String, String)>,
    target: Option<String>,
}

impl MapperBuilder {
    pub fn merge(mut self, left: &str, right: &str) -> Self {
        self.rules.push(PendingRule {
            left: left.to_string(),
            right: right.to_string(),
            matchers: Vec::new(),
            target: None,
        });
        self
    }

    pub fn on(mut self, left_key: &str, right_key: &str) -> Self {
        match self.rules.last_mut() {
            Some(rule) => rule.matchers.push((left_key.to_string(), right_key.to_string())),
            None => self.fail(format!("on({left_key}, {right_key})")),
        }
        self
    }

    pub fn into_field(mut self, field: &str) -> Self {
        match self.rules.last_mut() {
            Some(rule) => rule.target = Some(field.to_string()),
            None => self.fail(format!("into_field({field})")),
        }
        self
    }

    pub fn build(self) -> Result<Mapper, BuildError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        let rules = self
            .rules
            .iter()
            .map(|rule| {
                let matchers: Vec<(&str, &str)> = rule
                    .matchers
                    .iter()
                    .map(|(l, r)| (l.as_str(), r.as_str()))
                    .collect();
                MergeRule::new(&rule.left, &rule.right, &matchers, rule.target.as_deref())
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Mapper::new(rules))
    }

    fn fail(&mut self, clause: String) {
        self.error.get_or_insert(BuildError::NoOpenRule { clause });
    }
}
