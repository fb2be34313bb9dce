//! Job files.
//!
//! A job declares the merge rules and the extraction tree as data:
//!
//! ```json
//! {
//!   "merge": [
//!     { "left": "classes", "right": "instructors", "on": [["instructor", "id"]], "into": "lecturer" }
//!   ],
//!   "extract": {
//!     "nodes": [
//!       { "key": "classes", "children": [
//!         { "capture": "name" },
//!         { "capture": "students.score", "compose": [{ "fn": "avg" }] }
//!       ] }
//!     ]
//!   }
//! }
//! ```
//!
//! Jobs compile through the same builders as code, so they are validated
//! the same way.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    builder::{BuildError, NodeBuilder},
    extractor::Extractor,
    mapper::{Mapper, MergeRule},
    pipeline::Pipeline,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid job file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Build(#[from] BuildError),

    #[error("node `{node}`: {message}")]
    Node { node: String, message: String },
}

/// A complete job: merge rules, then projection.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct JobConfig {
    #[serde(default)]
    pub merge: Vec<MergeConfig>,
    #[serde(default)]
    pub extract: ExtractConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MergeConfig {
    pub left: String,
    pub right: String,
    /// `[left key, right key]` pairs
    pub on: Vec<(String, String)>,
    #[serde(default)]
    pub into: Option<String>,
}

/// The synthetic root of the extraction tree.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ExtractConfig {
    #[serde(default)]
    pub using: Option<String>,
    #[serde(default)]
    pub header: Option<Vec<String>>,
    #[serde(default)]
    pub nodes: Vec<NodeConfig>,
}

/// One extraction node. Exactly one of `key`, `find`, `capture`,
/// `aggregate` or `value` says what kind of node it is.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NodeConfig {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub find: Option<String>,
    #[serde(default)]
    pub capture: Option<String>,
    #[serde(default)]
    pub aggregate: Vec<String>,
    /// Capture of the node itself, under this name
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub splat: bool,
    #[serde(default)]
    pub compose: Vec<ComposeConfig>,
    #[serde(default)]
    pub children: Vec<NodeConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "fn", rename_all = "snake_case")]
pub enum ComposeConfig {
    Sum {
        #[serde(default)]
        start: f64,
    },
    Avg,
    Join {
        #[serde(default)]
        sep: String,
    },
    Sort {
        #[serde(default)]
        desc: bool,
    },
    Uniq,
    Count {
        #[serde(default)]
        compact: bool,
    },
    Match {
        pattern: String,
    },
    Capture {
        pattern: String,
        #[serde(default)]
        groups: Vec<String>,
    },
}

impl JobConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn mapper(&self) -> Result<Mapper, ConfigError> {
        let rules = self
            .merge
            .iter()
            .map(MergeConfig::rule)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Mapper::new(rules))
    }

    pub fn extractor(&self) -> Result<Extractor, ConfigError> {
        let mut root = NodeBuilder::root();
        if let Some(path) = &self.extract.using {
            root.using(path);
        }
        for node in &self.extract.nodes {
            node.attach(&mut root)?;
        }
        let extractor = root.build()?;
        Ok(match &self.extract.header {
            Some(header) => extractor.with_header(header.clone()),
            None => extractor,
        })
    }

    pub fn pipeline(&self) -> Result<Pipeline, ConfigError> {
        Ok(Pipeline::new(self.mapper()?, self.extractor()?))
    }
}

impl MergeConfig {
    fn rule(&self) -> Result<MergeRule, BuildError> {
        let matchers: Vec<(&str, &str)> = self
            .on
            .iter()
            .map(|(l, r)| (l.as_str(), r.as_str()))
            .collect();
        MergeRule::new(&self.left, &self.right, &matchers, self.into.as_deref())
    }
}

impl NodeConfig {
    /// Add this node, and its subtree, under `parent`.
    fn attach(&self, parent: &mut NodeBuilder) -> Result<(), ConfigError> {
        let kinds = [
            self.key.is_some(),
            self.find.is_some(),
            self.capture.is_some(),
            !self.aggregate.is_empty(),
            self.value.is_some(),
        ];
        if kinds.iter().filter(|set| **set).count() != 1 {
            return Err(self.invalid(
                "set exactly one of `key`, `find`, `capture`, `aggregate`, `value`",
            ));
        }

        let is_capture = self.key.is_none() && self.find.is_none();
        if is_capture && !self.children.is_empty() {
            return Err(self.invalid("captures cannot have children"));
        }

        let node = if let Some(key) = &self.key {
            parent.child(key, |_| {})
        } else if let Some(path) = &self.find {
            parent.find(path, |_| {})
        } else if let Some(path) = &self.capture {
            parent.capture(path)
        } else if let Some(name) = &self.value {
            parent.capture_self(name)
        } else {
            let paths: Vec<&str> = self.aggregate.iter().map(String::as_str).collect();
            parent.aggregate(&paths)
        };

        if let Some(name) = &self.name {
            node.named(name);
        }
        if self.splat {
            node.splat();
        }
        for stage in &self.compose {
            stage.attach(node);
        }
        for child in &self.children {
            child.attach(node)?;
        }
        Ok(())
    }

    fn label(&self) -> String {
        self.key
            .clone()
            .or_else(|| self.find.clone())
            .or_else(|| self.capture.clone())
            .or_else(|| self.value.clone())
            .unwrap_or_else(|| self.aggregate.join("_"))
    }

    fn invalid(&self, message: &str) -> ConfigError {
        ConfigError::Node {
            node: self.label(),
            message: message.to_string(),
        }
    }
}

impl ComposeConfig {
    fn attach(&self, node: &mut NodeBuilder) {
        match self {
            ComposeConfig::Sum { start } => node.sum_from(*start),
            ComposeConfig::Avg => node.avg(),
            ComposeConfig::Join { sep } => node.join(sep),
            ComposeConfig::Sort { desc: false } => node.sort(),
            ComposeConfig::Sort { desc: true } => node.sort_desc(),
            ComposeConfig::Uniq => node.uniq(),
            ComposeConfig::Count { compact: false } => node.count(),
            ComposeConfig::Count { compact: true } => node.count_compact(),
            ComposeConfig::Match { pattern } => node.matching(pattern),
            ComposeConfig::Capture { pattern, groups } => {
                node.captures(pattern, groups.iter().map(String::as_str))
            }
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_tags() {
        let stages: Vec<ComposeConfig> = serde_json::from_str(
            r#"[{"fn": "sum"}, {"fn": "join", "sep": ";"}, {"fn": "count", "compact": true}]"#,
        )
        .unwrap();
        assert!(matches!(stages[0], ComposeConfig::Sum { start } if start == 0.0));
        assert!(matches!(&stages[1], ComposeConfig::Join { sep } if sep == ";"));
        assert!(matches!(stages[2], ComposeConfig::Count { compact: true }));
    }

    #[test]
    fn test_node_kind_must_be_unique() {
        let job = JobConfig::from_json(
            r#"{"extract": {"nodes": [{"key": "a", "capture": "b"}]}}"#,
        )
        .unwrap();
        assert!(matches!(job.extractor(), Err(ConfigError::Node { node, .. }) if node == "a"));
    }

    #[test]
    fn test_unknown_fields_rejected() {
        assert!(matches!(
            JobConfig::from_json(r#"{"extract": {"nodez": []}}"#),
            Err(ConfigError::Json(_))
        ));
    }
}
