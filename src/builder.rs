//! Builders for extraction trees.
//!
//! Nodes are configured through an explicit `&mut NodeBuilder` handed to
//! each closure, so nesting in code mirrors nesting in the document:
//!
//! ```
//! use djc::Extractor;
//!
//! let mut root = Extractor::builder();
//! root.child("classes", |class| {
//!     class.capture("name").named("class");
//!     class.capture("students.score").avg();
//! });
//! let extractor = root.build().unwrap();
//! assert_eq!(extractor.root().capture_names(), vec!["class", "classes_students.score"]);
//! ```
//!
//! Paths and patterns are only compiled by [`NodeBuilder::build`], which
//! reports the first bad one with the node that declared it.

use std::cmp::Ordering;

use thiserror::Error;

use crate::{
    compose::{Compose, Group},
    extractor::{ExtractNode, Extractor},
    parser::{self, ParseError},
    value::Value,
};

/// Errors raised while compiling a builder.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildError {
    #[error("invalid path in `{node}`: {source}")]
    Path {
        node: String,
        #[source]
        source: ParseError,
    },

    #[error("invalid regex `{pattern}` in `{node}`: {message}")]
    Regex {
        node: String,
        pattern: String,
        message: String,
    },

    #[error("`{node}` is not a capture; composition functions need a captured value")]
    ComposeOnInterior { node: String },

    #[error("`{clause}` declared before any merge rule")]
    NoOpenRule { clause: String },

    #[error("merge rule `{rule}` has no matchers")]
    NoMatchers { rule: String },
}

/// A node under construction.
#[derive(Debug, Clone, Default)]
pub struct NodeBuilder {
    /// Name this node contributes to its descendants' column names
    segment: String,
    key: Option<String>,
    paths: Vec<String>,
    name: Option<String>,
    is_capture: bool,
    is_finder: bool,
    is_splat: bool,
    composition: Vec<Result<Compose, BuildError>>,
    children: Vec<NodeBuilder>,
}

impl NodeBuilder {
    /// The synthetic root. It narrows nothing and names nothing.
    pub fn root() -> Self {
        NodeBuilder::default()
    }

    /// Narrow the whole document through `path` before projecting.
    pub fn using(&mut self, path: &str) -> &mut Self {
        self.is_finder = true;
        self.paths = vec![path.to_string()];
        self
    }

    /// Interior node reached through the direct key `key`.
    pub fn child(&mut self, key: &str, configure: impl FnOnce(&mut NodeBuilder)) -> &mut NodeBuilder {
        let mut node = NodeBuilder {
            segment: key.to_string(),
            key: Some(key.to_string()),
            ..NodeBuilder::default()
        };
        configure(&mut node);
        self.push(node)
    }

    /// Interior node reached by evaluating a full path.
    pub fn find(&mut self, path: &str, configure: impl FnOnce(&mut NodeBuilder)) -> &mut NodeBuilder {
        let mut node = NodeBuilder {
            segment: path.to_string(),
            paths: vec![path.to_string()],
            is_finder: true,
            ..NodeBuilder::default()
        };
        configure(&mut node);
        self.push(node)
    }

    /// Capture leaf emitting the value of `path`.
    pub fn capture(&mut self, path: &str) -> &mut NodeBuilder {
        self.push(NodeBuilder {
            segment: path.to_string(),
            paths: vec![path.to_string()],
            is_capture: true,
            ..NodeBuilder::default()
        })
    }

    /// Capture leaf emitting the node itself.
    pub fn capture_self(&mut self, name: &str) -> &mut NodeBuilder {
        self.push(NodeBuilder {
            segment: name.to_string(),
            name: Some(name.to_string()),
            is_capture: true,
            ..NodeBuilder::default()
        })
    }

    /// Capture leaf collating several paths row-wise.
    pub fn aggregate(&mut self, paths: &[&str]) -> &mut NodeBuilder {
        self.push(NodeBuilder {
            segment: paths.join("_"),
            paths: paths.iter().map(|p| p.to_string()).collect(),
            is_capture: true,
            ..NodeBuilder::default()
        })
    }

    /// Override the output name of a capture, or the name an interior node
    /// lends to its descendants.
    pub fn named(&mut self, name: &str) -> &mut Self {
        if self.is_capture {
            self.name = Some(name.to_string());
        } else {
            self.segment = name.to_string();
        }
        self
    }

    /// Spread a mapping or list result over several columns.
    pub fn splat(&mut self) -> &mut Self {
        self.is_splat = true;
        self
    }

    pub fn compose(&mut self, stage: Compose) -> &mut Self {
        self.composition.push(Ok(stage));
        self
    }

    pub fn sum(&mut self) -> &mut Self {
        self.compose(Compose::sum())
    }

    pub fn sum_from(&mut self, start: f64) -> &mut Self {
        self.compose(Compose::sum_from(start))
    }

    pub fn avg(&mut self) -> &mut Self {
        self.compose(Compose::Avg)
    }

    pub fn join(&mut self, separator: &str) -> &mut Self {
        self.compose(Compose::Join(separator.to_string()))
    }

    pub fn sort(&mut self) -> &mut Self {
        self.compose(Compose::Sort)
    }

    pub fn sort_desc(&mut self) -> &mut Self {
        self.compose(Compose::SortDesc)
    }

    pub fn sort_by(
        &mut self,
        cmp: impl Fn(&Value, &Value) -> Ordering + Send + Sync + 'static,
    ) -> &mut Self {
        self.compose(Compose::SortBy(std::sync::Arc::new(cmp)))
    }

    pub fn uniq(&mut self) -> &mut Self {
        self.compose(Compose::Uniq)
    }

    pub fn count(&mut self) -> &mut Self {
        self.compose(Compose::Count { compact: false })
    }

    pub fn count_compact(&mut self) -> &mut Self {
        self.compose(Compose::Count { compact: true })
    }

    pub fn matching(&mut self, pattern: &str) -> &mut Self {
        let stage = Compose::matching(pattern).map_err(|e| self.regex_error(pattern, e));
        self.composition.push(stage);
        self
    }

    pub fn captures<G: Into<Group>>(
        &mut self,
        pattern: &str,
        groups: impl IntoIterator<Item = G>,
    ) -> &mut Self {
        let stage = Compose::capture(pattern, groups).map_err(|e| self.regex_error(pattern, e));
        self.composition.push(stage);
        self
    }

    pub fn map(&mut self, f: impl Fn(&Value) -> Value + Send + Sync + 'static) -> &mut Self {
        self.compose(Compose::map(f))
    }

    pub fn custom(&mut self, f: impl Fn(&Value) -> Value + Send + Sync + 'static) -> &mut Self {
        self.compose(Compose::custom(f))
    }

    /// Compile this node as the root of an extractor.
    pub fn build(&self) -> Result<Extractor, BuildError> {
        Extractor::from_builder(self)
    }

    /// Compile this node and its subtree. `prefix` holds the names lent by
    /// the ancestors.
    pub(crate) fn compile(&self, prefix: &[String]) -> Result<ExtractNode, BuildError> {
        if !self.is_capture && !self.composition.is_empty() {
            return Err(BuildError::ComposeOnInterior {
                node: self.label(),
            });
        }

        let paths = self
            .paths
            .iter()
            .map(|path| {
                parser::parse(path).map_err(|source| BuildError::Path {
                    node: self.label(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let composition = self
            .composition
            .iter()
            .cloned()
            .collect::<Result<Vec<_>, _>>()?;

        let mut lineage = prefix.to_vec();
        if !self.segment.is_empty() {
            lineage.push(self.segment.clone());
        }

        let output_name = match (&self.name, self.is_capture) {
            (Some(name), true) => name.clone(),
            _ => lineage.join("_"),
        };

        let children = self
            .children
            .iter()
            .map(|child| child.compile(&lineage))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ExtractNode {
            key: self.key.clone(),
            paths,
            output_name,
            is_capture: self.is_capture,
            is_finder: self.is_finder,
            is_splat: self.is_splat,
            composition,
            children,
        })
    }

    fn push(&mut self, node: NodeBuilder) -> &mut NodeBuilder {
        let at = self.children.len();
        self.children.push(node);
        &mut self.children[at]
    }

    fn label(&self) -> String {
        if self.segment.is_empty() {
            "<root>".to_string()
        } else {
            self.segment.clone()
        }
    }

    fn regex_error(&self, pattern: &str, error: regex::Error) -> BuildError {
        BuildError::Regex {
            node: self.label(),
            pattern: pattern.to_string(),
            message: error.to_string(),
        }
    }
}

impl Extractor {
    /// Start an extraction tree at its synthetic root.
    pub fn builder() -> NodeBuilder {
        NodeBuilder::root()
    }
}
