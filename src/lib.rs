pub mod ast;
pub mod builder;
pub mod compose;
pub mod config;
pub mod evaluator;
pub mod extractor;
pub mod lexer;
pub mod location;
pub mod mapper;
pub mod output;
pub mod parser;
pub mod pipeline;
pub mod value;

#[cfg(feature = "cli")]
pub mod cli;

pub use ast::{IndexSpec, Selector, Token};
pub use builder::{BuildError, NodeBuilder};
pub use compose::Compose;
pub use config::{ConfigError, JobConfig};
pub use evaluator::{EvalContext, EvalError, Evaluator, MAX_LOOKUP_DEPTH};
pub use extractor::{ExtractNode, Extractor, Row, Table};
pub use lexer::{LexError, Lexer};
pub use location::{Location, Step};
pub use mapper::{Mapper, MapperBuilder, MergeRule};
pub use output::{to_json, to_json_pretty};
pub use parser::{ParseError, Parser, parse};
pub use pipeline::Pipeline;
pub use value::Value;
