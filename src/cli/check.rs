//! Parse paths and evaluate them against JSON input

use super::CliError;
use crate::{Evaluator, Value, parse};

/// Options for the check and eval commands
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// The path expression
    pub path: String,
    /// JSON input string
    pub input: Option<String>,
    /// Only validate syntax, don't evaluate
    pub syntax_only: bool,
}

/// Result of a check operation
#[derive(Debug)]
pub enum CheckResult {
    /// Syntax is valid; carries the normalized path
    SyntaxValid(String),
    /// Path evaluated with JSON output
    Success(serde_json::Value),
}

pub fn execute_check(options: &CheckOptions) -> Result<CheckResult, CliError> {
    let token = parse(&options.path)?;

    if options.syntax_only {
        return Ok(CheckResult::SyntaxValid(token.to_string()));
    }

    let json_str = options.input.as_ref().ok_or(CliError::NoInput)?;
    let document = Value::from(serde_json::from_str::<serde_json::Value>(json_str)?);

    let result = Evaluator::new().evaluate(&token, &document)?;
    Ok(CheckResult::Success(result.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_syntax_only_normalizes() {
        let options = CheckOptions {
            path: "a . b[0]".into(),
            syntax_only: true,
            ..Default::default()
        };
        assert!(matches!(
            execute_check(&options).unwrap(),
            CheckResult::SyntaxValid(path) if path == "a.b[0]"
        ));
    }

    #[test]
    fn test_eval_requires_input() {
        let options = CheckOptions {
            path: "a".into(),
            ..Default::default()
        };
        assert!(matches!(execute_check(&options), Err(CliError::NoInput)));
    }

    #[test]
    fn test_eval() {
        let options = CheckOptions {
            path: "a.x".into(),
            input: Some(r#"{"a": [{"x": 1}, {"x": 2}]}"#.into()),
            syntax_only: false,
        };
        assert!(matches!(
            execute_check(&options).unwrap(),
            CheckResult::Success(v) if v == json!([1, 2])
        ));
    }
}
