//! Run a job file against JSON input

use indexmap::IndexMap;

use super::CliError;
use crate::{JobConfig, Value, output::table_to_json};

/// Options for the extract command
#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
    /// Job file contents
    pub job: String,
    /// JSON input string
    pub input: Option<String>,
    /// Named documents as `(name, JSON text)`, combined under one root
    pub documents: Vec<(String, String)>,
}

/// Run the job's merge rules and projection, returning
/// `{"header": [...], "rows": [...]}`.
pub fn execute_extract(options: &ExtractOptions) -> Result<serde_json::Value, CliError> {
    let pipeline = JobConfig::from_json(&options.job)?.pipeline()?;

    let table = if options.documents.is_empty() {
        let json_str = options.input.as_ref().ok_or(CliError::NoInput)?;
        let document = Value::from(serde_json::from_str::<serde_json::Value>(json_str)?);
        pipeline.run(document)?
    } else {
        let mut documents = IndexMap::new();
        for (name, text) in &options.documents {
            let document = Value::from(serde_json::from_str::<serde_json::Value>(text)?);
            documents.insert(name.clone(), document);
        }
        pipeline.run_named(documents)?
    };

    Ok(table_to_json(&table))
}

/// Split a `name=FILE` argument.
pub fn split_document_arg(arg: &str) -> Result<(String, String), CliError> {
    match arg.split_once('=') {
        Some((name, file)) if !name.is_empty() && !file.is_empty() => {
            Ok((name.to_string(), file.to_string()))
        }
        _ => Err(CliError::BadDocument(arg.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const JOB: &str = r#"{
        "extract": {"nodes": [
            {"key": "items", "children": [{"capture": "sku"}]},
            {"capture": "items.qty", "name": "total", "compose": [{"fn": "sum"}]}
        ]}
    }"#;

    #[test]
    fn test_extract_single_document() {
        let options = ExtractOptions {
            job: JOB.into(),
            input: Some(r#"{"items": [{"sku": "a", "qty": 2}, {"sku": "b", "qty": 3}]}"#.into()),
            documents: Vec::new(),
        };
        assert_eq!(
            execute_extract(&options).unwrap(),
            json!({
                "header": ["items_sku", "total"],
                "rows": [
                    {"items_sku": "a", "total": 5},
                    {"items_sku": "b", "total": 5}
                ]
            })
        );
    }

    #[test]
    fn test_document_arg() {
        assert_eq!(
            split_document_arg("people=people.json").unwrap(),
            ("people".to_string(), "people.json".to_string())
        );
        assert!(matches!(split_document_arg("people"), Err(CliError::BadDocument(_))));
    }
}
