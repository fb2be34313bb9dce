use indexmap::IndexMap;
use tracing::debug;

use crate::{
    evaluator::EvalError,
    extractor::{Extractor, Table},
    mapper::Mapper,
    value::Value,
};

/// Merge, then project.
///
/// # Examples
///
/// ```
/// use djc::{Extractor, Mapper, Pipeline, Value};
/// use indexmap::IndexMap;
/// use serde_json::json;
///
/// let mapper = Mapper::builder()
///     .merge("classes", "instructors")
///     .on("instructor", "id")
///     .into_field("lecturer")
///     .build()
///     .unwrap();
///
/// let mut root = Extractor::builder();
/// root.child("classes", |class| {
///     class.capture("name");
///     class.capture("lecturer.name").named("lecturer");
/// });
/// let pipeline = Pipeline::new(mapper, root.build().unwrap());
///
/// let mut docs = IndexMap::new();
/// docs.insert("classes".to_string(), Value::from(json!([{"name": "Math", "instructor": 3}])));
/// docs.insert("instructors".to_string(), Value::from(json!([{"id": 3, "name": "Lee"}])));
///
/// let table = pipeline.run_named(docs).unwrap();
/// assert_eq!(table.header, vec!["classes_name", "lecturer"]);
/// assert_eq!(table.rows[0]["lecturer"], Value::from("Lee"));
/// ```
#[derive(Debug, Clone)]
pub struct Pipeline {
    mapper: Mapper,
    extractor: Extractor,
}

impl Pipeline {
    pub fn new(mapper: Mapper, extractor: Extractor) -> Self {
        Pipeline { mapper, extractor }
    }

    /// Projection only.
    pub fn extract_only(extractor: Extractor) -> Self {
        Pipeline::new(Mapper::default(), extractor)
    }

    pub fn mapper(&self) -> &Mapper {
        &self.mapper
    }

    pub fn extractor(&self) -> &Extractor {
        &self.extractor
    }

    /// Apply the merge rules to `document`, then flatten it.
    pub fn run(&self, mut document: Value) -> Result<Table, EvalError> {
        if !self.mapper.is_empty() {
            self.mapper.apply(&mut document)?;
            debug!(rules = self.mapper.rules().len(), "merge rules applied");
        }
        self.extractor.table(&document)
    }

    /// Run over several documents gathered under one root object, each at
    /// its name.
    pub fn run_named(&self, documents: IndexMap<String, Value>) -> Result<Table, EvalError> {
        debug!(documents = ?documents.keys().collect::<Vec<_>>(), "combining named documents");
        self.run(Value::Object(documents))
    }
}
