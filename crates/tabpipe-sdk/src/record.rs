use std::fmt;
use std::sync::Arc;

use crate::error::{PipelineError, Result};

/// A single cell of a row.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Missing,
    Numeric(f64),
    /// Index into the attribute's nominal labels.
    Nominal(usize),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttributeKind {
    Numeric,
    Nominal(Vec<String>),
    Text,
    Date,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub kind: AttributeKind,
}

impl Attribute {
    pub fn numeric(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: AttributeKind::Numeric,
        }
    }

    pub fn nominal(name: impl Into<String>, labels: Vec<String>) -> Self {
        Self {
            name: name.into(),
            kind: AttributeKind::Nominal(labels),
        }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: AttributeKind::Text,
        }
    }
}

/// Attribute definitions plus relation identity for a dataset.
///
/// A schema is shared read-only (via `Arc`) between a [`Dataset`] and every
/// [`Row`] sliced from it; rows never exist without an owning schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    relation: String,
    attributes: Vec<Attribute>,
    label_index: Option<usize>,
}

impl Schema {
    pub fn new(relation: impl Into<String>, attributes: Vec<Attribute>) -> Self {
        Self {
            relation: relation.into(),
            attributes,
            label_index: None,
        }
    }

    /// Designate the label column (0-based).
    pub fn with_label_index(mut self, index: usize) -> Result<Self> {
        if index >= self.attributes.len() {
            return Err(PipelineError::Schema(format!(
                "label index {} out of range for {} attributes",
                index,
                self.attributes.len()
            )));
        }
        self.label_index = Some(index);
        Ok(self)
    }

    pub fn relation(&self) -> &str {
        &self.relation
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn num_attributes(&self) -> usize {
        self.attributes.len()
    }

    pub fn label_index(&self) -> Option<usize> {
        self.label_index
    }
}

/// A full table of homogeneous rows plus its schema.
#[derive(Debug, Clone)]
pub struct Dataset {
    schema: Arc<Schema>,
    rows: Vec<Vec<Value>>,
}

impl Dataset {
    pub fn new(schema: Arc<Schema>) -> Self {
        Self {
            schema,
            rows: Vec::new(),
        }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn push_row(&mut self, values: Vec<Value>) -> Result<()> {
        if values.len() != self.schema.num_attributes() {
            return Err(PipelineError::Schema(format!(
                "row has {} values, schema {} expects {}",
                values.len(),
                self.schema.relation(),
                self.schema.num_attributes()
            )));
        }
        self.rows.push(values);
        Ok(())
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row_values(&self, index: usize) -> Option<&[Value]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    /// Slice one row out of the dataset, sharing its schema.
    pub fn row(&self, index: usize) -> Option<Row> {
        self.rows.get(index).map(|values| Row {
            schema: Arc::clone(&self.schema),
            values: values.clone(),
        })
    }

    pub fn iter_rows(&self) -> impl Iterator<Item = Row> + '_ {
        self.rows.iter().map(|values| Row {
            schema: Arc::clone(&self.schema),
            values: values.clone(),
        })
    }
}

/// A single entry bound to its owning dataset's schema.
#[derive(Debug, Clone)]
pub struct Row {
    schema: Arc<Schema>,
    values: Vec<Value>,
}

impl Row {
    pub fn new(schema: Arc<Schema>, values: Vec<Value>) -> Result<Self> {
        if values.len() != schema.num_attributes() {
            return Err(PipelineError::Schema(format!(
                "row has {} values, schema {} expects {}",
                values.len(),
                schema.relation(),
                schema.num_attributes()
            )));
        }
        Ok(Self { schema, values })
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn value(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }
}

/// The unit of work flowing through a pipeline.
#[derive(Debug, Clone)]
pub enum Record {
    Dataset(Dataset),
    Row(Row),
}

impl Record {
    pub fn kind(&self) -> RecordKind {
        match self {
            Self::Dataset(_) => RecordKind::Dataset,
            Self::Row(_) => RecordKind::Row,
        }
    }

    /// The schema governing this record; for a row, its owning dataset's schema.
    pub fn schema(&self) -> &Arc<Schema> {
        match self {
            Self::Dataset(data) => data.schema(),
            Self::Row(row) => row.schema(),
        }
    }
}

/// Capability tag used by the stage composition contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Dataset,
    Row,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dataset => write!(f, "dataset"),
            Self::Row => write!(f, "row"),
        }
    }
}

/// Label-column override: `first`, `last`, or a 1-based column number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelIndex {
    First,
    Last,
    /// 1-based, as written in configuration.
    Column(usize),
}

impl LabelIndex {
    pub fn parse(text: &str) -> Result<Self> {
        match text.trim() {
            "first" => Ok(Self::First),
            "last" => Ok(Self::Last),
            other => match other.parse::<usize>() {
                Ok(n) if n >= 1 => Ok(Self::Column(n)),
                _ => Err(PipelineError::Config(format!(
                    "invalid label index '{other}', expected 'first', 'last' or a 1-based number"
                ))),
            },
        }
    }

    /// Resolve to a 0-based attribute index for a schema of the given width.
    pub fn resolve(&self, num_attributes: usize) -> Result<usize> {
        let index = match self {
            Self::First => 0,
            Self::Last => num_attributes.saturating_sub(1),
            Self::Column(n) => n.checked_sub(1).ok_or_else(|| {
                PipelineError::Schema("label column numbers are 1-based".to_string())
            })?,
        };
        if num_attributes == 0 || index >= num_attributes {
            return Err(PipelineError::Schema(format!(
                "label index {self:?} out of range for {num_attributes} attributes"
            )));
        }
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Arc<Schema> {
        Arc::new(Schema::new(
            "weather",
            vec![Attribute::numeric("temp"), Attribute::numeric("humidity")],
        ))
    }

    #[test]
    fn rows_share_the_dataset_schema() {
        let mut data = Dataset::new(schema());
        data.push_row(vec![Value::Numeric(21.0), Value::Numeric(0.4)])
            .unwrap();
        let row = data.row(0).unwrap();
        assert!(Arc::ptr_eq(row.schema(), data.schema()));
        assert_eq!(row.value(0), Some(&Value::Numeric(21.0)));
    }

    #[test]
    fn push_row_rejects_wrong_arity() {
        let mut data = Dataset::new(schema());
        let err = data.push_row(vec![Value::Numeric(1.0)]).unwrap_err();
        assert!(matches!(err, PipelineError::Schema(_)));
    }

    #[test]
    fn label_index_parsing() {
        assert_eq!(LabelIndex::parse("first").unwrap(), LabelIndex::First);
        assert_eq!(LabelIndex::parse("last").unwrap(), LabelIndex::Last);
        assert_eq!(LabelIndex::parse("3").unwrap(), LabelIndex::Column(3));
        assert!(LabelIndex::parse("0").is_err());
        assert!(LabelIndex::parse("banana").is_err());
    }

    #[test]
    fn label_index_resolution() {
        assert_eq!(LabelIndex::First.resolve(4).unwrap(), 0);
        assert_eq!(LabelIndex::Last.resolve(4).unwrap(), 3);
        assert_eq!(LabelIndex::Column(2).resolve(4).unwrap(), 1);
        assert!(LabelIndex::Column(5).resolve(4).is_err());
    }
}
