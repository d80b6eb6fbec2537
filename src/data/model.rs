use crate::config::{FlowCatalog, ProcurementFlow, RuleBook, SupplierRule};
use crate::document::{IntoDocument, ProcurementDocument};
use crate::error::{ConfigError, RecordConversionError};
use crate::store::MemoryStore;
use serde::{Deserialize, Serialize};
use std::fs;

/// A self-contained procurement dataset, matching the JSON files the tools read and write.
///
/// Decimal fields are written as strings (`"12.5"`).
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    #[serde(default)]
    pub documents: Vec<ProcurementDocument>,
    #[serde(default)]
    pub flows: Vec<ProcurementFlow>,
    #[serde(default)]
    pub rules: Vec<SupplierRule>,
}

impl Dataset {
    /// Load a dataset from a JSON file.
    pub fn from_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path)?;
        Ok(Self::from_json(&content)?)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Loads the documents into a fresh store, rejecting malformed records.
    pub fn to_store(&self) -> Result<MemoryStore, RecordConversionError> {
        let documents = self
            .documents
            .iter()
            .cloned()
            .map(IntoDocument::into_document)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(MemoryStore::with_documents(documents))
    }

    /// The flow catalog; the standard flow when the dataset defines none.
    pub fn catalog(&self) -> Result<FlowCatalog, ConfigError> {
        if self.flows.is_empty() {
            Ok(FlowCatalog::standard())
        } else {
            FlowCatalog::new(self.flows.clone())
        }
    }

    pub fn rulebook(&self) -> Result<RuleBook, ConfigError> {
        RuleBook::new(self.rules.clone())
    }
}
