use super::{TrackingLocks, Workflow};
use crate::config::{FlowCatalog, RuleBook};
use crate::document::DocType;
use crate::schema::{DocTypeSchema, SchemaRegistry};

/// Assembles a `Workflow` from its configuration.
///
/// Defaults to the standard seven-step flow, no supplier rules and the full schema for every
/// document type.
pub struct WorkflowBuilder {
    flows: FlowCatalog,
    rules: RuleBook,
    schema: SchemaRegistry,
}

impl Default for WorkflowBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkflowBuilder {
    pub fn new() -> Self {
        Self {
            flows: FlowCatalog::standard(),
            rules: RuleBook::default(),
            schema: SchemaRegistry::default(),
        }
    }

    /// Replaces the flow catalog. An empty catalog disables step-order checks.
    pub fn with_flows(mut self, flows: FlowCatalog) -> Self {
        self.flows = flows;
        self
    }

    pub fn with_rules(mut self, rules: RuleBook) -> Self {
        self.rules = rules;
        self
    }

    /// Overrides the descriptor of one document type.
    pub fn with_schema(mut self, doctype: DocType, schema: DocTypeSchema) -> Self {
        self.schema = self.schema.with_override(doctype, schema);
        self
    }

    pub fn build(self) -> Workflow {
        Workflow {
            flows: self.flows,
            rules: self.rules,
            schema: self.schema,
            locks: TrackingLocks::new(),
        }
    }
}
