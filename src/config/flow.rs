use crate::document::DocType;
use crate::error::ConfigError;
use ahash::AHashSet;
use serde::{Deserialize, Serialize};

/// One step of a procurement flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowStep {
    pub step_no: u32,
    pub doctype: DocType,
    #[serde(default)]
    pub requires_source: bool,
    #[serde(default)]
    pub allowed_actions: Vec<String>,
}

impl FlowStep {
    pub fn new(step_no: u32, doctype: DocType, requires_source: bool) -> Self {
        Self {
            step_no,
            doctype,
            requires_source,
            allowed_actions: Vec::new(),
        }
    }
}

/// An ordered sequence of document types that governs chain validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcurementFlow {
    pub name: String,
    pub steps: Vec<FlowStep>,
    #[serde(default)]
    pub is_active: bool,
}

impl ProcurementFlow {
    pub fn new(name: impl Into<String>, mut steps: Vec<FlowStep>) -> Self {
        steps.sort_by_key(|s| s.step_no);
        Self {
            name: name.into(),
            steps,
            is_active: true,
        }
    }

    /// The seven-step chain from Material Request to Purchase Invoice.
    pub fn standard() -> Self {
        let steps = DocType::ALL
            .into_iter()
            .enumerate()
            .map(|(i, dt)| FlowStep::new(i as u32 + 1, dt, i > 0))
            .collect();
        Self::new("Standard Procurement", steps)
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// Checks step numbering and the first-step rule.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = AHashSet::new();
        for step in &self.steps {
            if !seen.insert(step.step_no) {
                return Err(ConfigError::DuplicateStep {
                    flow: self.name.clone(),
                    step_no: step.step_no,
                });
            }
        }

        let mut numbers: Vec<u32> = self.steps.iter().map(|s| s.step_no).collect();
        numbers.sort_unstable();
        if numbers.iter().zip(1u32..).any(|(n, expected)| *n != expected) {
            return Err(ConfigError::NonContiguousSteps {
                flow: self.name.clone(),
            });
        }

        let mut doctypes = AHashSet::new();
        for step in &self.steps {
            if !doctypes.insert(step.doctype) {
                return Err(ConfigError::RepeatedDocType {
                    flow: self.name.clone(),
                    doctype: step.doctype,
                });
            }
        }

        if let Some(first) = self.ordered_steps().first() {
            if first.requires_source {
                return Err(ConfigError::FirstStepRequiresSource {
                    flow: self.name.clone(),
                    step_no: first.step_no,
                    doctype: first.doctype,
                });
            }
        }
        Ok(())
    }

    /// Steps sorted by step number.
    pub fn ordered_steps(&self) -> Vec<&FlowStep> {
        let mut steps: Vec<&FlowStep> = self.steps.iter().collect();
        steps.sort_by_key(|s| s.step_no);
        steps
    }

    pub fn step_for(&self, doctype: DocType) -> Option<&FlowStep> {
        self.steps.iter().find(|s| s.doctype == doctype)
    }

    pub fn previous_step(&self, doctype: DocType) -> Option<&FlowStep> {
        let ordered = self.ordered_steps();
        let pos = ordered.iter().position(|s| s.doctype == doctype)?;
        if pos == 0 { None } else { Some(ordered[pos - 1]) }
    }

    pub fn next_step(&self, doctype: DocType) -> Option<&FlowStep> {
        let ordered = self.ordered_steps();
        let pos = ordered.iter().position(|s| s.doctype == doctype)?;
        ordered.get(pos + 1).copied()
    }
}

/// All configured flows, validated, with at most one of them active.
#[derive(Debug, Clone, Default)]
pub struct FlowCatalog {
    flows: Vec<ProcurementFlow>,
}

impl FlowCatalog {
    pub fn new(flows: Vec<ProcurementFlow>) -> Result<Self, ConfigError> {
        for flow in &flows {
            flow.validate()?;
        }
        let active: Vec<String> = flows
            .iter()
            .filter(|f| f.is_active)
            .map(|f| f.name.clone())
            .collect();
        if active.len() > 1 {
            return Err(ConfigError::MultipleActiveFlows(active));
        }
        Ok(Self { flows })
    }

    /// A catalog holding only the standard flow, active.
    pub fn standard() -> Self {
        Self {
            flows: vec![ProcurementFlow::standard()],
        }
    }

    pub fn active(&self) -> Option<&ProcurementFlow> {
        self.flows.iter().find(|f| f.is_active)
    }

    pub fn get(&self, name: &str) -> Option<&ProcurementFlow> {
        self.flows.iter().find(|f| f.name == name)
    }

    pub fn flows(&self) -> &[ProcurementFlow] {
        &self.flows
    }
}
