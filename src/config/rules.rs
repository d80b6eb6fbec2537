use crate::document::ProcurementDocument;
use crate::error::ConfigError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Minimum number of suppliers an RFQ must invite for totals in `[amount_from, amount_to)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierRule {
    pub name: String,
    pub amount_from: Decimal,
    pub amount_to: Decimal,
    pub min_suppliers: u32,
    /// Lower value wins.
    pub priority: i32,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl SupplierRule {
    pub fn new(
        name: impl Into<String>,
        amount_from: Decimal,
        amount_to: Decimal,
        min_suppliers: u32,
        priority: i32,
    ) -> Self {
        Self {
            name: name.into(),
            amount_from,
            amount_to,
            min_suppliers,
            priority,
            is_active: true,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.amount_from >= self.amount_to {
            return Err(ConfigError::InvalidAmountRange {
                rule: self.name.clone(),
                from: self.amount_from,
                to: self.amount_to,
            });
        }
        if self.min_suppliers < 1 {
            return Err(ConfigError::InvalidMinSuppliers {
                rule: self.name.clone(),
            });
        }
        Ok(())
    }

    pub fn contains(&self, amount: Decimal) -> bool {
        self.amount_from <= amount && amount < self.amount_to
    }

    pub fn overlaps(&self, other: &SupplierRule) -> bool {
        self.amount_from < other.amount_to && other.amount_from < self.amount_to
    }
}

/// Outcome of checking an RFQ's invited supplier count against the rule book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SupplierRequirement {
    pub valid: bool,
    pub message: String,
    pub total_amount: Decimal,
    pub required_suppliers: Option<u32>,
    pub current_suppliers: usize,
    pub rule_name: Option<String>,
}

/// The validated set of supplier rules.
#[derive(Debug, Clone, Default)]
pub struct RuleBook {
    rules: Vec<SupplierRule>,
}

impl RuleBook {
    /// Validates every rule and rejects overlapping active ranges.
    pub fn new(rules: Vec<SupplierRule>) -> Result<Self, ConfigError> {
        for rule in &rules {
            rule.validate()?;
        }
        for (i, rule) in rules.iter().enumerate() {
            if !rule.is_active {
                continue;
            }
            let conflicts: Vec<String> = rules
                .iter()
                .enumerate()
                .filter(|(j, other)| *j != i && other.is_active && rule.overlaps(other))
                .map(|(_, other)| format!("{} [{} - {})", other.name, other.amount_from, other.amount_to))
                .collect();
            if !conflicts.is_empty() {
                return Err(ConfigError::OverlappingRules {
                    rule: rule.name.clone(),
                    conflicts,
                });
            }
        }
        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[SupplierRule] {
        &self.rules
    }

    /// The active rule covering `amount`: lowest priority first, then lowest `amount_from`.
    pub fn applicable_rule(&self, amount: Decimal) -> Option<&SupplierRule> {
        self.rules
            .iter()
            .filter(|r| r.is_active && r.contains(amount))
            .min_by(|a, b| {
                a.priority
                    .cmp(&b.priority)
                    .then(a.amount_from.cmp(&b.amount_from))
            })
    }

    /// Checks whether an RFQ invites enough suppliers for its estimated total.
    pub fn check_supplier_count(&self, rfq: &ProcurementDocument) -> SupplierRequirement {
        let total_amount = rfq.grand_total();
        let current_suppliers = rfq.suppliers.len();

        if total_amount.is_zero() {
            return SupplierRequirement {
                valid: true,
                message: "No amount to validate (items have no rates)".to_string(),
                total_amount,
                required_suppliers: None,
                current_suppliers,
                rule_name: None,
            };
        }

        let Some(rule) = self.applicable_rule(total_amount) else {
            return SupplierRequirement {
                valid: true,
                message: "No applicable rule for this amount range".to_string(),
                total_amount,
                required_suppliers: None,
                current_suppliers,
                rule_name: None,
            };
        };

        let valid = current_suppliers >= rule.min_suppliers as usize;
        let message = if valid {
            "Supplier count meets requirements".to_string()
        } else {
            format!(
                "This RFQ requires at least {} suppliers (current: {}). Applicable rule: {} for amount range {} - {}",
                rule.min_suppliers, current_suppliers, rule.name, rule.amount_from, rule.amount_to
            )
        };
        SupplierRequirement {
            valid,
            message,
            total_amount,
            required_suppliers: Some(rule.min_suppliers),
            current_suppliers,
            rule_name: Some(rule.name.clone()),
        }
    }
}
