//! Flattened, display-oriented view of schema rules.

use serde::{Deserialize, Serialize};

use crate::rule::SchemaRule;

/// One row of the standards summary: every rule field rendered as text,
/// list fields joined by commas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSummary {
    /// `<section>.<path>`
    pub attribute: String,
    #[serde(rename = "type")]
    pub value_type: String,
    pub required: bool,
    pub style: String,
    pub units: String,
    pub description: String,
    pub options: String,
    pub alias: String,
    pub example: String,
}

impl RuleSummary {
    pub fn from_rule(section: &str, rule: &SchemaRule) -> Self {
        Self {
            attribute: format!("{section}.{}", rule.path),
            value_type: rule.value_type.as_str().to_string(),
            required: rule.required,
            style: rule.style.as_str().to_string(),
            units: rule.units.clone().unwrap_or_default(),
            description: rule.description.clone(),
            options: rule.options.join(","),
            alias: rule.alias.join(","),
            example: rule.example.clone(),
        }
    }
}
