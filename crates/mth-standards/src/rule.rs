//! Schema rules: the validation contract for one attribute path.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared value type of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    #[serde(rename = "string")]
    String,
    #[serde(rename = "integer")]
    Int,
    #[serde(rename = "float")]
    Float,
    #[serde(rename = "boolean")]
    Bool,
    #[serde(rename = "datetime")]
    DateTime,
    #[serde(rename = "reference")]
    Reference,
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::String => "string",
            ValueType::Int => "integer",
            ValueType::Float => "float",
            ValueType::Bool => "boolean",
            ValueType::DateTime => "datetime",
            ValueType::Reference => "reference",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Allowed value style of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Style {
    #[default]
    #[serde(rename = "free form")]
    FreeForm,
    /// Value must be one of the rule's options.
    #[serde(rename = "controlled vocabulary")]
    ControlledVocabulary,
    #[serde(rename = "name")]
    Name,
    #[serde(rename = "number")]
    Number,
    #[serde(rename = "date")]
    Date,
}

impl Style {
    pub fn as_str(&self) -> &'static str {
        match self {
            Style::FreeForm => "free form",
            Style::ControlledVocabulary => "controlled vocabulary",
            Style::Name => "name",
            Style::Number => "number",
            Style::Date => "date",
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation contract for one fully-qualified attribute path.
///
/// Rules are immutable once loaded. Catalogue entries are deserialized from
/// JSON; synthetic rules for base attributes are built with [`SchemaRule::new`]
/// and the chained setters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaRule {
    /// Dotted attribute path, e.g. `location.latitude`.
    pub path: String,

    #[serde(rename = "type")]
    pub value_type: ValueType,

    #[serde(default)]
    pub required: bool,

    #[serde(default)]
    pub style: Style,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,

    #[serde(default)]
    pub description: String,

    /// Allowed values for controlled-vocabulary attributes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,

    /// Alternate paths that resolve to this rule.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alias: Vec<String>,

    #[serde(default)]
    pub example: String,

    /// Whether the attribute holds a list of `value_type` elements.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub list: bool,
}

impl SchemaRule {
    /// Create a free-form, optional, scalar rule.
    pub fn new(path: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            path: path.into(),
            value_type,
            required: false,
            style: Style::FreeForm,
            units: None,
            description: String::new(),
            options: Vec::new(),
            alias: Vec::new(),
            example: String::new(),
            list: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    pub fn units(mut self, units: impl Into<String>) -> Self {
        self.units = Some(units.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias.push(alias.into());
        self
    }

    pub fn list(mut self) -> Self {
        self.list = true;
        self
    }

    /// Last segment of the dotted path.
    pub fn leaf_name(&self) -> &str {
        self.path.rsplit('.').next().unwrap_or(&self.path)
    }

    /// Bound on the absolute value for geographic coordinate attributes.
    pub fn coordinate_limit(&self) -> Option<f64> {
        if self.value_type != ValueType::Float {
            return None;
        }
        match self.leaf_name() {
            "latitude" => Some(90.0),
            "longitude" => Some(180.0),
            _ => None,
        }
    }

    /// Whether the rule restricts values to its options list.
    pub fn is_controlled(&self) -> bool {
        self.style == Style::ControlledVocabulary && !self.options.is_empty()
    }

    /// Match `value` against the options list, case-insensitively.
    ///
    /// Returns the catalogued spelling of the matching option.
    pub fn match_option(&self, value: &str) -> Option<&str> {
        let value = value.trim();
        self.options
            .iter()
            .find(|option| option.eq_ignore_ascii_case(value))
            .map(String::as_str)
    }
}
