//! The schema registry: catalogue sections resolved into per-kind rule sets.
//!
//! The catalogue is a JSON object mapping section names to rule lists. Each
//! entity kind draws its rules from one or more sections (see
//! [`EntityKind::schema_sections`]); channel kinds share the `channel`
//! section. The registry builds one [`SchemaSet`] per kind at load time and
//! hands out shared, read-only views.

use mth_common::{EntityKind, Error, Result};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, OnceLock};
use tracing::debug;

use crate::rule::SchemaRule;
use crate::summary::RuleSummary;

/// Catalogue sections, in catalogue order.
pub const SECTIONS: &[&str] = &[
    "survey",
    "station",
    "run",
    "channel",
    "electric",
    "magnetic",
    "auxiliary",
];

const EMBEDDED_CATALOGUE: &str = include_str!("../data/standards.json");

static GLOBAL: OnceLock<std::result::Result<SchemaRegistry, String>> = OnceLock::new();

/// The rules that apply to one entity kind.
#[derive(Debug, Clone)]
pub struct SchemaSet {
    kind: EntityKind,
    rules: Vec<SchemaRule>,
    by_path: HashMap<String, usize>,
    by_alias: HashMap<String, usize>,
}

impl SchemaSet {
    fn build(kind: EntityKind, rules: Vec<SchemaRule>) -> Result<Self> {
        let mut by_path = HashMap::with_capacity(rules.len());
        for (index, rule) in rules.iter().enumerate() {
            if by_path.insert(rule.path.clone(), index).is_some() {
                return Err(Error::Config(format!(
                    "duplicate attribute {} in {} schema",
                    rule.path, kind
                )));
            }
        }

        let mut by_alias = HashMap::new();
        for (index, rule) in rules.iter().enumerate() {
            for alias in &rule.alias {
                if by_path.contains_key(alias) {
                    continue;
                }
                by_alias.entry(alias.clone()).or_insert(index);
            }
        }

        Ok(Self {
            kind,
            rules,
            by_path,
            by_alias,
        })
    }

    /// An empty set for `kind`.
    pub fn empty(kind: EntityKind) -> Self {
        Self {
            kind,
            rules: Vec::new(),
            by_path: HashMap::new(),
            by_alias: HashMap::new(),
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Rules in catalogue order.
    pub fn rules(&self) -> &[SchemaRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Look up the rule for `path`, trying canonical paths before aliases.
    pub fn resolve(&self, path: &str) -> Option<&SchemaRule> {
        self.by_path
            .get(path)
            .or_else(|| self.by_alias.get(path))
            .map(|&index| &self.rules[index])
    }

    /// Like [`SchemaSet::resolve`], failing with `UnknownAttribute`.
    pub fn rule_for(&self, path: &str) -> Result<&SchemaRule> {
        self.resolve(path).ok_or_else(|| Error::UnknownAttribute {
            path: path.to_string(),
        })
    }

    /// Paths of all required rules.
    pub fn required_paths(&self) -> impl Iterator<Item = &str> {
        self.rules
            .iter()
            .filter(|rule| rule.required)
            .map(|rule| rule.path.as_str())
    }
}

/// Read-only catalogue of schema rules.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    sections: Vec<(String, Vec<SchemaRule>)>,
    sets: HashMap<EntityKind, Arc<SchemaSet>>,
}

impl SchemaRegistry {
    /// The process-wide registry built from the embedded catalogue.
    pub fn global() -> Result<&'static SchemaRegistry> {
        GLOBAL
            .get_or_init(|| Self::embedded().map_err(|err| err.to_string()))
            .as_ref()
            .map_err(|message| Error::Config(format!("embedded standards catalogue: {message}")))
    }

    /// Parse the catalogue compiled into the crate.
    pub fn embedded() -> Result<Self> {
        Self::from_json(EMBEDDED_CATALOGUE)
    }

    /// Load an alternate catalogue from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let registry = Self::from_json(&content)?;
        debug!(path = %path.display(), rules = registry.rule_count(), "loaded standards catalogue");
        Ok(registry)
    }

    /// Parse a catalogue from JSON text.
    ///
    /// Sections missing from the text are empty; unknown section names and
    /// duplicate paths within one kind are configuration errors.
    pub fn from_json(text: &str) -> Result<Self> {
        let mut raw: HashMap<String, Vec<SchemaRule>> = serde_json::from_str(text)?;

        if let Some(unknown) = raw.keys().find(|name| !SECTIONS.contains(&name.as_str())) {
            return Err(Error::Config(format!("unknown catalogue section: {unknown}")));
        }

        let sections: Vec<(String, Vec<SchemaRule>)> = SECTIONS
            .iter()
            .map(|name| (name.to_string(), raw.remove(*name).unwrap_or_default()))
            .collect();

        let mut sets = HashMap::new();
        for kind in EntityKind::ALL {
            let mut rules = Vec::new();
            for wanted in kind.schema_sections() {
                if let Some((_, section_rules)) = sections.iter().find(|(name, _)| name == wanted) {
                    rules.extend(section_rules.iter().cloned());
                }
            }
            sets.insert(kind, Arc::new(SchemaSet::build(kind, rules)?));
        }

        Ok(Self { sections, sets })
    }

    /// The rule set for `kind`.
    pub fn schema(&self, kind: EntityKind) -> Arc<SchemaSet> {
        self.sets
            .get(&kind)
            .cloned()
            .unwrap_or_else(|| Arc::new(SchemaSet::empty(kind)))
    }

    /// Look up one rule for `kind`.
    pub fn rule_for(&self, kind: EntityKind, path: &str) -> Result<SchemaRule> {
        self.sets
            .get(&kind)
            .ok_or_else(|| Error::UnknownAttribute {
                path: path.to_string(),
            })?
            .rule_for(path)
            .cloned()
    }

    /// Total number of catalogued rules across all sections.
    pub fn rule_count(&self) -> usize {
        self.sections.iter().map(|(_, rules)| rules.len()).sum()
    }

    /// One summary per catalogued rule, keyed `<section>.<path>`, in
    /// catalogue order.
    pub fn summarize(&self) -> Vec<RuleSummary> {
        self.sections
            .iter()
            .flat_map(|(section, rules)| {
                rules
                    .iter()
                    .map(move |rule| RuleSummary::from_rule(section, rule))
            })
            .collect()
    }
}
