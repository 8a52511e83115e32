use mth_common::{EntityKind, Error, ReferenceHandle, Result};
use mth_standards::RuleSummary;
use mth_table::{truncate_to_width, Cell, FieldType, Probe, Record, RecordLayout, Test, SUMMARY_NAME};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

use super::entity_view;
use crate::container::ContainerBackend;

entity_view!(
    /// The standards catalogue; its summary lists one row per schema rule.
    Standards,
    EntityKind::Standards
);

entity_view!(
    /// Filter definitions shared by the survey's channels.
    Filters,
    EntityKind::Filters
);

entity_view!(
    /// Survey reports; its summary lists one row per report.
    Reports,
    EntityKind::Reports
);

impl<C: ContainerBackend> Standards<'_, C> {
    /// Catalogue `rules` unless the summary already holds rows.
    ///
    /// Returns the number of rows appended.
    pub fn bootstrap(&self, rules: &[RuleSummary]) -> Result<usize> {
        if self.summary_table()?.row_count()? > 0 {
            debug!("standards already catalogued");
            return Ok(0);
        }
        self.summary_table_from_rules(rules)
    }

    /// Append one summary row per rule.
    pub fn summary_table_from_rules(&self, rules: &[RuleSummary]) -> Result<usize> {
        let mut table = self.summary_table()?;
        let layout = table.layout().clone();
        for rule in rules {
            table.add_row(&rule_row(layout.clone(), rule)?)?;
        }
        info!(count = rules.len(), "catalogued standards");
        Ok(rules.len())
    }

    /// The first live catalogue row for `attribute` (`<section>.<path>`).
    pub fn find_rule(&self, attribute: &str) -> Result<Record> {
        let table = self.summary_table()?;
        let key = match table.layout().field("attribute").map(|field| field.field_type) {
            Some(FieldType::Str(width)) => truncate_to_width(attribute, width).to_string(),
            _ => attribute.to_string(),
        };
        let index = table
            .locate("attribute", &Probe::value(Cell::from(key)), Test::Eq)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::not_found("standard", attribute))?;
        table.row(index)
    }
}

fn rule_row(layout: Arc<RecordLayout>, rule: &RuleSummary) -> Result<Record> {
    Record::from_pairs(
        layout,
        [
            ("attribute", Cell::from(rule.attribute.as_str())),
            ("type", Cell::from(rule.value_type.as_str())),
            ("required", Cell::from(rule.required)),
            ("style", Cell::from(rule.style.as_str())),
            ("units", Cell::from(rule.units.as_str())),
            ("description", Cell::from(rule.description.as_str())),
            ("options", Cell::from(rule.options.as_str())),
            ("alias", Cell::from(rule.alias.as_str())),
            ("example", Cell::from(rule.example.as_str())),
        ],
    )
}

impl<C: ContainerBackend> Filters<'_, C> {
    pub fn filter_names(&self) -> Result<Vec<String>> {
        self.list_children()
    }
}

impl<C: ContainerBackend> Reports<'_, C> {
    /// Add the report group `name` and its summary row, or return the
    /// existing report's handle.
    pub fn add_report(&self, name: &str, report_type: &str, summary: &str) -> Result<(ReferenceHandle, bool)> {
        if name == SUMMARY_NAME {
            return Err(Error::InvalidState(format!("{SUMMARY_NAME} is a reserved name")));
        }
        let container = self.container();
        if let Some(existing) = container.child(self.handle(), name)? {
            info!(report = name, "report exists, returning it");
            return Ok((existing, false));
        }

        let handle = container.create_group(self.handle(), name)?;
        container.set_attr(handle, "name", Value::from(name))?;
        container.set_attr(handle, "type", Value::from(report_type))?;
        container.set_attr(handle, "summary", Value::from(summary))?;

        let mut table = self.summary_table()?;
        let row = Record::from_pairs(
            table.layout().clone(),
            [
                ("name", Cell::from(name)),
                ("type", Cell::from(report_type)),
                ("summary", Cell::from(summary)),
                ("reference", Cell::from(handle)),
            ],
        )?;
        if let Err(err) = table.add_row(&row) {
            container.unlink(self.handle(), name)?;
            return Err(err);
        }
        info!(report = name, report_type, "added report");
        Ok((handle, true))
    }

    /// Unlink the report `name` and tombstone its summary row.
    pub fn remove_report(&self, name: &str) -> Result<()> {
        let container = self.container();
        let handle = container
            .child(self.handle(), name)?
            .filter(|_| name != SUMMARY_NAME)
            .ok_or_else(|| Error::not_found("report", name))?;
        container.unlink(self.handle(), name)?;
        info!(report = name, "removed report");
        self.tombstone_matching("name", name, handle)
    }

    pub fn report_names(&self) -> Result<Vec<String>> {
        self.list_children()
    }
}
