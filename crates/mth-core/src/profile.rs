//! Per-kind profiles: schema, summary layout and capacity for every entity
//! kind, resolved once when an archive is opened.

use mth_common::EntityKind;
use mth_metadata::MetadataRecord;
use mth_standards::{SchemaRegistry, SchemaSet};
use mth_table::{layout_for, RecordLayout};
use std::sync::Arc;

use crate::config::Capacities;

#[derive(Debug, Clone)]
pub struct KindProfile {
    pub kind: EntityKind,
    pub schema: Arc<SchemaSet>,
    /// Summary layout; `None` for channel leaves.
    pub layout: Option<Arc<RecordLayout>>,
    pub capacity: usize,
}

/// The kind → profile table.
#[derive(Debug, Clone)]
pub struct Profiles {
    entries: Vec<KindProfile>,
}

impl Profiles {
    pub fn new(registry: &SchemaRegistry, capacities: &Capacities) -> Self {
        let entries = EntityKind::ALL
            .iter()
            .map(|&kind| KindProfile {
                kind,
                schema: registry.schema(kind),
                layout: layout_for(kind).map(Arc::new),
                capacity: capacities.for_kind(kind),
            })
            .collect();
        Self { entries }
    }

    pub fn get(&self, kind: EntityKind) -> &KindProfile {
        // entries follow EntityKind::ALL, which follows declaration order
        &self.entries[kind as usize]
    }

    /// Empty record for `kind` bound to this archive's schema.
    pub fn record(&self, kind: EntityKind) -> MetadataRecord {
        MetadataRecord::with_schema(self.get(kind).schema.clone())
    }
}
