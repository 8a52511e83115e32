//! Entity nodes: a named container node paired with its metadata record.
//!
//! Every group node of the survey tree keeps a `Summary` record dataset
//! whose rows describe its children. Creating a child appends the child's
//! projection to the parent's summary; removing a child tombstones the
//! matching rows.

use chrono::Utc;
use mth_common::time::format_canonical;
use mth_common::{EntityKind, Error, ReferenceHandle, Result};
use mth_metadata::{MetadataRecord, ENTITY_KIND_ATTR};
use mth_table::{truncate_to_width, Cell, FieldType, Probe, SummaryTable, Test, SUMMARY_NAME};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::container::dataset::LAST_UPDATED_ATTR;
use crate::container::{ContainerBackend, DatasetStorage};
use crate::profile::Profiles;
use crate::rows;

/// Attribute naming what a dataset is.
pub const TYPE_ATTR: &str = "type";
/// Attribute holding a summary dataset's own reference handle.
pub const SUMMARY_REFERENCE_ATTR: &str = "reference";
/// Value of [`TYPE_ATTR`] on summary datasets.
pub const SUMMARY_TYPE: &str = "summary table";

/// Borrowed view of the container and the per-kind profiles.
pub(crate) struct Context<'c, C> {
    pub(crate) container: &'c C,
    pub(crate) profiles: &'c Profiles,
}

impl<'c, C> Context<'c, C> {
    pub(crate) fn new(container: &'c C, profiles: &'c Profiles) -> Self {
        Self {
            container,
            profiles,
        }
    }
}

impl<C> Clone for Context<'_, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for Context<'_, C> {}

/// Whether nodes of `parent` kind hold children of `child` kind.
pub fn accepts_child(parent: EntityKind, child: EntityKind) -> bool {
    match parent {
        EntityKind::Survey => matches!(
            child,
            EntityKind::Stations | EntityKind::Standards | EntityKind::Filters | EntityKind::Reports
        ),
        EntityKind::Stations => child == EntityKind::Station,
        EntityKind::Station => child == EntityKind::Run,
        EntityKind::Run => child.is_channel(),
        _ => false,
    }
}

/// A node of the survey tree with its in-memory metadata.
///
/// The record is a working copy: edits through [`EntityNode::metadata_mut`]
/// reach the container on [`EntityNode::write_metadata`].
pub struct EntityNode<'c, C: ContainerBackend> {
    ctx: Context<'c, C>,
    handle: ReferenceHandle,
    name: String,
    kind: EntityKind,
    metadata: MetadataRecord,
}

impl<'c, C: ContainerBackend> EntityNode<'c, C> {
    /// Open an existing node, reading its metadata from the container.
    pub(crate) fn open(ctx: Context<'c, C>, handle: ReferenceHandle, name: &str) -> Result<Self> {
        let attrs = ctx.container.attrs(handle)?;
        let kind: EntityKind = attrs
            .get(ENTITY_KIND_ATTR)
            .and_then(Value::as_str)
            .ok_or_else(|| Error::InvalidState(format!("{name} is not an archive entity")))?
            .parse()?;
        let mut metadata = ctx.profiles.record(kind);
        metadata.apply_flat_map(&attrs)?;
        metadata.set_reference(handle);
        Ok(Self {
            ctx,
            handle,
            name: name.to_string(),
            kind,
            metadata,
        })
    }

    /// Create the node `name` under `parent` without touching the parent's
    /// summary. Channels become sample datasets, everything else a group with
    /// its own summary table.
    pub(crate) fn create_in(
        ctx: Context<'c, C>,
        parent: ReferenceHandle,
        name: &str,
        mut metadata: MetadataRecord,
        samples: Option<&[f64]>,
    ) -> Result<Self> {
        let kind = metadata.kind();
        apply_identity_defaults(&mut metadata, name)?;

        let handle = if kind.is_channel() {
            let handle = ctx.container.create_samples(parent, name)?;
            if let Some(samples) = samples {
                ctx.container.write_samples(handle, samples)?;
            }
            handle
        } else {
            ctx.container.create_group(parent, name)?
        };
        metadata.set_reference(handle);

        let node = Self {
            ctx,
            handle,
            name: name.to_string(),
            kind,
            metadata,
        };
        node.write_metadata()?;
        node.create_summary()?;
        debug!(kind = %kind, name, handle = handle.0, "created node");
        Ok(node)
    }

    fn create_summary(&self) -> Result<()> {
        let profile = self.ctx.profiles.get(self.kind);
        let Some(layout) = &profile.layout else {
            return Ok(());
        };
        let container = self.ctx.container;
        let table = container.create_table(self.handle, SUMMARY_NAME, layout, profile.capacity)?;
        container.set_attr(table, TYPE_ATTR, Value::from(SUMMARY_TYPE))?;
        container.set_attr(table, SUMMARY_REFERENCE_ATTR, Value::from(table.0))?;
        container.set_attr(
            table,
            LAST_UPDATED_ATTR,
            Value::from(format_canonical(&Utc::now())),
        )?;
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn handle(&self) -> ReferenceHandle {
        self.handle
    }

    pub fn metadata(&self) -> &MetadataRecord {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut MetadataRecord {
        &mut self.metadata
    }

    pub(crate) fn container(&self) -> &'c C {
        self.ctx.container
    }

    pub(crate) fn profiles(&self) -> &'c Profiles {
        self.ctx.profiles
    }

    /// Replace the working record with the attributes stored on the node.
    pub fn read_metadata(&mut self) -> Result<()> {
        let attrs = self.ctx.container.attrs(self.handle)?;
        let mut metadata = self.ctx.profiles.record(self.kind);
        metadata.apply_flat_map(&attrs)?;
        metadata.set_reference(self.handle);
        self.metadata = metadata;
        Ok(())
    }

    /// Store the working record as the node's attributes, dropping stale ones.
    pub fn write_metadata(&self) -> Result<()> {
        let container = self.ctx.container;
        let flat = self.metadata.to_flat_map();
        for stale in container
            .attrs(self.handle)?
            .keys()
            .filter(|name| !flat.contains_key(*name))
        {
            container.delete_attr(self.handle, stale)?;
        }
        let count = flat.len();
        for (path, value) in flat {
            container.set_attr(self.handle, &path, value)?;
        }
        debug!(kind = %self.kind, name = %self.name, attributes = count, "wrote metadata");
        Ok(())
    }

    /// `metadata` checked against `kind`, or an empty record of `kind`.
    pub(crate) fn child_record(&self, kind: EntityKind, metadata: Option<MetadataRecord>) -> Result<MetadataRecord> {
        match metadata {
            None => Ok(self.ctx.profiles.record(kind)),
            Some(record) if record.kind() == kind => Ok(record),
            Some(record) => Err(Error::SchemaMismatch(format!(
                "expected {kind} metadata, found {}",
                record.kind()
            ))),
        }
    }

    /// Whether this node keeps a summary table.
    pub fn has_summary(&self) -> bool {
        self.ctx.profiles.get(self.kind).layout.is_some()
    }

    /// The node's summary table.
    pub fn summary_table(&self) -> Result<SummaryTable<DatasetStorage<'c, C>>> {
        if !self.has_summary() {
            return Err(Error::InvalidState(format!(
                "{} {} keeps no summary table",
                self.kind, self.name
            )));
        }
        let table = self
            .ctx
            .container
            .child(self.handle, SUMMARY_NAME)?
            .ok_or_else(|| Error::not_found(format!("summary table of {}", self.name), SUMMARY_NAME))?;
        SummaryTable::open(
            format!("{}/{SUMMARY_NAME}", self.name),
            DatasetStorage::new(self.ctx.container, table),
        )
    }

    /// Names of child entities, excluding the summary table.
    pub fn list_children(&self) -> Result<Vec<String>> {
        if self.kind.is_channel() {
            return Ok(Vec::new());
        }
        Ok(self
            .ctx
            .container
            .children(self.handle)?
            .into_iter()
            .filter(|name| name != SUMMARY_NAME)
            .collect())
    }

    /// Open the child `name`; its kind comes from the stored `entity_kind`.
    pub fn get_child(&self, name: &str) -> Result<EntityNode<'c, C>> {
        let handle = self
            .ctx
            .container
            .child(self.handle, name)?
            .filter(|_| name != SUMMARY_NAME)
            .ok_or_else(|| Error::not_found(format!("child of {}", self.name), name))?;
        Self::open(self.ctx, handle, name)
    }

    /// Create the child `name` described by `metadata`.
    ///
    /// Returns the child and whether it was created. An existing child of
    /// that name is returned as is and no summary row is appended.
    pub fn create_child(&self, name: &str, metadata: MetadataRecord) -> Result<(EntityNode<'c, C>, bool)> {
        self.create_child_with(name, metadata, None)
    }

    pub(crate) fn create_child_with(
        &self,
        name: &str,
        metadata: MetadataRecord,
        samples: Option<&[f64]>,
    ) -> Result<(EntityNode<'c, C>, bool)> {
        let child_kind = metadata.kind();
        if !accepts_child(self.kind, child_kind) {
            return Err(Error::InvalidState(format!(
                "{} {} cannot hold a {child_kind}",
                self.kind, self.name
            )));
        }
        if name == SUMMARY_NAME {
            return Err(Error::InvalidState(format!("{SUMMARY_NAME} is a reserved name")));
        }

        if let Some(existing) = self.ctx.container.child(self.handle, name)? {
            info!(parent = %self.name, child = name, kind = %child_kind, "child exists, returning it");
            return Ok((Self::open(self.ctx, existing, name)?, false));
        }

        // records built elsewhere may be bound to another catalogue
        let metadata = metadata.rebind(Arc::clone(&self.ctx.profiles.get(child_kind).schema))?;
        let child = Self::create_in(self.ctx, self.handle, name, metadata, samples)?;
        if let Err(err) = self.append_summary_row(&child) {
            self.ctx.container.unlink(self.handle, name)?;
            return Err(err);
        }
        info!(parent = %self.name, child = name, kind = %child_kind, "created child");
        Ok((child, true))
    }

    fn append_summary_row(&self, child: &EntityNode<'c, C>) -> Result<()> {
        let Some(layout) = self.ctx.profiles.get(self.kind).layout.clone() else {
            return Ok(());
        };
        if let Some(row) = rows::summary_row(layout, child)? {
            self.summary_table()?.add_row(&row)?;
        }
        Ok(())
    }

    /// Unlink the child `name` and tombstone its summary rows.
    pub fn remove_child(&self, name: &str) -> Result<()> {
        let child = self.get_child(name)?;
        self.ctx.container.unlink(self.handle, name)?;
        info!(parent = %self.name, child = name, kind = %child.kind, "removed child");
        self.tombstone_rows_for(&child)
    }

    fn tombstone_rows_for(&self, child: &EntityNode<'c, C>) -> Result<()> {
        let Some((field, attr)) = rows::identity_field(child.kind) else {
            return Ok(());
        };
        if !self.has_summary() {
            return Ok(());
        }
        let identity = child.metadata.project_text(attr);
        self.tombstone_matching(field, &identity, child.handle)
    }

    /// Tombstone the live rows whose `field` equals `identity` and whose
    /// reference is `handle`. No match only logs a warning.
    pub(crate) fn tombstone_matching(&self, field: &str, identity: &str, handle: ReferenceHandle) -> Result<()> {
        let mut table = self.summary_table()?;
        let width = match table.layout().field(field).map(|f| f.field_type) {
            Some(FieldType::Str(width)) => width,
            _ => return Err(Error::not_found(format!("string field of {}", table.name()), field)),
        };
        let key = truncate_to_width(identity, width);
        let matches: BTreeSet<usize> = if key.is_empty() {
            BTreeSet::new()
        } else {
            let by_identity = table.locate(field, &Probe::value(Cell::from(key)), Test::Eq)?;
            let referencing = table.locate("reference", &Probe::value(Cell::from(handle)), Test::Eq)?;
            by_identity.intersection(&referencing).copied().collect()
        };
        if matches.is_empty() {
            warn!(table = %table.name(), field, identity, "no summary row matches removed child");
            return Ok(());
        }
        for index in matches {
            table.remove_row(index)?;
        }
        Ok(())
    }

    /// Overwrite the live summary row referencing `child` with a fresh
    /// projection of it.
    pub(crate) fn refresh_row_for(&self, child: &EntityNode<'c, C>) -> Result<usize> {
        let mut table = self.summary_table()?;
        let row = rows::summary_row(table.layout().clone(), child)?.ok_or_else(|| {
            Error::InvalidState(format!("{} rows are not kept in a summary", child.kind))
        })?;
        let referencing = table.locate("reference", &Probe::value(Cell::from(child.handle)), Test::Eq)?;
        let index = referencing
            .into_iter()
            .next()
            .ok_or_else(|| Error::not_found(format!("summary row of {}", self.name), child.name.clone()))?;
        table.overwrite_row(index, &row)?;
        debug!(table = %table.name(), index, "refreshed summary row");
        Ok(index)
    }
}

impl<C: ContainerBackend> fmt::Debug for EntityNode<'_, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityNode")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("handle", &self.handle)
            .finish()
    }
}

/// Fill identity attributes the caller left unset from the node name.
fn apply_identity_defaults(metadata: &mut MetadataRecord, name: &str) -> Result<()> {
    let kind = metadata.kind();
    match kind {
        EntityKind::Station if !metadata.is_set("archive_id") => metadata.set("archive_id", name)?,
        EntityKind::Run if !metadata.is_set("id") => metadata.set("id", name)?,
        EntityKind::Electric | EntityKind::Magnetic | EntityKind::Auxiliary => {
            if !metadata.is_set("component") {
                metadata.set("component", name)?;
            }
            let tag = kind.channel_kind().map(|channel| channel.as_str()).unwrap_or_default();
            match metadata.get_str("type") {
                None | Some("") => metadata.set("type", tag)?,
                Some(existing) if existing != tag => {
                    return Err(Error::SchemaMismatch(format!(
                        "{kind} channel {name} carries type {existing}"
                    )))
                }
                Some(_) => {}
            }
        }
        _ => {}
    }
    Ok(())
}
