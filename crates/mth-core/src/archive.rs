//! The archive: a survey tree inside one container.

use mth_common::{EntityKind, Error, ReferenceHandle, Result};
use mth_metadata::ENTITY_KIND_ATTR;
use mth_standards::SchemaRegistry;
use std::fmt::Write;
use tracing::info;

use crate::config::ArchiveConfig;
use crate::container::{ContainerBackend, NodeKind};
use crate::entity::{
    Filters, Reports, Standards, Stations, Survey, FILTERS_NAME, REPORTS_NAME, STANDARDS_NAME,
    STATIONS_NAME, SURVEY_NAME,
};
use crate::node::{Context, EntityNode};
use crate::profile::Profiles;

/// A survey archive over a container backend.
///
/// Owns the container handle; entity views borrow the archive.
pub struct Archive<C: ContainerBackend> {
    container: C,
    profiles: Profiles,
    survey: ReferenceHandle,
}

impl<C: ContainerBackend> Archive<C> {
    /// Open the survey tree in `container`, creating whatever is missing.
    ///
    /// Creates `Survey` with its `Stations`, `Standards`, `Filters` and
    /// `Reports` children and catalogues the standards. Running it against
    /// an initialized container changes nothing.
    pub fn initialize(container: C, config: &ArchiveConfig) -> Result<Self> {
        config.validate()?;
        let loaded;
        let registry = match &config.catalog {
            Some(path) => {
                loaded = SchemaRegistry::from_file(path)?;
                &loaded
            }
            None => SchemaRegistry::global()?,
        };
        let profiles = Profiles::new(registry, &config.capacities);

        let survey = {
            let ctx = Context::new(&container, &profiles);
            let root = container.root()?;
            let survey = match container.child(root, SURVEY_NAME)? {
                Some(handle) => EntityNode::open(ctx, handle, SURVEY_NAME)?,
                None => EntityNode::create_in(
                    ctx,
                    root,
                    SURVEY_NAME,
                    profiles.record(EntityKind::Survey),
                    None,
                )?,
            };
            for (name, kind) in [
                (STATIONS_NAME, EntityKind::Stations),
                (STANDARDS_NAME, EntityKind::Standards),
                (FILTERS_NAME, EntityKind::Filters),
                (REPORTS_NAME, EntityKind::Reports),
            ] {
                survey.create_child(name, profiles.record(kind))?;
            }
            let standards: Standards<'_, C> = survey.get_child(STANDARDS_NAME)?.try_into()?;
            standards.bootstrap(&registry.summarize())?;
            survey.handle()
        };

        info!(rules = registry.rule_count(), "archive initialized");
        Ok(Self {
            container,
            profiles,
            survey,
        })
    }

    /// [`Archive::initialize`] with the built-in configuration.
    pub fn with_defaults(container: C) -> Result<Self> {
        Self::initialize(container, &ArchiveConfig::default())
    }

    fn ctx(&self) -> Context<'_, C> {
        Context::new(&self.container, &self.profiles)
    }

    pub fn survey(&self) -> Result<Survey<'_, C>> {
        EntityNode::open(self.ctx(), self.survey, SURVEY_NAME)?.try_into()
    }

    pub fn stations(&self) -> Result<Stations<'_, C>> {
        self.survey()?.stations()
    }

    pub fn standards(&self) -> Result<Standards<'_, C>> {
        self.survey()?.standards()
    }

    pub fn filters(&self) -> Result<Filters<'_, C>> {
        self.survey()?.filters()
    }

    pub fn reports(&self) -> Result<Reports<'_, C>> {
        self.survey()?.reports()
    }

    pub fn profiles(&self) -> &Profiles {
        &self.profiles
    }

    pub fn container(&self) -> &C {
        &self.container
    }

    pub fn into_container(self) -> C {
        self.container
    }

    /// Close the container. Every later operation on the archive or on a
    /// view borrowed from it fails with `ClosedResource`.
    pub fn close(&self) {
        self.container.close();
        info!("archive closed");
    }

    /// Indented listing of the container below the survey root.
    ///
    /// ```text
    /// Survey/ (Survey)
    ///   Summary [summary table, 0 rows]
    ///   Stations/ (Stations)
    ///     Summary [summary table, 1 rows]
    ///     MT001/ (Station)
    /// ```
    pub fn tree(&self) -> Result<String> {
        let mut out = String::new();
        self.render(self.survey, SURVEY_NAME, 0, &mut out)?;
        Ok(out)
    }

    fn render(&self, node: ReferenceHandle, name: &str, depth: usize, out: &mut String) -> Result<()> {
        let indent = "  ".repeat(depth);
        let line = match self.container.node_kind(node)? {
            NodeKind::Group => {
                let attrs = self.container.attrs(node)?;
                match attrs.get(ENTITY_KIND_ATTR).and_then(|value| value.as_str()) {
                    Some(kind) => writeln!(out, "{indent}{name}/ ({kind})"),
                    None => writeln!(out, "{indent}{name}/"),
                }
            }
            NodeKind::Table => writeln!(
                out,
                "{indent}{name} [summary table, {} rows]",
                self.container.table_len(node)?
            ),
            NodeKind::Samples => writeln!(
                out,
                "{indent}{name} [{} samples]",
                self.container.sample_count(node)?
            ),
        };
        line.map_err(|err| Error::InvalidState(format!("rendering tree: {err}")))?;

        if self.container.node_kind(node)? == NodeKind::Group {
            for child in self.container.children(node)? {
                if let Some(handle) = self.container.child(node, &child)? {
                    self.render(handle, &child, depth + 1, out)?;
                }
            }
        }
        Ok(())
    }
}
