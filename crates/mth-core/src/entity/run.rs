use mth_common::{ChannelKind, EntityKind, Error, Result};
use mth_metadata::MetadataRecord;
use mth_table::Record;
use tracing::debug;

use super::entity_view;
use crate::container::ContainerBackend;
use crate::rows;

entity_view!(
    /// A run; its summary lists one row per channel.
    Run,
    EntityKind::Run
);

entity_view!(
    /// A channel leaf holding a sample dataset.
    Channel,
    EntityKind::Electric | EntityKind::Magnetic | EntityKind::Auxiliary
);

impl<'c, C: ContainerBackend> Run<'c, C> {
    /// Add the channel `name` of `kind`, or return the existing one.
    ///
    /// `samples` are written before the summary row is appended, so the row
    /// carries their count. `component` defaults to `name` and `type` to the
    /// channel kind.
    pub fn add_channel(
        &self,
        name: &str,
        kind: ChannelKind,
        samples: Option<&[f64]>,
        metadata: Option<MetadataRecord>,
    ) -> Result<(Channel<'c, C>, bool)> {
        let metadata = self.child_record(kind.entity_kind(), metadata)?;
        let (node, created) = self.create_child_with(name, metadata, samples)?;
        Ok((node.try_into()?, created))
    }

    pub fn get_channel(&self, name: &str) -> Result<Channel<'c, C>> {
        self.get_child(name)?.try_into()
    }

    pub fn remove_channel(&self, name: &str) -> Result<()> {
        self.remove_child(name)
    }

    pub fn channel_names(&self) -> Result<Vec<String>> {
        self.list_children()
    }

    /// Rewrite the summary row of channel `name` from its current metadata
    /// and samples. Returns the row index.
    pub fn refresh_channel_row(&self, name: &str) -> Result<usize> {
        let channel = self.get_channel(name)?;
        self.refresh_row_for(&channel.node)
    }
}

impl<'c, C: ContainerBackend> Channel<'c, C> {
    pub fn channel_kind(&self) -> ChannelKind {
        match self.kind() {
            EntityKind::Electric => ChannelKind::Electric,
            EntityKind::Magnetic => ChannelKind::Magnetic,
            _ => ChannelKind::Auxiliary,
        }
    }

    pub fn sample_count(&self) -> Result<usize> {
        self.container().sample_count(self.handle())
    }

    pub fn read_samples(&self) -> Result<Vec<f64>> {
        self.container().read_samples(self.handle())
    }

    /// Replace the samples. The run's summary row is left as is until
    /// [`Run::refresh_channel_row`].
    pub fn write_samples(&self, samples: &[f64]) -> Result<()> {
        debug!(channel = %self.name(), count = samples.len(), "write samples");
        self.container().write_samples(self.handle(), samples)
    }

    /// This channel's row as its run's summary would hold it.
    pub fn summary_row(&self) -> Result<Record> {
        let layout = self
            .profiles()
            .get(EntityKind::Run)
            .layout
            .clone()
            .ok_or_else(|| Error::InvalidState("runs keep no summary table".to_string()))?;
        rows::summary_row(layout, &self.node)?
            .ok_or_else(|| Error::InvalidState(format!("{} has no summary row", self.name())))
    }
}
