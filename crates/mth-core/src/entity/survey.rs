use mth_common::{EntityKind, Result};
use mth_metadata::MetadataRecord;

use super::{entity_view, Filters, Reports, Standards, Station};
use crate::container::ContainerBackend;

pub const SURVEY_NAME: &str = "Survey";
pub const STATIONS_NAME: &str = "Stations";
pub const STANDARDS_NAME: &str = "Standards";
pub const FILTERS_NAME: &str = "Filters";
pub const REPORTS_NAME: &str = "Reports";

entity_view!(
    /// The survey root.
    Survey,
    EntityKind::Survey
);

entity_view!(
    /// The collection of stations; its summary lists one row per station.
    Stations,
    EntityKind::Stations
);

impl<'c, C: ContainerBackend> Survey<'c, C> {
    pub fn stations(&self) -> Result<Stations<'c, C>> {
        self.get_child(STATIONS_NAME)?.try_into()
    }

    pub fn standards(&self) -> Result<Standards<'c, C>> {
        self.get_child(STANDARDS_NAME)?.try_into()
    }

    pub fn filters(&self) -> Result<Filters<'c, C>> {
        self.get_child(FILTERS_NAME)?.try_into()
    }

    pub fn reports(&self) -> Result<Reports<'c, C>> {
        self.get_child(REPORTS_NAME)?.try_into()
    }
}

impl<'c, C: ContainerBackend> Stations<'c, C> {
    /// Add the station `name`, or return the existing one.
    ///
    /// `archive_id` defaults to `name` when the metadata leaves it unset.
    pub fn add_station(
        &self,
        name: &str,
        metadata: Option<MetadataRecord>,
    ) -> Result<(Station<'c, C>, bool)> {
        let metadata = self.child_record(EntityKind::Station, metadata)?;
        let (node, created) = self.create_child(name, metadata)?;
        Ok((node.try_into()?, created))
    }

    pub fn get_station(&self, name: &str) -> Result<Station<'c, C>> {
        self.get_child(name)?.try_into()
    }

    pub fn remove_station(&self, name: &str) -> Result<()> {
        self.remove_child(name)
    }

    pub fn station_names(&self) -> Result<Vec<String>> {
        self.list_children()
    }
}
