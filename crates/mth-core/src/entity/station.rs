use mth_common::{EntityKind, Error, Result};
use mth_metadata::MetadataRecord;

use super::{entity_view, Run};
use crate::container::ContainerBackend;

entity_view!(
    /// A station; its summary lists one row per run.
    Station,
    EntityKind::Station
);

impl<'c, C: ContainerBackend> Station<'c, C> {
    /// Add the run `name`, or return the existing one.
    ///
    /// The run `id` defaults to `name` when the metadata leaves it unset.
    pub fn add_run(&self, name: &str, metadata: Option<MetadataRecord>) -> Result<(Run<'c, C>, bool)> {
        let metadata = self.child_record(EntityKind::Run, metadata)?;
        let (node, created) = self.create_child(name, metadata)?;
        Ok((node.try_into()?, created))
    }

    pub fn get_run(&self, name: &str) -> Result<Run<'c, C>> {
        self.get_child(name)?.try_into()
    }

    pub fn remove_run(&self, name: &str) -> Result<()> {
        self.remove_child(name)
    }

    pub fn run_names(&self) -> Result<Vec<String>> {
        self.list_children()
    }

    /// Name for the next run: the archive id followed by the letter after
    /// the greatest single trailing letter among existing runs (`a` first).
    pub fn next_run_name(&self) -> Result<String> {
        let archive_id = self
            .metadata()
            .get_str("archive_id")
            .filter(|id| !id.is_empty())
            .ok_or_else(|| Error::InvalidState(format!("station {} has no archive_id", self.name())))?
            .to_string();

        let last = self
            .list_children()?
            .iter()
            .filter_map(|name| name.strip_prefix(archive_id.as_str()))
            .filter_map(|suffix| {
                let mut chars = suffix.chars();
                match (chars.next(), chars.next()) {
                    (Some(letter), None) if letter.is_ascii_lowercase() => Some(letter),
                    _ => None,
                }
            })
            .max();

        let next = match last {
            None => 'a',
            Some('z') => {
                return Err(Error::InvalidState(format!(
                    "station {archive_id} has no run letters left"
                )))
            }
            Some(letter) => char::from(letter as u8 + 1),
        };
        Ok(format!("{archive_id}{next}"))
    }
}
