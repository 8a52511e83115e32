//! Projection of child entities into their parent's summary row.

use mth_common::{EntityKind, Result};
use mth_table::{Cell, Record, RecordLayout};
use std::sync::Arc;

use crate::container::ContainerBackend;
use crate::node::EntityNode;

/// The summary field identifying a child of `kind`, and the metadata path it
/// is projected from.
pub(crate) fn identity_field(kind: EntityKind) -> Option<(&'static str, &'static str)> {
    match kind {
        EntityKind::Station => Some(("archive_id", "archive_id")),
        EntityKind::Run => Some(("run_id", "id")),
        EntityKind::Electric | EntityKind::Magnetic | EntityKind::Auxiliary => {
            Some(("component", "component"))
        }
        _ => None,
    }
}

/// The row describing `child` in its parent's summary, if the parent keeps
/// one for that kind.
pub(crate) fn summary_row<C: ContainerBackend>(
    layout: Arc<RecordLayout>,
    child: &EntityNode<'_, C>,
) -> Result<Option<Record>> {
    let meta = child.metadata();
    let reference = Cell::from(child.handle());
    let pairs: Vec<(&str, Cell)> = match child.kind() {
        EntityKind::Station => vec![
            ("archive_id", meta.project_text("archive_id").into()),
            ("start", meta.project_text("time_period.start").into()),
            ("end", meta.project_text("time_period.end").into()),
            ("components", meta.project_text("channels_recorded").into()),
            ("kind", meta.project_text("data_type").into()),
            ("latitude", meta.project_float("location.latitude").unwrap_or(0.0).into()),
            ("longitude", meta.project_float("location.longitude").unwrap_or(0.0).into()),
            ("reference", reference),
        ],
        EntityKind::Run => vec![
            ("run_id", meta.project_text("id").into()),
            ("start", meta.project_text("time_period.start").into()),
            ("end", meta.project_text("time_period.end").into()),
            (
                "components",
                meta.project_joined(&[
                    "channels_recorded_electric",
                    "channels_recorded_magnetic",
                    "channels_recorded_auxiliary",
                ])
                .into(),
            ),
            ("kind", meta.project_text("data_type").into()),
            ("sample_rate", meta.project_float("sample_rate").unwrap_or(0.0).into()),
            ("reference", reference),
        ],
        EntityKind::Electric | EntityKind::Magnetic | EntityKind::Auxiliary => {
            let count = child.container().sample_count(child.handle())?;
            vec![
                ("component", meta.project_text("component").into()),
                ("start", meta.project_text("time_period.start").into()),
                ("end", meta.project_text("time_period.end").into()),
                ("sample_count", i32::try_from(count).unwrap_or(i32::MAX).into()),
                ("kind", meta.project_text("type").into()),
                ("units", meta.project_text("units").into()),
                ("reference", reference),
            ]
        }
        _ => return Ok(None),
    };
    Record::from_pairs(layout, pairs).map(Some)
}
