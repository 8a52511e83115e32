//! Typed views over [`EntityNode`] for each kind of the survey tree.
//!
//! A view is a checked wrapper: converting a node of another kind fails with
//! `SchemaMismatch`. Every view derefs to its node, so the generic
//! operations (metadata, summary table, children) stay available.

mod collections;
mod run;
mod station;
mod survey;

pub use collections::{Filters, Reports, Standards};
pub use run::{Channel, Run};
pub use station::Station;
pub use survey::{Stations, Survey, FILTERS_NAME, REPORTS_NAME, STANDARDS_NAME, STATIONS_NAME, SURVEY_NAME};

macro_rules! entity_view {
    ($(#[$doc:meta])* $view:ident, $kinds:pat) => {
        $(#[$doc])*
        pub struct $view<'c, C: $crate::container::ContainerBackend> {
            node: $crate::node::EntityNode<'c, C>,
        }

        impl<'c, C: $crate::container::ContainerBackend> $view<'c, C> {
            pub fn into_node(self) -> $crate::node::EntityNode<'c, C> {
                self.node
            }
        }

        impl<'c, C: $crate::container::ContainerBackend> TryFrom<$crate::node::EntityNode<'c, C>>
            for $view<'c, C>
        {
            type Error = mth_common::Error;

            fn try_from(node: $crate::node::EntityNode<'c, C>) -> mth_common::Result<Self> {
                match node.kind() {
                    $kinds => Ok(Self { node }),
                    other => Err(mth_common::Error::SchemaMismatch(format!(
                        "{} is a {other}, not a {}",
                        node.name(),
                        stringify!($view)
                    ))),
                }
            }
        }

        impl<'c, C: $crate::container::ContainerBackend> std::ops::Deref for $view<'c, C> {
            type Target = $crate::node::EntityNode<'c, C>;

            fn deref(&self) -> &Self::Target {
                &self.node
            }
        }

        impl<C: $crate::container::ContainerBackend> std::ops::DerefMut for $view<'_, C> {
            fn deref_mut(&mut self) -> &mut Self::Target {
                &mut self.node
            }
        }

        impl<C: $crate::container::ContainerBackend> std::fmt::Debug for $view<'_, C> {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_tuple(stringify!($view)).field(&self.node).finish()
            }
        }
    };
}

pub(crate) use entity_view;
