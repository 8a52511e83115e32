//! Opaque reference handles to container nodes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A stable, opaque handle to one node of the backing container.
///
/// Handles are issued by the container and stay valid for the container's
/// lifetime. The zero handle is the null reference used by empty (tombstoned)
/// table rows and by records not yet bound to a node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReferenceHandle(pub u64);

impl ReferenceHandle {
    pub const NULL: ReferenceHandle = ReferenceHandle(0);

    pub fn is_null(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for ReferenceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "<null reference>")
        } else {
            write!(f, "<reference {:#x}>", self.0)
        }
    }
}

impl From<u64> for ReferenceHandle {
    fn from(raw: u64) -> Self {
        ReferenceHandle(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_handle_is_default() {
        assert!(ReferenceHandle::default().is_null());
        assert!(!ReferenceHandle(7).is_null());
    }

    #[test]
    fn serializes_transparently() {
        let json = serde_json::to_string(&ReferenceHandle(42)).unwrap();
        assert_eq!(json, "42");
    }
}
