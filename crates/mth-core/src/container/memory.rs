use mth_common::{Error, ReferenceHandle, Result};
use mth_table::{Cell, RecordLayout};
use serde_json::Value;
use std::cell::{Cell as Flag, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use super::{ContainerBackend, NodeKind};

const ROOT: ReferenceHandle = ReferenceHandle(1);

enum Payload {
    Group { children: Vec<(String, ReferenceHandle)> },
    Table {
        layout: Arc<RecordLayout>,
        rows: Vec<Vec<Cell>>,
        max_len: usize,
    },
    Samples(Vec<f64>),
}

struct Node {
    name: String,
    attrs: BTreeMap<String, Value>,
    payload: Payload,
}

impl Node {
    fn kind(&self) -> NodeKind {
        match self.payload {
            Payload::Group { .. } => NodeKind::Group,
            Payload::Table { .. } => NodeKind::Table,
            Payload::Samples(_) => NodeKind::Samples,
        }
    }
}

struct State {
    nodes: HashMap<ReferenceHandle, Node>,
    next_id: u64,
}

/// In-memory container.
///
/// Uses `RefCell` for interior mutability since access is single-threaded,
/// so the [`ContainerBackend`] trait can take `&self` everywhere.
pub struct MemContainer {
    open: Flag<bool>,
    state: RefCell<State>,
}

impl Default for MemContainer {
    fn default() -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(
            ROOT,
            Node {
                name: "/".to_string(),
                attrs: BTreeMap::new(),
                payload: Payload::Group {
                    children: Vec::new(),
                },
            },
        );
        Self {
            open: Flag::new(true),
            state: RefCell::new(State { nodes, next_id: 2 }),
        }
    }
}

impl MemContainer {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.open.get() {
            Ok(())
        } else {
            Err(Error::ClosedResource("container".to_string()))
        }
    }

    fn with_node<T>(&self, node: ReferenceHandle, f: impl FnOnce(&Node) -> Result<T>) -> Result<T> {
        self.ensure_open()?;
        let state = self.state.borrow();
        let entry = state
            .nodes
            .get(&node)
            .ok_or_else(|| Error::not_found("node", node.to_string()))?;
        f(entry)
    }

    fn with_node_mut<T>(
        &self,
        node: ReferenceHandle,
        f: impl FnOnce(&mut Node) -> Result<T>,
    ) -> Result<T> {
        self.ensure_open()?;
        let mut state = self.state.borrow_mut();
        let entry = state
            .nodes
            .get_mut(&node)
            .ok_or_else(|| Error::not_found("node", node.to_string()))?;
        f(entry)
    }

    fn insert_child(&self, parent: ReferenceHandle, name: &str, payload: Payload) -> Result<ReferenceHandle> {
        self.ensure_open()?;
        if name.is_empty() || name.contains('/') {
            return Err(Error::Container(format!("invalid node name: {name:?}")));
        }

        let mut state = self.state.borrow_mut();
        let handle = ReferenceHandle(state.next_id);
        let parent_node = state
            .nodes
            .get_mut(&parent)
            .ok_or_else(|| Error::not_found("node", parent.to_string()))?;
        let Payload::Group { children } = &mut parent_node.payload else {
            return Err(Error::Container(format!("{} is not a group", parent_node.name)));
        };
        if children.iter().any(|(existing, _)| existing == name) {
            return Err(Error::Container(format!(
                "{name} already exists in {}",
                parent_node.name
            )));
        }
        children.push((name.to_string(), handle));

        state.next_id += 1;
        state.nodes.insert(
            handle,
            Node {
                name: name.to_string(),
                attrs: BTreeMap::new(),
                payload,
            },
        );
        Ok(handle)
    }

    fn table<T>(
        &self,
        node: ReferenceHandle,
        f: impl FnOnce(&str, &Arc<RecordLayout>, &Vec<Vec<Cell>>, usize) -> Result<T>,
    ) -> Result<T> {
        self.with_node(node, |entry| match &entry.payload {
            Payload::Table {
                layout,
                rows,
                max_len,
            } => f(&entry.name, layout, rows, *max_len),
            _ => Err(Error::Container(format!("{} is not a table", entry.name))),
        })
    }

    fn table_mut<T>(
        &self,
        node: ReferenceHandle,
        f: impl FnOnce(&str, &Arc<RecordLayout>, &mut Vec<Vec<Cell>>, usize) -> Result<T>,
    ) -> Result<T> {
        self.with_node_mut(node, |entry| match &mut entry.payload {
            Payload::Table {
                layout,
                rows,
                max_len,
            } => f(&entry.name, layout, rows, *max_len),
            _ => Err(Error::Container(format!("{} is not a table", entry.name))),
        })
    }

    fn samples_mut<T>(&self, node: ReferenceHandle, f: impl FnOnce(&mut Vec<f64>) -> T) -> Result<T> {
        self.with_node_mut(node, |entry| match &mut entry.payload {
            Payload::Samples(samples) => Ok(f(samples)),
            _ => Err(Error::Container(format!("{} holds no samples", entry.name))),
        })
    }
}

impl ContainerBackend for MemContainer {
    fn is_open(&self) -> bool {
        self.open.get()
    }

    fn close(&self) {
        self.open.set(false);
    }

    fn root(&self) -> Result<ReferenceHandle> {
        self.ensure_open()?;
        Ok(ROOT)
    }

    fn create_group(&self, parent: ReferenceHandle, name: &str) -> Result<ReferenceHandle> {
        self.insert_child(
            parent,
            name,
            Payload::Group {
                children: Vec::new(),
            },
        )
    }

    fn create_table(
        &self,
        parent: ReferenceHandle,
        name: &str,
        layout: &RecordLayout,
        max_len: usize,
    ) -> Result<ReferenceHandle> {
        self.insert_child(
            parent,
            name,
            Payload::Table {
                layout: Arc::new(layout.clone()),
                rows: Vec::new(),
                max_len,
            },
        )
    }

    fn create_samples(&self, parent: ReferenceHandle, name: &str) -> Result<ReferenceHandle> {
        self.insert_child(parent, name, Payload::Samples(Vec::new()))
    }

    fn child(&self, parent: ReferenceHandle, name: &str) -> Result<Option<ReferenceHandle>> {
        self.with_node(parent, |entry| match &entry.payload {
            Payload::Group { children } => Ok(children
                .iter()
                .find(|(existing, _)| existing == name)
                .map(|(_, handle)| *handle)),
            _ => Ok(None),
        })
    }

    fn children(&self, parent: ReferenceHandle) -> Result<Vec<String>> {
        self.with_node(parent, |entry| match &entry.payload {
            Payload::Group { children } => {
                Ok(children.iter().map(|(name, _)| name.clone()).collect())
            }
            _ => Ok(Vec::new()),
        })
    }

    fn unlink(&self, parent: ReferenceHandle, name: &str) -> Result<()> {
        self.with_node_mut(parent, |entry| {
            let Payload::Group { children } = &mut entry.payload else {
                return Err(Error::Container(format!("{} is not a group", entry.name)));
            };
            let position = children
                .iter()
                .position(|(existing, _)| existing == name)
                .ok_or_else(|| Error::not_found(format!("child of {}", entry.name), name))?;
            children.remove(position);
            Ok(())
        })
    }

    fn node_kind(&self, node: ReferenceHandle) -> Result<NodeKind> {
        self.with_node(node, |entry| Ok(entry.kind()))
    }

    fn attrs(&self, node: ReferenceHandle) -> Result<BTreeMap<String, Value>> {
        self.with_node(node, |entry| Ok(entry.attrs.clone()))
    }

    fn set_attr(&self, node: ReferenceHandle, name: &str, value: Value) -> Result<()> {
        self.with_node_mut(node, |entry| {
            entry.attrs.insert(name.to_string(), value);
            Ok(())
        })
    }

    fn delete_attr(&self, node: ReferenceHandle, name: &str) -> Result<()> {
        self.with_node_mut(node, |entry| {
            entry.attrs.remove(name);
            Ok(())
        })
    }

    fn table_layout(&self, node: ReferenceHandle) -> Result<Arc<RecordLayout>> {
        self.table(node, |_, layout, _, _| Ok(layout.clone()))
    }

    fn table_len(&self, node: ReferenceHandle) -> Result<usize> {
        self.table(node, |_, _, rows, _| Ok(rows.len()))
    }

    fn table_max_len(&self, node: ReferenceHandle) -> Result<usize> {
        self.table(node, |_, _, _, max_len| Ok(max_len))
    }

    fn table_resize(&self, node: ReferenceHandle, len: usize) -> Result<()> {
        self.table_mut(node, |name, layout, rows, max_len| {
            if len > max_len {
                return Err(Error::CapacityExceeded {
                    table: name.to_string(),
                    capacity: max_len,
                });
            }
            let empty: Vec<Cell> = layout
                .fields()
                .iter()
                .map(|field| Cell::empty(field.field_type))
                .collect();
            rows.resize(len, empty);
            Ok(())
        })
    }

    fn read_row(&self, node: ReferenceHandle, index: usize) -> Result<Vec<Cell>> {
        self.table(node, |name, _, rows, _| {
            rows.get(index)
                .cloned()
                .ok_or_else(|| Error::not_found(format!("row of {name}"), index.to_string()))
        })
    }

    fn write_row(&self, node: ReferenceHandle, index: usize, cells: Vec<Cell>) -> Result<()> {
        self.table_mut(node, |name, layout, rows, _| {
            if cells.len() != layout.len() {
                return Err(Error::SchemaMismatch(format!(
                    "{} cells written to {name} with layout {layout}",
                    cells.len()
                )));
            }
            let slot = rows
                .get_mut(index)
                .ok_or_else(|| Error::not_found(format!("row of {name}"), index.to_string()))?;
            *slot = cells;
            Ok(())
        })
    }

    fn sample_count(&self, node: ReferenceHandle) -> Result<usize> {
        self.samples_mut(node, |samples| samples.len())
    }

    fn read_samples(&self, node: ReferenceHandle) -> Result<Vec<f64>> {
        self.samples_mut(node, |samples| samples.clone())
    }

    fn write_samples(&self, node: ReferenceHandle, new_samples: &[f64]) -> Result<()> {
        self.samples_mut(node, |samples| {
            samples.clear();
            samples.extend_from_slice(new_samples);
        })
    }
}
