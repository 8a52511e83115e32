//! The metadata record for one archive entity.

use mth_common::{EntityKind, Error, ReferenceHandle, Result};
use mth_standards::{SchemaRegistry, SchemaRule, SchemaSet, ValueType};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::trace;

use crate::coerce::coerce;
use crate::value::AttrValue;

/// Base attribute holding the entity kind tag.
pub const ENTITY_KIND_ATTR: &str = "entity_kind";

/// Base attribute holding the owning node's reference handle.
pub const REFERENCE_ATTR: &str = "reference_handle";

/// Schema-bound key/value store for one entity.
///
/// Keys are canonical dotted paths; aliases are resolved on the way in. Two
/// base attributes, [`ENTITY_KIND_ATTR`] and [`REFERENCE_ATTR`], are present
/// from construction onward.
#[derive(Debug, Clone)]
pub struct MetadataRecord {
    kind: EntityKind,
    schema: Arc<SchemaSet>,
    base_rules: BTreeMap<String, SchemaRule>,
    values: BTreeMap<String, AttrValue>,
}

impl MetadataRecord {
    /// Empty record for `kind`, bound to the global registry.
    pub fn new(kind: EntityKind) -> Result<Self> {
        Ok(Self::with_schema(SchemaRegistry::global()?.schema(kind)))
    }

    /// Empty record bound to an explicit schema.
    pub fn with_schema(schema: Arc<SchemaSet>) -> Self {
        let kind = schema.kind();
        let mut record = Self {
            kind,
            schema,
            base_rules: BTreeMap::new(),
            values: BTreeMap::new(),
        };
        record.add_base_attribute(
            ENTITY_KIND_ATTR,
            AttrValue::Str(kind.as_str().to_string()),
            SchemaRule::new(ENTITY_KIND_ATTR, ValueType::String).required(),
        );
        record.add_base_attribute(
            REFERENCE_ATTR,
            AttrValue::Reference(ReferenceHandle::NULL),
            SchemaRule::new(REFERENCE_ATTR, ValueType::Reference).required(),
        );
        record
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn schema(&self) -> &Arc<SchemaSet> {
        &self.schema
    }

    /// Copy of this record bound to `schema`, every value re-validated
    /// against it. Base attributes carry over unchanged.
    pub fn rebind(&self, schema: Arc<SchemaSet>) -> Result<Self> {
        if Arc::ptr_eq(&self.schema, &schema) {
            return Ok(self.clone());
        }
        if schema.kind() != self.kind {
            return Err(Error::SchemaMismatch(format!(
                "cannot bind {} metadata to the {} schema",
                self.kind,
                schema.kind()
            )));
        }
        let mut record = Self {
            kind: self.kind,
            schema,
            base_rules: self.base_rules.clone(),
            values: BTreeMap::new(),
        };
        for (path, value) in &self.values {
            if record.base_rules.contains_key(path) {
                record.values.insert(path.clone(), value.clone());
            } else {
                record.set(path, value.to_json())?;
            }
        }
        Ok(record)
    }

    /// Register a synthetic attribute outside the catalogue.
    ///
    /// Idempotent per name: a second registration leaves the first rule and
    /// value in place.
    pub fn add_base_attribute(&mut self, name: &str, value: AttrValue, rule: SchemaRule) {
        if self.base_rules.contains_key(name) {
            return;
        }
        self.base_rules.insert(name.to_string(), rule);
        self.values.insert(name.to_string(), value);
    }

    /// Resolve `path` (or one of its aliases) to its rule.
    pub fn rule_for(&self, path: &str) -> Result<&SchemaRule> {
        match self.base_rules.get(path) {
            Some(rule) => Ok(rule),
            None => self.schema.rule_for(path),
        }
    }

    /// Validate, coerce and store `raw` under `path`. `null` unsets the path.
    pub fn set(&mut self, path: &str, raw: impl Into<Value>) -> Result<()> {
        let raw = raw.into();
        let rule = self.rule_for(path)?;
        let canonical = rule.path.clone();
        let coerced = coerce(rule, &raw)?;

        if canonical == ENTITY_KIND_ATTR {
            let tagged = coerced
                .as_ref()
                .and_then(AttrValue::as_str)
                .map(str::parse::<EntityKind>)
                .transpose()?;
            if tagged != Some(self.kind) {
                return Err(Error::SchemaMismatch(format!(
                    "cannot retag {} record as {raw}",
                    self.kind
                )));
            }
            return Ok(());
        }

        trace!(kind = %self.kind, path = %canonical, "set attribute");
        match coerced {
            Some(value) => {
                self.values.insert(canonical, value);
            }
            None if self.base_rules.contains_key(&canonical) => {
                return Err(Error::InvalidState(format!(
                    "base attribute {canonical} cannot be unset"
                )));
            }
            None => {
                self.values.remove(&canonical);
            }
        }
        Ok(())
    }

    /// Value stored under `path` or its alias.
    pub fn get(&self, path: &str) -> Option<&AttrValue> {
        let rule = self.rule_for(path).ok()?;
        self.values.get(&rule.path)
    }

    /// String value stored under `path`, if it is a string.
    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(AttrValue::as_str)
    }

    /// Whether `path` holds a non-empty value.
    pub fn is_set(&self, path: &str) -> bool {
        match self.get(path) {
            Some(AttrValue::Str(s)) => !s.is_empty(),
            Some(AttrValue::List(items)) => !items.is_empty(),
            Some(_) => true,
            None => false,
        }
    }

    /// Reference handle of the owning container node.
    pub fn reference(&self) -> ReferenceHandle {
        self.values
            .get(REFERENCE_ATTR)
            .and_then(AttrValue::as_reference)
            .unwrap_or_default()
    }

    pub fn set_reference(&mut self, handle: ReferenceHandle) {
        self.values
            .insert(REFERENCE_ATTR.to_string(), AttrValue::Reference(handle));
    }

    /// Attributes in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.values.iter().map(|(path, value)| (path.as_str(), value))
    }

    /// Required catalogued paths that hold no value.
    pub fn missing_required(&self) -> Vec<String> {
        self.schema
            .required_paths()
            .filter(|path| !self.is_set(path))
            .map(str::to_string)
            .collect()
    }

    /// Flat `dotted.path -> value` view.
    pub fn to_flat_map(&self) -> BTreeMap<String, Value> {
        self.values
            .iter()
            .map(|(path, value)| (path.clone(), value.to_json()))
            .collect()
    }

    /// Assign every entry of a flat map, in key order.
    pub fn apply_flat_map<'a, I>(&mut self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (&'a String, &'a Value)>,
    {
        for (path, value) in entries {
            self.set(path, value.clone())?;
        }
        Ok(())
    }

    /// Build a record of `kind` from a flat map.
    pub fn from_flat_map(kind: EntityKind, map: &BTreeMap<String, Value>) -> Result<Self> {
        let mut record = Self::new(kind)?;
        record.apply_flat_map(map)?;
        Ok(record)
    }

    /// Nested view: each dotted path becomes a chain of maps.
    pub fn to_nested_map(&self) -> Map<String, Value> {
        let mut root = Map::new();
        for (path, value) in &self.values {
            insert_nested(&mut root, path, value.to_json());
        }
        root
    }

    /// Build a record of `kind` from a nested map.
    pub fn from_nested_map(kind: EntityKind, map: &Map<String, Value>) -> Result<Self> {
        let mut record = Self::new(kind)?;
        record.apply_flat_map(&flatten(map))?;
        Ok(record)
    }

    /// JSON text of the flat view keyed by the lowercase entity kind.
    pub fn to_text(&self) -> Result<String> {
        let mut outer = Map::new();
        outer.insert(
            self.kind.as_str().to_lowercase(),
            Value::Object(self.to_flat_map().into_iter().collect()),
        );
        Ok(serde_json::to_string_pretty(&Value::Object(outer))?)
    }

    /// Parse text written by [`MetadataRecord::to_text`], taking the kind
    /// from the outer key. Nested bodies are accepted too.
    pub fn from_text(text: &str) -> Result<Self> {
        let (kind, body) = split_text(text)?;
        let mut record = Self::new(kind)?;
        record.apply_flat_map(&flatten(&body))?;
        Ok(record)
    }

    /// Like [`MetadataRecord::from_text`], failing with `SchemaMismatch`
    /// when the text describes another kind.
    pub fn from_text_as(kind: EntityKind, text: &str) -> Result<Self> {
        let record = Self::from_text(text)?;
        if record.kind != kind {
            return Err(Error::SchemaMismatch(format!(
                "expected {kind} metadata, found {}",
                record.kind
            )));
        }
        Ok(record)
    }
}

impl PartialEq for MetadataRecord {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.values == other.values
    }
}

fn insert_nested(root: &mut Map<String, Value>, path: &str, value: Value) {
    let mut segments = path.split('.').peekable();
    let mut node = root;
    while let Some(segment) = segments.next() {
        if segments.peek().is_none() {
            node.insert(segment.to_string(), value);
            return;
        }
        let child = node
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !child.is_object() {
            *child = Value::Object(Map::new());
        }
        node = match child {
            Value::Object(map) => map,
            _ => return,
        };
    }
}

fn flatten(map: &Map<String, Value>) -> BTreeMap<String, Value> {
    let mut flat = BTreeMap::new();
    flatten_into(&mut flat, "", map);
    flat
}

fn flatten_into(flat: &mut BTreeMap<String, Value>, prefix: &str, map: &Map<String, Value>) {
    for (key, value) in map {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            Value::Object(child) => flatten_into(flat, &path, child),
            other => {
                flat.insert(path, other.clone());
            }
        }
    }
}

fn split_text(text: &str) -> Result<(EntityKind, Map<String, Value>)> {
    let parsed: Value = serde_json::from_str(text)?;
    let Value::Object(outer) = parsed else {
        return Err(Error::SchemaMismatch(
            "metadata text must be an object keyed by entity kind".to_string(),
        ));
    };
    if outer.len() != 1 {
        return Err(Error::SchemaMismatch(format!(
            "metadata text must hold exactly one entity, found {}",
            outer.len()
        )));
    }
    let Some((key, body)) = outer.into_iter().next() else {
        return Err(Error::SchemaMismatch("empty metadata text".to_string()));
    };
    let kind = key
        .parse::<EntityKind>()
        .map_err(|_| Error::SchemaMismatch(format!("unknown entity kind {key}")))?;
    match body {
        Value::Object(body) => Ok((kind, body)),
        other => Err(Error::SchemaMismatch(format!(
            "{kind} metadata must be an object, found {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn station() -> MetadataRecord {
        let mut record = MetadataRecord::new(EntityKind::Station).unwrap();
        record.set("archive_id", "MT001").unwrap();
        record.set("location.latitude", 40.1).unwrap();
        record.set("channels_recorded", json!(["Ex", "Hy"])).unwrap();
        record
    }

    #[test]
    fn base_attributes_always_present() {
        let record = MetadataRecord::new(EntityKind::Run).unwrap();
        assert_eq!(record.get_str(ENTITY_KIND_ATTR), Some("Run"));
        assert!(record.reference().is_null());
    }

    #[test]
    fn unknown_path_fails() {
        let mut record = MetadataRecord::new(EntityKind::Run).unwrap();
        let err = record.set("bogus.attribute", 1).unwrap_err();
        assert!(matches!(err, Error::UnknownAttribute { .. }));
    }

    #[test]
    fn alias_stores_under_canonical_path() {
        let mut record = MetadataRecord::new(EntityKind::Station).unwrap();
        record.set("latitude", "40:20:10.15").unwrap();
        assert!(record.get("location.latitude").is_some());
        assert_eq!(record.get("latitude"), record.get("location.latitude"));
        assert!(record.to_flat_map().contains_key("location.latitude"));
    }

    #[test]
    fn null_unsets_catalogued_attribute() {
        let mut record = station();
        record.set("archive_id", Value::Null).unwrap();
        assert!(record.get("archive_id").is_none());
    }

    #[test]
    fn base_attributes_cannot_be_unset_or_retagged() {
        let mut record = station();
        assert!(record.set(REFERENCE_ATTR, Value::Null).is_err());
        assert!(matches!(
            record.set(ENTITY_KIND_ATTR, "Run").unwrap_err(),
            Error::SchemaMismatch(_)
        ));
        record.set(ENTITY_KIND_ATTR, "station").unwrap();
    }

    #[test]
    fn add_base_attribute_is_idempotent() {
        let mut record = station();
        record.add_base_attribute(
            REFERENCE_ATTR,
            AttrValue::Reference(ReferenceHandle(9)),
            SchemaRule::new(REFERENCE_ATTR, ValueType::Reference),
        );
        assert!(record.reference().is_null());
    }

    #[test]
    fn nested_map_splits_paths() {
        let nested = station().to_nested_map();
        assert_eq!(nested["location"]["latitude"], json!(40.1));
        assert_eq!(nested["archive_id"], json!("MT001"));
    }

    #[test]
    fn text_is_keyed_by_lowercase_kind() {
        let text = station().to_text().unwrap();
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["station"]["archive_id"], json!("MT001"));
    }

    #[test]
    fn from_text_as_rejects_other_kind() {
        let text = station().to_text().unwrap();
        let err = MetadataRecord::from_text_as(EntityKind::Run, &text).unwrap_err();
        assert!(matches!(err, Error::SchemaMismatch(_)));
    }

    #[test]
    fn from_text_rejects_multiple_entities() {
        let err = MetadataRecord::from_text(r#"{"run": {}, "station": {}}"#).unwrap_err();
        assert!(matches!(err, Error::SchemaMismatch(_)));
    }

    #[test]
    fn rebind_revalidates_against_narrower_schema() {
        let narrow = SchemaRegistry::from_json(
            r#"{"station": [{"path": "archive_id", "type": "string", "required": true, "style": "name"}]}"#,
        )
        .unwrap();

        let err = station().rebind(narrow.schema(EntityKind::Station)).unwrap_err();
        assert!(matches!(err, Error::UnknownAttribute { .. }));

        let mut plain = MetadataRecord::new(EntityKind::Station).unwrap();
        plain.set("archive_id", "MT001").unwrap();
        plain.set_reference(ReferenceHandle(4));
        let rebound = plain.rebind(narrow.schema(EntityKind::Station)).unwrap();
        assert_eq!(rebound, plain);
        assert!(Arc::ptr_eq(rebound.schema(), &narrow.schema(EntityKind::Station)));

        let err = plain.rebind(narrow.schema(EntityKind::Run)).unwrap_err();
        assert!(matches!(err, Error::SchemaMismatch(_)));
    }

    #[test]
    fn missing_required_lists_unset_paths() {
        let record = station();
        let missing = record.missing_required();
        assert!(missing.contains(&"location.longitude".to_string()));
        assert!(!missing.contains(&"archive_id".to_string()));
    }
}
