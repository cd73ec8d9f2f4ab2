//! Two-way strategic merge patch between two typed values.
//!
//! The patch holds only what changed between `original` and `modified`:
//! added or changed fields verbatim, removed fields as `null`, and
//! associative lists as per-item changes plus the directives Kubernetes
//! understands (`$patch: delete`, `$setElementOrder/<field>`,
//! `$deleteFromPrimitiveList/<field>`).

use std::collections::{HashMap, HashSet};

use crate::schema::{self, ElementRelationship, TypeRef};
use crate::value::{Field, FieldList, Map, Value};

use super::typed_value::{TypedError, TypedValue};

const PATCH_DIRECTIVE: &str = "$patch";
const SET_ELEMENT_ORDER: &str = "$setElementOrder";
const DELETE_FROM_PRIMITIVE_LIST: &str = "$deleteFromPrimitiveList";

impl<'s> TypedValue<'s> {
    /// Computes the patch that turns this value into `modified`.
    ///
    /// Both values must share a type whose root is a map. An empty map means
    /// the values are equal.
    pub fn two_way_patch(&self, modified: &TypedValue<'_>) -> Result<Map, TypedError> {
        if self.type_ref() != modified.type_ref() {
            return Err(TypedError::TypeMismatch);
        }

        let (original, changed) = match (self.value(), modified.value()) {
            (Value::Map(o), Value::Map(m)) => (o, m),
            (Value::Map(_), other) | (other, _) => return Err(TypedError::NotAMap(other.type_name())),
        };

        let root = self
            .resolve(self.type_ref())
            .and_then(|atom| atom.map)
            .unwrap_or_default();
        Ok(self.diff_maps(original, changed, &root))
    }

    fn diff_maps(&self, original: &Map, modified: &Map, map: &schema::Map) -> Map {
        let mut patch = Map::new();

        for (key, new) in modified.iter() {
            match original.get(key) {
                None => patch.set(key.clone(), new.clone()),
                Some(old) if old == new => {}
                Some(old) => self.diff_field(key, old, new, &map.field_type(key), &mut patch),
            }
        }

        for key in original.keys() {
            if !modified.has(key) {
                patch.set(key.clone(), Value::Null);
            }
        }

        patch
    }

    fn diff_field(&self, key: &str, old: &Value, new: &Value, type_ref: &TypeRef, patch: &mut Map) {
        let Some(atom) = self.resolve(type_ref) else {
            patch.set(key, new.clone());
            return;
        };

        match (old, new) {
            (Value::Map(o), Value::Map(m)) => match atom.map {
                Some(ref map) if map.element_relationship != ElementRelationship::Atomic => {
                    let sub = self.diff_maps(o, m, map);
                    if !sub.is_empty() {
                        patch.set(key, Value::Map(sub));
                    }
                }
                _ => patch.set(key, new.clone()),
            },
            (Value::List(o), Value::List(m)) => match atom.list {
                Some(ref list) if list.element_relationship == ElementRelationship::Associative => {
                    if list.keys.is_empty() {
                        self.diff_primitive_set(key, o, m, patch);
                    } else {
                        self.diff_keyed_list(key, o, m, list, patch);
                    }
                }
                _ => patch.set(key, new.clone()),
            },
            _ => patch.set(key, new.clone()),
        }
    }

    fn diff_keyed_list(&self, key: &str, old: &[Value], new: &[Value], list: &schema::List, patch: &mut Map) {
        let (Some(old_keys), Some(new_keys)) = (item_keys(old, &list.keys), item_keys(new, &list.keys)) else {
            patch.set(key, Value::List(new.to_vec()));
            return;
        };

        let element = self
            .resolve(&list.element_type)
            .and_then(|atom| atom.map)
            .unwrap_or_default();

        let old_items: HashMap<&FieldList, &Map> = old_keys
            .iter()
            .zip(old.iter().filter_map(Value::as_map))
            .collect();
        let new_set: HashSet<&FieldList> = new_keys.iter().collect();

        let mut items = Vec::new();
        for (item_key, item) in new_keys.iter().zip(new.iter().filter_map(Value::as_map)) {
            match old_items.get(item_key) {
                None => items.push(Value::Map(item.clone())),
                Some(previous) if *previous == item => {}
                Some(previous) => {
                    let mut sub = self.diff_maps(previous, item, &element);
                    sub.fields.extend(item_key.to_map().fields);
                    items.push(Value::Map(sub));
                }
            }
        }

        for item_key in &old_keys {
            if !new_set.contains(item_key) {
                let mut deletion = item_key.to_map();
                deletion.set(PATCH_DIRECTIVE, Value::String("delete".to_string()));
                items.push(Value::Map(deletion));
            }
        }

        if !items.is_empty() {
            patch.set(key, Value::List(items));
        }
        let order = new_keys.iter().map(|k| Value::Map(k.to_map())).collect();
        patch.set(format!("{}/{}", SET_ELEMENT_ORDER, key), Value::List(order));
    }

    fn diff_primitive_set(&self, key: &str, old: &[Value], new: &[Value], patch: &mut Map) {
        if !old.iter().chain(new).all(Value::is_scalar) {
            patch.set(key, Value::List(new.to_vec()));
            return;
        }

        let added: Vec<Value> = new.iter().filter(|v| !old.contains(v)).cloned().collect();
        let removed: Vec<Value> = old.iter().filter(|v| !new.contains(v)).cloned().collect();

        if !added.is_empty() {
            patch.set(key, Value::List(added));
        }
        if !removed.is_empty() {
            patch.set(format!("{}/{}", DELETE_FROM_PRIMITIVE_LIST, key), Value::List(removed));
        }
        patch.set(format!("{}/{}", SET_ELEMENT_ORDER, key), Value::List(new.to_vec()));
    }
}

/// Extracts the key of every item. Returns None when an item is not a map,
/// misses a key field, or duplicates an earlier key.
fn item_keys(items: &[Value], keys: &[String]) -> Option<Vec<FieldList>> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        let map = item.as_map()?;
        let fields = keys
            .iter()
            .map(|name| {
                map.get(name).map(|value| Field {
                    name: name.clone(),
                    value: value.clone(),
                })
            })
            .collect::<Option<Vec<_>>>()?;
        let key = FieldList::with_fields(fields);
        if !seen.insert(key.clone()) {
            return None;
        }
        out.push(key);
    }
    Some(out)
}
