//! Core schema elements and type definitions.

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Name of the type every undeclared field falls back to: maps are merged
/// field by field, lists are replaced wholesale.
pub const DEDUCED_TYPE_NAME: &str = "__untyped_deduced_";

/// Schema is a list of named types.
///
/// Schema types are indexed in a map before the first search so this type
/// should be considered immutable once it is in use.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Schema {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub types: Vec<TypeDef>,

    #[serde(skip)]
    type_map: OnceCell<HashMap<String, usize>>,
}

/// TypeDef represents a named type in a schema.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypeDef {
    /// Top level types should be named. Every type must have a unique name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(flatten)]
    pub atom: Atom,
}

/// TypeRef either refers to a named type or declares an inlined type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeRef {
    /// Reference to named type in schema.
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "namedType")]
    pub named_type: Option<String>,

    /// Inline type definition.
    #[serde(flatten)]
    pub inlined: Box<Atom>,

    /// If this reference refers to a map-type or list-type, this field overrides
    /// the `ElementRelationship` of the referred type when resolved.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        rename = "elementRelationship"
    )]
    pub element_relationship: Option<ElementRelationship>,
}

/// Atom represents the smallest possible pieces of the type system.
/// Each set field in the Atom represents a possible type for the object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Atom {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scalar: Option<Scalar>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub list: Option<List>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map: Option<Map>,
}

/// Scalar (AKA "primitive") represents a type which has a single value which is
/// either numeric, string, or boolean, or untyped for any of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scalar {
    Numeric,
    String,
    Boolean,
    Untyped,
}

/// ElementRelationship is an enum of the different possible relationships
/// between the elements of container types (maps, lists).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementRelationship {
    /// List items are identified by their key fields (or by their value when
    /// the list has no keys) and patched individually.
    Associative,
    /// Atomic makes container types (lists, maps) behave as scalars / leaf fields.
    Atomic,
    /// Separable means the items of the container type have no particular
    /// relationship (default behavior for maps).
    #[default]
    Separable,
}

/// Map describes a structure with known fields and, through `element_type`,
/// the type of every field it does not declare.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Map {
    /// Each struct field appears exactly once in this list.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<StructField>,

    /// ElementType is the type of the struct's unknown fields.
    #[serde(default, rename = "elementType")]
    pub element_type: TypeRef,

    /// ElementRelationship states the relationship between the map's items.
    #[serde(
        default,
        skip_serializing_if = "is_default_element_relationship",
        rename = "elementRelationship"
    )]
    pub element_relationship: ElementRelationship,

    #[serde(skip)]
    field_map: OnceCell<HashMap<String, usize>>,
}

impl PartialEq for Map {
    fn eq(&self, other: &Self) -> bool {
        self.fields == other.fields
            && self.element_type == other.element_type
            && self.element_relationship == other.element_relationship
    }
}

fn is_default_element_relationship(er: &ElementRelationship) -> bool {
    *er == ElementRelationship::Separable
}

/// StructField pairs a field name with a field type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructField {
    /// Name is the field name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    /// Type is the field type.
    #[serde(default, rename = "type")]
    pub field_type: TypeRef,
}

/// List represents a type which contains zero or more elements, all of the
/// same subtype.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct List {
    /// ElementType is the type of the list's elements.
    #[serde(default, rename = "elementType")]
    pub element_type: TypeRef,

    /// ElementRelationship states the relationship between the list's elements.
    #[serde(default, rename = "elementRelationship")]
    pub element_relationship: ElementRelationship,

    /// Keys lists the fields of the element's map type which are to be used
    /// as the keys of the list (for associative lists).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keys: Vec<String>,
}

impl Schema {
    /// Creates a schema with the given type definitions.
    pub fn with_types(types: Vec<TypeDef>) -> Self {
        Schema {
            types,
            type_map: OnceCell::new(),
        }
    }

    /// FindNamedType returns the referenced TypeDef, if it exists. When a name
    /// is declared twice the later definition wins.
    pub fn find_named_type(&self, name: &str) -> Option<&TypeDef> {
        let map = self.type_map.get_or_init(|| {
            self.types
                .iter()
                .enumerate()
                .map(|(i, t)| (t.name.clone(), i))
                .collect()
        });
        map.get(name).map(|&i| &self.types[i])
    }

    /// Resolve returns the atom referenced, whether it is inline or named.
    /// Returns None if the type can't be resolved.
    pub fn resolve(&self, tr: &TypeRef) -> Option<Atom> {
        let mut atom = match tr.named_type {
            Some(ref named) => self.find_named_type(named)?.atom.clone(),
            None => (*tr.inlined).clone(),
        };

        let Some(element_relationship) = tr.element_relationship else {
            return Some(atom);
        };

        if let Some(ref mut map) = atom.map {
            map.element_relationship = element_relationship;
            atom.list = None;
            atom.scalar = None;
        } else if let Some(ref mut list) = atom.list {
            list.element_relationship = element_relationship;
            atom.scalar = None;
        } else {
            return None;
        }
        Some(atom)
    }

    /// Appends the types of `other`. Types sharing a name with an existing one
    /// replace it.
    pub fn extend(&mut self, other: Schema) {
        self.types.extend(other.types);
        self.type_map = OnceCell::new();
    }
}

impl TypeRef {
    /// Creates a reference to a named type.
    pub fn named(name: impl Into<String>) -> Self {
        TypeRef {
            named_type: Some(name.into()),
            ..Default::default()
        }
    }

    /// Returns true when the reference neither names nor inlines a type.
    pub fn is_empty(&self) -> bool {
        self.named_type.is_none()
            && self.inlined.scalar.is_none()
            && self.inlined.list.is_none()
            && self.inlined.map.is_none()
    }
}

impl Map {
    /// Creates a new Map with the given fields.
    pub fn with_fields(fields: Vec<StructField>) -> Self {
        Map {
            fields,
            ..Default::default()
        }
    }

    /// FindField returns the referenced StructField, if it exists.
    pub fn find_field(&self, name: &str) -> Option<&StructField> {
        let map = self.field_map.get_or_init(|| {
            self.fields
                .iter()
                .enumerate()
                .map(|(i, f)| (f.name.clone(), i))
                .collect()
        });
        map.get(name).map(|&i| &self.fields[i])
    }

    /// Returns the type of the named field: the declared type, else the
    /// element type, else the deduced type.
    pub fn field_type(&self, name: &str) -> TypeRef {
        match self.find_field(name) {
            Some(field) => field.field_type.clone(),
            None if !self.element_type.is_empty() => self.element_type.clone(),
            None => TypeRef::named(DEDUCED_TYPE_NAME),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_relationship_serialization() {
        assert_eq!(
            serde_json::to_string(&ElementRelationship::Associative).unwrap(),
            "\"associative\""
        );
        assert_eq!(
            serde_json::to_string(&ElementRelationship::Atomic).unwrap(),
            "\"atomic\""
        );
        assert_eq!(ElementRelationship::default(), ElementRelationship::Separable);
    }

    #[test]
    fn test_schema_find_named_type() {
        let schema = Schema::with_types(vec![
            TypeDef {
                name: "string".to_string(),
                atom: Atom {
                    scalar: Some(Scalar::String),
                    ..Default::default()
                },
            },
            TypeDef {
                name: "int".to_string(),
                atom: Atom {
                    scalar: Some(Scalar::Numeric),
                    ..Default::default()
                },
            },
        ]);

        assert!(schema.find_named_type("string").is_some());
        assert!(schema.find_named_type("int").is_some());
        assert!(schema.find_named_type("nonexistent").is_none());
    }

    #[test]
    fn test_map_field_type_fallbacks() {
        let map = Map::with_fields(vec![StructField {
            name: "spec".to_string(),
            field_type: TypeRef::named("podSpec"),
        }]);
        assert_eq!(map.field_type("spec"), TypeRef::named("podSpec"));
        assert_eq!(map.field_type("status"), TypeRef::named(DEDUCED_TYPE_NAME));

        let with_element = Map {
            element_type: TypeRef::named("anything"),
            ..Default::default()
        };
        assert_eq!(with_element.field_type("status"), TypeRef::named("anything"));
    }

    #[test]
    fn test_schema_resolve_with_override() {
        let schema = Schema::with_types(vec![TypeDef {
            name: "myList".to_string(),
            atom: Atom {
                list: Some(List {
                    element_relationship: ElementRelationship::Associative,
                    keys: vec!["name".to_string()],
                    ..Default::default()
                }),
                ..Default::default()
            },
        }]);

        let resolved = schema.resolve(&TypeRef::named("myList")).unwrap();
        assert_eq!(
            resolved.list.unwrap().element_relationship,
            ElementRelationship::Associative
        );

        let overridden = TypeRef {
            element_relationship: Some(ElementRelationship::Atomic),
            ..TypeRef::named("myList")
        };
        let resolved = schema.resolve(&overridden).unwrap();
        assert_eq!(
            resolved.list.unwrap().element_relationship,
            ElementRelationship::Atomic
        );

        assert!(schema.resolve(&TypeRef::named("missing")).is_none());
    }

    #[test]
    fn test_schema_extend_replaces_same_name() {
        let mut schema: Schema = serde_yaml::from_str("types:\n- name: a\n  scalar: string\n").unwrap();
        assert!(schema.find_named_type("a").unwrap().atom.scalar == Some(Scalar::String));
        schema.extend(serde_yaml::from_str("types:\n- name: a\n  scalar: numeric\n").unwrap());
        assert!(schema.find_named_type("a").unwrap().atom.scalar == Some(Scalar::Numeric));
    }
}
