//! TypedValue implementation.

use thiserror::Error;

use crate::schema::{Atom, Schema, TypeRef};
use crate::value::Value;

/// Errors raised when a value cannot be interpreted with its type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypedError {
    #[error("no type found matching: {0}")]
    UnresolvedType(String),

    #[error("expected objects of the same type")]
    TypeMismatch,

    #[error("expected a map at the document root, got {0}")]
    NotAMap(&'static str),
}

/// TypedValue is a Value paired with its schema and type.
#[derive(Debug, Clone)]
pub struct TypedValue<'s> {
    value: Value,
    type_ref: TypeRef,
    schema: &'s Schema,
}

impl<'s> TypedValue<'s> {
    /// Creates a new TypedValue, checking that its type resolves in the schema.
    pub fn new(value: Value, schema: &'s Schema, type_ref: TypeRef) -> Result<Self, TypedError> {
        if schema.resolve(&type_ref).is_none() {
            let name = type_ref.named_type.clone().unwrap_or_else(|| "<inline>".to_string());
            return Err(TypedError::UnresolvedType(name));
        }
        Ok(TypedValue {
            value,
            type_ref,
            schema,
        })
    }

    /// Returns a reference to the underlying value.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Consumes the TypedValue and returns the underlying value.
    pub fn into_value(self) -> Value {
        self.value
    }

    /// Returns a reference to the type reference.
    pub fn type_ref(&self) -> &TypeRef {
        &self.type_ref
    }

    /// Returns a reference to the schema.
    pub fn schema(&self) -> &'s Schema {
        self.schema
    }

    pub(crate) fn resolve(&self, type_ref: &TypeRef) -> Option<Atom> {
        self.schema.resolve(type_ref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::from_yaml;

    const TEST_SCHEMA: &str = r#"types:
- name: stringPair
  map:
    fields:
    - name: key
      type:
        scalar: string
    - name: value
      type:
        scalar: string
"#;

    #[test]
    fn test_typed_value_creation() {
        let schema: Schema = serde_yaml::from_str(TEST_SCHEMA).unwrap();
        let value = from_yaml("key: a\nvalue: b\n").unwrap();
        let tv = TypedValue::new(value.clone(), &schema, TypeRef::named("stringPair")).unwrap();
        assert_eq!(tv.value(), &value);
        assert_eq!(tv.type_ref(), &TypeRef::named("stringPair"));
    }

    #[test]
    fn test_typed_value_rejects_unknown_type() {
        let schema: Schema = serde_yaml::from_str(TEST_SCHEMA).unwrap();
        let err = TypedValue::new(Value::Null, &schema, TypeRef::named("missing")).unwrap_err();
        assert_eq!(err, TypedError::UnresolvedType("missing".to_string()));
    }
}
