//! The internal representation of one OpenAPI Schema Object.
//!
//! [`SchemaNode`] is a value type: compilers construct nodes fresh and either
//! inline them into an operation or register them once under a stable name in
//! the document's component registry. Nodes are never mutated after they leave
//! a compiler.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One OpenAPI Schema Object.
///
/// Every facet is optional and skipped during serialization when unset, so
/// documents stay compact. An object node's `required` list is always a
/// subset of its `properties` keys and is omitted entirely when empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaNode {
    /// The schema kind (string, integer, number, boolean, array, object)
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,
    /// Format refinement (e.g. "email", "date-time", "binary", "float")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Human-readable description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Literal example value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
    /// Allowed values
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
    /// Regular expression constraint for string kinds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Lower magnitude bound for numeric kinds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<i64>,
    /// Upper magnitude bound for numeric kinds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<i64>,
    #[serde(rename = "exclusiveMinimum", skip_serializing_if = "Option::is_none")]
    pub exclusive_minimum: Option<bool>,
    #[serde(rename = "exclusiveMaximum", skip_serializing_if = "Option::is_none")]
    pub exclusive_maximum: Option<bool>,
    /// Lower length bound for string kinds
    #[serde(rename = "minLength", skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    /// Upper length bound for string kinds
    #[serde(rename = "maxLength", skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    /// Lower element-count bound for array kinds
    #[serde(rename = "minItems", skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,
    /// Upper element-count bound for array kinds
    #[serde(rename = "maxItems", skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,
    /// Element schema for array kinds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaNode>>,
    /// Property map for object kinds, in declaration order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<IndexMap<String, SchemaNode>>,
    /// Names of required properties; omitted when empty
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
    /// Schema for free-form map values (used by the error envelope)
    #[serde(rename = "additionalProperties", skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<Box<SchemaNode>>,
    /// Negated constraint (carries the disallowed enum for `not_in` rules)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not: Option<Box<SchemaNode>>,
    /// Reference to a named component schema
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

impl SchemaNode {
    /// Create a schema with just a type
    pub fn typed(schema_type: &str) -> Self {
        Self {
            schema_type: Some(schema_type.to_string()),
            ..Self::default()
        }
    }

    /// Create a string schema
    pub fn string() -> Self {
        Self::typed("string")
    }

    /// Create an integer schema
    pub fn integer() -> Self {
        Self::typed("integer")
    }

    /// Create a number schema
    pub fn number() -> Self {
        Self::typed("number")
    }

    /// Create a boolean schema
    pub fn boolean() -> Self {
        Self::typed("boolean")
    }

    /// Create an empty object schema
    pub fn empty_object() -> Self {
        Self::typed("object")
    }

    /// Create an object schema. An empty `required` list is dropped rather
    /// than serialized as `required: []`.
    pub fn object(properties: IndexMap<String, SchemaNode>, required: Vec<String>) -> Self {
        Self {
            schema_type: Some("object".to_string()),
            properties: Some(properties),
            required: if required.is_empty() {
                None
            } else {
                Some(required)
            },
            ..Self::default()
        }
    }

    /// Create an array schema with the given element schema
    pub fn array(items: SchemaNode) -> Self {
        Self {
            schema_type: Some("array".to_string()),
            items: Some(Box::new(items)),
            ..Self::default()
        }
    }

    /// Create a `$ref` node pointing at a named component schema
    pub fn reference(name: &str) -> Self {
        Self {
            reference: Some(format!("#/components/schemas/{}", name)),
            ..Self::default()
        }
    }

    /// The referenced component name, if this node is a `$ref`
    pub fn reference_target(&self) -> Option<&str> {
        self.reference
            .as_deref()
            .and_then(|r| r.rsplit('/').next())
    }

    /// Whether this node carries `format: binary` (file-upload property)
    pub fn is_binary(&self) -> bool {
        self.format.as_deref() == Some("binary")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_drops_empty_required() {
        let schema = SchemaNode::object(IndexMap::new(), Vec::new());
        assert!(schema.required.is_none());

        let json = serde_json::to_value(&schema).unwrap();
        assert!(json.get("required").is_none());
    }

    #[test]
    fn test_object_keeps_nonempty_required() {
        let mut props = IndexMap::new();
        props.insert("name".to_string(), SchemaNode::string());
        let schema = SchemaNode::object(props, vec!["name".to_string()]);

        assert_eq!(schema.required, Some(vec!["name".to_string()]));
    }

    #[test]
    fn test_unset_facets_are_not_serialized() {
        let json = serde_json::to_value(SchemaNode::string()).unwrap();
        let obj = json.as_object().unwrap();

        assert_eq!(obj.len(), 1);
        assert_eq!(obj["type"], "string");
    }

    #[test]
    fn test_reference_target() {
        let schema = SchemaNode::reference("User");
        assert_eq!(
            schema.reference.as_deref(),
            Some("#/components/schemas/User")
        );
        assert_eq!(schema.reference_target(), Some("User"));
        assert_eq!(SchemaNode::string().reference_target(), None);
    }

    #[test]
    fn test_properties_preserve_declaration_order() {
        let mut props = IndexMap::new();
        props.insert("zulu".to_string(), SchemaNode::string());
        props.insert("alpha".to_string(), SchemaNode::string());
        let schema = SchemaNode::object(props, Vec::new());

        let json = serde_json::to_string(&schema).unwrap();
        let zulu_at = json.find("zulu").unwrap();
        let alpha_at = json.find("alpha").unwrap();
        assert!(zulu_at < alpha_at, "declaration order must survive serialization");
    }

    #[test]
    fn test_is_binary() {
        let mut schema = SchemaNode::string();
        assert!(!schema.is_binary());
        schema.format = Some("binary".to_string());
        assert!(schema.is_binary());
    }
}
