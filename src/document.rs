//! The assembled OpenAPI 3.0 document and its constituent objects.
//!
//! Paths and component schemas live in `BTreeMap`s so documents serialize in
//! lexicographic path/name order, and `PathItem` keeps one field per verb so
//! verbs always emit in the same fixed precedence. Together these make a
//! generation pass deterministic regardless of route-table iteration order.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::SecurityScheme;
use crate::registry::HttpVerb;
use crate::schema::SchemaNode;

/// OpenAPI Info object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Info {
    pub title: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// OpenAPI Server object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Server {
    pub url: String,
}

/// All operations registered under a single path, one optional slot per verb.
/// Field order is the emission order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head: Option<Operation>,
}

impl PathItem {
    /// The slot for a verb, readable
    pub fn operation(&self, verb: HttpVerb) -> Option<&Operation> {
        match verb {
            HttpVerb::Get => self.get.as_ref(),
            HttpVerb::Post => self.post.as_ref(),
            HttpVerb::Put => self.put.as_ref(),
            HttpVerb::Delete => self.delete.as_ref(),
            HttpVerb::Patch => self.patch.as_ref(),
            HttpVerb::Options => self.options.as_ref(),
            HttpVerb::Head => self.head.as_ref(),
        }
    }

    /// Place an operation in its verb slot
    pub fn set_operation(&mut self, verb: HttpVerb, operation: Operation) {
        match verb {
            HttpVerb::Get => self.get = Some(operation),
            HttpVerb::Post => self.post = Some(operation),
            HttpVerb::Put => self.put = Some(operation),
            HttpVerb::Delete => self.delete = Some(operation),
            HttpVerb::Patch => self.patch = Some(operation),
            HttpVerb::Options => self.options = Some(operation),
            HttpVerb::Head => self.head = Some(operation),
        }
    }

    /// Present (verb, operation) pairs in emission order
    pub fn operations(&self) -> Vec<(HttpVerb, &Operation)> {
        [
            (HttpVerb::Get, &self.get),
            (HttpVerb::Post, &self.post),
            (HttpVerb::Put, &self.put),
            (HttpVerb::Delete, &self.delete),
            (HttpVerb::Patch, &self.patch),
            (HttpVerb::Options, &self.options),
            (HttpVerb::Head, &self.head),
        ]
        .into_iter()
        .filter_map(|(verb, slot)| slot.as_ref().map(|op| (verb, op)))
        .collect()
    }
}

/// One security requirement: scheme name → scope list
pub type SecurityRequirement = BTreeMap<String, Vec<String>>;

/// OpenAPI Operation object
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Operation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Vec<ParameterObject>>,
    #[serde(rename = "requestBody", skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,
    #[serde(default)]
    pub responses: BTreeMap<String, ResponseObject>,
    /// Omitted both when unresolved and when explicitly empty; an empty
    /// requirement list is the OpenAPI idiom for "no security"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security: Option<Vec<SecurityRequirement>>,
}

/// OpenAPI Parameter object (path or query)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterObject {
    pub name: String,
    #[serde(rename = "in")]
    pub location: String,
    pub required: bool,
    pub schema: SchemaNode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<serde_json::Value>,
}

/// OpenAPI RequestBody object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestBody {
    pub required: bool,
    pub content: BTreeMap<String, MediaType>,
}

/// OpenAPI MediaType object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaType {
    pub schema: SchemaNode,
    /// Per-property encoding, used for multipart file fields
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoding: Option<BTreeMap<String, Encoding>>,
}

impl MediaType {
    /// A media type with no per-property encoding
    pub fn new(schema: SchemaNode) -> Self {
        Self {
            schema,
            encoding: None,
        }
    }
}

/// OpenAPI Encoding object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Encoding {
    #[serde(rename = "contentType")]
    pub content_type: String,
}

/// OpenAPI Response object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseObject {
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<BTreeMap<String, MediaType>>,
}

impl ResponseObject {
    /// A JSON response carrying the given schema
    pub fn json(description: &str, schema: SchemaNode) -> Self {
        let mut content = BTreeMap::new();
        content.insert("application/json".to_string(), MediaType::new(schema));
        Self {
            description: description.to_string(),
            content: Some(content),
        }
    }
}

/// OpenAPI Components object
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Components {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub schemas: BTreeMap<String, SchemaNode>,
    #[serde(
        rename = "securitySchemes",
        default,
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub security_schemes: BTreeMap<String, SecurityScheme>,
}

impl Components {
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty() && self.security_schemes.is_empty()
    }
}

/// Complete OpenAPI document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenApiDocument {
    pub openapi: String,
    pub info: Info,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<Server>,
    pub paths: BTreeMap<String, PathItem>,
    #[serde(default, skip_serializing_if = "Components::is_empty")]
    pub components: Components,
}

impl OpenApiDocument {
    /// Resolve a component schema by name
    pub fn schema(&self, name: &str) -> Option<&SchemaNode> {
        self.components.schemas.get(name)
    }
}
