//! The route registry: the explicit, statically-constructed data source the
//! documentation pipeline operates over.
//!
//! Instead of inspecting handlers at generation time, the host application
//! (or a build-time scan step) declares every documented endpoint as plain
//! data: a [`RouteDescriptor`] for what the router knows, an
//! [`OperationMetadata`] for what the handler's annotation declared, and a
//! type table mapping structured-type names to their [`SchemaSource`]. The
//! whole registry round-trips through a versioned snapshot file, so it can be
//! produced out-of-process and fed to the CLI.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{Error, Result};

/// Current snapshot schema version. Snapshots without a `version` field are
/// treated as version 1.
pub const SNAPSHOT_VERSION: u32 = 1;

/// HTTP verbs understood by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpVerb {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Options,
    Head,
}

impl HttpVerb {
    /// Upper-case wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpVerb::Get => "GET",
            HttpVerb::Post => "POST",
            HttpVerb::Put => "PUT",
            HttpVerb::Delete => "DELETE",
            HttpVerb::Patch => "PATCH",
            HttpVerb::Options => "OPTIONS",
            HttpVerb::Head => "HEAD",
        }
    }

    /// Lower-case key used in the `paths` map
    pub fn as_key(&self) -> &'static str {
        match self {
            HttpVerb::Get => "get",
            HttpVerb::Post => "post",
            HttpVerb::Put => "put",
            HttpVerb::Delete => "delete",
            HttpVerb::Patch => "patch",
            HttpVerb::Options => "options",
            HttpVerb::Head => "head",
        }
    }

    /// Verbs that change state and get the standard error-response scaffold
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            HttpVerb::Post | HttpVerb::Put | HttpVerb::Patch | HttpVerb::Delete
        )
    }

    /// Verbs whose structured inputs default to per-field query parameters
    pub fn is_read_only(&self) -> bool {
        matches!(self, HttpVerb::Get | HttpVerb::Head)
    }

    /// Parse a verb from any casing
    pub fn parse(s: &str) -> Option<HttpVerb> {
        match s.to_ascii_lowercase().as_str() {
            "get" => Some(HttpVerb::Get),
            "post" => Some(HttpVerb::Post),
            "put" => Some(HttpVerb::Put),
            "delete" => Some(HttpVerb::Delete),
            "patch" => Some(HttpVerb::Patch),
            "options" => Some(HttpVerb::Options),
            "head" => Some(HttpVerb::Head),
            _ => None,
        }
    }
}

/// The declared type of one handler parameter or typed field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    Int,
    Float,
    Bool,
    String,
    Array,
    Object,
    /// A structured input/output type, resolved through the type table
    Structured(String),
}

impl ParamKind {
    /// Whether this kind refers to a registered structured type
    pub fn is_structured(&self) -> bool {
        matches!(self, ParamKind::Structured(_))
    }
}

/// One declared handler parameter: name, declared type, nullability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandlerParam {
    pub name: String,
    pub kind: ParamKind,
    #[serde(default)]
    pub nullable: bool,
}

impl HandlerParam {
    /// Create a required (non-nullable) parameter
    pub fn new(name: &str, kind: ParamKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            nullable: false,
        }
    }

    /// Create a nullable parameter
    pub fn nullable(name: &str, kind: ParamKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            nullable: true,
        }
    }
}

/// One registered endpoint as the router sees it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteDescriptor {
    /// HTTP verb
    pub verb: HttpVerb,
    /// URI template with `{param}` placeholders, as registered
    pub uri: String,
    /// Declared handler parameters, in declaration order
    #[serde(default)]
    pub params: Vec<HandlerParam>,
    /// Middleware identifiers attached to the route, in declaration order
    #[serde(default)]
    pub middleware: Vec<String>,
    /// Symbolic handler name (e.g. "listUsers"), if the route has one
    #[serde(default)]
    pub name: Option<String>,
}

impl RouteDescriptor {
    /// Create a descriptor with no parameters or middleware
    pub fn new(verb: HttpVerb, uri: &str) -> Self {
        Self {
            verb,
            uri: uri.to_string(),
            params: Vec::new(),
            middleware: Vec::new(),
            name: None,
        }
    }
}

/// Where a structured handler parameter's data is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestSource {
    Body,
    Form,
    Query,
}

/// The documentation annotation attached to one handler.
///
/// A route without metadata is undocumented by design and excluded from the
/// generated document. `security: None` means "not specified" and falls
/// through to auto-detection; `security: Some(vec![])` means "explicitly no
/// auth" and stops resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationMetadata {
    pub verb: HttpVerb,
    /// Declared path; may differ from the route URI in placeholder casing
    pub path: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Name of the response type in the type table
    #[serde(default)]
    pub response_model: Option<String>,
    #[serde(default)]
    pub response_status: Option<u16>,
    #[serde(default)]
    pub security: Option<Vec<String>>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub request_source: Option<RequestSource>,
}

impl OperationMetadata {
    /// Create metadata with the three mandatory fields
    pub fn new(verb: HttpVerb, path: &str, tags: Vec<String>) -> Self {
        Self {
            verb,
            path: path.to_string(),
            tags,
            summary: None,
            description: None,
            response_model: None,
            response_status: None,
            security: None,
            content_type: None,
            request_source: None,
        }
    }
}

/// A validation-rule value: either a single pipe-delimited string or an
/// already-split token list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleValue {
    Joined(String),
    Tokens(Vec<String>),
}

impl RuleValue {
    /// The ordered token list, splitting pipe-delimited strings
    pub fn tokens(&self) -> Vec<String> {
        match self {
            RuleValue::Joined(s) => s.split('|').map(str::to_string).collect(),
            RuleValue::Tokens(tokens) => tokens.clone(),
        }
    }
}

/// Per-field metadata overlay declared alongside rules or typed fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldOverlay {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
    /// Element kind for array fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items_kind: Option<ParamKind>,
}

impl FieldOverlay {
    /// Merge the overlay's facets into a schema. The embedded-description
    /// rule: when `skip_description` is set, a description already extracted
    /// from the rule tokens keeps priority over the overlay's.
    pub fn apply(&self, schema: &mut crate::schema::SchemaNode, skip_description: bool) {
        if !skip_description {
            if let Some(description) = &self.description {
                schema.description = Some(description.clone());
            }
        }
        if let Some(example) = &self.example {
            schema.example = Some(example.clone());
        }
        if let Some(format) = &self.format {
            schema.format = Some(format.clone());
        }
        if let Some(minimum) = self.minimum {
            schema.minimum = Some(minimum);
        }
        if let Some(maximum) = self.maximum {
            schema.maximum = Some(maximum);
        }
        if let Some(min_length) = self.min_length {
            schema.min_length = Some(min_length);
        }
        if let Some(max_length) = self.max_length {
            schema.max_length = Some(max_length);
        }
        if let Some(pattern) = &self.pattern {
            schema.pattern = Some(pattern.clone());
        }
        if let Some(enum_values) = &self.enum_values {
            schema.enum_values = Some(enum_values.clone());
        }
    }
}

/// One explicit, typed field of a type-declared structured type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypedField {
    pub name: String,
    pub kind: ParamKind,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overlay: Option<FieldOverlay>,
}

impl TypedField {
    /// Create a required field without overlay metadata
    pub fn new(name: &str, kind: ParamKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            nullable: false,
            overlay: None,
        }
    }

    /// Create a nullable field without overlay metadata
    pub fn nullable(name: &str, kind: ParamKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            nullable: true,
            overlay: None,
        }
    }
}

/// How a structured type defines its schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum SchemaSource {
    /// Fields defined implicitly by a flat validation-rule map. Overlay keys
    /// are plain field names or `parent.child` for array-of-object members.
    RuleBased {
        rules: IndexMap<String, RuleValue>,
        #[serde(default)]
        overlay: IndexMap<String, FieldOverlay>,
    },
    /// Fields declared explicitly as typed members
    TypeDeclared { fields: Vec<TypedField> },
}

/// One registry entry: the router's view of an endpoint plus the handler's
/// annotation, if any.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteEntry {
    pub descriptor: RouteDescriptor,
    #[serde(default)]
    pub metadata: Option<OperationMetadata>,
}

impl RouteEntry {
    /// Create a documented entry
    pub fn documented(descriptor: RouteDescriptor, metadata: OperationMetadata) -> Self {
        Self {
            descriptor,
            metadata: Some(metadata),
        }
    }

    /// Create an undocumented entry (excluded from the generated document)
    pub fn undocumented(descriptor: RouteDescriptor) -> Self {
        Self {
            descriptor,
            metadata: None,
        }
    }
}

/// The full registry: every route plus the structured-type table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RouteRegistry {
    #[serde(default)]
    pub routes: Vec<RouteEntry>,
    #[serde(default)]
    pub types: BTreeMap<String, SchemaSource>,
}

impl RouteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a route entry
    pub fn add_route(&mut self, entry: RouteEntry) {
        self.routes.push(entry);
    }

    /// Register a structured type under its name
    pub fn add_type(&mut self, name: &str, source: SchemaSource) {
        self.types.insert(name.to_string(), source);
    }
}

fn default_snapshot_version() -> u32 {
    1
}

/// The on-disk form of a registry. The version field defaults so that
/// pre-versioning snapshots load as version 1; unknown future versions are
/// rejected at the deserialization boundary instead of being re-parsed
/// heuristically.
#[derive(Debug, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    #[serde(default = "default_snapshot_version")]
    pub version: u32,
    #[serde(default)]
    pub routes: Vec<RouteEntry>,
    #[serde(default)]
    pub types: BTreeMap<String, SchemaSource>,
}

impl RegistrySnapshot {
    /// Wrap a registry for export at the current version
    pub fn from_registry(registry: RouteRegistry) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            routes: registry.routes,
            types: registry.types,
        }
    }

    /// Validate the version and unwrap into a registry
    pub fn into_registry(self) -> Result<RouteRegistry> {
        if self.version > SNAPSHOT_VERSION {
            return Err(Error::InvalidArgument(format!(
                "unsupported registry snapshot version {} (supported: {})",
                self.version, SNAPSHOT_VERSION
            )));
        }
        Ok(RouteRegistry {
            routes: self.routes,
            types: self.types,
        })
    }
}

/// Load a registry snapshot from a YAML or JSON file, chosen by extension.
pub fn load_snapshot(path: &Path) -> Result<RouteRegistry> {
    log::debug!("Loading registry snapshot from {}", path.display());
    let content = std::fs::read_to_string(path)?;

    let snapshot: RegistrySnapshot = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(&content)?,
        _ => serde_yaml::from_str(&content)?,
    };

    snapshot.into_registry()
}
