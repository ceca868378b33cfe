//! Synthesizes one OpenAPI operation from a route descriptor and its
//! handler metadata.
//!
//! Resolution order matters throughout: path placeholders are taken from the
//! metadata's declared path (which may differ from the raw route URI in
//! casing), handler parameters are matched exactly before falling back to
//! camelCase/snake_case reconciliation, and security resolves explicit >
//! middleware-inferred > global default.

use log::{debug, warn};
use std::collections::BTreeMap;

use crate::config::DocsConfig;
use crate::document::{
    Encoding, MediaType, Operation, ParameterObject, RequestBody, ResponseObject,
    SecurityRequirement,
};
use crate::error::{Error, Result};
use crate::registry::{
    HttpVerb, OperationMetadata, ParamKind, RequestSource, RouteDescriptor, SchemaSource,
};
use crate::schema::SchemaNode;
use crate::type_schema::{primitive_schema, TypeSchemaCompiler};

/// Status codes scaffolded onto every mutating operation
const SCAFFOLDED_ERROR_CODES: [u16; 6] = [400, 401, 403, 404, 422, 500];

/// The request-scoped component store one document assembly accumulates
/// schemas into. Registration is an idempotent upsert: the first writer wins
/// and later differing registrations under the same name are kept out (and
/// logged, since a silent overwrite would corrupt the document).
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    schemas: BTreeMap<String, SchemaNode>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a schema under a stable name and return a `$ref` node to it.
    pub fn register(&mut self, name: &str, schema: SchemaNode) -> SchemaNode {
        match self.schemas.get(name) {
            Some(existing) => {
                if *existing != schema {
                    warn!(
                        "component schema name collision on '{}'; keeping the first registration",
                        name
                    );
                }
            }
            None => {
                debug!("Registering component schema: {}", name);
                self.schemas.insert(name.to_string(), schema);
            }
        }
        SchemaNode::reference(name)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Consume the registry into the document's schema map
    pub fn into_schemas(self) -> BTreeMap<String, SchemaNode> {
        self.schemas
    }
}

/// An operation placed at its document position.
#[derive(Debug)]
pub struct SynthesizedOperation {
    pub path: String,
    pub verb: HttpVerb,
    pub operation: Operation,
}

/// Per-route operation synthesis over the registry's type table.
pub struct OperationSynthesizer<'a> {
    config: &'a DocsConfig,
    types: &'a BTreeMap<String, SchemaSource>,
}

impl<'a> OperationSynthesizer<'a> {
    pub fn new(config: &'a DocsConfig, types: &'a BTreeMap<String, SchemaSource>) -> Self {
        Self { config, types }
    }

    /// Synthesize the operation for one documented route.
    pub fn synthesize(
        &self,
        descriptor: &RouteDescriptor,
        metadata: &OperationMetadata,
        components: &mut ComponentRegistry,
    ) -> Result<SynthesizedOperation> {
        let verb = metadata.verb;
        debug!("Synthesizing operation: {} {}", verb.as_str(), metadata.path);

        let compiler = TypeSchemaCompiler::new(self.types);

        let summary = metadata.summary.clone().unwrap_or_else(|| {
            match &descriptor.name {
                Some(name) => humanize_handler_name(name),
                None => format!("{} {}", verb.as_str(), metadata.path),
            }
        });

        // Placeholders come from the declared path, not the raw route URI
        let placeholders = extract_placeholders(&metadata.path);
        let mut consumed = vec![false; placeholders.len()];

        let mut parameters: Vec<ParameterObject> = Vec::new();
        let mut request_body: Option<RequestBody> = None;

        for param in &descriptor.params {
            match &param.kind {
                ParamKind::Structured(type_name) => {
                    self.resolve_structured_param(
                        type_name,
                        param.nullable,
                        verb,
                        metadata,
                        &compiler,
                        components,
                        &mut parameters,
                        &mut request_body,
                    )?;
                }
                primitive => {
                    if let Some(index) = match_placeholder(&param.name, &placeholders, &consumed) {
                        consumed[index] = true;
                        parameters.push(ParameterObject {
                            // The placeholder's spelling wins over the
                            // handler parameter's
                            name: placeholders[index].clone(),
                            location: "path".to_string(),
                            required: true,
                            schema: primitive_schema(primitive),
                            description: None,
                            example: None,
                        });
                    } else {
                        parameters.push(ParameterObject {
                            name: param.name.clone(),
                            location: "query".to_string(),
                            required: !param.nullable,
                            schema: primitive_schema(primitive),
                            description: None,
                            example: None,
                        });
                    }
                }
            }
        }

        let mut responses = BTreeMap::new();
        let status = metadata.response_status.unwrap_or(200);
        let response_schema = match &metadata.response_model {
            Some(model) => {
                let schema = compiler.compile(model)?;
                components.register(model, schema)
            }
            None => SchemaNode::empty_object(),
        };
        responses.insert(
            status.to_string(),
            ResponseObject::json(reason_phrase(status), response_schema),
        );

        if verb.is_mutating() {
            for code in SCAFFOLDED_ERROR_CODES {
                let key = code.to_string();
                if !responses.contains_key(&key) {
                    responses.insert(
                        key,
                        ResponseObject::json(reason_phrase(code), error_envelope_schema()),
                    );
                }
            }
        }

        let operation = Operation {
            summary: Some(summary),
            description: metadata.description.clone(),
            tags: metadata.tags.clone(),
            parameters: if parameters.is_empty() {
                None
            } else {
                Some(parameters)
            },
            request_body,
            responses,
            security: self.resolve_security(metadata, descriptor),
        };

        Ok(SynthesizedOperation {
            path: metadata.path.clone(),
            verb,
            operation,
        })
    }

    /// Resolve a structured handler parameter into query parameters or a
    /// request body, depending on the effective request source.
    #[allow(clippy::too_many_arguments)]
    fn resolve_structured_param(
        &self,
        type_name: &str,
        nullable: bool,
        verb: HttpVerb,
        metadata: &OperationMetadata,
        compiler: &TypeSchemaCompiler,
        components: &mut ComponentRegistry,
        parameters: &mut Vec<ParameterObject>,
        request_body: &mut Option<RequestBody>,
    ) -> Result<()> {
        let schema = compiler.compile(type_name).map_err(|e| match e {
            Error::InvalidSchemaSource { type_name } => Error::UnresolvableHandler {
                route: format!("{} {}", verb.as_str(), metadata.path),
                message: format!("cannot resolve parameter type {}", type_name),
            },
            other => other,
        })?;

        let source = metadata.request_source.unwrap_or_else(|| {
            match metadata.content_type.as_deref() {
                Some(content_type) if content_type.contains("form") => RequestSource::Form,
                Some(_) => RequestSource::Body,
                None => {
                    if verb.is_read_only() && compiler.is_rule_based(type_name) {
                        RequestSource::Query
                    } else {
                        RequestSource::Body
                    }
                }
            }
        });

        match source {
            RequestSource::Query => {
                let required: Vec<String> = schema.required.clone().unwrap_or_default();
                if let Some(properties) = schema.properties {
                    for (name, mut property) in properties {
                        let description = property.description.take();
                        let example = property.example.take();
                        parameters.push(ParameterObject {
                            required: required.contains(&name),
                            name,
                            location: "query".to_string(),
                            schema: property,
                            description,
                            example,
                        });
                    }
                }
            }
            RequestSource::Body => {
                let content_type = metadata
                    .content_type
                    .clone()
                    .unwrap_or_else(|| "application/json".to_string());
                let reference = components.register(type_name, schema);
                let mut content = BTreeMap::new();
                content.insert(content_type, MediaType::new(reference));
                *request_body = Some(RequestBody {
                    required: !nullable,
                    content,
                });
            }
            RequestSource::Form => {
                let content_type = metadata
                    .content_type
                    .clone()
                    .unwrap_or_else(|| "multipart/form-data".to_string());

                let mut encoding: BTreeMap<String, Encoding> = BTreeMap::new();
                if let Some(properties) = &schema.properties {
                    for (name, property) in properties {
                        if property.is_binary() {
                            encoding.insert(
                                name.clone(),
                                Encoding {
                                    content_type: infer_binary_content_type(
                                        property.description.as_deref(),
                                    ),
                                },
                            );
                        }
                    }
                }

                let mut content = BTreeMap::new();
                // Form bodies inline the schema rather than referencing it
                content.insert(
                    content_type,
                    MediaType {
                        schema,
                        encoding: if encoding.is_empty() {
                            None
                        } else {
                            Some(encoding)
                        },
                    },
                );
                *request_body = Some(RequestBody {
                    required: !nullable,
                    content,
                });
            }
        }

        Ok(())
    }

    /// Strict priority: explicit metadata (including explicitly none) >
    /// middleware auto-detection > configured global default > nothing.
    fn resolve_security(
        &self,
        metadata: &OperationMetadata,
        descriptor: &RouteDescriptor,
    ) -> Option<Vec<SecurityRequirement>> {
        if let Some(explicit) = &metadata.security {
            if explicit.is_empty() {
                // Explicitly no auth: stop here, emit no security key
                return None;
            }
            return Some(to_requirements(explicit));
        }

        if self.config.auto_detect_security {
            for middleware in &descriptor.middleware {
                if let Some(scheme) = self.config.middleware_security_map.get(middleware) {
                    return Some(to_requirements(std::slice::from_ref(scheme)));
                }
                for (key, scheme) in &self.config.middleware_security_map {
                    if middleware.contains(key.as_str()) {
                        return Some(to_requirements(std::slice::from_ref(scheme)));
                    }
                }
            }
        }

        if !self.config.global_security.is_empty() {
            return Some(to_requirements(&self.config.global_security));
        }

        None
    }
}

fn to_requirements(schemes: &[String]) -> Vec<SecurityRequirement> {
    schemes
        .iter()
        .map(|scheme| {
            let mut requirement = SecurityRequirement::new();
            requirement.insert(scheme.clone(), Vec::new());
            requirement
        })
        .collect()
}

/// The uniform error envelope scaffolded onto mutating operations: the shape
/// the validation middleware reports failures in.
pub fn error_envelope_schema() -> SchemaNode {
    let mut properties = indexmap::IndexMap::new();
    properties.insert("message".to_string(), SchemaNode::string());

    let mut errors = SchemaNode::empty_object();
    errors.additional_properties = Some(Box::new(SchemaNode::array(SchemaNode::string())));
    properties.insert("errors".to_string(), errors);

    SchemaNode::object(properties, Vec::new())
}

/// Extract `{name}` placeholder names from a path template, in order.
pub fn extract_placeholders(path: &str) -> Vec<String> {
    let mut placeholders = Vec::new();
    let mut rest = path;
    while let Some(start) = rest.find('{') {
        match rest[start..].find('}') {
            Some(end) => {
                placeholders.push(rest[start + 1..start + end].to_string());
                rest = &rest[start + end + 1..];
            }
            None => break,
        }
    }
    placeholders
}

/// Match a handler parameter name against unconsumed placeholders: exact
/// equality first, then camelCase/snake_case-insensitive equality.
fn match_placeholder(name: &str, placeholders: &[String], consumed: &[bool]) -> Option<usize> {
    for (index, placeholder) in placeholders.iter().enumerate() {
        if !consumed[index] && placeholder == name {
            return Some(index);
        }
    }
    for (index, placeholder) in placeholders.iter().enumerate() {
        if !consumed[index] && snake_normalize(placeholder) == snake_normalize(name) {
            return Some(index);
        }
    }
    None
}

/// Normalize camelCase to snake_case for case-convention-insensitive
/// comparison; snake_case input passes through unchanged.
fn snake_normalize(name: &str) -> String {
    let mut normalized = String::with_capacity(name.len() + 4);
    for (index, c) in name.chars().enumerate() {
        if c.is_uppercase() {
            if index > 0 {
                normalized.push('_');
            }
            normalized.extend(c.to_lowercase());
        } else {
            normalized.push(c);
        }
    }
    normalized
}

/// Humanize a handler name into an operation summary. The five conventional
/// CRUD names get exact labels; anything else is split camel-to-words.
fn humanize_handler_name(name: &str) -> String {
    match name.to_lowercase().as_str() {
        "list" => "List all".to_string(),
        "create" => "Create new".to_string(),
        "get" => "Get".to_string(),
        "update" => "Update".to_string(),
        "delete" => "Delete".to_string(),
        _ => camel_to_words(name),
    }
}

fn camel_to_words(name: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();

    for c in name.chars() {
        if c == '_' || c == '-' {
            if !current.is_empty() {
                words.push(current.clone());
                current.clear();
            }
        } else if c.is_uppercase() && !current.is_empty() {
            words.push(current.clone());
            current.clear();
            current.extend(c.to_lowercase());
        } else {
            current.extend(c.to_lowercase());
        }
    }
    if !current.is_empty() {
        words.push(current);
    }

    let mut result = words.join(" ");
    if let Some(first) = result.get_mut(0..1) {
        first.make_ascii_uppercase();
    }
    result
}

/// Standard reason phrase for a status code; unknown codes get a generic
/// label.
pub fn reason_phrase(code: u16) -> &'static str {
    match code {
        200 => "Success",
        201 => "Created",
        202 => "Accepted",
        204 => "No Content",
        301 => "Moved Permanently",
        302 => "Found",
        304 => "Not Modified",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        409 => "Conflict",
        410 => "Gone",
        422 => "Unprocessable Entity",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "Response",
    }
}

/// Resolve the upload content type for a binary form field from the MIME
/// hints its description carries: an explicit `mimes:` list first (first
/// listed type wins), then an `image` keyword, then the octet-stream default.
pub fn infer_binary_content_type(description: Option<&str>) -> String {
    if let Some(description) = description {
        if let Some(index) = description.find("mime types:") {
            let list = &description[index + "mime types:".len()..];
            let list = list.split(')').next().unwrap_or(list);
            if let Some(first) = list.split(',').next() {
                let extension = first.trim();
                if !extension.is_empty() {
                    return mime_for_extension(extension);
                }
            }
        }
        if description.to_lowercase().contains("image") {
            return "image/*".to_string();
        }
    }
    "application/octet-stream".to_string()
}

fn mime_for_extension(extension: &str) -> String {
    match extension.to_lowercase().as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "bmp" => "image/bmp",
        "pdf" => "application/pdf",
        "csv" => "text/csv",
        "txt" => "text/plain",
        "json" => "application/json",
        "xml" => "application/xml",
        "zip" => "application/zip",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "mp3" => "audio/mpeg",
        "mp4" => "video/mp4",
        _ => "application/octet-stream",
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{HandlerParam, RuleValue, SchemaSource, TypedField};
    use indexmap::IndexMap;

    fn empty_types() -> BTreeMap<String, SchemaSource> {
        BTreeMap::new()
    }

    fn user_types() -> BTreeMap<String, SchemaSource> {
        let mut types = BTreeMap::new();
        types.insert(
            "UserResponse".to_string(),
            SchemaSource::TypeDeclared {
                fields: vec![
                    TypedField::new("id", ParamKind::Int),
                    TypedField::new("name", ParamKind::String),
                ],
            },
        );

        let mut rules = IndexMap::new();
        rules.insert(
            "name".to_string(),
            RuleValue::Joined("required|string|min:3".to_string()),
        );
        rules.insert(
            "page".to_string(),
            RuleValue::Joined("nullable|integer".to_string()),
        );
        types.insert(
            "SearchRequest".to_string(),
            SchemaSource::RuleBased {
                rules,
                overlay: IndexMap::new(),
            },
        );

        let mut upload_rules = IndexMap::new();
        upload_rules.insert(
            "avatar".to_string(),
            RuleValue::Joined("required|file|mimes:jpg,png".to_string()),
        );
        upload_rules.insert(
            "caption".to_string(),
            RuleValue::Joined("nullable|string".to_string()),
        );
        types.insert(
            "UploadRequest".to_string(),
            SchemaSource::RuleBased {
                rules: upload_rules,
                overlay: IndexMap::new(),
            },
        );

        types
    }

    fn synthesize_with(
        config: &DocsConfig,
        types: &BTreeMap<String, SchemaSource>,
        descriptor: RouteDescriptor,
        metadata: OperationMetadata,
    ) -> (SynthesizedOperation, ComponentRegistry) {
        let synthesizer = OperationSynthesizer::new(config, types);
        let mut components = ComponentRegistry::new();
        let synthesized = synthesizer
            .synthesize(&descriptor, &metadata, &mut components)
            .unwrap();
        (synthesized, components)
    }

    #[test]
    fn test_path_parameter_matched_exactly() {
        let config = DocsConfig::default();
        let types = empty_types();
        let mut descriptor = RouteDescriptor::new(HttpVerb::Get, "/api/users/{id}");
        descriptor.params.push(HandlerParam::new("id", ParamKind::Int));
        let metadata =
            OperationMetadata::new(HttpVerb::Get, "/api/users/{id}", vec!["Users".to_string()]);

        let (synthesized, _) = synthesize_with(&config, &types, descriptor, metadata);
        let parameters = synthesized.operation.parameters.unwrap();

        assert_eq!(parameters.len(), 1);
        assert_eq!(parameters[0].name, "id");
        assert_eq!(parameters[0].location, "path");
        assert!(parameters[0].required);
        assert_eq!(parameters[0].schema.schema_type.as_deref(), Some("integer"));
    }

    #[test]
    fn test_path_parameter_case_reconciliation_uses_placeholder_name() {
        let config = DocsConfig::default();
        let types = empty_types();
        let mut descriptor = RouteDescriptor::new(HttpVerb::Get, "/api/posts/{post_id}");
        descriptor
            .params
            .push(HandlerParam::new("postId", ParamKind::Int));
        let metadata =
            OperationMetadata::new(HttpVerb::Get, "/api/posts/{post_id}", vec!["Posts".to_string()]);

        let (synthesized, _) = synthesize_with(&config, &types, descriptor, metadata);
        let parameters = synthesized.operation.parameters.unwrap();

        assert_eq!(parameters.len(), 1);
        // The placeholder's spelling, not the handler parameter's
        assert_eq!(parameters[0].name, "post_id");
        assert_eq!(parameters[0].location, "path");
    }

    #[test]
    fn test_unmatched_primitive_becomes_query_parameter() {
        let config = DocsConfig::default();
        let types = empty_types();
        let mut descriptor = RouteDescriptor::new(HttpVerb::Get, "/api/users");
        descriptor
            .params
            .push(HandlerParam::nullable("page", ParamKind::Int));
        let metadata = OperationMetadata::new(HttpVerb::Get, "/api/users", vec!["Users".to_string()]);

        let (synthesized, _) = synthesize_with(&config, &types, descriptor, metadata);
        let parameters = synthesized.operation.parameters.unwrap();

        assert_eq!(parameters.len(), 1);
        assert_eq!(parameters[0].name, "page");
        assert_eq!(parameters[0].location, "query");
        assert!(!parameters[0].required);
        assert_eq!(parameters[0].schema.schema_type.as_deref(), Some("integer"));
    }

    #[test]
    fn test_structured_body_registers_component() {
        let config = DocsConfig::default();
        let types = user_types();
        let mut descriptor = RouteDescriptor::new(HttpVerb::Post, "/api/users");
        descriptor.params.push(HandlerParam::new(
            "request",
            ParamKind::Structured("SearchRequest".to_string()),
        ));
        let metadata = OperationMetadata::new(HttpVerb::Post, "/api/users", vec!["Users".to_string()]);

        let (synthesized, components) = synthesize_with(&config, &types, descriptor, metadata);

        let body = synthesized.operation.request_body.unwrap();
        assert!(body.required);
        let media = &body.content["application/json"];
        assert_eq!(
            media.schema.reference.as_deref(),
            Some("#/components/schemas/SearchRequest")
        );
        assert_eq!(components.len(), 1);
    }

    #[test]
    fn test_component_registration_is_idempotent() {
        let mut components = ComponentRegistry::new();
        components.register("User", SchemaNode::empty_object());
        components.register("User", SchemaNode::empty_object());

        assert_eq!(components.len(), 1);
    }

    #[test]
    fn test_component_collision_keeps_first() {
        let mut components = ComponentRegistry::new();
        let first = SchemaNode::string();
        components.register("Clash", first.clone());
        components.register("Clash", SchemaNode::integer());

        assert_eq!(components.into_schemas()["Clash"], first);
    }

    #[test]
    fn test_read_only_verb_flattens_rule_based_type_to_query() {
        let config = DocsConfig::default();
        let types = user_types();
        let mut descriptor = RouteDescriptor::new(HttpVerb::Get, "/api/users");
        descriptor.params.push(HandlerParam::new(
            "filters",
            ParamKind::Structured("SearchRequest".to_string()),
        ));
        let metadata = OperationMetadata::new(HttpVerb::Get, "/api/users", vec!["Users".to_string()]);

        let (synthesized, components) = synthesize_with(&config, &types, descriptor, metadata);

        assert!(synthesized.operation.request_body.is_none());
        assert!(components.is_empty());
        let parameters = synthesized.operation.parameters.unwrap();
        assert_eq!(parameters.len(), 2);
        assert_eq!(parameters[0].name, "name");
        assert!(parameters[0].required);
        assert_eq!(parameters[1].name, "page");
        assert!(!parameters[1].required);
        assert_eq!(parameters[1].location, "query");
    }

    #[test]
    fn test_explicit_request_source_overrides_verb_default() {
        let config = DocsConfig::default();
        let types = user_types();
        let mut descriptor = RouteDescriptor::new(HttpVerb::Get, "/api/users");
        descriptor.params.push(HandlerParam::new(
            "filters",
            ParamKind::Structured("SearchRequest".to_string()),
        ));
        let mut metadata =
            OperationMetadata::new(HttpVerb::Get, "/api/users", vec!["Users".to_string()]);
        metadata.request_source = Some(RequestSource::Body);

        let (synthesized, _) = synthesize_with(&config, &types, descriptor, metadata);
        assert!(synthesized.operation.request_body.is_some());
    }

    #[test]
    fn test_form_source_inlines_schema_with_encoding() {
        let config = DocsConfig::default();
        let types = user_types();
        let mut descriptor = RouteDescriptor::new(HttpVerb::Post, "/api/uploads");
        descriptor.params.push(HandlerParam::new(
            "upload",
            ParamKind::Structured("UploadRequest".to_string()),
        ));
        let mut metadata =
            OperationMetadata::new(HttpVerb::Post, "/api/uploads", vec!["Uploads".to_string()]);
        metadata.content_type = Some("multipart/form-data".to_string());

        let (synthesized, components) = synthesize_with(&config, &types, descriptor, metadata);

        let body = synthesized.operation.request_body.unwrap();
        let media = &body.content["multipart/form-data"];
        // Inlined, not referenced
        assert!(media.schema.reference.is_none());
        assert!(media.schema.properties.is_some());
        assert!(components.is_empty());

        let encoding = media.encoding.as_ref().unwrap();
        // First listed mime wins
        assert_eq!(encoding["avatar"].content_type, "image/jpeg");
        assert!(!encoding.contains_key("caption"));
    }

    #[test]
    fn test_response_model_referenced() {
        let config = DocsConfig::default();
        let types = user_types();
        let descriptor = RouteDescriptor::new(HttpVerb::Get, "/api/users/{id}");
        let mut metadata =
            OperationMetadata::new(HttpVerb::Get, "/api/users/{id}", vec!["Users".to_string()]);
        metadata.response_model = Some("UserResponse".to_string());

        let (synthesized, components) = synthesize_with(&config, &types, descriptor, metadata);

        let response = &synthesized.operation.responses["200"];
        assert_eq!(response.description, "Success");
        let media = &response.content.as_ref().unwrap()["application/json"];
        assert_eq!(
            media.schema.reference.as_deref(),
            Some("#/components/schemas/UserResponse")
        );
        assert_eq!(components.len(), 1);
    }

    #[test]
    fn test_default_response_is_empty_object_200() {
        let config = DocsConfig::default();
        let types = empty_types();
        let descriptor = RouteDescriptor::new(HttpVerb::Get, "/api/health");
        let metadata = OperationMetadata::new(HttpVerb::Get, "/api/health", vec!["Ops".to_string()]);

        let (synthesized, _) = synthesize_with(&config, &types, descriptor, metadata);

        let response = &synthesized.operation.responses["200"];
        let media = &response.content.as_ref().unwrap()["application/json"];
        assert_eq!(media.schema.schema_type.as_deref(), Some("object"));
        assert!(media.schema.properties.is_none());
    }

    #[test]
    fn test_explicit_status_code_and_unknown_phrase() {
        let config = DocsConfig::default();
        let types = empty_types();
        let descriptor = RouteDescriptor::new(HttpVerb::Post, "/api/users");
        let mut metadata =
            OperationMetadata::new(HttpVerb::Post, "/api/users", vec!["Users".to_string()]);
        metadata.response_status = Some(201);

        let (synthesized, _) = synthesize_with(&config, &types, descriptor, metadata);
        assert_eq!(synthesized.operation.responses["201"].description, "Created");

        assert_eq!(reason_phrase(299), "Response");
    }

    #[test]
    fn test_mutating_verb_scaffolds_error_responses() {
        let config = DocsConfig::default();
        let types = empty_types();
        let descriptor = RouteDescriptor::new(HttpVerb::Post, "/api/users");
        let metadata = OperationMetadata::new(HttpVerb::Post, "/api/users", vec!["Users".to_string()]);

        let (synthesized, _) = synthesize_with(&config, &types, descriptor, metadata);
        let responses = &synthesized.operation.responses;

        for code in ["400", "401", "403", "404", "422", "500"] {
            assert!(responses.contains_key(code), "missing scaffold for {}", code);
        }

        let envelope = &responses["422"].content.as_ref().unwrap()["application/json"].schema;
        let props = envelope.properties.as_ref().unwrap();
        assert_eq!(props["message"].schema_type.as_deref(), Some("string"));
        assert_eq!(
            props["errors"]
                .additional_properties
                .as_ref()
                .unwrap()
                .schema_type
                .as_deref(),
            Some("array")
        );
    }

    #[test]
    fn test_scaffold_skips_declared_status() {
        let config = DocsConfig::default();
        let types = empty_types();
        let descriptor = RouteDescriptor::new(HttpVerb::Delete, "/api/users/{id}");
        let mut metadata =
            OperationMetadata::new(HttpVerb::Delete, "/api/users/{id}", vec!["Users".to_string()]);
        metadata.response_status = Some(404);

        let (synthesized, _) = synthesize_with(&config, &types, descriptor, metadata);
        let responses = &synthesized.operation.responses;

        // The declared 404 keeps its empty-object schema, not the envelope
        let media = &responses["404"].content.as_ref().unwrap()["application/json"];
        assert!(media.schema.properties.is_none());
    }

    #[test]
    fn test_get_verb_has_no_error_scaffold() {
        let config = DocsConfig::default();
        let types = empty_types();
        let descriptor = RouteDescriptor::new(HttpVerb::Get, "/api/users");
        let metadata = OperationMetadata::new(HttpVerb::Get, "/api/users", vec!["Users".to_string()]);

        let (synthesized, _) = synthesize_with(&config, &types, descriptor, metadata);
        assert_eq!(synthesized.operation.responses.len(), 1);
    }

    #[test]
    fn test_explicit_empty_security_omits_key_despite_global_default() {
        let mut config = DocsConfig::default();
        config.global_security = vec!["bearerAuth".to_string()];
        let types = empty_types();
        let descriptor = RouteDescriptor::new(HttpVerb::Get, "/api/public");
        let mut metadata =
            OperationMetadata::new(HttpVerb::Get, "/api/public", vec!["Public".to_string()]);
        metadata.security = Some(Vec::new());

        let (synthesized, _) = synthesize_with(&config, &types, descriptor, metadata);
        assert!(synthesized.operation.security.is_none());
    }

    #[test]
    fn test_unset_security_falls_back_to_global_default() {
        let mut config = DocsConfig::default();
        config.global_security = vec!["bearerAuth".to_string()];
        let types = empty_types();
        let descriptor = RouteDescriptor::new(HttpVerb::Get, "/api/users");
        let metadata = OperationMetadata::new(HttpVerb::Get, "/api/users", vec!["Users".to_string()]);

        let (synthesized, _) = synthesize_with(&config, &types, descriptor, metadata);
        let security = synthesized.operation.security.unwrap();
        assert_eq!(security.len(), 1);
        assert!(security[0].contains_key("bearerAuth"));
    }

    #[test]
    fn test_unset_security_without_global_omits_key() {
        let config = DocsConfig::default();
        let types = empty_types();
        let descriptor = RouteDescriptor::new(HttpVerb::Get, "/api/users");
        let metadata = OperationMetadata::new(HttpVerb::Get, "/api/users", vec!["Users".to_string()]);

        let (synthesized, _) = synthesize_with(&config, &types, descriptor, metadata);
        assert!(synthesized.operation.security.is_none());
    }

    #[test]
    fn test_explicit_security_schemes_win() {
        let mut config = DocsConfig::default();
        config.global_security = vec!["bearerAuth".to_string()];
        let types = empty_types();
        let mut descriptor = RouteDescriptor::new(HttpVerb::Get, "/api/admin");
        descriptor.middleware.push("auth".to_string());
        let mut metadata =
            OperationMetadata::new(HttpVerb::Get, "/api/admin", vec!["Admin".to_string()]);
        metadata.security = Some(vec!["apiKey".to_string()]);

        let (synthesized, _) = synthesize_with(&config, &types, descriptor, metadata);
        let security = synthesized.operation.security.unwrap();
        assert!(security[0].contains_key("apiKey"));
    }

    #[test]
    fn test_middleware_exact_match_detected() {
        let config = DocsConfig::default();
        let types = empty_types();
        let mut descriptor = RouteDescriptor::new(HttpVerb::Get, "/api/me");
        descriptor.middleware.push("auth:sanctum".to_string());
        let metadata = OperationMetadata::new(HttpVerb::Get, "/api/me", vec!["Users".to_string()]);

        let (synthesized, _) = synthesize_with(&config, &types, descriptor, metadata);
        let security = synthesized.operation.security.unwrap();
        assert!(security[0].contains_key("bearerAuth"));
    }

    #[test]
    fn test_middleware_substring_match_detected() {
        let config = DocsConfig::default();
        let types = empty_types();
        let mut descriptor = RouteDescriptor::new(HttpVerb::Get, "/api/me");
        descriptor.middleware.push("throttle".to_string());
        descriptor.middleware.push("jwt.refresh".to_string());
        let metadata = OperationMetadata::new(HttpVerb::Get, "/api/me", vec!["Users".to_string()]);

        let (synthesized, _) = synthesize_with(&config, &types, descriptor, metadata);
        let security = synthesized.operation.security.unwrap();
        assert!(security[0].contains_key("bearerAuth"));
    }

    #[test]
    fn test_auto_detection_disabled() {
        let mut config = DocsConfig::default();
        config.auto_detect_security = false;
        let types = empty_types();
        let mut descriptor = RouteDescriptor::new(HttpVerb::Get, "/api/me");
        descriptor.middleware.push("auth".to_string());
        let metadata = OperationMetadata::new(HttpVerb::Get, "/api/me", vec!["Users".to_string()]);

        let (synthesized, _) = synthesize_with(&config, &types, descriptor, metadata);
        assert!(synthesized.operation.security.is_none());
    }

    #[test]
    fn test_summary_from_metadata_wins() {
        let config = DocsConfig::default();
        let types = empty_types();
        let mut descriptor = RouteDescriptor::new(HttpVerb::Get, "/api/users");
        descriptor.name = Some("list".to_string());
        let mut metadata =
            OperationMetadata::new(HttpVerb::Get, "/api/users", vec!["Users".to_string()]);
        metadata.summary = Some("Every user we know about".to_string());

        let (synthesized, _) = synthesize_with(&config, &types, descriptor, metadata);
        assert_eq!(
            synthesized.operation.summary.as_deref(),
            Some("Every user we know about")
        );
    }

    #[test]
    fn test_summary_humanization() {
        assert_eq!(humanize_handler_name("list"), "List all");
        assert_eq!(humanize_handler_name("create"), "Create new");
        assert_eq!(humanize_handler_name("get"), "Get");
        assert_eq!(humanize_handler_name("update"), "Update");
        assert_eq!(humanize_handler_name("delete"), "Delete");
        assert_eq!(humanize_handler_name("listUserPosts"), "List user posts");
        assert_eq!(humanize_handler_name("export_report"), "Export report");
    }

    #[test]
    fn test_missing_parameter_type_is_unresolvable_handler() {
        let config = DocsConfig::default();
        let types = empty_types();
        let mut descriptor = RouteDescriptor::new(HttpVerb::Post, "/api/users");
        descriptor.params.push(HandlerParam::new(
            "request",
            ParamKind::Structured("Ghost".to_string()),
        ));
        let metadata = OperationMetadata::new(HttpVerb::Post, "/api/users", vec!["Users".to_string()]);

        let synthesizer = OperationSynthesizer::new(&config, &types);
        let mut components = ComponentRegistry::new();
        let result = synthesizer.synthesize(&descriptor, &metadata, &mut components);

        assert!(matches!(result, Err(Error::UnresolvableHandler { .. })));
    }

    #[test]
    fn test_missing_response_model_is_invalid_schema_source() {
        let config = DocsConfig::default();
        let types = empty_types();
        let descriptor = RouteDescriptor::new(HttpVerb::Get, "/api/users");
        let mut metadata =
            OperationMetadata::new(HttpVerb::Get, "/api/users", vec!["Users".to_string()]);
        metadata.response_model = Some("Ghost".to_string());

        let synthesizer = OperationSynthesizer::new(&config, &types);
        let mut components = ComponentRegistry::new();
        let result = synthesizer.synthesize(&descriptor, &metadata, &mut components);

        assert!(matches!(result, Err(Error::InvalidSchemaSource { .. })));
    }

    #[test]
    fn test_extract_placeholders() {
        assert_eq!(
            extract_placeholders("/api/users/{id}/posts/{postId}"),
            vec!["id".to_string(), "postId".to_string()]
        );
        assert!(extract_placeholders("/api/users").is_empty());
    }

    #[test]
    fn test_snake_normalize_both_directions() {
        assert_eq!(snake_normalize("postId"), "post_id");
        assert_eq!(snake_normalize("post_id"), "post_id");
        assert_eq!(snake_normalize("PostId"), "post_id");
    }

    #[test]
    fn test_infer_binary_content_type() {
        assert_eq!(
            infer_binary_content_type(Some("Allowed mime types: jpg, png")),
            "image/jpeg"
        );
        assert_eq!(
            infer_binary_content_type(Some("File upload (Allowed mime types: pdf)")),
            "application/pdf"
        );
        assert_eq!(
            infer_binary_content_type(Some("Image file upload")),
            "image/*"
        );
        assert_eq!(
            infer_binary_content_type(Some("some attachment")),
            "application/octet-stream"
        );
        assert_eq!(infer_binary_content_type(None), "application/octet-stream");
    }
}
