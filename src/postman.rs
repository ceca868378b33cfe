//! Projects an assembled OpenAPI document into a Postman Collection v2.1,
//! plus the companion environment/globals variable export.
//!
//! The projector treats the document as an opaque input contract: it only
//! reads paths, operations, and the component registry (for `$ref`
//! resolution while synthesizing example bodies). Request URLs are templated
//! against a single base-URL variable; a collection-level pre-request script
//! derives protocol/host/port/base-path helpers from it at runtime.

use chrono::Utc;
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use url::Url;

use crate::config::DocsConfig;
use crate::document::{OpenApiDocument, Operation};
use crate::registry::HttpVerb;
use crate::schema::SchemaNode;

const COLLECTION_SCHEMA_URL: &str =
    "https://schema.getpostman.com/json/collection/v2.1.0/collection.json";

/// Guard against cyclic `$ref` chains while walking schemas for examples
const MAX_EXAMPLE_DEPTH: usize = 16;

/// Optional tag/path/method filters for the export endpoints. An empty
/// filter exports everything; a filter matching nothing yields a
/// structurally valid, empty collection.
#[derive(Debug, Clone, Default)]
pub struct ExportFilter {
    pub tag: Option<String>,
    pub path: Option<String>,
    pub method: Option<String>,
}

impl ExportFilter {
    pub fn none() -> Self {
        Self::default()
    }
}

/// Postman collection info block
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionInfo {
    #[serde(rename = "_postman_id")]
    pub postman_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub schema: String,
}

/// Collection-level event (the pre-request script)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub listen: String,
    pub script: Script,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Script {
    #[serde(rename = "type")]
    pub script_type: String,
    pub exec: Vec<String>,
}

/// Collection-level bearer auth referencing the token variable
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionAuth {
    #[serde(rename = "type")]
    pub auth_type: String,
    pub bearer: Vec<AuthParam>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthParam {
    pub key: String,
    pub value: String,
    #[serde(rename = "type")]
    pub param_type: String,
}

/// One tag-named folder of request items
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagFolder {
    pub name: String,
    pub item: Vec<RequestItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestItem {
    pub name: String,
    pub request: RequestSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestSpec {
    pub method: String,
    pub header: Vec<Header>,
    pub url: RequestUrl,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<RequestBodySpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Header {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestUrl {
    pub raw: String,
    pub host: Vec<String>,
    pub path: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub variable: Vec<UrlVariable>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrlVariable {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestBodySpec {
    pub mode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formdata: Option<Vec<FormParam>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<BodyOptions>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormParam {
    pub key: String,
    #[serde(rename = "type")]
    pub param_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(rename = "contentType", skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BodyOptions {
    pub raw: RawOptions,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawOptions {
    pub language: String,
}

/// The complete collection export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostmanCollection {
    pub info: CollectionInfo,
    pub event: Vec<Event>,
    pub auth: CollectionAuth,
    pub item: Vec<TagFolder>,
}

/// Variable scope of an environment export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableScope {
    Environment,
    Globals,
}

impl VariableScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            VariableScope::Environment => "environment",
            VariableScope::Globals => "globals",
        }
    }
}

/// The environment/globals variable export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostmanEnvironment {
    pub id: String,
    pub name: String,
    pub values: Vec<EnvironmentValue>,
    #[serde(rename = "_postman_variable_scope")]
    pub variable_scope: String,
    #[serde(rename = "_postman_exported_at")]
    pub exported_at: String,
    #[serde(rename = "_postman_exported_using")]
    pub exported_using: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentValue {
    pub key: String,
    pub value: String,
    pub enabled: bool,
}

/// Project an OpenAPI document into a Postman collection, keeping only the
/// path × verb × tag combinations the filter admits. An operation under
/// multiple tags is duplicated once per tag folder.
pub fn project(
    doc: &OpenApiDocument,
    config: &DocsConfig,
    filter: &ExportFilter,
) -> PostmanCollection {
    debug!("Projecting OpenAPI document into Postman collection");

    let mut folders: IndexMap<String, Vec<RequestItem>> = IndexMap::new();

    for (path, path_item) in &doc.paths {
        if let Some(path_filter) = &filter.path {
            if path != path_filter {
                continue;
            }
        }

        for (verb, operation) in path_item.operations() {
            if let Some(method_filter) = &filter.method {
                if !method_filter.eq_ignore_ascii_case(verb.as_str()) {
                    continue;
                }
            }

            let tags = if operation.tags.is_empty() {
                vec!["Default".to_string()]
            } else {
                operation.tags.clone()
            };

            for tag in tags {
                if let Some(tag_filter) = &filter.tag {
                    if &tag != tag_filter {
                        continue;
                    }
                }

                folders
                    .entry(tag)
                    .or_default()
                    .push(build_request_item(path, verb, operation, doc, config));
            }
        }
    }

    PostmanCollection {
        info: CollectionInfo {
            postman_id: stable_id(&config.title),
            name: config.title.clone(),
            description: if config.description.is_empty() {
                None
            } else {
                Some(config.description.clone())
            },
            schema: COLLECTION_SCHEMA_URL.to_string(),
        },
        event: vec![Event {
            listen: "prerequest".to_string(),
            script: Script {
                script_type: "text/javascript".to_string(),
                exec: prerequest_script(&config.postman.base_url_variable),
            },
        }],
        auth: CollectionAuth {
            auth_type: "bearer".to_string(),
            bearer: vec![AuthParam {
                key: "token".to_string(),
                value: format!("{{{{{}}}}}", config.postman.token_variable),
                param_type: "string".to_string(),
            }],
        },
        item: folders
            .into_iter()
            .map(|(name, item)| TagFolder { name, item })
            .collect(),
    }
}

/// Export the fixed variable set backing the collection's templated URLs,
/// derived by parsing the configured base URL. Unparseable URL components
/// degrade to empty-string values rather than failing the export.
pub fn environment(config: &DocsConfig, scope: VariableScope) -> PostmanEnvironment {
    let base_url = config.postman_base_url();
    let (protocol, host, port, port_suffix, base_path) = split_base_url(base_url);

    let values = vec![
        (config.postman.base_url_variable.clone(), base_url.to_string()),
        ("protocol".to_string(), protocol),
        ("host".to_string(), host),
        ("port".to_string(), port),
        ("port_suffix".to_string(), port_suffix),
        ("base_path".to_string(), base_path),
        (
            config.postman.token_variable.clone(),
            config.postman.token.clone(),
        ),
    ];

    PostmanEnvironment {
        id: stable_id(&format!(
            "{}:{}",
            config.postman.environment_name,
            scope.as_str()
        )),
        name: config.postman.environment_name.clone(),
        values: values
            .into_iter()
            .map(|(key, value)| EnvironmentValue {
                key,
                value,
                enabled: true,
            })
            .collect(),
        variable_scope: scope.as_str().to_string(),
        exported_at: Utc::now().to_rfc3339(),
        exported_using: format!("openapi-from-routes/{}", env!("CARGO_PKG_VERSION")),
    }
}

fn build_request_item(
    path: &str,
    verb: HttpVerb,
    operation: &Operation,
    doc: &OpenApiDocument,
    config: &DocsConfig,
) -> RequestItem {
    let name = operation
        .summary
        .clone()
        .unwrap_or_else(|| format!("{} {}", verb.as_str(), path));

    let url = build_request_url(path, &config.postman.base_url_variable);

    let mut headers = vec![Header {
        key: "Accept".to_string(),
        value: "application/json".to_string(),
    }];

    let body = operation.request_body.as_ref().and_then(|request_body| {
        let (content_type, media) = request_body.content.iter().next()?;

        if content_type.contains("form-data") {
            let resolved = resolve_schema(&media.schema, doc);
            let mut fields = Vec::new();
            if let Some(properties) = &resolved.properties {
                for (field_name, property) in properties {
                    if property.is_binary() {
                        fields.push(FormParam {
                            key: field_name.clone(),
                            param_type: "file".to_string(),
                            value: None,
                            content_type: media
                                .encoding
                                .as_ref()
                                .and_then(|e| e.get(field_name))
                                .map(|e| e.content_type.clone()),
                        });
                    } else {
                        let example = synthesize_example(property, doc, 0);
                        fields.push(FormParam {
                            key: field_name.clone(),
                            param_type: "text".to_string(),
                            value: Some(stringify_example(&example)),
                            content_type: None,
                        });
                    }
                }
            }
            Some(RequestBodySpec {
                mode: "formdata".to_string(),
                raw: None,
                formdata: Some(fields),
                options: None,
            })
        } else {
            headers.push(Header {
                key: "Content-Type".to_string(),
                value: content_type.clone(),
            });
            let example = synthesize_example(&media.schema, doc, 0);
            Some(RequestBodySpec {
                mode: "raw".to_string(),
                raw: serde_json::to_string_pretty(&example).ok(),
                formdata: None,
                options: Some(BodyOptions {
                    raw: RawOptions {
                        language: "json".to_string(),
                    },
                }),
            })
        }
    });

    RequestItem {
        name,
        request: RequestSpec {
            method: verb.as_str().to_string(),
            header: headers,
            url,
            body,
        },
    }
}

/// Build the templated request URL: the leading literal `api` segment is
/// stripped (the UI mounts under it already) and `{name}` placeholders are
/// rewritten to Postman's `:name` form.
fn build_request_url(path: &str, base_url_variable: &str) -> RequestUrl {
    let mut segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.first() == Some(&"api") {
        segments.remove(0);
    }

    let mut variables = Vec::new();
    let path_segments: Vec<String> = segments
        .iter()
        .map(|segment| {
            if segment.starts_with('{') && segment.ends_with('}') {
                let name = &segment[1..segment.len() - 1];
                variables.push(UrlVariable {
                    key: name.to_string(),
                    value: String::new(),
                });
                format!(":{}", name)
            } else {
                segment.to_string()
            }
        })
        .collect();

    let host = format!("{{{{{}}}}}", base_url_variable);
    let raw = if path_segments.is_empty() {
        host.clone()
    } else {
        format!("{}/{}", host, path_segments.join("/"))
    };

    RequestUrl {
        raw,
        host: vec![host],
        path: path_segments,
        variable: variables,
    }
}

/// Follow one level of `$ref` into the component registry.
fn resolve_schema<'a>(schema: &'a SchemaNode, doc: &'a OpenApiDocument) -> &'a SchemaNode {
    match schema.reference_target().and_then(|name| doc.schema(name)) {
        Some(resolved) => resolved,
        None => schema,
    }
}

/// Walk a schema into an example payload. Declared `example` literals win;
/// otherwise each primitive kind gets an empty-ish default and objects are
/// walked field by field.
fn synthesize_example(schema: &SchemaNode, doc: &OpenApiDocument, depth: usize) -> Value {
    if depth > MAX_EXAMPLE_DEPTH {
        return Value::Object(serde_json::Map::new());
    }

    if let Some(name) = schema.reference_target() {
        return match doc.schema(name) {
            Some(resolved) => synthesize_example(resolved, doc, depth + 1),
            None => Value::Object(serde_json::Map::new()),
        };
    }

    if let Some(example) = &schema.example {
        return example.clone();
    }

    match schema.schema_type.as_deref() {
        Some("string") => Value::String("string".to_string()),
        Some("integer") => Value::from(0),
        Some("number") => Value::from(0.0),
        Some("boolean") => Value::Bool(true),
        Some("array") => {
            let item = match &schema.items {
                Some(items) => synthesize_example(items, doc, depth + 1),
                None => Value::String("string".to_string()),
            };
            Value::Array(vec![item])
        }
        _ => {
            let mut map = serde_json::Map::new();
            if let Some(properties) = &schema.properties {
                for (name, property) in properties {
                    map.insert(name.clone(), synthesize_example(property, doc, depth + 1));
                }
            }
            Value::Object(map)
        }
    }
}

/// Render an example value as a form-field string
fn stringify_example(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn prerequest_script(base_url_variable: &str) -> Vec<String> {
    vec![
        format!(
            "const baseUrl = pm.variables.get('{}') || '';",
            base_url_variable
        ),
        "try {".to_string(),
        "    const parsed = new URL(baseUrl);".to_string(),
        "    pm.variables.set('protocol', parsed.protocol.replace(':', ''));".to_string(),
        "    pm.variables.set('host', parsed.hostname);".to_string(),
        "    pm.variables.set('port', parsed.port);".to_string(),
        "    pm.variables.set('base_path', parsed.pathname.replace(/\\/$/, ''));".to_string(),
        "} catch (e) {".to_string(),
        "    // helpers stay unset when the base URL does not parse".to_string(),
        "}".to_string(),
    ]
}

/// Decompose a base URL into the fixed environment-variable components.
/// The port is only populated when explicit in the URL; everything degrades
/// to empty strings when the URL does not parse.
fn split_base_url(raw: &str) -> (String, String, String, String, String) {
    match Url::parse(raw) {
        Ok(url) => {
            let protocol = url.scheme().to_string();
            let host = url.host_str().unwrap_or("").to_string();
            let port = url.port().map(|p| p.to_string()).unwrap_or_default();
            let port_suffix = if port.is_empty() {
                String::new()
            } else {
                format!(":{}", port)
            };
            let base_path = url.path().trim_end_matches('/').to_string();
            (protocol, host, port, port_suffix, base_path)
        }
        Err(_) => (
            String::new(),
            String::new(),
            String::new(),
            String::new(),
            String::new(),
        ),
    }
}

/// Derive a UUID-shaped id from a seed, stable across exports of the same
/// collection or environment name.
fn stable_id(seed: &str) -> String {
    let digest = Sha256::digest(seed.as_bytes());
    let hex: String = digest.iter().take(16).map(|b| format!("{:02x}", b)).collect();
    format!(
        "{}-{}-{}-{}-{}",
        &hex[0..8],
        &hex[8..12],
        &hex[12..16],
        &hex[16..20],
        &hex[20..32]
    )
}
