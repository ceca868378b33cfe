//! Walks the full route registry and assembles the OpenAPI document.
//!
//! Assembly is best-effort: routes without metadata are undocumented by
//! design and silently skipped, and any per-route synthesis failure is
//! contained at that route's boundary so one bad entry never costs the whole
//! document. Each call builds a fresh document over the registry as it
//! currently stands; nothing is cached between calls.

use log::{debug, warn};
use std::collections::HashMap;

use crate::config::DocsConfig;
use crate::document::{Components, Info, OpenApiDocument, PathItem, Server};
use crate::operation::{ComponentRegistry, OperationSynthesizer};
use crate::registry::RouteRegistry;

/// Assemble an OpenAPI document from every documented route in the registry.
pub fn assemble(registry: &RouteRegistry, config: &DocsConfig) -> OpenApiDocument {
    debug!("Assembling OpenAPI document over {} routes", registry.routes.len());

    let synthesizer = OperationSynthesizer::new(config, &registry.types);
    let mut components = ComponentRegistry::new();
    let mut paths: std::collections::BTreeMap<String, PathItem> = std::collections::BTreeMap::new();
    // Raw-URI length of the entry currently holding each (path, verb) slot;
    // on collision the more specific (longer) route wins
    let mut slot_sources: HashMap<(String, &'static str), usize> = HashMap::new();

    for entry in &registry.routes {
        let Some(metadata) = &entry.metadata else {
            debug!(
                "Skipping undocumented route: {} {}",
                entry.descriptor.verb.as_str(),
                entry.descriptor.uri
            );
            continue;
        };

        match synthesizer.synthesize(&entry.descriptor, metadata, &mut components) {
            Ok(synthesized) => {
                let slot = (synthesized.path.clone(), synthesized.verb.as_key());
                let uri_len = entry.descriptor.uri.len();
                if let Some(&existing_len) = slot_sources.get(&slot) {
                    if uri_len <= existing_len {
                        debug!(
                            "Keeping existing operation for {} {} (more specific route)",
                            synthesized.verb.as_str(),
                            synthesized.path
                        );
                        continue;
                    }
                }
                slot_sources.insert(slot, uri_len);

                paths
                    .entry(synthesized.path)
                    .or_default()
                    .set_operation(synthesized.verb, synthesized.operation);
            }
            Err(e) => {
                warn!(
                    "Skipping route {} {}: {}",
                    entry.descriptor.verb.as_str(),
                    entry.descriptor.uri,
                    e
                );
            }
        }
    }

    OpenApiDocument {
        openapi: "3.0.0".to_string(),
        info: Info {
            title: config.title.clone(),
            version: config.version.clone(),
            description: if config.description.is_empty() {
                None
            } else {
                Some(config.description.clone())
            },
        },
        servers: vec![Server {
            url: config.base_url.clone(),
        }],
        paths,
        components: Components {
            schemas: components.into_schemas(),
            security_schemes: config.security_schemes.clone(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{
        HandlerParam, HttpVerb, OperationMetadata, ParamKind, RouteDescriptor, RouteEntry,
        RuleValue, SchemaSource, TypedField,
    };
    use indexmap::IndexMap;

    fn fixture_registry() -> RouteRegistry {
        let mut registry = RouteRegistry::new();

        registry.add_type(
            "UserResponse",
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
            RuleValue::Joined("required|string|min:3|max:50".to_string()),
        );
        rules.insert(
            "email".to_string(),
            RuleValue::Joined("required|email".to_string()),
        );
        registry.add_type(
            "CreateUserRequest",
            SchemaSource::RuleBased {
                rules,
                overlay: IndexMap::new(),
            },
        );

        let mut list = RouteDescriptor::new(HttpVerb::Get, "/api/users");
        list.name = Some("list".to_string());
        registry.add_route(RouteEntry::documented(
            list,
            OperationMetadata::new(HttpVerb::Get, "/api/users", vec!["Users".to_string()]),
        ));

        let mut create = RouteDescriptor::new(HttpVerb::Post, "/api/users");
        create.params.push(HandlerParam::new(
            "request",
            ParamKind::Structured("CreateUserRequest".to_string()),
        ));
        let mut create_meta =
            OperationMetadata::new(HttpVerb::Post, "/api/users", vec!["Users".to_string()]);
        create_meta.response_model = Some("UserResponse".to_string());
        create_meta.response_status = Some(201);
        registry.add_route(RouteEntry::documented(create, create_meta));

        let mut show = RouteDescriptor::new(HttpVerb::Get, "/api/users/{id}");
        show.params.push(HandlerParam::new("id", ParamKind::Int));
        let mut show_meta =
            OperationMetadata::new(HttpVerb::Get, "/api/users/{id}", vec!["Users".to_string()]);
        show_meta.response_model = Some("UserResponse".to_string());
        registry.add_route(RouteEntry::documented(show, show_meta));

        registry.add_route(RouteEntry::undocumented(RouteDescriptor::new(
            HttpVerb::Get,
            "/internal/health",
        )));

        registry
    }

    #[test]
    fn test_assemble_walks_documented_routes() {
        let registry = fixture_registry();
        let document = assemble(&registry, &DocsConfig::default());

        assert_eq!(document.openapi, "3.0.0");
        assert_eq!(document.paths.len(), 2);
        assert!(document.paths.contains_key("/api/users"));
        assert!(document.paths.contains_key("/api/users/{id}"));

        let users = &document.paths["/api/users"];
        assert!(users.get.is_some());
        assert!(users.post.is_some());
    }

    #[test]
    fn test_undocumented_route_silently_skipped() {
        let registry = fixture_registry();
        let document = assemble(&registry, &DocsConfig::default());

        assert!(!document.paths.contains_key("/internal/health"));
    }

    #[test]
    fn test_components_registered_once() {
        let registry = fixture_registry();
        let document = assemble(&registry, &DocsConfig::default());

        // UserResponse referenced by two routes registers a single entry
        assert_eq!(document.components.schemas.len(), 2);
        assert!(document.components.schemas.contains_key("UserResponse"));
        assert!(document.components.schemas.contains_key("CreateUserRequest"));
    }

    #[test]
    fn test_security_schemes_passed_through() {
        let registry = fixture_registry();
        let document = assemble(&registry, &DocsConfig::default());

        assert!(document
            .components
            .security_schemes
            .contains_key("bearerAuth"));
    }

    #[test]
    fn test_bad_route_does_not_abort_assembly() {
        let mut registry = fixture_registry();
        let mut broken = RouteDescriptor::new(HttpVerb::Post, "/api/broken");
        broken.params.push(HandlerParam::new(
            "request",
            ParamKind::Structured("MissingType".to_string()),
        ));
        registry.add_route(RouteEntry::documented(
            broken,
            OperationMetadata::new(HttpVerb::Post, "/api/broken", vec!["Broken".to_string()]),
        ));

        let document = assemble(&registry, &DocsConfig::default());

        assert!(!document.paths.contains_key("/api/broken"));
        // The rest of the document is intact
        assert_eq!(document.paths.len(), 2);
    }

    #[test]
    fn test_collision_prefers_longer_route_uri() {
        let mut registry = RouteRegistry::new();

        let mut short = RouteDescriptor::new(HttpVerb::Get, "/u");
        short.name = Some("shortHandler".to_string());
        registry.add_route(RouteEntry::documented(
            short,
            OperationMetadata::new(HttpVerb::Get, "/api/users", vec!["Users".to_string()]),
        ));

        let mut long = RouteDescriptor::new(HttpVerb::Get, "/api/v1/users");
        long.name = Some("longHandler".to_string());
        registry.add_route(RouteEntry::documented(
            long,
            OperationMetadata::new(HttpVerb::Get, "/api/users", vec!["Users".to_string()]),
        ));

        let document = assemble(&registry, &DocsConfig::default());
        let operation = document.paths["/api/users"].get.as_ref().unwrap();
        assert_eq!(operation.summary.as_deref(), Some("Long handler"));
    }

    #[test]
    fn test_collision_keeps_winner_when_shorter_arrives_later() {
        let mut registry = RouteRegistry::new();

        let mut long = RouteDescriptor::new(HttpVerb::Get, "/api/v1/users");
        long.name = Some("longHandler".to_string());
        registry.add_route(RouteEntry::documented(
            long,
            OperationMetadata::new(HttpVerb::Get, "/api/users", vec!["Users".to_string()]),
        ));

        let mut short = RouteDescriptor::new(HttpVerb::Get, "/u");
        short.name = Some("shortHandler".to_string());
        registry.add_route(RouteEntry::documented(
            short,
            OperationMetadata::new(HttpVerb::Get, "/api/users", vec!["Users".to_string()]),
        ));

        let document = assemble(&registry, &DocsConfig::default());
        let operation = document.paths["/api/users"].get.as_ref().unwrap();
        assert_eq!(operation.summary.as_deref(), Some("Long handler"));
    }

    #[test]
    fn test_deterministic_across_route_order() {
        let registry = fixture_registry();
        let document_a = assemble(&registry, &DocsConfig::default());

        let mut reversed = fixture_registry();
        reversed.routes.reverse();
        let document_b = assemble(&reversed, &DocsConfig::default());

        let json_a = serde_json::to_string(&document_a).unwrap();
        let json_b = serde_json::to_string(&document_b).unwrap();
        assert_eq!(json_a, json_b);
    }

    #[test]
    fn test_info_block_from_config() {
        let mut config = DocsConfig::default();
        config.title = "Pet Store".to_string();
        config.version = "2.1.0".to_string();
        config.description = "All the pets".to_string();
        config.base_url = "https://pets.example.com".to_string();

        let document = assemble(&RouteRegistry::new(), &config);

        assert_eq!(document.info.title, "Pet Store");
        assert_eq!(document.info.version, "2.1.0");
        assert_eq!(document.info.description.as_deref(), Some("All the pets"));
        assert_eq!(document.servers[0].url, "https://pets.example.com");
    }
}
