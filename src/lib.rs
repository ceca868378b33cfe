//! OpenAPI from Routes - Runtime API documentation from a declared route registry.
//!
//! This library synthesizes an OpenAPI 3.0 document from an explicit registry
//! of HTTP routes and handler metadata, then optionally projects that
//! document into Postman Collection v2.1 and environment exports. The
//! registry is plain data: a host application (or a build-time scan step)
//! declares its endpoints, structured input/output types, and per-handler
//! annotations, and every generation call walks that data fresh.
//!
//! # Architecture
//!
//! The library is organized into several modules that work together:
//!
//! 1. [`registry`] - The route/type registry and its versioned snapshot format
//! 2. [`config`] - Static configuration: info block, security schemes, Postman variables
//! 3. [`rule_schema`] - Compiles flat validation-rule maps into nested schemas
//! 4. [`type_schema`] - Compiles registered structured types into schemas
//! 5. [`operation`] - Synthesizes one OpenAPI operation per documented route
//! 6. [`assembler`] - Walks the registry and assembles the complete document
//! 7. [`postman`] - Projects the document into Postman collection/environment exports
//! 8. [`serializer`] - Serializes any export to YAML or JSON
//!
//! # Example Usage
//!
//! ```no_run
//! use openapi_from_routes::{
//!     assembler::assemble,
//!     config::DocsConfig,
//!     registry::{
//!         HandlerParam, HttpVerb, OperationMetadata, ParamKind, RouteDescriptor,
//!         RouteEntry, RouteRegistry,
//!     },
//!     serializer::serialize_yaml,
//! };
//!
//! // Declare the routes the application registered
//! let mut registry = RouteRegistry::new();
//! let mut descriptor = RouteDescriptor::new(HttpVerb::Get, "/api/users/{id}");
//! descriptor.params.push(HandlerParam::new("id", ParamKind::Int));
//! registry.add_route(RouteEntry::documented(
//!     descriptor,
//!     OperationMetadata::new(HttpVerb::Get, "/api/users/{id}", vec!["Users".to_string()]),
//! ));
//!
//! // Assemble the OpenAPI document
//! let document = assemble(&registry, &DocsConfig::default());
//!
//! // Serialize to YAML
//! let yaml = serialize_yaml(&document).unwrap();
//! println!("{}", yaml);
//! ```
//!
//! # Command-Line Interface
//!
//! For command-line usage over registry snapshot files, see the [`cli`]
//! module which provides a complete CLI application.

pub mod assembler;
pub mod cli;
pub mod config;
pub mod document;
pub mod error;
pub mod operation;
pub mod postman;
pub mod registry;
pub mod rule_schema;
pub mod schema;
pub mod serializer;
pub mod type_schema;
