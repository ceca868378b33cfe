//! Static documentation configuration: info-block values, security schemes,
//! middleware-to-scheme mapping, and Postman export variables.

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// One declared security scheme, passed through into
/// `components.securitySchemes` untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityScheme {
    #[serde(rename = "type")]
    pub scheme_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
    #[serde(rename = "bearerFormat", skip_serializing_if = "Option::is_none")]
    pub bearer_format: Option<String>,
    /// Location for apiKey schemes (header, query, cookie)
    #[serde(rename = "in", skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl SecurityScheme {
    /// The default bearer-JWT scheme
    pub fn bearer_jwt() -> Self {
        Self {
            scheme_type: "http".to_string(),
            scheme: Some("bearer".to_string()),
            bearer_format: Some("JWT".to_string()),
            location: None,
            name: None,
            description: Some("Enter JWT token (Bearer token)".to_string()),
        }
    }
}

/// Postman export settings: variable names and the values backing them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PostmanConfig {
    /// Variable name used in request URLs: `{{base_url}}/path`
    pub base_url_variable: String,
    /// Base URL value for environment exports; falls back to the top-level
    /// base URL when unset
    pub base_url: Option<String>,
    /// Variable name used for bearer auth: `{{token}}`
    pub token_variable: String,
    /// Token value for environment exports
    pub token: String,
    /// Environment/globals export display name
    pub environment_name: String,
}

impl Default for PostmanConfig {
    fn default() -> Self {
        Self {
            base_url_variable: "base_url".to_string(),
            base_url: None,
            token_variable: "token".to_string(),
            token: String::new(),
            environment_name: "API - Docs".to_string(),
        }
    }
}

/// Top-level documentation configuration.
///
/// Deserializable from YAML or JSON; every field has a default so a partial
/// config file (or none at all) still yields a working setup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocsConfig {
    /// API title for the info block
    pub title: String,
    /// API version for the info block
    pub version: String,
    /// API description for the info block
    pub description: String,
    /// Server base URL, emitted under `servers` and used for Postman exports
    pub base_url: String,
    /// Declared security schemes, keyed by scheme name
    pub security_schemes: BTreeMap<String, SecurityScheme>,
    /// Scheme names applied when an operation declares nothing and
    /// auto-detection finds nothing
    pub global_security: Vec<String>,
    /// Whether to infer schemes from route middleware identifiers
    pub auto_detect_security: bool,
    /// Middleware identifier → scheme name, scanned in declaration order
    pub middleware_security_map: IndexMap<String, String>,
    /// Postman export settings
    pub postman: PostmanConfig,
}

impl Default for DocsConfig {
    fn default() -> Self {
        let mut security_schemes = BTreeMap::new();
        security_schemes.insert("bearerAuth".to_string(), SecurityScheme::bearer_jwt());

        let mut middleware_security_map = IndexMap::new();
        for middleware in [
            "auth",
            "auth:sanctum",
            "auth:api",
            "jwt",
            "jwt.auth",
            "sanctum",
            "token",
        ] {
            middleware_security_map.insert(middleware.to_string(), "bearerAuth".to_string());
        }

        Self {
            title: "API Documentation".to_string(),
            version: "1.0.0".to_string(),
            description: String::new(),
            base_url: "http://localhost:8000".to_string(),
            security_schemes,
            global_security: Vec::new(),
            auto_detect_security: true,
            middleware_security_map,
            postman: PostmanConfig::default(),
        }
    }
}

impl DocsConfig {
    /// Load configuration from a YAML or JSON file, chosen by extension.
    pub fn load(path: &Path) -> Result<Self> {
        log::debug!("Loading documentation config from {}", path.display());
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))?,
            _ => serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display()))?,
        };

        Ok(config)
    }

    /// The base URL backing Postman exports
    pub fn postman_base_url(&self) -> &str {
        self.postman.base_url.as_deref().unwrap_or(&self.base_url)
    }
}
