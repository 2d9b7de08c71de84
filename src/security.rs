//! Security schemes attached to authenticated routes.
//!
//! A route guarded by an [`AuthHandler`] references the handler's scheme by
//! name. The scheme is registered once under `components.securitySchemes`,
//! however many routes share the handler.

use serde::{Deserialize, Serialize};

/// Default header carrying an API key
pub const DEFAULT_API_KEY_NAME: &str = "X-API-Key";

/// Default session cookie name
pub const DEFAULT_SESSION_COOKIE: &str = "session";

/// An authentication handler as registered with the router.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthHandler {
    /// Declared name, used as the security scheme key (e.g. "BearerAuth")
    pub name: String,
    pub scheme: SecurityScheme,
}

impl AuthHandler {
    pub fn new(name: impl Into<String>, scheme: SecurityScheme) -> Self {
        Self {
            name: name.into(),
            scheme,
        }
    }
}

/// Authentication mechanism of an [`AuthHandler`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SecurityScheme {
    /// HTTP basic authentication
    Basic,
    /// API key sent in a header, query parameter or cookie
    ApiKey {
        #[serde(default)]
        field: Option<String>,
        #[serde(default)]
        location: Option<ApiKeyLocation>,
    },
    /// HTTP bearer token
    Bearer {
        #[serde(default)]
        format: Option<String>,
    },
    /// Session identifier carried in a cookie
    SessionCookie {
        #[serde(default)]
        cookie: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiKeyLocation {
    Header,
    Query,
    Cookie,
}

impl ApiKeyLocation {
    fn as_str(&self) -> &'static str {
        match self {
            ApiKeyLocation::Header => "header",
            ApiKeyLocation::Query => "query",
            ApiKeyLocation::Cookie => "cookie",
        }
    }
}

/// OpenAPI Security Scheme object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecuritySchemeObject {
    #[serde(rename = "type")]
    pub scheme_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
    #[serde(rename = "bearerFormat", skip_serializing_if = "Option::is_none")]
    pub bearer_format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "in", skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl SecuritySchemeObject {
    fn new(scheme_type: &str) -> Self {
        Self {
            scheme_type: scheme_type.to_string(),
            scheme: None,
            bearer_format: None,
            name: None,
            location: None,
            description: None,
        }
    }
}

impl From<&SecurityScheme> for SecuritySchemeObject {
    fn from(scheme: &SecurityScheme) -> Self {
        match scheme {
            SecurityScheme::Basic => Self {
                scheme: Some("basic".to_string()),
                ..Self::new("http")
            },
            SecurityScheme::ApiKey { field, location } => Self {
                name: Some(field.clone().unwrap_or_else(|| DEFAULT_API_KEY_NAME.to_string())),
                location: Some(location.unwrap_or(ApiKeyLocation::Header).as_str().to_string()),
                ..Self::new("apiKey")
            },
            SecurityScheme::Bearer { format } => Self {
                scheme: Some("bearer".to_string()),
                bearer_format: format.clone(),
                ..Self::new("http")
            },
            SecurityScheme::SessionCookie { cookie } => Self {
                name: Some(cookie.clone().unwrap_or_else(|| DEFAULT_SESSION_COOKIE.to_string())),
                location: Some("cookie".to_string()),
                description: Some("Session cookie".to_string()),
                ..Self::new("apiKey")
            },
        }
    }
}
