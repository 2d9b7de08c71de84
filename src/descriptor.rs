//! Route and type descriptors supplied by the router layer.
//!
//! The router registers one [`RouteInfo`] per route. Request, params and
//! response types are described explicitly with [`TypeDescriptor`]s, so the
//! schema side never depends on runtime reflection of the handler's types.
//!
//! # Example
//!
//! ```
//! use openapi_from_handlers::descriptor::{
//!     FieldDescriptor, FieldKind, HttpMethod, ParamLocation, RouteInfo, TypeDescriptor,
//! };
//! use openapi_from_handlers::identity::HandlerRef;
//!
//! let params = TypeDescriptor::new("GetUserParams")
//!     .field(FieldDescriptor::new("id", FieldKind::Integer).located(ParamLocation::Path));
//!
//! let route = RouteInfo::new(HttpMethod::Get, "/users/{id}", HandlerRef::named("app::users::get_user"))
//!     .with_params(params);
//! assert!(route.response.is_none());
//! ```

use crate::identity::HandlerRef;
use crate::security::AuthHandler;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default media type for request and response bodies
pub const DEFAULT_MEDIA_TYPE: &str = "application/json";

/// Type name the router uses for handlers that return no body
pub const NO_BODY: &str = "NoBody";

/// Everything the router knows about one registered route.
#[derive(Debug, Clone, Deserialize)]
pub struct RouteInfo {
    /// HTTP method of the route
    pub method: HttpMethod,
    /// Path template (e.g. "/users/{id}" or "/users/:id")
    pub path: String,
    /// Identity of the bound handler
    pub handler: HandlerRef,
    /// Request body type, if the route accepts one
    #[serde(default)]
    pub request: Option<TypeDescriptor>,
    /// Path/query/header/cookie parameters type
    #[serde(default)]
    pub params: Option<TypeDescriptor>,
    /// Response body type; `None` means the handler returns no body
    #[serde(default)]
    pub response: Option<TypeDescriptor>,
    /// Media type of the request body
    #[serde(default = "default_media_type")]
    pub consumes: String,
    /// Media type of the response body
    #[serde(default = "default_media_type")]
    pub produces: String,
    /// Authentication handler guarding the route
    #[serde(default)]
    pub auth: Option<AuthHandler>,
}

fn default_media_type() -> String {
    DEFAULT_MEDIA_TYPE.to_string()
}

impl RouteInfo {
    /// Create a route with JSON media types and no typed payloads
    pub fn new(method: HttpMethod, path: impl Into<String>, handler: HandlerRef) -> Self {
        Self {
            method,
            path: path.into(),
            handler,
            request: None,
            params: None,
            response: None,
            consumes: default_media_type(),
            produces: default_media_type(),
            auth: None,
        }
    }

    pub fn with_request(mut self, request: TypeDescriptor) -> Self {
        self.request = Some(request);
        self
    }

    pub fn with_params(mut self, params: TypeDescriptor) -> Self {
        self.params = Some(params);
        self
    }

    /// Sets the response type. A descriptor named `NoBody` is treated as no body.
    pub fn with_response(mut self, response: TypeDescriptor) -> Self {
        self.response = (response.name != NO_BODY).then_some(response);
        self
    }

    pub fn with_media_types(mut self, consumes: impl Into<String>, produces: impl Into<String>) -> Self {
        self.consumes = consumes.into();
        self.produces = produces.into();
        self
    }

    pub fn with_auth(mut self, auth: AuthHandler) -> Self {
        self.auth = Some(auth);
        self
    }

    /// The response body type, ignoring an explicit `NoBody` descriptor
    pub fn response_body(&self) -> Option<&TypeDescriptor> {
        self.response.as_ref().filter(|t| t.name != NO_BODY)
    }
}

/// HTTP methods a route can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Options,
    Head,
    Trace,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Head => "HEAD",
            HttpMethod::Trace => "TRACE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "DELETE" => Ok(HttpMethod::Delete),
            "PATCH" => Ok(HttpMethod::Patch),
            "OPTIONS" => Ok(HttpMethod::Options),
            "HEAD" => Ok(HttpMethod::Head),
            "TRACE" => Ok(HttpMethod::Trace),
            other => Err(format!("unsupported HTTP method: {}", other)),
        }
    }
}

impl TryFrom<String> for HttpMethod {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<HttpMethod> for String {
    fn from(method: HttpMethod) -> Self {
        method.as_str().to_string()
    }
}

/// Explicit description of a request, params or response type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    /// Schema name used under `components.schemas`
    pub name: String,
    /// Fields in declaration order
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
}

impl TypeDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Descriptor for handlers that return no body
    pub fn no_body() -> Self {
        Self::new(NO_BODY)
    }

    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }
}

/// One field of a described type, with its validation expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Serialized field name
    pub name: String,
    /// Declared kind of the field; `array` and `object` are single-key maps in YAML
    #[serde(with = "serde_yaml::with::singleton_map")]
    pub kind: FieldKind,
    /// Where the field is read from when the type is a params type
    #[serde(default, rename = "in", skip_serializing_if = "Option::is_none")]
    pub location: Option<ParamLocation>,
    /// Comma-separated validation clauses, e.g. `required,min=2,max=10`
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub validate: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            location: None,
            validate: String::new(),
            description: None,
        }
    }

    pub fn validate(mut self, clauses: impl Into<String>) -> Self {
        self.validate = clauses.into();
        self
    }

    pub fn located(mut self, location: ParamLocation) -> Self {
        self.location = Some(location);
        self
    }

    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Declared kind of a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    String,
    Integer,
    Number,
    Boolean,
    /// A sequence of items of the given kind
    Array(#[serde(with = "serde_yaml::with::singleton_map")] Box<FieldKind>),
    /// A nested object, registered as its own component schema
    Object(Box<TypeDescriptor>),
}

/// Where a params field is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamLocation {
    Path,
    Query,
    Header,
    Cookie,
}

impl ParamLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamLocation::Path => "path",
            ParamLocation::Query => "query",
            ParamLocation::Header => "header",
            ParamLocation::Cookie => "cookie",
        }
    }
}

/// Implemented by types that can describe their own schema.
///
/// ```
/// use openapi_from_handlers::descriptor::{Describe, FieldDescriptor, FieldKind, TypeDescriptor};
///
/// struct CreateUser;
///
/// impl Describe for CreateUser {
///     fn describe() -> TypeDescriptor {
///         TypeDescriptor::new("CreateUser")
///             .field(FieldDescriptor::new("name", FieldKind::String).validate("required,min=2"))
///     }
/// }
///
/// assert_eq!(CreateUser::describe().fields.len(), 1);
/// ```
pub trait Describe {
    fn describe() -> TypeDescriptor;
}
