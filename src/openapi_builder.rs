use crate::annotations::HandlerInfo;
use crate::descriptor::{HttpMethod, RouteInfo, DEFAULT_MEDIA_TYPE};
use crate::error::{Error, Result};
use crate::schema_generator::{in_type, Schema, SchemaGenerator};
use crate::security::{AuthHandler, SecuritySchemeObject};
use indexmap::IndexMap;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// OpenAPI version written to every document
pub const OPENAPI_VERSION: &str = "3.0.3";

/// Component name of the shared error body
pub const ERROR_SCHEMA: &str = "ErrorResponse";

/// Component name of one field-level validation failure
pub const VALIDATION_ERROR_SCHEMA: &str = "ValidationError";

/// Error responses every operation documents
const DEFAULT_ERRORS: [u16; 3] = [400, 422, 500];

/// Additional error responses of authenticated operations
const AUTH_ERRORS: [u16; 2] = [401, 403];

/// OpenAPI document builder
pub struct OpenApiBuilder {
    /// OpenAPI info section
    info: Info,
    /// Paths collection (URL path -> PathItem)
    paths: IndexMap<String, PathItem>,
    /// Component schemas
    schema_gen: SchemaGenerator,
    /// Security schemes keyed by auth handler name
    security_schemes: IndexMap<String, SecuritySchemeObject>,
    /// Operation ids handed out so far
    operation_ids: HashSet<String>,
}

/// OpenAPI Info object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Info {
    /// API title
    pub title: String,
    /// API version
    pub version: String,
    /// API description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// OpenAPI PathItem object - represents all operations for a single path
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<Operation>,
}

impl PathItem {
    /// The operation slot for `method`
    pub fn operation_mut(&mut self, method: HttpMethod) -> &mut Option<Operation> {
        match method {
            HttpMethod::Get => &mut self.get,
            HttpMethod::Put => &mut self.put,
            HttpMethod::Post => &mut self.post,
            HttpMethod::Delete => &mut self.delete,
            HttpMethod::Options => &mut self.options,
            HttpMethod::Head => &mut self.head,
            HttpMethod::Patch => &mut self.patch,
            HttpMethod::Trace => &mut self.trace,
        }
    }

    pub fn operation(&self, method: HttpMethod) -> Option<&Operation> {
        match method {
            HttpMethod::Get => self.get.as_ref(),
            HttpMethod::Put => self.put.as_ref(),
            HttpMethod::Post => self.post.as_ref(),
            HttpMethod::Delete => self.delete.as_ref(),
            HttpMethod::Options => self.options.as_ref(),
            HttpMethod::Head => self.head.as_ref(),
            HttpMethod::Patch => self.patch.as_ref(),
            HttpMethod::Trace => self.trace.as_ref(),
        }
    }
}

/// OpenAPI Operation object - represents a single API operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operation {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "operationId")]
    pub operation_id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<Parameter>,
    #[serde(rename = "requestBody", skip_serializing_if = "Option::is_none")]
    pub request_body: Option<RequestBody>,
    /// Responses keyed by status code
    pub responses: BTreeMap<String, Response>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
    /// Security requirements; each maps a scheme name to its scopes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub security: Vec<IndexMap<String, Vec<String>>>,
}

/// OpenAPI Parameter object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name
    pub name: String,
    /// Parameter location (path, query, header, cookie)
    #[serde(rename = "in")]
    pub location: String,
    /// Whether the parameter is required
    pub required: bool,
    /// Parameter schema
    pub schema: Schema,
    /// Parameter description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// OpenAPI RequestBody object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestBody {
    /// Whether the request body is required
    pub required: bool,
    /// Content types and their schemas
    pub content: IndexMap<String, MediaType>,
}

/// OpenAPI MediaType object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaType {
    /// Schema for this media type
    pub schema: Schema,
}

/// OpenAPI Response object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    /// Response description
    pub description: String,
    /// Response content
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<IndexMap<String, MediaType>>,
}

impl Response {
    fn with_schema(description: String, media_type: &str, schema: Schema) -> Self {
        let mut content = IndexMap::new();
        content.insert(media_type.to_string(), MediaType { schema });
        Self {
            description,
            content: Some(content),
        }
    }

    fn error(description: String) -> Self {
        Self::with_schema(description, DEFAULT_MEDIA_TYPE, Schema::reference(ERROR_SCHEMA))
    }
}

/// OpenAPI Components object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Components {
    /// Schema definitions
    pub schemas: IndexMap<String, Schema>,
    /// Security scheme definitions
    #[serde(
        rename = "securitySchemes",
        default,
        skip_serializing_if = "IndexMap::is_empty"
    )]
    pub security_schemes: IndexMap<String, SecuritySchemeObject>,
}

/// Complete OpenAPI document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenApiDocument {
    /// OpenAPI version
    pub openapi: String,
    /// API info
    pub info: Info,
    /// API paths
    pub paths: IndexMap<String, PathItem>,
    /// Components (schemas, security schemes)
    pub components: Components,
}

impl OpenApiBuilder {
    /// Create a new OpenApiBuilder with default info and the shared error schemas
    pub fn new() -> Self {
        debug!("Initializing OpenApiBuilder");
        let mut schema_gen = SchemaGenerator::new();
        register_error_schemas(&mut schema_gen);

        Self {
            info: Info {
                title: "Generated API".to_string(),
                version: "1.0.0".to_string(),
                description: None,
            },
            paths: IndexMap::new(),
            schema_gen,
            security_schemes: IndexMap::new(),
            operation_ids: HashSet::new(),
        }
    }

    /// Set custom info for the API
    pub fn with_info(mut self, title: String, version: String, description: Option<String>) -> Self {
        self.info = Info {
            title,
            version,
            description,
        };
        self
    }

    /// Add one route's operation to the document.
    ///
    /// # Errors
    ///
    /// Fails with an error naming the route when the (method, path) pair is
    /// already taken or a field's validation expression is malformed. The
    /// document is left untouched in that case, including component schemas
    /// the route registered before failing.
    pub fn add_route(&mut self, route: &RouteInfo, handler: HandlerInfo) -> Result<()> {
        let path = convert_path_format(&route.path);
        debug!("Adding route: {} {}", route.method, path);

        let registered = self.schema_gen.clone();
        if let Err(e) = self.try_add_route(route, &path, handler) {
            self.schema_gen = registered;
            return Err(e.at_route(route.method.as_str(), path.as_str()));
        }
        Ok(())
    }

    fn try_add_route(&mut self, route: &RouteInfo, path: &str, handler: HandlerInfo) -> Result<()> {
        if self
            .paths
            .get(path)
            .and_then(|item| item.operation(route.method))
            .is_some()
        {
            return Err(Error::DuplicateRoute {
                method: route.method.to_string(),
                path: path.to_string(),
            });
        }

        let parameters = match &route.params {
            Some(params) => self
                .schema_gen
                .parameters(Some(params), path)
                .map_err(|e| in_type(e, &params.name))?,
            None => self.schema_gen.parameters(None, path)?,
        };

        let request_body = match &route.request {
            Some(request) => {
                let schema = self
                    .schema_gen
                    .register(request)
                    .map_err(|e| in_type(e, &request.name))?;
                let mut content = IndexMap::new();
                content.insert(route.consumes.clone(), MediaType { schema });
                Some(RequestBody {
                    required: true,
                    content,
                })
            }
            None => None,
        };

        let mut responses = BTreeMap::new();
        let response_body = route.response_body();
        let status = handler
            .status_code
            .unwrap_or(if response_body.is_some() { 200 } else { 204 });
        let success = match response_body {
            Some(response) => {
                let schema = self
                    .schema_gen
                    .register(response)
                    .map_err(|e| in_type(e, &response.name))?;
                Response::with_schema(status_description(status), &route.produces, schema)
            }
            None => Response {
                description: status_description(status),
                content: None,
            },
        };
        responses.insert(status.to_string(), success);

        for code in DEFAULT_ERRORS {
            responses.insert(code.to_string(), Response::error(status_description(code)));
        }

        let mut security = Vec::new();
        if let Some(auth) = &route.auth {
            self.register_security_scheme(auth);
            let mut requirement = IndexMap::new();
            requirement.insert(auth.name.clone(), Vec::new());
            security.push(requirement);

            for code in AUTH_ERRORS {
                responses.insert(code.to_string(), Response::error(status_description(code)));
            }
        }

        for (code, message) in &handler.errors {
            if *code == status {
                warn!(
                    "Ignoring @Error {} on {} {}: it is the success status",
                    code, route.method, path
                );
                continue;
            }
            let description = if message.is_empty() {
                status_description(*code)
            } else {
                message.clone()
            };
            responses.insert(code.to_string(), Response::error(description));
        }

        let operation_id = self.unique_operation_id(handler.id, route.method, path);

        let operation = Operation {
            tags: handler.tags.into_iter().collect(),
            summary: handler.summary,
            description: handler.description,
            operation_id,
            parameters,
            request_body,
            responses,
            deprecated: handler.deprecated,
            security,
        };

        *self
            .paths
            .entry(path.to_string())
            .or_default()
            .operation_mut(route.method) = Some(operation);
        Ok(())
    }

    /// Registers the handler's scheme once per handler name.
    fn register_security_scheme(&mut self, auth: &AuthHandler) {
        let object = SecuritySchemeObject::from(&auth.scheme);
        match self.security_schemes.get(&auth.name) {
            Some(existing) if *existing != object => warn!(
                "Security scheme {} is registered with different settings; keeping the first",
                auth.name
            ),
            Some(_) => {}
            None => {
                debug!("Registering security scheme {}", auth.name);
                self.security_schemes.insert(auth.name.clone(), object);
            }
        }
    }

    /// Makes `id` unique within the document, deriving one from the route if absent.
    fn unique_operation_id(&mut self, id: Option<String>, method: HttpMethod, path: &str) -> String {
        let base = id.unwrap_or_else(|| route_operation_id(method, path));
        let mut candidate = base.clone();

        if self.operation_ids.contains(&candidate) {
            candidate = format!("{}-{}", base, method.as_str().to_ascii_lowercase());
            let mut counter = 2;
            while self.operation_ids.contains(&candidate) {
                candidate = format!("{}-{}", base, counter);
                counter += 1;
            }
            warn!("Operation id {} is already used; using {}", base, candidate);
        }

        self.operation_ids.insert(candidate.clone());
        candidate
    }

    /// Build the final OpenAPI document
    pub fn build(self) -> OpenApiDocument {
        debug!("Building final OpenAPI document");

        OpenApiDocument {
            openapi: OPENAPI_VERSION.to_string(),
            info: self.info,
            paths: self.paths,
            components: Components {
                schemas: self.schema_gen.into_schemas(),
                security_schemes: self.security_schemes,
            },
        }
    }
}

impl Default for OpenApiBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Convert path format from :param or {param} to OpenAPI {param} format
pub fn convert_path_format(path: &str) -> String {
    path.split('/')
        .map(|part| match part.strip_prefix(':') {
            Some(name) => format!("{{{}}}", name),
            None => part.to_string(),
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// `GET /users/{id}` → `get-users-id`
fn route_operation_id(method: HttpMethod, path: &str) -> String {
    let mut id = method.as_str().to_ascii_lowercase();
    for word in path
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        id.push('-');
        id.push_str(&word.to_ascii_lowercase());
    }
    id
}

fn status_description(code: u16) -> String {
    let text = match code {
        200 => "OK",
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
        413 => "Payload Too Large",
        415 => "Unsupported Media Type",
        422 => "Unprocessable Entity",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        100..=399 => "Successful response",
        _ => "Error response",
    };
    text.to_string()
}

/// Shared body of every error response:
/// `{timestamp, status, error, path, method, requestId?, message, validationErrors?}`
fn register_error_schemas(schema_gen: &mut SchemaGenerator) {
    let string = || Schema::primitive("string", None);

    let mut validation = IndexMap::new();
    validation.insert("field".to_string(), string());
    validation.insert("message".to_string(), string());
    validation.insert("value".to_string(), Schema::default());
    schema_gen.insert(
        VALIDATION_ERROR_SCHEMA,
        Schema {
            schema_type: Some("object".to_string()),
            properties: Some(validation),
            required: Some(vec!["field".to_string(), "message".to_string()]),
            ..Schema::default()
        },
    );

    let mut properties = IndexMap::new();
    properties.insert("timestamp".to_string(), Schema::primitive("string", Some("date-time")));
    properties.insert("status".to_string(), Schema::primitive("integer", Some("int32")));
    properties.insert("error".to_string(), string());
    properties.insert("path".to_string(), string());
    properties.insert("method".to_string(), string());
    properties.insert("requestId".to_string(), string());
    properties.insert("message".to_string(), string());
    properties.insert(
        "validationErrors".to_string(),
        Schema::array(Schema::reference(VALIDATION_ERROR_SCHEMA)),
    );

    schema_gen.insert(
        ERROR_SCHEMA,
        Schema {
            schema_type: Some("object".to_string()),
            properties: Some(properties),
            required: Some(
                ["timestamp", "status", "error", "path", "method", "message"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            ),
            ..Schema::default()
        },
    );
}
