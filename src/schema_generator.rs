use crate::constraints::apply_constraints;
use crate::descriptor::{FieldDescriptor, FieldKind, ParamLocation, TypeDescriptor};
use crate::error::{Error, Result};
use crate::openapi_builder::Parameter;
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Schema generator - converts type descriptors to OpenAPI schemas
#[derive(Debug, Clone, Default)]
pub struct SchemaGenerator {
    /// Component schemas generated so far, keyed by type name
    schemas: IndexMap<String, Schema>,
}

/// OpenAPI Schema definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    /// The type of the schema (string, integer, object, array, etc.)
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,
    /// Format for primitive types (e.g., "int64", "double", "email")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Properties for object types
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<IndexMap<String, Schema>>,
    /// Required field names for object types
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
    /// Items schema for array types
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    /// Allowed values
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
    /// Reference to another schema
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(rename = "minLength", skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(rename = "maxLength", skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u64>,
    #[serde(rename = "minItems", skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,
    #[serde(rename = "maxItems", skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u64>,
}

impl Schema {
    /// A primitive schema with an optional format
    pub fn primitive(schema_type: &str, format: Option<&str>) -> Self {
        Self {
            schema_type: Some(schema_type.to_string()),
            format: format.map(str::to_string),
            ..Self::default()
        }
    }

    /// A `$ref` to a component schema
    pub fn reference(name: &str) -> Self {
        Self {
            reference: Some(format!("#/components/schemas/{}", name)),
            ..Self::default()
        }
    }

    pub fn array(items: Schema) -> Self {
        Self {
            schema_type: Some("array".to_string()),
            items: Some(Box::new(items)),
            ..Self::default()
        }
    }
}

impl SchemaGenerator {
    pub fn new() -> Self {
        debug!("Initializing SchemaGenerator");
        Self::default()
    }

    /// Registers `descriptor` as a component schema and returns a reference to it.
    ///
    /// A name that is already registered is not generated again.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SchemaConstraint`] if a field's validation expression is malformed.
    pub fn register(&mut self, descriptor: &TypeDescriptor) -> Result<Schema> {
        if self.schemas.contains_key(&descriptor.name) {
            debug!("Schema for {} already exists", descriptor.name);
        } else {
            debug!("Generating schema for type: {}", descriptor.name);
            let schema = self.object_schema(descriptor)?;
            self.schemas.insert(descriptor.name.clone(), schema);
        }
        Ok(Schema::reference(&descriptor.name))
    }

    /// Adds a hand-built component schema unless the name is taken.
    pub fn insert(&mut self, name: impl Into<String>, schema: Schema) {
        self.schemas.entry(name.into()).or_insert(schema);
    }

    /// Generates an inline object schema with properties, constraints and required fields.
    pub fn object_schema(&mut self, descriptor: &TypeDescriptor) -> Result<Schema> {
        let mut properties = IndexMap::new();
        let mut required = Vec::new();

        for field in &descriptor.fields {
            let mut property = self.field_schema(field)?;
            apply_constraints(field, &mut property, &mut required)?;
            properties.insert(field.name.clone(), property);
        }

        Ok(Schema {
            schema_type: Some("object".to_string()),
            properties: Some(properties),
            required: (!required.is_empty()).then_some(required),
            ..Schema::default()
        })
    }

    fn field_schema(&mut self, field: &FieldDescriptor) -> Result<Schema> {
        let mut schema = self.kind_schema(&field.kind)?;
        if field.description.is_some() && schema.reference.is_none() {
            schema.description = field.description.clone();
        }
        Ok(schema)
    }

    fn kind_schema(&mut self, kind: &FieldKind) -> Result<Schema> {
        Ok(match kind {
            FieldKind::String => Schema::primitive("string", None),
            FieldKind::Integer => Schema::primitive("integer", Some("int64")),
            FieldKind::Number => Schema::primitive("number", Some("double")),
            FieldKind::Boolean => Schema::primitive("boolean", None),
            FieldKind::Array(items) => Schema::array(self.kind_schema(items)?),
            FieldKind::Object(nested) => self.register(nested)?,
        })
    }

    /// Expands a params type into OpenAPI parameters.
    ///
    /// Fields default to query parameters; path parameters are always
    /// required. Every `{name}` in `path_template` without a matching field
    /// gets a required string path parameter.
    pub fn parameters(
        &mut self,
        descriptor: Option<&TypeDescriptor>,
        path_template: &str,
    ) -> Result<Vec<Parameter>> {
        let mut parameters = Vec::new();
        let mut required = Vec::new();

        for field in descriptor.map(|d| d.fields.as_slice()).unwrap_or_default() {
            let location = field.location.unwrap_or(ParamLocation::Query);
            let mut schema = self.kind_schema(&field.kind)?;
            let is_required = apply_constraints(field, &mut schema, &mut required)?;

            parameters.push(Parameter {
                name: field.name.clone(),
                location: location.as_str().to_string(),
                required: is_required || location == ParamLocation::Path,
                schema,
                description: field.description.clone(),
            });
        }

        for name in path_parameters(path_template) {
            let declared = parameters
                .iter()
                .any(|p| p.location == "path" && p.name == name);
            if !declared {
                debug!("Adding undeclared path parameter {}", name);
                parameters.push(Parameter {
                    name,
                    location: ParamLocation::Path.as_str().to_string(),
                    required: true,
                    schema: Schema::primitive("string", None),
                    description: None,
                });
            }
        }

        Ok(parameters)
    }

    pub fn schemas(&self) -> &IndexMap<String, Schema> {
        &self.schemas
    }

    pub fn into_schemas(self) -> IndexMap<String, Schema> {
        self.schemas
    }
}

/// Names of the `{param}` segments of a path template
pub fn path_parameters(path: &str) -> Vec<String> {
    path.split('/')
        .filter_map(|segment| segment.strip_prefix('{')?.strip_suffix('}'))
        .map(|name| name.trim_end_matches('*').to_string())
        .filter(|name| !name.is_empty())
        .collect()
}

/// Wraps a descriptor-level error with the type it occurred in.
pub(crate) fn in_type(err: Error, type_name: &str) -> Error {
    match err {
        Error::SchemaConstraint {
            field,
            clause,
            reason,
        } => Error::SchemaConstraint {
            field: format!("{}.{}", type_name, field),
            clause,
            reason,
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn create_user() -> TypeDescriptor {
        TypeDescriptor::new("CreateUser")
            .field(FieldDescriptor::new("name", FieldKind::String).validate("required,min=2,max=10"))
            .field(
                FieldDescriptor::new("emails", FieldKind::Array(Box::new(FieldKind::String)))
                    .validate("min=1"),
            )
            .field(FieldDescriptor::new("age", FieldKind::Integer).validate("min=0,max=150"))
            .field(FieldDescriptor::new(
                "address",
                FieldKind::Object(Box::new(
                    TypeDescriptor::new("Address")
                        .field(FieldDescriptor::new("city", FieldKind::String).validate("required")),
                )),
            ))
    }

    #[test]
    fn test_register_struct_schema() {
        let mut generator = SchemaGenerator::new();
        let reference = generator.register(&create_user()).unwrap();

        assert_eq!(
            reference.reference.as_deref(),
            Some("#/components/schemas/CreateUser")
        );

        let schema = &generator.schemas()["CreateUser"];
        assert_eq!(schema.schema_type.as_deref(), Some("object"));
        assert_eq!(schema.required, Some(vec!["name".to_string()]));

        let properties = schema.properties.as_ref().unwrap();
        assert_eq!(properties["name"].min_length, Some(2));
        assert_eq!(properties["name"].max_length, Some(10));
        assert_eq!(properties["emails"].min_items, Some(1));
        assert_eq!(
            properties["emails"].items.as_ref().unwrap().schema_type.as_deref(),
            Some("string")
        );
        assert_eq!(properties["age"].minimum, Some(0.0));
        assert_eq!(properties["age"].maximum, Some(150.0));
        assert_eq!(
            properties["address"].reference.as_deref(),
            Some("#/components/schemas/Address")
        );

        // Nested objects become their own components
        let address = &generator.schemas()["Address"];
        assert_eq!(address.required, Some(vec!["city".to_string()]));
    }

    #[test]
    fn test_register_is_idempotent() {
        let mut generator = SchemaGenerator::new();
        generator.register(&create_user()).unwrap();
        generator.register(&create_user()).unwrap();
        assert_eq!(generator.schemas().len(), 2);
    }

    #[test]
    fn test_malformed_clause_aborts_registration() {
        let mut generator = SchemaGenerator::new();
        let descriptor = TypeDescriptor::new("Broken")
            .field(FieldDescriptor::new("name", FieldKind::String).validate("max=ten"));
        assert!(matches!(
            generator.register(&descriptor),
            Err(Error::SchemaConstraint { .. })
        ));
        assert!(generator.schemas().is_empty());
    }

    #[test]
    fn test_parameters_from_params_type() {
        let params = TypeDescriptor::new("ListParams")
            .field(FieldDescriptor::new("id", FieldKind::Integer).located(ParamLocation::Path))
            .field(FieldDescriptor::new("limit", FieldKind::Integer).validate("min=1,max=100"))
            .field(
                FieldDescriptor::new("X-Request-Id", FieldKind::String)
                    .located(ParamLocation::Header)
                    .validate("required,uuid"),
            );

        let mut generator = SchemaGenerator::new();
        let parameters = generator
            .parameters(Some(&params), "/orgs/{org}/users/{id}")
            .unwrap();

        let summary: Vec<(&str, &str, bool)> = parameters
            .iter()
            .map(|p| (p.name.as_str(), p.location.as_str(), p.required))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("id", "path", true),
                ("limit", "query", false),
                ("X-Request-Id", "header", true),
                ("org", "path", true),
            ]
        );
        assert_eq!(parameters[1].schema.minimum, Some(1.0));
        assert_eq!(parameters[2].schema.format.as_deref(), Some("uuid"));
        // Params types are not registered as components
        assert!(generator.schemas().is_empty());
    }

    #[test]
    fn test_path_parameters() {
        assert_eq!(path_parameters("/users/{id}/posts/{post_id}"), vec!["id", "post_id"]);
        assert!(path_parameters("/health").is_empty());
    }

    #[test]
    fn test_in_type_prefixes_field() {
        let err = in_type(
            Error::SchemaConstraint {
                field: "name".to_string(),
                clause: "min=x".to_string(),
                reason: "expected a non-negative integer".to_string(),
            },
            "CreateUser",
        );
        assert!(err.to_string().contains("CreateUser.name"));
    }
}
