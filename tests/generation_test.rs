use openapi_from_handlers::{
    cli::{render, CliArgs, OutputFormat},
    config::GeneratorConfig,
    descriptor::{FieldDescriptor, FieldKind, HttpMethod, ParamLocation, RouteInfo, TypeDescriptor},
    generator::SpecGenerator,
    identity::HandlerRef,
    openapi_builder::{OpenApiDocument, Operation},
    security::{AuthHandler, SecurityScheme},
    serializer::serialize_yaml,
    Error,
};
use clap::Parser;
use pretty_assertions::assert_eq;
use std::path::PathBuf;

fn fixture_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/app/src")
}

fn generator() -> SpecGenerator {
    SpecGenerator::new(GeneratorConfig::new("Fixture API", "0.9.0").with_source_root(fixture_root()))
}

fn route(method: HttpMethod, path: &str, handler: &str) -> RouteInfo {
    RouteInfo::new(method, path, HandlerRef::named(handler))
}

fn operation<'a>(doc: &'a OpenApiDocument, path: &str, method: HttpMethod) -> &'a Operation {
    doc.paths[path]
        .operation(method)
        .unwrap_or_else(|| panic!("missing operation {} {}", method, path))
}

fn codes(operation: &Operation) -> Vec<&str> {
    operation.responses.keys().map(String::as_str).collect()
}

fn user() -> TypeDescriptor {
    TypeDescriptor::new("User")
        .field(FieldDescriptor::new("id", FieldKind::Integer).validate("required"))
        .field(FieldDescriptor::new("email", FieldKind::String).validate("required,email"))
}

#[test]
fn test_undocumented_handler_uses_naming_fallbacks() {
    let routes = vec![route(HttpMethod::Get, "/users", "app::handlers::users::list_users")
        .with_response(user())];
    let doc = generator().build(&routes).unwrap();

    let list = operation(&doc, "/users", HttpMethod::Get);
    assert_eq!(list.operation_id, "list-users");
    assert_eq!(list.tags, vec!["Users"]);
    assert_eq!(list.summary.as_deref(), Some("List users"));
    assert_eq!(list.description, None);
    // Inferred from the returned literal
    assert_eq!(codes(list), vec!["200", "400", "422", "500"]);
}

#[test]
fn test_no_body_without_status_defaults_to_204() {
    let routes = vec![route(HttpMethod::Get, "/users/{id}", "app::handlers::users::get_user")
        .with_response(TypeDescriptor::no_body())];
    let doc = generator().build(&routes).unwrap();

    let get = operation(&doc, "/users/{id}", HttpMethod::Get);
    assert_eq!(codes(get), vec!["204", "400", "422", "500"]);
    assert!(get.responses["204"].content.is_none());
    assert_eq!(get.description.as_deref(), Some("returns a single user by id."));
    assert_eq!(get.parameters.len(), 1);
    assert_eq!(get.parameters[0].location, "path");
}

#[test]
fn test_no_body_handler_keeps_inferred_status() {
    let invite = TypeDescriptor::new("Invite")
        .field(FieldDescriptor::new("email", FieldKind::String).validate("required,email"));
    let routes = vec![route(HttpMethod::Post, "/users/invite", "app::handlers::users::invite_user")
        .with_request(invite)
        .with_response(TypeDescriptor::no_body())];
    let doc = generator().build(&routes).unwrap();

    let op = operation(&doc, "/users/invite", HttpMethod::Post);
    assert_eq!(codes(op), vec!["201", "400", "422", "500"]);
    assert!(op.responses["201"].content.is_none());
    assert_eq!(op.responses["201"].description, "Created");
}

#[test]
fn test_out_of_range_status_literal_falls_back_to_default() {
    let routes = vec![route(HttpMethod::Post, "/users/{id}/reset", "app::handlers::users::reset_password")
        .with_response(TypeDescriptor::no_body())];
    let doc = generator().build(&routes).unwrap();

    let op = operation(&doc, "/users/{id}/reset", HttpMethod::Post);
    assert_eq!(codes(op), vec!["204", "400", "422", "500"]);
}

#[test]
fn test_status_inferred_from_returned_response() {
    let routes = vec![route(HttpMethod::Post, "/users", "app::handlers::users::create_user")
        .with_request(user())
        .with_response(user())];
    let doc = generator().build(&routes).unwrap();

    let create = operation(&doc, "/users", HttpMethod::Post);
    assert_eq!(create.summary.as_deref(), Some("Create a user"));
    assert_eq!(codes(create), vec!["201", "400", "409", "422", "500"]);
    assert_eq!(create.responses["409"].description, "Email already registered");
    assert!(create.request_body.as_ref().unwrap().required);
}

#[test]
fn test_deprecated_handler_with_multiline_description() {
    let routes = vec![route(HttpMethod::Delete, "/users/:id", "app::handlers::users::delete_user")];
    let doc = generator().build(&routes).unwrap();

    let delete = operation(&doc, "/users/{id}", HttpMethod::Delete);
    assert_eq!(delete.operation_id, "remove-user");
    assert!(delete.deprecated);
    assert_eq!(
        delete.description.as_deref(),
        Some("Removes a user permanently.\nUse the archive endpoint instead.")
    );
    assert_eq!(codes(delete), vec!["204", "400", "404", "422", "500"]);
    assert_eq!(delete.responses["404"].description, "User not found");
}

#[test]
fn test_method_handler_skips_closure_returns() {
    let routes = vec![route(HttpMethod::Put, "/users/{id}", "app::handlers::users::UserService::update")];
    let doc = generator().build(&routes).unwrap();

    let update = operation(&doc, "/users/{id}", HttpMethod::Put);
    assert_eq!(update.operation_id, "update");
    assert_eq!(update.tags, vec!["Users", "Profiles"]);
    assert_eq!(update.description.as_deref(), Some("Replaces a user's profile."));
    assert_eq!(codes(update), vec!["202", "400", "422", "500"]);
}

#[test]
fn test_shared_security_scheme() {
    let auth = AuthHandler::new("BearerAuth", SecurityScheme::Bearer { format: Some("JWT".to_string()) });
    let routes = vec![
        route(HttpMethod::Post, "/users", "app::handlers::users::create_user").with_auth(auth.clone()),
        route(HttpMethod::Delete, "/users/{id}", "app::handlers::users::delete_user").with_auth(auth),
        route(HttpMethod::Get, "/users", "app::handlers::users::list_users"),
    ];
    let doc = generator().build(&routes).unwrap();

    assert_eq!(
        doc.components.security_schemes.keys().collect::<Vec<_>>(),
        vec!["BearerAuth"]
    );

    for (path, method) in [("/users", HttpMethod::Post), ("/users/{id}", HttpMethod::Delete)] {
        let op = operation(&doc, path, method);
        assert_eq!(op.security.len(), 1);
        assert!(op.security[0].contains_key("BearerAuth"));
        assert!(op.responses.contains_key("401"));
        assert!(op.responses.contains_key("403"));
    }

    let list = operation(&doc, "/users", HttpMethod::Get);
    assert!(list.security.is_empty());
    assert!(!list.responses.contains_key("401"));
}

#[test]
fn test_module_directory_skips_generated_and_test_units() {
    let routes = vec![
        route(HttpMethod::Get, "/orders", "app::handlers::orders::list_orders"),
        route(HttpMethod::Post, "/orders/{id}/cancel", "app::handlers::orders::cancel_order"),
    ];
    let doc = generator().build(&routes).unwrap();

    let list = operation(&doc, "/orders", HttpMethod::Get);
    assert_eq!(list.operation_id, "list-orders");
    // The malformed second @StatusCode is skipped
    assert!(list.responses.contains_key("206"));

    let cancel = operation(&doc, "/orders/{id}/cancel", HttpMethod::Post);
    assert_eq!(cancel.operation_id, "cancel-order");
}

#[test]
fn test_strict_mode_rejects_malformed_annotations() {
    let routes = vec![route(HttpMethod::Get, "/orders", "app::handlers::orders::list_orders")];
    let err = SpecGenerator::new(
        GeneratorConfig::new("Fixture API", "0.9.0")
            .with_source_root(fixture_root())
            .strict(true),
    )
    .build(&routes)
    .unwrap_err();

    let msg = err.to_string();
    assert!(msg.contains("GET /orders"), "{}", msg);
    assert!(msg.contains("@StatusCode many"), "{}", msg);
}

#[test]
fn test_malformed_constraint_aborts_build() {
    let params = TypeDescriptor::new("ListParams").field(
        FieldDescriptor::new("limit", FieldKind::Integer)
            .located(ParamLocation::Query)
            .validate("min=1,max=ten"),
    );
    let routes = vec![
        route(HttpMethod::Get, "/health", "app::health"),
        route(HttpMethod::Get, "/users", "app::handlers::users::list_users").with_params(params),
    ];

    let err = generator().build(&routes).unwrap_err();
    assert!(matches!(err, Error::Route { .. }));
    let msg = err.to_string();
    assert!(msg.contains("GET /users"), "{}", msg);
    assert!(msg.contains("ListParams.limit"), "{}", msg);
}

#[test]
fn test_crate_root_handler() {
    let doc = generator()
        .build(&[route(HttpMethod::Get, "/health", "app::health")])
        .unwrap();

    let health = operation(&doc, "/health", HttpMethod::Get);
    assert_eq!(health.tags, vec!["Ops"]);
    assert_eq!(health.description.as_deref(), Some("reports whether the service is up."));
    assert!(health.responses.contains_key("200"));
}

#[test]
fn test_manifest_to_yaml() {
    let manifest = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/routes.yaml");
    let args = CliArgs::parse_from(["openapi-from-handlers", manifest.to_str().unwrap(), "-f", "yaml"]);
    assert!(matches!(args.output_format, OutputFormat::Yaml));

    let yaml = render(&args).unwrap();
    let doc: OpenApiDocument = serde_yaml::from_str(&yaml).unwrap();

    assert_eq!(doc.info.title, "Fixture API");
    assert_eq!(doc.info.version, "0.9.0");
    assert_eq!(
        doc.paths.keys().collect::<Vec<_>>(),
        vec!["/health", "/users", "/users/{id}"]
    );

    let schemas: Vec<&str> = doc.components.schemas.keys().map(String::as_str).collect();
    assert_eq!(
        schemas,
        vec!["ValidationError", "ErrorResponse", "User", "UserPage", "CreateUser"]
    );
    assert_eq!(doc.components.security_schemes.len(), 1);

    let list = operation(&doc, "/users", HttpMethod::Get);
    let names: Vec<&str> = list.parameters.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["limit", "sort"]);
    assert_eq!(list.parameters[0].schema.maximum, Some(100.0));

    let create = &doc.components.schemas["CreateUser"];
    assert_eq!(
        create.required,
        Some(vec!["email".to_string(), "name".to_string()])
    );

    // Serializing again is stable
    assert_eq!(serialize_yaml(&doc).unwrap(), yaml);
}
