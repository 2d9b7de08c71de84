//! OpenAPI documents from the handlers registered with a router.
//!
//! Each registered route names its handler function. The generator finds that
//! function's declaration in the application's own source tree, reads the
//! structured annotations in its doc comment, fills the gaps from naming
//! conventions and the function body, and assembles one operation per route.
//!
//! # Architecture
//!
//! 1. [`identity`] - maps a handler reference to package, receiver and symbol
//! 2. [`scanner`] - maps a package to its source units on disk
//! 3. [`parser`] - parses units with `syn` and lowers them into [`parser::SourceUnit`]s
//! 4. [`source_cache`] - thread-safe index of parsed units for one build
//! 5. [`annotations`] - parses `@ID`, `@Tag`, `@Summary`, ... into a [`annotations::HandlerInfo`]
//! 6. [`heuristics`] and [`status_scan`] - fallbacks for fields left unset
//! 7. [`constraints`] and [`schema_generator`] - type descriptors to schemas
//! 8. [`openapi_builder`] - operations, error responses and security schemes
//! 9. [`generator`] - runs a whole build
//! 10. [`serializer`] - YAML or JSON output
//!
//! # Example
//!
//! ```no_run
//! use openapi_from_handlers::{
//!     config::GeneratorConfig,
//!     descriptor::{FieldDescriptor, FieldKind, HttpMethod, RouteInfo, TypeDescriptor},
//!     generator::SpecGenerator,
//!     identity::HandlerRef,
//!     serializer::serialize_yaml,
//! };
//!
//! /// @Summary Fetch one user
//! /// @Error 404 User not found
//! fn get_user() {}
//!
//! let user = TypeDescriptor::new("User")
//!     .field(FieldDescriptor::new("name", FieldKind::String).validate("required,max=64"));
//! let routes = vec![
//!     RouteInfo::new(HttpMethod::Get, "/users/:id", HandlerRef::of(&get_user)).with_response(user),
//! ];
//!
//! let config = GeneratorConfig::new("Accounts", "1.0.0").with_source_root("src");
//! let document = SpecGenerator::new(config).build(&routes).unwrap();
//! println!("{}", serialize_yaml(&document).unwrap());
//! ```
//!
//! # Command-Line Interface
//!
//! See the [`cli`] module for building documents from a route manifest.

pub mod annotations;
pub mod cli;
pub mod config;
pub mod constraints;
pub mod descriptor;
pub mod error;
pub mod generator;
pub mod heuristics;
pub mod identity;
pub mod manifest;
pub mod openapi_builder;
pub mod parser;
pub mod scanner;
pub mod schema_generator;
pub mod security;
pub mod serializer;
pub mod source_cache;
pub mod status_scan;

pub use error::{Error, Result};
