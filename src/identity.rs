//! Handler identity resolution.
//!
//! Rust has no runtime function introspection, so a handler's identity is a
//! fully-qualified path captured when the route is registered. It comes either
//! from the compiler's type name for the function item ([`HandlerRef::of`]) or
//! from an explicit label ([`HandlerRef::named`]).
//!
//! [`resolve`] splits that path into the package (module) path, an optional
//! receiver type and the bare symbol name:
//!
//! | qualified name | package | receiver | symbol |
//! |---|---|---|---|
//! | `app::handlers::users::get_user` | `app::handlers::users` | - | `get_user` |
//! | `app::handlers::UserService::get` | `app::handlers` | `UserService` | `get` |
//! | `<app::handlers::UserService as app::Handler>::get` | `app::handlers` | `UserService` | `get` |
//! | `app::handlers::list::<app::User>` | `app::handlers` | - | `list` |

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque, stable identity of a route handler.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HandlerRef(String);

impl HandlerRef {
    /// Capture the identity of a handler function value.
    ///
    /// Works for function items and associated functions. Closures resolve to
    /// a name ending in `{{closure}}`, which [`resolve`] rejects.
    pub fn of<F>(handler: &F) -> Self {
        Self(std::any::type_name_of_val(handler).to_string())
    }

    /// Identity from an explicit, user-supplied qualified name.
    pub fn named(qualified_name: impl Into<String>) -> Self {
        Self(qualified_name.into())
    }

    pub fn qualified_name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A handler identity split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIdentity {
    /// Normalized fully-qualified name, generics removed
    pub qualified_name: String,
    /// Module path without the receiver type (may be empty)
    pub package_path: String,
    /// Receiver type for methods
    pub receiver: Option<String>,
    /// Unqualified function name
    pub symbol: String,
}

impl ResolvedIdentity {
    /// Last segment of the package path, e.g. `users` for `app::handlers::users`
    pub fn package_name(&self) -> Option<&str> {
        self.package_path
            .rsplit("::")
            .next()
            .filter(|s| !s.is_empty())
    }

    /// Package path segments below the crate root
    pub fn module_segments(&self) -> Vec<&str> {
        self.package_path
            .split("::")
            .filter(|s| !s.is_empty())
            .skip(1)
            .collect()
    }
}

/// Resolve a handler reference to its package path, receiver and symbol name.
///
/// # Errors
///
/// Returns [`Error::Resolution`] for empty names, closures and names whose
/// last segment is not an identifier.
pub fn resolve(handler: &HandlerRef) -> Result<ResolvedIdentity> {
    let raw = handler.qualified_name().trim();
    let fail = || Error::Resolution(raw.to_string());

    if raw.is_empty() || raw.ends_with("::") || raw.contains("{{closure}}") {
        return Err(fail());
    }

    let (qualified, receiver_hint) = strip_trait_qualification(raw);
    let qualified = strip_generics(&qualified);

    let (prefix, symbol) = match qualified.rsplit_once("::") {
        Some((prefix, symbol)) => (prefix.to_string(), symbol.to_string()),
        None => (String::new(), qualified.clone()),
    };

    if !is_identifier(&symbol) {
        return Err(fail());
    }

    // A receiver is either named by a `<Type as Trait>` qualification or is a
    // type-like (upper-case) segment right before the method name.
    let (package_path, receiver) = match receiver_hint {
        Some(receiver) => (parent_path(&prefix).to_string(), Some(receiver)),
        None => match prefix.rsplit_once("::") {
            Some((parent, last)) if is_type_segment(last) => {
                (parent.to_string(), Some(last.to_string()))
            }
            None if is_type_segment(&prefix) => (String::new(), Some(prefix.clone())),
            _ => (prefix.clone(), None),
        },
    };

    Ok(ResolvedIdentity {
        qualified_name: qualified,
        package_path,
        receiver,
        symbol,
    })
}

/// Rewrites `<a::b::Type as a::Trait>::method` to `a::b::Type::method`.
fn strip_trait_qualification(name: &str) -> (String, Option<String>) {
    let Some(rest) = name.strip_prefix('<') else {
        return (name.to_string(), None);
    };
    let Some((qualified_self, method)) = rest.rsplit_once(">::") else {
        return (name.to_string(), None);
    };
    let self_ty = qualified_self
        .split_once(" as ")
        .map_or(qualified_self, |(ty, _)| ty);
    let self_ty = strip_generics(self_ty);
    let receiver = self_ty.rsplit("::").next().map(str::to_string);
    (format!("{}::{}", self_ty, method), receiver)
}

/// Removes `<...>` groups and turbofish separators from a path.
fn strip_generics(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut depth = 0usize;
    for c in name.chars() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out.trim_end_matches("::").replace("::::", "::")
}

fn parent_path(path: &str) -> &str {
    path.rsplit_once("::").map_or("", |(parent, _)| parent)
}

fn is_type_segment(segment: &str) -> bool {
    segment.chars().next().is_some_and(|c| c.is_ascii_uppercase())
}

fn is_identifier(segment: &str) -> bool {
    let segment = segment.strip_prefix("r#").unwrap_or(segment);
    let mut chars = segment.chars();
    matches!(chars.next(), Some(c) if c == '_' || c.is_alphabetic())
        && chars.all(|c| c == '_' || c.is_alphanumeric())
}
