//! Fallbacks for handler fields the documentation leaves unset.
//!
//! Applied after annotation parsing, each only when its field is still empty:
//!
//! - id: the symbol name in kebab-case (`get_user_by_id` → `get-user-by-id`)
//! - tags: the module name in upper camel case (`user_accounts` → `UserAccounts`)
//! - summary: the symbol name as a sentence (`get_user_by_id` → `Get user by id`)
//! - description: the doc block minus annotation lines and a leading symbol name
//! - status code: the status of the first response the body returns

use crate::annotations::HandlerInfo;
use crate::identity::ResolvedIdentity;
use crate::parser::FunctionDecl;
use heck::{ToKebabCase, ToUpperCamelCase};

/// Fill every unset field of `info` from naming conventions and the declaration.
pub fn apply_fallbacks(
    info: &mut HandlerInfo,
    identity: &ResolvedIdentity,
    declaration: Option<&FunctionDecl>,
) {
    if info.id.is_none() {
        info.id = non_empty(identity.symbol.to_kebab_case());
    }

    if info.tags.is_empty() {
        if let Some(tag) = identity.package_name().and_then(|name| non_empty(name.to_upper_camel_case())) {
            info.tags.insert(tag);
        }
    }

    if info.summary.is_none() {
        info.summary = summary_from_symbol(&identity.symbol);
    }

    if info.description.is_none() {
        info.description = declaration
            .and_then(|decl| decl.doc.as_deref())
            .and_then(|doc| description_from_doc(doc, &identity.symbol));
    }

    if info.status_code.is_none() {
        info.status_code = declaration.and_then(|decl| decl.status.code());
    }
}

/// `get_user_by_id` → `Get user by id`
pub fn summary_from_symbol(symbol: &str) -> Option<String> {
    let camel = symbol.to_upper_camel_case();
    let mut spaced = String::with_capacity(camel.len() + 8);
    for (i, c) in camel.chars().enumerate() {
        if i > 0 && c.is_uppercase() {
            spaced.push(' ');
        }
        spaced.push(c);
    }

    let lower = spaced.to_lowercase();
    let mut chars = lower.chars();
    let first = chars.next()?;
    Some(first.to_uppercase().chain(chars).collect())
}

/// Documentation text with annotation lines removed and a leading symbol name stripped.
pub fn description_from_doc(doc: &str, symbol: &str) -> Option<String> {
    let text: Vec<&str> = doc
        .lines()
        .filter(|line| !line.trim_start().starts_with('@'))
        .collect();
    let text = text.join("\n");
    let text = text.trim();
    let text = text
        .strip_prefix(symbol)
        .filter(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace))
        .map_or(text, str::trim_start);

    non_empty(text.to_string())
}

fn non_empty(s: String) -> Option<String> {
    (!s.is_empty()).then_some(s)
}
