//! Best-effort inference of a handler's success status code from its body.
//!
//! The scan looks for the first `return` that builds a response value, walking
//! the body depth-first without entering closures or nested items. When no
//! `return` qualifies, the block's tail expression is checked the same way.
//! A response value is a struct literal whose type name ends in `Response`,
//! optionally wrapped in `Ok(..)`, `Some(..)`, `Box::new(..)`, `&..` or
//! parentheses. Its `status` (or `status_code`) field must be an integer
//! literal or a well-known status constant such as `StatusCode::CREATED`.
//! Literals outside the HTTP status range count as unresolved.

use syn::visit::{self, Visit};
use syn::{Block, Expr, ExprStruct, Lit, Member, Stmt};

/// Outcome of a status scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusInference {
    /// The body returns a response with this literal status
    Resolved(u16),
    /// No response construction was found, or its status is computed
    #[default]
    Unresolved,
}

impl StatusInference {
    pub fn code(self) -> Option<u16> {
        match self {
            StatusInference::Resolved(code) => Some(code),
            StatusInference::Unresolved => None,
        }
    }
}

/// Whether `code` lies in the HTTP status range 100..=599.
pub fn is_http_status(code: u16) -> bool {
    (100..=599).contains(&code)
}

/// Scan a function body for the status of the first returned response.
pub fn infer_status(body: &Block) -> StatusInference {
    let mut visitor = ReturnVisitor { found: None };
    visitor.visit_block(body);
    if let Some(found) = visitor.found {
        return found;
    }

    match body.stmts.last() {
        Some(Stmt::Expr(tail, None)) => response_literal(tail)
            .map(status_of)
            .unwrap_or_default(),
        _ => StatusInference::Unresolved,
    }
}

struct ReturnVisitor {
    found: Option<StatusInference>,
}

impl<'ast> Visit<'ast> for ReturnVisitor {
    fn visit_expr(&mut self, expr: &'ast Expr) {
        if self.found.is_some() {
            return;
        }
        match expr {
            Expr::Return(ret) => {
                if let Some(literal) = ret.expr.as_deref().and_then(response_literal) {
                    self.found = Some(status_of(literal));
                    return;
                }
                visit::visit_expr(self, expr);
            }
            // A closure's `return` leaves the closure, not the handler
            Expr::Closure(_) | Expr::Async(_) => {}
            _ => visit::visit_expr(self, expr),
        }
    }

    fn visit_item(&mut self, _item: &'ast syn::Item) {}
}

/// Unwrap common wrappers around a response struct literal.
fn response_literal(expr: &Expr) -> Option<&ExprStruct> {
    match expr {
        Expr::Struct(literal) => {
            let name = literal.path.segments.last()?.ident.to_string();
            name.ends_with("Response").then_some(literal)
        }
        Expr::Reference(reference) => response_literal(&reference.expr),
        Expr::Paren(paren) => response_literal(&paren.expr),
        Expr::Group(group) => response_literal(&group.expr),
        Expr::Call(call) if call.args.len() == 1 => {
            let Expr::Path(func) = call.func.as_ref() else {
                return None;
            };
            let segments: Vec<String> = func
                .path
                .segments
                .iter()
                .map(|s| s.ident.to_string())
                .collect();
            let wrapper = matches!(
                segments.iter().map(String::as_str).collect::<Vec<_>>().as_slice(),
                ["Ok"] | ["Some"] | ["Box", "new"] | ["Arc", "new"] | [.., "Json"]
            );
            if wrapper {
                call.args.first().and_then(response_literal)
            } else {
                None
            }
        }
        _ => None,
    }
}

fn status_of(literal: &ExprStruct) -> StatusInference {
    let status = literal.fields.iter().find(|field| {
        matches!(&field.member, Member::Named(ident) if ident == "status" || ident == "status_code")
    });
    status
        .and_then(|field| status_value(&field.expr))
        .filter(|code| is_http_status(*code))
        .map_or(StatusInference::Unresolved, StatusInference::Resolved)
}

fn status_value(expr: &Expr) -> Option<u16> {
    match expr {
        Expr::Lit(lit) => match &lit.lit {
            Lit::Int(int) => int.base10_parse::<u16>().ok(),
            _ => None,
        },
        Expr::Path(path) => {
            let name = path.path.segments.last()?.ident.to_string();
            status_from_name(&name)
        }
        Expr::Paren(paren) => status_value(&paren.expr),
        Expr::Group(group) => status_value(&group.expr),
        _ => None,
    }
}

/// Map a status constant name to its code.
///
/// Accepts `http`-crate style (`NO_CONTENT`) and `StatusNoContent` style names.
pub fn status_from_name(name: &str) -> Option<u16> {
    let name = name.strip_prefix("Status").unwrap_or(name);
    let normalized: String = name
        .chars()
        .filter(|c| *c != '_')
        .map(|c| c.to_ascii_uppercase())
        .collect();

    let code = match normalized.as_str() {
        "CONTINUE" => 100,
        "SWITCHINGPROTOCOLS" => 101,
        "PROCESSING" => 102,
        "OK" => 200,
        "CREATED" => 201,
        "ACCEPTED" => 202,
        "NONAUTHORITATIVEINFORMATION" | "NONAUTHORITATIVEINFO" => 203,
        "NOCONTENT" => 204,
        "RESETCONTENT" => 205,
        "PARTIALCONTENT" => 206,
        "MULTISTATUS" => 207,
        "ALREADYREPORTED" => 208,
        "IMUSED" => 226,
        "MULTIPLECHOICES" => 300,
        "MOVEDPERMANENTLY" => 301,
        "FOUND" => 302,
        "SEEOTHER" => 303,
        "NOTMODIFIED" => 304,
        "USEPROXY" => 305,
        "TEMPORARYREDIRECT" => 307,
        "PERMANENTREDIRECT" => 308,
        "BADREQUEST" => 400,
        "UNAUTHORIZED" => 401,
        "PAYMENTREQUIRED" => 402,
        "FORBIDDEN" => 403,
        "NOTFOUND" => 404,
        "METHODNOTALLOWED" => 405,
        "NOTACCEPTABLE" => 406,
        "PROXYAUTHENTICATIONREQUIRED" | "PROXYAUTHREQUIRED" => 407,
        "REQUESTTIMEOUT" => 408,
        "CONFLICT" => 409,
        "GONE" => 410,
        "LENGTHREQUIRED" => 411,
        "PRECONDITIONFAILED" => 412,
        "PAYLOADTOOLARGE" | "REQUESTENTITYTOOLARGE" => 413,
        "URITOOLONG" | "REQUESTURITOOLONG" => 414,
        "UNSUPPORTEDMEDIATYPE" => 415,
        "RANGENOTSATISFIABLE" | "REQUESTEDRANGENOTSATISFIABLE" => 416,
        "EXPECTATIONFAILED" => 417,
        "IMATEAPOT" | "TEAPOT" => 418,
        "MISDIRECTEDREQUEST" => 421,
        "UNPROCESSABLEENTITY" => 422,
        "LOCKED" => 423,
        "FAILEDDEPENDENCY" => 424,
        "UPGRADEREQUIRED" => 426,
        "PRECONDITIONREQUIRED" => 428,
        "TOOMANYREQUESTS" => 429,
        "REQUESTHEADERFIELDSTOOLARGE" => 431,
        "UNAVAILABLEFORLEGALREASONS" => 451,
        "INTERNALSERVERERROR" => 500,
        "NOTIMPLEMENTED" => 501,
        "BADGATEWAY" => 502,
        "SERVICEUNAVAILABLE" => 503,
        "GATEWAYTIMEOUT" => 504,
        "HTTPVERSIONNOTSUPPORTED" => 505,
        _ => return None,
    };
    Some(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(source: &str) -> StatusInference {
        let item: syn::ItemFn = syn::parse_str(source).unwrap();
        infer_status(&item.block)
    }

    #[test]
    fn test_literal_status_in_return() {
        let status = scan(
            r#"
            fn create_user(req: Request) -> Result<Response<User>, Error> {
                let user = store.insert(req.body)?;
                return Ok(Response { status: 201, body: user, ..Default::default() });
            }
        "#,
        );
        assert_eq!(status, StatusInference::Resolved(201));
    }

    #[test]
    fn test_named_constant_status() {
        let status = scan(
            r#"
            fn accept_job() -> Box<JobResponse> {
                return Box::new(JobResponse { status: http::StatusCode::ACCEPTED, id: 7 });
            }
        "#,
        );
        assert_eq!(status, StatusInference::Resolved(202));
        assert_eq!(status_from_name("StatusNoContent"), Some(204));
        assert_eq!(status_from_name("NO_CONTENT"), Some(204));
        assert_eq!(status_from_name("Bogus"), None);
    }

    #[test]
    fn test_tail_expression_is_checked() {
        let status = scan(
            r#"
            async fn delete_user(id: u64) -> Response<NoBody> {
                repo.delete(id).await;
                Response { status: StatusCode::NO_CONTENT, ..Default::default() }
            }
        "#,
        );
        assert_eq!(status, StatusInference::Resolved(204));
    }

    #[test]
    fn test_first_qualifying_return_wins() {
        let status = scan(
            r#"
            fn upsert(found: bool) -> Response<User> {
                if found {
                    return Response { status: 200, body: load() };
                }
                return Response { status: 201, body: create() };
            }
        "#,
        );
        assert_eq!(status, StatusInference::Resolved(200));
    }

    #[test]
    fn test_computed_status_is_unresolved() {
        let status = scan(
            r#"
            fn dynamic(code: u16) -> Response<User> {
                return Response { status: code, body: load() };
            }
        "#,
        );
        assert_eq!(status, StatusInference::Unresolved);
    }

    #[test]
    fn test_closures_and_non_response_returns_are_skipped() {
        let status = scan(
            r#"
            fn list() -> Vec<User> {
                let f = || { return Response { status: 418 }; };
                if empty() {
                    return Vec::new();
                }
                load()
            }
        "#,
        );
        assert_eq!(status, StatusInference::Unresolved);
        assert_eq!(status.code(), None);
    }

    #[test]
    fn test_out_of_range_literal_is_unresolved() {
        for code in ["0", "99", "600", "1000"] {
            let status = scan(&format!(
                "fn reset() -> Response<NoBody> {{ return Response {{ status: {}, body: NoBody }}; }}",
                code
            ));
            assert_eq!(status, StatusInference::Unresolved, "status {}", code);
        }
        assert!(is_http_status(100));
        assert!(is_http_status(599));
    }
}
