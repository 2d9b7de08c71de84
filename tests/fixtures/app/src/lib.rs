pub mod handlers;

/// health reports whether the service is up.
/// @Tag Ops
pub fn health() -> Response<NoBody> {
    Response { status: StatusCode::OK, body: NoBody }
}
