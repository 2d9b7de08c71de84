use crate::{Json, NoBody, Response, StatusCode};

pub fn list_users(state: State) -> Response<Vec<User>> {
    let users = state.users.all();
    Response { status: 200, body: users }
}

/// get_user returns a single user by id.
pub fn get_user(id: u64) -> Response<NoBody> {
    lookup(id);
    Response::empty()
}

/// @Summary Create a user
/// @Error 409 Email already registered
pub fn create_user(Json(input): Json<CreateUser>) -> Result<Response<User>, ApiError> {
    if input.email.is_empty() {
        return Err(ApiError::invalid("email"));
    }
    let user = store(input)?;
    return Ok(Response { status: 201, body: user });
}

/// @ID remove-user
/// @Deprecated
/// @Description Removes a user permanently.
/// Use the archive endpoint instead.
/// @Error 404 User not found
pub fn delete_user(id: u64) -> Response<NoBody> {
    remove(id);
    Response { status: StatusCode::NO_CONTENT, body: NoBody }
}

/// Sends an invitation email.
pub fn invite_user(Json(input): Json<Invite>) -> Response<NoBody> {
    mailer::send(&input.email);
    return Response { status: 201, body: NoBody };
}

pub fn reset_password(id: u64) -> Response<NoBody> {
    tokens::revoke(id);
    Response { status: 0, body: NoBody }
}

pub struct UserService;

impl UserService {
    /// Replaces a user's profile.
    /// @Tag Users
    /// @Tag Profiles
    pub fn update(&self, id: u64, input: UpdateUser) -> Response<User> {
        let handle = || {
            return Response { status: 500, body: () };
        };
        handle();
        Response { status: StatusCode::ACCEPTED, body: self.apply(id, input) }
    }
}

fn lookup(_id: u64) {}
