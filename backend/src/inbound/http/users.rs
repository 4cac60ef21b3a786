//! Users API handlers.
//!
//! ```text
//! POST   /users/create {"username":"ada","email":"ada@example.com","password":"secret","name":"Ada","surname":"Lovelace"}
//! GET    /users/list?username=ada&limit=50&offset=0
//! GET    /users/get?user_id=1
//! PUT    /users/update?user_id=1 {"email":"ada@lovelace.dev"}
//! DELETE /users/delete?user_id=1
//! ```
//!
//! `list` and `get` read through the cache; the `-no-cache` variants go
//! straight to the durable store. Everything except `create` needs a bearer
//! token.

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Serialize};

use crate::domain::{
    Error, NewUser, NewUserInput, PageRequest, User, UserChanges, UserFilter, UserId, UserPage,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::authenticated::Authenticated;
use crate::inbound::http::state::UsersState;
use crate::inbound::http::validation::{non_blank, page_validation_error, user_validation_error};

const DEFAULT_LIMIT: u32 = 50;

/// Registration body for `POST /users/create`.
#[derive(Debug, Deserialize, Serialize)]
pub struct CreateUserRequest {
    /// Requested login name.
    pub username: String,
    /// Contact address; must be unique.
    pub email: String,
    /// Plaintext password; hashed before storage.
    pub password: String,
    /// Given name.
    pub name: String,
    /// Family name.
    pub surname: String,
    /// Age in years.
    #[serde(default)]
    pub age: Option<i32>,
}

/// Partial update body for `PUT /users/update`.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct UpdateUserRequest {
    /// New given name.
    #[serde(default)]
    pub name: Option<String>,
    /// New family name.
    #[serde(default)]
    pub surname: Option<String>,
    /// New contact address.
    #[serde(default)]
    pub email: Option<String>,
    /// New age.
    #[serde(default)]
    pub age: Option<i32>,
}

/// `?user_id=` selector shared by the single-user routes.
#[derive(Debug, Deserialize)]
pub struct UserIdQuery {
    /// Id of the target user; values below 1 are treated as unknown.
    pub user_id: i64,
}

/// Filters and paging for the listing routes. Blank filters are ignored.
#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    /// Exact login name.
    pub username: Option<String>,
    /// Exact given name.
    pub name: Option<String>,
    /// Exact family name.
    pub surname: Option<String>,
    /// Page size; defaults to 50.
    pub limit: Option<u32>,
    /// Rows to skip; defaults to 0.
    pub offset: Option<u32>,
}

impl ListUsersQuery {
    fn into_parts(self) -> ApiResult<(UserFilter, PageRequest)> {
        let filter = UserFilter {
            username: non_blank(self.username),
            name: non_blank(self.name),
            surname: non_blank(self.surname),
        };
        let page = PageRequest::new(
            self.limit.unwrap_or(DEFAULT_LIMIT),
            self.offset.unwrap_or_default(),
        )
        .map_err(page_validation_error)?;
        Ok((filter, page))
    }
}

/// Ids that cannot exist are reported the same way as absent ones.
fn user_id(query: &UserIdQuery) -> ApiResult<UserId> {
    UserId::new(query.user_id).map_err(|_| Error::not_found("User not found"))
}

/// Register a user. Open to anonymous callers; answers 201 with the new record.
#[post("/create")]
pub async fn create_user(
    state: web::Data<UsersState>,
    payload: web::Json<CreateUserRequest>,
) -> ApiResult<HttpResponse> {
    let request = payload.into_inner();
    let user = NewUser::try_from_input(NewUserInput {
        username: &request.username,
        email: &request.email,
        password: &request.password,
        name: &request.name,
        surname: &request.surname,
        age: request.age,
    })
    .map_err(user_validation_error)?;
    let created = state.users.create(user).await?;
    Ok(HttpResponse::Created().json(created))
}

/// List users, reading through the cache.
#[get("/list")]
pub async fn list_users(
    _auth: Authenticated,
    state: web::Data<UsersState>,
    query: web::Query<ListUsersQuery>,
) -> ApiResult<web::Json<UserPage>> {
    let (filter, page) = query.into_inner().into_parts()?;
    Ok(web::Json(state.users.list(&filter, page).await?))
}

/// List users straight from the durable store.
#[get("/list-no-cache")]
pub async fn list_users_uncached(
    _auth: Authenticated,
    state: web::Data<UsersState>,
    query: web::Query<ListUsersQuery>,
) -> ApiResult<web::Json<UserPage>> {
    let (filter, page) = query.into_inner().into_parts()?;
    Ok(web::Json(state.users.list_uncached(&filter, page).await?))
}

/// Fetch one user, reading through the cache.
#[get("/get")]
pub async fn get_user(
    _auth: Authenticated,
    state: web::Data<UsersState>,
    query: web::Query<UserIdQuery>,
) -> ApiResult<web::Json<User>> {
    let id = user_id(&query)?;
    Ok(web::Json(state.users.get(id).await?))
}

/// Fetch one user straight from the durable store.
#[get("/get-no-cache")]
pub async fn get_user_uncached(
    _auth: Authenticated,
    state: web::Data<UsersState>,
    query: web::Query<UserIdQuery>,
) -> ApiResult<web::Json<User>> {
    let id = user_id(&query)?;
    Ok(web::Json(state.users.get_uncached(id).await?))
}

/// Apply a partial update and return the new record.
#[put("/update")]
pub async fn update_user(
    _auth: Authenticated,
    state: web::Data<UsersState>,
    query: web::Query<UserIdQuery>,
    payload: web::Json<UpdateUserRequest>,
) -> ApiResult<web::Json<User>> {
    let id = user_id(&query)?;
    let UpdateUserRequest {
        name,
        surname,
        email,
        age,
    } = payload.into_inner();
    let changes = UserChanges::try_new(name, surname, email, age).map_err(user_validation_error)?;
    Ok(web::Json(state.users.update(id, changes).await?))
}

/// Delete a user and return its last snapshot.
#[delete("/delete")]
pub async fn delete_user(
    _auth: Authenticated,
    state: web::Data<UsersState>,
    query: web::Query<UserIdQuery>,
) -> ApiResult<web::Json<User>> {
    let id = user_id(&query)?;
    Ok(web::Json(state.users.delete(id).await?))
}

/// All `/users` routes.
pub fn users_scope() -> actix_web::Scope {
    web::scope("/users")
        .service(create_user)
        .service(list_users)
        .service(list_users_uncached)
        .service(get_user)
        .service(get_user_uncached)
        .service(update_user)
        .service(delete_user)
}
