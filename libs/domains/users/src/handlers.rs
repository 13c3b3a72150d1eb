//! HTTP handlers for the user directory API

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::{StatusCode, header},
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::{get, post},
};
use axum_helpers::{
    AppError, AuthorityGuard, JwtAuth, TOTAL_COUNT_HEADER, ValidatedJson,
    errors::responses::{
        BadRequestSortResponse, BadRequestValidationResponse, ConflictResponse,
        ForbiddenResponse, InternalServerErrorResponse, NotFoundResponse, UnauthorizedResponse,
    },
    require_authority,
};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::models::{
    ActivationQuery, AdminUser, AdminUserInput, Authority, ListParams, LoginRequest, PublicUser,
    ROLE_ADMIN, RegisterRequest, TokenResponse,
};
use crate::repository::{AuthorityRepository, UserRepository};
use crate::service::UserService;
use crate::sort::PageRequest;

/// OpenAPI documentation for the user directory
#[derive(OpenApi)]
#[openapi(
    paths(
        list_public_users,
        list_users,
        create_user,
        get_user,
        update_user,
        delete_user,
        list_authorities,
        create_authority,
        get_authority,
        register,
        activate,
        authenticate,
    ),
    components(
        schemas(
            PublicUser, AdminUser, AdminUserInput, Authority,
            RegisterRequest, LoginRequest, TokenResponse
        ),
        responses(
            BadRequestValidationResponse,
            BadRequestSortResponse,
            UnauthorizedResponse,
            ForbiddenResponse,
            NotFoundResponse,
            ConflictResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = "Users", description = "Public user listing"),
        (name = "User management", description = "Administrator user endpoints"),
        (name = "Authorities", description = "Role management"),
        (name = "Account", description = "Registration, activation and login")
    )
)]
pub struct ApiDoc;

/// Shared state of the directory routes
pub struct DirectoryState<U: UserRepository, A: AuthorityRepository> {
    pub service: UserService<U, A>,
    pub auth: JwtAuth,
}

type SharedState<U, A> = Arc<DirectoryState<U, A>>;

/// Directory routes, to be nested under `/api`.
///
/// Everything except registration, activation and login requires a token
/// carrying `ROLE_ADMIN`.
pub fn router<U, A>(service: UserService<U, A>, auth: JwtAuth) -> Router
where
    U: UserRepository + 'static,
    A: AuthorityRepository + 'static,
{
    let guard = AuthorityGuard::new(auth.clone(), ROLE_ADMIN);
    let state = Arc::new(DirectoryState { service, auth });

    let admin = Router::new()
        .route("/users", get(list_public_users))
        .route("/admin/users", get(list_users).post(create_user))
        .route(
            "/admin/users/{login}",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/authorities", get(list_authorities).post(create_authority))
        .route("/authorities/{name}", get(get_authority))
        .route_layer(from_fn_with_state(guard, require_authority));

    let account = Router::new()
        .route("/register", post(register))
        .route("/activate", get(activate))
        .route("/authenticate", post(authenticate));

    admin.merge(account).with_state(state)
}

fn page_of(params: &ListParams) -> PageRequest {
    PageRequest::new(params.page, params.size)
}

/// All users, reduced to `id` and `login`
#[utoipa::path(
    get,
    path = "/users",
    tag = "Users",
    params(ListParams),
    responses(
        (status = 200, description = "Users as {id, login}; X-Total-Count carries the total", body = Vec<PublicUser>),
        (status = 400, response = BadRequestSortResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_public_users<U: UserRepository, A: AuthorityRepository>(
    State(state): State<SharedState<U, A>>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Query(params) = params?;
    let (users, total) = state
        .service
        .list_public(params.sort.as_deref(), page_of(&params))
        .await?;

    Ok(([(TOTAL_COUNT_HEADER, total.to_string())], Json(users)))
}

/// Full user profiles
#[utoipa::path(
    get,
    path = "/admin/users",
    tag = "User management",
    params(ListParams),
    responses(
        (status = 200, description = "Users; X-Total-Count carries the total", body = Vec<AdminUser>),
        (status = 400, response = BadRequestSortResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 403, response = ForbiddenResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_users<U: UserRepository, A: AuthorityRepository>(
    State(state): State<SharedState<U, A>>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Query(params) = params?;
    let (users, total) = state
        .service
        .list_users(params.sort.as_deref(), page_of(&params))
        .await?;

    Ok(([(TOTAL_COUNT_HEADER, total.to_string())], Json(users)))
}

/// Create an activated user
#[utoipa::path(
    post,
    path = "/admin/users",
    tag = "User management",
    request_body = AdminUserInput,
    responses(
        (status = 201, description = "User created", body = AdminUser),
        (status = 400, response = BadRequestValidationResponse),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_user<U: UserRepository, A: AuthorityRepository>(
    State(state): State<SharedState<U, A>>,
    ValidatedJson(input): ValidatedJson<AdminUserInput>,
) -> Result<impl IntoResponse, AppError> {
    let user = state.service.create_user(input).await?;
    let location = format!("/api/admin/users/{}", user.login);

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(user),
    ))
}

#[utoipa::path(
    get,
    path = "/admin/users/{login}",
    tag = "User management",
    params(("login" = String, Path, description = "User login")),
    responses(
        (status = 200, description = "User found", body = AdminUser),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_user<U: UserRepository, A: AuthorityRepository>(
    State(state): State<SharedState<U, A>>,
    Path(login): Path<String>,
) -> Result<Json<AdminUser>, AppError> {
    Ok(Json(state.service.get_user(&login).await?))
}

#[utoipa::path(
    put,
    path = "/admin/users/{login}",
    tag = "User management",
    params(("login" = String, Path, description = "Current user login")),
    request_body = AdminUserInput,
    responses(
        (status = 200, description = "User updated", body = AdminUser),
        (status = 400, response = BadRequestValidationResponse),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_user<U: UserRepository, A: AuthorityRepository>(
    State(state): State<SharedState<U, A>>,
    Path(login): Path<String>,
    ValidatedJson(input): ValidatedJson<AdminUserInput>,
) -> Result<Json<AdminUser>, AppError> {
    Ok(Json(state.service.update_user(&login, input).await?))
}

/// Delete a user; unknown logins succeed as well
#[utoipa::path(
    delete,
    path = "/admin/users/{login}",
    tag = "User management",
    params(("login" = String, Path, description = "User login")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_user<U: UserRepository, A: AuthorityRepository>(
    State(state): State<SharedState<U, A>>,
    Path(login): Path<String>,
) -> Result<StatusCode, AppError> {
    state.service.delete_user(&login).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/authorities",
    tag = "Authorities",
    responses(
        (status = 200, description = "All authorities", body = Vec<Authority>),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_authorities<U: UserRepository, A: AuthorityRepository>(
    State(state): State<SharedState<U, A>>,
) -> Result<Json<Vec<Authority>>, AppError> {
    Ok(Json(state.service.list_authorities().await?))
}

#[utoipa::path(
    post,
    path = "/authorities",
    tag = "Authorities",
    request_body = Authority,
    responses(
        (status = 201, description = "Authority created", body = Authority),
        (status = 400, response = BadRequestValidationResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_authority<U: UserRepository, A: AuthorityRepository>(
    State(state): State<SharedState<U, A>>,
    ValidatedJson(authority): ValidatedJson<Authority>,
) -> Result<impl IntoResponse, AppError> {
    let authority = state.service.create_authority(authority).await?;
    Ok((StatusCode::CREATED, Json(authority)))
}

#[utoipa::path(
    get,
    path = "/authorities/{name}",
    tag = "Authorities",
    params(("name" = String, Path, description = "Authority name")),
    responses(
        (status = 200, description = "Authority found", body = Authority),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_authority<U: UserRepository, A: AuthorityRepository>(
    State(state): State<SharedState<U, A>>,
    Path(name): Path<String>,
) -> Result<Json<Authority>, AppError> {
    Ok(Json(state.service.get_authority(&name).await?))
}

/// Register a new account; it stays inactive until activated
#[utoipa::path(
    post,
    path = "/register",
    tag = "Account",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account registered"),
        (status = 400, response = BadRequestValidationResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn register<U: UserRepository, A: AuthorityRepository>(
    State(state): State<SharedState<U, A>>,
    ValidatedJson(request): ValidatedJson<RegisterRequest>,
) -> Result<StatusCode, AppError> {
    state.service.register(request).await?;
    Ok(StatusCode::CREATED)
}

#[utoipa::path(
    get,
    path = "/activate",
    tag = "Account",
    params(ActivationQuery),
    responses(
        (status = 200, description = "Account activated"),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn activate<U: UserRepository, A: AuthorityRepository>(
    State(state): State<SharedState<U, A>>,
    query: Result<Query<ActivationQuery>, QueryRejection>,
) -> Result<StatusCode, AppError> {
    let Query(query) = query?;
    state.service.activate(&query.key).await?;
    Ok(StatusCode::OK)
}

/// Exchange credentials for a signed token
#[utoipa::path(
    post,
    path = "/authenticate",
    tag = "Account",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 401, response = UnauthorizedResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn authenticate<U: UserRepository, A: AuthorityRepository>(
    State(state): State<SharedState<U, A>>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .service
        .authenticate(&request.username, &request.password)
        .await?;

    let authorities: Vec<String> = user.authorities.into_iter().collect();
    let token = state
        .auth
        .create_token(&user.login, &authorities)
        .map_err(|e| AppError::InternalServerError(format!("Token signing failed: {}", e)))?;

    Ok((
        [(header::AUTHORIZATION, format!("Bearer {}", token))],
        Json(TokenResponse { id_token: token }),
    ))
}
