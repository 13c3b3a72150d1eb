use super::jwt::{JwtAuth, JwtClaims};
use crate::errors::AppError;
use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};

/// Bearer token from the `Authorization` header; no other source is accepted
fn extract_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer "))
}

fn authenticate(auth: &JwtAuth, headers: &HeaderMap) -> Result<JwtClaims, AppError> {
    let token = extract_token(headers).ok_or_else(|| {
        tracing::debug!("No bearer token in Authorization header");
        AppError::Unauthorized("No token provided".to_string())
    })?;

    auth.verify_token(token).map_err(|e| {
        tracing::debug!("JWT verification failed: {}", e);
        AppError::Unauthorized("Invalid token".to_string())
    })
}

/// State for [`require_authority`]
#[derive(Clone)]
pub struct AuthorityGuard {
    auth: JwtAuth,
    authority: &'static str,
}

impl AuthorityGuard {
    pub fn new(auth: JwtAuth, authority: &'static str) -> Self {
        Self { auth, authority }
    }
}

/// 401 without a valid token, 403 when the token lacks the guarded authority
pub async fn require_authority(
    State(guard): State<AuthorityGuard>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let claims = authenticate(&guard.auth, request.headers())?;

    if !claims.has_authority(guard.authority) {
        tracing::info!(login = %claims.sub, required = guard.authority, "Missing authority");
        return Err(AppError::Forbidden(format!(
            "Authority {} required",
            guard.authority
        )));
    }

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::JwtConfig;
    use axum::{Extension, Router, body::Body, http::StatusCode, middleware, routing::get};
    use tower::ServiceExt;

    fn auth() -> JwtAuth {
        JwtAuth::new(&JwtConfig::new("middleware-test-secret-long-enough-000"))
    }

    fn admin_app(auth: JwtAuth) -> Router {
        Router::new()
            .route(
                "/admin",
                get(|Extension(claims): Extension<JwtClaims>| async move { claims.sub }),
            )
            .layer(middleware::from_fn_with_state(
                AuthorityGuard::new(auth, "ROLE_ADMIN"),
                require_authority,
            ))
    }

    fn request(token: Option<&str>) -> Request {
        let mut builder = Request::builder().uri("/admin");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let response = admin_app(auth()).oneshot(request(None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_invalid_token_is_unauthorized() {
        let response = admin_app(auth())
            .oneshot(request(Some("garbage")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_missing_authority_is_forbidden() {
        let auth = auth();
        let token = auth.create_token("user", &["ROLE_USER".to_string()]).unwrap();
        let response = admin_app(auth).oneshot(request(Some(&token))).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_admin_passes_with_claims() {
        let auth = auth();
        let token = auth
            .create_token("admin", &["ROLE_ADMIN".to_string()])
            .unwrap();
        let response = admin_app(auth).oneshot(request(Some(&token))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_access_token_cookie_is_not_accepted() {
        let auth = auth();
        let token = auth
            .create_token("admin", &["ROLE_ADMIN".to_string()])
            .unwrap();
        let request = Request::builder()
            .uri("/admin")
            .header(header::COOKIE, format!("theme=dark; access_token={}", token))
            .body(Body::empty())
            .unwrap();

        let response = admin_app(auth).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_extract_token_requires_bearer_scheme() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Basic dXNlcjpwYXNz".parse().unwrap());
        assert_eq!(extract_token(&headers), None);

        headers.insert(header::AUTHORIZATION, "Bearer abc.def.ghi".parse().unwrap());
        assert_eq!(extract_token(&headers), Some("abc.def.ghi"));
    }
}
