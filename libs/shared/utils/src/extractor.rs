use std::sync::Arc;

use axum::{body::Body, extract::State, middleware::Next, response::Response};
use http::{header::AUTHORIZATION, Request};

use shared_config::AppConfig;
use shared_models::auth::{Actor, User};
use shared_models::error::AppError;

use crate::jwt::validate_token;

// Resolves the session into a `User` and an `Actor` on the request extensions
pub async fn auth_middleware(
    State(config): State<Arc<AppConfig>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let auth_value = request
        .headers()
        .get(AUTHORIZATION)
        .ok_or_else(|| AppError::Auth("Missing authorization header".to_string()))?
        .to_str()
        .map_err(|_| AppError::Auth("Invalid authorization header format".to_string()))?;

    let token = auth_value
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Auth("Invalid authorization header format".to_string()))?;

    let user = validate_token(token, &config.session_jwt_secret).map_err(AppError::Auth)?;
    let actor = Actor::try_from(&user)?;

    request.extensions_mut().insert(user);
    request.extensions_mut().insert(actor);

    Ok(next.run(request).await)
}

pub fn extract_user<B>(request: &Request<B>) -> Result<User, AppError> {
    request
        .extensions()
        .get::<User>()
        .cloned()
        .ok_or_else(|| AppError::Auth("User not found in request extensions".to_string()))
}

pub fn extract_actor<B>(request: &Request<B>) -> Result<Actor, AppError> {
    request
        .extensions()
        .get::<Actor>()
        .copied()
        .ok_or_else(|| AppError::Auth("Actor not found in request extensions".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{JwtTestUtils, TestConfig, TestUser};
    use axum::{http::StatusCode, middleware, routing::get, Extension, Router};
    use shared_models::auth::Role;
    use tower::ServiceExt;

    fn app(config: Arc<AppConfig>) -> Router {
        Router::new()
            .route("/whoami", get(|Extension(actor): Extension<Actor>| async move { actor.role.to_string() }))
            .layer(middleware::from_fn_with_state(config, auth_middleware))
    }

    #[tokio::test]
    async fn resolves_actor_from_bearer_token() {
        let config = TestConfig::default().to_arc();
        let user = TestUser::receptionist("desk@example.com");
        let token = JwtTestUtils::create_test_token(&user, &config.session_jwt_secret, Some(1));

        let request = Request::builder()
            .uri("/whoami")
            .header("authorization", format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap();

        let response = app(config).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(user.to_actor().role, Role::Receptionist);
    }

    #[tokio::test]
    async fn missing_header_is_unauthorized() {
        let request = Request::builder().uri("/whoami").body(Body::empty()).unwrap();
        let response = app(TestConfig::default().to_arc()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn expired_token_is_unauthorized() {
        let config = TestConfig::default().to_arc();
        let token = JwtTestUtils::create_expired_token(&TestUser::patient("p@example.com"), &config.session_jwt_secret);

        let request = Request::builder()
            .uri("/whoami")
            .header("authorization", format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap();

        let response = app(config).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
