use actix_web::{web, HttpMessage, HttpRequest, HttpResponse};
use bcrypt::{hash, verify};
use chrono::{TimeDelta, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use log::{info, warn};
use mongodb::bson::DateTime as BsonDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app_state::AppState;
use crate::config::Config;
use crate::error::ApiError;
use crate::models::{non_blank, AuthRequest, AuthResponse, RegisterRequest, User, UserProfile};
use crate::store::{StoreError, UserStore};

const INVALID_CREDENTIALS: &str = "Invalid credentials";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

/// User id decoded from a valid bearer token, attached by the `Authentication` middleware.
#[derive(Debug, Clone)]
pub struct Identity(pub String);

pub fn create_jwt(user_id: &str, secret: &str, ttl_hours: i64) -> Result<String, ApiError> {
    let expiration = TimeDelta::try_hours(ttl_hours)
        .and_then(|ttl| Utc::now().checked_add_signed(ttl))
        .ok_or_else(|| ApiError::Internal(format!("token lifetime of {ttl_hours}h is out of range")))?;
    let exp = usize::try_from(expiration.timestamp())
        .map_err(|_| ApiError::Internal(format!("token expiry {expiration} precedes the epoch")))?;
    let claims = Claims {
        sub: user_id.to_string(),
        exp,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_ref()))
        .map_err(|e| ApiError::Internal(format!("token encoding failed: {}", e)))
}

pub fn validate_jwt(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}

fn required<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str, ApiError> {
    non_blank(value.as_deref()).ok_or_else(|| ApiError::validation(format!("{field} is required")))
}

fn issue(user: User, config: &Config) -> Result<AuthResponse, ApiError> {
    let token = create_jwt(&user.user_id, &config.jwt_secret, config.jwt_ttl_hours)?;
    Ok(AuthResponse {
        token,
        user_id: user.user_id,
        name: user.name,
        email: user.email,
    })
}

pub async fn register(
    store: &dyn UserStore,
    config: &Config,
    request: RegisterRequest,
) -> Result<AuthResponse, ApiError> {
    let name = required(&request.name, "name")?.trim().to_string();
    let email = required(&request.email, "email")?.trim().to_lowercase();
    let password = required(&request.password, "password")?.to_string();

    let cost = config.bcrypt_cost;
    let hashed_password = web::block(move || hash(password, cost))
        .await
        .map_err(|e| ApiError::Internal(format!("password hashing was cancelled: {}", e)))?
        .map_err(|e| ApiError::Internal(format!("password hashing failed: {}", e)))?;

    let user = User {
        user_id: Uuid::new_v4().to_string(),
        name,
        email,
        password: hashed_password,
        created_at: BsonDateTime::now(),
    };

    store.insert_user(&user).await.map_err(|e| match e {
        StoreError::Duplicate { .. } => ApiError::Conflict("email already registered".to_string()),
        other => other.into(),
    })?;
    info!("User registered: {}", user.user_id);
    issue(user, config)
}

/// Unknown e-mail and wrong password produce the same error.
pub async fn authenticate(
    store: &dyn UserStore,
    config: &Config,
    request: AuthRequest,
) -> Result<AuthResponse, ApiError> {
    let email = required(&request.email, "email")?.trim().to_lowercase();
    let password = required(&request.password, "password")?.to_string();

    let user = match store.find_user_by_email(&email).await? {
        Some(user) => user,
        None => {
            warn!("Login attempt for unknown email");
            return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }
    };

    let stored_hash = user.password.clone();
    let matches = web::block(move || verify(password, &stored_hash))
        .await
        .map_err(|e| ApiError::Internal(format!("password check was cancelled: {}", e)))?
        .unwrap_or(false);
    if !matches {
        warn!("Failed login for user {}", user.user_id);
        return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }
    info!("User logged in: {}", user.user_id);
    issue(user, config)
}

pub async fn current_user(store: &dyn UserStore, identity: &Identity) -> Result<UserProfile, ApiError> {
    store
        .get_user(&identity.0)
        .await?
        .map(UserProfile::from)
        .ok_or_else(|| ApiError::Unauthorized("unknown user".to_string()))
}

/// POST /auth/register
pub async fn signup(
    data: web::Data<AppState>,
    payload: web::Json<RegisterRequest>,
) -> Result<HttpResponse, ApiError> {
    let response = register(data.users.as_ref(), &data.config, payload.into_inner()).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// POST /auth/login
pub async fn login(
    data: web::Data<AppState>,
    payload: web::Json<AuthRequest>,
) -> Result<HttpResponse, ApiError> {
    let response = authenticate(data.users.as_ref(), &data.config, payload.into_inner()).await?;
    Ok(HttpResponse::Ok().json(response))
}

/// GET /auth/me
pub async fn me(req: HttpRequest, data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let identity = req
        .extensions()
        .get::<Identity>()
        .cloned()
        .ok_or_else(|| ApiError::Unauthorized("missing or invalid bearer token".to_string()))?;
    let profile = current_user(data.users.as_ref(), &identity).await?;
    Ok(HttpResponse::Ok().json(profile))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::{header, StatusCode};
    use actix_web::test::{self, TestRequest};
    use serde_json::json;

    use crate::test_support::{init_app, test_config, test_state};

    fn register_body() -> serde_json::Value {
        json!({ "name": "Ada", "email": "Ada@Example.com", "password": "hunter22" })
    }

    #[test]
    fn issued_token_validates_with_the_same_secret_only() {
        let token = create_jwt("user-1", "secret-a", 1).unwrap();
        assert_eq!(validate_jwt(&token, "secret-a").unwrap().sub, "user-1");
        assert!(validate_jwt(&token, "secret-b").is_err());
    }

    #[test]
    fn unrepresentable_lifetime_is_an_error_not_a_panic() {
        for ttl in [100_000_000_000, i64::MAX] {
            let err = create_jwt("user-1", "secret-a", ttl).unwrap_err();
            assert!(matches!(err, ApiError::Internal(_)));
        }
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = create_jwt("user-1", "secret-a", -2).unwrap();
        assert!(validate_jwt(&token, "secret-a").is_err());
    }

    #[actix_web::test]
    async fn register_then_login_issues_tokens() {
        let state = test_state();
        let app = init_app!(state).await;

        let req = TestRequest::post().uri("/auth/register").set_json(register_body()).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let registered: AuthResponse = test::read_body_json(resp).await;
        assert_eq!(registered.email, "ada@example.com");
        assert_eq!(validate_jwt(&registered.token, &state.config.jwt_secret).unwrap().sub, registered.user_id);

        let req = TestRequest::post()
            .uri("/auth/login")
            .set_json(json!({ "email": "ada@example.com", "password": "hunter22" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let logged_in: AuthResponse = test::read_body_json(resp).await;
        assert_eq!(logged_in.user_id, registered.user_id);
    }

    #[actix_web::test]
    async fn password_is_stored_hashed() {
        let state = test_state();
        let response = register(
            state.users.as_ref(),
            &test_config(),
            RegisterRequest {
                name: Some("Ada".to_string()),
                email: Some("ada@example.com".to_string()),
                password: Some("hunter22".to_string()),
            },
        )
        .await
        .unwrap();
        let stored = state.users.get_user(&response.user_id).await.unwrap().unwrap();
        assert_ne!(stored.password, "hunter22");
        assert!(verify("hunter22", &stored.password).unwrap());
    }

    #[actix_web::test]
    async fn duplicate_email_conflicts() {
        let state = test_state();
        let app = init_app!(state).await;

        let req = TestRequest::post().uri("/auth/register").set_json(register_body()).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let req = TestRequest::post()
            .uri("/auth/register")
            .set_json(json!({ "name": "Other", "email": "ada@example.com", "password": "x" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);
    }

    #[actix_web::test]
    async fn bad_credentials_are_unauthorized() {
        let state = test_state();
        let app = init_app!(state).await;

        let req = TestRequest::post().uri("/auth/register").set_json(register_body()).to_request();
        test::call_service(&app, req).await;

        for body in [
            json!({ "email": "ada@example.com", "password": "wrong" }),
            json!({ "email": "nobody@example.com", "password": "hunter22" }),
        ] {
            let req = TestRequest::post().uri("/auth/login").set_json(body).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
            let body: serde_json::Value = test::read_body_json(resp).await;
            assert_eq!(body["message"], INVALID_CREDENTIALS);
        }
    }

    #[actix_web::test]
    async fn missing_fields_fail_validation() {
        let state = test_state();
        let app = init_app!(state).await;

        let req = TestRequest::post()
            .uri("/auth/register")
            .set_json(json!({ "name": "Ada", "email": "ada@example.com" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn me_requires_a_valid_token() {
        let state = test_state();
        let app = init_app!(state).await;

        let req = TestRequest::post().uri("/auth/register").set_json(register_body()).to_request();
        let registered: AuthResponse = test::call_and_read_body_json(&app, req).await;

        let req = TestRequest::get()
            .uri("/auth/me")
            .insert_header((header::AUTHORIZATION, format!("Bearer {}", registered.token)))
            .to_request();
        let profile: UserProfile = test::call_and_read_body_json(&app, req).await;
        assert_eq!(profile.user_id, registered.user_id);
        assert_eq!(profile.name, "Ada");

        let req = TestRequest::get().uri("/auth/me").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

        let req = TestRequest::get()
            .uri("/auth/me")
            .insert_header((header::AUTHORIZATION, "Bearer not-a-jwt"))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn invalid_token_does_not_block_open_routes() {
        let state = test_state();
        let app = init_app!(state).await;

        let req = TestRequest::get()
            .uri("/api/tasks")
            .insert_header((header::AUTHORIZATION, "Bearer not-a-jwt"))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    }
}
