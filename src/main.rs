// src/main.rs

mod app_state;
mod auth;
mod category;
mod config;
mod error;
mod models;
mod store;
mod task;
#[cfg(test)]
mod test_support;

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

use actix_cors::Cors;
use actix_web::{
    body::{BoxBody, MessageBody},
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    http,
    middleware::Logger,
    web, App, Error, HttpMessage, HttpResponse, HttpServer,
};
use env_logger::Env;
use futures::future::{ok, Ready};
use log::{debug, info, warn};
use serde_json::json;

use crate::app_state::AppState;
use crate::auth::{login, me, signup, validate_jwt, Identity};
use crate::category::{
    create_category, delete_category, get_category, list_categories, update_category,
};
use crate::error::ApiError;
use crate::store::{MemoryStore, MongoStore};
use crate::task::{
    create_task, delete_task, get_task, list_tasks, list_tasks_by_category, update_task,
};

/// Attaches an [`Identity`] to requests carrying a valid bearer token.
///
/// Never rejects: every route stays open, and a missing or bad token just
/// means no identity is attached.
#[derive(Debug, Clone)]
pub struct Authentication {
    secret: Rc<String>,
}

impl Authentication {
    pub fn new(secret: &str) -> Self {
        Self { secret: Rc::new(secret.to_string()) }
    }
}

impl<S, B> Transform<S, ServiceRequest> for Authentication
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Transform = AuthMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AuthMiddleware { service, secret: self.secret.clone() })
    }
}

pub struct AuthMiddleware<S> {
    service: S,
    secret: Rc<String>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if let Some(token) = bearer_token(&req) {
            match validate_jwt(&token, &self.secret) {
                Ok(claims) => {
                    req.extensions_mut().insert(Identity(claims.sub));
                }
                Err(e) => debug!("Ignoring invalid bearer token: {}", e),
            }
        }

        let fut = self.service.call(req);
        Box::pin(async move {
            let res = fut.await?;
            Ok(res.map_into_boxed_body())
        })
    }
}

fn bearer_token(req: &ServiceRequest) -> Option<String> {
    let auth_str = req.headers().get(http::header::AUTHORIZATION)?.to_str().ok()?;
    auth_str
        .strip_prefix("Bearer ")
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

async fn healthcheck() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

/// Registers every route plus the JSON extractor settings.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| ApiError::validation(err.to_string()).into()),
    )
    .route("/health", web::get().to(healthcheck))
    .service(
        web::scope("/auth")
            .route("/register", web::post().to(signup))
            .route("/login", web::post().to(login))
            .route("/me", web::get().to(me)),
    )
    .service(
        web::scope("/api")
            // TASKS
            .service(
                web::scope("/tasks")
                    .route("", web::get().to(list_tasks))
                    .route("", web::post().to(create_task))
                    .route("/category/{category_id}", web::get().to(list_tasks_by_category))
                    .route("/{id}", web::get().to(get_task))
                    .route("/{id}", web::put().to(update_task))
                    .route("/{id}", web::delete().to(delete_task)),
            )
            // CATEGORIES
            .service(
                web::scope("/categories")
                    .route("", web::get().to(list_categories))
                    .route("", web::post().to(create_category))
                    .route("/{id}", web::get().to(get_category))
                    .route("/{id}", web::put().to(update_category))
                    .route("/{id}", web::delete().to(delete_category)),
            ),
    );
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = config::Config::from_env().map_err(io::Error::other)?;

    let state = match &config.mongo_uri {
        Some(uri) => {
            let store = MongoStore::connect(uri, &config.database_name)
                .await
                .map_err(io::Error::other)?;
            AppState::with_mongo(store, config.clone())
        }
        None => {
            warn!("MONGO_URI not set; records will only live as long as this process");
            AppState::with_memory(MemoryStore::new(), config.clone())
        }
    };

    category::bootstrap(state.categories.as_ref(), &config.default_category_color)
        .await
        .map_err(io::Error::other)?;

    info!("Server running at http://{}", config.bind_addr);
    info!("Allowed CORS Origin: {}", config.frontend_origin);

    let data = web::Data::new(state);
    let frontend_origin = config.frontend_origin.clone();
    let jwt_secret = config.jwt_secret.clone();

    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&frontend_origin)
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allow_any_header()
            .supports_credentials()
            .max_age(3600);

        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .wrap(Authentication::new(&jwt_secret))
            .app_data(data.clone())
            .configure(configure)
    })
    .bind(&config.bind_addr)?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::test::{self, TestRequest};

    use crate::test_support::{init_app, test_state};

    #[actix_web::test]
    async fn health_reports_ok() {
        let state = test_state();
        let app = init_app!(state).await;
        let req = TestRequest::get().uri("/health").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn bearer_token_requires_the_scheme_prefix() {
        let req = TestRequest::get()
            .insert_header((http::header::AUTHORIZATION, "Bearer  abc "))
            .to_srv_request();
        assert_eq!(bearer_token(&req).as_deref(), Some("abc"));

        let req = TestRequest::get()
            .insert_header((http::header::AUTHORIZATION, "Basic abc"))
            .to_srv_request();
        assert!(bearer_token(&req).is_none());

        let req = TestRequest::get()
            .insert_header((http::header::AUTHORIZATION, "Bearer "))
            .to_srv_request();
        assert!(bearer_token(&req).is_none());
    }
}
