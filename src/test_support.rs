use actix_web::web;

use crate::app_state::AppState;
use crate::config::{Config, DEFAULT_CATEGORY_COLOR};
use crate::store::MemoryStore;

pub fn test_config() -> Config {
    Config {
        bind_addr: "127.0.0.1:0".to_string(),
        mongo_uri: None,
        database_name: "pomodo_test".to_string(),
        jwt_secret: "test-secret".to_string(),
        jwt_ttl_hours: 1,
        bcrypt_cost: 4,
        frontend_origin: "http://localhost:5173".to_string(),
        default_category_color: DEFAULT_CATEGORY_COLOR.to_string(),
    }
}

pub fn test_state() -> web::Data<AppState> {
    web::Data::new(AppState::with_memory(MemoryStore::new(), test_config()))
}

/// Builds the full route table over the given state, minus CORS and request logging.
macro_rules! init_app {
    ($state:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data($state.clone())
                .wrap(crate::Authentication::new(&$state.config.jwt_secret))
                .configure(crate::configure),
        )
    };
}

pub(crate) use init_app;
