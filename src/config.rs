use std::env;

use thiserror::Error;

pub const DEFAULT_CATEGORY_COLOR: &str = "hsl(var(--muted))";

/// Ten years.
pub const MAX_JWT_TTL_HOURS: i64 = 24 * 365 * 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    /// `None` runs the service on the in-memory store.
    pub mongo_uri: Option<String>,
    pub database_name: String,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub bcrypt_cost: u32,
    pub frontend_origin: String,
    pub default_category_color: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_ttl_hours = match lookup("JWT_TTL_HOURS") {
            Some(raw) => match raw.parse::<i64>() {
                Ok(hours) if (1..=MAX_JWT_TTL_HOURS).contains(&hours) => hours,
                _ => return Err(ConfigError::Invalid { name: "JWT_TTL_HOURS", value: raw }),
            },
            None => 24,
        };

        let bcrypt_cost = match lookup("BCRYPT_COST") {
            Some(raw) => match raw.parse::<u32>() {
                Ok(cost) if (4..=31).contains(&cost) => cost,
                _ => return Err(ConfigError::Invalid { name: "BCRYPT_COST", value: raw }),
            },
            None => bcrypt::DEFAULT_COST,
        };

        Ok(Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:8080".to_string()),
            mongo_uri: lookup("MONGO_URI").filter(|uri| !uri.trim().is_empty()),
            database_name: lookup("DATABASE_NAME").unwrap_or_else(|| "pomodo".to_string()),
            jwt_secret: lookup("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?,
            jwt_ttl_hours,
            bcrypt_cost,
            frontend_origin: lookup("FRONTEND_ORIGIN")
                .unwrap_or_else(|| "http://localhost:5173".to_string()),
            default_category_color: lookup("DEFAULT_CATEGORY_COLOR")
                .unwrap_or_else(|| DEFAULT_CATEGORY_COLOR.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_secret_is_set() {
        let config = Config::from_lookup(lookup_from(&[("JWT_SECRET", "s3cret")])).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
        assert!(config.mongo_uri.is_none());
        assert_eq!(config.database_name, "pomodo");
        assert_eq!(config.jwt_ttl_hours, 24);
        assert_eq!(config.bcrypt_cost, bcrypt::DEFAULT_COST);
        assert_eq!(config.frontend_origin, "http://localhost:5173");
        assert_eq!(config.default_category_color, DEFAULT_CATEGORY_COLOR);
    }

    #[test]
    fn missing_secret_is_an_error() {
        let err = Config::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("JWT_SECRET")));
    }

    #[test]
    fn blank_mongo_uri_falls_back_to_memory() {
        let config = Config::from_lookup(lookup_from(&[
            ("JWT_SECRET", "s3cret"),
            ("MONGO_URI", "  "),
        ]))
        .unwrap();
        assert!(config.mongo_uri.is_none());
    }

    #[test]
    fn out_of_range_bcrypt_cost_is_rejected() {
        let err = Config::from_lookup(lookup_from(&[
            ("JWT_SECRET", "s3cret"),
            ("BCRYPT_COST", "2"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "BCRYPT_COST", .. }));
    }

    #[test]
    fn oversized_ttl_is_rejected() {
        for raw in ["100000000000", "87601"] {
            let err = Config::from_lookup(lookup_from(&[
                ("JWT_SECRET", "s3cret"),
                ("JWT_TTL_HOURS", raw),
            ]))
            .unwrap_err();
            assert!(matches!(err, ConfigError::Invalid { name: "JWT_TTL_HOURS", .. }));
        }

        let config = Config::from_lookup(lookup_from(&[
            ("JWT_SECRET", "s3cret"),
            ("JWT_TTL_HOURS", "87600"),
        ]))
        .unwrap();
        assert_eq!(config.jwt_ttl_hours, MAX_JWT_TTL_HOURS);
    }

    #[test]
    fn non_numeric_ttl_is_rejected() {
        let err = Config::from_lookup(lookup_from(&[
            ("JWT_SECRET", "s3cret"),
            ("JWT_TTL_HOURS", "forever"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "JWT_TTL_HOURS", .. }));
    }
}
