use std::{env::var, fmt, sync::Arc};

use sentry::types::Dsn;
use tracing::{error, warn};

use crate::{lms::LmsClient, store::Store};

#[derive(Debug, Clone)]
pub struct AppState {
    pub lms: LmsClient,
    pub store: Arc<Store>,
    pub env_vars: EnvVars,
}

#[derive(Debug, Clone)]
pub struct EnvVars {
    pub environment: Environment,
    pub port: u16,
    pub lms_base_url: String,
    pub lms_token: String,
    pub allowed_origins: Vec<String>,
    pub request_body_size_limit: usize,
    pub request_timeout_in_ms: u64,
    pub upstream_timeout_in_ms: u64,
    pub sentry_dsn: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl From<String> for Environment {
    fn from(s: String) -> Self {
        match s.to_lowercase().as_str() {
            "development" => Environment::Development,
            "staging" => Environment::Staging,
            "production" => Environment::Production,
            other => {
                warn!(
                    "ENVIRONMENT value '{}' is not valid. Defaulting to 'production'.",
                    other
                );
                Environment::Production
            }
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        };
        f.write_str(s)
    }
}

pub const DEFAULT_LMS_BASE_URL: &str = "https://todu.mn/bs/lms/v1";

impl EnvVars {
    pub fn new() -> Self {
        let environment = match var("ENVIRONMENT") {
            Ok(v) => v.into(),
            Err(_e) => {
                warn!("ENVIRONMENT not set. Defaulting to 'production'.");
                Environment::Production
            }
        };

        let port = match var("PORT") {
            Ok(port_string) => port_string.parse().expect("PORT to be parseable as u16"),
            Err(_e) => {
                let default_port = 3001;
                warn!("PORT not set. Defaulting to {default_port}");
                default_port
            }
        };

        let lms_base_url = match var("LMS_BASE_URL") {
            Ok(s) if !s.is_empty() => s,
            _ => {
                warn!("LMS_BASE_URL not set. Defaulting to {DEFAULT_LMS_BASE_URL}");
                DEFAULT_LMS_BASE_URL.to_string()
            }
        };

        let Ok(lms_token) = var("LMS_TOKEN") else {
            error!("LMS_TOKEN not set");
            panic!("LMS_TOKEN required");
        };
        assert!(!lms_token.is_empty(), "LMS_TOKEN must not be empty");

        let allowed_origins = match var("ALLOWED_ORIGINS") {
            Ok(s) => parse_origins(&s),
            Err(_e) => {
                if environment != Environment::Development {
                    warn!("ALLOWED_ORIGINS not set. Cross-origin requests will be rejected.");
                }
                vec![]
            }
        };

        let request_timeout_in_ms = match var("REQUEST_TIMEOUT_IN_MS") {
            Ok(s) => s
                .parse()
                .expect("REQUEST_TIMEOUT_IN_MS to be valid unsigned integer"),
            Err(_e) => {
                let default_request_timeout = 30_000;
                warn!("REQUEST_TIMEOUT_IN_MS not set. Defaulting to {default_request_timeout}");
                default_request_timeout
            }
        };

        let upstream_timeout_in_ms = match var("UPSTREAM_TIMEOUT_IN_MS") {
            Ok(s) => s
                .parse()
                .expect("UPSTREAM_TIMEOUT_IN_MS to be valid unsigned integer"),
            Err(_e) => {
                let default_upstream_timeout = 15_000;
                warn!("UPSTREAM_TIMEOUT_IN_MS not set. Defaulting to {default_upstream_timeout}");
                default_upstream_timeout
            }
        };

        let request_body_size_limit = match var("REQUEST_BODY_SIZE_LIMIT") {
            Ok(s) => s
                .parse()
                .expect("REQUEST_BODY_SIZE_LIMIT to be valid unsigned integer"),
            Err(_e) => {
                let base: usize = 2;
                let exp = 20;
                let default_request_body_size_limit = 5 * base.pow(exp);
                warn!(
                    "REQUEST_BODY_SIZE_LIMIT not set. Defaulting to {default_request_body_size_limit}"
                );
                default_request_body_size_limit
            }
        };

        let sentry_dsn = match var("SENTRY_DSN") {
            Ok(dsn_string) => {
                assert!(
                    valid_sentry_dsn(&dsn_string),
                    "SENTRY_DSN is not valid DSN."
                );
                Some(dsn_string)
            }
            Err(_e) => {
                warn!("SENTRY_DSN not set.");
                None
            }
        };

        EnvVars {
            environment,
            port,
            lms_base_url,
            lms_token,
            allowed_origins,
            request_body_size_limit,
            request_timeout_in_ms,
            upstream_timeout_in_ms,
            sentry_dsn,
        }
    }
}

/// Splits a comma separated origin list, ignoring blanks and trailing slashes.
pub fn parse_origins(s: &str) -> Vec<String> {
    s.split(',')
        .map(|o| o.trim().trim_end_matches('/'))
        .filter(|o| !o.is_empty())
        .map(String::from)
        .collect()
}

fn valid_sentry_dsn(url: &str) -> bool {
    url.parse::<Dsn>().is_ok()
}
