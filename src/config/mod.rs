use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub ai: AiConfig,
    pub auth_provider: AuthProviderConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub public_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub rate_limit_requests: u32,
    pub rate_limit_window_secs: u64,
    /// Pause before each AI call made by the batch tools.
    pub ai_request_delay_ms: u64,
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub auth_cookie: String,
    pub cors_origins: Vec<String>,
    pub dev_token_expiry_hours: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub deployment: String,
    pub api_version: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthProviderConfig {
    pub url: Option<String>,
    pub service_role_key: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Some(port) = env::var("MIXERAI_API_PORT")
            .ok()
            .or_else(|| env::var("PORT").ok())
            .and_then(|s| s.parse::<u16>().ok())
        {
            self.server.port = port;
        }
        if let Ok(v) = env::var("APP_PUBLIC_URL") {
            self.server.public_url = v;
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // API overrides
        if let Ok(v) = env::var("API_RATE_LIMIT_REQUESTS") {
            self.api.rate_limit_requests = v.parse().unwrap_or(self.api.rate_limit_requests);
        }
        if let Ok(v) = env::var("API_RATE_LIMIT_WINDOW_SECS") {
            self.api.rate_limit_window_secs = v.parse().unwrap_or(self.api.rate_limit_window_secs);
        }
        if let Ok(v) = env::var("API_AI_REQUEST_DELAY_MS") {
            self.api.ai_request_delay_ms = v.parse().unwrap_or(self.api.ai_request_delay_ms);
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_JWT_SECRET").or_else(|_| env::var("SUPABASE_JWT_SECRET")) {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("SECURITY_AUTH_COOKIE") {
            self.security.auth_cookie = v;
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Ok(v) = env::var("SECURITY_DEV_TOKEN_EXPIRY_HOURS") {
            self.security.dev_token_expiry_hours = v.parse().unwrap_or(self.security.dev_token_expiry_hours);
        }

        // AI provider overrides
        if let Ok(v) = env::var("AZURE_OPENAI_ENDPOINT") {
            self.ai.endpoint = Some(v);
        }
        if let Ok(v) = env::var("AZURE_OPENAI_API_KEY") {
            self.ai.api_key = Some(v);
        }
        if let Ok(v) = env::var("AZURE_OPENAI_DEPLOYMENT") {
            self.ai.deployment = v;
        }
        if let Ok(v) = env::var("AZURE_OPENAI_API_VERSION") {
            self.ai.api_version = v;
        }
        if let Ok(v) = env::var("AZURE_OPENAI_TIMEOUT_SECS") {
            self.ai.request_timeout_secs = v.parse().unwrap_or(self.ai.request_timeout_secs);
        }

        // Hosted auth provider (admin API used for invitations)
        if let Ok(v) = env::var("SUPABASE_URL") {
            self.auth_provider.url = Some(v);
        }
        if let Ok(v) = env::var("SUPABASE_SERVICE_ROLE_KEY") {
            self.auth_provider.service_role_key = Some(v);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                port: 3000,
                public_url: "http://localhost:3000".to_string(),
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 30,
            },
            api: ApiConfig {
                rate_limit_requests: 10,
                rate_limit_window_secs: 60,
                ai_request_delay_ms: 5_000,
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                auth_cookie: "sb-access-token".to_string(),
                cors_origins: vec!["http://localhost:3000".to_string()],
                dev_token_expiry_hours: 24 * 7,
            },
            ai: AiConfig {
                endpoint: None,
                api_key: None,
                deployment: "gpt-4o".to_string(),
                api_version: "2024-02-15-preview".to_string(),
                request_timeout_secs: 60,
            },
            auth_provider: AuthProviderConfig {
                url: None,
                service_role_key: None,
            },
        }
    }

    fn staging() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Staging;
        config.server.public_url = "https://staging.example.com".to_string();
        config.database.max_connections = 20;
        config.database.connection_timeout = 10;
        config.api.max_request_size_bytes = 5 * 1024 * 1024; // 5MB
        config.security.cors_origins = vec!["https://staging.example.com".to_string()];
        config.security.dev_token_expiry_hours = 24;
        config
    }

    fn production() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Production;
        config.server.public_url = "https://app.example.com".to_string();
        config.database.max_connections = 50;
        config.database.connection_timeout = 5;
        config.api.max_request_size_bytes = 2 * 1024 * 1024; // 2MB
        config.security.cors_origins = vec!["https://app.example.com".to_string()];
        config.security.dev_token_expiry_hours = 1;
        config
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_production {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Production)
    };
}
