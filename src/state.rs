use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;

use crate::ai::scraper::PageScraper;
use crate::ai::{AzureOpenAi, Generators};
use crate::auth::invite::AuthAdminClient;
use crate::config::AppConfig;
use crate::middleware::RateLimiter;
use crate::permissions::{AccessLookup, PgAccessLookup, Permissions};

/// Token verification settings used by the auth middleware
#[derive(Clone)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub cookie_name: String,
}

/// One limiter per tool so heavy use of one does not lock out the other
pub struct ToolLimits {
    pub alt_text: RateLimiter,
    pub metadata: RateLimiter,
}

impl ToolLimits {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            alt_text: RateLimiter::new(max_requests, window),
            metadata: RateLimiter::new(max_requests, window),
        }
    }
}

/// Shared handles for every request
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub access: Arc<dyn AccessLookup>,
    pub generators: Generators,
    pub scraper: PageScraper,
    pub invites: Option<AuthAdminClient>,
    pub auth: AuthSettings,
    pub limits: Arc<ToolLimits>,
    /// Pause before each AI call of the batch tools
    pub ai_delay: Duration,
}

impl AppState {
    pub fn from_config(config: &AppConfig, db: PgPool) -> anyhow::Result<Self> {
        let provider = AzureOpenAi::from_config(&config.ai)?;
        let invites = AuthAdminClient::from_config(&config.auth_provider);
        if invites.is_none() {
            tracing::warn!("SUPABASE_URL or SUPABASE_SERVICE_ROLE_KEY not set; brand admin invitations are disabled");
        }

        Ok(Self {
            access: Arc::new(PgAccessLookup::new(db.clone())),
            db,
            generators: Generators::new(Arc::new(provider)),
            scraper: PageScraper::new()?,
            invites,
            auth: AuthSettings {
                jwt_secret: config.security.jwt_secret.clone(),
                cookie_name: config.security.auth_cookie.clone(),
            },
            limits: Arc::new(ToolLimits::new(
                config.api.rate_limit_requests,
                Duration::from_secs(config.api.rate_limit_window_secs),
            )),
            ai_delay: Duration::from_millis(config.api.ai_request_delay_ms),
        })
    }

    pub fn permissions(&self) -> Permissions<'_> {
        Permissions::new(self.access.as_ref())
    }
}
