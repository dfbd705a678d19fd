use clap::Args;
use serde_json::json;
use uuid::Uuid;

use crate::auth::{generate_jwt, Claims};
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config::config;
use crate::database::models::GlobalRole;

#[derive(Args)]
pub struct TokenArgs {
    #[arg(long, help = "User id (random when omitted)")]
    pub user: Option<Uuid>,

    #[arg(long, help = "Email claim")]
    pub email: Option<String>,

    #[arg(long, default_value = "viewer", help = "Global role: admin, editor or viewer")]
    pub role: String,

    #[arg(long, help = "Lifetime in hours (defaults to the environment's dev token expiry)")]
    pub hours: Option<u64>,
}

pub fn handle(args: TokenArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let config = config();
    let user_id = args.user.unwrap_or_else(Uuid::new_v4);
    let role = GlobalRole::from_metadata(Some(&args.role));
    let hours = args.hours.unwrap_or(config.security.dev_token_expiry_hours);

    let claims = Claims::new(user_id, args.email, role, hours);
    let token = generate_jwt(&claims, &config.security.jwt_secret)?;

    match output_format {
        OutputFormat::Json => output_success(
            &output_format,
            "Token generated",
            Some(json!({
                "token": token,
                "user_id": user_id,
                "role": role.as_str(),
                "expires_at": claims.exp,
            })),
        ),
        OutputFormat::Text => {
            println!("{}", token);
            Ok(())
        }
    }
}
