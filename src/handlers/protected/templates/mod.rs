pub mod collection;
pub mod record;

pub use collection::get as collection_get;
pub use collection::post as collection_post;

pub use record::delete as record_delete;
pub use record::get as record_get;
pub use record::put as record_put;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::handlers::utils::ensure;
use crate::services::template_service::TemplateInput;
use crate::state::AppState;

fn ensure_reader(user: &AuthUser) -> Result<(), ApiError> {
    ensure(
        user.role.can_author(),
        "Forbidden: You do not have permission to access this resource.",
    )
}

/// Fresh description from the template name and field names. Falls back to
/// the submitted description when generation fails.
async fn regenerate_description(state: &AppState, input: &TemplateInput) -> String {
    let fallback = input.description.clone().unwrap_or_default();
    let generated = state
        .generators
        .template_description(&input.name, &input.fields.input_names(), &input.fields.output_names())
        .await;

    match generated {
        Ok(description) if !description.trim().is_empty() => description,
        Ok(_) => fallback,
        Err(e) => {
            tracing::warn!("[API Templates] Description generation failed for \"{}\": {}", input.name, e);
            fallback
        }
    }
}
