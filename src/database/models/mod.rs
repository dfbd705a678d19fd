pub mod agency;
pub mod brand;
pub mod claim;
pub mod permission;
pub mod product;
pub mod template;
pub mod tool_run;

pub use agency::{sort_agencies, AgencyPriority, VettingAgency, VettingAgencyResponse};
pub use brand::BrandContext;
pub use claim::{Claim, ClaimLevel, ClaimType, CLAIM_COLUMNS};
pub use permission::{BrandRole, GlobalRole, Profile};
pub use product::Product;
pub use template::{flatten_template_row, TemplateFields};
pub use tool_run::{NewToolRun, RunStatus, ToolName};

/// A string column held a value outside the Rust enum
#[derive(Debug, thiserror::Error)]
#[error("unknown {kind} value: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}
