pub mod brand_service;
pub mod claim_service;
pub mod product_service;
pub mod template_service;
pub mod tool_history;

pub use brand_service::BrandService;
pub use claim_service::ClaimService;
pub use product_service::ProductService;
pub use template_service::TemplateService;
