pub mod url;

pub use url::{extract_clean_domain, looks_like_uuid};
