pub mod article_titles;
pub mod template_description;
pub mod workflow_description;

pub use article_titles::post as article_titles_post;
pub use template_description::post as template_description_post;
pub use workflow_description::post as workflow_description_post;
