use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Platform-wide role carried in the token's `user_metadata.role`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GlobalRole {
    Admin,
    Editor,
    Viewer,
}

impl GlobalRole {
    /// Missing or unrecognised roles get the least privilege
    pub fn from_metadata(role: Option<&str>) -> Self {
        match role {
            Some("admin") => GlobalRole::Admin,
            Some("editor") => GlobalRole::Editor,
            _ => GlobalRole::Viewer,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GlobalRole::Admin => "admin",
            GlobalRole::Editor => "editor",
            GlobalRole::Viewer => "viewer",
        }
    }

    pub fn is_admin(&self) -> bool {
        *self == GlobalRole::Admin
    }

    /// Admins and editors may use templates and the AI tools
    pub fn can_author(&self) -> bool {
        matches!(self, GlobalRole::Admin | GlobalRole::Editor)
    }
}

/// Role stored in `user_brand_permissions.role`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrandRole {
    Admin,
    BrandAdmin,
    Editor,
    Viewer,
}

impl BrandRole {
    pub fn parse(role: &str) -> Option<Self> {
        match role {
            "admin" => Some(BrandRole::Admin),
            "brand_admin" => Some(BrandRole::BrandAdmin),
            "editor" => Some(BrandRole::Editor),
            "viewer" => Some(BrandRole::Viewer),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BrandRole::Admin => "admin",
            BrandRole::BrandAdmin => "brand_admin",
            BrandRole::Editor => "editor",
            BrandRole::Viewer => "viewer",
        }
    }

    /// Both spellings of brand administration grant the same rights
    pub fn has_admin_rights(&self) -> bool {
        matches!(self, BrandRole::Admin | BrandRole::BrandAdmin)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub id: Uuid,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
    pub job_title: Option<String>,
}
