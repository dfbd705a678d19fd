use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Largest integer a JSON client can hold exactly; used for unranked agencies
pub const UNRANKED_PRIORITY: i64 = 9_007_199_254_740_991;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgencyPriority {
    High,
    Medium,
    Low,
}

impl AgencyPriority {
    pub fn parse(value: Option<&str>) -> Option<Self> {
        match value? {
            "High" => Some(AgencyPriority::High),
            "Medium" => Some(AgencyPriority::Medium),
            "Low" => Some(AgencyPriority::Low),
            _ => None,
        }
    }

    pub fn rank(priority: Option<Self>) -> i64 {
        match priority {
            Some(AgencyPriority::High) => 1,
            Some(AgencyPriority::Medium) => 2,
            Some(AgencyPriority::Low) => 3,
            None => UNRANKED_PRIORITY,
        }
    }
}

/// Row of `content_vetting_agencies` with `priority` cast to text
#[derive(Debug, Clone, FromRow)]
pub struct VettingAgency {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub country_code: String,
    pub priority: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VettingAgencyResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub country_code: String,
    pub priority: i64,
}

impl From<VettingAgency> for VettingAgencyResponse {
    fn from(agency: VettingAgency) -> Self {
        let priority = AgencyPriority::rank(AgencyPriority::parse(agency.priority.as_deref()));
        Self {
            id: agency.id,
            name: agency.name,
            description: agency.description,
            country_code: agency.country_code,
            priority,
        }
    }
}

/// Numeric priority first, then name
pub fn sort_agencies(agencies: &mut [VettingAgencyResponse]) {
    agencies.sort_by(|a, b| match a.priority.cmp(&b.priority) {
        Ordering::Equal => a.name.cmp(&b.name),
        other => other,
    });
}
