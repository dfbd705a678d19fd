use serde_json::{json, Map, Value};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::invite::{AuthAdminClient, InviteMetadata};
use crate::database::models::{sort_agencies, BrandContext, BrandRole, GlobalRole, Profile, VettingAgency, VettingAgencyResponse};
use crate::database::repository::{count_where, insert_json, select_json, update_json};
use crate::database::DatabaseError;
use crate::error::ApiError;
use crate::utils::{extract_clean_domain, looks_like_uuid};

const SUMMARY_LENGTH: usize = 250;

/// Plain columns copied from a request body when present
const PASSTHROUGH_FIELDS: &[&str] = &[
    "name",
    "country",
    "language",
    "brand_identity",
    "tone_of_voice",
    "brand_color",
    "approved_content_types",
];

/// First 250 characters of the identity, with `...` when cut
pub fn derive_brand_summary(identity: &str) -> String {
    let mut summary: String = identity.chars().take(SUMMARY_LENGTH).collect();
    if identity.chars().count() > SUMMARY_LENGTH {
        summary.push_str("...");
    }
    summary
}

/// Lists (or a string holding a JSON list) become `- item` lines; anything else is stored as given
pub fn format_guardrails(value: &Value) -> Value {
    let items = match value {
        Value::Array(items) => Some(items.clone()),
        Value::String(s) if s.trim().starts_with('[') && s.trim().ends_with(']') => {
            match serde_json::from_str::<Value>(s.trim()) {
                Ok(Value::Array(items)) => Some(items),
                _ => None,
            }
        }
        _ => None,
    };

    match items {
        Some(items) => Value::String(
            items
                .iter()
                .map(|item| match item {
                    Value::String(s) => format!("- {s}"),
                    other => format!("- {other}"),
                })
                .collect::<Vec<_>>()
                .join("\n"),
        ),
        None => value.clone(),
    }
}

/// Column changes for a brand write, derived from the request body.
///
/// `website_url` also sets `normalized_website_domain`; `brand_summary` is
/// derived from a non-empty `brand_identity` unless supplied.
pub fn brand_changes(body: &Map<String, Value>) -> Result<Map<String, Value>, ApiError> {
    let mut changes = Map::new();

    for field in PASSTHROUGH_FIELDS {
        if let Some(value) = body.get(*field) {
            changes.insert((*field).to_string(), value.clone());
        }
    }

    if let Some(website) = body.get("website_url") {
        let normalized = match website {
            Value::Null => Value::Null,
            Value::String(s) if s.trim().is_empty() => Value::Null,
            Value::String(s) => json!(extract_clean_domain(s)),
            _ => return Err(ApiError::bad_request("website_url must be a string or null")),
        };
        changes.insert("website_url".into(), website.clone());
        changes.insert("normalized_website_domain".into(), normalized);
    }

    match body.get("brand_summary") {
        Some(summary) => {
            changes.insert("brand_summary".into(), summary.clone());
        }
        None => {
            if let Some(Value::String(identity)) = body.get("brand_identity") {
                if !identity.is_empty() {
                    changes.insert("brand_summary".into(), json!(derive_brand_summary(identity)));
                }
            }
        }
    }

    if let Some(guardrails) = body.get("guardrails") {
        changes.insert("guardrails".into(), format_guardrails(guardrails));
    }

    Ok(changes)
}

/// Non-blank `name` is required on every brand write
pub fn require_name(body: &Map<String, Value>) -> Result<(), ApiError> {
    match body.get("name").and_then(Value::as_str) {
        Some(name) if !name.trim().is_empty() => Ok(()),
        _ => Err(ApiError::bad_request("Brand name is required")),
    }
}

/// How `selected_agency_ids` should be resolved
#[derive(Debug, PartialEq)]
pub enum AgencySelection {
    Ids(Vec<Uuid>),
    Names(Vec<String>),
}

impl AgencySelection {
    /// The first entry decides: UUID-looking means ids (malformed ids are
    /// skipped), anything else means agency names
    pub fn classify(submitted: &[String]) -> Option<Self> {
        let first = submitted.first()?;
        if looks_like_uuid(first) {
            let ids = submitted
                .iter()
                .filter_map(|id| {
                    let parsed = looks_like_uuid(id).then(|| Uuid::parse_str(id).ok()).flatten();
                    if parsed.is_none() {
                        tracing::warn!("[API Brands PUT] Invalid UUID format for agency id \"{}\". Skipping.", id);
                    }
                    parsed
                })
                .collect();
            Some(AgencySelection::Ids(ids))
        } else {
            Some(AgencySelection::Names(submitted.to_vec()))
        }
    }
}

/// Counts of rows that block a non-cascading brand delete
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrandUsage {
    pub content: i64,
    pub workflows: i64,
}

impl BrandUsage {
    pub fn is_empty(&self) -> bool {
        self.content == 0 && self.workflows == 0
    }

    pub fn blocking_message(&self) -> String {
        format!(
            "Cannot delete brand. It has {} piece{} of content and {} workflow{} associated. Use deleteCascade=true to override.",
            self.content,
            if self.content == 1 { "" } else { "s" },
            self.workflows,
            if self.workflows == 1 { "" } else { "s" },
        )
    }
}

pub struct BrandService<'a> {
    pool: &'a PgPool,
}

impl<'a> BrandService<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn find(&self, brand_id: Uuid) -> Result<Option<Map<String, Value>>, DatabaseError> {
        select_json(self.pool, "brands", brand_id).await
    }

    /// Prompt-facing fields of a brand
    pub async fn context(&self, brand_id: Uuid) -> Result<Option<BrandContext>, DatabaseError> {
        let context = sqlx::query_as::<_, BrandContext>(
            "SELECT name, brand_identity, tone_of_voice, guardrails, language, country FROM brands WHERE id = $1",
        )
        .bind(brand_id)
        .fetch_optional(self.pool)
        .await?;
        Ok(context)
    }

    /// Every brand, or only `ids` when given, ordered by name
    pub async fn list(&self, ids: Option<&[Uuid]>) -> Result<Vec<Value>, DatabaseError> {
        let rows: Vec<Value> = match ids {
            Some(ids) => {
                sqlx::query_scalar("SELECT row_to_json(b) FROM brands b WHERE b.id = ANY($1) ORDER BY b.name")
                    .bind(ids)
                    .fetch_all(self.pool)
                    .await?
            }
            None => {
                sqlx::query_scalar("SELECT row_to_json(b) FROM brands b ORDER BY b.name")
                    .fetch_all(self.pool)
                    .await?
            }
        };
        Ok(rows)
    }

    pub async fn create(&self, record: &Map<String, Value>) -> Result<Map<String, Value>, DatabaseError> {
        insert_json(self.pool, "brands", record).await
    }

    /// Applies `changes`, or re-reads the row when there is nothing to write
    pub async fn update(
        &self,
        brand_id: Uuid,
        changes: &Map<String, Value>,
    ) -> Result<Option<Map<String, Value>>, DatabaseError> {
        if changes.is_empty() {
            self.find(brand_id).await
        } else {
            update_json(self.pool, "brands", brand_id, changes).await
        }
    }

    /// Linked vetting agencies, by numeric priority then name
    pub async fn selected_agencies(&self, brand_id: Uuid) -> Result<Vec<VettingAgencyResponse>, DatabaseError> {
        let rows: Vec<VettingAgency> = sqlx::query_as(
            "SELECT a.id, a.name, a.description, a.country_code, a.priority::text AS priority \
             FROM brand_selected_agencies s \
             JOIN content_vetting_agencies a ON a.id = s.agency_id \
             WHERE s.brand_id = $1",
        )
        .bind(brand_id)
        .fetch_all(self.pool)
        .await?;

        let mut agencies: Vec<VettingAgencyResponse> = rows.into_iter().map(Into::into).collect();
        sort_agencies(&mut agencies);
        Ok(agencies)
    }

    /// Profiles of the users holding `brand_admin` on the brand
    pub async fn admins(&self, brand_id: Uuid) -> Result<Vec<Profile>, DatabaseError> {
        let profiles = sqlx::query_as::<_, Profile>(
            "SELECT p.id, p.full_name, p.email, p.avatar_url, p.job_title \
             FROM user_brand_permissions ubp \
             JOIN profiles p ON p.id = ubp.user_id \
             WHERE ubp.brand_id = $1 AND ubp.role::text = $2",
        )
        .bind(brand_id)
        .bind(BrandRole::BrandAdmin.as_str())
        .fetch_all(self.pool)
        .await?;
        Ok(profiles)
    }

    pub async fn usage(&self, brand_id: Uuid) -> Result<BrandUsage, DatabaseError> {
        let (content, workflows) = futures::try_join!(
            count_where(self.pool, "content", "brand_id", brand_id),
            count_where(self.pool, "workflows", "brand_id", brand_id),
        )?;
        Ok(BrandUsage { content, workflows })
    }

    /// Make the `brand_admin` holders match `emails`.
    ///
    /// Unknown emails are invited through the auth provider; a failed lookup
    /// or invite skips that email and the rest still apply.
    pub async fn sync_admins(
        &self,
        brand_id: Uuid,
        emails: &[String],
        invites: Option<&AuthAdminClient>,
    ) -> Result<(), DatabaseError> {
        let wanted: Vec<String> = emails.iter().map(|e| e.trim().to_lowercase()).filter(|e| !e.is_empty()).collect();

        let current: Vec<(Uuid, Option<String>)> = sqlx::query_as(
            "SELECT ubp.user_id, p.email \
             FROM user_brand_permissions ubp \
             LEFT JOIN profiles p ON p.id = ubp.user_id \
             WHERE ubp.brand_id = $1 AND ubp.role::text = $2",
        )
        .bind(brand_id)
        .bind(BrandRole::BrandAdmin.as_str())
        .fetch_all(self.pool)
        .await?;

        let current_emails: Vec<String> = current
            .iter()
            .filter_map(|(_, email)| email.as_ref().map(|e| e.to_lowercase()))
            .collect();

        let to_remove: Vec<Uuid> = current
            .iter()
            .filter(|(_, email)| email.as_ref().is_some_and(|e| !wanted.contains(&e.to_lowercase())))
            .map(|(user_id, _)| *user_id)
            .collect();

        if !to_remove.is_empty() {
            sqlx::query(
                "DELETE FROM user_brand_permissions \
                 WHERE brand_id = $1 AND user_id = ANY($2) AND role::text = $3",
            )
            .bind(brand_id)
            .bind(&to_remove)
            .bind(BrandRole::BrandAdmin.as_str())
            .execute(self.pool)
            .await?;
        }

        let mut grants = Vec::new();
        for email in wanted.iter().filter(|e| !current_emails.contains(e)) {
            match self.find_user_by_email(email).await {
                Ok(Some(user_id)) => grants.push(user_id),
                Ok(None) => {
                    if let Some(user_id) = self.invite_admin(email, brand_id, invites).await {
                        grants.push(user_id);
                    }
                }
                Err(e) => tracing::error!("[API Brands PUT] Error looking up user {}: {}", email, e),
            }
        }

        if !grants.is_empty() {
            let mut tx = self.pool.begin().await?;
            for user_id in &grants {
                sqlx::query(
                    "INSERT INTO user_brand_permissions (user_id, brand_id, role) VALUES ($1, $2, 'brand_admin') \
                     ON CONFLICT (user_id, brand_id) DO UPDATE SET role = EXCLUDED.role",
                )
                .bind(user_id)
                .bind(brand_id)
                .execute(&mut *tx)
                .await?;
            }
            tx.commit().await?;
        }

        Ok(())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<Uuid>, DatabaseError> {
        let id: Option<Uuid> = sqlx::query_scalar("SELECT id FROM profiles WHERE lower(email) = $1 LIMIT 1")
            .bind(email)
            .fetch_optional(self.pool)
            .await?;
        Ok(id)
    }

    async fn invite_admin(&self, email: &str, brand_id: Uuid, invites: Option<&AuthAdminClient>) -> Option<Uuid> {
        let Some(client) = invites else {
            tracing::warn!("[API Brands PUT] Cannot invite {}: auth provider admin API not configured", email);
            return None;
        };

        let metadata = InviteMetadata {
            role: GlobalRole::Editor.as_str().to_string(),
            invited_to_brand: brand_id,
            invited_as_brand_role: BrandRole::BrandAdmin.as_str().to_string(),
        };
        match client.invite(email, &metadata).await {
            Ok(user) => {
                tracing::info!("[API Brands PUT] Invited {} as brand admin of {}", email, brand_id);
                Some(user.id)
            }
            Err(e) => {
                tracing::error!("[API Brands PUT] Failed to invite user {}: {}", email, e);
                None
            }
        }
    }

    /// Replace the brand's agency links with `submitted` (ids or names).
    /// Names resolve against agencies of `country`; unresolved entries are skipped.
    pub async fn replace_agencies(
        &self,
        brand_id: Uuid,
        submitted: &[String],
        country: Option<&str>,
    ) -> Result<usize, DatabaseError> {
        let agency_ids = match AgencySelection::classify(submitted) {
            None => Vec::new(),
            Some(AgencySelection::Ids(ids)) => ids,
            Some(AgencySelection::Names(names)) => self.resolve_agency_names(&names, country).await,
        };

        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM brand_selected_agencies WHERE brand_id = $1")
            .bind(brand_id)
            .execute(&mut *tx)
            .await?;
        for agency_id in &agency_ids {
            sqlx::query("INSERT INTO brand_selected_agencies (brand_id, agency_id) VALUES ($1, $2)")
                .bind(brand_id)
                .bind(agency_id)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;

        Ok(agency_ids.len())
    }

    async fn resolve_agency_names(&self, names: &[String], country: Option<&str>) -> Vec<Uuid> {
        let Some(country) = country.filter(|c| !c.is_empty()) else {
            tracing::warn!("[API Brands PUT] Cannot resolve agency names to ids because brand country is not available.");
            return Vec::new();
        };

        let found: Vec<(Uuid, String)> = match sqlx::query_as(
            "SELECT id, name FROM content_vetting_agencies WHERE name = ANY($1) AND country_code = $2",
        )
        .bind(names)
        .bind(country)
        .fetch_all(self.pool)
        .await
        {
            Ok(rows) => rows,
            Err(e) => {
                tracing::error!("[API Brands PUT] Error fetching agencies by name: {}", e);
                return Vec::new();
            }
        };

        names
            .iter()
            .filter_map(|name| {
                let id = found.iter().find(|(_, n)| n == name).map(|(id, _)| *id);
                if id.is_none() {
                    tracing::warn!("[API Brands PUT] Agency \"{}\" for country {} not found. Skipping.", name, country);
                }
                id
            })
            .collect()
    }

    /// Runs `delete_brand_and_dependents`; a "Brand not found" raise becomes `NotFound`
    pub async fn delete_with_dependents(&self, brand_id: Uuid) -> Result<(), DatabaseError> {
        let result = sqlx::query("SELECT delete_brand_and_dependents($1)")
            .bind(brand_id)
            .execute(self.pool)
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) => {
                let err = DatabaseError::from(e);
                if err.raised_message().is_some_and(|m| m.contains("Brand not found")) {
                    Err(DatabaseError::NotFound(format!("brand {brand_id}")))
                } else {
                    Err(err)
                }
            }
        }
    }
}

/// `name` of a brand row, empty when missing
pub fn brand_name(brand: &Map<String, Value>) -> &str {
    brand.get("name").and_then(Value::as_str).unwrap_or_default()
}
