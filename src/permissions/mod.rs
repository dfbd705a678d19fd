//! Who may read or change brands, products and claims.
//!
//! Claims and products never reference a brand directly; they hang off a
//! master claim brand, which may in turn be linked to a core brand. Brand
//! permissions live on the core brand, so every check walks
//! claim -> product -> master claim brand -> core brand -> user_brand_permissions.

pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::database::models::{BrandRole, Claim, ClaimLevel};
use crate::database::DatabaseError;
use crate::error::ApiError;

pub use postgres::PgAccessLookup;

/// The parts of a claim that decide who may touch it
#[derive(Debug, Clone)]
pub struct ClaimContext {
    pub level: ClaimLevel,
    pub master_brand_id: Option<Uuid>,
    pub product_id: Option<Uuid>,
    pub created_by: Option<Uuid>,
}

impl From<&Claim> for ClaimContext {
    fn from(claim: &Claim) -> Self {
        Self {
            level: claim.level,
            master_brand_id: claim.master_brand_id,
            product_id: claim.product_id,
            created_by: claim.created_by,
        }
    }
}

/// Relationship lookups the resolver needs from the store
#[async_trait]
pub trait AccessLookup: Send + Sync {
    /// `master_claim_brands.mixerai_brand_id`; `None` for a missing row or a null link
    async fn core_brand_of_master(&self, master_brand_id: Uuid) -> Result<Option<Uuid>, DatabaseError>;

    /// `products.master_brand_id`; `None` for a missing product
    async fn master_brand_of_product(&self, product_id: Uuid) -> Result<Option<Uuid>, DatabaseError>;

    async fn claim_context(&self, claim_id: Uuid) -> Result<Option<ClaimContext>, DatabaseError>;

    /// Raw `user_brand_permissions.role` for the pair, if any
    async fn brand_role(&self, user_id: Uuid, brand_id: Uuid) -> Result<Option<String>, DatabaseError>;

    async fn permitted_brand_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>, DatabaseError>;
}

/// Permission decisions for one request, over any `AccessLookup`
pub struct Permissions<'a> {
    lookup: &'a dyn AccessLookup,
}

impl<'a> Permissions<'a> {
    pub fn new(lookup: &'a dyn AccessLookup) -> Self {
        Self { lookup }
    }

    /// Core brand a claim belongs to. Ingredient claims have none; a broken
    /// link anywhere in the chain is logged and treated as no brand.
    pub async fn core_brand_for_claim(&self, claim: &ClaimContext) -> Option<Uuid> {
        match claim.level {
            ClaimLevel::Brand => {
                let master_brand_id = claim.master_brand_id?;
                self.core_brand_for_master(master_brand_id).await
            }
            ClaimLevel::Product => {
                let product_id = claim.product_id?;
                let master_brand_id = match self.lookup.master_brand_of_product(product_id).await {
                    Ok(Some(id)) => id,
                    Ok(None) => {
                        tracing::warn!("Product {} not found while resolving claim brand", product_id);
                        return None;
                    }
                    Err(e) => {
                        tracing::error!("Error fetching product {} for claim permissions: {}", product_id, e);
                        return None;
                    }
                };
                self.core_brand_for_master(master_brand_id).await
            }
            ClaimLevel::Ingredient => None,
        }
    }

    pub async fn core_brand_for_master(&self, master_brand_id: Uuid) -> Option<Uuid> {
        match self.lookup.core_brand_of_master(master_brand_id).await {
            Ok(core) => core,
            Err(e) => {
                tracing::error!("Error fetching master claim brand {}: {}", master_brand_id, e);
                None
            }
        }
    }

    async fn role_on(&self, user: &AuthUser, brand_id: Uuid) -> Result<Option<BrandRole>, DatabaseError> {
        let role = self.lookup.brand_role(user.id, brand_id).await?;
        Ok(role.as_deref().and_then(BrandRole::parse))
    }

    /// Global admin, or any role on the brand
    pub async fn can_read_brand(&self, user: &AuthUser, brand_id: Uuid) -> Result<bool, DatabaseError> {
        if user.is_admin() {
            return Ok(true);
        }
        Ok(self.lookup.brand_role(user.id, brand_id).await?.is_some())
    }

    /// Global admin, or brand-admin rights on the brand
    pub async fn can_admin_brand(&self, user: &AuthUser, brand_id: Uuid) -> Result<bool, DatabaseError> {
        if user.is_admin() {
            return Ok(true);
        }
        Ok(self
            .role_on(user, brand_id)
            .await?
            .is_some_and(|role| role.has_admin_rights()))
    }

    /// Claim-level write check. A missing claim is `NotFound` for everyone but
    /// global admins, whose writes report a missing row themselves.
    pub async fn can_write_claim(&self, user: &AuthUser, claim_id: Uuid) -> Result<bool, ApiError> {
        if user.is_admin() {
            return Ok(true);
        }

        let claim = self
            .lookup
            .claim_context(claim_id)
            .await
            .map_err(|e| ApiError::from_database(e, "Failed to verify claim for permissions."))?
            .ok_or_else(|| ApiError::not_found("Claim not found."))?;

        if claim.created_by == Some(user.id) {
            return Ok(true);
        }

        match self.core_brand_for_claim(&claim).await {
            Some(brand_id) => match self.role_on(user, brand_id).await {
                Ok(role) => Ok(role.is_some_and(|r| r.has_admin_rights())),
                Err(e) => {
                    tracing::error!("Error fetching brand permissions for claim {}: {}", claim_id, e);
                    Ok(false)
                }
            },
            None => Ok(false),
        }
    }

    /// Global admin, creator, any ingredient claim, or any role on the claim's brand
    pub async fn can_read_claim(&self, user: &AuthUser, claim: &ClaimContext) -> Result<bool, DatabaseError> {
        if user.is_admin() || claim.created_by == Some(user.id) || claim.level == ClaimLevel::Ingredient {
            return Ok(true);
        }
        match self.core_brand_for_claim(claim).await {
            Some(brand_id) => Ok(self.lookup.brand_role(user.id, brand_id).await?.is_some()),
            None => Ok(false),
        }
    }

    /// Creating products (and brand/product claims) under a master claim brand
    /// needs brand-admin rights on its linked core brand
    pub async fn can_manage_products(&self, user: &AuthUser, master_brand_id: Uuid) -> Result<bool, DatabaseError> {
        if user.is_admin() {
            return Ok(true);
        }
        match self.core_brand_for_master(master_brand_id).await {
            Some(brand_id) => self.can_admin_brand(user, brand_id).await,
            None => Ok(false),
        }
    }

    pub async fn permitted_brand_ids(&self, user: &AuthUser) -> Result<Vec<Uuid>, DatabaseError> {
        self.lookup.permitted_brand_ids(user.id).await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::database::models::GlobalRole;

    /// In-memory stand-in for the relationship tables
    #[derive(Default)]
    pub(crate) struct MemoryLookup {
        pub masters: HashMap<Uuid, Option<Uuid>>,
        pub products: HashMap<Uuid, Uuid>,
        pub claims: HashMap<Uuid, ClaimContext>,
        pub roles: HashMap<(Uuid, Uuid), String>,
        pub fail_products: bool,
    }

    #[async_trait]
    impl AccessLookup for MemoryLookup {
        async fn core_brand_of_master(&self, id: Uuid) -> Result<Option<Uuid>, DatabaseError> {
            Ok(self.masters.get(&id).copied().flatten())
        }

        async fn master_brand_of_product(&self, id: Uuid) -> Result<Option<Uuid>, DatabaseError> {
            if self.fail_products {
                return Err(DatabaseError::Sqlx(sqlx::Error::PoolTimedOut));
            }
            Ok(self.products.get(&id).copied())
        }

        async fn claim_context(&self, id: Uuid) -> Result<Option<ClaimContext>, DatabaseError> {
            Ok(self.claims.get(&id).cloned())
        }

        async fn brand_role(&self, user_id: Uuid, brand_id: Uuid) -> Result<Option<String>, DatabaseError> {
            Ok(self.roles.get(&(user_id, brand_id)).cloned())
        }

        async fn permitted_brand_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>, DatabaseError> {
            Ok(self
                .roles
                .keys()
                .filter(|(u, _)| *u == user_id)
                .map(|(_, b)| *b)
                .collect())
        }
    }

    fn user(role: GlobalRole) -> AuthUser {
        AuthUser {
            id: Uuid::new_v4(),
            email: None,
            role,
        }
    }

    fn claim(level: ClaimLevel, master: Option<Uuid>, product: Option<Uuid>) -> ClaimContext {
        ClaimContext {
            level,
            master_brand_id: master,
            product_id: product,
            created_by: None,
        }
    }

    struct Fixture {
        lookup: MemoryLookup,
        brand: Uuid,
        master: Uuid,
        product: Uuid,
    }

    fn fixture() -> Fixture {
        let brand = Uuid::new_v4();
        let master = Uuid::new_v4();
        let product = Uuid::new_v4();
        let mut lookup = MemoryLookup::default();
        lookup.masters.insert(master, Some(brand));
        lookup.products.insert(product, master);
        Fixture {
            lookup,
            brand,
            master,
            product,
        }
    }

    #[tokio::test]
    async fn resolves_core_brand_through_product_chain() {
        let f = fixture();
        let perms = Permissions::new(&f.lookup);

        let via_product = claim(ClaimLevel::Product, None, Some(f.product));
        assert_eq!(perms.core_brand_for_claim(&via_product).await, Some(f.brand));

        let via_master = claim(ClaimLevel::Brand, Some(f.master), None);
        assert_eq!(perms.core_brand_for_claim(&via_master).await, Some(f.brand));

        let ingredient = claim(ClaimLevel::Ingredient, Some(f.master), Some(f.product));
        assert_eq!(perms.core_brand_for_claim(&ingredient).await, None);
    }

    #[tokio::test]
    async fn broken_links_resolve_to_none() {
        let mut f = fixture();
        let unlinked = Uuid::new_v4();
        f.lookup.masters.insert(unlinked, None);
        let perms = Permissions::new(&f.lookup);

        assert_eq!(perms.core_brand_for_claim(&claim(ClaimLevel::Brand, Some(unlinked), None)).await, None);
        assert_eq!(perms.core_brand_for_claim(&claim(ClaimLevel::Brand, None, None)).await, None);
        assert_eq!(
            perms.core_brand_for_claim(&claim(ClaimLevel::Product, None, Some(Uuid::new_v4()))).await,
            None
        );

        f.lookup.fail_products = true;
        let perms = Permissions::new(&f.lookup);
        assert_eq!(perms.core_brand_for_claim(&claim(ClaimLevel::Product, None, Some(f.product))).await, None);
    }

    #[tokio::test]
    async fn claim_writes_need_creator_or_brand_admin() {
        let mut f = fixture();
        let claim_id = Uuid::new_v4();
        let author = user(GlobalRole::Editor);
        let brand_admin = user(GlobalRole::Editor);
        let brand_editor = user(GlobalRole::Editor);
        let mut ctx = claim(ClaimLevel::Product, None, Some(f.product));
        ctx.created_by = Some(author.id);
        f.lookup.claims.insert(claim_id, ctx);
        f.lookup.roles.insert((brand_admin.id, f.brand), "brand_admin".into());
        f.lookup.roles.insert((brand_editor.id, f.brand), "editor".into());
        let perms = Permissions::new(&f.lookup);

        assert!(perms.can_write_claim(&author, claim_id).await.unwrap());
        assert!(perms.can_write_claim(&brand_admin, claim_id).await.unwrap());
        assert!(!perms.can_write_claim(&brand_editor, claim_id).await.unwrap());
        assert!(perms.can_write_claim(&user(GlobalRole::Admin), claim_id).await.unwrap());
    }

    #[tokio::test]
    async fn missing_claim_is_not_found_for_non_admins() {
        let f = fixture();
        let perms = Permissions::new(&f.lookup);
        let err = perms.can_write_claim(&user(GlobalRole::Editor), Uuid::new_v4()).await.unwrap_err();
        assert_eq!(err.status_code(), 404);
        assert!(perms.can_write_claim(&user(GlobalRole::Admin), Uuid::new_v4()).await.unwrap());
    }

    #[tokio::test]
    async fn ingredient_claims_are_readable_but_not_writable_by_brand_admins() {
        let mut f = fixture();
        let claim_id = Uuid::new_v4();
        let viewer = user(GlobalRole::Viewer);
        let ctx = claim(ClaimLevel::Ingredient, None, None);
        f.lookup.claims.insert(claim_id, ctx.clone());
        f.lookup.roles.insert((viewer.id, f.brand), "admin".into());
        let perms = Permissions::new(&f.lookup);

        assert!(perms.can_read_claim(&viewer, &ctx).await.unwrap());
        assert!(!perms.can_write_claim(&viewer, claim_id).await.unwrap());
    }

    #[tokio::test]
    async fn brand_claims_readable_with_any_role() {
        let mut f = fixture();
        let viewer = user(GlobalRole::Viewer);
        let stranger = user(GlobalRole::Viewer);
        f.lookup.roles.insert((viewer.id, f.brand), "viewer".into());
        let ctx = claim(ClaimLevel::Brand, Some(f.master), None);
        let perms = Permissions::new(&f.lookup);

        assert!(perms.can_read_claim(&viewer, &ctx).await.unwrap());
        assert!(!perms.can_read_claim(&stranger, &ctx).await.unwrap());
    }

    #[tokio::test]
    async fn product_management_follows_master_brand_link() {
        let mut f = fixture();
        let owner = user(GlobalRole::Editor);
        let editor = user(GlobalRole::Editor);
        f.lookup.roles.insert((owner.id, f.brand), "admin".into());
        f.lookup.roles.insert((editor.id, f.brand), "editor".into());
        let unlinked = Uuid::new_v4();
        f.lookup.masters.insert(unlinked, None);
        let perms = Permissions::new(&f.lookup);

        assert!(perms.can_manage_products(&owner, f.master).await.unwrap());
        assert!(!perms.can_manage_products(&editor, f.master).await.unwrap());
        assert!(!perms.can_manage_products(&owner, unlinked).await.unwrap());
        assert!(perms.can_manage_products(&user(GlobalRole::Admin), unlinked).await.unwrap());
    }

    #[tokio::test]
    async fn brand_read_and_admin_checks() {
        let mut f = fixture();
        let viewer = user(GlobalRole::Viewer);
        f.lookup.roles.insert((viewer.id, f.brand), "viewer".into());
        let perms = Permissions::new(&f.lookup);

        assert!(perms.can_read_brand(&viewer, f.brand).await.unwrap());
        assert!(!perms.can_admin_brand(&viewer, f.brand).await.unwrap());
        assert!(!perms.can_read_brand(&user(GlobalRole::Editor), f.brand).await.unwrap());
        assert_eq!(perms.permitted_brand_ids(&viewer).await.unwrap(), vec![f.brand]);
    }
}
