use sea_orm::entity::prelude::*;

/// Refresh-token deny-list. A row either names a single token by the
/// random id embedded in it, or (token_id = "user:<id>") marks a
/// per-user cutoff rejecting every refresh token issued at or before
/// revoked_at. Rows past expires_at are dead weight and get purged
/// opportunistically.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "revoked_tokens")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub token_id: String,

    pub user_id: i32,

    /// Unix timestamp of the revocation
    pub revoked_at: i64,

    /// Unix timestamp after which the row is dead weight (token expiry)
    pub expires_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
