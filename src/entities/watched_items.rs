use sea_orm::entity::prelude::*;

/// One tracked movie/series/book per user. Uniqueness over
/// (user_id, media_id) is enforced by a migration index.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "watched_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub user_id: i32,

    /// "movie", "series" or "book"
    pub media_type: String,

    /// Identifier in the external catalog (IMDb id, Google Books volume id)
    pub media_id: String,

    pub title: String,

    pub poster_path: String,

    pub release_date: String,

    pub status: String,

    pub current_episode: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
