use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// External links are owned by one title and rewritten wholesale on every
/// sync pass. (anime_id, url) is unique.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "external_links")]
pub struct Model {
    #[sea_orm(primary_key)]
    #[serde(skip_deserializing)]
    pub id: i32,
    #[serde(skip_serializing)]
    pub anime_id: i32,
    pub url: String,
    pub site: String,
    pub link_type: String,
    pub language: String,
    pub color: String,
    pub icon: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
