use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A character shared across titles. The name quadruple is the natural key
/// (composite unique index, created by the initial migration).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "characters")]
pub struct Model {
    #[sea_orm(primary_key)]
    #[serde(skip_deserializing)]
    pub id: i32,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,

    pub name_romaji: String,
    pub name_english: String,
    pub name_native: String,
    pub name_user_preferred: String,

    pub image_extra_large: String,
    pub image_large: String,
    pub image_medium: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub gender: String,
    pub birth_year: i32,
    pub birth_month: i32,
    pub birth_day: i32,
    pub age: String,
    pub blood_type: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
