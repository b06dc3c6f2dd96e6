use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A voice actor. Same person shape as `staff`, kept in its own table by
/// provenance; deduplicated by the name quadruple.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "voice_actors")]
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

    pub language: String,
    pub image_extra_large: String,
    pub image_large: String,
    pub image_medium: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    #[sea_orm(column_type = "Text")]
    pub primary_occupations: String,
    pub birth_year: i32,
    pub birth_month: i32,
    pub birth_day: i32,
    pub death_year: i32,
    pub death_month: i32,
    pub death_day: i32,
    pub age: i32,
    #[sea_orm(column_type = "Text")]
    pub years_active: String,
    pub home_town: String,
    pub blood_type: String,
    pub favourites: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
