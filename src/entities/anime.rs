use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::enums::{AnimeFormat, AnimeSeason, AnimeSource, AnimeStatus};

/// A title as known to AniList, with the cross-catalog mapping block
/// embedded as columns. `anilist_id` is the stable external key.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "anime")]
pub struct Model {
    #[sea_orm(primary_key)]
    #[serde(skip_deserializing)]
    pub id: i32,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,

    pub title_romaji: String,
    pub title_english: String,
    pub title_native: String,
    pub title_user_preferred: String,

    pub anidb_id: i32,
    #[sea_orm(unique)]
    pub anilist_id: i32,
    pub animeplanet_id: String,
    pub anisearch_id: i32,
    pub kitsu_id: i32,
    pub livechart_id: i32,
    pub mal_id: i32,
    pub notifymoe_id: String,
    pub tmdb_id: i32,
    pub tvdb_id: i32,
    pub fribb_type: String,

    pub format: AnimeFormat,
    pub status: AnimeStatus,
    pub season: AnimeSeason,
    pub season_year: i32,
    pub source: AnimeSource,
    pub duration: i32,
    pub country_of_origin: String,
    pub hashtag: String,

    pub cover_extra_large: String,
    pub cover_large: String,
    pub cover_medium: String,
    pub cover_color: String,
    pub banner_image: String,
    /// JSON-encoded list of alternative titles.
    #[sea_orm(column_type = "Text")]
    pub synonyms: String,

    pub start_year: i32,
    pub start_month: i32,
    pub start_day: i32,
    pub end_year: i32,
    pub end_month: i32,
    pub end_day: i32,

    pub is_adult: bool,
    pub score_average: i32,
    pub score_mean: i32,
    pub score_popularity: i32,
    pub score_trending: i32,
    pub score_favourites: i32,
    #[sea_orm(column_type = "Text")]
    pub description: String,
}

impl Model {
    /// First non-empty of user-preferred, romaji, english, native.
    pub fn preferred_title(&self) -> &str {
        [
            &self.title_user_preferred,
            &self.title_romaji,
            &self.title_english,
            &self.title_native,
        ]
        .into_iter()
        .find(|t| !t.is_empty())
        .map_or("", String::as_str)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
