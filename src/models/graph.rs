//! Normalized entity graph produced by the transformer and consumed by the
//! upsert engine. These are plain domain structs; the SeaORM entities live
//! in `crate::entities`.

use crate::entities::enums::{AnimeFormat, AnimeSeason, AnimeSource, AnimeStatus};

/// The AniList name quadruple used as the natural key for characters and
/// people.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameSet {
    pub romaji: String,
    pub english: String,
    pub native: String,
    pub user_preferred: String,
}

impl NameSet {
    /// First non-empty of user-preferred, romaji, english, native.
    pub fn preferred(&self) -> &str {
        [
            &self.user_preferred,
            &self.romaji,
            &self.english,
            &self.native,
        ]
        .into_iter()
        .find(|n| !n.is_empty())
        .map_or("", String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.romaji.is_empty()
            && self.english.is_empty()
            && self.native.is_empty()
            && self.user_preferred.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ImageSet {
    pub extra_large: String,
    pub large: String,
    pub medium: String,
}

/// A fuzzy calendar date; missing parts are zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateParts {
    pub year: i32,
    pub month: i32,
    pub day: i32,
}

/// The cross-catalog mapping block embedded on the title row.
#[derive(Debug, Clone, Default)]
pub struct MappingBlock {
    pub anidb: i32,
    pub anilist: i32,
    pub animeplanet: String,
    pub anisearch: i32,
    pub kitsu: i32,
    pub livechart: i32,
    pub mal: i32,
    pub notifymoe: String,
    pub tmdb: i32,
    pub tvdb: i32,
    pub fribb_type: String,
}

#[derive(Debug, Clone, Default)]
pub struct ScoreBlock {
    pub average: i32,
    pub mean: i32,
    pub popularity: i32,
    pub trending: i32,
    pub favourites: i32,
}

/// Scalar attributes of one title.
#[derive(Debug, Clone)]
pub struct AnimeRecord {
    pub title: NameSet,
    pub mapping: MappingBlock,
    pub format: AnimeFormat,
    pub status: AnimeStatus,
    pub season: AnimeSeason,
    pub season_year: i32,
    pub source: AnimeSource,
    pub duration: i32,
    pub country_of_origin: String,
    pub hashtag: String,
    pub cover: ImageSet,
    pub cover_color: String,
    pub banner_image: String,
    pub synonyms: Vec<String>,
    pub start_date: DateParts,
    pub end_date: DateParts,
    pub is_adult: bool,
    pub scores: ScoreBlock,
    pub description: String,
}

#[derive(Debug, Clone, Default)]
pub struct CharacterRecord {
    pub name: NameSet,
    pub image: ImageSet,
    pub description: String,
    pub gender: String,
    pub birth_date: DateParts,
    pub age: String,
    pub blood_type: String,
}

/// Person shape shared by staff and voice actors.
#[derive(Debug, Clone, Default)]
pub struct PersonRecord {
    pub name: NameSet,
    pub language: String,
    pub image: ImageSet,
    pub description: String,
    pub primary_occupations: Vec<String>,
    pub birth_date: DateParts,
    pub death_date: DateParts,
    pub age: i32,
    pub years_active: Vec<i64>,
    pub home_town: String,
    pub blood_type: String,
    pub favourites: i32,
}

#[derive(Debug, Clone, Default)]
pub struct StudioRecord {
    pub name: String,
    pub is_animation_studio: bool,
    pub site_url: String,
    pub favourites: i32,
}

#[derive(Debug, Clone, Default)]
pub struct TagRecord {
    pub name: String,
    pub description: String,
    pub category: String,
    pub rank: i32,
    pub is_adult: bool,
}

#[derive(Debug, Clone, Default)]
pub struct LinkRecord {
    pub url: String,
    pub site: String,
    pub link_type: String,
    pub language: String,
    pub color: String,
    pub icon: String,
}

/// A character appearing in a title, with the role on the edge and the
/// actors voicing it.
#[derive(Debug, Clone)]
pub struct CharacterCast {
    pub character: CharacterRecord,
    pub role: String,
    pub voice_actors: Vec<VoiceCast>,
}

#[derive(Debug, Clone)]
pub struct VoiceCast {
    pub person: PersonRecord,
    pub language: String,
}

#[derive(Debug, Clone)]
pub struct StaffCredit {
    pub person: PersonRecord,
    pub role: String,
}

/// Reference to another title by its AniList id. The target may or may not
/// exist in the store yet; the expansion coordinator materializes it.
#[derive(Debug, Clone)]
pub struct RelationRef {
    pub anilist_id: i32,
    pub relation_type: String,
}

#[derive(Debug, Clone)]
pub struct RecommendationRef {
    pub anilist_id: i32,
    pub rating: i32,
}

/// Everything the upsert engine writes for one title.
#[derive(Debug, Clone)]
pub struct AnimeGraph {
    pub record: AnimeRecord,
    pub characters: Vec<CharacterCast>,
    pub staff: Vec<StaffCredit>,
    pub genres: Vec<String>,
    pub studios: Vec<StudioRecord>,
    pub tags: Vec<TagRecord>,
    pub external_links: Vec<LinkRecord>,
    pub relations: Vec<RelationRef>,
    pub recommendations: Vec<RecommendationRef>,
}
