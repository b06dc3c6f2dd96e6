use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// AniList media formats. Unknown remote values fall back to `Tv`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnimeFormat {
    #[sea_orm(string_value = "TV")]
    Tv,
    #[sea_orm(string_value = "TV_SHORT")]
    TvShort,
    #[sea_orm(string_value = "MOVIE")]
    Movie,
    #[sea_orm(string_value = "SPECIAL")]
    Special,
    #[sea_orm(string_value = "OVA")]
    Ova,
    #[sea_orm(string_value = "ONA")]
    Ona,
    #[sea_orm(string_value = "MUSIC")]
    Music,
    #[sea_orm(string_value = "MANGA")]
    Manga,
    #[sea_orm(string_value = "NOVEL")]
    Novel,
    #[sea_orm(string_value = "ONE_SHOT")]
    OneShot,
}

impl AnimeFormat {
    pub fn from_remote(value: &str) -> Self {
        match value {
            "TV_SHORT" => Self::TvShort,
            "MOVIE" => Self::Movie,
            "SPECIAL" => Self::Special,
            "OVA" => Self::Ova,
            "ONA" => Self::Ona,
            "MUSIC" => Self::Music,
            "MANGA" => Self::Manga,
            "NOVEL" => Self::Novel,
            "ONE_SHOT" => Self::OneShot,
            _ => Self::Tv,
        }
    }
}

/// Airing status. Unknown remote values fall back to `Releasing` so the
/// title is revisited on the next pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnimeStatus {
    #[sea_orm(string_value = "RELEASING")]
    Releasing,
    #[sea_orm(string_value = "FINISHED")]
    Finished,
    #[sea_orm(string_value = "NOT_YET_RELEASED")]
    NotYetReleased,
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
    #[sea_orm(string_value = "HIATUS")]
    Hiatus,
}

impl AnimeStatus {
    pub fn from_remote(value: &str) -> Self {
        match value {
            "FINISHED" => Self::Finished,
            "NOT_YET_RELEASED" => Self::NotYetReleased,
            "CANCELLED" => Self::Cancelled,
            "HIATUS" => Self::Hiatus,
            _ => Self::Releasing,
        }
    }

    /// Terminal titles are never re-fetched by the synchronizer.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Finished | Self::Cancelled | Self::Hiatus)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnimeSeason {
    #[sea_orm(string_value = "WINTER")]
    Winter,
    #[sea_orm(string_value = "SPRING")]
    Spring,
    #[sea_orm(string_value = "SUMMER")]
    Summer,
    #[sea_orm(string_value = "FALL")]
    Fall,
}

impl AnimeSeason {
    pub fn from_remote(value: &str) -> Self {
        match value {
            "SPRING" => Self::Spring,
            "SUMMER" => Self::Summer,
            "FALL" => Self::Fall,
            _ => Self::Winter,
        }
    }
}

/// Source material. Unknown remote values fall back to `Original`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnimeSource {
    #[sea_orm(string_value = "ORIGINAL")]
    Original,
    #[sea_orm(string_value = "MANGA")]
    Manga,
    #[sea_orm(string_value = "LIGHT_NOVEL")]
    LightNovel,
    #[sea_orm(string_value = "VISUAL_NOVEL")]
    VisualNovel,
    #[sea_orm(string_value = "VIDEO_GAME")]
    VideoGame,
    #[sea_orm(string_value = "OTHER")]
    Other,
    #[sea_orm(string_value = "DOUJINSHI")]
    Doujinshi,
    #[sea_orm(string_value = "ANIME")]
    Anime,
    #[sea_orm(string_value = "WEB_NOVEL")]
    WebNovel,
    #[sea_orm(string_value = "LIVE_ACTION")]
    LiveAction,
    #[sea_orm(string_value = "GAME")]
    Game,
    #[sea_orm(string_value = "COMIC")]
    Comic,
    #[sea_orm(string_value = "MULTIMEDIA_PROJECT")]
    MultimediaProject,
    #[sea_orm(string_value = "PICTURE_BOOK")]
    PictureBook,
}

impl AnimeSource {
    pub fn from_remote(value: &str) -> Self {
        match value {
            "MANGA" => Self::Manga,
            "LIGHT_NOVEL" => Self::LightNovel,
            "VISUAL_NOVEL" => Self::VisualNovel,
            "VIDEO_GAME" => Self::VideoGame,
            "OTHER" => Self::Other,
            "DOUJINSHI" => Self::Doujinshi,
            "ANIME" => Self::Anime,
            "WEB_NOVEL" => Self::WebNovel,
            "LIVE_ACTION" => Self::LiveAction,
            "GAME" => Self::Game,
            "COMIC" => Self::Comic,
            "MULTIMEDIA_PROJECT" => Self::MultimediaProject,
            "PICTURE_BOOK" => Self::PictureBook,
            _ => Self::Original,
        }
    }
}
