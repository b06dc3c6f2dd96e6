//! Read side of the persisted graph: full lookups by AniList id and the
//! paginated keyword search used by the HTTP surface.

use std::collections::HashMap;

use anyhow::Result;
use sea_orm::sea_query::{Expr, ExprTrait, Func};
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder,
};
use serde::Serialize;

use crate::entities::enums::{AnimeFormat, AnimeSeason, AnimeStatus};
use crate::entities::prelude::*;
use crate::entities::{
    anime, anime_character, anime_genre, anime_recommendation, anime_relation, anime_staff,
    anime_studio, anime_tag, character, character_voice_actor, external_link, genre, staff, studio,
    tag, voice_actor,
};

/// Full graph for one title, shaped for serialization.
#[derive(Debug, Serialize)]
pub struct AnimeDetail {
    #[serde(flatten)]
    pub anime: anime::Model,
    pub characters: Vec<CharacterAppearance>,
    pub staff: Vec<StaffCredit>,
    pub genres: Vec<genre::Model>,
    pub studios: Vec<studio::Model>,
    pub tags: Vec<tag::Model>,
    pub external_links: Vec<external_link::Model>,
    pub relations: Vec<RelatedTitle>,
    pub recommendations: Vec<RecommendedTitle>,
}

#[derive(Debug, Serialize)]
pub struct CharacterAppearance {
    #[serde(flatten)]
    pub character: character::Model,
    pub role: String,
    pub voice_actors: Vec<VoiceRole>,
}

#[derive(Debug, Serialize)]
pub struct VoiceRole {
    #[serde(flatten)]
    pub voice_actor: voice_actor::Model,
    pub language: String,
}

#[derive(Debug, Serialize)]
pub struct StaffCredit {
    #[serde(flatten)]
    pub staff: staff::Model,
    pub role: String,
}

#[derive(Debug, Serialize)]
pub struct RelatedTitle {
    pub anilist_id: i32,
    pub title: String,
    pub relation_type: String,
}

#[derive(Debug, Serialize)]
pub struct RecommendedTitle {
    pub anilist_id: i32,
    pub title: String,
    pub rating: i32,
}

/// One row of a search result page.
#[derive(Debug, Serialize)]
pub struct AnimeSummary {
    pub anilist_id: i32,
    pub title_romaji: String,
    pub title_english: String,
    pub title_native: String,
    pub title_user_preferred: String,
    pub format: AnimeFormat,
    pub status: AnimeStatus,
    pub season: AnimeSeason,
    pub season_year: i32,
    pub cover_medium: String,
}

pub struct AnimeRepository {
    conn: DatabaseConnection,
}

impl AnimeRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get_detail(&self, anilist_id: i32) -> Result<Option<AnimeDetail>> {
        let Some(row) = Anime::find()
            .filter(anime::Column::AnilistId.eq(anilist_id))
            .one(&self.conn)
            .await?
        else {
            return Ok(None);
        };
        let anime_id = row.id;

        let characters = self.characters_for(anime_id).await?;
        let staff = self.staff_for(anime_id).await?;
        let genres = self.genres_for(anime_id).await?;
        let studios = self.studios_for(anime_id).await?;
        let tags = self.tags_for(anime_id).await?;

        let external_links = ExternalLink::find()
            .filter(external_link::Column::AnimeId.eq(anime_id))
            .all(&self.conn)
            .await?;

        let relations = self.relations_for(anime_id).await?;
        let recommendations = self.recommendations_for(anime_id).await?;

        Ok(Some(AnimeDetail {
            anime: row,
            characters,
            staff,
            genres,
            studios,
            tags,
            external_links,
            relations,
            recommendations,
        }))
    }

    pub async fn search(
        &self,
        query: &str,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<AnimeSummary>, u64)> {
        let needle = format!("%{}%", query.to_lowercase());
        let title_match =
            |col: anime::Column| Expr::expr(Func::lower(Expr::col(col))).like(needle.clone());

        let cond = Condition::any()
            .add(title_match(anime::Column::TitleRomaji))
            .add(title_match(anime::Column::TitleEnglish))
            .add(title_match(anime::Column::TitleNative))
            .add(title_match(anime::Column::TitleUserPreferred));

        let paginator = Anime::find()
            .filter(cond)
            .order_by_asc(anime::Column::AnilistId)
            .paginate(&self.conn, per_page.max(1));

        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page.saturating_sub(1)).await?;

        let summaries = rows
            .into_iter()
            .map(|m| AnimeSummary {
                anilist_id: m.anilist_id,
                title_romaji: m.title_romaji,
                title_english: m.title_english,
                title_native: m.title_native,
                title_user_preferred: m.title_user_preferred,
                format: m.format,
                status: m.status,
                season: m.season,
                season_year: m.season_year,
                cover_medium: m.cover_medium,
            })
            .collect();

        Ok((summaries, total))
    }

    async fn characters_for(&self, anime_id: i32) -> Result<Vec<CharacterAppearance>> {
        let edges = AnimeCharacter::find()
            .filter(anime_character::Column::AnimeId.eq(anime_id))
            .all(&self.conn)
            .await?;
        if edges.is_empty() {
            return Ok(Vec::new());
        }

        let character_ids: Vec<i32> = edges.iter().map(|e| e.character_id).collect();
        let characters: HashMap<i32, character::Model> = Character::find()
            .filter(character::Column::Id.is_in(character_ids.clone()))
            .all(&self.conn)
            .await?
            .into_iter()
            .map(|m| (m.id, m))
            .collect();

        let voice_edges = CharacterVoiceActor::find()
            .filter(character_voice_actor::Column::CharacterId.is_in(character_ids))
            .all(&self.conn)
            .await?;
        let actor_ids: Vec<i32> = voice_edges.iter().map(|e| e.voice_actor_id).collect();
        let actors: HashMap<i32, voice_actor::Model> = VoiceActor::find()
            .filter(voice_actor::Column::Id.is_in(actor_ids))
            .all(&self.conn)
            .await?
            .into_iter()
            .map(|m| (m.id, m))
            .collect();

        let mut cast_by_character: HashMap<i32, Vec<VoiceRole>> = HashMap::new();
        for edge in voice_edges {
            if let Some(actor) = actors.get(&edge.voice_actor_id) {
                cast_by_character
                    .entry(edge.character_id)
                    .or_default()
                    .push(VoiceRole {
                        voice_actor: actor.clone(),
                        language: edge.language,
                    });
            }
        }

        Ok(edges
            .into_iter()
            .filter_map(|edge| {
                let character = characters.get(&edge.character_id)?.clone();
                Some(CharacterAppearance {
                    voice_actors: cast_by_character
                        .remove(&edge.character_id)
                        .unwrap_or_default(),
                    character,
                    role: edge.role,
                })
            })
            .collect())
    }

    async fn staff_for(&self, anime_id: i32) -> Result<Vec<StaffCredit>> {
        let edges = AnimeStaffEdge::find()
            .filter(anime_staff::Column::AnimeId.eq(anime_id))
            .all(&self.conn)
            .await?;
        if edges.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i32> = edges.iter().map(|e| e.staff_id).collect();
        let members: HashMap<i32, staff::Model> = Staff::find()
            .filter(staff::Column::Id.is_in(ids))
            .all(&self.conn)
            .await?
            .into_iter()
            .map(|m| (m.id, m))
            .collect();

        Ok(edges
            .into_iter()
            .filter_map(|edge| {
                Some(StaffCredit {
                    staff: members.get(&edge.staff_id)?.clone(),
                    role: edge.role,
                })
            })
            .collect())
    }

    async fn genres_for(&self, anime_id: i32) -> Result<Vec<genre::Model>> {
        let ids: Vec<i32> = AnimeGenre::find()
            .filter(anime_genre::Column::AnimeId.eq(anime_id))
            .all(&self.conn)
            .await?
            .into_iter()
            .map(|e| e.genre_id)
            .collect();

        Ok(Genre::find()
            .filter(genre::Column::Id.is_in(ids))
            .all(&self.conn)
            .await?)
    }

    async fn studios_for(&self, anime_id: i32) -> Result<Vec<studio::Model>> {
        let ids: Vec<i32> = AnimeStudio::find()
            .filter(anime_studio::Column::AnimeId.eq(anime_id))
            .all(&self.conn)
            .await?
            .into_iter()
            .map(|e| e.studio_id)
            .collect();

        Ok(Studio::find()
            .filter(studio::Column::Id.is_in(ids))
            .all(&self.conn)
            .await?)
    }

    async fn tags_for(&self, anime_id: i32) -> Result<Vec<tag::Model>> {
        let ids: Vec<i32> = AnimeTag::find()
            .filter(anime_tag::Column::AnimeId.eq(anime_id))
            .all(&self.conn)
            .await?
            .into_iter()
            .map(|e| e.tag_id)
            .collect();

        Ok(Tag::find()
            .filter(tag::Column::Id.is_in(ids))
            .all(&self.conn)
            .await?)
    }

    async fn relations_for(&self, anime_id: i32) -> Result<Vec<RelatedTitle>> {
        let edges = AnimeRelation::find()
            .filter(anime_relation::Column::SourceId.eq(anime_id))
            .all(&self.conn)
            .await?;

        let targets = self
            .target_briefs(edges.iter().map(|e| e.target_id).collect())
            .await?;

        Ok(edges
            .into_iter()
            .filter_map(|edge| {
                let (anilist_id, title) = targets.get(&edge.target_id)?.clone();
                Some(RelatedTitle {
                    anilist_id,
                    title,
                    relation_type: edge.relation_type,
                })
            })
            .collect())
    }

    async fn recommendations_for(&self, anime_id: i32) -> Result<Vec<RecommendedTitle>> {
        let edges = AnimeRecommendation::find()
            .filter(anime_recommendation::Column::SourceId.eq(anime_id))
            .all(&self.conn)
            .await?;

        let targets = self
            .target_briefs(edges.iter().map(|e| e.target_id).collect())
            .await?;

        Ok(edges
            .into_iter()
            .filter_map(|edge| {
                let (anilist_id, title) = targets.get(&edge.target_id)?.clone();
                Some(RecommendedTitle {
                    anilist_id,
                    title,
                    rating: edge.rating,
                })
            })
            .collect())
    }

    async fn target_briefs(&self, ids: Vec<i32>) -> Result<HashMap<i32, (i32, String)>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        Ok(Anime::find()
            .filter(anime::Column::Id.is_in(ids))
            .all(&self.conn)
            .await?
            .into_iter()
            .map(|m| {
                let title = m.preferred_title().to_string();
                (m.id, (m.anilist_id, title))
            })
            .collect())
    }
}
