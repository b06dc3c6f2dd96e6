//! Write side of the synchronizer: one transaction per primary title that
//! reconciles the anime row by its AniList id, rewrites derived edge sets,
//! and resolves shared reference entities by natural key, plus the second
//! transaction that links expanded relations and recommendations.

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, QueryFilter, Set, SqlErr, TransactionTrait,
};
use tracing::warn;

use crate::entities::enums::AnimeStatus;
use crate::entities::prelude::*;
use crate::entities::{
    anime, anime_character, anime_genre, anime_recommendation, anime_relation, anime_staff,
    anime_studio, anime_tag, character, character_voice_actor, external_link, genre, staff, studio,
    tag, voice_actor,
};
use crate::models::graph::{
    AnimeGraph, AnimeRecord, CharacterRecord, NameSet, PersonRecord, RecommendationRef,
    RelationRef,
};

/// The slice of a stored title the scheduler needs for the pre-fetch
/// terminal-status check.
#[derive(Debug, Clone)]
pub struct TitleBrief {
    pub id: i32,
    pub status: AnimeStatus,
    pub title: String,
}

pub struct GraphRepository {
    conn: DatabaseConnection,
}

impl GraphRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn find_brief(&self, anilist_id: i32) -> Result<Option<TitleBrief>> {
        let row = Anime::find()
            .filter(anime::Column::AnilistId.eq(anilist_id))
            .one(&self.conn)
            .await?;

        Ok(row.map(|m| TitleBrief {
            id: m.id,
            status: m.status,
            title: m.preferred_title().to_string(),
        }))
    }

    /// Writes the full graph for one title inside a single transaction and
    /// returns the internal anime id.
    pub async fn upsert(&self, graph: &AnimeGraph) -> Result<i32> {
        let txn = self.conn.begin().await.context("begin upsert transaction")?;

        let existing = Anime::find()
            .filter(anime::Column::AnilistId.eq(graph.record.mapping.anilist))
            .one(&txn)
            .await?;

        let anime_id = match existing {
            Some(row) => {
                let id = row.id;
                let mut model = anime_active_model(&graph.record);
                model.id = Set(id);
                model.created_at = sea_orm::ActiveValue::NotSet;
                model.update(&txn).await.context("update anime")?;

                clear_derived_edges(&txn, id).await?;
                id
            }
            None => {
                let mut model = anime_active_model(&graph.record);
                model.created_at = Set(Utc::now());
                Anime::insert(model)
                    .exec(&txn)
                    .await
                    .context("insert anime")?
                    .last_insert_id
            }
        };

        for cast in &graph.characters {
            let character_id = resolve_character(&txn, &cast.character).await?;

            anime_character::Entity::insert(anime_character::ActiveModel {
                anime_id: Set(anime_id),
                character_id: Set(character_id),
                role: Set(cast.role.clone()),
            })
            .on_conflict(
                OnConflict::columns([
                    anime_character::Column::AnimeId,
                    anime_character::Column::CharacterId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(&txn)
            .await
            .context("link character")?;

            for va in &cast.voice_actors {
                let voice_actor_id = resolve_voice_actor(&txn, &va.person).await?;

                character_voice_actor::Entity::insert(character_voice_actor::ActiveModel {
                    character_id: Set(character_id),
                    voice_actor_id: Set(voice_actor_id),
                    language: Set(va.language.clone()),
                })
                .on_conflict(
                    OnConflict::columns([
                        character_voice_actor::Column::CharacterId,
                        character_voice_actor::Column::VoiceActorId,
                    ])
                    .do_nothing()
                    .to_owned(),
                )
                .exec_without_returning(&txn)
                .await
                .context("link voice actor")?;
            }
        }

        for credit in &graph.staff {
            let staff_id = resolve_staff(&txn, &credit.person).await?;

            anime_staff::Entity::insert(anime_staff::ActiveModel {
                anime_id: Set(anime_id),
                staff_id: Set(staff_id),
                role: Set(credit.role.clone()),
            })
            .on_conflict(
                OnConflict::columns([anime_staff::Column::AnimeId, anime_staff::Column::StaffId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&txn)
            .await
            .context("link staff")?;
        }

        for name in &graph.genres {
            let genre_id = resolve_genre(&txn, name).await?;

            anime_genre::Entity::insert(anime_genre::ActiveModel {
                anime_id: Set(anime_id),
                genre_id: Set(genre_id),
            })
            .on_conflict(
                OnConflict::columns([anime_genre::Column::AnimeId, anime_genre::Column::GenreId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&txn)
            .await
            .context("link genre")?;
        }

        for record in &graph.studios {
            let studio_id = resolve_studio(&txn, record).await?;

            anime_studio::Entity::insert(anime_studio::ActiveModel {
                anime_id: Set(anime_id),
                studio_id: Set(studio_id),
            })
            .on_conflict(
                OnConflict::columns([
                    anime_studio::Column::AnimeId,
                    anime_studio::Column::StudioId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(&txn)
            .await
            .context("link studio")?;
        }

        for record in &graph.tags {
            let tag_id = resolve_tag(&txn, record).await?;

            anime_tag::Entity::insert(anime_tag::ActiveModel {
                anime_id: Set(anime_id),
                tag_id: Set(tag_id),
            })
            .on_conflict(
                OnConflict::columns([anime_tag::Column::AnimeId, anime_tag::Column::TagId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&txn)
            .await
            .context("link tag")?;
        }

        for link in &graph.external_links {
            external_link::Entity::insert(external_link::ActiveModel {
                id: sea_orm::ActiveValue::NotSet,
                anime_id: Set(anime_id),
                url: Set(link.url.clone()),
                site: Set(link.site.clone()),
                link_type: Set(link.link_type.clone()),
                language: Set(link.language.clone()),
                color: Set(link.color.clone()),
                icon: Set(link.icon.clone()),
            })
            .on_conflict(
                OnConflict::columns([
                    external_link::Column::AnimeId,
                    external_link::Column::Url,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(&txn)
            .await
            .context("insert external link")?;
        }

        txn.commit().await.context("commit upsert transaction")?;
        Ok(anime_id)
    }

    /// Second transaction of one title's processing: look up each expanded
    /// target by AniList id and insert the edge rows. Targets that never
    /// materialized are skipped, not errors.
    pub async fn link_expansion(
        &self,
        source_id: i32,
        relations: &[RelationRef],
        recommendations: &[RecommendationRef],
    ) -> Result<()> {
        let txn = self
            .conn
            .begin()
            .await
            .context("begin expansion transaction")?;

        for relation in relations {
            let Some(target) = find_anime_id(&txn, relation.anilist_id).await? else {
                warn!(
                    anilist_id = relation.anilist_id,
                    "related title not in store, skipping relation"
                );
                continue;
            };

            anime_relation::Entity::insert(anime_relation::ActiveModel {
                source_id: Set(source_id),
                target_id: Set(target),
                relation_type: Set(relation.relation_type.clone()),
            })
            .on_conflict(
                OnConflict::columns([
                    anime_relation::Column::SourceId,
                    anime_relation::Column::TargetId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(&txn)
            .await
            .context("insert relation")?;
        }

        for rec in recommendations {
            let Some(target) = find_anime_id(&txn, rec.anilist_id).await? else {
                warn!(
                    anilist_id = rec.anilist_id,
                    "recommended title not in store, skipping recommendation"
                );
                continue;
            };

            anime_recommendation::Entity::insert(anime_recommendation::ActiveModel {
                source_id: Set(source_id),
                target_id: Set(target),
                rating: Set(rec.rating),
            })
            .on_conflict(
                OnConflict::columns([
                    anime_recommendation::Column::SourceId,
                    anime_recommendation::Column::TargetId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(&txn)
            .await
            .context("insert recommendation")?;
        }

        txn.commit().await.context("commit expansion transaction")
    }
}

/// Derived edge sets are a function of the latest remote response: drop
/// them all before rewriting. The reference rows themselves stay.
async fn clear_derived_edges<C: ConnectionTrait>(db: &C, anime_id: i32) -> Result<()> {
    ExternalLink::delete_many()
        .filter(external_link::Column::AnimeId.eq(anime_id))
        .exec(db)
        .await?;
    AnimeCharacter::delete_many()
        .filter(anime_character::Column::AnimeId.eq(anime_id))
        .exec(db)
        .await?;
    AnimeStaffEdge::delete_many()
        .filter(anime_staff::Column::AnimeId.eq(anime_id))
        .exec(db)
        .await?;
    AnimeGenre::delete_many()
        .filter(anime_genre::Column::AnimeId.eq(anime_id))
        .exec(db)
        .await?;
    AnimeStudio::delete_many()
        .filter(anime_studio::Column::AnimeId.eq(anime_id))
        .exec(db)
        .await?;
    AnimeTag::delete_many()
        .filter(anime_tag::Column::AnimeId.eq(anime_id))
        .exec(db)
        .await?;
    AnimeRelation::delete_many()
        .filter(anime_relation::Column::SourceId.eq(anime_id))
        .exec(db)
        .await?;
    AnimeRecommendation::delete_many()
        .filter(anime_recommendation::Column::SourceId.eq(anime_id))
        .exec(db)
        .await?;
    Ok(())
}

async fn find_anime_id<C: ConnectionTrait>(db: &C, anilist_id: i32) -> Result<Option<i32>> {
    Ok(Anime::find()
        .filter(anime::Column::AnilistId.eq(anilist_id))
        .one(db)
        .await?
        .map(|m| m.id))
}

fn anime_active_model(record: &AnimeRecord) -> anime::ActiveModel {
    anime::ActiveModel {
        id: sea_orm::ActiveValue::NotSet,
        created_at: sea_orm::ActiveValue::NotSet,
        updated_at: Set(Utc::now()),
        title_romaji: Set(record.title.romaji.clone()),
        title_english: Set(record.title.english.clone()),
        title_native: Set(record.title.native.clone()),
        title_user_preferred: Set(record.title.user_preferred.clone()),
        anidb_id: Set(record.mapping.anidb),
        anilist_id: Set(record.mapping.anilist),
        animeplanet_id: Set(record.mapping.animeplanet.clone()),
        anisearch_id: Set(record.mapping.anisearch),
        kitsu_id: Set(record.mapping.kitsu),
        livechart_id: Set(record.mapping.livechart),
        mal_id: Set(record.mapping.mal),
        notifymoe_id: Set(record.mapping.notifymoe.clone()),
        tmdb_id: Set(record.mapping.tmdb),
        tvdb_id: Set(record.mapping.tvdb),
        fribb_type: Set(record.mapping.fribb_type.clone()),
        format: Set(record.format),
        status: Set(record.status),
        season: Set(record.season),
        season_year: Set(record.season_year),
        source: Set(record.source),
        duration: Set(record.duration),
        country_of_origin: Set(record.country_of_origin.clone()),
        hashtag: Set(record.hashtag.clone()),
        cover_extra_large: Set(record.cover.extra_large.clone()),
        cover_large: Set(record.cover.large.clone()),
        cover_medium: Set(record.cover.medium.clone()),
        cover_color: Set(record.cover_color.clone()),
        banner_image: Set(record.banner_image.clone()),
        synonyms: Set(encode_list(&record.synonyms)),
        start_year: Set(record.start_date.year),
        start_month: Set(record.start_date.month),
        start_day: Set(record.start_date.day),
        end_year: Set(record.end_date.year),
        end_month: Set(record.end_date.month),
        end_day: Set(record.end_date.day),
        is_adult: Set(record.is_adult),
        score_average: Set(record.scores.average),
        score_mean: Set(record.scores.mean),
        score_popularity: Set(record.scores.popularity),
        score_trending: Set(record.scores.trending),
        score_favourites: Set(record.scores.favourites),
        description: Set(record.description.clone()),
    }
}

fn encode_list<T: serde::Serialize>(values: &[T]) -> String {
    serde_json::to_string(values).unwrap_or_else(|_| "[]".to_string())
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

/// OR-equality over the non-empty fields of the incoming name quadruple.
/// `None` when every field is empty, in which case lookup is skipped.
fn any_name_match<C: ColumnTrait>(
    name: &NameSet,
    romaji: C,
    english: C,
    native: C,
    user_preferred: C,
) -> Option<Condition> {
    if name.is_empty() {
        return None;
    }

    let mut cond = Condition::any();
    if !name.romaji.is_empty() {
        cond = cond.add(romaji.eq(&name.romaji));
    }
    if !name.english.is_empty() {
        cond = cond.add(english.eq(&name.english));
    }
    if !name.native.is_empty() {
        cond = cond.add(native.eq(&name.native));
    }
    if !name.user_preferred.is_empty() {
        cond = cond.add(user_preferred.eq(&name.user_preferred));
    }
    Some(cond)
}

async fn find_character<C: ConnectionTrait>(db: &C, name: &NameSet) -> Result<Option<i32>> {
    let Some(cond) = any_name_match(
        name,
        character::Column::NameRomaji,
        character::Column::NameEnglish,
        character::Column::NameNative,
        character::Column::NameUserPreferred,
    ) else {
        return Ok(None);
    };

    Ok(Character::find()
        .filter(cond)
        .one(db)
        .await?
        .map(|m| m.id))
}

/// Insert-or-fetch under the natural-key uniqueness constraint. A unique
/// violation means another worker inserted the row between our lookup and
/// insert; re-read it.
async fn resolve_character<C: ConnectionTrait>(db: &C, record: &CharacterRecord) -> Result<i32> {
    if let Some(id) = find_character(db, &record.name).await? {
        return Ok(id);
    }

    let now = Utc::now();
    let model = character::ActiveModel {
        id: sea_orm::ActiveValue::NotSet,
        created_at: Set(now),
        updated_at: Set(now),
        name_romaji: Set(record.name.romaji.clone()),
        name_english: Set(record.name.english.clone()),
        name_native: Set(record.name.native.clone()),
        name_user_preferred: Set(record.name.user_preferred.clone()),
        image_extra_large: Set(record.image.extra_large.clone()),
        image_large: Set(record.image.large.clone()),
        image_medium: Set(record.image.medium.clone()),
        description: Set(record.description.clone()),
        gender: Set(record.gender.clone()),
        birth_year: Set(record.birth_date.year),
        birth_month: Set(record.birth_date.month),
        birth_day: Set(record.birth_date.day),
        age: Set(record.age.clone()),
        blood_type: Set(record.blood_type.clone()),
    };

    match Character::insert(model).exec(db).await {
        Ok(res) => Ok(res.last_insert_id),
        Err(e) if is_unique_violation(&e) => find_character(db, &record.name)
            .await?
            .ok_or_else(|| anyhow!("character missing after unique violation")),
        Err(e) => Err(e.into()),
    }
}

async fn find_staff<C: ConnectionTrait>(db: &C, name: &NameSet) -> Result<Option<i32>> {
    let Some(cond) = any_name_match(
        name,
        staff::Column::NameRomaji,
        staff::Column::NameEnglish,
        staff::Column::NameNative,
        staff::Column::NameUserPreferred,
    ) else {
        return Ok(None);
    };

    Ok(Staff::find().filter(cond).one(db).await?.map(|m| m.id))
}

async fn resolve_staff<C: ConnectionTrait>(db: &C, record: &PersonRecord) -> Result<i32> {
    if let Some(id) = find_staff(db, &record.name).await? {
        return Ok(id);
    }

    let now = Utc::now();
    let model = staff::ActiveModel {
        id: sea_orm::ActiveValue::NotSet,
        created_at: Set(now),
        updated_at: Set(now),
        name_romaji: Set(record.name.romaji.clone()),
        name_english: Set(record.name.english.clone()),
        name_native: Set(record.name.native.clone()),
        name_user_preferred: Set(record.name.user_preferred.clone()),
        language: Set(record.language.clone()),
        image_extra_large: Set(record.image.extra_large.clone()),
        image_large: Set(record.image.large.clone()),
        image_medium: Set(record.image.medium.clone()),
        description: Set(record.description.clone()),
        primary_occupations: Set(encode_list(&record.primary_occupations)),
        birth_year: Set(record.birth_date.year),
        birth_month: Set(record.birth_date.month),
        birth_day: Set(record.birth_date.day),
        death_year: Set(record.death_date.year),
        death_month: Set(record.death_date.month),
        death_day: Set(record.death_date.day),
        age: Set(record.age),
        years_active: Set(encode_list(&record.years_active)),
        home_town: Set(record.home_town.clone()),
        blood_type: Set(record.blood_type.clone()),
        favourites: Set(record.favourites),
    };

    match Staff::insert(model).exec(db).await {
        Ok(res) => Ok(res.last_insert_id),
        Err(e) if is_unique_violation(&e) => find_staff(db, &record.name)
            .await?
            .ok_or_else(|| anyhow!("staff member missing after unique violation")),
        Err(e) => Err(e.into()),
    }
}

async fn find_voice_actor<C: ConnectionTrait>(db: &C, name: &NameSet) -> Result<Option<i32>> {
    let Some(cond) = any_name_match(
        name,
        voice_actor::Column::NameRomaji,
        voice_actor::Column::NameEnglish,
        voice_actor::Column::NameNative,
        voice_actor::Column::NameUserPreferred,
    ) else {
        return Ok(None);
    };

    Ok(VoiceActor::find().filter(cond).one(db).await?.map(|m| m.id))
}

async fn resolve_voice_actor<C: ConnectionTrait>(db: &C, record: &PersonRecord) -> Result<i32> {
    if let Some(id) = find_voice_actor(db, &record.name).await? {
        return Ok(id);
    }

    let now = Utc::now();
    let model = voice_actor::ActiveModel {
        id: sea_orm::ActiveValue::NotSet,
        created_at: Set(now),
        updated_at: Set(now),
        name_romaji: Set(record.name.romaji.clone()),
        name_english: Set(record.name.english.clone()),
        name_native: Set(record.name.native.clone()),
        name_user_preferred: Set(record.name.user_preferred.clone()),
        language: Set(record.language.clone()),
        image_extra_large: Set(record.image.extra_large.clone()),
        image_large: Set(record.image.large.clone()),
        image_medium: Set(record.image.medium.clone()),
        description: Set(record.description.clone()),
        primary_occupations: Set(encode_list(&record.primary_occupations)),
        birth_year: Set(record.birth_date.year),
        birth_month: Set(record.birth_date.month),
        birth_day: Set(record.birth_date.day),
        death_year: Set(record.death_date.year),
        death_month: Set(record.death_date.month),
        death_day: Set(record.death_date.day),
        age: Set(record.age),
        years_active: Set(encode_list(&record.years_active)),
        home_town: Set(record.home_town.clone()),
        blood_type: Set(record.blood_type.clone()),
        favourites: Set(record.favourites),
    };

    match VoiceActor::insert(model).exec(db).await {
        Ok(res) => Ok(res.last_insert_id),
        Err(e) if is_unique_violation(&e) => find_voice_actor(db, &record.name)
            .await?
            .ok_or_else(|| anyhow!("voice actor missing after unique violation")),
        Err(e) => Err(e.into()),
    }
}

async fn resolve_genre<C: ConnectionTrait>(db: &C, name: &str) -> Result<i32> {
    let existing = Genre::find()
        .filter(genre::Column::Name.eq(name))
        .one(db)
        .await?;
    if let Some(row) = existing {
        return Ok(row.id);
    }

    let now = Utc::now();
    let model = genre::ActiveModel {
        id: sea_orm::ActiveValue::NotSet,
        created_at: Set(now),
        updated_at: Set(now),
        name: Set(name.to_string()),
    };

    match Genre::insert(model).exec(db).await {
        Ok(res) => Ok(res.last_insert_id),
        Err(e) if is_unique_violation(&e) => Genre::find()
            .filter(genre::Column::Name.eq(name))
            .one(db)
            .await?
            .map(|m| m.id)
            .ok_or_else(|| anyhow!("genre missing after unique violation")),
        Err(e) => Err(e.into()),
    }
}

async fn resolve_studio<C: ConnectionTrait>(
    db: &C,
    record: &crate::models::graph::StudioRecord,
) -> Result<i32> {
    let existing = Studio::find()
        .filter(studio::Column::Name.eq(&record.name))
        .one(db)
        .await?;
    if let Some(row) = existing {
        return Ok(row.id);
    }

    let now = Utc::now();
    let model = studio::ActiveModel {
        id: sea_orm::ActiveValue::NotSet,
        created_at: Set(now),
        updated_at: Set(now),
        name: Set(record.name.clone()),
        is_animation_studio: Set(record.is_animation_studio),
        site_url: Set(record.site_url.clone()),
        favourites: Set(record.favourites),
    };

    match Studio::insert(model).exec(db).await {
        Ok(res) => Ok(res.last_insert_id),
        Err(e) if is_unique_violation(&e) => Studio::find()
            .filter(studio::Column::Name.eq(&record.name))
            .one(db)
            .await?
            .map(|m| m.id)
            .ok_or_else(|| anyhow!("studio missing after unique violation")),
        Err(e) => Err(e.into()),
    }
}

async fn resolve_tag<C: ConnectionTrait>(
    db: &C,
    record: &crate::models::graph::TagRecord,
) -> Result<i32> {
    let existing = Tag::find()
        .filter(tag::Column::Name.eq(&record.name))
        .one(db)
        .await?;
    if let Some(row) = existing {
        return Ok(row.id);
    }

    let now = Utc::now();
    let model = tag::ActiveModel {
        id: sea_orm::ActiveValue::NotSet,
        created_at: Set(now),
        updated_at: Set(now),
        name: Set(record.name.clone()),
        description: Set(record.description.clone()),
        category: Set(record.category.clone()),
        rank: Set(record.rank),
        is_adult: Set(record.is_adult),
    };

    match Tag::insert(model).exec(db).await {
        Ok(res) => Ok(res.last_insert_id),
        Err(e) if is_unique_violation(&e) => Tag::find()
            .filter(tag::Column::Name.eq(&record.name))
            .one(db)
            .await?
            .map(|m| m.id)
            .ok_or_else(|| anyhow!("tag missing after unique violation")),
        Err(e) => Err(e.into()),
    }
}
