//! Turns a raw AniList media record plus its cross-catalog mapping into the
//! normalized entity graph the upsert engine writes.

use crate::clients::anilist::{Date, Image, Media, Name, PersonNode};
use crate::clients::fribb::FribbMapping;
use crate::entities::enums::{AnimeFormat, AnimeSeason, AnimeSource, AnimeStatus};
use crate::models::graph::{
    AnimeGraph, AnimeRecord, CharacterCast, CharacterRecord, DateParts, ImageSet, LinkRecord,
    MappingBlock, NameSet, PersonRecord, RecommendationRef, RelationRef, ScoreBlock, StaffCredit,
    StudioRecord, TagRecord, VoiceCast,
};

pub fn build_graph(media: Media, mapping: &FribbMapping) -> AnimeGraph {
    let record = build_record(&media, mapping);

    let characters = media
        .characters
        .edges
        .into_iter()
        .map(|edge| CharacterCast {
            character: CharacterRecord {
                name: name_set(edge.node.name),
                image: image_set(edge.node.image),
                description: edge.node.description.unwrap_or_default(),
                gender: edge.node.gender.unwrap_or_default(),
                birth_date: date_parts(edge.node.date_of_birth),
                age: edge.node.age.unwrap_or_default(),
                blood_type: edge.node.blood_type.unwrap_or_default(),
            },
            role: edge.role.unwrap_or_default(),
            voice_actors: edge
                .voice_actors
                .into_iter()
                .map(|va| {
                    let person = person_record(va);
                    let language = person.language.clone();
                    VoiceCast { person, language }
                })
                .collect(),
        })
        .collect();

    let staff = media
        .staff
        .edges
        .into_iter()
        .map(|edge| StaffCredit {
            person: person_record(edge.node),
            role: edge.role.unwrap_or_default(),
        })
        .collect();

    let studios = media
        .studios
        .edges
        .into_iter()
        .map(|edge| StudioRecord {
            name: edge.node.name.unwrap_or_default(),
            is_animation_studio: edge.node.is_animation_studio,
            site_url: edge.node.site_url.unwrap_or_default(),
            favourites: edge.node.favourites.unwrap_or_default(),
        })
        .collect();

    let tags = media
        .tags
        .into_iter()
        .map(|tag| TagRecord {
            name: tag.name.unwrap_or_default(),
            description: tag.description.unwrap_or_default(),
            category: tag.category.unwrap_or_default(),
            rank: tag.rank.unwrap_or_default(),
            is_adult: tag.is_adult,
        })
        .collect();

    let external_links = media
        .external_links
        .into_iter()
        .map(|link| LinkRecord {
            url: link.url.unwrap_or_default(),
            site: link.site.unwrap_or_default(),
            link_type: link.link_type.unwrap_or_default(),
            language: link.language.unwrap_or_default(),
            color: link.color.unwrap_or_default(),
            icon: link.icon.unwrap_or_default(),
        })
        .collect();

    // Only relations pointing at another anime are expandable; manga and
    // other node types are dropped here.
    let relations = media
        .relations
        .edges
        .into_iter()
        .filter_map(|edge| {
            let node = edge.node?;
            if node.node_type.as_deref() != Some("ANIME") {
                return None;
            }
            Some(RelationRef {
                anilist_id: node.id,
                relation_type: edge.relation_type.unwrap_or_default(),
            })
        })
        .collect();

    let recommendations = media
        .recommendations
        .edges
        .into_iter()
        .filter_map(|edge| {
            let target = edge.node.media_recommendation?;
            Some(RecommendationRef {
                anilist_id: target.id,
                rating: edge.node.rating.unwrap_or_default(),
            })
        })
        .collect();

    AnimeGraph {
        record,
        characters,
        staff,
        genres: media.genres,
        studios,
        tags,
        external_links,
        relations,
        recommendations,
    }
}

fn build_record(media: &Media, mapping: &FribbMapping) -> AnimeRecord {
    AnimeRecord {
        title: name_set(media.title.clone()),
        mapping: MappingBlock {
            anidb: mapping.anidb,
            anilist: mapping.anilist,
            animeplanet: mapping.animeplanet.clone(),
            anisearch: mapping.anisearch,
            kitsu: mapping.kitsu,
            livechart: mapping.livechart,
            // The remote response is authoritative for the MAL id.
            mal: media.id_mal.unwrap_or(mapping.mal),
            notifymoe: mapping.notifymoe.clone(),
            tmdb: mapping.tmdb,
            tvdb: mapping.tvdb,
            fribb_type: mapping.kind.clone(),
        },
        format: AnimeFormat::from_remote(media.format.as_deref().unwrap_or_default()),
        status: AnimeStatus::from_remote(media.status.as_deref().unwrap_or_default()),
        season: AnimeSeason::from_remote(media.season.as_deref().unwrap_or_default()),
        season_year: media.season_year.unwrap_or_default(),
        source: AnimeSource::from_remote(media.source.as_deref().unwrap_or_default()),
        duration: media.duration.unwrap_or_default(),
        country_of_origin: media.country_of_origin.clone().unwrap_or_default(),
        hashtag: media.hashtag.clone().unwrap_or_default(),
        cover: image_set(media.cover_image.clone()),
        cover_color: media.cover_image.color.clone().unwrap_or_default(),
        banner_image: media.banner_image.clone().unwrap_or_default(),
        synonyms: media.synonyms.clone(),
        start_date: date_parts(media.start_date),
        end_date: date_parts(media.end_date),
        is_adult: media.is_adult,
        scores: ScoreBlock {
            average: media.average_score.unwrap_or_default(),
            mean: media.mean_score.unwrap_or_default(),
            popularity: media.popularity.unwrap_or_default(),
            trending: media.trending.unwrap_or_default(),
            favourites: media.favourites.unwrap_or_default(),
        },
        description: media.description.clone().unwrap_or_default(),
    }
}

fn person_record(node: PersonNode) -> PersonRecord {
    PersonRecord {
        name: name_set(node.name),
        language: node.language_v2.unwrap_or_default(),
        image: image_set(node.image),
        description: node.description.unwrap_or_default(),
        primary_occupations: node.primary_occupations,
        birth_date: date_parts(node.date_of_birth),
        death_date: date_parts(node.date_of_death),
        age: node.age.unwrap_or_default(),
        years_active: node.years_active.into_iter().map(i64::from).collect(),
        home_town: node.home_town.unwrap_or_default(),
        blood_type: node.blood_type.unwrap_or_default(),
        favourites: node.favourites.unwrap_or_default(),
    }
}

fn name_set(name: Name) -> NameSet {
    NameSet {
        romaji: name.romaji.unwrap_or_default(),
        english: name.english.unwrap_or_default(),
        native: name.native.unwrap_or_default(),
        user_preferred: name.user_preferred.unwrap_or_default(),
    }
}

fn image_set(image: Image) -> ImageSet {
    ImageSet {
        extra_large: image.extra_large.unwrap_or_default(),
        large: image.large.unwrap_or_default(),
        medium: image.medium.unwrap_or_default(),
    }
}

fn date_parts(date: Date) -> DateParts {
    DateParts {
        year: date.year.unwrap_or_default(),
        month: date.month.unwrap_or_default(),
        day: date.day.unwrap_or_default(),
    }
}
