use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::sync::backoff::RetryPolicy;

const ANILIST_API: &str = "https://graphql.anilist.co";

/// The media query shipped with the binary; one request per title.
const MEDIA_QUERY: &str = include_str!("queries/media.graphql");

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("decode failed: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("bad status: {0}")]
    UpstreamStatus(u16),
    #[error("api error: {0}")]
    UpstreamApi(String),
    #[error("no media data")]
    UpstreamEmpty,
    #[error("failed after {attempts} attempts, last error: {last}")]
    UpstreamExhausted {
        attempts: u32,
        #[source]
        last: Box<FetchError>,
    },
}

#[derive(Serialize)]
struct GraphQLRequest<'a> {
    query: &'a str,
    variables: Variables,
}

#[derive(Serialize)]
struct Variables {
    id: i32,
}

#[derive(Deserialize)]
struct GraphQLResponse {
    data: Option<MediaWrapper>,
    #[serde(default)]
    errors: Vec<GraphQLError>,
}

#[derive(Deserialize)]
struct GraphQLError {
    message: String,
}

#[derive(Deserialize)]
struct MediaWrapper {
    #[serde(rename = "Media")]
    media: Option<Media>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Name {
    pub romaji: Option<String>,
    pub english: Option<String>,
    pub native: Option<String>,
    #[serde(rename = "userPreferred")]
    pub user_preferred: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Date {
    pub year: Option<i32>,
    pub month: Option<i32>,
    pub day: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Image {
    #[serde(rename = "extraLarge")]
    pub extra_large: Option<String>,
    pub large: Option<String>,
    pub medium: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagNode {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub rank: Option<i32>,
    #[serde(default)]
    pub is_adult: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterNode {
    #[serde(default)]
    pub name: Name,
    #[serde(default)]
    pub image: Image,
    pub description: Option<String>,
    pub gender: Option<String>,
    #[serde(default)]
    pub date_of_birth: Date,
    pub age: Option<String>,
    pub blood_type: Option<String>,
}

/// Person shape returned for both staff nodes and voice actors.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonNode {
    #[serde(default)]
    pub name: Name,
    pub language_v2: Option<String>,
    #[serde(default)]
    pub image: Image,
    pub description: Option<String>,
    #[serde(default)]
    pub primary_occupations: Vec<String>,
    #[serde(default)]
    pub date_of_birth: Date,
    #[serde(default)]
    pub date_of_death: Date,
    pub age: Option<i32>,
    #[serde(default)]
    pub years_active: Vec<i32>,
    pub home_town: Option<String>,
    pub blood_type: Option<String>,
    pub favourites: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterEdge {
    pub role: Option<String>,
    #[serde(default)]
    pub voice_actors: Vec<PersonNode>,
    #[serde(default)]
    pub node: CharacterNode,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CharacterConnection {
    #[serde(default)]
    pub edges: Vec<CharacterEdge>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StaffEdge {
    pub role: Option<String>,
    #[serde(default)]
    pub node: PersonNode,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StaffConnection {
    #[serde(default)]
    pub edges: Vec<StaffEdge>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudioNode {
    pub name: Option<String>,
    #[serde(default)]
    pub is_animation_studio: bool,
    pub site_url: Option<String>,
    pub favourites: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudioEdge {
    #[serde(default)]
    pub is_main: bool,
    #[serde(default)]
    pub node: StudioNode,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StudioConnection {
    #[serde(default)]
    pub edges: Vec<StudioEdge>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExternalLinkNode {
    pub url: Option<String>,
    pub site: Option<String>,
    #[serde(rename = "type")]
    pub link_type: Option<String>,
    pub language: Option<String>,
    pub color: Option<String>,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RelationNode {
    pub id: i32,
    #[serde(rename = "type")]
    pub node_type: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationEdge {
    pub relation_type: Option<String>,
    pub node: Option<RelationNode>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RelationConnection {
    #[serde(default)]
    pub edges: Vec<RelationEdge>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationNode {
    pub rating: Option<i32>,
    pub media_recommendation: Option<MediaRef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaRef {
    pub id: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecommendationEdge {
    #[serde(default)]
    pub node: RecommendationNode,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecommendationConnection {
    #[serde(default)]
    pub edges: Vec<RecommendationEdge>,
}

/// One media record as returned by the AniList GraphQL endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Media {
    pub id: i32,
    pub id_mal: Option<i32>,
    #[serde(default)]
    pub title: Name,
    pub format: Option<String>,
    pub status: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub start_date: Date,
    #[serde(default)]
    pub end_date: Date,
    pub season: Option<String>,
    pub season_year: Option<i32>,
    pub duration: Option<i32>,
    pub country_of_origin: Option<String>,
    pub source: Option<String>,
    pub hashtag: Option<String>,
    #[serde(default)]
    pub cover_image: Image,
    pub banner_image: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub synonyms: Vec<String>,
    pub average_score: Option<i32>,
    pub mean_score: Option<i32>,
    pub popularity: Option<i32>,
    pub trending: Option<i32>,
    pub favourites: Option<i32>,
    #[serde(default)]
    pub is_adult: bool,
    #[serde(default)]
    pub tags: Vec<TagNode>,
    #[serde(default)]
    pub characters: CharacterConnection,
    #[serde(default)]
    pub staff: StaffConnection,
    #[serde(default)]
    pub studios: StudioConnection,
    #[serde(default)]
    pub external_links: Vec<ExternalLinkNode>,
    #[serde(default)]
    pub relations: RelationConnection,
    #[serde(default)]
    pub recommendations: RecommendationConnection,
}

/// Fetcher seam so the synchronizer can run against canned responses in
/// tests.
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    async fn fetch(&self, id: i32) -> Result<Media, FetchError>;
}

#[derive(Clone)]
pub struct AnilistClient {
    client: Client,
    base_url: String,
    retry: RetryPolicy,
}

impl AnilistClient {
    pub fn new(client: Client, retry: RetryPolicy) -> Self {
        Self {
            client,
            base_url: ANILIST_API.to_string(),
            retry,
        }
    }

    pub fn with_base_url(client: Client, base_url: impl Into<String>, retry: RetryPolicy) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            retry,
        }
    }
}

#[async_trait]
impl MediaFetcher for AnilistClient {
    async fn fetch(&self, id: i32) -> Result<Media, FetchError> {
        let mut last_err: Option<FetchError> = None;

        for attempt in 0..self.retry.max_attempts {
            let body = GraphQLRequest {
                query: MEDIA_QUERY,
                variables: Variables { id },
            };

            let response = match self
                .client
                .post(&self.base_url)
                .header("Accept", "application/json")
                .json(&body)
                .send()
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    last_err = Some(e.into());
                    continue;
                }
            };

            let status = response.status();
            let bytes = match response.bytes().await {
                Ok(b) => b,
                Err(e) => {
                    last_err = Some(e.into());
                    continue;
                }
            };

            // Only throttling is retried with backoff; any other non-200
            // status fails the fetch immediately.
            if status == StatusCode::TOO_MANY_REQUESTS {
                let delay = self.retry.delay(attempt);
                warn!(
                    anilist_id = id,
                    attempt,
                    delay_secs = delay.as_secs(),
                    "anilist rate limited, backing off"
                );
                tokio::time::sleep(delay).await;
                last_err = Some(FetchError::UpstreamStatus(status.as_u16()));
                continue;
            }

            if status != StatusCode::OK {
                return Err(FetchError::UpstreamStatus(status.as_u16()));
            }

            let parsed: GraphQLResponse = serde_json::from_slice(&bytes)?;
            if let Some(err) = parsed.errors.first() {
                return Err(FetchError::UpstreamApi(err.message.clone()));
            }

            return match parsed.data.and_then(|d| d.media) {
                Some(media) => Ok(media),
                None => Err(FetchError::UpstreamEmpty),
            };
        }

        Err(FetchError::UpstreamExhausted {
            attempts: self.retry.max_attempts,
            last: Box::new(last_err.unwrap_or(FetchError::UpstreamEmpty)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_deserializes_from_partial_response() {
        let media: Media = serde_json::from_value(serde_json::json!({
            "id": 1,
            "idMal": 99,
            "title": { "romaji": "Cowboy Bebop", "english": null, "native": null },
            "status": "FINISHED",
            "startDate": { "year": 1998, "month": 4, "day": null }
        }))
        .unwrap();

        assert_eq!(media.id, 1);
        assert_eq!(media.id_mal, Some(99));
        assert_eq!(media.title.romaji.as_deref(), Some("Cowboy Bebop"));
        assert_eq!(media.start_date.year, Some(1998));
        assert!(media.start_date.day.is_none());
        assert!(media.characters.edges.is_empty());
    }

    #[test]
    fn graphql_error_wins_over_data() {
        let parsed: GraphQLResponse = serde_json::from_value(serde_json::json!({
            "data": { "Media": null },
            "errors": [{ "message": "Not Found.", "status": 404 }]
        }))
        .unwrap();

        assert_eq!(parsed.errors[0].message, "Not Found.");
        assert!(parsed.data.unwrap().media.is_none());
    }
}
