//! Reader for the Fribb anime-lists cross-index, the work source for every
//! sync pass. One JSON array, one record per known title, with the ids the
//! title carries in each catalog.

use async_trait::async_trait;
use serde::{Deserialize, Deserializer};

const MAPPING_SOURCE_URL: &str =
    "https://raw.githubusercontent.com/Fribb/anime-lists/refs/heads/master/anime-list-full.json";

/// One cross-catalog mapping record. Records without an AniList id are
/// useless to the synchronizer and get filtered before scheduling.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FribbMapping {
    #[serde(default, rename = "anidb_id", deserialize_with = "null_to_default")]
    pub anidb: i32,
    #[serde(default, rename = "anilist_id", deserialize_with = "null_to_default")]
    pub anilist: i32,
    #[serde(
        default,
        rename = "animeplanet_id",
        deserialize_with = "null_to_default"
    )]
    pub animeplanet: String,
    #[serde(default, rename = "anisearch_id", deserialize_with = "null_to_default")]
    pub anisearch: i32,
    #[serde(default, rename = "kitsu_id", deserialize_with = "null_to_default")]
    pub kitsu: i32,
    #[serde(default, rename = "livechart_id", deserialize_with = "null_to_default")]
    pub livechart: i32,
    #[serde(default, rename = "mal_id", deserialize_with = "null_to_default")]
    pub mal: i32,
    #[serde(default, rename = "notify.moe_id", deserialize_with = "null_to_default")]
    pub notifymoe: String,
    #[serde(default, rename = "imdb_id", deserialize_with = "null_to_default")]
    pub imdb: String,
    #[serde(default, rename = "thetvdb_id", deserialize_with = "null_to_default")]
    pub tvdb: i32,
    /// Appears in the wild as a number, a numeric string, or an empty
    /// string; all of which must decode, with absence meaning zero.
    #[serde(default, rename = "themoviedb_id", deserialize_with = "flexible_int")]
    pub tmdb: i32,
    #[serde(default, rename = "type", deserialize_with = "null_to_default")]
    pub kind: String,
}

fn null_to_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn flexible_int<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IntOrString {
        Int(i64),
        Str(String),
    }

    match Option::<IntOrString>::deserialize(deserializer)? {
        None => Ok(0),
        Some(IntOrString::Int(v)) => Ok(v as i32),
        Some(IntOrString::Str(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Ok(0)
            } else {
                trimmed.parse().map_err(serde::de::Error::custom)
            }
        }
    }
}

/// Mapping source seam; tests inject canned mapping lists.
#[async_trait]
pub trait MappingSource: Send + Sync {
    async fn fetch_mappings(&self) -> anyhow::Result<Vec<FribbMapping>>;
}

#[derive(Clone)]
pub struct FribbClient {
    client: reqwest::Client,
    url: String,
}

impl FribbClient {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            url: MAPPING_SOURCE_URL.to_string(),
        }
    }

    pub fn with_url(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl MappingSource for FribbClient {
    async fn fetch_mappings(&self) -> anyhow::Result<Vec<FribbMapping>> {
        use anyhow::Context;

        let mappings = self
            .client
            .get(&self.url)
            .send()
            .await
            .context("failed to fetch mapping list")?
            .error_for_status()
            .context("mapping source returned error status")?
            .json::<Vec<FribbMapping>>()
            .await
            .context("failed to decode mapping list")?;

        Ok(mappings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(value: serde_json::Value) -> FribbMapping {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn tmdb_as_integer() {
        let m = decode(serde_json::json!({ "anilist_id": 1, "themoviedb_id": 120 }));
        assert_eq!(m.tmdb, 120);
    }

    #[test]
    fn tmdb_as_numeric_string() {
        let m = decode(serde_json::json!({ "anilist_id": 1, "themoviedb_id": "120" }));
        assert_eq!(m.tmdb, 120);
    }

    #[test]
    fn tmdb_as_empty_string() {
        let m = decode(serde_json::json!({ "anilist_id": 1, "themoviedb_id": "" }));
        assert_eq!(m.tmdb, 0);
    }

    #[test]
    fn tmdb_missing() {
        let m = decode(serde_json::json!({ "anilist_id": 1 }));
        assert_eq!(m.tmdb, 0);
    }

    #[test]
    fn tmdb_zero_string() {
        let m = decode(serde_json::json!({ "anilist_id": 1, "themoviedb_id": "0" }));
        assert_eq!(m.tmdb, 0);
    }

    #[test]
    fn full_record_decodes() {
        let m = decode(serde_json::json!({
            "livechart_id": 3437,
            "anidb_id": 4563,
            "kitsu_id": 1376,
            "mal_id": 1535,
            "type": "TV",
            "notify.moe_id": "0LhNhFimg",
            "anisearch_id": 3633,
            "animeplanet_id": "death-note",
            "anilist_id": 1535,
            "thetvdb_id": 79481,
            "imdb_id": "tt0877057",
            "themoviedb_id": 13916
        }));

        assert_eq!(m.anilist, 1535);
        assert_eq!(m.mal, 1535);
        assert_eq!(m.animeplanet, "death-note");
        assert_eq!(m.notifymoe, "0LhNhFimg");
        assert_eq!(m.kind, "TV");
    }

    #[test]
    fn null_fields_decode_to_defaults() {
        let m = decode(serde_json::json!({
            "anilist_id": 7,
            "animeplanet_id": null,
            "thetvdb_id": null
        }));

        assert_eq!(m.anilist, 7);
        assert_eq!(m.animeplanet, "");
        assert_eq!(m.tvdb, 0);
    }
}
