//! End-to-end synchronizer scenarios against an in-memory SQLite store,
//! with canned fetcher and mapping-source doubles.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

use anisync::clients::anilist::{FetchError, Media, MediaFetcher};
use anisync::clients::fribb::{FribbMapping, MappingSource};
use anisync::config::SyncSettings;
use anisync::db::Store;
use anisync::entities::enums::AnimeStatus;
use anisync::entities::prelude::*;
use anisync::entities::{anime, character_voice_actor, external_link};
use anisync::sync::Synchronizer;

struct MockFetcher {
    media: Mutex<HashMap<i32, serde_json::Value>>,
    calls: Mutex<HashMap<i32, usize>>,
}

impl MockFetcher {
    fn new() -> Self {
        Self {
            media: Mutex::new(HashMap::new()),
            calls: Mutex::new(HashMap::new()),
        }
    }

    fn insert(&self, id: i32, value: serde_json::Value) {
        self.media.lock().unwrap().insert(id, value);
    }

    fn calls_for(&self, id: i32) -> usize {
        self.calls.lock().unwrap().get(&id).copied().unwrap_or(0)
    }

    fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl MediaFetcher for MockFetcher {
    async fn fetch(&self, id: i32) -> Result<Media, FetchError> {
        *self.calls.lock().unwrap().entry(id).or_insert(0) += 1;

        let value = self.media.lock().unwrap().get(&id).cloned();
        match value {
            Some(v) => Ok(serde_json::from_value(v)?),
            None => Err(FetchError::UpstreamEmpty),
        }
    }
}

struct MockMappings {
    mappings: Vec<FribbMapping>,
}

#[async_trait]
impl MappingSource for MockMappings {
    async fn fetch_mappings(&self) -> anyhow::Result<Vec<FribbMapping>> {
        Ok(self.mappings.clone())
    }
}

struct BrokenMappings;

#[async_trait]
impl MappingSource for BrokenMappings {
    async fn fetch_mappings(&self) -> anyhow::Result<Vec<FribbMapping>> {
        anyhow::bail!("mapping source unreachable")
    }
}

fn mapping(anilist: i32) -> FribbMapping {
    FribbMapping {
        anilist,
        ..FribbMapping::default()
    }
}

async fn test_store() -> Store {
    Store::new("sqlite::memory:").await.expect("store")
}

fn synchronizer(
    store: &Store,
    fetcher: Arc<MockFetcher>,
    mappings: Vec<FribbMapping>,
) -> Synchronizer {
    Synchronizer::new(
        store.clone(),
        fetcher,
        Arc::new(MockMappings { mappings }),
        SyncSettings::default(),
    )
}

#[tokio::test]
async fn cold_insert_builds_full_graph() {
    let store = test_store().await;
    let fetcher = Arc::new(MockFetcher::new());
    fetcher.insert(
        1,
        serde_json::json!({
            "id": 1,
            "title": { "userPreferred": "A" },
            "status": "FINISHED",
            "genres": ["Action"],
            "characters": { "edges": [{
                "role": "MAIN",
                "node": { "name": { "userPreferred": "X" } },
                "voiceActors": [{
                    "name": { "userPreferred": "Y" },
                    "languageV2": "Japanese"
                }]
            }]}
        }),
    );

    let sync = synchronizer(&store, fetcher.clone(), vec![mapping(1)]);
    let stats = sync.run_once().await.unwrap();

    assert_eq!(stats.processed, 1);
    assert_eq!(stats.errors, 0);

    assert_eq!(Anime::find().count(&store.conn).await.unwrap(), 1);
    assert_eq!(Character::find().count(&store.conn).await.unwrap(), 1);
    assert_eq!(VoiceActor::find().count(&store.conn).await.unwrap(), 1);
    assert_eq!(Genre::find().count(&store.conn).await.unwrap(), 1);
    assert_eq!(AnimeCharacter::find().count(&store.conn).await.unwrap(), 1);
    assert_eq!(AnimeGenre::find().count(&store.conn).await.unwrap(), 1);

    let cast = CharacterVoiceActor::find()
        .all(&store.conn)
        .await
        .unwrap();
    assert_eq!(cast.len(), 1);
    assert_eq!(cast[0].language, "Japanese");

    let title = Anime::find().one(&store.conn).await.unwrap().unwrap();
    assert_eq!(title.title_user_preferred, "A");
    assert_eq!(title.status, AnimeStatus::Finished);
    assert_eq!(title.anilist_id, 1);
}

#[tokio::test]
async fn terminal_status_skips_refetch() {
    let store = test_store().await;
    let fetcher = Arc::new(MockFetcher::new());
    fetcher.insert(
        1,
        serde_json::json!({
            "id": 1,
            "title": { "userPreferred": "Done" },
            "status": "FINISHED"
        }),
    );

    let sync = synchronizer(&store, fetcher.clone(), vec![mapping(1)]);
    sync.run_once().await.unwrap();
    assert_eq!(fetcher.calls_for(1), 1);

    // The stored status is terminal; the second pass must not fetch, and
    // the skip still counts as processed.
    let stats = sync.run_once().await.unwrap();
    assert_eq!(fetcher.calls_for(1), 1);
    assert_eq!(stats.processed, 1);
    assert_eq!(stats.errors, 0);
}

#[tokio::test]
async fn shared_voice_actor_reunites_across_titles() {
    let store = test_store().await;
    let fetcher = Arc::new(MockFetcher::new());

    for (id, character) in [(1, "X"), (2, "Z")] {
        fetcher.insert(
            id,
            serde_json::json!({
                "id": id,
                "title": { "userPreferred": format!("Title {id}") },
                "status": "FINISHED",
                "characters": { "edges": [{
                    "role": "MAIN",
                    "node": { "name": { "userPreferred": character } },
                    "voiceActors": [{
                        "name": { "native": "山田" },
                        "languageV2": "Japanese"
                    }]
                }]}
            }),
        );
    }

    let sync = synchronizer(&store, fetcher.clone(), vec![mapping(1), mapping(2)]);
    let stats = sync.run_once().await.unwrap();
    assert_eq!(stats.processed, 2);

    let actors = VoiceActor::find().all(&store.conn).await.unwrap();
    assert_eq!(actors.len(), 1);
    assert_eq!(actors[0].name_native, "山田");

    let edges = CharacterVoiceActor::find()
        .filter(character_voice_actor::Column::VoiceActorId.eq(actors[0].id))
        .count(&store.conn)
        .await
        .unwrap();
    assert_eq!(edges, 2);
    assert_eq!(Character::find().count(&store.conn).await.unwrap(), 2);
}

#[tokio::test]
async fn relation_cycle_materializes_each_title_once() {
    let store = test_store().await;
    let fetcher = Arc::new(MockFetcher::new());
    fetcher.insert(
        10,
        serde_json::json!({
            "id": 10,
            "title": { "userPreferred": "First" },
            "status": "RELEASING",
            "relations": { "edges": [
                { "relationType": "SEQUEL", "node": { "id": 20, "type": "ANIME" } }
            ]}
        }),
    );
    fetcher.insert(
        20,
        serde_json::json!({
            "id": 20,
            "title": { "userPreferred": "Second" },
            "status": "RELEASING",
            "relations": { "edges": [
                { "relationType": "PREQUEL", "node": { "id": 10, "type": "ANIME" } }
            ]}
        }),
    );

    let sync = synchronizer(&store, fetcher.clone(), vec![mapping(10)]);
    let stats = sync.run_once().await.unwrap();

    assert_eq!(stats.processed, 1);
    assert_eq!(stats.errors, 0);
    assert_eq!(fetcher.calls_for(10), 1);
    assert_eq!(fetcher.calls_for(20), 1);

    assert_eq!(Anime::find().count(&store.conn).await.unwrap(), 2);
    assert_eq!(AnimeRelation::find().count(&store.conn).await.unwrap(), 2);
}

#[tokio::test]
async fn failed_expansion_target_skips_edge_only() {
    let store = test_store().await;
    let fetcher = Arc::new(MockFetcher::new());
    // Title 30 references 40, but 40 has no remote data; the relation edge
    // is dropped while 30 itself still lands.
    fetcher.insert(
        30,
        serde_json::json!({
            "id": 30,
            "title": { "userPreferred": "Orphan" },
            "status": "RELEASING",
            "relations": { "edges": [
                { "relationType": "SEQUEL", "node": { "id": 40, "type": "ANIME" } }
            ]}
        }),
    );

    let sync = synchronizer(&store, fetcher.clone(), vec![mapping(30)]);
    let stats = sync.run_once().await.unwrap();

    assert_eq!(stats.processed, 1);
    assert_eq!(stats.errors, 0);
    assert_eq!(Anime::find().count(&store.conn).await.unwrap(), 1);
    assert_eq!(AnimeRelation::find().count(&store.conn).await.unwrap(), 0);
}

#[tokio::test]
async fn empty_mapping_source_is_a_noop() {
    let store = test_store().await;
    let fetcher = Arc::new(MockFetcher::new());

    let sync = synchronizer(&store, fetcher.clone(), vec![]);
    let stats = sync.run_once().await.unwrap();

    assert_eq!(stats.processed, 0);
    assert_eq!(stats.errors, 0);
    assert_eq!(fetcher.total_calls(), 0);
    assert_eq!(Anime::find().count(&store.conn).await.unwrap(), 0);
}

#[tokio::test]
async fn broken_mapping_source_aborts_without_writes() {
    let store = test_store().await;
    let fetcher = Arc::new(MockFetcher::new());

    let sync = Synchronizer::new(
        store.clone(),
        fetcher.clone(),
        Arc::new(BrokenMappings),
        SyncSettings::default(),
    );
    let stats = sync.run_once().await.unwrap();

    assert_eq!(stats.processed, 0);
    assert_eq!(fetcher.total_calls(), 0);
    assert_eq!(Anime::find().count(&store.conn).await.unwrap(), 0);
}

#[tokio::test]
async fn zero_anilist_ids_are_filtered() {
    let store = test_store().await;
    let fetcher = Arc::new(MockFetcher::new());
    fetcher.insert(
        5,
        serde_json::json!({
            "id": 5,
            "title": { "userPreferred": "Kept" },
            "status": "FINISHED"
        }),
    );

    let sync = synchronizer(&store, fetcher.clone(), vec![mapping(0), mapping(5)]);
    let stats = sync.run_once().await.unwrap();

    assert_eq!(stats.processed, 1);
    assert_eq!(fetcher.calls_for(0), 0);
    assert_eq!(Anime::find().count(&store.conn).await.unwrap(), 1);
}

#[tokio::test]
async fn fetch_error_counts_and_isolates() {
    let store = test_store().await;
    let fetcher = Arc::new(MockFetcher::new());
    // Only title 2 has remote data; title 1 fails with UpstreamEmpty.
    fetcher.insert(
        2,
        serde_json::json!({
            "id": 2,
            "title": { "userPreferred": "Survivor" },
            "status": "FINISHED"
        }),
    );

    let sync = synchronizer(&store, fetcher.clone(), vec![mapping(1), mapping(2)]);
    let stats = sync.run_once().await.unwrap();

    assert_eq!(stats.processed, 1);
    assert_eq!(stats.errors, 1);
    assert_eq!(Anime::find().count(&store.conn).await.unwrap(), 1);
}

fn rich_media(id: i32, status: &str, links: &[&str]) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "idMal": 100 + id,
        "title": { "romaji": "Fullmetal Alchemist", "userPreferred": "Hagane" },
        "status": status,
        "format": "TV",
        "season": "FALL",
        "seasonYear": 2003,
        "source": "MANGA",
        "duration": 24,
        "genres": ["Action", "Adventure"],
        "synonyms": ["FMA"],
        "tags": [{ "name": "Alchemy", "category": "Theme", "rank": 90 }],
        "studios": { "edges": [{ "isMain": true, "node": {
            "name": "Bones", "isAnimationStudio": true
        }}]},
        "staff": { "edges": [{ "role": "Director", "node": {
            "name": { "userPreferred": "Mizushima Seiji" }
        }}]},
        "characters": { "edges": [{
            "role": "MAIN",
            "node": { "name": { "userPreferred": "Edward Elric" } },
            "voiceActors": [{
                "name": { "native": "朴璐美" },
                "languageV2": "Japanese"
            }]
        }]},
        "externalLinks": links.iter().map(|url| serde_json::json!({
            "url": url, "site": "Site"
        })).collect::<Vec<_>>()
    })
}

#[tokio::test]
async fn double_pass_is_idempotent() {
    let store = test_store().await;
    let fetcher = Arc::new(MockFetcher::new());
    fetcher.insert(7, rich_media(7, "RELEASING", &["https://example.com/a"]));

    let sync = synchronizer(&store, fetcher.clone(), vec![mapping(7)]);
    sync.run_once().await.unwrap();

    let counts = |store: &Store| {
        let conn = store.conn.clone();
        async move {
            (
                Anime::find().count(&conn).await.unwrap(),
                Character::find().count(&conn).await.unwrap(),
                VoiceActor::find().count(&conn).await.unwrap(),
                Staff::find().count(&conn).await.unwrap(),
                Studio::find().count(&conn).await.unwrap(),
                Tag::find().count(&conn).await.unwrap(),
                Genre::find().count(&conn).await.unwrap(),
                ExternalLink::find().count(&conn).await.unwrap(),
                AnimeCharacter::find().count(&conn).await.unwrap(),
                AnimeGenre::find().count(&conn).await.unwrap(),
                AnimeStudio::find().count(&conn).await.unwrap(),
                AnimeTag::find().count(&conn).await.unwrap(),
            )
        }
    };

    let first = counts(&store).await;
    assert_eq!(first.0, 1);
    assert_eq!(first.7, 1);

    // RELEASING is not terminal, so the second pass re-derives everything.
    sync.run_once().await.unwrap();
    assert_eq!(fetcher.calls_for(7), 2);

    let second = counts(&store).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn external_links_follow_latest_response() {
    let store = test_store().await;
    let fetcher = Arc::new(MockFetcher::new());
    fetcher.insert(
        7,
        rich_media(
            7,
            "RELEASING",
            &["https://example.com/a", "https://example.com/b"],
        ),
    );

    let sync = synchronizer(&store, fetcher.clone(), vec![mapping(7)]);
    sync.run_once().await.unwrap();

    fetcher.insert(
        7,
        rich_media(
            7,
            "RELEASING",
            &["https://example.com/b", "https://example.com/c"],
        ),
    );
    sync.run_once().await.unwrap();

    let mut urls: Vec<String> = ExternalLink::find()
        .all(&store.conn)
        .await
        .unwrap()
        .into_iter()
        .map(|l| l.url)
        .collect();
    urls.sort();

    assert_eq!(urls, vec!["https://example.com/b", "https://example.com/c"]);
}

#[tokio::test]
async fn remote_mal_id_is_stored() {
    let store = test_store().await;
    let fetcher = Arc::new(MockFetcher::new());
    fetcher.insert(7, rich_media(7, "FINISHED", &[]));

    let mut m = mapping(7);
    m.mal = 1;

    let sync = synchronizer(&store, fetcher, vec![m]);
    sync.run_once().await.unwrap();

    let row = Anime::find()
        .filter(anime::Column::AnilistId.eq(7))
        .one(&store.conn)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.mal_id, 107);
}

#[tokio::test]
async fn duplicate_links_in_one_response_collapse() {
    let store = test_store().await;
    let fetcher = Arc::new(MockFetcher::new());
    fetcher.insert(
        8,
        rich_media(
            8,
            "FINISHED",
            &["https://example.com/a", "https://example.com/a"],
        ),
    );

    let sync = synchronizer(&store, fetcher, vec![mapping(8)]);
    let stats = sync.run_once().await.unwrap();

    assert_eq!(stats.errors, 0);
    let links = ExternalLink::find()
        .filter(external_link::Column::Url.eq("https://example.com/a"))
        .count(&store.conn)
        .await
        .unwrap();
    assert_eq!(links, 1);
}

mod throttling {
    use super::*;

    use anisync::clients::anilist::AnilistClient;
    use anisync::sync::backoff::RetryPolicy;
    use axum::extract::State;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use axum::routing::post;
    use std::sync::atomic::{AtomicUsize, Ordering};

    async fn throttled_endpoint(State(hits): State<Arc<AtomicUsize>>) -> impl IntoResponse {
        let attempt = hits.fetch_add(1, Ordering::SeqCst);
        if attempt < 2 {
            (StatusCode::TOO_MANY_REQUESTS, "slow down").into_response()
        } else {
            axum::Json(serde_json::json!({
                "data": { "Media": {
                    "id": 42,
                    "title": { "userPreferred": "Throttled" },
                    "status": "FINISHED"
                }}
            }))
            .into_response()
        }
    }

    #[tokio::test]
    async fn two_429s_then_success_inserts_title() {
        let hits = Arc::new(AtomicUsize::new(0));
        let app = axum::Router::new()
            .route("/", post(throttled_endpoint))
            .with_state(hits.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let retry = RetryPolicy {
            base_secs: 0.0,
            cap_secs: 0.0,
            jitter_factor: 0.0,
            max_attempts: 5,
        };
        let fetcher = Arc::new(AnilistClient::with_base_url(
            reqwest::Client::new(),
            format!("http://{addr}/"),
            retry,
        ));

        let store = test_store().await;
        let sync = Synchronizer::new(
            store.clone(),
            fetcher,
            Arc::new(MockMappings {
                mappings: vec![mapping(42)],
            }),
            SyncSettings::default(),
        );

        let stats = sync.run_once().await.unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 3);
        assert_eq!(stats.processed, 1);
        assert_eq!(stats.errors, 0);
        assert_eq!(Anime::find().count(&store.conn).await.unwrap(), 1);
    }
}
