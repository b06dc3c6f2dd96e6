use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::anime::{AnimeDetail, AnimeSummary};
pub use repositories::graph::TitleBrief;

use crate::models::graph::{AnimeGraph, RecommendationRef, RelationRef};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::connect(db_url, false).await
    }

    /// `clean` drops and re-creates the whole schema before migrating;
    /// gated on debug mode by the caller.
    pub async fn connect(db_url: &str, clean: bool) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        let mut opt = ConnectOptions::new(db_url.to_string());
        if db_url.contains(":memory:") {
            // A pooled in-memory SQLite database is one database per
            // connection; pin the pool to a single connection.
            opt.max_connections(1).min_connections(1);
        } else {
            opt.max_connections(10)
                .min_connections(2)
                .connect_timeout(Duration::from_secs(10))
                .acquire_timeout(Duration::from_secs(10))
                .idle_timeout(Duration::from_secs(300))
                .max_lifetime(Duration::from_secs(600));
        }
        opt.sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        if clean {
            migrator::Migrator::fresh(&conn).await?;
            info!("Database schema dropped and re-created");
        } else {
            migrator::Migrator::up(&conn, None).await?;
        }

        info!("Database connected & migrations applied");

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn graph_repo(&self) -> repositories::graph::GraphRepository {
        repositories::graph::GraphRepository::new(self.conn.clone())
    }

    fn anime_repo(&self) -> repositories::anime::AnimeRepository {
        repositories::anime::AnimeRepository::new(self.conn.clone())
    }

    pub async fn find_title_brief(&self, anilist_id: i32) -> Result<Option<TitleBrief>> {
        self.graph_repo().find_brief(anilist_id).await
    }

    pub async fn upsert_graph(&self, graph: &AnimeGraph) -> Result<i32> {
        self.graph_repo().upsert(graph).await
    }

    pub async fn link_expansion(
        &self,
        source_id: i32,
        relations: &[RelationRef],
        recommendations: &[RecommendationRef],
    ) -> Result<()> {
        self.graph_repo()
            .link_expansion(source_id, relations, recommendations)
            .await
    }

    pub async fn get_anime_detail(&self, anilist_id: i32) -> Result<Option<AnimeDetail>> {
        self.anime_repo().get_detail(anilist_id).await
    }

    pub async fn search_titles(
        &self,
        query: &str,
        page: u64,
        per_page: u64,
    ) -> Result<(Vec<AnimeSummary>, u64)> {
        self.anime_repo().search(query, page, per_page).await
    }
}
