//! Application state wiring all services together.
//!
//! `ChatService` is generic over its repositories and collaborators;
//! AppState pins it to the SQLite repositories and HTTP clients.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use sora_core::chat::service::ChatService;
use sora_infra::config::load_config;
use sora_infra::inference::client::HttpInferenceClient;
use sora_infra::inference::patterns::HttpPatternAnalyzer;
use sora_infra::inference::summarizer::HttpSummarizer;
use sora_infra::sqlite::pattern::SqlitePatternReportRepository;
use sora_infra::sqlite::pointer::SqlitePointerRepository;
use sora_infra::sqlite::pool::{DatabasePool, database_url};
use sora_infra::sqlite::session::SqliteSessionRepository;
use sora_infra::sqlite::user::SqliteUserRepository;
use sora_types::config::ServiceConfig;

pub type ConcretePatternAnalyzer =
    HttpPatternAnalyzer<SqliteSessionRepository, SqlitePatternReportRepository>;

/// `ChatService` pinned to the infra implementations.
pub type ConcreteChatService = ChatService<
    SqliteSessionRepository,
    SqlitePointerRepository,
    SqliteUserRepository,
    HttpInferenceClient,
    HttpSummarizer<SqliteSessionRepository>,
    ConcretePatternAnalyzer,
>;

/// Shared application state, used by both CLI commands and REST handlers.
#[derive(Clone)]
pub struct AppState {
    pub chat: Arc<ConcreteChatService>,
    pub users: SqliteUserRepository,
    pub data_dir: PathBuf,
    pub db_pool: DatabasePool,
}

impl AppState {
    /// Create the data directory, open the database, load `config.toml`,
    /// and wire the services.
    pub async fn init(data_dir: &Path) -> anyhow::Result<Self> {
        tokio::fs::create_dir_all(data_dir).await?;

        let config = load_config(data_dir).await;
        let db_pool = DatabasePool::new(&database_url(data_dir)).await?;

        Self::with_pool(db_pool, data_dir.to_path_buf(), &config)
    }

    /// Wire the services over an already opened pool.
    pub fn with_pool(
        db_pool: DatabasePool,
        data_dir: PathBuf,
        config: &ServiceConfig,
    ) -> anyhow::Result<Self> {
        let sessions = SqliteSessionRepository::new(db_pool.clone());
        let users = SqliteUserRepository::new(db_pool.clone());

        let inference = HttpInferenceClient::new(&config.inference)?;
        let summarizer = HttpSummarizer::new(sessions.clone(), &config.summarizer, config.summary)?;
        let analyzer = HttpPatternAnalyzer::new(
            sessions.clone(),
            SqlitePatternReportRepository::new(db_pool.clone()),
            &config.patterns,
        )?;

        let chat = ChatService::new(
            Arc::new(sessions),
            SqlitePointerRepository::new(db_pool.clone()),
            users.clone(),
            inference,
            summarizer,
            Arc::new(analyzer),
        )
        .with_limits(config.trial, config.milestones);

        tracing::debug!(
            inference = %config.inference.base_url,
            message_cap = config.trial.message_cap,
            milestone_interval = config.milestones.interval,
            "Chat service wired"
        );

        Ok(Self {
            chat: Arc::new(chat),
            users,
            data_dir,
            db_pool,
        })
    }
}
