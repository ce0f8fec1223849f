use std::sync::Arc;

use crate::{
    config::AppConfig,
    db::{DbPool, OrmConn, create_orm_conn, create_pool},
    email::Mailer,
    llm::GroqClient,
    vectors::{EmbeddingClient, PineconeClient},
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub config: Arc<AppConfig>,
    pub llm: GroqClient,
    pub embedder: EmbeddingClient,
    /// `None` when `PINECONE_API_KEY` is not configured; search endpoints
    /// report that instead of failing at startup.
    pub vectors: Option<PineconeClient>,
    pub mailer: Mailer,
}

impl AppState {
    pub async fn build(config: AppConfig) -> anyhow::Result<Self> {
        let pool = create_pool(&config.database_url).await?;
        let orm = create_orm_conn(&config.database_url).await?;

        let llm = GroqClient::new(&config);
        let embedder = EmbeddingClient::new(&config);
        let vectors = PineconeClient::connect(&config).await?;
        if vectors.is_none() {
            tracing::warn!("PINECONE_API_KEY not set, semantic search is disabled");
        }
        let mailer = Mailer::from_config(&config)?;
        if !mailer.is_configured() {
            tracing::warn!("SMTP credentials not set, order emails are disabled");
        }

        Ok(Self {
            pool,
            orm,
            config: Arc::new(config),
            llm,
            embedder,
            vectors,
            mailer,
        })
    }
}
