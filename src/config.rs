use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub frontend_origin: String,

    pub groq_api_key: String,
    pub groq_model: String,
    pub groq_max_tokens: u32,

    pub openai_api_key: String,
    pub embedding_model: String,
    pub embedding_dimension: usize,

    pub pinecone_api_key: String,
    pub pinecone_index_name: String,
    pub pinecone_cloud: String,
    pub pinecone_region: String,

    pub search_top_k: usize,
    pub search_min_score: f64,

    pub smtp_server: String,
    pub smtp_port: u16,
    pub email_user: String,
    pub email_password: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(8000);
        let frontend_origin =
            env::var("FRONTEND_ORIGIN").unwrap_or_else(|_| "http://localhost:3000".to_string());

        let groq_api_key = env::var("GROQ_API_KEY").unwrap_or_default();
        let groq_model =
            env::var("GROQ_MODEL").unwrap_or_else(|_| "llama-3.3-70b-versatile".to_string());
        let groq_max_tokens = env::var("GROQ_MAX_TOKENS")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(4096);

        // The embeddings endpoint is OpenAI-compatible; fall back to the Groq key
        // when no dedicated key is set.
        let openai_api_key = env::var("OPENAI_API_KEY")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| groq_api_key.clone());
        let embedding_model =
            env::var("EMBEDDING_MODEL").unwrap_or_else(|_| "text-embedding-3-small".to_string());
        let embedding_dimension = env::var("EMBEDDING_DIMENSION")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(384);

        let pinecone_api_key = env::var("PINECONE_API_KEY").unwrap_or_default();
        let pinecone_index_name =
            env::var("PINECONE_INDEX_NAME").unwrap_or_else(|_| "shop-ai-products".to_string());
        let pinecone_cloud = env::var("PINECONE_CLOUD").unwrap_or_else(|_| "aws".to_string());
        let pinecone_region =
            env::var("PINECONE_REGION").unwrap_or_else(|_| "us-east-1".to_string());

        let search_top_k = env::var("SEARCH_TOP_K")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(10);
        let search_min_score = env::var("SEARCH_MIN_SCORE")
            .ok()
            .and_then(|v| v.parse::<f64>().ok())
            .unwrap_or(0.3);

        let smtp_server = env::var("SMTP_SERVER").unwrap_or_else(|_| "smtp.gmail.com".to_string());
        let smtp_port = env::var("SMTP_PORT")
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(587);
        let email_user = env::var("EMAIL_USER").unwrap_or_default();
        let email_password = env::var("EMAIL_PASSWORD").unwrap_or_default();

        Ok(Self {
            database_url,
            host,
            port,
            frontend_origin,
            groq_api_key,
            groq_model,
            groq_max_tokens,
            openai_api_key,
            embedding_model,
            embedding_dimension,
            pinecone_api_key,
            pinecone_index_name,
            pinecone_cloud,
            pinecone_region,
            search_top_k,
            search_min_score,
            smtp_server,
            smtp_port,
            email_user,
            email_password,
        })
    }
}
