use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub frontend_url: String,

    pub jwt_secret: String,
    pub jwt_access_ttl_secs: i64,
    pub jwt_refresh_ttl_secs: i64,

    // Generative AI (text + image)
    pub genai_api_key: String,
    pub genai_base_url: String,
    pub genai_model: String,
    pub genai_image_model: String,
    pub genai_timeout_secs: u64,

    pub ai_rate_limit_per_min: u32,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()
                .expect("PORT must be a number"),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".into()),

            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),
            jwt_access_ttl_secs: env::var("JWT_ACCESS_TTL_SECS")
                .unwrap_or_else(|_| "900".into())
                .parse()
                .expect("JWT_ACCESS_TTL_SECS must be a number"),
            // Anonymous sessions live long; the device keeps the refresh token.
            jwt_refresh_ttl_secs: env::var("JWT_REFRESH_TTL_SECS")
                .unwrap_or_else(|_| "7776000".into())
                .parse()
                .expect("JWT_REFRESH_TTL_SECS must be a number"),

            genai_api_key: env::var("GENAI_API_KEY").unwrap_or_else(|_| String::new()),
            genai_base_url: env::var("GENAI_BASE_URL")
                .unwrap_or_else(|_| "https://generativelanguage.googleapis.com".into()),
            genai_model: env::var("GENAI_MODEL").unwrap_or_else(|_| "gemini-2.0-flash".into()),
            genai_image_model: env::var("GENAI_IMAGE_MODEL")
                .unwrap_or_else(|_| "imagen-3.0-generate-002".into()),
            genai_timeout_secs: env::var("GENAI_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".into())
                .parse()
                .unwrap_or(30),

            ai_rate_limit_per_min: env::var("AI_RATE_LIMIT_PER_MIN")
                .unwrap_or_else(|_| "20".into())
                .parse()
                .unwrap_or(20),
        }
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Config for unit tests: no database, no AI key.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            database_url: "postgres://localhost/heartnote_test".into(),
            host: "127.0.0.1".into(),
            port: 0,
            frontend_url: "http://localhost:3000".into(),
            jwt_secret: "test-secret-with-enough-entropy".into(),
            jwt_access_ttl_secs: 900,
            jwt_refresh_ttl_secs: 3600,
            genai_api_key: String::new(),
            genai_base_url: "http://127.0.0.1:9".into(),
            genai_model: "test-model".into(),
            genai_image_model: "test-image-model".into(),
            genai_timeout_secs: 1,
            ai_rate_limit_per_min: 3,
        }
    }
}
