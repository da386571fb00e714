pub mod domain;
pub mod error;
pub mod llm;
pub mod notify;
pub mod pipeline;
pub mod service;
pub mod weather;

pub mod config {
    #[derive(Debug, Clone, Default)]
    pub struct Settings {
        pub groq_api_key: Option<String>,
        pub groq_base_url: Option<String>,
        pub weather_base_url: Option<String>,
        pub sentry_dsn: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                groq_api_key: non_empty_var("GROQ_API_KEY"),
                groq_base_url: non_empty_var("GROQ_BASE_URL"),
                weather_base_url: non_empty_var("WEATHER_BASE_URL"),
                sentry_dsn: non_empty_var("SENTRY_DSN"),
            })
        }
    }

    fn non_empty_var(key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|s| !s.trim().is_empty())
    }
}
