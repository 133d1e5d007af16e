use serde::Deserialize;
use std::env;
use std::time::Duration;

/// Remote judge settings, injected into the HTTP judge client at
/// construction. Grading logic never reads ambient configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct JudgeConfig {
    /// Base URL of an OpenAI-compatible chat completions API.
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub timeout_seconds: u64,
    pub max_attempts: usize,
}

impl JudgeConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        // Determine environment (defaults to dev)
        let env = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

        // Build configuration from config/*.toml + ENV overrides
        let config_builder = config::Config::builder()
            .add_source(
                config::File::with_name(&format!("config/{}", env)).required(false), // Allow missing config file, fallback to ENV
            )
            // Override with environment variables (prefix: APP_)
            .add_source(config::Environment::with_prefix("APP").separator("__"));

        let settings = config_builder.build()?;

        let base_url = settings
            .get_string("judge.base_url")
            .or_else(|_| env::var("JUDGE_BASE_URL"))
            .unwrap_or_else(|_| "https://api.deepseek.com/v1".to_string());

        let api_key = settings
            .get_string("judge.api_key")
            .or_else(|_| env::var("JUDGE_API_KEY"))
            .unwrap_or_else(|_| {
                eprintln!("WARNING: JUDGE_API_KEY not set; remote judging will be unavailable");
                String::new()
            });

        let model = settings
            .get_string("judge.model")
            .or_else(|_| env::var("JUDGE_MODEL"))
            .unwrap_or_else(|_| "deepseek-chat".to_string());

        let temperature = settings
            .get_float("judge.temperature")
            .map(|v| v as f32)
            .unwrap_or(0.7);

        let timeout_seconds = settings
            .get_int("judge.timeout_seconds")
            .ok()
            .filter(|v| *v > 0)
            .map(|v| v as u64)
            .unwrap_or(30);

        let max_attempts = settings
            .get_int("judge.max_attempts")
            .ok()
            .filter(|v| *v > 0)
            .map(|v| v as usize)
            .unwrap_or(2);

        Ok(JudgeConfig {
            base_url,
            api_key,
            model,
            temperature,
            timeout_seconds,
            max_attempts,
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_falls_back_to_defaults_without_a_config_file() {
        let cfg = JudgeConfig::load().expect("config should load from defaults");
        assert!(!cfg.base_url.is_empty());
        assert!(!cfg.model.is_empty());
        assert!(cfg.timeout_seconds > 0);
        assert!(cfg.max_attempts > 0);
        assert_eq!(cfg.timeout(), Duration::from_secs(cfg.timeout_seconds));
    }
}
