use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub backend: BackendConfig,
    pub session: SessionDefaults,
    pub audio: AudioConfig,
}

#[derive(Debug, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the translation backend. Environment-provided in
    /// deployments (`CONSULT_BRIDGE__BACKEND__BASE_URL`), never hardcoded.
    pub base_url: String,

    /// Per-request timeout in seconds. Summary generation can take
    /// materially longer than the other calls, so this is generous.
    pub request_timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct SessionDefaults {
    pub source_language: String,
    pub target_language: String,
    pub conversation_id: Option<String>,
    pub history_limit: usize,
}

#[derive(Debug, Deserialize)]
pub struct AudioConfig {
    pub device: Option<String>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("CONSULT_BRIDGE").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
