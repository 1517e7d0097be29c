use agrimate_core::generation::{DEFAULT_MODEL, DEFAULT_OLLAMA_URL};
use agrimate_core::weather::DEFAULT_WEATHER_URL;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub weather_api_key: String,
    pub weather_url: String,
    /// Deadline for weather lookups; `None` waits indefinitely.
    pub weather_timeout: Option<Duration>,
    pub ollama_url: String,
    pub model: String,
}

#[derive(Debug, Deserialize, Default)]
struct FileConfig {
    #[serde(default)]
    server: ServerSection,
    #[serde(default)]
    weather: WeatherSection,
    #[serde(default)]
    generation: GenerationSection,
}

#[derive(Debug, Deserialize)]
struct ServerSection {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WeatherSection {
    #[serde(default)]
    api_key: String,
    #[serde(default = "default_weather_url")]
    url: String,
    #[serde(default)]
    timeout_secs: Option<u64>,
}

impl Default for WeatherSection {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            url: default_weather_url(),
            timeout_secs: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerationSection {
    #[serde(default = "default_ollama_url")]
    url: String,
    #[serde(default = "default_model")]
    model: String,
}

impl Default for GenerationSection {
    fn default() -> Self {
        Self {
            url: default_ollama_url(),
            model: default_model(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_weather_url() -> String {
    DEFAULT_WEATHER_URL.to_string()
}

fn default_ollama_url() -> String {
    DEFAULT_OLLAMA_URL.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

impl ServerConfig {
    pub fn load() -> anyhow::Result<Self> {
        let lookup = |key: &str| env::var(key).ok();

        if let Some(file_config) = load_from_file()? {
            return Ok(Self::from_file(file_config, lookup));
        }

        Ok(Self::from_env(lookup))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    // The weather key may still come from the environment so it can stay
    // out of the config file.
    fn from_file(file_config: FileConfig, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let weather_api_key = lookup("OPENWEATHER_KEY").unwrap_or(file_config.weather.api_key);

        Self {
            host: file_config.server.host,
            port: file_config.server.port,
            weather_api_key,
            weather_url: file_config.weather.url,
            weather_timeout: timeout_from_secs(file_config.weather.timeout_secs),
            ollama_url: file_config.generation.url,
            model: file_config.generation.model,
        }
    }

    fn from_env(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let host = lookup("AGRIMATE_HOST").unwrap_or_else(default_host);
        let port = lookup("PORT")
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or_else(default_port);
        let weather_api_key = lookup("OPENWEATHER_KEY").unwrap_or_default();
        let weather_url = lookup("AGRIMATE_WEATHER_URL").unwrap_or_else(default_weather_url);
        let weather_timeout_secs = lookup("AGRIMATE_WEATHER_TIMEOUT_SECS")
            .and_then(|value| value.parse::<u64>().ok());
        let ollama_url = lookup("AGRIMATE_OLLAMA_URL").unwrap_or_else(default_ollama_url);
        let model = lookup("AGRIMATE_MODEL").unwrap_or_else(default_model);

        Self {
            host,
            port,
            weather_api_key,
            weather_url,
            weather_timeout: timeout_from_secs(weather_timeout_secs),
            ollama_url,
            model,
        }
    }
}

// Zero means no deadline, same as leaving it unset.
fn timeout_from_secs(secs: Option<u64>) -> Option<Duration> {
    secs.filter(|secs| *secs > 0).map(Duration::from_secs)
}

fn load_from_file() -> anyhow::Result<Option<FileConfig>> {
    let config_path = env::var("AGRIMATE_SERVER_CONFIG").ok();
    let path = if let Some(path) = config_path {
        Some(path)
    } else if Path::new("server.toml").exists() {
        Some("server.toml".to_string())
    } else {
        None
    };

    let Some(path) = path else {
        return Ok(None);
    };

    read_file_config(Path::new(&path)).map(Some)
}

fn read_file_config(path: &Path) -> anyhow::Result<FileConfig> {
    let contents = fs::read_to_string(path)
        .map_err(|err| anyhow::anyhow!("Failed to read config {}: {}", path.display(), err))?;
    let parsed: FileConfig = toml::from_str(&contents)
        .map_err(|err| anyhow::anyhow!("Failed to parse config {}: {}", path.display(), err))?;
    Ok(parsed)
}
