use serde::Deserialize;
use std::path::PathBuf;

/// Environment variable naming the analysis server base URL
pub const ANALYSIS_ENDPOINT_ENV: &str = "GEMINI_QUEUE_SERVER_API";

#[derive(Debug, Clone, Deserialize, Default)]
pub struct GitLabConfig {
    /// Offered as the default answer to the URL prompt
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AnalysisConfig {
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub gitlab: GitLabConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

fn config_path() -> Option<PathBuf> {
    let config_dir = dirs::config_dir()?;
    Some(config_dir.join("mr-finder").join("config.toml"))
}

impl Config {
    pub fn load() -> Self {
        let Some(path) = config_path() else {
            return Config::default();
        };

        let Ok(content) = std::fs::read_to_string(&path) else {
            return Config::default();
        };

        match toml::from_str::<Config>(&content) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring invalid config file");
                Config::default()
            }
        }
    }

    /// Analysis base URL: the environment wins over the config file
    pub fn analysis_endpoint(&self) -> Option<String> {
        resolve_endpoint(std::env::var(ANALYSIS_ENDPOINT_ENV).ok(), self)
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn resolve_endpoint(env: Option<String>, config: &Config) -> Option<String> {
    non_empty(env.as_deref()).or_else(|| non_empty(config.analysis.endpoint.as_deref()))
}

/// Where to connect and as whom, as entered at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub base_url: String,
    pub token: String,
}

/// Prefix `https://` when no scheme is given and drop trailing slashes
pub fn normalize_base_url(input: &str) -> String {
    let url = input.trim().trim_end_matches('/');
    if url.starts_with("https://") || url.starts_with("http://") {
        url.to_string()
    } else {
        format!("https://{}", url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_config() {
        let toml_str = r#"
[gitlab]
url = "https://gitlab.company.com"

[analysis]
endpoint = "http://queue.internal:8080"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.gitlab.url.as_deref(), Some("https://gitlab.company.com"));
        assert_eq!(
            config.analysis.endpoint.as_deref(),
            Some("http://queue.internal:8080")
        );
    }

    #[test]
    fn missing_sections_default_to_none() {
        let config: Config = toml::from_str("[gitlab]\n").unwrap();
        assert_eq!(config.gitlab.url, None);
        assert_eq!(config.analysis.endpoint, None);
    }

    #[test]
    fn environment_overrides_config_file() {
        let config: Config = toml::from_str("[analysis]\nendpoint = \"http://file\"").unwrap();
        assert_eq!(
            resolve_endpoint(Some("http://env".into()), &config).as_deref(),
            Some("http://env")
        );
        assert_eq!(
            resolve_endpoint(None, &config).as_deref(),
            Some("http://file")
        );
        assert_eq!(
            resolve_endpoint(Some("  ".into()), &config).as_deref(),
            Some("http://file")
        );
        assert_eq!(resolve_endpoint(None, &Config::default()), None);
    }

    #[test]
    fn base_url_gets_scheme_and_loses_trailing_slash() {
        assert_eq!(normalize_base_url("gitlab.com"), "https://gitlab.com");
        assert_eq!(
            normalize_base_url(" https://gitlab.company.com/ "),
            "https://gitlab.company.com"
        );
        assert_eq!(normalize_base_url("http://localhost:8080//"), "http://localhost:8080");
    }
}
