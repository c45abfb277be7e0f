use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Default, Deserialize)]
pub struct Settings {
    pub log_dir: Option<PathBuf>,
    #[serde(default)]
    pub network: NetworkSettings,
    #[serde(default)]
    pub geocode: GeocodeSettings,
}

#[derive(Debug, Default, Deserialize)]
pub struct NetworkSettings {
    pub nodes: Option<usize>,
    pub link_distance: Option<f32>,
    pub max_links: Option<usize>,
    pub publish_interval_ms: Option<u64>,
    pub scheme: Option<u8>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GeocodeSettings {
    pub cache_path: Option<PathBuf>,  // Defaults to <cache dir>/tailorpulse/geocode-cache.json
    pub endpoint: Option<String>,
    pub ttl_days: Option<i64>,
}

impl Settings {
    pub fn load() -> Self {
        let path = Self::config_path();
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(content) => Self::parse(&content),
            Err(_) => Self::default(),
        }
    }

    pub fn parse(content: &str) -> Self {
        toml::from_str(content).unwrap_or_default()
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tailorpulse")
            .join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sections() {
        let settings = Settings::parse(
            r#"
            log_dir = "/tmp/tp"

            [network]
            nodes = 120
            scheme = 2

            [geocode]
            ttl_days = 7
            "#,
        );
        assert_eq!(settings.log_dir, Some(PathBuf::from("/tmp/tp")));
        assert_eq!(settings.network.nodes, Some(120));
        assert_eq!(settings.network.scheme, Some(2));
        assert_eq!(settings.network.max_links, None);
        assert_eq!(settings.geocode.ttl_days, Some(7));
    }

    #[test]
    fn invalid_file_falls_back_to_defaults() {
        let settings = Settings::parse("[network]\nnodes = \"lots\"");
        assert_eq!(settings.network.nodes, None);
        assert!(settings.geocode.cache_path.is_none());
    }
}
