use crate::field::FieldConfig;
use crate::geocode::{FileStore, DEFAULT_ENDPOINT, DEFAULT_TTL_DAYS};
use crate::settings::Settings;
use std::path::PathBuf;

/// Configuration for the live pulse network
#[derive(Clone)]
pub struct NetworkConfig {
    pub time_step: f32,
    pub seed: Option<u64>,
    pub scheme: u8,
    pub field: FieldConfig,
}

impl NetworkConfig {
    /// Settings file values, then CLI overrides
    pub fn resolve(settings: &Settings, time_step: f32, seed: Option<u64>, nodes: Option<usize>, scheme: Option<u8>) -> Self {
        let net = &settings.network;
        let defaults = FieldConfig::default();
        let field = FieldConfig {
            nodes: nodes.or(net.nodes).unwrap_or(defaults.nodes).clamp(4, 2000),
            link_distance: net.link_distance.unwrap_or(defaults.link_distance).max(1.0),
            max_links: net.max_links.unwrap_or(defaults.max_links),
            publish_interval_ms: net
                .publish_interval_ms
                .map(|ms| ms as f64)
                .unwrap_or(defaults.publish_interval_ms),
        };
        Self {
            time_step: time_step.clamp(0.005, 1.0),
            seed,
            scheme: scheme.or(net.scheme).unwrap_or(0),
            field,
        }
    }
}

/// A century; larger values overflow `chrono::Duration::days`
const MAX_TTL_DAYS: i64 = 36_500;

/// Configuration for geocode cache commands
#[derive(Clone)]
pub struct GeocodeConfig {
    pub cache_path: PathBuf,
    pub endpoint: String,
    pub ttl_days: i64,
    pub offline: bool,
}

impl GeocodeConfig {
    pub fn resolve(settings: &Settings, cache: Option<PathBuf>, offline: bool) -> Self {
        let geo = &settings.geocode;
        Self {
            cache_path: cache
                .or_else(|| geo.cache_path.clone())
                .unwrap_or_else(FileStore::default_path),
            endpoint: geo.endpoint.clone().unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            ttl_days: geo.ttl_days.unwrap_or(DEFAULT_TTL_DAYS).clamp(1, MAX_TTL_DAYS),
            offline,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_overrides_settings() {
        let settings = Settings::parse("[network]\nnodes = 50\nscheme = 3\nmax_links = 2");
        let config = NetworkConfig::resolve(&settings, 0.03, Some(9), Some(90), None);
        assert_eq!(config.field.nodes, 90);
        assert_eq!(config.field.max_links, 2);
        assert_eq!(config.scheme, 3);
        assert_eq!(config.seed, Some(9));
    }

    #[test]
    fn geocode_defaults() {
        let config = GeocodeConfig::resolve(&Settings::default(), Some(PathBuf::from("/tmp/c.json")), true);
        assert_eq!(config.cache_path, PathBuf::from("/tmp/c.json"));
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.ttl_days, 30);
        assert!(config.offline);
    }

    #[test]
    fn ttl_days_is_clamped() {
        let huge = Settings::parse(&format!("[geocode]\nttl_days = {}", i64::MAX));
        let config = GeocodeConfig::resolve(&huge, None, false);
        assert_eq!(config.ttl_days, MAX_TTL_DAYS);
        assert_eq!(chrono::Duration::days(config.ttl_days).num_days(), MAX_TTL_DAYS);

        let negative = Settings::parse("[geocode]\nttl_days = -4");
        assert_eq!(GeocodeConfig::resolve(&negative, None, false).ttl_days, 1);
    }
}
