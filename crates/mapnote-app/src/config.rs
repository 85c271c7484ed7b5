//! Startup configuration of the map: a JSON file on native, URL parameters
//! in the browser.

use mapnote_core::MapConfig;

/// Environment variable naming a JSON map configuration file.
pub const CONFIG_ENV: &str = "MAPNOTE_CONFIG";

/// Resolve the map configuration for this platform.
///
/// Invalid sources are logged and skipped; the defaults always work.
#[cfg(not(target_arch = "wasm32"))]
pub fn load_map_config() -> MapConfig {
    let Some(path) = std::env::var_os(CONFIG_ENV) else {
        return MapConfig::default();
    };
    let path = std::path::PathBuf::from(path);
    match MapConfig::from_file(&path) {
        Ok(config) => {
            log::info!("Loaded map configuration from {}", path.display());
            config
        }
        Err(e) => {
            log::error!("Ignoring map configuration {}: {}", path.display(), e);
            MapConfig::default()
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub fn load_map_config() -> MapConfig {
    let mut config = MapConfig::default();
    for query in crate::web::url_queries() {
        apply_params(&mut config, &query);
    }
    config
}

/// Apply `key=value` pairs from a query string or hash fragment.
/// Returns how many were accepted.
pub fn apply_params(config: &mut MapConfig, query: &str) -> usize {
    let mut applied = 0;
    for (key, value) in parse_params(query) {
        let mut candidate = config.clone();
        let result = candidate
            .apply_param(&key, &value)
            .and_then(|()| candidate.validate());
        match result {
            Ok(()) => {
                *config = candidate;
                applied += 1;
            }
            Err(e) => log::warn!("Ignoring parameter {}={}: {}", key, value, e),
        }
    }
    applied
}

/// Split `?a=1&b=2` (or `#a=1&b=2`) into decoded pairs. Empty keys and
/// values are dropped.
pub fn parse_params(s: &str) -> Vec<(String, String)> {
    let s = s.trim_start_matches(['?', '#']);
    url::form_urlencoded::parse(s.as_bytes())
        .filter(|(key, value)| !key.is_empty() && !value.is_empty())
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mapnote_core::{Crs, GeometryKind};

    #[test]
    fn test_parse_params() {
        let params = parse_params("?lon=10.5&lat=-3&empty=&noequals&zoom=7");
        assert_eq!(
            params,
            vec![
                ("lon".to_string(), "10.5".to_string()),
                ("lat".to_string(), "-3".to_string()),
                ("zoom".to_string(), "7".to_string()),
            ]
        );
        assert!(parse_params("").is_empty());
    }

    #[test]
    fn test_params_are_percent_decoded() {
        let params = parse_params("?key=a%20b+c&tiles=https%3A%2F%2Ft%2F%7Bz%7D&pct=100%&bad=%zz");
        assert_eq!(
            params,
            vec![
                ("key".to_string(), "a b c".to_string()),
                ("tiles".to_string(), "https://t/{z}".to_string()),
                ("pct".to_string(), "100%".to_string()),
                ("bad".to_string(), "%zz".to_string()),
            ]
        );
        // Multi-byte characters survive decoding
        assert_eq!(
            parse_params("key=caf%C3%A9"),
            vec![("key".to_string(), "café".to_string())]
        );
    }

    #[test]
    fn test_apply_params_overrides_config() {
        let mut config = MapConfig::default();
        let applied = apply_params(&mut config, "#lon=2.35&lat=48.85&zoom=12&type=polygon&crs=EPSG:3857&key=paris");
        assert_eq!(applied, 6);
        assert_eq!(config.center, [2.35, 48.85]);
        assert_eq!(config.zoom, 12.0);
        assert_eq!(config.default_kind, GeometryKind::Polygon);
        assert_eq!(config.storage_crs, Crs::Epsg3857);
        assert_eq!(config.storage_key, "paris");
    }

    #[test]
    fn test_bad_params_are_skipped() {
        let mut config = MapConfig::default();
        let before = config.clone();
        let applied = apply_params(&mut config, "?zoom=abc&type=circle&color=red&lat=north&key=");
        assert_eq!(applied, 0);
        assert_eq!(config, before);
    }
}
