//! Demo configuration from the environment

use std::path::PathBuf;
use std::time::Duration;

use vitra_core::RefreshPolicy;
use vitra_gpu::RendererConfig;

/// Demo settings
///
/// Env:
/// - VITRA_REFRESH=continuous|once|manual
/// - VITRA_REFRESH_MS=200 (continuous interval)
/// - VITRA_CORNER_RADIUS=28
/// - VITRA_DUMP_CAPTURES=/tmp/vitra (write every composite as PNG)
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub policy: RefreshPolicy,
    pub corner_radius: f32,
    pub dump_dir: Option<PathBuf>,
    pub renderer: RendererConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Vitra Liquid Glass".to_string(),
            width: 480,
            height: 640,
            policy: RefreshPolicy::default(),
            corner_radius: 28.0,
            dump_dir: None,
            renderer: RendererConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let mut config = Self::from_lookup(|name| std::env::var(name).ok());
        config.renderer = config.renderer.with_env_overrides();
        config
    }

    /// Build from any key lookup, so tests don't have to touch the process
    /// environment
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let interval = get("VITRA_REFRESH_MS")
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_millis);
        let name = get("VITRA_REFRESH").unwrap_or_else(|| "continuous".to_string());
        match RefreshPolicy::parse(&name, interval) {
            Some(policy) => config.policy = policy,
            None => tracing::warn!("ignoring unknown VITRA_REFRESH={}", name),
        }

        if let Some(radius) = get("VITRA_CORNER_RADIUS").and_then(|v| v.parse::<f32>().ok()) {
            config.corner_radius = radius.max(0.0);
        }
        config.dump_dir = get("VITRA_DUMP_CAPTURES").map(PathBuf::from);
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&[]));
        assert_eq!(config.policy, RefreshPolicy::Continuous(Duration::from_millis(200)));
        assert_eq!(config.dump_dir, None);
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("VITRA_REFRESH", "continuous"),
            ("VITRA_REFRESH_MS", "50"),
            ("VITRA_CORNER_RADIUS", "12.5"),
            ("VITRA_DUMP_CAPTURES", "/tmp/captures"),
        ]));
        assert_eq!(config.policy, RefreshPolicy::Continuous(Duration::from_millis(50)));
        assert_eq!(config.corner_radius, 12.5);
        assert_eq!(config.dump_dir, Some(PathBuf::from("/tmp/captures")));
    }

    #[test]
    fn test_unknown_policy_keeps_default() {
        let config = AppConfig::from_lookup(lookup(&[("VITRA_REFRESH", "hourly")]));
        assert_eq!(config.policy, RefreshPolicy::default());

        let config = AppConfig::from_lookup(lookup(&[("VITRA_REFRESH", "manual")]));
        assert_eq!(config.policy, RefreshPolicy::Manual);
    }
}
