//! Logging initialisation.

use std::collections::HashMap;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Global default level: "trace" | "debug" | "info" | "warn" | "error"
    pub level: String,
    /// Per-crate overrides: crate name → level
    pub components: HashMap<String, String>,
    /// JSON lines instead of human-readable text
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            components: HashMap::new(),
            json: false,
        }
    }
}

impl LogConfig {
    /// Add a `crate=level` override.
    pub fn add_component(&mut self, spec: &str) -> Result<(), String> {
        match spec.split_once('=') {
            Some((component, level)) if !component.is_empty() && !level.is_empty() => {
                self.components.insert(component.to_string(), level.to_string());
                Ok(())
            }
            _ => Err(format!("invalid --log-component {spec:?}, expected crate=level")),
        }
    }

    /// `EnvFilter` directives, e.g. `"info,chainpools_subgraph=debug"`.
    pub fn directives(&self) -> String {
        let mut directives = self.level.clone();
        let mut components: Vec<_> = self.components.iter().collect();
        components.sort();
        for (component, level) in components {
            directives.push_str(&format!(",{}={}", component.replace('-', "_"), level));
        }
        directives
    }
}

/// Install the global subscriber. `RUST_LOG`, when set, wins over `config`.
pub fn init_tracing(config: &LogConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.directives()))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    let installed = if config.json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer()).try_init()
    };
    if let Err(e) = installed {
        eprintln!("tracing already initialised: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directives_include_components() {
        let cfg = LogConfig {
            level: "warn".into(),
            components: HashMap::from([
                ("chainpools-subgraph".to_string(), "debug".to_string()),
                ("chainpools-core".to_string(), "info".to_string()),
            ]),
            json: false,
        };
        assert_eq!(
            cfg.directives(),
            "warn,chainpools_core=info,chainpools_subgraph=debug"
        );
    }

    #[test]
    fn component_flag_parsing() {
        let mut cfg = LogConfig::default();
        cfg.add_component("chainpools-storage=trace").unwrap();
        assert_eq!(cfg.directives(), "info,chainpools_storage=trace");
        assert!(cfg.add_component("chainpools-storage").is_err());
        assert!(cfg.add_component("=debug").is_err());
    }

    #[test]
    fn default_is_info() {
        assert_eq!(LogConfig::default().directives(), "info");
    }
}
