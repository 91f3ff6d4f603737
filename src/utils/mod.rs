pub mod build_info;

use std::env;
use std::path::PathBuf;
use std::sync::Once;

use dirs::home_dir;

static TRACING_INIT: Once = Once::new();

pub const HOME_ENV: &str = "PROPERTY_CORE_HOME";
const DEFAULT_DIR_NAME: &str = ".property_core";
const DRAFTS_DIR: &str = "drafts";
const CONFIG_FILE: &str = "config.json";
const DEFAULT_LOG_DIRECTIVE: &str = "property_core=info";

/// Initializes the global tracing subscriber with sensible defaults.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let mut filter = EnvFilter::from_default_env();
        if let Ok(directive) = DEFAULT_LOG_DIRECTIVE.parse() {
            filter = filter.add_directive(directive);
        }

        let _ = fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    });
}

/// Returns the application data directory, defaulting to `~/.property_core`.
pub fn app_data_dir() -> PathBuf {
    if let Some(custom) = env::var_os(HOME_ENV) {
        return PathBuf::from(custom);
    }
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_DIR_NAME)
}

/// Directory holding one file per saved form draft.
pub fn drafts_dir_in(base: &std::path::Path) -> PathBuf {
    base.join(DRAFTS_DIR)
}

pub fn config_file_in(base: &std::path::Path) -> PathBuf {
    base.join(CONFIG_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_are_nested_under_base() {
        let base = PathBuf::from("/tmp/pc");
        assert_eq!(drafts_dir_in(&base), PathBuf::from("/tmp/pc/drafts"));
        assert_eq!(config_file_in(&base), PathBuf::from("/tmp/pc/config.json"));
    }

    #[test]
    fn build_metadata_has_version() {
        assert_eq!(build_info::current().version, env!("CARGO_PKG_VERSION"));
    }
}
