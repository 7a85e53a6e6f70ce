pub mod config;
pub mod core_state;
pub mod knowledge;
pub mod model;
pub mod pipeline;
pub mod translate;

pub use core_state::{CoreState, EngineStatus};
pub use pipeline::{RouteMode, RouteOutcome};

use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber. `RUST_LOG` wins over the default
/// filter. Later calls are no-ops, so hosts and tests can both call it.
pub fn init_tracing() {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init()
        .is_ok();

    if installed {
        tracing::info!("{} engine v{}", config::APP_NAME, config::APP_VERSION);
    }
}

/// Bootstrap from the environment: `SAHAYAK_CONFIG` names a JSON config file,
/// otherwise defaults under the app data directory plus env overrides.
pub fn start() -> Result<CoreState, config::ConfigError> {
    let config = match std::env::var(config::CONFIG_PATH_ENV) {
        Ok(path) if !path.trim().is_empty() => config::EngineConfig::load(std::path::Path::new(&path))?,
        _ => {
            let config = config::EngineConfig::from_env();
            config.validate()?;
            config
        }
    };
    tracing::info!(data_dir = %config.data_dir.display(), "Starting engine");
    Ok(CoreState::bootstrap(config))
}
