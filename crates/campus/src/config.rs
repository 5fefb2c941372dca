//! CLI configuration: thin wrapper around `campus_config` shared types.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--profile, --api-url, --timeout, --insecure).

use std::sync::Arc;
use std::time::Duration;

use campus_core::{ClientConfig, TlsMode, TokenStore};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use campus_config::{
    Config, DEFAULT_API_URL, Profile, TokenBackend, config_path, load_config, save_config,
};

/// Everything a command needs to build a `Controller`.
pub struct Resolved {
    pub profile_name: String,
    pub client: ClientConfig,
    pub tokens: Arc<dyn TokenStore>,
}

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    config.profile_name(global.profile.as_deref())
}

/// Load the config file and translate the active profile, with CLI flag
/// overrides taking priority over profile values.
pub fn resolve(global: &GlobalOpts) -> Result<Resolved, CliError> {
    let cfg = load_config()?;
    let profile_name = active_profile_name(global, &cfg);

    let mut profile = cfg.profile(&profile_name).map_err(|_| {
        let mut names: Vec<_> = cfg.profiles.keys().cloned().collect();
        names.sort();
        CliError::ProfileNotFound {
            name: profile_name.clone(),
            available: if names.is_empty() {
                "(none)".into()
            } else {
                names.join(", ")
            },
        }
    })?;

    if let Some(ref url) = global.api_url {
        profile.api_url.clone_from(url);
    }
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }

    let mut client = campus_config::profile_to_client_config(&profile, &cfg.defaults)?;
    if global.insecure {
        client.tls = TlsMode::DangerAcceptInvalid;
    }
    if client.timeout.is_zero() {
        client.timeout = Duration::from_secs(cfg.defaults.timeout.max(1));
    }

    let tokens = campus_config::open_token_store(&profile, &profile_name)?;
    tracing::debug!(
        profile = %profile_name,
        api_url = %client.api_url,
        backend = %profile.token_store,
        "resolved profile"
    );

    Ok(Resolved {
        profile_name,
        client,
        tokens,
    })
}
