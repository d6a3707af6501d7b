mod defaults_linux;

use crate::config;

// PlatformDefaultParameters defines which parameters are expected by default
// for configuration on a specific platform.
#[derive(Debug)]
pub struct PlatformDefaultParameters {
    // Listener for the rendered page
    pub default_listen: String,

    // Configuration file read when none is given on the command line
    pub default_config_file: String,

    // Command sources
    pub ip_command: String,
    pub status_command: String,

    // Polling
    pub default_poll_interval: u64,
}

pub fn get_defaults() -> PlatformDefaultParameters {
    let mut defaults = PlatformDefaultParameters::default();
    if let Ok(default_config) = std::env::var("TSDASH_DEFAULT_CONFIG") {
        defaults.default_config_file = default_config;
    }
    if let Ok(default_listen) = std::env::var("TSDASH_DEFAULT_LISTEN") {
        defaults.default_listen = default_listen;
    }
    defaults
}

// Generate default configuration and return a DashboardConfig.
// This is used when outputting the --genconf parameter and as the base that
// a partial config file is layered onto.
pub fn generate_config() -> config::DashboardConfig {
    let defaults = get_defaults();
    config::DashboardConfig {
        ip_command: defaults.ip_command,
        ip_args: vec!["-s".into(), "-j".into(), "ad".into()],
        status_command: defaults.status_command,
        status_args: vec!["status".into(), "--json".into()],
        interface_pattern: "tailscale[0-9]+".into(),
        poll_interval: defaults.default_poll_interval,
        listen: defaults.default_listen,
        title: "Tailscale".into(),
        description: "Tailscale is a cross-platform and easy to use virtual LAN.".into(),
        translations: Default::default(),
    }
}
