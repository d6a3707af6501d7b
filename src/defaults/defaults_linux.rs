use super::PlatformDefaultParameters;

impl Default for PlatformDefaultParameters {
    fn default() -> PlatformDefaultParameters {
        PlatformDefaultParameters {
            // Listener
            default_listen: "tcp://[::1]:8089".to_string(),

            // Configuration
            default_config_file: "/etc/tailscale-status.conf".to_string(),

            // Commands, at their OpenWrt locations
            ip_command: "/sbin/ip".to_string(),
            status_command: "/usr/sbin/tailscale".to_string(),

            // Polling
            default_poll_interval: 5,
        }
    }
}
