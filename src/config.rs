use crate::{
    defaults,
    error::DashErrors,
    i18n::Locale,
    loader::Invocation,
};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, time::Duration};

// DashboardConfig holds everything the dashboard host needs: which commands
// to poll, how often, where to serve the page, and the message catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    #[serde(rename = "IpCommand")]
    pub ip_command: String,
    #[serde(rename = "IpArgs")]
    pub ip_args: Vec<String>,
    #[serde(rename = "StatusCommand")]
    pub status_command: String,
    #[serde(rename = "StatusArgs")]
    pub status_args: Vec<String>,
    #[serde(rename = "InterfacePattern")]
    pub interface_pattern: String,
    #[serde(rename = "PollInterval")]
    pub poll_interval: u64,
    #[serde(rename = "Listen")]
    pub listen: String,
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Translations")]
    pub translations: HashMap<String, String>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        defaults::generate_config()
    }
}

impl DashboardConfig {
    pub fn from_hjson(raw: &str) -> Result<Self, DashErrors> {
        let cfg: DashboardConfig =
            nu_json::from_str(raw).map_err(|e| DashErrors::Config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), DashErrors> {
        if self.ip_command.is_empty() || self.status_command.is_empty() {
            return Err(DashErrors::Config("command paths must not be empty".into()));
        }
        if self.poll_interval == 0 {
            return Err(DashErrors::Config("PollInterval must be at least 1 second".into()));
        }
        regex::Regex::new(&self.interface_pattern)?;
        Ok(())
    }

    pub fn interfaces_cmd(&self) -> Invocation {
        Invocation {
            program: self.ip_command.clone(),
            args: self.ip_args.clone(),
        }
    }

    pub fn status_cmd(&self) -> Invocation {
        Invocation {
            program: self.status_command.clone(),
            args: self.status_args.clone(),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval.max(1))
    }

    pub fn locale(&self) -> Locale {
        Locale::new(self.translations.clone())
    }

    pub fn to_hjson(&self) -> Result<String, DashErrors> {
        nu_json::to_string(self).map_err(|e| DashErrors::Config(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, DashErrors> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_hjson_keeps_defaults() {
        let cfg = DashboardConfig::from_hjson(
            r#"{
                # poll less often on slow routers
                PollInterval: 10
                Translations: {
                    "Online": "En ligne"
                }
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.poll_interval(), Duration::from_secs(10));
        assert_eq!(cfg.ip_command, "/sbin/ip");
        assert_eq!(cfg.status_args, ["status", "--json"]);
        assert_eq!(cfg.locale().tr("Online"), "En ligne");
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            DashboardConfig::from_hjson("{ PollInterval: 0 }"),
            Err(DashErrors::Config(_))
        ));
        assert!(matches!(
            DashboardConfig::from_hjson(r#"{ InterfacePattern: "tailscale[" }"#),
            Err(DashErrors::InvalidPattern(_))
        ));
    }

    #[test]
    fn json_output_reads_back() {
        let cfg = DashboardConfig::default();
        let again: DashboardConfig = serde_json::from_str(&cfg.to_json().unwrap()).unwrap();
        assert_eq!(cfg, again);
    }
}
