// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bridge configuration.

use serde::{Deserialize, Serialize};

use crate::error::{KandyError, Result};

/// Settings for the bridge itself (not the SDK configuration pushed to the
/// native layer, which stays opaque).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BridgeConfig {
    /// Plugin identifier sent with every native invocation.
    pub plugin_id: String,
    /// Command under which `initialize` pushes the SDK configuration.
    pub configuration_command: String,
    /// Root path for plugin stylesheets and scripts.
    pub resource_root: String,
    /// Stylesheets linked before widgets are rendered.
    pub stylesheets: Vec<String>,
    /// Scripts linked before widgets are rendered.
    pub scripts: Vec<String>,
    /// Prefix for generated widget ids (`<prefix>-<kind>-<n>`).
    pub id_prefix: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            plugin_id: "KandyPlugin".into(),
            configuration_command: "configurations".into(),
            resource_root: "plugins/com.kandy.phonegap/www/".into(),
            stylesheets: vec!["kandy.css".into()],
            scripts: Vec::new(),
            id_prefix: "kandy".into(),
        }
    }
}

impl BridgeConfig {
    /// Parse a JSON document, filling missing fields with defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        if config.plugin_id.is_empty() {
            return Err(KandyError::Config("pluginId must not be empty".into()));
        }
        Ok(config)
    }

    /// Path of a plugin resource, e.g. `plugins/com.kandy.phonegap/www/css/kandy.css`.
    pub fn resource_link(&self, filename: &str, kind: &str) -> String {
        format!("{}{kind}/{filename}", self.resource_root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = BridgeConfig::from_json_str(r#"{"idPrefix": "kd"}"#).unwrap();
        assert_eq!(config.id_prefix, "kd");
        assert_eq!(config.plugin_id, "KandyPlugin");
        assert_eq!(config.stylesheets, vec!["kandy.css".to_string()]);
    }

    #[test]
    fn empty_plugin_id_is_rejected() {
        let err = BridgeConfig::from_json_str(r#"{"pluginId": ""}"#).unwrap_err();
        assert!(matches!(err, KandyError::Config(_)));
    }

    #[test]
    fn resource_links_live_under_the_root() {
        let config = BridgeConfig::default();
        assert_eq!(
            config.resource_link("kandy.css", "css"),
            "plugins/com.kandy.phonegap/www/css/kandy.css"
        );
    }
}
