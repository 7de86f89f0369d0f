// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Plugin resource loading. Stylesheets and scripts live under the plugin's
// resource root; the host decides how to attach them.

use kandy_core::BridgeConfig;
use tracing::debug;

/// Attaches plugin stylesheets and scripts to the host page.
pub trait ResourceLoader: Send + Sync {
    fn load_stylesheet(&self, href: &str);
    fn load_script(&self, src: &str);
}

/// Loader for hosts with no page to attach to.
pub struct LogLoader;

impl ResourceLoader for LogLoader {
    fn load_stylesheet(&self, href: &str) {
        debug!(href, "stylesheet");
    }

    fn load_script(&self, src: &str) {
        debug!(src, "script");
    }
}

/// Hand every configured stylesheet (`css/`) and script (`js/`) to `loader`.
pub fn load_plugin_resources(config: &BridgeConfig, loader: &dyn ResourceLoader) {
    for sheet in &config.stylesheets {
        loader.load_stylesheet(&config.resource_link(sheet, "css"));
    }
    for script in &config.scripts {
        loader.load_script(&config.resource_link(script, "js"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Collect(Mutex<Vec<String>>);

    impl ResourceLoader for Collect {
        fn load_stylesheet(&self, href: &str) {
            self.0.lock().unwrap().push(format!("css {href}"));
        }
        fn load_script(&self, src: &str) {
            self.0.lock().unwrap().push(format!("js {src}"));
        }
    }

    #[test]
    fn links_resolve_under_the_plugin_root() {
        let loader = Collect::default();
        load_plugin_resources(&BridgeConfig::default(), &loader);
        assert_eq!(
            *loader.0.lock().unwrap(),
            vec!["css plugins/com.kandy.phonegap/www/css/kandy.css".to_string()]
        );

        let config = BridgeConfig {
            scripts: vec!["extra.js".into()],
            stylesheets: vec![],
            ..BridgeConfig::default()
        };
        let loader = Collect::default();
        load_plugin_resources(&config, &loader);
        assert_eq!(
            *loader.0.lock().unwrap(),
            vec!["js plugins/com.kandy.phonegap/www/js/extra.js".to_string()]
        );
    }
}
