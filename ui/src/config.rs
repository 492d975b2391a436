//! App-wide settings, provided once at the root as context.

use api::GatewayConfig;

use crate::export::ExportOptions;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppConfig {
    pub gateway: GatewayConfig,
    pub export: ExportOptions,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            gateway: GatewayConfig::from_env(),
            export: ExportOptions::from_env(),
        }
    }
}
