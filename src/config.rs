use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub application: ApplicationConfig,
    pub device: DeviceConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the TTN cluster REST API
    pub base_url: String,
    /// Host used for the network/application/join server addresses
    pub server_address: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub frequency_plan_id: String,
    pub lorawan_version: String,
    pub lorawan_phy_version: String,
    pub rx2_data_rate_index: u32,
    /// Hz
    pub rx2_frequency: u64,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file {:?}: {}", path, e))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config file: {}", e))?;
        Ok(config)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://eu1.cloud.thethings.network".to_string(),
            server_address: "eu1.cloud.thethings.network".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            description: "Letterbox Application".to_string(),
        }
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            frequency_plan_id: "EU_863_870_TTN".to_string(),
            lorawan_version: "MAC_V1_0_3".to_string(),
            lorawan_phy_version: "PHY_V1_0_3_REV_A".to_string(),
            rx2_data_rate_index: 0,
            rx2_frequency: 869_525_000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}
