use anyhow::{Context, Result};
use directories::ProjectDirs;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

const DEFAULT_WATCHED_ORES: [&str; 15] = [
    "Compressed Bitumens",
    "Compressed Brimful Bitumens",
    "Compressed Glistening Bitumens",
    "Compressed Zeolites",
    "Compressed Brimful Zeolites",
    "Compressed Glistening Zeolites",
    "Compressed Coesite",
    "Compressed Brimful Coesite",
    "Compressed Glistening Coesite",
    "Compressed Sylvite",
    "Compressed Brimful Sylvite",
    "Compressed Glistening Sylvite",
    "Compressed Veldspar",
    "Compressed Dense Veldspar",
    "Compressed Concentrated Veldspar",
];

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct JaniceProviderConfig {
    pub base_url: String,
    #[serde(default)]
    pub api_key: Option<String>,
    /// Janice market id, 2 is Jita 4-4.
    #[serde(default = "default_market")]
    pub market: u32,
}

fn default_market() -> u32 {
    2
}

impl Default for JaniceProviderConfig {
    fn default() -> Self {
        JaniceProviderConfig {
            base_url: "https://janice.e-351.com".to_string(),
            api_key: None,
            market: default_market(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PushXProviderConfig {
    pub base_url: String,
    #[serde(default = "default_api_client")]
    pub api_client: String,
}

fn default_api_client() -> String {
    "EveProfits".to_string()
}

impl Default for PushXProviderConfig {
    fn default() -> Self {
        PushXProviderConfig {
            base_url: "https://api.pushx.net".to_string(),
            api_client: default_api_client(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub janice: Option<JaniceProviderConfig>,
    pub pushx: Option<PushXProviderConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            janice: Some(JaniceProviderConfig::default()),
            pushx: Some(PushXProviderConfig::default()),
        }
    }
}

/// The reference contract the freight rate is quoted for.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct FreightConfig {
    pub origin: String,
    pub destination: String,
    pub volume: u64,
    pub collateral: u64,
}

impl Default for FreightConfig {
    fn default() -> Self {
        FreightConfig {
            origin: "Inder".to_string(),
            destination: "Jita".to_string(),
            volume: 150_000,
            collateral: 3_000_000_000,
        }
    }
}

fn default_fee_rate() -> Decimal {
    Decimal::new(463, 2)
}

fn default_watched_ores() -> Vec<String> {
    DEFAULT_WATCHED_ORES.iter().map(|s| s.to_string()).collect()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub freight: FreightConfig,
    /// Sell fees in percent.
    #[serde(default = "default_fee_rate")]
    pub fee_rate: Decimal,
    #[serde(default = "default_watched_ores")]
    pub watched_ores: Vec<String>,
    pub data_path: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            providers: ProvidersConfig::default(),
            freight: FreightConfig::default(),
            fee_rate: default_fee_rate(),
            watched_ores: default_watched_ores(),
            data_path: None,
        }
    }
}

impl AppConfig {
    /// Loads `config_path` if given, else the default config file if present,
    /// else built-in defaults.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_path(path);
        }

        let default_path = Self::default_config_path()?;
        if default_path.exists() {
            debug!("Loading default config");
            Self::load_from_path(&default_path)
        } else {
            debug!(
                "No config at {}, using built-in defaults",
                default_path.display()
            );
            Ok(Self::default())
        }
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("net", "eveprofits", "eveprofits")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("net", "eveprofits", "eveprofits")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}
