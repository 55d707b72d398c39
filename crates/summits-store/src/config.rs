//! Client configuration
//!
//! Network table plus the tuning knobs of the store and the map. Loadable
//! from TOML; every field has a default.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use summits_model::{DEFAULT_FLOW_WEIGHT, DEFAULT_LOOP_WEIGHT};

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Reading or writing the file failed
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed TOML
    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// Serializing failed
    #[error("serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Selected network not in the table
    #[error("unknown network: {0}")]
    UnknownNetwork(String),

    /// A value is out of range
    #[error("invalid value for {field}: {reason}")]
    Invalid {
        /// Offending field
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },
}

/// Native currency of a chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    /// Name
    pub name: String,
    /// Ticker symbol
    pub symbol: String,
    /// Decimal places
    pub decimals: u8,
}

/// One deployment of the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkInfo {
    /// Human readable name
    pub name: String,
    /// Chain id
    pub chain_id: u64,
    /// RPC endpoint
    pub url: String,
    /// Block explorer, if any
    #[serde(default)]
    pub explorer: Option<String>,
    /// Address of the ledger contract
    pub contract_address: String,
    /// Native currency
    pub native_currency: NativeCurrency,
}

impl NetworkInfo {
    /// Chain id as `0x`-prefixed hex, as wallets expect it
    #[must_use]
    pub fn chain_id_hex(&self) -> String {
        format!("{:#x}", self.chain_id)
    }
}

/// Summits client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummitsConfig {
    /// Known networks by key
    pub networks: IndexMap<String, NetworkInfo>,
    /// Key of the selected network
    pub network: String,
    /// Divisor `k` in `r = sqrt(local_supply) / k`
    pub radius_divisor: f64,
    /// Half side of the logical map square at scale 1
    pub logical_half_side: f64,
    /// Duration of the centering animation in milliseconds
    pub centering_duration_ms: u64,
    /// Radius around the view center new aims are placed in
    pub spawn_radius: f64,
    /// Loop weight of new aims
    pub default_loop_weight: u16,
    /// Weight of new flows
    pub default_flow_weight: u16,
}

impl SummitsConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With selected network
    #[inline]
    #[must_use]
    pub fn with_network(mut self, network: impl Into<String>) -> Self {
        self.network = network.into();
        self
    }

    /// With an additional network
    #[must_use]
    pub fn with_network_info(mut self, key: impl Into<String>, info: NetworkInfo) -> Self {
        self.networks.insert(key.into(), info);
        self
    }

    /// With radius divisor
    #[inline]
    #[must_use]
    pub fn with_radius_divisor(mut self, divisor: f64) -> Self {
        self.radius_divisor = divisor;
        self
    }

    /// With centering animation duration
    #[inline]
    #[must_use]
    pub fn with_centering_duration(mut self, duration: Duration) -> Self {
        self.centering_duration_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// With spawn radius
    #[inline]
    #[must_use]
    pub fn with_spawn_radius(mut self, radius: f64) -> Self {
        self.spawn_radius = radius;
        self
    }

    /// Centering animation duration
    #[must_use]
    pub fn centering_duration(&self) -> Duration {
        Duration::from_millis(self.centering_duration_ms)
    }

    /// The selected network
    ///
    /// # Errors
    /// Returns error if `network` is not in the table
    pub fn active_network(&self) -> Result<&NetworkInfo, ConfigError> {
        self.networks
            .get(&self.network)
            .ok_or_else(|| ConfigError::UnknownNetwork(self.network.clone()))
    }

    /// Check value ranges and the network selection
    ///
    /// # Errors
    /// Returns the first problem found
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.radius_divisor.is_finite() && self.radius_divisor > 0.0) {
            return Err(ConfigError::Invalid {
                field: "radius_divisor",
                reason: format!("{} is not positive", self.radius_divisor),
            });
        }
        if !(self.logical_half_side.is_finite() && self.logical_half_side > 0.0) {
            return Err(ConfigError::Invalid {
                field: "logical_half_side",
                reason: format!("{} is not positive", self.logical_half_side),
            });
        }
        if !(self.spawn_radius.is_finite() && self.spawn_radius >= 0.0) {
            return Err(ConfigError::Invalid {
                field: "spawn_radius",
                reason: format!("{} is negative", self.spawn_radius),
            });
        }
        self.active_network().map(|_| ())
    }

    /// Parse and validate TOML
    ///
    /// # Errors
    /// Returns error if parsing or validation fails
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    ///
    /// # Errors
    /// Returns error if the file cannot be read or is invalid
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load from a TOML file if it exists, else use defaults
    ///
    /// # Errors
    /// Returns error if an existing file cannot be read or is invalid
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            tracing::info!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Save to a TOML file
    ///
    /// # Errors
    /// Returns error if serialization or writing fails
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

impl Default for SummitsConfig {
    fn default() -> Self {
        Self {
            networks: default_networks(),
            network: "localnet".to_string(),
            radius_divisor: 1e7,
            logical_half_side: 1000.0,
            centering_duration_ms: 500,
            spawn_radius: 200.0,
            default_loop_weight: DEFAULT_LOOP_WEIGHT,
            default_flow_weight: DEFAULT_FLOW_WEIGHT,
        }
    }
}

fn default_networks() -> IndexMap<String, NetworkInfo> {
    let mut networks = IndexMap::new();
    networks.insert(
        "mumbai".to_string(),
        NetworkInfo {
            name: "Mumbai (Polygon Testnet)".to_string(),
            chain_id: 80001,
            url: "https://matic-mumbai.chainstacklabs.com".to_string(),
            explorer: Some("https://mumbai.polygonscan.com".to_string()),
            contract_address: "0x825b11Fd4bc6F185c87C145fdDa032216a7Bdd2c".to_string(),
            native_currency: NativeCurrency {
                name: "MATIC".to_string(),
                symbol: "MATIC".to_string(),
                decimals: 18,
            },
        },
    );
    networks.insert(
        "goerli".to_string(),
        NetworkInfo {
            name: "Goerli Test Network".to_string(),
            chain_id: 5,
            url: "https://goerli.infura.io/v3/".to_string(),
            explorer: Some("https://goerli.etherscan.io".to_string()),
            contract_address: "0x0baBF216a5815F0567f400bAF94b72F57eeF07B9".to_string(),
            native_currency: NativeCurrency {
                name: "ETH".to_string(),
                symbol: "ETH".to_string(),
                decimals: 18,
            },
        },
    );
    networks.insert(
        "localnet".to_string(),
        NetworkInfo {
            name: "localnet".to_string(),
            chain_id: 1337,
            url: "http://localhost:8545".to_string(),
            explorer: None,
            contract_address: "0x5FbDB2315678afecb367f032d93F642f64180aa3".to_string(),
            native_currency: NativeCurrency {
                name: "LocalCoin".to_string(),
                symbol: "LOCAL".to_string(),
                decimals: 18,
            },
        },
    );
    networks
}
