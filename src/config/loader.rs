//! Configuration Loader
//!
//! Loads configuration from a TOML file, applies environment-variable
//! overrides, and validates the result before anything touches the network.
//!
//! The override names mirror the environment contract the bot has always
//! been driven with: RPC_URL, WALLET_ADDRESS, TOKEN_IN, TOKEN_OUT,
//! AMOUNT_IN, AMOUNT_IN_FRIDAY, SLIPPAGE_PERCENT, SEND_TO. The private key
//! is deliberately NOT part of this struct; it is read from the PRIVATE_KEY
//! environment variable by the wallet and never written to disk.

use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Main configuration structure matching config.toml
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub chain: ChainSection,
    pub wallet: WalletSection,
    pub odos: OdosSection,
    pub swap: SwapSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

/// Chain / RPC configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct ChainSection {
    /// Chain ID the bot trades on (10 = Optimism)
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    /// JSON-RPC endpoint (use a private RPC for production)
    pub rpc_url: String,
    /// Per-request RPC timeout
    #[serde(default = "default_rpc_timeout_secs")]
    pub rpc_timeout_secs: u64,
    /// How long to wait for a transaction receipt before giving up
    #[serde(default = "default_confirmation_timeout_secs")]
    pub confirmation_timeout_secs: u64,
    /// Percentage added on top of the gas estimate (20 = +20%)
    #[serde(default = "default_gas_headroom_percent")]
    pub gas_headroom_percent: u64,
}

/// Wallet configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct WalletSection {
    /// Wallet address; must match the address derived from PRIVATE_KEY
    pub address: String,
}

/// Odos API configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct OdosSection {
    /// Odos API base URL
    #[serde(default = "default_odos_api_url")]
    pub api_url: String,
    /// Slippage tolerance in percent (0.5 = 0.5%)
    pub slippage_percent: Decimal,
    /// Request timeout for Odos API calls
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Number of retry attempts for retryable API failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

/// Swap parameters section
#[derive(Debug, Clone, Deserialize)]
pub struct SwapSection {
    /// Input token address (the token being sold)
    pub token_in: String,
    /// Output token address (the token being bought)
    pub token_out: String,
    /// Amount of the input token to swap per run, in human units
    pub amount_in: Decimal,
    /// Larger amount used on Fridays, if set
    #[serde(default)]
    pub friday_amount_in: Option<Decimal>,
    /// Address the acquired tokens are forwarded to after the swap, if set
    #[serde(default)]
    pub forward_to: Option<String>,
}

/// Logging configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

pub fn default_chain_id() -> u64 {
    10
}

pub fn default_rpc_timeout_secs() -> u64 {
    30
}

pub fn default_confirmation_timeout_secs() -> u64 {
    180
}

pub fn default_gas_headroom_percent() -> u64 {
    20
}

pub fn default_odos_api_url() -> String {
    "https://api.odos.xyz".to_string()
}

pub fn default_request_timeout_secs() -> u64 {
    30
}

pub fn default_max_retries() -> u32 {
    3
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Invalid override {name}='{value}': {reason}")]
    InvalidOverride {
        name: &'static str,
        value: String,
        reason: String,
    },
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Load configuration from a TOML file and apply environment overrides.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let expanded = shellexpand::tilde(&path.as_ref().to_string_lossy()).into_owned();
    let content = std::fs::read_to_string(expanded)?;
    let mut config: Config = toml::from_str(&content)?;
    config.apply_overrides(&env_overrides())?;
    config.validate()?;
    Ok(config)
}

/// Collect the override variables that are actually set.
fn env_overrides() -> HashMap<&'static str, String> {
    const NAMES: [&str; 8] = [
        "RPC_URL",
        "WALLET_ADDRESS",
        "TOKEN_IN",
        "TOKEN_OUT",
        "AMOUNT_IN",
        "AMOUNT_IN_FRIDAY",
        "SLIPPAGE_PERCENT",
        "SEND_TO",
    ];

    NAMES
        .iter()
        .filter_map(|name| std::env::var(name).ok().map(|value| (*name, value)))
        .filter(|(_, value)| !value.is_empty())
        .collect()
}

impl Config {
    /// Apply overrides from the given variable map. Environment values win
    /// over the file so the same config can be reused across deployments.
    pub fn apply_overrides(
        &mut self,
        vars: &HashMap<&'static str, String>,
    ) -> Result<(), ConfigError> {
        if let Some(value) = vars.get("RPC_URL") {
            self.chain.rpc_url = value.clone();
        }
        if let Some(value) = vars.get("WALLET_ADDRESS") {
            self.wallet.address = value.clone();
        }
        if let Some(value) = vars.get("TOKEN_IN") {
            self.swap.token_in = value.clone();
        }
        if let Some(value) = vars.get("TOKEN_OUT") {
            self.swap.token_out = value.clone();
        }
        if let Some(value) = vars.get("SEND_TO") {
            self.swap.forward_to = Some(value.clone());
        }
        if let Some(value) = vars.get("AMOUNT_IN") {
            self.swap.amount_in = parse_decimal("AMOUNT_IN", value)?;
        }
        if let Some(value) = vars.get("AMOUNT_IN_FRIDAY") {
            self.swap.friday_amount_in = Some(parse_decimal("AMOUNT_IN_FRIDAY", value)?);
        }
        if let Some(value) = vars.get("SLIPPAGE_PERCENT") {
            self.odos.slippage_percent = parse_decimal("SLIPPAGE_PERCENT", value)?;
        }
        Ok(())
    }

    /// Validate all configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chain.rpc_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "rpc_url cannot be empty".to_string(),
            ));
        }

        if self.chain.chain_id == 0 {
            return Err(ConfigError::ValidationError(
                "chain_id must be > 0".to_string(),
            ));
        }

        if self.wallet.address.is_empty() {
            return Err(ConfigError::ValidationError(
                "wallet address cannot be empty".to_string(),
            ));
        }

        if self.swap.token_in.is_empty() || self.swap.token_out.is_empty() {
            return Err(ConfigError::ValidationError(
                "token_in and token_out cannot be empty".to_string(),
            ));
        }

        if self.swap.amount_in <= Decimal::ZERO {
            return Err(ConfigError::ValidationError(format!(
                "amount_in must be > 0, got {}",
                self.swap.amount_in
            )));
        }

        if let Some(friday) = self.swap.friday_amount_in {
            if friday <= Decimal::ZERO {
                return Err(ConfigError::ValidationError(format!(
                    "friday_amount_in must be > 0, got {}",
                    friday
                )));
            }
        }

        if self.odos.slippage_percent <= Decimal::ZERO
            || self.odos.slippage_percent >= Decimal::ONE_HUNDRED
        {
            return Err(ConfigError::ValidationError(format!(
                "slippage_percent must be between 0 and 100, got {}",
                self.odos.slippage_percent
            )));
        }

        if self.odos.api_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "odos api_url cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

fn parse_decimal(name: &'static str, value: &str) -> Result<Decimal, ConfigError> {
    Decimal::from_str(value).map_err(|e| ConfigError::InvalidOverride {
        name,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_valid_config() -> String {
        r#"
[chain]
chain_id = 10
rpc_url = "https://mainnet.optimism.io"

[wallet]
address = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"

[odos]
slippage_percent = "0.5"

[swap]
token_in = "0x0b2C639c533813f4Aa9D7837CAf62653d097Ff85"
token_out = "0x4200000000000000000000000000000000000006"
amount_in = "25"
friday_amount_in = "100"
forward_to = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8"

[logging]
level = "info"
"#
        .to_string()
    }

    #[test]
    fn test_load_valid_config() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(create_valid_config().as_bytes()).unwrap();

        let config = load_config(file.path()).unwrap();

        assert_eq!(config.chain.chain_id, 10);
        assert_eq!(config.swap.amount_in, dec!(25));
        assert_eq!(config.swap.friday_amount_in, Some(dec!(100)));
        assert_eq!(config.odos.slippage_percent, dec!(0.5));
        // Defaults kick in for omitted fields
        assert_eq!(config.odos.api_url, "https://api.odos.xyz");
        assert_eq!(config.chain.rpc_timeout_secs, 30);
        assert_eq!(config.chain.gas_headroom_percent, 20);
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_config("/nonexistent/path/config.toml");
        assert!(matches!(result.unwrap_err(), ConfigError::IoError(_)));
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let minimal = r#"
[chain]
rpc_url = "https://mainnet.optimism.io"

[wallet]
address = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"

[odos]
slippage_percent = "0.5"

[swap]
token_in = "0x0b2C639c533813f4Aa9D7837CAf62653d097Ff85"
token_out = "0x4200000000000000000000000000000000000006"
amount_in = "25"
"#;
        let config: Config = toml::from_str(minimal).unwrap();
        config.validate().unwrap();

        assert_eq!(config.chain.chain_id, 10);
        assert!(config.swap.friday_amount_in.is_none());
        assert!(config.swap.forward_to.is_none());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_env_overrides_win() {
        let mut config: Config = toml::from_str(&create_valid_config()).unwrap();

        let mut vars: HashMap<&'static str, String> = HashMap::new();
        vars.insert("RPC_URL", "https://rpc.example.org".to_string());
        vars.insert("AMOUNT_IN", "12.5".to_string());
        vars.insert("SLIPPAGE_PERCENT", "1.0".to_string());
        vars.insert("SEND_TO", "0x3C44CdDdB6a900fa2b585dd299e03d12FA4293BC".to_string());

        config.apply_overrides(&vars).unwrap();

        assert_eq!(config.chain.rpc_url, "https://rpc.example.org");
        assert_eq!(config.swap.amount_in, dec!(12.5));
        assert_eq!(config.odos.slippage_percent, dec!(1.0));
        assert_eq!(
            config.swap.forward_to.as_deref(),
            Some("0x3C44CdDdB6a900fa2b585dd299e03d12FA4293BC")
        );
    }

    #[test]
    fn test_bad_decimal_override() {
        let mut config: Config = toml::from_str(&create_valid_config()).unwrap();

        let mut vars: HashMap<&'static str, String> = HashMap::new();
        vars.insert("AMOUNT_IN", "not-a-number".to_string());

        let err = config.apply_overrides(&vars).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidOverride {
                name: "AMOUNT_IN",
                ..
            }
        ));
    }

    #[test]
    fn test_invalid_amount() {
        let mut config: Config = toml::from_str(&create_valid_config()).unwrap();
        config.swap.amount_in = dec!(0);

        assert!(matches!(
            config.validate().unwrap_err(),
            ConfigError::ValidationError(_)
        ));
    }

    #[test]
    fn test_invalid_slippage() {
        let mut config: Config = toml::from_str(&create_valid_config()).unwrap();
        config.odos.slippage_percent = dec!(100);

        assert!(matches!(
            config.validate().unwrap_err(),
            ConfigError::ValidationError(_)
        ));
    }

    #[test]
    fn test_empty_rpc_url() {
        let mut config: Config = toml::from_str(&create_valid_config()).unwrap();
        config.chain.rpc_url = String::new();

        assert!(matches!(
            config.validate().unwrap_err(),
            ConfigError::ValidationError(_)
        ));
    }
}
