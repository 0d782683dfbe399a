use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub oracle: OracleConfig,
    #[serde(default)]
    pub rates: RateCacheConfig,
    #[serde(default)]
    pub distribution: DistributionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    pub base_url: String,
    /// Per-request timeout for batch quotes, in seconds.
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateCacheConfig {
    /// How long a loaded rate table stays fresh, in seconds.
    pub ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributionConfig {
    /// What to do when a graph currency has no conversion rate:
    /// "skip" (zero the nodes), "parity" (treat 1 unit as 1 USD), or a
    /// fixed decimal rate.
    pub missing_rate: MissingRateSetting,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingRateSetting {
    Skip,
    Parity,
    Fixed(Decimal),
}

impl Default for RateCacheConfig {
    fn default() -> Self {
        Self { ttl_secs: 300 }
    }
}

impl Default for DistributionConfig {
    fn default() -> Self {
        Self {
            missing_rate: MissingRateSetting::Skip,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/tier_rewards".to_string(),
                max_connections: 10,
            },
            oracle: OracleConfig {
                base_url: "https://api.coingecko.com/api/v3".to_string(),
                timeout_secs: 5,
            },
            rates: RateCacheConfig::default(),
            distribution: DistributionConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_cache_ttl_is_five_minutes() {
        assert_eq!(RateCacheConfig::default().ttl_secs, 300);
    }

    #[test]
    fn default_missing_rate_policy_is_skip() {
        assert!(matches!(
            DistributionConfig::default().missing_rate,
            MissingRateSetting::Skip
        ));
    }

    #[test]
    fn missing_rate_setting_deserializes_from_toml_style_strings() {
        let skip: MissingRateSetting = serde_json::from_str("\"skip\"").unwrap();
        assert!(matches!(skip, MissingRateSetting::Skip));

        let parity: MissingRateSetting = serde_json::from_str("\"parity\"").unwrap();
        assert!(matches!(parity, MissingRateSetting::Parity));

        let fixed: MissingRateSetting = serde_json::from_str("{\"fixed\": \"2.5\"}").unwrap();
        assert!(matches!(fixed, MissingRateSetting::Fixed(_)));
    }
}
