use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::str::FromStr;
use uuid::Uuid;

/// Commission settings applied when a payment is split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommissionPolicy {
    /// Fraction of the rental total kept by the platform, e.g. `0.10`.
    pub rate: Decimal,
    /// Floor on the platform fee for cheap rentals.
    pub minimum: Decimal,
}

impl Default for CommissionPolicy {
    fn default() -> Self {
        Self {
            rate: dec!(0.10),
            minimum: dec!(10000),
        }
    }
}

/// Runtime configuration shared with every handler.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub commission: CommissionPolicy,
    /// Recipient id used for the platform's distribution rows.
    pub platform_account_id: Uuid,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            commission: CommissionPolicy::default(),
            platform_account_id: Uuid::nil(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            commission: CommissionPolicy {
                rate: parse_env("COMMISSION_RATE", defaults.commission.rate),
                minimum: parse_env("MINIMUM_COMMISSION", defaults.commission.minimum),
            },
            platform_account_id: parse_env("PLATFORM_ACCOUNT_ID", defaults.platform_account_id),
        }
    }
}

fn parse_env<T: FromStr>(env_var: &str, default: T) -> T {
    match std::env::var(env_var) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring unparsable {env_var}={raw}, using default");
            default
        }),
        Err(_) => default,
    }
}
