use anyhow::{Context, Result};
use std::env;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Dev,
    Staging,
    Prod,
}

impl Environment {
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "prod" | "production" => Self::Prod,
            "staging" => Self::Staging,
            _ => Self::Dev,
        }
    }

    pub fn is_dev(&self) -> bool {
        matches!(self, Self::Dev)
    }

    pub fn is_prod(&self) -> bool {
        matches!(self, Self::Prod)
    }
}

/// Markup defaults applied when a new estimate is created.
///
/// Domain convention, not business law: every rate stays editable per
/// estimate after creation.
#[derive(Debug, Clone)]
pub struct EstimateDefaults {
    pub ocm_overhead: f64,
    pub ocm_contingency: f64,
    pub ocm_misc: f64,
    pub ocm_profit: f64,
    pub vat_rate: f64,
}

impl Default for EstimateDefaults {
    fn default() -> Self {
        Self {
            ocm_overhead: 5.0,
            ocm_contingency: 5.0,
            ocm_misc: 3.0,
            ocm_profit: 10.0,
            vat_rate: 12.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub env: Environment,

    // Estimate creation defaults
    pub estimate_defaults: EstimateDefaults,

    // Display formatting
    pub currency_symbol: String,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        // Load .env if present; real environment variables win.
        dotenvy::dotenv().ok();

        let env = Environment::from_str(&env::var("ENV").unwrap_or_else(|_| "dev".to_string()));

        let defaults = EstimateDefaults::default();
        let estimate_defaults = EstimateDefaults {
            ocm_overhead: env_f64("OCM_OVERHEAD_PERCENT", defaults.ocm_overhead)?,
            ocm_contingency: env_f64("OCM_CONTINGENCY_PERCENT", defaults.ocm_contingency)?,
            ocm_misc: env_f64("OCM_MISC_PERCENT", defaults.ocm_misc)?,
            ocm_profit: env_f64("OCM_PROFIT_PERCENT", defaults.ocm_profit)?,
            vat_rate: env_f64("DEFAULT_VAT_RATE", defaults.vat_rate)?,
        };

        let currency_symbol = env::var("CURRENCY_SYMBOL").unwrap_or_else(|_| "₱".to_string());

        Ok(Settings {
            env,
            estimate_defaults,
            currency_symbol,
        })
    }
}

/// Read an f64 from the environment, falling back to `default` when unset.
/// A value that is set but unparseable is a hard error, not a silent default.
fn env_f64(key: &str, default: f64) -> Result<f64> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} must be a number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}
