//! Generator settings.

use std::str::FromStr;

use anyhow::Context;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorSettings {
    /// Batches larger than this log a warning. They are never truncated.
    pub display_warn_threshold: usize,
    pub page_size: usize,
    /// Used when the batch category is blank.
    pub default_category: String,
    /// Used when the batch product type is blank.
    pub default_product_type: String,
    /// Calendar days from effective date to expiry.
    pub expiry_days: u32,
    pub description_code_prefix: String,
    pub product_code_prefix: String,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            display_warn_threshold: 5000,
            page_size: 50,
            default_category: "MORTGAGE".to_string(),
            default_product_type: "MORTGAGE".to_string(),
            expiry_days: 365,
            description_code_prefix: "GEN".to_string(),
            product_code_prefix: "T2G".to_string(),
        }
    }
}

impl GeneratorSettings {
    /// Defaults overlaid with `PIM_*` environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) but reading from `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut settings = Self::default();

        if let Some(v) = lookup("PIM_DISPLAY_WARN_THRESHOLD") {
            settings.display_warn_threshold = parse("PIM_DISPLAY_WARN_THRESHOLD", &v)?;
        }
        if let Some(v) = lookup("PIM_PAGE_SIZE") {
            settings.page_size = parse("PIM_PAGE_SIZE", &v)?;
            anyhow::ensure!(settings.page_size > 0, "PIM_PAGE_SIZE must be positive");
        }
        if let Some(v) = lookup("PIM_EXPIRY_DAYS") {
            settings.expiry_days = parse("PIM_EXPIRY_DAYS", &v)?;
        }
        if let Some(v) = lookup("PIM_DEFAULT_CATEGORY") {
            settings.default_category = v;
        }
        if let Some(v) = lookup("PIM_DEFAULT_PRODUCT_TYPE") {
            settings.default_product_type = v;
        }
        if let Some(v) = lookup("PIM_DESCRIPTION_CODE_PREFIX") {
            settings.description_code_prefix = v;
        }
        if let Some(v) = lookup("PIM_PRODUCT_CODE_PREFIX") {
            settings.product_code_prefix = v;
        }

        Ok(settings)
    }
}

fn parse<T>(key: &str, value: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .trim()
        .parse()
        .with_context(|| format!("{key} must be a number, got {value:?}"))
}
