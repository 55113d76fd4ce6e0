use anyhow::Result;
use dotenvy::dotenv;
use serde::Deserialize;

/// Configuration for the application
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Database connection URL
    pub database_url: String,

    /// Base URL of the hosted auth service, e.g. `https://xyz.supabase.co`
    pub supabase_url: Option<String>,

    /// Public (anon) API key sent with auth requests
    pub supabase_anon_key: Option<String>,

    #[serde(default = "default_studio_name")]
    pub studio_name: String,

    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,

    /// Directory invoice documents are written to
    #[serde(default = "default_export_dir")]
    pub export_dir: String,

    #[serde(default = "default_log_file")]
    pub log_file: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_studio_name() -> String {
    "Subh Stories Studio".to_string()
}

fn default_currency_symbol() -> String {
    "₹".to_string()
}

fn default_export_dir() -> String {
    "invoices".to_string()
}

fn default_log_file() -> String {
    "studio-dashboard.log".to_string()
}

fn default_max_connections() -> u32 {
    5
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Variables from a `.env` file are loaded first if one exists.
    pub fn load() -> Result<Self> {
        dotenv().ok();

        Self::from_vars(std::env::vars())
    }

    /// Build from an explicit set of variables, ignoring `.env`.
    pub fn from_vars<I>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Ok(envy::from_iter::<_, Config>(vars)?)
    }

    /// Get a direct reference to the database URL
    pub fn database_url(&self) -> &str {
        &self.database_url
    }
}

/// Initialize environment variables and load configuration
pub fn init() -> Result<Config> {
    Config::load()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_apply() {
        let config = Config::from_vars(vars(&[("DATABASE_URL", "postgres://localhost/studio")])).unwrap();
        assert_eq!(config.database_url(), "postgres://localhost/studio");
        assert_eq!(config.studio_name, "Subh Stories Studio");
        assert_eq!(config.currency_symbol, "₹");
        assert_eq!(config.export_dir, "invoices");
        assert_eq!(config.max_connections, 5);
        assert!(config.supabase_url.is_none());
    }

    #[test]
    fn overrides_are_read() {
        let config = Config::from_vars(vars(&[
            ("DATABASE_URL", "postgres://db/studio"),
            ("SUPABASE_URL", "https://demo.supabase.co"),
            ("CURRENCY_SYMBOL", "$"),
            ("MAX_CONNECTIONS", "2"),
        ]))
        .unwrap();
        assert_eq!(config.supabase_url.as_deref(), Some("https://demo.supabase.co"));
        assert_eq!(config.currency_symbol, "$");
        assert_eq!(config.max_connections, 2);
    }

    #[test]
    fn database_url_is_required() {
        assert!(Config::from_vars(vars(&[("STUDIO_NAME", "x")])).is_err());
    }
}
