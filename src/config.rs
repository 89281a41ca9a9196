use serde::Deserialize;
use std::path::PathBuf;

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
pub const DEFAULT_SMTP_PORT: u16 = 587;
pub const DEFAULT_LEADS_EMAIL_TO: &str = "contact@besolarsolutions.com";
pub const DEFAULT_LEADS_EXCEL_PATH: &str = "data/leads.xlsx";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are Be Solar Assistant. Friendly, expert. \
Identify intent, ask for city, residential/commercial, monthly bill or kW, then request \
contact info. Keep answers concise.";

/// Process-wide settings, read once at startup and handed to every component.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Completion API key. `None` when unset or blank.
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_base_url: String,
    pub smtp_host: String,
    pub smtp_port: u16,
    /// SMTP login. Also the `From` address when it is one and `smtp_from` is unset.
    pub smtp_username: String,
    pub smtp_password: String,
    /// Explicit `From` address for relays whose login is not a mailbox (e.g. `apikey`).
    pub smtp_from: Option<String>,
    /// Recipient of new-lead notifications.
    pub leads_email_to: String,
    pub leads_excel_path: PathBuf,
    pub system_prompt: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// `from_env` delegates here; tests pass a map-backed closure instead of mutating the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let config = Self {
            openai_api_key: lookup("OPENAI_API_KEY").filter(|key| !key.trim().is_empty()),
            openai_model: var_or("OPENAI_MODEL", DEFAULT_OPENAI_MODEL),
            openai_base_url: var_or("OPENAI_BASE_URL", DEFAULT_OPENAI_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            smtp_host: var_or("EMAIL_SMTP_HOST", DEFAULT_SMTP_HOST),
            smtp_port: lookup("EMAIL_SMTP_PORT")
                .map(|port| {
                    port.trim().parse::<u16>().map_err(|_| {
                        anyhow::anyhow!("EMAIL_SMTP_PORT must be a valid number between 1-65535")
                    })
                })
                .transpose()?
                .unwrap_or(DEFAULT_SMTP_PORT),
            smtp_username: var_or("EMAIL_USERNAME", ""),
            smtp_password: var_or("EMAIL_PASSWORD", ""),
            smtp_from: lookup("EMAIL_FROM").filter(|from| !from.trim().is_empty()),
            leads_email_to: var_or("LEADS_EMAIL_TO", DEFAULT_LEADS_EMAIL_TO),
            leads_excel_path: PathBuf::from(var_or("LEADS_EXCEL_PATH", DEFAULT_LEADS_EXCEL_PATH)),
            system_prompt: var_or("SYSTEM_PROMPT", DEFAULT_SYSTEM_PROMPT),
            port: lookup("PORT")
                .map(|port| {
                    port.trim()
                        .parse::<u16>()
                        .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))
                })
                .transpose()?
                .unwrap_or(DEFAULT_PORT),
        };

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!("OpenAI model: {}", config.openai_model);
        if config.openai_api_key.is_none() {
            tracing::warn!("OPENAI_API_KEY not set; /chat will answer 500");
        }
        tracing::debug!("SMTP relay: {}:{}", config.smtp_host, config.smtp_port);
        tracing::debug!("Leads spreadsheet: {}", config.leads_excel_path.display());
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }

    /// True when both SMTP username and password are present.
    pub fn email_configured(&self) -> bool {
        !self.smtp_username.is_empty() && !self.smtp_password.is_empty()
    }
}
