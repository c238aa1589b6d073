//! Configuration for the GoalForge gateway
//!
//! CLI arguments with environment fallbacks. Library crates receive plain
//! config structs built from these arguments.

use clap::Parser;
use goalforge_ledger::{AccountId, LedgerConfig};
use goalforge_verify::{FitnessConfig, GitHubConfig, JudgeConfig, OAuthConfig};
use std::net::SocketAddr;
use std::time::Duration;

/// GoalForge - stake tokens on daily habits and prove them
#[derive(Parser, Debug, Clone)]
#[command(name = "goalforge")]
#[command(about = "Verification and ledger gateway for GoalForge habit goals")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, env = "LOG_JSON", default_value = "false")]
    pub log_json: bool,

    /// Development mode (non-secure cookies, relaxed validation)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// Frontend base URL used for OAuth redirects
    #[arg(long, env = "APP_URL", default_value = "http://localhost:3000")]
    pub app_url: String,

    /// Upstream request timeout in milliseconds
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value = "30000")]
    pub request_timeout_ms: u64,

    /// Finished ledger submissions kept for polling
    #[arg(long, env = "SUBMISSION_CAPACITY", default_value = "10000")]
    pub submission_capacity: usize,

    // ------------------------------------------------------------------
    // GitHub
    // ------------------------------------------------------------------
    #[arg(long, env = "GITHUB_API_URL", default_value = "https://api.github.com")]
    pub github_api_url: String,

    /// Contribution graph service
    #[arg(
        long,
        env = "GITHUB_CONTRIBUTIONS_URL",
        default_value = "https://github-contributions-api.jogruber.de"
    )]
    pub github_contributions_url: String,

    /// Optional token for higher GitHub rate limits
    #[arg(long, env = "GITHUB_TOKEN")]
    pub github_token: Option<String>,

    // ------------------------------------------------------------------
    // Google Fit
    // ------------------------------------------------------------------
    #[arg(long, env = "GOOGLE_FIT_CLIENT_ID")]
    pub google_fit_client_id: Option<String>,

    #[arg(long, env = "GOOGLE_FIT_CLIENT_SECRET")]
    pub google_fit_client_secret: Option<String>,

    /// OAuth callback registered with Google
    #[arg(
        long,
        env = "GOOGLE_FIT_REDIRECT_URI",
        default_value = "http://localhost:8080/verify/fitness/callback"
    )]
    pub google_fit_redirect_uri: String,

    #[arg(
        long,
        env = "GOOGLE_FIT_API_URL",
        default_value = "https://www.googleapis.com/fitness/v1"
    )]
    pub google_fit_api_url: String,

    #[arg(
        long,
        env = "GOOGLE_OAUTH_AUTH_URL",
        default_value = "https://accounts.google.com/o/oauth2/v2/auth"
    )]
    pub google_oauth_auth_url: String,

    #[arg(
        long,
        env = "GOOGLE_OAUTH_TOKEN_URL",
        default_value = "https://oauth2.googleapis.com/token"
    )]
    pub google_oauth_token_url: String,

    // ------------------------------------------------------------------
    // LLM judge
    // ------------------------------------------------------------------
    /// Without a key the judge reports itself unconfigured
    #[arg(long, env = "OPENROUTER_API_KEY")]
    pub openrouter_api_key: Option<String>,

    #[arg(long, env = "LLM_BASE_URL", default_value = "https://openrouter.ai/api/v1")]
    pub llm_base_url: String,

    #[arg(long, env = "LLM_MODEL", default_value = "openai/gpt-4o-mini")]
    pub llm_model: String,

    // ------------------------------------------------------------------
    // Ledger
    // ------------------------------------------------------------------
    /// Account credited with the initial supply
    #[arg(long, env = "TREASURY_ACCOUNT", default_value = "treasury")]
    pub treasury_account: String,

    /// Escrow account, also the achievement minter authority
    #[arg(long, env = "ESCROW_ACCOUNT", default_value = "goalforge-escrow")]
    pub escrow_account: String,

    /// Allow achievement tokens to change hands
    #[arg(long, env = "TRANSFERABLE_ACHIEVEMENTS", default_value = "false")]
    pub transferable_achievements: bool,
}

impl Args {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn github_config(&self) -> GitHubConfig {
        GitHubConfig {
            api_url: self.github_api_url.clone(),
            contributions_url: self.github_contributions_url.clone(),
            token: self.github_token.clone(),
            request_timeout: self.request_timeout(),
            ..Default::default()
        }
    }

    pub fn fitness_config(&self) -> FitnessConfig {
        FitnessConfig {
            api_url: self.google_fit_api_url.clone(),
            request_timeout: self.request_timeout(),
        }
    }

    pub fn oauth_config(&self) -> OAuthConfig {
        OAuthConfig {
            client_id: self.google_fit_client_id.clone(),
            client_secret: self.google_fit_client_secret.clone(),
            auth_url: self.google_oauth_auth_url.clone(),
            token_url: self.google_oauth_token_url.clone(),
            redirect_uri: self.google_fit_redirect_uri.clone(),
            request_timeout: self.request_timeout(),
        }
    }

    pub fn judge_config(&self) -> JudgeConfig {
        JudgeConfig {
            api_key: self.openrouter_api_key.clone(),
            base_url: self.llm_base_url.clone(),
            model: self.llm_model.clone(),
            app_url: self.app_url.clone(),
            request_timeout: self.request_timeout(),
            ..Default::default()
        }
    }

    pub fn ledger_config(&self) -> LedgerConfig {
        LedgerConfig {
            treasury: AccountId::new(self.treasury_account.trim()),
            escrow: AccountId::new(self.escrow_account.trim()),
            transferable_achievements: self.transferable_achievements,
            ..Default::default()
        }
    }

    /// Whether both Google Fit OAuth credentials are present.
    pub fn fitness_oauth_configured(&self) -> bool {
        self.google_fit_client_id.is_some() && self.google_fit_client_secret.is_some()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.request_timeout_ms == 0 {
            return Err("REQUEST_TIMEOUT_MS must be greater than zero".to_string());
        }

        if self.submission_capacity == 0 {
            return Err("SUBMISSION_CAPACITY must be greater than zero".to_string());
        }

        if self.treasury_account.trim().is_empty() || self.escrow_account.trim().is_empty() {
            return Err("TREASURY_ACCOUNT and ESCROW_ACCOUNT must not be empty".to_string());
        }

        if self.treasury_account.trim() == self.escrow_account.trim() {
            return Err("TREASURY_ACCOUNT and ESCROW_ACCOUNT must differ".to_string());
        }

        if self.google_fit_client_id.is_some() != self.google_fit_client_secret.is_some() {
            return Err(
                "GOOGLE_FIT_CLIENT_ID and GOOGLE_FIT_CLIENT_SECRET must be set together".to_string(),
            );
        }

        if !self.app_url.starts_with("http://") && !self.app_url.starts_with("https://") {
            return Err("APP_URL must be an http(s) URL".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["goalforge"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn test_defaults_validate() {
        let args = args(&[]);
        assert!(args.validate().is_ok());
        assert_eq!(args.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_half_configured_oauth_is_rejected() {
        let args = args(&["--google-fit-client-id", "abc"]);
        if std::env::var("GOOGLE_FIT_CLIENT_SECRET").is_err() {
            assert!(args.validate().is_err());
        }
    }

    #[test]
    fn test_treasury_must_differ_from_escrow() {
        let args = args(&["--treasury-account", "vault", "--escrow-account", "vault"]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_zero_submission_capacity_is_rejected() {
        let args = args(&["--submission-capacity", "0"]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_derived_configs() {
        let args = args(&["--llm-model", "test/model", "--request-timeout-ms", "1500"]);
        let judge = args.judge_config();
        assert_eq!(judge.model, "test/model");
        assert_eq!(judge.request_timeout, Duration::from_millis(1500));
        assert_eq!(args.ledger_config().escrow, AccountId::new("goalforge-escrow"));
    }
}
