use anyhow::{anyhow, Context, Result};
use std::env;
use std::time::Duration;
use url::Url;

use crate::payments::options::TpayOptions;
use crate::payments::providers::tpay::DEFAULT_TIMEOUT_SECS;

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub tpay: TpayOptions,
    pub tpay_timeout: Duration,
    pub workflow: WorkflowConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
}

#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    /// Host endpoint that receives normalized webhook results; logged only
    /// when unset, which `validate` allows in development only
    pub url: Option<String>,
    pub timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let server = ServerConfig {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "9000".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
        };

        let tpay = TpayOptions::from_env().context("Invalid Tpay provider options")?;

        let tpay_timeout = Duration::from_secs(
            env::var("TPAY_TIMEOUT_SECS")
                .unwrap_or_else(|_| DEFAULT_TIMEOUT_SECS.to_string())
                .parse()
                .context("TPAY_TIMEOUT_SECS must be a valid number")?,
        );

        let workflow = WorkflowConfig {
            url: env::var("HOST_WORKFLOW_URL")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            timeout: Duration::from_secs(
                env::var("HOST_WORKFLOW_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()
                    .context("HOST_WORKFLOW_TIMEOUT_SECS must be a valid number")?,
            ),
        };

        let config = Config {
            server,
            tpay,
            tpay_timeout,
            workflow,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        // Validate port range
        if self.server.port < 1024 {
            return Err(anyhow!(
                "Port must be at least 1024, got {}",
                self.server.port
            ));
        }

        // Validate environment
        let valid_environments = ["development", "staging", "production"];
        if !valid_environments.contains(&self.server.environment.as_str()) {
            return Err(anyhow!(
                "Environment must be one of: {:?}, got {}",
                valid_environments,
                self.server.environment
            ));
        }

        // Production must talk to the live Tpay API
        if self.server.environment == "production" && self.tpay.sandbox {
            return Err(anyhow!("TPAY_SANDBOX must be false in production"));
        }

        // Validate gateway timeout
        if self.tpay_timeout.is_zero() {
            return Err(anyhow!("TPAY_TIMEOUT_SECS must be greater than 0"));
        }

        // Logging-only workflow is allowed in development only
        match &self.workflow.url {
            Some(url) => {
                Url::parse(url).context("HOST_WORKFLOW_URL must be a valid URL")?;
            }
            None if self.server.environment != "development" => {
                return Err(anyhow!(
                    "HOST_WORKFLOW_URL is required in {}",
                    self.server.environment
                ));
            }
            None => {}
        }

        Ok(())
    }
}
