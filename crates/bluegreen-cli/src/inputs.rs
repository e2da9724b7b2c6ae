//! Orchestrator input parsing.
//!
//! Every input maps to a CLI flag with an `INPUT_*` environment fallback,
//! the convention CI orchestrators use to pass step inputs. Orchestrators
//! hand unset inputs through as empty strings, so empty and absent are
//! treated the same everywhere here.

use aws_sdk_dynamodb::config::Credentials;
use clap::Parser;

use bluegreen_core::{Error, Provenance, Request, StoreConfig};

#[derive(Debug, Parser)]
#[command(
    name = "bluegreen",
    about = "Blue/green deployment color state — one action per invocation",
    version
)]
pub struct Inputs {
    /// AWS access key id for the store calls.
    #[arg(long, env = "INPUT_AWS_ACCESS_KEY_ID", hide_env_values = true)]
    pub aws_access_key_id: Option<String>,

    /// AWS secret access key for the store calls.
    #[arg(long, env = "INPUT_AWS_SECRET_ACCESS_KEY", hide_env_values = true)]
    pub aws_secret_access_key: Option<String>,

    /// AWS region hosting the state table.
    #[arg(long, env = "INPUT_AWS_REGION", default_value = "us-east-1")]
    pub aws_region: String,

    /// Name of the backing table.
    #[arg(long, env = "INPUT_TABLE_NAME", default_value = "blue-green-deployments")]
    pub table_name: String,

    /// Identifier scoping one independent color state.
    #[arg(long, env = "INPUT_DEPLOYMENT_KEY")]
    pub deployment_key: Option<String>,

    /// One of: init, get-active, set-active, get-inactive, toggle.
    #[arg(long, env = "INPUT_ACTION")]
    pub action: Option<String>,

    /// Target color for set-active.
    #[arg(long, env = "INPUT_COLOR")]
    pub color: Option<String>,

    /// Color written by init when no state exists yet.
    #[arg(long, env = "INPUT_INITIAL_COLOR", default_value = "blue")]
    pub initial_color: String,

    /// Endpoint override for local testing (e.g. LocalStack).
    #[arg(long, env = "INPUT_ENDPOINT_URL")]
    pub endpoint_url: Option<String>,
}

fn required<'a>(value: &'a Option<String>, name: &'static str) -> Result<&'a str, Error> {
    match value.as_deref() {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(Error::MissingInput(name)),
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.clone().filter(|v| !v.is_empty())
}

impl Inputs {
    pub fn action(&self) -> Result<&str, Error> {
        required(&self.action, "action")
    }

    pub fn request(&self) -> Result<Request, Error> {
        Ok(Request {
            deployment_key: required(&self.deployment_key, "deployment-key")?.to_string(),
            color: non_empty(&self.color),
            initial_color: self.initial_color.clone(),
        })
    }

    pub fn store_config(&self) -> StoreConfig {
        let mut config = StoreConfig::new(&self.table_name);
        config.endpoint = non_empty(&self.endpoint_url);
        config
    }

    /// Resolve the SDK config from the supplied credentials and region.
    pub async fn sdk_config(&self) -> Result<aws_config::SdkConfig, Error> {
        let access_key = required(&self.aws_access_key_id, "aws-access-key-id")?;
        let secret_key = required(&self.aws_secret_access_key, "aws-secret-access-key")?;
        let credentials =
            Credentials::new(access_key, secret_key, None, None, "orchestrator-inputs");
        Ok(aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(self.aws_region.clone()))
            .credentials_provider(credentials)
            .load()
            .await)
    }

    /// Provenance for write metadata, read from the orchestrator's
    /// run-context environment.
    pub fn provenance(&self) -> Provenance {
        Provenance {
            actor: env_non_empty("GITHUB_ACTOR"),
            run_id: env_non_empty("GITHUB_RUN_ID"),
            workflow: env_non_empty("GITHUB_WORKFLOW"),
        }
    }
}

fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}
