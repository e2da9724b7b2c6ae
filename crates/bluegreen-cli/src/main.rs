//! bluegreen — CI step that reads, sets, or flips a deployment's
//! blue/green color.
//!
//! Reads orchestrator inputs, runs exactly one action against the state
//! table, writes the named outputs back, and exits. Any failure is
//! reported through the orchestrator's failure channel with a non-zero
//! exit status.

use clap::Parser;

use bluegreen_core::{Action, DynamoStore, StateRepository, dispatch};

mod inputs;
mod outputs;

use inputs::Inputs;
use outputs::OutputSink;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("bluegreen_core=info".parse()?)
                .add_directive("bluegreen_cli=info".parse()?),
        )
        .init();

    let inputs = Inputs::parse();
    if let Err(err) = run(&inputs).await {
        outputs::report_failure(&format!("{err:#}"));
        std::process::exit(1);
    }
    Ok(())
}

async fn run(inputs: &Inputs) -> anyhow::Result<()> {
    let action = Action::parse(inputs.action()?)?;
    let request = inputs.request()?;

    let sdk_config = inputs.sdk_config().await?;
    let store = DynamoStore::new(&sdk_config, inputs.store_config());
    let repo = StateRepository::new(store, inputs.provenance());

    let outcome = dispatch(&repo, action, &request).await?;
    OutputSink::from_env().emit(action, &outcome)?;
    Ok(())
}
