//! Minimal demo CLI: wires the rig-core provider and the example file
//! tools into a `ReactEngine` and runs one `call()`.

use clap::Parser;
use react_agent::config::load_config;
use react_agent::engine::EngineConfig;
use react_agent::providers::RigOpenRouterModel;
use react_agent::tools::{ReadFileTool, WriteFileTool};
use react_agent::{Msg, ReactEngine, ToolRegistry};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "react-agent", about = "Ask the agent a question")]
struct Cli {
    /// The question or instruction for the agent
    prompt: String,

    /// Directory the file tools are allowed to read/write in
    #[arg(long, default_value = ".")]
    workspace: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = load_config(None)?;

    let model = RigOpenRouterModel::new(&config.provider)?;

    let toolkit = ToolRegistry::new();
    toolkit.register(Arc::new(ReadFileTool::new(cli.workspace.clone())));
    toolkit.register(Arc::new(WriteFileTool::new(cli.workspace)));

    let mut engine = ReactEngine::new(
        "assistant",
        Some("You are a helpful assistant with access to file tools.".to_string()),
        Arc::new(model),
        Arc::new(toolkit),
        EngineConfig {
            max_iters: config.agent.max_iters,
        },
    );

    let cancel = CancellationToken::new();
    let reply = engine
        .call(vec![Msg::user("user", cli.prompt)], &cancel)
        .await
        .map_err(|e| anyhow::anyhow!("agent call failed: {e}"))?;

    println!("{}", reply.text());
    Ok(())
}
