mod cli;

use clap::Parser;
use cli::{Cli, Commands};
use deckhand::build::DockerCli;
use deckhand::config::Settings;
use deckhand::deploy::TokioClock;
use deckhand::error::Result;
use deckhand::observability;
use deckhand::pipeline::{self, Pipeline};
use deckhand::platform::HttpPlatform;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    observability::init_tracing(cli.log_level.as_deref());

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let overrides = cli.overrides();
    let settings = Settings::load(cli.config, &overrides)?;

    match cli.command {
        Commands::Plan(_) => {
            let descriptor = pipeline::plan(&settings)?;
            println!("{}", serde_json::to_string_pretty(&descriptor)?);
        }
        Commands::Deploy(_) => {
            let api = HttpPlatform::new(settings.http_config()?)?;
            let builder = DockerCli::new(&settings.build.tool, &settings.build.platform);
            let ctx = Pipeline::new(&settings, &api, &builder, &TokioClock)
                .run()
                .await?;
            ctx.outputs.publish()?;
        }
    }

    Ok(())
}
