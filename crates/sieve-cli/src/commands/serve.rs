//! Serve command - run the HTTP cleaning service.

use colored::Colorize;

use crate::cli::PipelineArgs;
use crate::config::FileConfig;
use crate::server::{run_server, AppState};

pub fn run(
    host: Option<String>,
    port: Option<u16>,
    pipeline: PipelineArgs,
    config: &FileConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let settings = config.resolve(&pipeline);
    let generator = settings.build_generator()?;

    eprintln!(
        "{} with {} ({}), batch size {}",
        "Starting sieve service".cyan().bold(),
        generator.name(),
        generator.config().model,
        settings.pipeline.batch_size
    );
    eprintln!("Press Ctrl+C to stop");

    let state = AppState::new(generator, settings.pipeline);
    let host = config.host(host);
    let port = config.port(port);

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run_server(state, &host, port))
}
