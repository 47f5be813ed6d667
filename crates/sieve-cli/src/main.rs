//! Sieve CLI - batched, LLM-assisted data cleaning.

mod cli;
mod commands;
mod config;
mod logging;
mod server;

use clap::Parser;
use cli::{Cli, Commands};
use config::FileConfig;

fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.log_json);

    let result = FileConfig::load(cli.config.as_deref()).and_then(|config| match cli.command {
        Commands::Clean {
            file,
            pipeline,
            output,
        } => commands::clean::run_file(file, pipeline, output, &config, cli.verbose),

        Commands::Query {
            db,
            sql,
            pipeline,
            output,
        } => commands::clean::run_query(db, sql, pipeline, output, &config, cli.verbose),

        Commands::Fetch {
            url,
            params,
            pipeline,
            output,
        } => commands::clean::run_fetch(url, params, pipeline, output, &config, cli.verbose),

        Commands::Serve {
            port,
            host,
            pipeline,
        } => commands::serve::run(host, port, pipeline, &config),
    });

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
