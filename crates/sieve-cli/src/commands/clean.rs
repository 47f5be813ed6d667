//! Clean commands - load a table, run the pipeline, write the result.

use std::io::Write;
use std::path::{Path, PathBuf};

use colored::Colorize;
use sieve::{
    fetch_table, CleaningResult, DatabaseConnection, Pipeline, PipelineError, RuleReport,
    Source, SourceMetadata, Table,
};

use crate::cli::{OutputArgs, OutputFormat, PipelineArgs};
use crate::config::{FileConfig, Settings};

/// Clean a CSV, TSV or JSON file.
pub fn run_file(
    file: PathBuf,
    pipeline: PipelineArgs,
    output: OutputArgs,
    config: &FileConfig,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if !file.exists() {
        return Err(format!("File not found: {}", file.display()).into());
    }

    let mut settings = config.resolve(&pipeline);
    if settings.pipeline.context.dataset_name.is_none() {
        if let Some(stem) = file.file_stem() {
            settings.pipeline.context.dataset_name = Some(stem.to_string_lossy().into_owned());
        }
    }

    let (table, metadata) = fetch_table(Source::file(&file))?;
    clean_and_write(table, metadata, settings, output, config, verbose)
}

/// Clean the rows returned by a SQL query.
pub fn run_query(
    db: String,
    sql: String,
    pipeline: PipelineArgs,
    output: OutputArgs,
    config: &FileConfig,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let settings = config.resolve(&pipeline);
    let connection = DatabaseConnection::open(&db)?;
    let (table, metadata) = fetch_table(Source::query(&connection, sql))?;
    clean_and_write(table, metadata, settings, output, config, verbose)
}

/// Clean the JSON records returned by an HTTP API.
pub fn run_fetch(
    url: String,
    params: Vec<(String, String)>,
    pipeline: PipelineArgs,
    output: OutputArgs,
    config: &FileConfig,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let settings = config.resolve(&pipeline);
    let source = params
        .into_iter()
        .fold(Source::api(url), |source, (key, value)| source.with_param(key, value));
    let (table, metadata) = fetch_table(source)?;
    clean_and_write(table, metadata, settings, output, config, verbose)
}

fn clean_and_write(
    table: Table,
    metadata: SourceMetadata,
    settings: Settings,
    output: OutputArgs,
    config: &FileConfig,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!(
        "{} {} ({} rows, {} columns)",
        "Cleaning".cyan().bold(),
        metadata.origin.white(),
        metadata.row_count,
        metadata.column_count
    );

    let generator = settings.build_generator()?;
    let pipeline = Pipeline::from_shared(generator).with_config(settings.pipeline);

    let result = match clean(&pipeline, table, verbose) {
        Ok(result) => result,
        Err(e) => {
            if let Some(raw) = e.raw_output() {
                eprintln!();
                eprintln!("{}", "Model output:".yellow().bold());
                eprintln!("{}", raw);
                eprintln!();
            }
            return Err(e.into());
        }
    };

    print_summary(&result);

    let format = output
        .format
        .or_else(|| output.output.as_deref().and_then(OutputFormat::from_path))
        .or(config.output.format)
        .unwrap_or_default();

    match &output.output {
        Some(path) => {
            write_table_to(path, &result.table, format)?;
            eprintln!(
                "{} {}",
                "Saved to".green().bold(),
                path.display().to_string().white()
            );
        }
        None => {
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            handle.write_all(render(&result.table, format)?.as_bytes())?;
            handle.flush()?;
        }
    }

    Ok(())
}

/// Run batch by batch so progress can be shown between calls.
fn clean(pipeline: &Pipeline, table: Table, verbose: bool) -> Result<CleaningResult, PipelineError> {
    let mut run = pipeline.start(table)?;
    let total = run.remaining();

    if verbose {
        for line in rule_lines(&run.report().rules) {
            eprintln!("  {}", line);
        }
    }

    while let Some(number) = run.process_next()? {
        eprintln!("  {} batch {}/{}", "✓".green(), number, total);
    }

    run.finish()
}

/// Describe the rule-based pass, one line per change.
fn rule_lines(rules: &RuleReport) -> Vec<String> {
    let mut lines = vec![format!(
        "rules: {} duplicates removed, {} cells imputed, {} cells normalized",
        rules.duplicates_removed,
        rules.cells_imputed(),
        rules.cells_normalized
    )];
    lines.extend(rules.imputations.iter().map(|i| i.description()));
    lines
}

fn print_summary(result: &CleaningResult) {
    let report = &result.report;
    eprintln!(
        "{} {} rows in {} batch(es) with {} ({})",
        "Cleaned".green().bold(),
        report.output_rows.to_string().white().bold(),
        report.batches,
        report.provider,
        report.model
    );
    eprintln!(
        "  {} duplicates removed, {} cells imputed, {} LLM call(s)",
        report.duplicates_removed().to_string().yellow(),
        report.cells_imputed().to_string().yellow(),
        report.generator_calls
    );
    if report.cells_truncated > 0 {
        eprintln!(
            "  {} text values clipped",
            report.cells_truncated.to_string().yellow()
        );
    }
}

/// Render a table in the requested format.
pub fn render(table: &Table, format: OutputFormat) -> Result<String, Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Csv => Ok(table.to_delimited(b',')?),
        OutputFormat::Tsv => Ok(table.to_delimited(b'\t')?),
        OutputFormat::Json => {
            let mut json = serde_json::to_string_pretty(&table.to_records())?;
            json.push('\n');
            Ok(json)
        }
    }
}

fn write_table_to(
    path: &Path,
    table: &Table,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::write(path, render(table, format)?)
        .map_err(|e| format!("Failed to write '{}': {}", path.display(), e))?;
    Ok(())
}
