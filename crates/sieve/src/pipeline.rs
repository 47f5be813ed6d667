//! End-to-end cleaning: rules once, then the agent batch by batch.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::agent::CleaningAgent;
use crate::assemble::ResultAssembler;
use crate::batch::{BatchPlanner, DEFAULT_BATCH_SIZE};
use crate::error::{PipelineError, Result};
use crate::input::ContextHints;
use crate::llm::TextGenerator;
use crate::table::{Schema, Table};
use crate::transform::{RuleBasedCleaner, RuleReport};

/// Configuration for a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Rows sent to the agent per call.
    pub batch_size: usize,
    /// Extra generator calls allowed per batch after a failure.
    pub max_retries: u32,
    /// Keep only the first N rows (None = all).
    pub max_rows: Option<usize>,
    /// Clip text cells to this many characters before cleaning (None = no limit).
    pub max_text_len: Option<usize>,
    /// Context hints added to every prompt.
    pub context: ContextHints,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            max_retries: 0,
            max_rows: None,
            max_text_len: None,
            context: ContextHints::default(),
        }
    }
}

/// What a run did, stage by stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// Rows in the table handed to the pipeline.
    pub input_rows: usize,
    /// Rows left after the row limit.
    pub prepared_rows: usize,
    /// Text cells clipped by the length limit.
    pub cells_truncated: usize,
    /// Changes made by the rule-based pass.
    pub rules: RuleReport,
    pub batch_size: usize,
    /// Batches planned for the agent.
    pub batches: usize,
    /// Generator calls made, retries included.
    pub generator_calls: u32,
    /// Rows in the cleaned table.
    pub output_rows: usize,
    /// Provider that produced the responses.
    pub provider: String,
    pub model: String,
}

impl RunReport {
    pub fn duplicates_removed(&self) -> usize {
        self.rules.duplicates_removed
    }

    pub fn cells_imputed(&self) -> usize {
        self.rules.cells_imputed()
    }

    pub fn cells_normalized(&self) -> usize {
        self.rules.cells_normalized
    }
}

/// Output of a successful run.
#[derive(Debug, Clone)]
pub struct CleaningResult {
    pub table: Table,
    pub report: RunReport,
}

/// The cleaning pipeline.
///
/// ```no_run
/// use sieve::{MockProvider, Pipeline, PipelineConfig, Table};
///
/// let pipeline = Pipeline::new(MockProvider::new()).with_config(PipelineConfig {
///     batch_size: 10,
///     ..PipelineConfig::default()
/// });
/// let result = pipeline.run(Table::empty(vec!["id".into()])).unwrap();
/// assert_eq!(result.report.batches, 0);
/// ```
pub struct Pipeline {
    config: PipelineConfig,
    cleaner: RuleBasedCleaner,
    generator: Arc<dyn TextGenerator>,
}

impl Pipeline {
    /// Create a pipeline around a text generator.
    pub fn new(generator: impl TextGenerator + 'static) -> Self {
        Self::from_shared(Arc::new(generator))
    }

    /// Create a pipeline around a generator that is shared elsewhere.
    pub fn from_shared(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            config: PipelineConfig::default(),
            cleaner: RuleBasedCleaner::new(),
            generator,
        }
    }

    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn generator(&self) -> &dyn TextGenerator {
        self.generator.as_ref()
    }

    /// Clean a table end to end.
    ///
    /// All-or-nothing: any failure returns an error and no partial table.
    pub fn run(&self, table: Table) -> Result<CleaningResult> {
        self.start(table)?.finish()
    }

    /// Prepare a run without calling the generator yet.
    ///
    /// Applies the row and text limits, runs the rule-based pass and plans
    /// the batches. Drive the returned run with [`PipelineRun::process_next`]
    /// to stop between batches.
    pub fn start(&self, table: Table) -> Result<PipelineRun<'_>> {
        let planner = BatchPlanner::new(self.config.batch_size)?;

        let mut report = RunReport {
            input_rows: table.row_count(),
            batch_size: planner.batch_size(),
            provider: self.generator.name().to_string(),
            model: self.generator.config().model.clone(),
            ..RunReport::default()
        };

        let mut table = match self.config.max_rows {
            Some(n) => table.head(n),
            None => table,
        };
        report.prepared_rows = table.row_count();
        if let Some(max) = self.config.max_text_len {
            report.cells_truncated = table.truncate_text(max);
        }

        let (table, rules) = self.cleaner.clean_with_report(table)?;
        report.rules = rules;

        // Nothing for the agent to do without columns.
        let passthrough = table.column_count() == 0;
        report.batches = if passthrough {
            0
        } else {
            planner.batch_count(table.row_count())
        };

        tracing::info!(
            rows = table.row_count(),
            columns = table.column_count(),
            batches = report.batches,
            batch_size = report.batch_size,
            provider = %report.provider,
            "starting cleaning run"
        );

        let agent = CleaningAgent::new(self.generator.as_ref())
            .with_context(self.config.context.clone())
            .with_max_retries(self.config.max_retries);

        Ok(PipelineRun {
            schema: table.schema(),
            table,
            planner,
            agent,
            responses: Vec::with_capacity(report.batches),
            passthrough,
            report,
        })
    }
}

/// A run in progress.
///
/// Batches are processed strictly in order, one generator call at a time.
pub struct PipelineRun<'p> {
    table: Table,
    schema: Schema,
    planner: BatchPlanner,
    agent: CleaningAgent<'p>,
    responses: Vec<String>,
    passthrough: bool,
    report: RunReport,
}

impl PipelineRun<'_> {
    /// The rule-cleaned table being sent to the agent.
    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Column contract the agent output is checked against.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn report(&self) -> &RunReport {
        &self.report
    }

    /// Number of batches already cleaned.
    pub fn completed(&self) -> usize {
        self.responses.len()
    }

    /// Number of batches left.
    pub fn remaining(&self) -> usize {
        self.report.batches - self.completed()
    }

    /// Clean the next batch.
    ///
    /// Returns the 1-based number of the batch processed, or `None` when
    /// every batch is done. A failed batch leaves the run where it was.
    pub fn process_next(&mut self) -> Result<Option<usize>> {
        if self.remaining() == 0 {
            return Ok(None);
        }
        let Some(batch) = self.planner.plan(&self.table).nth(self.completed()) else {
            return Ok(None);
        };

        tracing::info!(batch = batch.number(), total = batch.total(), rows = batch.len(), "cleaning batch");

        match self.agent.run_counted(&batch) {
            Ok((state, attempts)) => {
                self.report.generator_calls += attempts;
                self.responses.push(state.into_response());
                Ok(Some(batch.number()))
            }
            Err(failure) => {
                self.report.generator_calls += failure.attempts;
                tracing::error!(
                    batch = batch.number(),
                    total = batch.total(),
                    attempts = failure.attempts,
                    error = %failure.error,
                    "batch failed, aborting run"
                );
                Err(PipelineError::Generation {
                    batch: batch.number(),
                    total: batch.total(),
                    attempts: failure.attempts,
                    source: failure.error,
                })
            }
        }
    }

    /// Clean any remaining batches and assemble the result.
    pub fn finish(mut self) -> Result<CleaningResult> {
        if self.passthrough {
            self.report.output_rows = self.table.row_count();
            return Ok(CleaningResult {
                table: self.table,
                report: self.report,
            });
        }

        while self.process_next()?.is_some() {}

        let table = ResultAssembler::new(self.schema).assemble(&self.responses)?;
        self.report.output_rows = table.row_count();

        tracing::info!(
            rows = self.report.output_rows,
            batches = self.report.batches,
            calls = self.report.generator_calls,
            "cleaning run finished"
        );
        Ok(CleaningResult {
            table,
            report: self.report,
        })
    }
}

/// Clean `table` with `generator` in batches of `batch_size` rows.
pub fn run_pipeline(
    table: Table,
    generator: impl TextGenerator + 'static,
    batch_size: usize,
) -> Result<CleaningResult> {
    Pipeline::new(generator)
        .with_config(PipelineConfig {
            batch_size,
            ..PipelineConfig::default()
        })
        .run(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenerationError;
    use crate::llm::MockProvider;
    use crate::table::Cell;

    fn people() -> Table {
        Table::new(
            vec!["name".into(), "age".into()],
            vec![
                vec![Cell::text(" Ann "), Cell::Number(30.0)],
                vec![Cell::text("Bo"), Cell::Null],
                vec![Cell::text("Bo"), Cell::Null],
                vec![Cell::text("Cy"), Cell::Number(50.0)],
            ],
        )
    }

    #[test]
    fn test_mock_run_returns_rule_cleaned_table() {
        let result = run_pipeline(people(), MockProvider::new(), 2).unwrap();

        assert_eq!(result.table.row_count(), 3);
        assert_eq!(result.table.rows[0][0], Cell::text("Ann"));
        assert_eq!(result.table.rows[1][1], Cell::Number(40.0));
        assert_eq!(result.report.batches, 2);
        assert_eq!(result.report.duplicates_removed(), 1);
        assert_eq!(result.report.generator_calls, 2);
        assert_eq!(result.report.output_rows, 3);
        assert_eq!(result.report.provider, "Mock");
    }

    #[test]
    fn test_zero_batch_size_is_config_error() {
        let err = run_pipeline(people(), MockProvider::new(), 0).unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }

    #[test]
    fn test_ragged_input_is_rule_error() {
        let table = Table::new(vec!["a".into()], vec![vec![]]);
        let err = run_pipeline(table, MockProvider::new(), 5).unwrap_err();
        assert!(matches!(err, PipelineError::Rule(_)));
    }

    #[test]
    fn test_step_by_step_run() {
        let mock = Arc::new(MockProvider::new());
        let pipeline = Pipeline::new(Arc::clone(&mock)).with_config(PipelineConfig {
            batch_size: 1,
            ..PipelineConfig::default()
        });

        let mut run = pipeline.start(people()).unwrap();
        assert_eq!(run.remaining(), 3);
        assert_eq!(run.process_next().unwrap(), Some(1));
        assert_eq!(mock.calls(), 1);
        assert_eq!(run.process_next().unwrap(), Some(2));

        let result = run.finish().unwrap();
        assert_eq!(result.table.row_count(), 3);
        assert_eq!(mock.calls(), 3);
    }

    #[test]
    fn test_failed_batch_can_be_retried_by_caller() {
        let mock = Arc::new(MockProvider::scripted(vec![Err(GenerationError::EmptyResponse)]));
        let pipeline = Pipeline::new(Arc::clone(&mock));

        let mut run = pipeline.start(people()).unwrap();
        assert!(run.process_next().is_err());
        assert_eq!(run.completed(), 0);
        assert_eq!(run.process_next().unwrap(), Some(1));
    }

    #[test]
    fn test_limits_applied_before_rules() {
        let pipeline = Pipeline::new(MockProvider::new()).with_config(PipelineConfig {
            max_rows: Some(2),
            max_text_len: Some(2),
            ..PipelineConfig::default()
        });

        let result = pipeline.run(people()).unwrap();
        assert_eq!(result.report.input_rows, 4);
        assert_eq!(result.report.prepared_rows, 2);
        assert_eq!(result.report.cells_truncated, 1);
        assert_eq!(result.table.rows[0][0], Cell::text("A..."));
    }

    #[test]
    fn test_zero_columns_passthrough() {
        let mock = Arc::new(MockProvider::new());
        let table = Table::new(Vec::new(), vec![vec![], vec![]]);

        let result = Pipeline::new(Arc::clone(&mock)).run(table.clone()).unwrap();
        assert_eq!(result.table, table);
        assert_eq!(mock.calls(), 0);
    }
}
