//! Prompt templates for batch cleaning.

use crate::batch::Batch;
use crate::input::ContextHints;

/// Line introducing the CSV copy of a batch inside a prompt.
pub const CSV_MARKER: &str = "The same rows as CSV:\n```csv\n";

/// Build the cleaning prompt for one batch.
///
/// The batch appears twice: as an aligned grid for the model to read and as
/// a CSV block whose header line the answer must reuse verbatim.
pub fn cleaning_prompt(batch: &Batch<'_>, context: &ContextHints) -> csv::Result<String> {
    let context_section = if context.is_empty() {
        String::new()
    } else {
        format!("\n## Context\n{}\n", context.to_prompt_string())
    };

    Ok(format!(
        r#"You are an AI Data Cleaning Agent. Analyze the dataset (batch {number} of {total}):

{grid}
{context_section}
## Task
Identify missing values, choose the best imputation strategy (mean, mode, median)
for each column, remove duplicates, and format text correctly.

## Output
Return the cleaned data as CSV only, with no commentary.
The first line must be exactly this header:
{header}
Keep the rows in their original order.

{marker}{csv}```"#,
        number = batch.number(),
        total = batch.total(),
        grid = batch.display_grid(),
        header = batch.headers().join(","),
        marker = CSV_MARKER,
        csv = batch.to_csv()?,
    ))
}

/// System prompt for providers that take one separately.
pub fn system_prompt() -> &'static str {
    r#"You are a data cleaning assistant.

Guidelines:
- Answer with CSV only, never prose
- Keep the exact header line you are given
- Keep one output row per input row unless it is an exact duplicate
- Leave a field empty when no sensible value exists"#
}

/// Extract the CSV block embedded by [`cleaning_prompt`].
///
/// The block is the last one in the prompt, so fences inside cell values
/// shown earlier in the grid are skipped.
pub fn embedded_csv(prompt: &str) -> Option<&str> {
    let start = prompt.rfind(CSV_MARKER)? + CSV_MARKER.len();
    let body = prompt[start..].trim_end().strip_suffix("```")?;
    Some(body.trim_matches('\n'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::BatchPlanner;
    use crate::table::{Cell, Table};

    fn sample() -> Table {
        Table::new(
            vec!["name".into(), "age".into()],
            vec![
                vec![Cell::text("Ann"), Cell::Number(31.0)],
                vec![Cell::text("Bo"), Cell::Null],
            ],
        )
    }

    #[test]
    fn test_prompt_embeds_batch() {
        let table = sample();
        let batch = BatchPlanner::default().plan(&table).next().unwrap();
        let ctx = ContextHints::new().with_domain("clinical");

        let prompt = cleaning_prompt(&batch, &ctx).unwrap();

        assert!(prompt.contains("batch 1 of 1"));
        assert!(prompt.contains("imputation strategy (mean, mode, median)"));
        assert!(prompt.contains("Domain: clinical"));
        assert!(prompt.contains("\nname,age\n"));
        assert!(prompt.contains("NaN"));
    }

    #[test]
    fn test_prompt_without_context() {
        let table = sample();
        let batch = BatchPlanner::default().plan(&table).next().unwrap();
        assert!(!cleaning_prompt(&batch, &ContextHints::new())
            .unwrap()
            .contains("## Context"));
    }

    #[test]
    fn test_embedded_csv_round_trip() {
        let table = sample();
        let batch = BatchPlanner::default().plan(&table).next().unwrap();
        let prompt = cleaning_prompt(&batch, &ContextHints::new()).unwrap();

        assert_eq!(embedded_csv(&prompt), Some("name,age\nAnn,31\nBo,"));
        assert_eq!(embedded_csv("no block here"), None);
    }

    #[test]
    fn test_embedded_csv_ignores_fence_in_cell() {
        let table = Table::new(
            vec!["note".into()],
            vec![vec![Cell::text("```csv")], vec![Cell::text("ok")]],
        );
        let batch = BatchPlanner::default().plan(&table).next().unwrap();
        let prompt = cleaning_prompt(&batch, &ContextHints::new()).unwrap();

        assert_eq!(embedded_csv(&prompt), Some("note\n```csv\nok"));
    }

    #[test]
    fn test_ragged_batch_fails_to_render() {
        let table = Table::new(vec!["a".into(), "b".into()], vec![vec![Cell::Null]]);
        let batch = BatchPlanner::default().plan(&table).next().unwrap();
        assert!(cleaning_prompt(&batch, &ContextHints::new()).is_err());
    }
}
