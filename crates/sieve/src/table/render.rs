//! Text renderings of rows: delimited output and an aligned grid.

use super::cell::Cell;

/// Render rows as delimited text with a header line.
///
/// Fails when a row's width differs from the header's.
pub fn render_delimited(
    headers: &[String],
    rows: &[Vec<Cell>],
    delimiter: u8,
) -> csv::Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::new());

    writer.write_record(headers)?;
    for row in rows {
        writer.write_record(row.iter().map(|c| c.to_string()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Render rows as a right-aligned grid with a leading row-index column.
///
/// `first_index` is the index printed for the first row, so a slice of a
/// larger table keeps its original row numbers. Nulls are shown as `NaN`.
pub fn render_grid(headers: &[String], rows: &[Vec<Cell>], first_index: usize) -> String {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|c| match c {
                    Cell::Null => "NaN".to_string(),
                    other => other.to_string(),
                })
                .collect()
        })
        .collect();

    let index_width = rows
        .len()
        .checked_sub(1)
        .map(|last| (first_index + last).to_string().len())
        .unwrap_or(0);

    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(col, header)| {
            cells
                .iter()
                .filter_map(|row| row.get(col))
                .map(|s| s.chars().count())
                .chain(std::iter::once(header.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    out.push_str(&" ".repeat(index_width));
    for (header, width) in headers.iter().zip(&widths) {
        out.push_str("  ");
        out.push_str(&pad_left(header, *width));
    }

    for (offset, row) in cells.iter().enumerate() {
        out.push('\n');
        out.push_str(&pad_right(&(first_index + offset).to_string(), index_width));
        for (value, width) in row.iter().zip(&widths) {
            out.push_str("  ");
            out.push_str(&pad_left(value, *width));
        }
    }

    out
}

fn pad_left(value: &str, width: usize) -> String {
    let len = value.chars().count();
    format!("{}{}", " ".repeat(width.saturating_sub(len)), value)
}

fn pad_right(value: &str, width: usize) -> String {
    let len = value.chars().count();
    format!("{}{}", value, " ".repeat(width.saturating_sub(len)))
}
