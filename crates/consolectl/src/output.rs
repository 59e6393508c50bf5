//! Printing of command results as JSON lines, YAML documents, or a table.

use serde::Serialize;
use std::io;

#[derive(clap::Args, Clone, Debug, Default)]
pub struct Output {
    /// Output format. Defaults to a table on a terminal, and YAML otherwise
    #[clap(global = true, short, long, value_enum)]
    pub output: Option<OutputType>,
}

#[derive(clap::ValueEnum, Debug, Copy, Clone, PartialEq)]
pub enum OutputType {
    /// One compact JSON document per line
    Json,
    /// A stream of YAML documents
    Yaml,
    /// A table of the columns shown for each result
    Table,
}

/// Rows are results of a command which print as table rows.
/// JSON and YAML output is the `Serialize` representation.
pub trait Rows: Serialize {
    /// Selects the columns of a table, such as the `ColumnMask` of a message
    /// listing. Results with a fixed set of columns use `()`.
    type Columns: Copy;

    fn headers(columns: Self::Columns) -> Vec<&'static str>;

    /// Cells of this result, in the order of its `headers`.
    /// An empty cell is shown as `-`.
    fn cells(self, columns: Self::Columns) -> Vec<String>;
}

pub fn write<W, T>(
    w: &mut W,
    output_type: OutputType,
    columns: T::Columns,
    items: impl IntoIterator<Item = T>,
) -> anyhow::Result<()>
where
    W: io::Write,
    T: Rows,
{
    match output_type {
        OutputType::Json => {
            for item in items {
                serde_json::to_writer(&mut *w, &item)?;
                w.write_all(b"\n")?;
            }
        }
        OutputType::Yaml => {
            for item in items {
                serde_yaml::to_writer(&mut *w, &item)?;
                w.write_all(b"\n")?;
            }
        }
        OutputType::Table => {
            let mut table = crate::new_table(T::headers(columns));
            for item in items {
                table.add_row(item.cells(columns).into_iter().map(dash_if_empty));
            }
            writeln!(w, "{table}")?;
        }
    }
    Ok(())
}

fn dash_if_empty(cell: String) -> String {
    if cell.trim().is_empty() {
        "-".to_string()
    } else {
        cell
    }
}
