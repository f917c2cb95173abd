//! Table output formatting

use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Rows},
};

/// Rounded table with centered headers, or `empty` when there are no rows.
pub fn format_table<T: Tabled>(rows: &[T], empty: &str) -> String {
    if rows.is_empty() {
        return empty.to_string();
    }

    let mut table = Table::new(rows);
    table
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()));

    table.to_string()
}

/// Rows from any slice of records with a display conversion.
pub fn table_of<'a, S, R>(items: &'a [S], empty: &str) -> String
where
    R: Tabled + From<&'a S>,
{
    let rows: Vec<R> = items.iter().map(R::from).collect();
    format_table(&rows, empty)
}
