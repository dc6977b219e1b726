//! CSV serialization for the assembled table. Handles proper escaping of
//! fields containing commas, quotes, or newlines.

use std::io::{self, Write};

use crate::table::Table;

/// Escape a CSV field value.
///
/// Wraps in double quotes if the value contains commas, quotes, or
/// newlines. Doubles any existing quotes within the value.
#[must_use]
pub fn escape_field(value: &str) -> String {
    let needs_quoting = value.contains(',')
        || value.contains('"')
        || value.contains('\n')
        || value.contains('\r');

    if needs_quoting {
        let escaped = value.replace('"', "\"\"");
        format!("\"{escaped}\"")
    } else {
        value.to_string()
    }
}

/// Write the header row and one row per record. No index column.
pub fn write_table<W: Write>(writer: &mut W, table: &Table) -> io::Result<()> {
    let header: Vec<String> = table.columns.iter().map(|c| escape_field(c)).collect();
    writeln!(writer, "{}", header.join(","))?;

    for row in &table.rows {
        let cells: Vec<String> = row.iter().map(|v| escape_field(v)).collect();
        writeln!(writer, "{}", cells.join(","))?;
    }

    Ok(())
}
