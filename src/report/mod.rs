//! Report output: CSV rows and small Markdown fragments.
//!
//! The historical report consumers are spreadsheets and a wiki, so the
//! CSV printers come in two flavors: minimally escaped rows (quote only
//! when the value needs it) and fully quoted rows matching the older
//! ingest scripts.

use std::io::{self, Write};

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

/// Join fields into one row, escaping only where needed.
#[must_use]
pub fn csv_row<S: AsRef<str>>(fields: &[S]) -> String {
    fields
        .iter()
        .map(|f| escape_field(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

/// Join fields into one row with every field quoted.
#[must_use]
pub fn quoted_row<S: AsRef<str>>(fields: &[S]) -> String {
    fields
        .iter()
        .map(|f| format!("\"{}\"", f.as_ref().replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(",")
}

/// Write a header and rows to the given writer.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_rows<W: Write>(writer: &mut W, header: &str, rows: &[String]) -> io::Result<()> {
    writeln!(writer, "{header}")?;
    for row in rows {
        writeln!(writer, "{row}")?;
    }
    Ok(())
}

/// Drop double quotes from a value destined for a fully quoted row.
#[must_use]
pub fn strip_quotes(value: &str) -> String {
    value.replace('"', "")
}

/// A level-two Markdown heading with surrounding blank lines.
#[must_use]
pub fn section(title: &str) -> String {
    format!("\n## {title}\n")
}

/// A Markdown list item.
#[must_use]
pub fn bullet(text: &str) -> String {
    format!("- {text}")
}

/// Markdown link to an issue on the tracker.
#[must_use]
pub fn issue_link(id: i64) -> String {
    format!("[#{id}](https://www.drupal.org/node/{id})")
}
