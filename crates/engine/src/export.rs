//! Spreadsheet (CSV) rendering of ledger entries.

use std::collections::HashMap;

use csv::Writer;
use serde::Serialize;
use uuid::Uuid;

use crate::{EngineError, Entry, ResultEngine, util::DATE_FORMAT};

#[derive(Serialize)]
struct ExportRow<'a> {
    date: String,
    category: &'a str,
    amount: String,
    note: &'a str,
}

/// Renders `entries` as CSV with a header row. Amounts use thousands
/// separators and two decimals; unknown categories render as empty cells.
pub(crate) fn entries_csv(
    entries: &[Entry],
    category_names: &HashMap<Uuid, String>,
) -> ResultEngine<Vec<u8>> {
    let mut writer = Writer::from_writer(vec![]);
    for entry in entries {
        writer
            .serialize(ExportRow {
                date: entry.date.format(DATE_FORMAT).to_string(),
                category: category_names
                    .get(&entry.category_id)
                    .map_or("", String::as_str),
                amount: entry.amount.to_string(),
                note: entry.note.as_deref().unwrap_or(""),
            })
            .map_err(|err| EngineError::Export(err.to_string()))?;
    }

    writer
        .into_inner()
        .map_err(|err| EngineError::Export(err.to_string()))
}
