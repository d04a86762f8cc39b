use std::collections::HashMap;

use crate::{EntryFilter, LedgerKind, ResultEngine, export::entries_csv};

use super::{Engine, entries::MAX_PAGE_SIZE};

impl Engine {
    /// Exports every entry matching `filter` as CSV, newest first.
    pub async fn export_entries(
        &self,
        kind: LedgerKind,
        filter: &EntryFilter,
    ) -> ResultEngine<Vec<u8>> {
        let names: HashMap<_, _> = self
            .list_categories(kind)
            .await?
            .into_iter()
            .map(|category| (category.id, category.name))
            .collect();

        let mut entries = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let page = self
                .list_entries(kind, filter, MAX_PAGE_SIZE, cursor.as_deref())
                .await?;
            entries.extend(page.entries);
            match page.next_cursor {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        tracing::debug!("exporting {} {kind} entries", entries.len());
        entries_csv(&entries, &names)
    }
}
