//! Channel table extraction and row iteration.
//!
//! The modem status page carries one HTML table per channel direction. A
//! [`Table`] is the raw grid lifted out of one such region: row 0 is the
//! header, every later row is one channel. [`Table::records`] zips the
//! header against each data row, yielding one field-name→value [`Record`]
//! per channel.

use std::collections::HashMap;

use thiserror::Error;

use crate::html;
use crate::locator::Locator;

/// One channel's row as a field-name→value mapping.
///
/// The key set always equals the table's header row; the unlabeled leading
/// column (the channel name, e.g. `"Downstream 1"`) is keyed by `""`.
pub type Record = HashMap<String, String>;

/// Structural consistency errors surfaced during iteration.
///
/// A table extracted by [`Table::extract`] cannot trip these: the extractor
/// keeps header and data cells aligned by construction. Hitting one means a
/// hand-built table (or a parser bug) would have silently mis-keyed every
/// following field, so iteration fails loudly instead of truncating.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("table row {row} has {found} cells, header has {expected}")]
    RowLength {
        row: usize,
        expected: usize,
        found: usize,
    },
}

/// Header row plus data rows extracted from one table region.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Extract the table addressed by `locator` from a raw HTML document.
    ///
    /// Rows are the region's `<tr>` elements that contain at least one
    /// `<td>`; cells are each row's `<td>` elements with their markup
    /// flattened to text. Document order is preserved. A locator that
    /// matches nothing (or a region with no qualifying rows) yields an
    /// empty table — at this layer that is "nothing to report", not an
    /// error. Pure function: no I/O, same inputs produce equal tables.
    pub fn extract(document: &str, locator: &Locator) -> Table {
        let Some(table) = html::nth_table(document, locator.table) else {
            return Table::default();
        };

        let region = if locator.tbody {
            match html::first_region(table, "tbody") {
                Some(body) => body,
                None => return Table::default(),
            }
        } else {
            table
        };

        let rows: Vec<Vec<String>> = html::regions(region, "tr")
            .into_iter()
            .map(|row| {
                html::regions(row, "td")
                    .into_iter()
                    .map(html::flatten_text)
                    .collect::<Vec<String>>()
            })
            .filter(|cells: &Vec<String>| !cells.is_empty())
            .collect();

        Table { rows }
    }

    /// Build a table directly from rows. Row 0 is taken as the header.
    pub fn from_rows(rows: Vec<Vec<String>>) -> Table {
        Table { rows }
    }

    /// The header row, if the table is non-empty.
    pub fn header(&self) -> Option<&[String]> {
        self.rows.first().map(Vec::as_slice)
    }

    /// All rows, header included.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of data rows (the header does not count).
    pub fn channel_count(&self) -> usize {
        self.rows.len().saturating_sub(1)
    }

    /// True if the table holds no rows at all.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// An independent cursor over the data rows.
    ///
    /// Every call starts a fresh pass; cursors over the same table advance
    /// independently. At most one [`Record`] is materialized at a time.
    pub fn records(&self) -> Records<'_> {
        Records {
            table: self,
            cursor: 1,
        }
    }
}

/// Cursor over a [`Table`]'s data rows; see [`Table::records`].
#[derive(Debug, Clone)]
pub struct Records<'a> {
    table: &'a Table,
    cursor: usize,
}

impl Iterator for Records<'_> {
    type Item = Result<Record, TableError>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = self.table.rows.get(self.cursor)?;
        let header = &self.table.rows[0];
        let index = self.cursor;
        self.cursor += 1;

        if row.len() != header.len() {
            // Fuse after an inconsistency; the rest of the table is suspect.
            self.cursor = self.table.rows.len();
            return Some(Err(TableError::RowLength {
                row: index,
                expected: header.len(),
                found: row.len(),
            }));
        }

        let record: Record = header
            .iter()
            .cloned()
            .zip(row.iter().cloned())
            .collect();
        Some(Ok(record))
    }
}
