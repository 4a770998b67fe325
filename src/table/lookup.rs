//! Keyed lookup over positional rows.
//!
//! Lookup sorts rows by composite key and binary-searches the result. There
//! is no persistent index: the server re-reads and re-sorts the directory on
//! every request, which is fine for a classroom-sized roster.
//!
//! When several rows share a composite key, [`find`] returns whichever one
//! the search lands on first. Use [`find_all`] to see every duplicate.

use super::codec::{self, Row};
use super::key::{CompositeKey, KeyLayout, compare};
use crate::error::{Result, ResultExt as _};
use std::cmp::Ordering;
use std::path::Path;

/// Sort rows ascending by composite key. The sort is stable.
pub fn sort_rows(rows: &mut [Row], layout: KeyLayout) {
    rows.sort_by_cached_key(|row| CompositeKey::from_row(row, layout));
}

/// Sort `rows`, then binary-search for `key`.
pub fn find<'a>(rows: &'a mut [Row], layout: KeyLayout, key: &CompositeKey) -> Option<&'a Row> {
    sort_rows(rows, layout);
    search_sorted(rows, layout, key)
}

/// Binary-search rows already sorted under `layout`.
pub fn search_sorted<'a>(
    rows: &'a [Row],
    layout: KeyLayout,
    key: &CompositeKey,
) -> Option<&'a Row> {
    let idx = rows
        .binary_search_by(|row| compare(&CompositeKey::from_row(row, layout), key))
        .ok()?;
    rows.get(idx)
}

/// Every row whose key equals `key`, as a contiguous slice of sorted rows.
pub fn find_all<'a>(rows: &'a [Row], layout: KeyLayout, key: &CompositeKey) -> &'a [Row] {
    let start = rows.partition_point(|row| {
        compare(&CompositeKey::from_row(row, layout), key) == Ordering::Less
    });
    let end = rows.partition_point(|row| {
        compare(&CompositeKey::from_row(row, layout), key) != Ordering::Greater
    });
    rows.get(start..end).unwrap_or_default()
}

/// A directory file loaded once and sorted for searching.
///
/// `rows` stays in file order for display; `sorted` is the same rows ordered
/// by composite key, and every search goes through [`search_sorted`] and
/// [`find_all`] over it.
#[derive(Debug, Clone)]
pub struct DirectorySnapshot {
    rows: Vec<Row>,
    sorted: Vec<Row>,
    layout: KeyLayout,
}

impl DirectorySnapshot {
    pub fn from_rows(rows: Vec<Row>, layout: KeyLayout) -> Self {
        let mut sorted = rows.clone();
        sort_rows(&mut sorted, layout);
        Self {
            rows,
            sorted,
            layout,
        }
    }

    /// Load and sort the directory at `path`. A missing file is an empty directory.
    pub fn load(path: &Path) -> Result<Self> {
        let rows = codec::read_rows(path)
            .storage_unavailable(format!("Failed to read directory {}", path.display()))?;
        tracing::debug!("Loaded {} directory rows from {}", rows.len(), path.display());
        Ok(Self::from_rows(rows, KeyLayout::DIRECTORY))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows in file order.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn find(&self, key: &CompositeKey) -> Option<&Row> {
        search_sorted(&self.sorted, self.layout, key)
    }

    pub fn find_all(&self, key: &CompositeKey) -> &[Row] {
        find_all(&self.sorted, self.layout, key)
    }

    /// Render as a plain-text table: the first row as headings, then the rest in file order.
    pub fn render_table(&self) -> String {
        let Some((header, body)) = self.rows.split_first() else {
            return String::new();
        };

        let columns = self.rows.iter().map(Vec::len).max().unwrap_or(0);
        let mut widths = vec![0_usize; columns];
        for row in &self.rows {
            for (width, field) in widths.iter_mut().zip(row) {
                *width = (*width).max(field.chars().count());
            }
        }

        let mut out = String::new();
        render_line(&mut out, header, &widths);
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        render_line(&mut out, &rule, &widths);
        for row in body {
            render_line(&mut out, row, &widths);
        }
        out
    }
}

fn render_line(out: &mut String, row: &[String], widths: &[usize]) {
    let cells: Vec<String> = widths
        .iter()
        .enumerate()
        .map(|(i, &width)| {
            let field = row.get(i).map_or("", String::as_str);
            format!("{field:<width$}")
        })
        .collect();
    out.push_str(cells.join(" | ").trim_end());
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> Vec<Row> {
        codec::parse(
            "2023,1,2,MARY,5B,ST02\n\
             2023,1,2,JOHN,5A,ST01\n\
             2024,2,3,ADA,4C,ST03\n",
            codec::DELIMITER,
        )
        .expect("fixture parses")
    }

    #[test]
    fn test_find_existing_row() {
        let mut rows = roster();
        let key = CompositeKey::new("MARY", "5B", "2023", "1");
        let row = find(&mut rows, KeyLayout::DIRECTORY, &key).expect("MARY should be found");
        assert_eq!(row[5], "ST02");
    }

    #[test]
    fn test_find_missing_row() {
        let mut rows = roster();
        let key = CompositeKey::new("ZOE", "5C", "2023", "1");
        assert!(find(&mut rows, KeyLayout::DIRECTORY, &key).is_none());
    }

    #[test]
    fn test_find_empty_rows() {
        let mut rows: Vec<Row> = Vec::new();
        let key = CompositeKey::new("JOHN", "5A", "2023", "1");
        assert!(find(&mut rows, KeyLayout::DIRECTORY, &key).is_none());
    }

    #[test]
    fn test_sort_orders_by_name_first() {
        let mut rows = roster();
        sort_rows(&mut rows, KeyLayout::DIRECTORY);
        let names: Vec<&str> = rows.iter().map(|r| r[3].as_str()).collect();
        assert_eq!(names, vec!["ADA", "JOHN", "MARY"]);
    }

    #[test]
    fn test_every_row_is_found_by_its_own_key() {
        let mut rows = roster();
        sort_rows(&mut rows, KeyLayout::DIRECTORY);
        for row in &rows {
            let key = CompositeKey::from_row(row, KeyLayout::DIRECTORY);
            let found = search_sorted(&rows, KeyLayout::DIRECTORY, &key).expect("own key");
            assert_eq!(CompositeKey::from_row(found, KeyLayout::DIRECTORY), key);
        }
    }

    #[test]
    fn test_find_all_returns_duplicates() {
        let mut rows = roster();
        rows.push(vec![
            "2023".to_owned(),
            "1".to_owned(),
            "2".to_owned(),
            "JOHN".to_owned(),
            "5A".to_owned(),
            "ST09".to_owned(),
        ]);
        sort_rows(&mut rows, KeyLayout::DIRECTORY);

        let key = CompositeKey::new("john", "5a", "2023", "1");
        let all = find_all(&rows, KeyLayout::DIRECTORY, &key);
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|r| r[3] == "JOHN"));

        let none = find_all(&rows, KeyLayout::DIRECTORY, &CompositeKey::new("ZOE", "", "", ""));
        assert!(none.is_empty());
    }

    #[test]
    fn test_snapshot_search_keeps_file_order() {
        let snapshot = DirectorySnapshot::from_rows(roster(), KeyLayout::DIRECTORY);
        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot.rows()[0][3], "MARY");

        let key = CompositeKey::new("ADA", "4C", "2024", "2");
        assert_eq!(snapshot.find(&key).expect("ADA")[5], "ST03");
        assert_eq!(snapshot.find_all(&key).len(), 1);
        assert!(snapshot.find(&CompositeKey::new("ADA", "4C", "2024", "3")).is_none());
    }

    #[test]
    fn test_snapshot_find_all_sees_duplicates() {
        let mut rows = roster();
        rows.push(rows[1].clone());
        let snapshot = DirectorySnapshot::from_rows(rows, KeyLayout::DIRECTORY);

        let key = CompositeKey::new("JOHN", "5A", "2023", "1");
        assert_eq!(snapshot.find_all(&key).len(), 2);
        assert_eq!(snapshot.rows().len(), 4);
        assert_eq!(snapshot.rows()[0][3], "MARY");
    }

    #[test]
    fn test_render_table_aligns_columns() {
        let rows = codec::parse(
            "session,term,name\n2023,1,JOHN\n2024,2,MARY-ANNE\n",
            codec::DELIMITER,
        )
        .expect("fixture parses");
        let snapshot = DirectorySnapshot::from_rows(rows, KeyLayout::DIRECTORY);
        let table = snapshot.render_table();
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "session | term | name");
        assert_eq!(lines[1], "------- | ---- | ---------");
        assert_eq!(lines[2], "2023    | 1    | JOHN");
        assert_eq!(lines[3], "2024    | 2    | MARY-ANNE");
    }

    #[test]
    fn test_render_empty_snapshot() {
        let snapshot = DirectorySnapshot::from_rows(Vec::new(), KeyLayout::DIRECTORY);
        assert!(snapshot.is_empty());
        assert!(snapshot.find(&CompositeKey::new("", "", "", "")).is_none());
        assert_eq!(snapshot.render_table(), "");
    }
}
