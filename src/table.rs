//! Raw CSV table storage
//!
//! A category table is kept as plain strings so that unknown columns and
//! user-entered values survive every rewrite untouched. Writes go to a
//! sibling temp file first and are moved into place with a rename.

use crate::error::StoreResult;
use crate::item::parse_id;
use std::fs;
use std::path::Path;

/// Header row plus data rows, all as raw cell strings
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Read a table from disk. A missing or zero-length file is an empty table.
    pub fn read(path: &Path) -> StoreResult<Self> {
        match fs::metadata(path) {
            Ok(meta) if meta.len() == 0 => {
                log::info!("Table {} is empty", path.display());
                return Ok(Self::default());
            }
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("Table {} does not exist yet", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        }

        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(path)?;

        let headers: Vec<String> = rdr
            .headers()?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_string())
            .collect();

        let mut rows = Vec::new();
        for result in rdr.records() {
            let record = result?;
            let mut row: Vec<String> = record.iter().map(|c| c.to_string()).collect();
            row.resize(headers.len().max(row.len()), String::new());
            rows.push(row);
        }

        log::debug!("Read {} rows from {}", rows.len(), path.display());
        Ok(Self { headers, rows })
    }

    /// Rewrite the whole table at `path`.
    ///
    /// The data lands in `<path>.tmp` first and is renamed over the target,
    /// so a failed write leaves the previous table intact.
    pub fn write(&self, path: &Path) -> StoreResult<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
                log::info!("Created directory: {}", parent.display());
            }
        }

        let mut tmp_name = path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = Path::new(&tmp_name);

        {
            let mut wtr = csv::WriterBuilder::new()
                .flexible(true)
                .from_path(tmp_path)?;
            wtr.write_record(&self.headers)?;
            for row in &self.rows {
                wtr.write_record(row)?;
            }
            wtr.flush()?;
        }

        if let Err(e) = fs::rename(tmp_path, path) {
            let _ = fs::remove_file(tmp_path);
            return Err(e.into());
        }

        log::debug!("Wrote {} rows to {}", self.rows.len(), path.display());
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a named column
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Index of a named column, appending it (with empty cells) if missing
    pub fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(index) = self.column(name) {
            return index;
        }
        self.headers.push(name.to_string());
        for row in &mut self.rows {
            row.resize(self.headers.len(), String::new());
        }
        self.headers.len() - 1
    }

    /// Position of the first row whose integer `id` equals `id`.
    ///
    /// Rows without an integer id are never matched, the same rows `Item::from_row` skips.
    pub fn find_row(&self, id: &str) -> Option<usize> {
        let id_col = self.column("id")?;
        let wanted = parse_id(id)?;
        self.rows
            .iter()
            .position(|row| row.get(id_col).and_then(|cell| parse_id(cell)) == Some(wanted))
    }

    /// Largest integer id in the table
    pub fn max_id(&self) -> Option<u64> {
        let id_col = self.column("id")?;
        self.rows
            .iter()
            .filter_map(|row| row.get(id_col).and_then(|cell| parse_id(cell)))
            .max()
    }

    /// Append a row, mapping each header to a value via `value_for`
    pub fn push_row<F>(&mut self, mut value_for: F)
    where
        F: FnMut(&str) -> String,
    {
        let row = self.headers.iter().map(|h| value_for(h)).collect();
        self.rows.push(row);
    }

    /// Overwrite one cell, growing the row if it is short
    pub fn set(&mut self, row: usize, column: usize, value: String) {
        if let Some(cells) = self.rows.get_mut(row) {
            if cells.len() <= column {
                cells.resize(column + 1, String::new());
            }
            cells[column] = value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> Table {
        Table {
            headers: vec!["id".into(), "name".into(), "remark".into()],
            rows: vec![
                vec!["1".into(), "Alpha".into(), "".into()],
                vec!["7".into(), "Beta, the second".into(), "line1\nline2".into()],
            ],
        }
    }

    #[test]
    fn read_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let table = Table::read(&temp_dir.path().join("missing.csv")).unwrap();
        assert!(table.is_empty());
        assert!(table.headers.is_empty());
    }

    #[test]
    fn read_zero_length_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("empty.csv");
        fs::write(&path, "").unwrap();
        assert!(Table::read(&path).unwrap().is_empty());
    }

    #[test]
    fn write_then_read_preserves_quoted_cells() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("figures.csv");

        let table = sample();
        table.write(&path).unwrap();

        let read = Table::read(&path).unwrap();
        assert_eq!(read, table);
        assert!(!temp_dir.path().join("nested").join("figures.csv.tmp").exists());
    }

    #[test]
    fn read_pads_short_rows() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("short.csv");
        fs::write(&path, "id,name,remark\n1,Alpha\n").unwrap();

        let table = Table::read(&path).unwrap();
        assert_eq!(table.rows[0], vec!["1", "Alpha", ""]);
    }

    #[test]
    fn read_strips_byte_order_mark() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bom.csv");
        fs::write(&path, "\u{feff}id,name\n1,Alpha\n").unwrap();

        let table = Table::read(&path).unwrap();
        assert_eq!(table.column("id"), Some(0));
    }

    #[test]
    fn find_row_matches_integer_ids() {
        let mut table = sample();
        table.rows.push(vec!["abc".into(), "Broken".into(), "".into()]);

        assert_eq!(table.find_row("7"), Some(1));
        assert_eq!(table.find_row(" 1 "), Some(0));
        assert_eq!(table.find_row("7.0"), Some(1));
        assert_eq!(table.find_row("3"), None);
        assert_eq!(table.find_row("abc"), None);
    }

    #[test]
    fn max_id_ignores_non_numeric_ids() {
        let mut table = sample();
        table.rows.push(vec!["junk".into(), "".into(), "".into()]);
        assert_eq!(table.max_id(), Some(7));
        assert_eq!(Table::default().max_id(), None);
    }

    #[test]
    fn ensure_column_appends_and_pads() {
        let mut table = sample();
        assert_eq!(table.ensure_column("name"), 1);

        let index = table.ensure_column("image");
        assert_eq!(index, 3);
        assert!(table.rows.iter().all(|row| row.len() == 4 && row[3].is_empty()));
    }

    #[test]
    fn push_row_follows_header_order() {
        let mut table = sample();
        table.push_row(|column| match column {
            "id" => "8".to_string(),
            "name" => "Gamma".to_string(),
            _ => String::new(),
        });
        assert_eq!(table.rows[2], vec!["8", "Gamma", ""]);
    }
}
