//! Flat row codec for the checkpoint log.
//!
//! A row is the record's cells joined by [`CELL_DELIMITER`] and terminated by
//! [`ROW_DELIMITER`]. A log is a concatenation of rows; anything after the last
//! row delimiter is a torn write.

use crate::error::PoolsError;

pub const ROW_DELIMITER: &str = "\r\n";
pub const CELL_DELIMITER: char = ';';

/// Fixed-order string cells of one pool record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatRecord(pub Vec<String>);

impl FlatRecord {
    pub fn cells(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Encode as one log row, including the trailing row delimiter.
    pub fn encode(&self) -> Result<String, PoolsError> {
        let mut row = String::new();
        for (i, cell) in self.0.iter().enumerate() {
            if cell.contains(CELL_DELIMITER) || cell.contains('\r') || cell.contains('\n') {
                return Err(PoolsError::Storage(format!(
                    "cell {i} contains a delimiter: {cell:?}"
                )));
            }
            if i > 0 {
                row.push(CELL_DELIMITER);
            }
            row.push_str(cell);
        }
        row.push_str(ROW_DELIMITER);
        Ok(row)
    }

    /// Decode one row (without its delimiter).
    pub fn decode(row: &str) -> Self {
        Self(row.split(CELL_DELIMITER).map(str::to_string).collect())
    }
}

/// A log split into complete rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRows<'a> {
    /// Complete, non-empty rows in file order.
    pub rows: Vec<&'a str>,
    /// Byte offset of each row in `rows`.
    pub offsets: Vec<usize>,
    /// Byte length of the log up to and including the last row delimiter.
    pub complete_len: usize,
    /// Bytes after the last row delimiter (a torn trailing write).
    pub torn_len: usize,
}

/// Split raw log text into complete rows, setting aside a torn tail.
pub fn split_log(text: &str) -> LogRows<'_> {
    let complete_len = text
        .rfind(ROW_DELIMITER)
        .map(|pos| pos + ROW_DELIMITER.len())
        .unwrap_or(0);
    let mut rows = Vec::new();
    let mut offsets = Vec::new();
    let mut start = 0;
    for row in text[..complete_len].split(ROW_DELIMITER) {
        if !row.is_empty() {
            rows.push(row);
            offsets.push(start);
        }
        start += row.len() + ROW_DELIMITER.len();
    }
    LogRows {
        rows,
        offsets,
        complete_len,
        torn_len: text.len() - complete_len,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_joins_cells() {
        let flat = FlatRecord(vec!["0xa".into(), "12".into(), "0.5".into()]);
        assert_eq!(flat.encode().unwrap(), "0xa;12;0.5\r\n");
        assert_eq!(FlatRecord::decode("0xa;12;0.5"), flat);
    }

    #[test]
    fn encode_rejects_delimiters() {
        let flat = FlatRecord(vec!["a;b".into()]);
        assert!(matches!(flat.encode(), Err(PoolsError::Storage(_))));
        let flat = FlatRecord(vec!["a\r\nb".into()]);
        assert!(flat.encode().is_err());
    }

    #[test]
    fn split_clean_log() {
        let log = split_log("a;1\r\nb;2\r\n");
        assert_eq!(log.rows, vec!["a;1", "b;2"]);
        assert_eq!(log.offsets, vec![0, 5]);
        assert_eq!(log.complete_len, 10);
        assert_eq!(log.torn_len, 0);
    }

    #[test]
    fn split_sets_aside_torn_tail() {
        let log = split_log("a;1\r\nb;2\r\nc;");
        assert_eq!(log.rows, vec!["a;1", "b;2"]);
        assert_eq!(log.complete_len, 10);
        assert_eq!(log.torn_len, 2);
    }

    #[test]
    fn split_skips_blank_rows() {
        let log = split_log("a;1\r\n\r\nb;2\r\n");
        assert_eq!(log.rows, vec!["a;1", "b;2"]);
        assert_eq!(log.offsets, vec![0, 7]);
    }

    #[test]
    fn split_empty_and_fully_torn() {
        assert!(split_log("").rows.is_empty());
        let log = split_log("a;1\r");
        assert!(log.rows.is_empty());
        assert_eq!(log.complete_len, 0);
        assert_eq!(log.torn_len, 4);
    }
}
