//! Header-anchored extraction of delimited feed text
//!
//! The source sometimes prepends a title line (or a few) above the real
//! header, so extraction starts at the first line that mentions a known
//! anchor column.

use std::collections::HashMap;

/// One data row, keyed by header name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    fields: HashMap<String, String>,
}

impl Row {
    /// Value of `column`, or "" when the header has no such column
    pub fn get(&self, column: &str) -> &str {
        self.fields.get(column).map(String::as_str).unwrap_or("")
    }
}

fn clean_cell(cell: &str) -> String {
    cell.trim().trim_matches('"').trim().to_string()
}

/// Byte offset of the first line containing `anchor`
fn find_anchor_line(text: &str, anchor: &str) -> Option<usize> {
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        if line.contains(anchor) {
            return Some(offset);
        }
        offset += line.len();
    }
    None
}

/// Parse `text` into rows named by the header line that contains `anchor`.
///
/// Lines above the header are discarded. Rows with fewer fields than the
/// header are dropped rather than padded; extra trailing fields are ignored.
pub fn extract_rows(text: &str, anchor: &str) -> Vec<Row> {
    extract(text, anchor, None)
}

/// Like [`extract_rows`], but rows with at least `min_fields` fields are
/// kept; their missing trailing columns read as "".
pub fn extract_rows_min(text: &str, anchor: &str, min_fields: usize) -> Vec<Row> {
    extract(text, anchor, Some(min_fields))
}

fn extract(text: &str, anchor: &str, min_fields: Option<usize>) -> Vec<Row> {
    let Some(start) = find_anchor_line(text, anchor) else {
        log::debug!("No header line containing '{}'", anchor);
        return Vec::new();
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text[start..].as_bytes());

    let mut records = reader.records();
    let header: Vec<String> = match records.next() {
        Some(Ok(record)) => record.iter().map(clean_cell).collect(),
        Some(Err(e)) => {
            log::warn!("Unreadable header line: {}", e);
            return Vec::new();
        }
        None => return Vec::new(),
    };

    let required = min_fields.unwrap_or(header.len()).min(header.len());
    let mut rows = Vec::new();
    let mut dropped = 0usize;
    for record in records {
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                log::debug!("Skipping unreadable row: {}", e);
                dropped += 1;
                continue;
            }
        };
        if record.len() < required {
            dropped += 1;
            continue;
        }
        let fields = header
            .iter()
            .cloned()
            .zip(record.iter().map(clean_cell))
            .collect();
        rows.push(Row { fields });
    }

    if dropped > 0 {
        log::debug!("Dropped {} short or unreadable rows", dropped);
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skips_title_lines_above_anchor() {
        let text = "Scratch Ticket Prizes Remaining\n\
                    As of 10/01/2026\n\
                    Game Number,Game Name,Ticket Price\n\
                    1401,Lucky 7s,$5\n";
        let rows = extract_rows(text, "Game Number");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("Game Number"), "1401");
        assert_eq!(rows[0].get("Game Name"), "Lucky 7s");
        assert_eq!(rows[0].get("Ticket Price"), "$5");
    }

    #[test]
    fn test_missing_anchor_yields_nothing() {
        assert!(extract_rows("a,b,c\n1,2,3\n", "Game Number").is_empty());
        assert!(extract_rows("", "Game Number").is_empty());
    }

    #[test]
    fn test_short_rows_are_dropped_not_padded() {
        let text = "Game Number,Game Name,Ticket Price\n\
                    1401,Lucky 7s\n\
                    1402,Cash Blast,$10,extra\n";
        let rows = extract_rows(text, "Game Number");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("Game Number"), "1402");
        assert_eq!(rows[0].get("Ticket Price"), "$10");
    }

    #[test]
    fn test_cells_are_trimmed_of_space_and_quotes() {
        let text = " Game Number , \"Game Name\" \n  1401 ,\"  Lucky 7s \"\n";
        let rows = extract_rows(text, "Game Number");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("Game Name"), "Lucky 7s");
        assert_eq!(rows[0].get("Game Number"), "1401");
    }

    #[test]
    fn test_quoted_commas_stay_in_one_field() {
        let text = "Game Number,Total Prizes in Level\n1401,\"50,000\"\n";
        let rows = extract_rows(text, "Game Number");
        assert_eq!(rows[0].get("Total Prizes in Level"), "50,000");
    }

    #[test]
    fn test_min_fields_keeps_short_rows() {
        let text = "A,B,C,D\n1,2,3\n1,2\n";
        let rows = extract_rows_min(text, "A", 3);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("C"), "3");
        assert_eq!(rows[0].get("D"), "");
    }

    #[test]
    fn test_unknown_column_reads_empty() {
        let rows = extract_rows("Game Number\n1401\n", "Game Number");
        assert_eq!(rows[0].get("Prize Level"), "");
    }
}
