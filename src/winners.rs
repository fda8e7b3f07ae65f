//! Per-game winner (top prize retailer) feeds

use std::collections::BTreeMap;

use crate::coerce::coerce_int;
use crate::table::{extract_rows_min, Row};
use crate::types::WinnerRecord;

/// Winner lists keyed by game number string
pub type WinnerMap = BTreeMap<String, Vec<WinnerRecord>>;

const COL_DATE_CLAIMED: &str = "Date Claimed";
const COL_RETAILER: &str = "Selling Retailer";
const COL_ADDRESS: &str = "Selling Retailer Address";
const COL_CITY: &str = "Selling Retailer City";
const COL_ZIP: &str = "Selling Retailer Zip Code";
const COL_PACK: &str = "Pack Number";
const COL_TICKET: &str = "Ticket Number";

/// Date, retailer, address, city and zip; pack and ticket may be missing
const MIN_WINNER_FIELDS: usize = 5;

/// How much of a headerless response is inspected for error-page markers
const ERROR_SNIFF_CHARS: usize = 512;

/// Returns true when a "feed" is really an HTTP error page served with a
/// success status.
///
/// Only text above the header line is inspected, so data rows such as
/// "404 Main St" never count.
pub fn looks_like_error_page(text: &str) -> bool {
    let prefix: String = match text.find(COL_DATE_CLAIMED) {
        Some(idx) => text[..idx].to_string(),
        None => text.chars().take(ERROR_SNIFF_CHARS).collect(),
    };
    let lower = prefix.to_lowercase();
    lower.contains("404") || lower.contains("not found")
}

fn winner_from_row(row: &Row) -> WinnerRecord {
    WinnerRecord {
        date_claimed: row.get(COL_DATE_CLAIMED).to_string(),
        retailer_name: row.get(COL_RETAILER).to_string(),
        retailer_address: row.get(COL_ADDRESS).to_string(),
        retailer_city: row.get(COL_CITY).to_string(),
        retailer_zip: row.get(COL_ZIP).to_string(),
        pack_number: coerce_int(row.get(COL_PACK)),
        ticket_number: coerce_int(row.get(COL_TICKET)),
    }
}

/// Parse one winner feed, keeping only rows that say when and where
pub fn parse_winners(text: &str) -> Vec<WinnerRecord> {
    extract_rows_min(text, COL_DATE_CLAIMED, MIN_WINNER_FIELDS)
        .iter()
        .map(winner_from_row)
        .filter(WinnerRecord::is_complete)
        .collect()
}

/// Fetch and parse the winner feed of every game in `game_numbers`.
///
/// Missing feeds, error pages and feeds without usable rows all mean "no
/// winners"; such games are left out of the map entirely.
pub fn collect_winners<F>(game_numbers: &[u32], mut fetch_feed: F) -> WinnerMap
where
    F: FnMut(u32) -> Option<String>,
{
    let mut winners = WinnerMap::new();

    for &gn in game_numbers {
        log::info!("  Winners #{}...", gn);
        let Some(text) = fetch_feed(gn) else {
            log::warn!("No winner feed for #{}", gn);
            continue;
        };
        if looks_like_error_page(&text) {
            log::warn!("Winner feed for #{} is an error page, skipping", gn);
            continue;
        }
        let entries = parse_winners(&text);
        if entries.is_empty() {
            log::debug!("No usable winner rows for #{}", gn);
            continue;
        }
        winners.insert(gn.to_string(), entries);
    }

    winners
}

/// Total winner rows across all games
pub fn winner_count(winners: &WinnerMap) -> usize {
    winners.values().map(Vec::len).sum()
}
