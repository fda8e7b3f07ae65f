//! Fallback game source: the pipe-table listing page
//!
//! Used only when the prize CSV is unreachable or empty. A line carrying a
//! bracketed game number like `[1401]` opens a game; every
//! `$amount | printed | claimed` triple on later pipe lines belongs to it.

use regex::Regex;
use scraper::{Html, Selector};
use std::sync::LazyLock;

use crate::coerce::coerce_int;
use crate::games::GameMap;
use crate::types::{GameRecord, PrizeTier};

static GAME_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(\d{4})\]").expect("valid game tag regex"));

static DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\|\s*(\d{2}/\d{2}/\d{2})\s*\|").expect("valid listing date regex")
});

static PRICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$(\d+)\s*\|").expect("valid listing price regex"));

static NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\|\s*(?:\\\*|\*)?\s*\|\s*(.+?)\s*\|\s*\$").expect("valid listing name regex")
});

static TIER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$([\d,]+)\s*\|\s*([\d,]+)\s*\|\s*([\d,\-]+)").expect("valid listing tier regex")
});

fn is_closing(line: &str) -> bool {
    line.contains("\\*") || line.contains("* |")
}

fn shell_from_line(gn: u32, line: &str) -> GameRecord {
    let mut game = GameRecord::new(gn);
    game.name = NAME_RE
        .captures(line)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default();
    game.price = PRICE_RE
        .captures(line)
        .and_then(|c| c.get(1))
        .map(|m| coerce_int(m.as_str()))
        .unwrap_or(0);
    if is_closing(line) {
        game.close_date = DATE_RE
            .captures(line)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();
        game.closed = !game.close_date.is_empty();
    }
    game
}

/// Turn HTML table rows into `| cell | cell |` lines. Text without any
/// `<tr>` is assumed to be pipe text already.
pub fn flatten_table_rows(html: &str) -> String {
    if !html.contains("<tr") {
        return html.to_string();
    }
    let document = Html::parse_document(html);
    let (Ok(rows), Ok(cells)) = (Selector::parse("tr"), Selector::parse("td, th")) else {
        return String::new();
    };

    let mut out = String::new();
    for row in document.select(&rows) {
        let texts: Vec<String> = row
            .select(&cells)
            .map(|cell| cell.text().collect::<Vec<_>>().join(" "))
            .map(|t| t.split_whitespace().collect::<Vec<_>>().join(" "))
            .collect();
        if texts.is_empty() {
            continue;
        }
        out.push_str("| ");
        out.push_str(&texts.join(" | "));
        out.push_str(" |\n");
    }
    out
}

/// Parse listing text (pipe lines) into games
pub fn parse_listing(text: &str) -> GameMap {
    let mut games = GameMap::new();
    let mut current: Option<u32> = None;

    for line in text.lines() {
        if let Some(gn) = GAME_TAG_RE
            .captures(line)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<u32>().ok())
        {
            current = Some(gn);
            games.entry(gn).or_insert_with(|| shell_from_line(gn, line));
        }

        let Some(gn) = current else { continue };
        if !line.contains('|') {
            continue;
        }
        let Some(game) = games.get_mut(&gn) else { continue };
        for caps in TIER_RE.captures_iter(line) {
            let amount = coerce_int(&caps[1]);
            let total_printed = coerce_int(&caps[2]);
            if amount == 0 || total_printed == 0 {
                continue;
            }
            game.prize_tiers.push(PrizeTier {
                amount,
                total_printed,
                claimed: coerce_int(&caps[3]),
            });
        }
    }

    for game in games.values_mut() {
        game.sort_tiers();
    }
    games
}

/// Fetched listing page to games, HTML or pipe text alike
pub fn parse_listing_page(page: &str) -> GameMap {
    parse_listing(&flatten_table_rows(page))
}
