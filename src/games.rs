//! Building per-game records from the prize-tier feed

use std::collections::BTreeMap;

use crate::coerce::{coerce_int, is_all_digits};
use crate::table::{extract_rows, Row};
use crate::types::{GameRecord, PrizeTier};

/// Games keyed by game number
pub type GameMap = BTreeMap<u32, GameRecord>;

pub const COL_GAME_NUMBER: &str = "Game Number";
pub const COL_GAME_NAME: &str = "Game Name";
pub const COL_CLOSE_DATE: &str = "Game Close Date";
pub const COL_TICKET_PRICE: &str = "Ticket Price";
pub const COL_PRIZE_LEVEL: &str = "Prize Level";
pub const COL_PRIZES_PRINTED: &str = "Total Prizes in Level";
pub const COL_PRIZES_CLAIMED: &str = "Prizes Claimed";

/// Prize level value marking the per-game aggregate row
const TOTAL_SENTINEL: &str = "TOTAL";

/// Game number of a row, if the row is a game row at all
fn game_number(row: &Row) -> Option<u32> {
    let raw = row.get(COL_GAME_NUMBER);
    if !is_all_digits(raw) {
        return None;
    }
    raw.parse::<u32>().ok().filter(|gn| *gn > 0)
}

fn shell_from_row(gn: u32, row: &Row) -> GameRecord {
    let close_date = row.get(COL_CLOSE_DATE).to_string();
    let mut game = GameRecord::new(gn);
    game.name = row.get(COL_GAME_NAME).to_string();
    game.price = coerce_int(row.get(COL_TICKET_PRICE));
    game.closed = !close_date.is_empty();
    game.close_date = close_date;
    game
}

fn tier_from_row(row: &Row) -> Option<PrizeTier> {
    let level = row.get(COL_PRIZE_LEVEL);
    // The TOTAL row carries aggregate ticket counts. Totals come from the
    // detail pages, so the row is skipped here.
    if level.eq_ignore_ascii_case(TOTAL_SENTINEL) {
        return None;
    }
    let amount = coerce_int(level);
    let total_printed = coerce_int(row.get(COL_PRIZES_PRINTED));
    if amount == 0 || total_printed == 0 {
        return None;
    }
    Some(PrizeTier {
        amount,
        total_printed,
        claimed: coerce_int(row.get(COL_PRIZES_CLAIMED)),
    })
}

/// Build the game map from already-extracted rows.
///
/// The first row seen for a game fixes its name, price and close date; later
/// rows only add prize tiers.
pub fn build_games(rows: &[Row]) -> GameMap {
    let mut games = GameMap::new();
    let mut skipped = 0usize;

    for row in rows {
        let Some(gn) = game_number(row) else {
            skipped += 1;
            continue;
        };
        let game = games.entry(gn).or_insert_with(|| shell_from_row(gn, row));
        if let Some(tier) = tier_from_row(row) {
            game.prize_tiers.push(tier);
        }
    }

    for game in games.values_mut() {
        game.sort_tiers();
    }

    if skipped > 0 {
        log::debug!("Skipped {} rows without a numeric game number", skipped);
    }
    games
}

/// Extract and build in one step from raw prize feed text
pub fn parse_prize_feed(text: &str) -> GameMap {
    build_games(&extract_rows(text, COL_GAME_NUMBER))
}

/// Game numbers whose top prize has been claimed at least once
pub fn winner_candidates(games: &GameMap) -> Vec<u32> {
    games
        .values()
        .filter(|g| g.has_claimed_top_prize())
        .map(|g| g.game_number)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Game Number,Game Name,Game Close Date,Ticket Price,Prize Level,Total Prizes in Level,Prizes Claimed\n";

    fn feed(lines: &[&str]) -> String {
        let mut text = String::from(HEADER);
        for line in lines {
            text.push_str(line);
            text.push('\n');
        }
        text
    }

    #[test]
    fn test_two_row_feed() {
        let text = feed(&[
            "1401,Lucky 7s,,$5,\"$100,000\",10,2",
            "1401,Lucky 7s,,$5,$5,\"50,000\",\"1,000\"",
        ]);
        let games = parse_prize_feed(&text);
        assert_eq!(games.len(), 1);

        let game = &games[&1401];
        assert_eq!(game.name, "Lucky 7s");
        assert_eq!(game.price, 5);
        assert!(!game.closed);
        assert_eq!(
            game.prize_tiers,
            vec![
                PrizeTier { amount: 100000, total_printed: 10, claimed: 2 },
                PrizeTier { amount: 5, total_printed: 50000, claimed: 1000 },
            ]
        );
        assert_eq!(winner_candidates(&games), vec![1401]);
    }

    #[test]
    fn test_shell_comes_from_first_row() {
        let text = feed(&[
            "2001,First Name,06/30/2026,$10,$500,20,1",
            "2001,Second Name,,$20,$50,200,3",
        ]);
        let games = parse_prize_feed(&text);
        let game = &games[&2001];
        assert_eq!(game.name, "First Name");
        assert_eq!(game.price, 10);
        assert!(game.closed);
        assert_eq!(game.close_date, "06/30/2026");
        assert_eq!(game.prize_tiers.len(), 2);
    }

    #[test]
    fn test_total_row_is_not_a_tier() {
        let text = feed(&[
            "1500,Big Money,,$2,TOTAL,\"1,000,000\",\"250,000\"",
            "1500,Big Money,,$2,total,\"1,000,000\",\"250,000\"",
            "1500,Big Money,,$2,$2,\"100,000\",\"40,000\"",
        ]);
        let games = parse_prize_feed(&text);
        let game = &games[&1500];
        assert_eq!(game.prize_tiers.len(), 1);
        assert_eq!(game.prize_tiers[0].amount, 2);
        assert_eq!(game.total_tickets, 0);
    }

    #[test]
    fn test_total_row_alone_still_creates_shell() {
        let games = parse_prize_feed(&feed(&["1600,Shell Only,,$1,TOTAL,100,10"]));
        assert!(games[&1600].prize_tiers.is_empty());
        assert!(winner_candidates(&games).is_empty());
    }

    #[test]
    fn test_zero_tiers_are_dropped() {
        let text = feed(&[
            "1700,Noise,,$3,$0,10,1",
            "1700,Noise,,$3,$100,0,0",
            "1700,Noise,,$3,,,",
            "1700,Noise,,$3,$30,5,0",
        ]);
        let games = parse_prize_feed(&text);
        assert_eq!(games[&1700].prize_tiers.len(), 1);
        assert_eq!(games[&1700].prize_tiers[0].amount, 30);
    }

    #[test]
    fn test_non_numeric_game_numbers_are_skipped() {
        let text = feed(&[
            "Total,,,,,,",
            "14O1,Typo,,$5,$5,10,1",
            "0,Zero,,$5,$5,10,1",
            ",Blank,,$5,$5,10,1",
            "1800,Real,,$5,$5,10,1",
        ]);
        let games = parse_prize_feed(&text);
        assert_eq!(games.keys().copied().collect::<Vec<_>>(), vec![1800]);
    }

    #[test]
    fn test_tiers_sorted_descending_stable() {
        let text = feed(&[
            "1900,Sorted,,$5,$5,100,1",
            "1900,Sorted,,$5,$500,2,0",
            "1900,Sorted,,$5,$5,300,3",
            "1900,Sorted,,$5,$50,20,2",
        ]);
        let games = parse_prize_feed(&text);
        let tiers: Vec<(u64, u64)> = games[&1900]
            .prize_tiers
            .iter()
            .map(|t| (t.amount, t.total_printed))
            .collect();
        assert_eq!(tiers, vec![(500, 2), (50, 20), (5, 100), (5, 300)]);
        assert!(winner_candidates(&games).is_empty());
    }

    #[test]
    fn test_claimed_above_printed_is_kept() {
        let games = parse_prize_feed(&feed(&["2100,Odd,,$1,$10,5,9"]));
        assert_eq!(games[&2100].prize_tiers[0].claimed, 9);
    }
}
