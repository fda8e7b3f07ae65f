//! Game, prize tier and winner record types with JSON serialization support

use serde::{Deserialize, Serialize};

/// One reward amount within a game's pay table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrizeTier {
    pub amount: u64,
    pub total_printed: u64,
    /// Not checked against `total_printed`; the source does not enforce it
    pub claimed: u64,
}

/// One instant game, keyed by game number
///
/// Zero / empty values mean "unknown", never an asserted value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    pub game_number: u32,
    pub name: String,
    /// Ticket price in whole dollars
    pub price: u64,
    pub closed: bool,
    pub close_date: String,
    pub total_tickets: u64,
    pub pack_size: u64,
    pub guaranteed_floor: u64,
    /// Denominator of the published "1 in N" odds
    pub overall_odds: f64,
    pub prize_tiers: Vec<PrizeTier>,
}

impl GameRecord {
    /// Empty record shell for a game number, all enrichment fields unknown
    pub fn new(game_number: u32) -> Self {
        Self {
            game_number,
            name: String::new(),
            price: 0,
            closed: false,
            close_date: String::new(),
            total_tickets: 0,
            pack_size: 0,
            guaranteed_floor: 0,
            overall_odds: 0.0,
            prize_tiers: Vec::new(),
        }
    }

    /// Highest-amount tier (tiers are kept sorted descending)
    pub fn top_tier(&self) -> Option<&PrizeTier> {
        self.prize_tiers.first()
    }

    /// Returns true when someone has claimed the top prize, which makes the
    /// game worth a round-trip to its winner feed
    pub fn has_claimed_top_prize(&self) -> bool {
        self.top_tier().map_or(false, |t| t.claimed > 0)
    }

    /// Sort tiers by amount, highest first. `sort_by` is stable so equal
    /// amounts keep their input order.
    pub fn sort_tiers(&mut self) {
        self.prize_tiers.sort_by(|a, b| b.amount.cmp(&a.amount));
    }
}

/// One claimed-prize transaction at a selling retailer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WinnerRecord {
    pub date_claimed: String,
    pub retailer_name: String,
    pub retailer_address: String,
    pub retailer_city: String,
    pub retailer_zip: String,
    pub pack_number: u64,
    pub ticket_number: u64,
}

impl WinnerRecord {
    /// A winner row is only worth keeping when we know when and where
    pub fn is_complete(&self) -> bool {
        !self.date_claimed.is_empty() && !self.retailer_name.is_empty()
    }
}
