//! JSON snapshot documents written at the end of a sync

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::games::GameMap;
use crate::types::GameRecord;
use crate::winners::{winner_count, WinnerMap};

pub const FEED_FILE: &str = "feed.json";
pub const WINNERS_FILE: &str = "wdata.json";
pub const RAW_FEED_FILE: &str = "raw.csv";

/// Primary snapshot: every game plus every winner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub updated: String,
    pub game_count: usize,
    pub games: Vec<GameRecord>,
    pub winners: WinnerMap,
    pub winner_count: usize,
}

/// Winners-only snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WinnersSnapshot {
    pub updated: String,
    pub winners: WinnerMap,
}

/// Human-readable UTC timestamp, e.g. "2026-10-16 14:05 UTC"
pub fn format_updated(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M UTC").to_string()
}

impl Snapshot {
    /// Games are listed in ascending game-number order
    pub fn assemble(games: &GameMap, winners: WinnerMap, updated: String) -> Self {
        Self {
            updated,
            game_count: games.len(),
            games: games.values().cloned().collect(),
            winner_count: winner_count(&winners),
            winners,
        }
    }

    pub fn winners_only(&self) -> WinnersSnapshot {
        WinnersSnapshot {
            updated: self.updated.clone(),
            winners: self.winners.clone(),
        }
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string(value)?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}

/// Overwrite the snapshot files (and the raw prize feed, when there is one)
/// in `out_dir`. Returns the written paths.
pub fn write_snapshots(out_dir: &Path, snapshot: &Snapshot, raw_feed: Option<&str>) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create {}", out_dir.display()))?;

    let mut written = Vec::new();

    if let Some(raw) = raw_feed {
        let path = out_dir.join(RAW_FEED_FILE);
        fs::write(&path, raw).with_context(|| format!("Failed to write {}", path.display()))?;
        written.push(path);
    }

    let feed_path = out_dir.join(FEED_FILE);
    write_json(&feed_path, snapshot)?;
    written.push(feed_path);

    let winners_path = out_dir.join(WINNERS_FILE);
    write_json(&winners_path, &snapshot.winners_only())?;
    written.push(winners_path);

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::WinnerRecord;
    use chrono::TimeZone;

    fn sample() -> Snapshot {
        let mut games = GameMap::new();
        games.insert(1402, GameRecord::new(1402));
        games.insert(1401, GameRecord::new(1401));

        let mut winners = WinnerMap::new();
        let w = WinnerRecord {
            date_claimed: "01/15/2026".to_string(),
            retailer_name: "Corner Store".to_string(),
            retailer_address: "1 Main St".to_string(),
            retailer_city: "Austin".to_string(),
            retailer_zip: "78701".to_string(),
            pack_number: 12,
            ticket_number: 3,
        };
        winners.insert("1401".to_string(), vec![w.clone(), w]);

        Snapshot::assemble(&games, winners, "2026-10-16 14:05 UTC".to_string())
    }

    #[test]
    fn test_format_updated() {
        let at = Utc.with_ymd_and_hms(2026, 10, 16, 14, 5, 59).unwrap();
        assert_eq!(format_updated(at), "2026-10-16 14:05 UTC");
    }

    #[test]
    fn test_assemble_counts_and_order() {
        let snapshot = sample();
        assert_eq!(snapshot.game_count, 2);
        assert_eq!(snapshot.winner_count, 2);
        let order: Vec<u32> = snapshot.games.iter().map(|g| g.game_number).collect();
        assert_eq!(order, vec![1401, 1402]);
    }

    #[test]
    fn test_write_snapshots() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("data");
        let snapshot = sample();

        let written = write_snapshots(&out, &snapshot, Some("Game Number\n")).unwrap();
        assert_eq!(written.len(), 3);
        assert_eq!(fs::read_to_string(out.join(RAW_FEED_FILE)).unwrap(), "Game Number\n");

        let feed: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(out.join(FEED_FILE)).unwrap()).unwrap();
        assert_eq!(feed["game_count"], 2);
        assert_eq!(feed["winner_count"], 2);
        assert_eq!(feed["games"][0]["gameNumber"], 1401);
        assert_eq!(feed["winners"]["1401"][0]["retailerName"], "Corner Store");

        let wdata: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(out.join(WINNERS_FILE)).unwrap()).unwrap();
        assert_eq!(wdata["updated"], "2026-10-16 14:05 UTC");
        assert!(wdata.get("games").is_none());
    }

    #[test]
    fn test_write_snapshots_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = sample();
        fs::write(dir.path().join(FEED_FILE), "stale content that is longer than before").unwrap();

        let written = write_snapshots(dir.path(), &snapshot, None).unwrap();
        assert_eq!(written.len(), 2);
        let text = fs::read_to_string(dir.path().join(FEED_FILE)).unwrap();
        assert!(text.starts_with('{'));
        assert!(!text.contains("stale"));
    }
}
