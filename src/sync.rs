use anyhow::{bail, Result};
use chrono::Utc;
use std::path::PathBuf;
use std::time::Duration;

use crate::detail::{discover_detail_urls, merge_detail_html, DetailReport};
use crate::fetch::{throttle, Fetch, HttpFetcher};
use crate::games::{parse_prize_feed, winner_candidates, GameMap};
use crate::listing::parse_listing_page;
use crate::snapshot::{format_updated, write_snapshots, Snapshot};
use crate::utils::osc8_file_link;
use crate::winners::collect_winners;
use crate::{DEFAULT_OUTPUT_DIR, FETCH_THROTTLE, INDEX_PAGE_URL, PRIZE_FEED_URL, SOURCE_BASE};

/// Knobs for one sync run; the defaults give the parameterless behaviour
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub output_dir: PathBuf,
    /// Pause between successive per-game fetches
    pub delay: Duration,
    pub cache_dir: Option<PathBuf>,
    pub fetch_details: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            delay: FETCH_THROTTLE,
            cache_dir: None,
            fetch_details: true,
        }
    }
}

/// Where the base game map came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameSource {
    PrizeFeed,
    Listing,
}

#[derive(Debug, Clone)]
pub struct SyncOutcome {
    pub snapshot: Snapshot,
    pub source: GameSource,
    /// Prize feed text exactly as fetched, kept for auditing
    pub raw_feed: Option<String>,
    pub details: DetailReport,
    pub winner_candidates: usize,
}

pub fn winner_feed_url(game_number: u32) -> String {
    format!("{}retailerswhosoldtopprizes{}.csv", SOURCE_BASE, game_number)
}

/// Games still carrying "unknown" for the detail-page fields
fn count_incomplete(games: &GameMap) -> (usize, usize) {
    let missing_totals = games.values().filter(|g| g.total_tickets == 0).count();
    let missing_odds = games.values().filter(|g| g.overall_odds == 0.0).count();
    (missing_totals, missing_odds)
}

fn enrich_from_details<F: Fetch>(
    fetcher: &F,
    listing: Option<&str>,
    games: &mut GameMap,
    delay: Duration,
) -> DetailReport {
    let mut report = DetailReport::default();
    let Some(listing) = listing else {
        log::warn!("Listing page unavailable, skipping detail pages");
        return report;
    };

    let urls = discover_detail_urls(listing);
    log::info!("Fetching {} detail pages...", urls.len());
    for url in &urls {
        match fetcher.fetch(url) {
            Some(html) => merge_detail_html(games, &html, &mut report),
            None => log::warn!("No detail page at {}", url),
        }
        throttle(delay);
    }
    report
}

/// Fetch, build, enrich and assemble, without touching the filesystem.
///
/// Fails only when neither the prize feed nor the listing page yields a
/// single game.
pub fn run_pipeline<F: Fetch>(fetcher: &F, config: &SyncConfig, updated: String) -> Result<SyncOutcome> {
    log::info!("Fetching prize feed...");
    let raw_feed = fetcher.fetch(PRIZE_FEED_URL);
    let mut games = raw_feed.as_deref().map(parse_prize_feed).unwrap_or_default();
    let mut source = GameSource::PrizeFeed;
    if raw_feed.is_some() {
        log::info!("  Parsed {} games from prize feed", games.len());
    }

    let listing = if games.is_empty() || config.fetch_details {
        fetcher.fetch(INDEX_PAGE_URL)
    } else {
        None
    };

    if games.is_empty() {
        log::warn!("Prize feed unavailable or empty, trying listing page...");
        if let Some(page) = listing.as_deref() {
            games = parse_listing_page(page);
            source = GameSource::Listing;
            log::info!("  Parsed {} games from listing page", games.len());
        }
    }

    if games.is_empty() {
        bail!("No game data retrieved from prize feed or listing page");
    }

    let details = if config.fetch_details {
        enrich_from_details(fetcher, listing.as_deref(), &mut games, config.delay)
    } else {
        DetailReport::default()
    };
    let (missing_totals, missing_odds) = count_incomplete(&games);
    log::info!(
        "Detail pages: {} fetched, {} merged, {} unmatched, {} unidentified",
        details.fetched,
        details.merged,
        details.unmatched,
        details.unidentified
    );
    if missing_totals > 0 || missing_odds > 0 {
        log::warn!(
            "{} games missing total tickets, {} missing overall odds",
            missing_totals,
            missing_odds
        );
    }

    let candidates = winner_candidates(&games);
    log::info!("Games with claimed top prizes: {}", candidates.len());
    let winners = collect_winners(&candidates, |gn| {
        let text = fetcher.fetch(&winner_feed_url(gn));
        throttle(config.delay);
        text
    });
    log::info!("  Got winners for {} games", winners.len());

    Ok(SyncOutcome {
        snapshot: Snapshot::assemble(&games, winners, updated),
        source,
        raw_feed,
        details,
        winner_candidates: candidates.len(),
    })
}

pub fn run_sync(config: &SyncConfig) -> Result<()> {
    let updated = format_updated(Utc::now());
    log::info!("=== Feed sync - {} ===", updated);

    let mut fetcher = HttpFetcher::new()?;
    if let Some(dir) = &config.cache_dir {
        fetcher = fetcher.with_cache(dir);
    }

    let outcome = run_pipeline(&fetcher, config, updated)?;
    // The raw artifact is the prize feed; listing-page runs have none worth keeping
    let raw = match outcome.source {
        GameSource::PrizeFeed => outcome.raw_feed.as_deref(),
        GameSource::Listing => None,
    };
    let written = write_snapshots(&config.output_dir, &outcome.snapshot, raw)?;

    for path in &written {
        let display = path.to_string_lossy();
        println!("Saved {}", osc8_file_link(&display, &display));
    }
    println!(
        "Done: {} games ({} enriched from detail pages), {} winner records ({} candidates)",
        outcome.snapshot.game_count,
        outcome.details.merged,
        outcome.snapshot.winner_count,
        outcome.winner_candidates
    );
    Ok(())
}
