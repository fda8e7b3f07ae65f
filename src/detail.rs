//! Enriching game records from per-game detail pages
//!
//! Each scalar field has its own pattern rule over the flattened page text.
//! Rules are independent: a page that only matches some of them still
//! contributes what it can, and tuning one pattern never touches the others.

use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;

use crate::coerce::{coerce_float, coerce_int};
use crate::games::GameMap;
use crate::{SITE_ROOT, SOURCE_BASE};

static GAME_NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)game\s*(?:no\.?|number|#)\s*:?\s*(\d{3,5})\b").expect("valid game number regex")
});

static TOTAL_TICKETS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)total\s+tickets\s*:?\s*([\d,]+)").expect("valid total tickets regex")
});

/// Unlabelled "N tickets"; group 2 marks a per-pack count
static TICKET_COUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([\d,]{4,})\*?\s+tickets(\s+per\s+pack)?").expect("valid ticket count regex")
});

static PACK_SIZE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)pack\s+size\s*:?\s*([\d,]+)|([\d,]+)\s+tickets\s+per\s+pack")
        .expect("valid pack size regex")
});

static GUARANTEED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)guaranteed[^$]{0,60}\$([\d,]+)").expect("valid guaranteed floor regex")
});

static OVERALL_ODDS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)overall\s+odds.{0,80}?\b1\s+in\s+([\d,]+(?:\.\d+)?)")
        .expect("valid overall odds regex")
});

/// Scalar fields a detail page can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailField {
    GameNumber,
    TotalTickets,
    PackSize,
    GuaranteedFloor,
    OverallOdds,
}

impl DetailField {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetailField::GameNumber => "gameNumber",
            DetailField::TotalTickets => "totalTickets",
            DetailField::PackSize => "packSize",
            DetailField::GuaranteedFloor => "guaranteedFloor",
            DetailField::OverallOdds => "overallOdds",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DetailValue {
    Int(u64),
    Float(f64),
}

type Extractor = fn(&str) -> Option<DetailValue>;

/// First non-empty capture group of the first match
fn first_capture<'t>(re: &Regex, text: &'t str) -> Option<&'t str> {
    let caps = re.captures(text)?;
    caps.iter().skip(1).flatten().map(|m| m.as_str()).next()
}

fn int_rule(re: &Regex, text: &str) -> Option<DetailValue> {
    first_capture(re, text).map(|s| DetailValue::Int(coerce_int(s)))
}

fn extract_game_number(text: &str) -> Option<DetailValue> {
    int_rule(&GAME_NUMBER_RE, text)
}

fn extract_total_tickets(text: &str) -> Option<DetailValue> {
    int_rule(&TOTAL_TICKETS_RE, text).or_else(|| {
        TICKET_COUNT_RE
            .captures_iter(text)
            .find(|caps| caps.get(2).is_none())
            .and_then(|caps| caps.get(1))
            .map(|m| DetailValue::Int(coerce_int(m.as_str())))
    })
}

fn extract_pack_size(text: &str) -> Option<DetailValue> {
    int_rule(&PACK_SIZE_RE, text)
}

fn extract_guaranteed_floor(text: &str) -> Option<DetailValue> {
    int_rule(&GUARANTEED_RE, text)
}

fn extract_overall_odds(text: &str) -> Option<DetailValue> {
    first_capture(&OVERALL_ODDS_RE, text).map(|s| DetailValue::Float(coerce_float(s)))
}

const RULES: &[(DetailField, Extractor)] = &[
    (DetailField::GameNumber, extract_game_number),
    (DetailField::TotalTickets, extract_total_tickets),
    (DetailField::PackSize, extract_pack_size),
    (DetailField::GuaranteedFloor, extract_guaranteed_floor),
    (DetailField::OverallOdds, extract_overall_odds),
];

/// What one detail page yielded; `None` means the pattern did not match
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetailPage {
    pub game_number: Option<u32>,
    pub total_tickets: Option<u64>,
    pub pack_size: Option<u64>,
    pub guaranteed_floor: Option<u64>,
    pub overall_odds: Option<f64>,
}

impl DetailPage {
    fn set(&mut self, field: DetailField, value: DetailValue) {
        match (field, value) {
            (DetailField::GameNumber, DetailValue::Int(v)) => {
                self.game_number = u32::try_from(v).ok();
            }
            (DetailField::TotalTickets, DetailValue::Int(v)) => self.total_tickets = Some(v),
            (DetailField::PackSize, DetailValue::Int(v)) => self.pack_size = Some(v),
            (DetailField::GuaranteedFloor, DetailValue::Int(v)) => self.guaranteed_floor = Some(v),
            (DetailField::OverallOdds, DetailValue::Float(v)) => self.overall_odds = Some(v),
            (field, value) => {
                log::debug!("Ignoring {:?} for {}", value, field.as_str());
            }
        }
    }
}

/// Run every field rule over already-flattened page text
pub fn extract_details(text: &str) -> DetailPage {
    let mut page = DetailPage::default();
    for (field, extract) in RULES {
        if let Some(value) = extract(text) {
            page.set(*field, value);
        }
    }
    page
}

/// Outcome of merging one page into the game map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Merged(u32),
    /// Page names a game the prize feed does not know about
    Unmatched(u32),
    /// No game number could be read from the page
    Unidentified,
}

fn merge_int(slot: &mut u64, value: Option<u64>) {
    if let Some(v) = value.filter(|v| *v > 0) {
        *slot = v;
    }
}

/// Merge a page into its game. Only non-zero values are written, so a page
/// that half-matches can never downgrade a known field back to unknown.
/// Detail pages never create games.
pub fn merge_detail(games: &mut GameMap, page: &DetailPage) -> MergeOutcome {
    let Some(gn) = page.game_number else {
        return MergeOutcome::Unidentified;
    };
    let Some(game) = games.get_mut(&gn) else {
        return MergeOutcome::Unmatched(gn);
    };

    merge_int(&mut game.total_tickets, page.total_tickets);
    merge_int(&mut game.pack_size, page.pack_size);
    merge_int(&mut game.guaranteed_floor, page.guaranteed_floor);
    if let Some(odds) = page.overall_odds.filter(|o| *o > 0.0) {
        game.overall_odds = odds;
    }
    MergeOutcome::Merged(gn)
}

/// Tally of a detail merge pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailReport {
    pub fetched: usize,
    pub merged: usize,
    pub unmatched: usize,
    pub unidentified: usize,
}

/// Flatten HTML to whitespace-normalized text, leaving out script and style
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut parts: Vec<&str> = Vec::new();
    for node in document.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|a| {
            a.value()
                .as_element()
                .map_or(false, |e| matches!(e.name(), "script" | "style"))
        });
        if !hidden {
            parts.push(&**text);
        }
    }
    let text = parts.join(" ");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Extract, merge and log one fetched detail page
pub fn merge_detail_html(games: &mut GameMap, html: &str, report: &mut DetailReport) {
    report.fetched += 1;
    let page = extract_details(&html_to_text(html));
    match merge_detail(games, &page) {
        MergeOutcome::Merged(gn) => {
            log::debug!("Detail #{} merged: {:?}", gn, page);
            report.merged += 1;
        }
        MergeOutcome::Unmatched(gn) => {
            log::warn!("Detail page for unknown game #{}, ignoring", gn);
            report.unmatched += 1;
        }
        MergeOutcome::Unidentified => {
            log::warn!("Detail page without a game number, ignoring");
            report.unidentified += 1;
        }
    }
}

fn resolve_url(href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else if let Some(path) = href.strip_prefix('/') {
        format!("{}/{}", SITE_ROOT, path)
    } else {
        format!("{}{}", SOURCE_BASE, href)
    }
}

/// Detail page links found on the listing page, absolute, in document order
pub fn discover_detail_urls(listing_html: &str) -> Vec<String> {
    let document = Html::parse_document(listing_html);
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    document
        .select(&selector)
        .filter_map(|a| a.value().attr("href"))
        .map(str::trim)
        .filter(|href| href.contains("details.html"))
        .map(resolve_url)
        .filter(|url| seen.insert(url.clone()))
        .collect()
}
