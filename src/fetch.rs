//! Blocking HTTP fetches with linear backoff and an optional response cache

use anyhow::{Context, Result};
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::thread;
use std::time::Duration;

use crate::{FETCH_ATTEMPTS, FETCH_BACKOFF, FETCH_TIMEOUT, USER_AGENT};

/// Anything that can turn a URL into text.
///
/// `None` means the resource is absent for this run: every failure mode
/// (timeout, connection error, error status, retries exhausted) ends there.
pub trait Fetch {
    fn fetch(&self, url: &str) -> Option<String>;
}

pub struct HttpFetcher {
    client: reqwest::blocking::Client,
    attempts: u32,
    backoff: Duration,
    cache_dir: Option<PathBuf>,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(FETCH_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            attempts: FETCH_ATTEMPTS,
            backoff: FETCH_BACKOFF,
            cache_dir: None,
        })
    }

    /// Replay responses from `dir` when present and store fresh ones there
    pub fn with_cache(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(dir.into());
        self
    }

    fn cache_path(&self, url: &str) -> Option<PathBuf> {
        let dir = self.cache_dir.as_ref()?;
        let url = url.split('?').next().unwrap_or(url);
        let stripped = url
            .strip_prefix("https://")
            .or_else(|| url.strip_prefix("http://"))
            .unwrap_or(url);
        // Hrefs come from remote pages; anything but plain segments stays uncached
        let relative = Path::new(stripped);
        if !relative.components().all(|c| matches!(c, Component::Normal(_) | Component::CurDir)) {
            log::debug!("Not caching {}", url);
            return None;
        }
        Some(dir.join(relative))
    }

    fn load_cached(&self, url: &str) -> Option<String> {
        let path = self.cache_path(url)?;
        let text = fs::read_to_string(&path).ok()?;
        log::debug!("Loaded from cache: {}", path.display());
        Some(text)
    }

    fn store_cached(&self, url: &str, text: &str) -> Result<()> {
        let Some(path) = self.cache_path(url) else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, text).with_context(|| format!("Failed to write cache: {:?}", path))?;
        Ok(())
    }

    fn get_once(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .with_context(|| format!("Failed to fetch: {}", url))?
            .error_for_status()?;
        let bytes = response
            .bytes()
            .with_context(|| format!("Failed to read response: {}", url))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, url: &str) -> Option<String> {
        if let Some(text) = self.load_cached(url) {
            return Some(text);
        }

        for attempt in 1..=self.attempts {
            match self.get_once(url) {
                Ok(text) => {
                    if let Err(e) = self.store_cached(url, &text) {
                        log::warn!("{:#}", e);
                    }
                    return Some(text);
                }
                Err(e) => {
                    log::warn!("Retry {}/{} for {}: {:#}", attempt, self.attempts, url, e);
                    if attempt < self.attempts {
                        thread::sleep(self.backoff * attempt);
                    }
                }
            }
        }
        None
    }
}

/// Canned responses keyed by URL, for driving the pipeline without a network
#[cfg(test)]
#[derive(Debug, Default, Clone)]
pub struct StaticFetcher {
    responses: std::collections::HashMap<String, String>,
}

#[cfg(test)]
impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.responses.insert(url.into(), body.into());
        self
    }
}

#[cfg(test)]
impl Fetch for StaticFetcher {
    fn fetch(&self, url: &str) -> Option<String> {
        self.responses.get(url).cloned()
    }
}

/// Pause between successive per-game fetches
pub fn throttle(delay: Duration) {
    if !delay.is_zero() {
        thread::sleep(delay);
    }
}
