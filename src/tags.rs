//! Project tag availability and alternative suggestions

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{Datelike, Utc};
use rand::Rng;
use tracing::debug;

use crate::error::ApiResult;

/// Quiet period before a typed tag is checked
pub const DEBOUNCE: Duration = Duration::from_millis(300);

const MAX_CANDIDATES: usize = 5;
const MAX_SUGGESTIONS: usize = 3;

/// Existence check for a project tag; implemented by the project service
pub trait TagLookup {
    fn tag_exists(&self, tag: &str) -> impl Future<Output = ApiResult<bool>> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagCheck {
    Empty,
    Available,
    Taken { suggestions: Vec<String> },
    /// A newer check started during the quiet period
    Superseded,
}

/// Debounced tag checker; the latest call wins
pub struct TagChecker<L> {
    lookup: L,
    generation: AtomicU64,
    delay: Duration,
}

impl<L: TagLookup> TagChecker<L> {
    pub fn new(lookup: L) -> Self {
        Self::with_delay(lookup, DEBOUNCE)
    }

    pub fn with_delay(lookup: L, delay: Duration) -> Self {
        Self {
            lookup,
            generation: AtomicU64::new(0),
            delay,
        }
    }

    pub async fn check(&self, tag: &str) -> ApiResult<TagCheck> {
        let mine = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(self.delay).await;
        if self.generation.load(Ordering::SeqCst) != mine {
            return Ok(TagCheck::Superseded);
        }

        let tag = tag.trim();
        if tag.is_empty() {
            return Ok(TagCheck::Empty);
        }
        if !self.lookup.tag_exists(tag).await? {
            return Ok(TagCheck::Available);
        }

        let suggestions = suggest_alternatives(&self.lookup, tag).await?;
        Ok(TagCheck::Taken { suggestions })
    }
}

/// Up to five variants of `base`: three fixed suffixes then random numbers
pub fn candidates<R: Rng + ?Sized>(base: &str, year: i32, rng: &mut R) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(MAX_CANDIDATES);
    let push = |candidate: String, out: &mut Vec<String>| {
        if !candidate.eq_ignore_ascii_case(base) && !out.contains(&candidate) {
            out.push(candidate);
        }
    };

    push(format!("{}-2", base), &mut out);
    push(format!("{}-v2", base), &mut out);
    push(format!("{}-{}", base, year), &mut out);

    let mut attempts = 0;
    while out.len() < MAX_CANDIDATES && attempts < 20 {
        let n: u32 = rng.random_range(100..1000);
        push(format!("{}-{}", base, n), &mut out);
        attempts += 1;
    }
    out
}

/// Check candidates one by one and keep at most three free ones
pub async fn suggest_alternatives<L: TagLookup>(lookup: &L, base: &str) -> ApiResult<Vec<String>> {
    let candidates = {
        let mut rng = rand::rng();
        candidates(base, Utc::now().year(), &mut rng)
    };

    let mut available = Vec::new();
    for candidate in candidates {
        if available.len() == MAX_SUGGESTIONS {
            break;
        }
        if !lookup.tag_exists(&candidate).await? {
            available.push(candidate);
        }
    }
    debug!(base, suggestions = ?available, "Tag suggestions");
    Ok(available)
}
