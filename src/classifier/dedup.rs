// src/classifier/dedup.rs - Sliding-window state for the dedup rules

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

/// Entries older than this are never matched against.
pub const DEDUP_WINDOW_MS: i64 = 60_000;

/// Messages shorter than this (post-normalization, in characters) are not
/// tracked for copy-paste detection.
pub const PASTE_MIN_CHARS: usize = 50;

#[derive(Debug, Clone)]
struct CacheEntry {
    text: String,
    seen: DateTime<Utc>,
}

/// Global window of recent large messages for copy-paste detection. Size is
/// bounded by the time window: expired entries are pruned on every access.
#[derive(Debug, Default)]
pub struct PasteWindow {
    entries: Vec<CacheEntry>,
}

impl PasteWindow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Test-and-record: prune expired entries, report whether the normalized
    /// text duplicates a live entry, and track the message when it is large
    /// enough. Matched messages are still recorded, so every copy in a burst
    /// of duplicates flags, not just the second one.
    pub fn observe(&mut self, normalized: &str, now: DateTime<Utc>) -> bool {
        let cutoff = now - Duration::milliseconds(DEDUP_WINDOW_MS);
        self.entries.retain(|entry| entry.seen > cutoff);

        if normalized.chars().count() < PASTE_MIN_CHARS {
            return false;
        }

        let duplicate = self.entries.iter().any(|entry| entry.text == normalized);
        self.entries.push(CacheEntry {
            text: normalized.to_string(),
            seen: now,
        });
        duplicate
    }
}

/// Most recent message per sender, for repeat detection.
#[derive(Debug, Default)]
pub struct RepeatWindow {
    last: HashMap<String, CacheEntry>,
}

impl RepeatWindow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.last.clear();
    }

    /// Test-and-record: report whether the sender repeated their previous
    /// message inside the window, then unconditionally store the current one.
    /// Three identical messages 10 s apart therefore each match against the
    /// previous one, not the first.
    pub fn observe(&mut self, user_id: &str, normalized: &str, now: DateTime<Utc>) -> bool {
        let repeated = self.last.get(user_id).is_some_and(|entry| {
            entry.text == normalized && now - entry.seen < Duration::milliseconds(DEDUP_WINDOW_MS)
        });
        self.last.insert(
            user_id.to_string(),
            CacheEntry {
                text: normalized.to_string(),
                seen: now,
            },
        );
        repeated
    }
}
