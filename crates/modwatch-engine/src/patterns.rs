//! Coordinated-threat detection
//!
//! Tracks recent text traffic per chat and flags shapes no single-message
//! verdict can see: several accounts posting near-identical content, a
//! message flood, or many low-diversity links.

use modwatch_core::ContentItem;
use parking_lot::Mutex;
use regex::Regex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::OnceLock;
use std::time::Duration;
use tokio::time::Instant;

/// Per-chat history bound
const HISTORY_LIMIT: usize = 1000;

/// Jaccard similarity at which two messages count as the same content
const SIMILARITY_THRESHOLD: f64 = 0.8;

/// Distinct sources required to call similar content coordinated
const COORDINATED_SOURCES: usize = 3;

/// Message-flood gate: this many messages inside one minute
const FLOOD_WINDOW: Duration = Duration::from_secs(60);
const FLOOD_MESSAGE_LIMIT: usize = 50;

/// Link-farming gate
const LINK_MESSAGE_LIMIT: usize = 10;

fn link_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"https?://\S+|www\.\S+|t\.me/\S+").expect("hard-coded regex compiles")
    })
}

/// Kind of coordinated threat detected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreatKind {
    CoordinatedSpam,
    MessageFlood,
    LinkFarming,
}

/// A detected threat pattern in one chat
#[derive(Debug, Clone)]
pub struct ThreatPattern {
    pub kind: ThreatKind,
    pub confidence: f32,
    /// Sources involved in the pattern
    pub sources: Vec<String>,
}

struct TrackedMessage {
    source_id: String,
    words: HashSet<String>,
    links: Vec<String>,
    at: Instant,
}

/// Bounded per-chat traffic history with pattern detection
pub struct ThreatDetector {
    window: Duration,
    history: Mutex<HashMap<String, VecDeque<TrackedMessage>>>,
}

impl ThreatDetector {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            history: Mutex::new(HashMap::new()),
        }
    }

    /// Record a text item; media items are not tracked
    pub fn track(&self, item: &ContentItem) {
        let Some(text) = item.text_body() else {
            return;
        };

        let words: HashSet<String> = text
            .split_whitespace()
            .map(|w| w.to_lowercase())
            .collect();
        let links: Vec<String> = link_re()
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect();

        let mut history = self.history.lock();
        let queue = history.entry(item.chat_id.clone()).or_default();
        queue.push_back(TrackedMessage {
            source_id: item.source_id.clone(),
            words,
            links,
            at: Instant::now(),
        });
        while queue.len() > HISTORY_LIMIT {
            queue.pop_front();
        }
    }

    /// Detect threat patterns in one chat's recent window
    pub fn detect(&self, chat_id: &str) -> Vec<ThreatPattern> {
        let now = Instant::now();
        let history = self.history.lock();
        let Some(queue) = history.get(chat_id) else {
            return Vec::new();
        };

        let recent: Vec<&TrackedMessage> = queue
            .iter()
            .filter(|m| now.duration_since(m.at) <= self.window)
            .collect();

        let mut patterns = Vec::new();
        if let Some(p) = coordinated_spam(&recent) {
            patterns.push(p);
        }
        if let Some(p) = message_flood(&recent, now) {
            patterns.push(p);
        }
        if let Some(p) = link_farming(&recent) {
            patterns.push(p);
        }
        patterns
    }
}

/// Jaccard similarity over word sets
fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    intersection as f64 / union as f64
}

/// Several distinct sources posting near-identical content
fn coordinated_spam(recent: &[&TrackedMessage]) -> Option<ThreatPattern> {
    let mut involved: HashSet<&str> = HashSet::new();

    for (i, first) in recent.iter().enumerate() {
        for second in &recent[i + 1..] {
            if first.source_id != second.source_id
                && jaccard(&first.words, &second.words) > SIMILARITY_THRESHOLD
            {
                involved.insert(&first.source_id);
                involved.insert(&second.source_id);
            }
        }
    }

    if involved.len() >= COORDINATED_SOURCES {
        Some(ThreatPattern {
            kind: ThreatKind::CoordinatedSpam,
            confidence: 0.85,
            sources: involved.into_iter().map(str::to_string).collect(),
        })
    } else {
        None
    }
}

/// Message burst past the one-minute gate
fn message_flood(recent: &[&TrackedMessage], now: Instant) -> Option<ThreatPattern> {
    let burst: Vec<&&TrackedMessage> = recent
        .iter()
        .filter(|m| now.duration_since(m.at) <= FLOOD_WINDOW)
        .collect();

    if burst.len() > FLOOD_MESSAGE_LIMIT {
        let sources: HashSet<&str> = burst.iter().map(|m| m.source_id.as_str()).collect();
        Some(ThreatPattern {
            kind: ThreatKind::MessageFlood,
            confidence: 0.9,
            sources: sources.into_iter().map(str::to_string).collect(),
        })
    } else {
        None
    }
}

/// Many link messages with low link diversity
fn link_farming(recent: &[&TrackedMessage]) -> Option<ThreatPattern> {
    let link_messages: Vec<&&TrackedMessage> =
        recent.iter().filter(|m| !m.links.is_empty()).collect();

    if link_messages.len() <= LINK_MESSAGE_LIMIT {
        return None;
    }

    let unique_links: HashSet<&str> = link_messages
        .iter()
        .flat_map(|m| m.links.iter().map(String::as_str))
        .collect();

    if unique_links.len() * 2 < link_messages.len() {
        let sources: HashSet<&str> = link_messages
            .iter()
            .map(|m| m.source_id.as_str())
            .collect();
        Some(ThreatPattern {
            kind: ThreatKind::LinkFarming,
            confidence: 0.75,
            sources: sources.into_iter().map(str::to_string).collect(),
        })
    } else {
        None
    }
}
