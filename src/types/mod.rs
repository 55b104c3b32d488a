// src/types/mod.rs - Message model and classification verdicts

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// A single chat message as delivered by a platform connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub platform: String,
    pub channel: String,
    /// Login name extracted from the IRC prefix.
    pub username: String,
    pub display_name: Option<String>,
    pub content: String,
    pub tags: Tags,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// System events (USERNOTICE) such as subscriptions and gift subs.
    pub is_system: bool,
}

/// Raw protocol tags attached to a message (`@key=value;...` on Twitch IRC).
///
/// All keys are kept verbatim; the typed accessors cover the tags the
/// classification rules care about. Missing or malformed values degrade to
/// `None` so individual rules fall back to "no match" instead of erroring.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Tags(HashMap<String, String>);

impl Tags {
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn display_name(&self) -> Option<&str> {
        self.get("display-name").filter(|v| !v.is_empty())
    }

    /// Stable sender identity used by the user-repeat rule.
    pub fn user_id(&self) -> Option<&str> {
        self.get("user-id").filter(|v| !v.is_empty())
    }

    /// Message-type id for system events (`msg-id` on USERNOTICE lines).
    pub fn message_type(&self) -> Option<&str> {
        self.get("msg-id").filter(|v| !v.is_empty())
    }

    pub fn color(&self) -> Option<&str> {
        self.get("color").filter(|v| !v.is_empty())
    }

    /// Extract the set of emote token strings referenced by the native
    /// `emotes` tag (`id:start-end,start-end/id:...`).
    ///
    /// Offsets are character indices into the message content, inclusive on
    /// both ends. Out-of-range or malformed ranges are skipped.
    pub fn native_emotes(&self, content: &str) -> HashSet<String> {
        let mut tokens = HashSet::new();
        let ranges = match self.get("emotes").filter(|v| !v.is_empty()) {
            Some(ranges) => ranges,
            None => return tokens,
        };

        let chars: Vec<char> = content.chars().collect();
        for group in ranges.split('/') {
            let positions = match group.splitn(2, ':').nth(1) {
                Some(positions) => positions,
                None => continue,
            };
            for range in positions.split(',') {
                let mut bounds = range.splitn(2, '-');
                let start = bounds.next().and_then(|s| s.parse::<usize>().ok());
                let end = bounds.next().and_then(|s| s.parse::<usize>().ok());
                if let (Some(start), Some(end)) = (start, end) {
                    if start <= end && end < chars.len() {
                        tokens.insert(chars[start..=end].iter().collect());
                    }
                }
            }
        }
        tokens
    }
}

/// Stable key identifying a classification rule. The set is fixed at compile
/// time; only the per-call enabled flags vary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleKey {
    SingleChar,
    GiftedSub,
    UserRepeat,
    BotMessage,
    Mentions,
    ForeignLang,
    ReservedChars,
    CommandOnly,
    Link,
    AllCaps,
    RepetitiveChars,
    Gibberish,
    EmoteOnly,
    Copypasta,
    Vocabulary,
}

impl RuleKey {
    /// The key as it appears in configuration files.
    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKey::SingleChar => "single_char",
            RuleKey::GiftedSub => "gifted_sub",
            RuleKey::UserRepeat => "user_repeat",
            RuleKey::BotMessage => "bot_message",
            RuleKey::Mentions => "mentions",
            RuleKey::ForeignLang => "foreign_lang",
            RuleKey::ReservedChars => "reserved_chars",
            RuleKey::CommandOnly => "command_only",
            RuleKey::Link => "link",
            RuleKey::AllCaps => "all_caps",
            RuleKey::RepetitiveChars => "repetitive_chars",
            RuleKey::Gibberish => "gibberish",
            RuleKey::EmoteOnly => "emote_only",
            RuleKey::Copypasta => "copypasta",
            RuleKey::Vocabulary => "vocabulary",
        }
    }
}

impl fmt::Display for RuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered rule: stable key, human-readable label, optional description.
/// Registration order is the evaluation order and therefore the tie-break for
/// which reason is reported when several rules would match.
#[derive(Debug, Clone, Copy)]
pub struct RuleDefinition {
    pub key: RuleKey,
    pub label: &'static str,
    pub description: Option<&'static str>,
}

/// Per-call rule configuration. Keys absent from the map default to enabled.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleToggles(HashMap<String, bool>);

impl RuleToggles {
    /// Every rule enabled (the empty map).
    pub fn all_enabled() -> Self {
        Self::default()
    }

    pub fn from_map(map: HashMap<String, bool>) -> Self {
        Self(map)
    }

    pub fn set(&mut self, key: RuleKey, enabled: bool) {
        self.0.insert(key.as_str().to_string(), enabled);
    }

    pub fn is_enabled(&self, key: RuleKey) -> bool {
        self.0.get(key.as_str()).copied().unwrap_or(true)
    }
}

/// Why a message was routed to the spam stream. One tag per rule; the
/// presentation layer consumes these as a closed, stable enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpamReason {
    SingleChar,
    GiftedSub,
    Repeat,
    Bot,
    Mention,
    Foreign,
    ReservedChars,
    Command,
    Link,
    Caps,
    Flood,
    Gibberish,
    EmoteOnly,
    DuplicatePaste,
}

impl SpamReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpamReason::SingleChar => "single-char",
            SpamReason::GiftedSub => "gifted-sub",
            SpamReason::Repeat => "repeat",
            SpamReason::Bot => "bot",
            SpamReason::Mention => "mention",
            SpamReason::Foreign => "foreign",
            SpamReason::ReservedChars => "reserved-chars",
            SpamReason::Command => "command",
            SpamReason::Link => "link",
            SpamReason::Caps => "caps",
            SpamReason::Flood => "flood",
            SpamReason::Gibberish => "gibberish",
            SpamReason::EmoteOnly => "emote-only",
            SpamReason::DuplicatePaste => "duplicate-paste",
        }
    }
}

impl fmt::Display for SpamReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A vocabulary word found in a message, with its suggested replacement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyHit {
    pub word: String,
    pub suggestion: String,
}

/// Result of the spam pipeline: the reason tag of the first matching rule
/// plus rule-specific auxiliary data (vocabulary word swaps, when that rule
/// produced the verdict).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpamVerdict {
    pub reason: SpamReason,
    pub words: Vec<VocabularyHit>,
}

impl SpamVerdict {
    pub fn new(reason: SpamReason) -> Self {
        Self {
            reason,
            words: Vec::new(),
        }
    }
}

/// Whether a message addresses the viewer or the channel directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MentionKind {
    None,
    Viewer,
    Channel,
}

/// Non-redirecting annotation attached to primary-stream messages: mention
/// kind plus any vocabulary words worth highlighting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Highlight {
    pub mention: MentionKind,
    pub words: Vec<VocabularyHit>,
}

impl Highlight {
    pub fn none() -> Self {
        Self {
            mention: MentionKind::None,
            words: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags_with(key: &str, value: &str) -> Tags {
        let mut tags = Tags::new();
        tags.insert(key, value);
        tags
    }

    #[test]
    fn native_emotes_extracts_ranges_by_char_index() {
        let tags = tags_with("emotes", "25:0-4/1902:6-9");
        let tokens = tags.native_emotes("Kappa Keepo");
        assert!(tokens.contains("Kappa"));
        assert!(tokens.contains("Keep"));
        assert_eq!(tokens.len(), 2);
    }

    #[test]
    fn native_emotes_handles_multibyte_content() {
        // "ха " is three chars before the emote; byte offsets would misfire
        let tags = tags_with("emotes", "25:3-7");
        let tokens = tags.native_emotes("ха Kappa");
        assert!(tokens.contains("Kappa"));
    }

    #[test]
    fn native_emotes_skips_malformed_ranges() {
        let tags = tags_with("emotes", "25:zz-4,90-10,5-999/nocolon");
        assert!(tags.native_emotes("short text").is_empty());
    }

    #[test]
    fn native_emotes_empty_without_tag() {
        assert!(Tags::new().native_emotes("Kappa").is_empty());
    }

    #[test]
    fn toggles_default_to_enabled() {
        let toggles = RuleToggles::all_enabled();
        assert!(toggles.is_enabled(RuleKey::Copypasta));

        let mut toggles = RuleToggles::all_enabled();
        toggles.set(RuleKey::Copypasta, false);
        assert!(!toggles.is_enabled(RuleKey::Copypasta));
        assert!(toggles.is_enabled(RuleKey::Link));
    }

    #[test]
    fn display_name_ignores_empty_values() {
        let tags = tags_with("display-name", "");
        assert_eq!(tags.display_name(), None);
    }
}
