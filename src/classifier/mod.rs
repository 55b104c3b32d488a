// src/classifier/mod.rs - The message classification engine

use chrono::{DateTime, Utc};
use log::debug;

pub mod dedup;
pub mod emotes;
pub mod rules;
pub mod text;
pub mod vocabulary;

use crate::types::{
    ChatMessage, Highlight, MentionKind, RuleKey, RuleToggles, SpamVerdict,
};

use dedup::{PasteWindow, RepeatWindow};
use emotes::EmoteResolver;
use vocabulary::VocabularyTable;

/// Classification engine for one channel session.
///
/// Owns the only mutable state in the system: the two dedup windows. All
/// other inputs are read-only per call, so a single engine behind one lock
/// (or one engine per channel) is the whole concurrency story. Calls are
/// synchronous and must be made in message order: the stateful rules make a
/// message's verdict depend on what was classified immediately before it.
pub struct ClassificationEngine {
    vocabulary: VocabularyTable,
    bot_names: Vec<String>,
    paste_window: PasteWindow,
    repeat_window: RepeatWindow,
}

impl ClassificationEngine {
    pub fn new(vocabulary: VocabularyTable, bot_names: Vec<String>) -> Self {
        Self {
            vocabulary,
            bot_names: bot_names.into_iter().map(|b| b.to_lowercase()).collect(),
            paste_window: PasteWindow::new(),
            repeat_window: RepeatWindow::new(),
        }
    }

    /// Drop all dedup state, e.g. when the viewer switches channels.
    pub fn reset(&mut self) {
        self.paste_window.clear();
        self.repeat_window.clear();
    }

    /// Run the redirect rules in registration order and return the first
    /// match. The dedup rules record the message as a side effect of being
    /// *tested*: rules behind a short-circuit or a disabled toggle neither
    /// observe nor remember the message.
    pub fn classify_spam(
        &mut self,
        message: &ChatMessage,
        viewer: &str,
        toggles: &RuleToggles,
        resolver: &dyn EmoteResolver,
    ) -> Option<SpamVerdict> {
        self.classify_spam_at(message, viewer, toggles, resolver, Utc::now())
    }

    /// `classify_spam` with an explicit clock for the sliding windows.
    pub fn classify_spam_at(
        &mut self,
        message: &ChatMessage,
        viewer: &str,
        toggles: &RuleToggles,
        resolver: &dyn EmoteResolver,
        now: DateTime<Utc>,
    ) -> Option<SpamVerdict> {
        for rule in rules::redirect_rules() {
            if !toggles.is_enabled(rule.key) {
                continue;
            }
            if self.test_rule(rule.key, message, viewer, resolver, now) {
                if let Some(reason) = rules::reason_for(rule.key) {
                    debug!(
                        "rule {} flagged message from {}: {}",
                        rule.key, message.username, message.content
                    );
                    return Some(SpamVerdict::new(reason));
                }
            }
        }
        None
    }

    /// Annotate without redirecting. Mention kind is always computed,
    /// independent of any toggle; the vocabulary rule contributes word swaps
    /// only when enabled.
    pub fn classify_highlight(
        &self,
        message: &ChatMessage,
        viewer: &str,
        toggles: &RuleToggles,
    ) -> Highlight {
        let lowered = text::normalize(&message.content).to_lowercase();
        let mention = mention_kind(&lowered, &message.channel, viewer);
        let words = if toggles.is_enabled(RuleKey::Vocabulary) {
            self.vocabulary.find_in(&message.content)
        } else {
            Vec::new()
        };
        Highlight { mention, words }
    }

    fn test_rule(
        &mut self,
        key: RuleKey,
        message: &ChatMessage,
        viewer: &str,
        resolver: &dyn EmoteResolver,
        now: DateTime<Utc>,
    ) -> bool {
        let content = &message.content;
        match key {
            RuleKey::SingleChar => rules::single_char(content, resolver),
            RuleKey::GiftedSub => rules::gifted_sub(message),
            RuleKey::UserRepeat => match message.tags.user_id() {
                Some(user_id) => {
                    self.repeat_window
                        .observe(user_id, &text::normalize(content), now)
                }
                None => false,
            },
            RuleKey::BotMessage => rules::bot_message(message, &self.bot_names),
            RuleKey::Mentions => rules::unsolicited_mention(content, &message.channel, viewer),
            RuleKey::ForeignLang => rules::foreign_lang(content),
            RuleKey::ReservedChars => rules::reserved_chars(content),
            RuleKey::CommandOnly => rules::command_only(content),
            RuleKey::Link => rules::link(content),
            RuleKey::AllCaps => rules::all_caps(content, resolver),
            RuleKey::RepetitiveChars => rules::repetitive_chars(message, resolver),
            RuleKey::Gibberish => rules::gibberish(content),
            RuleKey::EmoteOnly => rules::emote_only(message, resolver),
            RuleKey::Copypasta => self.paste_window.observe(&text::normalize(content), now),
            RuleKey::Vocabulary => false,
        }
    }
}

fn mention_kind(lowered: &str, channel: &str, viewer: &str) -> MentionKind {
    if !channel.is_empty() && lowered.contains(&format!("@{}", channel.to_lowercase())) {
        return MentionKind::Channel;
    }
    if !viewer.is_empty() && lowered.contains(&format!("@{}", viewer.to_lowercase())) {
        return MentionKind::Viewer;
    }
    MentionKind::None
}
