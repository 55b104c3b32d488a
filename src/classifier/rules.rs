// src/classifier/rules.rs - Ordered rule registry and per-rule predicates
//
// The stateless predicates live here; the two dedup rules are methods on
// their windows (see dedup.rs) because they mutate shared state when tested.

use crate::classifier::emotes::EmoteResolver;
use crate::classifier::text;
use crate::types::{ChatMessage, RuleDefinition, RuleKey, SpamReason};

/// Every registered rule in evaluation order. The vocabulary rule is last
/// and highlight-only: the spam pipeline never consults it.
const REGISTRY: &[RuleDefinition] = &[
    RuleDefinition {
        key: RuleKey::SingleChar,
        label: "Single character",
        description: Some("One visible character that is not an emote"),
    },
    RuleDefinition {
        key: RuleKey::GiftedSub,
        label: "Gifted subscriptions",
        description: Some("Sub gift system events"),
    },
    RuleDefinition {
        key: RuleKey::UserRepeat,
        label: "Repeated message",
        description: Some("Same user sending the same text twice within a minute"),
    },
    RuleDefinition {
        key: RuleKey::BotMessage,
        label: "Bot messages",
        description: Some("StreamElements and friends"),
    },
    RuleDefinition {
        key: RuleKey::Mentions,
        label: "Chatter dialogues",
        description: Some("@-mentions of anyone but the viewer or the channel"),
    },
    RuleDefinition {
        key: RuleKey::ForeignLang,
        label: "Foreign alphabets",
        description: Some("Characters outside the Latin/Cyrillic allow-list"),
    },
    RuleDefinition {
        key: RuleKey::ReservedChars,
        label: "Reserved characters",
        description: Some("Cyrillic letters absent from the Ukrainian alphabet"),
    },
    RuleDefinition {
        key: RuleKey::CommandOnly,
        label: "Bot commands",
        description: Some("Messages starting with !command"),
    },
    RuleDefinition {
        key: RuleKey::Link,
        label: "Links",
        description: None,
    },
    RuleDefinition {
        key: RuleKey::AllCaps,
        label: "All caps",
        description: Some("Mostly-uppercase messages, emote names excluded"),
    },
    RuleDefinition {
        key: RuleKey::RepetitiveChars,
        label: "Laughter and flood",
        description: Some("Character floods and keyboard mashing"),
    },
    RuleDefinition {
        key: RuleKey::Gibberish,
        label: "Gibberish",
        description: None,
    },
    RuleDefinition {
        key: RuleKey::EmoteOnly,
        label: "Emote-only messages",
        description: None,
    },
    RuleDefinition {
        key: RuleKey::Copypasta,
        label: "Copy-paste",
        description: Some("Large messages repeated across the chat within a minute"),
    },
    RuleDefinition {
        key: RuleKey::Vocabulary,
        label: "Vocabulary highlight",
        description: Some("Highlights words with suggested replacements; never redirects"),
    },
];

pub fn registry() -> &'static [RuleDefinition] {
    REGISTRY
}

/// The redirect rules in registration order.
pub fn redirect_rules() -> impl Iterator<Item = &'static RuleDefinition> {
    REGISTRY.iter().filter(|rule| rule.key != RuleKey::Vocabulary)
}

/// The reason tag a redirect rule reports on match. The highlight-only
/// vocabulary rule has none.
pub fn reason_for(key: RuleKey) -> Option<SpamReason> {
    match key {
        RuleKey::SingleChar => Some(SpamReason::SingleChar),
        RuleKey::GiftedSub => Some(SpamReason::GiftedSub),
        RuleKey::UserRepeat => Some(SpamReason::Repeat),
        RuleKey::BotMessage => Some(SpamReason::Bot),
        RuleKey::Mentions => Some(SpamReason::Mention),
        RuleKey::ForeignLang => Some(SpamReason::Foreign),
        RuleKey::ReservedChars => Some(SpamReason::ReservedChars),
        RuleKey::CommandOnly => Some(SpamReason::Command),
        RuleKey::Link => Some(SpamReason::Link),
        RuleKey::AllCaps => Some(SpamReason::Caps),
        RuleKey::RepetitiveChars => Some(SpamReason::Flood),
        RuleKey::Gibberish => Some(SpamReason::Gibberish),
        RuleKey::EmoteOnly => Some(SpamReason::EmoteOnly),
        RuleKey::Copypasta => Some(SpamReason::DuplicatePaste),
        RuleKey::Vocabulary => None,
    }
}

/// Exactly one visible character that is neither a resolvable emote nor an
/// emoji code point.
pub(crate) fn single_char(content: &str, resolver: &dyn EmoteResolver) -> bool {
    let clean = text::normalize(content);
    let mut chars = clean.chars();
    let (first, rest) = (chars.next(), chars.next());
    match (first, rest) {
        (Some(c), None) => resolver.resolve(&clean).is_none() && !text::is_emoji(c),
        _ => false,
    }
}

/// Gift-subscription system events, identified by message-type tag alone.
pub(crate) fn gifted_sub(message: &ChatMessage) -> bool {
    matches!(
        message.tags.message_type(),
        Some("subgift") | Some("submysterygift")
    )
}

/// Known-bot sender, by display name or a `botname:` message prefix.
pub(crate) fn bot_message(message: &ChatMessage, bot_names: &[String]) -> bool {
    let display = message
        .tags
        .display_name()
        .unwrap_or(&message.username)
        .to_lowercase();
    if bot_names.iter().any(|bot| *bot == display) {
        return true;
    }
    let lowered = message.content.to_lowercase();
    bot_names
        .iter()
        .any(|bot| lowered.starts_with(&format!("{}:", bot)))
}

/// Mentions of anyone who is not the viewer or the channel. A message where
/// every mention targets a known party is a dialogue and passes.
pub(crate) fn unsolicited_mention(content: &str, channel: &str, viewer: &str) -> bool {
    let mentions = text::find_mentions(content);
    if mentions.is_empty() {
        return false;
    }
    let viewer = viewer.to_lowercase();
    let channel = channel.to_lowercase();
    !mentions.iter().all(|mention| {
        (!viewer.is_empty() && *mention == viewer) || (!channel.is_empty() && *mention == channel)
    })
}

pub(crate) fn foreign_lang(content: &str) -> bool {
    text::has_foreign_chars(&text::strip_invisible(content))
}

/// Cyrillic letters reserved for the neighbouring alphabet.
pub(crate) fn reserved_chars(content: &str) -> bool {
    content
        .to_lowercase()
        .chars()
        .any(|c| matches!(c, 'ы' | 'э' | 'ё' | 'ъ'))
}

pub(crate) fn command_only(content: &str) -> bool {
    text::is_command(content.trim())
}

pub(crate) fn link(content: &str) -> bool {
    text::has_link(content)
}

/// Uppercase ratio over 0.75 across at least four letters, with resolvable
/// emote tokens excluded so TriHard-style names do not count as shouting.
pub(crate) fn all_caps(content: &str, resolver: &dyn EmoteResolver) -> bool {
    let clean = text::normalize(content);
    let joined: String = clean
        .split_whitespace()
        .filter(|token| resolver.resolve(token).is_none())
        .collect();
    matches!(text::uppercase_ratio(&joined, 4), Some(ratio) if ratio > 0.75)
}

/// Laughter and flood shapes, after emote tokens are stripped so emote spam
/// is left to the emote-only rule.
pub(crate) fn repetitive_chars(message: &ChatMessage, resolver: &dyn EmoteResolver) -> bool {
    let native = message.tags.native_emotes(&message.content);
    let clean = text::normalize(&message.content);
    let kept: Vec<&str> = clean
        .split_whitespace()
        .filter(|token| {
            !native.contains(*token)
                && resolver.resolve(token).is_none()
                && !text::is_emoji_token(token)
        })
        .collect();

    let folded: String = kept
        .join("")
        .chars()
        .flat_map(|c| c.to_lowercase())
        .collect();
    let len = folded.chars().count();
    let distinct = text::distinct_chars(&folded);

    if distinct < 2 {
        return len > 3;
    }
    if len < 4 {
        return false;
    }
    if text::has_repeated_char(&folded, 4) || text::has_repeated_group(&folded) {
        return true;
    }
    if (7..=29).contains(&len) {
        if distinct <= 2 {
            return true;
        }
        if len >= 10 && distinct <= 3 {
            return true;
        }
        if len > 12 && (distinct as f64 / len as f64) < 0.35 {
            return true;
        }
    }
    false
}

/// Crude phonotactic and density checks for keyboard mashing.
pub(crate) fn gibberish(content: &str) -> bool {
    let no_space: String = content.chars().filter(|c| !c.is_whitespace()).collect();
    let len = no_space.chars().count();
    if len < 10 {
        return false;
    }

    let non_alnum = no_space
        .chars()
        .filter(|c| !text::is_chat_alphanumeric(*c))
        .count();
    if non_alnum as f64 / len as f64 > 0.6 {
        return true;
    }

    if !content.contains(' ') && content.chars().count() > 25 {
        return true;
    }

    let (vowels, consonants) = text::vowel_consonant_counts(&no_space);
    if vowels + consonants > 10 {
        let v = vowels as f64;
        let c = consonants as f64;
        if v / (c + 1.0) < 0.1 || c / (v + 1.0) > 8.0 {
            return true;
        }
    }
    false
}

/// Every token (mentions stripped) is a native emote, a resolver hit, or a
/// pure-emoji token.
pub(crate) fn emote_only(message: &ChatMessage, resolver: &dyn EmoteResolver) -> bool {
    let clean = text::normalize(&text::strip_mentions(&message.content));
    if clean.is_empty() {
        return false;
    }
    let native = message.tags.native_emotes(&message.content);
    clean.split_whitespace().all(|token| {
        native.contains(token) || resolver.resolve(token).is_some() || text::is_emoji_token(token)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::emotes::{EmoteCatalog, NullResolver};
    use crate::types::Tags;

    fn message(content: &str) -> ChatMessage {
        ChatMessage {
            platform: "twitch".to_string(),
            channel: "thetremba".to_string(),
            username: "someone".to_string(),
            display_name: None,
            content: content.to_string(),
            tags: Tags::new(),
            timestamp: chrono::Utc::now(),
            is_system: false,
        }
    }

    fn catalog_with(names: &[&str]) -> EmoteCatalog {
        let mut catalog = EmoteCatalog::new();
        for name in names {
            catalog.insert(*name, "https://cdn.7tv.app/x/2x.webp");
        }
        catalog
    }

    #[test]
    fn registry_order_is_stable() {
        let keys: Vec<RuleKey> = redirect_rules().map(|rule| rule.key).collect();
        assert_eq!(keys[0], RuleKey::SingleChar);
        assert_eq!(keys[2], RuleKey::UserRepeat);
        assert_eq!(*keys.last().unwrap(), RuleKey::Copypasta);
        assert_eq!(keys.len(), 14);
        assert!(!keys.contains(&RuleKey::Vocabulary));
        // every redirect rule has a reason tag; the highlight rule has none
        assert!(keys.iter().all(|key| reason_for(*key).is_some()));
        assert!(reason_for(RuleKey::Vocabulary).is_none());
    }

    #[test]
    fn single_char_skips_emotes_and_emoji() {
        assert!(single_char("г", &NullResolver));
        assert!(single_char(" ?\u{200B} ", &NullResolver));
        assert!(!single_char("😂", &NullResolver));
        assert!(!single_char("D", &catalog_with(&["D"])));
        assert!(!single_char("говорю", &NullResolver));
    }

    #[test]
    fn gifted_sub_reads_message_type() {
        let mut msg = message("");
        msg.tags.insert("msg-id", "submysterygift");
        assert!(gifted_sub(&msg));

        let mut msg = message("");
        msg.tags.insert("msg-id", "resub");
        assert!(!gifted_sub(&msg));
        assert!(!gifted_sub(&message("")));
    }

    #[test]
    fn bot_message_matches_name_or_prefix() {
        let bots = vec!["streamelements".to_string()];

        let mut msg = message("донатьте тут");
        msg.tags.insert("display-name", "StreamElements");
        assert!(bot_message(&msg, &bots));

        let msg = message("StreamElements: прайс-лист на сайті");
        assert!(bot_message(&msg, &bots));

        let msg = message("звичайне повідомлення");
        assert!(!bot_message(&msg, &bots));
    }

    #[test]
    fn mention_dialogue_with_known_parties_passes() {
        // every mention known -> allowed
        assert!(!unsolicited_mention("дякую @thetremba @ziuzeus", "thetremba", "ziuzeus"));
        // one stranger among them -> flagged
        assert!(unsolicited_mention("@thetremba @stranger привіт", "thetremba", "ziuzeus"));
        assert!(unsolicited_mention("@stranger ку", "thetremba", "ziuzeus"));
        assert!(!unsolicited_mention("без згадок", "thetremba", "ziuzeus"));
    }

    #[test]
    fn foreign_lang_flags_cjk_only() {
        assert!(!foreign_lang("Привіт world! 123 :) 😂"));
        assert!(foreign_lang("nihao 你好"));
    }

    #[test]
    fn reserved_chars_both_cases() {
        assert!(reserved_chars("подъезд"));
        assert!(reserved_chars("ЭТО"));
        assert!(!reserved_chars("це круто"));
    }

    #[test]
    fn command_and_link_shapes() {
        assert!(command_only("  !айкос"));
        assert!(!command_only("не !команда"));
        assert!(link("дивись twitch.tv/thetremba тут"));
        assert!(!link("просто текст"));
    }

    #[test]
    fn all_caps_excludes_emote_tokens() {
        let catalog = catalog_with(&["trembaaSalute"]);
        assert!(all_caps("ЦЕ КРУТО", &NullResolver));
        assert!(!all_caps("Це Круто", &NullResolver));
        // the emote carries most letters; the rest is too short to judge
        assert!(!all_caps("ОГО trembaaSalute", &catalog));
        assert!(all_caps("МАШАВСЕСАМА trembaaSalute", &catalog));
        // a lone uppercase emote name must not count as shouting
        assert!(!all_caps("trembaaSalute", &catalog));
    }

    #[test]
    fn repetition_catches_laughter() {
        for text in [
            "ахаххахахахаххахаха",
            "ГИГИГИГИГИГИГИГИГИ",
            "))))))",
            "нііііііііііііі",
            "хаахахахха",
        ] {
            assert!(repetitive_chars(&message(text), &NullResolver), "{}", text);
        }
    }

    #[test]
    fn repetition_spares_short_reactions_and_words() {
        for text in ["ого", "вау", "нормальне речення тут", "єєє"] {
            assert!(!repetitive_chars(&message(text), &NullResolver), "{}", text);
        }
    }

    #[test]
    fn repetition_ignores_emote_spam() {
        let catalog = catalog_with(&["pog"]);
        let msg = message("pog pog pog pog pog");
        assert!(!repetitive_chars(&msg, &catalog));

        let msg = message("😂😂 😂😂 😂😂");
        assert!(!repetitive_chars(&msg, &NullResolver));
    }

    #[test]
    fn gibberish_shapes() {
        assert!(gibberish("ІВ)_ПЩДДУЦ+_ЩЦП_+ЩП+_Ц№НЩ_+\"ЕН№"));
        assert!(gibberish("хапzhaahphzphdaphphhdbzdbєзьзщлхщлхщзх"));
        assert!(!gibberish("коротке"));
        assert!(!gibberish("нормальна фраза про гру і стрім"));
    }

    #[test]
    fn emote_only_requires_every_token() {
        let catalog = catalog_with(&["pog"]);
        assert!(emote_only(&message("pog pog"), &catalog));
        assert!(!emote_only(&message("pog nice"), &catalog));
        assert!(emote_only(&message("😂 😂"), &NullResolver));
        // digits are not emoji
        assert!(!emote_only(&message("123"), &NullResolver));
        assert!(!emote_only(&message(""), &NullResolver));
    }

    #[test]
    fn emote_only_uses_native_ranges_and_skips_mentions() {
        let mut msg = message("@ziuzeus Kappa");
        msg.tags.insert("emotes", "25:9-13");
        assert!(emote_only(&msg, &NullResolver));
    }
}
