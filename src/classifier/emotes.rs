// src/classifier/emotes.rs - Emote name resolution and 7TV catalog loading

use std::collections::HashMap;

use anyhow::{Context, Result};
use log::{info, warn};
use serde::Deserialize;

/// Exact, case-sensitive emote-name lookup. The classification engine only
/// consumes this capability; fetching catalogs is the surrounding system's
/// concern.
pub trait EmoteResolver: Send + Sync {
    /// Resolve an emote token to its display asset URL, if known.
    fn resolve(&self, token: &str) -> Option<&str>;
}

/// In-memory emote catalog keyed by emote name.
#[derive(Debug, Clone, Default)]
pub struct EmoteCatalog {
    emotes: HashMap<String, String>,
}

impl EmoteCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, url: impl Into<String>) {
        self.emotes.insert(name.into(), url.into());
    }

    pub fn len(&self) -> usize {
        self.emotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emotes.is_empty()
    }
}

impl EmoteResolver for EmoteCatalog {
    fn resolve(&self, token: &str) -> Option<&str> {
        self.emotes.get(token).map(String::as_str)
    }
}

/// Resolver for sessions without a catalog; every lookup misses and emote
/// tokens fall through to the text heuristics as ordinary words.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullResolver;

impl EmoteResolver for NullResolver {
    fn resolve(&self, _token: &str) -> Option<&str> {
        None
    }
}

// API response structures

#[derive(Debug, Deserialize)]
struct IvrUser {
    id: String,
}

#[derive(Debug, Deserialize)]
struct SevenTvUser {
    emote_set: Option<SevenTvEmoteSet>,
}

#[derive(Debug, Deserialize)]
struct SevenTvEmoteSet {
    #[serde(default)]
    emotes: Vec<SevenTvEmote>,
}

#[derive(Debug, Deserialize)]
struct SevenTvEmote {
    name: String,
    data: SevenTvEmoteData,
}

#[derive(Debug, Deserialize)]
struct SevenTvEmoteData {
    host: SevenTvHost,
}

#[derive(Debug, Deserialize)]
struct SevenTvHost {
    url: String,
    #[serde(default)]
    files: Vec<SevenTvFile>,
}

#[derive(Debug, Deserialize)]
struct SevenTvFile {
    name: String,
    format: String,
}

/// Resolve a channel login to its platform user id via the public ivr.fi
/// proxy, which needs no API token.
async fn twitch_user_id(client: &reqwest::Client, channel: &str) -> Result<String> {
    let users: Vec<IvrUser> = client
        .get(format!("https://api.ivr.fi/v2/twitch/user?login={}", channel))
        .send()
        .await
        .context("ivr.fi request failed")?
        .error_for_status()
        .context("ivr.fi rejected the lookup")?
        .json()
        .await
        .context("unexpected ivr.fi response")?;

    users
        .into_iter()
        .next()
        .map(|user| user.id)
        .with_context(|| format!("channel '{}' not found", channel))
}

fn absorb(catalog: &mut EmoteCatalog, emotes: Vec<SevenTvEmote>) {
    for emote in emotes {
        let host = emote.data.host;
        let file = host
            .files
            .iter()
            .find(|f| f.format == "WEBP")
            .or_else(|| host.files.first());
        if let Some(file) = file {
            catalog.insert(emote.name, format!("{}/{}", host.url, file.name));
        }
    }
}

/// Fetch the channel's 7TV emote set plus the global set. Either fetch
/// failing leaves the catalog partially filled with a warning rather than
/// aborting; the id lookup failing is a hard error since nothing can load
/// without it.
pub async fn load_channel_emotes(channel: &str) -> Result<EmoteCatalog> {
    let client = reqwest::Client::new();
    let twitch_id = twitch_user_id(&client, channel).await?;

    let mut catalog = EmoteCatalog::new();

    let channel_set = client
        .get(format!("https://7tv.io/v3/users/twitch/{}", twitch_id))
        .send()
        .await;
    match channel_set {
        Ok(response) => match response.json::<SevenTvUser>().await {
            Ok(user) => {
                if let Some(set) = user.emote_set {
                    absorb(&mut catalog, set.emotes);
                }
            }
            Err(e) => warn!("Could not parse channel emote set: {}", e),
        },
        Err(e) => warn!("Could not fetch channel emote set: {}", e),
    }

    let global_set = client.get("https://7tv.io/v3/emote-sets/global").send().await;
    match global_set {
        Ok(response) => match response.json::<SevenTvEmoteSet>().await {
            Ok(set) => absorb(&mut catalog, set.emotes),
            Err(e) => warn!("Could not parse global emote set: {}", e),
        },
        Err(e) => warn!("Could not fetch global emote set: {}", e),
    }

    info!("Loaded {} emotes for #{}", catalog.len(), channel);
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_lookup_is_case_sensitive() {
        let mut catalog = EmoteCatalog::new();
        catalog.insert("Kappa", "https://cdn.7tv.app/kappa/2x.webp");

        assert!(catalog.resolve("Kappa").is_some());
        assert!(catalog.resolve("kappa").is_none());
        assert!(catalog.resolve("KAPPA").is_none());
    }

    #[test]
    fn null_resolver_never_resolves() {
        assert!(NullResolver.resolve("Kappa").is_none());
    }

    #[test]
    fn absorb_prefers_webp_files() {
        let emotes = vec![SevenTvEmote {
            name: "pog".to_string(),
            data: SevenTvEmoteData {
                host: SevenTvHost {
                    url: "https://cdn.7tv.app/pog".to_string(),
                    files: vec![
                        SevenTvFile {
                            name: "2x.avif".to_string(),
                            format: "AVIF".to_string(),
                        },
                        SevenTvFile {
                            name: "2x.webp".to_string(),
                            format: "WEBP".to_string(),
                        },
                    ],
                },
            },
        }];

        let mut catalog = EmoteCatalog::new();
        absorb(&mut catalog, emotes);
        assert_eq!(
            catalog.resolve("pog"),
            Some("https://cdn.7tv.app/pog/2x.webp")
        );
    }

    #[test]
    fn absorb_skips_emotes_without_files() {
        let emotes = vec![SevenTvEmote {
            name: "ghost".to_string(),
            data: SevenTvEmoteData {
                host: SevenTvHost {
                    url: "https://cdn.7tv.app/ghost".to_string(),
                    files: Vec::new(),
                },
            },
        }];

        let mut catalog = EmoteCatalog::new();
        absorb(&mut catalog, emotes);
        assert!(catalog.is_empty());
    }
}
