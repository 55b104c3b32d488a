// src/bot/mod.rs - Chat splitter: connections, per-channel engines, routing

use anyhow::Result;
use log::{error, info, warn};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

use crate::classifier::emotes::{EmoteCatalog, EmoteResolver};
use crate::classifier::vocabulary::VocabularyTable;
use crate::classifier::ClassificationEngine;
use crate::platforms::PlatformConnection;
use crate::types::{ChatMessage, Highlight, MentionKind, RuleToggles, SpamVerdict};

/// Which stream a classified message belongs to.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamTarget {
    Primary(Highlight),
    Spam(SpamVerdict),
}

/// Core engine owner: platform connections, one classification engine per
/// channel, and the shared emote catalog.
///
/// Engines are partitioned per channel behind a single lock, and each
/// connection gets exactly one router task, so messages are classified in
/// arrival order per channel - the stateful rules depend on that.
pub struct ChatSplitter {
    connections: Arc<RwLock<HashMap<String, Box<dyn PlatformConnection>>>>,
    engines: Arc<RwLock<HashMap<String, ClassificationEngine>>>,
    catalog: Arc<EmoteCatalog>,
    toggles: RuleToggles,
    viewer: String,
    vocabulary: VocabularyTable,
    bot_names: Vec<String>,
}

impl ChatSplitter {
    pub fn new(
        viewer: String,
        vocabulary: VocabularyTable,
        bot_names: Vec<String>,
        toggles: RuleToggles,
        catalog: EmoteCatalog,
    ) -> Self {
        Self {
            connections: Arc::new(RwLock::new(HashMap::new())),
            engines: Arc::new(RwLock::new(HashMap::new())),
            catalog: Arc::new(catalog),
            toggles,
            viewer: viewer.to_lowercase(),
            vocabulary,
            bot_names,
        }
    }

    /// Add a platform connection to the splitter
    pub async fn add_connection(&mut self, connection: Box<dyn PlatformConnection>) {
        let platform_name = connection.platform_name().to_string();
        info!("Added {} connection", platform_name);
        self.connections
            .write()
            .await
            .insert(platform_name, connection);
    }

    /// Classify one message against its channel's engine. The viewer's own
    /// messages skip the spam rules but still receive highlight annotation.
    pub fn route(
        engine: &mut ClassificationEngine,
        message: &ChatMessage,
        viewer: &str,
        toggles: &RuleToggles,
        resolver: &dyn EmoteResolver,
    ) -> StreamTarget {
        let author = message
            .display_name
            .as_deref()
            .unwrap_or(&message.username)
            .to_lowercase();
        let own = !message.is_system && !viewer.is_empty() && author == viewer;

        if !own {
            if let Some(verdict) = engine.classify_spam(message, viewer, toggles, resolver) {
                return StreamTarget::Spam(verdict);
            }
        }
        StreamTarget::Primary(engine.classify_highlight(message, viewer, toggles))
    }

    /// Connect all platforms and start one router task per connection
    pub async fn start(&mut self) -> Result<()> {
        info!("Starting chat splitter...");

        let mut receivers = Vec::new();
        {
            let mut connections_guard = self.connections.write().await;
            for (platform_name, connection) in connections_guard.iter_mut() {
                if let Err(e) = connection.connect().await {
                    error!("Failed to connect to {}: {}", platform_name, e);
                    continue;
                }
                if let Some(receiver) = connection.get_message_receiver() {
                    receivers.push(receiver);
                    info!("Set up message receiver for {}", platform_name);
                }
            }
        }

        if receivers.is_empty() {
            return Err(anyhow::anyhow!("No platform connection came up"));
        }

        for receiver in receivers {
            self.spawn_router(receiver);
        }

        info!("Chat splitter started");
        Ok(())
    }

    fn spawn_router(&self, mut receiver: broadcast::Receiver<ChatMessage>) {
        let engines = Arc::clone(&self.engines);
        let catalog = Arc::clone(&self.catalog);
        let toggles = self.toggles.clone();
        let viewer = self.viewer.clone();
        let vocabulary = self.vocabulary.clone();
        let bot_names = self.bot_names.clone();

        tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(message) => {
                        let mut engines_guard = engines.write().await;
                        let engine = engines_guard
                            .entry(message.channel.clone())
                            .or_insert_with(|| {
                                ClassificationEngine::new(vocabulary.clone(), bot_names.clone())
                            });
                        let target =
                            Self::route(engine, &message, &viewer, &toggles, catalog.as_ref());
                        drop(engines_guard);
                        Self::emit(&message, &target);
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("Message router lagged, {} messages dropped", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        warn!("Message channel closed, router exiting");
                        break;
                    }
                }
            }
        });
    }

    /// Log one line per message with its stream and annotations. Stands in
    /// for a rendering layer.
    fn emit(message: &ChatMessage, target: &StreamTarget) {
        let name = message
            .display_name
            .as_deref()
            .unwrap_or(&message.username);
        match target {
            StreamTarget::Spam(verdict) => {
                info!(
                    "[spam:{}] #{} {}: {}",
                    verdict.reason, message.channel, name, message.content
                );
            }
            StreamTarget::Primary(highlight) => {
                let marker = match highlight.mention {
                    MentionKind::Viewer => " @you",
                    MentionKind::Channel => " @channel",
                    MentionKind::None => "",
                };
                info!(
                    "[chat{}] #{} {}: {}",
                    marker, message.channel, name, message.content
                );
                for hit in &highlight.words {
                    info!("        maybe {} -> {}", hit.word, hit.suggestion);
                }
            }
        }
    }

    /// Drop one channel's dedup state, e.g. when re-joining a stream.
    pub async fn reset_channel(&self, channel: &str) {
        if let Some(engine) = self.engines.write().await.get_mut(channel) {
            engine.reset();
            info!("Reset classification state for #{}", channel);
        }
    }

    /// Gracefully disconnect every platform
    pub async fn shutdown(&self) -> Result<()> {
        let mut connections_guard = self.connections.write().await;
        for (platform_name, connection) in connections_guard.iter_mut() {
            if let Err(e) = connection.disconnect().await {
                warn!("Error disconnecting {}: {}", platform_name, e);
            }
        }
        info!("Chat splitter stopped");
        Ok(())
    }
}
