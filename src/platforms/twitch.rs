use anyhow::{Context, Result};
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use rand::Rng;
use std::env;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use url::Url;

use crate::platforms::PlatformConnection;
use crate::types::{ChatMessage, Tags};

// Type aliases for cleaner code
type WebSocketWriter = Arc<RwLock<futures_util::stream::SplitSink<tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>, Message>>>;

const TWITCH_WS_URL: &str = "wss://irc-ws.chat.twitch.tv:443";

/// Configuration for the anonymous Twitch connection. No OAuth token is
/// needed: the connection only reads chat, it never posts.
#[derive(Debug, Clone)]
pub struct TwitchConfig {
    pub channels: Vec<String>,
}

impl TwitchConfig {
    /// Load Twitch configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let channels_str = env::var("TWITCH_CHANNELS")
            .context("TWITCH_CHANNELS environment variable not set")?;

        // Parse comma-separated channel list
        let channels: Vec<String> = channels_str
            .split(',')
            .map(|s| s.trim().trim_start_matches('#').to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();

        if channels.is_empty() {
            return Err(anyhow::anyhow!("No channels specified in TWITCH_CHANNELS"));
        }

        info!("Loaded Twitch config with {} channels", channels.len());
        debug!("Channels: {:?}", channels);

        Ok(Self { channels })
    }
}

/// One parsed IRC line: tags, prefix, command, params.
#[derive(Debug, Default)]
struct IrcLine {
    tags: Tags,
    prefix: Option<String>,
    command: Option<String>,
    params: Vec<String>,
}

/// Parse a raw IRC line into its tags, prefix, command, and params.
/// Malformed lines come back partially filled rather than failing.
fn parse_irc_line(line: &str) -> IrcLine {
    let mut parsed = IrcLine::default();
    let mut rest = line;

    if let Some(stripped) = rest.strip_prefix('@') {
        let (raw_tags, remainder) = match stripped.split_once(' ') {
            Some(split) => split,
            None => return parsed,
        };
        for tag in raw_tags.split(';') {
            let mut parts = tag.splitn(2, '=');
            let key = parts.next().unwrap_or_default();
            if !key.is_empty() {
                parsed.tags.insert(key, parts.next().unwrap_or_default());
            }
        }
        rest = remainder;
    }

    rest = rest.trim_start_matches(' ');
    if let Some(stripped) = rest.strip_prefix(':') {
        let (prefix, remainder) = match stripped.split_once(' ') {
            Some(split) => split,
            None => return parsed,
        };
        parsed.prefix = Some(prefix.to_string());
        rest = remainder.trim_start_matches(' ');
    }

    let (command, mut rest) = match rest.split_once(' ') {
        Some(split) => split,
        None => {
            if !rest.is_empty() {
                parsed.command = Some(rest.to_string());
            }
            return parsed;
        }
    };
    parsed.command = Some(command.to_string());

    while !rest.is_empty() {
        if let Some(trailing) = rest.strip_prefix(':') {
            parsed.params.push(trailing.to_string());
            break;
        }
        match rest.split_once(' ') {
            Some((param, remainder)) => {
                parsed.params.push(param.to_string());
                rest = remainder;
            }
            None => {
                parsed.params.push(rest.to_string());
                break;
            }
        }
    }
    parsed
}

/// Turn a parsed line into a chat message. PRIVMSG lines are user chat;
/// USERNOTICE lines are system events (subs, gift subs) that carry a
/// `msg-id` tag and may have no text at all. Everything else is dropped.
fn to_chat_message(line: IrcLine) -> Option<ChatMessage> {
    let is_system = match line.command.as_deref() {
        Some("PRIVMSG") => false,
        Some("USERNOTICE") => true,
        _ => return None,
    };

    let channel = line
        .params
        .first()?
        .trim_start_matches('#')
        .to_lowercase();
    let content = line.params.get(1).cloned().unwrap_or_default();
    let username = line
        .prefix
        .as_deref()
        .and_then(|prefix| prefix.split('!').next())
        .unwrap_or_default()
        .to_string();
    let display_name = line.tags.display_name().map(str::to_string);

    Some(ChatMessage {
        platform: "twitch".to_string(),
        channel,
        username,
        display_name,
        content,
        tags: line.tags,
        timestamp: chrono::Utc::now(),
        is_system,
    })
}

/// Anonymous Twitch IRC connection
pub struct TwitchConnection {
    config: TwitchConfig,
    message_sender: Option<broadcast::Sender<ChatMessage>>,
    websocket_writer: Option<WebSocketWriter>,
    is_connected: Arc<RwLock<bool>>,
}

impl TwitchConnection {
    pub fn new(config: TwitchConfig) -> Self {
        Self {
            config,
            message_sender: None,
            websocket_writer: None,
            is_connected: Arc::new(RwLock::new(false)),
        }
    }
}

#[async_trait]
impl PlatformConnection for TwitchConnection {
    async fn connect(&mut self) -> Result<()> {
        info!("Connecting to Twitch IRC...");

        let url = Url::parse(TWITCH_WS_URL).context("Failed to parse Twitch WebSocket URL")?;

        let (ws_stream, _) = connect_async(url)
            .await
            .context("Failed to connect to Twitch WebSocket")?;

        let (write, read) = ws_stream.split();

        let writer_arc = Arc::new(RwLock::new(write));
        let writer = Arc::clone(&writer_arc);
        self.websocket_writer = Some(writer_arc);

        // Anonymous login: request tag/command capabilities, then join with
        // a throwaway justinfan nick
        let nick = format!("justinfan{}", rand::rng().random_range(0..100_000));
        writer
            .write()
            .await
            .send(Message::Text(
                "CAP REQ :twitch.tv/tags twitch.tv/commands\r\n".to_string(),
            ))
            .await
            .context("Failed to request capabilities")?;
        writer
            .write()
            .await
            .send(Message::Text(format!("NICK {}\r\n", nick)))
            .await
            .context("Failed to send NICK command")?;

        for channel in &self.config.channels {
            let join_msg = format!("JOIN #{}\r\n", channel);
            writer
                .write()
                .await
                .send(Message::Text(join_msg))
                .await
                .with_context(|| format!("Failed to join channel: {}", channel))?;
            info!("Joined channel: #{}", channel);
        }

        let (tx, _) = broadcast::channel(1000);
        self.message_sender = Some(tx.clone());

        *self.is_connected.write().await = true;

        let message_sender = tx;
        let is_connected = Arc::clone(&self.is_connected);

        tokio::spawn(async move {
            let mut read = read;
            info!("Twitch message reader started");

            loop {
                match read.next().await {
                    Some(Ok(Message::Text(text))) => {
                        for line in text.split("\r\n").filter(|l| !l.is_empty()) {
                            // Handle PING to keep the connection alive
                            if line.starts_with("PING") {
                                debug!("Responding to PING");
                                if let Err(e) = writer
                                    .write()
                                    .await
                                    .send(Message::Text("PONG :tmi.twitch.tv\r\n".to_string()))
                                    .await
                                {
                                    error!("Failed to send PONG: {}", e);
                                }
                                continue;
                            }

                            let parsed = parse_irc_line(line);
                            if parsed.command.as_deref() == Some("NOTICE")
                                && parsed
                                    .params
                                    .get(1)
                                    .is_some_and(|p| p.contains("Login authentication failed"))
                            {
                                error!("Twitch rejected the login; channel may not exist");
                                continue;
                            }

                            if let Some(chat_msg) = to_chat_message(parsed) {
                                debug!(
                                    "Parsed message from {}: {}",
                                    chat_msg.username, chat_msg.content
                                );
                                if let Err(e) = message_sender.send(chat_msg) {
                                    warn!("Failed to broadcast message: {}", e);
                                }
                            }
                        }
                    }
                    Some(Ok(Message::Ping(payload))) => {
                        debug!("Received ping, sending pong");
                        if let Err(e) = writer.write().await.send(Message::Pong(payload)).await {
                            error!("Failed to send pong: {}", e);
                        }
                    }
                    Some(Ok(Message::Close(close_frame))) => {
                        info!("WebSocket connection closed: {:?}", close_frame);
                        break;
                    }
                    Some(Ok(_)) => {
                        debug!("Ignoring non-text frame");
                    }
                    Some(Err(e)) => {
                        error!("WebSocket error: {}", e);
                        break;
                    }
                    None => {
                        warn!("WebSocket stream ended");
                        break;
                    }
                }
            }

            *is_connected.write().await = false;
            warn!("Twitch connection handler exited");
        });

        info!("Successfully connected to Twitch IRC as {}", nick);
        Ok(())
    }

    fn platform_name(&self) -> &str {
        "twitch"
    }

    async fn is_connected(&self) -> bool {
        *self.is_connected.read().await
    }

    fn get_message_receiver(&self) -> Option<broadcast::Receiver<ChatMessage>> {
        self.message_sender.as_ref().map(|sender| sender.subscribe())
    }

    fn get_channels(&self) -> Vec<String> {
        self.config.channels.clone()
    }

    async fn disconnect(&mut self) -> Result<()> {
        *self.is_connected.write().await = false;
        self.websocket_writer = None;
        self.message_sender = None;
        info!("Disconnected from Twitch");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRIVMSG: &str = "@badges=subscriber/12;color=#FF69B4;display-name=Ziuzeus;emotes=25:5-9;user-id=1001 :ziuzeus!ziuzeus@ziuzeus.tmi.twitch.tv PRIVMSG #thetremba :haha Kappa";

    #[test]
    fn parses_privmsg_with_tags() {
        let msg = to_chat_message(parse_irc_line(PRIVMSG)).unwrap();
        assert_eq!(msg.channel, "thetremba");
        assert_eq!(msg.username, "ziuzeus");
        assert_eq!(msg.display_name.as_deref(), Some("Ziuzeus"));
        assert_eq!(msg.content, "haha Kappa");
        assert_eq!(msg.tags.user_id(), Some("1001"));
        assert_eq!(msg.tags.color(), Some("#FF69B4"));
        assert!(!msg.is_system);
        assert!(msg.tags.native_emotes(&msg.content).contains("Kappa"));
    }

    #[test]
    fn parses_usernotice_without_text() {
        let line = "@msg-id=subgift;display-name=Generous :tmi.twitch.tv USERNOTICE #thetremba";
        let msg = to_chat_message(parse_irc_line(line)).unwrap();
        assert!(msg.is_system);
        assert_eq!(msg.tags.message_type(), Some("subgift"));
        assert_eq!(msg.content, "");
    }

    #[test]
    fn ignores_other_commands() {
        assert!(to_chat_message(parse_irc_line(":tmi.twitch.tv 001 justinfan1 :Welcome")).is_none());
        assert!(to_chat_message(parse_irc_line("PING :tmi.twitch.tv")).is_none());
    }

    #[test]
    fn parses_line_without_tags() {
        let line = ":someone!someone@host PRIVMSG #chan :hello there";
        let msg = to_chat_message(parse_irc_line(line)).unwrap();
        assert_eq!(msg.username, "someone");
        assert_eq!(msg.content, "hello there");
        assert_eq!(msg.display_name, None);
    }

    #[test]
    fn tag_without_value_is_kept_empty() {
        let line = "@flag=;other=x :a!a@a PRIVMSG #c :hi";
        let parsed = parse_irc_line(line);
        assert_eq!(parsed.tags.get("flag"), Some(""));
        assert_eq!(parsed.tags.get("other"), Some("x"));
    }

    #[test]
    fn config_from_channels_list() {
        let config = TwitchConfig {
            channels: vec!["thetremba".to_string()],
        };
        let connection = TwitchConnection::new(config);
        assert_eq!(connection.platform_name(), "twitch");
        assert_eq!(connection.get_channels(), vec!["thetremba".to_string()]);
    }
}
