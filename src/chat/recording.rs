//! Recording chat gateway for testing
//!
//! Tracks every mutation in memory so tests can assert on channel, voice,
//! message and role state, and supports per-item failure injection to
//! exercise the partial-failure paths.

use crate::chat::ChatGateway;
use crate::error::{BridgeError, Result};
use crate::types::{ChannelId, GuildId, MessageId, RoleId, UserId};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

#[derive(Debug, Clone)]
pub struct RecordedChannel {
    pub name: String,
    pub category: ChannelId,
    pub user_limit: u32,
}

#[derive(Debug, Clone)]
pub struct RecordedMessage {
    pub channel: ChannelId,
    pub content: String,
}

#[derive(Debug, Default)]
struct RecordingState {
    channels: HashMap<ChannelId, RecordedChannel>,
    voice: HashMap<UserId, ChannelId>,
    messages: HashMap<MessageId, RecordedMessage>,
    roles: HashMap<UserId, HashSet<RoleId>>,
    nicknames: HashMap<UserId, String>,
    dms: Vec<(UserId, String)>,
    deleted_channels: Vec<ChannelId>,
    deleted_messages: Vec<MessageId>,
    fail_moves: HashSet<UserId>,
    fail_channel_deletes: HashSet<ChannelId>,
    fail_sends: bool,
    fail_edits: bool,
    fail_occupant_reads: bool,
}

/// In-memory implementation of `ChatGateway` for tests
#[derive(Default)]
pub struct RecordingGateway {
    state: Mutex<RecordingState>,
    next_id: AtomicU64,
}

impl RecordingGateway {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RecordingState::default()),
            next_id: AtomicU64::new(1000),
        }
    }

    fn allocate_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    fn platform_err(what: &str) -> anyhow::Error {
        BridgeError::ChatPlatform {
            message: what.to_string(),
        }
        .into()
    }

    // ---- test hooks -------------------------------------------------------

    /// Place a user into a voice channel, as if they connected themselves
    pub fn place_user(&self, user: UserId, channel: ChannelId) {
        self.state.lock().unwrap().voice.insert(user, channel);
    }

    /// Make future moves of this user fail
    pub fn fail_moves_for(&self, user: UserId) {
        self.state.lock().unwrap().fail_moves.insert(user);
    }

    /// Make future deletion of this channel fail
    pub fn fail_delete_of(&self, channel: ChannelId) {
        self.state
            .lock()
            .unwrap()
            .fail_channel_deletes
            .insert(channel);
    }

    /// Make message sends fail
    pub fn fail_sends(&self, fail: bool) {
        self.state.lock().unwrap().fail_sends = fail;
    }

    /// Make message edits fail
    pub fn fail_edits(&self, fail: bool) {
        self.state.lock().unwrap().fail_edits = fail;
    }

    /// Make occupant reads fail
    pub fn fail_occupant_reads(&self, fail: bool) {
        self.state.lock().unwrap().fail_occupant_reads = fail;
    }

    // ---- inspection -------------------------------------------------------

    /// Live (not deleted) channels, in id order
    pub fn live_channels(&self) -> Vec<(ChannelId, RecordedChannel)> {
        let state = self.state.lock().unwrap();
        let mut channels: Vec<_> = state
            .channels
            .iter()
            .map(|(id, channel)| (*id, channel.clone()))
            .collect();
        channels.sort_by_key(|(id, _)| *id);
        channels
    }

    pub fn deleted_channels(&self) -> Vec<ChannelId> {
        self.state.lock().unwrap().deleted_channels.clone()
    }

    pub fn deleted_messages(&self) -> Vec<MessageId> {
        self.state.lock().unwrap().deleted_messages.clone()
    }

    /// Current voice channel of a user
    pub fn user_channel(&self, user: UserId) -> Option<ChannelId> {
        self.state.lock().unwrap().voice.get(&user).copied()
    }

    /// Messages currently present in a channel, in id order
    pub fn messages_in(&self, channel: ChannelId) -> Vec<(MessageId, String)> {
        let state = self.state.lock().unwrap();
        let mut messages: Vec<_> = state
            .messages
            .iter()
            .filter(|(_, message)| message.channel == channel)
            .map(|(id, message)| (*id, message.content.clone()))
            .collect();
        messages.sort_by_key(|(id, _)| *id);
        messages
    }

    pub fn dms_to(&self, user: UserId) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .dms
            .iter()
            .filter(|(recipient, _)| *recipient == user)
            .map(|(_, content)| content.clone())
            .collect()
    }

    pub fn roles_of(&self, user: UserId) -> HashSet<RoleId> {
        self.state
            .lock()
            .unwrap()
            .roles
            .get(&user)
            .cloned()
            .unwrap_or_default()
    }

    pub fn nickname_of(&self, user: UserId) -> Option<String> {
        self.state.lock().unwrap().nicknames.get(&user).cloned()
    }
}

#[async_trait]
impl ChatGateway for RecordingGateway {
    async fn create_voice_channel(
        &self,
        _guild: GuildId,
        category: ChannelId,
        name: &str,
        user_limit: u32,
    ) -> Result<ChannelId> {
        let id = ChannelId(self.allocate_id());
        self.state.lock().unwrap().channels.insert(
            id,
            RecordedChannel {
                name: name.to_string(),
                category,
                user_limit,
            },
        );
        Ok(id)
    }

    async fn delete_channel(&self, channel: ChannelId) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_channel_deletes.contains(&channel) {
            return Err(Self::platform_err("Canned channel delete failure"));
        }
        if state.channels.remove(&channel).is_none() {
            return Err(Self::platform_err("Unknown channel"));
        }
        state.voice.retain(|_, current| *current != channel);
        state.deleted_channels.push(channel);
        Ok(())
    }

    async fn voice_occupants(&self, _guild: GuildId, channel: ChannelId) -> Result<Vec<UserId>> {
        let state = self.state.lock().unwrap();
        if state.fail_occupant_reads {
            return Err(Self::platform_err("Canned occupant read failure"));
        }
        let mut occupants: Vec<UserId> = state
            .voice
            .iter()
            .filter(|(_, current)| **current == channel)
            .map(|(user, _)| *user)
            .collect();
        occupants.sort();
        Ok(occupants)
    }

    async fn move_to_voice(
        &self,
        _guild: GuildId,
        user: UserId,
        channel: ChannelId,
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_moves.contains(&user) {
            return Err(Self::platform_err("Canned move failure"));
        }
        state.voice.insert(user, channel);
        Ok(())
    }

    async fn send_message(&self, channel: ChannelId, content: &str) -> Result<MessageId> {
        {
            let state = self.state.lock().unwrap();
            if state.fail_sends {
                return Err(Self::platform_err("Canned send failure"));
            }
        }
        let id = MessageId(self.allocate_id());
        self.state.lock().unwrap().messages.insert(
            id,
            RecordedMessage {
                channel,
                content: content.to_string(),
            },
        );
        Ok(id)
    }

    async fn edit_message(
        &self,
        _channel: ChannelId,
        message: MessageId,
        content: &str,
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_edits {
            return Err(Self::platform_err("Canned edit failure"));
        }
        match state.messages.get_mut(&message) {
            Some(recorded) => {
                recorded.content = content.to_string();
                Ok(())
            }
            None => Err(Self::platform_err("Unknown message")),
        }
    }

    async fn delete_message(&self, _channel: ChannelId, message: MessageId) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.messages.remove(&message).is_none() {
            return Err(Self::platform_err("Unknown message"));
        }
        state.deleted_messages.push(message);
        Ok(())
    }

    async fn add_role(&self, _guild: GuildId, user: UserId, role: RoleId) -> Result<()> {
        self.state
            .lock()
            .unwrap()
            .roles
            .entry(user)
            .or_default()
            .insert(role);
        Ok(())
    }

    async fn remove_role(&self, _guild: GuildId, user: UserId, role: RoleId) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(roles) = state.roles.get_mut(&user) {
            roles.remove(&role);
        }
        Ok(())
    }

    async fn set_nickname(&self, _guild: GuildId, user: UserId, nick: &str) -> Result<()> {
        self.state
            .lock()
            .unwrap()
            .nicknames
            .insert(user, nick.to_string());
        Ok(())
    }

    async fn direct_message(&self, user: UserId, content: &str) -> Result<()> {
        self.state
            .lock()
            .unwrap()
            .dms
            .push((user, content.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GUILD: GuildId = GuildId(1);

    #[tokio::test]
    async fn records_channel_lifecycle() {
        let gateway = RecordingGateway::new();
        let channel = gateway
            .create_voice_channel(GUILD, ChannelId(9), "Alpha", 5)
            .await
            .unwrap();

        assert_eq!(gateway.live_channels().len(), 1);

        gateway.delete_channel(channel).await.unwrap();
        assert!(gateway.live_channels().is_empty());
        assert_eq!(gateway.deleted_channels(), vec![channel]);
    }

    #[tokio::test]
    async fn records_moves_and_occupants() {
        let gateway = RecordingGateway::new();
        let channel = gateway
            .create_voice_channel(GUILD, ChannelId(9), "Alpha", 5)
            .await
            .unwrap();

        gateway
            .move_to_voice(GUILD, UserId(1), channel)
            .await
            .unwrap();
        gateway.place_user(UserId(2), channel);

        let occupants = gateway.voice_occupants(GUILD, channel).await.unwrap();
        assert_eq!(occupants, vec![UserId(1), UserId(2)]);
    }

    #[tokio::test]
    async fn failure_injection() {
        let gateway = RecordingGateway::new();
        gateway.fail_moves_for(UserId(1));

        let err = gateway
            .move_to_voice(GUILD, UserId(1), ChannelId(5))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Chat platform"));
    }
}
