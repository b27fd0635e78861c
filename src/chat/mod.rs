//! Chat platform integration
//!
//! All component logic drives the chat platform through the `ChatGateway`
//! trait so the core never touches SDK types. The serenity adapter lives in
//! `discord`; `RecordingGateway` is the stateful double used by tests.

pub mod discord;
pub mod recording;

pub use discord::SerenityGateway;
pub use recording::RecordingGateway;

use crate::error::Result;
use crate::types::{ChannelId, GuildId, MessageId, RoleId, UserId};
use async_trait::async_trait;

/// Outbound chat-platform primitives used by the bridge
#[async_trait]
pub trait ChatGateway: Send + Sync {
    /// Create a voice channel under a category, sized for a roster
    async fn create_voice_channel(
        &self,
        guild: GuildId,
        category: ChannelId,
        name: &str,
        user_limit: u32,
    ) -> Result<ChannelId>;

    /// Delete a channel
    async fn delete_channel(&self, channel: ChannelId) -> Result<()>;

    /// List the users currently connected to a voice channel
    async fn voice_occupants(&self, guild: GuildId, channel: ChannelId) -> Result<Vec<UserId>>;

    /// Move a connected user into a voice channel
    async fn move_to_voice(&self, guild: GuildId, user: UserId, channel: ChannelId) -> Result<()>;

    /// Post a message, returning its handle for later edits
    async fn send_message(&self, channel: ChannelId, content: &str) -> Result<MessageId>;

    /// Edit a previously posted message in place
    async fn edit_message(&self, channel: ChannelId, message: MessageId, content: &str)
        -> Result<()>;

    /// Delete a previously posted message
    async fn delete_message(&self, channel: ChannelId, message: MessageId) -> Result<()>;

    /// Grant a role to a guild member
    async fn add_role(&self, guild: GuildId, user: UserId, role: RoleId) -> Result<()>;

    /// Remove a role from a guild member
    async fn remove_role(&self, guild: GuildId, user: UserId, role: RoleId) -> Result<()>;

    /// Set a guild member's nickname
    async fn set_nickname(&self, guild: GuildId, user: UserId, nick: &str) -> Result<()>;

    /// Send a direct message to a user
    async fn direct_message(&self, user: UserId, content: &str) -> Result<()>;
}
