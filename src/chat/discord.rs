//! serenity-backed chat gateway adapter
//!
//! Converts between the crate's platform-agnostic ids and serenity's model
//! types at the boundary. Voice occupancy comes from the gateway cache, which
//! requires the voice-state intent.

use crate::chat::ChatGateway;
use crate::error::{BridgeError, Result};
use crate::service::AppState;
use crate::types::{ChannelId, GuildId, InboundMessage, MessageId, RoleId, UserId};
use serenity::builder::{CreateChannel, CreateMessage, EditMember, EditMessage};
use serenity::cache::Cache;
use serenity::client::{Context, EventHandler};
use serenity::http::Http;
use serenity::model::channel::{ChannelType, Message};
use serenity::model::gateway::Ready;
use serenity::model::id as sdk;
use serenity::prelude::TypeMapKey;
use std::sync::Arc;
use tracing::{error, info, warn};

/// `ChatGateway` implementation over the serenity HTTP client and cache
pub struct SerenityGateway {
    http: Arc<Http>,
    cache: Arc<Cache>,
}

impl SerenityGateway {
    pub fn new(http: Arc<Http>, cache: Arc<Cache>) -> Self {
        Self { http, cache }
    }

    fn chat_err(e: serenity::Error) -> anyhow::Error {
        BridgeError::ChatPlatform {
            message: e.to_string(),
        }
        .into()
    }
}

#[async_trait::async_trait]
impl ChatGateway for SerenityGateway {
    async fn create_voice_channel(
        &self,
        guild: GuildId,
        category: ChannelId,
        name: &str,
        user_limit: u32,
    ) -> Result<ChannelId> {
        let builder = CreateChannel::new(name)
            .kind(ChannelType::Voice)
            .category(sdk::ChannelId::new(category.0))
            .user_limit(user_limit);
        let channel = sdk::GuildId::new(guild.0)
            .create_channel(&self.http, builder)
            .await
            .map_err(Self::chat_err)?;
        Ok(ChannelId(channel.id.get()))
    }

    async fn delete_channel(&self, channel: ChannelId) -> Result<()> {
        sdk::ChannelId::new(channel.0)
            .delete(&self.http)
            .await
            .map_err(Self::chat_err)?;
        Ok(())
    }

    async fn voice_occupants(&self, guild: GuildId, channel: ChannelId) -> Result<Vec<UserId>> {
        let occupants = {
            let guild_ref = self.cache.guild(sdk::GuildId::new(guild.0)).ok_or_else(|| {
                BridgeError::ChatPlatform {
                    message: format!("Guild {} not present in cache", guild),
                }
            })?;
            guild_ref
                .voice_states
                .iter()
                .filter(|(_, state)| state.channel_id.map(|id| id.get()) == Some(channel.0))
                .map(|(user, _)| UserId(user.get()))
                .collect()
        };
        Ok(occupants)
    }

    async fn move_to_voice(&self, guild: GuildId, user: UserId, channel: ChannelId) -> Result<()> {
        sdk::GuildId::new(guild.0)
            .edit_member(
                &self.http,
                sdk::UserId::new(user.0),
                EditMember::new().voice_channel(sdk::ChannelId::new(channel.0)),
            )
            .await
            .map_err(Self::chat_err)?;
        Ok(())
    }

    async fn send_message(&self, channel: ChannelId, content: &str) -> Result<MessageId> {
        let message = sdk::ChannelId::new(channel.0)
            .send_message(&self.http, CreateMessage::new().content(content))
            .await
            .map_err(Self::chat_err)?;
        Ok(MessageId(message.id.get()))
    }

    async fn edit_message(
        &self,
        channel: ChannelId,
        message: MessageId,
        content: &str,
    ) -> Result<()> {
        sdk::ChannelId::new(channel.0)
            .edit_message(
                &self.http,
                sdk::MessageId::new(message.0),
                EditMessage::new().content(content),
            )
            .await
            .map_err(Self::chat_err)?;
        Ok(())
    }

    async fn delete_message(&self, channel: ChannelId, message: MessageId) -> Result<()> {
        sdk::ChannelId::new(channel.0)
            .delete_message(&self.http, sdk::MessageId::new(message.0))
            .await
            .map_err(Self::chat_err)?;
        Ok(())
    }

    async fn add_role(&self, guild: GuildId, user: UserId, role: RoleId) -> Result<()> {
        self.http
            .add_member_role(
                sdk::GuildId::new(guild.0),
                sdk::UserId::new(user.0),
                sdk::RoleId::new(role.0),
                Some("hubwatch role grant"),
            )
            .await
            .map_err(Self::chat_err)?;
        Ok(())
    }

    async fn remove_role(&self, guild: GuildId, user: UserId, role: RoleId) -> Result<()> {
        self.http
            .remove_member_role(
                sdk::GuildId::new(guild.0),
                sdk::UserId::new(user.0),
                sdk::RoleId::new(role.0),
                Some("hubwatch role removal"),
            )
            .await
            .map_err(Self::chat_err)?;
        Ok(())
    }

    async fn set_nickname(&self, guild: GuildId, user: UserId, nick: &str) -> Result<()> {
        sdk::GuildId::new(guild.0)
            .edit_member(
                &self.http,
                sdk::UserId::new(user.0),
                EditMember::new().nickname(nick),
            )
            .await
            .map_err(Self::chat_err)?;
        Ok(())
    }

    async fn direct_message(&self, user: UserId, content: &str) -> Result<()> {
        let dm = sdk::UserId::new(user.0)
            .create_dm_channel(&self.http)
            .await
            .map_err(Self::chat_err)?;
        dm.id
            .send_message(&self.http, CreateMessage::new().content(content))
            .await
            .map_err(Self::chat_err)?;
        Ok(())
    }
}

/// Type map key for sharing `AppState` with the event handler
pub struct AppStateKey;

impl TypeMapKey for AppStateKey {
    type Value = Arc<AppState>;
}

/// Convert an SDK message event into the platform-agnostic inbound shape
pub fn inbound_from_message(msg: &Message) -> InboundMessage {
    InboundMessage {
        id: MessageId(msg.id.get()),
        channel: ChannelId(msg.channel_id.get()),
        author: UserId(msg.author.id.get()),
        author_display: msg
            .author
            .global_name
            .clone()
            .unwrap_or_else(|| msg.author.name.clone()),
        author_is_bot: msg.author.bot,
        from_webhook: msg.webhook_id.is_some(),
        author_roles: msg
            .member
            .as_ref()
            .map(|member| member.roles.iter().map(|role| RoleId(role.get())).collect())
            .unwrap_or_default(),
        content: msg.content.clone(),
    }
}

/// Gateway event handler feeding the service's single inbound entry point
pub struct BotHandler;

#[serenity::async_trait]
impl EventHandler for BotHandler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!("Chat gateway connected as {}", ready.user.name);
    }

    async fn message(&self, ctx: Context, msg: Message) {
        let app = { ctx.data.read().await.get::<AppStateKey>().cloned() };
        let Some(app) = app else {
            warn!("Inbound message before service initialization, dropping");
            return;
        };

        let inbound = inbound_from_message(&msg);
        if let Err(e) = app.handle_message(inbound).await {
            error!("Failed to handle inbound message: {:#}", e);
        }
    }
}
