pub mod render;

use std::sync::Arc;

use async_trait::async_trait;
use log::{error, warn};
use serenity::http::Http;
use serenity::model::channel::Message;
use serenity::model::id::ChannelId;
use serenity::prelude::*;

use crate::commands::{self, CommandContext, Invocation, Reply};
use crate::config::BotConfig;
use crate::registry::PollRegistry;
use crate::tasks::poll_ender::CloseNotifier;
use crate::voting::PollResults;
use render::Rendered;

/// Posts the final results in the poll's channel when its time runs out.
pub struct DiscordNotifier {
    http: Arc<Http>,
}

impl DiscordNotifier {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl CloseNotifier for DiscordNotifier {
    async fn poll_closed(&self, channel_id: &str, results: PollResults) {
        let channel = match channel_id.parse::<u64>() {
            Ok(id) => ChannelId(id),
            Err(_) => {
                error!("Poll {} has an invalid channel id '{}'", results.poll_id, channel_id);
                return;
            }
        };

        let poll_id = results.poll_id;
        if let Err(why) = send_reply(&self.http, channel, &Reply::Results(results)).await {
            error!("Failed to post final results for poll {}: {:?}", poll_id, why);
        }
    }
}

pub async fn send_reply(http: &Arc<Http>, channel: ChannelId, reply: &Reply) -> Result<(), serenity::Error> {
    match render::render(reply) {
        Rendered::Text(text) => {
            channel.say(http, text).await?;
        }
        Rendered::Embed(view) => {
            channel
                .send_message(http, |message| message.embed(|embed| render::apply_embed(&view, embed)))
                .await?;
        }
    }
    Ok(())
}

// Role names need the guild from the cache; without it the user simply has none
fn role_names(ctx: &Context, msg: &Message) -> Vec<String> {
    let (Some(guild_id), Some(member)) = (msg.guild_id, &msg.member) else {
        return Vec::new();
    };
    match ctx.cache.guild(guild_id) {
        Some(guild) => member
            .roles
            .iter()
            .filter_map(|role_id| guild.roles.get(role_id).map(|role| role.name.clone()))
            .collect(),
        None => {
            warn!("Guild {} is not cached; treating {} as having no roles", guild_id, msg.author.id);
            Vec::new()
        }
    }
}

pub async fn handle_message(
    registry: &PollRegistry,
    config: &BotConfig,
    ctx: &Context,
    msg: &Message,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    if msg.author.bot {
        return Ok(());
    }

    let invocation = Invocation {
        user_id: msg.author.id.to_string(),
        role_names: role_names(ctx, msg),
        scope_id: msg
            .guild_id
            .map(|guild_id| guild_id.to_string())
            .unwrap_or_else(|| msg.channel_id.to_string()),
        channel_id: msg.channel_id.to_string(),
    };

    let command_ctx = CommandContext {
        registry,
        config,
        notifier: Arc::new(DiscordNotifier::new(Arc::clone(&ctx.http))),
    };

    // Dispatch is synchronous; only the reply is awaited
    let Some(reply) = commands::dispatch(&command_ctx, &invocation, &msg.content) else {
        return Ok(());
    };
    send_reply(&ctx.http, msg.channel_id, &reply).await?;
    Ok(())
}

// Entry point from the event handler; errors are logged, never propagated
pub async fn handle_event_message(
    registry: &PollRegistry,
    config: &BotConfig,
    ctx: &Context,
    msg: &Message,
) {
    if let Err(why) = handle_message(registry, config, ctx, msg).await {
        error!("Message handler error: {:?}", why);
    }
}
