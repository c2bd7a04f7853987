mod commands;
mod config;
mod error;
mod handlers;
mod models;
mod parsing;
mod registry;
mod tasks;
mod voting;

use config::BotConfig;
use log::{error, info};
use registry::PollRegistry;
use serenity::async_trait;
use serenity::model::channel::Message;
use serenity::model::gateway::Ready;
use serenity::prelude::*;
use std::sync::Arc;

struct Bot {
    registry: Arc<PollRegistry>,
    config: Arc<BotConfig>,
}

#[async_trait]
impl EventHandler for Bot {
    async fn message(&self, ctx: Context, msg: Message) {
        // Clone Arcs for the handler
        let registry = Arc::clone(&self.registry);
        let config = Arc::clone(&self.config);

        // Spawn a task to handle the message concurrently
        tokio::spawn(async move {
            handlers::handle_event_message(&registry, &config, &ctx, &msg).await;
        });
    }

    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!(
            "{} is connected! Listening for commands with prefix '{}'",
            ready.user.name, self.config.command_prefix
        );
    }
}

#[tokio::main]
async fn main() {
    // Initialize logging
    dotenvy::dotenv().ok();
    env_logger::init();

    let token = match config::discord_token() {
        Ok(token) => token,
        Err(e) => {
            error!("{}", e);
            return;
        }
    };

    let config = match BotConfig::load() {
        Ok(config) => Arc::new(config),
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return;
        }
    };

    // Polls live for the lifetime of the process only
    let registry = Arc::new(PollRegistry::new());

    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let mut client = match Client::builder(&token, intents)
        .event_handler(Bot { registry, config })
        .await
    {
        Ok(client) => client,
        Err(e) => {
            error!("Error creating client: {:?}", e);
            return;
        }
    };

    if let Err(why) = client.start().await {
        error!("Client error: {:?}", why);
    }
}
