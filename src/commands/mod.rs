pub mod poll;
pub mod results;
pub mod vote;

use std::sync::Arc;

use log::{debug, info};

use crate::config::BotConfig;
use crate::error::CommandError;
use crate::parsing::{ArgValue, Message, Token};
use crate::registry::{PollRegistry, SharedPoll};
use crate::tasks::poll_ender::CloseNotifier;
use crate::voting::PollResults;

/// Who sent a command, and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub user_id: String,
    /// Names of the roles the user holds in this scope.
    pub role_names: Vec<String>,
    /// Guild id, or the channel id for direct messages.
    pub scope_id: String,
    pub channel_id: String,
}

/// Shape of a newly started poll, for the announcement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollAnnouncement {
    pub poll_id: u64,
    pub name: String,
    pub choices: Vec<(String, String)>,
    pub timeout_minutes: u64,
    pub color: u32,
    pub restrict_role: Option<String>,
    pub lock_edits: bool,
    pub blind: bool,
    pub footnote: Option<String>,
}

/// Platform-neutral reply to a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Pong,
    Text(String),
    Announcement(PollAnnouncement),
    Results(PollResults),
}

/// Everything a command needs besides its own arguments.
pub struct CommandContext<'a> {
    pub registry: &'a PollRegistry,
    pub config: &'a BotConfig,
    pub notifier: Arc<dyn CloseNotifier>,
}

pub fn usage(prefix: &str) -> String {
    format!(
        "**Commands**\n\
         `{p}poll \"<title>\" [choice, choice, ...] [--time <minutes>] [--color <code>] [--role \"<name>\"] \
         [--numbers] [--yesno] [--lock] [--blind] [--maybe]` start a poll\n\
         `{p}vote [#<id>] <choice>` vote, or change your vote\n\
         `{p}results #<id> [detailed]` show results\n\
         `{p}close #<id>` close your poll early\n\
         `{p}ping` check the bot is alive",
        p = prefix
    )
}

/// Handle one inbound message. `None` means the message was not addressed to the bot.
///
/// Needs a tokio runtime, since starting a poll spawns its close timer.
pub fn dispatch(ctx: &CommandContext<'_>, invocation: &Invocation, raw: &str) -> Option<Reply> {
    let message = Message::parse(raw)?;
    // The keyword is already lowercased
    let prefix = ctx.config.command_prefix.to_lowercase();
    let command = message.command.strip_prefix(prefix.as_str())?;

    let result = match command {
        "ping" => Ok(Reply::Pong),
        "help" => Ok(Reply::Text(usage(&ctx.config.command_prefix))),
        "poll" | "newpoll" => poll::handle_create_poll(ctx, invocation, &message.args),
        "vote" => vote::handle_vote(ctx, invocation, &message.args),
        "results" => results::handle_results(ctx, invocation, &message.args),
        "close" | "end" => poll::handle_end_poll(ctx, invocation, &message.args),
        _ => {
            debug!("Ignoring unknown command {}", message.command);
            return None;
        }
    };

    Some(match result {
        Ok(reply) => reply,
        Err(CommandError::Format(problem)) => Reply::Text(format!(
            "{}\n{}",
            problem,
            usage(&ctx.config.command_prefix)
        )),
        Err(e) => {
            info!("Command {} from {} rejected: {}", command, invocation.user_id, e);
            Reply::Text(e.to_string())
        }
    })
}

// `#<id>` argument, if one was given
fn poll_id_arg(args: &[Token]) -> Option<Result<u64, CommandError>> {
    args.iter().find_map(|arg| match &arg.value {
        ArgValue::Number(Some(id)) => Some(Ok(*id)),
        ArgValue::Number(None) => Some(Err(CommandError::Format(format!(
            "`{}` is not a poll id.",
            arg.raw
        )))),
        _ => None,
    })
}

// Polls from other scopes are treated as missing
fn poll_in_scope(ctx: &CommandContext<'_>, invocation: &Invocation, id: u64) -> Result<SharedPoll, CommandError> {
    ctx.registry
        .lookup(id)
        .filter(|poll| poll.lock().scope_id == invocation.scope_id)
        .ok_or(CommandError::UnknownPoll(id))
}
