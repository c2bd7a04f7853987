use std::sync::Arc;

use log::info;

use crate::commands::{CommandContext, Invocation, PollAnnouncement, Reply, poll_id_arg, poll_in_scope};
use crate::error::CommandError;
use crate::models::{Poll, PollOptions, PollOrigin};
use crate::parsing::Token;
use crate::voting::calculate_results;

pub fn announcement(poll: &Poll) -> PollAnnouncement {
    PollAnnouncement {
        poll_id: poll.id,
        name: poll.name.clone(),
        choices: poll
            .choices()
            .iter()
            .map(|choice| (choice.key.clone(), choice.label.clone()))
            .collect(),
        timeout_minutes: poll.timeout_minutes,
        color: poll.color,
        restrict_role: poll.restrict_role.clone(),
        lock_edits: poll.lock_edits,
        blind: poll.flags.blind,
        footnote: poll.footnote.clone(),
    }
}

pub fn handle_create_poll(
    ctx: &CommandContext<'_>,
    invocation: &Invocation,
    args: &[Token],
) -> Result<Reply, CommandError> {
    let origin = PollOrigin {
        scope_id: invocation.scope_id.clone(),
        channel_id: invocation.channel_id.clone(),
        creator_id: invocation.user_id.clone(),
    };
    let options = PollOptions::from_args(args, origin, &ctx.config.poll_defaults())?;

    let shared = ctx.registry.allocate(options);
    let id = shared.lock().id;
    ctx.registry.start(id, Arc::clone(&ctx.notifier))?;

    let poll = shared.lock();
    info!(
        "{} created poll {} ({} choices) in scope {}",
        invocation.user_id,
        id,
        poll.choices().len(),
        poll.scope_id
    );
    Ok(Reply::Announcement(announcement(&poll)))
}

pub fn handle_end_poll(
    ctx: &CommandContext<'_>,
    invocation: &Invocation,
    args: &[Token],
) -> Result<Reply, CommandError> {
    let id = poll_id_arg(args)
        .unwrap_or_else(|| Err(CommandError::Format("Which poll? Give its `#<id>`.".to_string())))?;
    let shared = poll_in_scope(ctx, invocation, id)?;

    if shared.lock().creator_id != invocation.user_id {
        return Err(CommandError::NotCreator(id));
    }

    if !ctx.registry.close(id)? {
        return Ok(Reply::Text(format!("Poll #{} is already closed.", id)));
    }

    let results = calculate_results(&shared.lock(), false);
    Ok(Reply::Results(results))
}
