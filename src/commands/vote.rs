use log::debug;

use crate::commands::{CommandContext, Invocation, Reply, poll_id_arg, poll_in_scope};
use crate::error::CommandError;
use crate::parsing::{ArgType, Token};
use crate::registry::SharedPoll;

// Without an id, the vote goes to the only open poll in the scope
fn target_poll(
    ctx: &CommandContext<'_>,
    invocation: &Invocation,
    args: &[Token],
) -> Result<SharedPoll, CommandError> {
    if let Some(id) = poll_id_arg(args) {
        return poll_in_scope(ctx, invocation, id?);
    }

    let mut active = ctx.registry.active_in_scope(&invocation.scope_id);
    match active.len() {
        0 => Err(CommandError::NoActivePoll),
        1 => Ok(active.remove(0)),
        _ => Err(CommandError::AmbiguousPoll(
            active.iter().map(|poll| poll.lock().id).collect(),
        )),
    }
}

pub fn handle_vote(
    ctx: &CommandContext<'_>,
    invocation: &Invocation,
    args: &[Token],
) -> Result<Reply, CommandError> {
    let choice = args
        .iter()
        .find(|arg| arg.arg_type() != ArgType::Number)
        .map(|arg| arg.text().to_string())
        .ok_or_else(|| CommandError::Format("Which choice are you voting for?".to_string()))?;

    let shared = target_poll(ctx, invocation, args)?;
    let mut poll = shared.lock();

    if let Some(role) = &poll.restrict_role {
        let allowed = invocation
            .role_names
            .iter()
            .any(|name| name.eq_ignore_ascii_case(role));
        if !allowed {
            return Err(CommandError::RoleRequired(role.clone()));
        }
    }

    let outcome = poll.vote(&choice, &invocation.user_id);
    debug!(
        "Vote by {} on poll {}: {:?}",
        invocation.user_id, poll.id, outcome.reason
    );
    Ok(Reply::Text(outcome.message))
}
