use crate::commands::{CommandContext, Invocation, Reply, poll_id_arg, poll_in_scope};
use crate::error::CommandError;
use crate::parsing::{ArgValue, Token};
use crate::voting::calculate_results;

fn wants_detail(args: &[Token]) -> bool {
    args.iter().any(|arg| match &arg.value {
        ArgValue::Other(word) => {
            word.eq_ignore_ascii_case("detailed") || word.eq_ignore_ascii_case("users")
        }
        _ => false,
    })
}

pub fn handle_results(
    ctx: &CommandContext<'_>,
    invocation: &Invocation,
    args: &[Token],
) -> Result<Reply, CommandError> {
    let id = poll_id_arg(args)
        .unwrap_or_else(|| Err(CommandError::Format("Which poll? Give its `#<id>`.".to_string())))?;
    let shared = poll_in_scope(ctx, invocation, id)?;
    let poll = shared.lock();

    // Blind polls only show their numbers once closed
    if poll.flags.blind && poll.is_open() {
        return Ok(Reply::Text(format!(
            "Results of poll #{} are hidden until it closes.",
            id
        )));
    }

    Ok(Reply::Results(calculate_results(&poll, wants_detail(args))))
}
