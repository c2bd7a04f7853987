use serenity::builder::CreateEmbed;

use crate::commands::{PollAnnouncement, Reply};
use crate::voting::PollResults;

// Discord caps a field value at 1024 chars, so long voter lists are cut
const MAX_VOTER_LINES: usize = 20;
// Limit for embed titles and field names
const MAX_NAME_CHARS: usize = 256;

/// Plain description of an embed, built before anything touches serenity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedView {
    pub title: String,
    pub description: String,
    pub color: u32,
    pub fields: Vec<(String, String, bool)>,
    pub footer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    Text(String),
    Embed(EmbedView),
}

pub fn render(reply: &Reply) -> Rendered {
    match reply {
        Reply::Pong => Rendered::Text("pong".to_string()),
        Reply::Text(text) => Rendered::Text(text.clone()),
        Reply::Announcement(announcement) => Rendered::Embed(render_announcement(announcement)),
        Reply::Results(results) => Rendered::Embed(render_results(results)),
    }
}

/// Emoji shown next to a choice key.
pub fn key_badge(key: &str) -> String {
    const KEYCAPS: [&str; 11] = ["0️⃣", "1️⃣", "2️⃣", "3️⃣", "4️⃣", "5️⃣", "6️⃣", "7️⃣", "8️⃣", "9️⃣", "🔟"];

    match key {
        "YES" => return "✅".to_string(),
        "NO" => return "❌".to_string(),
        "?" => return "❔".to_string(),
        _ => {}
    }
    if let Ok(n) = key.parse::<usize>() {
        if let Some(cap) = KEYCAPS.get(n) {
            return cap.to_string();
        }
    }
    let mut chars = key.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        if c.is_ascii_uppercase() {
            // Regional indicator letters start at U+1F1E6
            if let Some(indicator) = char::from_u32(0x1F1E6 + (c as u32 - 'A' as u32)) {
                return indicator.to_string();
            }
        }
    }
    format!("`{}`", key)
}

// Cut `text` to `max` chars, marking the cut with an ellipsis
fn truncate(text: String, max: usize) -> String {
    if text.chars().count() <= max {
        return text;
    }
    let mut cut: String = text.chars().take(max - 1).collect();
    cut.push('…');
    cut
}

fn render_announcement(announcement: &PollAnnouncement) -> EmbedView {
    let mut description: Vec<String> = announcement
        .choices
        .iter()
        .map(|(key, label)| format!("{} {}", key_badge(key), label))
        .collect();
    description.push(String::new());
    description.push(format!(
        "Vote with `vote #{} <key>`. Closes in {} minute(s).",
        announcement.poll_id, announcement.timeout_minutes
    ));

    let mut notes = Vec::new();
    if let Some(role) = &announcement.restrict_role {
        notes.push(format!("Only `{}` members can vote.", role));
    }
    if announcement.lock_edits {
        notes.push("Votes can't be changed.".to_string());
    }
    if announcement.blind {
        notes.push("Results are hidden until the poll closes.".to_string());
    }
    if let Some(footnote) = &announcement.footnote {
        notes.push(footnote.clone());
    }

    EmbedView {
        title: truncate(
            format!("Poll #{}: {}", announcement.poll_id, announcement.name),
            MAX_NAME_CHARS,
        ),
        description: description.join("\n"),
        color: announcement.color & 0xFF_FFFF,
        fields: Vec::new(),
        footer: (!notes.is_empty()).then(|| notes.join("\n")),
    }
}

fn percent(votes: usize, total: usize) -> usize {
    if total == 0 {
        0
    } else {
        (votes * 100 + total / 2) / total
    }
}

fn render_results(results: &PollResults) -> EmbedView {
    let mut fields: Vec<(String, String, bool)> = results
        .tallies
        .iter()
        .map(|tally| {
            let leading = results.leaders.contains(&tally.key);
            let name = truncate(
                format!("{} {}", key_badge(&tally.key), tally.label),
                MAX_NAME_CHARS,
            );
            let value = format!(
                "{} vote{} ({}%){}",
                tally.votes,
                if tally.votes == 1 { "" } else { "s" },
                percent(tally.votes, results.total_votes),
                if leading { " 🏆" } else { "" }
            );
            (name, value, true)
        })
        .collect();

    if let Some(voters) = &results.voters {
        let mut lines: Vec<String> = voters
            .iter()
            .take(MAX_VOTER_LINES)
            .map(|voter| {
                format!(
                    "<@{}> → {} at {}",
                    voter.user_id,
                    voter.choice_key,
                    voter.timestamp.format("%H:%M:%S UTC")
                )
            })
            .collect();
        if voters.len() > MAX_VOTER_LINES {
            lines.push(format!("…and {} more", voters.len() - MAX_VOTER_LINES));
        }
        if lines.is_empty() {
            lines.push("Nobody has voted yet.".to_string());
        }
        fields.push(("Voters".to_string(), lines.join("\n"), false));
    }

    let status = if results.is_open { "open" } else { "closed" };
    EmbedView {
        title: truncate(
            format!("Results for poll #{}: {}", results.poll_id, results.name),
            MAX_NAME_CHARS,
        ),
        description: format!(
            "{} vote(s) in total. The poll is {}. Started {}.",
            results.total_votes,
            status,
            results.created_at.format("%Y-%m-%d %H:%M UTC")
        ),
        color: results.color & 0xFF_FFFF,
        fields,
        footer: results.footnote.clone(),
    }
}

pub fn apply_embed<'a>(view: &EmbedView, embed: &'a mut CreateEmbed) -> &'a mut CreateEmbed {
    embed
        .title(&view.title)
        .description(&view.description)
        .colour(view.color);
    for (name, value, inline) in &view.fields {
        embed.field(name, value, *inline);
    }
    if let Some(footer) = &view.footer {
        embed.footer(|f| f.text(footer));
    }
    embed
}
