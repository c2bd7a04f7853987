pub mod options;

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use log::warn;
use tokio::task::JoinHandle;

pub use options::{KeyAlphabet, PollDefaults, PollFlags, PollOptions, PollOrigin};

/// Key of the extra "don't know" choice added by `--maybe`.
pub const UNSURE_KEY: &str = "?";
const UNSURE_LABEL: &str = "Don't know";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub key: String,
    pub label: String,
    pub vote_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoterRecord {
    pub choice_key: String,
    pub timestamp: DateTime<Utc>,
}

/// Lifecycle of a poll. Only moves forward: pending, open, closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    ClosedPending,
    Open,
    ClosedFinal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteReason {
    Recorded,
    Changed,
    TimedOut,
    Locked,
    InvalidChoice,
}

/// What happened to a vote. Rejections are ordinary outcomes, not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteOutcome {
    pub success: bool,
    pub reason: VoteReason,
    pub message: String,
}

impl VoteOutcome {
    fn accepted(reason: VoteReason, message: String) -> Self {
        Self {
            success: true,
            reason,
            message,
        }
    }

    fn rejected(reason: VoteReason, message: String) -> Self {
        Self {
            success: false,
            reason,
            message,
        }
    }
}

#[derive(Debug)]
pub struct Poll {
    pub id: u64,
    pub name: String,
    choices: Vec<Choice>,
    voters: HashMap<String, VoterRecord>,
    state: PollState,
    pub lock_edits: bool,
    pub restrict_role: Option<String>,
    pub timeout_minutes: u64,
    pub color: u32,
    pub footnote: Option<String>,
    pub flags: PollFlags,
    pub created_at: DateTime<Utc>,
    pub scope_id: String,
    pub channel_id: String,
    pub creator_id: String,
    close_timer: Option<JoinHandle<()>>,
}

impl Poll {
    /// Build a pending poll. Keys are handed out from the chosen alphabet in label order.
    pub fn new(id: u64, options: PollOptions) -> Self {
        let footnote = options.footnote();
        let wanted = options.choices.len();
        // Same fallback as `PollOptions::from_args`; labels past the last letter are dropped
        let alphabet = if wanted > options.alphabet.capacity() {
            KeyAlphabet::Letters
        } else {
            options.alphabet
        };
        if wanted > alphabet.capacity() {
            warn!(
                "Poll {} has {} choices; keeping the first {}",
                id,
                wanted,
                alphabet.capacity()
            );
        }
        let keys = alphabet.keys(wanted);

        let mut choices: Vec<Choice> = keys
            .into_iter()
            .zip(options.choices)
            .map(|(key, label)| Choice {
                key,
                label,
                vote_count: 0,
            })
            .collect();

        if options.flags.include_unsure {
            choices.push(Choice {
                key: UNSURE_KEY.to_string(),
                label: UNSURE_LABEL.to_string(),
                vote_count: 0,
            });
        }

        Self {
            id,
            name: options.name,
            choices,
            voters: HashMap::new(),
            state: PollState::ClosedPending,
            lock_edits: options.flags.lock_edits,
            restrict_role: options.restrict_role,
            timeout_minutes: options.timeout_minutes,
            color: options.color,
            footnote,
            flags: options.flags,
            created_at: Utc::now(),
            scope_id: options.origin.scope_id,
            channel_id: options.origin.channel_id,
            creator_id: options.origin.creator_id,
            close_timer: None,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> PollState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == PollState::Open
    }

    pub fn choices(&self) -> &[Choice] {
        &self.choices
    }

    pub fn voters(&self) -> &HashMap<String, VoterRecord> {
        &self.voters
    }

    pub fn total_votes(&self) -> usize {
        self.voters.len()
    }

    // Keys match case-insensitively so `b` picks `B` and `yes` picks `YES`
    fn choice_index(&self, key: &str) -> Option<usize> {
        let key = key.trim();
        self.choices
            .iter()
            .position(|choice| choice.key.eq_ignore_ascii_case(key))
    }

    /// Move a pending poll to open. Returns false if it was not pending.
    pub fn open(&mut self) -> bool {
        if self.state != PollState::ClosedPending {
            return false;
        }
        self.state = PollState::Open;
        true
    }

    /// Keep the handle of the automatic close task so a manual close can cancel it.
    pub fn attach_close_timer(&mut self, handle: JoinHandle<()>) {
        if let Some(previous) = self.close_timer.replace(handle) {
            previous.abort();
        }
    }

    /// Close the poll by hand, cancelling the pending automatic close.
    ///
    /// Returns true only when this call moved the poll from open to closed.
    pub fn close(&mut self) -> bool {
        if let Some(timer) = self.close_timer.take() {
            timer.abort();
        }
        self.finish()
    }

    /// Close the poll from its own timer. The handle is dropped, not aborted, since the
    /// calling task is the one it points at.
    pub fn expire(&mut self) -> bool {
        self.close_timer = None;
        self.finish()
    }

    fn finish(&mut self) -> bool {
        if self.state != PollState::Open {
            return false;
        }
        self.state = PollState::ClosedFinal;
        true
    }

    /// Cast or change `user_id`'s vote.
    pub fn vote(&mut self, choice_key: &str, user_id: &str) -> VoteOutcome {
        self.vote_at(choice_key, user_id, Utc::now())
    }

    pub fn vote_at(&mut self, choice_key: &str, user_id: &str, now: DateTime<Utc>) -> VoteOutcome {
        if self.state != PollState::Open {
            return VoteOutcome::rejected(
                VoteReason::TimedOut,
                format!("Poll #{} is closed.", self.id),
            );
        }

        let previous = self.voters.get(user_id).map(|record| record.choice_key.clone());

        if self.lock_edits && previous.is_some() {
            return VoteOutcome::rejected(
                VoteReason::Locked,
                format!("Votes on poll #{} can't be changed.", self.id),
            );
        }

        let Some(index) = self.choice_index(choice_key) else {
            return VoteOutcome::rejected(
                VoteReason::InvalidChoice,
                format!("`{}` is not a choice in poll #{}.", choice_key, self.id),
            );
        };

        let key = self.choices[index].key.clone();
        let label = self.choices[index].label.clone();
        let record = VoterRecord {
            choice_key: key.clone(),
            timestamp: now,
        };

        match previous {
            Some(old_key) => {
                if let Some(old) = self.choices.iter_mut().find(|c| c.key == old_key) {
                    old.vote_count -= 1;
                }
                self.choices[index].vote_count += 1;
                self.voters.insert(user_id.to_string(), record);
                VoteOutcome::accepted(
                    VoteReason::Changed,
                    format!("Vote changed to {} ({}).", key, label),
                )
            }
            None => {
                self.choices[index].vote_count += 1;
                self.voters.insert(user_id.to_string(), record);
                VoteOutcome::accepted(
                    VoteReason::Recorded,
                    format!("Vote recorded for {} ({}).", key, label),
                )
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn test_options(choices: &[&str]) -> PollOptions {
        PollOptions {
            name: "Lunch?".into(),
            choices: choices.iter().map(|c| c.to_string()).collect(),
            alphabet: KeyAlphabet::Letters,
            timeout_minutes: 5,
            color: 0,
            flags: PollFlags::default(),
            restrict_role: None,
            origin: PollOrigin {
                scope_id: "guild-1".into(),
                channel_id: "42".into(),
                creator_id: "alice".into(),
            },
            notes: Vec::new(),
        }
    }

    fn open_poll(options: PollOptions) -> Poll {
        let mut poll = Poll::new(1, options);
        assert!(poll.open());
        poll
    }

    fn tally_sum(poll: &Poll) -> usize {
        poll.choices().iter().map(|c| c.vote_count).sum()
    }

    #[test]
    fn starts_pending_and_rejects_votes() {
        let mut poll = Poll::new(1, test_options(&["a", "b"]));
        assert_eq!(poll.state(), PollState::ClosedPending);
        let outcome = poll.vote("A", "u1");
        assert!(!outcome.success);
        assert_eq!(outcome.reason, VoteReason::TimedOut);
        assert_eq!(poll.total_votes(), 0);
    }

    #[test]
    fn distinct_first_votes_add_up() {
        let mut poll = open_poll(test_options(&["a", "b", "c"]));
        let keys = ["A", "B", "C", "A", "A", "c", "b"];
        for (n, key) in keys.iter().enumerate() {
            let outcome = poll.vote(key, &format!("user-{}", n));
            assert!(outcome.success);
            assert_eq!(outcome.reason, VoteReason::Recorded);
        }
        assert_eq!(poll.total_votes(), keys.len());
        assert_eq!(tally_sum(&poll), keys.len());
        assert_eq!(poll.choices()[0].vote_count, 3);
    }

    #[test]
    fn changing_a_vote_moves_exactly_one() {
        let mut poll = open_poll(test_options(&["a", "b"]));
        poll.vote("A", "u1");
        poll.vote("A", "u2");
        let outcome = poll.vote("B", "u1");
        assert_eq!(outcome.reason, VoteReason::Changed);
        assert_eq!(poll.total_votes(), 2);
        assert_eq!(poll.choices()[0].vote_count, 1);
        assert_eq!(poll.choices()[1].vote_count, 1);
        assert_eq!(poll.voters()["u1"].choice_key, "B");
    }

    #[test]
    fn revoting_same_choice_keeps_counts() {
        let mut poll = open_poll(test_options(&["a", "b"]));
        poll.vote("A", "u1");
        let outcome = poll.vote("a", "u1");
        assert_eq!(outcome.reason, VoteReason::Changed);
        assert_eq!(poll.choices()[0].vote_count, 1);
        assert_eq!(tally_sum(&poll), 1);
    }

    #[test]
    fn change_refreshes_timestamp() {
        let mut poll = open_poll(test_options(&["a", "b"]));
        let first = Utc::now();
        let later = first + chrono::Duration::seconds(30);
        poll.vote_at("A", "u1", first);
        poll.vote_at("B", "u1", later);
        assert_eq!(poll.voters()["u1"].timestamp, later);
    }

    #[test]
    fn locked_poll_rejects_changes() {
        let mut opts = test_options(&["a", "b"]);
        opts.flags.lock_edits = true;
        let mut poll = open_poll(opts);
        assert!(poll.vote("A", "u1").success);
        let outcome = poll.vote("B", "u1");
        assert!(!outcome.success);
        assert_eq!(outcome.reason, VoteReason::Locked);
        assert_eq!(poll.voters()["u1"].choice_key, "A");
        assert_eq!(poll.choices()[1].vote_count, 0);
    }

    #[test]
    fn lock_is_checked_before_choice() {
        let mut opts = test_options(&["a"]);
        opts.flags.lock_edits = true;
        let mut poll = open_poll(opts);
        poll.vote("A", "u1");
        assert_eq!(poll.vote("Z", "u1").reason, VoteReason::Locked);
    }

    #[test]
    fn unknown_choice_is_rejected_without_mutation() {
        let mut poll = open_poll(test_options(&["a", "b"]));
        poll.vote("A", "u1");
        let outcome = poll.vote("Q", "u1");
        assert_eq!(outcome.reason, VoteReason::InvalidChoice);
        assert_eq!(poll.voters()["u1"].choice_key, "A");
        assert_eq!(tally_sum(&poll), 1);
    }

    #[test]
    fn close_is_idempotent_and_final() {
        let mut poll = open_poll(test_options(&["a", "b"]));
        poll.vote("A", "u1");
        assert!(poll.close());
        assert!(!poll.close());
        assert!(!poll.expire());
        assert!(!poll.open());
        assert_eq!(poll.state(), PollState::ClosedFinal);

        let outcome = poll.vote("B", "u2");
        assert_eq!(outcome.reason, VoteReason::TimedOut);
        assert_eq!(poll.total_votes(), 1);
    }

    #[test]
    fn closing_pending_poll_does_nothing() {
        let mut poll = Poll::new(1, test_options(&["a"]));
        assert!(!poll.close());
        assert_eq!(poll.state(), PollState::ClosedPending);
    }

    #[test]
    fn maybe_adds_unsure_choice() {
        let mut opts = test_options(&["a", "b"]);
        opts.flags.include_unsure = true;
        let mut poll = open_poll(opts);
        assert_eq!(poll.choices().len(), 3);
        assert_eq!(poll.choices()[2].key, UNSURE_KEY);
        assert!(poll.vote("?", "u1").success);
    }

    #[test]
    fn yes_no_keys_match_any_case() {
        let mut opts = test_options(&["Yes", "No"]);
        opts.alphabet = KeyAlphabet::YesNo;
        let mut poll = open_poll(opts);
        assert!(poll.vote("yes", "u1").success);
        assert!(poll.vote("No", "u2").success);
        assert_eq!(poll.choices()[0].key, "YES");
        assert_eq!(tally_sum(&poll), 2);
    }

    #[test]
    fn oversized_choice_list_is_clamped_to_keys() {
        let mut opts = test_options(&["a", "b", "c"]);
        opts.alphabet = KeyAlphabet::YesNo;
        let poll = Poll::new(1, opts);
        let keys: Vec<&str> = poll.choices().iter().map(|c| c.key.as_str()).collect();
        assert_eq!(keys, vec!["A", "B", "C"]);

        let labels: Vec<String> = (0..30).map(|n| format!("choice {}", n)).collect();
        let labels: Vec<&str> = labels.iter().map(String::as_str).collect();
        let poll = Poll::new(2, test_options(&labels));
        assert_eq!(poll.choices().len(), 26);
        assert_eq!(poll.choices()[25].key, "Z");
        assert_eq!(poll.choices()[25].label, "choice 25");
    }

    #[test]
    fn footnote_comes_from_option_notes() {
        let mut opts = test_options(&["a"]);
        opts.notes.push(crate::error::FlagValidationError::MissingArgument {
            flag: "time".into(),
        });
        let poll = Poll::new(3, opts);
        assert_eq!(poll.footnote.as_deref(), Some("--time needs a value; ignored."));
    }
}
