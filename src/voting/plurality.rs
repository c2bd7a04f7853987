use crate::models::Poll;
use crate::voting::{PollResults, VoteCount, VoterDetail};

pub fn calculate_results(poll: &Poll, detailed: bool) -> PollResults {
    // Tallies stay in choice order; the renderer decides how to sort
    let tallies: Vec<VoteCount> = poll
        .choices()
        .iter()
        .map(|choice| VoteCount {
            key: choice.key.clone(),
            label: choice.label.clone(),
            votes: choice.vote_count,
        })
        .collect();

    let top = tallies.iter().map(|t| t.votes).max().unwrap_or(0);
    let leaders = if top == 0 {
        Vec::new()
    } else {
        tallies
            .iter()
            .filter(|t| t.votes == top)
            .map(|t| t.key.clone())
            .collect()
    };

    let voters = detailed.then(|| {
        let mut voters: Vec<VoterDetail> = poll
            .voters()
            .iter()
            .map(|(user_id, record)| VoterDetail {
                user_id: user_id.clone(),
                choice_key: record.choice_key.clone(),
                timestamp: record.timestamp,
            })
            .collect();
        voters.sort_by(|a, b| {
            a.timestamp
                .cmp(&b.timestamp)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });
        voters
    });

    PollResults {
        poll_id: poll.id,
        name: poll.name.clone(),
        is_open: poll.is_open(),
        color: poll.color,
        created_at: poll.created_at,
        footnote: poll.footnote.clone(),
        tallies,
        total_votes: poll.total_votes(),
        leaders,
        voters,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tests::test_options;
    use chrono::{Duration, Utc};

    #[test]
    fn empty_poll_has_no_leaders() {
        let mut poll = Poll::new(1, test_options(&["a", "b"]));
        poll.open();
        let results = calculate_results(&poll, false);
        assert_eq!(results.total_votes, 0);
        assert!(results.leaders.is_empty());
        assert!(results.voters.is_none());
        assert!(results.is_open);
    }

    #[test]
    fn tallies_sum_to_total() {
        let mut poll = Poll::new(1, test_options(&["a", "b", "c"]));
        poll.open();
        for (user, key) in [("u1", "A"), ("u2", "B"), ("u3", "B"), ("u4", "C"), ("u1", "C")] {
            poll.vote(key, user);
        }
        let results = calculate_results(&poll, false);
        let sum: usize = results.tallies.iter().map(|t| t.votes).sum();
        assert_eq!(sum, results.total_votes);
        assert_eq!(results.total_votes, 4);
        assert_eq!(results.leaders, vec!["B", "C"]);
    }

    #[test]
    fn detailed_lists_voters_by_time() {
        let mut poll = Poll::new(7, test_options(&["a", "b"]));
        poll.open();
        let start = Utc::now();
        poll.vote_at("B", "late", start + Duration::seconds(10));
        poll.vote_at("A", "early", start);
        poll.close();

        let results = calculate_results(&poll, true);
        assert!(!results.is_open);
        let voters = results.voters.unwrap();
        assert_eq!(voters.len(), 2);
        assert_eq!(voters[0].user_id, "early");
        assert_eq!(voters[0].choice_key, "A");
        assert_eq!(voters[1].user_id, "late");
    }
}
