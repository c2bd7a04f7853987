use std::collections::BTreeMap;
use std::sync::Arc;

use log::info;
use parking_lot::{Mutex, RwLock};

use crate::error::CommandError;
use crate::models::{Poll, PollOptions};
use crate::tasks::poll_ender::{self, CloseNotifier};

/// A poll behind its own lock. Votes and the close timer both go through it.
pub type SharedPoll = Arc<Mutex<Poll>>;

struct RegistryInner {
    next_id: u64,
    polls: BTreeMap<u64, SharedPoll>,
}

/// Every poll created during the life of the process, by id.
///
/// Ids start at 1 and are never reused; polls are never removed, so results stay available
/// after a poll closes.
pub struct PollRegistry {
    inner: RwLock<RegistryInner>,
}

impl Default for PollRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PollRegistry {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(RegistryInner {
                next_id: 1,
                polls: BTreeMap::new(),
            }),
        }
    }

    // Id assignment and insertion happen under one write lock
    pub fn allocate(&self, options: PollOptions) -> SharedPoll {
        let mut inner = self.inner.write();
        let id = inner.next_id;
        inner.next_id += 1;

        let poll = Arc::new(Mutex::new(Poll::new(id, options)));
        inner.polls.insert(id, Arc::clone(&poll));
        info!("Allocated poll {}", id);
        poll
    }

    pub fn lookup(&self, id: u64) -> Option<SharedPoll> {
        self.inner.read().polls.get(&id).cloned()
    }

    /// Open polls in `scope_id`, oldest first. Recomputed on every call.
    pub fn active_in_scope(&self, scope_id: &str) -> Vec<SharedPoll> {
        let polls: Vec<SharedPoll> = self.inner.read().polls.values().cloned().collect();
        polls
            .into_iter()
            .filter(|poll| {
                let poll = poll.lock();
                poll.is_open() && poll.scope_id == scope_id
            })
            .collect()
    }

    /// Open a pending poll and schedule its automatic close.
    ///
    /// Returns `Ok(false)` if the poll was already started or closed. Must be called from
    /// inside a tokio runtime.
    pub fn start(&self, id: u64, notifier: Arc<dyn CloseNotifier>) -> Result<bool, CommandError> {
        let shared = self.lookup(id).ok_or(CommandError::UnknownPoll(id))?;
        let mut poll = shared.lock();
        if !poll.open() {
            return Ok(false);
        }

        let handle = poll_ender::schedule_close(Arc::clone(&shared), poll.timeout_minutes, notifier);
        poll.attach_close_timer(handle);
        info!(
            "Started poll {} in scope {} for {} minute(s)",
            id, poll.scope_id, poll.timeout_minutes
        );
        Ok(true)
    }

    /// Close a poll by hand. `Ok(false)` means it was not open.
    pub fn close(&self, id: u64) -> Result<bool, CommandError> {
        let shared = self.lookup(id).ok_or(CommandError::UnknownPoll(id))?;
        let changed = shared.lock().close();
        if changed {
            info!("Closed poll {}", id);
        }
        Ok(changed)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.inner.read().polls.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
