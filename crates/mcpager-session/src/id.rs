//! Request id generation.

use uuid::Uuid;

/// Generates `req-<counter>-<suffix>` ids, unique within one session.
///
/// The counter guarantees uniqueness inside the session; the random suffix
/// keeps ids from repeating when a counter restarts in a new process.
#[derive(Debug, Default)]
pub struct RequestIds {
    counter: u64,
}

impl RequestIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Produce the next id. Never returns the same value twice.
    pub fn next_id(&mut self) -> String {
        self.counter += 1;
        let suffix = Uuid::new_v4().simple().to_string();
        format!("req-{}-{}", self.counter, &suffix[..6])
    }

    /// How many ids have been handed out.
    pub fn issued(&self) -> u64 {
        self.counter
    }
}
