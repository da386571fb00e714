use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteType {
    Up,
    Down,
}

impl VoteType {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteCount {
    pub up: u64,
    pub down: u64,
}

/// Meal name -> counts, for one date.
pub type VoteTally = BTreeMap<String, VoteCount>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteUpdate {
    pub date: String,
    pub votes: VoteTally,
}

/// In-memory vote counts, keyed by date then meal name.
///
/// Counts only grow. Nothing is persisted.
#[derive(Debug, Default)]
pub struct VoteLedger {
    by_date: BTreeMap<String, VoteTally>,
}

impl VoteLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one vote and returns the full tally for `date`.
    ///
    /// An unknown `vote_type` leaves the counters untouched; the entries are
    /// still created at zero and the tally is still returned.
    pub fn register_vote(&mut self, date: &str, meal_name: &str, vote_type: &str) -> VoteUpdate {
        let tally = self.by_date.entry(date.to_string()).or_default();
        let count = tally.entry(meal_name.to_string()).or_default();

        match VoteType::parse(vote_type) {
            Some(VoteType::Up) => count.up = count.up.saturating_add(1),
            Some(VoteType::Down) => count.down = count.down.saturating_add(1),
            None => tracing::debug!(%date, meal = %meal_name, vote_type, "ignoring unknown vote type"),
        }

        VoteUpdate {
            date: date.to_string(),
            votes: tally.clone(),
        }
    }

    pub fn tally(&self, date: &str) -> VoteTally {
        self.by_date.get(date).cloned().unwrap_or_default()
    }
}
