//! Pure merge of live scores into the historical top-N table.

use crate::domain::entities::LeaderboardEntry;
use std::collections::HashSet;

/// Merges `candidates` into `historical` and returns the new top-`top_n` table.
///
/// Candidates are considered before historical rows, so for a repeated identity the first
/// non-zero entry in that order wins. Zero scores never enter the table. Equal scores are
/// ordered by the earliest timestamp, then by their position in the merged sequence.
pub fn merge(
    candidates: &[LeaderboardEntry],
    historical: &[LeaderboardEntry],
    top_n: usize,
) -> Vec<LeaderboardEntry> {
    if top_n == 0 {
        return Vec::new();
    }
    if candidates.is_empty() {
        return leading(historical, top_n);
    }

    // Nothing live can displace a full table whose lowest score is above the best candidate.
    if historical.len() >= top_n {
        let best_candidate = candidates.iter().map(|e| e.score).max().unwrap_or(0);
        let worst_historical = historical
            .iter()
            .take(top_n)
            .map(|e| e.score)
            .min()
            .unwrap_or(0);
        if best_candidate < worst_historical {
            return leading(historical, top_n);
        }
    }

    rank(candidates, historical, top_n)
}

// A stored table may be longer than the configured size; only its head survives.
fn leading(historical: &[LeaderboardEntry], top_n: usize) -> Vec<LeaderboardEntry> {
    historical.iter().take(top_n).cloned().collect()
}

fn rank(
    candidates: &[LeaderboardEntry],
    historical: &[LeaderboardEntry],
    top_n: usize,
) -> Vec<LeaderboardEntry> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut merged: Vec<LeaderboardEntry> = candidates
        .iter()
        .chain(historical)
        .filter(|entry| entry.score > 0)
        .filter(|entry| seen.insert(entry.id.as_str()))
        .cloned()
        .collect();

    merged.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then(a.achieved_at_ms.cmp(&b.achieved_at_ms))
    });
    merged.truncate(top_n);
    merged
}
