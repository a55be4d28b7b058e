// Use cases layer: room session loop and leaderboard workflows.

pub mod debounce;
pub mod leaderboard;
pub mod rooms;
pub mod session;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use leaderboard::{LeaderboardAggregator, LeaderboardOutcome};
pub use session::{RoomSession, SessionServer, session_task};
pub use types::{ConnectRequest, ScoreBoard, ScoreView, SessionEvent};
