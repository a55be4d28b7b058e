// Network adapter modules split by external client sockets vs internal HTTP routes.

pub mod client;
pub mod internal;

pub use client::{score_update_serializer, ws_handler};
pub use internal::{entity_destroyed_handler, update_leaderboard_handler};
