// Outbound collaborator clients plus their local stand-ins.

pub mod display;
pub mod identity;
pub mod leaderboard_store;

pub use display::{HttpDisplayClient, LogDisplay};
pub use identity::{AllowAllVerifier, HttpIdentityClient};
pub use leaderboard_store::{HttpLeaderboardStore, InMemoryLeaderboardStore};

use crate::domain::RoomId;

/// `{base_url}/rooms/{room_id}/{tail}` with the room id encoded as a single path segment.
pub(crate) fn room_url(base_url: &str, room_id: &RoomId, tail: &str) -> Option<reqwest::Url> {
    let mut url = reqwest::Url::parse(base_url).ok()?;
    url.path_segments_mut()
        .ok()?
        .pop_if_empty()
        .push("rooms")
        .push(room_id.as_str())
        .push(tail);
    Some(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn when_room_id_has_path_characters_then_it_stays_one_segment() {
        let room_id = RoomId::parse("victim/high-scores?x=#y").expect("room");

        let url = room_url("http://store.local/api/", &room_id, "high-scores").expect("url");

        assert_eq!(
            url.as_str(),
            "http://store.local/api/rooms/victim%2Fhigh-scores%3Fx=%23y/high-scores"
        );
        assert_eq!(url.query(), None);
    }
}
