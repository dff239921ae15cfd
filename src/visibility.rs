//! Event visibility enforcement.
//!
//! Decides whether a viewer may see an event based on its privacy level and
//! the viewer's position in the friendship graph. The decision is pure: it
//! reads the graph but never mutates anything.
//!
//! An event whose stored privacy value matches no known variant is denied
//! with a configuration error — access is never defaulted to public.

use std::collections::HashSet;

use crate::error::{AppError, AppResult};
use crate::friends;
use crate::storage::{EventRow, Storage};

/// Privacy level of an event. Each level names the graph-reachability tier
/// a viewer must be in (relative to the owner) to see the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Privacy {
    OnlyMe,
    Friends,
    FriendsOfFriends,
    Public,
}

impl Privacy {
    pub const ALL: [Privacy; 4] = [
        Privacy::OnlyMe,
        Privacy::Friends,
        Privacy::FriendsOfFriends,
        Privacy::Public,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Privacy::OnlyMe => "only-me",
            Privacy::Friends => "friends",
            Privacy::FriendsOfFriends => "friends-of-friends",
            Privacy::Public => "public",
        }
    }

    /// Parse a stored privacy string, failing closed on anything
    /// unrecognized.
    pub fn parse(s: &str) -> AppResult<Self> {
        match s {
            "only-me" => Ok(Privacy::OnlyMe),
            "friends" => Ok(Privacy::Friends),
            "friends-of-friends" => Ok(Privacy::FriendsOfFriends),
            "public" => Ok(Privacy::Public),
            other => Err(AppError::Configuration(format!(
                "unrecognized event privacy '{other}'"
            ))),
        }
    }
}

/// Whether `actor` may update or delete `event`. Owner-only, independent of
/// privacy level and of the graph.
pub fn can_mutate(actor: i64, event: &EventRow) -> bool {
    actor == event.owner_id
}

/// The viewer's position in the friendship graph, computed lazily and
/// memoized for the lifetime of one request. Checking several events for
/// the same viewer reuses the friend sets instead of re-reading the edge
/// relation per event; nothing outlives the request, so reads stay fresh.
pub struct ViewerGraph<'a> {
    storage: &'a Storage,
    viewer: i64,
    friends: Option<HashSet<i64>>,
    friends_of_friends: Option<HashSet<i64>>,
}

impl<'a> ViewerGraph<'a> {
    pub fn new(storage: &'a Storage, viewer: i64) -> Self {
        Self {
            storage,
            viewer,
            friends: None,
            friends_of_friends: None,
        }
    }

    pub fn viewer(&self) -> i64 {
        self.viewer
    }

    fn friends(&mut self) -> AppResult<&HashSet<i64>> {
        if self.friends.is_none() {
            self.friends = Some(friends::friends_of(self.storage, self.viewer)?);
        }
        Ok(self.friends.as_ref().unwrap())
    }

    fn friends_of_friends(&mut self) -> AppResult<&HashSet<i64>> {
        if self.friends_of_friends.is_none() {
            self.friends_of_friends =
                Some(friends::friends_of_friends_of(self.storage, self.viewer)?);
        }
        Ok(self.friends_of_friends.as_ref().unwrap())
    }

    /// Whether the viewer may see `event`.
    ///
    /// The owner always may, at every privacy level. Failure is an error
    /// (unrecognized privacy value or storage failure), never a silent
    /// grant; a clean denial is `Ok(false)`.
    pub fn can_view(&mut self, event: &EventRow) -> AppResult<bool> {
        let privacy = Privacy::parse(&event.privacy)?;

        if self.viewer == event.owner_id {
            return Ok(true);
        }
        match privacy {
            Privacy::OnlyMe => Ok(false),
            Privacy::Friends => Ok(self.friends()?.contains(&event.owner_id)),
            Privacy::FriendsOfFriends => Ok(self.friends()?.contains(&event.owner_id)
                || self.friends_of_friends()?.contains(&event.owner_id)),
            Privacy::Public => Ok(true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::friends::{accept, request};
    use crate::storage::EventRow;

    fn test_storage() -> Storage {
        Storage::open_in_memory().unwrap()
    }

    fn event_with(owner_id: i64, privacy: &str) -> EventRow {
        EventRow {
            event_id: 1,
            owner_id,
            name: "Bouldering".to_string(),
            category: "sports".to_string(),
            starts_at: 1_800_000_000,
            duration_mins: 120,
            location: "Gym".to_string(),
            coordinate_lat: None,
            coordinate_lon: None,
            privacy: privacy.to_string(),
            max_participants: 6,
            photo_url: None,
            remarks: None,
            created_at: 1_790_000_000,
            updated_at: 1_790_000_000,
        }
    }

    fn befriend(storage: &Storage, a: i64, b: i64) {
        request(storage, a, b).unwrap();
        accept(storage, b, a).unwrap();
    }

    #[test]
    fn test_owner_sees_every_privacy_level() {
        let storage = test_storage();
        let mut graph = ViewerGraph::new(&storage, 1);
        for privacy in Privacy::ALL {
            let event = event_with(1, privacy.as_str());
            assert!(graph.can_view(&event).unwrap(), "owner denied {privacy:?}");
        }
    }

    #[test]
    fn test_stranger_sees_only_public() {
        let storage = test_storage();
        let mut graph = ViewerGraph::new(&storage, 2);
        assert!(!graph.can_view(&event_with(1, "only-me")).unwrap());
        assert!(!graph.can_view(&event_with(1, "friends")).unwrap());
        assert!(!graph.can_view(&event_with(1, "friends-of-friends")).unwrap());
        assert!(graph.can_view(&event_with(1, "public")).unwrap());
    }

    #[test]
    fn test_friend_sees_friends_tier_but_not_only_me() {
        let storage = test_storage();
        befriend(&storage, 1, 2);

        let mut graph = ViewerGraph::new(&storage, 2);
        assert!(!graph.can_view(&event_with(1, "only-me")).unwrap());
        assert!(graph.can_view(&event_with(1, "friends")).unwrap());
        // First-degree friends also pass the wider tier
        assert!(graph.can_view(&event_with(1, "friends-of-friends")).unwrap());
    }

    #[test]
    fn test_second_degree_sees_only_fof_tier() {
        let storage = test_storage();
        // viewer 3 — friend 2 — owner 1
        befriend(&storage, 1, 2);
        befriend(&storage, 2, 3);

        let mut graph = ViewerGraph::new(&storage, 3);
        assert!(!graph.can_view(&event_with(1, "only-me")).unwrap());
        assert!(!graph.can_view(&event_with(1, "friends")).unwrap());
        assert!(graph.can_view(&event_with(1, "friends-of-friends")).unwrap());
    }

    #[test]
    fn test_third_degree_is_out_of_reach() {
        let storage = test_storage();
        // viewer 4 — 3 — 2 — owner 1: three hops
        befriend(&storage, 1, 2);
        befriend(&storage, 2, 3);
        befriend(&storage, 3, 4);

        let mut graph = ViewerGraph::new(&storage, 4);
        assert!(!graph.can_view(&event_with(1, "friends-of-friends")).unwrap());
    }

    #[test]
    fn test_pending_request_grants_nothing() {
        let storage = test_storage();
        request(&storage, 2, 1).unwrap();

        let mut graph = ViewerGraph::new(&storage, 2);
        assert!(!graph.can_view(&event_with(1, "friends")).unwrap());
        assert!(!graph.can_view(&event_with(1, "friends-of-friends")).unwrap());
    }

    #[test]
    fn test_unrecognized_privacy_fails_closed() {
        let storage = test_storage();
        let mut graph = ViewerGraph::new(&storage, 2);
        let result = graph.can_view(&event_with(1, "everyone"));
        assert!(matches!(result, Err(AppError::Configuration(_))));

        // Fails closed even for the owner: a corrupt value is an error, not
        // an implicit grant.
        let mut graph = ViewerGraph::new(&storage, 1);
        let result = graph.can_view(&event_with(1, ""));
        assert!(matches!(result, Err(AppError::Configuration(_))));
    }

    #[test]
    fn test_can_mutate_is_owner_only() {
        let event = event_with(1, "public");
        assert!(can_mutate(1, &event));
        assert!(!can_mutate(2, &event));
    }
}
