//! End-to-end tests for event visibility through the full stack: accounts
//! are created via registration, friendships via request/accept, and events
//! via the event module, so visibility is exercised against real rows
//! rather than hand-built fixtures.

use std::cell::RefCell;

use mingle::auth;
use mingle::error::AppError;
use mingle::events::{self, EventDraft};
use mingle::friends;
use mingle::photos::{PhotoError, PhotoStore};
use mingle::storage::Storage;

struct NullPhotoStore {
    stored: RefCell<usize>,
}

impl NullPhotoStore {
    fn new() -> Self {
        Self {
            stored: RefCell::new(0),
        }
    }
}

impl PhotoStore for NullPhotoStore {
    fn store(&self, key: &str, _data_url: &str) -> Result<String, PhotoError> {
        *self.stored.borrow_mut() += 1;
        Ok(format!("/photos/{key}.png"))
    }
}

fn register(storage: &Storage, name: &str, email: &str) -> i64 {
    let (user, _token) = auth::register(storage, name, email, "correct horse battery").unwrap();
    user.user_id
}

fn befriend(storage: &Storage, a: i64, b: i64) {
    friends::request(storage, a, b).unwrap();
    friends::accept(storage, b, a).unwrap();
}

fn draft(name: &str, privacy: &str) -> EventDraft {
    EventDraft {
        name: name.to_string(),
        category: "outdoors".to_string(),
        time: 1_800_000_000,
        duration: 90,
        location: "Riverside park".to_string(),
        privacy: privacy.to_string(),
        max_participants: 10,
        photo: None,
        coordinate_lat: Some(52.52),
        coordinate_lon: Some(13.405),
        remarks: None,
    }
}

/// Four users in a chain — anna–ben–cleo–dan — and one event per privacy
/// level owned by anna, checked from every position in the graph.
#[test]
fn visibility_matrix_across_the_graph() {
    let storage = Storage::open_in_memory().unwrap();
    let photos = NullPhotoStore::new();

    let anna = register(&storage, "Anna", "anna@example.com");
    let ben = register(&storage, "Ben", "ben@example.com");
    let cleo = register(&storage, "Cleo", "cleo@example.com");
    let dan = register(&storage, "Dan", "dan@example.com");
    befriend(&storage, anna, ben);
    befriend(&storage, ben, cleo);
    befriend(&storage, cleo, dan);

    let only_me = events::create(&storage, &photos, anna, &draft("Diary", "only-me")).unwrap();
    let for_friends = events::create(&storage, &photos, anna, &draft("Picnic", "friends")).unwrap();
    let wider = events::create(
        &storage,
        &photos,
        anna,
        &draft("Hike", "friends-of-friends"),
    )
    .unwrap();
    let open = events::create(&storage, &photos, anna, &draft("Festival", "public")).unwrap();

    // viewer, sees only-me, sees friends, sees friends-of-friends
    let expectations = [
        (anna, true, true, true),
        (ben, false, true, true),
        (cleo, false, false, true),
        (dan, false, false, false),
    ];
    for (viewer, see_only_me, see_friends, see_wider) in expectations {
        for (event, visible) in [
            (&only_me, see_only_me),
            (&for_friends, see_friends),
            (&wider, see_wider),
        ] {
            let result = events::get(&storage, viewer, event.event_id);
            if visible {
                assert_eq!(result.unwrap().event.event_id, event.event_id);
            } else {
                assert!(
                    matches!(result, Err(AppError::Authorization(_))),
                    "viewer {viewer} should be denied '{}'",
                    event.name
                );
            }
        }
        // Public is visible from everywhere
        assert!(events::get(&storage, viewer, open.event_id).is_ok());
    }
}

#[test]
fn visibility_follows_graph_changes() {
    let storage = Storage::open_in_memory().unwrap();
    let photos = NullPhotoStore::new();

    let owner = register(&storage, "Owner", "owner@example.com");
    let guest = register(&storage, "Guest", "guest@example.com");
    let event = events::create(&storage, &photos, owner, &draft("Dinner", "friends")).unwrap();

    // A pending request is not friendship
    friends::request(&storage, guest, owner).unwrap();
    assert!(matches!(
        events::get(&storage, guest, event.event_id),
        Err(AppError::Authorization(_))
    ));

    // Acceptance opens the event; unfriending closes it again
    friends::accept(&storage, owner, guest).unwrap();
    assert!(events::get(&storage, guest, event.event_id).is_ok());

    friends::remove(&storage, owner, guest).unwrap();
    assert!(matches!(
        events::get(&storage, guest, event.event_id),
        Err(AppError::Authorization(_))
    ));
}

#[test]
fn owner_sees_own_event_without_self_edge() {
    let storage = Storage::open_in_memory().unwrap();
    let photos = NullPhotoStore::new();

    // No friendships at all: the owner must still see their own
    // friends-level event.
    let owner = register(&storage, "Solo", "solo@example.com");
    let event = events::create(&storage, &photos, owner, &draft("Solo run", "friends")).unwrap();
    let loaded = events::get(&storage, owner, event.event_id).unwrap();
    assert_eq!(loaded.owner.user_id, owner);
}

#[test]
fn joining_respects_the_same_gate_as_reading() {
    let storage = Storage::open_in_memory().unwrap();
    let photos = NullPhotoStore::new();

    let owner = register(&storage, "Owner", "o@example.com");
    let friend = register(&storage, "Friend", "f@example.com");
    let stranger = register(&storage, "Stranger", "s@example.com");
    befriend(&storage, owner, friend);

    let event = events::create(&storage, &photos, owner, &draft("Climb", "friends")).unwrap();

    assert!(matches!(
        events::join(&storage, stranger, event.event_id),
        Err(AppError::Authorization(_))
    ));
    events::join(&storage, friend, event.event_id).unwrap();

    let loaded = events::get(&storage, friend, event.event_id).unwrap();
    assert_eq!(loaded.participants.len(), 2);
}

#[test]
fn mutations_by_non_owner_do_not_leak_existence() {
    let storage = Storage::open_in_memory().unwrap();
    let photos = NullPhotoStore::new();

    let owner = register(&storage, "Owner", "o2@example.com");
    let other = register(&storage, "Other", "x@example.com");
    // Public, so `other` can read it but still must not mutate it
    let event = events::create(&storage, &photos, owner, &draft("Quiz", "public")).unwrap();
    assert!(events::get(&storage, other, event.event_id).is_ok());

    let upd = events::update(&storage, &photos, other, event.event_id, &draft("Q", "public"));
    assert!(matches!(upd, Err(AppError::NotFound(_))));
    let del = events::delete(&storage, other, event.event_id);
    assert!(matches!(del, Err(AppError::NotFound(_))));

    // The event is untouched
    let loaded = events::get(&storage, owner, event.event_id).unwrap();
    assert_eq!(loaded.event.name, "Quiz");
}

#[test]
fn deleting_an_account_detaches_it_everywhere() {
    let storage = Storage::open_in_memory().unwrap();
    let photos = NullPhotoStore::new();

    let owner = register(&storage, "Owner", "host@example.com");
    let guest = register(&storage, "Guest", "visitor@example.com");
    let event = events::create(&storage, &photos, owner, &draft("Potluck", "public")).unwrap();
    events::join(&storage, guest, event.event_id).unwrap();
    let (_user, token) = auth::login(&storage, "visitor@example.com", "correct horse battery").unwrap();

    // Registration and login both leave session rows; joining leaves a
    // participant row. None of them may block the account deletion.
    assert!(storage.delete_user(guest).unwrap());

    assert!(auth::resolve_token(&storage, &token).unwrap().is_none());
    let loaded = events::get(&storage, owner, event.event_id).unwrap();
    assert_eq!(loaded.participants.len(), 1);
    assert_eq!(loaded.participants[0].user_id, owner);
}

#[test]
fn login_token_resolves_back_to_the_account() {
    let storage = Storage::open_in_memory().unwrap();

    let id = register(&storage, "Pat", "pat@example.com");
    let (_user, token) = auth::login(&storage, "pat@example.com", "correct horse battery").unwrap();
    let user = auth::resolve_token(&storage, &token).unwrap().unwrap();
    assert_eq!(user.user_id, id);

    assert!(matches!(
        auth::login(&storage, "pat@example.com", "wrong password"),
        Err(AppError::Authorization(_))
    ));
    assert!(matches!(
        auth::login(&storage, "nobody@example.com", "correct horse battery"),
        Err(AppError::Authorization(_))
    ));
}
