//! End-to-end tests for the friendship lifecycle and graph traversal:
//!
//! - request/accept/remove transitions and their failure modes
//! - unordered-pair semantics of the edge relation
//! - first- and second-degree friend set computation

use std::collections::HashSet;

use mingle::error::AppError;
use mingle::friends::{accept, friends_of, friends_of_friends_of, overview, remove, request};
use mingle::storage::Storage;

fn storage() -> Storage {
    Storage::open_in_memory().unwrap()
}

fn befriend(storage: &Storage, a: i64, b: i64) {
    request(storage, a, b).unwrap();
    accept(storage, b, a).unwrap();
}

#[test]
fn request_then_accept_yields_mutual_friendship() {
    let st = storage();

    request(&st, 1, 2).unwrap();
    let edge = st.find_friendship_by_pair(1, 2).unwrap().unwrap();
    assert_eq!(edge.status, "pending");
    assert_eq!(edge.requester_id, 1);

    accept(&st, 2, 1).unwrap();
    let edge = st.find_friendship_by_pair(1, 2).unwrap().unwrap();
    assert_eq!(edge.status, "accepted");

    // Friendship is symmetric regardless of who initiated
    assert!(friends_of(&st, 1).unwrap().contains(&2));
    assert!(friends_of(&st, 2).unwrap().contains(&1));
}

#[test]
fn duplicate_request_conflicts_regardless_of_order() {
    let st = storage();
    request(&st, 1, 2).unwrap();

    assert!(matches!(request(&st, 1, 2), Err(AppError::Conflict(_))));
    assert!(matches!(request(&st, 2, 1), Err(AppError::Conflict(_))));

    // Still conflicts once accepted
    accept(&st, 2, 1).unwrap();
    assert!(matches!(request(&st, 1, 2), Err(AppError::Conflict(_))));
}

#[test]
fn initiator_cannot_accept_own_request() {
    let st = storage();
    request(&st, 1, 2).unwrap();
    assert!(matches!(accept(&st, 1, 2), Err(AppError::Authorization(_))));
}

#[test]
fn accept_with_no_pending_record_is_not_found() {
    let st = storage();
    assert!(matches!(accept(&st, 2, 1), Err(AppError::NotFound(_))));
}

#[test]
fn second_degree_excludes_self_and_first_degree() {
    let st = storage();
    // A(1)–B(2), B(2)–C(3); A and C are not directly connected
    befriend(&st, 1, 2);
    befriend(&st, 2, 3);

    let fof = friends_of_friends_of(&st, 1).unwrap();
    assert!(fof.contains(&3));
    assert!(!fof.contains(&1));
    assert!(!fof.contains(&2));
}

#[test]
fn two_hop_expansion_does_not_recurse_further() {
    let st = storage();
    // Chain 1–2–3–4: 4 is three hops from 1
    befriend(&st, 1, 2);
    befriend(&st, 2, 3);
    befriend(&st, 3, 4);

    let fof = friends_of_friends_of(&st, 1).unwrap();
    assert_eq!(fof, HashSet::from([3]));
}

#[test]
fn direct_friend_is_not_demoted_by_a_longer_path() {
    let st = storage();
    // 1–2, 1–3, 2–3: user 3 is both a direct friend of 1 and reachable
    // through 2, but must only appear in the first-degree set.
    befriend(&st, 1, 2);
    befriend(&st, 1, 3);
    befriend(&st, 2, 3);

    assert_eq!(friends_of(&st, 1).unwrap(), HashSet::from([2, 3]));
    assert!(friends_of_friends_of(&st, 1).unwrap().is_empty());
}

#[test]
fn remove_covers_cancel_and_unfriend_and_reports_absence() {
    let st = storage();

    // Nonexistent pair
    assert!(matches!(remove(&st, 1, 2), Err(AppError::NotFound(_))));

    // Cancel a pending request (either party may remove)
    request(&st, 1, 2).unwrap();
    remove(&st, 2, 1).unwrap();
    assert!(st.find_friendship_by_pair(1, 2).unwrap().is_none());

    // Unfriend an accepted edge, then remove again: not found, not success
    befriend(&st, 1, 2);
    remove(&st, 1, 2).unwrap();
    assert!(matches!(remove(&st, 1, 2), Err(AppError::NotFound(_))));
    assert!(friends_of(&st, 2).unwrap().is_empty());
}

#[test]
fn removal_is_immediately_visible_to_traversal() {
    let st = storage();
    befriend(&st, 1, 2);
    befriend(&st, 2, 3);
    assert_eq!(friends_of_friends_of(&st, 1).unwrap(), HashSet::from([3]));

    // Cutting the 2–3 edge empties the second-degree set on the next read
    remove(&st, 3, 2).unwrap();
    assert!(friends_of_friends_of(&st, 1).unwrap().is_empty());
}

#[test]
fn overview_reflects_lifecycle() {
    let st = storage();
    befriend(&st, 1, 2);
    request(&st, 1, 3).unwrap();
    request(&st, 4, 1).unwrap();

    let ov = overview(&st, 1).unwrap();
    assert_eq!(ov.friends, vec![2]);
    assert_eq!(ov.outgoing_pending, vec![3]);
    assert_eq!(ov.incoming_pending, vec![4]);

    // Accepting the incoming request moves it into friends
    accept(&st, 1, 4).unwrap();
    let ov = overview(&st, 1).unwrap();
    assert_eq!(ov.incoming_pending, Vec::<i64>::new());
    assert!(ov.friends.contains(&4));
}
