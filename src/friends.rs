//! Friendship state machine and graph traversal.
//!
//! A friendship between two users is a single edge record with a lifecycle:
//! absent → pending → accepted, removable from either non-absent state. The
//! edge stores who initiated the request, but once accepted the relation is
//! symmetric — traversal never looks at the initiator.
//!
//! Traversal is computed on demand from the edge relation; nothing is
//! precomputed or cached across requests, so every transition is visible to
//! the next read.

use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{AppError, AppResult};
use crate::storage::{FriendshipRow, Storage};

/// Lifecycle status of a friendship edge. There is no rejected state; a
/// declined or cancelled request is simply deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FriendshipStatus {
    Pending,
    Accepted,
}

impl FriendshipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FriendshipStatus::Pending => "pending",
            FriendshipStatus::Accepted => "accepted",
        }
    }

    pub fn parse(s: &str) -> AppResult<Self> {
        match s {
            "pending" => Ok(FriendshipStatus::Pending),
            "accepted" => Ok(FriendshipStatus::Accepted),
            other => Err(AppError::Configuration(format!(
                "unrecognized friendship status '{other}'"
            ))),
        }
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Create a pending friendship edge from `initiator` to `target`.
///
/// Valid only when no edge exists between the pair in either state; a
/// duplicate request — including one with the roles reversed — is a
/// conflict, as is a self-request.
pub fn request(storage: &Storage, initiator: i64, target: i64) -> AppResult<FriendshipRow> {
    if initiator == target {
        return Err(AppError::Conflict(
            "cannot send a friend request to yourself".to_string(),
        ));
    }
    if storage.find_friendship_by_pair(initiator, target)?.is_some() {
        return Err(AppError::Conflict(format!(
            "a friendship record between users {initiator} and {target} already exists"
        )));
    }

    let now = now_secs();
    let row = FriendshipRow {
        friendship_id: 0,
        user_low: initiator.min(target),
        user_high: initiator.max(target),
        requester_id: initiator,
        status: FriendshipStatus::Pending.as_str().to_string(),
        created_at: now,
        updated_at: now,
    };
    let id = storage.insert_friendship(&row)?;
    crate::mlog!(
        "friend: request {} -> {}",
        crate::logging::user_id(initiator),
        crate::logging::user_id(target)
    );
    Ok(FriendshipRow {
        friendship_id: id,
        ..row
    })
}

/// Accept the pending request that `initiator` sent to `accepter`.
///
/// Only the non-initiator party of the exact pending record may accept;
/// an initiator trying to accept their own request is an authorization
/// failure, not a missing record.
pub fn accept(storage: &Storage, accepter: i64, initiator: i64) -> AppResult<FriendshipRow> {
    let row = storage
        .find_friendship_by_pair(accepter, initiator)?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "no pending friend request between users {initiator} and {accepter}"
            ))
        })?;

    if FriendshipStatus::parse(&row.status)? != FriendshipStatus::Pending {
        return Err(AppError::NotFound(format!(
            "no pending friend request between users {initiator} and {accepter}"
        )));
    }
    // The edge involves exactly {accepter, initiator}, so the requester is
    // one of the two; only the non-initiator may accept.
    if row.requester_id == accepter {
        return Err(AppError::Authorization(
            "only the recipient of a friend request may accept it".to_string(),
        ));
    }

    storage.update_friendship_status(row.friendship_id, FriendshipStatus::Accepted.as_str())?;
    crate::mlog!(
        "friend: {} accepted {}",
        crate::logging::user_id(accepter),
        crate::logging::user_id(initiator)
    );
    Ok(FriendshipRow {
        status: FriendshipStatus::Accepted.as_str().to_string(),
        updated_at: now_secs(),
        ..row
    })
}

/// Delete the friendship edge between `requester` and `other`, in whatever
/// state it is in. Covers both "cancel request" and "unfriend". A repeated
/// remove after the record is gone reports not-found, never success.
pub fn remove(storage: &Storage, requester: i64, other: i64) -> AppResult<()> {
    let row = storage
        .find_friendship_by_pair(requester, other)?
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "no friendship record between users {requester} and {other}"
            ))
        })?;
    storage.delete_friendship(row.friendship_id)?;
    crate::mlog!(
        "friend: {} removed edge with {}",
        crate::logging::user_id(requester),
        crate::logging::user_id(other)
    );
    Ok(())
}

/// All users in an accepted friendship with `user`.
pub fn friends_of(storage: &Storage, user: i64) -> AppResult<HashSet<i64>> {
    Ok(storage.list_accepted_friend_ids(user)?.into_iter().collect())
}

/// Strictly second-degree contacts of `user`: the union of the friend sets
/// of each of `user`'s friends, minus `user` and minus the first-degree set.
///
/// Depth is capped at two hops, so no visited-set bookkeeping is needed
/// beyond the set itself; the minus-self step covers the A–B–A cycle.
pub fn friends_of_friends_of(storage: &Storage, user: i64) -> AppResult<HashSet<i64>> {
    let firsts = friends_of(storage, user)?;
    let mut seconds = HashSet::new();
    for &friend in &firsts {
        for second in storage.list_accepted_friend_ids(friend)? {
            if second != user && !firsts.contains(&second) {
                seconds.insert(second);
            }
        }
    }
    Ok(seconds)
}

/// The caller's relationship overview: accepted friends plus pending
/// requests split by direction. Backs the friend listing endpoint.
#[derive(Debug, Default)]
pub struct FriendOverview {
    pub friends: Vec<i64>,
    pub incoming_pending: Vec<i64>,
    pub outgoing_pending: Vec<i64>,
}

pub fn overview(storage: &Storage, user: i64) -> AppResult<FriendOverview> {
    let mut out = FriendOverview::default();
    for row in storage.list_friendships_involving(user)? {
        let other = row.other_party(user);
        match FriendshipStatus::parse(&row.status)? {
            FriendshipStatus::Accepted => out.friends.push(other),
            FriendshipStatus::Pending if row.requester_id == user => {
                out.outgoing_pending.push(other)
            }
            FriendshipStatus::Pending => out.incoming_pending.push(other),
        }
    }
    Ok(out)
}
