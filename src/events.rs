//! Event lifecycle: validation, create/update/read/delete, and joining.
//!
//! Orchestrates the storage layer, the visibility enforcer, and the photo
//! store. Mutations are owner-only; a mutation attempted by a non-owner is
//! reported as not-found so that the existence of another user's event is
//! never observable. Reads are gated by the visibility enforcer and a
//! denial is an explicit authorization failure, never an empty result.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::photos::{generate_photo_key, PhotoStore};
use crate::storage::{EventRow, Storage, UserRow};
use crate::visibility::{Privacy, ViewerGraph};

/// Closed set of event categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventCategory {
    Sports,
    Music,
    Food,
    Outdoors,
    Games,
    Culture,
    Study,
    Other,
}

impl EventCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventCategory::Sports => "sports",
            EventCategory::Music => "music",
            EventCategory::Food => "food",
            EventCategory::Outdoors => "outdoors",
            EventCategory::Games => "games",
            EventCategory::Culture => "culture",
            EventCategory::Study => "study",
            EventCategory::Other => "other",
        }
    }

    pub fn parse(s: &str) -> AppResult<Self> {
        match s {
            "sports" => Ok(EventCategory::Sports),
            "music" => Ok(EventCategory::Music),
            "food" => Ok(EventCategory::Food),
            "outdoors" => Ok(EventCategory::Outdoors),
            "games" => Ok(EventCategory::Games),
            "culture" => Ok(EventCategory::Culture),
            "study" => Ok(EventCategory::Study),
            "other" => Ok(EventCategory::Other),
            unknown => Err(AppError::Validation(format!(
                "unknown event category '{unknown}'"
            ))),
        }
    }
}

/// Mutable event fields as supplied by the caller. `time` is the scheduled
/// start in seconds since the UNIX epoch; `photo` is an optional
/// base64 image data URL.
#[derive(Debug, Clone, Deserialize)]
pub struct EventDraft {
    pub name: String,
    pub category: String,
    pub time: u64,
    pub duration: u32,
    pub location: String,
    pub privacy: String,
    pub max_participants: u32,
    pub photo: Option<String>,
    pub coordinate_lat: Option<f64>,
    pub coordinate_lon: Option<f64>,
    pub remarks: Option<String>,
}

impl EventDraft {
    /// Shape validation at the input boundary. Unknown enumeration values
    /// here are the caller's fault, so they surface as validation errors —
    /// unlike an unrecognized value read back from storage.
    pub fn validate(&self) -> AppResult<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation("event name cannot be empty".to_string()));
        }
        EventCategory::parse(&self.category)?;
        if Privacy::parse(&self.privacy).is_err() {
            return Err(AppError::Validation(format!(
                "unknown event privacy '{}'",
                self.privacy
            )));
        }
        if self.duration == 0 {
            return Err(AppError::Validation(
                "event duration must be positive".to_string(),
            ));
        }
        if self.max_participants == 0 {
            return Err(AppError::Validation(
                "max_participants must be at least 1".to_string(),
            ));
        }
        if let Some(lat) = self.coordinate_lat {
            if !(-90.0..=90.0).contains(&lat) {
                return Err(AppError::Validation(format!("latitude {lat} out of range")));
            }
        }
        if let Some(lon) = self.coordinate_lon {
            if !(-180.0..=180.0).contains(&lon) {
                return Err(AppError::Validation(format!("longitude {lon} out of range")));
            }
        }
        Ok(())
    }
}

/// An event plus its owner and participant projections, as returned by reads.
#[derive(Debug)]
pub struct EventWithRelations {
    pub event: EventRow,
    pub owner: UserRow,
    pub participants: Vec<UserRow>,
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Upload the draft's photo, if any. Runs before any persistence so a
/// storage failure aborts the whole create or update.
fn store_photo(photos: &dyn PhotoStore, draft: &EventDraft) -> AppResult<Option<String>> {
    match &draft.photo {
        Some(payload) => {
            let key = generate_photo_key();
            let url = photos.store(&key, payload)?;
            Ok(Some(url))
        }
        None => Ok(None),
    }
}

/// Create an event owned by `owner`, who becomes the sole initial
/// participant.
pub fn create(
    storage: &Storage,
    photos: &dyn PhotoStore,
    owner: i64,
    draft: &EventDraft,
) -> AppResult<EventRow> {
    draft.validate()?;
    if storage.get_user(owner)?.is_none() {
        return Err(AppError::NotFound(format!("user {owner}")));
    }

    // validate() accepted these, so the parses are canonicalizing only
    let category = EventCategory::parse(&draft.category)?;
    let privacy = Privacy::parse(&draft.privacy)?;

    let photo_url = store_photo(photos, draft)?;

    let now = now_secs();
    let mut row = EventRow {
        event_id: 0,
        owner_id: owner,
        name: draft.name.clone(),
        category: category.as_str().to_string(),
        starts_at: draft.time,
        duration_mins: draft.duration,
        location: draft.location.clone(),
        coordinate_lat: draft.coordinate_lat,
        coordinate_lon: draft.coordinate_lon,
        privacy: privacy.as_str().to_string(),
        max_participants: draft.max_participants,
        photo_url,
        remarks: draft.remarks.clone(),
        created_at: now,
        updated_at: now,
    };
    row.event_id = storage.insert_event(&row)?;
    storage.add_participant(row.event_id, owner, now)?;

    crate::mlog!(
        "event: created {} by {} ({})",
        crate::logging::event_id(row.event_id),
        crate::logging::user_id(owner),
        row.privacy
    );
    Ok(row)
}

/// Re-validate and overwrite all mutable fields of an event. Only the owner
/// may update; a non-owner gets not-found whether or not the event exists.
pub fn update(
    storage: &Storage,
    photos: &dyn PhotoStore,
    actor: i64,
    event_id: i64,
    draft: &EventDraft,
) -> AppResult<EventRow> {
    draft.validate()?;
    let category = EventCategory::parse(&draft.category)?;
    let privacy = Privacy::parse(&draft.privacy)?;

    let existing = storage
        .get_event_owned(event_id, actor)?
        .ok_or_else(|| AppError::NotFound(format!("event {event_id}")))?;

    // A new photo supersedes the old reference; no photo keeps it.
    let photo_url = store_photo(photos, draft)?;

    let row = EventRow {
        event_id,
        owner_id: actor,
        name: draft.name.clone(),
        category: category.as_str().to_string(),
        starts_at: draft.time,
        duration_mins: draft.duration,
        location: draft.location.clone(),
        coordinate_lat: draft.coordinate_lat,
        coordinate_lon: draft.coordinate_lon,
        privacy: privacy.as_str().to_string(),
        max_participants: draft.max_participants,
        photo_url: photo_url.clone(),
        remarks: draft.remarks.clone(),
        created_at: existing.created_at,
        updated_at: now_secs(),
    };
    storage.update_event(&row)?;

    crate::mlog!(
        "event: updated {} by {}",
        crate::logging::event_id(event_id),
        crate::logging::user_id(actor)
    );
    Ok(EventRow {
        photo_url: photo_url.or(existing.photo_url),
        ..row
    })
}

/// Read an event with its owner and participant projections, gated by the
/// visibility enforcer.
pub fn get(storage: &Storage, viewer: i64, event_id: i64) -> AppResult<EventWithRelations> {
    let event = storage
        .get_event(event_id)?
        .ok_or_else(|| AppError::NotFound(format!("event {event_id}")))?;

    let mut graph = ViewerGraph::new(storage, viewer);
    if !graph.can_view(&event)? {
        return Err(AppError::Authorization(
            "you are not allowed to view this event".to_string(),
        ));
    }

    let owner = storage.get_user(event.owner_id)?.ok_or_else(|| {
        AppError::Configuration(format!(
            "event {event_id} references missing owner {}",
            event.owner_id
        ))
    })?;
    let participants = storage.list_participant_users(event_id)?;

    Ok(EventWithRelations {
        event,
        owner,
        participants,
    })
}

/// Delete an event. Ownership and existence are checked together; a
/// non-owner cannot learn whether the event exists.
pub fn delete(storage: &Storage, actor: i64, event_id: i64) -> AppResult<()> {
    if !storage.delete_event_owned(event_id, actor)? {
        return Err(AppError::NotFound(format!("event {event_id}")));
    }
    crate::mlog!(
        "event: deleted {} by {}",
        crate::logging::event_id(event_id),
        crate::logging::user_id(actor)
    );
    Ok(())
}

/// Join an event as a participant. Requires visibility; rejects duplicate
/// joins and full events.
pub fn join(storage: &Storage, viewer: i64, event_id: i64) -> AppResult<EventRow> {
    let event = storage
        .get_event(event_id)?
        .ok_or_else(|| AppError::NotFound(format!("event {event_id}")))?;

    let mut graph = ViewerGraph::new(storage, viewer);
    if !graph.can_view(&event)? {
        return Err(AppError::Authorization(
            "you are not allowed to view this event".to_string(),
        ));
    }

    if storage.is_participant(event_id, viewer)? {
        return Err(AppError::Conflict(
            "you already participate in this event".to_string(),
        ));
    }
    if storage.count_participants(event_id)? >= event.max_participants {
        return Err(AppError::Conflict("this event is full".to_string()));
    }

    storage.add_participant(event_id, viewer, now_secs())?;
    crate::mlog!(
        "event: {} joined {}",
        crate::logging::user_id(viewer),
        crate::logging::event_id(event_id)
    );
    Ok(event)
}
