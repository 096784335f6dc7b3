use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use wayfarer_db::events::{self, DeleteOutcome, EventFields, EventRow, UpdateOutcome};
use wayfarer_db::users::UserRow;
use wayfarer_db::{destinations, DbPool};

use crate::error::CoreError;
use crate::{identity, Role};

/// Closed event status set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventStatus {
    Upcoming,
    Ongoing,
    Completed,
    Cancelled,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Upcoming => "UPCOMING",
            EventStatus::Ongoing => "ONGOING",
            EventStatus::Completed => "COMPLETED",
            EventStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(value: &str) -> Option<EventStatus> {
        match value.trim().to_ascii_uppercase().as_str() {
            "UPCOMING" => Some(EventStatus::Upcoming),
            "ONGOING" => Some(EventStatus::Ongoing),
            "COMPLETED" => Some(EventStatus::Completed),
            "CANCELLED" => Some(EventStatus::Cancelled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventInput {
    pub title: String,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub location: String,
    pub capacity: i64,
    pub price: f64,
    pub category: Option<String>,
    pub image_url: Option<String>,
    /// Defaults to UPCOMING when absent.
    pub status: Option<String>,
    pub destination_id: Option<i64>,
}

/// Event row enriched with derived fields for API responses.
/// `available_capacity` is recomputed on every read, never stored.
#[derive(Debug, Clone)]
pub struct EventDetails {
    pub event: EventRow,
    pub available_capacity: i64,
    pub destination_name: Option<String>,
}

fn validated_status(input: &EventInput) -> Result<EventStatus, CoreError> {
    match input.status.as_deref() {
        None => Ok(EventStatus::Upcoming),
        Some(raw) => EventStatus::parse(raw)
            .ok_or_else(|| CoreError::Validation(format!("Unknown event status: {raw}"))),
    }
}

fn validate(input: &EventInput) -> Result<EventStatus, CoreError> {
    if input.title.trim().is_empty() {
        return Err(CoreError::Validation("Title is required".into()));
    }
    if input.location.trim().is_empty() {
        return Err(CoreError::Validation("Location is required".into()));
    }
    if input.capacity < 1 {
        return Err(CoreError::Validation("Capacity must be at least 1".into()));
    }
    if input.price < 0.0 {
        return Err(CoreError::Validation("Price cannot be negative".into()));
    }
    validated_status(input)
}

async fn check_destination(pool: &DbPool, input: &EventInput) -> Result<(), CoreError> {
    if let Some(dest_id) = input.destination_id {
        if destinations::get_destination_by_id(pool, dest_id).await?.is_none() {
            return Err(CoreError::Validation(format!(
                "Destination {dest_id} does not exist"
            )));
        }
    }
    Ok(())
}

fn fields<'a>(input: &'a EventInput, status: &'a str) -> EventFields<'a> {
    EventFields {
        title: input.title.trim(),
        description: input.description.as_deref(),
        date: input.date,
        time: input.time,
        start_date: input.start_date,
        end_date: input.end_date,
        location: input.location.trim(),
        capacity: input.capacity,
        price: input.price,
        category: input.category.as_deref(),
        image_url: input.image_url.as_deref(),
        status,
        destination_id: input.destination_id,
    }
}

async fn enrich(pool: &DbPool, event: EventRow) -> Result<EventDetails, CoreError> {
    let taken = events::confirmed_tickets(pool, event.id).await?;
    let destination_name = match event.destination_id {
        Some(dest_id) => destinations::get_destination_by_id(pool, dest_id)
            .await?
            .map(|d| d.name),
        None => None,
    };
    Ok(EventDetails {
        available_capacity: (event.capacity - taken).max(0),
        destination_name,
        event,
    })
}

async fn enrich_all(pool: &DbPool, rows: Vec<EventRow>) -> Result<Vec<EventDetails>, CoreError> {
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        out.push(enrich(pool, row).await?);
    }
    Ok(out)
}

pub async fn create(
    pool: &DbPool,
    organizer: &UserRow,
    input: &EventInput,
) -> Result<EventDetails, CoreError> {
    identity::require_role(organizer, Role::Organizer)?;
    let status = validate(input)?;
    check_destination(pool, input).await?;

    let row = events::create_event(pool, organizer.id, &fields(input, status.as_str())).await?;
    tracing::info!(event_id = row.id, organizer_id = organizer.id, "created event");
    enrich(pool, row).await
}

pub async fn get(pool: &DbPool, id: i64) -> Result<EventDetails, CoreError> {
    let row = events::get_event(pool, id).await?.ok_or(CoreError::NotFound)?;
    enrich(pool, row).await
}

pub async fn list(pool: &DbPool) -> Result<Vec<EventDetails>, CoreError> {
    enrich_all(pool, events::list_events(pool).await?).await
}

pub async fn search_by_location(pool: &DbPool, query: &str) -> Result<Vec<EventDetails>, CoreError> {
    enrich_all(pool, events::search_events_by_location(pool, query).await?).await
}

pub async fn list_by_organizer(
    pool: &DbPool,
    organizer: &UserRow,
) -> Result<Vec<EventDetails>, CoreError> {
    identity::require_role(organizer, Role::Organizer)?;
    enrich_all(pool, events::list_events_by_organizer(pool, organizer.id).await?).await
}

fn check_ownership(event: &EventRow, requester: &UserRow) -> Result<(), CoreError> {
    if event.organizer_id == requester.id || Role::parse(&requester.role) == Some(Role::Admin) {
        Ok(())
    } else {
        Err(CoreError::Forbidden)
    }
}

/// Update an event. Only its organizer (or an admin) may; capacity can never
/// drop below the committed CONFIRMED sum.
pub async fn update(
    pool: &DbPool,
    requester: &UserRow,
    id: i64,
    input: &EventInput,
) -> Result<EventDetails, CoreError> {
    let existing = events::get_event(pool, id).await?.ok_or(CoreError::NotFound)?;
    check_ownership(&existing, requester)?;
    let status = validate(input)?;
    check_destination(pool, input).await?;

    match events::update_event_guarded(pool, id, &fields(input, status.as_str())).await? {
        UpdateOutcome::Updated(row) => enrich(pool, row).await,
        UpdateOutcome::CapacityConflict { confirmed } => {
            tracing::warn!(event_id = id, confirmed, requested = input.capacity,
                "capacity update below confirmed sum");
            Err(CoreError::CapacityConflict)
        }
        UpdateOutcome::Missing => Err(CoreError::NotFound),
    }
}

/// Delete an event. Blocked while any CONFIRMED reservation references it.
pub async fn delete(pool: &DbPool, requester: &UserRow, id: i64) -> Result<(), CoreError> {
    let existing = events::get_event(pool, id).await?.ok_or(CoreError::NotFound)?;
    check_ownership(&existing, requester)?;

    match events::delete_event_guarded(pool, id).await? {
        DeleteOutcome::Deleted => {
            tracing::info!(event_id = id, "deleted event");
            Ok(())
        }
        DeleteOutcome::HasConfirmedReservations { confirmed } => {
            tracing::warn!(event_id = id, confirmed, "delete blocked by confirmed reservations");
            Err(CoreError::DeleteConflict)
        }
        DeleteOutcome::Missing => Err(CoreError::NotFound),
    }
}
