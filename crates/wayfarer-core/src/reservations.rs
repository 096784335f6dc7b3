use std::time::Duration;

use rand::Rng;
use wayfarer_db::reservations::{self, ReservationRow, ReserveOutcome, STATUS_CANCELLED};
use wayfarer_db::users::UserRow;
use wayfarer_db::{events, DbError, DbPool};

use crate::error::CoreError;
use crate::Role;

/// Retries after the initial attempt when the store reports lock contention.
const MAX_RETRIES: u32 = 3;
const BASE_BACKOFF_MS: u64 = 10;
const JITTER_MS: u64 = 10;

fn backoff(attempt: u32) -> Duration {
    let jitter = rand::thread_rng().gen_range(0..=JITTER_MS);
    Duration::from_millis(BASE_BACKOFF_MS * (1u64 << attempt) + jitter)
}

/// Book `tickets` seats on an event. The capacity check and the insert run
/// atomically in the store; lock contention is retried with exponential
/// backoff before surfacing as a conflict.
pub async fn reserve(
    pool: &DbPool,
    requester: &UserRow,
    event_id: i64,
    tickets: i64,
) -> Result<ReservationRow, CoreError> {
    if tickets < 1 {
        return Err(CoreError::Validation(
            "Number of tickets must be at least 1".into(),
        ));
    }

    let mut attempt = 0;
    loop {
        match reservations::reserve_tickets(pool, event_id, requester.id, tickets).await {
            Ok(ReserveOutcome::Created(row)) => {
                tracing::info!(
                    reservation_id = row.id,
                    event_id,
                    user_id = requester.id,
                    tickets,
                    "reservation confirmed"
                );
                return Ok(row);
            }
            Ok(ReserveOutcome::CapacityExceeded { capacity, taken }) => {
                tracing::debug!(event_id, capacity, taken, tickets, "reservation over capacity");
                return Err(CoreError::CapacityExceeded);
            }
            Ok(ReserveOutcome::EventMissing) => return Err(CoreError::NotFound),
            Err(DbError::Sqlx(e)) if wayfarer_db::is_busy(&e) && attempt < MAX_RETRIES => {
                let delay = backoff(attempt);
                tracing::debug!(event_id, attempt, delay_ms = delay.as_millis() as u64,
                    "reservation hit lock contention, retrying");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(DbError::Sqlx(e)) if wayfarer_db::is_busy(&e) => {
                tracing::warn!(event_id, "reservation retries exhausted");
                return Err(CoreError::Conflict);
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// Cancel a reservation. Owner-only; cancelling an already cancelled
/// reservation is a successful no-op. Rows are never deleted.
pub async fn cancel(pool: &DbPool, requester: &UserRow, reservation_id: i64) -> Result<(), CoreError> {
    let row = reservations::get_reservation(pool, reservation_id)
        .await?
        .ok_or(CoreError::NotFound)?;
    if row.user_id != requester.id {
        return Err(CoreError::Forbidden);
    }
    if row.status == STATUS_CANCELLED {
        return Ok(());
    }
    reservations::cancel_reservation(pool, reservation_id).await?;
    tracing::info!(reservation_id, user_id = requester.id, "reservation cancelled");
    Ok(())
}

/// All of the requester's reservations, newest first, cancelled included.
pub async fn by_user(pool: &DbPool, requester: &UserRow) -> Result<Vec<ReservationRow>, CoreError> {
    Ok(reservations::list_reservations_by_user(pool, requester.id).await?)
}

/// Reservations for an event, visible only to its organizer (or an admin).
pub async fn by_event(
    pool: &DbPool,
    requester: &UserRow,
    event_id: i64,
) -> Result<Vec<ReservationRow>, CoreError> {
    let event = events::get_event(pool, event_id)
        .await?
        .ok_or(CoreError::NotFound)?;
    if event.organizer_id != requester.id && Role::parse(&requester.role) != Some(Role::Admin) {
        return Err(CoreError::Forbidden);
    }
    Ok(reservations::list_reservations_by_event(pool, event_id).await?)
}
