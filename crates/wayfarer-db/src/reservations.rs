use crate::{DbError, DbPool};
use chrono::{DateTime, Utc};

pub const STATUS_CONFIRMED: &str = "CONFIRMED";
pub const STATUS_CANCELLED: &str = "CANCELLED";

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ReservationRow {
    pub id: i64,
    pub user_id: i64,
    pub event_id: i64,
    pub tickets: i64,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

const COLUMNS: &str = "id, user_id, event_id, tickets, status, created_at";

/// Outcome of a single reservation attempt. Lock-contention errors are left
/// to the caller, which owns the retry policy.
#[derive(Debug)]
pub enum ReserveOutcome {
    Created(ReservationRow),
    /// Admitting the request would push the CONFIRMED sum past capacity.
    CapacityExceeded { capacity: i64, taken: i64 },
    EventMissing,
}

/// Create a CONFIRMED reservation iff it fits within the event's capacity.
///
/// The whole check-then-insert runs in one transaction whose first statement
/// is a write against the event row. Under SQLite that write takes the
/// database write lock up front, so concurrent attempts for the same event
/// (or any event) serialize: the aggregate below always sees every committed
/// reservation, and no two checks can interleave with their inserts.
pub async fn reserve_tickets(
    pool: &DbPool,
    event_id: i64,
    user_id: i64,
    tickets: i64,
) -> Result<ReserveOutcome, DbError> {
    let mut tx = pool.begin().await?;

    let touched = sqlx::query("UPDATE events SET id = id WHERE id = ?1")
        .bind(event_id)
        .execute(&mut *tx)
        .await?;
    if touched.rows_affected() == 0 {
        return Ok(ReserveOutcome::EventMissing);
    }

    let (capacity,): (i64,) = sqlx::query_as("SELECT capacity FROM events WHERE id = ?1")
        .bind(event_id)
        .fetch_one(&mut *tx)
        .await?;
    let taken = crate::events::confirmed_tickets(&mut *tx, event_id).await?;

    if taken + tickets > capacity {
        return Ok(ReserveOutcome::CapacityExceeded { capacity, taken });
    }

    let row = sqlx::query_as::<_, ReservationRow>(&format!(
        "INSERT INTO reservations (user_id, event_id, tickets, status)
         VALUES (?1, ?2, ?3, '{STATUS_CONFIRMED}')
         RETURNING {COLUMNS}"
    ))
    .bind(user_id)
    .bind(event_id)
    .bind(tickets)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(ReserveOutcome::Created(row))
}

pub async fn get_reservation(pool: &DbPool, id: i64) -> Result<Option<ReservationRow>, DbError> {
    let row = sqlx::query_as::<_, ReservationRow>(&format!(
        "SELECT {COLUMNS} FROM reservations WHERE id = ?1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// All reservations held by a user, newest first. Cancelled rows are part of
/// the history and stay in the listing.
pub async fn list_reservations_by_user(
    pool: &DbPool,
    user_id: i64,
) -> Result<Vec<ReservationRow>, DbError> {
    let rows = sqlx::query_as::<_, ReservationRow>(&format!(
        "SELECT {COLUMNS} FROM reservations
         WHERE user_id = ?1
         ORDER BY created_at DESC, id DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn list_reservations_by_event(
    pool: &DbPool,
    event_id: i64,
) -> Result<Vec<ReservationRow>, DbError> {
    let rows = sqlx::query_as::<_, ReservationRow>(&format!(
        "SELECT {COLUMNS} FROM reservations
         WHERE event_id = ?1
         ORDER BY created_at DESC, id DESC"
    ))
    .bind(event_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Flip a reservation to CANCELLED. Rows are never deleted; seat accounting
/// simply stops counting them. Cancelling a CANCELLED row is a no-op.
pub async fn cancel_reservation(pool: &DbPool, id: i64) -> Result<ReservationRow, DbError> {
    let row = sqlx::query_as::<_, ReservationRow>(&format!(
        "UPDATE reservations SET status = '{STATUS_CANCELLED}'
         WHERE id = ?1
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)?;
    Ok(row)
}
