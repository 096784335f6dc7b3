use crate::{DbError, DbPool};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EventRow {
    pub id: i64,
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
    pub status: String,
    pub organizer_id: i64,
    pub destination_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// Field set accepted by create/update. Keeps the bind lists in one place
/// instead of a dozen positional arguments.
#[derive(Debug, Clone)]
pub struct EventFields<'a> {
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub location: &'a str,
    pub capacity: i64,
    pub price: f64,
    pub category: Option<&'a str>,
    pub image_url: Option<&'a str>,
    pub status: &'a str,
    pub destination_id: Option<i64>,
}

const COLUMNS: &str = "id, title, description, date, time, start_date, end_date, location, \
                       capacity, price, category, image_url, status, organizer_id, \
                       destination_id, created_at";

pub async fn create_event(
    pool: &DbPool,
    organizer_id: i64,
    fields: &EventFields<'_>,
) -> Result<EventRow, DbError> {
    let row = sqlx::query_as::<_, EventRow>(&format!(
        "INSERT INTO events (title, description, date, time, start_date, end_date, location,
                             capacity, price, category, image_url, status, organizer_id,
                             destination_id)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
         RETURNING {COLUMNS}"
    ))
    .bind(fields.title)
    .bind(fields.description)
    .bind(fields.date)
    .bind(fields.time)
    .bind(fields.start_date)
    .bind(fields.end_date)
    .bind(fields.location)
    .bind(fields.capacity)
    .bind(fields.price)
    .bind(fields.category)
    .bind(fields.image_url)
    .bind(fields.status)
    .bind(organizer_id)
    .bind(fields.destination_id)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

pub async fn get_event(pool: &DbPool, id: i64) -> Result<Option<EventRow>, DbError> {
    let row = sqlx::query_as::<_, EventRow>(&format!(
        "SELECT {COLUMNS} FROM events WHERE id = ?1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn list_events(pool: &DbPool) -> Result<Vec<EventRow>, DbError> {
    let rows = sqlx::query_as::<_, EventRow>(&format!(
        "SELECT {COLUMNS} FROM events ORDER BY date, time"
    ))
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Case-insensitive substring match on location.
pub async fn search_events_by_location(
    pool: &DbPool,
    query: &str,
) -> Result<Vec<EventRow>, DbError> {
    let pattern = format!(
        "%{}%",
        query.trim().to_lowercase().replace('%', "\\%").replace('_', "\\_")
    );
    let rows = sqlx::query_as::<_, EventRow>(&format!(
        "SELECT {COLUMNS} FROM events
         WHERE lower(location) LIKE ?1 ESCAPE '\\'
         ORDER BY date, time"
    ))
    .bind(pattern)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn list_events_by_organizer(
    pool: &DbPool,
    organizer_id: i64,
) -> Result<Vec<EventRow>, DbError> {
    let rows = sqlx::query_as::<_, EventRow>(&format!(
        "SELECT {COLUMNS} FROM events WHERE organizer_id = ?1 ORDER BY date, time"
    ))
    .bind(organizer_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Sum of CONFIRMED tickets for an event, as seen by the given executor.
/// Runs inside the reservation/update transactions so the aggregate and the
/// write it guards observe the same snapshot.
pub async fn confirmed_tickets<'e, E>(executor: E, event_id: i64) -> Result<i64, DbError>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    let (sum,): (i64,) = sqlx::query_as(
        "SELECT COALESCE(SUM(tickets), 0) FROM reservations
         WHERE event_id = ?1 AND status = 'CONFIRMED'",
    )
    .bind(event_id)
    .fetch_one(executor)
    .await?;
    Ok(sum)
}

/// Outcome of a guarded capacity update.
#[derive(Debug)]
pub enum UpdateOutcome {
    Updated(EventRow),
    /// The requested capacity is below the committed CONFIRMED sum.
    CapacityConflict { confirmed: i64 },
    Missing,
}

/// Update an event under the database write lock. The leading UPDATE takes
/// the lock before the confirmed-ticket aggregate runs, so a concurrent
/// reservation cannot slip between the check and the write.
pub async fn update_event_guarded(
    pool: &DbPool,
    id: i64,
    fields: &EventFields<'_>,
) -> Result<UpdateOutcome, DbError> {
    let mut tx = pool.begin().await?;

    let touched = sqlx::query("UPDATE events SET id = id WHERE id = ?1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    if touched.rows_affected() == 0 {
        return Ok(UpdateOutcome::Missing);
    }

    let confirmed = confirmed_tickets(&mut *tx, id).await?;
    if fields.capacity < confirmed {
        return Ok(UpdateOutcome::CapacityConflict { confirmed });
    }

    let row = sqlx::query_as::<_, EventRow>(&format!(
        "UPDATE events
         SET title = ?2, description = ?3, date = ?4, time = ?5, start_date = ?6,
             end_date = ?7, location = ?8, capacity = ?9, price = ?10, category = ?11,
             image_url = ?12, status = ?13, destination_id = ?14
         WHERE id = ?1
         RETURNING {COLUMNS}"
    ))
    .bind(id)
    .bind(fields.title)
    .bind(fields.description)
    .bind(fields.date)
    .bind(fields.time)
    .bind(fields.start_date)
    .bind(fields.end_date)
    .bind(fields.location)
    .bind(fields.capacity)
    .bind(fields.price)
    .bind(fields.category)
    .bind(fields.image_url)
    .bind(fields.status)
    .bind(fields.destination_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(UpdateOutcome::Updated(row))
}

/// Outcome of a guarded delete.
#[derive(Debug)]
pub enum DeleteOutcome {
    Deleted,
    /// CONFIRMED reservations still reference the event.
    HasConfirmedReservations { confirmed: i64 },
    Missing,
}

pub async fn delete_event_guarded(pool: &DbPool, id: i64) -> Result<DeleteOutcome, DbError> {
    let mut tx = pool.begin().await?;

    let touched = sqlx::query("UPDATE events SET id = id WHERE id = ?1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    if touched.rows_affected() == 0 {
        return Ok(DeleteOutcome::Missing);
    }

    let confirmed = confirmed_tickets(&mut *tx, id).await?;
    if confirmed > 0 {
        return Ok(DeleteOutcome::HasConfirmedReservations { confirmed });
    }

    // Cancelled history rows go with the event.
    sqlx::query("DELETE FROM reservations WHERE event_id = ?1")
        .bind(id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM events WHERE id = ?1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(DeleteOutcome::Deleted)
}
