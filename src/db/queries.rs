//! Database queries for the dashboard and the e-mail audit log

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::error::Result;
use crate::models::{CommissionFlowRow, EmailLogEntry, QuotationActivityRow, ReservationRow};

/// Reservations created in `[from, to)`
pub async fn get_reservations(
    pool: &PgPool,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<Vec<ReservationRow>> {
    let rows = sqlx::query_as::<_, ReservationRow>(
        r#"
        SELECT
            r.created_at,
            r.project_name,
            b.name AS broker_name,
            r.total_uf
        FROM reservations r
        LEFT JOIN brokers b ON b.id = r.broker_id
        WHERE r.created_at >= $1
          AND r.created_at < $2
        ORDER BY r.created_at
        "#,
    )
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Commission payments created in `[from, to)`
pub async fn get_commission_flows(
    pool: &PgPool,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<Vec<CommissionFlowRow>> {
    let rows = sqlx::query_as::<_, CommissionFlowRow>(
        r#"
        SELECT
            cf.created_at,
            cf.project_name,
            b.name AS broker_name,
            cf.amount_uf
        FROM commission_flows cf
        LEFT JOIN brokers b ON b.id = cf.broker_id
        WHERE cf.created_at >= $1
          AND cf.created_at < $2
        ORDER BY cf.created_at
        "#,
    )
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Quotations created in `[from, to)`
pub async fn get_quotation_activity(
    pool: &PgPool,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<Vec<QuotationActivityRow>> {
    let rows = sqlx::query_as::<_, QuotationActivityRow>(
        r#"
        SELECT
            q.created_at,
            q.project_name,
            b.name AS broker_name,
            q.total_deed_uf
        FROM quotations q
        LEFT JOIN brokers b ON b.id = q.broker_id
        WHERE q.created_at >= $1
          AND q.created_at < $2
        ORDER BY q.created_at
        "#,
    )
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Record a rendered e-mail
pub async fn insert_email_log(pool: &PgPool, entry: &EmailLogEntry) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO email_log (template, recipient, subject, body, status)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(&entry.template)
    .bind(&entry.recipient)
    .bind(&entry.subject)
    .bind(&entry.body)
    .bind(&entry.status)
    .execute(pool)
    .await?;

    Ok(())
}
