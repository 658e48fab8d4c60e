//! Database queries for the quoting engine.

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;

use super::models::{BrokerCommissionRow, NewQuotation, QuotationRecord, UnitRow};

/// Stock rows for a project, ordered by unit code.
///
/// Kind filtering happens after parsing since the kind column is free text.
pub async fn find_units(pool: &PgPool, project_name: &str) -> Result<Vec<UnitRow>, AppError> {
    let rows = sqlx::query_as::<_, UnitRow>(
        r#"
        SELECT
            project_name, unit_code, typology, floor,
            useful_area, terrace_area, total_area,
            list_price, base_discount, status, kind
        FROM stock_units
        WHERE project_name = $1
        ORDER BY unit_code
        "#,
    )
    .bind(project_name)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Distinct project names with stock
pub async fn list_projects(pool: &PgPool) -> Result<Vec<String>, AppError> {
    let projects: Vec<String> = sqlx::query_scalar(
        r#"
        SELECT DISTINCT project_name
        FROM stock_units
        WHERE project_name IS NOT NULL
        ORDER BY project_name
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(projects)
}

/// Commission agreed for a broker on a project
pub async fn find_broker_commission(
    pool: &PgPool,
    broker_id: Uuid,
    project_name: &str,
) -> Result<Option<BrokerCommissionRow>, AppError> {
    let row = sqlx::query_as::<_, BrokerCommissionRow>(
        r#"
        SELECT broker_id, project_name, commission_rate
        FROM broker_project_commissions
        WHERE broker_id = $1
          AND project_name = $2
        LIMIT 1
        "#,
    )
    .bind(broker_id)
    .bind(project_name)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Insert a quotation, returning its id
pub async fn insert_quotation(pool: &PgPool, quotation: &NewQuotation) -> Result<Uuid, AppError> {
    let id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO quotations (
            broker_id, client_name, client_rut, client_email, client_phone,
            project_name, unit_code, mode, total_deed_uf,
            state, breakdown, notes
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        RETURNING id
        "#,
    )
    .bind(quotation.broker_id)
    .bind(&quotation.client.name)
    .bind(&quotation.client.rut)
    .bind(&quotation.client.email)
    .bind(&quotation.client.phone)
    .bind(&quotation.project_name)
    .bind(&quotation.unit_code)
    .bind(&quotation.mode)
    .bind(quotation.total_deed_uf)
    .bind(&quotation.state)
    .bind(&quotation.breakdown)
    .bind(&quotation.notes)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Get a stored quotation by id
pub async fn get_quotation(pool: &PgPool, id: Uuid) -> Result<QuotationRecord, AppError> {
    sqlx::query_as::<_, QuotationRecord>(
        r#"
        SELECT
            id, broker_id, client_name, client_rut, client_email,
            project_name, unit_code, mode, total_deed_uf,
            state, notes, created_at
        FROM quotations
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound)
}
