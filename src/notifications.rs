//! Notification e-mail bodies.
//!
//! Each kind is an askama template with a fixed field set. Rendering is
//! followed by a best-effort write to the e-mail log; delivery happens
//! elsewhere.

use askama::Template;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::{info, warn};

use crate::cache::AppCache;
use crate::db;
use crate::error::{AppError, Result};
use crate::format::format_uf;
use crate::models::EmailLogEntry;

#[derive(Debug, Clone, Deserialize, Template)]
#[template(path = "email/task_assigned.html")]
pub struct TaskAssignedEmail {
    pub assignee_name: String,
    pub task_title: String,
    #[serde(default)]
    pub task_description: String,
    pub due_date: String,
    pub assigned_by: String,
}

#[derive(Debug, Clone, Deserialize, Template)]
#[template(path = "email/task_completed.html")]
pub struct TaskCompletedEmail {
    pub recipient_name: String,
    pub task_title: String,
    pub completed_by: String,
    pub completed_at: String,
}

#[derive(Debug, Clone, Deserialize, Template)]
#[template(path = "email/reservation_created.html")]
pub struct ReservationCreatedEmail {
    pub recipient_name: String,
    pub client_name: String,
    pub project_name: String,
    pub unit_code: String,
    pub broker_name: String,
    pub total_uf: Decimal,
}

impl ReservationCreatedEmail {
    pub fn total_label(&self) -> String {
        format_uf(self.total_uf)
    }
}

/// The three notification kinds, tagged by `kind` in JSON
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    TaskAssigned(TaskAssignedEmail),
    TaskCompleted(TaskCompletedEmail),
    ReservationCreated(ReservationCreatedEmail),
}

/// Body of `POST /api/notifications`
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationRequest {
    pub recipient: String,
    #[serde(flatten)]
    pub notification: Notification,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedEmail {
    pub template: &'static str,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NotificationResponse {
    pub recipient: String,
    #[serde(flatten)]
    pub email: RenderedEmail,
    /// Whether the audit row was written
    pub logged: bool,
}

impl Notification {
    pub fn template_name(&self) -> &'static str {
        match self {
            Notification::TaskAssigned(_) => "task_assigned",
            Notification::TaskCompleted(_) => "task_completed",
            Notification::ReservationCreated(_) => "reservation_created",
        }
    }

    pub fn subject(&self) -> String {
        match self {
            Notification::TaskAssigned(email) => format!("Nueva tarea asignada: {}", email.task_title),
            Notification::TaskCompleted(email) => format!("Tarea completada: {}", email.task_title),
            Notification::ReservationCreated(email) => format!(
                "Nueva reserva: {} {}",
                email.project_name, email.unit_code
            ),
        }
    }

    pub fn render(&self) -> Result<RenderedEmail> {
        let body = match self {
            Notification::TaskAssigned(email) => email.render()?,
            Notification::TaskCompleted(email) => email.render()?,
            Notification::ReservationCreated(email) => email.render()?,
        };

        Ok(RenderedEmail {
            template: self.template_name(),
            subject: self.subject(),
            body,
        })
    }
}

fn validate_recipient(recipient: &str) -> Result<&str> {
    let recipient = recipient.trim();
    match recipient.split_once('@') {
        Some((user, domain)) if !user.is_empty() && domain.contains('.') => Ok(recipient),
        _ => Err(AppError::BadRequest(format!(
            "invalid recipient '{}'",
            recipient
        ))),
    }
}

/// Render a notification and record it in the e-mail log.
///
/// A new reservation takes a unit off the market, so the project's stock
/// listing is dropped from the cache. A failed log write is only logged.
pub async fn dispatch(
    pool: &PgPool,
    cache: &AppCache,
    request: NotificationRequest,
) -> Result<NotificationResponse> {
    let recipient = validate_recipient(&request.recipient)?.to_string();
    let email = request.notification.render()?;

    if let Notification::ReservationCreated(reservation) = &request.notification {
        cache.invalidate_project(&reservation.project_name).await;
    }

    let entry = EmailLogEntry {
        template: email.template.to_string(),
        recipient: recipient.clone(),
        subject: email.subject.clone(),
        body: email.body.clone(),
        status: "rendered".to_string(),
    };

    let logged = match db::insert_email_log(pool, &entry).await {
        Ok(()) => {
            info!("Rendered {} e-mail for {}", email.template, recipient);
            true
        }
        Err(e) => {
            warn!("Could not log {} e-mail for {}: {}", email.template, recipient, e);
            false
        }
    };

    Ok(NotificationResponse {
        recipient,
        email,
        logged,
    })
}
