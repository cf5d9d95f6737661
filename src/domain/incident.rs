// src/domain/incident.rs
use crate::errors::ServerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncidentStatus {
    Ongoing,
    Resolved,
}

impl IncidentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            IncidentStatus::Ongoing => "ongoing",
            IncidentStatus::Resolved => "resolved",
        }
    }

    pub fn parse(s: &str) -> Result<IncidentStatus, ServerError> {
        match s.trim().to_lowercase().as_str() {
            "ongoing" => Ok(IncidentStatus::Ongoing),
            "resolved" => Ok(IncidentStatus::Resolved),
            other => Err(ServerError::BadRequest(format!(
                "unknown incident status: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncidentKind {
    /// Reported fault, effective immediately.
    Instant,
    /// Scheduled outage with a start/end window.
    Planned,
}

impl IncidentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            IncidentKind::Instant => "instant",
            IncidentKind::Planned => "planned",
        }
    }

    pub fn parse(s: &str) -> Result<IncidentKind, ServerError> {
        match s.trim().to_lowercase().as_str() {
            "instant" => Ok(IncidentKind::Instant),
            "planned" => Ok(IncidentKind::Planned),
            other => Err(ServerError::BadRequest(format!(
                "unknown incident kind: {other}"
            ))),
        }
    }
}

/// Whether a planned outage window covers `now`. Instant incidents are
/// active from `started_at` until resolved, so `ended_at` is None for them.
pub fn window_is_active(now: i64, started_at: i64, ended_at: Option<i64>) -> bool {
    if now < started_at {
        return false;
    }
    match ended_at {
        Some(end) => now < end,
        None => true,
    }
}
