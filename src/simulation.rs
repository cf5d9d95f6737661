// src/simulation.rs
use chrono::{DateTime, Datelike, Days, Weekday};
use log::{info, warn};
use rand::Rng;

use crate::db::connection::Database;
use crate::db::incidents::{create_incident, find_by_id, IncidentRow, NewIncident};
use crate::db::neighborhoods::{self, NeighborhoodRow};
use crate::db::readings::{count_readings, insert_reading};
use crate::domain::incident::IncidentKind;
use crate::domain::resource::Resource;
use crate::errors::ServerError;

/// Create a random ongoing incident, the outage drill behind
/// POST /api/incidents/simulate.
pub fn generate_random_incident(db: &Database, now: i64) -> Result<IncidentRow, ServerError> {
    db.with_conn(|conn| {
        let all = neighborhoods::list_all(conn)?;
        if all.is_empty() {
            return Err(ServerError::DbError("no neighborhoods configured".into()));
        }

        let mut rng = rand::thread_rng();
        let neighborhood = &all[rng.gen_range(0..all.len())];
        let resource = Resource::ALL[rng.gen_range(0..Resource::ALL.len())];

        let incident = NewIncident {
            neighborhood: neighborhood.name.clone(),
            resource,
            kind: IncidentKind::Instant,
            description: Some(format!(
                "Unplanned {} outage detected in {}",
                resource, neighborhood.name
            )),
            started_at: now,
            ended_at: None,
            estimated_hours: None,
        };
        let id = create_incident(conn, &incident, now)?;
        warn!(
            "⚠️  simulated {} outage in {}",
            resource, neighborhood.name
        );
        find_by_id(conn, id)?.ok_or(ServerError::InternalError)
    })
}

/// Seasonal consumption multiplier. A coarse model of the production data:
/// gas peaks with winter heating, electricity with summer cooling and winter
/// lighting, water with summer irrigation.
pub fn seasonal_factor(month: u32, resource: Resource) -> f64 {
    match resource {
        Resource::Electricity => match month {
            7 | 8 => 1.8,
            12 | 1 => 1.4,
            6 | 9 => 1.3,
            _ => 1.0,
        },
        Resource::Water => match month {
            6..=8 => 1.6,
            5 | 9 => 1.2,
            _ => 1.0,
        },
        Resource::Gas => match month {
            12 | 1 | 2 => 6.0,
            11 | 3 => 3.0,
            10 | 4 => 1.5,
            _ => 1.0,
        },
    }
}

/// Weekday/weekend multiplier per neighborhood profile.
pub fn day_factor(weekday: Weekday, profile: &str) -> f64 {
    let weekend = matches!(weekday, Weekday::Sat | Weekday::Sun);
    match profile {
        "industrial" => 1.0,
        "campus" => {
            if weekend {
                0.6
            } else {
                1.0
            }
        }
        // residential and anything unknown
        _ => {
            if weekend {
                1.1
            } else {
                0.95
            }
        }
    }
}

fn demo_amount<R: Rng>(
    rng: &mut R,
    neighborhood: &NeighborhoodRow,
    resource: Resource,
    month: u32,
    weekday: Weekday,
) -> (f64, bool) {
    let base = neighborhood.baseline(resource);
    let jitter = rng.gen_range(0.9..1.1);
    let mut amount = base * seasonal_factor(month, resource) * day_factor(weekday, &neighborhood.profile) * jitter;

    // Rare injected spike, flagged so dashboards have something to show.
    let anomaly = rng.gen_range(0..100) == 0;
    if anomaly {
        amount *= 3.0;
    }
    ((amount * 100.0).round() / 100.0, anomaly)
}

/// Insert one reading per day, neighborhood and resource for the given span,
/// ending at `now`. Returns the number of inserted readings.
pub fn seed_readings<R: Rng>(
    db: &Database,
    rng: &mut R,
    now: i64,
    days: u64,
) -> Result<usize, ServerError> {
    let today = DateTime::from_timestamp(now, 0)
        .ok_or(ServerError::InternalError)?
        .date_naive();

    db.with_conn(|conn| {
        let all = neighborhoods::list_all(conn)?;
        let mut inserted = 0;

        for offset in 0..days {
            let Some(date) = today.checked_sub_days(Days::new(offset)) else {
                continue;
            };
            let Some(noon) = date.and_hms_opt(12, 0, 0) else {
                continue;
            };
            let recorded_at = noon.and_utc().timestamp();

            for neighborhood in &all {
                for resource in Resource::ALL {
                    let (amount, anomaly) =
                        demo_amount(rng, neighborhood, resource, date.month(), date.weekday());
                    insert_reading(
                        conn,
                        &neighborhood.name,
                        resource,
                        amount,
                        resource.unit(),
                        recorded_at,
                        anomaly,
                    )?;
                    inserted += 1;
                }
            }
        }
        Ok(inserted)
    })
}

/// Seed a year of demo data, but only into an empty readings table.
pub fn seed_demo_if_empty(db: &Database, now: i64) -> Result<(), ServerError> {
    let existing = db.with_conn(|conn| count_readings(conn))?;
    if existing > 0 {
        info!("Demo seed skipped, {existing} readings already stored");
        return Ok(());
    }

    let mut rng = rand::thread_rng();
    let inserted = seed_readings(db, &mut rng, now, 365)?;
    info!("Seeded {inserted} demo readings");
    Ok(())
}
