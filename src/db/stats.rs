// src/db/stats.rs
use std::collections::HashMap;

use rusqlite::{params, Connection};
use time::{Date, Month, Time};

use crate::db::neighborhoods;
use crate::domain::resource::Resource;
use crate::domain::stats::{percent_change, round2, season_of, Season};
use crate::errors::ServerError;

/// One resource cell on the dashboard. `baseline` marks values that fell
/// back to the neighborhood's configured base load because the window had
/// no readings.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceAverage {
    pub average: f64,
    pub baseline: bool,
}

#[derive(Debug, Clone)]
pub struct DashboardRow {
    pub neighborhood: String,
    pub electricity: ResourceAverage,
    pub water: ResourceAverage,
    pub gas: ResourceAverage,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DailyPoint {
    pub day: String,
    pub average: f64,
}

#[derive(Debug, Clone)]
pub struct SummaryRow {
    pub neighborhood: String,
    pub resource: String,
    pub average: f64,
    pub peak: f64,
    pub minimum: f64,
    pub total: f64,
    pub samples: i64,
    /// Percent change of the average vs the previous month, when known.
    pub change_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthResourceAverage {
    pub month: u32,
    pub resource: String,
    pub average: f64,
    pub samples: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeasonResourceAverage {
    pub season: &'static str,
    pub resource: String,
    pub average: f64,
}

#[derive(Debug, Clone)]
pub struct YearBreakdown {
    pub months: Vec<MonthResourceAverage>,
    pub seasons: Vec<SeasonResourceAverage>,
}

/// Unix-second bounds [start, end) of a calendar month, UTC.
pub fn month_bounds(year: i32, month: u8) -> Result<(i64, i64), ServerError> {
    let month = Month::try_from(month)
        .map_err(|_| ServerError::BadRequest(format!("invalid month: {month}")))?;

    let start = Date::from_calendar_date(year, month, 1)
        .map_err(|e| ServerError::BadRequest(format!("invalid month window: {e}")))?;

    let next = match month {
        Month::December => Date::from_calendar_date(year + 1, Month::January, 1),
        _ => Date::from_calendar_date(year, month.next(), 1),
    }
    .map_err(|e| ServerError::BadRequest(format!("invalid month window: {e}")))?;

    Ok((
        start.with_time(Time::MIDNIGHT).assume_utc().unix_timestamp(),
        next.with_time(Time::MIDNIGHT).assume_utc().unix_timestamp(),
    ))
}

/// Unix-second bounds [start, end) of a calendar year, UTC.
pub fn year_bounds(year: i32) -> Result<(i64, i64), ServerError> {
    let (start, _) = month_bounds(year, 1)?;
    let (end, _) = month_bounds(year + 1, 1)?;
    Ok((start, end))
}

fn averages_by_scope(
    conn: &Connection,
    since: i64,
) -> Result<HashMap<(String, String), f64>, ServerError> {
    let mut stmt = conn
        .prepare(
            r#"
            SELECT neighborhood, resource, AVG(amount)
            FROM readings
            WHERE recorded_at >= ?1
            GROUP BY neighborhood, resource
            "#,
        )
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    let rows = stmt
        .query_map(params![since], |row| {
            Ok((
                (row.get::<_, String>(0)?, row.get::<_, String>(1)?),
                row.get::<_, f64>(2)?,
            ))
        })
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    let mut map = HashMap::new();
    for r in rows {
        let (key, avg) = r.map_err(|e| ServerError::DbError(e.to_string()))?;
        map.insert(key, avg);
    }
    Ok(map)
}

/// Per-neighborhood averages over the window for all three resources.
/// Neighborhoods without readings in the window fall back to their
/// configured base values.
pub fn dashboard(conn: &Connection, since: i64) -> Result<Vec<DashboardRow>, ServerError> {
    let averages = averages_by_scope(conn, since)?;

    let cell = |name: &str, resource: Resource, base: f64| -> ResourceAverage {
        match averages.get(&(name.to_string(), resource.as_str().to_string())) {
            Some(avg) => ResourceAverage {
                average: round2(*avg),
                baseline: false,
            },
            None => ResourceAverage {
                average: base,
                baseline: true,
            },
        }
    };

    let mut out = Vec::new();
    for n in neighborhoods::list_all(conn)? {
        out.push(DashboardRow {
            electricity: cell(&n.name, Resource::Electricity, n.base_electricity),
            water: cell(&n.name, Resource::Water, n.base_water),
            gas: cell(&n.name, Resource::Gas, n.base_gas),
            neighborhood: n.name,
        });
    }
    Ok(out)
}

/// Daily averages for one meter scope since the cutoff, oldest day first.
pub fn daily_series(
    conn: &Connection,
    neighborhood: &str,
    resource: Resource,
    since: i64,
) -> Result<Vec<DailyPoint>, ServerError> {
    let mut stmt = conn
        .prepare(
            r#"
            SELECT
                DATE(recorded_at, 'unixepoch'),   -- 0
                ROUND(AVG(amount), 2)             -- 1
            FROM readings
            WHERE neighborhood = ?1 AND resource = ?2 AND recorded_at >= ?3
            GROUP BY DATE(recorded_at, 'unixepoch')
            ORDER BY DATE(recorded_at, 'unixepoch')
            "#,
        )
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    let rows = stmt
        .query_map(params![neighborhood, resource.as_str(), since], |row| {
            Ok(DailyPoint {
                day: row.get(0)?,
                average: row.get(1)?,
            })
        })
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r.map_err(|e| ServerError::DbError(e.to_string()))?);
    }
    Ok(out)
}

fn window_aggregates(
    conn: &Connection,
    from: i64,
    to: i64,
) -> Result<Vec<(String, String, f64, f64, f64, f64, i64)>, ServerError> {
    let mut stmt = conn
        .prepare(
            r#"
            SELECT
                neighborhood,        -- 0
                resource,            -- 1
                AVG(amount),         -- 2
                MAX(amount),         -- 3
                MIN(amount),         -- 4
                SUM(amount),         -- 5
                COUNT(*)             -- 6
            FROM readings
            WHERE recorded_at >= ?1 AND recorded_at < ?2
            GROUP BY neighborhood, resource
            ORDER BY neighborhood, resource
            "#,
        )
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    let rows = stmt
        .query_map(params![from, to], |row| {
            Ok((
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
                row.get(5)?,
                row.get(6)?,
            ))
        })
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r.map_err(|e| ServerError::DbError(e.to_string()))?);
    }
    Ok(out)
}

/// Statistical summary of one calendar month: average, peak, minimum, total
/// and sample count per (neighborhood, resource), plus the percent change of
/// the average against the month before.
pub fn monthly_summary(
    conn: &Connection,
    year: i32,
    month: u8,
) -> Result<Vec<SummaryRow>, ServerError> {
    let (from, to) = month_bounds(year, month)?;
    let (prev_from, prev_to) = if month == 1 {
        month_bounds(year - 1, 12)?
    } else {
        month_bounds(year, month - 1)?
    };

    let previous: HashMap<(String, String), f64> = window_aggregates(conn, prev_from, prev_to)?
        .into_iter()
        .map(|(n, r, avg, ..)| ((n, r), avg))
        .collect();

    let mut out = Vec::new();
    for (neighborhood, resource, avg, peak, minimum, total, samples) in
        window_aggregates(conn, from, to)?
    {
        let prev_avg = previous.get(&(neighborhood.clone(), resource.clone())).copied();
        out.push(SummaryRow {
            change_pct: percent_change(prev_avg, avg),
            average: round2(avg),
            peak,
            minimum,
            total: round2(total),
            samples,
            neighborhood,
            resource,
        });
    }
    Ok(out)
}

/// Monthly and seasonal averages per resource across one calendar year.
/// Season averages are weighted by sample count, not by month.
pub fn yearly_breakdown(conn: &Connection, year: i32) -> Result<YearBreakdown, ServerError> {
    let (from, to) = year_bounds(year)?;

    let mut stmt = conn
        .prepare(
            r#"
            SELECT
                CAST(STRFTIME('%m', recorded_at, 'unixepoch') AS INTEGER),  -- 0
                resource,                                                   -- 1
                AVG(amount),                                                -- 2
                COUNT(*)                                                    -- 3
            FROM readings
            WHERE recorded_at >= ?1 AND recorded_at < ?2
            GROUP BY 1, resource
            ORDER BY 1, resource
            "#,
        )
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    let rows = stmt
        .query_map(params![from, to], |row| {
            Ok(MonthResourceAverage {
                month: row.get::<_, i64>(0)? as u32,
                resource: row.get(1)?,
                average: row.get(2)?,
                samples: row.get(3)?,
            })
        })
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    let mut months = Vec::new();
    for r in rows {
        months.push(r.map_err(|e| ServerError::DbError(e.to_string()))?);
    }

    // (season, resource) -> (weighted sum, samples)
    let mut buckets: HashMap<(Season, String), (f64, i64)> = HashMap::new();
    for m in &months {
        let entry = buckets
            .entry((season_of(m.month), m.resource.clone()))
            .or_insert((0.0, 0));
        entry.0 += m.average * m.samples as f64;
        entry.1 += m.samples;
    }

    let mut seasons = Vec::new();
    for season in Season::ALL {
        for resource in Resource::ALL {
            if let Some((sum, samples)) = buckets.get(&(season, resource.as_str().to_string())) {
                if *samples > 0 {
                    seasons.push(SeasonResourceAverage {
                        season: season.as_str(),
                        resource: resource.as_str().to_string(),
                        average: round2(sum / *samples as f64),
                    });
                }
            }
        }
    }

    for m in &mut months {
        m.average = round2(m.average);
    }

    Ok(YearBreakdown { months, seasons })
}
