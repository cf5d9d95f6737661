// src/domain/stats.rs

/// Percentage change from `previous` to `current`, rounded to two decimals.
/// None when there is no previous value to compare against.
pub fn percent_change(previous: Option<f64>, current: f64) -> Option<f64> {
    match previous {
        Some(prev) if prev != 0.0 => Some(round2((current - prev) / prev * 100.0)),
        _ => None,
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Autumn,
}

impl Season {
    pub const ALL: [Season; 4] = [Season::Winter, Season::Spring, Season::Summer, Season::Autumn];

    pub fn as_str(self) -> &'static str {
        match self {
            Season::Winter => "winter",
            Season::Spring => "spring",
            Season::Summer => "summer",
            Season::Autumn => "autumn",
        }
    }
}

/// Meteorological seasons: Dec-Feb winter, Mar-May spring, and so on.
pub fn season_of(month: u32) -> Season {
    match month {
        12 | 1 | 2 => Season::Winter,
        3..=5 => Season::Spring,
        6..=8 => Season::Summer,
        _ => Season::Autumn,
    }
}

/// Standard-score anomaly check against a sample of recent values.
/// Returns false when the sample is too small to say anything.
pub fn is_anomalous(history: &[f64], value: f64, sigma: f64) -> bool {
    if history.len() < 8 {
        return false;
    }
    let n = history.len() as f64;
    let mean = history.iter().sum::<f64>() / n;
    let variance = history.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let std_dev = variance.sqrt();
    if std_dev == 0.0 {
        return value != mean;
    }
    ((value - mean) / std_dev).abs() > sigma
}
