use std::fmt::Write;

use chrono::NaiveDate;
use forecast_core::{ForecastEntry, ForecastResult};

/// Render a forecast as human-readable text, one block per day.
pub fn render_forecast(city: &str, forecast: &ForecastResult) -> String {
    let mut out = String::new();

    if forecast.is_empty() {
        let _ = writeln!(out, "No forecast data returned for {city}.");
        return out;
    }

    let _ = writeln!(out, "Forecast for {city} ({} timestamps)", forecast.len());

    let mut current_day: Option<NaiveDate> = None;
    for entry in &forecast.entries {
        let parsed = entry.parsed_timestamp();

        match parsed {
            Some(ts) if current_day != Some(ts.date()) => {
                current_day = Some(ts.date());
                let _ = writeln!(out, "\n{}", ts.format("%A, %d %B %Y"));
            }
            _ => {}
        }

        let time = match parsed {
            Some(ts) => ts.format("%H:%M").to_string(),
            None => entry.timestamp.clone(),
        };

        let _ = writeln!(out, "  {time}  {}", describe_entry(entry));
    }

    out
}

fn describe_entry(entry: &ForecastEntry) -> String {
    let m = &entry.measurements;

    let mut line = format!("{:>7}", celsius(m.temperature));
    let _ = write!(line, "  feels {}", celsius(m.feels_like));
    let _ = write!(line, "  min/max {}/{}", celsius(m.temp_min), celsius(m.temp_max));

    match m.humidity {
        Some(h) => {
            let _ = write!(line, "  humidity {h:.0}%");
        }
        None => line.push_str("  humidity n/a"),
    }

    if let Some(summary) = entry.summary() {
        let _ = write!(line, "  {summary}");
    }

    line
}

fn celsius(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.1}°C"),
        None => "n/a".to_string(),
    }
}
