use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dto::{bookings::parse_id, is_blank, parse_datetime},
    error::{AppError, AppResult},
    models::Show,
};

/// A number that may arrive as a JSON number or as a numeric string
/// (form posts send everything as text).
#[derive(Debug, Clone, PartialEq, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum Numeric {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Numeric {
    pub fn to_i64(&self) -> Option<i64> {
        match self {
            Numeric::Int(value) => Some(*value),
            Numeric::Float(value) => whole(*value),
            Numeric::Text(raw) => {
                let raw = raw.trim();
                raw.parse::<i64>()
                    .ok()
                    .or_else(|| raw.parse::<f64>().ok().and_then(whole))
            }
        }
    }
}

fn whole(value: f64) -> Option<i64> {
    (value.is_finite() && value.fract() == 0.0).then_some(value as i64)
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ShowtimeInput {
    /// Present when the entry keeps an existing showtime.
    pub id: Option<String>,
    pub date: Option<String>,
}

/// Body of both create and update. Updates are full replacements, so the two
/// share one shape and one validation path.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShowPayload {
    pub title: Option<String>,
    pub description: Option<String>,
    pub director: Option<String>,
    pub genre: Option<String>,
    pub duration: Option<Numeric>,
    pub room: Option<String>,
    pub total_seats: Option<Numeric>,
    /// Ticket price in minor currency units (cents), so `2999` is 29.99.
    /// Fractional values are rejected.
    pub price: Option<Numeric>,
    pub poster: Option<String>,
    pub actors: Option<Vec<String>>,
    pub show_times: Option<Vec<ShowtimeInput>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShowtimeDraft {
    pub id: Option<Uuid>,
    pub starts_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShowDraft {
    pub title: String,
    pub description: String,
    pub director: String,
    pub genre: String,
    pub duration_minutes: i32,
    pub room: String,
    pub total_seats: i32,
    pub price: i64,
    pub poster: Option<String>,
    pub actors: Vec<String>,
    pub showtimes: Vec<ShowtimeDraft>,
}

impl ShowPayload {
    pub fn validate(self) -> AppResult<ShowDraft> {
        let mut missing = Vec::new();
        for (field, value) in [
            ("title", &self.title),
            ("description", &self.description),
            ("director", &self.director),
            ("genre", &self.genre),
            ("room", &self.room),
        ] {
            if is_blank(value) {
                missing.push(field);
            }
        }
        for (field, value) in [
            ("duration", &self.duration),
            ("totalSeats", &self.total_seats),
            ("price", &self.price),
        ] {
            if value.is_none() {
                missing.push(field);
            }
        }
        if !missing.is_empty() {
            return Err(AppError::MissingFields(missing));
        }

        let duration_minutes = bounded_int("duration", self.duration.as_ref(), 1)?;
        let total_seats = bounded_int("totalSeats", self.total_seats.as_ref(), 1)?;
        let price = self
            .price
            .as_ref()
            .and_then(Numeric::to_i64)
            .filter(|price| *price >= 0)
            .ok_or_else(|| {
                AppError::BadRequest(
                    "price must be a non-negative whole number of minor currency units (cents)"
                        .into(),
                )
            })?;

        let actors: Vec<String> = self
            .actors
            .unwrap_or_default()
            .into_iter()
            .map(|name| name.trim().to_owned())
            .collect();
        if actors.iter().any(String::is_empty) {
            return Err(AppError::BadRequest("actor names must not be empty".into()));
        }

        let showtimes = validate_showtimes(self.show_times.unwrap_or_default())?;

        Ok(ShowDraft {
            title: trimmed(self.title),
            description: trimmed(self.description),
            director: trimmed(self.director),
            genre: trimmed(self.genre),
            duration_minutes,
            room: trimmed(self.room),
            total_seats,
            price,
            poster: self.poster.filter(|p| !p.trim().is_empty()),
            actors,
            showtimes,
        })
    }
}

fn trimmed(value: Option<String>) -> String {
    value.map(|v| v.trim().to_owned()).unwrap_or_default()
}

fn bounded_int(field: &'static str, value: Option<&Numeric>, min: i64) -> AppResult<i32> {
    value
        .and_then(Numeric::to_i64)
        .filter(|v| *v >= min)
        .and_then(|v| i32::try_from(v).ok())
        .ok_or_else(|| AppError::BadRequest(format!("{field} must be an integer >= {min}")))
}

fn validate_showtimes(inputs: Vec<ShowtimeInput>) -> AppResult<Vec<ShowtimeDraft>> {
    let mut seen = HashSet::new();
    let mut drafts = Vec::with_capacity(inputs.len());
    for (index, input) in inputs.into_iter().enumerate() {
        let id = match input.id.as_deref().filter(|raw| !raw.trim().is_empty()) {
            Some(raw) => {
                let id = parse_id("showTimes.id", Some(raw))?;
                if !seen.insert(id) {
                    return Err(AppError::BadRequest(format!(
                        "showtime {id} is listed twice"
                    )));
                }
                Some(id)
            }
            None => None,
        };
        let starts_at = input
            .date
            .as_deref()
            .and_then(parse_datetime)
            .ok_or_else(|| {
                AppError::BadRequest(format!("showTimes[{index}].date must be an ISO 8601 date"))
            })?;
        drafts.push(ShowtimeDraft { id, starts_at });
    }
    Ok(drafts)
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RateShowRequest {
    pub value: i32,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct ShowList {
    #[schema(value_type = Vec<Show>)]
    pub items: Vec<Show>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RatingSummary {
    pub movie_id: Uuid,
    pub your_rating: i32,
    pub average_rating: f64,
    pub rating_count: i32,
}
