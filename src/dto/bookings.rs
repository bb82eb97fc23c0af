use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::{
    dto::{is_blank, parse_datetime},
    error::{AppError, AppResult},
    models::Booking,
};

/// Wire shape of a booking request. Every field is optional here so that a
/// request missing several of them is rejected once, naming all of them.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub movie: Option<String>,
    /// Required and must parse, but the stored booking date is always the
    /// showtime's own start.
    pub date: Option<String>,
    pub seat_numbers: Option<Vec<i32>>,
    pub seat_number: Option<i32>,
    pub user: Option<String>,
    pub show_time_id: Option<String>,
}

/// A validated booking request: a non-empty, duplicate-free, ordered seat list.
#[derive(Debug, Clone, PartialEq)]
pub struct BookingCommand {
    pub show_id: Uuid,
    pub showtime_id: Uuid,
    pub user_id: Uuid,
    pub show_date: DateTime<Utc>,
    pub seats: Vec<i32>,
}

impl CreateBookingRequest {
    pub fn validate(self) -> AppResult<BookingCommand> {
        let seats = match (self.seat_numbers, self.seat_number) {
            (Some(list), _) if !list.is_empty() => Some(list),
            (_, Some(single)) => Some(vec![single]),
            _ => None,
        };

        let mut missing = Vec::new();
        if is_blank(&self.movie) {
            missing.push("movie");
        }
        if is_blank(&self.date) {
            missing.push("date");
        }
        if seats.is_none() {
            missing.push("seatNumbers");
        }
        if is_blank(&self.user) {
            missing.push("user");
        }
        if is_blank(&self.show_time_id) {
            missing.push("showTimeId");
        }
        if !missing.is_empty() {
            return Err(AppError::MissingFields(missing));
        }

        let show_id = parse_id("movie", self.movie.as_deref())?;
        let user_id = parse_id("user", self.user.as_deref())?;
        let showtime_id = parse_id("showTimeId", self.show_time_id.as_deref())?;
        let show_date = self
            .date
            .as_deref()
            .and_then(parse_datetime)
            .ok_or_else(|| AppError::BadRequest("date must be an ISO 8601 date".into()))?;

        let seats = seats.unwrap_or_default();
        let mut seen = HashSet::with_capacity(seats.len());
        for seat in &seats {
            if *seat <= 0 {
                return Err(AppError::BadRequest(format!(
                    "seat number {seat} must be positive"
                )));
            }
            if !seen.insert(*seat) {
                return Err(AppError::BadRequest(format!(
                    "seat number {seat} is requested twice"
                )));
            }
        }

        Ok(BookingCommand {
            show_id,
            showtime_id,
            user_id,
            show_date,
            seats,
        })
    }
}

pub(crate) fn parse_id(field: &'static str, raw: Option<&str>) -> AppResult<Uuid> {
    raw.map(str::trim)
        .and_then(|value| Uuid::parse_str(value).ok())
        .ok_or_else(|| AppError::BadRequest(format!("{field} must be a valid id")))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreatedBookings {
    pub bookings: Vec<Booking>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct BookingList {
    #[schema(value_type = Vec<Booking>)]
    pub items: Vec<Booking>,
}

#[derive(Debug, Deserialize, ToSchema, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct OccupiedSeatsQuery {
    pub movie_id: Option<String>,
    pub show_time_id: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OccupiedSeats {
    pub movie_id: Uuid,
    pub show_time_id: Uuid,
    pub occupied_seats: Vec<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CreateBookingRequest {
        CreateBookingRequest {
            movie: Some(Uuid::new_v4().to_string()),
            date: Some("2026-12-01T19:00:00Z".into()),
            seat_numbers: None,
            seat_number: Some(12),
            user: Some(Uuid::new_v4().to_string()),
            show_time_id: Some(Uuid::new_v4().to_string()),
        }
    }

    #[test]
    fn single_seat_becomes_a_one_element_list() {
        let command = request().validate().unwrap();
        assert_eq!(command.seats, vec![12]);
    }

    #[test]
    fn seat_list_wins_over_single_seat_and_keeps_order() {
        let mut req = request();
        req.seat_numbers = Some(vec![7, 3, 5]);
        assert_eq!(req.validate().unwrap().seats, vec![7, 3, 5]);
    }

    #[test]
    fn missing_user_is_named() {
        let mut req = request();
        req.user = None;
        match req.validate() {
            Err(AppError::MissingFields(fields)) => assert_eq!(fields, vec!["user"]),
            other => panic!("expected missing fields, got {other:?}"),
        }
    }

    #[test]
    fn every_missing_field_is_reported_at_once() {
        match CreateBookingRequest::default().validate() {
            Err(AppError::MissingFields(fields)) => assert_eq!(
                fields,
                vec!["movie", "date", "seatNumbers", "user", "showTimeId"]
            ),
            other => panic!("expected missing fields, got {other:?}"),
        }
    }

    #[test]
    fn empty_seat_list_counts_as_missing() {
        let mut req = request();
        req.seat_number = None;
        req.seat_numbers = Some(vec![]);
        assert!(matches!(
            req.validate(),
            Err(AppError::MissingFields(fields)) if fields == vec!["seatNumbers"]
        ));
    }

    #[test]
    fn rejects_duplicate_and_non_positive_seats() {
        let mut req = request();
        req.seat_numbers = Some(vec![4, 4]);
        assert!(matches!(req.validate(), Err(AppError::BadRequest(_))));

        let mut req = request();
        req.seat_numbers = Some(vec![0]);
        assert!(matches!(req.validate(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn malformed_id_names_the_field() {
        let mut req = request();
        req.movie = Some("not-an-id".into());
        match req.validate() {
            Err(AppError::BadRequest(msg)) => assert!(msg.starts_with("movie")),
            other => panic!("expected bad request, got {other:?}"),
        }
    }
}
