use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        admin::{ShowBookingCount, Stats, UserList},
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        bookings::{BookingList, CreateBookingRequest, CreatedBookings, OccupiedSeats},
        notifications::NotificationList,
        shows::{Numeric, RateShowRequest, RatingSummary, ShowList, ShowPayload, ShowtimeInput},
    },
    models::{Booking, Notification, Show, Showtime, User},
    response::{ApiResponse, Meta},
    routes::{admin, auth, bookings, health, notifications, params, shows},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::login,
        auth::register,
        shows::list_shows,
        shows::get_show,
        shows::create_show,
        shows::update_show,
        shows::delete_show,
        shows::rate_show,
        bookings::create_booking,
        bookings::occupied_seats,
        bookings::my_bookings,
        bookings::delete_booking,
        notifications::list_notifications,
        notifications::mark_read,
        admin::stats,
        admin::list_users,
        admin::delete_user,
        admin::list_bookings
    ),
    components(
        schemas(
            User,
            Show,
            Showtime,
            Booking,
            Notification,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            ShowPayload,
            ShowtimeInput,
            Numeric,
            RateShowRequest,
            RatingSummary,
            ShowList,
            CreateBookingRequest,
            CreatedBookings,
            BookingList,
            OccupiedSeats,
            NotificationList,
            UserList,
            Stats,
            ShowBookingCount,
            params::Pagination,
            params::SortOrder,
            params::ShowSortBy,
            Meta,
            ApiResponse<Show>,
            ApiResponse<ShowList>,
            ApiResponse<CreatedBookings>,
            ApiResponse<OccupiedSeats>,
            ApiResponse<Stats>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Movies", description = "Show catalog and showtimes"),
        (name = "Bookings", description = "Seat booking endpoints"),
        (name = "Notifications", description = "User notifications"),
        (name = "Admin", description = "Admin endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
