pub mod admin_service;
pub mod auth_service;
pub mod booking_refs;
pub mod booking_service;
pub mod notification_service;
pub mod seat_ledger;
pub mod show_service;
