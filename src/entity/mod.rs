pub mod audit_logs;
pub mod bookings;
pub mod notifications;
pub mod ratings;
pub mod showtimes;
pub mod shows;
pub mod users;

pub use audit_logs::Entity as AuditLogs;
pub use bookings::Entity as Bookings;
pub use notifications::Entity as Notifications;
pub use ratings::Entity as Ratings;
pub use showtimes::Entity as Showtimes;
pub use shows::Entity as Shows;
pub use users::Entity as Users;
