pub mod admin;
pub mod bookings;
pub mod public;
