pub mod attendance;
pub mod cookies;
pub mod jwt;
pub mod students;
pub mod timezone;
pub mod uploads;
pub mod users;
