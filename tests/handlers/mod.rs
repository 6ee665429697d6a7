mod attendance;
mod auth;
mod middleware;
mod uploads;
