pub mod attendance;
pub mod students;
pub mod users;
