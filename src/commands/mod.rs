pub mod events;
pub mod shifts;
pub mod user;
pub mod watch;
