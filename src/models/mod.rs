pub mod coordinate;
pub mod preferences;
pub mod route;
pub mod stop;
pub mod user;
