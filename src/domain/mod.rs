pub mod auth;
pub mod auth_session;
pub mod todo;
pub mod user;
