pub mod app;
pub mod auth;
pub mod config;
pub mod cv;
pub mod email;
pub mod error;
pub mod images;
pub mod messages;
pub mod projects;
pub mod session;
pub mod state;
pub mod users;
