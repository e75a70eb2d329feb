pub mod app;
pub mod appointments;
pub mod auth;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod patients;
pub mod remote;
pub mod schema;
pub mod settings;
pub mod shell;
pub mod state;
pub mod view;
