//! Inactivity watchdog for admin sessions. Tracks user activity, warns shortly before the session
//! runs out and sends the user to the login page once it does.
//!

pub mod activity;
pub mod args;
pub mod presentation;
pub mod session;
pub mod utils;
pub mod watchdog;
