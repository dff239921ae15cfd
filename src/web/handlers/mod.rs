//! Route handler modules for the mingle-web REST API.

pub mod admin;
pub mod events;
pub mod friends;
pub mod health;
pub mod users;
