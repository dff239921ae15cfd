pub mod auth;
pub mod error;
pub mod events;
pub mod friends;
pub mod logging;
pub mod photos;
pub mod storage;
pub mod visibility;
pub mod web;
