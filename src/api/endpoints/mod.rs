//! Endpoint handlers for the verification API.

pub mod health;
pub mod verify;
