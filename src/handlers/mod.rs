// handlers/mod.rs - Route handlers
//
// Public:  login, admin bootstrap, catalog reads, contact form
// Admin:   catalog writes (JWT + admin role, see middleware::auth)

pub mod auth;
pub mod catalog;
pub mod certificates;
pub mod contact;
pub mod products;
pub mod projects;
pub mod users;

use serde::Serialize;

/// Body of simple acknowledgement responses
#[derive(Debug, Serialize)]
pub struct Message {
    pub message: String,
}

impl Message {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
