//! API handlers
//!
//! Author: hephaex@gmail.com

pub mod extract;
pub mod health;
pub mod openapi;
