//! Bus "leave now" alert engine.
//!
//! Watches live arrivals for a user's registered (stop, route) pairs and
//! raises a notification at the moment walking to the stop would reach it
//! just before the bus does.

pub mod cache;
pub mod config;
pub mod domain;
pub mod engine;
pub mod feed;
pub mod notify;
pub mod position;
pub mod registry;
pub mod scheduler;
pub mod suppression;
pub mod walking;
pub mod web;
