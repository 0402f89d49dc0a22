//! Noticeboard - Campus notice board service
//!
//! Academic and club notices with role-based posting, club membership
//! applications and PDF attachments, served as a JSON API.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
