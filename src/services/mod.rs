pub mod auth_service;
pub mod tracking_service;
