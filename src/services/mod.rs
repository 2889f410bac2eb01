//! Business logic services.
//!
//! Transactional operations live in `assignment`, `teams` and `users`;
//! `review_service` wraps them with deadlines and error classification, and
//! `api`/`server` expose that service over HTTP.

pub mod api;
pub mod assignment;
pub mod deadline;
pub mod review_service;
pub mod selection;
pub mod server;
pub mod teams;
pub mod users;

pub use review_service::ReviewService;
