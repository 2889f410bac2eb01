//! Reviewer Assign - pull request reviewer assignment service.
//!
//! Teams of users, pull requests with automatically assigned reviewers,
//! reviewer reassignment and merge tracking, persisted in SQLite and served
//! over a small JSON API.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
