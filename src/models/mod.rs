//! Data models for the application.
//!
//! These models represent the entities stored in the SQLite database and
//! returned over the HTTP API. Row types derive `FromRow` for SQLx queries.

pub mod pull_request;
pub mod team;
pub mod user;

pub use pull_request::{
    NewPullRequest, PrStatus, PullRequest, PullRequestRow, PullRequestShort, Reassignment,
    UserReviews, INITIAL_REVIEWER_COUNT,
};
pub use team::{Team, TeamMember};
pub use user::User;
