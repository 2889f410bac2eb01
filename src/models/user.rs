//! User model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A user with the name of the team they resolve to.
///
/// `team_name` is empty for users without any team membership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub user_id: String,
    pub username: String,
    pub team_name: String,
    pub is_active: bool,
}
