//! Queries on `teams` and `team_members`.

use crate::db::{DbError, Lookup};
use crate::models::TeamMember;
use sqlx::SqliteConnection;

/// Insert a team row.
///
/// A duplicate name surfaces as `DbError::UniqueViolation`.
pub async fn insert_team(
    conn: &mut SqliteConnection,
    team_id: &str,
    name: &str,
) -> Result<(), DbError> {
    sqlx::query("INSERT INTO teams (team_id, name) VALUES (?, ?)")
        .bind(team_id)
        .bind(name)
        .execute(conn)
        .await?;

    Ok(())
}

/// Add a user to a team. Re-adding an existing member is a no-op.
pub async fn add_member(
    conn: &mut SqliteConnection,
    team_id: &str,
    user_id: &str,
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO team_members (team_id, user_id) VALUES (?, ?) ON CONFLICT (team_id, user_id) DO NOTHING",
    )
    .bind(team_id)
    .bind(user_id)
    .execute(conn)
    .await?;

    Ok(())
}

/// Look up a team id by its unique name.
pub async fn team_id_by_name(
    conn: &mut SqliteConnection,
    name: &str,
) -> Result<Lookup<String>, DbError> {
    let team_id: Option<String> = sqlx::query_scalar("SELECT team_id FROM teams WHERE name = ?")
        .bind(name)
        .fetch_optional(conn)
        .await?;

    Ok(team_id.into())
}

/// All members of a team, ordered by user id.
pub async fn members_of(
    conn: &mut SqliteConnection,
    team_id: &str,
) -> Result<Vec<TeamMember>, DbError> {
    let members = sqlx::query_as::<_, TeamMember>(
        r#"
        SELECT u.user_id, u.username, u.is_active
        FROM users u
        JOIN team_members tm ON tm.user_id = u.user_id
        WHERE tm.team_id = ?
        ORDER BY u.user_id
        "#,
    )
    .bind(team_id)
    .fetch_all(conn)
    .await?;

    Ok(members)
}

/// Resolve the team a user belongs to.
///
/// Users may hold several memberships; the earliest one wins.
pub async fn team_of_user(
    conn: &mut SqliteConnection,
    user_id: &str,
) -> Result<Lookup<String>, DbError> {
    let team_id: Option<String> = sqlx::query_scalar(
        "SELECT team_id FROM team_members WHERE user_id = ? ORDER BY rowid LIMIT 1",
    )
    .bind(user_id)
    .fetch_optional(conn)
    .await?;

    Ok(team_id.into())
}

/// Ids of the active members of a team, ordered by user id.
///
/// The caller removes ineligible users and samples from the rest, so no
/// store-specific random ordering is involved.
pub async fn active_member_ids(
    conn: &mut SqliteConnection,
    team_id: &str,
) -> Result<Vec<String>, DbError> {
    let ids: Vec<String> = sqlx::query_scalar(
        r#"
        SELECT u.user_id
        FROM users u
        JOIN team_members tm ON tm.user_id = u.user_id
        WHERE tm.team_id = ? AND u.is_active = 1
        ORDER BY u.user_id
        "#,
    )
    .bind(team_id)
    .fetch_all(conn)
    .await?;

    Ok(ids)
}
