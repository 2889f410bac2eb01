//! Queries on the `users` table.

use crate::db::{DbError, Lookup};
use crate::models::{TeamMember, User};
use sqlx::SqliteConnection;

/// Read a user together with the name of their home team.
///
/// The home team is the earliest membership row for the user, so adding a
/// user to another team later never changes which team they resolve to.
pub async fn find_user(
    conn: &mut SqliteConnection,
    user_id: &str,
) -> Result<Lookup<User>, DbError> {
    let user: Option<User> = sqlx::query_as(
        r#"
        SELECT u.user_id, u.username, u.is_active,
               COALESCE(
                   (SELECT t.name
                    FROM team_members tm
                    JOIN teams t ON t.team_id = tm.team_id
                    WHERE tm.user_id = u.user_id
                    ORDER BY tm.rowid
                    LIMIT 1),
                   ''
               ) AS team_name
        FROM users u
        WHERE u.user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(conn)
    .await?;

    Ok(user.into())
}

/// Insert a team member's user row unless the user already exists.
///
/// An existing user keeps its stored name and activity flag.
pub async fn insert_user_if_absent(
    conn: &mut SqliteConnection,
    member: &TeamMember,
) -> Result<(), DbError> {
    sqlx::query(
        r#"
        INSERT INTO users (user_id, username, is_active)
        VALUES (?, ?, ?)
        ON CONFLICT (user_id) DO NOTHING
        "#,
    )
    .bind(&member.user_id)
    .bind(&member.username)
    .bind(member.is_active)
    .execute(conn)
    .await?;

    Ok(())
}

/// Set the activity flag.
///
/// # Returns
/// `false` when no user has the given id
pub async fn set_active(
    conn: &mut SqliteConnection,
    user_id: &str,
    is_active: bool,
) -> Result<bool, DbError> {
    let result = sqlx::query("UPDATE users SET is_active = ? WHERE user_id = ?")
        .bind(is_active)
        .bind(user_id)
        .execute(conn)
        .await?;

    Ok(result.rows_affected() > 0)
}
