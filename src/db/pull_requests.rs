//! Queries on `pull_requests` and `pr_reviewers`.

use crate::db::{DbError, Lookup};
use crate::models::{NewPullRequest, PrStatus, PullRequest, PullRequestRow, PullRequestShort};
use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

/// Insert a pull request in `OPEN` status.
///
/// A duplicate id surfaces as `DbError::UniqueViolation`; an unknown author as
/// `DbError::ConstraintViolation`.
pub async fn insert_pull_request(
    conn: &mut SqliteConnection,
    pr: &NewPullRequest,
    created_at: DateTime<Utc>,
) -> Result<(), DbError> {
    sqlx::query(
        r#"
        INSERT INTO pull_requests (pull_request_id, pull_request_name, author_id, status, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&pr.pull_request_id)
    .bind(&pr.pull_request_name)
    .bind(&pr.author_id)
    .bind(PrStatus::Open.as_str())
    .bind(created_at)
    .execute(conn)
    .await?;

    Ok(())
}

/// Read the status of a pull request while taking the database write lock.
///
/// The no-op update makes the enclosing transaction a writer from its first
/// statement, so competing writers wait until it commits or rolls back.
pub async fn lock_status(
    conn: &mut SqliteConnection,
    pr_id: &str,
) -> Result<Lookup<PrStatus>, DbError> {
    let status: Option<String> = sqlx::query_scalar(
        "UPDATE pull_requests SET status = status WHERE pull_request_id = ? RETURNING status",
    )
    .bind(pr_id)
    .fetch_optional(conn)
    .await?;

    match status {
        Some(raw) => PrStatus::try_from(raw)
            .map(Lookup::Found)
            .map_err(|e| DbError::Sqlite(sqlx::Error::Decode(e.into()))),
        None => Ok(Lookup::NotFound),
    }
}

/// Move a pull request from `OPEN` to `MERGED`.
///
/// The status guard is part of the update, so of several concurrent callers
/// exactly one sees an affected row.
///
/// # Returns
/// `false` when the pull request does not exist or is already merged
pub async fn mark_merged(
    conn: &mut SqliteConnection,
    pr_id: &str,
    merged_at: DateTime<Utc>,
) -> Result<bool, DbError> {
    let result = sqlx::query(
        r#"
        UPDATE pull_requests
        SET status = ?, merged_at = ?
        WHERE pull_request_id = ? AND status = ?
        "#,
    )
    .bind(PrStatus::Merged.as_str())
    .bind(merged_at)
    .bind(pr_id)
    .bind(PrStatus::Open.as_str())
    .execute(conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Author of a pull request.
pub async fn author_of(
    conn: &mut SqliteConnection,
    pr_id: &str,
) -> Result<Lookup<String>, DbError> {
    let author: Option<String> =
        sqlx::query_scalar("SELECT author_id FROM pull_requests WHERE pull_request_id = ?")
            .bind(pr_id)
            .fetch_optional(conn)
            .await?;

    Ok(author.into())
}

/// Current reviewer ids of a pull request, ordered by user id.
pub async fn reviewer_ids(
    conn: &mut SqliteConnection,
    pr_id: &str,
) -> Result<Vec<String>, DbError> {
    let ids: Vec<String> =
        sqlx::query_scalar("SELECT user_id FROM pr_reviewers WHERE pr_id = ? ORDER BY user_id")
            .bind(pr_id)
            .fetch_all(conn)
            .await?;

    Ok(ids)
}

/// Whether a user is currently assigned to review a pull request.
pub async fn is_reviewer(
    conn: &mut SqliteConnection,
    pr_id: &str,
    user_id: &str,
) -> Result<bool, DbError> {
    let assigned: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM pr_reviewers WHERE pr_id = ? AND user_id = ?)",
    )
    .bind(pr_id)
    .bind(user_id)
    .fetch_one(conn)
    .await?;

    Ok(assigned)
}

/// Assign a reviewer.
pub async fn add_reviewer(
    conn: &mut SqliteConnection,
    pr_id: &str,
    user_id: &str,
) -> Result<(), DbError> {
    sqlx::query("INSERT INTO pr_reviewers (pr_id, user_id) VALUES (?, ?)")
        .bind(pr_id)
        .bind(user_id)
        .execute(conn)
        .await?;

    Ok(())
}

/// Remove a reviewer.
///
/// # Returns
/// `false` when the user was not assigned
pub async fn remove_reviewer(
    conn: &mut SqliteConnection,
    pr_id: &str,
    user_id: &str,
) -> Result<bool, DbError> {
    let result = sqlx::query("DELETE FROM pr_reviewers WHERE pr_id = ? AND user_id = ?")
        .bind(pr_id)
        .bind(user_id)
        .execute(conn)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Read a full pull request record with its reviewer set.
pub async fn fetch_pull_request(
    conn: &mut SqliteConnection,
    pr_id: &str,
) -> Result<Lookup<PullRequest>, DbError> {
    let row: Option<PullRequestRow> = sqlx::query_as(
        r#"
        SELECT pull_request_id, pull_request_name, author_id, status, created_at, merged_at
        FROM pull_requests
        WHERE pull_request_id = ?
        "#,
    )
    .bind(pr_id)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(row) = row else {
        return Ok(Lookup::NotFound);
    };

    let reviewers = reviewer_ids(conn, pr_id).await?;
    Ok(Lookup::Found(row.with_reviewers(reviewers)))
}

/// Pull requests where the user is a current reviewer, newest first.
pub async fn reviewed_by(
    conn: &mut SqliteConnection,
    user_id: &str,
) -> Result<Vec<PullRequestShort>, DbError> {
    let prs = sqlx::query_as::<_, PullRequestShort>(
        r#"
        SELECT pr.pull_request_id, pr.pull_request_name, pr.author_id, pr.status
        FROM pull_requests pr
        JOIN pr_reviewers r ON r.pr_id = pr.pull_request_id
        WHERE r.user_id = ?
        ORDER BY pr.created_at DESC, pr.pull_request_id
        "#,
    )
    .bind(user_id)
    .fetch_all(conn)
    .await?;

    Ok(prs)
}
