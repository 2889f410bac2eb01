//! Reviewer assignment engine.
//!
//! Creates pull requests with an initial reviewer set, merges them, and swaps
//! a reviewer for another eligible team member. Every operation runs inside a
//! single transaction: an early return drops the transaction, which rolls back
//! everything it wrote. The deadline covers everything up to the commit; the
//! commit itself is never cut short.
//!
//! Invariants held at every commit:
//! - a reviewer is never the pull request's author
//! - a reviewer set holds no duplicates
//! - a merged pull request's status and reviewers never change
//! - a newly selected reviewer was an active member of the relevant team

use crate::db::pool::DbPool;
use crate::db::{pull_requests, teams, Lookup};
use crate::error::{EngineError, Rejection};
use crate::models::{NewPullRequest, PrStatus, PullRequest, Reassignment, INITIAL_REVIEWER_COUNT};
use crate::services::deadline::Deadline;
use crate::services::selection;
use chrono::Utc;
use sqlx::SqliteConnection;

/// Create a pull request in `OPEN` status and assign up to two reviewers.
///
/// Reviewers are drawn uniformly from the active members of the author's team,
/// excluding the author. An author without a team gets an empty reviewer set,
/// which is a normal outcome.
///
/// # Arguments
/// * `pool` - Database connection pool
/// * `input` - Pull request id, name and author
/// * `deadline` - Bound on the work before the commit
///
/// # Returns
/// The stored pull request including its reviewers
pub async fn create_pull_request(
    pool: &DbPool,
    input: &NewPullRequest,
    deadline: Deadline,
) -> Result<PullRequest, EngineError> {
    let (tx, pr) = deadline
        .guard(async {
            let mut tx = pool.begin().await?;

            // Duplicate id or unknown author fails here, before anything else is written
            pull_requests::insert_pull_request(&mut tx, input, Utc::now()).await?;

            let reviewers = initial_reviewers(&mut tx, &input.author_id).await?;
            for reviewer in &reviewers {
                pull_requests::add_reviewer(&mut tx, &input.pull_request_id, reviewer).await?;
            }

            let pr = pull_requests::fetch_pull_request(&mut tx, &input.pull_request_id)
                .await?
                .found_or_else(|| EngineError::not_found("PR not found after insert"))?;

            Ok::<_, EngineError>((tx, pr))
        })
        .await?;

    tx.commit().await?;

    log::info!(
        "[engine] Created PR {} by {} with {} reviewer(s)",
        pr.pull_request_id,
        pr.author_id,
        pr.assigned_reviewers.len()
    );

    Ok(pr)
}

/// Choose the initial reviewers for a new pull request.
async fn initial_reviewers(
    conn: &mut SqliteConnection,
    author_id: &str,
) -> Result<Vec<String>, EngineError> {
    let team_id = match teams::team_of_user(conn, author_id).await? {
        Lookup::Found(team_id) => team_id,
        Lookup::NotFound => {
            log::debug!("[engine] Author {} has no team; no reviewers assigned", author_id);
            return Ok(Vec::new());
        }
    };

    let candidates = teams::active_member_ids(conn, &team_id).await?;
    let candidates = selection::eligible(candidates, [author_id]);

    Ok(selection::pick_random(candidates, INITIAL_REVIEWER_COUNT))
}

/// Move a pull request from `OPEN` to `MERGED`.
///
/// The guarded update is the only concurrency control needed: when two merges
/// race, one of them finds no `OPEN` row. A missing and an already merged pull
/// request are both reported as not found.
///
/// # Returns
/// The merged pull request
pub async fn merge_pull_request(
    pool: &DbPool,
    pr_id: &str,
    deadline: Deadline,
) -> Result<PullRequest, EngineError> {
    let (tx, pr) = deadline
        .guard(async {
            let mut tx = pool.begin().await?;

            let merged = pull_requests::mark_merged(&mut tx, pr_id, Utc::now()).await?;
            if !merged {
                return Err(EngineError::not_found(format!(
                    "PR {} not found or already merged",
                    pr_id
                )));
            }

            let pr = pull_requests::fetch_pull_request(&mut tx, pr_id)
                .await?
                .found_or_else(|| EngineError::not_found(format!("PR {} not found", pr_id)))?;

            Ok::<_, EngineError>((tx, pr))
        })
        .await?;

    tx.commit().await?;

    log::info!("[engine] Merged PR {}", pr_id);

    Ok(pr)
}

/// Replace a reviewer with another eligible member of that reviewer's team.
///
/// Every check re-reads live state inside the transaction. The candidate pool
/// is the active members of the old reviewer's team, minus the author and
/// everyone currently reviewing (the old reviewer included).
///
/// # Arguments
/// * `pool` - Database connection pool
/// * `pr_id` - Pull request to update
/// * `old_reviewer_id` - Reviewer being replaced
/// * `deadline` - Bound on the work before the commit
///
/// # Returns
/// The updated pull request and the id of the new reviewer
pub async fn reassign_reviewer(
    pool: &DbPool,
    pr_id: &str,
    old_reviewer_id: &str,
    deadline: Deadline,
) -> Result<Reassignment, EngineError> {
    let (tx, outcome) = deadline
        .guard(async {
            let mut tx = pool.begin().await?;
            let outcome = swap_reviewer(&mut tx, pr_id, old_reviewer_id).await?;
            Ok::<_, EngineError>((tx, outcome))
        })
        .await?;

    tx.commit().await?;

    log::info!(
        "[engine] Reassigned PR {}: {} -> {}",
        pr_id,
        old_reviewer_id,
        outcome.replaced_by
    );
    debug_assert_eq!(outcome.pr.status, PrStatus::Open);

    Ok(outcome)
}

async fn swap_reviewer(
    conn: &mut SqliteConnection,
    pr_id: &str,
    old_reviewer_id: &str,
) -> Result<Reassignment, EngineError> {
    // Taking the write lock first serializes concurrent reassignments of the
    // same reviewer set.
    let status = pull_requests::lock_status(conn, pr_id)
        .await?
        .found_or_else(|| EngineError::not_found(format!("PR {} not found", pr_id)))?;

    if !status.accepts_reassignment() {
        return Err(EngineError::rejected(
            Rejection::PrMerged,
            "cannot reassign on merged PR",
        ));
    }

    if !pull_requests::is_reviewer(conn, pr_id, old_reviewer_id).await? {
        return Err(not_assigned());
    }

    let team_id = teams::team_of_user(conn, old_reviewer_id)
        .await?
        .found_or_else(|| {
            EngineError::not_found(format!("user {} is not in any team", old_reviewer_id))
        })?;

    let author_id = pull_requests::author_of(conn, pr_id)
        .await?
        .found_or_else(|| EngineError::not_found(format!("PR {} not found", pr_id)))?;
    let current = pull_requests::reviewer_ids(conn, pr_id).await?;

    let candidates = teams::active_member_ids(conn, &team_id).await?;
    let candidates = selection::eligible(
        candidates,
        std::iter::once(author_id.as_str()).chain(current.iter().map(String::as_str)),
    );

    let Some(new_reviewer) = selection::pick_random(candidates, 1).pop() else {
        return Err(EngineError::rejected(
            Rejection::NoCandidate,
            "no active replacement candidate in team",
        ));
    };

    if !pull_requests::remove_reviewer(conn, pr_id, old_reviewer_id).await? {
        return Err(not_assigned());
    }
    pull_requests::add_reviewer(conn, pr_id, &new_reviewer).await?;

    let pr = pull_requests::fetch_pull_request(conn, pr_id)
        .await?
        .found_or_else(|| EngineError::not_found(format!("PR {} not found", pr_id)))?;

    Ok(Reassignment {
        pr,
        replaced_by: new_reviewer,
    })
}

fn not_assigned() -> EngineError {
    EngineError::rejected(Rejection::NotAssigned, "reviewer is not assigned to this PR")
}
