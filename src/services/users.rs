//! User activity and review listings.

use crate::db::pool::DbPool;
use crate::db::{pull_requests, users};
use crate::error::EngineError;
use crate::models::{User, UserReviews};
use crate::services::deadline::Deadline;

/// Set a user's activity flag.
///
/// Existing reviewer assignments are not touched; the flag only affects
/// future reviewer selection.
///
/// # Returns
/// The updated user with their resolved team name
pub async fn set_user_active(
    pool: &DbPool,
    user_id: &str,
    is_active: bool,
    deadline: Deadline,
) -> Result<User, EngineError> {
    let (tx, user) = deadline
        .guard(async {
            let mut tx = pool.begin().await?;

            if !users::set_active(&mut tx, user_id, is_active).await? {
                return Err(EngineError::not_found(format!("user {} not found", user_id)));
            }

            let user = users::find_user(&mut tx, user_id)
                .await?
                .found_or_else(|| EngineError::not_found(format!("user {} not found", user_id)))?;

            Ok::<_, EngineError>((tx, user))
        })
        .await?;

    tx.commit().await?;

    log::info!("[users] User {} is_active={}", user_id, is_active);

    Ok(user)
}

/// List the pull requests a user currently reviews.
///
/// Unknown users simply have no reviews.
pub async fn get_user_reviews(
    pool: &DbPool,
    user_id: &str,
    deadline: Deadline,
) -> Result<UserReviews, EngineError> {
    deadline
        .guard(async {
            let mut conn = pool.acquire().await?;
            let pull_requests = pull_requests::reviewed_by(&mut conn, user_id).await?;

            Ok::<_, EngineError>(UserReviews {
                user_id: user_id.to_string(),
                pull_requests,
            })
        })
        .await
}
