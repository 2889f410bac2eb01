//! Service boundary for the reviewer assignment operations.
//!
//! `ReviewService` owns the pool handle and the per-operation deadline. Each
//! call hands the engine a fresh [`Deadline`] and classifies failures into
//! stable error codes, keeping response concerns out of the transactional
//! code.

use crate::db::pool::DbPool;
use crate::error::{classify, AppError, EngineError, ErrorCode, Operation};
use crate::models::{NewPullRequest, PullRequest, Reassignment, Team, User, UserReviews};
use crate::services::deadline::Deadline;
use crate::services::{assignment, teams, users};
use std::future::Future;
use std::time::Duration;

/// Default deadline for a single operation.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Entry point used by the transport layer.
#[derive(Clone)]
pub struct ReviewService {
    db: DbPool,
    deadline: Duration,
}

impl ReviewService {
    pub fn new(db: DbPool, deadline: Duration) -> Self {
        Self { db, deadline }
    }

    /// A copy of this service whose operations use a different deadline.
    pub fn with_deadline(&self, deadline: Duration) -> Self {
        Self {
            db: self.db.clone(),
            deadline,
        }
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    pub async fn create_team(&self, team: Team) -> Result<Team, AppError> {
        let deadline = self.start();
        self.run(
            Operation::CreateTeam,
            teams::create_team(&self.db, team, deadline),
        )
        .await
    }

    pub async fn get_team(&self, name: &str) -> Result<Team, AppError> {
        let deadline = self.start();
        self.run(Operation::GetTeam, teams::get_team(&self.db, name, deadline))
            .await
    }

    pub async fn set_user_active(&self, user_id: &str, is_active: bool) -> Result<User, AppError> {
        let deadline = self.start();
        self.run(
            Operation::SetUserActive,
            users::set_user_active(&self.db, user_id, is_active, deadline),
        )
        .await
    }

    pub async fn get_user_reviews(&self, user_id: &str) -> Result<UserReviews, AppError> {
        let deadline = self.start();
        self.run(
            Operation::GetUserReviews,
            users::get_user_reviews(&self.db, user_id, deadline),
        )
        .await
    }

    pub async fn create_pull_request(
        &self,
        input: &NewPullRequest,
    ) -> Result<PullRequest, AppError> {
        let deadline = self.start();
        self.run(
            Operation::CreatePr,
            assignment::create_pull_request(&self.db, input, deadline),
        )
        .await
    }

    pub async fn merge_pull_request(&self, pr_id: &str) -> Result<PullRequest, AppError> {
        let deadline = self.start();
        self.run(
            Operation::MergePr,
            assignment::merge_pull_request(&self.db, pr_id, deadline),
        )
        .await
    }

    pub async fn reassign_reviewer(
        &self,
        pr_id: &str,
        old_reviewer_id: &str,
    ) -> Result<Reassignment, AppError> {
        let deadline = self.start();
        self.run(
            Operation::ReassignPr,
            assignment::reassign_reviewer(&self.db, pr_id, old_reviewer_id, deadline),
        )
        .await
    }

    fn start(&self) -> Deadline {
        Deadline::after(self.deadline)
    }

    /// Run an operation and classify its failure.
    async fn run<T, F>(&self, op: Operation, fut: F) -> Result<T, AppError>
    where
        F: Future<Output = Result<T, EngineError>>,
    {
        fut.await.map_err(|err| {
            let app_err = classify(op, err);
            if app_err.code == ErrorCode::Unknown {
                log::error!("[service] {} failed: {}", op.as_str(), app_err.message);
            } else {
                log::debug!("[service] {} rejected: {}", op.as_str(), app_err);
            }
            app_err
        })
    }
}
