//! Team management.

use crate::db::pool::DbPool;
use crate::db::{teams, users, Lookup};
use crate::error::EngineError;
use crate::models::Team;
use crate::services::deadline::Deadline;
use sqlx::SqliteConnection;

/// Create a team and its members in one transaction.
///
/// Members that do not exist yet are created with the given name and activity
/// flag; existing users are linked as they are. Repeated user ids in the input
/// count once.
///
/// # Returns
/// The team as stored
pub async fn create_team(
    pool: &DbPool,
    mut team: Team,
    deadline: Deadline,
) -> Result<Team, EngineError> {
    team.dedup_members();

    let (tx, stored) = deadline
        .guard(async {
            let mut tx = pool.begin().await?;

            let team_id = uuid::Uuid::new_v4().to_string();
            // A taken name fails here as a unique violation
            teams::insert_team(&mut tx, &team_id, &team.team_name).await?;

            for member in &team.members {
                users::insert_user_if_absent(&mut tx, member).await?;
                teams::add_member(&mut tx, &team_id, &member.user_id).await?;
            }

            let stored = load_team(&mut tx, &team.team_name)
                .await?
                .found_or_else(|| EngineError::not_found("team not found after insert"))?;

            Ok::<_, EngineError>((tx, stored))
        })
        .await?;

    tx.commit().await?;

    log::info!(
        "[teams] Created team {} with {} member(s)",
        stored.team_name,
        stored.members.len()
    );

    Ok(stored)
}

/// Get a team and its members by name.
pub async fn get_team(pool: &DbPool, name: &str, deadline: Deadline) -> Result<Team, EngineError> {
    deadline
        .guard(async {
            let mut conn = pool.acquire().await?;

            load_team(&mut conn, name)
                .await?
                .found_or_else(|| EngineError::not_found(format!("team {} not found", name)))
        })
        .await
}

async fn load_team(
    conn: &mut SqliteConnection,
    name: &str,
) -> Result<Lookup<Team>, EngineError> {
    let team_id = match teams::team_id_by_name(conn, name).await? {
        Lookup::Found(team_id) => team_id,
        Lookup::NotFound => return Ok(Lookup::NotFound),
    };

    let members = teams::members_of(conn, &team_id).await?;

    Ok(Lookup::Found(Team {
        team_name: name.to_string(),
        members,
    }))
}
