//! Team and team member models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A user as listed inside a team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct TeamMember {
    pub user_id: String,
    pub username: String,
    pub is_active: bool,
}

/// A team and its members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub team_name: String,
    pub members: Vec<TeamMember>,
}

impl Team {
    /// Drop repeated user ids, keeping the first occurrence.
    pub fn dedup_members(&mut self) {
        let mut seen = std::collections::HashSet::new();
        self.members.retain(|m| seen.insert(m.user_id.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(id: &str, name: &str) -> TeamMember {
        TeamMember {
            user_id: id.into(),
            username: name.into(),
            is_active: true,
        }
    }

    #[test]
    fn test_dedup_members_keeps_first() {
        let mut team = Team {
            team_name: "backend".into(),
            members: vec![member("u1", "alice"), member("u2", "bob"), member("u1", "alias")],
        };
        team.dedup_members();
        assert_eq!(team.members.len(), 2);
        assert_eq!(team.members[0].username, "alice");
    }

    #[test]
    fn test_team_deserialize() {
        let json = r#"{"team_name": "backend", "members": [{"user_id": "u1", "username": "alice", "is_active": false}]}"#;
        let team: Team = serde_json::from_str(json).unwrap();
        assert_eq!(team.members[0], TeamMember { user_id: "u1".into(), username: "alice".into(), is_active: false });
    }
}
