use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::constants::{DEFAULT_CONNECTION_MESSAGE, EMPTY_PLAYERS_MESSAGE};
use crate::db::{connections, profiles};
use crate::error::{is_unique_violation, AppError, AppResult, Notice};
use crate::models::{Profile, SkillLevel};
use crate::session::Session;

use super::nav::Navbar;

/// Skill dropdown on the directory; `all` disables the filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillFilter {
    #[default]
    All,
    Beginner,
    Intermediate,
    Advanced,
    Pro,
}

impl SkillFilter {
    fn level(self) -> Option<SkillLevel> {
        match self {
            SkillFilter::All => None,
            SkillFilter::Beginner => Some(SkillLevel::Beginner),
            SkillFilter::Intermediate => Some(SkillLevel::Intermediate),
            SkillFilter::Advanced => Some(SkillLevel::Advanced),
            SkillFilter::Pro => Some(SkillLevel::Pro),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PlayerQuery {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub skill: SkillFilter,
}

#[derive(Debug, Serialize)]
pub struct PlayerCard {
    pub id: Uuid,
    pub name: String,
    pub city: String,
    pub skill_level: SkillLevel,
    pub skill_label: &'static str,
    pub badge: &'static str,
    pub rating: i64,
    pub availability: Option<String>,
}

impl From<Profile> for PlayerCard {
    fn from(profile: Profile) -> Self {
        Self {
            id: profile.id,
            skill_label: profile.skill_level.label(),
            badge: profile.skill_level.badge(),
            name: profile.name,
            city: profile.city,
            skill_level: profile.skill_level,
            rating: profile.rating,
            availability: profile.availability,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PlayersPage {
    pub nav: Navbar,
    pub query: String,
    pub skill: SkillFilter,
    pub players: Vec<PlayerCard>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_state: Option<&'static str>,
}

/// Keeps players whose name or city contains `q` (case-insensitive) and
/// whose level matches `skill`. Input order is preserved.
pub fn filter_players(players: Vec<Profile>, q: &str, skill: SkillFilter) -> Vec<Profile> {
    let needle = q.trim().to_lowercase();
    players
        .into_iter()
        .filter(|p| {
            needle.is_empty()
                || p.name.to_lowercase().contains(&needle)
                || p.city.to_lowercase().contains(&needle)
        })
        .filter(|p| skill.level().is_none_or(|level| p.skill_level == level))
        .collect()
}

pub async fn players_page(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Query(query): Query<PlayerQuery>,
) -> AppResult<Json<PlayersPage>> {
    let everyone = profiles::list_other_profiles(&db_pool, session.user_id).await?;
    let players: Vec<PlayerCard> = filter_players(everyone, &query.q, query.skill)
        .into_iter()
        .map(PlayerCard::from)
        .collect();

    Ok(Json(PlayersPage {
        nav: Navbar::authenticated("/players"),
        query: query.q,
        skill: query.skill,
        empty_state: players.is_empty().then_some(EMPTY_PLAYERS_MESSAGE),
        players,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ConnectRequest {
    pub receiver_id: Uuid,
}

pub async fn send_request(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Json(req): Json<ConnectRequest>,
) -> AppResult<(StatusCode, Json<Notice>)> {
    if req.receiver_id == session.user_id {
        return Err(AppError::Validation("You can't connect with yourself".to_string()));
    }
    if profiles::get_profile(&db_pool, req.receiver_id).await?.is_none() {
        return Err(AppError::NotFound("Player"));
    }

    let request = connections::create_request(
        &db_pool,
        session.user_id,
        req.receiver_id,
        DEFAULT_CONNECTION_MESSAGE,
    )
    .await
    .map_err(|err| {
        if is_unique_violation(&err) {
            AppError::DuplicateRequest
        } else {
            AppError::Database(err)
        }
    })?;

    tracing::info!(request_id = %request.id, receiver_id = %request.receiver_id, "connection request sent");
    Ok((
        StatusCode::CREATED,
        Json(Notice::success("Request sent!", "Your connection request has been sent")),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn profile(name: &str, city: &str, skill_level: SkillLevel) -> Profile {
        Profile {
            id: Uuid::now_v7(),
            name: name.to_string(),
            city: city.to_string(),
            skill_level,
            rating: 1000,
            availability: None,
            created_at: Utc::now(),
        }
    }

    fn roster() -> Vec<Profile> {
        vec![
            profile("Ma Long", "Beijing", SkillLevel::Pro),
            profile("Alice", "Berlin", SkillLevel::Beginner),
            profile("Bob", "Boston", SkillLevel::Advanced),
        ]
    }

    fn names(players: &[Profile]) -> Vec<&str> {
        players.iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn test_no_filters_keeps_everyone_in_order() {
        let kept = filter_players(roster(), "", SkillFilter::All);
        assert_eq!(names(&kept), vec!["Ma Long", "Alice", "Bob"]);
    }

    #[test]
    fn test_query_matches_name_or_city_case_insensitively() {
        assert_eq!(names(&filter_players(roster(), "ALI", SkillFilter::All)), vec!["Alice"]);
        assert_eq!(
            names(&filter_players(roster(), "be", SkillFilter::All)),
            vec!["Ma Long", "Alice"]
        );
    }

    #[test]
    fn test_skill_filter_combines_with_query() {
        assert_eq!(names(&filter_players(roster(), "", SkillFilter::Pro)), vec!["Ma Long"]);
        assert!(filter_players(roster(), "bob", SkillFilter::Beginner).is_empty());
    }

    #[test]
    fn test_skill_filter_parses_from_query_string() {
        let Query(q): Query<PlayerQuery> =
            Query::try_from_uri(&"/players?q=bo&skill=advanced".parse().unwrap()).unwrap();
        assert_eq!(q.skill, SkillFilter::Advanced);
        assert_eq!(q.q, "bo");

        let Query(q): Query<PlayerQuery> = Query::try_from_uri(&"/players".parse().unwrap()).unwrap();
        assert_eq!(q.skill, SkillFilter::All);
    }
}
