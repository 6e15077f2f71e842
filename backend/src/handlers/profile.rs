use axum::{extract::State, Json};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::db::profiles;
use crate::error::{AppError, AppResult, Notice};
use crate::models::{Profile, ProfileUpdate};
use crate::session::Session;

use super::forms::{require_filled, FormField};
use super::nav::Navbar;

#[derive(Debug, Serialize)]
pub struct ProfileStats {
    pub rating: i64,
    pub skill_level: &'static str,
    pub member_since: String,
}

#[derive(Debug, Serialize)]
pub struct ProfilePage {
    pub nav: Navbar,
    pub email: Option<String>,
    pub stats: ProfileStats,
    pub form: Vec<FormField>,
}

impl ProfilePage {
    fn new(profile: &Profile, email: Option<String>) -> Self {
        let form = vec![
            FormField::text("name", "Name").value(&profile.name),
            FormField::text("city", "City").value(&profile.city),
            FormField::skill_level(profile.skill_level),
            FormField::text("availability", "Availability")
                .of_kind("textarea")
                .placeholder("e.g., Weekday evenings, weekend mornings")
                .optional()
                .value(profile.availability.clone().unwrap_or_default()),
        ];

        Self {
            nav: Navbar::authenticated("/profile"),
            email,
            stats: ProfileStats {
                rating: profile.rating,
                skill_level: profile.skill_level.label(),
                member_since: profile.created_at.format("%b %Y").to_string(),
            },
            form,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProfileSaved {
    pub profile: Profile,
    pub notice: Notice,
}

pub async fn profile_page(
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Json<ProfilePage>> {
    let profile = profiles::get_profile(&db_pool, session.user_id)
        .await?
        .ok_or(AppError::NotFound("Profile"))?;

    Ok(Json(ProfilePage::new(&profile, session.email)))
}

/// Store failures come back with the store's own message, and the same
/// submission can simply be sent again.
pub async fn update_profile(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Json(update): Json<ProfileUpdate>,
) -> AppResult<Json<ProfileSaved>> {
    require_filled(&[("Name", update.name.as_str()), ("City", update.city.as_str())])?;

    let profile = profiles::update_profile(&db_pool, session.user_id, &update)
        .await?
        .ok_or(AppError::NotFound("Profile"))?;

    tracing::info!(user_id = %profile.id, "profile updated");
    Ok(Json(ProfileSaved {
        profile,
        notice: Notice::success("Success!", "Profile updated successfully"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SkillLevel;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    #[test]
    fn test_page_is_prefilled_from_profile() {
        let profile = Profile {
            id: Uuid::now_v7(),
            name: "Jo".to_string(),
            city: "Lyon".to_string(),
            skill_level: SkillLevel::Advanced,
            rating: 1120,
            availability: None,
            created_at: Utc.with_ymd_and_hms(2024, 3, 9, 12, 0, 0).unwrap(),
        };

        let page = ProfilePage::new(&profile, Some("jo@example.com".to_string()));
        let values: Vec<_> = page.form.iter().map(|f| f.value.as_deref()).collect();
        assert_eq!(values, vec![Some("Jo"), Some("Lyon"), Some("advanced"), Some("")]);
        assert_eq!(page.stats.member_since, "Mar 2024");
        assert_eq!(page.stats.skill_level, "Advanced");
    }
}
