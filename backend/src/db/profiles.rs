use chrono::Utc;
use sqlx::{Executor, Sqlite, SqlitePool};
use uuid::Uuid;

use crate::constants::DEFAULT_RATING;
use crate::models::{Profile, ProfileUpdate, SkillLevel};

const PROFILE_COLUMNS: &str = "id, name, city, skill_level, rating, availability, created_at";

pub async fn create_profile(
    pool: &SqlitePool,
    id: Uuid,
    name: &str,
    city: &str,
    skill_level: SkillLevel,
) -> Result<Profile, sqlx::Error> {
    sqlx::query_as::<_, Profile>(&format!(
        "INSERT INTO profiles (id, name, city, skill_level, rating, created_at)
         VALUES (?, ?, ?, ?, ?, ?)
         ON CONFLICT(id) DO UPDATE SET name = excluded.name, city = excluded.city, skill_level = excluded.skill_level
         RETURNING {PROFILE_COLUMNS}"
    ))
    .bind(id)
    .bind(name)
    .bind(city)
    .bind(skill_level)
    .bind(DEFAULT_RATING)
    .bind(Utc::now())
    .fetch_one(pool)
    .await
}

pub async fn get_profile<'e, E>(executor: E, id: Uuid) -> Result<Option<Profile>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, Profile>(&format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = ?"))
        .bind(id)
        .fetch_optional(executor)
        .await
}

/// Everyone except `viewer`, best rated first.
pub async fn list_other_profiles(pool: &SqlitePool, viewer: Uuid) -> Result<Vec<Profile>, sqlx::Error> {
    sqlx::query_as::<_, Profile>(&format!(
        "SELECT {PROFILE_COLUMNS} FROM profiles WHERE id != ? ORDER BY rating DESC, name ASC"
    ))
    .bind(viewer)
    .fetch_all(pool)
    .await
}

pub async fn update_profile(
    pool: &SqlitePool,
    id: Uuid,
    update: &ProfileUpdate,
) -> Result<Option<Profile>, sqlx::Error> {
    let availability = update
        .availability
        .as_deref()
        .map(str::trim)
        .filter(|a| !a.is_empty());

    sqlx::query_as::<_, Profile>(&format!(
        "UPDATE profiles SET name = ?, city = ?, skill_level = ?, availability = ?
         WHERE id = ?
         RETURNING {PROFILE_COLUMNS}"
    ))
    .bind(update.name.trim())
    .bind(update.city.trim())
    .bind(update.skill_level)
    .bind(availability)
    .bind(id)
    .fetch_optional(pool)
    .await
}
