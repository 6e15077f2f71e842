use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::constants::EMPTY_TABLES_MESSAGE;
use crate::db::tables;
use crate::error::{AppError, AppResult, Notice};
use crate::models::{PingPongTable, TableForm};
use crate::session::Session;

use super::forms::{require_filled, FormField};
use super::nav::Navbar;

#[derive(Debug, Serialize)]
pub struct TableCard {
    #[serde(flatten)]
    pub table: PingPongTable,
    /// Edit and delete controls are shown only to the table's creator.
    pub can_edit: bool,
}

#[derive(Debug, Serialize)]
pub struct TablesPage {
    pub nav: Navbar,
    pub tables: Vec<TableCard>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub empty_state: Option<&'static str>,
    pub form: Vec<FormField>,
}

pub fn table_form_fields() -> Vec<FormField> {
    vec![
        FormField::text("name", "Name").placeholder("Central Park Tables"),
        FormField::text("address", "Address").placeholder("123 Main St"),
        FormField::text("city", "City"),
        FormField::text("description", "Description")
            .of_kind("textarea")
            .placeholder("Number of tables, indoor/outdoor, opening hours...")
            .optional(),
    ]
}

pub fn table_cards(rows: Vec<PingPongTable>, viewer: Uuid) -> Vec<TableCard> {
    rows.into_iter()
        .map(|table| TableCard { can_edit: table.created_by == viewer, table })
        .collect()
}

pub async fn tables_page(
    State(db_pool): State<SqlitePool>,
    session: Session,
) -> AppResult<Json<TablesPage>> {
    let rows = tables::list_tables(&db_pool)
        .await
        .map_err(|err| AppError::logged("Error fetching tables", err))?;
    let cards = table_cards(rows, session.user_id);

    Ok(Json(TablesPage {
        nav: Navbar::authenticated("/tables"),
        empty_state: cards.is_empty().then_some(EMPTY_TABLES_MESSAGE),
        tables: cards,
        form: table_form_fields(),
    }))
}

fn validate(form: &TableForm) -> AppResult<()> {
    require_filled(&[
        ("Name", form.name.as_str()),
        ("Address", form.address.as_str()),
        ("City", form.city.as_str()),
    ])
}

pub async fn create_table(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Json(form): Json<TableForm>,
) -> AppResult<(StatusCode, Json<PingPongTable>)> {
    validate(&form)?;

    let table = tables::create_table(&db_pool, session.user_id, &form)
        .await
        .map_err(|err| AppError::logged("Error saving table", err))?;

    tracing::info!(table_id = %table.id, created_by = %table.created_by, "table added");
    Ok((StatusCode::CREATED, Json(table)))
}

/// Distinguishes "not yours" from "not there" after a creator-scoped write
/// matched nothing.
async fn missed_write(db_pool: &SqlitePool, id: Uuid) -> AppError {
    match tables::get_table(db_pool, id).await {
        Ok(Some(_)) => AppError::Forbidden,
        Ok(None) => AppError::NotFound("Table"),
        Err(err) => AppError::logged("Error looking up table", err),
    }
}

pub async fn update_table(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Path(id): Path<Uuid>,
    Json(form): Json<TableForm>,
) -> AppResult<Json<PingPongTable>> {
    validate(&form)?;

    match tables::update_table(&db_pool, id, session.user_id, &form).await {
        Ok(Some(table)) => {
            tracing::info!(table_id = %table.id, "table updated");
            Ok(Json(table))
        }
        Ok(None) => Err(missed_write(&db_pool, id).await),
        Err(err) => Err(AppError::logged("Error saving table", err)),
    }
}

pub async fn delete_table(
    State(db_pool): State<SqlitePool>,
    session: Session,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Notice>> {
    let deleted = tables::delete_table(&db_pool, id, session.user_id)
        .await
        .map_err(|err| AppError::logged("Error deleting table", err))?;

    if deleted == 0 {
        return Err(missed_write(&db_pool, id).await);
    }

    tracing::info!(table_id = %id, "table deleted");
    Ok(Json(Notice::success("Deleted", "Table removed")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn table(created_by: Uuid) -> PingPongTable {
        PingPongTable {
            id: Uuid::now_v7(),
            name: "Park".to_string(),
            address: "1 Main St".to_string(),
            city: "Austin".to_string(),
            latitude: 0.0,
            longitude: 0.0,
            description: None,
            created_by,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_only_creator_can_edit() {
        let (me, other) = (Uuid::now_v7(), Uuid::now_v7());
        let cards = table_cards(vec![table(me), table(other)], me);
        assert_eq!(cards.iter().map(|c| c.can_edit).collect::<Vec<_>>(), vec![true, false]);
    }

    #[test]
    fn test_blank_city_is_rejected() {
        let form = TableForm {
            name: "Park".to_string(),
            address: "1 Main St".to_string(),
            city: " ".to_string(),
            description: None,
        };
        assert_eq!(validate(&form).unwrap_err().to_string(), "City is required");
    }

    #[test]
    fn test_description_is_the_only_optional_field() {
        let optional: Vec<_> = table_form_fields()
            .into_iter()
            .filter(|f| !f.required)
            .map(|f| f.name)
            .collect();
        assert_eq!(optional, vec!["description"]);
    }
}
