use super::{Page, Repository, like_pattern, row_datetime, row_i64, row_opt_str, row_str};
use crate::error::CatalogError;
use crate::model::{CreateGameRequest, Game};
use crate::storage::{Row, SqlValue};
use chrono::Utc;
use uuid::Uuid;

const SELECT_GAMES: &str =
    "SELECT id, app_id, name, icon, logo, created_at, updated_at FROM games";

impl Repository {
    pub async fn list_games(&self, page: Page, search: &str) -> Result<Vec<Game>, CatalogError> {
        let mut sql = String::from(SELECT_GAMES);
        let mut args: Vec<SqlValue> = Vec::new();

        if !search.is_empty() {
            sql.push_str(" WHERE LOWER(name) LIKE LOWER(?)");
            args.push(like_pattern(search).into());
        }

        sql.push_str(" ORDER BY name ASC LIMIT ? OFFSET ?");
        args.push(page.limit.into());
        args.push(page.offset.into());

        let rows = self
            .storage()
            .query(&sql, &args)
            .await
            .map_err(|e| e.with_op("get games"))?;

        rows.iter().map(scan_game).collect()
    }

    pub async fn count_games(&self, search: &str) -> Result<i64, CatalogError> {
        let mut sql = String::from("SELECT COUNT(id) AS total FROM games");
        let mut args: Vec<SqlValue> = Vec::new();

        if !search.is_empty() {
            sql.push_str(" WHERE LOWER(name) LIKE LOWER(?)");
            args.push(like_pattern(search).into());
        }

        let rows = self
            .storage()
            .query(&sql, &args)
            .await
            .map_err(|e| e.with_op("count games"))?;

        let row = rows
            .first()
            .ok_or_else(|| CatalogError::QueryFailed("count games: no rows returned".to_string()))?;
        row_i64(row, "total")
    }

    pub async fn get_game(&self, id: &str) -> Result<Game, CatalogError> {
        let sql = format!("{SELECT_GAMES} WHERE id = ?");
        let rows = self
            .storage()
            .query(&sql, &[id.into()])
            .await
            .map_err(|e| e.with_op("get game by id"))?;

        let row = rows
            .first()
            .ok_or_else(|| CatalogError::QueryFailed("get game by id: no rows returned".to_string()))?;
        scan_game(row)
    }

    /// Duplicate probe for game creation; absence is not an error.
    pub async fn get_game_by_app_id(&self, app_id: &str) -> Result<Option<Game>, CatalogError> {
        let sql = format!("{SELECT_GAMES} WHERE app_id = ?");
        let rows = self
            .storage()
            .query(&sql, &[app_id.into()])
            .await
            .map_err(|e| e.with_op("get game by app id"))?;

        rows.first().map(scan_game).transpose()
    }

    pub async fn create_game(&self, request: &CreateGameRequest) -> Result<Game, CatalogError> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        self.storage()
            .exec(
                "INSERT INTO games (id, app_id, name, icon, logo, created_at, updated_at) \
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
                &[
                    id.as_str().into(),
                    request.app_id.clone().into(),
                    request.name.as_str().into(),
                    request.icon.clone().into(),
                    request.logo.clone().into(),
                    now.into(),
                    now.into(),
                ],
            )
            .await
            .map_err(|e| e.with_op("create game"))?;

        self.get_game(&id).await
    }
}

fn scan_game(row: &Row) -> Result<Game, CatalogError> {
    Ok(Game {
        id: row_str(row, "id")?,
        app_id: row_opt_str(row, "app_id"),
        name: row_str(row, "name")?,
        icon: row_opt_str(row, "icon"),
        logo: row_opt_str(row, "logo"),
        created_at: row_datetime(row, "created_at")?,
        updated_at: row_datetime(row, "updated_at")?,
    })
}
