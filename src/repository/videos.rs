use super::{Page, Repository, like_pattern, row_datetime, row_i64, row_opt_str, row_str};
use crate::error::CatalogError;
use crate::model::{GameInfo, NewVideo, VideoResponse};
use crate::storage::{Row, SqlValue};
use chrono::Utc;

/// Videos with their linked game left-joined in; unlinked videos come back
/// with a null game.
const SELECT_VIDEOS: &str = "\
SELECT videos.id AS id, videos.title AS title, videos.thumbnail AS thumbnail, \
videos.published_at AS published_at, videos.created_at AS created_at, \
videos.updated_at AS updated_at, \
games.id AS game_id, games.app_id AS game_app_id, games.name AS game_name, \
games.icon AS game_icon, games.logo AS game_logo \
FROM videos LEFT JOIN games ON games.id = videos.game_id";

const SEARCH_FILTER: &str =
    " WHERE (LOWER(videos.title) LIKE LOWER(?) OR LOWER(games.name) LIKE LOWER(?))";

impl Repository {
    pub async fn list_videos(
        &self,
        page: Page,
        search: &str,
    ) -> Result<Vec<VideoResponse>, CatalogError> {
        let mut sql = String::from(SELECT_VIDEOS);
        let mut args: Vec<SqlValue> = Vec::new();

        if !search.is_empty() {
            let pattern = like_pattern(search);
            sql.push_str(SEARCH_FILTER);
            args.push(pattern.clone().into());
            args.push(pattern.into());
        }

        sql.push_str(" ORDER BY videos.published_at DESC LIMIT ? OFFSET ?");
        args.push(page.limit.into());
        args.push(page.offset.into());

        let rows = self
            .storage()
            .query(&sql, &args)
            .await
            .map_err(|e| e.with_op("get videos"))?;

        rows.iter().map(scan_video).collect()
    }

    pub async fn count_videos(&self, search: &str) -> Result<i64, CatalogError> {
        let mut sql = String::from(
            "SELECT COUNT(videos.id) AS total FROM videos \
             LEFT JOIN games ON games.id = videos.game_id",
        );
        let mut args: Vec<SqlValue> = Vec::new();

        if !search.is_empty() {
            let pattern = like_pattern(search);
            sql.push_str(SEARCH_FILTER);
            args.push(pattern.clone().into());
            args.push(pattern.into());
        }

        let rows = self
            .storage()
            .query(&sql, &args)
            .await
            .map_err(|e| e.with_op("count videos"))?;

        let row = rows
            .first()
            .ok_or_else(|| CatalogError::QueryFailed("count videos: no rows returned".to_string()))?;
        row_i64(row, "total")
    }

    pub async fn get_video(&self, id: &str) -> Result<VideoResponse, CatalogError> {
        let sql = format!("{SELECT_VIDEOS} WHERE videos.id = ?");
        let rows = self
            .storage()
            .query(&sql, &[id.into()])
            .await
            .map_err(|e| e.with_op("get video by id"))?;

        let row = rows
            .first()
            .ok_or_else(|| CatalogError::QueryFailed("get video by id: no rows returned".to_string()))?;
        scan_video(row)
    }

    /// Existence probe used by ingestion; absence is not an error.
    pub async fn get_video_by_external_id(
        &self,
        external_id: &str,
    ) -> Result<Option<VideoResponse>, CatalogError> {
        let sql = format!("{SELECT_VIDEOS} WHERE videos.id = ?");
        let rows = self
            .storage()
            .query(&sql, &[external_id.into()])
            .await
            .map_err(|e| e.with_op("get video by youtube id"))?;

        rows.first().map(scan_video).transpose()
    }

    pub async fn create_video(&self, video: &NewVideo) -> Result<(), CatalogError> {
        let now = Utc::now();
        self.storage()
            .exec(
                "INSERT INTO videos (id, title, thumbnail, published_at, game_id, created_at, updated_at) \
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
                &[
                    video.id.as_str().into(),
                    video.title.as_str().into(),
                    video.thumbnail.clone().into(),
                    video.published_at.into(),
                    video.game_id.clone().into(),
                    now.into(),
                    now.into(),
                ],
            )
            .await
            .map_err(|e| e.with_op("create video"))?;
        Ok(())
    }

    pub async fn update_video_game(
        &self,
        video_id: &str,
        game_id: &str,
    ) -> Result<(), CatalogError> {
        let result = self
            .storage()
            .exec(
                "UPDATE videos SET game_id = ?, updated_at = ? WHERE id = ?",
                &[game_id.into(), Utc::now().into(), video_id.into()],
            )
            .await
            .map_err(|e| e.with_op("update video game"))?;

        if result.rows_affected == 0 {
            return Err(CatalogError::NotFound("video".to_string()));
        }
        Ok(())
    }
}

fn scan_video(row: &Row) -> Result<VideoResponse, CatalogError> {
    let game = match row_opt_str(row, "game_id") {
        Some(game_id) => Some(GameInfo {
            id: game_id,
            app_id: row_opt_str(row, "game_app_id"),
            name: row_str(row, "game_name")?,
            icon: row_opt_str(row, "game_icon"),
            logo: row_opt_str(row, "game_logo"),
        }),
        None => None,
    };

    Ok(VideoResponse {
        id: row_str(row, "id")?,
        title: row_str(row, "title")?,
        thumbnail: row_opt_str(row, "thumbnail"),
        published_at: row_datetime(row, "published_at")?,
        game,
        created_at: row_datetime(row, "created_at")?,
        updated_at: row_datetime(row, "updated_at")?,
    })
}
