//! SQL DDL for initializing the embedded database schema.
//!
//! The remote D1 backend is provisioned out of band; only the embedded
//! backend bootstraps itself from this script.

/// Schema includes:
/// - `games` table (one row per catalogued game, opaque string id)
/// - `videos` table (one row per channel upload, keyed by the YouTube video id)
pub const SQLITE_INIT: &str = r"
CREATE TABLE IF NOT EXISTS games (
    id TEXT PRIMARY KEY NOT NULL,
    app_id TEXT NULL,
    name TEXT NOT NULL,
    icon TEXT NULL,
    logo TEXT NULL,
    created_at TEXT NOT NULL, -- YYYY-MM-DD HH:MM:SS (UTC)
    updated_at TEXT NOT NULL  -- YYYY-MM-DD HH:MM:SS (UTC)
);

CREATE INDEX IF NOT EXISTS idx_games_name ON games(name);

CREATE TABLE IF NOT EXISTS videos (
    id TEXT PRIMARY KEY NOT NULL, -- YouTube video id
    title TEXT NOT NULL,
    thumbnail TEXT NULL,
    published_at TEXT NOT NULL,   -- YYYY-MM-DD HH:MM:SS (UTC)
    game_id TEXT NULL REFERENCES games(id),
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_videos_published_at ON videos(published_at);
CREATE INDEX IF NOT EXISTS idx_videos_game_id ON videos(game_id);
";
