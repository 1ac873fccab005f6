use rusqlite::Connection;
use tracing::info;

use crate::error::Result;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (users, favourites, group_comments)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id_users    INTEGER PRIMARY KEY AUTOINCREMENT,
                uname       TEXT NOT NULL UNIQUE,
                pw          TEXT NOT NULL,
                email       TEXT NOT NULL UNIQUE,
                fname       TEXT,
                lname       TEXT,
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE favourites (
                id_favourites   INTEGER PRIMARY KEY AUTOINCREMENT,
                id_users        INTEGER REFERENCES users(id_users) ON DELETE CASCADE,
                id_groups       INTEGER,
                movie_id        INTEGER,
                series_id       INTEGER,
                name            TEXT,
                avatar          TEXT,
                CHECK ((id_users IS NULL) <> (id_groups IS NULL)),
                CHECK ((movie_id IS NULL) <> (series_id IS NULL))
            );

            -- NULLs are distinct in plain UNIQUE constraints, so key on COALESCE.
            CREATE UNIQUE INDEX ux_favourites_owner_target ON favourites (
                COALESCE(id_users, -1),
                COALESCE(id_groups, -1),
                COALESCE(movie_id, -1),
                COALESCE(series_id, -1)
            );

            CREATE TABLE group_comments (
                id_comments     INTEGER PRIMARY KEY AUTOINCREMENT,
                id_groups       INTEGER NOT NULL,
                id_users        INTEGER NOT NULL REFERENCES users(id_users) ON DELETE CASCADE,
                user_comments   TEXT NOT NULL,
                created_at      TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_group_comments_group
                ON group_comments(id_groups, id_comments);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
