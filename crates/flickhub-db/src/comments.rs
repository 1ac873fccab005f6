use rusqlite::{Row, params};
use tracing::debug;

use flickhub_types::models::Comment;

use crate::Pool;
use crate::error::{Result, StoreError, is_foreign_key_violation};

const COMMENT_COLUMNS: &str = "id_comments, id_groups, id_users, user_comments, created_at";

fn comment_from_row(row: &Row<'_>) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id_comments: row.get(0)?,
        id_groups: row.get(1)?,
        id_users: row.get(2)?,
        user_comments: row.get(3)?,
        created_at: row.get(4)?,
    })
}

#[derive(Clone)]
pub struct CommentStore {
    pool: Pool,
}

impl CommentStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Post `text` to a group as `id_users`.
    pub fn create_comment(&self, id_groups: i64, id_users: i64, text: &str) -> Result<Comment> {
        if text.trim().is_empty() {
            return Err(StoreError::MissingComment);
        }

        self.pool.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO group_comments (id_groups, id_users, user_comments) VALUES (?1, ?2, ?3)",
                params![id_groups, id_users, text],
            )
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    debug!("Comment author {} no longer exists", id_users);
                    StoreError::UserNotFound
                } else {
                    e.into()
                }
            })?;
            let id = conn.last_insert_rowid();
            Ok(conn.query_row(
                &format!("SELECT {} FROM group_comments WHERE id_comments = ?1", COMMENT_COLUMNS),
                [id],
                comment_from_row,
            )?)
        })
    }

    /// All comments of a group, oldest first.
    pub fn get_comments(&self, id_groups: Option<i64>) -> Result<Vec<Comment>> {
        let id_groups = id_groups.ok_or(StoreError::MissingGroupId)?;

        let rows = self.pool.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM group_comments WHERE id_groups = ?1 ORDER BY id_comments",
                COMMENT_COLUMNS
            ))?;
            let rows = stmt
                .query_map([id_groups], comment_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })?;

        if rows.is_empty() {
            return Err(StoreError::NoComments);
        }
        Ok(rows)
    }

    /// Delete a comment written by `id_users`. A missing comment and someone
    /// else's comment are reported the same way.
    pub fn delete_comment(&self, id_comments: i64, id_users: i64) -> Result<()> {
        let deleted = self.pool.with_conn_mut(|conn| {
            Ok(conn.execute(
                "DELETE FROM group_comments WHERE id_comments = ?1 AND id_users = ?2",
                params![id_comments, id_users],
            )?)
        })?;

        if deleted == 0 {
            debug!("User {} could not delete comment {}", id_users, id_comments);
            return Err(StoreError::CommentNotFound);
        }
        Ok(())
    }
}
