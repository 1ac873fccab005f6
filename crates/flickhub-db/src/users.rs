use rusqlite::{OptionalExtension, params};
use tracing::debug;

use flickhub_types::api::{NewUser, ProfileUpdate};
use flickhub_types::models::{UpdatedUser, UserInfo};

use crate::Pool;
use crate::error::{Result, StoreError, is_unique_violation};
use crate::models::Credentials;

/// bcrypt work factor for stored passwords.
pub const PASSWORD_COST: u32 = 10;

#[derive(Clone)]
pub struct UserStore {
    pool: Pool,
}

impl UserStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    pub fn is_email_in_use(&self, email: &str) -> Result<bool> {
        self.pool.with_conn(|conn| {
            let in_use = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM users WHERE email = ?1)",
                [email],
                |row| row.get(0),
            )?;
            Ok(in_use)
        })
    }

    /// Hash the password and insert the user. Returns the new `id_users`.
    pub fn create_user(&self, user: &NewUser) -> Result<i64> {
        let password_hash = bcrypt::hash(&user.pw, PASSWORD_COST)?;

        self.pool.with_conn_mut(|conn| {
            match conn.execute(
                "INSERT INTO users (uname, pw, email) VALUES (?1, ?2, ?3)",
                params![user.uname, password_hash, user.email],
            ) {
                Ok(_) => Ok(conn.last_insert_rowid()),
                Err(e) if is_unique_violation(&e) => {
                    debug!("Rejected sign-up for {}: {}", user.uname, e);
                    Err(StoreError::UserExists)
                }
                Err(e) => Err(e.into()),
            }
        })
    }

    pub fn get_password_and_id(&self, uname: &str) -> Result<Option<Credentials>> {
        self.pool.with_conn(|conn| {
            let row = conn
                .query_row(
                    "SELECT id_users, pw FROM users WHERE uname = ?1",
                    [uname],
                    |row| {
                        Ok(Credentials {
                            id_users: row.get(0)?,
                            pw: row.get(1)?,
                        })
                    },
                )
                .optional()?;
            Ok(row)
        })
    }

    /// Fields left out of `update` keep their stored value.
    pub fn update_user(&self, update: &ProfileUpdate, id_users: i64) -> Result<UpdatedUser> {
        self.pool.with_conn_mut(|conn| {
            conn.query_row(
                "UPDATE users SET fname = COALESCE(?1, fname), lname = COALESCE(?2, lname)
                 WHERE id_users = ?3
                 RETURNING uname, fname, lname",
                params![update.fname, update.lname, id_users],
                |row| {
                    Ok(UpdatedUser {
                        uname: row.get(0)?,
                        fname: row.get(1)?,
                        lname: row.get(2)?,
                    })
                },
            )
            .optional()?
            .ok_or(StoreError::UserNotFound)
        })
    }

    pub fn get_user_info(&self, id_users: i64) -> Result<UserInfo> {
        self.pool.with_conn(|conn| {
            conn.query_row(
                "SELECT lname, fname, uname, email FROM users WHERE id_users = ?1",
                [id_users],
                |row| {
                    Ok(UserInfo {
                        lname: row.get(0)?,
                        fname: row.get(1)?,
                        uname: row.get(2)?,
                        email: row.get(3)?,
                    })
                },
            )
            .optional()?
            .ok_or(StoreError::UserNotFound)
        })
    }

    /// Delete the user and return their username. Favourites and comments
    /// owned by the user go with it.
    pub fn delete_user(&self, id_users: i64) -> Result<String> {
        self.pool.with_conn_mut(|conn| {
            conn.query_row(
                "DELETE FROM users WHERE id_users = ?1 RETURNING uname",
                [id_users],
                |row| row.get(0),
            )
            .optional()?
            .ok_or(StoreError::UserNotFound)
        })
    }
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    Ok(bcrypt::verify(password, hash)?)
}
