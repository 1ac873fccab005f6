use std::fmt;
use std::str::FromStr;

use rusqlite::{Connection, Row, params};
use tracing::debug;

use flickhub_types::api::NewFavourite;
use flickhub_types::models::Favourite;

use crate::Pool;
use crate::error::{Result, StoreError, is_foreign_key_violation, is_unique_violation};

const FAVOURITE_COLUMNS: &str =
    "id_favourites, id_users, id_groups, movie_id, series_id, name, avatar";

/// Who a favourite belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    User,
    Group,
}

impl Scope {
    fn owner_column(self) -> &'static str {
        match self {
            Self::User => "id_users",
            Self::Group => "id_groups",
        }
    }
}

impl FromStr for Scope {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "user" => Ok(Self::User),
            "group" => Ok(Self::Group),
            other => Err(StoreError::InvalidScope(other.to_string())),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => f.write_str("user"),
            Self::Group => f.write_str("group"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Target {
    Movie(i64),
    Series(i64),
}

impl Target {
    fn column(self) -> &'static str {
        match self {
            Self::Movie(_) => "movie_id",
            Self::Series(_) => "series_id",
        }
    }

    fn id(self) -> i64 {
        match self {
            Self::Movie(id) | Self::Series(id) => id,
        }
    }
}

/// Exactly one of user/group must own the favourite.
fn owner_of(fav: &NewFavourite) -> Result<(Scope, i64)> {
    match (fav.id_users, fav.id_groups) {
        (Some(_), Some(_)) => Err(StoreError::OwnerConflict),
        (Some(user), None) => Ok((Scope::User, user)),
        (None, Some(group)) => Ok((Scope::Group, group)),
        (None, None) => Err(StoreError::MissingOwner),
    }
}

/// Exactly one of movie/series must be the target.
fn target_of(fav: &NewFavourite) -> Result<Target> {
    match (fav.movie_id, fav.series_id) {
        (Some(_), Some(_)) => Err(StoreError::TargetConflict),
        (Some(movie), None) => Ok(Target::Movie(movie)),
        (None, Some(series)) => Ok(Target::Series(series)),
        (None, None) => Err(StoreError::MissingTarget),
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn favourite_from_row(row: &Row<'_>) -> rusqlite::Result<Favourite> {
    Ok(Favourite {
        id_favourites: row.get(0)?,
        id_users: row.get(1)?,
        id_groups: row.get(2)?,
        movie_id: row.get(3)?,
        series_id: row.get(4)?,
        name: row.get(5)?,
        avatar: row.get(6)?,
    })
}

fn favourite_exists(conn: &Connection, scope: Scope, owner: i64, target: Target) -> Result<bool> {
    let sql = format!(
        "SELECT EXISTS(SELECT 1 FROM favourites WHERE {} = ?1 AND {} = ?2)",
        scope.owner_column(),
        target.column()
    );
    Ok(conn.query_row(&sql, params![owner, target.id()], |row| row.get(0))?)
}

#[derive(Clone)]
pub struct FavouriteStore {
    pool: Pool,
}

impl FavouriteStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Validate and insert a favourite, returning the stored row.
    ///
    /// Owner and target rules are checked before touching the database. The
    /// duplicate check and the insert share one transaction; the unique index
    /// on (owner, target) backs it up.
    pub fn add_to_favourites(&self, fav: &NewFavourite) -> Result<Favourite> {
        let (scope, owner) = owner_of(fav)?;
        let target = target_of(fav)?;
        let name = non_blank(fav.name.as_deref());
        let avatar = non_blank(fav.avatar.as_deref());

        self.pool.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            if favourite_exists(&tx, scope, owner, target)? {
                debug!("{} {} already has {:?} in favourites", scope, owner, target);
                return Err(StoreError::DuplicateFavourite);
            }

            let inserted = tx.execute(
                "INSERT INTO favourites (id_users, id_groups, movie_id, series_id, name, avatar)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![fav.id_users, fav.id_groups, fav.movie_id, fav.series_id, name, avatar],
            );
            match inserted {
                Ok(_) => {}
                Err(e) if is_unique_violation(&e) => return Err(StoreError::DuplicateFavourite),
                Err(e) if is_foreign_key_violation(&e) => return Err(StoreError::UserNotFound),
                Err(e) => return Err(e.into()),
            }

            let id = tx.last_insert_rowid();
            let row = tx.query_row(
                &format!("SELECT {} FROM favourites WHERE id_favourites = ?1", FAVOURITE_COLUMNS),
                [id],
                favourite_from_row,
            )?;
            tx.commit()?;
            Ok(row)
        })
    }

    pub fn get_favourites(&self, scope: Scope, owner: i64) -> Result<Vec<Favourite>> {
        let sql = format!(
            "SELECT {} FROM favourites WHERE {} = ?1 ORDER BY id_favourites",
            FAVOURITE_COLUMNS,
            scope.owner_column()
        );
        self.pool.with_conn(|conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([owner], favourite_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
    }

    pub fn get_all_favourites(&self) -> Result<Vec<Favourite>> {
        self.pool.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM favourites ORDER BY id_favourites",
                FAVOURITE_COLUMNS
            ))?;
            let rows = stmt
                .query_map([], favourite_from_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })
    }

    /// Delete the owner's favourites with display name `name`. Returns the
    /// number of rows removed.
    pub fn delete_favourite(&self, scope: Scope, owner: i64, name: &str) -> Result<usize> {
        let sql = format!(
            "DELETE FROM favourites WHERE {} = ?1 AND name = ?2",
            scope.owner_column()
        );
        self.pool
            .with_conn_mut(|conn| Ok(conn.execute(&sql, params![owner, name])?))
    }
}
