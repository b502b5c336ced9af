use chrono::NaiveDateTime;
use rusqlite::{params, OptionalExtension};
use serde::Serialize;
use tracing::{debug, info};

use crate::database::Database;
use crate::error::{AdminError, AdminResult, ValidationError};
use crate::session::AdminProfile;

pub const DEFAULT_PLAYLIST_NAME: &str = "Favorites";
pub const DEFAULT_PLAYLIST_DESCRIPTION: &str = "My favorite songs";

#[derive(Debug, Clone, Serialize)]
pub struct UserRecord {
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub is_admin: bool,
    pub created_at: NaiveDateTime,
    pub playlist_count: i64,
    pub listening_count: i64,
}

impl UserRecord {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A validated user ready to be stored. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub is_admin: bool,
}

/// Stored credentials for a login attempt.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub profile: AdminProfile,
    pub password_hash: String,
    pub is_admin: bool,
}

/// Tables holding rows owned by a user, cleared in this order before the
/// user row. Playlist entries go first since they hang off the playlists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserDependent {
    PlaylistSongs,
    Playlists,
    UserFavorites,
    ListeningHistory,
}

impl UserDependent {
    pub const ALL: [UserDependent; 4] = [
        UserDependent::PlaylistSongs,
        UserDependent::Playlists,
        UserDependent::UserFavorites,
        UserDependent::ListeningHistory,
    ];

    fn delete_sql(self) -> &'static str {
        match self {
            UserDependent::PlaylistSongs => {
                "DELETE FROM Playlist_Songs
                 WHERE playlist_id IN (SELECT playlist_id FROM Playlists WHERE user_id = ?1)"
            }
            UserDependent::Playlists => "DELETE FROM Playlists WHERE user_id = ?1",
            UserDependent::UserFavorites => "DELETE FROM User_Favorites WHERE user_id = ?1",
            UserDependent::ListeningHistory => "DELETE FROM Listening_History WHERE user_id = ?1",
        }
    }
}

/// All users with playlist and play counts, newest account first.
pub fn list_users(db: &Database) -> AdminResult<Vec<UserRecord>> {
    let conn = db.connect()?;
    let mut stmt = conn.prepare(
        "SELECT u.user_id, u.first_name, u.last_name, u.email, u.is_admin, u.created_at,
                COUNT(DISTINCT p.playlist_id) AS playlist_count,
                COUNT(DISTINCT lh.history_id) AS listening_count
         FROM Users u
         LEFT JOIN Playlists p ON u.user_id = p.user_id
         LEFT JOIN Listening_History lh ON u.user_id = lh.user_id
         GROUP BY u.user_id
         ORDER BY u.created_at DESC, u.user_id DESC",
    )?;

    let users = stmt
        .query_map([], |row| {
            Ok(UserRecord {
                user_id: row.get(0)?,
                first_name: row.get(1)?,
                last_name: row.get(2)?,
                email: row.get(3)?,
                is_admin: row.get(4)?,
                created_at: row.get(5)?,
                playlist_count: row.get(6)?,
                listening_count: row.get(7)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(users)
}

/// Looks up a user holding the admin flag.
pub fn find_admin(db: &Database, user_id: i64) -> AdminResult<Option<AdminProfile>> {
    let conn = db.connect()?;
    let profile = conn
        .query_row(
            "SELECT user_id, first_name, last_name, email FROM Users WHERE user_id = ?1 AND is_admin = 1",
            params![user_id],
            |row| {
                Ok(AdminProfile {
                    id: row.get(0)?,
                    first_name: row.get(1)?,
                    last_name: row.get(2)?,
                    email: row.get(3)?,
                })
            },
        )
        .optional()?;
    Ok(profile)
}

pub fn find_credentials(db: &Database, email: &str) -> AdminResult<Option<Credentials>> {
    let conn = db.connect()?;
    let credentials = conn
        .query_row(
            "SELECT user_id, first_name, last_name, email, password, is_admin FROM Users WHERE email = ?1",
            params![email],
            |row| {
                Ok(Credentials {
                    profile: AdminProfile {
                        id: row.get(0)?,
                        first_name: row.get(1)?,
                        last_name: row.get(2)?,
                        email: row.get(3)?,
                    },
                    password_hash: row.get(4)?,
                    is_admin: row.get(5)?,
                })
            },
        )
        .optional()?;
    Ok(credentials)
}

pub fn admin_exists(db: &Database) -> AdminResult<bool> {
    let conn = db.connect()?;
    let exists = conn.query_row("SELECT EXISTS(SELECT 1 FROM Users WHERE is_admin = 1)", [], |row| row.get(0))?;
    Ok(exists)
}

/// Creates the user and its default playlist in one transaction.
/// Fails with `DuplicateEmail` if the address is taken.
pub fn insert_user(db: &Database, user: &NewUser) -> AdminResult<i64> {
    let mut conn = db.connect()?;
    let tx = conn.transaction()?;

    let taken: Option<i64> = tx
        .query_row("SELECT user_id FROM Users WHERE email = ?1", params![user.email], |row| row.get(0))
        .optional()?;
    if taken.is_some() {
        return Err(ValidationError::DuplicateEmail.into());
    }

    tx.execute(
        "INSERT INTO Users (first_name, last_name, email, password, is_admin) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![user.first_name, user.last_name, user.email, user.password_hash, user.is_admin],
    )?;
    let user_id = tx.last_insert_rowid();

    tx.execute(
        "INSERT INTO Playlists (user_id, name, description) VALUES (?1, ?2, ?3)",
        params![user_id, DEFAULT_PLAYLIST_NAME, DEFAULT_PLAYLIST_DESCRIPTION],
    )?;

    tx.commit()?;
    info!("Created user {} <{}> (admin: {})", user_id, user.email, user.is_admin);
    Ok(user_id)
}

/// Deletes a non-admin user and everything it owns. Admins are refused
/// before anything is touched.
pub fn delete_user(db: &Database, user_id: i64) -> AdminResult<()> {
    let mut conn = db.connect()?;
    let tx = conn.transaction()?;

    let is_admin: Option<bool> = tx
        .query_row("SELECT is_admin FROM Users WHERE user_id = ?1", params![user_id], |row| row.get(0))
        .optional()?;
    match is_admin {
        None => return Err(AdminError::NotFound { entity: "User", id: user_id }),
        Some(true) => return Err(AdminError::PolicyViolation("Cannot delete an admin user.".to_string())),
        Some(false) => {}
    }

    for dependent in UserDependent::ALL {
        let removed = tx.execute(dependent.delete_sql(), params![user_id])?;
        debug!("Removed {} {:?} rows for user {}", removed, dependent, user_id);
    }
    tx.execute("DELETE FROM Users WHERE user_id = ?1", params![user_id])?;

    tx.commit()?;
    info!("Deleted user {}", user_id);
    Ok(())
}

/// Flips the admin flag and returns the new value.
pub fn toggle_admin(db: &Database, user_id: i64) -> AdminResult<bool> {
    let conn = db.connect()?;
    let is_admin: Option<bool> = conn
        .query_row(
            "UPDATE Users SET is_admin = 1 - is_admin WHERE user_id = ?1 RETURNING is_admin",
            params![user_id],
            |row| row.get(0),
        )
        .optional()?;

    let is_admin = is_admin.ok_or(AdminError::NotFound { entity: "User", id: user_id })?;
    info!("User {} admin flag is now {}", user_id, is_admin);
    Ok(is_admin)
}
