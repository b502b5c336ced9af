//! Artist and genre lookup tables. Both are insert-only from the admin screens.

use rusqlite::params;
use serde::Serialize;
use tracing::info;

use crate::database::Database;
use crate::error::{AdminResult, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artist {
    pub artist_id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Genre {
    pub genre_id: i64,
    pub name: String,
}

pub fn list_artists(db: &Database) -> AdminResult<Vec<Artist>> {
    let conn = db.connect()?;
    let mut stmt = conn.prepare("SELECT artist_id, name FROM Artists ORDER BY name")?;
    let artists = stmt
        .query_map([], |row| {
            Ok(Artist {
                artist_id: row.get(0)?,
                name: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(artists)
}

pub fn add_artist(db: &Database, name: &str) -> AdminResult<i64> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::MissingField("Artist name").into());
    }

    let conn = db.connect()?;
    conn.execute("INSERT INTO Artists (name) VALUES (?1)", params![name])?;
    let artist_id = conn.last_insert_rowid();
    info!("Added artist {} '{}'", artist_id, name);
    Ok(artist_id)
}

pub fn list_genres(db: &Database) -> AdminResult<Vec<Genre>> {
    let conn = db.connect()?;
    let mut stmt = conn.prepare("SELECT genre_id, name FROM Genres ORDER BY name")?;
    let genres = stmt
        .query_map([], |row| {
            Ok(Genre {
                genre_id: row.get(0)?,
                name: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(genres)
}

pub fn add_genre(db: &Database, name: &str) -> AdminResult<i64> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::MissingField("Genre name").into());
    }

    let conn = db.connect()?;
    conn.execute("INSERT INTO Genres (name) VALUES (?1)", params![name])?;
    let genre_id = conn.last_insert_rowid();
    info!("Added genre {} '{}'", genre_id, name);
    Ok(genre_id)
}
