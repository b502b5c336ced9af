use chrono::NaiveDateTime;
use rusqlite::{params, OptionalExtension, Transaction};
use serde::Serialize;
use tracing::{debug, info};

use crate::database::Database;
use crate::error::{AdminError, AdminResult};

#[derive(Debug, Clone, Serialize)]
pub struct SongRecord {
    pub song_id: i64,
    pub title: String,
    pub artist_name: String,
    pub album_name: Option<String>,
    pub genre_name: Option<String>,
    pub duration: i64,
    pub file_size: i64,
    pub file_type: Option<String>,
    pub upload_date: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct NewSong {
    pub title: String,
    pub artist_id: i64,
    pub album_id: Option<i64>,
    pub genre_id: Option<i64>,
    pub duration: u32,
    pub file_data: Vec<u8>,
    pub file_type: String,
    pub file_size: i64,
}

/// Tables holding rows that reference a song. Cleared, in this order,
/// before the song itself is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SongDependent {
    PlaylistSongs,
    UserFavorites,
    ListeningHistory,
}

impl SongDependent {
    pub const ALL: [SongDependent; 3] = [
        SongDependent::PlaylistSongs,
        SongDependent::UserFavorites,
        SongDependent::ListeningHistory,
    ];

    fn delete_sql(self) -> &'static str {
        match self {
            SongDependent::PlaylistSongs => "DELETE FROM Playlist_Songs WHERE song_id = ?1",
            SongDependent::UserFavorites => "DELETE FROM User_Favorites WHERE song_id = ?1",
            SongDependent::ListeningHistory => "DELETE FROM Listening_History WHERE song_id = ?1",
        }
    }
}

/// All songs, newest upload first.
pub fn list_songs(db: &Database) -> AdminResult<Vec<SongRecord>> {
    let conn = db.connect()?;
    let mut stmt = conn.prepare(
        "SELECT s.song_id, s.title, a.name, al.title, g.name,
                s.duration, s.file_size, s.file_type, s.upload_date
         FROM Songs s
         JOIN Artists a ON s.artist_id = a.artist_id
         LEFT JOIN Albums al ON s.album_id = al.album_id
         LEFT JOIN Genres g ON s.genre_id = g.genre_id
         ORDER BY s.upload_date DESC, s.song_id DESC",
    )?;

    let songs = stmt
        .query_map([], |row| {
            Ok(SongRecord {
                song_id: row.get(0)?,
                title: row.get(1)?,
                artist_name: row.get(2)?,
                album_name: row.get(3)?,
                genre_name: row.get(4)?,
                duration: row.get::<_, Option<i64>>(5)?.unwrap_or(0),
                file_size: row.get::<_, Option<i64>>(6)?.unwrap_or(0),
                file_type: row.get(7)?,
                upload_date: row.get(8)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(songs)
}

/// Stores an uploaded song and returns its id.
pub fn insert_song(db: &Database, song: &NewSong) -> AdminResult<i64> {
    let mut conn = db.connect()?;
    let tx = conn.transaction()?;

    ensure_exists(&tx, "SELECT 1 FROM Artists WHERE artist_id = ?1", "Artist", song.artist_id)?;
    if let Some(genre_id) = song.genre_id {
        ensure_exists(&tx, "SELECT 1 FROM Genres WHERE genre_id = ?1", "Genre", genre_id)?;
    }
    if let Some(album_id) = song.album_id {
        ensure_exists(&tx, "SELECT 1 FROM Albums WHERE album_id = ?1", "Album", album_id)?;
    }

    tx.execute(
        "INSERT INTO Songs (title, artist_id, album_id, genre_id, duration, file_data, file_type, file_size)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            song.title,
            song.artist_id,
            song.album_id,
            song.genre_id,
            song.duration,
            song.file_data,
            song.file_type,
            song.file_size
        ],
    )?;
    let song_id = tx.last_insert_rowid();
    tx.commit()?;

    info!("Uploaded song {} '{}' ({} bytes)", song_id, song.title, song.file_size);
    Ok(song_id)
}

/// Deletes a song and every row referencing it as one transaction.
pub fn delete_song(db: &Database, song_id: i64) -> AdminResult<()> {
    let mut conn = db.connect()?;
    let tx = conn.transaction()?;

    ensure_exists(&tx, "SELECT 1 FROM Songs WHERE song_id = ?1", "Song", song_id)?;

    for dependent in SongDependent::ALL {
        let removed = tx.execute(dependent.delete_sql(), params![song_id])?;
        debug!("Removed {} {:?} rows for song {}", removed, dependent, song_id);
    }
    tx.execute("DELETE FROM Songs WHERE song_id = ?1", params![song_id])?;

    tx.commit()?;
    info!("Deleted song {}", song_id);
    Ok(())
}

pub(crate) fn ensure_exists(tx: &Transaction<'_>, sql: &str, entity: &'static str, id: i64) -> AdminResult<()> {
    let found: Option<i64> = tx.query_row(sql, params![id], |row| row.get(0)).optional()?;
    match found {
        Some(_) => Ok(()),
        None => Err(AdminError::NotFound { entity, id }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_support as fixtures;
    use crate::database::test_support::{
        add_favorite, add_history, add_to_playlist, count, insert_artist, insert_playlist, insert_user, temp_db,
    };
    use anyhow::Result;

    fn new_song(title: &str, artist_id: i64) -> NewSong {
        NewSong {
            title: title.to_string(),
            artist_id,
            album_id: None,
            genre_id: None,
            duration: 59,
            file_data: vec![1, 2, 3, 4],
            file_type: "mp3".to_string(),
            file_size: 4,
        }
    }

    #[test]
    fn test_list_songs_newest_first_with_optional_joins() -> Result<()> {
        let (_dir, db) = temp_db();
        let artist = insert_artist(&db, "Nina Simone");
        let first = fixtures::insert_song(&db, "Sinnerman", artist);
        let second = fixtures::insert_song(&db, "Feeling Good", artist);

        let songs = list_songs(&db)?;
        assert_eq!(songs.len(), 2);
        assert_eq!(songs[0].song_id, second);
        assert_eq!(songs[1].song_id, first);
        assert_eq!(songs[0].artist_name, "Nina Simone");
        assert!(songs[0].genre_name.is_none());
        assert!(songs[0].album_name.is_none());
        Ok(())
    }

    #[test]
    fn test_insert_song_stores_payload() -> Result<()> {
        let (_dir, db) = temp_db();
        let artist = insert_artist(&db, "Portishead");

        let song_id = insert_song(&db, &new_song("Roads", artist))?;

        let conn = db.connect()?;
        let (data, size): (Vec<u8>, i64) = conn.query_row(
            "SELECT file_data, file_size FROM Songs WHERE song_id = ?1",
            params![song_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        assert_eq!(data, vec![1, 2, 3, 4]);
        assert_eq!(size, 4);
        Ok(())
    }

    #[test]
    fn test_insert_song_unknown_artist() {
        let (_dir, db) = temp_db();
        let err = insert_song(&db, &new_song("Ghost", 99)).unwrap_err();
        assert!(matches!(err, AdminError::NotFound { entity: "Artist", id: 99 }));
    }

    #[test]
    fn test_delete_song_removes_dependents() -> Result<()> {
        let (_dir, db) = temp_db();
        let user = insert_user(&db, "Ada", "ada@example.com", "password1", false);
        let artist = insert_artist(&db, "Björk");
        let song = fixtures::insert_song(&db, "Hyperballad", artist);
        let keep = fixtures::insert_song(&db, "Joga", artist);
        let playlist = insert_playlist(&db, user, "Mix");
        add_to_playlist(&db, playlist, song);
        add_to_playlist(&db, playlist, keep);
        add_favorite(&db, user, song);
        add_history(&db, user, song);
        add_history(&db, user, keep);

        delete_song(&db, song)?;

        assert_eq!(count(&db, "SELECT COUNT(*) FROM Songs WHERE song_id = ?1", song), 0);
        assert_eq!(count(&db, "SELECT COUNT(*) FROM Playlist_Songs WHERE song_id = ?1", song), 0);
        assert_eq!(count(&db, "SELECT COUNT(*) FROM User_Favorites WHERE song_id = ?1", song), 0);
        assert_eq!(count(&db, "SELECT COUNT(*) FROM Listening_History WHERE song_id = ?1", song), 0);
        assert_eq!(count(&db, "SELECT COUNT(*) FROM Playlist_Songs WHERE song_id = ?1", keep), 1);
        assert_eq!(count(&db, "SELECT COUNT(*) FROM Listening_History WHERE song_id = ?1", keep), 1);

        let remaining: Vec<i64> = list_songs(&db)?.iter().map(|s| s.song_id).collect();
        assert_eq!(remaining, vec![keep]);
        Ok(())
    }

    #[test]
    fn test_delete_missing_song() {
        let (_dir, db) = temp_db();
        let err = delete_song(&db, 7).unwrap_err();
        assert!(matches!(err, AdminError::NotFound { entity: "Song", id: 7 }));
    }

    #[test]
    fn test_delete_song_rolls_back_on_failure() -> Result<()> {
        let (_dir, db) = temp_db();
        let user = insert_user(&db, "Ada", "ada@example.com", "password1", false);
        let artist = insert_artist(&db, "Björk");
        let song = fixtures::insert_song(&db, "Hyperballad", artist);
        add_favorite(&db, user, song);
        add_history(&db, user, song);

        // A reference outside the enumerated dependents makes the final delete fail.
        let conn = db.connect()?;
        conn.execute_batch(
            "CREATE TABLE Song_Lyrics (song_id INTEGER NOT NULL REFERENCES Songs(song_id));",
        )?;
        conn.execute("INSERT INTO Song_Lyrics (song_id) VALUES (?1)", params![song])?;
        drop(conn);

        assert!(delete_song(&db, song).is_err());

        assert_eq!(count(&db, "SELECT COUNT(*) FROM Songs WHERE song_id = ?1", song), 1);
        assert_eq!(count(&db, "SELECT COUNT(*) FROM User_Favorites WHERE song_id = ?1", song), 1);
        assert_eq!(count(&db, "SELECT COUNT(*) FROM Listening_History WHERE song_id = ?1", song), 1);
        Ok(())
    }
}
