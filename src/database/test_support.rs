use rusqlite::params;
use tempfile::TempDir;

use crate::auth::password::hash_password;
use crate::database::Database;

/// Fresh schema in a throwaway directory. Keep the `TempDir` alive for the test.
pub fn temp_db() -> (TempDir, Database) {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::create(dir.path().join("music.db")).unwrap();
    (dir, db)
}

pub fn insert_user(db: &Database, first_name: &str, email: &str, password: &str, is_admin: bool) -> i64 {
    let conn = db.connect().unwrap();
    conn.execute(
        "INSERT INTO Users (first_name, last_name, email, password, is_admin) VALUES (?1, 'Tester', ?2, ?3, ?4)",
        params![first_name, email, hash_password(password), is_admin],
    )
    .unwrap();
    conn.last_insert_rowid()
}

pub fn insert_artist(db: &Database, name: &str) -> i64 {
    let conn = db.connect().unwrap();
    conn.execute("INSERT INTO Artists (name) VALUES (?1)", params![name]).unwrap();
    conn.last_insert_rowid()
}

pub fn insert_song(db: &Database, title: &str, artist_id: i64) -> i64 {
    let conn = db.connect().unwrap();
    conn.execute(
        "INSERT INTO Songs (title, artist_id, duration, file_data, file_type, file_size)
         VALUES (?1, ?2, 125, x'00', 'mp3', 1024)",
        params![title, artist_id],
    )
    .unwrap();
    conn.last_insert_rowid()
}

pub fn insert_playlist(db: &Database, user_id: i64, name: &str) -> i64 {
    let conn = db.connect().unwrap();
    conn.execute(
        "INSERT INTO Playlists (user_id, name) VALUES (?1, ?2)",
        params![user_id, name],
    )
    .unwrap();
    conn.last_insert_rowid()
}

pub fn add_to_playlist(db: &Database, playlist_id: i64, song_id: i64) {
    let conn = db.connect().unwrap();
    conn.execute(
        "INSERT INTO Playlist_Songs (playlist_id, song_id) VALUES (?1, ?2)",
        params![playlist_id, song_id],
    )
    .unwrap();
}

pub fn add_favorite(db: &Database, user_id: i64, song_id: i64) {
    let conn = db.connect().unwrap();
    conn.execute(
        "INSERT INTO User_Favorites (user_id, song_id) VALUES (?1, ?2)",
        params![user_id, song_id],
    )
    .unwrap();
}

pub fn add_history(db: &Database, user_id: i64, song_id: i64) {
    let conn = db.connect().unwrap();
    conn.execute(
        "INSERT INTO Listening_History (user_id, song_id) VALUES (?1, ?2)",
        params![user_id, song_id],
    )
    .unwrap();
}

/// Runs a `SELECT COUNT(*) ... WHERE x = ?1` style query.
pub fn count(db: &Database, sql: &str, id: i64) -> i64 {
    let conn = db.connect().unwrap();
    conn.query_row(sql, params![id], |row| row.get(0)).unwrap()
}

pub fn count_all(db: &Database, sql: &str) -> i64 {
    let conn = db.connect().unwrap();
    conn.query_row(sql, [], |row| row.get(0)).unwrap()
}
