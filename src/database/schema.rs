// Foreign keys are declared without ON DELETE CASCADE. Parent deletes remove
// their dependents explicitly (see songs::SongDependent, users::UserDependent).
pub const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS Users (
        user_id INTEGER PRIMARY KEY,
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        email TEXT UNIQUE NOT NULL,
        password TEXT NOT NULL,
        is_admin INTEGER NOT NULL DEFAULT 0,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    );

    CREATE TABLE IF NOT EXISTS Artists (
        artist_id INTEGER PRIMARY KEY,
        name TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS Genres (
        genre_id INTEGER PRIMARY KEY,
        name TEXT UNIQUE NOT NULL
    );

    CREATE TABLE IF NOT EXISTS Albums (
        album_id INTEGER PRIMARY KEY,
        title TEXT NOT NULL,
        artist_id INTEGER,
        FOREIGN KEY(artist_id) REFERENCES Artists(artist_id)
    );

    CREATE TABLE IF NOT EXISTS Songs (
        song_id INTEGER PRIMARY KEY,
        title TEXT NOT NULL,
        artist_id INTEGER NOT NULL,
        album_id INTEGER,
        genre_id INTEGER,
        duration INTEGER NOT NULL DEFAULT 0,
        file_data BLOB,
        file_type TEXT,
        file_size INTEGER NOT NULL DEFAULT 0,
        upload_date TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        FOREIGN KEY(artist_id) REFERENCES Artists(artist_id),
        FOREIGN KEY(album_id) REFERENCES Albums(album_id),
        FOREIGN KEY(genre_id) REFERENCES Genres(genre_id)
    );

    CREATE TABLE IF NOT EXISTS Playlists (
        playlist_id INTEGER PRIMARY KEY,
        user_id INTEGER NOT NULL,
        name TEXT NOT NULL,
        description TEXT,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        FOREIGN KEY(user_id) REFERENCES Users(user_id)
    );

    CREATE TABLE IF NOT EXISTS Playlist_Songs (
        playlist_id INTEGER NOT NULL,
        song_id INTEGER NOT NULL,
        added_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        FOREIGN KEY(playlist_id) REFERENCES Playlists(playlist_id),
        FOREIGN KEY(song_id) REFERENCES Songs(song_id),
        PRIMARY KEY(playlist_id, song_id)
    );

    CREATE TABLE IF NOT EXISTS User_Favorites (
        user_id INTEGER NOT NULL,
        song_id INTEGER NOT NULL,
        added_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        FOREIGN KEY(user_id) REFERENCES Users(user_id),
        FOREIGN KEY(song_id) REFERENCES Songs(song_id),
        PRIMARY KEY(user_id, song_id)
    );

    CREATE TABLE IF NOT EXISTS Listening_History (
        history_id INTEGER PRIMARY KEY,
        user_id INTEGER NOT NULL,
        song_id INTEGER NOT NULL,
        listened_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        FOREIGN KEY(user_id) REFERENCES Users(user_id),
        FOREIGN KEY(song_id) REFERENCES Songs(song_id)
    );
";
