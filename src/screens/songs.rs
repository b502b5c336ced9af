use std::fs;
use std::path::PathBuf;

use serde::Serialize;
use tracing::info;

use crate::database::catalog::{self, Artist, Genre};
use crate::database::songs::{self, NewSong, SongRecord};
use crate::database::Database;
use crate::error::{AdminResult, ValidationError};
use crate::media::{mimetype, probe};
use crate::screens::table::Table;
use crate::screens::Screen;
use crate::session::AdminSession;
use crate::utils::format::{format_duration, format_file_size};

/// One line of the songs table, already formatted for display.
#[derive(Debug, Clone, Serialize)]
pub struct SongRow {
    pub index: usize,
    pub song_id: i64,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub genre: String,
    pub duration: String,
    pub size: String,
    pub file_type: String,
}

impl SongRow {
    fn from_record(index: usize, record: SongRecord) -> Self {
        Self {
            index,
            song_id: record.song_id,
            title: record.title,
            artist: record.artist_name,
            album: record.album_name.unwrap_or_default(),
            genre: record.genre_name.unwrap_or_default(),
            duration: format_duration(record.duration),
            size: format_file_size(record.file_size.max(0) as u64),
            file_type: record.file_type.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub path: PathBuf,
    /// Defaults to the file name without extension.
    pub title: Option<String>,
    pub artist_id: i64,
    pub genre_id: Option<i64>,
    pub album_id: Option<i64>,
    /// The "All files" choice of the picker: skip the audio extension filter.
    pub allow_any_file: bool,
}

#[derive(Debug)]
pub struct SongsScreen<'a> {
    db: &'a Database,
    admin: AdminSession,
    rows: Vec<SongRow>,
}

impl<'a> SongsScreen<'a> {
    pub fn open(db: &'a Database, admin: AdminSession) -> AdminResult<Self> {
        let mut screen = Self {
            db,
            admin,
            rows: Vec::new(),
        };
        screen.refresh()?;
        Ok(screen)
    }

    pub fn admin(&self) -> &AdminSession {
        &self.admin
    }

    pub fn rows(&self) -> &[SongRow] {
        &self.rows
    }

    pub fn find(&self, song_id: i64) -> Option<&SongRow> {
        self.rows.iter().find(|row| row.song_id == song_id)
    }

    /// Rebuilds every row from the database.
    pub fn refresh(&mut self) -> AdminResult<()> {
        let records = songs::list_songs(self.db)?;
        self.rows = records
            .into_iter()
            .enumerate()
            .map(|(i, record)| SongRow::from_record(i + 1, record))
            .collect();
        Ok(())
    }

    /// Removes the song with everything that references it. On failure the
    /// displayed rows are left as they were.
    pub fn delete(&mut self, song_id: i64) -> AdminResult<()> {
        songs::delete_song(self.db, song_id)?;
        self.refresh()
    }

    pub fn upload(&mut self, request: UploadRequest) -> AdminResult<i64> {
        let song = prepare_upload(&request)?;
        let song_id = songs::insert_song(self.db, &song)?;
        info!(
            "Admin {} uploaded {:?} as song {}",
            self.admin.admin_id(),
            request.path,
            song_id
        );
        self.refresh()?;
        Ok(song_id)
    }

    pub fn artists(&self) -> AdminResult<Vec<Artist>> {
        catalog::list_artists(self.db)
    }

    pub fn add_artist(&self, name: &str) -> AdminResult<i64> {
        catalog::add_artist(self.db, name)
    }

    pub fn genres(&self) -> AdminResult<Vec<Genre>> {
        catalog::list_genres(self.db)
    }

    pub fn add_genre(&self, name: &str) -> AdminResult<i64> {
        catalog::add_genre(self.db, name)
    }

    pub fn render(&self) -> String {
        let mut table = Table::new(vec!["#", "Title", "Artist", "Album", "Genre", "Duration", "Size", "ID"]);
        for row in &self.rows {
            table.push(vec![
                row.index.to_string(),
                row.title.clone(),
                row.artist.clone(),
                row.album.clone(),
                row.genre.clone(),
                row.duration.clone(),
                row.size.clone(),
                row.song_id.to_string(),
            ]);
        }
        format!(
            "{}  |  Admin: {}\n{}Total Songs: {}",
            Screen::Songs.title(),
            self.admin.profile().display_name(),
            table.render(),
            self.rows.len()
        )
    }
}

/// Reads the file and gathers everything stored with the song. Only the
/// duration probe may fail softly.
fn prepare_upload(request: &UploadRequest) -> AdminResult<NewSong> {
    let path = &request.path;
    if !path.is_file() {
        return Err(ValidationError::FileNotFound(path.display().to_string()).into());
    }
    if !request.allow_any_file && !mimetype::is_audio_file(path) {
        return Err(ValidationError::UnsupportedFileType(path.display().to_string()).into());
    }

    let title = match request.title.as_deref().map(str::trim) {
        Some(title) => title.to_string(),
        None => path
            .file_stem()
            .map(|stem| stem.to_string_lossy().trim().to_string())
            .unwrap_or_default(),
    };
    if title.is_empty() {
        return Err(ValidationError::MissingField("Song title").into());
    }

    let file_data = fs::read(path)?;
    let file_size = i64::try_from(file_data.len()).unwrap_or(i64::MAX);
    let duration = probe::probe_duration(path);
    let file_type = mimetype::detect_file_type(path, &file_data);

    Ok(NewSong {
        title,
        artist_id: request.artist_id,
        album_id: request.album_id,
        genre_id: request.genre_id,
        duration,
        file_data,
        file_type,
        file_size,
    })
}
