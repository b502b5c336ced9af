use std::path::Path;

/// Extensions offered by the upload file filter. Anything else needs the
/// "all files" escape hatch.
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "flac", "ogg", "m4a", "aac", "aiff", "wma"];

/// Lowercase extension without the dot.
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
        .filter(|ext| !ext.is_empty())
}

pub fn is_audio_file(path: &Path) -> bool {
    extension_of(path)
        .map(|ext| AUDIO_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// File type stored alongside an uploaded song. The extension wins; for
/// extension-less files the magic bytes are consulted.
pub fn detect_file_type(path: &Path, data: &[u8]) -> String {
    if let Some(ext) = extension_of(path) {
        return ext;
    }

    match infer::get(data) {
        Some(kind) => kind.extension().to_string(),
        None => "bin".to_string(),
    }
}
