//! Music catalog enumeration.
//!
//! The catalog is never cached: every `LIST` request rescans the music
//! directory, so files added or removed while the server runs show up
//! on the next request.

use std::io;
use std::path::Path;

use tracing::warn;

/// File extensions included in the catalog, compared ASCII
/// case-insensitively.
pub const AUDIO_EXTENSIONS: [&str; 2] = ["mp3", "wav"];

/// Scans `dir` and returns the sorted list of audio filenames.
///
/// Only regular files directly inside the directory are considered;
/// subdirectories are never descended into. Entries whose names are not
/// valid UTF-8 are skipped with a warning.
pub async fn scan_catalog(dir: &Path) -> io::Result<Vec<String>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let file_type = match entry.file_type().await {
            Ok(file_type) => file_type,
            Err(e) => {
                warn!(
                    name = %entry.file_name().to_string_lossy(),
                    error = %e,
                    "skipping unreadable directory entry"
                );
                continue;
            }
        };
        if !file_type.is_file() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            warn!(
                name = %name.to_string_lossy(),
                "skipping file with non-UTF-8 name"
            );
            continue;
        };
        if has_audio_extension(name) {
            files.push(name.to_string());
        }
    }
    files.sort();
    Ok(files)
}

fn has_audio_extension(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            AUDIO_EXTENSIONS
                .iter()
                .any(|audio| ext.eq_ignore_ascii_case(audio))
        })
}
