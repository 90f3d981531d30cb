use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use sendoc_logging::{sendoc_info, sendoc_warn};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

const SESSION_FILENAME: &str = "session.ron";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct PersistedSession {
    session_id: String,
    created_utc: String,
}

/// Returns the stored session id, or generates one with `generate` and
/// stores it. A store that cannot be written only costs persistence.
pub(crate) fn resolve_session_id(
    data_dir: &Path,
    now_utc: &str,
    generate: impl FnOnce() -> String,
) -> String {
    if let Some(existing) = load_session_id(data_dir) {
        return existing;
    }

    let session = PersistedSession {
        session_id: generate(),
        created_utc: now_utc.to_string(),
    };
    match save_session(data_dir, &session) {
        Ok(path) => sendoc_info!("Created session {} in {:?}", session.session_id, path),
        Err(err) => sendoc_warn!("Failed to persist session id in {:?}: {}", data_dir, err),
    }
    session.session_id
}

fn load_session_id(data_dir: &Path) -> Option<String> {
    let path = data_dir.join(SESSION_FILENAME);
    let content = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
        Err(err) => {
            sendoc_warn!("Failed to read session from {:?}: {}", path, err);
            return None;
        }
    };

    match ron::from_str::<PersistedSession>(&content) {
        Ok(session) if !session.session_id.trim().is_empty() => Some(session.session_id),
        Ok(_) => {
            sendoc_warn!("Ignoring empty session id in {:?}", path);
            None
        }
        Err(err) => {
            sendoc_warn!("Failed to parse session from {:?}: {}", path, err);
            None
        }
    }
}

fn save_session(data_dir: &Path, session: &PersistedSession) -> anyhow::Result<PathBuf> {
    let content = ron::ser::to_string_pretty(session, ron::ser::PrettyConfig::new())?;
    write_atomically(data_dir, SESSION_FILENAME, &content)
}

/// Temp file in the same directory, then rename over the target.
fn write_atomically(dir: &Path, filename: &str, content: &str) -> anyhow::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let target = dir.join(filename);
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.as_file_mut().sync_all()?;
    tmp.persist(&target).map_err(|err| err.error)?;
    Ok(target)
}
