use nordic_game::{GameLog, LogStorage, StorageError};
use std::fs;
use std::path::{Path, PathBuf};

/// Writes each saved log to one file, replacing what was there.
#[derive(Debug, Clone)]
pub struct FileLogStorage {
    path: PathBuf,
}

impl FileLogStorage {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LogStorage for FileLogStorage {
    fn save_log(&mut self, log: &GameLog) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, log.to_string())?;
        log::info!("saved log to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nordic_game::Settings;

    #[test]
    fn saved_log_reads_back() {
        let path = std::env::temp_dir()
            .join(format!(
                "nordic-storage-{}",
                std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .unwrap_or_default()
                    .as_nanos()
            ))
            .join("last.log");
        let mut storage = FileLogStorage::new(&path);
        let mut log = GameLog::new(42, Settings::default());
        log.add(3, "Oslo");
        storage.save_log(&log).unwrap();

        let text = fs::read_to_string(storage.path()).unwrap();
        assert!(text.starts_with("42\r\ntoll 20\r\n"));
        assert_eq!(text.parse::<GameLog>().unwrap(), log);
    }
}
