use std::{fs, io, path::Path, path::PathBuf};

use serde::{Deserialize, Serialize};

use crate::schema::TaskRecord;

pub const DEFAULT_DB_PATH: &str = "data/db.json";

/// On-disk layout: `{ "tasks": [...] }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Db {
    #[serde(default)]
    pub tasks: Vec<TaskRecord>,
}

/// The backend's database: one JSON file, re-read and re-written whole on
/// every request. No locking; the last writer wins.
#[derive(Debug, Clone)]
pub struct JsonFileDb {
    path: PathBuf,
}

impl Default for JsonFileDb {
    fn default() -> Self {
        Self::new(DEFAULT_DB_PATH)
    }
}

impl JsonFileDb {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file reads as an empty database.
    pub fn load(&self) -> io::Result<Db> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Db::default()),
            Err(e) => return Err(e),
        };
        let db: Db =
            serde_json::from_str(&text).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        Ok(db)
    }

    pub fn save(&self, db: &Db) -> io::Result<()> {
        let tmp_path = self.path.with_extension("json.tmp");
        let text = serde_json::to_string_pretty(db)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(&tmp_path, text)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}
