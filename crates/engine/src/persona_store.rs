//! Persona records on disk, one `<name>.json` per persona.

use genesis_core::error::PersonaError;
use genesis_core::persona::Persona;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Read-only access to a directory of persona records.
#[derive(Debug, Clone)]
pub struct PersonaStore {
    dir: PathBuf,
}

impl PersonaStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }

    /// Load and validate a single persona.
    pub fn load(&self, name: &str) -> Result<Persona, PersonaError> {
        let path = self.path_for(name);
        if !path.is_file() {
            return Err(PersonaError::NotFound(name.to_string()));
        }

        let content = std::fs::read_to_string(&path).map_err(|e| PersonaError::Read {
            path: path.clone(),
            reason: e.to_string(),
        })?;

        let persona: Persona = serde_json::from_str(&content).map_err(|e| PersonaError::Parse {
            path: path.clone(),
            reason: e.to_string(),
        })?;

        persona.validate()?;
        if persona.name != name {
            debug!(file = name, name = %persona.name, "Persona name differs from its file name");
        }
        Ok(persona)
    }

    /// Names of every record in the directory, sorted.
    pub fn list(&self) -> Result<Vec<String>, PersonaError> {
        let entries = std::fs::read_dir(&self.dir).map_err(|e| PersonaError::Read {
            path: self.dir.clone(),
            reason: e.to_string(),
        })?;

        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(String::from))
            .collect();
        names.sort();
        Ok(names)
    }

    /// Load every named persona; the first failure aborts the whole roster.
    pub fn load_roster_strict(&self, names: &[String]) -> Result<Vec<Persona>, PersonaError> {
        names.iter().map(|name| self.load(name)).collect()
    }

    /// Load whichever named personas can be loaded, skipping the rest.
    ///
    /// An empty `names` list means every persona in the directory.
    pub fn load_roster_lenient(&self, names: &[String]) -> Vec<Persona> {
        let names = if names.is_empty() {
            match self.list() {
                Ok(all) => all,
                Err(e) => {
                    warn!("Cannot list personas: {e}");
                    return vec![];
                }
            }
        } else {
            names.to_vec()
        };

        names
            .iter()
            .filter_map(|name| match self.load(name) {
                Ok(persona) => Some(persona),
                Err(e) => {
                    warn!(persona = %name, "Skipping persona: {e}");
                    None
                }
            })
            .collect()
    }
}
