use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use sgp4::{Constants, Elements};

use crate::predict::error::PredictError;
use crate::predict::types::SatelliteInfo;

pub struct TleEntry {
    pub info: SatelliteInfo,
    pub elements: Elements,
    pub constants: Constants,
}

/// Orbital elements for every satellite found in a directory of TLE files.
pub struct TleLoader {
    tle_dir: PathBuf,
    satellites: HashMap<u32, TleEntry>,
}

impl TleLoader {
    pub fn new(tle_dir: PathBuf) -> Self {
        Self {
            tle_dir,
            satellites: HashMap::new(),
        }
    }

    /// Load all `.tle` and `.txt` files from the directory
    pub fn load_all(&mut self) -> Result<(), PredictError> {
        if !self.tle_dir.exists() {
            return Err(PredictError::DirectoryNotFound(
                self.tle_dir.display().to_string(),
            ));
        }

        self.satellites.clear();

        for entry in fs::read_dir(&self.tle_dir)? {
            let path = entry?.path();
            let is_tle = path
                .extension()
                .is_some_and(|ext| ext == "tle" || ext == "txt");
            if !path.is_file() || !is_tle {
                continue;
            }

            if let Err(e) = self.load_file(&path) {
                log::warn!("Failed to parse TLE file {}: {}", path.display(), e);
            }
        }

        log::info!(
            "Loaded {} satellites from {}",
            self.satellites.len(),
            self.tle_dir.display()
        );
        Ok(())
    }

    fn load_file(&mut self, path: &Path) -> Result<(), PredictError> {
        let content = fs::read_to_string(path)?;
        let filename = path.file_name().unwrap_or_default().to_string_lossy();
        self.load_content(&filename, &content)
    }

    /// Parse TLE text (two- or three-line sets, possibly several satellites)
    /// and add it to the loaded set. A later entry replaces an earlier one
    /// with the same NORAD id.
    pub fn load_content(&mut self, source: &str, content: &str) -> Result<(), PredictError> {
        for entry in parse_entries(source, content)? {
            self.satellites.insert(entry.info.norad_id, entry);
        }
        Ok(())
    }

    pub fn get(&self, norad_id: u32) -> Option<&TleEntry> {
        self.satellites.get(&norad_id)
    }

    /// Look a satellite up by NORAD id or by name, ignoring case. An exact
    /// name wins over a prefix match.
    pub fn find(&self, query: &str) -> Option<&TleEntry> {
        let query = query.trim();
        if let Ok(id) = query.parse::<u32>() {
            if let Some(entry) = self.get(id) {
                return Some(entry);
            }
        }

        let wanted = query.to_uppercase();
        let mut by_name: Vec<&TleEntry> = self.satellites.values().collect();
        by_name.sort_by_key(|e| e.info.norad_id);

        by_name
            .iter()
            .find(|e| e.info.name.to_uppercase() == wanted)
            .or_else(|| {
                by_name
                    .iter()
                    .find(|e| e.info.name.to_uppercase().starts_with(&wanted))
            })
            .copied()
    }

    pub fn satellites(&self) -> Vec<&TleEntry> {
        let mut all: Vec<&TleEntry> = self.satellites.values().collect();
        all.sort_by(|a, b| a.info.name.cmp(&b.info.name));
        all
    }
}

fn parse_entries(source: &str, content: &str) -> Result<Vec<TleEntry>, PredictError> {
    let invalid = |message: String| PredictError::InvalidTle {
        file: source.to_string(),
        message,
    };

    let mut results = Vec::new();
    for (name, line1, line2) in parse_multi_tle(content) {
        let elements = Elements::from_tle(name.clone(), line1.as_bytes(), line2.as_bytes())
            .map_err(|e| invalid(e.to_string()))?;
        let constants = Constants::from_elements(&elements).map_err(|e| invalid(e.to_string()))?;

        let sat_name = name.unwrap_or_else(|| format!("NORAD {}", elements.norad_id));

        results.push(TleEntry {
            info: SatelliteInfo {
                name: sat_name,
                norad_id: elements.norad_id as u32,
                tle_source: source.to_string(),
            },
            elements,
            constants,
        });
    }

    Ok(results)
}

/// Split TLE text into (name, line 1, line 2) triples.
fn parse_multi_tle(content: &str) -> Vec<(Option<String>, String, String)> {
    let lines: Vec<&str> = content
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect();

    let mut result = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        if lines[i].starts_with("1 ") && i + 1 < lines.len() && lines[i + 1].starts_with("2 ") {
            result.push((None, lines[i].to_string(), lines[i + 1].to_string()));
            i += 2;
        } else if i + 2 < lines.len()
            && lines[i + 1].starts_with("1 ")
            && lines[i + 2].starts_with("2 ")
        {
            let name = lines[i].trim_start_matches("0 ").to_string();
            result.push((Some(name), lines[i + 1].to_string(), lines[i + 2].to_string()));
            i += 3;
        } else {
            i += 1;
        }
    }

    result
}
