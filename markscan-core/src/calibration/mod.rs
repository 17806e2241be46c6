//! Persistent resolution -> scale factor calibration.
//!
//! The mapping lives in a single human-editable JSON object whose keys are
//! `"{width}x{height}"` strings and whose values are positive scale factors.
//! Every write re-reads the file, applies the change and atomically replaces
//! the whole file. There is no locking: two processes calibrating at the same
//! time may lose one update.

pub mod provider;

pub use provider::{FixedScale, InteractivePrompt, ScaleProvider, SearchProvider};

use crate::error::{CoreError, CoreResult};

use log::{debug, info, warn};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Frame dimensions, used only as a calibration lookup key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Canonical calibration key, e.g. `1280x720`.
    pub fn key(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Resolution {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoreError::Config(format!("invalid resolution '{s}', expected WIDTHxHEIGHT"));
        let (w, h) = s.trim().split_once(['x', 'X']).ok_or_else(invalid)?;
        let width: u32 = w.trim().parse().map_err(|_| invalid())?;
        let height: u32 = h.trim().parse().map_err(|_| invalid())?;
        if width == 0 || height == 0 {
            return Err(invalid());
        }
        Ok(Self { width, height })
    }
}

/// Returns true for values that may be stored as a scale factor.
pub fn is_valid_scale(scale: f64) -> bool {
    scale.is_finite() && scale > 0.0
}

/// File-backed resolution -> scale factor mapping.
#[derive(Debug, Clone)]
pub struct CalibrationStore {
    path: PathBuf,
    entries: BTreeMap<String, f64>,
}

impl CalibrationStore {
    /// Opens the store at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> CoreResult<Self> {
        let path = path.into();
        let entries = read_entries(&path)?;
        debug!(
            "Loaded {} calibration entries from {}",
            entries.len(),
            path.display()
        );
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored scale for `resolution`, or `None`. Never invents a default.
    pub fn get(&self, resolution: Resolution) -> Option<f64> {
        self.entries.get(&resolution.key()).copied()
    }

    /// All entries ordered by key.
    pub fn entries(&self) -> &BTreeMap<String, f64> {
        &self.entries
    }

    /// Upserts the scale for `resolution` and rewrites the whole file.
    pub fn put(&mut self, resolution: Resolution, scale: f64) -> CoreResult<()> {
        if !is_valid_scale(scale) {
            return Err(CoreError::InvalidScale(scale));
        }

        // Pick up edits made by other processes since open.
        let mut entries = read_entries(&self.path)?;
        entries.insert(resolution.key(), scale);
        write_entries(&self.path, &entries)?;
        self.entries = entries;

        info!("Saved scale factor {scale:.5} for {resolution}");
        Ok(())
    }

    /// Returns the stored scale or asks `provider` for one.
    ///
    /// A provided value is validated and stored before being returned. When
    /// nothing usable is obtained the result is
    /// [`CoreError::CalibrationUnavailable`] and the file is left untouched;
    /// callers treat that as "calibration skipped".
    pub fn resolve_or_prompt(
        &mut self,
        resolution: Resolution,
        provider: &mut dyn ScaleProvider,
    ) -> CoreResult<f64> {
        if let Some(scale) = self.get(resolution) {
            info!("Found scale factor {scale} for {resolution}");
            return Ok(scale);
        }

        warn!("No scale factor stored for {resolution}; requesting one");
        match provider.provide(resolution)? {
            Some(scale) if is_valid_scale(scale) => {
                self.put(resolution, scale)?;
                Ok(scale)
            }
            Some(scale) => {
                warn!("Rejected scale factor {scale} for {resolution}");
                Err(CoreError::CalibrationUnavailable(resolution.key()))
            }
            None => Err(CoreError::CalibrationUnavailable(resolution.key())),
        }
    }
}

fn read_entries(path: &Path) -> CoreResult<BTreeMap<String, f64>> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
        Err(e) => {
            return Err(CoreError::CalibrationFile(format!(
                "failed to read {}: {e}",
                path.display()
            )));
        }
    };

    if contents.trim().is_empty() {
        return Ok(BTreeMap::new());
    }

    let raw: BTreeMap<String, f64> = serde_json::from_str(&contents).map_err(|e| {
        CoreError::CalibrationFile(format!("failed to parse {}: {e}", path.display()))
    })?;

    // Hand edits may introduce bad values; they are never served.
    Ok(raw
        .into_iter()
        .filter(|(key, scale)| {
            let keep = is_valid_scale(*scale);
            if !keep {
                warn!("Ignoring invalid scale factor {scale} for '{key}' in {}", path.display());
            }
            keep
        })
        .collect())
}

fn write_entries(path: &Path, entries: &BTreeMap<String, f64>) -> CoreResult<()> {
    let mut buf = Vec::new();
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    entries.serialize(&mut serializer)?;
    buf.push(b'\n');

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent)?;

    let mut tmp = tempfile::NamedTempFile::new_in(&parent)?;
    tmp.write_all(&buf)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| {
        CoreError::CalibrationFile(format!("failed to replace {}: {}", path.display(), e.error))
    })?;
    Ok(())
}
