//! Best score persistence
//!
//! On the web the best score lives in LocalStorage as a plain integer string.
//! Native builds keep it in a small JSON file.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BestScoreError {
    #[error("failed to access best score file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse best score file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("stored best score {0:?} is not a number")]
    Invalid(String),
    #[error("storage unavailable: {0}")]
    Storage(String),
}

/// Best score across sessions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BestScore {
    pub best: u64,
}

impl BestScore {
    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "skiGameBestScore";

    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finished run. Returns true if it set a new best.
    pub fn record(&mut self, score: u64) -> bool {
        if score > self.best {
            self.best = score;
            true
        } else {
            false
        }
    }

    /// Parse a stored value. Fractional values are floored, negatives read as 0.
    pub fn from_stored(raw: &str) -> Result<Self, BestScoreError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(Self::new());
        }
        if let Ok(best) = raw.parse::<u64>() {
            return Ok(Self { best });
        }
        match raw.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(Self {
                best: v.max(0.0).floor() as u64,
            }),
            _ => Err(BestScoreError::Invalid(raw.to_string())),
        }
    }

    /// Value as written to storage
    pub fn to_stored(&self) -> String {
        self.best.to_string()
    }

    /// Load the best score from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(raw)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_stored(&raw) {
                    Ok(best) => {
                        log::info!("Loaded best score {}m", best.best);
                        return best;
                    }
                    Err(e) => log::warn!("Ignoring stored best score: {}", e),
                }
            }
        }

        log::info!("No best score found, starting fresh");
        Self::new()
    }

    /// Save the best score to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) -> Result<(), BestScoreError> {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .ok_or_else(|| BestScoreError::Storage("no LocalStorage".to_string()))?;

        storage
            .set_item(Self::STORAGE_KEY, &self.to_stored())
            .map_err(|e| BestScoreError::Storage(format!("{:?}", e)))?;
        log::info!("Best score saved ({}m)", self.best);
        Ok(())
    }

    /// Load from a JSON file. A missing file is a fresh start.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from(path: impl AsRef<std::path::Path>) -> Result<Self, BestScoreError> {
        let path = path.as_ref();
        let json = match std::fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No best score at {}, starting fresh", path.display());
                return Ok(Self::new());
            }
            Err(e) => return Err(e.into()),
        };
        let best: Self = serde_json::from_str(&json)?;
        log::info!("Loaded best score {}m from {}", best.best, path.display());
        Ok(best)
    }

    /// Save to a JSON file
    #[cfg(not(target_arch = "wasm32"))]
    pub fn save_to(&self, path: impl AsRef<std::path::Path>) -> Result<(), BestScoreError> {
        let path = path.as_ref();
        std::fs::write(path, serde_json::to_string(self)?)?;
        log::info!("Best score saved to {} ({}m)", path.display(), self.best);
        Ok(())
    }
}
