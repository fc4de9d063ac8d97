use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::app_dirs::AppDirs;
use crate::error::HistoryError;
use crate::scoring::mean;
use crate::session::SessionResult;

/// Number of results kept on disk.
pub const MAX_HISTORY: usize = 5;

/// WPM difference against the prior average that counts as a real change.
pub const TREND_THRESHOLD: f64 = 5.0;

/// Consumer of finished sessions. `()` discards results.
pub trait ResultSink {
    fn on_result(&mut self, result: &SessionResult);

    /// Recently stored results, oldest first.
    fn recent(&self) -> Vec<SessionResult> {
        Vec::new()
    }
}

impl ResultSink for () {
    fn on_result(&mut self, _result: &SessionResult) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Trend {
    #[strum(serialize = "Improving")]
    Improving,
    #[strum(serialize = "Stable")]
    Stable,
    #[strum(serialize = "Declining")]
    Declining,
    #[strum(serialize = "insufficient data")]
    InsufficientData,
}

/// Compare the latest WPM against the mean of the entries before it.
pub fn trend(results: &[SessionResult]) -> Trend {
    let Some((latest, prior)) = results.split_last() else {
        return Trend::InsufficientData;
    };
    let prior_wpm: Vec<f64> = prior.iter().map(|r| r.wpm as f64).collect();
    let Some(prior_avg) = mean(&prior_wpm) else {
        return Trend::InsufficientData;
    };

    let diff = latest.wpm as f64 - prior_avg;
    if diff > TREND_THRESHOLD {
        Trend::Improving
    } else if diff < -TREND_THRESHOLD {
        Trend::Declining
    } else {
        Trend::Stable
    }
}

/// Recent results stored as a JSON array, oldest first.
#[derive(Debug, Clone)]
pub struct FileHistoryStore {
    path: PathBuf,
    capacity: usize,
}

impl FileHistoryStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self::with_path(AppDirs::history_path())
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
            capacity: MAX_HISTORY,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored results, or an empty list if the file is missing or unreadable.
    pub fn load(&self) -> Vec<SessionResult> {
        match self.try_load() {
            Ok(results) => results,
            Err(err) => {
                warn!("ignoring history at {}: {err}", self.path.display());
                Vec::new()
            }
        }
    }

    pub fn try_load(&self) -> Result<Vec<SessionResult>, HistoryError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let bytes = fs::read(&self.path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Append `result`, keeping only the newest entries.
    pub fn append(&self, result: &SessionResult) -> Result<Vec<SessionResult>, HistoryError> {
        let mut results = self.load();
        results.push(result.clone());
        if results.len() > self.capacity {
            results.drain(..results.len() - self.capacity);
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_vec_pretty(&results)?)?;
        Ok(results)
    }

    pub fn trend(&self) -> Trend {
        trend(&self.load())
    }
}

impl ResultSink for FileHistoryStore {
    fn on_result(&mut self, result: &SessionResult) {
        match self.append(result) {
            Ok(results) => info!(entries = results.len(), trend = %trend(&results), "result saved"),
            Err(err) => warn!("unable to save result: {err}"),
        }
    }

    fn recent(&self) -> Vec<SessionResult> {
        self.load()
    }
}

/// Shows the stored history without adding to it. Custom texts go through
/// this so their scores stay out of the catalog trend.
#[derive(Debug, Clone)]
pub struct ReadOnlyHistory(pub FileHistoryStore);

impl ResultSink for ReadOnlyHistory {
    fn on_result(&mut self, result: &SessionResult) {
        info!(wpm = result.wpm, "custom text result not recorded");
    }

    fn recent(&self) -> Vec<SessionResult> {
        self.0.load()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Category, Size};
    use crate::session::FinishReason;
    use chrono::Local;
    use tempfile::tempdir;

    fn result(wpm: u32) -> SessionResult {
        SessionResult {
            wpm,
            accuracy: 97.5,
            elapsed_secs: 30,
            category: Category::Plain,
            size: Size::Medium,
            timestamp: Local::now(),
            reason: FinishReason::Completed,
        }
    }

    fn results(wpms: &[u32]) -> Vec<SessionResult> {
        wpms.iter().copied().map(result).collect()
    }

    #[test]
    fn test_trend_insufficient_data() {
        assert_eq!(trend(&[]), Trend::InsufficientData);
        assert_eq!(trend(&results(&[50])), Trend::InsufficientData);
    }

    #[test]
    fn test_trend_thresholds() {
        assert_eq!(trend(&results(&[40, 40, 46])), Trend::Improving);
        assert_eq!(trend(&results(&[40, 40, 45])), Trend::Stable);
        assert_eq!(trend(&results(&[40, 40, 35])), Trend::Stable);
        assert_eq!(trend(&results(&[40, 40, 34])), Trend::Declining);
        assert_eq!(trend(&results(&[30, 50, 44])), Trend::Stable);
    }

    #[test]
    fn test_trend_display() {
        assert_eq!(Trend::InsufficientData.to_string(), "insufficient data");
        assert_eq!(Trend::Improving.to_string(), "Improving");
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let store = FileHistoryStore::with_path(dir.path().join("history.json"));
        assert!(store.load().is_empty());
        assert_eq!(store.trend(), Trend::InsufficientData);
    }

    #[test]
    fn test_append_caps_history() {
        let dir = tempdir().unwrap();
        let store = FileHistoryStore::with_path(dir.path().join("state").join("history.json"));

        for wpm in 1..=7 {
            store.append(&result(wpm * 10)).unwrap();
        }

        let loaded = store.load();
        assert_eq!(loaded.len(), MAX_HISTORY);
        let wpms: Vec<u32> = loaded.iter().map(|r| r.wpm).collect();
        assert_eq!(wpms, vec![30, 40, 50, 60, 70]);
        assert_eq!(store.trend(), Trend::Improving);
    }

    #[test]
    fn test_corrupt_file_is_replaced() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history.json");
        fs::write(&path, "{ not json").unwrap();
        let mut store = FileHistoryStore::with_path(&path);

        assert!(store.try_load().is_err());
        assert!(store.load().is_empty());

        store.on_result(&result(55));
        assert_eq!(store.load().len(), 1);
    }

    #[test]
    fn test_sink_failure_does_not_panic() {
        let dir = tempdir().unwrap();
        // a directory where the file should be makes the write fail
        let path = dir.path().join("history.json");
        fs::create_dir_all(&path).unwrap();
        let mut store = FileHistoryStore::with_path(&path);
        store.on_result(&result(10));
    }

    #[test]
    fn test_read_only_history_does_not_write() {
        let dir = tempdir().unwrap();
        let store = FileHistoryStore::with_path(dir.path().join("history.json"));
        store.append(&result(40)).unwrap();

        let mut sink = ReadOnlyHistory(store.clone());
        sink.on_result(&result(90));

        assert_eq!(sink.recent().len(), 1);
        let wpms: Vec<u32> = store.load().iter().map(|r| r.wpm).collect();
        assert_eq!(wpms, vec![40]);
    }

    #[test]
    fn test_unit_sink_is_noop() {
        ResultSink::on_result(&mut (), &result(10));
        assert!(().recent().is_empty());
    }
}
