/// Trait for reporting batch import progress.
///
/// The CLI implements it with indicatif; library callers that do not care
/// use [`SilentReporter`]. All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    fn on_import_start(&self, _total: usize) {}
    fn on_asset_imported(&self, _done: usize, _total: usize, _name: &str) {}
    fn on_asset_failed(&self, _done: usize, _total: usize, _source: &str, _error: &str) {}
    fn on_import_complete(&self, _imported: usize, _failed: usize, _duration_secs: f64) {}
    fn on_index_start(&self) {}
    fn on_index_complete(&self, _entries: usize, _duration_secs: f64) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
