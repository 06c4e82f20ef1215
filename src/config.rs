// ==========================================
// Framecraft catalog - import configuration
// ==========================================
// Tuning knobs for the import pipeline. Batch size is a performance
// parameter, not a correctness one; a batch is also the atomic unit of
// cancellation.
// ==========================================

use serde::{Deserialize, Serialize};

/// Default rows per storage batch.
pub const DEFAULT_BATCH_SIZE: usize = 200;

/// Default number of row outcomes kept in a report preview.
pub const DEFAULT_PREVIEW_LIMIT: usize = 25;

/// Default upload size ceiling (bytes). Catalogs run to a few MB; 20 MiB
/// leaves generous headroom while bounding memory for the parse.
pub const DEFAULT_MAX_FILE_BYTES: usize = 20 * 1024 * 1024;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Rows committed per storage batch.
    pub batch_size: usize,
    /// Row outcomes retained in ValidationReport::preview.
    pub preview_limit: usize,
    /// Reject uploads larger than this before parsing.
    pub max_file_bytes: usize,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            preview_limit: DEFAULT_PREVIEW_LIMIT,
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
        }
    }
}

impl ImportConfig {
    /// Clamp pathological values (a zero batch size would never progress).
    pub fn sanitized(mut self) -> Self {
        if self.batch_size == 0 {
            self.batch_size = DEFAULT_BATCH_SIZE;
        }
        self
    }
}
