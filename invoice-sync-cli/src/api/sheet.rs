//! Remote sheet abstraction

use async_trait::async_trait;

use crate::error::SyncResult;

/// A single worksheet held by a remote service
///
/// Values are exchanged as rows of strings. Implementations map every
/// failure to [`crate::error::SyncError::RemoteOperation`].
#[async_trait]
pub trait RemoteSheet: Send + Sync {
    /// Worksheet title, for messages
    fn title(&self) -> &str;

    /// Every row currently on the sheet, header included
    async fn get_all_values(&self) -> SyncResult<Vec<Vec<String>>>;

    /// Remove all values from the sheet
    async fn clear(&mut self) -> SyncResult<()>;

    /// Append one row after the last non-empty row
    async fn append_row(&mut self, row: &[String]) -> SyncResult<()>;

    /// Append rows in order, in a single call
    async fn append_rows(&mut self, rows: &[Vec<String>]) -> SyncResult<()>;
}
