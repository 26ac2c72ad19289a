//! In-memory [`RemoteSheet`] for exercising the publisher without a network

use async_trait::async_trait;

use super::sheet::RemoteSheet;
use crate::error::{SyncError, SyncResult};

#[derive(Debug, Clone, Default)]
pub struct MemorySheet {
    pub rows: Vec<Vec<String>>,
    /// Operation name that should fail ("read", "clear", "append_row", "append_rows")
    pub fail_on: Option<&'static str>,
    /// Operations performed, in order
    pub calls: Vec<&'static str>,
}

impl MemorySheet {
    pub fn with_rows(rows: Vec<Vec<String>>) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }

    pub fn failing_on(mut self, operation: &'static str) -> Self {
        self.fail_on = Some(operation);
        self
    }

    fn check(&self, operation: &'static str) -> SyncResult<()> {
        if self.fail_on == Some(operation) {
            return Err(SyncError::remote(operation, "simulated failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteSheet for MemorySheet {
    fn title(&self) -> &str {
        "Sheet1"
    }

    async fn get_all_values(&self) -> SyncResult<Vec<Vec<String>>> {
        self.check("read")?;
        Ok(self.rows.clone())
    }

    async fn clear(&mut self) -> SyncResult<()> {
        self.calls.push("clear");
        self.check("clear")?;
        self.rows.clear();
        Ok(())
    }

    async fn append_row(&mut self, row: &[String]) -> SyncResult<()> {
        self.calls.push("append_row");
        self.check("append_row")?;
        self.rows.push(row.to_vec());
        Ok(())
    }

    async fn append_rows(&mut self, rows: &[Vec<String>]) -> SyncResult<()> {
        self.calls.push("append_rows");
        self.check("append_rows")?;
        self.rows.extend(rows.iter().cloned());
        Ok(())
    }
}
