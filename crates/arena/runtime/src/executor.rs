//! Pluggable sheet execution.

use async_trait::async_trait;

use arena_ssn::{ActuationSheet, AdapterSheet, SheetRunner};

/// Runs an adapter sheet to completion.
#[async_trait]
pub trait SheetExecutor: Send + Sync {
    /// Execute every statement. Never fails; faults are recorded in the
    /// returned sheet.
    async fn execute(&self, sheet: &AdapterSheet) -> ActuationSheet;

    /// Name used in logs.
    fn name(&self) -> &str {
        "executor"
    }
}

#[async_trait]
impl SheetExecutor for SheetRunner {
    async fn execute(&self, sheet: &AdapterSheet) -> ActuationSheet {
        self.run(sheet).await
    }

    fn name(&self) -> &str {
        "sheet-runner"
    }
}
