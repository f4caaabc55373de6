use tracing::{info, instrument};

use crate::config::Transform;
use crate::error::Result;
use crate::store::StagingStore;

/// Executes the transform statements against the staging store in declared
/// order. The first failing statement aborts the remaining sequence; the
/// store keeps whatever state the completed statements left behind.
#[instrument(level = "info", skip_all, fields(count = transforms.len()))]
pub fn run_transforms(transforms: &[Transform], store: &StagingStore) -> Result<()> {
    for (index, transform) in transforms.iter().enumerate() {
        info!(index, statement = %transform.statement, "running transform");
        store.execute(&transform.statement)?;
    }
    Ok(())
}
