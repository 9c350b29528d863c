use async_trait::async_trait;

use crate::errors::PipelineError;
use crate::protocol::{CoordinatorStatus, StageInput, StageOutput};

/// Whatever accepts whole stages on behalf of the driver.
#[async_trait]
pub trait StageDispatcher: Send + Sync {
    /// Resolves once the stage's completion condition holds or it fails.
    async fn dispatch(&self, input: StageInput) -> Result<StageOutput, PipelineError>;

    async fn status(&self) -> Result<CoordinatorStatus, PipelineError>;
}
