//! Generation Query Handlers

use std::sync::Arc;

use crate::application::ports::{RunManagerPort, RunSnapshot};
use crate::application::queries::GetGenerationStatus;

/// GetGenerationStatus Handler
pub struct GetGenerationStatusHandler {
    run_manager: Arc<dyn RunManagerPort>,
}

impl GetGenerationStatusHandler {
    pub fn new(run_manager: Arc<dyn RunManagerPort>) -> Self {
        Self { run_manager }
    }

    /// None 表示没有运行中的任务
    pub fn handle(&self, query: GetGenerationStatus) -> Option<RunSnapshot> {
        self.run_manager.get(query.novel_id)
    }
}
