use crate::domain::ports::TraceSource;
use crate::domain::trace::TraceData;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// JSON trace file source implementation
pub struct JsonTraceSource {
    pub path: PathBuf,
}

impl JsonTraceSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl TraceSource for JsonTraceSource {
    fn load(&self) -> Result<TraceData> {
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read trace file: {}", self.path.display()))?;
        let trace: TraceData = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse trace JSON: {}", self.path.display()))?;
        tracing::debug!(
            path = %self.path.display(),
            events = trace.events.len(),
            objects = trace.objects.len(),
            "trace loaded"
        );
        Ok(trace)
    }
}
