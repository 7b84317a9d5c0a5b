use crate::domain::location::ClassHandle;
use crate::domain::trace::TraceData;
use anyhow::Result;

/// Recorded trace source port (implemented by Infrastructure)
pub trait TraceSource {
    fn load(&self) -> Result<TraceData>;
}

/// Class lookup port used to resolve static-field locations
pub trait ClassResolver: Send + Sync {
    fn resolve_class(&self, class_name: &str) -> Option<ClassHandle>;
}
