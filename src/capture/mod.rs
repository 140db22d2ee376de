pub mod builder;
pub mod session;

pub use builder::{build, IncidentDraft, DEFAULT_INTENSITY};
pub use session::CaptureSession;
