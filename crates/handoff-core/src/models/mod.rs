pub mod handoff;
pub mod session;

pub use handoff::{
    CompletionStatus, CreateSessionRequest, IssuedSessionResponse, ResolvedSessionResponse,
};
pub use session::{SessionKind, SessionState, UploadSession};
