//! Executors, one per response kind.
//!
//! Each executor validates its required fields before touching the device,
//! the network or a process, and reports failures as [`crate::ActionError`].

pub mod api_call;
pub mod remote_code;
pub mod reply;
pub mod script;
pub mod ssh;
pub mod terminal;

pub use api_call::ApiCallHandler;
pub use remote_code::{RemoteCodeHandler, RemoteLanguage};
pub use reply::ReplyHandler;
pub use script::{ScriptHandler, ScriptLimits, ScriptTier};
pub use terminal::TerminalHandler;
