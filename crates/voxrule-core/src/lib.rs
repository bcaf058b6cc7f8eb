pub mod config;
pub mod error;
pub mod rule;
pub mod types;

pub use config::VoxruleConfig;
pub use error::{Result, VoxruleError};
pub use rule::{
    ApiCallResponse, ApiResponseType, AudioResponse, BuiltInCommandResponse, HttpMethod,
    LocalCodeResponse, OpenAiSettings, RemoteCodeResponse, Response, ResponseKind, Rule,
    RuleDraft, SandboxCodeResponse, Settings, SshAuthMethod, SshTarget,
    TerminalCommandResponse, TextResponse, Trigger, TriggerType,
};
pub use types::Timestamp;
