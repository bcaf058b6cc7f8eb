//! Persisted rule and settings records.
//!
//! The JSON shape (camelCase keys, `type` selectors) is the on-disk format of
//! the rules and settings files, so field names here are part of the
//! persistence contract.

use std::collections::BTreeMap;
use std::fmt;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::types::Timestamp;

// =============================================================================
// Trigger
// =============================================================================

/// How a trigger keyword is compared against an utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TriggerType {
    Exact,
    StartsWith,
    #[serde(alias = "includes")]
    Contains,
    EndsWith,
}

impl fmt::Display for TriggerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerType::Exact => write!(f, "exact"),
            TriggerType::StartsWith => write!(f, "startsWith"),
            TriggerType::Contains => write!(f, "contains"),
            TriggerType::EndsWith => write!(f, "endsWith"),
        }
    }
}

impl std::str::FromStr for TriggerType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "exact" => Ok(TriggerType::Exact),
            "startsWith" => Ok(TriggerType::StartsWith),
            "contains" | "includes" => Ok(TriggerType::Contains),
            "endsWith" => Ok(TriggerType::EndsWith),
            _ => Err(format!("Unknown trigger type: {}", s)),
        }
    }
}

/// The predicate deciding whether a rule applies to an utterance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Trigger {
    #[serde(rename = "type")]
    pub trigger_type: TriggerType,
    pub keyword: String,
}

impl Trigger {
    pub fn new(trigger_type: TriggerType, keyword: impl Into<String>) -> Self {
        Self {
            trigger_type,
            keyword: keyword.into(),
        }
    }
}

// =============================================================================
// Response variants
// =============================================================================

/// Selector for the executor that handles a matched rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseKind {
    Text,
    Audio,
    BuiltInCommand,
    LocalCode,
    SandboxCode,
    ApiCall,
    PythonRemote,
    NodeRemote,
    TerminalCommand,
    Unsupported,
}

impl fmt::Display for ResponseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResponseKind::Text => "text",
            ResponseKind::Audio => "audio",
            ResponseKind::BuiltInCommand => "builtInCommand",
            ResponseKind::LocalCode => "localCode",
            ResponseKind::SandboxCode => "sandboxCode",
            ResponseKind::ApiCall => "apiCall",
            ResponseKind::PythonRemote => "pythonRemote",
            ResponseKind::NodeRemote => "nodeRemote",
            ResponseKind::TerminalCommand => "terminalCommand",
            ResponseKind::Unsupported => "unsupported",
        };
        f.write_str(name)
    }
}

/// The action a rule performs, one case per response kind.
///
/// Records whose `type` is not one of the known kinds load as
/// [`Response::Unsupported`] holding the raw JSON object, and serialize back
/// unchanged, so a foreign record survives a rewrite of the rules file.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    Text(TextResponse),
    Audio(AudioResponse),
    BuiltInCommand(BuiltInCommandResponse),
    LocalCode(LocalCodeResponse),
    SandboxCode(SandboxCodeResponse),
    ApiCall(ApiCallResponse),
    PythonRemote(RemoteCodeResponse),
    NodeRemote(RemoteCodeResponse),
    TerminalCommand(TerminalCommandResponse),
    Unsupported(serde_json::Value),
}

impl Response {
    pub fn kind(&self) -> ResponseKind {
        match self {
            Response::Text(_) => ResponseKind::Text,
            Response::Audio(_) => ResponseKind::Audio,
            Response::BuiltInCommand(_) => ResponseKind::BuiltInCommand,
            Response::LocalCode(_) => ResponseKind::LocalCode,
            Response::SandboxCode(_) => ResponseKind::SandboxCode,
            Response::ApiCall(_) => ResponseKind::ApiCall,
            Response::PythonRemote(_) => ResponseKind::PythonRemote,
            Response::NodeRemote(_) => ResponseKind::NodeRemote,
            Response::TerminalCommand(_) => ResponseKind::TerminalCommand,
            Response::Unsupported(_) => ResponseKind::Unsupported,
        }
    }

    /// The `type` tag as written in the record.
    pub fn type_name(&self) -> String {
        match self {
            Response::Unsupported(raw) => raw
                .get("type")
                .and_then(serde_json::Value::as_str)
                .unwrap_or("unsupported")
                .to_string(),
            other => other.kind().to_string(),
        }
    }
}

const KNOWN_RESPONSE_TYPES: &[&str] = &[
    "text",
    "audio",
    "builtInCommand",
    "localCode",
    "sandboxCode",
    "apiCall",
    "pythonRemote",
    "nodeRemote",
    "terminalCommand",
];

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum TaggedRef<'a> {
    Text(&'a TextResponse),
    Audio(&'a AudioResponse),
    BuiltInCommand(&'a BuiltInCommandResponse),
    LocalCode(&'a LocalCodeResponse),
    SandboxCode(&'a SandboxCodeResponse),
    ApiCall(&'a ApiCallResponse),
    PythonRemote(&'a RemoteCodeResponse),
    NodeRemote(&'a RemoteCodeResponse),
    TerminalCommand(&'a TerminalCommandResponse),
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum Tagged {
    Text(TextResponse),
    Audio(AudioResponse),
    BuiltInCommand(BuiltInCommandResponse),
    LocalCode(LocalCodeResponse),
    SandboxCode(SandboxCodeResponse),
    ApiCall(ApiCallResponse),
    PythonRemote(RemoteCodeResponse),
    NodeRemote(RemoteCodeResponse),
    TerminalCommand(TerminalCommandResponse),
}

impl From<Tagged> for Response {
    fn from(tagged: Tagged) -> Self {
        match tagged {
            Tagged::Text(r) => Response::Text(r),
            Tagged::Audio(r) => Response::Audio(r),
            Tagged::BuiltInCommand(r) => Response::BuiltInCommand(r),
            Tagged::LocalCode(r) => Response::LocalCode(r),
            Tagged::SandboxCode(r) => Response::SandboxCode(r),
            Tagged::ApiCall(r) => Response::ApiCall(r),
            Tagged::PythonRemote(r) => Response::PythonRemote(r),
            Tagged::NodeRemote(r) => Response::NodeRemote(r),
            Tagged::TerminalCommand(r) => Response::TerminalCommand(r),
        }
    }
}

impl Serialize for Response {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let tagged = match self {
            Response::Text(r) => TaggedRef::Text(r),
            Response::Audio(r) => TaggedRef::Audio(r),
            Response::BuiltInCommand(r) => TaggedRef::BuiltInCommand(r),
            Response::LocalCode(r) => TaggedRef::LocalCode(r),
            Response::SandboxCode(r) => TaggedRef::SandboxCode(r),
            Response::ApiCall(r) => TaggedRef::ApiCall(r),
            Response::PythonRemote(r) => TaggedRef::PythonRemote(r),
            Response::NodeRemote(r) => TaggedRef::NodeRemote(r),
            Response::TerminalCommand(r) => TaggedRef::TerminalCommand(r),
            Response::Unsupported(raw) => return raw.serialize(serializer),
        };
        tagged.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Response {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        let known = match raw.get("type") {
            Some(serde_json::Value::String(tag)) => KNOWN_RESPONSE_TYPES.contains(&tag.as_str()),
            Some(_) => return Err(de::Error::custom("response `type` must be a string")),
            None => return Err(de::Error::missing_field("type")),
        };
        if known {
            Tagged::deserialize(raw)
                .map(Response::from)
                .map_err(de::Error::custom)
        } else {
            Ok(Response::Unsupported(raw))
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_ssh_port() -> u16 {
    22
}

/// Spoken reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextResponse {
    #[serde(default)]
    pub text: String,
    /// Interrupt the device's own reply and speak through the device.
    #[serde(rename = "abortXiaoAI", default)]
    pub abort_current: bool,
    #[serde(default = "default_true")]
    pub play_blocking: bool,
}

/// Audio playback; the current turn is always interrupted first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
}

/// Opaque command forwarded over the device's silent command channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuiltInCommandResponse {
    #[serde(default)]
    pub built_in_command: String,
    #[serde(rename = "abortXiaoAI", default)]
    pub abort_current: bool,
}

/// Trusted script with access to the device capability handle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalCodeResponse {
    #[serde(default)]
    pub local_code: String,
}

/// Untrusted script without device access.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SandboxCodeResponse {
    #[serde(default)]
    pub sandbox_code: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl HttpMethod {
    /// Only POST and PUT requests carry the configured body.
    pub fn sends_body(&self) -> bool {
        matches!(self, HttpMethod::Post | HttpMethod::Put)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpMethod::Get => write!(f, "GET"),
            HttpMethod::Post => write!(f, "POST"),
            HttpMethod::Put => write!(f, "PUT"),
            HttpMethod::Delete => write!(f, "DELETE"),
            HttpMethod::Patch => write!(f, "PATCH"),
        }
    }
}

/// How an API response body is interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiResponseType {
    #[default]
    Auto,
    Json,
    Text,
}

/// Outbound HTTP call whose response becomes the reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCallResponse {
    #[serde(default)]
    pub api_url: String,
    #[serde(default)]
    pub api_method: HttpMethod,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub api_headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_body: Option<String>,
    #[serde(default)]
    pub api_response_type: ApiResponseType,
    /// Dot-separated key path into the decoded JSON body, e.g. `data.message`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_response_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_response_fallback: Option<String>,
}

/// Code delegated to a remote execution service.
///
/// Used by both `pythonRemote` and `nodeRemote`; the rule's `type` picks the
/// language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteCodeResponse {
    #[serde(default)]
    pub remote_url: String,
    #[serde(default)]
    pub remote_code: String,
    /// Seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_timeout: Option<u64>,
}

/// Shell command run locally or over SSH.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminalCommandResponse {
    #[serde(default)]
    pub terminal_command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terminal_working_dir: Option<String>,
    /// Seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terminal_timeout: Option<u64>,
    #[serde(default = "default_true")]
    pub terminal_return_output: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh: Option<SshTarget>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SshAuthMethod {
    #[default]
    Key,
    Password,
}

/// Remote host for terminal commands.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SshTarget {
    pub host: String,
    #[serde(default = "default_ssh_port")]
    pub port: u16,
    pub username: String,
    #[serde(default)]
    pub auth_method: SshAuthMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passphrase: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

// Secrets stay out of `{:?}` output, which ends up in logs.
impl fmt::Debug for SshTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SshTarget")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("auth_method", &self.auth_method)
            .field("private_key_path", &self.private_key_path)
            .field("passphrase", &self.passphrase.as_ref().map(|_| "***"))
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

// =============================================================================
// Rule
// =============================================================================

/// A persisted rule record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub id: Uuid,
    pub trigger: Trigger,
    pub response: Response,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

/// Client-supplied rule fields; `id` and timestamps are assigned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleDraft {
    pub trigger: Trigger,
    pub response: Response,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl RuleDraft {
    pub fn new(trigger: Trigger, response: Response) -> Self {
        Self {
            trigger,
            response,
            enabled: true,
            description: None,
        }
    }

    /// Materialize a new rule with a fresh id and creation time.
    pub fn into_rule(self) -> Rule {
        Rule {
            id: Uuid::new_v4(),
            trigger: self.trigger,
            response: self.response,
            enabled: self.enabled,
            description: self.description,
            created_at: Timestamp::now(),
            updated_at: None,
        }
    }
}

// =============================================================================
// Settings
// =============================================================================

/// Language-model credentials for the conversation pipeline.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenAiSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl fmt::Debug for OpenAiSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiSettings")
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

/// Operator settings consumed by the conversation pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Only utterances starting with one of these reach the language model.
    #[serde(rename = "callAIKeywords")]
    pub call_ai_keywords: Vec<String>,
    pub system_prompt: String,
    pub history_max_length: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openai: Option<OpenAiSettings>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            call_ai_keywords: vec!["请".to_string(), "你".to_string()],
            system_prompt: "你是一个智能助手，请根据用户的问题给出回答。".to_string(),
            history_max_length: 10,
            openai: None,
        }
    }
}

impl Settings {
    /// Whether an unmatched utterance should go to the language model.
    pub fn should_call_ai(&self, text: &str) -> bool {
        self.call_ai_keywords.is_empty()
            || self
                .call_ai_keywords
                .iter()
                .any(|k| text.starts_with(k.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_type_display_roundtrip() {
        for t in [
            TriggerType::Exact,
            TriggerType::StartsWith,
            TriggerType::Contains,
            TriggerType::EndsWith,
        ] {
            let parsed: TriggerType = t.to_string().parse().unwrap();
            assert_eq!(parsed, t);
        }
        assert!("regex".parse::<TriggerType>().is_err());
    }

    #[test]
    fn test_rule_json_uses_persisted_field_names() {
        let json = r#"{
            "id": "550e8400-e29b-41d4-a716-446655440000",
            "trigger": {"type": "startsWith", "keyword": "open light"},
            "response": {"type": "text", "text": "OK", "abortXiaoAI": true, "playBlocking": false},
            "enabled": true,
            "createdAt": 1700000000000
        }"#;
        let rule: Rule = serde_json::from_str(json).unwrap();
        assert_eq!(rule.trigger.trigger_type, TriggerType::StartsWith);
        assert_eq!(rule.created_at, Timestamp(1_700_000_000_000));
        match &rule.response {
            Response::Text(t) => {
                assert_eq!(t.text, "OK");
                assert!(t.abort_current);
                assert!(!t.play_blocking);
            }
            other => panic!("unexpected response: {:?}", other),
        }

        let value = serde_json::to_value(&rule).unwrap();
        assert_eq!(value["response"]["type"], "text");
        assert_eq!(value["response"]["abortXiaoAI"], true);
        assert_eq!(value["trigger"]["type"], "startsWith");
        assert!(value.get("updatedAt").is_none());
    }

    #[test]
    fn test_response_defaults_applied() {
        let text: Response = serde_json::from_str(r#"{"type":"text","text":"hi"}"#).unwrap();
        match text {
            Response::Text(t) => {
                assert!(!t.abort_current);
                assert!(t.play_blocking);
            }
            other => panic!("unexpected response: {:?}", other),
        }

        let api: Response =
            serde_json::from_str(r#"{"type":"apiCall","apiUrl":"http://x"}"#).unwrap();
        match api {
            Response::ApiCall(a) => {
                assert_eq!(a.api_method, HttpMethod::Get);
                assert_eq!(a.api_response_type, ApiResponseType::Auto);
                assert!(a.api_headers.is_empty());
            }
            other => panic!("unexpected response: {:?}", other),
        }

        let term: Response = serde_json::from_str(
            r#"{"type":"terminalCommand","terminalCommand":"ls",
                "ssh":{"host":"h","username":"u","authMethod":"password","password":"pw"}}"#,
        )
        .unwrap();
        match term {
            Response::TerminalCommand(t) => {
                assert!(t.terminal_return_output);
                let ssh = t.ssh.unwrap();
                assert_eq!(ssh.port, 22);
                assert_eq!(ssh.auth_method, SshAuthMethod::Password);
            }
            other => panic!("unexpected response: {:?}", other),
        }
    }

    #[test]
    fn test_remote_variants_share_payload() {
        let py: Response = serde_json::from_str(
            r#"{"type":"pythonRemote","remoteUrl":"http://r/execute","remoteCode":"print(1)"}"#,
        )
        .unwrap();
        assert_eq!(py.kind(), ResponseKind::PythonRemote);
        let node: Response = serde_json::from_str(
            r#"{"type":"nodeRemote","remoteUrl":"http://r/execute","remoteCode":"1"}"#,
        )
        .unwrap();
        assert_eq!(node.kind(), ResponseKind::NodeRemote);
    }

    #[test]
    fn test_unknown_response_type_loads_as_unsupported() {
        let r: Response = serde_json::from_str(r#"{"type":"hologram","beam":"on"}"#).unwrap();
        assert!(matches!(r, Response::Unsupported(_)));
        assert_eq!(r.kind().to_string(), "unsupported");
        assert_eq!(r.type_name(), "hologram");
    }

    #[test]
    fn test_unknown_response_type_serializes_unchanged() {
        let raw = serde_json::json!({"type": "hologram", "beam": "on", "level": 3});
        let r: Response = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(serde_json::to_value(&r).unwrap(), raw);
    }

    #[test]
    fn test_known_response_type_keeps_field_errors() {
        let err = serde_json::from_str::<Response>(r#"{"type":"text","text":5}"#).unwrap_err();
        assert!(err.to_string().contains("invalid type"), "{}", err);
        assert!(serde_json::from_str::<Response>(r#"{"text":"hi"}"#).is_err());
        assert!(serde_json::from_str::<Response>(r#"{"type":7}"#).is_err());
    }

    #[test]
    fn test_ssh_debug_hides_secrets() {
        let target = SshTarget {
            host: "10.0.0.2".to_string(),
            port: 22,
            username: "pi".to_string(),
            auth_method: SshAuthMethod::Password,
            private_key_path: None,
            passphrase: Some("phrase-secret".to_string()),
            password: Some("hunter2".to_string()),
        };
        let dbg = format!("{:?}", target);
        assert!(!dbg.contains("hunter2"));
        assert!(!dbg.contains("phrase-secret"));
        assert!(dbg.contains("10.0.0.2"));
    }

    #[test]
    fn test_draft_into_rule_assigns_identity() {
        let draft = RuleDraft::new(
            Trigger::new(TriggerType::Exact, "hello"),
            Response::Audio(AudioResponse::default()),
        );
        let a = draft.clone().into_rule();
        let b = draft.into_rule();
        assert_ne!(a.id, b.id);
        assert!(a.enabled);
        assert!(a.updated_at.is_none());
    }

    #[test]
    fn test_settings_defaults_and_gate() {
        let settings: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings.history_max_length, 10);
        assert!(settings.should_call_ai("请问天气"));
        assert!(!settings.should_call_ai("天气"));

        let open = Settings {
            call_ai_keywords: vec![],
            ..Settings::default()
        };
        assert!(open.should_call_ai("anything"));
    }

    #[test]
    fn test_settings_keyword_field_name() {
        let value = serde_json::to_value(Settings::default()).unwrap();
        assert!(value.get("callAIKeywords").is_some());
        assert!(value.get("historyMaxLength").is_some());
    }
}
