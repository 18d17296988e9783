use serde::{Deserialize, Serialize};

/// Backend configuration as reported to clients. The API key itself never
/// leaves the server.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default)]
    pub root_dir: String,

    #[serde(default)]
    pub llm_base_url: Option<String>,

    #[serde(default)]
    pub llm_model: Option<String>,

    #[serde(default)]
    pub llm_key_set: bool,
}

/// Partial configuration update. Absent fields are left alone; an empty
/// string clears the optional LLM settings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_dir: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_base_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_model: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_api_key: Option<String>,
}
