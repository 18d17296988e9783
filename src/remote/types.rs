//! Request/response bodies that only exist on the wire.

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct SaveGridResponse {
    pub ok: bool,
    pub csv_path: String,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct SaveSkeletonResponse {
    pub ok: bool,
    pub skeleton_path: String,
}

#[derive(Debug, serde::Serialize)]
pub(super) struct SuggestRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(super) instruction: Option<&'a str>,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct SuggestResponse {
    pub rows: Vec<Vec<String>>,
}
