//! Grid suggestions and pre-annotations from an OpenAI-compatible chat
//! completions endpoint.

use anyhow::{Context, Result, bail};
use serde_json::{Value, json};

pub(super) const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub(super) const DEFAULT_MODEL: &str = "gpt-4o";

const SYSTEM_PROMPT: &str = "You are a precise data extraction assistant.";

pub(super) struct Provider<'a> {
    pub(super) base_url: &'a str,
    pub(super) model: &'a str,
    pub(super) api_key: &'a str,
}

pub(super) struct SuggestInput<'a> {
    pub(super) paper_id: &'a str,
    pub(super) table_id: &'a str,
    pub(super) csv: &'a str,
    pub(super) image_data_url: Option<String>,
    pub(super) instruction: Option<&'a str>,
}

#[derive(Debug, serde::Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, serde::Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, serde::Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

pub(super) fn build_prompt(input: &SuggestInput<'_>) -> String {
    let mut prompt = format!(
        "Correct the extracted regression table {} of paper {}.\n\
         - Compare the CSV below with the table image and fix OCR mistakes.\n\
         - The first column is the row id; keep existing ids.\n\
         - Keep numbers, asterisks and brackets exactly as printed.\n\
         - Reply with pure JSON: {{\"rows\": [[...], ...]}} with every cell a string.\n",
        input.table_id, input.paper_id
    );
    if let Some(instruction) = input.instruction.filter(|s| !s.trim().is_empty()) {
        prompt.push_str(&format!("Additional instruction: {}\n", instruction.trim()));
    }
    prompt.push_str("\nCurrent CSV:\n");
    prompt.push_str(input.csv);
    prompt
}

pub(super) fn build_request(model: &str, input: &SuggestInput<'_>) -> Value {
    let mut content = vec![json!({"type": "text", "text": build_prompt(input)})];
    if let Some(url) = &input.image_data_url {
        content.push(json!({"type": "image_url", "image_url": {"url": url}}));
    }
    json!({
        "model": model,
        "temperature": 0,
        "messages": [
            {"role": "system", "content": SYSTEM_PROMPT},
            {"role": "user", "content": content},
        ],
    })
}

pub(super) async fn request_rows(
    http: &reqwest::Client,
    provider: &Provider<'_>,
    input: &SuggestInput<'_>,
) -> Result<Vec<Vec<String>>> {
    let content = chat(http, provider, &build_request(provider.model, input)).await?;
    parse_rows(&content)
}

/// What the model knows about a table before anyone has looked at it.
pub(super) struct PreannotateInput<'a> {
    pub(super) paper_id: &'a str,
    pub(super) table_id: &'a str,
    pub(super) image_data_url: String,
    pub(super) pdf_text: &'a str,
    pub(super) candidate_columns: &'a [String],
    pub(super) candidate_code_vars: &'a [String],
}

/// Grid rows (header first) plus the raw skeleton object from the reply.
#[derive(Debug)]
pub(super) struct Preannotation {
    pub(super) rows: Vec<Vec<String>>,
    pub(super) skeleton: Value,
}

const MAX_PROMPT_CANDIDATES: usize = 400;
const MAX_PROMPT_PDF_CHARS: usize = 4000;

pub(super) fn build_preannotate_prompt(input: &PreannotateInput<'_>) -> String {
    let columns: Vec<&str> = input
        .candidate_columns
        .iter()
        .take(MAX_PROMPT_CANDIDATES)
        .map(String::as_str)
        .collect();
    let code_vars: Vec<&str> = input
        .candidate_code_vars
        .iter()
        .take(MAX_PROMPT_CANDIDATES)
        .map(String::as_str)
        .collect();
    let pdf: String = input.pdf_text.chars().take(MAX_PROMPT_PDF_CHARS).collect();
    format!(
        "Extract the regression table in the image and map its rows and columns to dataset variable names.\n\
         - Reconstruct the grid as an array of rows, header row first. The first column is the 1-based row id.\n\
         - Annotate the skeleton: y_columns, x_rows, fe_rows, obs_rows and bracket_type_default.\n\
         - Fill data_var_name with the best match among the dataset columns and code variable names; leave it empty when unsure.\n\
         - Take depvar_label and display labels from the table text.\n\
         - Keep numbers, asterisks and brackets exactly as printed.\n\
         Paper id: {}, table id: {}.\n\
         Candidate dataset columns (partial): {}\n\
         Candidate variable names from code (partial): {}\n\
         Reply with pure JSON with keys grid and skeleton. Skeleton fields: paper_id, table_id, grid_file, image_file, status, \
         bracket_type_default, y_columns[{{col,depvar_label,depvar_data_name,note}}], \
         x_rows[{{row,display_label,data_var_name,role,note}}], fe_rows[{{row,label,data_var_name,note}}], \
         obs_rows[{{row,label,note}}], notes{{rows,cols,cells}}.\n\
         \nPDF snippet:\n{}",
        input.paper_id,
        input.table_id,
        columns.join(", "),
        code_vars.join(", "),
        pdf
    )
}

pub(super) fn build_preannotate_request(model: &str, input: &PreannotateInput<'_>) -> Value {
    json!({
        "model": model,
        "temperature": 0,
        "messages": [
            {"role": "system", "content": SYSTEM_PROMPT},
            {"role": "user", "content": [
                {"type": "text", "text": build_preannotate_prompt(input)},
                {"type": "image_url", "image_url": {"url": input.image_data_url}},
            ]},
        ],
    })
}

pub(super) async fn request_preannotation(
    http: &reqwest::Client,
    provider: &Provider<'_>,
    input: &PreannotateInput<'_>,
) -> Result<Preannotation> {
    let content = chat(
        http,
        provider,
        &build_preannotate_request(provider.model, input),
    )
    .await?;
    parse_preannotation(&content)
}

/// One chat completion round trip; returns the first choice's text.
async fn chat(http: &reqwest::Client, provider: &Provider<'_>, body: &Value) -> Result<String> {
    let url = format!("{}/chat/completions", provider.base_url.trim_end_matches('/'));
    let resp = http
        .post(&url)
        .bearer_auth(provider.api_key)
        .json(body)
        .send()
        .await
        .with_context(|| format!("send chat completion request to {}", url))?;

    let status = resp.status();
    let body = resp.text().await.context("read chat completion response")?;
    if !status.is_success() {
        let snippet: String = body.chars().take(300).collect();
        bail!("provider returned {}: {}", status, snippet);
    }

    let reply: ChatResponse = serde_json::from_str(&body).context("parse chat completion")?;
    reply
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .context("provider reply has no content")
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = rest.split_once('\n').map(|(_, b)| b).unwrap_or("");
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

fn cell_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Accepts `{"rows": [...]}`, `{"grid": [...]}` or a bare array of arrays,
/// optionally inside a markdown code fence.
pub(super) fn parse_rows(content: &str) -> Result<Vec<Vec<String>>> {
    let value: Value =
        serde_json::from_str(strip_code_fence(content)).context("provider reply is not JSON")?;
    let rows = match value {
        Value::Array(rows) => rows,
        Value::Object(mut map) => take_rows(&mut map)?,
        _ => bail!("provider reply must be an object or an array"),
    };
    rows_to_cells(rows)
}

/// Accepts `{"grid": [...], "skeleton": {...}}` (`rows` is taken for
/// `grid`). A missing skeleton comes back as an empty object.
pub(super) fn parse_preannotation(content: &str) -> Result<Preannotation> {
    let value: Value =
        serde_json::from_str(strip_code_fence(content)).context("provider reply is not JSON")?;
    let Value::Object(mut map) = value else {
        bail!("provider reply must be an object with `grid` and `skeleton`");
    };
    let rows = rows_to_cells(take_rows(&mut map)?)?;
    let skeleton = match map.remove("skeleton") {
        Some(Value::Object(skeleton)) => Value::Object(skeleton),
        None | Some(Value::Null) => Value::Object(Default::default()),
        Some(_) => bail!("`skeleton` in provider reply is not an object"),
    };
    Ok(Preannotation { rows, skeleton })
}

fn take_rows(map: &mut serde_json::Map<String, Value>) -> Result<Vec<Value>> {
    match map.remove("rows").or_else(|| map.remove("grid")) {
        Some(Value::Array(rows)) => Ok(rows),
        Some(_) => bail!("`rows` in provider reply is not an array"),
        None => bail!("provider reply has neither `rows` nor `grid`"),
    }
}

fn rows_to_cells(rows: Vec<Value>) -> Result<Vec<Vec<String>>> {
    rows.into_iter()
        .enumerate()
        .map(|(i, row)| match row {
            Value::Array(cells) => Ok(cells.into_iter().map(cell_text).collect()),
            _ => bail!("row {} of provider reply is not an array", i),
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/bin/tabskel_server/llm_tests.rs"]
mod tests;
