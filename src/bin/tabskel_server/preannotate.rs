//! Batch pre-annotation. Every table image of a paper goes to the model with
//! the paper's candidate variable names; the returned grid and skeleton are
//! written as `<paper>_<table>.csv` and `<paper>_<table>.skeleton.json`.

use super::llm::{self, PreannotateInput, Provider};
use super::paper_context::PaperContext;
use super::*;

#[derive(clap::Args, Debug)]
pub(super) struct PreannotateArgs {
    /// Paper directory holding the PDF, data files and code
    #[arg(long)]
    pub(super) paper_dir: PathBuf,

    /// Directory of table images (png/jpg)
    #[arg(long)]
    pub(super) images_dir: PathBuf,

    /// Where grids and skeletons are written
    #[arg(long)]
    pub(super) output_dir: PathBuf,

    /// Paper id (default: name of the paper directory)
    #[arg(long)]
    pub(super) paper_id: Option<String>,

    /// Model override
    #[arg(long)]
    pub(super) model: Option<String>,
}

/// Table ids by outcome.
#[derive(Debug, Default, PartialEq, Eq)]
pub(super) struct PreannotateReport {
    pub(super) written: Vec<String>,
    pub(super) skipped: Vec<String>,
    pub(super) failed: Vec<String>,
}

/// Endpoint, model and key after flags, environment and persisted settings
/// have been consulted, in that order.
#[derive(Debug, PartialEq, Eq)]
pub(super) struct ResolvedLlm {
    pub(super) base_url: String,
    pub(super) model: String,
    pub(super) api_key: String,
}

impl ResolvedLlm {
    pub(super) fn provider(&self) -> Provider<'_> {
        Provider {
            base_url: &self.base_url,
            model: &self.model,
            api_key: &self.api_key,
        }
    }
}

pub(super) fn resolve_llm(
    model_flag: Option<&str>,
    settings: &Settings,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ResolvedLlm> {
    let first_env = |names: &[&str]| {
        names
            .iter()
            .filter_map(|&name| env(name))
            .find(|v| !v.trim().is_empty())
    };
    let api_key = first_env(&["OPENAI_API_KEY", "PRE_ANNOTATOR_API_KEY"])
        .or_else(|| settings.llm_api_key.clone())
        .context("no API key: set OPENAI_API_KEY or PRE_ANNOTATOR_API_KEY")?;
    let base_url = first_env(&["OPENAI_BASE_URL", "PRE_ANNOTATOR_BASE_URL"])
        .or_else(|| settings.llm_base_url.clone())
        .unwrap_or_else(|| llm::DEFAULT_BASE_URL.to_string());
    let model = model_flag
        .map(str::to_string)
        .or_else(|| first_env(&["PRE_ANNOTATOR_MODEL"]))
        .or_else(|| settings.llm_model.clone())
        .unwrap_or_else(|| llm::DEFAULT_MODEL.to_string());
    Ok(ResolvedLlm {
        base_url,
        model,
        api_key,
    })
}

/// `table<digits>` found anywhere in the image name (lowercased), else the
/// whole file stem.
pub(super) fn table_id_for_image(path: &FsPath) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let lower = stem.to_ascii_lowercase();
    for (i, _) in lower.match_indices("table") {
        let digits: String = lower[i + "table".len()..]
            .chars()
            .take_while(char::is_ascii_digit)
            .collect();
        if !digits.is_empty() {
            return format!("table{}", digits);
        }
    }
    stem
}

/// Image files directly inside `dir`, sorted by path.
pub(super) fn table_images(dir: &FsPath) -> Result<Vec<PathBuf>> {
    let entries =
        std::fs::read_dir(dir).with_context(|| format!("read images dir {}", dir.display()))?;
    let mut images: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        })
        .collect();
    images.sort();
    Ok(images)
}

pub(super) async fn preannotate(
    http: &reqwest::Client,
    provider: &Provider<'_>,
    args: &PreannotateArgs,
) -> Result<PreannotateReport> {
    let paper_id = match &args.paper_id {
        Some(id) => id.clone(),
        None => args
            .paper_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .context("cannot derive a paper id from the paper dir; pass --paper-id")?,
    };
    let mut report = PreannotateReport::default();
    let images = table_images(&args.images_dir)?;
    if images.is_empty() {
        tracing::info!(images_dir = %args.images_dir.display(), "no table images found");
        return Ok(report);
    }
    let context = PaperContext::load(&args.paper_dir)?;
    tracing::debug!(
        pdf = ?context.pdf_path,
        columns = context.candidate_columns.len(),
        code_vars = context.candidate_code_vars.len(),
        "candidate names"
    );

    for image in images {
        let table_id = table_id_for_image(&image);
        let files = TableFiles {
            csv_path: args
                .output_dir
                .join(format!("{}_{}.csv", paper_id, table_id)),
            image_path: Some(image.clone()),
            skeleton_path: None,
            paper_id: paper_id.clone(),
            table_id: table_id.clone(),
        };
        if files.csv_path.exists() && files.skeleton_target().exists() {
            tracing::info!(image = %image.display(), "outputs exist; skipping");
            report.skipped.push(table_id);
            continue;
        }
        tracing::info!(
            image = %image.display(),
            csv = %files.csv_path.display(),
            model = provider.model,
            "pre-annotating"
        );
        match preannotate_table(http, provider, &context, &files).await {
            Ok(()) => report.written.push(table_id),
            Err(err) => {
                tracing::warn!(image = %image.display(), error = %format!("{:#}", err), "pre-annotation failed");
                report.failed.push(table_id);
            }
        }
    }
    tracing::info!(
        written = report.written.len(),
        skipped = report.skipped.len(),
        failed = report.failed.len(),
        "pre-annotation finished"
    );
    Ok(report)
}

async fn preannotate_table(
    http: &reqwest::Client,
    provider: &Provider<'_>,
    context: &PaperContext,
    files: &TableFiles,
) -> Result<()> {
    let image = files.image_path.as_deref().context("table has no image")?;
    let input = PreannotateInput {
        paper_id: &files.paper_id,
        table_id: &files.table_id,
        image_data_url: image_data_url(image)?,
        pdf_text: &context.pdf_text,
        candidate_columns: &context.candidate_columns,
        candidate_code_vars: &context.candidate_code_vars,
    };
    let reply = llm::request_preannotation(http, provider, &input).await?;

    let mut rows = reply.rows.into_iter();
    let header = rows.next().context("model returned an empty grid")?;
    let grid = Grid::new(header, rows.collect());
    let skeleton = backfill_skeleton(
        serde_json::from_value(reply.skeleton).context("parse skeleton from model reply")?,
        files,
    );

    write_grid(&files.csv_path, &grid)?;
    save_skeleton(files, &skeleton)?;
    Ok(())
}

/// Fills identity fields the model left empty.
pub(super) fn backfill_skeleton(mut skeleton: Skeleton, files: &TableFiles) -> Skeleton {
    let defaults = default_skeleton(files);
    if skeleton.paper_id.is_empty() {
        skeleton.paper_id = defaults.paper_id;
    }
    if skeleton.table_id.is_empty() {
        skeleton.table_id = defaults.table_id;
    }
    if skeleton.grid_file.is_empty() {
        skeleton.grid_file = defaults.grid_file;
    }
    if skeleton.image_file.is_none() {
        skeleton.image_file = defaults.image_file;
    }
    skeleton
}

#[cfg(test)]
#[path = "../../tests/bin/tabskel_server/preannotate_tests.rs"]
mod tests;
