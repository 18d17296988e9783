//! Reading and writing a table's CSV grid, skeleton and image.

use base64::Engine;

use super::*;

/// First record is the header; the rest are rows. Records may be ragged.
pub(super) fn read_grid(path: &FsPath) -> Result<Grid> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("open {}", path.display()))?;
    let mut records = Vec::new();
    for record in reader.records() {
        let record = record.with_context(|| format!("read {}", path.display()))?;
        records.push(record.iter().map(str::to_string).collect::<Vec<_>>());
    }
    let mut records = records.into_iter();
    let header = records.next().unwrap_or_default();
    Ok(Grid::new(header, records.collect()))
}

pub(super) fn grid_to_csv(grid: &Grid) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(Vec::new());
    writer.write_record(&grid.header).context("write header")?;
    for row in &grid.rows {
        writer.write_record(row).context("write row")?;
    }
    writer.into_inner().context("flush csv")
}

pub(super) fn write_grid(path: &FsPath, grid: &Grid) -> Result<()> {
    let bytes = grid_to_csv(grid)?;
    write_atomic_overwrite(path, &bytes)
}

pub(super) fn default_skeleton(files: &TableFiles) -> Skeleton {
    let file_name = |p: &FsPath| {
        p.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    };
    Skeleton::new_for_table(
        &files.paper_id,
        &files.table_id,
        &file_name(files.csv_path.as_path()),
        files.image_path.as_deref().map(file_name).as_deref(),
    )
}

/// The stored skeleton, or a fresh one when there is none or it cannot be
/// parsed.
pub(super) fn load_skeleton(files: &TableFiles) -> Skeleton {
    let Some(path) = &files.skeleton_path else {
        return default_skeleton(files);
    };
    let parsed = std::fs::read(path)
        .with_context(|| format!("read {}", path.display()))
        .and_then(|bytes| {
            serde_json::from_slice::<Skeleton>(&bytes)
                .with_context(|| format!("parse {}", path.display()))
        });
    match parsed {
        Ok(skeleton) => skeleton,
        Err(err) => {
            tracing::warn!(error = %format!("{:#}", err), "unreadable skeleton; using default");
            default_skeleton(files)
        }
    }
}

/// Stamps `last_modified` and writes `<prefix>.skeleton.json`.
pub(super) fn save_skeleton(files: &TableFiles, skeleton: &Skeleton) -> Result<PathBuf> {
    let mut skeleton = skeleton.clone();
    skeleton.last_modified = Some(now_ts());
    let bytes = serde_json::to_vec_pretty(&skeleton).context("serialize skeleton")?;
    let target = files.skeleton_target();
    write_atomic_overwrite(&target, &bytes)?;
    Ok(target)
}

pub(super) fn now_ts() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "<time>".to_string())
}

pub(super) fn image_content_type(path: &FsPath) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}

pub(super) fn image_data_url(path: &FsPath) -> Result<String> {
    let bytes = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    Ok(format!("data:{};base64,{}", image_content_type(path), encoded))
}

#[cfg(test)]
#[path = "../../tests/bin/tabskel_server/table_files_tests.rs"]
mod tests;
