//! Finds `<paper>_<tableN>.csv` files under a root directory and the image
//! and skeleton files that sit next to them.

use walkdir::WalkDir;

use tabskel::model::TaskStatus;

use super::*;

pub(super) const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Files belonging to one table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(super) struct TableFiles {
    pub(super) paper_id: String,
    pub(super) table_id: String,
    pub(super) csv_path: PathBuf,
    pub(super) image_path: Option<PathBuf>,
    pub(super) skeleton_path: Option<PathBuf>,
}

impl TableFiles {
    fn from_csv(csv_path: PathBuf, paper_id: String, table_id: String) -> Self {
        let prefix = format!("{}_{}", paper_id, table_id);
        let dir = csv_path.parent().map(FsPath::to_path_buf).unwrap_or_default();
        Self {
            image_path: find_image(&dir, &prefix),
            skeleton_path: find_skeleton(&dir, &prefix),
            paper_id,
            table_id,
            csv_path,
        }
    }

    pub(super) fn prefix(&self) -> String {
        format!("{}_{}", self.paper_id, self.table_id)
    }

    pub(super) fn dir(&self) -> PathBuf {
        self.csv_path
            .parent()
            .map(FsPath::to_path_buf)
            .unwrap_or_default()
    }

    /// Where saves go; reads may have come from the `<prefix>.json` fallback.
    pub(super) fn skeleton_target(&self) -> PathBuf {
        self.dir().join(format!("{}.skeleton.json", self.prefix()))
    }

    /// Status from the skeleton file; `not_started` without one and
    /// `in_progress` when it cannot be read.
    pub(super) fn status(&self) -> TaskStatus {
        match &self.skeleton_path {
            Some(path) => read_skeleton_status(path).unwrap_or(TaskStatus::InProgress),
            None => TaskStatus::NotStarted,
        }
    }

    pub(super) fn list_item(&self, status: TaskStatus) -> TableListItem {
        TableListItem {
            paper_id: self.paper_id.clone(),
            table_id: self.table_id.clone(),
            csv_path: self.csv_path.display().to_string(),
            image_path: self.image_path.as_ref().map(|p| p.display().to_string()),
            skeleton_path: self.skeleton_path.as_ref().map(|p| p.display().to_string()),
            status,
        }
    }
}

/// Splits a file stem into paper id and table id. The table id is
/// `table<digits>` or `figure<digits>` (any case) and the paper id is the
/// shortest non-empty prefix before it; anything after the digits is ignored.
pub(super) fn parse_table_stem(stem: &str) -> Option<(String, String)> {
    let stem = stem.strip_suffix(".skeleton").unwrap_or(stem);
    for (i, _) in stem.match_indices('_') {
        if i == 0 {
            continue;
        }
        let rest = &stem[i + 1..];
        let lower = rest.to_ascii_lowercase();
        let word = ["table", "figure"]
            .into_iter()
            .find(|w| lower.starts_with(w))
            .map(str::len);
        let Some(word) = word else {
            continue;
        };
        let digits = rest[word..]
            .bytes()
            .take_while(|b| b.is_ascii_digit())
            .count();
        if digits == 0 {
            continue;
        }
        return Some((stem[..i].to_string(), rest[..word + digits].to_string()));
    }
    None
}

fn find_image(dir: &FsPath, prefix: &str) -> Option<PathBuf> {
    IMAGE_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{}.{}", prefix, ext)))
        .find(|p| p.is_file())
}

fn find_skeleton(dir: &FsPath, prefix: &str) -> Option<PathBuf> {
    [
        dir.join(format!("{}.skeleton.json", prefix)),
        dir.join(format!("{}.json", prefix)),
    ]
    .into_iter()
    .find(|p| p.is_file())
}

fn read_skeleton_status(path: &FsPath) -> Option<TaskStatus> {
    let bytes = std::fs::read(path).ok()?;
    let value: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
    value.get("status")?.as_str()?.parse().ok()
}

fn csv_files(root: &FsPath) -> Result<Vec<(PathBuf, String, String)>> {
    let mut out = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.with_context(|| format!("walk {}", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let is_csv = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
        if !is_csv {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if let Some((paper_id, table_id)) = parse_table_stem(stem) {
            out.push((path.to_path_buf(), paper_id, table_id));
        }
    }
    Ok(out)
}

/// All tables under `root`, sorted by (paper id, table id). When two files
/// map to the same pair the last one walked wins.
pub(super) fn scan_tables(root: &FsPath) -> Result<Vec<TableListItem>> {
    let mut by_key = std::collections::BTreeMap::new();
    for (csv_path, paper_id, table_id) in csv_files(root)? {
        let files = TableFiles::from_csv(csv_path, paper_id.clone(), table_id.clone());
        let item = files.list_item(files.status());
        by_key.insert((paper_id, table_id), item);
    }
    tracing::debug!(root = %root.display(), tables = by_key.len(), "scanned tables");
    Ok(by_key.into_values().collect())
}

pub(super) fn locate_table(
    root: &FsPath,
    paper_id: &str,
    table_id: &str,
) -> Result<Option<TableFiles>> {
    Ok(csv_files(root)?
        .into_iter()
        .filter(|(_, p, t)| p == paper_id && t == table_id)
        .last()
        .map(|(path, p, t)| TableFiles::from_csv(path, p, t)))
}

#[cfg(test)]
#[path = "../../tests/bin/tabskel_server/discovery_tests.rs"]
mod tests;
