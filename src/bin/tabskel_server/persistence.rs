use super::*;

pub(super) fn settings_path(data_dir: &FsPath) -> PathBuf {
    data_dir.join("config.json")
}

pub(super) fn load_settings(data_dir: &FsPath) -> Result<Option<Settings>> {
    let path = settings_path(data_dir);
    if !path.exists() {
        return Ok(None);
    }
    let bytes = std::fs::read(&path).with_context(|| format!("read {}", path.display()))?;
    let settings = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse {}", path.display()))?;
    Ok(Some(settings))
}

pub(super) fn persist_settings(data_dir: &FsPath, settings: &Settings) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(settings).context("serialize settings")?;
    write_atomic_overwrite(&settings_path(data_dir), &bytes).context("write config.json")
}

pub(super) fn write_atomic_overwrite(path: &FsPath, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create dir {}", parent.display()))?;
    }
    let tmp = path.with_extension(format!("tmp.{}", std::process::id()));
    std::fs::write(&tmp, bytes).with_context(|| format!("write {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("rename {} -> {}", tmp.display(), path.display()))?;
    Ok(())
}
