use std::path::PathBuf;

use directories::ProjectDirs;

const PROJECT_ROOT: &str = env!("CARGO_MANIFEST_DIR");
pub const ASSET_DIR_ENV: &str = "SITE_ASSET_DIR";

/// Root directory for the default database file and uploaded blobs.
///
/// `SITE_ASSET_DIR` wins when set. Debug builds otherwise use `dev_assets/` at
/// the workspace root; release builds use the OS data directory.
pub fn asset_dir() -> std::io::Result<PathBuf> {
    if let Ok(override_dir) = std::env::var(ASSET_DIR_ENV) {
        let override_dir = override_dir.trim();
        if !override_dir.is_empty() {
            let path = PathBuf::from(override_dir);
            std::fs::create_dir_all(&path)?;
            return Ok(path);
        }
    }

    let path = if cfg!(debug_assertions) {
        PathBuf::from(PROJECT_ROOT).join("../../dev_assets")
    } else {
        ProjectDirs::from("id", "unusia", "dept-site")
            .ok_or_else(|| {
                std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "OS didn't give us a home directory",
                )
            })?
            .data_dir()
            .to_path_buf()
    };

    std::fs::create_dir_all(&path)?;
    Ok(path)
}

pub fn default_database_url() -> std::io::Result<String> {
    Ok(format!(
        "sqlite://{}?mode=rwc",
        asset_dir()?.join("db.sqlite").to_string_lossy()
    ))
}

pub fn default_upload_dir() -> std::io::Result<PathBuf> {
    Ok(asset_dir()?.join("uploads"))
}
