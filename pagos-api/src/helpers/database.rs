use std::path::PathBuf;

/// Returns the path to the payments database based on the operating system
///
/// # Platform-specific paths
///
/// - **macOS**: `~/Library/Application Support/pagos/payments.db`
/// - **Linux**: `~/.local/share/pagos/payments.db`
/// - **Windows**: `%LOCALAPPDATA%\pagos\payments.db`
pub fn get_db_path() -> anyhow::Result<PathBuf> {
    let data_dir = dirs::data_local_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine local data directory"))?;

    let db_path = data_dir.join("pagos").join("payments.db");

    Ok(db_path)
}

/// Initialize the database connection
pub fn initialize_database() -> anyhow::Result<std::sync::Arc<crate::database::Database>> {
    let db_path = get_db_path()?;

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db = crate::database::Database::new(&db_path)?;
    Ok(std::sync::Arc::new(db))
}
