use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::info;

use crate::cli::InitDbArgs;
use crate::source::ensure_schema;
use crate::util::ensure_directory;

pub fn run(args: InitDbArgs) -> Result<()> {
    if let Some(parent) = args
        .db_path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
    {
        ensure_directory(parent)?;
    }

    let connection = Connection::open(&args.db_path)
        .with_context(|| format!("failed to open {}", args.db_path.display()))?;
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    ensure_schema(&connection)?;

    let run_count: i64 = connection
        .query_row("SELECT COUNT(*) FROM tblRun_Info", [], |row| row.get(0))
        .context("failed to count runs")?;

    info!(
        path = %args.db_path.display(),
        runs = run_count,
        "run metadata database ready"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_db_is_idempotent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db_path = dir.path().join("nested").join("runs.sqlite");

        run(InitDbArgs {
            db_path: db_path.clone(),
        })
        .expect("first init");
        run(InitDbArgs {
            db_path: db_path.clone(),
        })
        .expect("second init");

        let connection = Connection::open(&db_path).expect("open");
        let tables: i64 = connection
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name LIKE 'tblRun_%'",
                [],
                |row| row.get(0),
            )
            .expect("count tables");
        assert_eq!(tables, 2);
    }
}
