use std::path::Path;

use anyhow::{Context, Result, bail};
use chrono::NaiveDateTime;
use rusqlite::{Connection, OpenFlags, OptionalExtension, params};

use crate::classify::{EpochTransitions, normalize_cut_mask};

use super::{RunMetadataRecord, RunMetadataSource};

/// Local SQLite mirror of the observatory run tables.
pub struct SqliteRunSource {
    connection: Connection,
    epochs: EpochTransitions,
}

impl SqliteRunSource {
    pub fn open(db_path: &Path, epochs: EpochTransitions) -> Result<Self> {
        if !db_path.exists() {
            bail!(
                "run metadata database not found: {} (create it with `runlistgen init-db`)",
                db_path.display()
            );
        }

        let connection = Connection::open_with_flags(
            db_path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_context(|| format!("failed to open {}", db_path.display()))?;

        Ok(Self::from_connection(connection, epochs))
    }

    pub fn from_connection(connection: Connection, epochs: EpochTransitions) -> Self {
        Self { connection, epochs }
    }
}

impl RunMetadataSource for SqliteRunSource {
    fn lookup(&self, run_id: &str) -> Result<Option<RunMetadataRecord>> {
        let row = self
            .connection
            .query_row(
                "
                SELECT
                  i.data_start_time,
                  i.config_mask,
                  COALESCE(i.run_type, ''),
                  CAST(c.tel_cut_mask AS TEXT)
                FROM tblRun_Info i
                LEFT JOIN tblRun_Analysis_Comments c ON c.run_id = i.run_id
                WHERE i.run_id = ?1
                LIMIT 1
                ",
                params![run_id],
                |row| {
                    Ok((
                        row.get::<_, NaiveDateTime>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, Option<String>>(3)?,
                    ))
                },
            )
            .optional()
            .with_context(|| format!("failed to query run metadata for {run_id}"))?;

        let Some((data_start_time, config_mask, run_type, tel_cut_mask)) = row else {
            return Ok(None);
        };

        let config_mask = u8::try_from(config_mask)
            .ok()
            .filter(|mask| *mask <= 15)
            .with_context(|| format!("run {run_id} has config_mask {config_mask} outside 0..=15"))?;
        let (days_since_t1_move, days_since_upgrade) = self.epochs.days_since(data_start_time);

        Ok(Some(RunMetadataRecord {
            run_id: run_id.to_string(),
            data_start_time,
            tel_cut_mask: normalize_cut_mask(tel_cut_mask.as_deref()),
            config_mask,
            run_type,
            days_since_t1_move,
            days_since_upgrade,
        }))
    }
}

pub fn ensure_schema(connection: &Connection) -> Result<()> {
    connection
        .execute_batch(
            "
            CREATE TABLE IF NOT EXISTS tblRun_Info (
              run_id TEXT PRIMARY KEY,
              data_start_time TEXT NOT NULL,
              config_mask INTEGER NOT NULL,
              run_type TEXT
            );

            CREATE TABLE IF NOT EXISTS tblRun_Analysis_Comments (
              run_id TEXT PRIMARY KEY,
              tel_cut_mask TEXT
            );
            ",
        )
        .context("failed to create run metadata schema")?;
    Ok(())
}
