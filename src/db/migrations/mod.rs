//! Database schema migrations.
//!
//! Migration files live next to this module:
//! - `migration_NN_up.sql` upgrades the schema from version `NN-1` to `NN`
//! - `migration_NN_down.sql` downgrades the schema from version `NN` to `NN-1`

use crate::error::Res;
use anyhow::{bail, Context};
use sqlx::SqlitePool;
use tracing::debug;

/// The schema version this build of the program expects.
pub(crate) const CURRENT_VERSION: i32 = 1;

struct Migration {
    /// The version this migration brings the database to when going up.
    version: i32,
    up_sql: &'static str,
    down_sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    up_sql: include_str!("migration_01_up.sql"),
    down_sql: include_str!("migration_01_down.sql"),
}];

/// Creates the `schema_version` table of a brand new database and sets it to version 0.
pub(crate) async fn bootstrap(pool: &SqlitePool) -> Res<()> {
    let mut tx = pool
        .begin()
        .await
        .context("Failed to begin bootstrap transaction")?;
    sqlx::query("CREATE TABLE schema_version (version INTEGER NOT NULL)")
        .execute(&mut *tx)
        .await
        .context("Failed to create schema_version table")?;
    sqlx::query("INSERT INTO schema_version (version) VALUES (0)")
        .execute(&mut *tx)
        .await
        .context("Failed to insert initial schema version")?;
    tx.commit()
        .await
        .context("Failed to commit bootstrap transaction")
}

/// Reads the schema version of the database.
pub(crate) async fn version(pool: &SqlitePool) -> Res<i32> {
    let row: (i32,) = sqlx::query_as("SELECT MAX(version) FROM schema_version")
        .fetch_one(pool)
        .await
        .context("Failed to query the schema version")?;
    Ok(row.0)
}

/// Runs migrations, up or down, to bring the database from `current_ver` to `target_ver`. Each
/// migration runs in its own transaction together with the `schema_version` update. All required
/// migrations are checked for before any of them runs.
pub(crate) async fn run(pool: &SqlitePool, current_ver: i32, target_ver: i32) -> Res<()> {
    if current_ver == target_ver {
        debug!("Database already at version {target_ver}, no migrations needed");
        return Ok(());
    }

    validate_migrations(current_ver, target_ver)?;

    if current_ver < target_ver {
        for version in (current_ver + 1)..=target_ver {
            debug!("Running migration {version:02} (up)");
            run_single_migration(pool, find(version)?.up_sql, version).await?;
        }
    } else {
        for version in (target_ver + 1..=current_ver).rev() {
            debug!("Running migration {version:02} (down)");
            run_single_migration(pool, find(version)?.down_sql, version - 1).await?;
        }
    }

    debug!("Migration complete, schema now at version {target_ver}");
    Ok(())
}

fn find(version: i32) -> Res<&'static Migration> {
    MIGRATIONS
        .iter()
        .find(|m| m.version == version)
        .with_context(|| format!("Migration {version} not found"))
}

async fn run_single_migration(pool: &SqlitePool, sql: &str, new_version: i32) -> Res<()> {
    let mut tx = pool
        .begin()
        .await
        .context("Failed to begin migration transaction")?;

    // The migration files hold more than one statement.
    sqlx::raw_sql(sql)
        .execute(&mut *tx)
        .await
        .context("Failed to execute migration SQL")?;

    sqlx::query("DELETE FROM schema_version")
        .execute(&mut *tx)
        .await
        .context("Failed to clear schema_version")?;

    sqlx::query("INSERT INTO schema_version (version) VALUES (?)")
        .bind(new_version)
        .execute(&mut *tx)
        .await
        .context("Failed to update schema_version")?;

    tx.commit()
        .await
        .context("Failed to commit migration transaction")
}

fn validate_migrations(current_version: i32, target_version: i32) -> Res<()> {
    let (start, end) = if current_version < target_version {
        (current_version + 1, target_version)
    } else {
        (target_version + 1, current_version)
    };

    for version in start..=end {
        if !MIGRATIONS.iter().any(|m| m.version == version) {
            bail!(
                "Migration {version} is missing but required to migrate from version \
                {current_version} to {target_version}"
            );
        }
    }
    Ok(())
}
