//! Simple single-file migration format
//!
//! Implements a sqlx migration source that reads all migrations from one
//! embedded sql file. A migration starts at a header comment line:
//! ```text
//! --##1 initial schema
//! ```
//! The header carries the version (1) and a description. Versions must
//! increase by one per migration.
use std::{borrow::Cow, future::Future, pin::Pin};

use sqlx::{
    error::BoxDynError,
    migrate::{Migration, MigrationSource, MigrationType},
};

#[derive(Debug)]
pub struct MigrationScript<'s> {
    data: &'s str,
}

impl<'s> MigrationSource<'s> for MigrationScript<'s> {
    fn resolve(self) -> Pin<Box<dyn Future<Output = Result<Vec<Migration>, BoxDynError>> + Send + 's>> {
        Box::pin(async move {
            let mut result: Vec<Migration> = Vec::new();

            for line in self.data.lines() {
                if line.trim().is_empty() {
                    continue;
                }

                if let Some(header) = line.strip_prefix("--##") {
                    let (version_str, description) =
                        header.split_once(' ').unwrap_or((header, ""));
                    let version = version_str.parse().map_err(|e| {
                        format!(
                            "cannot parse version of migration as int, got string '{}', error: {}",
                            version_str, e
                        )
                    })?;
                    result.push(Migration::new(
                        version,
                        Cow::Owned(description.to_string()),
                        MigrationType::Simple,
                        Cow::Owned(String::new()),
                    ));
                    continue;
                }

                let migration = match result.last_mut() {
                    Some(v) => v,
                    None => {
                        // allow comments at beginning of file
                        if line.starts_with("--") {
                            continue;
                        }
                        Err(format!(
                            "migration script does not start with migration header, got: {}",
                            line
                        ))?
                    }
                };
                migration.sql.to_mut().push_str(line);
                migration.sql.to_mut().push('\n');
            }

            Ok(result)
        })
    }
}

pub fn postgresql_migrations() -> MigrationScript<'static> {
    MigrationScript {
        data: include_str!("./sql/migrations.pg.sql"),
    }
}
