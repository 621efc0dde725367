//! Database facade tying the SQL pipeline to a catalog, a storage engine and
//! a directory holding the persisted catalog and config.

use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use tracing::{debug, info};

use crate::{
    config::Config,
    context::CancellationToken,
    error::{Error, Result},
    sql::{
        catalog::Catalog,
        executor::Executor,
        optimizer::{Optimizer, Statistics},
        parser::Parser,
        plan::Planner,
        types::DataChunk,
    },
    storage::{Storage, engine::Engine},
};

pub const CATALOG_FILE: &str = "catalog.json";

/// Rewrites a backslash meta-command into the SQL it stands for
fn rewrite_command(input: &str) -> Result<String> {
    match input.trim() {
        "\\dt" => Ok("SELECT table_name FROM information_schema.tables;".to_string()),
        cmd => Err(Error::UnknownCommand(cmd.to_string())),
    }
}

pub struct Database<E: Engine> {
    dir: PathBuf,
    config: Config,
    catalog: Catalog,
    storage: Storage<E>,
}

impl<E: Engine> Database<E> {
    /// Opens the database in `dir`, creating the directory if needed.
    ///
    /// A missing `catalog.json` starts a fresh catalog; the configured
    /// default schema is created if it does not exist yet.
    pub fn open(dir: impl AsRef<Path>, engine: E) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;

        let config = Config::load(&dir)?;
        let catalog = match fs::read_to_string(dir.join(CATALOG_FILE)) {
            Ok(json) => Catalog::restore(&json)?,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(dir = %dir.display(), "no catalog snapshot, starting fresh");
                Catalog::new()?
            }
            Err(err) => return Err(err.into()),
        };
        {
            let mut root = catalog.lock()?;
            if !root.has_schema(&config.default_schema) {
                root.add_schema(&config.default_schema)?;
            }
        }

        info!(dir = %dir.display(), default_schema = %config.default_schema, "database opened");
        Ok(Self {
            dir,
            config,
            catalog,
            storage: Storage::new(engine),
        })
    }

    /// Runs every statement in `sql` and returns the result of the last one.
    ///
    /// Nothing runs if any statement fails to parse. Execution stops at the
    /// first failing statement; earlier statements stay applied.
    pub fn run(&self, token: &CancellationToken, sql: &str) -> Result<Option<DataChunk>> {
        let sql = if sql.trim_start().starts_with('\\') {
            rewrite_command(sql)?
        } else {
            sql.to_string()
        };
        debug!(sql = %sql, "running");

        let mut parser = Parser::new(&sql);
        let program = parser.parse_program();
        if !parser.errors().is_empty() {
            return Err(Error::Parse(format!(
                "failed to parse SQL: {}\n{}",
                sql,
                parser.errors().join("\n")
            )));
        }

        let stats = Statistics::new();
        let mut result = None;
        for statement in program.statements {
            token.check()?;
            let plan = Planner::new(&self.catalog, &self.config.default_schema).build(statement)?;
            let plan = Optimizer::new(&self.catalog).optimize(plan, &stats)?;
            result = Executor::new(&self.catalog, &self.storage).execute(plan, token)?;
        }
        Ok(result)
    }

    /// Writes the catalog snapshot and config to the database directory
    pub fn close(self) -> Result<()> {
        fs::write(self.dir.join(CATALOG_FILE), self.catalog.snapshot()?)?;
        self.config.store(&self.dir)?;
        info!(dir = %self.dir.display(), "database closed");
        Ok(())
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn storage(&self) -> &Storage<E> {
        &self.storage
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
