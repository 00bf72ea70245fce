//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `parent_core` linkage, migrations and repository wiring.
//! - Keep output deterministic for quick local sanity checks.
//!
//! Usage: `parent_cli [LOG_DIR]`. When `LOG_DIR` (absolute) is given, core
//! events are written there at the build's default level.

use parent_core::{
    default_log_level, init_logging, open_db_in_memory, parent_supply, LogConfig, Parent,
    ParentRepository, SqliteParentRepository,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    match run(std::env::args().nth(1)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("parent_core smoke failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(log_dir: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(log_dir) = log_dir {
        init_logging(&LogConfig::new(default_log_level(), log_dir)?)?;
    }
    println!("parent_core version={}", parent_core::core_version());

    let mut conn = open_db_in_memory()?;
    let mut repo = SqliteParentRepository::try_new(&mut conn)?;

    let mut supply = parent_supply()?;
    let fixtures = supply.next(supply.remaining());
    let (valid, rejected): (Vec<Parent>, Vec<Parent>) = fixtures
        .into_iter()
        .partition(|parent| parent.validate().is_ok());

    let seeded = repo.save_all(&valid)?;
    println!(
        "parent_core seeded={} rejected={} stored={}",
        seeded.len(),
        rejected.len(),
        repo.count()?
    );
    Ok(())
}
