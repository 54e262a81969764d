//! Example demonstrating env file loading

use std::io::Write;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("app.env");
    let mut file = std::fs::File::create(&path)?;
    writeln!(file, "# This sets the log level for all the loggers in the program")?;
    writeln!(file, "LOGGER_LEVEL=info")?;
    writeln!(file)?;
    writeln!(file, "# Hourly backups are stored at this path")?;
    writeln!(file, "BACKUP_PATH = /data/backups/")?;
    writeln!(file, "RETRY_TIME=5")?;
    drop(file);

    envcast::load_env_file(&path, true)?;

    // A missing file is ignored unless strict loading is requested
    envcast::load_env_file(dir.path().join("local.env"), false)?;
    if let Err(e) = envcast::load_env_file(dir.path().join("local.env"), true) {
        println!("Strict load failed as expected: {e}");
    }

    let env = envcast::environ();
    println!("Loaded from {}:", path.display());
    println!("  Logger Level: {}", env.get_or("LOGGER_LEVEL", "warn".to_string()));
    println!("  Backup Path: {}", env.get_or("BACKUP_PATH", String::new()));
    println!("  Retry Time: {}", env.get_or("RETRY_TIME", 3_i64));

    Ok(())
}
