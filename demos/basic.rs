//! Basic usage example

use envcast::Value;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Set environment variables for demonstration
    std::env::set_var("DATABASE_URL", " postgres://localhost/mydb ");
    std::env::set_var("MAX_CONNECTIONS", "100");
    std::env::set_var("DEBUG_MODE", "enabled");
    std::env::set_var("TIMEOUT", "ten seconds");

    let env = envcast::environ();

    // The default's type picks the conversion
    let database_url = env.get_or("DATABASE_URL", "postgres://localhost/dev".to_string());
    let max_connections = env.get_or("MAX_CONNECTIONS", 10_i64);
    let debug_mode = env.get_or("DEBUG_MODE", false);
    let ratio = env.get_or("SAMPLE_RATIO", 0.5);

    // Unparseable values are logged and replaced by the default
    let timeout = env.get("TIMEOUT", Some(Value::Float(30.0)), None)?;

    println!("Configuration loaded:");
    println!("  Database URL: {database_url}");
    println!("  Max Connections: {max_connections}");
    println!("  Debug Mode: {debug_mode}");
    println!("  Sample Ratio: {ratio}");
    println!("  Timeout: {timeout}");

    Ok(())
}
