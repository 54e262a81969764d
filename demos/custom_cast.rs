//! Example demonstrating custom converters

use envcast::{Cast, Value};
use std::time::Duration;

/// Parse durations like `30s`, `5m` or a bare number of seconds.
fn seconds(raw: Option<&str>) -> Result<Value, envcast::BoxError> {
    let Some(raw) = raw else {
        return Ok(Value::Int(30));
    };
    let (digits, unit) = match raw.strip_suffix('m') {
        Some(digits) => (digits, 60),
        None => (raw.strip_suffix('s').unwrap_or(raw), 1),
    };
    let secs: i64 = digits.trim().parse()?;
    Ok(Value::Int(secs * unit))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let env = envcast::environ();
    env.set("REQUEST_TIMEOUT", "5m")?;
    env.set("FEATURES", r#"{"beta": true, "quota": null}"#)?;

    let timeout = env.get("REQUEST_TIMEOUT", None, Some(Cast::custom("seconds", seconds)))?;
    let idle = env.get("IDLE_TIMEOUT", None, Some(Cast::custom("seconds", seconds)))?;
    let features = env.get("FEATURES", None, Some(Cast::json()))?;

    let timeout = Duration::from_secs(timeout.as_int().unwrap_or(30).try_into()?);
    println!("Request timeout: {timeout:?}");
    println!("Idle timeout (unset): {idle}s");
    println!("Features: {features}");

    Ok(())
}
