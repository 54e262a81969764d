//! Example demonstrating container values read with the literal parser

use envcast::{Shape, Value};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let env = envcast::environ();

    env.set("TAGS", "['production', 'api', 'v2']")?;
    env.set("LIMITS", r#"{"cpu": 2, "memory": "512Mi"}"#)?;
    env.set("ORIGIN", "(0.0, 1.5)")?;
    env.set("ALLOWED_IDS", "{1, 2, 3}")?;

    // Written from a Value, read back as the same container
    let replicas = Value::dict([
        (Value::from("web"), Value::Int(3)),
        (Value::from("worker"), Value::Int(2)),
    ]);
    env.set("REPLICAS", &replicas)?;

    // Never evaluated: falls back to the default
    env.set("INJECTED", "__import__('os').system('true')")?;

    let tags = env.get("TAGS", Some(Value::List(vec![])), None)?;
    let limits = env.get("LIMITS", None, Some(Shape::Dict.into()))?;
    let origin = env.get("ORIGIN", Some(Value::Tuple(vec![])), None)?;
    let allowed = env.get("ALLOWED_IDS", None, Some(Shape::Set.into()))?;
    let read_back = env.get("REPLICAS", Some(Value::Dict(vec![])), None)?;
    let injected = env.get("INJECTED", Some(Value::List(vec![])), None)?;

    println!("Containers loaded:");
    println!("  Tags: {tags}");
    println!("  Limits: {limits}");
    println!("  Limits as JSON: {}", serde_json::to_string(&limits)?);
    println!("  Origin: {origin}");
    println!("  Allowed IDs: {allowed}");
    println!("  Replicas (round trip): {read_back}");
    println!("  Injected (fallback): {injected}");

    Ok(())
}
