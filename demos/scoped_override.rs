//! Example demonstrating scoped overrides

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let env = envcast::environ();
    env.set("WORKERS", 4)?;

    {
        let guard = env.scoped("WORKERS", 16)?;
        println!(
            "Inside scope: WORKERS={} (was {:?})",
            env.get_or("WORKERS", 1_i64),
            guard.previous()
        );
    }
    println!("After scope: WORKERS={}", env.get_or("WORKERS", 1_i64));

    let dry_run = env.with_var("DRY_RUN", "yes", || env.get_or("DRY_RUN", false))?;
    println!("Dry run inside closure: {dry_run}");
    println!("DRY_RUN set afterwards: {}", env.contains("DRY_RUN"));

    Ok(())
}
