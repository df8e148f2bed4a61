use stress_test::{stress_test_controller, stress_test_scaling, StressResult};

fn main() -> StressResult<()> {
    init_tracing();
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async_main())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()),
        )
        .init();
}

async fn async_main() -> StressResult<()> {
    println!("\n\n╔════════════════════════════════════════════════════════════╗");
    println!("║            ASYNC STRESS TESTS                               ║");
    println!("╚════════════════════════════════════════════════════════════╝");

    let mut mismatches = 0;

    // Test 1: few writers, small batches
    let stats = stress_test_controller(2, 200, 4).await?;
    stats.print();
    mismatches += stats.mismatches;

    // Test 2: many writers, large batches
    let stats = stress_test_controller(8, 500, 32).await?;
    stats.print();
    mismatches += stats.mismatches;

    // Test 3: one mutation per pass
    let stats = stress_test_controller(4, 250, 1).await?;
    stats.print();
    mismatches += stats.mismatches;

    // Test 4: Scaling analysis
    mismatches += stress_test_scaling(12, 4).await?;

    if mismatches > 0 {
        return Err(format!("{} verification failures", mismatches).into());
    }

    println!("\n✓ All stress tests completed successfully!");
    Ok(())
}
