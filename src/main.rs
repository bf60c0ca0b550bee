// ABOUTME: Entry point for the relevo CLI application.
// ABOUTME: Drives one deployment attempt with the rollback guard always armed.

mod cli;

use clap::Parser;
use cli::Cli;
use relevo::config::Settings;
use relevo::deploy::{
    Deployment, DeploymentRequest, DeployError, DeployLock, RollbackGuard, preflight,
};
use relevo::error::Result;
use relevo::probe::HealthProber;
use relevo::routes::RouteStore;
use relevo::runtime::{DockerRuntime, RuntimeOps};
use relevo::types::{ImageRef, ServiceName};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let request = DeploymentRequest::new(
        ServiceName::new(&cli.new_service_name)?,
        ImageRef::parse(&cli.new_image_ref)?,
        cli.old_workspace,
        ServiceName::new(&cli.old_instance_name)?,
        cli.binding_port,
    )
    .map_err(relevo::error::Error::Deploy)?;

    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(routes) = cli.routes {
        settings.route_file = routes;
    }
    if let Some(endpoint) = cli.endpoint {
        settings.public_endpoint = endpoint;
    }
    settings.validate()?;

    let runtime = DockerRuntime::connect_local(settings.workspace_root.clone())?;
    let store = RouteStore::new(settings.route_file.clone());
    let prober = HealthProber::new(settings.probe_timeout);

    let lock = DeployLock::acquire(&settings.state_dir, &request.new_service, cli.force)
        .map_err(relevo::error::Error::Deploy)?;

    println!(
        "Deploying {} ({}) replacing {}",
        request.new_service, request.new_image, request.old_instance
    );

    println!("  → Running pre-flight checks...");
    if let Err(e) = preflight(&request, &runtime).await {
        eprintln!("  ✗ Pre-flight failed: {e}");
        println!("No rollback needed");
        lock.release();
        return Err(e.into());
    }

    let guard = RollbackGuard::new();

    // Timed waits inside the stages are cancellable; rollback still runs to
    // completion after an external abort.
    let outcome = tokio::select! {
        res = run_stages(request, settings, &runtime, &store, &prober, &guard) => res,
        _ = tokio::signal::ctrl_c() => Err(DeployError::Aborted),
    };

    match outcome {
        Ok(()) => {
            guard.disarm();
            lock.release();
            println!("Deployment committed");
            Ok(())
        }
        Err(e) => {
            eprintln!("  ✗ Deployment failed: {e}");
            // An abort before the first arming action leaves nothing to
            // compensate; the unarmed guard reports that as a no-op.
            if guard.run(&runtime, &store).await {
                println!("Rollback complete");
            } else {
                println!("No rollback needed");
            }
            lock.release();
            Err(e.into())
        }
    }
}

/// Run the deployment state machine.
async fn run_stages<R: RuntimeOps>(
    request: DeploymentRequest,
    settings: Settings,
    runtime: &R,
    store: &RouteStore,
    prober: &HealthProber,
    guard: &RollbackGuard,
) -> std::result::Result<(), DeployError> {
    let deployment = Deployment::new(request, settings);

    println!("  → Starting new instance...");
    let deployment = deployment.start_instance(runtime, guard).await?;

    println!("  → Waiting for readiness...");
    let deployment = deployment.await_ready(runtime, prober).await?;

    println!("  → Shifting canary traffic...");
    let deployment = deployment.shift_canary(store, guard)?;

    println!("  → Validating under load...");
    let deployment = deployment.validate_canary(prober).await?;

    println!("  → Cutting over all traffic...");
    let deployment = deployment.cutover(store, prober).await?;

    println!("  → Decommissioning old instance...");
    let deployment = deployment.decommission(runtime).await;

    println!("  ✓ Deployed instance: {}", deployment.deployed_instance());
    Ok(())
}
