use clap::Parser;
use split_audit::core::ProgressObserver;
use split_audit::utils::error::ErrorSeverity;
use split_audit::utils::{logger, validation::Validate};
use split_audit::{
    AuditEngine, AuditError, AuditFanOut, AuditSettings, BoundedRetryExecutor, CliConfig,
    LocalProject, LockfileVerifier, RegistryClient, SilentProgress, TracingProgress,
};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    if cli.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose, cli.quiet);
    }

    tracing::debug!("CLI config: {:?}", cli);

    let settings = match cli.resolve().and_then(|settings| {
        settings.validate()?;
        Ok(settings)
    }) {
        Ok(settings) => settings,
        Err(e) => exit_with(e),
    };

    if let Err(e) = run(&cli, &settings).await {
        exit_with(e);
    }
}

async fn run(cli: &CliConfig, settings: &AuditSettings) -> split_audit::Result<()> {
    let registry = RegistryClient::from_config(settings, &settings.headers)?;
    tracing::debug!("Audit endpoint: {}", registry.endpoint());

    let progress: Arc<dyn ProgressObserver> = if cli.quiet {
        Arc::new(SilentProgress)
    } else {
        Arc::new(TracingProgress)
    };
    let executor = BoundedRetryExecutor::from_config(settings).with_observer(progress);

    let engine = AuditEngine::new_with_monitoring(
        LocalProject::new(settings.prefix.clone()),
        LockfileVerifier,
        AuditFanOut::new(registry, executor),
        cli.monitor,
    );

    let report = engine.run().await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn exit_with(e: AuditError) -> ! {
    tracing::error!(
        "Audit failed: {} (Code: {}, Category: {:?})",
        e,
        e.code(),
        e.category()
    );
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::High => 1,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}
