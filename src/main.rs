use clap::Parser;
use cscaffold::config::LogFormat;
use cscaffold::core::ConfigProvider;
use cscaffold::utils::{logger, validation::Validate};
use cscaffold::{CliArgs, ProjectConfig, ScaffoldEngine, ScaffoldError, ScaffoldPipeline, TokioRunner};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    match args.log_format {
        LogFormat::Compact => logger::init_cli_logger(args.verbose),
        LogFormat::Json => logger::init_json_logger(args.verbose),
    }

    tracing::info!("Loading configuration from: {}", args.config);

    let config = match ProjectConfig::from_file(&args.config).and_then(|config| {
        config.validate()?;
        Ok(config)
    }) {
        Ok(config) => config,
        Err(e) => fail(&e),
    };

    tracing::info!("Configuration loaded and validated");
    display_config_summary(&config, &args);

    if args.dry_run {
        tracing::info!("Dry run: nothing cloned, generated or reported");
        return Ok(());
    }

    let workspace = config.workspace();
    let runner = TokioRunner::new(config.tool_timeout());
    let pipeline = ScaffoldPipeline::new(runner, config, workspace);
    let engine = ScaffoldEngine::new(pipeline);

    match engine.run().await {
        Ok(summary) => {
            tracing::info!("Test module: {}", summary.module_path.display());
            tracing::info!("Coverage report: {}", summary.report_index.display());
            println!("Test module: {}", summary.module_path.display());
            println!("Coverage report: {}", summary.report_index.display());
            Ok(())
        }
        Err(e) => fail(&e),
    }
}

fn fail(e: &ScaffoldError) -> ! {
    tracing::error!("{} (exit code {})", e, e.exit_code());
    tracing::error!("Suggestion: {}", e.recovery_suggestion());
    if let ScaffoldError::ExternalToolError { stdout, .. } = e {
        if !stdout.trim().is_empty() {
            eprintln!("{}", stdout.trim_end());
        }
    }
    eprintln!("error: {}", e.user_friendly_message());
    eprintln!("hint: {}", e.recovery_suggestion());
    std::process::exit(e.exit_code());
}

fn display_config_summary(config: &ProjectConfig, args: &CliArgs) {
    let workspace = config.workspace();
    println!("Configuration Summary:");
    println!("  Repository: {}", config.git_repo_url());
    println!("  C file: {}", config.unittest_c_file());
    println!("  Header: {}", config.unittest_header_file());
    match config.template_file() {
        Some(path) => println!("  Template: {}", path.display()),
        None => println!("  Template: bundled cffi harness"),
    }
    println!("  Workspace: {}", workspace.root().display());
    println!("  Report: {}", workspace.report_path().display());
    println!("  Test command: {}", config.test_command().join(" "));
    println!("  Tool timeout: {}s", config.tool_timeout().as_secs());

    if args.dry_run {
        println!("  DRY RUN MODE ENABLED");
    }

    println!();
}
