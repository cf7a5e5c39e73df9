use clap::Parser;
use pdf_outline::utils::logger;
use pdf_outline::{CliConfig, LocalStorage, OutlineEngine, OutlinePipeline, Settings};

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    if cli.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting pdf-outline");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let settings = match Settings::resolve(&cli) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(e.exit_code());
        }
    };

    tracing::info!(
        "📁 Input: {}  Output: {}",
        settings.input_dir.display(),
        settings.output_dir.display()
    );

    let pipeline = OutlinePipeline::new(
        LocalStorage::new(&settings.input_dir),
        LocalStorage::new(&settings.output_dir),
        settings.clone(),
    );
    let engine = OutlineEngine::new_with_monitoring(
        pipeline,
        LocalStorage::new(&settings.input_dir),
        &settings,
        settings.monitor,
    );

    match engine.run().await {
        Ok(summary) if summary.is_success() => {
            tracing::info!("✅ Processing completed successfully!");
            println!(
                "✅ Wrote {} outlines in {:.2}s",
                summary.processed.len(),
                summary.elapsed.as_secs_f64()
            );
        }
        Ok(summary) => {
            for (name, message) in &summary.failed {
                eprintln!("❌ {}: {}", name, message);
            }
            eprintln!(
                "⚠️ {} of {} documents failed",
                summary.failed.len(),
                summary.failed.len() + summary.processed.len()
            );
            std::process::exit(2);
        }
        Err(e) => {
            tracing::error!(
                "❌ Processing failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

            let exit_code = e.exit_code();
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }
}
