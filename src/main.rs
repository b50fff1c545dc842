//! docvars CLI - extract and resolve template variables

use clap::{Parser, Subcommand};
use colored::Colorize;

use docvars::{DataSourceConfig, DocvarsError, FixSuggestion, TemplateProcessor};

#[derive(Parser)]
#[command(name = "docvars")]
#[command(about = "Template variable extraction and expression resolution")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract variables from a template and resolve their values
    Extract {
        /// Path to the template document
        template: String,

        /// Path to the backing data source config
        #[arg(short, long)]
        config: String,

        /// Output format: text or json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Validate a data source config file
    Check {
        /// Path to the config file
        config: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Extract {
            template,
            config,
            format,
        } => extract(&template, &config, &format),
        Commands::Check { config } => check(&config),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        let suggestion = e
            .downcast_ref::<DocvarsError>()
            .and_then(|err| err.fix_suggestion());
        if let Some(suggestion) = suggestion {
            eprintln!("  {} {}", "Fix:".yellow(), suggestion);
        }
        std::process::exit(1);
    }
}

fn extract(template: &str, config: &str, format: &str) -> anyhow::Result<()> {
    let processor = TemplateProcessor::new(config);
    let dsc = processor.static_var_extract(template)?;
    let ds = dsc.const_data_source();

    match format {
        "text" => {
            println!(
                "{} {} variable(s) from {}",
                "→".cyan(),
                ds.len(),
                template.cyan()
            );
            for holder in ds.vars() {
                let value = holder.fill_value(ds)?;
                println!("  {} = {}", holder.name().bold(), value);
            }
        }
        "json" => {
            let mut map = serde_json::Map::new();
            for holder in ds.vars() {
                let value = holder.fill_value(ds)?;
                map.insert(
                    holder.name().to_string(),
                    serde_json::Value::String(value.to_string()),
                );
            }
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::Value::Object(map))?
            );
        }
        other => anyhow::bail!("unknown format '{}' (expected text or json)", other),
    }

    Ok(())
}

fn check(config: &str) -> anyhow::Result<()> {
    let dsc = DataSourceConfig::new_instance(config)?;
    let var_count: usize = dsc.data_sources().iter().map(|ds| ds.len()).sum();
    println!(
        "{} {} valid: {} source(s), {} variable(s)",
        "✓".green(),
        dsc.filename().bold(),
        dsc.data_sources().len(),
        var_count
    );
    Ok(())
}
