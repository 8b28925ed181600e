use anyhow::{Context, Result};
use clap::Parser;
use convergent::{
    anonymize,
    cli::{Cli, Command, OutputFormat},
    config::AnalysisConfig,
    dataset::{RawTables, Table},
    pipeline, report,
    simulate::{self, SimulationConfig},
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber; `--debug` turns on everything down to TRACE
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into())
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<AnalysisConfig> {
    match path {
        Some(path) => AnalysisConfig::from_toml_file(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(AnalysisConfig::default()),
    }
}

fn write_output(text: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => std::fs::write(path, text)
            .with_context(|| format!("Failed to write {}", path.display())),
        None => {
            print!("{}", text);
            Ok(())
        }
    }
}

fn run_analyze(
    participants: &Path,
    responses: &Path,
    fluency: &Path,
    config: Option<&Path>,
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<()> {
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        participants = %participants.display(),
        responses = %responses.display(),
        fluency = %fluency.display(),
        "analysis session"
    );

    let config = load_config(config)?;
    let raw = RawTables::from_paths(participants, responses, fluency)
        .context("Failed to read input tables")?;
    let summary = pipeline::analyze(&raw, &config).context("Analysis failed")?;

    let text = match format {
        OutputFormat::Text => report::render_text(&summary),
        OutputFormat::Json => report::render_json(&summary)?,
        OutputFormat::Csv => report::render_summary_csv(&summary)?,
    };
    write_output(&text, output)?;

    for failure in &summary.stage_failures {
        eprintln!("warning: {} failed: {}", failure.stage, failure.message);
    }
    Ok(())
}

fn run_simulate(out_dir: &Path, sim: &SimulationConfig) -> Result<()> {
    let tables = simulate::generate(sim, &AnalysisConfig::default())?;
    let written: Vec<PathBuf> = simulate::write_tables(&tables, out_dir)
        .with_context(|| format!("Failed to write tables to {}", out_dir.display()))?;
    for path in written {
        println!("{}", path.display());
    }
    Ok(())
}

fn run_anonymize(input: &Path, output: &Path, columns: &[String]) -> Result<()> {
    let table = Table::from_path("input", input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let columns: Vec<&str> = if columns.is_empty() {
        anonymize::DEFAULT_COLUMNS.to_vec()
    } else {
        columns.iter().map(String::as_str).collect()
    };

    let anonymised = anonymize::anonymize_columns(&table, &columns)?;
    let file = std::fs::File::create(output)
        .with_context(|| format!("Failed to create {}", output.display()))?;
    anonymised.write_csv(file)?;
    eprintln!(
        "Anonymised {} rows ({}) -> {}",
        anonymised.len(),
        columns.join(", "),
        output.display()
    );
    Ok(())
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.debug);

    match args.command {
        Command::Analyze {
            participants,
            responses,
            fluency,
            config,
            format,
            output,
        } => run_analyze(
            &participants,
            &responses,
            &fluency,
            config.as_deref(),
            format,
            output.as_deref(),
        ),
        Command::Simulate {
            out_dir,
            per_condition,
            trials,
            practice_trials,
            seed,
        } => {
            let sim = SimulationConfig {
                per_condition,
                test_trials: trials,
                practice_trials,
                seed,
                ..SimulationConfig::default()
            };
            run_simulate(&out_dir, &sim)
        }
        Command::Anonymize {
            input,
            output,
            columns,
        } => run_anonymize(&input, &output, &columns),
    }
}
