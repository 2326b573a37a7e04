use std::env;
use std::fs::{self, File};
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use scene_listener::config::{ListenerConfig, ListenerConfigOverrides};
use scene_listener::harness::{load_fixture, run_fixture_with_config, HarnessOutput};
use tracing_subscriber::EnvFilter;

fn main() {
    if let Err(err) = run_cli() {
        eprintln!("[listener-harness] error: {err:?}");
        std::process::exit(1);
    }
}

fn run_cli() -> Result<()> {
    let opts = parse_args()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&opts.log_level))
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &opts.config {
        Some(path) => ListenerConfig::load(path)?,
        None => ListenerConfig::default(),
    };
    if !opts.overrides.is_empty() {
        tracing::info!(fields = ?opts.overrides.applied_fields(), "applying CLI overrides");
        config.apply_overrides(&opts.overrides);
    }

    let fixture = load_fixture(&opts.fixture)?;
    let output = run_fixture_with_config(&fixture, &config)?;

    if let Some(path) = &opts.write_output {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating output directory '{}'", parent.display()))?;
            }
        }
        let file = File::create(path).with_context(|| format!("writing harness output to '{}'", path.display()))?;
        serde_json::to_writer_pretty(file, &output).with_context(|| "serializing harness output")?;
        println!("[listener-harness] wrote {}", path.display());
    }

    if let Some(path) = &opts.check_golden {
        let file = File::open(path).with_context(|| format!("opening golden file '{}'", path.display()))?;
        let expected: HarnessOutput = serde_json::from_reader(file).with_context(|| "parsing golden JSON")?;
        if expected != output {
            bail!(
                "golden mismatch for {} (use --write-output to refresh):\nexpected: {}\nactual:   {}",
                opts.fixture.display(),
                serde_json::to_string(&expected).unwrap_or_default(),
                serde_json::to_string(&output).unwrap_or_default(),
            );
        }
        println!("[listener-harness] matched golden {}", path.display());
    } else if opts.write_output.is_none() {
        serde_json::to_writer_pretty(std::io::stdout(), &output)?;
        println!();
    }

    Ok(())
}

struct CliOptions {
    fixture: PathBuf,
    config: Option<PathBuf>,
    write_output: Option<PathBuf>,
    check_golden: Option<PathBuf>,
    log_level: String,
    overrides: ListenerConfigOverrides,
}

fn parse_args() -> Result<CliOptions> {
    let mut fixture = None;
    let mut config = None;
    let mut write_output = None;
    let mut check_golden = None;
    let mut log_level = "info".to_string();
    let mut overrides = ListenerConfigOverrides::default();
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--fixture" | "-f" => fixture = args.next().map(PathBuf::from),
            "--config" | "-c" => config = args.next().map(PathBuf::from),
            "--write-output" | "-o" => write_output = args.next().map(PathBuf::from),
            "--golden" | "-g" => check_golden = args.next().map(PathBuf::from),
            "--log-level" => {
                log_level = args.next().ok_or_else(|| anyhow!("Expected a value after '--log-level'"))?;
            }
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            flag if ListenerConfigOverrides::FLAGS.contains(&flag) => {
                let value = args.next().ok_or_else(|| anyhow!("Expected a value after '{flag}'"))?;
                overrides.apply_flag(flag, &value)?;
            }
            other => {
                return Err(anyhow!("unknown argument '{other}'"));
            }
        }
    }
    let Some(fixture) = fixture else { return Err(anyhow!("--fixture <path> is required")) };
    Ok(CliOptions { fixture, config, write_output, check_golden, log_level, overrides })
}

fn print_help() {
    println!("Usage: listener_harness --fixture <path> [--config <path>] [--golden <path>] [--write-output <path>]");
    println!("  -f, --fixture              Path to a harness fixture JSON file");
    println!("  -c, --config               Optional listener config JSON");
    println!("  -g, --golden               Optional golden output file to compare against");
    println!("  -o, --write-output         Optional path to write the actual output JSON");
    println!("      --log-level            Tracing filter, e.g. debug or scene_listener=trace (default info)");
    println!("      --prewarm-records      Override pool.prewarm_records");
    println!("      --prewarm-collections  Override pool.prewarm_collections");
    println!("      --log-dispatch         Override dispatch.log_dispatch (on/off)");
}
