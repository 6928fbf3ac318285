//! livecalc - live `{expression}` placeholders for rich-text documents

mod config;
mod default_functions;
mod error;
mod watch;

use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use livecalc_core::{BufferSurface, CycleOutcome, MathmlRenderer, RefreshController, RefreshOptions};
use livecalc_engine::engine::{ExpressionEvaluator, TableIndex, check_functions};

use config::Config;

fn print_usage() {
    eprintln!("Usage: livecalc [OPTIONS] [FILE]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  [FILE]                    Document to evaluate (HTML markup)");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -o, --output <FILE>       Write the evaluated document to FILE");
    eprintln!("  -c, --command <EXPR>      Evaluate one expression (against FILE's tables, if given)");
    eprintln!("  -w, --watch               Re-evaluate FILE in place whenever it changes");
    eprintln!("  -f, --functions <FILE>    Load custom Rhai functions (can be repeated)");
    eprintln!("  --config <FILE>           Read settings from FILE instead of livecalc.toml");
    eprintln!("  --no-default-functions    Do not load default.rhai from the config dir");
    eprintln!("  -h, --help                Print help");
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = env::args().collect();

    let mut file_path: Option<PathBuf> = None;
    let mut functions_files: Vec<PathBuf> = Vec::new();
    let mut output_file: Option<PathBuf> = None;
    let mut command: Option<String> = None;
    let mut config_file: Option<PathBuf> = None;
    let mut watch = false;
    let mut no_default_functions = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_usage();
                return;
            }
            "-f" | "--functions" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --functions requires a file path");
                    std::process::exit(1);
                }
                functions_files.push(PathBuf::from(&args[i]));
            }
            "-o" | "--output" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --output requires a file path");
                    std::process::exit(1);
                }
                output_file = Some(PathBuf::from(&args[i]));
            }
            "-c" | "--command" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --command requires an expression");
                    std::process::exit(1);
                }
                command = Some(args[i].to_string());
            }
            "--config" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --config requires a file path");
                    std::process::exit(1);
                }
                config_file = Some(PathBuf::from(&args[i]));
            }
            "-w" | "--watch" => watch = true,
            "--no-default-functions" => no_default_functions = true,
            arg if arg.starts_with('-') => {
                eprintln!("Error: Unknown option: {}", arg);
                print_usage();
                std::process::exit(1);
            }
            _ => {
                if file_path.is_none() {
                    file_path = Some(PathBuf::from(&args[i]));
                } else {
                    eprintln!("Error: Unexpected argument: {}", args[i]);
                    print_usage();
                    std::process::exit(1);
                }
            }
        }
        i += 1;
    }

    let config = match Config::load(config_file.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    // Config-listed files first, then the command line.
    let mut functions = config.functions.clone();
    functions.append(&mut functions_files);
    default_functions::prepend_default_functions_if_present(&mut functions, no_default_functions);
    let script = match default_functions::load_functions_script(&functions) {
        Ok(script) => script,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let options = config.refresh_options();
    let result = if let Some(expr) = command {
        run_command(&expr, file_path.as_deref(), &options, &script).map(|ok| {
            if !ok {
                std::process::exit(1);
            }
        })
    } else if let Some(path) = file_path {
        if watch {
            if output_file.is_some() {
                eprintln!("Error: --watch rewrites FILE in place and can not be combined with --output");
                std::process::exit(1);
            }
            watch::WatchSession::start(options, &script)
                .map_err(anyhow::Error::from)
                .and_then(|session| watch::run(&path, session))
        } else {
            render_file(&path, output_file.as_deref(), options, &script)
        }
    } else {
        print_usage();
        std::process::exit(1);
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

/// Evaluate one expression and print its rendering. Returns false when the
/// expression failed.
fn run_command(
    expr: &str,
    tables_from: Option<&Path>,
    options: &RefreshOptions,
    script: &str,
) -> anyhow::Result<bool> {
    let markup = match tables_from {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => String::new(),
    };
    let custom = (!script.trim().is_empty()).then_some(script);
    if let Some(custom) = custom {
        check_functions(custom).context("Error in custom functions")?;
    }

    let index = Arc::new(TableIndex::from_markup(&markup));
    let evaluator =
        ExpressionEvaluator::new(index, &MathmlRenderer, &options.eval).with_functions(custom);
    match evaluator.evaluate_expression(expr) {
        Ok(rendered) => {
            println!("{}", rendered);
            Ok(true)
        }
        Err(e) => {
            println!("{}", evaluator.error_marker(expr, &e));
            eprintln!("Error: {}", e);
            Ok(false)
        }
    }
}

/// Render every placeholder of `path` once.
fn render_file(
    path: &Path,
    output: Option<&Path>,
    options: RefreshOptions,
    script: &str,
) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let mut surface = BufferSurface::new(content);
    let mut controller = RefreshController::attach(&mut surface, options)?.with_functions(script)?;

    if let CycleOutcome::Applied(cycle) = controller.refresh_now(Instant::now(), &mut surface)
        && cycle.failures > 0
    {
        log::warn!(
            "{} of {} placeholders in {} failed",
            cycle.failures,
            cycle.placeholders,
            path.display()
        );
    }
    controller.teardown(&mut surface);

    match output {
        Some(out) => {
            std::fs::write(out, surface.content())
                .with_context(|| format!("Failed to write {}", out.display()))?;
            println!("Wrote {}", out.display());
        }
        None => print!("{}", surface.content()),
    }
    Ok(())
}
