use std::path::PathBuf;

use pagegrab_engine::config::load_config;
use pagegrab_engine::scrape::Scraper;
use tracing_subscriber::EnvFilter;

enum Command {
    Scrape(String),
    List(String),
    Videos(String),
}

fn main() -> Result<(), String> {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args.iter().any(|a| a == "-h" || a == "--help") {
        print_help();
        return Ok(());
    }

    let mut store_dir: Option<PathBuf> = None;
    let mut config_path: Option<PathBuf> = None;
    let mut command: Option<Command> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--store-dir" => {
                i += 1;
                let v = args
                    .get(i)
                    .ok_or_else(|| "--store-dir requires a value".to_string())?;
                store_dir = Some(PathBuf::from(v));
            }
            "--config" => {
                i += 1;
                let v = args
                    .get(i)
                    .ok_or_else(|| "--config requires a value".to_string())?;
                config_path = Some(PathBuf::from(v));
            }
            verb @ ("scrape" | "list" | "videos") if command.is_none() => {
                i += 1;
                let v = args
                    .get(i)
                    .ok_or_else(|| format!("{verb} requires a value"))?
                    .to_string();
                command = Some(match verb {
                    "scrape" => Command::Scrape(v),
                    "list" => Command::List(v),
                    _ => Command::Videos(v),
                });
            }
            other => return Err(format!("unknown arg: {other} (try --help)")),
        }
        i += 1;
    }

    let command = command.ok_or_else(|| "nothing to do (try --help)".to_string())?;

    init_tracing();

    let config_path = config_path.or_else(|| env_path("PAGEGRAB_CONFIG"));
    let mut config = match config_path {
        Some(path) => load_config(&path).map_err(|e| e.to_string())?,
        None => Default::default(),
    };
    if let Some(dir) = store_dir.or_else(|| env_path("PAGEGRAB_STORE_DIR")) {
        config.store_root = dir;
    }

    let scraper = Scraper::from_config(config);
    let output = match command {
        Command::Scrape(url) => {
            let response = scraper.scrape(&url).map_err(|e| e.to_string())?;
            serde_json::to_value(response)
        }
        Command::List(identity) => {
            let listing = scraper
                .list_downloads(&identity)
                .map_err(|e| e.to_string())?;
            serde_json::to_value(listing)
        }
        Command::Videos(url) => {
            let stub = scraper.scrape_videos(&url);
            Ok(serde_json::json!({ "message": stub.message() }))
        }
    }
    .map_err(|e| e.to_string())?;

    let pretty = serde_json::to_string_pretty(&output).map_err(|e| e.to_string())?;
    println!("{pretty}");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn env_path(key: &str) -> Option<PathBuf> {
    let v = std::env::var(key).ok()?;
    let t = v.trim();
    if t.is_empty() {
        return None;
    }
    Some(PathBuf::from(t))
}

fn print_help() {
    println!(
        r#"pagegrab

Downloads the images linked from a web page into a per-page store directory.

Usage:
  pagegrab scrape <page-url>
  pagegrab list <identity>
  pagegrab videos <page-url>

Options:
  --store-dir <path>   Store root (default: ./downloads, env PAGEGRAB_STORE_DIR)
  --config <path>      JSON config file (env PAGEGRAB_CONFIG)

Log verbosity follows RUST_LOG (default: info). Logs go to stderr, results to stdout.
"#
    );
}
