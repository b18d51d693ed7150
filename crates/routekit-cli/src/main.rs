//! routekit CLI - endpoint extraction, documentation and contract testing

mod storage;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use slog::{Drain, Logger, o, warn};

use routekit_core::render::render;
use routekit_core::{
    Config, DocFormat, Endpoint, FrameworkSelector, LogLevel, RouteExtractor, TestReport,
    load_endpoints, load_host, save_endpoints,
};
use routekit_runner::{SyntheticRequest, TestRunner, plan};

#[derive(Parser)]
#[command(name = "routekit")]
#[command(about = "Generate endpoint docs and contract tests from a web application's routes")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (default: .routekit.toml, .routekit.json or routekit.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Minimum log level: debug, info, warn, error (overrides config)
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,

    /// More log output; repeat for more
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract an endpoint list from a host introspection snapshot
    Extract {
        /// Host snapshot, JSON or YAML (default: [source].host)
        #[arg(long)]
        host: Option<PathBuf>,

        /// auto, express, koa, fastify, nestjs or openapi (default: [source].framework)
        #[arg(short, long)]
        framework: Option<FrameworkSelector>,

        /// Output file (default: endpoints from config)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Run contract tests against a live service
    Test {
        /// Endpoint list (default: endpoints from config)
        #[arg(short, long)]
        endpoints: Option<PathBuf>,

        /// Base URL of the service under test
        #[arg(long)]
        base_url: Option<String>,

        /// Per-request timeout in milliseconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Validate response bodies against declared schemas
        #[arg(long)]
        validate_schema: bool,

        /// Print the requests that would be sent, without sending them
        #[arg(long)]
        dry_run: bool,

        /// Output format
        #[arg(long, default_value = "terminal")]
        output: OutputFormat,

        /// Do not persist the run report
        #[arg(long)]
        no_save: bool,
    },

    /// Render endpoint documentation
    Docs {
        /// Endpoint list (default: endpoints from config)
        #[arg(short, long)]
        endpoints: Option<PathBuf>,

        /// markdown, html or json
        #[arg(short, long, default_value = "markdown")]
        format: DocFormat,

        /// Output file (default: stdout)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Document title (default: [docs].title)
        #[arg(long)]
        title: Option<String>,
    },

    /// Initialize config file
    Init,

    /// Export JSON Schema for the endpoint list format
    Schema,
}

#[derive(Clone, Copy, ValueEnum, PartialEq, Eq)]
enum OutputFormat {
    Terminal,
    Json,
    Silent,
}

const CONFIG_FILE: &str = ".routekit.toml";

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(3)
        }
    }
}

fn build_logger(level: LogLevel) -> Logger {
    let decorator = slog_term::TermDecorator::new().stderr().build();
    let drain = slog_term::CompactFormat::new(decorator).build().fuse();
    let drain = slog::LevelFilter::new(drain, level.to_slog()).fuse();
    let drain = slog_async::Async::new(drain).build().fuse();

    Logger::root(Arc::new(drain), o!())
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(p) => Config::load(p).with_context(|| format!("loading {}", p.display())),
        None => Ok(Config::load_default()?),
    }
}

fn run(cli: Cli) -> Result<u8> {
    // `init` and `schema` need neither config nor logger
    match cli.command {
        Commands::Init => return init(),
        Commands::Schema => {
            println!("{}", routekit_core::schema::generate_schema()?);
            return Ok(0);
        }
        _ => {}
    }

    let cfg = load_config(cli.config.as_deref())?;
    let level = cli.log_level.unwrap_or(cfg.log_level).raised_by(cli.verbose);
    let logger = build_logger(level);

    match cli.command {
        Commands::Extract {
            host,
            framework,
            out,
        } => {
            let source = cfg.source.as_ref();
            let Some(host) = host.or_else(|| source.map(|s| s.host.clone())) else {
                bail!("no host snapshot given; pass --host or set [source].host in {CONFIG_FILE}");
            };
            let selector = framework
                .or_else(|| source.map(|s| s.framework))
                .unwrap_or_default();
            let out = out.unwrap_or_else(|| cfg.endpoints.clone());

            let snapshot = load_host(&host)?;
            let extractor = RouteExtractor::new().with_logger(logger.clone());
            let endpoints = extractor.extract(&snapshot, selector);
            if endpoints.is_empty() {
                warn!(logger, "No routes found"; "host" => %host.display(), "framework" => %String::from(selector));
            }

            save_endpoints(&out, &endpoints)?;
            eprintln!("Extracted {} endpoints -> {}", endpoints.len(), out.display());
            Ok(0)
        }

        Commands::Test {
            endpoints,
            base_url,
            timeout,
            validate_schema,
            dry_run,
            output,
            no_save,
        } => {
            let mut cfg = cfg;
            if let Some(url) = base_url {
                cfg.test.base_url = url;
            }
            if let Some(ms) = timeout {
                cfg.test.timeout = Some(ms);
            }
            if validate_schema {
                cfg.test.validate_schema = true;
            }

            let endpoints_file = endpoints.unwrap_or_else(|| cfg.endpoints.clone());
            let eps = load_endpoints(&endpoints_file)?;
            if eps.is_empty() {
                eprintln!(
                    "Error: No endpoints in {}. Run `routekit extract` first.",
                    endpoints_file.display()
                );
                return Ok(3);
            }

            if dry_run {
                print_plan(&eps, &plan(&eps, &cfg.test), output)?;
                return Ok(0);
            }

            let runner = TestRunner::new(cfg.test.clone())?.with_logger(logger.clone());

            if output != OutputFormat::Silent {
                eprintln!("Config:");
                eprintln!("  endpoints: {} ({})", endpoints_file.display(), eps.len());
                eprintln!("  base_url:  {}", cfg.test.base_url);
                eprintln!("  timeout:   {}ms", cfg.test.timeout_ms());
                if !cfg.test.headers.is_empty() {
                    eprintln!("  headers:   {} configured", cfg.test.headers.len());
                }
                if cfg.test.validate_schema {
                    eprintln!("  schema:    validating responses");
                }
                eprintln!();
            }

            let start = Instant::now();
            let report = runner.run(&eps);
            let duration_secs = start.elapsed().as_secs_f64();

            match output {
                OutputFormat::Terminal => print_report(&report),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
                OutputFormat::Silent => {}
            }

            if !no_save {
                let record = storage::RunRecord {
                    config: &cfg,
                    report: &report,
                    endpoints_file: &endpoints_file,
                    duration_secs,
                };
                match storage::save_report(&record, &cfg.report_dir()) {
                    Ok(path) => {
                        if output != OutputFormat::Silent {
                            eprintln!("Report saved: {}", path.display());
                        }
                    }
                    Err(e) => eprintln!("Warning: failed to save report: {e}"),
                }
            }

            Ok(u8::from(!report.all_passed()))
        }

        Commands::Docs {
            endpoints,
            format,
            out,
            title,
        } => {
            let endpoints_file = endpoints.unwrap_or_else(|| cfg.endpoints.clone());
            let eps = load_endpoints(&endpoints_file)?;
            let mut info = cfg.docs.clone();
            if let Some(t) = title {
                info.title = t;
            }
            if info.base_url.is_none() {
                info.base_url = Some(cfg.test.base_url.clone());
            }

            let text = render(&eps, &info, format);
            match out {
                Some(path) => {
                    std::fs::write(&path, text)
                        .with_context(|| format!("writing {}", path.display()))?;
                    eprintln!("Documented {} endpoints ({format}) -> {}", eps.len(), path.display());
                }
                None => print!("{text}"),
            }
            Ok(0)
        }

        // handled before the config is loaded
        Commands::Init | Commands::Schema => Ok(0),
    }
}

fn init() -> Result<u8> {
    if Path::new(CONFIG_FILE).exists() {
        eprintln!("{CONFIG_FILE} already exists");
        return Ok(1);
    }

    std::fs::write(CONFIG_FILE, Config::example())?;
    println!("Created {CONFIG_FILE}");
    println!("\nEdit the file to configure:");
    println!("  - [source]: host snapshot for `routekit extract`");
    println!("  - [test] base_url: service to test");
    println!("  - [test.headers]: auth tokens, API keys");
    println!("  - [test.param_values]: entity IDs and body fields");
    Ok(0)
}

fn print_plan(
    eps: &[Endpoint],
    requests: &[SyntheticRequest],
    output: OutputFormat,
) -> Result<()> {
    match output {
        OutputFormat::Terminal => {
            for (ep, req) in eps.iter().zip(requests) {
                println!("{}", req.to_http(Some(&ep.label())));
            }
        }
        OutputFormat::Json => {
            let items: Vec<serde_json::Value> = eps
                .iter()
                .zip(requests)
                .map(|(ep, req)| {
                    serde_json::json!({
                        "endpoint": ep.label(),
                        "method": req.method,
                        "url": req.url,
                        "headers": req.headers,
                        "body": req.body,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&items)?);
        }
        OutputFormat::Silent => {}
    }
    Ok(())
}

fn print_report(report: &TestReport) {
    let icon = if report.all_passed() { "PASS" } else { "FAIL" };
    println!("\n{icon}: {report}");

    for r in &report.results {
        let status = r
            .status_code
            .map_or_else(|| "---".to_string(), |s| s.to_string());
        let mark = if r.success { "ok  " } else { "FAIL" };
        println!(
            "  [{mark}] {} -> {status} ({}ms)",
            r.endpoint.label(),
            r.response_time
        );
    }

    let failures: Vec<_> = report.failures().collect();
    if !failures.is_empty() {
        println!("\nFailures ({}):", failures.len());
        for f in failures {
            println!("  {}", f.endpoint.label());
            if let Some(msg) = f.error.as_deref() {
                println!("         {msg}");
            }
        }
    }
}
