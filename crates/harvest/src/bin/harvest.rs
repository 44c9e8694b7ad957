// ABOUTME: CLI binary for the harvest extraction pipeline.
// ABOUTME: Extracts URLs (or a saved HTML file) and prints the content or the full JSON results.

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::Parser;
use digests_harvest::{ExtractionResult, Harvester};

#[derive(Parser, Debug)]
#[command(name = "harvest")]
#[command(about = "Extract readable article content from web pages")]
struct Args {
    /// Print results as JSON instead of raw content
    #[arg(long = "json")]
    json_output: bool,

    /// Single-line JSON (with --json)
    #[arg(long = "compact")]
    compact: bool,

    /// Never launch a headless browser
    #[arg(long = "no-render")]
    no_render: bool,

    /// Pause between URLs in milliseconds
    #[arg(long = "delay-ms", default_value_t = 1000)]
    delay_ms: u64,

    /// Static fetch timeout in seconds
    #[arg(long = "timeout-secs", default_value_t = 30)]
    timeout_secs: u64,

    /// HTML file to extract (requires --url)
    #[arg(long = "html")]
    html: Option<PathBuf>,

    /// URL context for HTML file extraction (required with --html)
    #[arg(long = "url")]
    url: Option<String>,

    /// Print elapsed time in ms to stderr
    #[arg(long = "timing")]
    timing: bool,

    /// URLs to extract
    #[arg()]
    urls: Vec<String>,
}

fn format_output(results: &[ExtractionResult], json_output: bool, compact: bool) -> String {
    if json_output {
        let rendered = match (results.len() == 1, compact) {
            (true, true) => serde_json::to_string(&results[0]),
            (true, false) => serde_json::to_string_pretty(&results[0]),
            (false, true) => serde_json::to_string(results),
            (false, false) => serde_json::to_string_pretty(results),
        };
        return rendered.unwrap_or_else(|e| format!("{{\"error\":\"{}\"}}", e));
    }
    results
        .iter()
        .filter(|r| r.success)
        .map(|r| r.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    if args.html.is_some() && args.url.is_none() {
        eprintln!("error: --url is required when using --html");
        return ExitCode::from(1);
    }
    if args.html.is_none() && args.urls.is_empty() {
        eprintln!("error: at least one URL is required, or use --html with --url");
        return ExitCode::from(1);
    }
    if args.html.is_some() && !args.urls.is_empty() {
        eprintln!("error: cannot use both --html and positional URLs");
        return ExitCode::from(1);
    }

    let harvester = match Harvester::builder()
        .render(!args.no_render)
        .politeness_delay(Duration::from_millis(args.delay_ms))
        .timeout(Duration::from_secs(args.timeout_secs))
        .build()
    {
        Ok(h) => h,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::from(1);
        }
    };

    let start = Instant::now();
    let results = match (&args.html, &args.url) {
        (Some(path), Some(url)) => match fs::read_to_string(path) {
            Ok(html) => vec![harvester.extract_html(&html, url)],
            Err(e) => {
                eprintln!("error reading file {:?}: {}", path, e);
                return ExitCode::from(1);
            }
        },
        _ => harvester.extract_many(&args.urls).await,
    };
    let elapsed = start.elapsed();

    for failed in results.iter().filter(|r| !r.success) {
        eprintln!("error extracting {}: {}", failed.url, failed.error_message());
    }
    println!("{}", format_output(&results, args.json_output, args.compact));

    if args.timing {
        let _ = writeln!(io::stderr(), "elapsed: {}ms", elapsed.as_millis());
    }

    if results.iter().all(|r| r.success) {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}
