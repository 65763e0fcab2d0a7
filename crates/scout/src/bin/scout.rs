// ABOUTME: CLI binary for shelf-scout.
// ABOUTME: Extracts product drafts from links or saved pages, parses quantities and runs the relay server.

use std::fs;
use std::io::{self, Write};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use shelf_scout::relay::{self, RelayState};
use shelf_scout::{format_quantity, parse_multiple_quantities, Client, Options, ProductDraft};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "scout")]
#[command(about = "Extract product metadata from shared commerce links")]
struct Cli {
    /// Log level used when RUST_LOG is not set
    #[arg(long = "log-level", global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch product links and print product drafts as JSON
    Extract {
        /// Product links to extract
        #[arg(required = true)]
        urls: Vec<String>,

        /// Relay endpoint tried before the proxies
        #[arg(long = "relay")]
        relay: Option<String>,

        /// Proxy URL template containing {url}; replaces the default proxies
        #[arg(long = "proxy")]
        proxies: Vec<String>,

        /// Skip the proxy step entirely
        #[arg(long = "no-proxies", conflicts_with = "proxies")]
        no_proxies: bool,

        /// Per-strategy timeout in seconds
        #[arg(long = "timeout", default_value_t = 8)]
        timeout: u64,

        /// Allow fetching from private/local networks
        #[arg(long = "allow-private-networks")]
        allow_private_networks: bool,

        /// Output file path (default: stdout)
        #[arg(short = 'o', long = "output")]
        output: Option<PathBuf>,

        /// Print elapsed time in ms to stderr
        #[arg(long = "timing")]
        timing: bool,
    },

    /// Extract metadata from a saved HTML page
    Parse {
        /// HTML file to parse
        #[arg(long = "html")]
        html: PathBuf,

        /// URL the page was saved from
        #[arg(long = "url")]
        url: String,
    },

    /// Print the quantities found in a product title
    Quantity {
        /// Product title
        text: String,
    },

    /// Run the relay server
    Relay {
        /// Address to listen on
        #[arg(long = "bind", default_value = "127.0.0.1:3000")]
        bind: SocketAddr,

        /// Allow the relay to fetch from private/local networks
        #[arg(long = "allow-private-networks")]
        allow_private_networks: bool,
    },
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("error encoding JSON: {}", e))
}

#[allow(clippy::too_many_arguments)]
async fn run_extract(
    urls: &[String],
    relay: Option<String>,
    proxies: Vec<String>,
    no_proxies: bool,
    timeout: u64,
    allow_private_networks: bool,
    output: Option<PathBuf>,
    timing: bool,
) -> ExitCode {
    let mut builder = Client::builder()
        .timeout(Duration::from_secs(timeout))
        .allow_private_networks(allow_private_networks);
    if let Some(endpoint) = relay {
        builder = builder.relay_endpoint(endpoint);
    }
    if no_proxies {
        builder = builder.proxies(Vec::<String>::new());
    } else if !proxies.is_empty() {
        builder = builder.proxies(proxies);
    }
    let client = builder.build();

    let start = Instant::now();
    let mut drafts: Vec<ProductDraft> = Vec::new();
    let mut had_error = false;

    for url in urls {
        match client.prepare_product(url).await {
            Ok(draft) => drafts.push(draft),
            Err(e) => {
                eprintln!("error extracting {}: {} ({})", url, e.user_message(), e);
                had_error = true;
            }
        }
    }

    let elapsed = start.elapsed();

    if !drafts.is_empty() {
        let encoded = if drafts.len() == 1 {
            to_json(&drafts[0])
        } else {
            to_json(&drafts)
        };
        match encoded {
            Ok(out) => {
                if let Some(path) = &output {
                    if let Err(e) = fs::write(path, &out) {
                        eprintln!("error writing to {:?}: {}", path, e);
                        had_error = true;
                    }
                } else {
                    println!("{}", out);
                }
            }
            Err(msg) => {
                eprintln!("{}", msg);
                had_error = true;
            }
        }
    }

    if timing {
        let _ = writeln!(io::stderr(), "elapsed: {}ms", elapsed.as_millis());
    }

    if had_error {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}

fn run_parse(html_path: &Path, url: &str) -> ExitCode {
    let html = match fs::read_to_string(html_path) {
        Ok(html) => html,
        Err(e) => {
            eprintln!("error reading file {:?}: {}", html_path, e);
            return ExitCode::from(1);
        }
    };

    let client = Client::new(Options::default());
    let meta = match client.extract_html(&html, url) {
        Ok(meta) => meta,
        Err(e) => {
            eprintln!("error parsing HTML: {}", e);
            return ExitCode::from(1);
        }
    };

    for message in meta.validate().errors() {
        eprintln!("warning: {}", message);
    }

    match to_json(&meta) {
        Ok(out) => {
            println!("{}", out);
            ExitCode::SUCCESS
        }
        Err(msg) => {
            eprintln!("{}", msg);
            ExitCode::from(1)
        }
    }
}

fn run_quantity(text: &str) -> ExitCode {
    let quantities = parse_multiple_quantities(text);
    if quantities.is_empty() {
        eprintln!("no quantity found in {:?}", text);
        return ExitCode::from(1);
    }
    for q in &quantities {
        println!("{}", format_quantity(q.quantity, &q.unit));
    }
    ExitCode::SUCCESS
}

async fn run_relay(bind: SocketAddr, allow_private_networks: bool) -> ExitCode {
    let opts = Options {
        allow_private_networks,
        ..Options::default()
    };
    match relay::serve(bind, RelayState::new(&opts)).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("relay error: {}", e);
            ExitCode::from(1)
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match cli.command {
        Command::Extract {
            urls,
            relay,
            proxies,
            no_proxies,
            timeout,
            allow_private_networks,
            output,
            timing,
        } => {
            run_extract(
                &urls,
                relay,
                proxies,
                no_proxies,
                timeout,
                allow_private_networks,
                output,
                timing,
            )
            .await
        }
        Command::Parse { html, url } => run_parse(&html, &url),
        Command::Quantity { text } => run_quantity(&text),
        Command::Relay {
            bind,
            allow_private_networks,
        } => run_relay(bind, allow_private_networks).await,
    }
}
