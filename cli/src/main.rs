use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use pixelport::{Backoff, Client, ClientConfig, ClientError, Payload, ReconnectPolicy, StreamEvent};
use pon::{ParseOptions, Pon, PonError};
use tokio::io::AsyncReadExt;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("invalid pon: {0}")]
    Pon(#[from] PonError),
    #[error("failed to read stdin: {0}")]
    Stdin(#[from] std::io::Error),
    #[error("json render failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("timed out after {0} ms")]
    Timeout(u64),
}

#[derive(Parser, Debug)]
#[command(name = "pixelport", about = "Send Pon requests and subscriptions over the pixelport socket")]
struct Cli {
    #[arg(long, env = "PIXELPORT_ADDR", default_value = pixelport::config::DEFAULT_ADDRESS)]
    addr: String,

    #[arg(long, value_enum, help = "Reconnect policy; defaults to PIXELPORT_RECONNECT")]
    reconnect: Option<ReconnectMode>,

    #[arg(long, default_value_t = false, help = "Print results as JSON")]
    json: bool,

    #[arg(long, default_value_t = false, help = "Break long maps and arrays over lines")]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ReconnectMode {
    Off,
    Fixed,
    Exponential,
}

impl ReconnectMode {
    fn as_str(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Fixed => "fixed",
            Self::Exponential => "exponential",
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Send one request and print the response body.
    Request(RequestArgs),
    /// Open a stream and print each message.
    Subscribe(SubscribeArgs),
    /// Parse Pon locally and print it back in canonical form.
    Parse(ParseArgs),
}

#[derive(Args, Debug)]
struct RequestArgs {
    #[arg(help = "Pon payload, or - for stdin")]
    payload: String,

    #[arg(long, default_value_t = false, help = "Send the payload without validating it")]
    raw: bool,

    #[arg(long, default_value_t = 10_000)]
    timeout_ms: u64,
}

#[derive(Args, Debug)]
struct SubscribeArgs {
    #[arg(help = "Pon payload, or - for stdin")]
    payload: String,

    #[arg(long, default_value_t = false, help = "Send the payload without validating it")]
    raw: bool,

    #[arg(long, help = "Close the stream after this many messages")]
    count: Option<usize>,
}

#[derive(Args, Debug)]
struct ParseArgs {
    #[arg(help = "Pon text, or - for stdin")]
    input: String,

    #[arg(long, default_value_t = false, help = "Accept bare words as strings")]
    legacy: bool,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output = Output { json: cli.json, pretty: cli.pretty };

    match cli.command {
        Command::Parse(args) => run_parse(output, args).await,
        Command::Request(args) => {
            let client = connect(&cli.addr, cli.reconnect).await?;
            let result = run_request(&client, output, args).await;
            client.shutdown().await;
            result
        }
        Command::Subscribe(args) => {
            let client = connect(&cli.addr, cli.reconnect).await?;
            let result = run_subscribe(&client, output, args).await;
            client.shutdown().await;
            result
        }
    }
}

async fn connect(addr: &str, reconnect: Option<ReconnectMode>) -> Result<Client, CliError> {
    let config = client_config(addr, reconnect)?;
    debug!(address = %config.address, reconnect = ?config.reconnect, "cli: connecting");
    let client = Client::connect(config).await?;
    info!(address = %addr, "cli: connected");
    Ok(client)
}

fn client_config(addr: &str, reconnect: Option<ReconnectMode>) -> Result<ClientConfig, CliError> {
    let mut config = ClientConfig::from_env()?.with_address(addr);
    let Some(mode) = reconnect else {
        return Ok(config);
    };

    // Keep timings from the environment when it already enabled reconnects.
    let mut base = Duration::from_millis(pixelport::config::DEFAULT_RECONNECT_BASE_MS);
    let mut max = Duration::from_millis(pixelport::config::DEFAULT_RECONNECT_MAX_MS);
    let mut max_retries = None;
    if let ReconnectPolicy::Enabled { max_retries: retries, backoff } = config.reconnect {
        max_retries = retries;
        match backoff {
            Backoff::Fixed(delay) => base = delay,
            Backoff::Exponential { base: b, max: m } => (base, max) = (b, m),
        }
    }
    config.reconnect = pixelport::config::parse_reconnect_mode(Some(mode.as_str()), max_retries, base, max)?;
    Ok(config)
}

async fn run_request(client: &Client, output: Output, args: RequestArgs) -> Result<(), CliError> {
    let payload = payload(read_input(&args.payload).await?, args.raw)?;
    let reply = tokio::time::timeout(Duration::from_millis(args.timeout_ms), client.request(payload))
        .await
        .map_err(|_| CliError::Timeout(args.timeout_ms))??;
    output.print(&reply)
}

async fn run_subscribe(client: &Client, output: Output, args: SubscribeArgs) -> Result<(), CliError> {
    let payload = payload(read_input(&args.payload).await?, args.raw)?;
    let mut subscription = client.subscribe(payload)?;
    let mut received = 0_usize;

    loop {
        if args.count.is_some_and(|count| received >= count) {
            subscription.close().await?;
            break;
        }
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                eprintln!("interrupted after {received} messages");
                subscription.close().await?;
                break;
            }
            event = subscription.next() => match event {
                Some(StreamEvent::Message(body)) => {
                    output.print(&body)?;
                    received += 1;
                }
                Some(StreamEvent::Error(e)) => return Err(e.into()),
                Some(StreamEvent::Closed) | None => break,
            },
        }
    }
    Ok(())
}

async fn run_parse(output: Output, args: ParseArgs) -> Result<(), CliError> {
    let text = read_input(&args.input).await?;
    let options = if args.legacy { ParseOptions::legacy() } else { ParseOptions::default() };
    let value = pon::parse_with(&text, options)?;
    output.print(&value)
}

/// Validate `text` as Pon unless `raw` is set.
fn payload(text: String, raw: bool) -> Result<Payload, CliError> {
    if raw {
        return Ok(Payload::Text(text));
    }
    Ok(Payload::Pon(pon::parse(&text)?))
}

async fn read_input(arg: &str) -> Result<String, CliError> {
    if arg != "-" {
        return Ok(arg.to_owned());
    }
    let mut text = String::new();
    tokio::io::stdin().read_to_string(&mut text).await?;
    Ok(text)
}

#[derive(Debug, Clone, Copy)]
struct Output {
    json: bool,
    pretty: bool,
}

impl Output {
    fn render(self, value: &Pon) -> Result<String, CliError> {
        if self.json {
            let json = value.to_json();
            return Ok(if self.pretty { serde_json::to_string_pretty(&json)? } else { serde_json::to_string(&json)? });
        }
        Ok(if self.pretty { format!("{value:#}") } else { value.to_string() })
    }

    fn print(self, value: &Pon) -> Result<(), CliError> {
        println!("{}", self.render(value)?);
        Ok(())
    }
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;
