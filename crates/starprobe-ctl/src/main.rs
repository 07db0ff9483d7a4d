//! starprobe-ctl — command-line speed test client for the starprobe daemon.

mod cmd;

use anyhow::{Context, Result};

use cmd::http::Target;
use cmd::speed::DEFAULT_TRANSFER_BYTES;

const DEFAULT_PORT: u16 = 9100;
const DEFAULT_HOST: &str = "127.0.0.1";

fn print_usage() {
    println!("Usage: starprobe-ctl [options] <command>");
    println!();
    println!("Commands:");
    println!("  ping              Sample round-trip latency");
    println!("  download [size]   Measure download throughput (bytes)");
    println!("  upload [size]     Measure upload throughput (bytes)");
    println!("  network           Show the detected network provider");
    println!("  run               Full test: ping, download, upload, provider");
    println!();
    println!("Options:");
    println!("  --host <host>       Daemon host (default: {})", DEFAULT_HOST);
    println!("  --port <port>       Daemon port (default: {})", DEFAULT_PORT);
    println!("  --user <id>         User id sent as X-User-Id");
    println!("  --hardware <id>     Submit the `run` result against this hardware");
}

fn parse_size(raw: Option<&&str>) -> Result<u64> {
    match raw {
        Some(s) => s.parse().context("size must be a number of bytes"),
        None => Ok(DEFAULT_TRANSFER_BYTES),
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let mut target = Target {
        host: DEFAULT_HOST.to_string(),
        port: DEFAULT_PORT,
        user: None,
    };
    let mut hardware: Option<u64> = None;
    let mut remaining: Vec<&str> = Vec::new();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--port" => {
                i += 1;
                target.port = args
                    .get(i)
                    .context("--port requires a value")?
                    .parse()
                    .context("--port must be a number")?;
            }
            "--host" => {
                i += 1;
                target.host = args.get(i).context("--host requires a value")?.clone();
            }
            "--user" => {
                i += 1;
                target.user = Some(
                    args.get(i)
                        .context("--user requires a value")?
                        .parse()
                        .context("--user must be a number")?,
                );
            }
            "--hardware" => {
                i += 1;
                hardware = Some(
                    args.get(i)
                        .context("--hardware requires a value")?
                        .parse()
                        .context("--hardware must be a number")?,
                );
            }
            other => remaining.push(other),
        }
        i += 1;
    }

    match remaining.as_slice() {
        ["ping"] => cmd::speed::cmd_ping(&target).await,
        ["download", rest @ ..] if rest.len() <= 1 => {
            cmd::speed::cmd_download(&target, parse_size(rest.first())?).await
        }
        ["upload", rest @ ..] if rest.len() <= 1 => {
            cmd::speed::cmd_upload(&target, parse_size(rest.first())?).await
        }
        ["network"] => cmd::network::cmd_network(&target).await,
        ["run"] | [] => cmd::speed::cmd_run(&target, DEFAULT_TRANSFER_BYTES, hardware).await,
        ["help"] | ["--help"] | ["-h"] => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {}", other.join(" "));
            print_usage();
            std::process::exit(1);
        }
    }
}
