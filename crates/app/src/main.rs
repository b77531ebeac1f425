//! bits: decode, evaluate and re-encode BITS transmissions.
//!
//! Reads one hexadecimal transmission per line (or generates samples), then
//! prints the version sum and value of each. A transmission that fails to
//! decode is reported and skipped; the rest of the batch still runs.

mod config;
mod input_gen;

use std::process::ExitCode;

use bits_core::{
    bitio::to_hex, decode_transmission, encode_with, evaluate, explain, render,
    version_sum, LengthPolicy, Packet, PacketStats, Result, Transmission,
};
use config::Config;
use tracing::{debug, info, warn};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = match Config::from_args(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            eprintln!("run with --help for usage");
            return ExitCode::from(2);
        }
    };

    if config.print_config {
        config.print();
    }

    let transmissions = match load_transmissions(&config) {
        Ok(lines) => lines,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut failed = 0;
    for (index, hex) in transmissions.iter().enumerate() {
        let line = index + 1;
        if let Err(e) = process(&config, line, hex) {
            warn!(line, error = %e, "skipping transmission");
            println!("[{line}] error: {e}");
            failed += 1;
        }
    }

    println!();
    println!(
        "{} transmissions: {} decoded, {} failed",
        transmissions.len(),
        transmissions.len() - failed,
        failed
    );

    if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Non-empty, trimmed lines of the input file, or freshly generated samples.
fn load_transmissions(config: &Config) -> Result<Vec<String>> {
    match &config.input_file {
        Some(path) if !config.generate => {
            let text = std::fs::read_to_string(path)?;
            let lines: Vec<String> = text
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect();
            info!(path = %path.display(), transmissions = lines.len(), "loaded input");
            Ok(lines)
        }
        _ => {
            info!(
                seed = config.seed,
                count = config.count,
                depth = config.gen_depth,
                "generating sample transmissions"
            );
            input_gen::generate_transmissions(config.seed, config.count, config.gen_depth)
        }
    }
}

fn process(config: &Config, line: usize, hex: &str) -> Result<()> {
    let transmission = decode_transmission(hex, config.limits)?;
    let packet = &transmission.packet;
    debug!(
        line,
        packet_bits = transmission.packet_bits,
        trailing_bits = transmission.trailing_bits(),
        "decoded"
    );

    println!("[{line}] {}", abbreviate(hex));
    println!("    version sum: {}", version_sum(packet));
    println!("    value: {}", evaluate(packet)?);

    if config.render {
        println!("    expression: {}", render(packet)?);
    }

    if config.explain {
        for row in explain(packet, config.policy)?.lines() {
            println!("    {row}");
        }
    }

    if config.stats {
        for row in PacketStats::collect(packet).to_string().lines() {
            println!("    {row}");
        }
    }

    if config.verify {
        println!("    verify: {}", verify(config, &transmission, hex)?);
    }

    Ok(())
}

/// Re-encode under the configured policy, decode again with the configured
/// limits and compare.
fn verify(config: &Config, transmission: &Transmission, hex: &str) -> Result<String> {
    let policy = config.policy;
    let packet = &transmission.packet;
    let bytes = encode_with(packet, policy)?;
    let reencoded = to_hex(&bytes);
    let reparsed: Packet = decode_transmission(&reencoded, config.limits)?.packet;

    if evaluate(&reparsed)? != evaluate(packet)? || version_sum(&reparsed) != version_sum(packet) {
        return Ok("MISMATCH (semantics differ)".to_string());
    }

    let original = hex.to_ascii_uppercase();
    let bit_exact = original.starts_with(&reencoded)
        && original[reencoded.len()..].chars().all(|c| c == '0');

    Ok(match (bit_exact, policy) {
        (true, _) => "ok (bit-exact)".to_string(),
        (false, LengthPolicy::Preserve) => {
            // Same framing but different bits: the source used non-minimal
            // literal groups or non-zero padding.
            format!("ok (semantic; re-encoded as {})", abbreviate(&reencoded))
        }
        (false, _) => "ok (semantic)".to_string(),
    })
}

fn abbreviate(hex: &str) -> String {
    const MAX: usize = 48;
    if hex.len() <= MAX {
        hex.to_string()
    } else {
        format!("{}... ({} digits)", &hex[..MAX], hex.len())
    }
}
