//! Configuration for the bits command-line decoder.
//!
//! Handles parsing command-line arguments and generating sensible defaults
//! (including randomized defaults that are reproducible with a seed).
//!
//! # Philosophy
//!
//! The tool should work with ZERO arguments: without `--in` it generates a
//! handful of sample transmissions from a seed and decodes those. The seed is
//! printed with `--print-config` so any run can be repeated.

use bits_core::{DecodeLimits, Error, LengthPolicy, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::path::PathBuf;

/// Complete configuration for a decoding run.
#[derive(Debug, Clone)]
pub struct Config {
    // === Input ===
    /// Transmission file, one hex transmission per line (None = generate samples)
    pub input_file: Option<PathBuf>,

    /// Decode generated samples instead of a file (implied when `--in` is absent)
    pub generate: bool,

    // === Sample generation ===
    /// Seed for generated samples
    pub seed: u64,

    /// Number of transmissions to generate
    pub count: usize,

    /// Maximum nesting depth of generated packet trees
    pub gen_depth: usize,

    // === Codec ===
    /// Decoder resource ceilings
    pub limits: DecodeLimits,

    /// Length framing used when re-encoding
    pub policy: LengthPolicy,

    // === Output ===
    /// Print the expression with its value
    pub render: bool,

    /// Print the labelled bit layout
    pub explain: bool,

    /// Re-encode and check the round trip
    pub verify: bool,

    /// Print tree statistics
    pub stats: bool,

    /// Print the resolved configuration before running
    pub print_config: bool,
}

impl Config {
    /// Parse configuration from command-line arguments (program name excluded).
    ///
    /// If --seed is not given, a time-based seed is used for all randomness.
    pub fn from_args(args: &[String]) -> Result<Self> {
        let mut input_file: Option<PathBuf> = None;
        let mut generate = false;
        let mut seed: Option<u64> = None;
        let mut count: Option<usize> = None;
        let mut gen_depth: Option<usize> = None;
        let mut limits = DecodeLimits::default();
        let mut policy = LengthPolicy::Preserve;
        let mut render = false;
        let mut explain = false;
        let mut verify = false;
        let mut stats = false;
        let mut print_config = false;

        let mut args = args.iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--in" => input_file = Some(PathBuf::from(value(&mut args, arg)?)),
                "--generate" => generate = true,
                "--seed" => seed = Some(number(&mut args, arg)?),
                "--count" => count = Some(number(&mut args, arg)?),
                "--gen-depth" => gen_depth = Some(number(&mut args, arg)?),
                "--max-depth" => limits.max_depth = number(&mut args, arg)?,
                "--max-packets" => limits.max_packets = number(&mut args, arg)?,
                "--policy" => policy = parse_policy(value(&mut args, arg)?)?,
                "--render" => render = true,
                "--explain" => explain = true,
                "--verify" => verify = true,
                "--stats" => stats = true,
                "--print-config" => print_config = true,
                "--help" | "-h" => {
                    print_help();
                    std::process::exit(0);
                }
                other => return Err(Error::Config(format!("unknown argument: {other}"))),
            }
        }

        if generate && input_file.is_some() {
            return Err(Error::Config("--generate and --in are mutually exclusive".to_string()));
        }

        if limits.max_depth == 0 || limits.max_packets == 0 {
            return Err(Error::Config("decode limits must be at least 1".to_string()));
        }

        // Determine seed (explicit or time-based)
        let seed = seed.unwrap_or_else(|| {
            use std::time::{SystemTime, UNIX_EPOCH};
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|elapsed| elapsed.as_millis() as u64)
                .unwrap_or_default()
        });

        // Generate defaults using seed
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        Ok(Config {
            generate: input_file.is_none(),
            input_file,
            seed,
            count: count.unwrap_or_else(|| rng.gen_range(3..=8)),
            gen_depth: gen_depth.unwrap_or_else(|| rng.gen_range(2..=5)).max(1),
            limits,
            policy,
            render,
            explain,
            verify,
            stats,
            print_config,
        })
    }

    /// Print the configuration in human-readable form.
    pub fn print(&self) {
        println!("=== Configuration ===");
        match &self.input_file {
            Some(path) if !self.generate => println!("Input file: {}", path.display()),
            _ => {
                println!("Input file: (generate samples)");
                println!("Seed: {}", self.seed);
                println!("Samples: {}", self.count);
                println!("Sample depth: {}", self.gen_depth);
            }
        }
        println!();
        println!("=== Codec ===");
        println!("Max depth: {}", self.limits.max_depth);
        println!("Max packets: {}", self.limits.max_packets);
        println!("Re-encode policy: {}", policy_name(self.policy));
        println!();
    }
}

fn value<'a>(args: &mut impl Iterator<Item = &'a String>, flag: &str) -> Result<&'a str> {
    args.next()
        .map(String::as_str)
        .ok_or_else(|| Error::Config(format!("{flag} requires a value")))
}

fn number<'a, T: std::str::FromStr>(
    args: &mut impl Iterator<Item = &'a String>,
    flag: &str,
) -> Result<T> {
    let raw = value(args, flag)?;
    raw.parse()
        .map_err(|_| Error::Config(format!("invalid {}: {raw}", flag.trim_start_matches('-'))))
}

fn parse_policy(raw: &str) -> Result<LengthPolicy> {
    match raw {
        "preserve" => Ok(LengthPolicy::Preserve),
        "count" => Ok(LengthPolicy::AlwaysCount),
        "bits" => Ok(LengthPolicy::AlwaysTotalBits),
        other => Err(Error::Config(format!("invalid policy: {other}"))),
    }
}

pub fn policy_name(policy: LengthPolicy) -> &'static str {
    match policy {
        LengthPolicy::Preserve => "preserve",
        LengthPolicy::AlwaysCount => "count",
        LengthPolicy::AlwaysTotalBits => "bits",
    }
}

fn print_help() {
    println!("bits: decode and evaluate BITS hexadecimal transmissions");
    println!();
    println!("USAGE:");
    println!("    bits [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    --in <PATH>             Transmission file, one hex line each (default: generate samples)");
    println!("    --generate              Decode generated samples (default when --in is absent)");
    println!("    --seed <N>              Random seed for generated samples");
    println!("    --count <N>             Number of generated samples (default: random 3-8)");
    println!("    --gen-depth <N>         Nesting depth of generated samples (default: random 2-5)");
    println!();
    println!("    --max-depth <N>         Decoder nesting limit (default: 256)");
    println!("    --max-packets <N>       Decoder packet limit (default: 65536)");
    println!("    --policy <P>            Re-encode framing: preserve, count, bits (default: preserve)");
    println!();
    println!("    --render                Print the expression and its value");
    println!("    --explain               Print the labelled bit layout");
    println!("    --verify                Re-encode and check the round trip");
    println!("    --stats                 Print packet tree statistics");
    println!("    --print-config          Print resolved configuration");
    println!("    --help, -h              Print this help");
    println!();
    println!("EXAMPLES:");
    println!("    bits --in input.txt                 # Version sum and value per line");
    println!("    bits --seed 42 --render --verify    # Deterministic generated samples");
    println!("    RUST_LOG=debug bits --in input.txt  # Show decode details");
    println!();
}
