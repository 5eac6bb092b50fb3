use anyhow::{Context, Result};
use colored::Colorize;
use std::process::Command;
use std::time::Instant;

/// How much of the clock plan each configuration sweeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Level {
    /// First MCLK only (per-commit CI)
    Smoke,
    /// Every MCLK (nightly CI)
    Nightly,
}

const BIT_DEPTHS: [u8; 2] = [16, 32];

/// (input lines, output lines)
const LAYOUTS: [(u8, u8); 4] = [(4, 4), (1, 1), (4, 0), (0, 4)];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Case {
    bits: u8,
    num_in: u8,
    num_out: u8,
}

impl Case {
    fn label(&self) -> String {
        format!("{}b {}in/{}out", self.bits, self.num_in, self.num_out)
    }

    fn bench_args(&self, level: Level) -> Vec<String> {
        let mut args = vec![
            "run".to_string(),
            "--quiet".to_string(),
            "--package".to_string(),
            "harness".to_string(),
            "--features".to_string(),
            "bench".to_string(),
            "--bin".to_string(),
            "i2s-bench".to_string(),
            "--".to_string(),
            "--bits".to_string(),
            self.bits.to_string(),
            "--num-in".to_string(),
            self.num_in.to_string(),
            "--num-out".to_string(),
            self.num_out.to_string(),
        ];
        if level == Level::Smoke {
            args.push("--smoke".to_string());
        }
        args
    }
}

fn cases(bits: Option<u8>) -> Vec<Case> {
    BIT_DEPTHS
        .iter()
        .filter(|&&b| bits.map_or(true, |only| only == b))
        .flat_map(|&bits| {
            LAYOUTS.iter().map(move |&(num_in, num_out)| Case {
                bits,
                num_in,
                num_out,
            })
        })
        .collect()
}

pub fn run(level: Level, bits: Option<u8>, keep_going: bool) -> Result<()> {
    let cases = cases(bits);
    if cases.is_empty() {
        anyhow::bail!("no configurations for --bits {:?} (use 16 or 32)", bits);
    }

    println!();
    println!(
        "{}",
        format!("🔊 I2S master conformance ({:?}, {} configurations)", level, cases.len())
            .cyan()
            .bold()
    );
    println!();

    let total_start = Instant::now();
    let mut failures = Vec::new();

    for case in &cases {
        let start = Instant::now();
        let output = Command::new("cargo")
            .args(case.bench_args(level))
            .env("RUST_LOG", "warn")
            .output()
            .with_context(|| format!("Failed to run i2s-bench for {}", case.label()))?;

        if output.status.success() {
            println!(
                "{}",
                format!("  ✓ {:<16} {:.2}s", case.label(), start.elapsed().as_secs_f64()).green()
            );
            continue;
        }

        eprintln!(
            "{}",
            format!("  ✗ {:<16} exit {:?}", case.label(), output.status.code()).red().bold()
        );
        for line in String::from_utf8_lossy(&output.stderr).lines() {
            eprintln!("      {}", line.dimmed());
        }
        failures.push(*case);
        if !keep_going {
            break;
        }
    }

    println!();
    if !failures.is_empty() {
        let names: Vec<_> = failures.iter().map(Case::label).collect();
        anyhow::bail!("conformance failed: {}", names.join(", "));
    }

    println!(
        "{}",
        format!(
            "✓ All configurations passed in {:.2}s",
            total_start.elapsed().as_secs_f64()
        )
        .green()
        .bold()
    );
    println!();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_matrix_has_eight_cases() {
        let all = cases(None);
        assert_eq!(all.len(), 8);
        assert_eq!(all[0], Case { bits: 16, num_in: 4, num_out: 4 });
        assert_eq!(all[7], Case { bits: 32, num_in: 0, num_out: 4 });
    }

    #[test]
    fn bits_filter_keeps_one_depth() {
        assert!(cases(Some(32)).iter().all(|c| c.bits == 32));
        assert_eq!(cases(Some(32)).len(), 4);
        assert!(cases(Some(24)).is_empty());
    }

    #[test]
    fn smoke_level_passes_flag() {
        let case = Case { bits: 16, num_in: 1, num_out: 1 };
        assert!(case.bench_args(Level::Smoke).contains(&"--smoke".to_string()));
        assert!(!case.bench_args(Level::Nightly).contains(&"--smoke".to_string()));
    }
}
