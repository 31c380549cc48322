mod logic;

use anyhow::{Context, Result, bail};
use arena_game::ArenaConfig;
use clap::{Parser, ValueEnum};
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::{Path, PathBuf};
use std::time::Instant;

use logic::{Check, LogicTester, SeedResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Console,
    Json,
    Markdown,
}

#[derive(Debug, Parser)]
#[command(name = "arena-tester", version = "0.1.0")]
#[command(about = "Automated QA for Power Arena - scripted sessions with invariant checks")]
struct Args {
    /// Seeds to run (comma-separated)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Scripted runs per seed
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// Actions per scripted run
    #[arg(long, default_value_t = 200)]
    actions: usize,

    /// Output report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
    report: ReportFormat,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// JSON config file overriding the arena defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// List all invariant checks and exit
    #[arg(long)]
    list_checks: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let default_filter = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    if args.list_checks {
        let mut output_target = OutputTarget::new(args.output.clone())?;
        write_check_list(output_target.writer())?;
        output_target.flush_inner()?;
        return Ok(());
    }

    let config = load_config(args.config.as_deref())?;
    let seeds = parse_seeds(&args.seeds)?;

    announce_banner(args.report);
    let start_time = Instant::now();
    let tester = LogicTester::new(config, args.verbose);
    let results: Vec<SeedResult> = seeds
        .iter()
        .map(|&seed| {
            log::info!("running seed {seed}");
            tester.run_seed(seed, args.iterations, args.actions)
        })
        .collect();

    write_reports(&args, &results, start_time)?;

    if results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }
    Ok(())
}

fn announce_banner(report: ReportFormat) {
    // Machine-readable reports may go to stdout; keep the banner out of them.
    if report != ReportFormat::Console {
        return;
    }
    println!("{}", "🏟️  Power Arena Tester".bright_cyan().bold());
    println!("{}", "======================".cyan());
}

fn write_check_list(out: &mut dyn Write) -> Result<()> {
    writeln!(out, "Available checks:")?;
    for check in Check::ALL {
        writeln!(out, "  {:26} - {}", check.key(), check.description())?;
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<ArenaConfig> {
    let Some(path) = path else {
        return Ok(ArenaConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    ArenaConfig::from_json(&raw).with_context(|| format!("invalid config {}", path.display()))
}

fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

fn parse_seeds(raw: &str) -> Result<Vec<u64>> {
    let seeds = split_csv(raw)
        .iter()
        .map(|token| {
            token
                .parse::<u64>()
                .with_context(|| format!("invalid seed '{token}'"))
        })
        .collect::<Result<Vec<u64>>>()?;
    if seeds.is_empty() {
        bail!("no seeds given");
    }
    Ok(seeds)
}

fn write_reports(args: &Args, results: &[SeedResult], start_time: Instant) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;
    match args.report {
        ReportFormat::Json => logic::reports::generate_json_report(&mut output_target, results)?,
        ReportFormat::Markdown => {
            logic::reports::generate_markdown_report(&mut output_target, results)?;
        }
        ReportFormat::Console => {
            logic::reports::generate_console_report(
                &mut output_target,
                results,
                start_time.elapsed(),
            )?;
            writeln!(&mut output_target, "🏁 Total time: {:?}", start_time.elapsed())?;
        }
    }
    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeds_parse_from_csv() {
        assert_eq!(parse_seeds(" 1, 2,,3 ").unwrap(), vec![1, 2, 3]);
        assert!(parse_seeds("1,abc").is_err());
        assert!(parse_seeds(" , ").is_err());
    }

    #[test]
    fn check_list_names_every_check() {
        let mut buf = Vec::new();
        write_check_list(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        for check in Check::ALL {
            assert!(text.contains(check.key()));
        }
    }

    #[test]
    fn config_file_overrides_defaults() {
        let path = std::env::temp_dir().join(format!(
            "arena-tester-config-{}.json",
            std::process::id()
        ));
        std::fs::write(&path, r#"{"cancel_battle_on_close": false}"#).unwrap();
        let config = load_config(Some(&path)).unwrap();
        assert!(!config.cancel_battle_on_close);
        assert_eq!(load_config(None).unwrap(), ArenaConfig::default());
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn args_accept_report_formats() {
        let args = Args::try_parse_from([
            "arena-tester",
            "--report",
            "markdown",
            "--seeds",
            "4,5",
            "--actions",
            "10",
        ])
        .unwrap();
        assert_eq!(args.report, ReportFormat::Markdown);
        assert_eq!(args.actions, 10);
        assert!(!args.list_checks);
    }
}
