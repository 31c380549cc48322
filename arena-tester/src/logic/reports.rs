use anyhow::Result;
use colored::Colorize;
use std::io::Write;
use std::time::Duration;

use super::SeedResult;

fn success_rate(results: &[SeedResult]) -> f64 {
    let total = results.len();
    if total == 0 {
        return 0.0;
    }
    let passed = results.iter().filter(|r| r.passed).count();
    let passed = f64::from(u32::try_from(passed).unwrap_or(u32::MAX));
    let total = f64::from(u32::try_from(total).unwrap_or(u32::MAX));
    passed / total * 100.0
}

pub fn generate_console_report(
    out: &mut dyn Write,
    results: &[SeedResult],
    total_duration: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Session Check Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "========================".cyan())?;

    let passed = results.iter().filter(|r| r.passed).count();
    writeln!(out, "Seeds run: {}", results.len())?;
    writeln!(out, "Passed: {}", passed.to_string().green())?;
    writeln!(out, "Failed: {}", (results.len() - passed).to_string().red())?;
    writeln!(out, "Success rate: {:.1}%", success_rate(results))?;
    writeln!(out, "Total time: {total_duration:?}")?;
    writeln!(out)?;

    for result in results {
        let status = if result.passed {
            "✅ PASS".green()
        } else {
            "❌ FAIL".red()
        };
        writeln!(out, "{} seed {}", status, result.seed.to_string().bold())?;
        writeln!(
            out,
            "   Iterations: {}/{} clean",
            result.successful_iterations, result.iterations_run
        )?;
        writeln!(
            out,
            "   Battles: {} ({} won), purchases: {}, refusals: {}",
            result.battles, result.wins, result.purchases, result.refusals
        )?;
        writeln!(out, "   Highest level: {}", result.highest_level)?;
        writeln!(out, "   Average time: {:?}", result.average_duration)?;
        if !result.failures.is_empty() {
            writeln!(out, "   Failures:")?;
            for failure in &result.failures {
                writeln!(out, "     • {}", failure.red())?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

pub fn generate_json_report(out: &mut dyn Write, results: &[SeedResult]) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, results)?;
    writeln!(out)?;
    Ok(())
}

pub fn generate_markdown_report(out: &mut dyn Write, results: &[SeedResult]) -> Result<()> {
    writeln!(out, "# Power Arena Session Checks\n")?;

    let passed = results.iter().filter(|r| r.passed).count();
    writeln!(out, "## Summary\n")?;
    writeln!(out, "- **Seeds run**: {}", results.len())?;
    writeln!(out, "- **Passed**: {passed}")?;
    writeln!(out, "- **Failed**: {}", results.len() - passed)?;
    writeln!(out, "- **Success rate**: {:.1}%\n", success_rate(results))?;

    writeln!(out, "## Seeds\n")?;
    writeln!(out, "| Seed | Status | Clean iterations | Battles won | Highest level |")?;
    writeln!(out, "|------|--------|------------------|-------------|---------------|")?;
    for result in results {
        writeln!(
            out,
            "| {} | {} | {}/{} | {}/{} | {} |",
            result.seed,
            if result.passed { "✅" } else { "❌" },
            result.successful_iterations,
            result.iterations_run,
            result.wins,
            result.battles,
            result.highest_level
        )?;
    }

    let failing: Vec<&SeedResult> = results.iter().filter(|r| !r.passed).collect();
    if !failing.is_empty() {
        writeln!(out, "\n## Failures\n")?;
        for result in failing {
            writeln!(out, "### Seed {}\n", result.seed)?;
            for failure in &result.failures {
                writeln!(out, "- {failure}")?;
            }
            writeln!(out)?;
        }
    }
    Ok(())
}
