use anyhow::Result;
use colored::Colorize;
use std::io::Write;
use std::time::Duration;

use super::runner::{GameSummary, LogVerification, TesterReport};

pub fn generate_console_report(
    writer: &mut dyn Write,
    report: &TesterReport,
    verbose: bool,
    total_duration: Duration,
) -> Result<()> {
    writeln!(writer)?;
    writeln!(
        writer,
        "{}",
        format!("📊 Nordic Traveller {} report", report.mode)
            .bright_cyan()
            .bold()
    )?;
    writeln!(writer, "{}", "==============================".cyan())?;

    let status = if report.passed {
        "✅ PASS".green()
    } else {
        "❌ FAIL".red()
    };
    writeln!(writer, "Status: {status}")?;
    if let Some(path) = &report.log_path {
        writeln!(writer, "Log: {path}")?;
    }
    writeln!(writer, "Total time: {total_duration:?}")?;

    if let Some(game) = &report.game {
        write_game(writer, game, verbose)?;
        writeln!(writer, "Arrivals: {}", report.arrivals)?;
        writeln!(writer, "Bankruptcies: {}", report.resets)?;
    }
    if let Some(matches) = report.replay_matches {
        let verdict = if matches {
            "identical".green()
        } else {
            "diverged".red()
        };
        writeln!(writer, "Replay: {verdict}")?;
    }
    if let Some(verification) = &report.verification {
        write_verification(writer, verification)?;
    }

    if !report.failures.is_empty() {
        writeln!(writer, "Failures:")?;
        for failure in &report.failures {
            writeln!(writer, "  • {}", failure.red())?;
        }
    }
    Ok(())
}

fn write_game(writer: &mut dyn Write, game: &GameSummary, verbose: bool) -> Result<()> {
    writeln!(writer, "Seed: {}", game.seed)?;
    let ticks = if game.aborted {
        format!("{} (aborted)", game.ticks_played).yellow()
    } else {
        game.ticks_played.to_string().normal()
    };
    writeln!(writer, "Ticks played: {ticks}")?;
    writeln!(writer)?;

    writeln!(writer, "{}", "🧭 Players".bright_yellow().bold())?;
    for player in &game.players {
        let money = if player.money >= 0 {
            format!("{}€", player.money).green()
        } else {
            format!("{}€", player.money).red()
        };
        if player.distance == 0 {
            writeln!(writer, "  {:12} {money:>8}  at {}", player.name.bold(), player.to)?;
        } else {
            writeln!(
                writer,
                "  {:12} {money:>8}  {} → {} ({} left)",
                player.name.bold(),
                player.from,
                player.to,
                player.distance
            )?;
        }
    }

    let cities: Vec<_> = game
        .cities
        .iter()
        .filter(|city| verbose || city.value != city.initial_value)
        .collect();
    if !cities.is_empty() {
        writeln!(writer)?;
        writeln!(writer, "{}", "🏙️  Cities".bright_yellow().bold())?;
        for city in cities {
            writeln!(
                writer,
                "  {:14} {:10} {:>6}€ (was {}€)",
                city.name, city.country, city.value, city.initial_value
            )?;
        }
    }
    writeln!(writer)?;
    Ok(())
}

fn write_verification(writer: &mut dyn Write, verification: &LogVerification) -> Result<()> {
    let mark = |ok: bool| if ok { "✅".normal() } else { "❌".normal() };
    writeln!(writer, "Seed: {}", verification.seed)?;
    writeln!(writer, "Choices: {}", verification.choices)?;
    writeln!(writer, "{} Header lines", mark(verification.header_matches))?;
    writeln!(writer, "{} Choice lines", mark(verification.choices_match))?;
    Ok(())
}

pub fn generate_json_report(writer: &mut dyn Write, report: &TesterReport) -> Result<()> {
    let json_output = serde_json::to_string_pretty(report)?;
    writeln!(writer, "{json_output}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::runner::{CitySummary, PlayerSummary};

    fn sample_report() -> TesterReport {
        TesterReport {
            mode: "run".to_string(),
            passed: false,
            failures: vec!["replay diverged".to_string()],
            log_path: Some("last.log".to_string()),
            arrivals: 12,
            resets: 1,
            game: Some(GameSummary {
                seed: 42,
                ticks_played: 50,
                aborted: false,
                players: vec![PlayerSummary {
                    name: "GUI".to_string(),
                    money: 180,
                    from: "Oslo".to_string(),
                    to: "Karlstad".to_string(),
                    distance: 2,
                }],
                cities: vec![CitySummary {
                    name: "Karlstad".to_string(),
                    country: "Sweden".to_string(),
                    value: 97,
                    initial_value: 85,
                }],
            }),
            replay_matches: Some(false),
            verification: None,
        }
    }

    #[test]
    fn console_report_lists_players_and_failures() {
        colored::control::set_override(false);
        let mut out = Vec::new();
        generate_console_report(&mut out, &sample_report(), false, Duration::from_millis(5))
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("FAIL"));
        assert!(text.contains("Oslo → Karlstad (2 left)"));
        assert!(text.contains("Karlstad"));
        assert!(text.contains("replay diverged"));
        assert!(text.contains("Replay: diverged"));
    }

    #[test]
    fn json_report_is_valid_json() {
        let mut out = Vec::new();
        generate_json_report(&mut out, &sample_report()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["mode"], "run");
        assert_eq!(value["game"]["players"][0]["money"], 180);
        assert_eq!(value["replay_matches"], false);
    }
}
