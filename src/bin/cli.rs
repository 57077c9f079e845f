//! Footbet CLI - Backtest football betting rules from the command line

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use footbet::backtesting::{
    test_significance, BacktestEngine, BacktestResults, OverfittingDetector, RuleVerdict,
    Validator,
};
use footbet::core::kelly::StakeCalculator;
use footbet::data::load_matches;
use footbet::report::{build_report, write_report};
use footbet::rules::RuleSet;
use footbet::BacktestConfig;

const DEFAULT_DATA_DIR: &str = "data/raw";

#[derive(Parser)]
#[command(name = "footbet")]
#[command(author, version, about = "Football betting rule backtester", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Debug-level logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum RulesArg {
    Halftime,
    Form,
    All,
}

impl From<RulesArg> for RuleSet {
    fn from(arg: RulesArg) -> Self {
        match arg {
            RulesArg::Halftime => RuleSet::Halftime,
            RulesArg::Form => RuleSet::Form,
            RulesArg::All => RuleSet::All,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Backtest rules on a train/test split of historical matches
    Backtest {
        /// CSV file or directory of season CSVs
        #[arg(short, long, default_value = DEFAULT_DATA_DIR)]
        data: PathBuf,

        /// JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Last date of the train split (YYYY-MM-DD)
        #[arg(long)]
        train_end: Option<NaiveDate>,

        /// First date of the test split (YYYY-MM-DD)
        #[arg(long)]
        test_start: Option<NaiveDate>,

        /// Rule set to run
        #[arg(short, long, value_enum, default_value = "all")]
        rules: RulesArg,

        /// Write the per-rule report to this CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Evaluate rules one after another instead of in parallel
        #[arg(long)]
        sequential: bool,
    },

    /// List rule definitions
    Rules {
        #[arg(short, long, value_enum, default_value = "all")]
        rules: RulesArg,
    },

    /// Exact binomial test for a hit count
    Significance {
        #[arg(long)]
        hits: usize,

        #[arg(long)]
        triggers: usize,

        /// Win probability under the null hypothesis
        #[arg(long, default_value = "0.5")]
        null_prob: f64,

        #[arg(long, default_value = "0.05")]
        alpha: f64,
    },

    /// Kelly stake for a built-in rule at given odds
    Stake {
        /// Rule name (see `footbet rules`)
        #[arg(long)]
        rule: String,

        /// Decimal odds
        #[arg(long)]
        odds: f64,

        #[arg(long, default_value = "1000")]
        bankroll: f64,

        /// JSON configuration file (Kelly fraction and cap)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    println!("{}", "Footbet CLI v0.3.0".cyan().bold());
    println!();

    match cli.command {
        Commands::Backtest {
            data,
            config,
            train_end,
            test_start,
            rules,
            output,
            sequential,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(date) = train_end {
                config.train_end_date = date;
            }
            if let Some(date) = test_start {
                config.test_start_date = date;
            }
            if sequential {
                config.parallel = false;
            }
            run_backtest(&data, config, rules.into(), output.as_deref())?;
        }
        Commands::Rules { rules } => {
            list_rules(rules.into())?;
        }
        Commands::Significance {
            hits,
            triggers,
            null_prob,
            alpha,
        } => {
            run_significance(hits, triggers, null_prob, alpha)?;
        }
        Commands::Stake {
            rule,
            odds,
            bankroll,
            config,
        } => {
            let config = load_config(config.as_deref())?;
            recommend_stake(&config, &rule, odds, bankroll)?;
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<BacktestConfig> {
    match path {
        Some(p) => BacktestConfig::from_file(p)
            .with_context(|| format!("Failed to load config from {:?}", p)),
        None => Ok(BacktestConfig::default()),
    }
}

fn spinner(message: &str) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(message.to_string());
    Ok(pb)
}

fn run_backtest(
    data: &Path,
    config: BacktestConfig,
    rule_set: RuleSet,
    output: Option<&Path>,
) -> Result<()> {
    println!("{}", "Running backtest...".green());
    println!("Data: {:?}", data);
    println!("Train: up to {}", config.train_end_date);
    println!("Test: from {}", config.test_start_date);
    println!("Stake per trigger: {}", config.stake);
    println!();

    let rules = rule_set.build().context("Failed to build rules")?;
    let validator = Validator::new(config.clone()).context("Invalid configuration")?;
    let engine = BacktestEngine::new(config.clone()).context("Invalid configuration")?;
    let detector = OverfittingDetector::from_config(&config).context("Invalid configuration")?;

    let pb = spinner("Loading matches...")?;
    let (dataset, summary) =
        load_matches(data).with_context(|| format!("Failed to load matches from {:?}", data))?;
    pb.finish_and_clear();

    println!(
        "Loaded {} matches from {} files ({} excluded, {} duplicates)",
        dataset.len(),
        summary.files,
        summary.excluded,
        summary.duplicates
    );
    if let Some((first, last)) = dataset.date_range() {
        println!("Date range: {} to {}", first, last);
    }

    let (train, test) = validator.split(&dataset);
    println!("Train: {} matches | Test: {} matches", train.len(), test.len());
    println!();

    let pb = spinner("Backtesting rules...")?;
    let train_results = engine.run(&train, &rules).context("Train backtest failed")?;
    let test_results = engine.run(&test, &rules).context("Test backtest failed")?;
    pb.finish_and_clear();

    let verdicts = validator
        .accept_all(&test_results)
        .context("Significance test failed")?;
    let overfitting = detector.analyze(&train_results, &test_results);
    let calibration = validator.calibration(&test_results);

    print_results(&train_results, &test_results, &verdicts);

    println!();
    if overfitting.overfitting {
        println!("{}", "Possible overfitting:".red().bold());
        for r in overfitting.flagged() {
            println!(
                "  {} (win rate {:.1}% -> {:.1}%, ROI {:.1}% -> {:.1}%)",
                r.rule_name,
                r.train_win_rate * 100.0,
                r.test_win_rate * 100.0,
                r.train_roi * 100.0,
                r.test_roi * 100.0
            );
        }
    } else {
        println!("{}", "No overfitting detected".green());
    }
    for s in &overfitting.skipped {
        println!("  {} skipped ({:?})", s.rule_name.dimmed(), s.reason);
    }

    println!(
        "\nCalibration MAE (expected confidence vs test win rate): {:.1}%",
        calibration.mae * 100.0
    );

    if let Some(path) = output {
        let mut df = build_report(&train_results, &test_results, &verdicts, &overfitting)?;
        write_report(&mut df, path)
            .with_context(|| format!("Failed to write report to {:?}", path))?;
        println!("Report saved to {:?}", path);
    }

    Ok(())
}

fn print_results(train: &BacktestResults, test: &BacktestResults, verdicts: &[RuleVerdict]) {
    println!("{}", "Rule Performance:".yellow().bold());
    println!(
        "{:<32} {:>8} {:>9} {:>8} {:>9} {:>9} {:>8} {:>7}",
        "Rule", "Train n", "Train WR", "Test n", "Test WR", "Test ROI", "p-value", "Valid"
    );
    println!("{}", "-".repeat(98));

    for verdict in verdicts {
        let Some(te) = test.get(&verdict.rule_name) else {
            continue;
        };
        let (train_n, train_wr) = train
            .get(&verdict.rule_name)
            .map(|r| (r.triggers(), r.win_rate()))
            .unwrap_or((0, 0.0));

        let valid = if verdict.is_valid() {
            "yes".green()
        } else {
            "no".red()
        };
        let roi = format!("{:>8.1}%", te.roi() * 100.0);
        let roi = if te.roi() > 0.0 { roi.green() } else { roi.red() };

        println!(
            "{:<32} {:>8} {:>8.1}% {:>8} {:>8.1}% {} {:>8.4} {:>7}",
            truncate(&verdict.rule_name, 32),
            train_n,
            train_wr * 100.0,
            te.triggers(),
            te.win_rate() * 100.0,
            roi,
            verdict.significance.p_value,
            valid
        );
    }
}

fn list_rules(rule_set: RuleSet) -> Result<()> {
    let rules = rule_set.build()?;

    println!("{}", "Rules:".yellow().bold());
    println!("{:<32} {:<28} {:>10}", "Name", "Bet", "Confidence");
    println!("{}", "-".repeat(72));
    for rule in &rules {
        println!(
            "{:<32} {:<28} {:>9.1}%",
            rule.name(),
            rule.bet_type().label(),
            rule.expected_confidence() * 100.0
        );
        println!("  {}", rule.description().dimmed());
    }
    println!("\n{} rules", rules.len());
    Ok(())
}

fn run_significance(hits: usize, triggers: usize, null_prob: f64, alpha: f64) -> Result<()> {
    let outcome = test_significance(hits, triggers, null_prob, alpha)?;

    println!("Hits: {}/{}", hits, triggers);
    println!("Null probability: {:.3}", null_prob);
    println!("p-value: {:.6}", outcome.p_value);
    if outcome.is_significant {
        println!("{}", format!("Significant at alpha = {}", alpha).green().bold());
    } else {
        println!("{}", format!("Not significant at alpha = {}", alpha).red());
    }
    Ok(())
}

fn recommend_stake(config: &BacktestConfig, name: &str, odds: f64, bankroll: f64) -> Result<()> {
    let rules = RuleSet::All.build()?;
    let rule = rules
        .iter()
        .find(|r| r.name() == name)
        .with_context(|| format!("Unknown rule {:?}; run `footbet rules` for the list", name))?;

    let calc = StakeCalculator::from_config(config)?;
    let rec = calc.recommend(rule.expected_confidence(), odds, bankroll);

    println!("{}", rule);
    println!("Odds: {:.2} (implied {:.1}%)", odds, rec.implied_probability * 100.0);
    println!("Edge: {:+.1}%", rec.edge * 100.0);
    if rec.is_value && rec.stake > 0.0 {
        println!(
            "{}",
            format!(
                "Stake: {:.2} ({:.2}% of bankroll {:.2})",
                rec.stake,
                rec.stake_pct * 100.0,
                bankroll
            )
            .green()
            .bold()
        );
    } else {
        println!("{}", "No value at these odds: no bet".red());
    }
    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        s.chars().take(max - 1).collect::<String>() + "…"
    } else {
        s.to_string()
    }
}
