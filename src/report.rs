//! Per-rule train/test report as a polars DataFrame

use polars::prelude::*;
use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::path::Path;
use tracing::info;

use crate::backtesting::{BacktestResults, OverfittingReport, RuleVerdict};
use crate::error::Result;

/// Build one row per rule seen in either split, sorted by test ROI
/// (best first). Rules absent from a split have nulls for that side.
pub fn build_report(
    train: &BacktestResults,
    test: &BacktestResults,
    verdicts: &[RuleVerdict],
    overfitting: &OverfittingReport,
) -> Result<DataFrame> {
    let names: BTreeSet<&String> = train.keys().chain(test.keys()).collect();
    let verdicts: HashMap<&str, &RuleVerdict> = verdicts
        .iter()
        .map(|v| (v.rule_name.as_str(), v))
        .collect();
    let overfit: HashMap<&str, bool> = overfitting
        .rules
        .iter()
        .map(|r| (r.rule_name.as_str(), r.overfit))
        .collect();

    let mut rule = Vec::with_capacity(names.len());
    let mut bet_type = Vec::with_capacity(names.len());
    let mut confidence = Vec::with_capacity(names.len());
    let mut train_triggers = Vec::with_capacity(names.len());
    let mut train_win_rate = Vec::with_capacity(names.len());
    let mut train_roi = Vec::with_capacity(names.len());
    let mut test_triggers = Vec::with_capacity(names.len());
    let mut test_hits = Vec::with_capacity(names.len());
    let mut test_win_rate = Vec::with_capacity(names.len());
    let mut test_roi = Vec::with_capacity(names.len());
    let mut max_drawdown = Vec::with_capacity(names.len());
    let mut p_value = Vec::with_capacity(names.len());
    let mut significant = Vec::with_capacity(names.len());
    let mut valid = Vec::with_capacity(names.len());
    let mut overfit_col = Vec::with_capacity(names.len());

    for name in names {
        let tr = train.get(name);
        let te = test.get(name);
        let Some(any) = te.or(tr) else { continue };
        let verdict = verdicts.get(name.as_str());

        rule.push(name.clone());
        bet_type.push(any.bet_type.label().to_string());
        confidence.push(any.expected_confidence);
        train_triggers.push(tr.map(|r| r.triggers() as u64));
        train_win_rate.push(tr.map(|r| r.win_rate()));
        train_roi.push(tr.map(|r| r.roi()));
        test_triggers.push(te.map(|r| r.triggers() as u64));
        test_hits.push(te.map(|r| r.hits() as u64));
        test_win_rate.push(te.map(|r| r.win_rate()));
        test_roi.push(te.map(|r| r.roi()));
        max_drawdown.push(te.map(|r| r.risk.max_drawdown));
        p_value.push(verdict.map(|v| v.significance.p_value));
        significant.push(verdict.map(|v| v.significance.is_significant));
        valid.push(verdict.map(|v| v.is_valid()));
        overfit_col.push(overfit.get(name.as_str()).copied());
    }

    let df = DataFrame::new(vec![
        Series::new("rule", rule),
        Series::new("bet_type", bet_type),
        Series::new("confidence", confidence),
        Series::new("train_triggers", train_triggers),
        Series::new("train_win_rate", train_win_rate),
        Series::new("train_roi", train_roi),
        Series::new("test_triggers", test_triggers),
        Series::new("test_hits", test_hits),
        Series::new("test_win_rate", test_win_rate),
        Series::new("test_roi", test_roi),
        Series::new("test_max_drawdown", max_drawdown),
        Series::new("p_value", p_value),
        Series::new("significant", significant),
        Series::new("valid", valid),
        Series::new("overfit", overfit_col),
    ])?;

    let df = df.sort(
        ["test_roi"],
        SortMultipleOptions::default()
            .with_order_descending(true)
            .with_nulls_last(true)
            .with_maintain_order(true),
    )?;

    Ok(df)
}

/// Write the report as CSV
pub fn write_report<P: AsRef<Path>>(df: &mut DataFrame, path: P) -> Result<()> {
    let mut file = File::create(path.as_ref())?;
    CsvWriter::new(&mut file).include_header(true).finish(df)?;
    info!("Report written to {:?} ({} rules)", path.as_ref(), df.height());
    Ok(())
}
