//! CSV loading for historical match results
//!
//! Reads football-data.co.uk style season files. Files are Windows-1252 in
//! older seasons and UTF-8 in newer ones; both are accepted.

use chrono::NaiveDate;
use encoding_rs::WINDOWS_1252;
use polars::prelude::*;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::dataset::Dataset;
use crate::error::Result;
use crate::models::{MatchRecord, MatchResult};

/// Source columns mapped onto [`MatchRecord`] fields
const DATE: &str = "Date";
const HOME_TEAM: &str = "HomeTeam";
const AWAY_TEAM: &str = "AwayTeam";
const FT_HOME_GOALS: &str = "FTHG";
const FT_AWAY_GOALS: &str = "FTAG";
const FT_RESULT: &str = "FTR";
const HT_HOME_GOALS: &str = "HTHG";
const HT_AWAY_GOALS: &str = "HTAG";
const ODDS_HOME: &str = "B365H";
const ODDS_DRAW: &str = "B365D";
const ODDS_AWAY: &str = "B365A";
const ODDS_BTTS: &str = "BTTSOdds";

const MAPPED_COLUMNS: [&str; 12] = [
    DATE,
    HOME_TEAM,
    AWAY_TEAM,
    FT_HOME_GOALS,
    FT_AWAY_GOALS,
    FT_RESULT,
    HT_HOME_GOALS,
    HT_AWAY_GOALS,
    ODDS_HOME,
    ODDS_DRAW,
    ODDS_AWAY,
    ODDS_BTTS,
];

/// Counts from one load
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub files: usize,
    pub rows: usize,
    /// Rows without a valid date, teams or final score
    pub excluded: usize,
    pub duplicates: usize,
}

/// Parse a match date: `dd/mm/yyyy`, `dd/mm/yy` or ISO `yyyy-mm-dd`
pub fn parse_match_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.contains('-') {
        return NaiveDate::parse_from_str(value, "%Y-%m-%d").ok();
    }

    let year_len = value.rsplit('/').next()?.len();
    let format = match year_len {
        2 => "%d/%m/%y",
        4 => "%d/%m/%Y",
        _ => return None,
    };
    NaiveDate::parse_from_str(value, format).ok()
}

/// Read CSV bytes into a DataFrame, decoding Windows-1252 when not UTF-8
pub fn read_csv_bytes(bytes: Vec<u8>) -> Result<DataFrame> {
    let bytes = match String::from_utf8(bytes) {
        Ok(text) => text.into_bytes(),
        Err(e) => {
            let (text, _, _) = WINDOWS_1252.decode(e.as_bytes());
            text.into_owned().into_bytes()
        }
    };

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(10_000))
        .map_parse_options(|opts| opts.with_truncate_ragged_lines(true))
        .into_reader_with_file_handle(Cursor::new(bytes))
        .finish()?;

    Ok(df)
}

fn string_column(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let Ok(series) = df.column(name) else {
        return Ok(vec![None; df.height()]);
    };
    let series = series.cast(&DataType::String)?;
    let values = series
        .str()?
        .into_iter()
        .map(|v| v.map(str::trim).filter(|s| !s.is_empty()).map(String::from))
        .collect();
    Ok(values)
}

fn float_column(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let Ok(series) = df.column(name) else {
        return Ok(vec![None; df.height()]);
    };
    let series = series.cast(&DataType::Float64)?;
    let values = series
        .f64()?
        .into_iter()
        .map(|v| v.filter(|x| x.is_finite()))
        .collect();
    Ok(values)
}

/// Decimal prices at or below 1.0 are placeholders in the source files
fn price(value: Option<f64>) -> Option<f64> {
    value.filter(|o| *o > 1.0)
}

fn goals(value: Option<f64>) -> Option<u32> {
    value
        .filter(|v| *v >= 0.0 && v.fract() == 0.0)
        .map(|v| v as u32)
}

/// Convert a results DataFrame into match records
///
/// Returns the valid records and the number of excluded rows.
pub fn dataframe_to_matches(
    df: &DataFrame,
    season: Option<&str>,
) -> Result<(Vec<MatchRecord>, usize)> {
    let dates = string_column(df, DATE)?;
    let home_teams = string_column(df, HOME_TEAM)?;
    let away_teams = string_column(df, AWAY_TEAM)?;
    let ft_home = float_column(df, FT_HOME_GOALS)?;
    let ft_away = float_column(df, FT_AWAY_GOALS)?;
    let results = string_column(df, FT_RESULT)?;
    let ht_home = float_column(df, HT_HOME_GOALS)?;
    let ht_away = float_column(df, HT_AWAY_GOALS)?;
    let odds_home = float_column(df, ODDS_HOME)?;
    let odds_draw = float_column(df, ODDS_DRAW)?;
    let odds_away = float_column(df, ODDS_AWAY)?;
    let odds_btts = float_column(df, ODDS_BTTS)?;

    // Every other numeric column is carried as a feature
    let mut feature_columns: Vec<(String, Vec<Option<f64>>)> = Vec::new();
    for series in df.get_columns() {
        let name = series.name();
        if MAPPED_COLUMNS.contains(&name) || !series.dtype().is_numeric() {
            continue;
        }
        feature_columns.push((name.to_string(), float_column(df, name)?));
    }

    let mut records = Vec::with_capacity(df.height());
    let mut excluded = 0;

    for i in 0..df.height() {
        let date = dates[i].as_deref().and_then(parse_match_date);
        let (Some(date), Some(home), Some(away), Some(hg), Some(ag)) = (
            date,
            home_teams[i].clone(),
            away_teams[i].clone(),
            goals(ft_home[i]),
            goals(ft_away[i]),
        ) else {
            excluded += 1;
            continue;
        };

        let result = results[i]
            .as_deref()
            .and_then(MatchResult::from_code)
            .unwrap_or_else(|| MatchResult::from_score(hg, ag));

        let features: BTreeMap<String, f64> = feature_columns
            .iter()
            .filter_map(|(name, values)| values[i].map(|v| (name.clone(), v)))
            .collect();

        records.push(MatchRecord {
            date,
            season: season.map(String::from),
            home_team: home,
            away_team: away,
            home_goals: hg,
            away_goals: ag,
            ht_home_goals: goals(ht_home[i]),
            ht_away_goals: goals(ht_away[i]),
            result,
            odds_home: price(odds_home[i]),
            odds_draw: price(odds_draw[i]),
            odds_away: price(odds_away[i]),
            odds_btts: price(odds_btts[i]),
            features,
        });
    }

    Ok((records, excluded))
}

/// CSV files to read: the file itself, or every `*.csv` in a directory
/// in file-name order
fn csv_files(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files: Vec<PathBuf> = fs::read_dir(path)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Load matches from a CSV file or a directory of season files
///
/// Invalid rows are excluded, duplicates on (date, home, away) dropped and
/// the result sorted chronologically.
pub fn load_matches<P: AsRef<Path>>(path: P) -> Result<(Dataset, LoadSummary)> {
    let files = csv_files(path.as_ref())?;
    if files.is_empty() {
        warn!("No CSV files found in {:?}", path.as_ref());
    }

    let mut summary = LoadSummary {
        files: files.len(),
        ..Default::default()
    };
    let mut seen: HashSet<(NaiveDate, String, String)> = HashSet::new();
    let mut all = Vec::new();

    for file in &files {
        let df = read_csv_bytes(fs::read(file)?)?;
        let season = file.file_stem().and_then(|s| s.to_str());
        let (records, excluded) = dataframe_to_matches(&df, season)?;

        debug!(
            "{:?}: {} rows, {} valid, {} excluded",
            file,
            df.height(),
            records.len(),
            excluded
        );
        if excluded > 0 {
            warn!("{:?}: excluded {} rows without a valid date or score", file, excluded);
        }

        summary.rows += df.height();
        summary.excluded += excluded;

        for record in records {
            let key = (
                record.date,
                record.home_team.clone(),
                record.away_team.clone(),
            );
            if seen.insert(key) {
                all.push(record);
            } else {
                summary.duplicates += 1;
            }
        }
    }

    let dataset = Dataset::new(all);
    info!(
        "Loaded {} matches from {} files ({} excluded, {} duplicates)",
        dataset.len(),
        summary.files,
        summary.excluded,
        summary.duplicates
    );

    Ok((dataset, summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HEADER: &str = "Div,Date,HomeTeam,AwayTeam,FTHG,FTAG,FTR,HTHG,HTAG,HTR,B365H,B365D,B365A,home_form_l5";

    fn write_file(dir: &Path, name: &str, lines: &[&str]) -> PathBuf {
        let path = dir.join(name);
        let mut f = fs::File::create(&path).unwrap();
        writeln!(f, "{}", HEADER).unwrap();
        for line in lines {
            writeln!(f, "{}", line).unwrap();
        }
        path
    }

    #[test]
    fn test_parse_match_date() {
        let expected = NaiveDate::from_ymd_opt(2018, 8, 17).unwrap();
        assert_eq!(parse_match_date("17/08/2018"), Some(expected));
        assert_eq!(parse_match_date("17/08/18"), Some(expected));
        assert_eq!(parse_match_date("2018-08-17"), Some(expected));
        assert_eq!(parse_match_date(" 17/08/2018 "), Some(expected));
        assert_eq!(parse_match_date("31/02/2018"), None);
        assert_eq!(parse_match_date("17/08/218"), None);
        assert_eq!(parse_match_date(""), None);
    }

    #[test]
    fn test_load_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "SP1_2324.csv",
            &[
                "SP1,13/08/2023,Sevilla,Valencia,1,2,A,0,1,A,2.0,3.4,3.9,9",
                "SP1,11/08/2023,Almeria,Vallecano,0,2,A,0,2,A,2.6,3.3,2.8,",
            ],
        );

        let (dataset, summary) = load_matches(&path).unwrap();
        assert_eq!(summary.files, 1);
        assert_eq!(summary.rows, 2);
        assert_eq!(dataset.len(), 2);

        // Sorted chronologically
        let first = &dataset.records()[0];
        assert_eq!(first.home_team, "Almeria");
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2023, 8, 11).unwrap());
        assert_eq!(first.halftime(), Some((0, 2)));
        assert_eq!(first.result, MatchResult::AwayWin);
        assert_eq!(first.feature("home_form_l5"), None);
        assert_eq!(first.season.as_deref(), Some("SP1_2324"));

        let second = &dataset.records()[1];
        assert_eq!(second.odds_home, Some(2.0));
        assert_eq!(second.feature("home_form_l5"), Some(9.0));
    }

    #[test]
    fn test_invalid_rows_excluded() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "season.csv",
            &[
                "SP1,13/08/2023,Sevilla,Valencia,1,2,A,0,1,A,2.0,3.4,3.9,",
                "SP1,not a date,Getafe,Osasuna,0,0,D,0,0,D,2.2,3.1,3.5,",
                "SP1,14/08/2023,Girona,Betis,,,,,,,2.4,3.3,3.0,",
            ],
        );

        let (dataset, summary) = load_matches(&path).unwrap();
        assert_eq!(dataset.len(), 1);
        assert_eq!(summary.excluded, 2);
    }

    #[test]
    fn test_missing_halftime_and_result_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("minimal.csv");
        fs::write(
            &path,
            "Date,HomeTeam,AwayTeam,FTHG,FTAG\n2024-01-03,Cadiz,Mallorca,2,2\n",
        )
        .unwrap();

        let (dataset, _) = load_matches(&path).unwrap();
        let m = &dataset.records()[0];
        assert_eq!(m.result, MatchResult::Draw);
        assert_eq!(m.halftime(), None);
        assert_eq!(m.odds_home, None);
    }

    #[test]
    fn test_placeholder_prices_treated_as_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "season.csv",
            &["SP1,13/08/2023,Sevilla,Valencia,1,2,A,0,1,A,0,1.0,3.9,"],
        );

        let (dataset, _) = load_matches(&path).unwrap();
        let m = &dataset.records()[0];
        assert_eq!(m.odds_home, None);
        assert_eq!(m.odds_draw, None);
        assert_eq!(m.odds_away, Some(3.9));
    }

    #[test]
    fn test_directory_load_deduplicates() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path(),
            "SP1_2223.csv",
            &["SP1,04/06/2023,Betis,Valencia,1,1,D,0,0,D,1.9,3.6,4.0,"],
        );
        write_file(
            dir.path(),
            "SP1_2324.csv",
            &[
                "SP1,04/06/2023,Betis,Valencia,1,1,D,0,0,D,1.9,3.6,4.0,",
                "SP1,11/08/2023,Almeria,Vallecano,0,2,A,0,2,A,2.6,3.3,2.8,",
            ],
        );
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let (dataset, summary) = load_matches(dir.path()).unwrap();
        assert_eq!(summary.files, 2);
        assert_eq!(summary.duplicates, 1);
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.records()[0].season.as_deref(), Some("SP1_2223"));
    }

    #[test]
    fn test_windows_1252_decoding() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latin.csv");
        let mut bytes = b"Date,HomeTeam,AwayTeam,FTHG,FTAG,FTR\n".to_vec();
        bytes.extend_from_slice(b"02/09/2018,Ath Madrid,Alav\xe9s,1,0,H\n");
        fs::write(&path, bytes).unwrap();

        let (dataset, _) = load_matches(&path).unwrap();
        assert_eq!(dataset.records()[0].away_team, "Alavés");
    }
}
