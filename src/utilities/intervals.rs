use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::utilities::error::LoadError;

pub const DEFAULT_MAX_INTERVALS: usize = 100;
pub const MAX_LABEL_CHARS: usize = 49;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Interval {
    pub label: String,
    pub duration: u32,
}

impl Interval {
    /// Parses one `<label> <seconds>` line. Anything else yields `None`:
    /// missing or extra tokens, a non-integer duration, or a duration that
    /// is not strictly positive. Control characters are dropped from the label.
    pub fn parse_line(line: &str) -> Option<Self> {
        let mut tokens = line.split_whitespace();
        let label = tokens.next()?;
        let duration = tokens.next()?.parse::<i64>().ok()?;
        if tokens.next().is_some() || duration <= 0 {
            return None;
        }

        let label: String = label
            .chars()
            .filter(|c| !c.is_control())
            .take(MAX_LABEL_CHARS)
            .collect();
        if label.is_empty() {
            return None;
        }

        Some(Self {
            label,
            duration: u32::try_from(duration).ok()?,
        })
    }
}

/// Ordered list of intervals, in playback order. Never changes after loading.
#[derive(Clone, Debug, Default)]
pub struct IntervalSet {
    intervals: Vec<Interval>,
    total_duration: u64,
}

impl IntervalSet {
    pub fn new(intervals: Vec<Interval>) -> Self {
        let total_duration = intervals.iter().map(|i| i.duration as u64).sum();
        Self {
            intervals,
            total_duration,
        }
    }

    pub fn load(path: &Path, max_intervals: usize) -> Result<Self, LoadError> {
        let file = File::open(path).map_err(|source| LoadError::Open {
            path: path.to_path_buf(),
            source,
        })?;

        let set = Self::from_reader(BufReader::new(file), max_intervals).map_err(|source| {
            LoadError::Read {
                path: path.to_path_buf(),
                source,
            }
        })?;

        if set.is_empty() {
            return Err(LoadError::Empty {
                path: path.to_path_buf(),
            });
        }
        Ok(set)
    }

    pub fn from_reader<R: BufRead>(reader: R, max_intervals: usize) -> std::io::Result<Self> {
        let mut intervals = Vec::new();
        // Raw lines, so a line that is not UTF-8 is skipped like any other bad line.
        for line in reader.split(b'\n') {
            if intervals.len() >= max_intervals {
                break;
            }
            let line = line?;
            let Ok(text) = std::str::from_utf8(&line) else {
                continue;
            };
            if let Some(interval) = Interval::parse_line(text) {
                intervals.push(interval);
            }
        }
        Ok(Self::new(intervals))
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Interval> {
        self.intervals.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Interval> {
        self.intervals.iter()
    }

    /// Sum of all durations, in seconds.
    pub fn total_duration(&self) -> u64 {
        self.total_duration
    }

    /// Fraction of the whole session that lies before each interval boundary,
    /// one entry per boundary (`1..len`).
    pub fn boundary_fractions(&self) -> Vec<f64> {
        if self.total_duration == 0 {
            return Vec::new();
        }

        let mut elapsed = 0u64;
        self.iter()
            .take(self.len().saturating_sub(1))
            .map(|interval| {
                elapsed += interval.duration as u64;
                elapsed as f64 / self.total_duration as f64
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    fn parse(text: &str) -> IntervalSet {
        IntervalSet::from_reader(Cursor::new(text), DEFAULT_MAX_INTERVALS).unwrap()
    }

    #[test]
    fn keeps_file_order_and_sums_durations() {
        let set = parse("Warmup 300\nSprint 30\nRest 60\n");
        let labels: Vec<_> = set.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, ["Warmup", "Sprint", "Rest"]);
        assert_eq!(set.total_duration(), 390);
    }

    #[test]
    fn skips_malformed_lines() {
        let set = parse("Warmup\nRun fast\n\nRun 30\nJog 20 extra\n   \nCool 1.5\n");
        assert_eq!(set.len(), 1);
        assert_eq!(set.get(0), Some(&Interval { label: "Run".into(), duration: 30 }));
    }

    #[test]
    fn skips_lines_that_are_not_utf8() {
        let bytes = b"Warmup 300\nCaf\xe9 60\nRest 60\n";
        let set = IntervalSet::from_reader(Cursor::new(&bytes[..]), DEFAULT_MAX_INTERVALS).unwrap();
        let labels: Vec<_> = set.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, ["Warmup", "Rest"]);
        assert_eq!(set.total_duration(), 360);
    }

    #[test]
    fn handles_crlf_line_endings() {
        let set = parse("Warmup 300\r\nRest 60\r\n");
        assert_eq!(set.len(), 2);
        assert_eq!(set.get(1).unwrap().label, "Rest");
    }

    #[test]
    fn strips_control_characters_from_labels() {
        let interval = Interval::parse_line("Sp\x1b[2Jrint\x07 30").unwrap();
        assert_eq!(interval.label, "Sp[2Jrint");
        assert!(!interval.label.chars().any(char::is_control));

        assert_eq!(Interval::parse_line("\x1b\x07 30"), None);
    }

    #[test]
    fn rejects_non_positive_durations() {
        assert_eq!(Interval::parse_line("Nothing 0"), None);
        assert_eq!(Interval::parse_line("Backwards -10"), None);
        assert!(Interval::parse_line("Fine +10").is_some());
    }

    #[test]
    fn truncates_long_labels_by_character() {
        let long = "é".repeat(80);
        let interval = Interval::parse_line(&format!("{long} 10")).unwrap();
        assert_eq!(interval.label.chars().count(), MAX_LABEL_CHARS);
    }

    #[test]
    fn stops_at_capacity() {
        let text: String = (1..=150).map(|i| format!("Lap{i} {i}\n")).collect();
        let set = parse(&text);
        assert_eq!(set.len(), 100);
        assert_eq!(set.get(99).unwrap().label, "Lap100");

        let capped = IntervalSet::from_reader(Cursor::new(text), 3).unwrap();
        assert_eq!(capped.len(), 3);
        assert_eq!(capped.total_duration(), 6);
    }

    #[test]
    fn boundary_fractions_are_cumulative() {
        let set = parse("Warmup 300\nSprint 30\nRest 60\n");
        let fractions = set.boundary_fractions();
        assert_eq!(fractions.len(), 2);
        assert!((fractions[0] - 300.0 / 390.0).abs() < 1e-9);
        assert!((fractions[1] - 330.0 / 390.0).abs() < 1e-9);

        assert!(parse("Solo 10\n").boundary_fractions().is_empty());
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = IntervalSet::load(&dir.path().join("missing.txt"), 100).unwrap_err();
        assert!(matches!(err, LoadError::Open { .. }));
    }

    #[test]
    fn load_reports_empty_file_distinctly() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "not an interval").unwrap();
        let err = IntervalSet::load(file.path(), 100).unwrap_err();
        assert!(matches!(err, LoadError::Empty { .. }));
    }

    #[test]
    fn load_reads_real_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Warmup 300\nSprint 30\nRest 60").unwrap();
        let set = IntervalSet::load(file.path(), 100).unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(set.total_duration(), 390);
    }
}
