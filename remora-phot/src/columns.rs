//! Column names for DOLPHOT output, derived from the `.columns` file that
//! DOLPHOT writes next to its photometry.
//!
//! Each line of that file reads `<index>. <description>`. Descriptions of
//! per-image quantities carry the image after a comma
//! (`Measured counts, F475W.chip1 (...)`) and become `F475W_chip1_COUNT`.
//! Object-level descriptions (`Object sharpness`) become a bare name
//! (`SHARP`).

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{PhotError, Result};
use crate::rules::{CompiledRules, NamingRules};

const INDEX_SEPARATOR: &str = ". ";
const QUALIFIER_START: &str = " (";
const IMAGE_SEPARATOR: &str = ", ";
const OBJECT_WORD: &str = "Object";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescription {
    pub index: u32,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Measured once per image or chip.
    Single,
    /// Measured once per object.
    Global,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnName {
    pub index: u32,
    pub description: String,
    pub kind: ColumnKind,
    pub name: String,
}

impl ColumnName {
    /// Position of this column in a raw photometry row.
    #[inline]
    pub fn offset(&self) -> usize {
        self.index as usize - 1
    }
}

/// Splits one description line at its first `". "`.
///
/// `line_num` is 1-based and only used for the error.
pub fn parse_description_line(line_num: usize, line: &str) -> Result<ColumnDescription> {
    let trimmed = line.trim();
    let malformed = || PhotError::parse(line_num, line);

    let (index, description) = trimmed.split_once(INDEX_SEPARATOR).ok_or_else(malformed)?;
    let index: u32 = index.trim().parse().map_err(|_| malformed())?;
    if index == 0 {
        return Err(malformed());
    }

    Ok(ColumnDescription {
        index,
        description: description.trim().to_string(),
    })
}

/// A description is per-image when the text before any parenthesised
/// qualifier names an image after a comma.
pub fn classify(description: &str) -> ColumnKind {
    let head = description
        .split(QUALIFIER_START)
        .next()
        .unwrap_or(description);
    if head.contains(IMAGE_SEPARATOR) {
        ColumnKind::Single
    } else {
        ColumnKind::Global
    }
}

/// Derives the column name for one description.
pub fn resolve_description(description: &str, rules: &CompiledRules) -> (ColumnKind, String) {
    let kind = classify(description);

    let (prefix, short) = match kind {
        ColumnKind::Global => {
            let stripped = description.replace(OBJECT_WORD, "");
            let short = stripped.split_whitespace().next().unwrap_or("").to_string();
            (String::new(), short)
        }
        ColumnKind::Single => {
            let mut segments = description.split(IMAGE_SEPARATOR);
            let short = segments.next().unwrap_or("");
            let prefix = segments
                .next()
                .and_then(|image| image.split_whitespace().next())
                .map(|image| image.replace(".chip", "_chip"))
                .unwrap_or_default();
            (prefix, rules.single.apply(short))
        }
    };

    let short = rules.global.apply(&short).to_uppercase();
    let name = if prefix.is_empty() {
        short
    } else {
        format!("{}_{}", prefix, short)
    };

    (kind, name)
}

/// Every column of one DOLPHOT photometry file, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnTable {
    columns: Vec<ColumnName>,
}

impl ColumnTable {
    pub fn parse(text: &str, rules: &NamingRules) -> Result<Self> {
        let compiled = rules.compile()?;
        let mut columns = Vec::new();
        let mut seen = HashSet::new();

        for (i, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let line_num = i + 1;
            let entry = parse_description_line(line_num, line)?;
            if !seen.insert(entry.index) {
                return Err(PhotError::parse(line_num, line));
            }

            let (kind, name) = resolve_description(&entry.description, &compiled);
            if name.is_empty() {
                return Err(PhotError::parse(line_num, line));
            }

            columns.push(ColumnName {
                index: entry.index,
                description: entry.description,
                kind,
                name,
            });
        }

        Ok(Self { columns })
    }

    pub fn from_path(path: impl AsRef<Path>, rules: &NamingRules) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| PhotError::io(path, e))?;
        let table = Self::parse(&text, rules)?;
        debug!("Resolved {} column names from {:?}", table.len(), path);
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColumnName> {
        self.columns.iter()
    }

    pub fn get(&self, index: u32) -> Option<&ColumnName> {
        self.columns.iter().find(|c| c.index == index)
    }

    pub fn by_name(&self, name: &str) -> Option<&ColumnName> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const DOLPHOT_COLUMNS: &str = "\
1. Extension (zero for base image)
2. Chip (for three-dimensional FITS image)
3. Object X position on reference image (or on image 1 if no reference)
4. Object Y position on reference image (or on image 1 if no reference)
5. Chi for fit
6. Signal-to-noise
7. Object sharpness
8. Object roundness
9. Direction of major axis (if not round)
10. Crowding
11. Object type (1=bright star, 2=faint, 3=elongated, 4=hot pixel, 5=extended)
12. Total counts, F475W
13. Total sky level, F475W
14. Normalized count rate, F475W
15. Normalized count rate uncertainty, F475W
16. Instrumental VEGAMAG magnitude, F475W
17. Transformed UBVRI magnitude, F475W
18. Magnitude uncertainty, F475W
19. Chi, F475W
20. Signal-to-noise, F475W
21. Sharpness, F475W
22. Roundness, F475W
23. Crowding, F475W
24. Photometry quality flag, F475W
25. Measured counts, F475W.chip1 (jdan12abq_flc.chip1, 1 x 500 s)
";

    fn resolve(description: &str) -> String {
        let rules = NamingRules::default().compile().unwrap();
        resolve_description(description, &rules).1
    }

    #[test]
    fn test_parse_description_line() {
        let entry = parse_description_line(1, "12. Total counts, F475W").unwrap();
        assert_eq!(entry.index, 12);
        assert_eq!(entry.description, "Total counts, F475W");
    }

    #[test]
    fn test_parse_description_line_splits_once() {
        let entry = parse_description_line(1, "3. Object X. Position").unwrap();
        assert_eq!(entry.description, "Object X. Position");
    }

    #[test]
    fn test_parse_description_line_errors() {
        for line in ["no separator here", "x. Object X", "0. Object X", "-1. Object X"] {
            let err = parse_description_line(4, line).unwrap_err();
            match err {
                PhotError::Parse { line: n, content } => {
                    assert_eq!(n, 4);
                    assert_eq!(content, line);
                }
                other => panic!("unexpected error {:?}", other),
            }
        }
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify("Measured counts, F475W.chip1"), ColumnKind::Single);
        assert_eq!(classify("Object X position on reference image"), ColumnKind::Global);
        assert_eq!(
            classify("Object type (1=bright star, 2=faint)"),
            ColumnKind::Global
        );
        assert_eq!(
            classify("Measured counts, F475W.chip1 (jdan12abq_flc.chip1, 1 x 500 s)"),
            ColumnKind::Single
        );
    }

    #[test]
    fn test_resolve_names() {
        assert_eq!(resolve("Measured counts, F475W.chip1"), "F475W_chip1_COUNT");
        assert_eq!(resolve("Object X"), "X");
        assert_eq!(resolve("Object sharpness"), "SHARP");
        assert_eq!(resolve("Crowding"), "CROWD");
        assert_eq!(resolve("Signal-to-noise, F814W"), "F814W_SNR");
        assert_eq!(resolve("Normalized count rate uncertainty, F475W"), "F475W_RATERR");
    }

    #[test]
    fn test_single_without_image_token() {
        assert_eq!(resolve("Total counts, "), "COUNT");
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let rules = NamingRules::default();
        let first = ColumnTable::parse(DOLPHOT_COLUMNS, &rules).unwrap();
        let second = ColumnTable::parse(DOLPHOT_COLUMNS, &rules).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_parse_dolphot_columns() {
        let table = ColumnTable::parse(DOLPHOT_COLUMNS, &NamingRules::default()).unwrap();

        assert_eq!(table.len(), 25);
        assert_eq!(
            table.names(),
            vec![
                "EXTENSION",
                "CHIP",
                "X",
                "Y",
                "CHI",
                "SNR",
                "SHARP",
                "ROUND",
                "DIRECTION",
                "CROWD",
                "TYPE",
                "F475W_COUNT",
                "F475W_SKY",
                "F475W_RATE",
                "F475W_RATERR",
                "F475W_VEGA",
                "F475W_TRANS",
                "F475W_ERR",
                "F475W_CHI",
                "F475W_SNR",
                "F475W_SHARP",
                "F475W_ROUND",
                "F475W_CROWD",
                "F475W_FLAG",
                "F475W_chip1_COUNT",
            ]
        );
        assert_eq!(table.get(25).unwrap().kind, ColumnKind::Single);
        assert_eq!(table.by_name("X").unwrap().offset(), 2);
    }

    #[test]
    fn test_blank_lines_skipped_line_numbers_kept() {
        let err = ColumnTable::parse("1. Object X\n\nbroken\n", &NamingRules::default())
            .unwrap_err();
        assert!(matches!(err, PhotError::Parse { line: 3, .. }));
    }

    #[test]
    fn test_duplicate_index_rejected() {
        let err = ColumnTable::parse("1. Object X\n1. Object Y\n", &NamingRules::default())
            .unwrap_err();
        assert!(matches!(err, PhotError::Parse { line: 2, .. }));
    }

    #[test]
    fn test_empty_name_rejected() {
        let err = ColumnTable::parse("1. Object\n", &NamingRules::default()).unwrap_err();
        assert!(matches!(err, PhotError::Parse { line: 1, .. }));
    }

    #[test]
    fn test_custom_rules() {
        let rules = NamingRules::from_json(
            r#"{"single": [{"pattern": "Total counts", "replacement": "CTS"}]}"#,
        )
        .unwrap();
        let table = ColumnTable::parse("1. Total counts, F606W\n", &rules).unwrap();
        assert_eq!(table.names(), vec!["F606W_CTS"]);
    }

    #[test]
    fn test_from_missing_path() {
        let err = ColumnTable::from_path("/nonexistent/x.phot.columns", &NamingRules::default())
            .unwrap_err();
        assert!(matches!(err, PhotError::Io { .. }));
    }
}
