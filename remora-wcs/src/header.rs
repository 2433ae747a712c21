//! Keyword access for WCS construction.
//!
//! [`TextHeader`] reads the text serialisation of a FITS header, one
//! 80-column card per line, as written next to drizzled HST products
//! (`*_drc_wcs.txt`). [`KeywordMap`] is the in-memory equivalent used when
//! keywords come from somewhere other than a file.

use std::collections::HashMap;

use crate::error::{WcsError, WcsResult};

const CARD_SIZE: usize = 80;
const KEYWORD_SIZE: usize = 8;
const VALUE_INDICATOR: &str = "= ";
const COMMENTARY_KEYWORDS: [&str; 2] = ["HISTORY", "COMMENT"];

pub trait KeywordProvider {
    fn get_string(&self, key: &str) -> Option<String>;
    fn get_float(&self, key: &str) -> Option<f64>;
    fn get_int(&self, key: &str) -> Option<i64>;

    fn require_float(&self, key: &str) -> WcsResult<f64> {
        self.get_float(key)
            .ok_or_else(|| WcsError::missing_keyword(key))
    }

    fn require_string(&self, key: &str) -> WcsResult<String> {
        self.get_string(key)
            .ok_or_else(|| WcsError::missing_keyword(key))
    }
}

#[derive(Debug, Clone, Default)]
pub struct KeywordMap {
    strings: HashMap<String, String>,
    floats: HashMap<String, f64>,
    ints: HashMap<String, i64>,
}

impl KeywordMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_string(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.strings.insert(key.into(), value.into());
        self
    }

    pub fn set_float(&mut self, key: impl Into<String>, value: f64) -> &mut Self {
        self.floats.insert(key.into(), value);
        self
    }

    pub fn set_int(&mut self, key: impl Into<String>, value: i64) -> &mut Self {
        self.ints.insert(key.into(), value);
        self
    }
}

impl KeywordProvider for KeywordMap {
    fn get_string(&self, key: &str) -> Option<String> {
        self.strings.get(key).cloned()
    }

    fn get_float(&self, key: &str) -> Option<f64> {
        self.floats
            .get(key)
            .copied()
            .or_else(|| self.ints.get(key).map(|&i| i as f64))
    }

    fn get_int(&self, key: &str) -> Option<i64> {
        self.ints.get(key).copied()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum KeywordValue {
    Logical(bool),
    Integer(i64),
    Real(f64),
    String(String),
}

impl KeywordValue {
    pub fn as_real(&self) -> Option<f64> {
        match self {
            Self::Real(f) => Some(*f),
            Self::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

/// Valued cards of a text FITS header, in file order.
///
/// Commentary cards (`HISTORY`, `COMMENT`, blank keywords) carry no value
/// and are dropped. When a keyword repeats, the first card wins.
#[derive(Debug, Clone, Default)]
pub struct TextHeader {
    cards: Vec<(String, KeywordValue)>,
    index: HashMap<String, usize>,
}

impl TextHeader {
    pub fn parse(text: &str) -> WcsResult<Self> {
        let mut header = Self::default();

        for (line_num, line) in text.lines().enumerate() {
            let line = line.trim_end_matches('\r');
            if !line.is_ascii() {
                return Err(WcsError::header_parse(line_num + 1, "non-ASCII characters"));
            }

            let keyword = line[..line.len().min(KEYWORD_SIZE)].trim();
            if keyword == "END" {
                break;
            }
            if keyword.is_empty()
                || COMMENTARY_KEYWORDS.contains(&keyword)
                || line.len() < KEYWORD_SIZE + VALUE_INDICATOR.len()
            {
                continue;
            }
            if &line[KEYWORD_SIZE..KEYWORD_SIZE + VALUE_INDICATOR.len()] != VALUE_INDICATOR {
                continue;
            }

            let field = &line[KEYWORD_SIZE + VALUE_INDICATOR.len()..];
            if let Some(value) = parse_value_field(field)
                .map_err(|message| WcsError::header_parse(line_num + 1, message))?
            {
                header.insert(keyword, value);
            }
        }

        Ok(header)
    }

    fn insert(&mut self, keyword: &str, value: KeywordValue) {
        if self.index.contains_key(keyword) {
            return;
        }
        self.index.insert(keyword.to_string(), self.cards.len());
        self.cards.push((keyword.to_string(), value));
    }

    pub fn get(&self, keyword: &str) -> Option<&KeywordValue> {
        self.index.get(keyword).map(|&i| &self.cards[i].1)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &KeywordValue)> {
        self.cards.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl KeywordProvider for TextHeader {
    fn get_string(&self, key: &str) -> Option<String> {
        self.get(key)?.as_string().map(|s| s.to_string())
    }

    fn get_float(&self, key: &str) -> Option<f64> {
        self.get(key)?.as_real()
    }

    fn get_int(&self, key: &str) -> Option<i64> {
        self.get(key)?.as_integer()
    }
}

fn parse_value_field(field: &str) -> Result<Option<KeywordValue>, String> {
    let trimmed = field.trim_start();

    if let Some(rest) = trimmed.strip_prefix('\'') {
        return parse_quoted(rest).map(|s| Some(KeywordValue::String(s)));
    }

    let value_part = match trimmed.find('/') {
        Some(pos) => trimmed[..pos].trim(),
        None => trimmed.trim(),
    };

    if value_part.is_empty() {
        return Ok(None);
    }
    if value_part == "T" {
        return Ok(Some(KeywordValue::Logical(true)));
    }
    if value_part == "F" {
        return Ok(Some(KeywordValue::Logical(false)));
    }
    if let Ok(int_val) = value_part.parse::<i64>() {
        return Ok(Some(KeywordValue::Integer(int_val)));
    }

    // FITS permits a 'D' exponent for double precision reals
    value_part
        .replace(['D', 'd'], "E")
        .parse::<f64>()
        .map(|f| Some(KeywordValue::Real(f)))
        .map_err(|_| format!("invalid value '{}'", value_part))
}

fn parse_quoted(rest: &str) -> Result<String, String> {
    let mut out = String::with_capacity(CARD_SIZE);
    let mut chars = rest.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\'' {
            if chars.peek() == Some(&'\'') {
                out.push('\'');
                chars.next();
            } else {
                return Ok(out.trim_end().to_string());
            }
        } else {
            out.push(c);
        }
    }

    Err("unterminated string value".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(text: &str) -> String {
        format!("{:<80}", text)
    }

    #[test]
    fn test_keyword_map_strings() {
        let mut map = KeywordMap::new();
        map.set_string("CTYPE1", "RA---TAN");
        assert_eq!(map.get_string("CTYPE1"), Some("RA---TAN".to_string()));
        assert_eq!(map.get_string("CTYPE2"), None);
    }

    #[test]
    fn test_keyword_map_int_readable_as_float() {
        let mut map = KeywordMap::new();
        map.set_int("CRPIX1", 2048);
        assert_eq!(map.get_float("CRPIX1"), Some(2048.0));
        assert_eq!(map.get_int("CRPIX1"), Some(2048));
    }

    #[test]
    fn test_require_float_missing() {
        let map = KeywordMap::new();
        let result = map.require_float("CRVAL1");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("CRVAL1"));
    }

    #[test]
    fn test_parse_typed_values() {
        let text = [
            card("WCSAXES =                    2 / Number of coordinate axes"),
            card("CRPIX1  =               2100.0 / Pixel coordinate of reference point"),
            card("CD1_1   = -1.3888888888889E-05 / Coordinate transformation matrix element"),
            card("CTYPE1  = 'RA---TAN'           / TAN (gnomonic) projection"),
            card("SIMPLE  =                    T"),
        ]
        .join("\n");

        let header = TextHeader::parse(&text).unwrap();
        assert_eq!(header.len(), 5);
        assert_eq!(header.get_int("WCSAXES"), Some(2));
        assert_eq!(header.get_float("CRPIX1"), Some(2100.0));
        assert_eq!(header.get_float("CD1_1"), Some(-1.3888888888889E-05));
        assert_eq!(header.get_string("CTYPE1"), Some("RA---TAN".to_string()));
        assert_eq!(header.get("SIMPLE"), Some(&KeywordValue::Logical(true)));
    }

    #[test]
    fn test_parse_integer_readable_as_float() {
        let header = TextHeader::parse(&card("CRPIX2  =                 2048")).unwrap();
        assert_eq!(header.get_float("CRPIX2"), Some(2048.0));
    }

    #[test]
    fn test_parse_d_exponent() {
        let header = TextHeader::parse(&card("CD2_2   =         1.25D-05")).unwrap();
        assert_eq!(header.get_float("CD2_2"), Some(1.25e-5));
    }

    #[test]
    fn test_string_with_slash_and_quote() {
        let text = card("RADESYS = 'ICRS/J2000''s'       / Equatorial coordinate system");
        let header = TextHeader::parse(&text).unwrap();
        assert_eq!(header.get_string("RADESYS"), Some("ICRS/J2000's".to_string()));
    }

    #[test]
    fn test_commentary_cards_skipped() {
        let text = [
            card("HISTORY this is history"),
            card("COMMENT = not a value card either"),
            card(""),
            card("CRVAL1  =                 23.4"),
        ]
        .join("\n");

        let header = TextHeader::parse(&text).unwrap();
        assert_eq!(header.len(), 1);
        assert_eq!(header.get_float("CRVAL1"), Some(23.4));
    }

    #[test]
    fn test_stops_at_end() {
        let text = [
            card("CRVAL1  =                 23.4"),
            card("END"),
            card("CRVAL2  =                 30.6"),
        ]
        .join("\n");

        let header = TextHeader::parse(&text).unwrap();
        assert!(header.get("CRVAL2").is_none());
    }

    #[test]
    fn test_first_duplicate_wins() {
        let text = [card("CRVAL1  = 1.0"), card("CRVAL1  = 2.0")].join("\n");
        let header = TextHeader::parse(&text).unwrap();
        assert_eq!(header.get_float("CRVAL1"), Some(1.0));
    }

    #[test]
    fn test_short_lines_accepted() {
        let header = TextHeader::parse("CRVAL2  = 30.66\nEND").unwrap();
        assert_eq!(header.get_float("CRVAL2"), Some(30.66));
    }

    #[test]
    fn test_invalid_value_reports_line() {
        let text = [card("CRVAL1  = 1.0"), card("CRVAL2  = abc")].join("\n");
        let err = TextHeader::parse(&text).unwrap_err();
        assert!(matches!(err, WcsError::HeaderParse { line: 2, .. }));
    }

    #[test]
    fn test_unterminated_string() {
        let err = TextHeader::parse(&card("CTYPE1  = 'RA---TAN")).unwrap_err();
        assert!(err.to_string().contains("unterminated"));
    }

    #[test]
    fn test_empty_value_dropped() {
        let header = TextHeader::parse(&card("BLANK   =          / nothing here")).unwrap();
        assert!(header.is_empty());
    }
}
