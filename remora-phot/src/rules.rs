//! Ordered regex substitution tables used to shorten DOLPHOT column
//! descriptions into column names.

use regex::{NoExpand, Regex};
use serde::{Deserialize, Serialize};

use crate::error::{PhotError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub pattern: String,
    pub replacement: String,
}

impl Rule {
    pub fn new(pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            replacement: replacement.into(),
        }
    }
}

/// The two substitution tables: `single` rewrites per-image short names,
/// `global` then rewrites every short name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingRules {
    pub single: Vec<Rule>,
    pub global: Vec<Rule>,
}

impl Default for NamingRules {
    fn default() -> Self {
        Self {
            single: vec![
                Rule::new("(Total|Measured) counts", "COUNT"),
                Rule::new("(Total|Measured) sky level", "SKY"),
                Rule::new("Normalized count rate uncertainty", "RATERR"),
                Rule::new("Normalized count rate", "RATE"),
                Rule::new("Instrumental VEGAMAG magnitude", "VEGA"),
                Rule::new("Transformed UBVRI magnitude", "TRANS"),
                Rule::new("Magnitude uncertainty", "ERR"),
                Rule::new("Photometry quality flag", "FLAG"),
            ],
            global: vec![Rule::new("Signal-to-noise", "SNR"), Rule::new("ness|ing", "")],
        }
    }
}

impl NamingRules {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| PhotError::config(format!("invalid naming rules: {}", e)))
    }

    pub fn compile(&self) -> Result<CompiledRules> {
        Ok(CompiledRules {
            single: RuleSet::compile(&self.single)?,
            global: RuleSet::compile(&self.global)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct CompiledRules {
    pub single: RuleSet,
    pub global: RuleSet,
}

#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<(Regex, String)>,
}

impl RuleSet {
    pub fn compile(rules: &[Rule]) -> Result<Self> {
        let rules = rules
            .iter()
            .map(|rule| {
                Regex::new(&rule.pattern)
                    .map(|re| (re, rule.replacement.clone()))
                    .map_err(|e| {
                        PhotError::config(format!("invalid rule pattern '{}': {}", rule.pattern, e))
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    /// Replaces every match of each rule in turn; replacements are literal.
    pub fn apply(&self, name: &str) -> String {
        self.rules
            .iter()
            .fold(name.to_string(), |acc, (re, replacement)| {
                re.replace_all(&acc, NoExpand(replacement.as_str())).into_owned()
            })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
