use serde::Deserialize;

use crate::error::MatchError;
use crate::matcher::SelectionPolicy;
use crate::similarity::SimilarityMetric;

pub const DEFAULT_DESCRIPTION_COLUMN: &str = "Product Description";
pub const DEFAULT_THRESHOLD: f64 = 80.0;
pub const DEFAULT_OUTPUT_SHEET: &str = "Matched Output";

/// Excel caps sheet names at 31 characters.
const MAX_SHEET_NAME: usize = 31;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct MatchConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    pub basket: SourceConfig,
    pub master: SourceConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
}

fn default_name() -> String {
    "product match".into()
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

// ---------------------------------------------------------------------------
// Sources + Output
// ---------------------------------------------------------------------------

/// Where one input collection comes from.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceConfig {
    pub file: String,
    /// Sheet for spreadsheet inputs. Defaults to the first sheet.
    #[serde(default)]
    pub sheet: Option<String>,
    /// Text encoding label for delimited inputs (e.g. "latin-1").
    #[serde(default)]
    pub encoding: Option<String>,
    /// Field delimiter for delimited inputs. Sniffed when absent.
    #[serde(default)]
    pub delimiter: Option<char>,
}

impl SourceConfig {
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default = "default_output_sheet")]
    pub sheet: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            file: None,
            sheet: default_output_sheet(),
        }
    }
}

fn default_output_sheet() -> String {
    DEFAULT_OUTPUT_SHEET.into()
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

/// What to do with a record whose description cell is blank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlankDescriptions {
    /// Abort the run with `InvalidFieldType`.
    #[default]
    Error,
    /// Emit blank basket rows unchanged; never offer blank master rows.
    Unmatched,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingConfig {
    #[serde(default = "default_description_column")]
    pub description_column: String,
    #[serde(default)]
    pub policy: SelectionPolicy,
    #[serde(default)]
    pub similarity: SimilarityMetric,
    #[serde(default)]
    pub blank_descriptions: BlankDescriptions,
    #[serde(default)]
    pub parallel: bool,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            description_column: default_description_column(),
            policy: SelectionPolicy::default(),
            similarity: SimilarityMetric::default(),
            blank_descriptions: BlankDescriptions::default(),
            parallel: false,
        }
    }
}

fn default_description_column() -> String {
    DEFAULT_DESCRIPTION_COLUMN.into()
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl MatchConfig {
    /// Config for a run assembled from command-line flags.
    pub fn new(basket: SourceConfig, master: SourceConfig) -> Self {
        Self {
            name: default_name(),
            threshold: DEFAULT_THRESHOLD,
            basket,
            master,
            output: OutputConfig::default(),
            matching: MatchingConfig::default(),
        }
    }

    pub fn from_toml(input: &str) -> Result<Self, MatchError> {
        let config: MatchConfig =
            toml::from_str(input).map_err(|e| MatchError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), MatchError> {
        if self.name.trim().is_empty() {
            return Err(MatchError::ConfigValidation("name must not be empty".into()));
        }

        if !self.threshold.is_finite() {
            return Err(MatchError::ConfigValidation(format!(
                "threshold must be a finite number, got {}",
                self.threshold
            )));
        }

        for (label, source) in [("basket", &self.basket), ("master", &self.master)] {
            if source.file.trim().is_empty() {
                return Err(MatchError::ConfigValidation(format!(
                    "{label}.file must not be empty"
                )));
            }
            if let Some(d) = source.delimiter {
                if !d.is_ascii() {
                    return Err(MatchError::ConfigValidation(format!(
                        "{label}.delimiter must be a single ASCII character, got '{d}'"
                    )));
                }
            }
        }

        if self.matching.description_column.is_empty() {
            return Err(MatchError::ConfigValidation(
                "matching.description_column must not be empty".into(),
            ));
        }

        let sheet = &self.output.sheet;
        if sheet.is_empty() || sheet.chars().count() > MAX_SHEET_NAME {
            return Err(MatchError::ConfigValidation(format!(
                "output.sheet must be 1-{MAX_SHEET_NAME} characters, got '{sheet}'"
            )));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
name = "Weekly basket"
threshold = 75

[basket]
file = "basket.xlsx"
sheet = "Week 12"

[master]
file = "contracts.csv"
encoding = "latin-1"
delimiter = ";"

[output]
file = "matched.xlsx"
sheet = "Results"

[matching]
description_column = "Description"
policy = "highest_score"
similarity = "levenshtein"
blank_descriptions = "unmatched"
parallel = true
"#;

    #[test]
    fn parse_full() {
        let config = MatchConfig::from_toml(FULL).unwrap();
        assert_eq!(config.name, "Weekly basket");
        assert_eq!(config.threshold, 75.0);
        assert_eq!(config.basket.sheet.as_deref(), Some("Week 12"));
        assert_eq!(config.master.encoding.as_deref(), Some("latin-1"));
        assert_eq!(config.master.delimiter, Some(';'));
        assert_eq!(config.output.file.as_deref(), Some("matched.xlsx"));
        assert_eq!(config.output.sheet, "Results");
        assert_eq!(config.matching.description_column, "Description");
        assert_eq!(config.matching.policy, SelectionPolicy::HighestScore);
        assert_eq!(config.matching.similarity, SimilarityMetric::Levenshtein);
        assert_eq!(config.matching.blank_descriptions, BlankDescriptions::Unmatched);
        assert!(config.matching.parallel);
    }

    #[test]
    fn defaults_fill_in() {
        let input = r#"
[basket]
file = "b.xlsx"

[master]
file = "m.csv"
"#;
        let config = MatchConfig::from_toml(input).unwrap();
        assert_eq!(config.threshold, DEFAULT_THRESHOLD);
        assert_eq!(config.output.sheet, DEFAULT_OUTPUT_SHEET);
        assert!(config.output.file.is_none());
        assert_eq!(config.matching.description_column, DEFAULT_DESCRIPTION_COLUMN);
        assert_eq!(config.matching.policy, SelectionPolicy::LastExceeding);
        assert_eq!(config.matching.similarity, SimilarityMetric::Indel);
        assert_eq!(config.matching.blank_descriptions, BlankDescriptions::Error);
        assert!(!config.matching.parallel);
    }

    #[test]
    fn fractional_threshold() {
        let input = r#"
threshold = 62.5
[basket]
file = "b.csv"
[master]
file = "m.csv"
"#;
        assert_eq!(MatchConfig::from_toml(input).unwrap().threshold, 62.5);
    }

    #[test]
    fn reject_missing_master() {
        let input = r#"
[basket]
file = "b.csv"
"#;
        let err = MatchConfig::from_toml(input).unwrap_err();
        assert!(matches!(err, MatchError::ConfigParse(_)));
        assert!(err.to_string().contains("master"));
    }

    #[test]
    fn reject_unknown_policy() {
        let input = r#"
[basket]
file = "b.csv"
[master]
file = "m.csv"
[matching]
policy = "first"
"#;
        assert!(MatchConfig::from_toml(input).is_err());
    }

    #[test]
    fn reject_empty_file() {
        let input = r#"
[basket]
file = ""
[master]
file = "m.csv"
"#;
        let err = MatchConfig::from_toml(input).unwrap_err();
        assert!(err.to_string().contains("basket.file"));
    }

    #[test]
    fn reject_long_sheet_name() {
        let mut config = MatchConfig::new(SourceConfig::new("b.csv"), SourceConfig::new("m.csv"));
        config.output.sheet = "x".repeat(32);
        assert!(config.validate().is_err());
    }

    #[test]
    fn reject_non_finite_threshold() {
        let mut config = MatchConfig::new(SourceConfig::new("b.csv"), SourceConfig::new("m.csv"));
        config.threshold = f64::NAN;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("threshold"));
    }
}
