use crate::engine::Placeholders;
use crate::engine::DEFAULT_PREFIX;
use crate::ts::Dialect;
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;

/// Session options: parser dialect, placeholder prefix and debug output.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Options {
    pub dialect: Dialect,
    pub placeholder_prefix: String,
    /// Emit diagnostic tables and warnings.
    pub debug: bool,
    /// Include the whole source tree in debug output.
    pub log_full_source: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            dialect: Dialect::default(),
            placeholder_prefix: DEFAULT_PREFIX.to_string(),
            debug: false,
            log_full_source: false,
        }
    }
}

impl Options {
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.placeholder_prefix = prefix.into();
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_full_source(mut self, log_full_source: bool) -> Self {
        self.log_full_source = log_full_source;
        self
    }

    pub fn placeholders(&self) -> Placeholders {
        Placeholders::new(self.placeholder_prefix.clone())
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();
        self.collect_issues(&mut issues);
        ValidationError::from_issues(issues)
    }

    fn collect_issues(&self, issues: &mut Vec<ValidationIssue>) {
        if self.placeholder_prefix.trim().is_empty() {
            issues.push(ValidationIssue::InvalidOption {
                option: "placeholder_prefix",
                message: "must not be empty".to_string(),
            });
        }
    }
}

/// A rules file: shared options plus an ordered list of find/replace rules.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct RulesFile {
    #[serde(default)]
    pub options: Options,
    #[serde(default)]
    pub rules: Vec<Rule>,
}

/// One rule. Without a template the rule only reports matches.
#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Rule {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub pattern: String,
    #[serde(default)]
    pub template: Option<String>,
}

impl Rule {
    pub fn is_find_only(&self) -> bool {
        self.template.is_none()
    }
}

impl RulesFile {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();
        self.options.collect_issues(&mut issues);

        if self.rules.is_empty() {
            issues.push(ValidationIssue::EmptyRuleList);
        }

        let mut seen = HashSet::new();
        for rule in &self.rules {
            let id = rule.id.trim();
            if id.is_empty() {
                issues.push(ValidationIssue::MissingField {
                    rule_id: None,
                    field: "id",
                });
            } else if !seen.insert(id) {
                issues.push(ValidationIssue::DuplicateId { id: id.to_string() });
            }

            if rule.pattern.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    rule_id: (!id.is_empty()).then(|| id.to_string()),
                    field: "pattern",
                });
            }
        }

        ValidationError::from_issues(issues)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationError {
    fn from_issues(issues: Vec<ValidationIssue>) -> Result<(), Self> {
        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    EmptyRuleList,
    MissingField {
        rule_id: Option<String>,
        field: &'static str,
    },
    DuplicateId {
        id: String,
    },
    InvalidOption {
        option: &'static str,
        message: String,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyRuleList => write!(f, "rules file contains no rules"),
            ValidationIssue::MissingField { rule_id, field } => match rule_id {
                Some(id) => write!(f, "rule '{id}' missing required field '{field}'"),
                None => write!(f, "rule missing required field '{field}'"),
            },
            ValidationIssue::DuplicateId { id } => write!(f, "rule id '{id}' is used more than once"),
            ValidationIssue::InvalidOption { option, message } => {
                write!(f, "option '{option}' {message}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(id: &str, pattern: &str) -> Rule {
        Rule {
            id: id.to_string(),
            pattern: pattern.to_string(),
            template: None,
        }
    }

    #[test]
    fn default_options_are_valid() {
        let options = Options::default();
        assert_eq!(options.placeholder_prefix, "$$");
        assert_eq!(options.dialect, Dialect::JavaScript);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn empty_prefix_is_rejected() {
        let err = Options::default().with_prefix("").validate().unwrap_err();
        assert!(matches!(
            err.issues[0],
            ValidationIssue::InvalidOption {
                option: "placeholder_prefix",
                ..
            }
        ));
    }

    #[test]
    fn collects_every_issue() {
        let file = RulesFile {
            options: Options::default(),
            rules: vec![rule("a", "f()"), rule("a", ""), rule("", "g()")],
        };
        let err = file.validate().unwrap_err();
        assert_eq!(
            err.issues,
            vec![
                ValidationIssue::DuplicateId {
                    id: "a".to_string()
                },
                ValidationIssue::MissingField {
                    rule_id: Some("a".to_string()),
                    field: "pattern"
                },
                ValidationIssue::MissingField {
                    rule_id: None,
                    field: "id"
                },
            ]
        );
        assert_eq!(err.to_string().lines().count(), 3);
    }

    #[test]
    fn empty_rule_list_is_rejected() {
        let err = RulesFile::default().validate().unwrap_err();
        assert_eq!(err.issues, vec![ValidationIssue::EmptyRuleList]);
    }

    #[test]
    fn rules_without_templates_are_find_only() {
        assert!(rule("a", "f()").is_find_only());
    }
}
