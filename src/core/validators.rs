use std::fmt;

use regex::Regex;

pub type ValidationError = String;

const EMAIL_PATTERN: &str = r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$";

#[derive(Debug, Clone)]
pub enum Check {
    Required,
    MinLength(usize),
    MaxLength(usize),
    Pattern(Regex),
    Email,
    Alphanumeric,
    Numeric,
}

impl Check {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::MinLength(_) => "min_length",
            Self::MaxLength(_) => "max_length",
            Self::Pattern(_) => "pattern",
            Self::Email => "email",
            Self::Alphanumeric => "alphanumeric",
            Self::Numeric => "numeric",
        }
    }

    fn default_message(&self, label: &str) -> String {
        match self {
            Self::Required => format!("{label} is required"),
            Self::MinLength(min) => format!("{label} must be at least {min} characters"),
            Self::MaxLength(max) => format!("{label} must be at most {max} characters"),
            Self::Pattern(re) => format!("{label} must match pattern: {}", re.as_str()),
            Self::Email => format!("{label} must be a valid email address"),
            Self::Alphanumeric => format!("{label} may only contain letters and digits"),
            Self::Numeric => format!("{label} must be a number"),
        }
    }

    fn accepts(&self, value: &str) -> bool {
        if value.is_empty() {
            return !matches!(self, Self::Required);
        }
        match self {
            Self::Required => !value.trim().is_empty(),
            Self::MinLength(min) => value.chars().count() >= *min,
            Self::MaxLength(max) => value.chars().count() <= *max,
            Self::Pattern(re) => re.is_match(value),
            Self::Email => email_regex().is_some_and(|re| re.is_match(value)),
            Self::Alphanumeric => value.chars().all(char::is_alphanumeric),
            Self::Numeric => value.trim().parse::<f64>().is_ok_and(f64::is_finite),
        }
    }
}

fn email_regex() -> Option<&'static Regex> {
    static EMAIL: std::sync::OnceLock<Option<Regex>> = std::sync::OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(EMAIL_PATTERN).ok()).as_ref()
}

impl PartialEq for Check {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Pattern(a), Self::Pattern(b)) => a.as_str() == b.as_str(),
            (Self::MinLength(a), Self::MinLength(b)) => a == b,
            (Self::MaxLength(a), Self::MaxLength(b)) => a == b,
            _ => std::mem::discriminant(self) == std::mem::discriminant(other),
        }
    }
}

impl Eq for Check {}

/// A validation predicate on a text leaf together with the message shown when
/// it rejects a value. Only `required` rejects the empty string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    check: Check,
    message: String,
}

impl Rule {
    pub fn new(check: Check, label: &str) -> Self {
        let message = check.default_message(label);
        Self { check, message }
    }

    pub fn required(label: &str) -> Self {
        Self::new(Check::Required, label)
    }

    pub fn min_length(min: usize, label: &str) -> Self {
        Self::new(Check::MinLength(min), label)
    }

    pub fn max_length(max: usize, label: &str) -> Self {
        Self::new(Check::MaxLength(max), label)
    }

    pub fn pattern(pattern: &str, label: &str) -> Result<Self, regex::Error> {
        Ok(Self::new(Check::Pattern(Regex::new(pattern)?), label))
    }

    pub fn email(label: &str) -> Self {
        Self::new(Check::Email, label)
    }

    pub fn alphanumeric(label: &str) -> Self {
        Self::new(Check::Alphanumeric, label)
    }

    pub fn numeric(label: &str) -> Self {
        Self::new(Check::Numeric, label)
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn check(&self) -> &Check {
        &self.check
    }

    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    pub fn is_required(&self) -> bool {
        matches!(self.check, Check::Required)
    }

    pub fn validate(&self, value: &str) -> Result<(), ValidationError> {
        if self.check.accepts(value) {
            Ok(())
        } else {
            Err(self.message.clone())
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.check {
            Check::MinLength(n) | Check::MaxLength(n) => write!(f, "{}({n})", self.check.name()),
            Check::Pattern(re) => write!(f, "pattern({})", re.as_str()),
            other => f.write_str(other.name()),
        }
    }
}

/// Run a list of rules against `value`, returning the first error.
pub fn run_rules(rules: &[Rule], value: &str) -> Result<(), ValidationError> {
    for rule in rules {
        rule.validate(value)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{Rule, run_rules};

    #[test]
    fn required_rejects_blank_text() {
        let rule = Rule::required("Name");
        assert_eq!(rule.validate(""), Err("Name is required".to_string()));
        assert_eq!(rule.validate("   "), Err("Name is required".to_string()));
        assert_eq!(rule.validate("John"), Ok(()));
    }

    #[test]
    fn optional_rules_accept_empty_text() {
        let rules = vec![
            Rule::min_length(3, "Code"),
            Rule::email("Code"),
            Rule::numeric("Code"),
            Rule::pattern("^x+$", "Code").expect("regex"),
        ];
        assert_eq!(run_rules(&rules, ""), Ok(()));
    }

    #[test]
    fn first_failing_rule_wins() {
        let rules = vec![Rule::required("Age"), Rule::numeric("Age")];
        assert_eq!(run_rules(&rules, ""), Err("Age is required".to_string()));
        assert_eq!(
            run_rules(&rules, "ten"),
            Err("Age must be a number".to_string())
        );
        assert_eq!(run_rules(&rules, "42"), Ok(()));
    }

    #[test]
    fn length_rules_count_chars() {
        let min = Rule::min_length(2, "City");
        let max = Rule::max_length(3, "City");
        assert!(min.validate("é").is_err());
        assert!(min.validate("éé").is_ok());
        assert!(max.validate("ééé").is_ok());
        assert!(max.validate("éééé").is_err());
    }

    #[test]
    fn email_and_alphanumeric() {
        assert!(Rule::email("Email").validate("a@b.io").is_ok());
        assert!(Rule::email("Email").validate("not-an-email").is_err());
        assert!(Rule::alphanumeric("Id").validate("abc123").is_ok());
        assert!(Rule::alphanumeric("Id").validate("abc 123").is_err());
    }

    #[test]
    fn custom_message_replaces_default() {
        let rule = Rule::required("Name").with_message("Tell us your name");
        assert_eq!(rule.validate(""), Err("Tell us your name".to_string()));
    }

    #[test]
    fn invalid_pattern_is_an_error() {
        assert!(Rule::pattern("(unclosed", "Code").is_err());
    }
}
