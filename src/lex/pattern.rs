//! Anchored single-pattern matcher.

use crate::error::{Error, Result};
use crate::log::{LogLevel, emit_log};

fn compile(pattern: &str, ignore_case: bool) -> std::result::Result<regex_lite::Regex, regex_lite::Error> {
    regex_lite::RegexBuilder::new(&format!("^(?:{pattern})"))
        .case_insensitive(ignore_case)
        .build()
}

/// A regular expression matched only at a given offset.
///
/// Offsets are byte offsets into the haystack. An invalid pattern never
/// matches.
#[derive(Clone, Debug)]
pub struct Regex {
    pattern: String,
    ignore_case: bool,
    re: Option<regex_lite::Regex>,
}

impl Regex {
    /// Compile `pattern`. An invalid pattern is logged and kept as a rule
    /// that never matches.
    #[must_use]
    pub fn new(pattern: &str, ignore_case: bool) -> Self {
        let re = match compile(pattern, ignore_case) {
            Ok(re) => Some(re),
            Err(e) => {
                emit_log(
                    LogLevel::Warn,
                    &format!("{}", Error::invalid_pattern(pattern, &e)),
                );
                None
            }
        };
        Self {
            pattern: pattern.to_string(),
            ignore_case,
            re,
        }
    }

    /// Compile `pattern`, failing on invalid syntax.
    pub fn try_new(pattern: &str, ignore_case: bool) -> Result<Self> {
        let re = compile(pattern, ignore_case).map_err(|e| Error::invalid_pattern(pattern, &e))?;
        Ok(Self {
            pattern: pattern.to_string(),
            ignore_case,
            re: Some(re),
        })
    }

    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    #[must_use]
    pub fn ignore_case(&self) -> bool {
        self.ignore_case
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.re.is_some()
    }

    /// Match at `off` and return the offset after the match.
    ///
    /// No match, or a zero-length match, returns `off`.
    #[must_use]
    pub fn match_at(&self, s: &str, off: usize) -> usize {
        self.captures_at(s, off)
            .and_then(|caps| caps.get(0))
            .map_or(off, |m| off + m.end())
    }

    /// Captures of a non-empty match at `off`. Capture offsets are relative
    /// to `off`.
    pub(crate) fn captures_at<'h>(&self, s: &'h str, off: usize) -> Option<regex_lite::Captures<'h>> {
        let re = self.re.as_ref()?;
        let hay = s.get(off..)?;
        re.captures(hay)
            .filter(|caps| caps.get(0).is_some_and(|m| !m.is_empty()))
    }
}

/// Rules compare by source pattern and case mode.
impl PartialEq for Regex {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern && self.ignore_case == other.ignore_case
    }
}

impl Eq for Regex {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_is_anchored() {
        let re = Regex::new(r"\d+", false);
        assert_eq!(re.match_at("ab123", 0), 0);
        assert_eq!(re.match_at("ab123", 2), 5);
        assert_eq!(re.match_at("ab123 45", 2), 5);
    }

    #[test]
    fn test_zero_length_is_no_match() {
        let re = Regex::new(r"x*", false);
        assert_eq!(re.match_at("abc", 1), 1);
        assert_eq!(re.match_at("axxc", 1), 3);
    }

    #[test]
    fn test_ignore_case() {
        let re = Regex::new("select", true);
        assert_eq!(re.match_at("SELECT *", 0), 6);
        let re = Regex::new("select", false);
        assert_eq!(re.match_at("SELECT *", 0), 0);
    }

    #[test]
    fn test_alternation_stays_anchored() {
        let re = Regex::new("a|b", false);
        assert_eq!(re.match_at("xb", 0), 0);
        assert_eq!(re.match_at("xb", 1), 2);
    }

    #[test]
    fn test_invalid_pattern_never_matches() {
        let re = Regex::new("(abc", false);
        assert!(!re.is_valid());
        assert_eq!(re.match_at("(abc", 0), 0);
        assert!(matches!(
            Regex::try_new("(abc", false),
            Err(Error::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_offset_past_end() {
        let re = Regex::new("a", false);
        assert_eq!(re.match_at("a", 5), 5);
    }
}
