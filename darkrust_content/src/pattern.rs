use crate::{Error, Result};

/// Shell style wildcard pattern for file names.
///
/// `*` matches any sequence of characters including the empty one and `?` matches
/// exactly one character. Every other character matches itself. A pattern never
/// matches a `/` because it is only applied to file names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WildcardPattern {
    pattern: Vec<char>,
    source: String,
    case_sensitive: bool,
}

impl WildcardPattern {
    /// Creates a new [`WildcardPattern`].
    ///
    /// # Example
    ///
    /// ```rust
    /// use darkrust_content::WildcardPattern;
    /// let pattern = WildcardPattern::new("*.FBX", true).unwrap();
    /// assert!(pattern.matches("Idle.FBX"));
    /// assert!(!pattern.matches("Idle.fbx"));
    /// ```
    pub fn new(pattern: impl Into<String>, case_sensitive: bool) -> Result<Self> {
        let source = pattern.into();
        if source.is_empty() {
            return Err(Error::InvalidPattern("the pattern must not be empty".to_owned()));
        }
        if source.contains('/') {
            return Err(Error::InvalidPattern(format!("'{source}' contains a path separator")));
        }
        let pattern = source.chars().collect();
        Ok(Self {
            pattern,
            source,
            case_sensitive,
        })
    }

    /// The pattern as it was given to [`WildcardPattern::new`].
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    /// Returns whether `file_name` matches the pattern.
    pub fn matches(&self, file_name: &str) -> bool {
        if file_name.contains('/') {
            return false;
        }
        let text = file_name.chars().collect::<Vec<_>>();
        matches_chars(&self.pattern, &text, self.case_sensitive)
    }
}

/// Characters are folded one by one so that `?` always stands for a single character of the file name,
/// even when the lowercase form of a character is longer.
fn chars_equal(a: char, b: char, case_sensitive: bool) -> bool {
    a == b || (!case_sensitive && a.to_lowercase().eq(b.to_lowercase()))
}

/// Iterative matcher that backtracks to the last `*`.
fn matches_chars(pattern: &[char], text: &[char], case_sensitive: bool) -> bool {
    let mut p = 0;
    let mut t = 0;
    let mut star: Option<usize> = None;
    let mut star_text = 0;

    while t < text.len() {
        match pattern.get(p) {
            Some('*') => {
                star = Some(p);
                star_text = t;
                p += 1;
            }
            Some('?') => {
                p += 1;
                t += 1;
            }
            Some(c) if chars_equal(*c, text[t], case_sensitive) => {
                p += 1;
                t += 1;
            }
            _ => match star {
                Some(star_index) => {
                    p = star_index + 1;
                    star_text += 1;
                    t = star_text;
                }
                None => return false,
            },
        }
    }

    pattern[p..].iter().all(|c| *c == '*')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn star_matches_extension() {
        let pattern = WildcardPattern::new("*.fbx", true).unwrap();
        assert!(pattern.matches("Great Sword Idle.fbx"));
        assert!(pattern.matches(".fbx"));
        assert!(!pattern.matches("Great Sword Idle.FBX"));
        assert!(!pattern.matches("Great Sword Idle.fbx.bak"));
    }

    #[test]
    fn case_insensitive() {
        let pattern = WildcardPattern::new("*.fbx", false).unwrap();
        assert!(pattern.matches("Idle.FBX"));
        assert!(pattern.matches("Idle.Fbx"));
        assert!(!pattern.is_case_sensitive());
    }

    #[test]
    fn case_insensitive_question_mark_matches_one_character() {
        // The lowercase form of 'İ' consists of two characters.
        let pattern = WildcardPattern::new("?.fbx", false).unwrap();
        assert!(pattern.matches("İ.FBX"));
        assert!(!pattern.matches("İİ.FBX"));

        let pattern = WildcardPattern::new("İdle_?.fbx", false).unwrap();
        assert!(pattern.matches("İDLE_A.FBX"));
        assert!(!pattern.matches("idle_A.FBX"));

        let pattern = WildcardPattern::new("Ä*.fbx", false).unwrap();
        assert!(pattern.matches("ärger.FBX"));
    }

    #[test]
    fn question_mark_matches_one_character() {
        let pattern = WildcardPattern::new("Attack_?.FBX", true).unwrap();
        assert!(pattern.matches("Attack_A.FBX"));
        assert!(!pattern.matches("Attack_.FBX"));
        assert!(!pattern.matches("Attack_AB.FBX"));
    }

    #[test]
    fn multiple_stars_backtrack() {
        let pattern = WildcardPattern::new("*Attack*Fast*", true).unwrap();
        assert!(pattern.matches("Primary_Attack_Fast_A.FBX"));
        assert!(!pattern.matches("Primary_Attack_Slow_A.FBX"));
    }

    #[test]
    fn literal_pattern() {
        let pattern = WildcardPattern::new("Idle.FBX", true).unwrap();
        assert!(pattern.matches("Idle.FBX"));
        assert!(!pattern.matches("Idle.FBXX"));
        assert_eq!(pattern.as_str(), "Idle.FBX");
    }

    #[test]
    fn invalid_patterns() {
        assert!(matches!(WildcardPattern::new("", true), Err(Error::InvalidPattern(_))));
        assert!(matches!(WildcardPattern::new("Aurora/*.FBX", true), Err(Error::InvalidPattern(_))));
    }
}
