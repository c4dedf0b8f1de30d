//! Regex-driven computation of new symlink targets.
//!
//! A [`Substitution`] compiles the match pattern and parses the replacement
//! template once, so it can be reused across every link of a batch.
//! Substitution is global: every non-overlapping match, left to right.
//!
//! Output is produced in two passes. [`Substitution::required_len`] walks the
//! matches and computes the exact output length, then
//! [`Substitution::replace_into`] materializes the result into a buffer of
//! exactly that size.

use crate::internal::link::read_target;
use crate::internal::template::Template;
use crate::Error;
use camino::Utf8Path;
use regex::Regex;
use tracing::debug;

/// A compiled match pattern paired with its replacement template
#[derive(Debug, Clone)]
pub struct Substitution {
    regex: Regex,
    template: Template,
}

impl Substitution {
    /// Compile `pattern` and parse `replacement` against its capture groups
    pub fn new(pattern: &str, replacement: &str) -> Result<Self, Error> {
        let regex = Regex::new(pattern).map_err(|source| Error::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        let template = Template::parse(replacement, &regex)?;

        Ok(Self { regex, template })
    }

    /// The pattern source text
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    /// Exact length in bytes of the result of [`Self::apply`] on `haystack`
    pub fn required_len(&self, haystack: &str) -> usize {
        let mut len = 0;
        let mut last = 0;

        for caps in self.regex.captures_iter(haystack) {
            let m = caps.get_match();
            len += m.start() - last;
            len += self.template.expanded_len(&caps);
            last = m.end();
        }

        len + (haystack.len() - last)
    }

    /// Substitute into a buffer sized to exactly `len` bytes.
    ///
    /// `len` must come from [`Self::required_len`] on the same haystack.
    pub fn replace_into(&self, haystack: &str, len: usize) -> Result<String, Error> {
        let mut out = String::new();
        out.try_reserve_exact(len)
            .map_err(|_| Error::AllocationFailure(len))?;

        let mut last = 0;
        for caps in self.regex.captures_iter(haystack) {
            let m = caps.get_match();
            out.push_str(&haystack[last..m.start()]);
            self.template.expand_into(&caps, &mut out);
            last = m.end();
        }
        out.push_str(&haystack[last..]);

        if out.len() != len {
            return Err(Error::LengthMismatch {
                expected: len,
                actual: out.len(),
            });
        }

        Ok(out)
    }

    /// Replace every match in `haystack`
    pub fn apply(&self, haystack: &str) -> Result<String, Error> {
        let len = self.required_len(haystack);
        self.replace_into(haystack, len)
    }

    /// Compute the new target for the symlink at `path`. Nothing is written.
    pub fn new_target(&self, path: &Utf8Path) -> Result<String, Error> {
        let current = read_target(path)?;
        let new_target = self.apply(&current)?;

        if new_target == current {
            debug!("{}: pattern {:?} leaves target unchanged", path, self.pattern());
        }

        Ok(new_target)
    }
}

/// Compute the new target of `path` by substituting `replacement` for every
/// match of `pattern` in its current target.
///
/// The link is inspected before the pattern is compiled, so a missing path is
/// reported as `NotFound` even when the pattern is also invalid.
pub fn compute_new_target(
    path: &Utf8Path,
    pattern: &str,
    replacement: &str,
) -> Result<String, Error> {
    let current = read_target(path)?;
    Substitution::new(pattern, replacement)?.apply(&current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use std::fs;
    use std::os::unix::fs::symlink;
    use tempfile::tempdir;

    fn apply(pattern: &str, replacement: &str, haystack: &str) -> String {
        Substitution::new(pattern, replacement)
            .unwrap()
            .apply(haystack)
            .unwrap()
    }

    #[test]
    fn test_literal_substitution() {
        assert_eq!(apply("v1", "v2", "/data/v1/file.txt"), "/data/v2/file.txt");
    }

    #[test]
    fn test_capture_group_substitution() {
        assert_eq!(apply(r"(\d+)", "[$1]", "/x/foo-1.log"), "/x/foo-[1].log");
    }

    #[test]
    fn test_group_followed_by_word_characters() {
        assert_eq!(apply(r"(\d+)", "$1x", "/x/foo-1.log"), "/x/foo-1x.log");
        assert_eq!(apply(r"(\d+)", "$1_old", "v7"), "v7_old");
    }

    #[test]
    fn test_global_substitution() {
        assert_eq!(apply("v1", "v2", "/v1/a/v1/b-v1"), "/v2/a/v2/b-v2");
        assert_eq!(apply(r"\d+", "N", "a1b22c333"), "aNbNcN");
    }

    #[test]
    fn test_matches_do_not_overlap() {
        // Scanning resumes after "aa", so the middle "a" is not reused
        assert_eq!(apply("aa", "b", "aaaaa"), "bba");
    }

    #[test]
    fn test_no_match_is_identity() {
        let target = "/opt/tool-3.2/bin";
        assert_eq!(apply("nomatch", "whatever", target), target);
    }

    #[test]
    fn test_empty_matches() {
        assert_eq!(apply("x*", "-", "ab"), "-a-b-");
        assert_eq!(apply("^", "/prefix", "/path"), "/prefix/path");
    }

    #[test]
    fn test_anchors_and_classes() {
        assert_eq!(apply(r"^/usr/local", "/opt", "/usr/local/bin/tool"), "/opt/bin/tool");
        assert_eq!(apply(r"[0-9]+$", "latest", "release-42"), "release-latest");
    }

    #[test]
    fn test_required_len_is_exact() {
        let subst = Substitution::new(r"(?P<n>\d)", "<${n}${n}>").unwrap();
        let haystack = "a1b2ü3";
        let len = subst.required_len(haystack);
        assert_eq!(len, subst.apply(haystack).unwrap().len());
        assert_eq!(len, haystack.len() - 3 + 3 * 4);
    }

    #[test]
    fn test_replace_into_checks_length() {
        let subst = Substitution::new("a", "bb").unwrap();
        assert!(matches!(
            subst.replace_into("aa", 3),
            Err(Error::LengthMismatch {
                expected: 3,
                actual: 4
            })
        ));
    }

    #[test]
    fn test_invalid_pattern() {
        let err = Substitution::new("(unclosed", "x").unwrap_err();
        assert!(matches!(err, Error::InvalidPattern { ref pattern, .. } if pattern == "(unclosed"));
    }

    #[test]
    fn test_compute_new_target_from_link() {
        let dir = tempdir().unwrap();
        let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();
        let link = root.join("a");
        symlink("/data/v1/file.txt", &link).unwrap();

        let new_target = compute_new_target(&link, "v1", "v2").unwrap();
        assert_eq!(new_target, "/data/v2/file.txt");
        // Computing never writes
        assert_eq!(
            fs::read_link(&link).unwrap().to_str().unwrap(),
            "/data/v1/file.txt"
        );
    }

    #[test]
    fn test_compute_new_target_rejects_non_symlinks() {
        let dir = tempdir().unwrap();
        let root = Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap();
        let file = root.join("file");
        fs::write(&file, "contents").unwrap();

        assert!(matches!(
            compute_new_target(&file, ".*", "x"),
            Err(Error::NotASymlink(_))
        ));
        assert!(matches!(
            compute_new_target(&root, ".*", "x"),
            Err(Error::NotASymlink(_))
        ));
        assert!(matches!(
            compute_new_target(&root.join("missing"), "(", "x"),
            Err(Error::NotFound(_))
        ));
    }
}
