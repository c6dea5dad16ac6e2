//! Compilation of user path specifications into matchable patterns.
//!
//! A specification without `*` compiles to [`PathPattern::Exact`]; one with
//! `*` compiles to [`PathPattern::Wildcard`]. Each `*` matches any run of
//! characters, `/` included, and the match covers the whole canonical path:
//! `pics/IMG*` matches `pics/IMG_1.jpg` but not `pics/pics2/IMG_1.jpg`.

use std::path::Path;

use globset::{GlobBuilder, GlobMatcher};

use super::path::{normalize, separators, IndexPath};
use crate::error::{CoreError, CoreResult};

/// Wildcard character accepted in path specifications.
pub const WILDCARD: char = '*';

/// Escape character used in the store-side `LIKE` patterns.
pub const LIKE_ESCAPE: char = '\\';

/// A compiled path specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathPattern {
    /// Matches at most one entry, by equality.
    Exact(IndexPath),
    /// Matches every entry whose path satisfies the glob.
    Wildcard(Wildcard),
}

impl PathPattern {
    /// Normalizes `spec` against `root` and compiles it.
    ///
    /// # Errors
    ///
    /// - [`CoreError::InvalidPattern`] for an empty spec, a spec containing a
    ///   NUL byte, or a non-UTF-8 segment.
    /// - [`CoreError::OutsideRoot`] if the spec resolves above `root`.
    pub fn compile(root: &Path, spec: &Path) -> CoreResult<Self> {
        let raw = spec.as_os_str();
        if raw.is_empty() {
            return Err(CoreError::InvalidPattern("empty path specification".to_string()));
        }
        if raw.as_encoded_bytes().contains(&0) {
            return Err(CoreError::InvalidPattern(format!(
                "{} contains a NUL byte",
                spec.display()
            )));
        }

        let path = normalize(root, spec)?;
        if path.as_str().contains(WILDCARD) {
            Ok(PathPattern::Wildcard(Wildcard::new(path.as_str())?))
        } else {
            Ok(PathPattern::Exact(path))
        }
    }

    /// The canonical text the pattern was compiled from.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            PathPattern::Exact(path) => path.as_str(),
            PathPattern::Wildcard(w) => w.as_str(),
        }
    }
}

/// Compiles a batch of specifications. The first failure aborts the batch.
pub fn compile_all<P: AsRef<Path>>(root: &Path, specs: &[P]) -> CoreResult<Vec<PathPattern>> {
    specs
        .iter()
        .map(|spec| PathPattern::compile(root, spec.as_ref()))
        .collect()
}

/// A canonical glob with its store-side `LIKE` translation and an
/// in-process matcher for the same pattern.
#[derive(Debug, Clone)]
pub struct Wildcard {
    glob: String,
    like: String,
    depth: u32,
    matcher: GlobMatcher,
}

impl Wildcard {
    /// Compiles canonical glob text (already normalized, `/`-separated).
    ///
    /// # Errors
    ///
    /// [`CoreError::InvalidPattern`] if the glob cannot be compiled.
    pub fn new(glob: &str) -> CoreResult<Self> {
        let mut like = String::with_capacity(glob.len() + 4);
        for c in glob.chars() {
            match c {
                WILDCARD => like.push('%'),
                '%' | '_' | LIKE_ESCAPE => {
                    like.push(LIKE_ESCAPE);
                    like.push(c);
                }
                _ => like.push(c),
            }
        }

        let matcher = GlobBuilder::new(&globset_syntax(glob))
            .literal_separator(false)
            .backslash_escape(false)
            .build()
            .map_err(|e| CoreError::InvalidPattern(e.to_string()))?
            .compile_matcher();

        Ok(Self {
            glob: glob.to_owned(),
            like,
            depth: separators(glob),
            matcher,
        })
    }

    /// The canonical glob text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.glob
    }

    /// The `LIKE` pattern, to be used with `ESCAPE '\'`.
    #[must_use]
    pub fn like(&self) -> &str {
        &self.like
    }

    /// Number of separators in the glob; the depth of the shallowest
    /// entries it can match.
    #[must_use]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Case-sensitive match of the whole `path`.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        self.matcher.is_match(path)
    }
}

impl PartialEq for Wildcard {
    fn eq(&self, other: &Self) -> bool {
        self.glob == other.glob
    }
}

impl Eq for Wildcard {}

/// Rewrites canonical glob text into globset syntax in which `*` is the only
/// metacharacter. Runs of `*` collapse to one; `?[]{}` become one-character
/// classes so they match literally.
fn globset_syntax(glob: &str) -> String {
    let mut out = String::with_capacity(glob.len() + 8);
    let mut after_star = false;
    for c in glob.chars() {
        match c {
            WILDCARD if after_star => continue,
            WILDCARD => out.push('*'),
            '?' | '[' | ']' | '{' | '}' => {
                out.push('[');
                out.push(c);
                out.push(']');
            }
            _ => out.push(c),
        }
        after_star = c == WILDCARD;
    }
    out
}

/// Escapes `%`, `_` and `\` so `s` is matched literally by `LIKE ... ESCAPE '\'`.
#[must_use]
pub(crate) fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            out.push(LIKE_ESCAPE);
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROOT: &str = "/data/set";

    fn compile(spec: &str) -> CoreResult<PathPattern> {
        PathPattern::compile(Path::new(ROOT), Path::new(spec))
    }

    #[test]
    fn literal_compiles_to_exact() {
        let pattern = compile("/data/set/pics/IMG_1.jpg").unwrap();
        assert_eq!(
            pattern,
            PathPattern::Exact(IndexPath::parse("pics/IMG_1.jpg").unwrap())
        );
    }

    #[test]
    fn dirty_literal_compiles_to_same_exact() {
        let clean = compile("/data/set/1JI_0065.JPG").unwrap();
        assert_eq!(compile("/data/set/./1JI_0065.JPG").unwrap(), clean);
        assert_eq!(compile("/data/set/pics/../1JI_0065.JPG").unwrap(), clean);
    }

    #[test]
    fn star_compiles_to_wildcard() {
        let PathPattern::Wildcard(w) = compile("/data/set/pics/IMG*").unwrap() else {
            panic!("expected a wildcard");
        };
        assert_eq!(w.as_str(), "pics/IMG*");
        assert_eq!(w.like(), "pics/IMG%");
        assert_eq!(w.depth(), 1);
    }

    #[test]
    fn like_metacharacters_are_escaped() {
        let w = Wildcard::new("100%_done\\*").unwrap();
        assert_eq!(w.like(), "100\\%\\_done\\\\%");
        assert!(w.matches("100%_done\\final"));
        assert!(!w.matches("1000_done\\final"));
    }

    #[test]
    fn escape_like_leaves_plain_text() {
        assert_eq!(escape_like("pics/IMG"), "pics/IMG");
        assert_eq!(escape_like("a_b%c"), "a\\_b\\%c");
    }

    #[test]
    fn matching_is_anchored_and_not_segment_bound() {
        let w = Wildcard::new("pics/IMG*").unwrap();
        assert!(w.matches("pics/IMG_20160826_181302.jpg"));
        assert!(w.matches("pics/IMG"));
        assert!(!w.matches("pics/pics2/IMG_20160826_181305.jpg"));
        assert!(!w.matches("xpics/IMG_1.jpg"));
    }

    #[test]
    fn star_crosses_separators() {
        let w = Wildcard::new("pics*").unwrap();
        assert!(w.matches("pics"));
        assert!(w.matches("pics.JPG"));
        assert!(w.matches("pics/pics2/IMG_1.jpg"));
        assert!(!w.matches("1JI_0064.JPG"));
    }

    #[test]
    fn matching_is_case_sensitive() {
        let w = Wildcard::new("*.JPG").unwrap();
        assert!(w.matches("1JI_0064.JPG"));
        assert!(!w.matches("IMG_20160826_181302.jpg"));
    }

    #[test]
    fn infix_and_multiple_stars() {
        let w = Wildcard::new("*IMG*09*").unwrap();
        assert!(w.matches("pics/IMG_20160826_181309.jpg"));
        assert!(!w.matches("pics/IMG_20160826_181302.jpg"));

        let w = Wildcard::new("a*b*c").unwrap();
        assert!(w.matches("abc"));
        assert!(w.matches("aXbYbZc"));
        assert!(!w.matches("aXbYcZ"));
    }

    #[test]
    fn lone_star_matches_everything() {
        let w = Wildcard::new("*").unwrap();
        assert!(w.matches(""));
        assert!(w.matches("anything/at/all"));
        assert_eq!(w.depth(), 0);
    }

    #[test]
    fn glob_metacharacters_other_than_star_are_literal() {
        let w = Wildcard::new("a?[b]{c,d}*").unwrap();
        assert!(w.matches("a?[b]{c,d}.jpg"));
        assert!(!w.matches("ax[b]{c,d}.jpg"));
        assert!(!w.matches("a?b{c,d}.jpg"));
        assert!(!w.matches("a?[b]c.jpg"));
    }

    #[test]
    fn repeated_stars_behave_like_one() {
        let w = Wildcard::new("pics/**.jpg").unwrap();
        assert!(w.matches("pics/IMG_1.jpg"));
        assert!(w.matches("pics/pics2/IMG_1.jpg"));
        assert_eq!(w.like(), "pics/%%.jpg");
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_segment_is_invalid() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let spec = Path::new(OsStr::from_bytes(b"/data/set/\xff*.jpg"));
        assert!(matches!(
            PathPattern::compile(Path::new(ROOT), spec).unwrap_err(),
            CoreError::InvalidPattern(_)
        ));
    }

    #[test]
    fn empty_spec_is_invalid() {
        assert!(matches!(compile("").unwrap_err(), CoreError::InvalidPattern(_)));
    }

    #[test]
    fn nul_byte_is_invalid() {
        assert!(matches!(
            compile("/data/set/a\0b").unwrap_err(),
            CoreError::InvalidPattern(_)
        ));
    }

    #[test]
    fn outside_root_propagates() {
        assert!(matches!(
            compile("/data/other/*").unwrap_err(),
            CoreError::OutsideRoot { .. }
        ));
    }

    #[test]
    fn compile_all_aborts_on_first_error() {
        let root = Path::new(ROOT);
        assert_eq!(
            compile_all(root, &["/data/set/a", "/data/set/b*"]).unwrap().len(),
            2
        );
        assert!(compile_all(root, &["/data/set/a", ""]).is_err());
        assert!(compile_all::<&str>(root, &[]).unwrap().is_empty());
    }
}
