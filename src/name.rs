//! Name values and the normalization policy used to compare and hash them.
//!
//! A [`Name`] is a (display, canonical) pair, mirroring the way the teacher
//! crate keeps a strongly-typed, `Copy`-friendly identifier (`INodeNo`,
//! `Generation` in `src/ll/request.rs`) rather than passing bare strings
//! around the core: equality and hashing go through `canonical`, `Display`
//! goes through `display`.

use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};
use unicode_normalization::UnicodeNormalization;

/// A single Unicode normalization or case-folding step applied while deriving
/// a name's display or canonical form.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Normalization {
    /// Unicode Normalization Form C (canonical composition).
    Nfc,
    /// Unicode Normalization Form D (canonical decomposition).
    Nfd,
    /// Full Unicode case folding (`str::to_lowercase`, locale-independent).
    CaseFoldUnicode,
    /// ASCII-only case folding (`str::to_ascii_lowercase`).
    CaseFoldAscii,
}

/// An ordered set of normalizations applied to a raw name to produce either
/// its display or its canonical form.
///
/// At most one Unicode normalization ([`Normalization::Nfc`] / `Nfd`) and at
/// most one case fold ([`Normalization::CaseFoldUnicode`] / `CaseFoldAscii`)
/// may be present; [`NormalizationSet::new`] enforces this.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct NormalizationSet {
    steps: smallvec::SmallVec<[Normalization; 2]>,
}

impl NormalizationSet {
    /// The empty set: no normalization applied, the raw string is used as-is.
    pub fn none() -> Self {
        NormalizationSet {
            steps: smallvec::SmallVec::new(),
        }
    }

    /// Build a normalization set from individual steps.
    ///
    /// # Panics
    /// Panics if more than one Unicode normalization or more than one case
    /// fold is present; this is a configuration error caught at filesystem
    /// construction time (see [`crate::config::Configuration`]), never at
    /// lookup time.
    pub fn new(steps: impl IntoIterator<Item = Normalization>) -> Self {
        let steps: smallvec::SmallVec<[Normalization; 2]> = steps.into_iter().collect();
        let unicode_forms = steps
            .iter()
            .filter(|n| matches!(n, Normalization::Nfc | Normalization::Nfd))
            .count();
        let case_folds = steps
            .iter()
            .filter(|n| matches!(n, Normalization::CaseFoldUnicode | Normalization::CaseFoldAscii))
            .count();
        assert!(unicode_forms <= 1, "at most one Unicode normalization form may be configured");
        assert!(case_folds <= 1, "at most one case fold may be configured");
        NormalizationSet { steps }
    }

    /// Apply every configured step, in order, to `raw`.
    pub fn apply(&self, raw: &str) -> String {
        let mut current = raw.to_string();
        for step in &self.steps {
            current = match step {
                Normalization::Nfc => current.nfc().collect(),
                Normalization::Nfd => current.nfd().collect(),
                Normalization::CaseFoldUnicode => current.to_lowercase(),
                Normalization::CaseFoldAscii => current.to_ascii_lowercase(),
            };
        }
        current
    }
}

/// A name component: the original-ish `display` form used for printing and
/// sorting, and the `canonical` form used for equality and hashing.
///
/// `canonical` is a pure function of the raw input and the filesystem's fixed
/// normalization configuration (the config cannot change once the filesystem
/// is built).
#[derive(Clone, Debug, Eq)]
pub struct Name {
    display: String,
    canonical: String,
}

impl Name {
    /// Construct a name by applying the given display/canonical normalization
    /// sets to the same raw string.
    pub fn new(raw: &str, display_norm: &NormalizationSet, canonical_norm: &NormalizationSet) -> Self {
        Name {
            display: display_norm.apply(raw),
            canonical: canonical_norm.apply(raw),
        }
    }

    /// Construct a name directly from precomputed display/canonical forms.
    /// Used for the `SELF`/`PARENT`/root sentinels, which bypass normalization.
    pub fn from_parts(display: impl Into<String>, canonical: impl Into<String>) -> Self {
        Name {
            display: display.into(),
            canonical: canonical.into(),
        }
    }

    /// The sentinel name for the current directory, `.`.
    pub fn self_name() -> Self {
        Name::from_parts(".", ".")
    }

    /// The sentinel name for the parent directory, `..`.
    pub fn parent_name() -> Self {
        Name::from_parts("..", "..")
    }

    /// Whether this name is the `.` sentinel.
    pub fn is_self(&self) -> bool {
        self.canonical == "."
    }

    /// Whether this name is the `..` sentinel.
    pub fn is_parent(&self) -> bool {
        self.canonical == ".."
    }

    /// The display form, used for printing and for `Directory::snapshot` ordering.
    pub fn display(&self) -> &str {
        &self.display
    }

    /// The canonical form, used for equality, hashing, and lookup.
    pub fn canonical(&self) -> &str {
        &self.canonical
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display)
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}

impl Hash for Name {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
    }
}

/// Allows a canonical-keyed `HashMap<Name, _>` to be looked up directly with a
/// `&str` holding an already-canonicalized form, without allocating a `Name`.
impl Borrow<str> for Name {
    fn borrow(&self) -> &str {
        &self.canonical
    }
}
