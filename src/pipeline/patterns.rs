//! Process-wide malicious content signatures.
//!
//! Built once on first use and shared read-only by every request. The
//! `regex` engine matches in linear time, so no signature can be driven into
//! catastrophic backtracking by crafted input.

use regex::RegexSet;
use std::fmt;
use std::sync::LazyLock;

/// Category of a matched signature. Logged instead of the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    ScriptTag,
    JavascriptUri,
    EventHandler,
    Iframe,
    Eval,
    SqlTautology,
    SqlDropTable,
    SqlUnionSelect,
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ScriptTag => "script_tag",
            Self::JavascriptUri => "javascript_uri",
            Self::EventHandler => "event_handler",
            Self::Iframe => "iframe",
            Self::Eval => "eval",
            Self::SqlTautology => "sql_tautology",
            Self::SqlDropTable => "sql_drop_table",
            Self::SqlUnionSelect => "sql_union_select",
        };
        f.write_str(name)
    }
}

const SIGNATURES: &[(PatternKind, &str)] = &[
    (PatternKind::ScriptTag, r"(?i)<script"),
    (PatternKind::JavascriptUri, r#"(?i)\b(?:href|src)\s*=\s*['"]?\s*javascript:"#),
    (PatternKind::EventHandler, r"(?i)\bon[a-z]{2,}\s*="),
    (PatternKind::Iframe, r"(?i)<iframe"),
    (PatternKind::Eval, r"(?i)eval\s*\("),
    (PatternKind::SqlTautology, r"(?i)\bOR\s+1\s*=\s*1\b"),
    (PatternKind::SqlDropTable, r"(?i)\bDROP\s+TABLE\b"),
    (PatternKind::SqlUnionSelect, r"(?i)\bUNION\s+(?:ALL\s+)?SELECT\b"),
];

/// Immutable, lock-free set of signatures.
pub struct MaliciousPatternSet {
    set: RegexSet,
    kinds: Vec<PatternKind>,
}

impl MaliciousPatternSet {
    fn compile() -> Result<Self, regex::Error> {
        let set = RegexSet::new(SIGNATURES.iter().map(|(_, re)| *re))?;
        let kinds = SIGNATURES.iter().map(|(kind, _)| *kind).collect();
        Ok(Self { set, kinds })
    }

    /// First signature (in declaration order) that matches `text`.
    pub fn first_match(&self, text: &str) -> Option<PatternKind> {
        self.set
            .matches(text)
            .iter()
            .next()
            .map(|idx| self.kinds[idx])
    }
}

/// The shared signature set.
pub static MALICIOUS_PATTERNS: LazyLock<MaliciousPatternSet> = LazyLock::new(|| {
    MaliciousPatternSet::compile().expect("built-in malicious signatures must compile")
});
