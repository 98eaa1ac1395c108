//! Lexical inspection of submitted source text.
//!
//! Submitted code is never executed. The scanner strips comments, then
//! matches import statements and the entry class declaration with regular
//! expressions. It is not a grammar parse: imports bound under an alias and
//! later re-exported or names assembled at runtime can slip past it, and a
//! base list nested more than one parenthesis deep is not recognised. Callers depend on the
//! [`SourceScanner`] trait so a grammar-aware scanner can replace
//! [`LexicalScanner`] without touching validation.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::policy::CodePolicy;

/// `#` line comments, triple-quoted blocks and single-line string literals.
/// Leftmost match wins, so a `#` inside a block or string and a quote run
/// inside a line comment are all handled. String literals are matched only
/// so they can be kept as they are.
static COMMENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?s)'''.*?'''|""".*?"""|#[^\r\n]*|"(?:\\.|[^"\\\n])*"|'(?:\\.|[^'\\\n])*'"#,
    )
    .expect("comment pattern is valid")
});

static CLASS_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_]+$").expect("class name pattern is valid"));

/// One reason a source text fails its policy.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum SourceViolation {
    /// A forbidden library is imported.
    #[error("code contains restricted library {0}")]
    ForbiddenLibrary(String),

    /// A required library is never imported.
    #[error("code does not import required library {0}")]
    MissingLibrary(String),

    /// The declared class name is not a plain identifier.
    #[error("invalid className '{0}': only letters, digits and underscore are allowed")]
    InvalidClassName(String),

    /// No matching `class` statement derives from the base class.
    #[error("class {class_name} with base class {base_class} not found")]
    ClassNotFound { class_name: String, base_class: String },
}

/// Static checks over decoded source text.
pub trait SourceScanner: Send + Sync {
    /// Removes comments so they can neither hide nor fake library usage.
    fn strip_comments(&self, text: &str) -> String;

    /// Checks every forbidden and required library independently.
    ///
    /// # Errors
    /// Returns every violation found, forbidden libraries first.
    fn check_libraries(
        &self,
        text: &str,
        forbidden: &[String],
        required: &[String],
    ) -> Result<(), Vec<SourceViolation>>;

    /// Checks that `class_name` is declared with `base_class` among its bases.
    ///
    /// # Errors
    /// Returns [`SourceViolation::InvalidClassName`] or
    /// [`SourceViolation::ClassNotFound`].
    fn check_class_declaration(
        &self,
        text: &str,
        class_name: &str,
        base_class: &str,
    ) -> Result<(), SourceViolation>;

    /// Strips comments, then runs the library and class checks under `policy`.
    ///
    /// # Errors
    /// Returns all violations from both checks.
    fn analyze(
        &self,
        text: &str,
        policy: &CodePolicy,
        class_name: &str,
    ) -> Result<(), Vec<SourceViolation>> {
        let code = self.strip_comments(text);
        let mut violations = self
            .check_libraries(&code, &policy.forbidden_libraries, &policy.required_libraries)
            .err()
            .unwrap_or_default();
        if let Err(violation) = self.check_class_declaration(&code, class_name, &policy.base_class) {
            violations.push(violation);
        }
        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

/// Regex-based [`SourceScanner`].
///
/// Patterns that fail to compile (only possible for pathological policy
/// entries) count as a violation rather than a pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexicalScanner;

impl LexicalScanner {
    /// Creates a scanner.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// `import a, b as c, LIB[.sub]` or `from LIB[.sub] import ...`.
    fn import_pattern(library: &str) -> Option<Regex> {
        let lib = regex::escape(library);
        Regex::new(&format!(
            r"\bimport\s+(?:[\w.]+(?:\s+as\s+\w+)?\s*,\s*)*{lib}\b|\bfrom\s+{lib}\b"
        ))
        .ok()
    }

    /// `__import__("LIB")` or `importlib.import_module("LIB")`.
    fn dynamic_import_pattern(library: &str) -> Option<Regex> {
        let lib = regex::escape(library);
        Regex::new(&format!(r#"\b(?:__import__|import_module)\s*\(\s*['"]{lib}\b"#)).ok()
    }

    fn imports(text: &str, library: &str) -> bool {
        Self::import_pattern(library).is_some_and(|re| re.is_match(text))
    }
}

impl SourceScanner for LexicalScanner {
    fn strip_comments(&self, text: &str) -> String {
        let stripped = COMMENT_RE.replace_all(text, |caps: &Captures<'_>| {
            let matched = &caps[0];
            if matched.starts_with('#') {
                String::new()
            } else if matched.starts_with("'''") || matched.starts_with(r#"""""#) {
                " ".to_owned()
            } else {
                matched.to_owned()
            }
        });
        stripped.into_owned()
    }

    fn check_libraries(
        &self,
        text: &str,
        forbidden: &[String],
        required: &[String],
    ) -> Result<(), Vec<SourceViolation>> {
        let mut violations = Vec::new();
        for library in forbidden {
            let dynamic = Self::dynamic_import_pattern(library);
            let clean = Self::import_pattern(library).is_some_and(|re| !re.is_match(text))
                && dynamic.is_some_and(|re| !re.is_match(text));
            if !clean {
                violations.push(SourceViolation::ForbiddenLibrary(library.clone()));
            }
        }
        for library in required {
            if !Self::imports(text, library) {
                violations.push(SourceViolation::MissingLibrary(library.clone()));
            }
        }
        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }

    fn check_class_declaration(
        &self,
        text: &str,
        class_name: &str,
        base_class: &str,
    ) -> Result<(), SourceViolation> {
        if !CLASS_NAME_RE.is_match(class_name) {
            return Err(SourceViolation::InvalidClassName(class_name.to_owned()));
        }
        let pattern = format!(
            r"\bclass\s+{}\s*\(((?:[^()]|\([^()]*\))*)\)\s*:",
            regex::escape(class_name)
        );
        let declared = Regex::new(&pattern).is_ok_and(|re| {
            re.captures_iter(text)
                .any(|caps| caps.get(1).is_some_and(|bases| lists_base(bases.as_str(), base_class)))
        });
        if declared {
            Ok(())
        } else {
            Err(SourceViolation::ClassNotFound {
                class_name: class_name.to_owned(),
                base_class: base_class.to_owned(),
            })
        }
    }
}

/// Whether a comma-separated base list names `base_class`, bare or qualified.
/// Commas inside nested parentheses do not separate entries.
fn lists_base(bases: &str, base_class: &str) -> bool {
    let mut entries = Vec::new();
    let (mut depth, mut start) = (0usize, 0);
    for (i, c) in bases.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                entries.push(&bases[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    entries.push(&bases[start..]);
    entries
        .into_iter()
        .filter_map(|entry| entry.trim().rsplit('.').next())
        .any(|last| last.trim() == base_class)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::samples::POP_DENSITY_SOURCE;

    fn libs(names: &[&str]) -> Vec<String> {
        names.iter().map(|&n| n.to_owned()).collect()
    }

    #[test]
    fn strip_comments_removes_line_comments_and_keeps_newlines() {
        let code = "x = 1  # import multiprocessing\ny = 2\n# whole line\n";
        let stripped = LexicalScanner.strip_comments(code);
        assert_eq!(stripped, "x = 1  \ny = 2\n\n");
    }

    #[test]
    fn strip_comments_removes_multiline_blocks() {
        let code = "a = 1\n\"\"\"\nimport multiprocessing\n\"\"\"\nb = '''x\ny'''\n";
        let stripped = LexicalScanner.strip_comments(code);
        assert!(!stripped.contains("multiprocessing"), "block content must be gone: {stripped}");
        assert!(stripped.contains("a = 1") && stripped.contains("b = "), "code must survive");
    }

    #[test]
    fn strip_comments_hash_inside_block_does_not_eat_closing_quotes() {
        let code = "\"\"\"see #12 \"\"\"\nimport opalalgorithms\n";
        let stripped = LexicalScanner.strip_comments(code);
        assert!(stripped.contains("import opalalgorithms"), "got: {stripped}");
    }

    #[test]
    fn strip_comments_handles_comment_without_trailing_newline() {
        let stripped = LexicalScanner.strip_comments("import opalalgorithms # from multiprocessing");
        assert!(!stripped.contains("multiprocessing"));
    }

    #[test]
    fn forbidden_library_detected_in_every_import_form() {
        let forbidden = libs(&["multiprocessing"]);
        for code in [
            "import multiprocessing\n",
            "import os, multiprocessing\n",
            "import os as o, multiprocessing.pool\n",
            "from multiprocessing import Pool\n",
            "from multiprocessing.pool import ThreadPool\n",
            "if True: import multiprocessing\n",
            "m = __import__('multiprocessing')\n",
            "m = importlib.import_module(\"multiprocessing.pool\")\n",
        ] {
            let result = LexicalScanner.check_libraries(code, &forbidden, &[]);
            assert_eq!(
                result,
                Err(vec![SourceViolation::ForbiddenLibrary("multiprocessing".to_owned())]),
                "must reject: {code}"
            );
        }
    }

    #[test]
    fn forbidden_library_prefix_of_other_name_is_allowed() {
        let forbidden = libs(&["multiprocessing"]);
        let code = "import multiprocessing_utils\nfrom multiprocessingx import y\n";
        assert_eq!(LexicalScanner.check_libraries(code, &forbidden, &[]), Ok(()));
    }

    #[test]
    fn required_library_missing_is_reported() {
        let required = libs(&["opalalgorithms"]);
        let result = LexicalScanner.check_libraries("import numpy\n", &[], &required);
        assert_eq!(
            result,
            Err(vec![SourceViolation::MissingLibrary("opalalgorithms".to_owned())])
        );
    }

    #[test]
    fn all_library_violations_are_collected() {
        let forbidden = libs(&["multiprocessing", "subprocess"]);
        let required = libs(&["opalalgorithms"]);
        let code = "import multiprocessing\nimport subprocess\n";
        match LexicalScanner.check_libraries(code, &forbidden, &required) {
            Err(violations) => assert_eq!(violations.len(), 3, "got {violations:?}"),
            Ok(()) => panic!("three violations expected"),
        }
    }

    #[test]
    fn class_declaration_accepts_bare_and_qualified_base() {
        for code in [
            "class PopulationDensity(OPALAlgorithm):\n    pass\n",
            "class PopulationDensity(opalalgorithms.core.OPALAlgorithm):\n    pass\n",
            "class PopulationDensity(Mixin, OPALAlgorithm) :\n    pass\n",
            "class PopulationDensity(\n    OPALAlgorithm,\n):\n    pass\n",
        ] {
            assert_eq!(
                LexicalScanner.check_class_declaration(code, "PopulationDensity", "OPALAlgorithm"),
                Ok(()),
                "must accept: {code}"
            );
        }
    }

    #[test]
    fn class_declaration_rejects_wrong_name_or_base() {
        let code = "class PopulationDensity(OPALPrivacy):\n    pass\nclass Other(OPALAlgorithm):\n    pass\n";
        for (name, base) in [("PopulationDensity", "OPALAlgorithm"), ("Missing", "OPALAlgorithm")] {
            assert!(
                matches!(
                    LexicalScanner.check_class_declaration(code, name, base),
                    Err(SourceViolation::ClassNotFound { .. })
                ),
                "{name}({base}) must not be found"
            );
        }
    }

    #[test]
    fn class_declaration_does_not_match_longer_class_name() {
        let code = "class PopulationDensityV2(OPALAlgorithm):\n    pass\n";
        assert!(LexicalScanner
            .check_class_declaration(code, "PopulationDensity", "OPALAlgorithm")
            .is_err());
    }

    #[test]
    fn class_declaration_rejects_non_identifier_class_name() {
        let result = LexicalScanner.check_class_declaration("", "Pop.*", "OPALAlgorithm");
        assert_eq!(result, Err(SourceViolation::InvalidClassName("Pop.*".to_owned())));
    }

    #[test]
    fn analyze_accepts_sample_algorithm() {
        let result = LexicalScanner.analyze(POP_DENSITY_SOURCE, &CodePolicy::main(), "PopulationDensity");
        assert_eq!(result, Ok(()));
    }

    #[test]
    fn analyze_ignores_library_usage_inside_comments() {
        let code = format!("# import multiprocessing\n'''from multiprocessing import Pool'''\n{POP_DENSITY_SOURCE}");
        let result = LexicalScanner.analyze(&code, &CodePolicy::main(), "PopulationDensity");
        assert_eq!(result, Ok(()));
    }

    #[test]
    fn analyze_sees_import_after_hash_inside_string() {
        let code = format!("{POP_DENSITY_SOURCE}tag = '#'; import multiprocessing\n");
        let result = LexicalScanner.analyze(&code, &CodePolicy::main(), "PopulationDensity");
        assert_eq!(
            result,
            Err(vec![SourceViolation::ForbiddenLibrary("multiprocessing".to_owned())])
        );
    }

    #[test]
    fn analyze_sees_import_between_strings_holding_triple_quotes() {
        let code = format!("a = \"'''\"\nimport multiprocessing\nb = \"'''\"\n{POP_DENSITY_SOURCE}");
        let result = LexicalScanner.analyze(&code, &CodePolicy::main(), "PopulationDensity");
        assert_eq!(
            result,
            Err(vec![SourceViolation::ForbiddenLibrary("multiprocessing".to_owned())])
        );
    }

    #[test]
    fn strip_comments_keeps_string_literals_verbatim() {
        let code = "s = 'it\\'s # kept'  # gone\nt = \"#x\"\n";
        let stripped = LexicalScanner.strip_comments(code);
        assert_eq!(stripped, "s = 'it\\'s # kept'  \nt = \"#x\"\n");
    }

    #[test]
    fn class_declaration_accepts_call_in_base_list() {
        let code = "class PopulationDensity(OPALAlgorithm, metaclass=make(a, b)):\n    pass\n";
        assert_eq!(
            LexicalScanner.check_class_declaration(code, "PopulationDensity", "OPALAlgorithm"),
            Ok(())
        );
    }

    #[test]
    fn analyze_does_not_count_commented_required_import() {
        let code = "# import opalalgorithms\nclass PopulationDensity(OPALAlgorithm):\n    pass\n";
        let result = LexicalScanner.analyze(code, &CodePolicy::main(), "PopulationDensity");
        assert_eq!(
            result,
            Err(vec![SourceViolation::MissingLibrary("opalalgorithms".to_owned())])
        );
    }

    proptest::proptest! {
        #[test]
        fn proptest_forbidden_import_always_rejected(
            alias in "[a-z]{1,8}",
            line in 0usize..12,
        ) {
            let mut lines: Vec<String> = POP_DENSITY_SOURCE.lines().map(str::to_owned).collect();
            let at = line.min(lines.len());
            lines.insert(at, format!("import multiprocessing as {alias}"));
            let code = lines.join("\n");
            let result = LexicalScanner.analyze(&code, &CodePolicy::main(), "PopulationDensity");
            proptest::prop_assert!(
                matches!(&result, Err(v) if v.contains(&SourceViolation::ForbiddenLibrary("multiprocessing".to_owned()))),
                "forbidden import must be rejected, got {:?}", result
            );
        }

        #[test]
        fn proptest_strip_comments_never_grows_text(text in "\\PC{0,200}") {
            let stripped = LexicalScanner.strip_comments(&text);
            proptest::prop_assert!(stripped.len() <= text.len());
        }
    }
}
