//! Fortran include scanner.

use std::sync::LazyLock;

use regex::Regex;

use super::{c, delimited_name, push_unique, IncludeDirective, IncludeForm};

/// `include` keyword (any case) first on the line, then a quoted name.
static INCLUDE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)^[ \t]*include[ \t]*(['"].*)$"#)
        .unwrap_or_else(|e| unreachable!("invalid include pattern: {e}"))
});

/// Scan Fortran text for `include` statements.
///
/// Preprocessed sources (`.F90` and friends) may also use `#include`, so C
/// directives are recognized as well. Fortran includes are always
/// quote-form: they are looked up next to the including file first.
pub fn scan_fortran(text: &str) -> Vec<IncludeDirective> {
    let mut found = Vec::new();
    for line in text.lines() {
        if let Some(directive) = scan_statement(line).or_else(|| c::scan_line(line)) {
            push_unique(&mut found, directive);
        }
    }
    found
}

fn scan_statement(line: &str) -> Option<IncludeDirective> {
    let caps = INCLUDE.captures(line)?;
    let rest = caps.get(1)?.as_str();
    let close = if rest.starts_with('\'') { '\'' } else { '"' };
    let name = delimited_name(rest, close)?;
    Some(IncludeDirective {
        name: name.to_string(),
        form: IncludeForm::Quote,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_include_statements() {
        let text = "      program main\n      include 'mpif.h'\n      INCLUDE \"consts.inc\"\n";
        assert_eq!(
            scan_fortran(text),
            vec![
                IncludeDirective::quote("mpif.h"),
                IncludeDirective::quote("consts.inc"),
            ]
        );
    }

    #[test]
    fn test_comment_lines_are_ignored() {
        assert!(scan_fortran("C     include 'old.inc'").is_empty());
        assert!(scan_fortran("! include 'old.inc'").is_empty());
    }

    #[test]
    fn test_unterminated_name_is_ignored() {
        assert!(scan_fortran("      include 'broken.inc").is_empty());
        assert!(scan_fortran("      include 'mismatch.inc\"").is_empty());
    }

    #[test]
    fn test_keyword_must_stand_alone() {
        assert!(scan_fortran("      includes = 3").is_empty());
        assert!(scan_fortran("      call include('x')").is_empty());
    }

    #[test]
    fn test_preprocessor_includes_in_fortran() {
        let text = "#include \"config.h\"\n      include 'body.inc'\n";
        assert_eq!(
            scan_fortran(text),
            vec![
                IncludeDirective::quote("config.h"),
                IncludeDirective::quote("body.inc"),
            ]
        );
    }
}
