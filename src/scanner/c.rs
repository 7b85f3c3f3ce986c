//! C-family include scanner.

use std::sync::LazyLock;

use regex::Regex;

use super::{delimited_name, push_unique, IncludeDirective, IncludeForm};

/// `#include` or `#import` at the start of a line, leading blanks allowed,
/// followed by optional blanks and the opening delimiter.
static DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^[ \t]*#[ \t]*(?:include|import)[ \t]*([<"].*)$"#)
        .unwrap_or_else(|e| unreachable!("invalid include pattern: {e}"))
});

/// Scan C, C++ and Objective-C text for header references.
pub fn scan_c(text: &str) -> Vec<IncludeDirective> {
    let mut found = Vec::new();
    for line in text.lines() {
        if let Some(directive) = scan_line(line) {
            push_unique(&mut found, directive);
        }
    }
    found
}

/// Scan a single line. Also used for `#include` in preprocessed Fortran.
pub(super) fn scan_line(line: &str) -> Option<IncludeDirective> {
    let caps = DIRECTIVE.captures(line)?;
    let rest = caps.get(1)?.as_str();
    let (form, close) = if rest.starts_with('<') {
        (IncludeForm::Angle, '>')
    } else {
        (IncludeForm::Quote, '"')
    };
    let name = delimited_name(rest, close)?;
    Some(IncludeDirective {
        name: name.to_string(),
        form,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_angle_include_with_trailing_text() {
        let found = scan_c("#include <foo.h> trailing text");
        assert_eq!(found, vec![IncludeDirective::angle("foo.h")]);
    }

    #[test]
    fn test_comment_embedded_directive_is_ignored() {
        assert!(scan_c("//#include \"foo.h\"").is_empty());
        assert!(scan_c("int x; #include \"foo.h\"").is_empty());
    }

    #[test]
    fn test_missing_close_delimiter_yields_nothing() {
        assert!(scan_c("#include <foo.h").is_empty());
        assert!(scan_c("#include \"foo.h").is_empty());
        assert!(scan_c("#include <>").is_empty());
    }

    #[test]
    fn test_macro_include_yields_nothing() {
        assert!(scan_c("#include HEADER_NAME").is_empty());
        assert!(scan_c("#include").is_empty());
        assert!(scan_c("#include_next <foo.h>").is_empty());
    }

    #[test]
    fn test_leading_whitespace_and_spacing() {
        let text = "  \t#include   \"a.h\"\n\t# include<b.h>\n#import <Cocoa/Cocoa.h>\n";
        assert_eq!(
            scan_c(text),
            vec![
                IncludeDirective::quote("a.h"),
                IncludeDirective::angle("b.h"),
                IncludeDirective::angle("Cocoa/Cocoa.h"),
            ]
        );
    }

    #[test]
    fn test_order_preserved_and_duplicates_removed() {
        let text = "#include \"z.h\"\n#include <a.h>\n#include \"z.h\"\n#include <z.h>\n";
        assert_eq!(
            scan_c(text),
            vec![
                IncludeDirective::quote("z.h"),
                IncludeDirective::angle("a.h"),
                IncludeDirective::angle("z.h"),
            ]
        );
    }

    #[test]
    fn test_conditionals_are_not_evaluated() {
        let text = "#ifdef _WIN32\n#include <windows.h>\n#else\n#include <unistd.h>\n#endif\n";
        assert_eq!(scan_c(text).len(), 2);
    }

    #[test]
    fn test_crlf_line_endings() {
        let text = "#include \"a.h\"\r\n#include \"b.h\"\r\n";
        assert_eq!(
            scan_c(text),
            vec![IncludeDirective::quote("a.h"), IncludeDirective::quote("b.h")]
        );
    }
}
