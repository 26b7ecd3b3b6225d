use crate::error::ParseErrorKind;
use crate::loader::Sourcer;
use crate::model::Entry;

/// Characters trimmed around names and values. Other whitespace is data.
const SPACE_TAB: &[char] = &[' ', '\t'];

/// Shape of a line once the assignment has been located.
enum Line<'a> {
    Definition { name: &'a str, raw_value: &'a str },
    /// Whitespace only, or a whole-line comment.
    Blank,
}

impl Sourcer {
    /// Parse a single line into an [`Entry`].
    ///
    /// Returns `Ok(None)` for lines that carry no definition: empty lines,
    /// whitespace-only lines and whole-line comments. Line numbers are not
    /// known here; [`Sourcer::drive`] attaches them.
    pub fn parse_line(&self, line: &str) -> Result<Option<Entry>, ParseErrorKind> {
        match self.split_line(line)? {
            Line::Blank => Ok(None),
            Line::Definition { name, raw_value } => {
                let value = self.parse_value(raw_value)?;
                Ok(Some(Entry::new(name, value)))
            }
        }
    }

    /// Normalize the text following the first `=` of a line.
    pub fn parse_value(&self, raw: &str) -> Result<String, ParseErrorKind> {
        if raw.is_empty() {
            return Ok(String::new());
        }

        if starts_with_token(raw, &self.quote) {
            if raw.ends_with(self.quote.as_str()) && raw != self.quote {
                return (self.unquote)(raw).map_err(ParseErrorKind::from);
            }
            return Err(ParseErrorKind::UnclosedQuote {
                value: raw.to_owned(),
                quote: self.quote.clone(),
            });
        }

        let uncommented = match find_token(raw, &self.comment) {
            Some(idx) => &raw[..idx],
            None => raw,
        };
        let value = uncommented.trim_end_matches(SPACE_TAB);
        if value.len() != trim_start(value).len() {
            return Err(ParseErrorKind::InvalidLeadingWhitespace(raw.to_owned()));
        }

        Ok(value.to_owned())
    }

    fn split_line<'a>(&self, line: &'a str) -> Result<Line<'a>, ParseErrorKind> {
        let mut working = trim_start(line);

        if let Some(rest) = strip_token(working, &self.export) {
            working = trim_start(rest);
            if working.is_empty() || starts_with_token(working, &self.comment) {
                return Err(ParseErrorKind::NonVariableLine(line.to_owned()));
            }
        }

        let Some((raw_name, raw_value)) = working.split_once('=') else {
            let rest = trim_start(working);
            if rest.is_empty() || starts_with_token(rest, &self.comment) {
                return Ok(Line::Blank);
            }
            return Err(ParseErrorKind::NonVariableLine(line.to_owned()));
        };

        // Comments win over assignments: `#name=value` is not a definition.
        if starts_with_token(working, &self.comment) {
            return Ok(Line::Blank);
        }

        let name = trim_start(raw_name);
        if !self.is_valid_name(name) {
            return Err(ParseErrorKind::InvalidName(name.to_owned()));
        }

        Ok(Line::Definition { name, raw_value })
    }

    fn is_valid_name(&self, name: &str) -> bool {
        !name.is_empty()
            && !name.contains(SPACE_TAB)
            && find_token(name, &self.comment).is_none()
            && find_token(name, &self.quote).is_none()
    }
}

fn trim_start(input: &str) -> &str {
    input.trim_start_matches(SPACE_TAB)
}

/// Disabled (empty) tokens never match.
fn starts_with_token(input: &str, token: &str) -> bool {
    !token.is_empty() && input.starts_with(token)
}

fn strip_token<'a>(input: &'a str, token: &str) -> Option<&'a str> {
    if token.is_empty() {
        return None;
    }
    input.strip_prefix(token)
}

fn find_token(input: &str, token: &str) -> Option<usize> {
    if token.is_empty() {
        return None;
    }
    input.find(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UnquoteError;

    fn parse(line: &str) -> Result<Option<Entry>, ParseErrorKind> {
        Sourcer::new().parse_line(line)
    }

    fn entry(line: &str) -> (String, String) {
        let entry = parse(line)
            .expect("parse should succeed")
            .expect("line should define a variable");
        (entry.name, entry.value)
    }

    fn pair(name: &str, value: &str) -> (String, String) {
        (name.to_owned(), value.to_owned())
    }

    #[test]
    fn blank_and_comment_lines_are_skipped() {
        for line in ["", " \t", "#comment", " \t#comment", "#name=value", "  # a=b"] {
            assert_eq!(parse(line), Ok(None), "line {line:?}");
        }
    }

    #[test]
    fn lines_without_assignment_are_rejected() {
        assert_eq!(
            parse("a"),
            Err(ParseErrorKind::NonVariableLine("a".to_owned()))
        );
        assert_eq!(
            parse("cat in.csv > out.csv"),
            Err(ParseErrorKind::NonVariableLine(
                "cat in.csv > out.csv".to_owned()
            ))
        );
    }

    #[test]
    fn bare_export_keyword_is_not_a_definition() {
        for line in [
            "export",
            "export \t",
            "export#comment",
            "export \t#comment",
            "export a",
            "  export",
        ] {
            assert_eq!(
                parse(line),
                Err(ParseErrorKind::NonVariableLine(line.to_owned())),
                "line {line:?}"
            );
        }
    }

    #[test]
    fn reports_invalid_names() {
        assert_eq!(parse("="), Err(ParseErrorKind::InvalidName(String::new())));
        assert_eq!(parse(" = "), Err(ParseErrorKind::InvalidName(String::new())));
        assert_eq!(parse("=a"), Err(ParseErrorKind::InvalidName(String::new())));
        assert_eq!(
            parse("a b=c"),
            Err(ParseErrorKind::InvalidName("a b".to_owned()))
        );
        assert_eq!(
            parse("a =c"),
            Err(ParseErrorKind::InvalidName("a ".to_owned()))
        );
        assert_eq!(
            parse("a#b=c"),
            Err(ParseErrorKind::InvalidName("a#b".to_owned()))
        );
        assert_eq!(
            parse("a\"b=c"),
            Err(ParseErrorKind::InvalidName("a\"b".to_owned()))
        );
    }

    #[test]
    fn parses_simple_definitions() {
        assert_eq!(entry("a=b"), pair("a", "b"));
        assert_eq!(entry("  \ta=b"), pair("a", "b"));
        assert_eq!(entry("a=b=c"), pair("a", "b=c"));
        assert_eq!(entry("GREETING=こんにちは"), pair("GREETING", "こんにちは"));
    }

    #[test]
    fn value_boundaries() {
        assert_eq!(entry("a="), pair("a", ""));
        assert_eq!(entry("a= "), pair("a", ""));
        assert_eq!(entry("a=#"), pair("a", ""));
        assert_eq!(entry("a=b  c"), pair("a", "b  c"));
        assert_eq!(entry("a=b \t"), pair("a", "b"));
        assert_eq!(entry("a=value # comment"), pair("a", "value"));
        assert_eq!(
            parse("a= b"),
            Err(ParseErrorKind::InvalidLeadingWhitespace(" b".to_owned()))
        );
        assert_eq!(
            parse("a=\tb # c"),
            Err(ParseErrorKind::InvalidLeadingWhitespace("\tb # c".to_owned()))
        );
    }

    #[test]
    fn export_prefix_is_transparent() {
        for line in ["a=b", "a=", "a=\"x y\"", "a=b # c"] {
            assert_eq!(entry(&format!("export {line}")), entry(line));
            assert_eq!(entry(&format!("  export\t {line}")), entry(line));
        }
    }

    #[test]
    fn export_token_is_stripped_without_separator() {
        assert_eq!(entry("exportA=1"), pair("A", "1"));
    }

    #[test]
    fn quoted_values_are_unquoted() {
        assert_eq!(entry(r#"name3="Hello\nWorld""#), pair("name3", "Hello\nWorld"));
        assert_eq!(entry(r#"a="b # not a comment""#), pair("a", "b # not a comment"));
        assert_eq!(entry(r#"a="  padded  ""#), pair("a", "  padded  "));
        assert_eq!(entry(r#"a="""#), pair("a", ""));
    }

    #[test]
    fn reports_unclosed_quotes() {
        assert_eq!(
            parse("a=\""),
            Err(ParseErrorKind::UnclosedQuote {
                value: "\"".to_owned(),
                quote: "\"".to_owned(),
            })
        );
        assert_eq!(
            parse("a=\"b"),
            Err(ParseErrorKind::UnclosedQuote {
                value: "\"b".to_owned(),
                quote: "\"".to_owned(),
            })
        );
        assert_eq!(
            parse("a=\"b\" # trailing"),
            Err(ParseErrorKind::UnclosedQuote {
                value: "\"b\" # trailing".to_owned(),
                quote: "\"".to_owned(),
            })
        );
    }

    #[test]
    fn reports_unquote_failures() {
        assert_eq!(
            parse(r#"a="\q""#),
            Err(ParseErrorKind::Unquote(UnquoteError::UnknownEscape('q')))
        );
    }

    #[test]
    fn disabled_comment_token_keeps_hash_literal() {
        let sourcer = Sourcer::new().comment("");
        assert_eq!(
            sourcer.parse_line("#comment"),
            Err(ParseErrorKind::NonVariableLine("#comment".to_owned()))
        );
        let parsed = sourcer
            .parse_line("#a=b # c")
            .expect("parse should succeed")
            .expect("line should define a variable");
        assert_eq!(parsed, Entry::new("#a", "b # c"));
        assert_eq!(sourcer.parse_line(""), Ok(None));
    }

    #[test]
    fn disabled_quote_token_keeps_quotes_literal() {
        let sourcer = Sourcer::new().quote("");
        let parsed = sourcer
            .parse_line(r#"a="b\n""#)
            .expect("parse should succeed")
            .expect("line should define a variable");
        assert_eq!(parsed, Entry::new("a", r#""b\n""#));
    }

    #[test]
    fn disabled_export_token_treats_keyword_as_text() {
        let sourcer = Sourcer::new().export("");
        assert_eq!(
            sourcer.parse_line("export a=b"),
            Err(ParseErrorKind::InvalidName("export a".to_owned()))
        );
        assert_eq!(
            sourcer.parse_line("export"),
            Err(ParseErrorKind::NonVariableLine("export".to_owned()))
        );
    }

    #[test]
    fn custom_tokens_and_unquote_strategy() {
        fn strip_only(input: &str) -> Result<String, UnquoteError> {
            Ok(input[1..input.len() - 1].to_owned())
        }

        let sourcer = Sourcer::new()
            .comment(";")
            .quote("'")
            .export("set")
            .unquote(strip_only);

        assert_eq!(sourcer.parse_line("; note"), Ok(None));
        let parsed = sourcer
            .parse_line(r"set a='x\n' ; ignored")
            .expect_err("trailing text after quote should fail");
        assert!(matches!(parsed, ParseErrorKind::UnclosedQuote { .. }));

        let parsed = sourcer
            .parse_line(r"set a='x\n # y'")
            .expect("parse should succeed")
            .expect("line should define a variable");
        assert_eq!(parsed, Entry::new("a", r"x\n # y"));

        let parsed = sourcer
            .parse_line("b=1 ; two")
            .expect("parse should succeed")
            .expect("line should define a variable");
        assert_eq!(parsed, Entry::new("b", "1"));
    }
}
