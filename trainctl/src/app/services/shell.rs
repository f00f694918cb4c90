// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2026 Alex Sizykh

/// Quotes `value` as a single POSIX shell word.
pub fn sh_escape(value: &str) -> String {
    let mut out = String::from("'");
    out.push_str(&value.replace('\'', r"'\''"));
    out.push('\'');
    out
}

/// `echo <line> >> <target>`, with `line` quoted and `target` left to the
/// shell so `$HOME` expands for the login user.
pub fn append_line(line: &str, target: &str) -> String {
    format!("echo {} >> {}", sh_escape(line), target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_single_quotes() {
        assert_eq!(sh_escape("it's"), r"'it'\''s'");
        assert_eq!(sh_escape(""), "''");
    }

    #[test]
    fn append_line_keeps_double_quotes_literal() {
        assert_eq!(
            append_line(r#"c.A = "b""#, "\"$HOME/x.py\""),
            r#"echo 'c.A = "b"' >> "$HOME/x.py""#
        );
    }
}
