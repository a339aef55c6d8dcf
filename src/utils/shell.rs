//! Shell escaping and quoting utilities.

/// Escape a value for use inside single quotes.
/// Replaces `'` with `'\''` (end quote, escaped quote, start quote).
pub fn escape_single_quote_content(value: &str) -> String {
    value.replace('\'', "'\\''")
}

/// Quote a single argument for shell execution.
/// - Empty strings become `''`
/// - Strings with shell metacharacters are wrapped in single quotes
/// - Embedded single quotes are escaped
pub fn quote_arg(arg: &str) -> String {
    if arg.is_empty() {
        return "''".to_string();
    }

    const SHELL_META: &[char] = &[
        ' ', '\t', '\n', '\'', '"', '\\', '$', '`', '!', '*', '?', '[', ']', '(', ')', '{', '}',
        '<', '>', '|', '&', ';', '#', '~',
    ];

    if !arg.contains(SHELL_META) {
        return arg.to_string();
    }

    format!("'{}'", escape_single_quote_content(arg))
}

/// Escape an entire command string for `bash -c` execution.
/// Wraps the command in single quotes and escapes embedded quotes.
pub fn escape_command_for_shell(command: &str) -> String {
    format!("'{}'", escape_single_quote_content(command))
}

/// Quote a path for shell execution (always quotes).
pub fn quote_path(path: &str) -> String {
    format!("'{}'", escape_single_quote_content(path))
}

/// `NAME=value` prefix assignment with the value quoted when needed.
pub fn env_assignment(name: &str, value: &str) -> String {
    format!("{}={}", name, quote_arg(value))
}

/// Wrap SQL in double quotes for `psql -c`.
/// Escapes the characters bash still interprets inside double quotes.
pub fn double_quote(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len() + 2);
    escaped.push('"');
    for c in value.chars() {
        if matches!(c, '"' | '\\' | '$' | '`') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('"');
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_arg_plain_identifier() {
        assert_eq!(quote_arg("app_db"), "app_db");
        assert_eq!(quote_arg("5432"), "5432");
    }

    #[test]
    fn quote_arg_password_with_metachars() {
        assert_eq!(quote_arg("pa$$ word"), "'pa$$ word'");
    }

    #[test]
    fn quote_arg_with_single_quote() {
        assert_eq!(quote_arg("it's"), "'it'\\''s'");
    }

    #[test]
    fn quote_arg_empty() {
        assert_eq!(quote_arg(""), "''");
    }

    #[test]
    fn escape_command_wraps_pod_script() {
        assert_eq!(
            escape_command_for_shell("rm -f '/tmp/dump_1.sql'"),
            "'rm -f '\\''/tmp/dump_1.sql'\\'''"
        );
    }

    #[test]
    fn quote_path_simple() {
        assert_eq!(quote_path("/tmp/dump_1.sql"), "'/tmp/dump_1.sql'");
    }

    #[test]
    fn env_assignment_quotes_when_needed() {
        assert_eq!(env_assignment("PGPASSWORD", "secret"), "PGPASSWORD=secret");
        assert_eq!(env_assignment("PGPASSWORD", ""), "PGPASSWORD=''");
        assert_eq!(env_assignment("PGPASSWORD", "a b"), "PGPASSWORD='a b'");
    }

    #[test]
    fn double_quote_escapes_expansions() {
        assert_eq!(double_quote("CREATE DATABASE app_r_1"), "\"CREATE DATABASE app_r_1\"");
        assert_eq!(double_quote("say \"$x\""), "\"say \\\"\\$x\\\"\"");
    }
}
