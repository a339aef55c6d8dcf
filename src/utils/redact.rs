//! Secret masking for anything that is logged or serialized.

pub const MASK: &str = "****";

/// Replace every occurrence of each non-empty secret with `****`.
///
/// Longer secrets are replaced first so a secret that contains another
/// is not left partially visible.
pub fn redact(text: &str, secrets: &[String]) -> String {
    let mut ordered: Vec<&String> = secrets.iter().filter(|s| !s.is_empty()).collect();
    ordered.sort_by_key(|s| std::cmp::Reverse(s.len()));

    let mut result = text.to_string();
    for secret in ordered {
        result = result.replace(secret.as_str(), MASK);
    }
    result
}

/// Show only the last four characters of an identifier.
pub fn mask_tail(value: &str) -> String {
    let count = value.chars().count();
    if count <= 4 {
        return MASK.to_string();
    }
    let tail: String = value.chars().skip(count - 4).collect();
    format!("{}{}", MASK, tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redact_replaces_all_occurrences() {
        let secrets = vec!["hunter2".to_string()];
        assert_eq!(
            redact("PGPASSWORD=hunter2 psql; echo hunter2", &secrets),
            "PGPASSWORD=**** psql; echo ****"
        );
    }

    #[test]
    fn redact_ignores_empty_secrets() {
        let secrets = vec![String::new()];
        assert_eq!(redact("psql -h db", &secrets), "psql -h db");
    }

    #[test]
    fn redact_prefers_longest_secret() {
        let secrets = vec!["abc".to_string(), "abcdef".to_string()];
        assert_eq!(redact("token=abcdef", &secrets), "token=****");
    }

    #[test]
    fn mask_tail_keeps_last_four() {
        assert_eq!(mask_tail("ASIAEXAMPLE1234"), "****1234");
        assert_eq!(mask_tail("abc"), "****");
    }
}
