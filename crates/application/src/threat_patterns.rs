//! Fixed pattern tables for the threat matchers.
//!
//! Each body-scanning category owns an ordered list of case-insensitive
//! regular expressions compiled once on first use. Matching is boolean: a
//! value is dirty for a category as soon as any pattern in its list matches.
//! There is no scoring and no confidence threshold.

use std::sync::LazyLock;

use fusion_domain::ThreatCategory;
use regex::Regex;

static SQL_INJECTION: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"(?i)\bunion(\s+all)?\s+select\b",
        r"(?i)'\s*(or|and)\s+",
        r"(?i)\b(or|and)\s+\d+\s*=\s*\d+",
        r"(?i)\b(select\s+[\w\*,\s]+\s+from|insert\s+into|delete\s+from|drop\s+(table|database)|truncate\s+table)\b",
        r"(?i);\s*(drop|delete|update|insert|alter)\b",
        r"(?i)(--|/\*|\*/|\bxp_cmdshell\b|\binformation_schema\b)",
        r"(?i)\bexec(ute)?\s*[\s(]+(s|x)p_\w+",
        r"(?i)(\bwaitfor\s+delay\b|\bsleep\s*\(|\bbenchmark\s*\()",
    ])
});

static XSS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"(?i)<\s*script[^>]*>",
        r"(?i)javascript\s*:",
        r"(?i)\bon(load|error|click|mouseover|focus|submit)\s*=",
        r"(?i)<\s*(iframe|object|embed)\b",
        r"(?i)(document\.cookie|document\.write|window\.location)",
        r"(?i)\beval\s*\(",
    ])
});

static PATH_TRAVERSAL: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"(?i)(\.\.|%2e%2e)(/|\\|%2f|%5c)",
        r"(?i)/etc/(passwd|shadow|hosts)",
        r"(?i)(c:\\|%windir%|boot\.ini|win\.ini)",
        r"(?i)(/proc/self|/var/log)",
    ])
});

static COMMAND_INJECTION: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"(?i)[;&|]\s*(cat|ls|pwd|whoami|id|uname|curl|wget|nc|netcat|bash|sh|powershell|cmd)\b",
        r"\$\([^)]*\)",
        r"`[^`]+`",
        r"(?i)(;|\|\||&&)\s*(rm|chmod|chown|kill|shutdown|reboot)\b",
        r"(?i)\b(rm\s+-rf|mkfifo|/dev/tcp/)",
    ])
});

/// Tool names that mark a user agent as offensive tooling.
static SUSPICIOUS_AGENT_FRAGMENTS: &[&str] = &[
    "sqlmap",
    "nikto",
    "nmap",
    "masscan",
    "metasploit",
    "burp",
    "dirbuster",
    "gobuster",
    "wpscan",
    "hydra",
    "havij",
    "acunetix",
    "nessus",
];

fn compile(sources: &[&str]) -> Vec<Regex> {
    sources
        .iter()
        .filter_map(|source| Regex::new(source).ok())
        .collect()
}

/// Returns the compiled pattern list for a body-scanning category.
///
/// `SuspiciousActivity` and `BruteForce` are not body-content categories and
/// yield an empty list.
#[must_use]
pub fn body_patterns(category: ThreatCategory) -> &'static [Regex] {
    match category {
        ThreatCategory::SqlInjection => SQL_INJECTION.as_slice(),
        ThreatCategory::XssAttempt => XSS.as_slice(),
        ThreatCategory::PathTraversal => PATH_TRAVERSAL.as_slice(),
        ThreatCategory::CommandInjection => COMMAND_INJECTION.as_slice(),
        ThreatCategory::SuspiciousActivity | ThreatCategory::BruteForce => &[],
    }
}

/// Returns whether a string value matches any pattern of the category.
#[must_use]
pub fn matches_category(category: ThreatCategory, value: &str) -> bool {
    body_patterns(category)
        .iter()
        .any(|pattern| pattern.is_match(value))
}

/// Returns whether a user agent names known offensive tooling.
///
/// Matched by case-insensitive substring against a fixed tool list,
/// independent of any body content.
#[must_use]
pub fn is_suspicious_user_agent(user_agent: &str) -> bool {
    let lowered = user_agent.to_lowercase();
    SUSPICIOUS_AGENT_FRAGMENTS
        .iter()
        .any(|fragment| lowered.contains(fragment))
}

#[cfg(test)]
mod tests {
    use fusion_domain::ThreatCategory;

    use super::{body_patterns, is_suspicious_user_agent, matches_category};

    #[test]
    fn every_pattern_table_compiles_fully() {
        // compile() drops patterns that fail to parse; the counts here pin
        // the tables so a broken pattern cannot vanish silently.
        assert_eq!(body_patterns(ThreatCategory::SqlInjection).len(), 8);
        assert_eq!(body_patterns(ThreatCategory::XssAttempt).len(), 6);
        assert_eq!(body_patterns(ThreatCategory::PathTraversal).len(), 4);
        assert_eq!(body_patterns(ThreatCategory::CommandInjection).len(), 5);
    }

    #[test]
    fn classic_sql_injection_values_match() {
        for value in [
            "a' OR '1'='1",
            "1 UNION SELECT password FROM users",
            "x; DROP TABLE accounts",
            "admin'--",
            "1 AND sleep(5)",
        ] {
            assert!(
                matches_category(ThreatCategory::SqlInjection, value),
                "expected SQLi match for {value:?}"
            );
        }
    }

    #[test]
    fn classic_xss_values_match() {
        for value in [
            "<script>alert(1)</script>",
            "<SCRIPT src=evil.js>",
            "javascript:alert(document.cookie)",
            "<img onerror=alert(1)>",
            "<iframe src=//evil>",
        ] {
            assert!(
                matches_category(ThreatCategory::XssAttempt, value),
                "expected XSS match for {value:?}"
            );
        }
    }

    #[test]
    fn traversal_values_match_including_percent_encoding() {
        for value in ["../../etc/passwd", r"..\..\windows", "..%2f..%2fsecret"] {
            assert!(
                matches_category(ThreatCategory::PathTraversal, value),
                "expected traversal match for {value:?}"
            );
        }
    }

    #[test]
    fn command_injection_values_match() {
        for value in ["; cat /etc/passwd", "$(whoami)", "`id`", "&& rm -rf /"] {
            assert!(
                matches_category(ThreatCategory::CommandInjection, value),
                "expected command injection match for {value:?}"
            );
        }
    }

    #[test]
    fn benign_values_do_not_match() {
        for value in [
            "hello world",
            "a.b@example.com",
            "A phrase with and in it",
            "price is 10 EUR",
        ] {
            for category in [
                ThreatCategory::SqlInjection,
                ThreatCategory::XssAttempt,
                ThreatCategory::PathTraversal,
                ThreatCategory::CommandInjection,
            ] {
                assert!(
                    !matches_category(category, value),
                    "unexpected {category} match for {value:?}"
                );
            }
        }
    }

    #[test]
    fn tool_user_agents_are_suspicious() {
        assert!(is_suspicious_user_agent("sqlmap/1.5"));
        assert!(is_suspicious_user_agent("Mozilla/5.0 (Nikto scan)"));
        assert!(!is_suspicious_user_agent(
            "Mozilla/5.0 (X11; Linux x86_64) Firefox/142.0"
        ));
    }

    #[test]
    fn non_body_categories_have_no_patterns() {
        assert!(body_patterns(ThreatCategory::SuspiciousActivity).is_empty());
        assert!(body_patterns(ThreatCategory::BruteForce).is_empty());
    }
}
