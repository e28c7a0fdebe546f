/// A fixed-window rate limit bucket.
///
/// Policies are static configuration, resolved for a request path by ordered
/// substring match ([`RateLimitPolicy::classify`]); the first matching bucket
/// wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitPolicy {
    /// Bucket name, used in logs and counter keys.
    pub name: &'static str,
    /// Path fragment that selects this bucket, empty for the fallback.
    pub path_fragment: &'static str,
    /// Maximum requests allowed within one window.
    pub max_requests: u32,
    /// Window duration in milliseconds.
    pub window_ms: u64,
}

impl RateLimitPolicy {
    /// Resolves the policy for a request path.
    ///
    /// Checks buckets in declaration order and returns the first whose path
    /// fragment occurs anywhere in the path; the last policy must be the
    /// catch-all with an empty fragment.
    #[must_use]
    pub fn classify<'a>(policies: &'a [Self], path: &str) -> &'a Self {
        policies
            .iter()
            .find(|policy| path.contains(policy.path_fragment))
            .unwrap_or(&FALLBACK)
    }
}

static FALLBACK: RateLimitPolicy = RateLimitPolicy {
    name: "default",
    path_fragment: "",
    max_requests: 60,
    window_ms: 60_000,
};

/// Returns the fixed policy table: signup, login, generic API, default.
#[must_use]
pub fn default_policies() -> &'static [RateLimitPolicy] {
    static POLICIES: &[RateLimitPolicy] = &[
        RateLimitPolicy {
            name: "signup",
            path_fragment: "/signup",
            max_requests: 5,
            window_ms: 60 * 60 * 1000,
        },
        RateLimitPolicy {
            name: "login",
            path_fragment: "/login",
            max_requests: 10,
            window_ms: 15 * 60 * 1000,
        },
        RateLimitPolicy {
            name: "api",
            path_fragment: "/api/",
            max_requests: 100,
            window_ms: 60_000,
        },
        RateLimitPolicy {
            name: "default",
            path_fragment: "",
            max_requests: 60,
            window_ms: 60_000,
        },
    ];

    POLICIES
}

/// One live counter window for a `"{ip}:{path}"` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitEntry {
    /// Requests counted in the active window.
    pub count: u32,
    /// Epoch milliseconds at which the window expires.
    pub reset_at_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::{RateLimitPolicy, default_policies};

    #[test]
    fn signup_paths_use_signup_bucket() {
        let policy = RateLimitPolicy::classify(default_policies(), "/auth/signup");
        assert_eq!(policy.name, "signup");
        assert_eq!(policy.max_requests, 5);
    }

    #[test]
    fn first_matching_bucket_wins() {
        // Contains both "/signup" and "/api/"; signup is listed first.
        let policy = RateLimitPolicy::classify(default_policies(), "/api/signup");
        assert_eq!(policy.name, "signup");
    }

    #[test]
    fn api_paths_use_api_bucket() {
        let policy = RateLimitPolicy::classify(default_policies(), "/api/verify");
        assert_eq!(policy.name, "api");
        assert_eq!(policy.max_requests, 100);
    }

    #[test]
    fn unmatched_paths_fall_back_to_default() {
        let policy = RateLimitPolicy::classify(default_policies(), "/pricing");
        assert_eq!(policy.name, "default");
        assert_eq!(policy.max_requests, 60);
    }
}
