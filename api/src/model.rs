use serde::{Deserialize, Serialize};

/// Aggregated coding activity for the signed-in account, exactly as the
/// gateway reports it. Every field is required.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSummary {
    pub username: String,
    pub total_repos: u64,
    pub most_used_language: String,
    pub top_repo: String,
    pub total_stars: u64,
    pub total_forks: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_gateway_payload() {
        let payload = json!({
            "username": "octocat",
            "totalRepos": 8,
            "mostUsedLanguage": "Rust",
            "topRepo": "hello-world",
            "totalStars": 120,
            "totalForks": 14
        });

        let summary: ProfileSummary = serde_json::from_value(payload).unwrap();
        assert_eq!(summary.username, "octocat");
        assert_eq!(summary.total_repos, 8);
        assert_eq!(summary.most_used_language, "Rust");
        assert_eq!(summary.top_repo, "hello-world");
        assert_eq!(summary.total_stars, 120);
        assert_eq!(summary.total_forks, 14);
    }

    #[test]
    fn missing_field_is_rejected() {
        let payload = json!({
            "username": "octocat",
            "totalRepos": 8,
            "mostUsedLanguage": "Rust",
            "topRepo": "hello-world",
            "totalStars": 120
        });

        assert!(serde_json::from_value::<ProfileSummary>(payload).is_err());
    }
}
