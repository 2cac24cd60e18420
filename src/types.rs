use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::Error;
use crate::token::TokenPair;

/// Envelope wrapping every forum API response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Option<Vec<String>>,
}

impl<T> ApiResponse<T> {
    pub fn into_data(self) -> Result<T, Error> {
        if !self.success {
            return Err(Error::Api(self.describe()));
        }
        self.data
            .ok_or_else(|| Error::Api(format!("response carried no data: {}", self.message)))
    }

    /// Message plus any validation errors, joined for display.
    pub fn describe(&self) -> String {
        match &self.errors {
            Some(errors) if !errors.is_empty() => {
                format!("{} ({})", self.message, errors.join("; "))
            }
            _ => self.message.clone(),
        }
    }
}

/// Vote value; serialized as `1` or `-1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum VoteType {
    Up,
    Down,
}

impl VoteType {
    pub fn value(self) -> i64 {
        match self {
            VoteType::Up => 1,
            VoteType::Down => -1,
        }
    }
}

impl TryFrom<i32> for VoteType {
    type Error = String;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(VoteType::Up),
            -1 => Ok(VoteType::Down),
            other => Err(format!("vote type must be 1 or -1, got {other}")),
        }
    }
}

impl From<VoteType> for i32 {
    fn from(vote: VoteType) -> Self {
        match vote {
            VoteType::Up => 1,
            VoteType::Down => -1,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user_id: String,
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
    pub avatar: Option<String>,
    #[serde(default)]
    pub reputation: i32,
    #[serde(default)]
    pub roles: Vec<String>,
    pub tokens: TokenPair,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub user_id: String,
    pub username: String,
    #[serde(default)]
    pub email: String,
    pub full_name: Option<String>,
    pub avatar: Option<String>,
    #[serde(default)]
    pub reputation: i32,
    pub created_at: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Problem {
    pub id: Uuid,
    pub user_id: String,
    pub username: String,
    pub user_avatar: Option<String>,
    pub title: String,
    pub content: String,
    pub category: Option<String>,
    pub difficulty: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub view_count: i64,
    #[serde(default)]
    pub solution_count: i64,
    #[serde(default)]
    pub has_accepted_solution: bool,
    #[serde(with = "server_time")]
    pub created_at: Timestamp,
    #[serde(default, deserialize_with = "server_time::option::deserialize")]
    pub updated_at: Option<Timestamp>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemDetail {
    #[serde(flatten)]
    pub problem: Problem,
    #[serde(default)]
    pub user_reputation: i32,
    #[serde(default)]
    pub solutions: Vec<Solution>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Solution {
    pub id: Uuid,
    #[serde(default)]
    pub problem_id: Uuid,
    #[serde(default)]
    pub user_id: String,
    pub username: String,
    pub user_avatar: Option<String>,
    #[serde(default)]
    pub user_reputation: i32,
    pub content: String,
    #[serde(default)]
    pub steps: Vec<String>,
    pub is_accepted: bool,
    pub vote_count: i64,
    #[serde(default)]
    pub comment_count: i64,
    #[serde(default)]
    pub current_user_vote: Option<VoteType>,
    #[serde(with = "server_time")]
    pub created_at: Timestamp,
    #[serde(default, deserialize_with = "server_time::option::deserialize")]
    pub updated_at: Option<Timestamp>,
}

/// Query for the problem list. Unset, empty and `"All"` values are left out of the query string.
#[derive(Clone, Debug, Default)]
pub struct ProblemFilter {
    pub category: Option<String>,
    pub difficulty: Option<String>,
    pub search_term: Option<String>,
    pub tag: Option<String>,
    pub has_accepted_solution: Option<bool>,
    pub sort_by: Option<String>,
    pub is_descending: Option<bool>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl ProblemFilter {
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        let mut push = |key: &str, value: Option<String>| {
            if let Some(value) = value
                && !value.is_empty()
                && value != "All"
            {
                pairs.push((key.to_string(), value));
            }
        };
        push("category", self.category.clone());
        push("difficulty", self.difficulty.clone());
        push("searchTerm", self.search_term.clone());
        push("tag", self.tag.clone());
        push(
            "hasAcceptedSolution",
            self.has_accepted_solution.map(|v| v.to_string()),
        );
        push("sortBy", self.sort_by.clone());
        push("isDescending", self.is_descending.map(|v| v.to_string()));
        push("page", self.page.map(|v| v.to_string()));
        push("pageSize", self.page_size.map(|v| v.to_string()));
        pairs
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total_count: i64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
    #[serde(default)]
    pub has_previous_page: bool,
    #[serde(default)]
    pub has_next_page: bool,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProblemRequest {
    pub title: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProblemRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSolutionRequest {
    pub problem_id: Uuid,
    pub content: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<String>,
}

#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSolutionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps: Option<Vec<String>>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub solution_id: Uuid,
    pub vote_type: VoteType,
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteResult {
    pub vote_count: i64,
}

/// Server timestamps arrive either with an offset or as naive UTC date-times.
pub(crate) mod server_time {
    use jiff::tz::TimeZone;
    use jiff::{Timestamp, civil};
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn parse(raw: &str) -> Result<Timestamp, jiff::Error> {
        raw.parse::<Timestamp>().or_else(|_| {
            let naive: civil::DateTime = raw.parse()?;
            Ok(naive.to_zoned(TimeZone::UTC)?.timestamp())
        })
    }

    pub fn serialize<S: Serializer>(ts: &Timestamp, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(ts)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Timestamp, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(de::Error::custom)
    }

    pub mod option {
        use jiff::Timestamp;
        use serde::{Deserialize, Deserializer, de};

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<Timestamp>, D::Error> {
            match Option::<String>::deserialize(deserializer)? {
                Some(raw) => super::parse(&raw).map(Some).map_err(de::Error::custom),
                None => Ok(None),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_skips_all_and_empty_values() {
        let filter = ProblemFilter {
            category: Some("All".into()),
            difficulty: Some(String::new()),
            search_term: Some("primes".into()),
            has_accepted_solution: Some(false),
            page: Some(3),
            ..ProblemFilter::default()
        };
        assert_eq!(
            filter.to_query(),
            vec![
                ("searchTerm".to_string(), "primes".to_string()),
                ("hasAcceptedSolution".to_string(), "false".to_string()),
                ("page".to_string(), "3".to_string()),
            ]
        );
    }

    #[test]
    fn vote_type_rejects_zero() {
        assert!(serde_json::from_str::<VoteType>("0").is_err());
        assert_eq!(serde_json::from_str::<VoteType>("-1").unwrap(), VoteType::Down);
        assert_eq!(serde_json::to_string(&VoteType::Up).unwrap(), "1");
    }

    #[test]
    fn naive_server_times_are_utc() {
        let solution: Solution = serde_json::from_value(serde_json::json!({
            "id": "6f1c3c1e-5d7a-4a53-9b61-0c4f6c1b2a10",
            "username": "gauss",
            "content": "Sum the series pairwise.",
            "isAccepted": true,
            "voteCount": 3,
            "currentUserVote": -1,
            "createdAt": "2025-03-01T10:00:00.5",
        }))
        .unwrap();
        assert_eq!(
            solution.created_at,
            "2025-03-01T10:00:00.5Z".parse::<Timestamp>().unwrap()
        );
        assert_eq!(solution.current_user_vote, Some(VoteType::Down));
        assert!(solution.updated_at.is_none());
    }

    #[test]
    fn envelope_without_data_decodes_for_any_payload() {
        let envelope: ApiResponse<TokenPair> = serde_json::from_value(serde_json::json!({
            "success": true,
            "message": "Logged out",
        }))
        .unwrap();
        assert!(envelope.data.is_none());
        assert!(matches!(envelope.into_data(), Err(Error::Api(msg)) if msg.contains("Logged out")));
    }

    #[test]
    fn failed_envelope_reports_validation_errors() {
        let envelope: ApiResponse<VoteResult> = serde_json::from_value(serde_json::json!({
            "success": false,
            "message": "Validation failed",
            "errors": ["Title is required"],
        }))
        .unwrap();
        match envelope.into_data() {
            Err(Error::Api(msg)) => assert_eq!(msg, "Validation failed (Title is required)"),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
