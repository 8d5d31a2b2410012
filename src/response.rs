use serde::{Serialize, Serializer};

use crate::matcher::MatchResult;
use crate::parser::ParsedReply;

const FAILURE_ERROR: &str = "서버 오류가 발생했습니다.";
const FAILURE_TITLE: &str = "오류 발생";
const FAILURE_DESCRIPTION: &str = "죄송합니다. 일시적인 오류가 발생했습니다.";
const FAILURE_EXTRA_INFO: &str = "잠시 후 다시 시도해주세요.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StructuredResponse {
    Success {
        title: String,
        description: String,
        extra_info: String,
        image_url: Option<String>,
        full_response: String,
    },
    Failure {
        error: String,
        title: String,
        description: String,
        extra_info: String,
    },
}

impl StructuredResponse {
    pub fn failure() -> Self {
        StructuredResponse::Failure {
            error: FAILURE_ERROR.to_string(),
            title: FAILURE_TITLE.to_string(),
            description: FAILURE_DESCRIPTION.to_string(),
            extra_info: FAILURE_EXTRA_INFO.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, StructuredResponse::Success { .. })
    }

    pub fn title(&self) -> &str {
        match self {
            StructuredResponse::Success { title, .. } | StructuredResponse::Failure { title, .. } => {
                title
            }
        }
    }

    pub fn extra_info(&self) -> &str {
        match self {
            StructuredResponse::Success { extra_info, .. }
            | StructuredResponse::Failure { extra_info, .. } => extra_info,
        }
    }

    pub fn image_url(&self) -> Option<&str> {
        match self {
            StructuredResponse::Success { image_url, .. } => image_url.as_deref(),
            StructuredResponse::Failure { .. } => None,
        }
    }
}

/// Merges the parsed reply with dataset facts. A non-empty facility digest
/// replaces whatever extra info the model wrote.
pub fn assemble(
    full_response: &str,
    parsed: ParsedReply,
    matched: &MatchResult<'_>,
) -> StructuredResponse {
    let extra_info = if matched.facility_digest.is_empty() {
        parsed.extra_info
    } else {
        matched.facility_digest.clone()
    };

    StructuredResponse::Success {
        title: parsed.title,
        description: parsed.description,
        extra_info,
        image_url: matched.image_url.clone(),
        full_response: full_response.to_string(),
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SuccessBody<'a> {
    success: bool,
    title: &'a str,
    description: &'a str,
    extra_info: &'a str,
    image_url: Option<&'a str>,
    full_response: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FailureBody<'a> {
    success: bool,
    error: &'a str,
    title: &'a str,
    description: &'a str,
    extra_info: &'a str,
}

impl Serialize for StructuredResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            StructuredResponse::Success {
                title,
                description,
                extra_info,
                image_url,
                full_response,
            } => SuccessBody {
                success: true,
                title,
                description,
                extra_info,
                image_url: image_url.as_deref(),
                full_response,
            }
            .serialize(serializer),
            StructuredResponse::Failure {
                error,
                title,
                description,
                extra_info,
            } => FailureBody {
                success: false,
                error,
                title,
                description,
                extra_info,
            }
            .serialize(serializer),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::dataset::{Building, Floor};
    use crate::matcher::facility_digest;

    fn parsed() -> ParsedReply {
        ParsedReply {
            title: "3호관 2층".to_string(),
            description: "전산실습실이 있습니다.".to_string(),
            extra_info: "2F: 전산실, 휴게실".to_string(),
        }
    }

    #[test]
    fn digest_overrides_model_extra_info() {
        let building = Building {
            name: "3호관".to_string(),
            image_url: Some("/static/img/3.jpg".to_string()),
            floors: vec![Floor {
                label: "2F".to_string(),
                facilities: vec!["전산실습실".to_string()],
            }],
        };
        let matched = MatchResult {
            building: Some(&building),
            image_url: building.image_url.clone(),
            facility_digest: facility_digest(&building),
            matched_by: None,
        };

        let response = assemble("raw reply", parsed(), &matched);
        assert_eq!(
            response,
            StructuredResponse::Success {
                title: "3호관 2층".to_string(),
                description: "전산실습실이 있습니다.".to_string(),
                extra_info: "3호관 시설 정보:\n2F: 전산실습실".to_string(),
                image_url: Some("/static/img/3.jpg".to_string()),
                full_response: "raw reply".to_string(),
            }
        );
    }

    #[test]
    fn no_match_keeps_model_extra_info() {
        let response = assemble("raw reply", parsed(), &MatchResult::default());
        assert!(response.is_success());
        assert_eq!(response.extra_info(), "2F: 전산실, 휴게실");
        assert_eq!(response.image_url(), None);
    }

    #[test]
    fn success_serializes_flat_camel_case() {
        let response = assemble("raw reply", parsed(), &MatchResult::default());
        let value = serde_json::to_value(&response).expect("serializes");
        assert_eq!(
            value,
            json!({
                "success": true,
                "title": "3호관 2층",
                "description": "전산실습실이 있습니다.",
                "extraInfo": "2F: 전산실, 휴게실",
                "imageUrl": null,
                "fullResponse": "raw reply",
            })
        );
    }

    #[test]
    fn failure_carries_display_sentinels() {
        let failure = StructuredResponse::failure();
        assert!(!failure.is_success());
        assert_eq!(failure.title(), "오류 발생");

        let value = serde_json::to_value(&failure).expect("serializes");
        assert_eq!(
            value,
            json!({
                "success": false,
                "error": "서버 오류가 발생했습니다.",
                "title": "오류 발생",
                "description": "죄송합니다. 일시적인 오류가 발생했습니다.",
                "extraInfo": "잠시 후 다시 시도해주세요.",
            })
        );
    }
}
