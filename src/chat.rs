use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use tokio::sync::Semaphore;

use crate::config::AppConfig;
use crate::dataset::FacilityDataset;
use crate::llm::{ChatModel, CompletionRequest};
use crate::matcher::match_question;
use crate::normalize::normalize_reply;
use crate::parser::parse_reply;
use crate::response::{assemble, StructuredResponse};

const BASE_PROMPT: &str = "당신은 동양미래대학교 캠퍼스 안내 챗봇입니다. 사용자가 캠퍼스 내 위치, 시설, 건물 등에 대해 질문하면 친절하고 정확하게 답변해주세요.

답변 시 다음 형식을 따라주세요:
1. 제목: 건물명 또는 시설명 (예: \"7호관 3층\", \"도서관 4층\")
2. 설명: 주요 정보를 간결하게 설명
3. 추가 정보: 층별 시설 목록이나 상세 안내

중요 사항:
- 반드시 제공된 JSON 데이터에 있는 정보만 사용하세요
- 건물명은 정확히 일치시켜주세요 (예: \"1호관\", \"2호관\", \"도서관\")
- 층수는 JSON 데이터에 명시된 형식 그대로 사용하세요 (예: \"1F\", \"2F\", \"B1F\")
- 시설명도 JSON 데이터에 있는 정확한 이름을 사용하세요
- JSON 데이터에 없는 정보는 추측하지 말고 \"해당 정보를 찾을 수 없습니다\"라고 답변하세요
";

#[derive(Clone)]
pub struct ChatService {
    config: AppConfig,
    model: Arc<dyn ChatModel>,
    dataset: Option<Arc<FacilityDataset>>,
    system_prompt: Arc<str>,
    generation_limit: Arc<Semaphore>,
}

impl ChatService {
    pub fn new(
        config: AppConfig,
        model: Arc<dyn ChatModel>,
        dataset: Option<Arc<FacilityDataset>>,
        generation_limit: Arc<Semaphore>,
    ) -> Self {
        let system_prompt = build_system_prompt(dataset.as_deref()).into();
        Self {
            config,
            model,
            dataset,
            system_prompt,
            generation_limit,
        }
    }

    pub fn dataset(&self) -> Option<&FacilityDataset> {
        self.dataset.as_deref()
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Asks the model and structures its reply. Only the model call can fail.
    pub async fn answer(&self, question: &str) -> Result<StructuredResponse> {
        let started = Instant::now();
        let matched = match_question(question, self.dataset());

        let reply = {
            let _permit = self.generation_limit.acquire().await?;
            self.model
                .complete(CompletionRequest {
                    system: self.system_prompt(),
                    user: question,
                    temperature: self.config.model.temperature,
                    max_tokens: self.config.model.max_tokens,
                })
                .await?
        };

        let parsed = parse_reply(&normalize_reply(&reply));
        let response = assemble(&reply, parsed, &matched);

        tracing::info!(
            latency_ms = started.elapsed().as_millis() as u64,
            building = matched.building.map(|b| b.name.as_str()).unwrap_or("-"),
            stage = ?matched.matched_by.as_ref().map(|m| m.stage),
            keyword = matched.matched_by.as_ref().map(|m| m.keyword.as_str()).unwrap_or("-"),
            title = response.title(),
            "chat answered"
        );

        Ok(response)
    }
}

fn build_system_prompt(dataset: Option<&FacilityDataset>) -> String {
    let mut prompt = BASE_PROMPT.to_string();

    if let Some(dataset) = dataset {
        prompt.push_str(&format!(
            "\n\n다음은 동양미래대학교 캠퍼스 시설 정보입니다. 이 정보를 기반으로 정확하게 답변해주세요:\n\n{}\n\n위 JSON 데이터를 참고하여 사용자의 질문에 정확하게 답변해주세요. 반드시 위 데이터에 있는 정보만 사용하고, 데이터에 없는 정보는 제공하지 마세요.\n",
            dataset.to_prompt_json()
        ));
    }

    prompt
}
