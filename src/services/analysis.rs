//! 评论洞察分析服务 - 业务能力层
//!
//! 把一张结果表按地点聚合，然后对每个地点的全部相关评论
//! 向 LLM 提出一组问题，得到结构化的 JSON 回答。
//!
//! 单个地点分析失败只影响该地点（记录日志后跳过），不中断整批分析。

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use serde_json::Value as JsonValue;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::error::{AppResult, FilterError};
use crate::models::place::{PlaceInfo, ResultTable};

/// 一个地点的聚合评论
#[derive(Debug, Clone)]
pub struct AggregatedPlace {
    /// 地点信息
    pub place: PlaceInfo,
    /// 拼接后的全部相关评论
    pub reviews: String,
    /// 参与聚合的评论条数
    pub review_count: usize,
}

/// 一个地点的分析结果
#[derive(Debug, Clone, serde::Serialize)]
pub struct PlaceInsights {
    /// 地点信息
    pub place: PlaceInfo,
    /// 按问题序号组织的 JSON 回答
    pub answers: JsonValue,
    /// 参与分析的评论条数
    pub review_count: usize,
}

/// 按地点聚合评论，保持地点的首次出现顺序，评论之间用空行分隔
pub fn aggregate_reviews(table: &ResultTable) -> Vec<AggregatedPlace> {
    use std::collections::hash_map::Entry;

    let mut order: Vec<String> = Vec::new();
    let mut grouped: std::collections::HashMap<String, AggregatedPlace> =
        std::collections::HashMap::new();

    for row in table.rows() {
        let key = row.place.place_url.clone();
        match grouped.entry(key) {
            Entry::Occupied(mut occupied) => {
                let entry = occupied.get_mut();
                entry.reviews.push_str("\n\n");
                entry.reviews.push_str(&row.review);
                entry.review_count += 1;
            }
            Entry::Vacant(vacant) => {
                order.push(vacant.key().clone());
                vacant.insert(AggregatedPlace {
                    place: row.place.clone(),
                    reviews: row.review.clone(),
                    review_count: 1,
                });
            }
        }
    }

    order
        .into_iter()
        .filter_map(|key| grouped.remove(&key))
        .collect()
}

/// 评论洞察分析器
///
/// 职责：
/// - 对单个地点的聚合评论调用 LLM 回答问题
/// - 不出现采集流程的概念
pub struct ReviewAnalyser {
    client: Client<OpenAIConfig>,
    model_name: String,
}

impl ReviewAnalyser {
    /// 创建新的分析器
    pub fn new(config: &Config) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        Self {
            client: Client::with_config(openai_config),
            model_name: config.llm_model_name.clone(),
        }
    }

    /// 对整张结果表做地点级分析
    ///
    /// # 参数
    /// - `table`: 已采集的结果表
    /// - `questions`: 要对每个地点回答的问题列表
    pub async fn analyse_places(
        &self,
        table: &ResultTable,
        questions: &[String],
    ) -> Vec<PlaceInsights> {
        let aggregated = aggregate_reviews(table);
        info!("开始分析 {} 个地点的聚合评论", aggregated.len());

        let numbered_questions = questions
            .iter()
            .enumerate()
            .map(|(idx, q)| format!("{}. {}", idx + 1, q))
            .collect::<Vec<_>>()
            .join("\n");

        let mut results = Vec::new();
        for entry in aggregated {
            match self.ask(&entry.reviews, &numbered_questions).await {
                Ok(answers) => {
                    debug!("✓ 已生成 {} 的洞察", entry.place.name);
                    results.push(PlaceInsights {
                        place: entry.place,
                        answers,
                        review_count: entry.review_count,
                    });
                }
                Err(e) => {
                    error!("生成 {} 的洞察失败，跳过该地点: {}", entry.place.name, e);
                }
            }
        }
        results
    }

    /// 向 LLM 提问并解析 JSON 回答
    async fn ask(&self, reviews: &str, questions: &str) -> AppResult<JsonValue> {
        let system_message = "You are an expert review analyzer. You will be given \
            aggregated reviews of a place, and you need to answer the following \
            questions based on the reviews. All your answers are in english, even if \
            the review language is different. Return a single JSON object whose keys \
            are the question numbers and whose values are the answers.";

        let user_message = format!("{questions}\n\nReviews: {reviews}");

        let messages = vec![
            ChatCompletionRequestMessage::System(
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system_message)
                    .build()
                    .map_err(|e| FilterError::ApiCallFailed {
                        model: self.model_name.clone(),
                        source: Box::new(e),
                    })?,
            ),
            ChatCompletionRequestMessage::User(
                ChatCompletionRequestUserMessageArgs::default()
                    .content(user_message)
                    .build()
                    .map_err(|e| FilterError::ApiCallFailed {
                        model: self.model_name.clone(),
                        source: Box::new(e),
                    })?,
            ),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .temperature(0.3)
            .max_tokens(1024u32)
            .build()
            .map_err(|e| FilterError::ApiCallFailed {
                model: self.model_name.clone(),
                source: Box::new(e),
            })?;

        let response =
            self.client
                .chat()
                .create(request)
                .await
                .map_err(|e| FilterError::ApiCallFailed {
                    model: self.model_name.clone(),
                    source: Box::new(e),
                })?;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or(FilterError::EmptyContent {
                model: self.model_name.clone(),
            })?;

        Ok(Self::parse_json_answer(&content)?)
    }

    /// 解析 LLM 的 JSON 回答，容忍 Markdown 代码块包裹
    fn parse_json_answer(content: &str) -> Result<JsonValue, serde_json::Error> {
        let trimmed = content
            .trim()
            .trim_start_matches("```json")
            .trim_start_matches("```")
            .trim_end_matches("```")
            .trim();
        serde_json::from_str(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::place::ReviewRecord;

    fn record(url: &str, name: &str, review: &str) -> ReviewRecord {
        ReviewRecord {
            review: review.to_string(),
            date: "1 个月前".to_string(),
            score: 4,
            place: PlaceInfo {
                place_url: url.to_string(),
                name: name.to_string(),
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_aggregate_groups_by_place_and_joins_text() {
        let mut table = ResultTable::new();
        table.append(record("https://maps/a", "甲博物馆", "导览不错"));
        table.append(record("https://maps/b", "乙博物馆", "人很多"));
        table.append(record("https://maps/a", "甲博物馆", "值得再来"));

        let aggregated = aggregate_reviews(&table);
        assert_eq!(aggregated.len(), 2);

        // 地点保持首次出现顺序
        assert_eq!(aggregated[0].place.name, "甲博物馆");
        assert_eq!(aggregated[0].review_count, 2);
        assert_eq!(aggregated[0].reviews, "导览不错\n\n值得再来");

        assert_eq!(aggregated[1].place.name, "乙博物馆");
        assert_eq!(aggregated[1].review_count, 1);
    }

    #[test]
    fn test_parse_json_answer_tolerates_code_fences() {
        let fenced = "```json\n{\"1\": \"yes\"}\n```";
        let parsed = ReviewAnalyser::parse_json_answer(fenced).expect("解析失败");
        assert_eq!(parsed["1"], "yes");

        let bare = "{\"1\": \"no\"}";
        let parsed = ReviewAnalyser::parse_json_answer(bare).expect("解析失败");
        assert_eq!(parsed["1"], "no");
    }
}
