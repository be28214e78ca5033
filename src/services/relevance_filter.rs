//! 话题相关性过滤服务 - 业务能力层
//!
//! 只负责"从一条评论里提取话题相关内容"能力，不关心流程
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型
//! - 兼容 OpenAI API 的服务
//!
//! ## 降级约定
//! 过滤器位于逐条评论的提取步骤内部，任何服务故障都降级为
//! "无相关内容"，从不向上抛出。

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{AppResult, FilterError};

/// LLM 表示"没有相关内容"的约定回答
const NONE_SENTINEL: &str = "#NONE#";

/// 话题相关性过滤能力
///
/// 构造时注入到提取步骤中（策略接口），测试时用桩实现替换
#[async_trait]
pub trait RelevanceFilter: Send + Sync {
    /// 从评论正文中提取与话题相关的内容
    ///
    /// # 返回
    /// - `Some(text)`: 相关内容（可能是原文，也可能是 LLM 抽取的片段）
    /// - `None`: 评论与话题无关，或服务故障降级
    async fn filter(&self, text: &str, topic: &str) -> Option<String>;
}

/// 基于 LLM 的相关性过滤器
///
/// 职责：
/// - 长评论交给 LLM 抽取话题相关片段
/// - 短评论原样通过，不消耗 API 调用
/// - 只处理单条评论
/// - 不出现 ResultTable / PlaceInfo
/// - 不关心流程顺序
pub struct LlmRelevanceFilter {
    client: Client<OpenAIConfig>,
    model_name: String,
    short_text_threshold: usize,
}

impl LlmRelevanceFilter {
    /// 创建新的过滤器
    pub fn new(config: &Config) -> Self {
        // 配置 OpenAI 客户端（兼容 OpenAI API 的服务）
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        let client = Client::with_config(openai_config);

        Self {
            client,
            model_name: config.llm_model_name.clone(),
            short_text_threshold: config.short_text_threshold,
        }
    }

    /// 调用 LLM 抽取话题相关片段
    ///
    /// # 返回
    /// 返回 LLM 的原始回答（已去除首尾空白）
    async fn ask_llm(&self, text: &str, topic: &str) -> AppResult<String> {
        debug!(
            "调用 LLM 过滤，模型: {}, 正文长度: {} 字符",
            self.model_name,
            text.chars().count()
        );

        let system_message = format!(
            "You receive from the user the text of a review of a map location. \
             You will extract and return EXCLUSIVELY sentences and chunks that are \
             referring to '{topic}' and the context to understand it. \
             If the text contains no information about '{topic}', return '{NONE_SENTINEL}'"
        );

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
                    .content(text)
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
            .temperature(0.2)
            .max_tokens(512u32)
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

        Ok(content.trim().to_string())
    }

    /// 把 LLM 的回答映射为过滤结果：约定哨兵和空回答都表示"无相关内容"
    fn content_to_relevant(content: String) -> Option<String> {
        if content == NONE_SENTINEL || content.is_empty() {
            None
        } else {
            Some(content)
        }
    }
}

#[async_trait]
impl RelevanceFilter for LlmRelevanceFilter {
    async fn filter(&self, text: &str, topic: &str) -> Option<String> {
        // 短评论原样通过，不调用 LLM
        if text.chars().count() <= self.short_text_threshold {
            return Some(text.to_string());
        }

        match self.ask_llm(text, topic).await {
            Ok(content) => Self::content_to_relevant(content),
            Err(e) => {
                // 服务故障降级为"无相关内容"，不中断提取
                warn!("⚠️ 相关性过滤降级（视为无相关内容）: {}", e);
                None
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    /// 创建测试用的过滤器（指向不存在的端点，确保任何真实调用都会失败）
    fn create_test_filter(threshold: usize) -> LlmRelevanceFilter {
        let config = Config {
            llm_api_key: "test-key".to_string(),
            llm_api_base_url: "http://127.0.0.1:1/v1".to_string(),
            llm_model_name: "test-model".to_string(),
            short_text_threshold: threshold,
            ..Config::default()
        };
        LlmRelevanceFilter::new(&config)
    }

    #[tokio::test]
    async fn test_short_text_passes_through_without_llm() {
        let filter = create_test_filter(250);

        // 不超过阈值的评论原样通过；端点不可达也不影响（根本不会调用）
        let text = "语音导览很好用";
        let result = filter.filter(text, "语音导览").await;
        assert_eq!(result, Some(text.to_string()));
    }

    #[tokio::test]
    async fn test_threshold_is_inclusive() {
        let filter = create_test_filter(10);

        let exactly_ten = "一二三四五六七八九十";
        assert_eq!(exactly_ten.chars().count(), 10);
        let result = filter.filter(exactly_ten, "话题").await;
        assert_eq!(result, Some(exactly_ten.to_string()));
    }

    #[test]
    fn test_none_sentinel_maps_to_no_content() {
        assert_eq!(
            LlmRelevanceFilter::content_to_relevant(NONE_SENTINEL.to_string()),
            None
        );
        assert_eq!(LlmRelevanceFilter::content_to_relevant(String::new()), None);
        assert_eq!(
            LlmRelevanceFilter::content_to_relevant("语音导览讲解详细".to_string()),
            Some("语音导览讲解详细".to_string())
        );
    }

    /// 联通性测试，需要可用的 LLM 端点
    ///
    /// 运行方式：
    /// ```bash
    /// cargo test test_llm_filter_live -- --ignored --nocapture
    /// ```
    #[tokio::test]
    #[ignore]
    async fn test_llm_filter_live() {
        let _ = tracing_subscriber::fmt::try_init();

        let filter = LlmRelevanceFilter::new(&Config::from_env());
        let long_text = "这家博物馆整体还不错，展览内容很丰富。语音导览讲解得很详细，\
                         支持中英双语，租借也很方便。停车场比较小，周末要排队。餐厅的\
                         东西一般，建议自带食物。总体来说适合周末带家人一起参观。"
            .repeat(2);

        let result = filter.filter(&long_text, "语音导览").await;
        println!("过滤结果: {:?}", result);
        assert!(result.is_some(), "这段评论确实谈到了语音导览");
    }
}
