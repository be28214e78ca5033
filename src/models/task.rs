//! 任务描述符
//!
//! 封装"对哪个地点、按哪个话题、最多采多少条"这一信息，提交后不可变

use serde::{Deserialize, Serialize};

/// 单个地点的提取任务描述符
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDescriptor {
    /// 要在评论中搜索的话题
    pub topic: String,

    /// 地点页面 URL
    pub url: String,

    /// 每个地点最多采集的评论数（None 表示不限）
    pub limit: Option<usize>,
}

impl TaskDescriptor {
    /// 创建新的任务描述符
    pub fn new(topic: impl Into<String>, url: impl Into<String>, limit: Option<usize>) -> Self {
        Self {
            topic: topic.into(),
            url: url.into(),
            limit,
        }
    }
}
