//! 地点与评论的数据模型
//!
//! PlaceInfo 在每个地点任务开始时捕获一次，之后不可变；
//! ReviewRecord 按发现顺序追加进 ResultTable；
//! ReviewKey 是分页游标使用的稳定内容键。

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

/// 键计算时参与哈希的正文前缀长度（字符数）
///
/// 只取前缀而不取全文：点击"更多"展开长评论会改变正文节点的文本，
/// 但展开前后的前缀一致，因此键在展开前后保持稳定。
const KEY_TEXT_PREFIX_CHARS: usize = 120;

/// 地点信息
///
/// 每个地点任务开始时捕获一次，所有字段缺失时降级为空字符串
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaceInfo {
    /// 地点页面 URL
    pub place_url: String,
    /// 地点名称
    pub name: String,
    /// 地点简介
    pub description: String,
    /// 地址
    pub address: String,
    /// 电话
    pub phone: String,
    /// 官网
    pub website: String,
}

/// 单条评论记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    /// 话题相关的评论内容（经过相关性过滤）
    pub review: String,
    /// 评论日期标签（页面原文，如 "3 个月前"）
    pub date: String,
    /// 评分（点亮的星数）
    pub score: u32,
    /// 所属地点信息（列展开进每一行）
    #[serde(flatten)]
    pub place: PlaceInfo,
}

impl ReviewRecord {
    /// 记录级内容键，用于结果表去重
    pub fn content_key(&self) -> ReviewKey {
        let mut hasher = DefaultHasher::new();
        normalized_prefix(&self.review).hash(&mut hasher);
        self.date.hash(&mut hasher);
        self.place.place_url.hash(&mut hasher);
        ReviewKey(hasher.finish())
    }
}

/// 稳定的内容派生键
///
/// 由正文前缀 + 日期标签 + 候选位置哈希而来，作为分页游标的
/// "已见"集合成员。元素句柄失效不影响键的稳定性。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReviewKey(u64);

impl ReviewKey {
    /// 从评论的可见内容计算键
    ///
    /// # 参数
    /// - `text`: 评论正文（可能是折叠后的截断文本）
    /// - `date`: 日期标签
    /// - `position`: 候选列表中的位置
    pub fn compute(text: &str, date: &str, position: usize) -> Self {
        let mut hasher = DefaultHasher::new();
        normalized_prefix(text).hash(&mut hasher);
        date.hash(&mut hasher);
        position.hash(&mut hasher);
        ReviewKey(hasher.finish())
    }
}

/// 取正文的归一化前缀：去除首尾空白和折叠省略号，截断到固定字符数
fn normalized_prefix(text: &str) -> String {
    text.trim()
        .trim_end_matches(['…', '.'])
        .chars()
        .take(KEY_TEXT_PREFIX_CHARS)
        .collect()
}

/// 结果表
///
/// 按行追加的评论记录集合，跨任务合并时只做拼接，从不覆盖
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResultTable {
    rows: Vec<ReviewRecord>,
}

impl ResultTable {
    /// 创建空表
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一行
    pub fn append(&mut self, record: ReviewRecord) {
        self.rows.push(record);
    }

    /// 拼接另一张表（行顺序保持各自内部顺序）
    pub fn concat(&mut self, other: ResultTable) {
        self.rows.extend(other.rows);
    }

    /// 按内容键去重，保留首次出现的行
    pub fn dedup_by_key(&mut self) {
        let mut seen = std::collections::HashSet::new();
        self.rows.retain(|row| seen.insert(row.content_key()));
    }

    /// 行数
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 行的只读视图
    pub fn rows(&self) -> &[ReviewRecord] {
        &self.rows
    }
}
