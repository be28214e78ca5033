//! 评论发现 / 分页游标 - 流程层
//!
//! 每次读取页面上当前可见的全部评论卡片，按内容键过滤掉已经见过的，
//! 只返回新出现的候选。"已见"是内容键的集合成员判断，不依赖元素
//! 句柄的存活状态，因此页面被滚动改写后也不会重复返回旧评论。
//!
//! 返回空序列即表示"没有新评论了"，是采集循环的终止条件。

use std::collections::HashSet;

use crate::browser::driver::SessionDriver;
use crate::error::SessionResult;
use crate::models::place::ReviewKey;
use crate::selectors;

/// 分页游标：已处理评论的内容键集合
#[derive(Debug, Default)]
pub struct ReviewCursor {
    seen: HashSet<ReviewKey>,
}

impl ReviewCursor {
    /// 创建空游标
    pub fn new() -> Self {
        Self::default()
    }

    /// 标记一个键为已见
    ///
    /// # 返回
    /// 该键此前未出现过时返回 true
    pub fn mark_seen(&mut self, key: ReviewKey) -> bool {
        self.seen.insert(key)
    }

    /// 已见评论数量
    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }
}

/// 一条新发现的评论
#[derive(Debug, Clone)]
pub struct DiscoveredReview<E> {
    /// 评论卡片的元素句柄
    pub element: E,
    /// 内容键
    pub key: ReviewKey,
    /// 在候选列表中的位置
    pub position: usize,
    /// 发现时读到的正文（可能是折叠后的截断文本）
    pub text: String,
    /// 日期标签
    pub date: String,
}

/// 发现新的评论候选
///
/// 读取当前可见的评论卡片列表；`limit` 为正时先截断到前 `limit` 个
/// （无论页面上还有多少评论，这都限定了单个地点的总工作量）；然后
/// 过滤掉游标中已见的候选，保持页面顺序返回其余的，并把它们标记为已见。
pub async fn discover<D: SessionDriver>(
    session: &D,
    cursor: &mut ReviewCursor,
    limit: Option<usize>,
) -> SessionResult<Vec<DiscoveredReview<D::Element>>> {
    let mut candidates = session.find_all(selectors::REVIEW_CARD).await?;

    if let Some(limit) = limit {
        if limit > 0 {
            candidates.truncate(limit);
        }
    }

    let mut fresh = Vec::new();
    for (position, element) in candidates.into_iter().enumerate() {
        let text = read_child_text(session, &element, selectors::REVIEW_TEXT).await?;
        let date = read_child_text(session, &element, selectors::REVIEW_DATE).await?;
        let key = ReviewKey::compute(&text, &date, position);

        if cursor.mark_seen(key) {
            fresh.push(DiscoveredReview {
                element,
                key,
                position,
                text,
                date,
            });
        }
    }

    Ok(fresh)
}

/// 读取子元素的文本，子元素不存在时降级为空字符串
pub(crate) async fn read_child_text<D: SessionDriver>(
    session: &D,
    element: &D::Element,
    locator: &str,
) -> SessionResult<String> {
    match session.find_in(element, locator).await? {
        Some(child) => session.text(&child).await,
        None => Ok(String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::mock::{ReviewFixture, ScriptedSession};

    fn fixtures(n: usize) -> Vec<ReviewFixture> {
        (0..n)
            .map(|i| ReviewFixture::new(&format!("第 {} 条评论的内容", i), "1 个月前", 4))
            .collect()
    }

    /// 把一批发现结果化简为位置列表
    fn positions<E>(batch: &[DiscoveredReview<E>]) -> Vec<usize> {
        batch.iter().map(|d| d.position).collect()
    }

    #[tokio::test]
    async fn test_limit_bounds_candidates_for_any_cursor_state() {
        let session = ScriptedSession::new(fixtures(6));
        let mut cursor = ReviewCursor::new();

        let batch = discover(&session, &mut cursor, Some(3)).await.expect("发现失败");
        assert_eq!(positions(&batch), vec![0, 1, 2]);

        // 游标非空时同样不会越过 limit
        let batch = discover(&session, &mut cursor, Some(3)).await.expect("发现失败");
        assert!(batch.is_empty());
    }

    #[tokio::test]
    async fn test_repeated_discover_partitions_into_disjoint_chunks() {
        // 可见数量按 2 → 4 → 6 增长，模拟滚动加载
        let session = ScriptedSession::new(fixtures(6)).with_schedule(vec![2, 4, 6, 6]);
        let mut cursor = ReviewCursor::new();

        let first = discover(&session, &mut cursor, None).await.expect("发现失败");
        assert_eq!(positions(&first), vec![0, 1]);

        let second = discover(&session, &mut cursor, None).await.expect("发现失败");
        assert_eq!(positions(&second), vec![2, 3]);

        let third = discover(&session, &mut cursor, None).await.expect("发现失败");
        assert_eq!(positions(&third), vec![4, 5]);

        // 不再增长后返回空序列（终止条件）
        let done = discover(&session, &mut cursor, None).await.expect("发现失败");
        assert!(done.is_empty());
        assert_eq!(cursor.seen_count(), 6);
    }

    #[test]
    fn test_limit_applies_before_seen_filtering() {
        tokio_test::block_on(async {
            let session = ScriptedSession::new(fixtures(5)).with_schedule(vec![2, 5]);
            let mut cursor = ReviewCursor::new();

            let first = discover(&session, &mut cursor, Some(3)).await.expect("发现失败");
            assert_eq!(positions(&first), vec![0, 1]);

            // 可见数量涨到 5，但截断到 3 之后只剩位置 2 是新的
            let second = discover(&session, &mut cursor, Some(3)).await.expect("发现失败");
            assert_eq!(positions(&second), vec![2]);

            let done = discover(&session, &mut cursor, Some(3)).await.expect("发现失败");
            assert!(done.is_empty());
        });
    }

    #[tokio::test]
    async fn test_transient_fault_surfaces_to_caller() {
        let session = ScriptedSession::new(fixtures(3)).with_failures(vec![1]);
        let mut cursor = ReviewCursor::new();

        let result = discover(&session, &mut cursor, None).await;
        assert!(matches!(
            result,
            Err(e) if e.is_transient()
        ));
    }
}
