//! 评论采集循环与重试策略 - 流程层
//!
//! 单次尝试是一个两状态的状态机（RUNNING / DONE）：反复"发现新评论 →
//! 逐条提取 → 追加"，直到发现返回空序列；尝试中的任何会话故障都让
//! 本次尝试立即进入 DONE 并带回已累积的表，不向上抛出。
//!
//! 重试策略包住完整的一次尝试（不是单个批次）：每次重新开始的尝试
//! 使用全新的游标和累积表，从页面头部重新扫描。也就是说，采集进行到
//! 一半失败、随后重试成功时，第一次尝试累积的行会被丢弃，调用方
//! 拿到的只是最后一次尝试的表，不是两次的并集。

use std::time::Duration;

use rand::Rng;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::browser::driver::SessionDriver;
use crate::config::Config;
use crate::error::SessionError;
use crate::models::place::{PlaceInfo, ResultTable};
use crate::services::relevance_filter::RelevanceFilter;
use crate::workflow::discovery::{discover, ReviewCursor};
use crate::workflow::extraction::extract_review;

/// 采集重试策略
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// 最大尝试次数
    pub attempts: usize,
    /// 两次尝试之间的固定延迟
    pub delay: Duration,
    /// 叠加在固定延迟上的随机抖动上限
    pub jitter: Duration,
}

impl RetryPolicy {
    /// 从程序配置构建重试策略
    pub fn from_config(config: &Config) -> Self {
        Self {
            attempts: config.retry_attempts,
            delay: Duration::from_secs(config.retry_delay_secs),
            jitter: Duration::from_secs(config.retry_jitter_secs),
        }
    }

    /// 计算一次退避停顿：固定延迟 + 随机抖动
    fn backoff(&self) -> Duration {
        let jitter_ms = self.jitter.as_millis() as u64;
        let extra = if jitter_ms == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..=jitter_ms)
        };
        self.delay + Duration::from_millis(extra)
    }
}

/// 单次尝试的结果：累积表 + 让尝试终止的故障（如果有）
struct CollectionOutcome {
    table: ResultTable,
    fault: Option<SessionError>,
}

/// 带重试地采集一个地点的全部话题相关评论
///
/// 只有瞬态会话故障触发重试；无论哪次尝试成功，返回前都按内容键
/// 对结果去重。最后一次尝试也失败时，返回它已累积的部分结果
/// （部分数据优于全无）。
pub async fn collect_reviews<D, F>(
    session: &D,
    filter: &F,
    topic: &str,
    place: &PlaceInfo,
    limit: Option<usize>,
    policy: &RetryPolicy,
) -> ResultTable
where
    D: SessionDriver,
    F: RelevanceFilter + ?Sized,
{
    let attempts = policy.attempts.max(1);

    for attempt in 1..=attempts {
        let outcome = collect_attempt(session, filter, topic, place, limit).await;

        match outcome.fault {
            Some(fault) if fault.is_transient() && attempt < attempts => {
                let pause = policy.backoff();
                warn!(
                    "采集尝试 {}/{} 因瞬态故障中止: {}，{} 毫秒后从头重新扫描",
                    attempt,
                    attempts,
                    fault,
                    pause.as_millis()
                );
                sleep(pause).await;
            }
            Some(fault) => {
                warn!(
                    "采集提前结束，返回已累积的 {} 行。原因: {}",
                    outcome.table.len(),
                    fault
                );
                return finalize(outcome.table);
            }
            None => {
                debug!("✓ 采集完成，共 {} 行", outcome.table.len());
                return finalize(outcome.table);
            }
        }
    }

    // attempts >= 1 时循环必然已经返回
    ResultTable::new()
}

/// 完整跑一次采集尝试
async fn collect_attempt<D, F>(
    session: &D,
    filter: &F,
    topic: &str,
    place: &PlaceInfo,
    limit: Option<usize>,
) -> CollectionOutcome
where
    D: SessionDriver,
    F: RelevanceFilter + ?Sized,
{
    let mut cursor = ReviewCursor::new();
    let mut accumulated = ResultTable::new();

    loop {
        let batch = match discover(session, &mut cursor, limit).await {
            Ok(batch) => batch,
            Err(fault) => {
                return CollectionOutcome {
                    table: accumulated,
                    fault: Some(fault),
                }
            }
        };

        // 没有新评论：采集完成
        if batch.is_empty() {
            return CollectionOutcome {
                table: accumulated,
                fault: None,
            };
        }

        for discovered in &batch {
            match extract_review(session, filter, discovered, topic, place).await {
                Ok(Some(record)) => accumulated.append(record),
                Ok(None) => {}
                Err(fault) => {
                    return CollectionOutcome {
                        table: accumulated,
                        fault: Some(fault),
                    }
                }
            }
        }
    }
}

/// 返回前的收尾：按内容键去重
fn finalize(mut table: ResultTable) -> ResultTable {
    table.dedup_by_key();
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::mock::{ReviewFixture, ScriptedSession};
    use crate::services::relevance_filter::stubs::PassthroughFilter;

    fn fixtures(n: usize) -> Vec<ReviewFixture> {
        (0..n)
            .map(|i| ReviewFixture::new(&format!("第 {} 条评论", i), "1 个月前", 4))
            .collect()
    }

    fn place() -> PlaceInfo {
        PlaceInfo {
            place_url: "https://maps/a".to_string(),
            ..Default::default()
        }
    }

    fn fast_policy(attempts: usize) -> RetryPolicy {
        RetryPolicy {
            attempts,
            delay: Duration::from_millis(10),
            jitter: Duration::ZERO,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_terminates_and_collects_everything() {
        // 可见数量 2 → 4 → 4：两批之后发现返回空，循环必须终止
        let session = ScriptedSession::new(fixtures(4)).with_schedule(vec![2, 4, 4]);

        let table = collect_reviews(
            &session,
            &PassthroughFilter,
            "话题",
            &place(),
            None,
            &fast_policy(2),
        )
        .await;

        assert_eq!(table.len(), 4);
        // 两个非空批次 + 一次空返回
        assert_eq!(session.discover_calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_limit_caps_total_rows() {
        let session = ScriptedSession::new(fixtures(6));

        let table = collect_reviews(
            &session,
            &PassthroughFilter,
            "话题",
            &place(),
            Some(2),
            &fast_policy(2),
        )
        .await;

        assert_eq!(table.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_discards_first_attempts_partial_rows() {
        // 第一次尝试：第 1 批读到 2 条并提取，第 2 次读取抛出瞬态故障；
        // 第二次尝试：从头扫描，完整读完 4 条。
        // 最终结果必须只反映第二次尝试（4 行），而不是两次的并集（6 行）。
        let session = ScriptedSession::new(fixtures(4))
            .with_schedule(vec![2, 2, 4, 4])
            .with_failures(vec![2]);

        let table = collect_reviews(
            &session,
            &PassthroughFilter,
            "话题",
            &place(),
            None,
            &fast_policy(2),
        )
        .await;

        assert_eq!(table.len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_discover_fault_triggers_retry() {
        // 故障发生在第一次发现调用：重试后成功
        let session = ScriptedSession::new(fixtures(3)).with_failures(vec![1]);

        let table = collect_reviews(
            &session,
            &PassthroughFilter,
            "话题",
            &place(),
            None,
            &fast_policy(2),
        )
        .await;

        assert_eq!(table.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_return_partial_accumulation() {
        // 两次尝试都中途失败：返回最后一次尝试已累积的行（部分数据优于全无）
        let session = ScriptedSession::new(fixtures(4))
            .with_schedule(vec![2, 2, 2, 2])
            .with_failures(vec![2, 4]);

        let table = collect_reviews(
            &session,
            &PassthroughFilter,
            "话题",
            &place(),
            None,
            &fast_policy(2),
        )
        .await;

        // 最后一次尝试在故障前处理了前 2 条
        assert_eq!(table.len(), 2);
    }
}
