//! 地点任务 - 流程层
//!
//! 一个 URL 的端到端流水线：获取会话 → 导航 → 关闭同意页（尽力而为）→
//! 捕获地点信息 → 打开评论区并提交话题搜索 → 带重试的采集循环 →
//! 释放会话（所有退出路径上都会执行）。
//!
//! 任务级的会话故障只记录日志并让该地点产出空表（跳过这个地点，
//! 不影响同批的其它任务）。

use std::time::Duration;

use rand::Rng;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::browser::driver::SessionDriver;
use crate::config::Config;
use crate::error::{SessionError, SessionResult};
use crate::infrastructure::session_manager::SessionManager;
use crate::models::place::{PlaceInfo, ResultTable};
use crate::models::task::TaskDescriptor;
use crate::selectors;
use crate::services::relevance_filter::RelevanceFilter;
use crate::workflow::collection::{collect_reviews, RetryPolicy};
use crate::workflow::place_ctx::PlaceCtx;

/// 同意页按钮的等待上限
const CONSENT_TIMEOUT: Duration = Duration::from_secs(5);
/// 提交话题搜索后等待过滤结果加载的停顿
const SEARCH_SETTLE: Duration = Duration::from_secs(3);
/// 导航前随机停顿的上限（毫秒），避免并发任务同时发请求
const THINK_TIME_MAX_MS: u64 = 400;

/// 提取一个地点的话题相关评论
///
/// 会话通过注入的管理器独占获取，并在每条退出路径上释放（本地点
/// 专用的浏览器进程随之销毁，不跨地点复用）。传入了已有结果表时，
/// 新行追加到它的副本上，输入本身不被修改。
pub async fn extract_place(
    manager: &mut SessionManager,
    ctx: &PlaceCtx,
    descriptor: &TaskDescriptor,
    filter: &impl RelevanceFilter,
    config: &Config,
    store: Option<ResultTable>,
) -> ResultTable {
    debug!("{} 正在导航到 {}", ctx, ctx.url);

    // 随机停顿，错开同批任务的首个请求
    let think_time = rand::thread_rng().gen_range(0..=THINK_TIME_MAX_MS);
    sleep(Duration::from_millis(think_time)).await;

    let local = match manager.acquire().await {
        Ok(session) => match run_place_pipeline(session, ctx, descriptor, filter, config).await {
            Ok(table) => {
                debug!("{} 共采集到 {} 条相关评论", ctx, table.len());
                table
            }
            Err(e) => {
                error!("{} 处理出错，跳过该地点。详情: {}", ctx, e);
                ResultTable::new()
            }
        },
        Err(e) => {
            error!("{} 启动会话失败，跳过该地点。详情: {}", ctx, e);
            ResultTable::new()
        }
    };

    // 无论成功失败都销毁会话（包括流水线出错的退出路径）
    manager.release().await;

    merge_store(store, local)
}

/// 会话内的地点流水线（与会话获取 / 释放解耦，便于用脚本会话测试）
pub async fn run_place_pipeline<D, F>(
    session: &D,
    ctx: &PlaceCtx,
    descriptor: &TaskDescriptor,
    filter: &F,
    config: &Config,
) -> SessionResult<ResultTable>
where
    D: SessionDriver,
    F: RelevanceFilter + ?Sized,
{
    let wait = Duration::from_secs(config.wait_timeout_secs);

    session.navigate(&descriptor.url).await?;
    accept_consent(session, CONSENT_TIMEOUT).await;

    let place_info = capture_place_info(session, &descriptor.url, wait).await?;
    info!(
        "{} 地点: {}",
        ctx,
        if place_info.name.is_empty() {
            ctx.display_name()
        } else {
            place_info.name.clone()
        }
    );

    open_reviews_and_search(session, &descriptor.topic, wait).await?;

    let policy = RetryPolicy::from_config(config);
    let table = collect_reviews(
        session,
        filter,
        &descriptor.topic,
        &place_info,
        descriptor.limit,
        &policy,
    )
    .await;

    Ok(table)
}

/// 尽力关闭 Cookie/条款同意页；没有同意页是常态
pub(crate) async fn accept_consent<D: SessionDriver>(session: &D, timeout: Duration) {
    match session
        .wait_for(selectors::CONSENT_ACCEPT_BUTTON, timeout)
        .await
    {
        Ok(button) => {
            if let Err(e) = session.click(&button).await {
                debug!("点击同意按钮失败（忽略）: {}", e);
            }
        }
        Err(_) => {}
    }
}

/// 捕获地点信息；单个字段缺失降级为空字符串
async fn capture_place_info<D: SessionDriver>(
    session: &D,
    url: &str,
    wait: Duration,
) -> SessionResult<PlaceInfo> {
    // 原文名称缺失时回退到英文名称
    let mut name = read_text(session, selectors::PLACE_NAME_LOCAL).await?;
    if name.is_empty() {
        name = read_text(session, selectors::PLACE_NAME).await?;
    }
    let description = read_text(session, selectors::PLACE_DESCRIPTION).await?;

    // 滚动到详情区，让地址 / 电话等字段渲染出来
    let details = session
        .wait_for(selectors::PLACE_DETAILS_ANCHOR, wait)
        .await?;
    session.scroll_into_view(&details).await?;

    let address = read_text(session, selectors::PLACE_ADDRESS).await?;
    let phone = read_text(session, selectors::PLACE_PHONE).await?;
    let website = match session.find(selectors::PLACE_WEBSITE).await? {
        Some(element) => session.attr(&element, "href").await?.unwrap_or_default(),
        None => String::new(),
    };

    Ok(PlaceInfo {
        place_url: url.to_string(),
        name,
        description,
        address,
        phone,
        website,
    })
}

/// 打开评论区并把话题提交进评论搜索框
///
/// 这一步的故障对整个地点任务是致命的，原样向上浮出
async fn open_reviews_and_search<D: SessionDriver>(
    session: &D,
    topic: &str,
    wait: Duration,
) -> SessionResult<()> {
    let tab = session.wait_for(selectors::REVIEWS_TAB, wait).await?;
    session.scroll_into_view(&tab).await?;
    session.click(&tab).await?;

    let searchbox = match session.find(selectors::REVIEWS_SEARCHBOX).await? {
        Some(element) => element,
        None => {
            return Err(SessionError::ElementNotFound(
                selectors::REVIEWS_SEARCHBOX.to_string(),
            ))
        }
    };
    session.send_keys(&searchbox, topic).await?;
    session.press_enter(&searchbox).await?;

    // TODO: 改为等待过滤后的评论列表出现，而不是固定停顿
    sleep(SEARCH_SETTLE).await;
    Ok(())
}

/// 把本地结果并入已有结果表的副本；没有已有表时直接返回本地结果
fn merge_store(store: Option<ResultTable>, local: ResultTable) -> ResultTable {
    match store {
        Some(mut merged) => {
            debug!("正在把 {} 行新结果并入已有结果表", local.len());
            merged.concat(local);
            merged
        }
        None => local,
    }
}

/// 读取元素文本，元素不存在时降级为空字符串
async fn read_text<D: SessionDriver>(session: &D, locator: &str) -> SessionResult<String> {
    match session.find(locator).await? {
        Some(element) => session.text(&element).await,
        None => Ok(String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::mock::{ReviewFixture, ScriptedSession};
    use crate::models::place::ReviewRecord;
    use crate::services::relevance_filter::stubs::PassthroughFilter;

    fn scripted_place_page(reviews: Vec<ReviewFixture>) -> ScriptedSession {
        ScriptedSession::new(reviews)
            .with_text(selectors::PLACE_NAME_LOCAL, "市立美术馆")
            .with_text(selectors::PLACE_DESCRIPTION, "本地艺术收藏")
            .with_text(selectors::PLACE_DETAILS_ANCHOR, "")
            .with_text(selectors::PLACE_ADDRESS, "示例路 1 号")
            .with_text(selectors::PLACE_PHONE, "+86 10 0000 0000")
            .with_text(selectors::REVIEWS_TAB, "评价")
            .with_text(selectors::REVIEWS_SEARCHBOX, "")
    }

    fn descriptor() -> TaskDescriptor {
        TaskDescriptor::new("语音导览", "https://maps/place/museum", None)
    }

    #[tokio::test(start_paused = true)]
    async fn test_pipeline_collects_rows_with_place_info() {
        let session = scripted_place_page(vec![
            ReviewFixture::new("语音导览讲得很细", "1 个月前", 5),
            ReviewFixture::new("停车不方便", "2 个月前", 3),
        ]);
        let ctx = PlaceCtx::new(1, "https://maps/place/museum");

        let table = run_place_pipeline(
            &session,
            &ctx,
            &descriptor(),
            &PassthroughFilter,
            &Config::default(),
        )
        .await
        .expect("流水线失败");

        assert_eq!(table.len(), 2);
        for row in table.rows() {
            assert_eq!(row.place.name, "市立美术馆");
            assert_eq!(row.place.address, "示例路 1 号");
            assert_eq!(row.place.place_url, "https://maps/place/museum");
        }

        // 话题被提交进了评论搜索框
        assert!(session.keys_sent().contains(&"语音导览".to_string()));
        // 导航确实发生
        assert_eq!(session.navigations(), vec!["https://maps/place/museum"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_reviews_tab_is_fatal_to_the_task() {
        // 不挂评论区入口：wait_for 超时，故障向上浮出
        let session = ScriptedSession::new(vec![])
            .with_text(selectors::PLACE_NAME, "无评论地点")
            .with_text(selectors::PLACE_DETAILS_ANCHOR, "");
        let ctx = PlaceCtx::new(1, "https://maps/place/empty");

        let result = run_place_pipeline(
            &session,
            &ctx,
            &descriptor(),
            &PassthroughFilter,
            &Config::default(),
        )
        .await;

        assert!(matches!(result, Err(SessionError::Timeout { .. })));
    }

    #[test]
    fn test_merge_store_appends_without_reordering() {
        let mut prior = ResultTable::new();
        prior.append(ReviewRecord {
            review: "旧行".to_string(),
            date: "3 个月前".to_string(),
            score: 4,
            place: PlaceInfo::default(),
        });

        let mut local = ResultTable::new();
        local.append(ReviewRecord {
            review: "新行".to_string(),
            date: "1 周前".to_string(),
            score: 5,
            place: PlaceInfo::default(),
        });

        let merged = merge_store(Some(prior), local);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged.rows()[0].review, "旧行");
        assert_eq!(merged.rows()[1].review, "新行");
    }

    #[test]
    fn test_merge_store_without_prior_returns_local() {
        let merged = merge_store(None, ResultTable::new());
        assert!(merged.is_empty());
    }
}
