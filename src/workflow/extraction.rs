//! 单条评论提取 - 流程层
//!
//! 把一条已发现的评论加工成零或一行记录：展开截断的正文（尽力而为）、
//! 读取正文 / 评分，再交给注入的相关性过滤器。
//!
//! 故障约定：滚动与展开阶段的会话故障向上浮出（结束本次采集尝试）；
//! 读取与过滤阶段的故障只跳过当前评论，绝不中断外层循环。

use std::time::Duration;

use tokio::time::sleep;
use tracing::warn;

use crate::browser::driver::SessionDriver;
use crate::error::SessionResult;
use crate::models::place::{PlaceInfo, ReviewRecord};
use crate::selectors;
use crate::services::relevance_filter::RelevanceFilter;
use crate::workflow::discovery::{read_child_text, DiscoveredReview};

/// 滚动后等待页面稳定（懒加载）的停顿
const ELEMENT_SETTLE: Duration = Duration::from_millis(500);

/// 提取一条评论
///
/// # 返回
/// - `Ok(Some(record))`: 评论与话题相关，产出一行记录
/// - `Ok(None)`: 评论无相关内容，或该条评论提取失败被跳过
/// - `Err(fault)`: 滚动 / 展开阶段出现会话故障
pub async fn extract_review<D, F>(
    session: &D,
    filter: &F,
    discovered: &DiscoveredReview<D::Element>,
    topic: &str,
    place: &PlaceInfo,
) -> SessionResult<Option<ReviewRecord>>
where
    D: SessionDriver,
    F: RelevanceFilter + ?Sized,
{
    session.scroll_into_view(&discovered.element).await?;
    sleep(ELEMENT_SETTLE).await;

    // 尝试点击"更多"按钮展开完整正文；按钮不存在不是错误
    if let Some(more) = session
        .find_in(&discovered.element, selectors::REVIEW_MORE_BUTTON)
        .await?
    {
        session.click(&more).await?;
    }

    match read_review_fields(session, discovered).await {
        Ok((text, score)) => {
            let Some(relevant) = filter.filter(&text, topic).await else {
                return Ok(None);
            };
            if relevant.is_empty() {
                return Ok(None);
            }
            Ok(Some(ReviewRecord {
                review: relevant,
                date: discovered.date.clone(),
                score,
                place: place.clone(),
            }))
        }
        Err(e) => {
            warn!("从评论元素提取数据失败，跳过该条: {}", e);
            Ok(None)
        }
    }
}

/// 读取评论的正文与评分；单个字段缺失降级为默认值
async fn read_review_fields<D: SessionDriver>(
    session: &D,
    discovered: &DiscoveredReview<D::Element>,
) -> SessionResult<(String, u32)> {
    let text = read_child_text(session, &discovered.element, selectors::REVIEW_TEXT).await?;
    let stars = session
        .find_all_in(&discovered.element, selectors::REVIEW_STAR_ACTIVE)
        .await?;
    Ok((text, stars.len() as u32))
}
