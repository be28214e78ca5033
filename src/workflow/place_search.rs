//! 地点收集 - 流程层
//!
//! 在地图上按关键词搜索某个区域内的地点，滚动结果列表直到数量
//! 不再增长，收集去重后的地点 URL，可选地持久化为 JSON 文档。

use std::time::Duration;

use anyhow::{Context, Result};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::browser::driver::SessionDriver;
use crate::models::loaders::store_urls;
use crate::selectors;
use crate::workflow::place_task::accept_consent;

/// 搜索框出现的等待上限
const SEARCH_BOX_TIMEOUT: Duration = Duration::from_secs(10);
/// 首批搜索结果出现的等待上限
const FIRST_RESULT_TIMEOUT: Duration = Duration::from_secs(15);
/// 两轮滚动收集之间的停顿
const SCROLL_PAUSE: Duration = Duration::from_secs(2);

/// 地点收集选项
#[derive(Debug, Clone)]
pub struct GatherOptions {
    /// 搜索关键词
    pub query: String,
    /// 地图界面语言
    pub language: String,
    /// 起始视野：纬度、经度、缩放级别
    pub coordinates: (f64, f64, f64),
    /// 结果 URL 列表的输出文件（None 表示不持久化）
    pub output_file: Option<String>,
    /// 调试截图的保存路径（None 表示不截图）
    pub screenshot_file: Option<String>,
}

impl GatherOptions {
    /// 以默认视野创建选项
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            language: "en".to_string(),
            coordinates: (42.010398, 2.1113405, 10.1),
            output_file: None,
            screenshot_file: None,
        }
    }
}

/// 收集搜索结果中的全部地点 URL
///
/// 反复读取结果列表并把新出现的链接滚动进视口，直到结果数量
/// 不再增长为止。返回去重后的 URL，保持出现顺序。
pub async fn gather_places<D: SessionDriver>(
    session: &D,
    options: &GatherOptions,
) -> Result<Vec<String>> {
    let (lat, lng, zoom) = options.coordinates;
    let url = format!(
        "https://www.google.com/maps/@{lat},{lng},{zoom}z?hl={}",
        options.language
    );

    info!(
        "开始收集地点，关键词: '{}'，视野: ({}, {}, {}z)，语言: '{}'",
        options.query, lat, lng, zoom, options.language
    );

    session.navigate(&url).await.context("打开地图失败")?;
    accept_consent(session, Duration::from_secs(5)).await;

    // 提交搜索
    let search_box = session
        .wait_for(selectors::SEARCH_BOX, SEARCH_BOX_TIMEOUT)
        .await
        .context("找不到搜索框")?;
    session
        .send_keys(&search_box, &options.query)
        .await
        .context("输入关键词失败")?;
    session
        .press_enter(&search_box)
        .await
        .context("提交搜索失败")?;

    session
        .wait_for(selectors::SEARCH_RESULT_LINK, FIRST_RESULT_TIMEOUT)
        .await
        .context("等待搜索结果超时")?;

    // 保存一张调试截图，方便确认搜索视野
    if let Some(path) = &options.screenshot_file {
        save_debug_screenshot(session, path).await;
    }

    let mut places_urls: Vec<String> = Vec::new();
    let mut previous_count = 0;

    loop {
        let result_links = session.find_all(selectors::SEARCH_RESULT_LINK).await?;
        let current_count = result_links.len();

        if current_count == previous_count {
            break;
        }

        for link in result_links.iter().skip(previous_count) {
            if let Err(e) = session.scroll_into_view(link).await {
                debug!("滚动结果链接失败（忽略）: {}", e);
            }
            if let Some(href) = session.attr(link, "href").await? {
                if !href.is_empty() && !places_urls.contains(&href) {
                    places_urls.push(href);
                }
            }
        }

        previous_count = current_count;
        sleep(SCROLL_PAUSE).await;
    }

    info!("✓ 地点收集完成，共找到 {} 个地点", places_urls.len());

    if let Some(output_file) = &options.output_file {
        store_urls(&places_urls, output_file).await?;
    }

    Ok(places_urls)
}

/// 截图并写入文件；失败只记录日志
async fn save_debug_screenshot<D: SessionDriver>(session: &D, path: &str) {
    match session.screenshot().await {
        Ok(bytes) => {
            if let Err(e) = tokio::fs::write(path, bytes).await {
                warn!("⚠️ 保存调试截图失败: {}", e);
            } else {
                debug!("调试截图已保存至 {}", path);
            }
        }
        Err(e) => warn!("⚠️ 截图失败: {}", e),
    }
}
