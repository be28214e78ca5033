//! 批量地点处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责把一批地点 URL 扇出到有界并发的
//! 工作单元，并把各任务返回的部分结果表合并成一张总表。
//!
//! ## 核心功能
//!
//! 1. **来源校验**：直接提供的 URL 列表优先；否则从输入文件加载；
//!    两者都没有是致命的配置错误，在任何会话创建之前立即浮出
//! 2. **并发控制**：使用 Semaphore 限制同时存活的浏览器会话数
//! 3. **资源隔离**：每个任务构造自己的会话管理器，会话绝不跨任务共享
//! 4. **结果合并**：按任务完成的先后拼接结果表，行数等于各任务行数之和
//! 5. **故障隔离**：单个任务出错只记录并跳过，绝不中止同批任务
//!
//! ## 设计特点
//!
//! - **顶层编排**：不处理单个地点的细节，向下委托 place_task
//! - **可测试**：`run_batch_with` 接受任务函数，测试时注入桩任务

use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::Semaphore;
use tracing::{debug, error, info};

use crate::browser::launch::SessionOptions;
use crate::config::Config;
use crate::error::{AppError, ConfigError};
use crate::infrastructure::session_manager::SessionManager;
use crate::models::loaders::load_urls;
use crate::models::place::ResultTable;
use crate::models::task::TaskDescriptor;
use crate::services::relevance_filter::LlmRelevanceFilter;
use crate::utils::logging::{log_places_loaded, log_startup, print_final_stats};
use crate::workflow::place_ctx::PlaceCtx;
use crate::workflow::place_task::extract_place;

/// 批量提取一批地点的话题相关评论
///
/// # 参数
/// - `config`: 程序配置
/// - `topic`: 要在评论中搜索的话题
/// - `limit`: 每个地点最多采集的评论数
/// - `urls`: 直接提供的地点 URL 列表（优先使用）
/// - `input_file`: URL 列表的 JSON 输入文件（`urls` 缺失时使用）
///
/// # 返回
/// 返回合并后的结果表；URL 来源缺失时返回配置错误
pub async fn run_batch(
    config: &Config,
    topic: &str,
    limit: Option<usize>,
    urls: Option<Vec<String>>,
    input_file: Option<&str>,
) -> Result<ResultTable> {
    let urls = resolve_urls(urls, input_file).await?;

    log_startup(config.max_concurrent_places);
    log_places_loaded(urls.len(), config.max_concurrent_places);

    let total = urls.len();
    let shared_config = config.clone();
    let shared_topic = topic.to_string();

    let (table, failed) = run_batch_with(urls, config.max_concurrent_places, move |place_index, url| {
        let config = shared_config.clone();
        let topic = shared_topic.clone();
        async move {
            let ctx = PlaceCtx::new(place_index, url.clone());
            let descriptor = TaskDescriptor::new(topic, url, limit);
            let filter = LlmRelevanceFilter::new(&config);
            let mut manager = SessionManager::new(SessionOptions::from_config(&config));

            Ok(extract_place(&mut manager, &ctx, &descriptor, &filter, &config, None).await)
        }
    })
    .await?;

    print_final_stats(total - failed, failed, table.len());

    Ok(table)
}

/// 用给定的任务函数跑一批地点
///
/// 任务之间除并发额度外不共享任何可变状态；一个任务出错只记录并
/// 排除它的结果，其余任务照常合并。
///
/// # 返回
/// 返回 (合并后的结果表, 出错任务数)
pub async fn run_batch_with<F, Fut>(
    urls: Vec<String>,
    max_concurrent: usize,
    task_fn: F,
) -> Result<(ResultTable, usize)>
where
    F: Fn(usize, String) -> Fut,
    Fut: Future<Output = Result<ResultTable>> + Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(max_concurrent.max(1)));
    let mut handles = Vec::new();

    for (idx, url) in urls.into_iter().enumerate() {
        let place_index = idx + 1;

        // 并发额度满时在这里等待，保证同时存活的会话数不超过上限
        let permit = semaphore.clone().acquire_owned().await?;

        let task = task_fn(place_index, url.clone());
        let handle = tokio::spawn(async move {
            let _permit = permit;
            task.await
        });
        handles.push((place_index, url, handle));
    }

    let mut final_table = ResultTable::new();
    let mut failed = 0;

    for (place_index, url, handle) in handles {
        match handle.await {
            Ok(Ok(table)) => {
                if table.is_empty() {
                    debug!("[地点 {}] 没有产出相关评论", place_index);
                }
                final_table.concat(table);
            }
            Ok(Err(e)) => {
                failed += 1;
                error!("[地点 {}] 处理 {} 失败，排除该任务: {}", place_index, url, e);
            }
            Err(e) => {
                failed += 1;
                error!("[地点 {}] 任务执行失败: {}", place_index, e);
            }
        }
    }

    info!("✓ 批量合并完成，共 {} 行", final_table.len());

    Ok((final_table, failed))
}

/// 确定 URL 来源：直接提供的列表优先，否则读输入文件
///
/// 两者都缺失是配置错误，立即浮出，不做任何会话操作
async fn resolve_urls(
    urls: Option<Vec<String>>,
    input_file: Option<&str>,
) -> Result<Vec<String>> {
    match urls {
        Some(list) if !list.is_empty() => {
            debug!("使用直接提供的 {} 个 URL", list.len());
            Ok(list)
        }
        _ => match input_file {
            Some(path) => {
                debug!("从文件加载 URL 列表: {}", path);
                load_urls(path).await
            }
            None => {
                error!("URL 列表与输入文件均未提供");
                Err(AppError::Config(ConfigError::MissingUrlSource).into())
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::place::{PlaceInfo, ReviewRecord};

    fn one_row_table(url: &str) -> ResultTable {
        let mut table = ResultTable::new();
        table.append(ReviewRecord {
            review: format!("{} 的评论", url),
            date: "1 个月前".to_string(),
            score: 4,
            place: PlaceInfo {
                place_url: url.to_string(),
                ..Default::default()
            },
        });
        table
    }

    #[tokio::test]
    async fn test_three_stub_tasks_merge_into_three_rows() {
        let urls = vec!["A".to_string(), "B".to_string(), "C".to_string()];

        let (table, failed) = run_batch_with(urls, 2, |_place_index, url| async move {
            Ok(one_row_table(&url))
        })
        .await
        .expect("批量执行失败");

        assert_eq!(table.len(), 3);
        assert_eq!(failed, 0);

        // 每个 URL 的行都在总表里
        let reviews: Vec<&str> = table.rows().iter().map(|r| r.review.as_str()).collect();
        for url in ["A", "B", "C"] {
            assert!(reviews.contains(&format!("{} 的评论", url).as_str()));
        }
    }

    #[tokio::test]
    async fn test_failing_task_is_excluded_without_aborting_siblings() {
        let urls = vec!["A".to_string(), "B".to_string(), "C".to_string()];

        let (table, failed) = run_batch_with(urls, 5, |_place_index, url| async move {
            if url == "B" {
                anyhow::bail!("模拟任务出错");
            }
            Ok(one_row_table(&url))
        })
        .await
        .expect("批量执行失败");

        assert_eq!(table.len(), 2);
        assert_eq!(failed, 1);
    }

    #[tokio::test]
    async fn test_missing_url_source_is_a_config_error() {
        let result = resolve_urls(None, None).await;
        let err = result.expect_err("应当返回配置错误");

        let app_err = err.downcast_ref::<AppError>().expect("应当是 AppError");
        assert!(matches!(
            app_err,
            AppError::Config(ConfigError::MissingUrlSource)
        ));
    }

    #[tokio::test]
    async fn test_empty_explicit_list_falls_back_like_missing() {
        let result = resolve_urls(Some(Vec::new()), None).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_explicit_list_wins_over_input_file() {
        let urls = vec!["https://maps/place/direct".to_string()];

        // 输入文件路径指向不存在的文件：列表优先时根本不会去读它
        let resolved = resolve_urls(Some(urls.clone()), Some("/nonexistent/urls.json"))
            .await
            .expect("直接列表应当优先");
        assert_eq!(resolved, urls);
    }
}
