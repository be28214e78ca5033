use anyhow::{Context, Result};

use place_review_extract::models::loaders::store_table;
use place_review_extract::orchestrator::run_batch;
use place_review_extract::utils::logging;
use place_review_extract::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    logging::init();

    // 加载配置
    let config = Config::from_env();
    logging::init_log_file(&config.output_log_file)?;

    // 话题必须提供；每地点上限可选
    let topic = std::env::var("TOPIC").context("必须通过 TOPIC 环境变量指定要搜索的话题")?;
    let limit = std::env::var("LIMIT").ok().and_then(|v| v.parse().ok());

    // 批量采集并导出结果表
    let table = run_batch(&config, &topic, limit, None, Some(&config.input_file)).await?;
    store_table(&table, &config.output_file).await?;

    Ok(())
}
