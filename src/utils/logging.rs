/// 日志工具模块
///
/// 提供日志初始化、运行头文件写入和输出格式化的辅助函数
use std::fs;
use std::sync::OnceLock;

use anyhow::Result;
use regex::Regex;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化日志订阅器
///
/// 日志级别通过 RUST_LOG 环境变量控制，默认 info
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// 初始化运行日志文件（写入带时间戳的运行头）
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n地点评论采集日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// 记录程序启动信息
///
/// # 参数
/// - `max_concurrent`: 最大并发会话数
pub fn log_startup(max_concurrent: usize) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 多会话地点采集模式");
    info!("📊 最大并发会话数: {}", max_concurrent);
    info!("{}", "=".repeat(60));
}

/// 记录地点加载信息
///
/// # 参数
/// - `total`: 地点总数
/// - `max_concurrent`: 最大并发会话数
pub fn log_places_loaded(total: usize, max_concurrent: usize) {
    info!("✓ 共 {} 个待处理的地点", total);
    info!("📋 最多同时处理 {} 个地点，每个地点独占一个浏览器会话\n", max_concurrent);
}

/// 打印最终统计信息
///
/// # 参数
/// - `succeeded`: 成功的地点数
/// - `failed`: 失败（被跳过）的地点数
/// - `rows`: 合并后的总行数
pub fn print_final_stats(succeeded: usize, failed: usize, rows: usize) {
    info!("\n{}", "=".repeat(60));
    info!("📊 批量采集完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 成功: {}/{}", succeeded, succeeded + failed);
    info!("❌ 失败: {}", failed);
    info!("📄 合计采集评论: {} 条", rows);
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

static PLACE_SLUG_RE: OnceLock<Regex> = OnceLock::new();

/// 把冗长的地图 URL 化简为适合日志显示的形式
///
/// 优先取 URL 中的地点名段；没有时退化为去掉查询参数的原始 URL
pub fn simplify_url(url: &str) -> String {
    let re = PLACE_SLUG_RE.get_or_init(|| Regex::new(r"/place/([^/@?#]+)").expect("内置正则无效"));

    if let Some(captures) = re.captures(url) {
        if let Some(slug) = captures.get(1) {
            return slug.as_str().replace('+', " ");
        }
    }

    url.split(['?', '#']).next().unwrap_or(url).to_string()
}
