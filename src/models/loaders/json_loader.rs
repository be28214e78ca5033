//! 持久化的 URL 列表与结果表的 JSON 读写
//!
//! URL 列表是一个有序字符串数组的 JSON 文档：整体读取，整体覆盖写入，
//! 文件名统一带 .json 扩展名。

use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs;

use crate::models::place::ResultTable;

/// 从 JSON 文件整体加载地点 URL 列表
pub async fn load_urls(path: &str) -> Result<Vec<String>> {
    if !Path::new(path).exists() {
        anyhow::bail!("输入文件不存在: {}", path);
    }

    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("无法读取URL列表文件: {}", path))?;

    let urls: Vec<String> = serde_json::from_str(&content)
        .with_context(|| format!("无法解析URL列表文件: {}", path))?;

    tracing::info!("从 {} 加载了 {} 个地点 URL", path, urls.len());

    Ok(urls)
}

/// 规范化输出文件名：缺少 .json 扩展名时补上
pub fn normalize_json_filename(filename: &str) -> String {
    if filename.ends_with(".json") {
        filename.to_string()
    } else {
        format!("{}.json", filename)
    }
}

/// 将 URL 列表整体写入 JSON 文件（覆盖写）
///
/// # 返回
/// 返回实际写入的文件路径（扩展名规范化之后）
pub async fn store_urls(urls: &[String], filename: &str) -> Result<String> {
    let path = normalize_json_filename(filename);
    tracing::debug!("正在将 {} 个 URL 写入 {}", urls.len(), path);

    let content = serde_json::to_string(urls).context("无法序列化URL列表")?;
    fs::write(&path, content)
        .await
        .with_context(|| format!("无法写入URL列表文件: {}", path))?;

    tracing::info!("✓ URL 列表已保存至 {}", path);
    Ok(path)
}

/// 将结果表写入 JSON 文件（覆盖写）
pub async fn store_table(table: &ResultTable, filename: &str) -> Result<String> {
    let path = normalize_json_filename(filename);

    let content = serde_json::to_string_pretty(table.rows()).context("无法序列化结果表")?;
    fs::write(&path, content)
        .await
        .with_context(|| format!("无法写入结果文件: {}", path))?;

    tracing::info!("✓ {} 行结果已保存至 {}", table.len(), path);
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_json_filename() {
        assert_eq!(normalize_json_filename("places"), "places.json");
        assert_eq!(normalize_json_filename("places.json"), "places.json");
        assert_eq!(normalize_json_filename("out/places"), "out/places.json");
    }

    #[tokio::test]
    async fn test_store_then_load_roundtrip() {
        let dir = tempfile::tempdir().expect("无法创建临时目录");
        let file = dir.path().join("urls");
        let filename = file.to_string_lossy().to_string();

        let urls = vec![
            "https://maps.example.com/place/a".to_string(),
            "https://maps.example.com/place/b".to_string(),
        ];

        let stored_path = store_urls(&urls, &filename).await.expect("写入失败");
        assert!(stored_path.ends_with(".json"));

        let loaded = load_urls(&stored_path).await.expect("读取失败");
        assert_eq!(loaded, urls);
    }

    #[tokio::test]
    async fn test_load_missing_file_fails() {
        let result = load_urls("/nonexistent/urls.json").await;
        assert!(result.is_err());
    }
}
