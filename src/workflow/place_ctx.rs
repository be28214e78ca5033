//! 地点处理上下文
//!
//! 封装"我正在处理第几个地点"这一信息

use std::fmt::Display;

use crate::utils::simplify_url;

/// 地点处理上下文
#[derive(Debug, Clone)]
pub struct PlaceCtx {
    /// 地点在本批中的序号（从1开始，仅用于日志显示）
    pub place_index: usize,

    /// 地点页面 URL
    pub url: String,
}

impl PlaceCtx {
    /// 创建新的地点上下文
    pub fn new(place_index: usize, url: impl Into<String>) -> Self {
        Self {
            place_index,
            url: url.into(),
        }
    }

    /// 适合日志显示的地点名称
    pub fn display_name(&self) -> String {
        simplify_url(&self.url)
    }
}

impl Display for PlaceCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[地点 {}] {}", self.place_index, self.display_name())
    }
}
