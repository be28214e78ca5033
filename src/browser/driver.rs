//! 浏览器会话能力接口 - 基础设施层
//!
//! 工作流层只依赖这个接口，不认识具体的自动化库；
//! 更换自动化实现时只需要替换接口背后的实现。
//!
//! ## 故障约定
//!
//! - "元素不存在"属于预期内缺失：`find` / `find_in` 返回 `Ok(None)`，
//!   `find_all` / `find_all_in` 返回空列表，从不作为错误浮出
//! - 其余故障（超时、导航、协议调用、会话中断）以 [`SessionError`]
//!   浮出，由 `is_transient()` 决定是否可重试
//!
//! [`SessionError`]: crate::error::SessionError

use std::time::Duration;

use async_trait::async_trait;

use crate::error::SessionResult;

/// 浏览器会话能力
///
/// 职责：
/// - 暴露导航、定位、交互、截图能力
/// - 不认识评论 / 地点等业务概念
/// - 不处理业务流程
#[async_trait]
pub trait SessionDriver: Send + Sync {
    /// 元素句柄类型（对调用方不透明，只作标识与传递使用）
    type Element: Clone + Send + Sync;

    /// 导航到指定 URL
    async fn navigate(&self, url: &str) -> SessionResult<()>;

    /// 定位单个元素；不存在时返回 `Ok(None)`
    async fn find(&self, locator: &str) -> SessionResult<Option<Self::Element>>;

    /// 定位全部匹配元素，保持页面顺序；无匹配时返回空列表
    async fn find_all(&self, locator: &str) -> SessionResult<Vec<Self::Element>>;

    /// 等待元素出现，超时返回 `SessionError::Timeout`
    async fn wait_for(&self, locator: &str, timeout: Duration) -> SessionResult<Self::Element>;

    /// 在元素范围内定位单个子元素；不存在时返回 `Ok(None)`
    async fn find_in(
        &self,
        element: &Self::Element,
        locator: &str,
    ) -> SessionResult<Option<Self::Element>>;

    /// 在元素范围内定位全部匹配子元素
    async fn find_all_in(
        &self,
        element: &Self::Element,
        locator: &str,
    ) -> SessionResult<Vec<Self::Element>>;

    /// 点击元素
    async fn click(&self, element: &Self::Element) -> SessionResult<()>;

    /// 向元素输入文本
    async fn send_keys(&self, element: &Self::Element, text: &str) -> SessionResult<()>;

    /// 对元素按下回车键
    async fn press_enter(&self, element: &Self::Element) -> SessionResult<()>;

    /// 读取元素的可见文本
    async fn text(&self, element: &Self::Element) -> SessionResult<String>;

    /// 读取元素属性；属性缺失时返回 `Ok(None)`
    async fn attr(&self, element: &Self::Element, name: &str) -> SessionResult<Option<String>>;

    /// 将元素滚动到视口内
    async fn scroll_into_view(&self, element: &Self::Element) -> SessionResult<()>;

    /// 截取当前页面
    async fn screenshot(&self) -> SessionResult<Vec<u8>>;
}
