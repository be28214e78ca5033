//! 基于 CDP 的会话能力实现 - 基础设施层
//!
//! 持有唯一的浏览器进程和页面资源，只通过 [`SessionDriver`] 暴露能力。

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::element::Element;
use chromiumoxide::error::CdpError;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::{Browser, Page};
use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::browser::driver::SessionDriver;
use crate::browser::launch::{launch_browser, SessionOptions};
use crate::error::{SessionError, SessionResult};

/// 元素出现轮询间隔
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// CDP 会话
///
/// 职责：
/// - 持有唯一的 Browser / Page 资源
/// - 实现 [`SessionDriver`] 能力接口
/// - 不认识评论 / 地点等业务概念
pub struct CdpSession {
    browser: Browser,
    page: Page,
}

impl CdpSession {
    /// 按给定选项启动一个新会话
    pub async fn launch(options: &SessionOptions) -> SessionResult<Self> {
        let (browser, page) = launch_browser(options).await?;
        Ok(Self { browser, page })
    }

    /// 关闭会话，销毁浏览器进程
    pub async fn close(mut self) -> SessionResult<()> {
        debug!("正在关闭浏览器会话...");
        self.browser
            .close()
            .await
            .map_err(|e| SessionError::ScriptFailed(e.to_string()))?;
        let _ = self.browser.wait().await;
        debug!("✓ 浏览器会话已关闭");
        Ok(())
    }

    /// 把"元素不存在"降级为 None，其余故障原样浮出
    fn swallow_not_found<T>(result: Result<T, CdpError>) -> SessionResult<Option<T>> {
        match result {
            Ok(value) => Ok(Some(value)),
            Err(err) => match SessionError::from(err) {
                SessionError::ElementNotFound(_) => Ok(None),
                other => Err(other),
            },
        }
    }
}

#[async_trait]
impl SessionDriver for CdpSession {
    type Element = Arc<Element>;

    async fn navigate(&self, url: &str) -> SessionResult<()> {
        self.page
            .goto(url)
            .await
            .map_err(|e| SessionError::NavigationFailed {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        // 等待导航完成；空闲超时不视为导航失败
        let _ = self.page.wait_for_navigation().await;
        Ok(())
    }

    async fn find(&self, locator: &str) -> SessionResult<Option<Self::Element>> {
        let found = Self::swallow_not_found(self.page.find_element(locator).await)?;
        Ok(found.map(Arc::new))
    }

    async fn find_all(&self, locator: &str) -> SessionResult<Vec<Self::Element>> {
        let found = Self::swallow_not_found(self.page.find_elements(locator).await)?;
        Ok(found
            .unwrap_or_default()
            .into_iter()
            .map(Arc::new)
            .collect())
    }

    async fn wait_for(&self, locator: &str, timeout: Duration) -> SessionResult<Self::Element> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(element) = self.find(locator).await? {
                return Ok(element);
            }
            if Instant::now() >= deadline {
                return Err(SessionError::Timeout {
                    operation: format!("等待元素 {}", locator),
                });
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    async fn find_in(
        &self,
        element: &Self::Element,
        locator: &str,
    ) -> SessionResult<Option<Self::Element>> {
        let found = Self::swallow_not_found(element.find_element(locator).await)?;
        Ok(found.map(Arc::new))
    }

    async fn find_all_in(
        &self,
        element: &Self::Element,
        locator: &str,
    ) -> SessionResult<Vec<Self::Element>> {
        let found = Self::swallow_not_found(element.find_elements(locator).await)?;
        Ok(found
            .unwrap_or_default()
            .into_iter()
            .map(Arc::new)
            .collect())
    }

    async fn click(&self, element: &Self::Element) -> SessionResult<()> {
        element.click().await?;
        Ok(())
    }

    async fn send_keys(&self, element: &Self::Element, text: &str) -> SessionResult<()> {
        element.type_str(text).await?;
        Ok(())
    }

    async fn press_enter(&self, element: &Self::Element) -> SessionResult<()> {
        element.press_key("Enter").await?;
        Ok(())
    }

    async fn text(&self, element: &Self::Element) -> SessionResult<String> {
        let text = element.inner_text().await?;
        Ok(text.unwrap_or_default())
    }

    async fn attr(&self, element: &Self::Element, name: &str) -> SessionResult<Option<String>> {
        let value = element.attribute(name).await?;
        Ok(value)
    }

    async fn scroll_into_view(&self, element: &Self::Element) -> SessionResult<()> {
        element.scroll_into_view().await?;
        Ok(())
    }

    async fn screenshot(&self) -> SessionResult<Vec<u8>> {
        let bytes = self
            .page
            .screenshot(
                ScreenshotParams::builder()
                    .format(CaptureScreenshotFormat::Png)
                    .build(),
            )
            .await?;
        Ok(bytes)
    }
}
