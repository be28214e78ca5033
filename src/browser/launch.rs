//! 浏览器进程启动
//!
//! 每次启动产生一个独立的浏览器进程和一个页面，
//! 进程的生命周期由会话管理器控制。

use std::time::Duration;

use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::config::Config;
use crate::error::{SessionError, SessionResult};

/// 显示模式（枚举配置集，不接受自由格式参数）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    /// 无头模式
    Headless,
    /// 有窗口模式（用于人工观察 / 调试）
    Headed,
}

/// 会话启动选项
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// 显示模式
    pub mode: DisplayMode,
    /// 窗口宽度
    pub window_width: u32,
    /// 窗口高度
    pub window_height: u32,
    /// CDP 请求 / 导航超时
    pub request_timeout: Duration,
    /// 等待元素出现的默认超时
    pub wait_timeout: Duration,
}

impl SessionOptions {
    /// 从程序配置构建启动选项
    pub fn from_config(config: &Config) -> Self {
        Self {
            mode: if config.headless {
                DisplayMode::Headless
            } else {
                DisplayMode::Headed
            },
            window_width: config.window_width,
            window_height: config.window_height,
            request_timeout: Duration::from_secs(config.nav_timeout_secs),
            wait_timeout: Duration::from_secs(config.wait_timeout_secs),
        }
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// 启动浏览器并创建空白页面
pub async fn launch_browser(options: &SessionOptions) -> SessionResult<(Browser, Page)> {
    info!("🚀 启动浏览器 (模式: {:?})...", options.mode);

    let mut builder = BrowserConfig::builder()
        .window_size(options.window_width, options.window_height)
        .request_timeout(options.request_timeout)
        .no_sandbox()
        .args(vec![
            "--disable-gpu",           // 无头模式下禁用 GPU
            "--disable-dev-shm-usage", // 防止共享内存不足
            "--disable-extensions",
            "--disable-infobars",
            "--lang=en",
        ]);

    if options.mode == DisplayMode::Headed {
        builder = builder.with_head();
    }

    let config = builder.build().map_err(|e| {
        error!("配置浏览器失败: {}", e);
        SessionError::LaunchFailed(e)
    })?;

    let (browser, mut handler) = Browser::launch(config).await.map_err(|e| {
        error!("启动浏览器失败: {}", e);
        SessionError::LaunchFailed(e.to_string())
    })?;
    debug!("浏览器进程启动成功");

    // 在后台处理浏览器事件
    tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    // 添加短暂延迟以等待浏览器状态同步
    sleep(Duration::from_millis(300)).await;

    let page = browser.new_page("about:blank").await.map_err(|e| {
        error!("创建页面失败: {}", e);
        SessionError::LaunchFailed(e.to_string())
    })?;

    debug!("✓ 浏览器就绪");

    Ok((browser, page))
}
