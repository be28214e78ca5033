//! 会话管理器 - 基础设施层
//!
//! 每个工作单元持有一个自己的管理器实例（构造时注入，而不是进程级单例），
//! 因此一个浏览器进程永远只被一个工作单元触碰，槽位创建也不存在竞争。
//!
//! 会话按需懒创建；`release()` 显式销毁并清空关联，没有会话时调用是
//! 安全的空操作。一个地点任务结束后会话必须销毁，不跨地点复用。

use tracing::{debug, warn};

use crate::browser::cdp::CdpSession;
use crate::browser::launch::SessionOptions;
use crate::error::{SessionError, SessionResult};

/// 工作单元范围的会话管理器
pub struct SessionManager {
    options: SessionOptions,
    session: Option<CdpSession>,
}

impl SessionManager {
    /// 创建新的管理器（不启动浏览器）
    pub fn new(options: SessionOptions) -> Self {
        Self {
            options,
            session: None,
        }
    }

    /// 获取会话：已有存活会话时直接复用，否则按配置启动一个新会话
    pub async fn acquire(&mut self) -> SessionResult<&CdpSession> {
        if self.session.is_none() {
            debug!("当前工作单元没有会话，正在启动...");
            let session = CdpSession::launch(&self.options).await?;
            self.session = Some(session);
        }

        match &self.session {
            Some(session) => Ok(session),
            // acquire 刚刚放入了会话，这个分支不可达，但不使用 unwrap
            None => Err(SessionError::SessionClosed),
        }
    }

    /// 销毁会话并清空关联；没有会话时为空操作
    pub async fn release(&mut self) {
        if let Some(session) = self.session.take() {
            if let Err(e) = session.close().await {
                warn!("⚠️ 关闭浏览器会话失败（忽略）: {}", e);
            }
        }
    }

    /// 当前是否持有存活会话
    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }
}
