//! # Place Review Extract
//!
//! 一个按话题批量采集地图地点评论的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `browser/` - 浏览器会话能力接口与 CDP 实现，持有稀缺资源（浏览器进程）
//! - `infrastructure/` - 工作单元范围的会话管理器，会话独占、懒创建、显式销毁
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单条评论 / 单个地点
//! - `RelevanceFilter` - 话题相关性过滤能力（LLM）
//! - `ReviewAnalyser` - 聚合评论的洞察分析能力
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个地点"的完整处理流程
//! - `discovery` - 基于内容键游标的增量评论发现
//! - `extraction` - 单条评论的提取步骤
//! - `collection` - 采集循环与重试策略
//! - `place_task` - 地点任务流水线（导航 → 采集 → 释放）
//! - `place_search` - 地点 URL 的收集
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批量地点处理器，管理并发与结果合并
//!
//! ## 模块结构

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod orchestrator;
pub mod selectors;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use browser::{CdpSession, DisplayMode, SessionDriver, SessionOptions};
pub use config::Config;
pub use error::{AppError, AppResult, SessionError};
pub use infrastructure::SessionManager;
pub use models::{PlaceInfo, ResultTable, ReviewRecord, TaskDescriptor};
pub use orchestrator::run_batch;
pub use services::{LlmRelevanceFilter, RelevanceFilter};
pub use workflow::{extract_place, gather_places, GatherOptions, PlaceCtx};
