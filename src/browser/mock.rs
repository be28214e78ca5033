//! 脚本化的会话能力实现（仅测试使用）
//!
//! 用固定脚本模拟页面行为：可见评论数量按计划逐次增长、
//! 指定某几次发现调用返回瞬态故障、点击"更多"后正文展开。

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::browser::driver::SessionDriver;
use crate::error::{SessionError, SessionResult};
use crate::selectors;

/// 单条评论的脚本数据
#[derive(Debug, Clone)]
pub struct ReviewFixture {
    /// 折叠状态下的正文
    pub text: String,
    /// 日期标签
    pub date: String,
    /// 点亮的星数
    pub stars: usize,
    /// 展开后的正文；None 表示没有"更多"按钮
    pub expanded_text: Option<String>,
}

impl ReviewFixture {
    pub fn new(text: &str, date: &str, stars: usize) -> Self {
        Self {
            text: text.to_string(),
            date: date.to_string(),
            stars,
            expanded_text: None,
        }
    }

    pub fn with_expansion(mut self, expanded: &str) -> Self {
        self.expanded_text = Some(expanded.to_string());
        self
    }
}

/// 模拟元素句柄
#[derive(Debug, Clone)]
pub enum MockElement {
    /// 评论卡片（携带脚本索引）
    Card(usize),
    /// 评论正文节点
    Text(usize),
    /// 日期标签节点
    Date(usize),
    /// 星形符号节点
    Star,
    /// "更多"按钮
    MoreButton(usize),
    /// 搜索结果链接
    Link(usize),
    /// 普通文本节点
    Generic(String),
}

#[derive(Default)]
struct MockState {
    discover_calls: usize,
    link_calls: usize,
    expanded: HashSet<usize>,
    navigations: Vec<String>,
    keys_sent: Vec<String>,
}

/// 脚本化会话
pub struct ScriptedSession {
    reviews: Vec<ReviewFixture>,
    /// 第 n 次读取评论列表时可见的数量；超出计划时重复最后一项
    visible_schedule: Vec<usize>,
    /// 这些（从 1 开始计数的）评论列表读取直接返回超时故障
    fail_on_calls: Vec<usize>,
    /// 按定位符提供的页面文本（find / wait_for 使用）
    texts: HashMap<String, String>,
    /// 搜索结果链接
    links: Vec<String>,
    /// 第 n 次读取搜索结果时可见的数量
    link_schedule: Vec<usize>,
    state: Mutex<MockState>,
}

impl ScriptedSession {
    pub fn new(reviews: Vec<ReviewFixture>) -> Self {
        let total = reviews.len();
        Self {
            reviews,
            visible_schedule: vec![total],
            fail_on_calls: Vec::new(),
            texts: HashMap::new(),
            links: Vec::new(),
            link_schedule: Vec::new(),
            state: Mutex::new(MockState::default()),
        }
    }

    /// 设置可见数量计划（模拟滚动加载）
    pub fn with_schedule(mut self, schedule: Vec<usize>) -> Self {
        self.visible_schedule = schedule;
        self
    }

    /// 指定哪些次评论列表读取返回瞬态故障
    pub fn with_failures(mut self, calls: Vec<usize>) -> Self {
        self.fail_on_calls = calls;
        self
    }

    /// 为定位符挂一段页面文本
    pub fn with_text(mut self, locator: &str, text: &str) -> Self {
        self.texts.insert(locator.to_string(), text.to_string());
        self
    }

    /// 设置搜索结果链接与可见计划
    pub fn with_links(mut self, links: Vec<String>, schedule: Vec<usize>) -> Self {
        self.links = links;
        self.link_schedule = schedule;
        self
    }

    /// 评论列表被读取的次数
    pub fn discover_calls(&self) -> usize {
        self.state.lock().unwrap().discover_calls
    }

    /// 已发生的导航
    pub fn navigations(&self) -> Vec<String> {
        self.state.lock().unwrap().navigations.clone()
    }

    /// 已发送的键盘输入
    pub fn keys_sent(&self) -> Vec<String> {
        self.state.lock().unwrap().keys_sent.clone()
    }

    fn schedule_at(schedule: &[usize], call: usize, fallback: usize) -> usize {
        if schedule.is_empty() {
            return fallback;
        }
        let idx = (call - 1).min(schedule.len() - 1);
        schedule[idx]
    }
}

#[async_trait]
impl SessionDriver for ScriptedSession {
    type Element = MockElement;

    async fn navigate(&self, url: &str) -> SessionResult<()> {
        self.state.lock().unwrap().navigations.push(url.to_string());
        Ok(())
    }

    async fn find(&self, locator: &str) -> SessionResult<Option<Self::Element>> {
        if locator == selectors::SEARCH_RESULT_LINK && !self.links.is_empty() {
            return Ok(Some(MockElement::Link(0)));
        }
        Ok(self
            .texts
            .get(locator)
            .map(|text| MockElement::Generic(text.clone())))
    }

    async fn find_all(&self, locator: &str) -> SessionResult<Vec<Self::Element>> {
        if locator == selectors::REVIEW_CARD {
            let call = {
                let mut state = self.state.lock().unwrap();
                state.discover_calls += 1;
                state.discover_calls
            };
            if self.fail_on_calls.contains(&call) {
                return Err(SessionError::Timeout {
                    operation: "读取评论列表".to_string(),
                });
            }
            let visible = Self::schedule_at(&self.visible_schedule, call, self.reviews.len())
                .min(self.reviews.len());
            return Ok((0..visible).map(MockElement::Card).collect());
        }

        if locator == selectors::SEARCH_RESULT_LINK {
            let call = {
                let mut state = self.state.lock().unwrap();
                state.link_calls += 1;
                state.link_calls
            };
            let visible =
                Self::schedule_at(&self.link_schedule, call, self.links.len()).min(self.links.len());
            return Ok((0..visible).map(MockElement::Link).collect());
        }

        Ok(Vec::new())
    }

    async fn wait_for(&self, locator: &str, _timeout: Duration) -> SessionResult<Self::Element> {
        self.find(locator).await?.ok_or(SessionError::Timeout {
            operation: format!("等待元素 {}", locator),
        })
    }

    async fn find_in(
        &self,
        element: &Self::Element,
        locator: &str,
    ) -> SessionResult<Option<Self::Element>> {
        let MockElement::Card(index) = element else {
            return Ok(None);
        };
        let index = *index;
        if locator == selectors::REVIEW_TEXT {
            return Ok(Some(MockElement::Text(index)));
        }
        if locator == selectors::REVIEW_DATE {
            return Ok(Some(MockElement::Date(index)));
        }
        if locator == selectors::REVIEW_MORE_BUTTON {
            let expanded = self.state.lock().unwrap().expanded.contains(&index);
            let has_more = self.reviews[index].expanded_text.is_some();
            return Ok((has_more && !expanded).then_some(MockElement::MoreButton(index)));
        }
        Ok(None)
    }

    async fn find_all_in(
        &self,
        element: &Self::Element,
        locator: &str,
    ) -> SessionResult<Vec<Self::Element>> {
        if let MockElement::Card(index) = element {
            if locator == selectors::REVIEW_STAR_ACTIVE {
                return Ok(vec![MockElement::Star; self.reviews[*index].stars]);
            }
        }
        Ok(Vec::new())
    }

    async fn click(&self, element: &Self::Element) -> SessionResult<()> {
        let mut state = self.state.lock().unwrap();
        if let MockElement::MoreButton(index) = element {
            state.expanded.insert(*index);
        }
        Ok(())
    }

    async fn send_keys(&self, _element: &Self::Element, text: &str) -> SessionResult<()> {
        self.state.lock().unwrap().keys_sent.push(text.to_string());
        Ok(())
    }

    async fn press_enter(&self, _element: &Self::Element) -> SessionResult<()> {
        Ok(())
    }

    async fn text(&self, element: &Self::Element) -> SessionResult<String> {
        let text = match element {
            MockElement::Text(index) => {
                let fixture = &self.reviews[*index];
                let expanded = self.state.lock().unwrap().expanded.contains(index);
                if expanded {
                    fixture
                        .expanded_text
                        .clone()
                        .unwrap_or_else(|| fixture.text.clone())
                } else {
                    fixture.text.clone()
                }
            }
            MockElement::Date(index) => self.reviews[*index].date.clone(),
            MockElement::Card(index) => self.reviews[*index].text.clone(),
            MockElement::Generic(text) => text.clone(),
            _ => String::new(),
        };
        Ok(text)
    }

    async fn attr(&self, element: &Self::Element, name: &str) -> SessionResult<Option<String>> {
        if name == "href" {
            if let MockElement::Link(index) = element {
                return Ok(self.links.get(*index).cloned());
            }
        }
        Ok(None)
    }

    async fn scroll_into_view(&self, _element: &Self::Element) -> SessionResult<()> {
        Ok(())
    }

    async fn screenshot(&self) -> SessionResult<Vec<u8>> {
        Ok(vec![0x89, b'P', b'N', b'G'])
    }
}
