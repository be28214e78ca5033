//! 地图页面的元素定位符
//!
//! 全部以 CSS 选择器表达，集中在一处，页面改版时只需要修改这里。
//! 定位符之外的逻辑不允许出现裸选择器字符串。

// ========== 评论列表 ==========

/// 单条评论卡片
pub const REVIEW_CARD: &str = "div.jftiEf.fontBodyMedium";
/// 展开长评论的"更多"按钮
pub const REVIEW_MORE_BUTTON: &str = "button.w8nwRe.kyuRq";
/// 评论正文
pub const REVIEW_TEXT: &str = "span.wiI7pd";
/// 评论日期标签
pub const REVIEW_DATE: &str = "span.rsqaWe";
/// 高亮（点亮）的评分星形符号
pub const REVIEW_STAR_ACTIVE: &str = "span.hCCjke.google-symbols.NhBTye.elGi1d";

// ========== 评论区入口 ==========

/// 评论区入口按钮
pub const REVIEWS_TAB: &str = "div.pV4rW.q8YqMd div.etWJQ.kdfrQc.NUqjXc button.g88MCb.S9kvJb";
/// 评论区内部的话题搜索框
pub const REVIEWS_SEARCHBOX: &str = "input.sW8iyd";

// ========== 同意页 ==========

/// Cookie/条款同意按钮
pub const CONSENT_ACCEPT_BUTTON: &str =
    "button.VfPpkd-LgbsSe.VfPpkd-LgbsSe-OWXEXe-k8QpJ.VfPpkd-LgbsSe-OWXEXe-dgl2Hf.nCP5yc.AjY5Oe.DuMIQc.LQeN7.XWZjwc";

// ========== 地点信息 ==========

/// 地点原文名称
pub const PLACE_NAME_LOCAL: &str = "h1 .bwoZTb";
/// 地点英文名称（原文名称缺失时的回退）
pub const PLACE_NAME: &str = "h1.DUwDvf.lfPIob";
/// 地点简介
pub const PLACE_DESCRIPTION: &str = "div.PYvSYb";
/// 详情区锚点（用于滚动到详情）
pub const PLACE_DETAILS_ANCHOR: &str = "button[data-item-id=\"address\"]";
/// 地址文本
pub const PLACE_ADDRESS: &str = "button[data-item-id=\"address\"] .Io6YTe";
/// 电话文本
pub const PLACE_PHONE: &str = "button[data-item-id*=\"phone\"] .Io6YTe";
/// 官网链接
pub const PLACE_WEBSITE: &str = "a[data-item-id=\"authority\"]";

// ========== 地点搜索页 ==========

/// 搜索结果中的地点链接
pub const SEARCH_RESULT_LINK: &str = "a.hfpxzc";
/// 地图页顶部搜索框
pub const SEARCH_BOX: &str = "#searchboxinput";
