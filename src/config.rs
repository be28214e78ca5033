/// 程序配置文件
#[derive(Clone, Debug)]
pub struct Config {
    /// 同时处理的地点数量（并发会话上限）
    pub max_concurrent_places: usize,
    /// 是否以无头模式运行浏览器
    pub headless: bool,
    /// 浏览器窗口宽度
    pub window_width: u32,
    /// 浏览器窗口高度
    pub window_height: u32,
    /// 导航 / CDP 请求超时（秒）
    pub nav_timeout_secs: u64,
    /// 等待页面元素出现的默认超时（秒）
    pub wait_timeout_secs: u64,
    /// 采集循环的最大尝试次数
    pub retry_attempts: usize,
    /// 两次尝试之间的固定延迟（秒）
    pub retry_delay_secs: u64,
    /// 随机抖动的上限（秒），叠加在固定延迟之上
    pub retry_jitter_secs: u64,
    /// 短评论阈值（字符数）：不超过该长度的评论原样通过，不调用 LLM
    pub short_text_threshold: usize,
    /// URL 列表输入文件
    pub input_file: String,
    /// 结果表输出文件
    pub output_file: String,
    /// 运行日志文件
    pub output_log_file: String,
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_concurrent_places: 5,
            headless: true,
            window_width: 1920,
            window_height: 1080,
            nav_timeout_secs: 15,
            wait_timeout_secs: 10,
            retry_attempts: 2,
            retry_delay_secs: 1,
            retry_jitter_secs: 3,
            short_text_threshold: 250,
            input_file: "list_of_places.json".to_string(),
            output_file: "reviews.json".to_string(),
            output_log_file: "output.txt".to_string(),
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4o-mini".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            max_concurrent_places: std::env::var("MAX_CONCURRENT_PLACES").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_concurrent_places),
            headless: std::env::var("HEADLESS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.headless),
            window_width: std::env::var("WINDOW_WIDTH").ok().and_then(|v| v.parse().ok()).unwrap_or(default.window_width),
            window_height: std::env::var("WINDOW_HEIGHT").ok().and_then(|v| v.parse().ok()).unwrap_or(default.window_height),
            nav_timeout_secs: std::env::var("NAV_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.nav_timeout_secs),
            wait_timeout_secs: std::env::var("WAIT_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.wait_timeout_secs),
            retry_attempts: std::env::var("RETRY_ATTEMPTS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.retry_attempts),
            retry_delay_secs: std::env::var("RETRY_DELAY_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.retry_delay_secs),
            retry_jitter_secs: std::env::var("RETRY_JITTER_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.retry_jitter_secs),
            short_text_threshold: std::env::var("SHORT_TEXT_THRESHOLD").ok().and_then(|v| v.parse().ok()).unwrap_or(default.short_text_threshold),
            input_file: std::env::var("INPUT_FILE").unwrap_or(default.input_file),
            output_file: std::env::var("OUTPUT_FILE").unwrap_or(default.output_file),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
            llm_api_key: std::env::var("OPENAI_API_KEY").unwrap_or(default.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
        }
    }
}
