use place_review_extract::browser::{CdpSession, SessionOptions};
use place_review_extract::infrastructure::SessionManager;
use place_review_extract::models::TaskDescriptor;
use place_review_extract::services::LlmRelevanceFilter;
use place_review_extract::utils::logging;
use place_review_extract::workflow::{extract_place, gather_places, GatherOptions, PlaceCtx};
use place_review_extract::Config;

#[tokio::test]
#[ignore] // 默认忽略，需要本机有 Chrome/Chromium：cargo test -- --ignored
async fn test_browser_session_lifecycle() {
    // 初始化日志
    logging::init();

    // 启动一个无头会话并立即关闭
    let session = CdpSession::launch(&SessionOptions::default())
        .await
        .expect("启动浏览器失败");

    session.close().await.expect("关闭浏览器失败");
}

#[tokio::test]
#[ignore]
async fn test_session_manager_reuses_live_session() {
    logging::init();

    let mut manager = SessionManager::new(SessionOptions::default());
    assert!(!manager.has_session());

    manager.acquire().await.expect("获取会话失败");
    assert!(manager.has_session());

    // 再次获取时复用，不另起进程
    manager.acquire().await.expect("复用会话失败");
    assert!(manager.has_session());

    manager.release().await;
    assert!(!manager.has_session());
}

#[tokio::test]
#[ignore] // 需要浏览器和可用的 LLM 端点（OPENAI_API_KEY）
async fn test_extract_single_place() {
    logging::init();

    let config = Config::from_env();

    // 注意：请根据实际情况替换地点 URL 与话题
    let url = "https://www.google.com/maps/place/Museu+Nacional+d'Art+de+Catalunya";
    let ctx = PlaceCtx::new(1, url);
    let descriptor = TaskDescriptor::new("audio guide", url, Some(10));

    let filter = LlmRelevanceFilter::new(&config);
    let mut manager = SessionManager::new(SessionOptions::from_config(&config));

    let table = extract_place(&mut manager, &ctx, &descriptor, &filter, &config, None).await;
    println!("采集到 {} 条相关评论", table.len());

    // 任务结束后会话必须已销毁
    assert!(!manager.has_session());
}

#[tokio::test]
#[ignore]
async fn test_gather_places_for_query() {
    logging::init();

    let config = Config::from_env();
    let mut manager = SessionManager::new(SessionOptions::from_config(&config));
    let session = manager.acquire().await.expect("获取会话失败");

    let mut options = GatherOptions::new("museums");
    options.output_file = Some("gathered_places.json".to_string());

    let places = gather_places(session, &options).await.expect("收集地点失败");
    println!("找到 {} 个地点", places.len());

    manager.release().await;
}
