use log::{error, info, warn};
use std::env;
use std::sync::Arc;
use std::time::Duration;

use live_chat::config::ChatConfig;
use live_chat::core::{
    ChatChannelService, ChatEvent, ChatUser, ChatView, MessageHandler, UserRole,
};

const DEFAULT_STREAM_ID: &str = "1";
const DEFAULT_RUN_SECS: u64 = 12;
const DEMO_AVATAR: &str =
    "https://images.unsplash.com/photo-1494790108377-be9c29b29330?w=150&h=150&fit=crop&crop=face";

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Initialize env
    match dotenvy::dotenv() {
        Ok(_) => info!("Environment variables loaded from .env file"),
        Err(e) => warn!("Failed to load .env file: {}", e),
    };

    // Initialize logging
    env_logger::init();

    let config = match ChatConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    let mut args = env::args().skip(1);
    let stream_id = args.next().unwrap_or_else(|| DEFAULT_STREAM_ID.to_string());
    let run_for = args
        .next()
        .and_then(|s| s.parse().ok())
        .map(Duration::from_secs)
        .unwrap_or(Duration::from_secs(DEFAULT_RUN_SECS));

    info!(
        "Configuration: feed_interval={:?}, loopback_delay={:?}, stream={}",
        config.feed_interval, config.loopback_delay, stream_id
    );

    let service = ChatChannelService::new(config);

    let printer: MessageHandler = Arc::new(|event: &ChatEvent| match event.to_json() {
        Ok(json) => println!("{}", json),
        Err(e) => warn!("Could not print event: {}", e),
    });
    service.add_message_handler(Arc::clone(&printer));

    let me = ChatUser::new(2, "viewer123", UserRole::Viewer, DEMO_AVATAR);
    let view = ChatView::attach(&service, &stream_id, Some(me));

    if !view.send("Hello from the demo!") {
        warn!("Demo message was not accepted");
    }

    tokio::time::sleep(run_for).await;

    info!(
        "View of stream {} holds {} messages",
        view.stream_id(),
        view.message_count()
    );

    view.detach();
    service.remove_message_handler(&printer);
    service.shutdown();
}
