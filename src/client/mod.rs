//! Weibo HTTP Client module
//!
//! This module contains the WeiboClient, the rate-limited Weibo facade and
//! their builders.

mod weibo_client;
pub use weibo_client::{WeiboClient, WeiboClientBuilder};

mod weibo;
pub use weibo::{IdsPage, Weibo, FOLLOWERS_ID_MAX_COUNT, FRIENDS_MAX_PAGE, MAX_PAGE_COUNT};

mod builder;
pub use builder::WeiboBuilder;
