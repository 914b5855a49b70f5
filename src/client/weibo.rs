//! Rate-limited Weibo facade

use std::path::Path;

use log::info;
use serde_json::Value;

use crate::api::binder::{CallArgs, EndpointDescriptor, PostData};
use crate::api::endpoints;
use crate::api::oauth::{AccessTokenGrant, OAuthApi};
use crate::error::WeiboError;
use crate::rate_limit::{Quota, RateLimitConfig, RateLimiter};
use crate::types::{AccessToken, JsonObject};

use super::WeiboClient;

/// Upper bound for `count` on tag and comment listings
pub const MAX_PAGE_COUNT: u32 = 200;
/// Page size used when walking all follower ids
pub const FOLLOWERS_ID_MAX_COUNT: u32 = 2000;
/// Pages fetched at most by [`Weibo::get_friends`]
pub const FRIENDS_MAX_PAGE: usize = 10;
const FOLLOWERS_EMPTY_ATTEMPTS: usize = 3;
const SEARCH_STATUS_MAX_ROUNDS: usize = 30;
const SEARCH_USER_MAX_PAGE: u32 = 9;

const REQUEST: &[Quota] = &[Quota::Request];
const REQUEST_AND_STATUS: &[Quota] = &[Quota::Request, Quota::Status];
const REQUEST_AND_MESSAGE: &[Quota] = &[Quota::Request, Quota::Message];

/// One cursor step of an id listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdsPage {
    pub ids: Vec<i64>,
    pub next_cursor: i64,
}

/// Weibo API facade
///
/// Wraps a [`WeiboClient`] with local request quotas and the paging loops
/// of list operations. Guarded operations fail with
/// [`WeiboError::TooManyRequests`] before any network traffic once a quota
/// is spent.
///
/// # Example
///
/// ```rust,ignore
/// use weibo_sdk::Weibo;
/// use weibo_sdk::types::{AccessToken, AppKey, AppSecret};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let mut weibo = Weibo::builder()
///         .app_key(AppKey::new("1234567789")?)
///         .app_secret(AppSecret::new("asdfjkalsdfjl")?)
///         .redirect_uri("http://www.example.com/callback/")
///         .build()?;
///
///     let grant = weibo.request_access_token("code").await?;
///     weibo.set_access_token(grant.access_token, grant.expires);
///
///     let user = weibo.get_user(1750070171).await?;
///     println!("{:?}", user.str("screen_name"));
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct Weibo {
    client: WeiboClient,
    limiter: RateLimiter,
}

impl Weibo {
    pub fn builder() -> super::builder::WeiboBuilder {
        super::builder::WeiboBuilder::default()
    }

    /// Wrap an existing client. Quota windows follow the client's clock.
    pub fn new(client: WeiboClient, rate_limits: RateLimitConfig) -> Self {
        let limiter = RateLimiter::new(rate_limits, client.clock().clone());
        Self { client, limiter }
    }

    pub fn client(&self) -> &WeiboClient {
        &self.client
    }

    pub fn rate_limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    // Credentials

    pub fn set_access_token(&mut self, access_token: AccessToken, expires: i64) {
        self.client.set_access_token(access_token, expires);
    }

    pub fn access_token(&self) -> Option<&str> {
        self.client.access_token().map(AccessToken::as_str)
    }

    /// Token expiry in epoch seconds, 0 when no token is set
    pub fn expires(&self) -> i64 {
        self.client.expires()
    }

    /// `true` when no token is set or its expiry has passed
    pub fn is_expired(&self) -> bool {
        self.client.access_token().is_none() || self.client.now() > self.client.expires()
    }

    pub fn get_authorize_url(
        &self,
        redirect_uri: Option<&str>,
        display: &str,
    ) -> Result<String, WeiboError> {
        OAuthApi::new(&self.client).authorize_url(redirect_uri, display)
    }

    pub async fn request_access_token(&self, code: &str) -> Result<AccessTokenGrant, WeiboError> {
        OAuthApi::new(&self.client)
            .request_access_token(code, None)
            .await
    }

    pub async fn request_refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<AccessTokenGrant, WeiboError> {
        OAuthApi::new(&self.client)
            .request_refresh_token(refresh_token, None)
            .await
    }

    async fn guard(&self, quotas: &[Quota], message: &str) -> Result<(), WeiboError> {
        self.limiter
            .acquire(quotas, message, || self.remaining_hits())
            .await
    }

    async fn remaining_hits(&self) -> Result<i64, WeiboError> {
        let status = self.get_rate_limit().await?;
        status
            .i64("remaining_hits")
            .or_else(|| status.i64("remaining_user_hits"))
            .ok_or_else(|| {
                WeiboError::Decode("rate limit status without remaining hits".to_string())
            })
    }

    async fn guarded_call(
        &self,
        quotas: &[Quota],
        message: &str,
        descriptor: &EndpointDescriptor,
        args: CallArgs,
    ) -> Result<JsonObject, WeiboError> {
        self.guard(quotas, message).await?;
        self.client.call_api(descriptor, args).await
    }

    // Account

    /// Uid of the authorized user, `None` when the API rejects the call
    pub async fn get_current_user(&self) -> Result<Option<JsonObject>, WeiboError> {
        self.guard(REQUEST, "Too many requests in get_current_user")
            .await?;
        match self
            .client
            .call_api(&endpoints::VERIFY_CREDENTIALS, CallArgs::new())
            .await
        {
            Ok(user) => Ok(Some(user)),
            Err(e) => {
                info!("[Weibo] get_current_user failed: {}", e);
                Ok(None)
            }
        }
    }

    /// Server-side quota status. Never consumes a local quota.
    pub async fn get_rate_limit(&self) -> Result<JsonObject, WeiboError> {
        self.client
            .call_api(&endpoints::RATE_LIMIT_STATUS, CallArgs::new())
            .await
    }

    // Users

    pub async fn get_user(&self, uid: i64) -> Result<JsonObject, WeiboError> {
        self.guarded_call(
            REQUEST,
            "Too many requests in get_user",
            &endpoints::GET_USER,
            CallArgs::new().param("uid", uid),
        )
        .await
    }

    pub async fn get_user_by_name(&self, screen_name: &str) -> Result<JsonObject, WeiboError> {
        self.guarded_call(
            REQUEST,
            "Too many requests in get_user_by_name",
            &endpoints::GET_USER,
            CallArgs::new().param("screen_name", screen_name),
        )
        .await
    }

    /// Follower, friend and status counts of several users
    pub async fn get_users_count(&self, uids: &[i64]) -> Result<JsonObject, WeiboError> {
        self.guarded_call(
            REQUEST,
            "Too many requests in get_users_count",
            &endpoints::USERS_COUNT,
            CallArgs::new().param("uids", join_ids(uids)),
        )
        .await
    }

    pub async fn get_user_count(&self, uids: &[i64]) -> Result<JsonObject, WeiboError> {
        self.get_users_count(uids).await
    }

    /// Tags of a user.
    ///
    /// # Errors
    /// `WeiboError::Parameter` when `count` exceeds [`MAX_PAGE_COUNT`]. The
    /// request quota is consumed before the check.
    pub async fn get_tags(
        &self,
        uid: i64,
        count: u32,
        page: Option<u32>,
    ) -> Result<JsonObject, WeiboError> {
        self.guard(REQUEST, "Too many requests in get_tags").await?;
        if count > MAX_PAGE_COUNT {
            return Err(WeiboError::Parameter(
                "Too many tag counts per page.".to_string(),
            ));
        }
        let args = CallArgs::new()
            .param("uid", uid)
            .param("count", count)
            .opt_param("page", page);
        self.client.call_api(&endpoints::TAGS, args).await
    }

    // Direct messages

    /// All received direct messages newer than `since_id`
    pub async fn get_direct_msgs(
        &self,
        since_id: Option<i64>,
        count: u32,
    ) -> Result<Vec<JsonObject>, WeiboError> {
        self.collect_pages(
            &endpoints::DIRECT_MESSAGES,
            since_id,
            count,
            "Too many requests in get_direct_msgs",
        )
        .await
    }

    /// All sent direct messages newer than `since_id`
    pub async fn get_sent_direct_msgs(
        &self,
        since_id: Option<i64>,
        count: u32,
    ) -> Result<Vec<JsonObject>, WeiboError> {
        self.collect_pages(
            &endpoints::SENT_DIRECT_MESSAGES,
            since_id,
            count,
            "Too many requests in get_sent_direct_msgs",
        )
        .await
    }

    /// Walk pages 1, 2, ... until one comes back short. Each page consumes
    /// one request quota.
    async fn collect_pages(
        &self,
        descriptor: &EndpointDescriptor,
        since_id: Option<i64>,
        count: u32,
        message: &str,
    ) -> Result<Vec<JsonObject>, WeiboError> {
        if count == 0 {
            return Err(WeiboError::Parameter(
                "Page count must be at least 1.".to_string(),
            ));
        }
        let mut collected = Vec::new();
        let mut page = 1u32;
        loop {
            let args = CallArgs::new()
                .opt_param("since_id", since_id)
                .param("count", count)
                .param("page", page);
            let result = self.guarded_call(REQUEST, message, descriptor, args).await?;
            let items = descriptor.items(&result);
            let received = items.len();
            collected.extend(items);
            if received == 0 || received < count as usize {
                break;
            }
            page += 1;
        }
        Ok(collected)
    }

    pub async fn send_message(&self, uid: i64, text: &str) -> Result<JsonObject, WeiboError> {
        self.guarded_call(
            REQUEST_AND_MESSAGE,
            "Too many requests in send_message",
            &endpoints::NEW_DIRECT_MESSAGE,
            CallArgs::new().param("uid", uid).param("text", text),
        )
        .await
    }

    // Friendships

    /// One page of followers, re-requested while the API returns an empty
    /// page. API errors end the attempt with what was received.
    pub async fn get_followers(
        &self,
        uid: i64,
        cursor: i64,
        count: u32,
    ) -> Result<Vec<JsonObject>, WeiboError> {
        self.guard(REQUEST, "Too many requests in get_followers")
            .await?;
        Ok(self
            .followers_until_non_empty(uid, cursor, count, FOLLOWERS_EMPTY_ATTEMPTS)
            .await)
    }

    /// Like [`get_followers`](Self::get_followers) without consuming a quota,
    /// with one extra attempt.
    pub async fn get_followers_by_id(
        &self,
        uid: i64,
        cursor: i64,
        count: u32,
    ) -> Result<Vec<JsonObject>, WeiboError> {
        Ok(self
            .followers_until_non_empty(uid, cursor, count, FOLLOWERS_EMPTY_ATTEMPTS + 1)
            .await)
    }

    async fn followers_until_non_empty(
        &self,
        uid: i64,
        cursor: i64,
        count: u32,
        attempts: usize,
    ) -> Vec<JsonObject> {
        let mut followers = Vec::new();
        for _ in 0..attempts {
            let args = CallArgs::new()
                .param("uid", uid)
                .param("cursor", cursor)
                .param("count", count);
            match self.client.call_api(&endpoints::FOLLOWERS, args).await {
                Ok(result) => followers = endpoints::FOLLOWERS.items(&result),
                Err(e) => {
                    info!("[Weibo] followers of {} failed: {}", uid, e);
                    break;
                }
            }
            if !followers.is_empty() {
                break;
            }
        }
        followers
    }

    /// Every follower id of `uid`, without duplicates.
    ///
    /// Each page consumes one request quota and quota exhaustion is an
    /// error. API errors end the walk with the ids collected so far.
    pub async fn get_followers_ids(&self, uid: i64) -> Result<Vec<i64>, WeiboError> {
        let ids = self
            .walk_ids(
                &endpoints::FOLLOWERS_IDS,
                Some(uid),
                None,
                FOLLOWERS_ID_MAX_COUNT,
                "Too many requests in get_followers_ids",
            )
            .await?;
        Ok(dedup(ids))
    }

    /// Every friend id of a user.
    pub async fn get_friends_ids(
        &self,
        uid: Option<i64>,
        screen_name: Option<&str>,
        count: u32,
    ) -> Result<Vec<i64>, WeiboError> {
        self.walk_ids(
            &endpoints::FRIENDS_IDS,
            uid,
            screen_name,
            count,
            "Too many requests in get_friends_ids",
        )
        .await
    }

    async fn walk_ids(
        &self,
        descriptor: &EndpointDescriptor,
        uid: Option<i64>,
        screen_name: Option<&str>,
        count: u32,
        message: &str,
    ) -> Result<Vec<i64>, WeiboError> {
        let mut collected = Vec::new();
        let mut cursor = 0i64;
        loop {
            self.guard(REQUEST, message).await?;
            let args = CallArgs::new()
                .opt_param("uid", uid)
                .opt_param("screen_name", screen_name)
                .param("cursor", cursor)
                .param("count", count);
            let result = match self.client.call_api(descriptor, args).await {
                Ok(result) => result,
                Err(e) => {
                    info!("[Weibo] {} failed: {}", descriptor.name, e);
                    break;
                }
            };
            let ids = ids_of(descriptor, &result);
            if ids.is_empty() {
                break;
            }
            cursor += ids.len() as i64;
            collected.extend(ids);
        }
        Ok(collected)
    }

    /// One cursor step of the authorized user's follower ids
    pub async fn get_limited_followers_ids(
        &self,
        cursor: i64,
        count: u32,
    ) -> Result<IdsPage, WeiboError> {
        self.ids_page(
            &endpoints::FOLLOWERS_IDS,
            cursor,
            count,
            "Too many requests in get_limited_followers_ids",
        )
        .await
    }

    /// One cursor step of the authorized user's friend ids
    pub async fn get_limited_friends_ids(
        &self,
        cursor: i64,
        count: u32,
    ) -> Result<IdsPage, WeiboError> {
        self.ids_page(
            &endpoints::FRIENDS_IDS,
            cursor,
            count,
            "Too many requests in get_limited_friends_ids",
        )
        .await
    }

    async fn ids_page(
        &self,
        descriptor: &EndpointDescriptor,
        cursor: i64,
        count: u32,
        message: &str,
    ) -> Result<IdsPage, WeiboError> {
        let args = CallArgs::new()
            .param("cursor", cursor)
            .param("count", count);
        let result = self.guarded_call(REQUEST, message, descriptor, args).await?;
        Ok(IdsPage {
            ids: ids_of(descriptor, &result),
            next_cursor: result.i64("next_cursor").unwrap_or(0),
        })
    }

    /// Friends of a user, at most [`FRIENDS_MAX_PAGE`] pages.
    ///
    /// Running out of request quota or an API error midway returns the
    /// friends collected so far.
    pub async fn get_friends(
        &self,
        uid: Option<i64>,
        screen_name: Option<&str>,
        count: u32,
        trim_status: bool,
    ) -> Result<Vec<JsonObject>, WeiboError> {
        self.guard(REQUEST, "Too many requests in get_friends").await?;

        let mut friends = Vec::new();
        let mut cursor = 0i64;
        for _ in 0..FRIENDS_MAX_PAGE {
            if let Err(e) = self.guard(REQUEST, "Too many requests in get_friends").await {
                info!("[Weibo] {}", e);
                break;
            }
            let args = CallArgs::new()
                .opt_param("uid", uid)
                .opt_param("screen_name", screen_name)
                .param("cursor", cursor)
                .param("count", count)
                .param("trim_status", u8::from(trim_status));
            let result = match self.client.call_api(&endpoints::FRIENDS, args).await {
                Ok(result) => result,
                Err(e) => {
                    info!("[Weibo] friends failed: {}", e);
                    break;
                }
            };
            let page = endpoints::FRIENDS.items(&result);
            if page.is_empty() {
                break;
            }
            cursor += page.len() as i64;
            friends.extend(page);
        }
        Ok(friends)
    }

    /// Relationship between two users as `(source, target)`
    pub async fn show_friendship(
        &self,
        source_id: i64,
        target_id: i64,
    ) -> Result<(JsonObject, JsonObject), WeiboError> {
        let args = CallArgs::new()
            .param("source_id", source_id)
            .param("target_id", target_id);
        let result = self
            .guarded_call(
                REQUEST,
                "Too many requests in show_friendship",
                &endpoints::SHOW_FRIENDSHIP,
                args,
            )
            .await?;
        Ok((
            friendship_side(&result, "source")?,
            friendship_side(&result, "target")?,
        ))
    }

    /// Whether `target_id` follows the authorized user
    pub async fn if_followed_by(&self, target_id: i64) -> Result<bool, WeiboError> {
        let result = self
            .guarded_call(
                REQUEST,
                "Too many requests in if_followed_by",
                &endpoints::SHOW_FRIENDSHIP,
                CallArgs::new().param("target_id", target_id),
            )
            .await?;
        friendship_side(&result, "source")?
            .bool("followed_by")
            .ok_or_else(|| WeiboError::Decode("friendship without followed_by".to_string()))
    }

    pub async fn create_friendship(&self, uid: i64) -> Result<JsonObject, WeiboError> {
        self.guarded_call(
            REQUEST,
            "Too many requests in create_friendship",
            &endpoints::CREATE_FRIENDSHIP,
            CallArgs::new().param("uid", uid),
        )
        .await
    }

    pub async fn destroy_friendship(&self, uid: i64) -> Result<JsonObject, WeiboError> {
        self.guarded_call(
            REQUEST,
            "Too many requests in destroy_friendship",
            &endpoints::DESTROY_FRIENDSHIP,
            CallArgs::new().param("uid", uid),
        )
        .await
    }

    // Statuses

    /// Statuses of `uid`, or of the authorized user when `uid` is `None`
    pub async fn get_user_timeline(
        &self,
        uid: Option<i64>,
        since_id: Option<i64>,
        count: u32,
        page: u32,
    ) -> Result<JsonObject, WeiboError> {
        let args = CallArgs::new()
            .opt_param("uid", uid)
            .opt_param("since_id", since_id)
            .param("count", count)
            .param("page", page);
        self.guarded_call(
            REQUEST,
            "Too many requests in get_user_timeline",
            &endpoints::USER_TIMELINE,
            args,
        )
        .await
    }

    pub async fn get_public_timeline(
        &self,
        since_id: Option<i64>,
        count: u32,
        page: u32,
    ) -> Result<JsonObject, WeiboError> {
        let args = CallArgs::new()
            .opt_param("since_id", since_id)
            .param("count", count)
            .param("page", page);
        self.guarded_call(
            REQUEST,
            "Too many requests in get_public_timeline",
            &endpoints::PUBLIC_TIMELINE,
            args,
        )
        .await
    }

    /// Comment and repost counts of several statuses
    pub async fn get_counts(&self, ids: &[i64]) -> Result<JsonObject, WeiboError> {
        self.guarded_call(
            REQUEST,
            "Too many requests in get_counts",
            &endpoints::COUNTS,
            CallArgs::new().param("ids", join_ids(ids)),
        )
        .await
    }

    pub async fn get_repost_timeline(
        &self,
        status_id: i64,
        since_id: Option<i64>,
        max_id: Option<i64>,
        count: u32,
        page: u32,
        filter_by_author: u8,
    ) -> Result<JsonObject, WeiboError> {
        let args = CallArgs::new()
            .param("id", status_id)
            .opt_param("since_id", since_id)
            .opt_param("max_id", max_id)
            .param("count", count)
            .param("page", page)
            .param("filter_by_author", filter_by_author);
        self.guarded_call(
            REQUEST,
            "Too many requests in get_repost_timeline",
            &endpoints::REPOST_TIMELINE,
            args,
        )
        .await
    }

    pub async fn get_mentions(
        &self,
        since_id: Option<i64>,
        count: u32,
        page: u32,
    ) -> Result<JsonObject, WeiboError> {
        let args = CallArgs::new()
            .opt_param("since_id", since_id)
            .param("count", count)
            .param("page", page);
        self.guarded_call(
            REQUEST,
            "Too many requests in get_mentions",
            &endpoints::MENTIONS,
            args,
        )
        .await
    }

    pub async fn show_status(&self, id: i64) -> Result<JsonObject, WeiboError> {
        self.guarded_call(
            REQUEST,
            "Too many requests in show_status",
            &endpoints::STATUSES_SHOW,
            CallArgs::new().param("id", id),
        )
        .await
    }

    pub async fn update_status(&self, text: &str) -> Result<JsonObject, WeiboError> {
        self.guarded_call(
            REQUEST_AND_STATUS,
            "Too many requests in update_status",
            &endpoints::UPDATE_STATUS,
            CallArgs::new().param("status", text),
        )
        .await
    }

    pub async fn destroy_status(&self, id: i64) -> Result<JsonObject, WeiboError> {
        self.guarded_call(
            REQUEST,
            "Too many requests in destroy_status",
            &endpoints::DESTROY_STATUS,
            CallArgs::new().arg(id),
        )
        .await
    }

    /// Post a status with an image given as bytes
    pub async fn upload_result(
        &self,
        contents: Vec<u8>,
        status: &str,
        content_type: &str,
    ) -> Result<JsonObject, WeiboError> {
        let args = CallArgs::new()
            .param("status", status)
            .post_data(PostData::Multipart {
                field: "pic".to_string(),
                file_name: "pic".to_string(),
                content_type: content_type.to_string(),
                bytes: contents,
            });
        self.guarded_call(
            REQUEST_AND_STATUS,
            "Too many requests in upload",
            &endpoints::UPLOAD,
            args,
        )
        .await
    }

    /// Post a status with an image read from `path`
    pub async fn upload(
        &self,
        path: impl AsRef<Path>,
        status: &str,
    ) -> Result<JsonObject, WeiboError> {
        let path = path.as_ref();
        let contents = tokio::fs::read(path).await?;
        self.upload_result(contents, status, image_content_type(path))
            .await
    }

    pub async fn get_trends_status(
        &self,
        trend: &str,
        count: u32,
        page: u32,
    ) -> Result<JsonObject, WeiboError> {
        let args = CallArgs::new()
            .param("trend", trend)
            .param("count", count)
            .param("page", page);
        self.guarded_call(
            REQUEST,
            "Too many requests in get_trends_status",
            &endpoints::TRENDS_STATUSES,
            args,
        )
        .await
    }

    // Comments

    pub async fn get_comments_to_me(
        &self,
        since_id: Option<i64>,
        count: u32,
        page: u32,
    ) -> Result<JsonObject, WeiboError> {
        let args = CallArgs::new()
            .opt_param("since_id", since_id)
            .param("count", count)
            .param("page", page);
        self.guarded_call(
            REQUEST,
            "Too many requests in get_comments_to_me",
            &endpoints::COMMENTS_TO_ME,
            args,
        )
        .await
    }

    pub async fn get_comments_by_me(
        &self,
        since_id: Option<i64>,
        count: u32,
        page: u32,
    ) -> Result<JsonObject, WeiboError> {
        let args = CallArgs::new()
            .opt_param("since_id", since_id)
            .param("count", count)
            .param("page", page);
        self.guarded_call(
            REQUEST,
            "Too many requests in get_comments_by_me",
            &endpoints::COMMENTS_BY_ME,
            args,
        )
        .await
    }

    /// Comments on a status.
    ///
    /// # Errors
    /// `WeiboError::Parameter` when `count` exceeds [`MAX_PAGE_COUNT`].
    pub async fn get_comments_show(
        &self,
        status_id: i64,
        since_id: Option<i64>,
        max_id: Option<i64>,
        count: u32,
        page: u32,
        filter_by_author: u8,
    ) -> Result<JsonObject, WeiboError> {
        self.guard(REQUEST, "Too many requests in get_comments_show")
            .await?;
        if count > MAX_PAGE_COUNT {
            return Err(WeiboError::Parameter(
                "Too many statuses counts per page.".to_string(),
            ));
        }
        let args = CallArgs::new()
            .param("id", status_id)
            .opt_param("since_id", since_id)
            .opt_param("max_id", max_id)
            .param("count", count)
            .param("page", page)
            .param("filter_by_author", filter_by_author);
        self.client.call_api(&endpoints::COMMENTS_SHOW, args).await
    }

    pub async fn get_comments(
        &self,
        status_id: i64,
        count: u32,
        page: u32,
    ) -> Result<JsonObject, WeiboError> {
        let args = CallArgs::new()
            .arg(status_id)
            .param("count", count)
            .param("page", page);
        self.guarded_call(
            REQUEST,
            "Too many requests in get_comments",
            &endpoints::COMMENTS_SHOW,
            args,
        )
        .await
    }

    /// Comment on a status. Returns the id of the new comment.
    pub async fn comment(&self, text: &str, status_id: i64) -> Result<i64, WeiboError> {
        let args = CallArgs::new()
            .param("comment", text)
            .param("id", status_id)
            .param("comment_ori", 0);
        let result = self
            .guarded_call(
                REQUEST_AND_STATUS,
                "Too many requests in comment",
                &endpoints::COMMENT_CREATE,
                args,
            )
            .await?;
        comment_id(&result)
    }

    /// Reply to comment `cid` on a status. Returns the id of the new comment.
    pub async fn reply(&self, text: &str, status_id: i64, cid: i64) -> Result<i64, WeiboError> {
        let args = CallArgs::new()
            .param("cid", cid)
            .param("id", status_id)
            .param("comment", text);
        let result = self
            .guarded_call(
                REQUEST_AND_STATUS,
                "Too many requests in reply",
                &endpoints::COMMENT_REPLY,
                args,
            )
            .await?;
        comment_id(&result)
    }

    pub async fn comment_destroy(&self, cid: i64) -> Result<JsonObject, WeiboError> {
        self.guarded_call(
            REQUEST,
            "Too many requests in comment_destroy",
            &endpoints::COMMENT_DESTROY,
            CallArgs::new().arg(cid),
        )
        .await
    }

    // Misc

    pub async fn get_unread(&self) -> Result<JsonObject, WeiboError> {
        self.guarded_call(
            REQUEST,
            "Too many requests in get_unread",
            &endpoints::UNREAD,
            CallArgs::new(),
        )
        .await
    }

    pub async fn get_emotions(&self) -> Result<JsonObject, WeiboError> {
        self.guarded_call(
            REQUEST,
            "Too many requests in get_emotions",
            &endpoints::EMOTIONS,
            CallArgs::new(),
        )
        .await
    }

    pub async fn get_shorten(&self, url_long: &str) -> Result<JsonObject, WeiboError> {
        self.guarded_call(
            REQUEST,
            "Too many requests in get_shorten",
            &endpoints::SHORTEN,
            CallArgs::new().param("url_long", url_long),
        )
        .await
    }

    /// Share counts of a short URL
    pub async fn get_short_status(&self, url_short: &str) -> Result<JsonObject, WeiboError> {
        self.guarded_call(
            REQUEST,
            "Too many requests in get_short_status",
            &endpoints::SHORT_URL_SHARE_COUNTS,
            CallArgs::new().param("url_short", url_short),
        )
        .await
    }

    /// Same as [`get_short_status`](Self::get_short_status) without
    /// consuming a quota
    pub async fn get_short_url_share_counts(
        &self,
        url_short: &str,
    ) -> Result<JsonObject, WeiboError> {
        self.client
            .call_api(
                &endpoints::SHORT_URL_SHARE_COUNTS,
                CallArgs::new().param("url_short", url_short),
            )
            .await
    }

    // Search

    /// Statuses matching `q`, following `since_id` forward for at most
    /// 30 rounds. API errors end the search with what was found.
    pub async fn get_search_status(
        &self,
        q: &str,
        since_id: Option<i64>,
    ) -> Result<Vec<JsonObject>, WeiboError> {
        let mut found = Vec::new();
        let mut since_id = since_id;
        for _ in 0..SEARCH_STATUS_MAX_ROUNDS {
            let args = CallArgs::new().arg(q).opt_param("since_id", since_id);
            let result = match self.client.call_api(&endpoints::SEARCH_STATUSES, args).await {
                Ok(result) => result,
                Err(e) => {
                    info!("[Weibo] search failed: {}", e);
                    break;
                }
            };
            let statuses = endpoints::SEARCH_STATUSES.items(&result);
            let Some(last_id) = statuses.last().and_then(|status| status.i64("id")) else {
                found.extend(statuses);
                break;
            };
            since_id = Some(last_id);
            found.extend(statuses);
        }
        Ok(found)
    }

    /// Users matching `q` from result pages 1 through 9. Empty pages are
    /// skipped; an API error ends the search with what was found.
    pub async fn get_search_user(&self, q: &str) -> Result<Vec<JsonObject>, WeiboError> {
        let mut found = Vec::new();
        for page in 1..=SEARCH_USER_MAX_PAGE {
            let args = CallArgs::new().arg(q).param("page", page);
            let result = match self.client.call_api(&endpoints::SEARCH_USERS, args).await {
                Ok(result) => result,
                Err(e) => {
                    info!("[Weibo] search_user failed: {}", e);
                    break;
                }
            };
            found.extend(endpoints::SEARCH_USERS.items(&result));
        }
        Ok(found)
    }
}

fn join_ids(ids: &[i64]) -> String {
    ids.iter()
        .map(i64::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

fn ids_of(descriptor: &EndpointDescriptor, result: &JsonObject) -> Vec<i64> {
    descriptor
        .items(result)
        .iter()
        .filter_map(|id| match id.as_value() {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        })
        .collect()
}

fn dedup(ids: Vec<i64>) -> Vec<i64> {
    let mut seen = std::collections::HashSet::with_capacity(ids.len());
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

fn friendship_side(result: &JsonObject, side: &str) -> Result<JsonObject, WeiboError> {
    result
        .object(side)
        .ok_or_else(|| WeiboError::Decode(format!("friendship without {}", side)))
}

fn comment_id(result: &JsonObject) -> Result<i64, WeiboError> {
    result
        .i64("id")
        .ok_or_else(|| WeiboError::Decode("comment without id".to_string()))
}

fn image_content_type(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}
