//! Weibo REST endpoint descriptors
//!
//! One descriptor per operation used by the [`Weibo`](crate::Weibo) facade.
//! Paths are relative to the versioned API root.

use super::binder::{EndpointDescriptor, PayloadType};

const PAGED: &[&str] = &["since_id", "max_id", "count", "page"];
const USER_CURSOR: &[&str] = &["uid", "screen_name", "cursor", "count"];

// Account

pub const VERIFY_CREDENTIALS: EndpointDescriptor =
    EndpointDescriptor::new("verify_credentials", "account/get_uid.json");

pub const RATE_LIMIT_STATUS: EndpointDescriptor =
    EndpointDescriptor::new("rate_limit_status", "account/rate_limit_status.json");

// Users

pub const GET_USER: EndpointDescriptor = EndpointDescriptor::new("get_user", "users/show.json")
    .allowed(&["uid", "screen_name"])
    .payload(PayloadType::User, false);

pub const USERS_COUNT: EndpointDescriptor =
    EndpointDescriptor::new("users_count", "users/counts.json")
        .allowed(&["uids"])
        .payload(PayloadType::Json, true);

pub const TAGS: EndpointDescriptor = EndpointDescriptor::new("tags", "tags.json")
    .allowed(&["uid", "count", "page"])
    .payload(PayloadType::Tag, true);

// Statuses

pub const USER_TIMELINE: EndpointDescriptor =
    EndpointDescriptor::new("user_timeline", "statuses/user_timeline.json")
        .allowed(&["uid", "since_id", "max_id", "count", "page"])
        .payload(PayloadType::Status, true);

pub const PUBLIC_TIMELINE: EndpointDescriptor =
    EndpointDescriptor::new("public_timeline", "statuses/public_timeline.json")
        .allowed(&["since_id", "count", "page"])
        .payload(PayloadType::Status, true);

pub const REPOST_TIMELINE: EndpointDescriptor =
    EndpointDescriptor::new("repost_timeline", "statuses/repost_timeline.json")
        .allowed(&[
            "id",
            "since_id",
            "max_id",
            "count",
            "page",
            "filter_by_author",
        ])
        .payload(PayloadType::Repost, true);

pub const MENTIONS: EndpointDescriptor =
    EndpointDescriptor::new("mentions", "statuses/mentions.json")
        .allowed(PAGED)
        .payload(PayloadType::Status, true);

pub const STATUSES_SHOW: EndpointDescriptor =
    EndpointDescriptor::new("statuses_show", "statuses/show.json")
        .allowed(&["id"])
        .payload(PayloadType::Status, false);

pub const COUNTS: EndpointDescriptor = EndpointDescriptor::new("counts", "statuses/count.json")
    .allowed(&["ids"])
    .payload(PayloadType::Json, true);

pub const UPDATE_STATUS: EndpointDescriptor =
    EndpointDescriptor::new("update_status", "statuses/update.json")
        .post()
        .allowed(&["status"])
        .payload(PayloadType::Status, false);

pub const DESTROY_STATUS: EndpointDescriptor =
    EndpointDescriptor::new("destroy_status", "statuses/destroy/{id}.json")
        .post()
        .allowed(&["id"])
        .payload(PayloadType::Status, false);

pub const UPLOAD: EndpointDescriptor = EndpointDescriptor::new("upload", "statuses/upload.json")
    .post()
    .allowed(&["status"])
    .payload(PayloadType::Status, false);

pub const TRENDS_STATUSES: EndpointDescriptor =
    EndpointDescriptor::new("trends_statuses", "trends/statuses.json")
        .allowed(&["trend", "count", "page"])
        .payload(PayloadType::Status, true);

// Comments

pub const COMMENTS_SHOW: EndpointDescriptor =
    EndpointDescriptor::new("comments_show", "comments/show.json")
        .allowed(&[
            "id",
            "since_id",
            "max_id",
            "count",
            "page",
            "filter_by_author",
        ])
        .payload(PayloadType::Comment, true);

pub const COMMENTS_TO_ME: EndpointDescriptor =
    EndpointDescriptor::new("comments_to_me", "comments/to_me.json")
        .allowed(PAGED)
        .payload(PayloadType::Comment, true);

pub const COMMENTS_BY_ME: EndpointDescriptor =
    EndpointDescriptor::new("comments_by_me", "comments/by_me.json")
        .allowed(PAGED)
        .payload(PayloadType::Comment, true);

pub const COMMENT_CREATE: EndpointDescriptor =
    EndpointDescriptor::new("comment", "comments/create.json")
        .post()
        .allowed(&["comment", "id", "comment_ori"])
        .payload(PayloadType::Comment, false);

pub const COMMENT_REPLY: EndpointDescriptor =
    EndpointDescriptor::new("reply", "comments/reply.json")
        .post()
        .allowed(&["cid", "id", "comment", "without_mention"])
        .payload(PayloadType::Comment, false);

pub const COMMENT_DESTROY: EndpointDescriptor =
    EndpointDescriptor::new("comment_destroy", "comments/destroy/{cid}.json")
        .post()
        .allowed(&["cid"])
        .payload(PayloadType::Comment, false);

// Direct messages

pub const DIRECT_MESSAGES: EndpointDescriptor =
    EndpointDescriptor::new("direct_messages", "direct_messages.json")
        .allowed(PAGED)
        .payload(PayloadType::DirectMessage, true);

pub const SENT_DIRECT_MESSAGES: EndpointDescriptor =
    EndpointDescriptor::new("sent_direct_messages", "direct_messages/sent.json")
        .allowed(PAGED)
        .payload(PayloadType::DirectMessage, true);

pub const NEW_DIRECT_MESSAGE: EndpointDescriptor =
    EndpointDescriptor::new("new_direct_message", "direct_messages/new.json")
        .post()
        .allowed(&["uid", "text"])
        .payload(PayloadType::DirectMessage, false);

// Friendships

pub const FOLLOWERS: EndpointDescriptor =
    EndpointDescriptor::new("followers", "friendships/followers.json")
        .allowed(USER_CURSOR)
        .payload(PayloadType::User, true);

pub const FOLLOWERS_IDS: EndpointDescriptor =
    EndpointDescriptor::new("followers_ids", "friendships/followers/ids.json")
        .allowed(USER_CURSOR)
        .payload(PayloadType::Ids, true);

pub const FRIENDS: EndpointDescriptor =
    EndpointDescriptor::new("friends", "friendships/friends.json")
        .allowed(&["uid", "screen_name", "cursor", "count", "trim_status"])
        .payload(PayloadType::User, true);

pub const FRIENDS_IDS: EndpointDescriptor =
    EndpointDescriptor::new("friends_ids", "friendships/friends/ids.json")
        .allowed(USER_CURSOR)
        .payload(PayloadType::Ids, true);

pub const SHOW_FRIENDSHIP: EndpointDescriptor =
    EndpointDescriptor::new("show_friendship", "friendships/show.json")
        .allowed(&["source_id", "target_id"]);

pub const CREATE_FRIENDSHIP: EndpointDescriptor =
    EndpointDescriptor::new("create_friendship", "friendships/create.json")
        .post()
        .allowed(&["uid", "screen_name"])
        .payload(PayloadType::User, false);

pub const DESTROY_FRIENDSHIP: EndpointDescriptor =
    EndpointDescriptor::new("destroy_friendship", "friendships/destroy.json")
        .post()
        .allowed(&["uid", "screen_name"])
        .payload(PayloadType::User, false);

// Misc

pub const UNREAD: EndpointDescriptor =
    EndpointDescriptor::new("unread", "remind/unread_count.json").allowed(&["uid"]);

pub const EMOTIONS: EndpointDescriptor = EndpointDescriptor::new("emotions", "emotions.json")
    .allowed(&["type", "language"])
    .payload(PayloadType::Json, true);

pub const SHORTEN: EndpointDescriptor =
    EndpointDescriptor::new("shorten", "short_url/shorten.json").allowed(&["url_long"]);

pub const SHORT_URL_SHARE_COUNTS: EndpointDescriptor =
    EndpointDescriptor::new("short_url_share_counts", "short_url/share/counts.json")
        .allowed(&["url_short"]);

pub const SEARCH_STATUSES: EndpointDescriptor =
    EndpointDescriptor::new("search", "search/statuses.json")
        .allowed(&["q", "since_id", "count", "page"])
        .payload(PayloadType::Status, true);

pub const SEARCH_USERS: EndpointDescriptor =
    EndpointDescriptor::new("search_user", "search/users.json")
        .allowed(&["q", "count", "page"])
        .payload(PayloadType::User, true);

/// Every descriptor in this module
pub const ALL: &[EndpointDescriptor] = &[
    VERIFY_CREDENTIALS,
    RATE_LIMIT_STATUS,
    GET_USER,
    USERS_COUNT,
    TAGS,
    USER_TIMELINE,
    PUBLIC_TIMELINE,
    REPOST_TIMELINE,
    MENTIONS,
    STATUSES_SHOW,
    COUNTS,
    UPDATE_STATUS,
    DESTROY_STATUS,
    UPLOAD,
    TRENDS_STATUSES,
    COMMENTS_SHOW,
    COMMENTS_TO_ME,
    COMMENTS_BY_ME,
    COMMENT_CREATE,
    COMMENT_REPLY,
    COMMENT_DESTROY,
    DIRECT_MESSAGES,
    SENT_DIRECT_MESSAGES,
    NEW_DIRECT_MESSAGE,
    FOLLOWERS,
    FOLLOWERS_IDS,
    FRIENDS,
    FRIENDS_IDS,
    SHOW_FRIENDSHIP,
    CREATE_FRIENDSHIP,
    DESTROY_FRIENDSHIP,
    UNREAD,
    EMOTIONS,
    SHORTEN,
    SHORT_URL_SHARE_COUNTS,
    SEARCH_STATUSES,
    SEARCH_USERS,
];
