//! Turns the nested reply payload of the comment endpoint into an owned
//! [`Comment`] tree.
//!
//! A node whose body is empty or a deletion sentinel is dropped together with
//! its whole subtree; replies are never promoted to the parent level.
//! Malformed nodes are logged and skipped without affecting their siblings.

use serde::Deserialize;
use serde_json::Value;
use threadscope_core::Comment;
use tracing::{debug, warn};

use crate::api::RedditCommentData;

pub const DELETED_BODY: &str = "[deleted]";
pub const REMOVED_BODY: &str = "[removed]";

const ANONYMOUS_AUTHOR: &str = "Anonymous";

/// Only the empty string and the exact sentinels are unusable; a body of
/// spaces is still a comment.
pub fn is_usable_body(body: &str) -> bool {
    !body.is_empty() && body != DELETED_BODY && body != REMOVED_BODY
}

/// The comment endpoint answers with `[post_listing, comment_listing]`.
/// Any other shape yields no comments.
pub fn comments_from_thread(payload: &Value) -> Vec<Comment> {
    match payload.as_array().and_then(|parts| parts.get(1)) {
        Some(listing) => flatten_listing(listing),
        None => {
            debug!("Comment payload has no comment listing");
            Vec::new()
        }
    }
}

pub fn flatten_listing(listing: &Value) -> Vec<Comment> {
    let mut comments = Vec::new();
    flatten_into(listing, &mut comments);
    comments
}

fn flatten_into(listing: &Value, target: &mut Vec<Comment>) {
    // `replies` is "" on leaf comments; any non-listing shape means no replies.
    let Some(children) = listing
        .get("data")
        .and_then(|data| data.get("children"))
        .and_then(Value::as_array)
    else {
        return;
    };

    for child in children {
        match comment_from_node(child) {
            Ok(Some(comment)) => target.push(comment),
            Ok(None) => {}
            Err(e) => warn!("Skipping malformed comment node: {}", e),
        }
    }
}

fn comment_from_node(node: &Value) -> Result<Option<Comment>, serde_json::Error> {
    let Some(data) = node.get("data") else {
        return Ok(None);
    };

    let fields = RedditCommentData::deserialize(data)?;
    let Some(body) = fields.body.filter(|body| is_usable_body(body)) else {
        return Ok(None);
    };

    let author = fields.author.as_deref().unwrap_or(ANONYMOUS_AUTHOR);
    let mut comment = Comment {
        author: format!("u/{}", author),
        score: fields.score.unwrap_or(0),
        body,
        replies: Vec::new(),
    };

    if let Some(replies) = data.get("replies") {
        flatten_into(replies, &mut comment.replies);
    }

    Ok(Some(comment))
}
