//! Comment threads: flat comment lists rebuilt into two-level trees

use std::collections::{HashMap, HashSet};

use crate::models::{Comment, User};

/// A top-level comment and its direct replies
#[derive(Debug, Clone, PartialEq)]
pub struct CommentNode {
    pub comment: Comment,
    pub replies: Vec<Comment>,
}

/// Comments of one ticket, nested one level deep
#[derive(Debug, Clone, Default)]
pub struct Thread {
    pub roots: Vec<CommentNode>,
    parent_of: HashMap<i64, i64>,
}

impl Thread {
    /// Total number of comments, replies included
    pub fn len(&self) -> usize {
        self.roots.iter().map(|n| 1 + n.replies.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Parent of a nested reply; `None` for top-level comments
    pub fn parent_of(&self, reply_id: i64) -> Option<&Comment> {
        let parent_id = self.parent_of.get(&reply_id)?;
        self.roots
            .iter()
            .map(|n| &n.comment)
            .find(|c| c.id == *parent_id)
    }
}

/// Rebuild the reply tree
///
/// Replies whose parent is missing, or is itself a reply, are shown at top
/// level in their original position.
pub fn build_thread(comments: Vec<Comment>) -> Thread {
    let top_level: HashSet<i64> = comments
        .iter()
        .filter(|c| c.parent_comment_id.is_none())
        .map(|c| c.id)
        .collect();

    let mut roots = Vec::new();
    let mut root_index = HashMap::new();
    let mut replies = Vec::new();

    for comment in comments {
        match comment.parent_comment_id {
            Some(parent) if top_level.contains(&parent) && parent != comment.id => {
                replies.push((parent, comment));
            }
            _ => {
                // Orphaned replies are demoted and never take children
                if comment.parent_comment_id.is_none() {
                    root_index.insert(comment.id, roots.len());
                }
                roots.push(CommentNode {
                    comment,
                    replies: Vec::new(),
                });
            }
        }
    }

    let mut parent_of = HashMap::new();
    for (parent, reply) in replies {
        if let Some(&idx) = root_index.get(&parent) {
            parent_of.insert(reply.id, parent);
            roots[idx].replies.push(reply);
        }
    }

    Thread { roots, parent_of }
}

/// Resolve `@handle` mentions against the known users
///
/// A handle matches the local part of a user's email or `firstname.lastname`,
/// case-insensitively. Ids come back in order of first mention.
pub fn extract_mentions(content: &str, users: &[User]) -> Vec<i64> {
    let mut found = Vec::new();
    let mut prev: Option<char> = None;
    let mut chars = content.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        let at_boundary = prev.is_none_or(|p| !p.is_alphanumeric());
        prev = Some(c);
        if c != '@' || !at_boundary {
            continue;
        }

        let start = i + 1;
        let mut end = start;
        while let Some(&(j, h)) = chars.peek() {
            if h.is_alphanumeric() || matches!(h, '.' | '_' | '-') {
                end = j + h.len_utf8();
                prev = Some(h);
                chars.next();
            } else {
                break;
            }
        }

        let handle = content[start..end].trim_end_matches('.').to_lowercase();
        if handle.is_empty() {
            continue;
        }
        if let Some(user) = users.iter().find(|u| handle_matches(u, &handle))
            && !found.contains(&user.id)
        {
            found.push(user.id);
        }
    }

    found
}

fn handle_matches(user: &User, handle: &str) -> bool {
    let local = user
        .email
        .split('@')
        .next()
        .unwrap_or_default()
        .to_lowercase();
    let dotted = format!("{}.{}", user.firstname, user.lastname)
        .replace(' ', "")
        .to_lowercase();
    local == handle || dotted == handle
}
