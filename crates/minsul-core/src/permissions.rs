//! Permission checks performed by the front-ends.
//!
//! These mirror what the UI hides or shows; the backend remains the authority
//! and enforces its own policy on every request.

use crate::models::{Board, CommentDetail, PostDetail, User};

pub const POST_CREATE: &str = "post:create";
pub const POST_READ: &str = "post:read";
pub const POST_UPDATE: &str = "post:update";
pub const POST_DELETE: &str = "post:delete";
pub const COMMENT_CREATE: &str = "comment:create";
pub const COMMENT_READ: &str = "comment:read";
pub const COMMENT_UPDATE: &str = "comment:update";
pub const COMMENT_DELETE: &str = "comment:delete";
pub const ADMIN_ACCESS: &str = "admin:access";
pub const USER_MANAGE: &str = "user:manage";
pub const CONTENT_MODERATE: &str = "content:moderate";
pub const VOLUNTEER_APPLY: &str = "volunteer:apply";
pub const VOLUNTEER_MANAGE: &str = "volunteer:manage";
pub const DONATION_VIEW: &str = "donation:view";
pub const DONATION_MANAGE: &str = "donation:manage";

/// Default permissions per role
pub fn role_permissions(role: &str) -> &'static [&'static str] {
    match role {
        "admin" => &[
            POST_CREATE,
            POST_READ,
            POST_UPDATE,
            POST_DELETE,
            COMMENT_CREATE,
            COMMENT_READ,
            COMMENT_UPDATE,
            COMMENT_DELETE,
            ADMIN_ACCESS,
            USER_MANAGE,
            CONTENT_MODERATE,
            VOLUNTEER_APPLY,
            VOLUNTEER_MANAGE,
            DONATION_VIEW,
            DONATION_MANAGE,
        ],
        "moderator" => &[
            POST_CREATE,
            POST_READ,
            POST_UPDATE,
            POST_DELETE,
            COMMENT_CREATE,
            COMMENT_READ,
            COMMENT_UPDATE,
            COMMENT_DELETE,
            CONTENT_MODERATE,
            VOLUNTEER_APPLY,
            VOLUNTEER_MANAGE,
            DONATION_VIEW,
        ],
        "user" => &[
            POST_CREATE,
            POST_READ,
            POST_UPDATE,
            COMMENT_CREATE,
            COMMENT_READ,
            COMMENT_UPDATE,
            VOLUNTEER_APPLY,
            DONATION_VIEW,
        ],
        "guest" => &[POST_READ, COMMENT_READ],
        _ => &[],
    }
}

/// Who may perform a board action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessLevel {
    Guest,
    Member,
    Admin,
}

impl AccessLevel {
    /// Parse a board setting; unknown values fall back to `default`.
    fn from_setting(setting: Option<&str>, default: AccessLevel) -> AccessLevel {
        match setting {
            Some("guest") => AccessLevel::Guest,
            Some("member") => AccessLevel::Member,
            Some("admin") => AccessLevel::Admin,
            _ => default,
        }
    }

    pub fn allows(&self, user: Option<&User>) -> bool {
        match self {
            AccessLevel::Guest => true,
            AccessLevel::Member => user.is_some(),
            AccessLevel::Admin => user.is_some_and(|u| u.role.eq_ignore_ascii_case("admin")),
        }
    }
}

pub fn has_permission(user: Option<&User>, permission: &str) -> bool {
    let Some(user) = user else {
        return false;
    };
    if user.role == "admin" {
        return true;
    }
    user.permissions
        .as_deref()
        .is_some_and(|granted| granted.iter().any(|p| p == permission))
}

pub fn has_any_permission(user: Option<&User>, permissions: &[&str]) -> bool {
    permissions.iter().any(|p| has_permission(user, p))
}

pub fn has_all_permissions(user: Option<&User>, permissions: &[&str]) -> bool {
    permissions.iter().all(|p| has_permission(user, p))
}

pub fn has_role(user: Option<&User>, role: &str) -> bool {
    user.is_some_and(|u| u.role == role)
}

pub fn has_role_permission(role: &str, permission: &str) -> bool {
    role_permissions(role).contains(&permission)
}

pub fn is_admin(user: Option<&User>) -> bool {
    has_role(user, "admin")
}

pub fn is_moderator(user: Option<&User>) -> bool {
    has_role(user, "moderator") || is_admin(user)
}

fn is_owner_or_admin(user: Option<&User>, owner_id: uuid::Uuid) -> bool {
    match user {
        Some(u) if u.role == "admin" => true,
        Some(u) => u.id == owner_id,
        None => false,
    }
}

/// Any signed-in user may write a post.
pub fn can_create_post(user: Option<&User>) -> bool {
    user.is_some()
}

pub fn can_edit_post(post: &PostDetail, user: Option<&User>) -> bool {
    is_owner_or_admin(user, post.user_id)
}

pub fn can_delete_post(post: &PostDetail, user: Option<&User>) -> bool {
    is_owner_or_admin(user, post.user_id)
}

pub fn can_create_comment(user: Option<&User>) -> bool {
    has_permission(user, COMMENT_CREATE)
}

pub fn can_edit_comment(comment: &CommentDetail, user: Option<&User>) -> bool {
    is_owner_or_admin(user, comment.user_id)
}

pub fn can_delete_comment(comment: &CommentDetail, user: Option<&User>) -> bool {
    is_owner_or_admin(user, comment.user_id)
}

pub fn can_apply_volunteer(user: Option<&User>) -> bool {
    has_permission(user, VOLUNTEER_APPLY)
}

pub fn can_list_board(board: &Board, user: Option<&User>) -> bool {
    AccessLevel::from_setting(board.list_permission.as_deref(), AccessLevel::Guest).allows(user)
}

pub fn can_read_post(board: &Board, user: Option<&User>) -> bool {
    AccessLevel::from_setting(board.read_permission.as_deref(), AccessLevel::Guest).allows(user)
}

pub fn can_write_post(board: &Board, user: Option<&User>) -> bool {
    let level = AccessLevel::from_setting(board.write_permission.as_deref(), AccessLevel::Member);
    if board.allow_anonymous == Some(true) && level == AccessLevel::Guest {
        return true;
    }
    level.allows(user)
}

pub fn can_reply_post(board: &Board, user: Option<&User>) -> bool {
    AccessLevel::from_setting(board.reply_permission.as_deref(), AccessLevel::Member).allows(user)
}

/// Comments must be enabled on the board before the access level applies.
pub fn can_comment_in_board(board: &Board, user: Option<&User>) -> bool {
    if board.allow_comments != Some(true) {
        return false;
    }
    AccessLevel::from_setting(board.comment_permission.as_deref(), AccessLevel::Member)
        .allows(user)
}

pub fn can_download_file(board: &Board, user: Option<&User>) -> bool {
    AccessLevel::from_setting(board.download_permission.as_deref(), AccessLevel::Member)
        .allows(user)
}

/// Authors lose edit rights once the post has `edit_comment_limit` comments.
pub fn can_edit_post_with_limit(post: &PostDetail, board: &Board, user: Option<&User>) -> bool {
    within_comment_limit(post, board.edit_comment_limit, user)
}

pub fn can_delete_post_with_limit(post: &PostDetail, board: &Board, user: Option<&User>) -> bool {
    within_comment_limit(post, board.delete_comment_limit, user)
}

fn within_comment_limit(post: &PostDetail, limit: Option<i64>, user: Option<&User>) -> bool {
    let Some(u) = user else {
        return false;
    };
    if u.role == "admin" {
        return true;
    }
    if u.id != post.user_id {
        return false;
    }
    match limit {
        Some(limit) if limit > 0 => post.comment_count.unwrap_or(0) < limit,
        _ => true,
    }
}

pub fn show_author_name(board: &Board) -> bool {
    board.show_author_name != Some(false)
}

pub fn show_ip(board: &Board) -> bool {
    board.show_ip == Some(true)
}

pub fn show_recommend(board: &Board) -> bool {
    board.allow_recommend != Some(false)
}

pub fn show_disrecommend(board: &Board) -> bool {
    board.allow_disrecommend == Some(true)
}

pub fn show_search(board: &Board) -> bool {
    board.allow_search != Some(false)
}

pub fn can_upload_file(board: &Board) -> bool {
    board.allow_file_upload != Some(false)
}

pub fn can_use_rich_text(board: &Board) -> bool {
    board.allow_rich_text != Some(false)
}

pub fn is_category_required(board: &Board) -> bool {
    board.require_category == Some(true)
}

/// Point costs charged by the board; zero when unset.
pub fn read_point(board: &Board) -> i64 {
    board.read_point.unwrap_or(0)
}

pub fn write_point(board: &Board) -> i64 {
    board.write_point.unwrap_or(0)
}

pub fn comment_point(board: &Board) -> i64 {
    board.comment_point.unwrap_or(0)
}

pub fn download_point(board: &Board) -> i64 {
    board.download_point.unwrap_or(0)
}
