//! Admin console endpoints.
//!
//! Everything under `/api/admin` is authenticated; these methods are meant for a
//! client built with [`minsul_core::ServiceType::Admin`], whose tokens the
//! backend accepts there. Sign-in, refresh and `me` use the shared session
//! methods, which already pick the admin paths from the service type.

use minsul_core::models::{
    AdminQuery, Board, BoardRequest, CalendarEvent, CalendarEventRequest, CreateNotificationRequest,
    CreatePageRequest, DashboardStats, ManagedUser, MenuEntry, MenuTree, ModeratedCommentList,
    ModeratedPostList, Notification, Page, PageList, PageStatusRequest, UpdatePageRequest,
    UpdateUserRequest, UserList, UserStatus,
};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::auth::RequestOptions;
use crate::error::ClientResult;
use crate::{require_data, ApiClient};

impl ApiClient {
    /// Authenticated GET of a filtered admin list.
    async fn admin_list<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &AdminQuery,
        fallback: &str,
    ) -> ClientResult<T> {
        let options = query
            .to_query()
            .into_iter()
            .fold(RequestOptions::new(), |options, (key, value)| {
                options.query(key, value)
            });
        let envelope = self
            .send_authenticated(Method::GET, path, options, fallback)
            .await?;
        require_data(envelope, fallback)
    }

    /// Authenticated JSON request whose `data` is not needed.
    async fn admin_command<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        fallback: &str,
    ) -> ClientResult<()> {
        self.send_authenticated::<serde_json::Value>(
            method,
            path,
            RequestOptions::new().json(body)?,
            fallback,
        )
        .await?;
        Ok(())
    }

    pub async fn dashboard_stats(&self) -> ClientResult<DashboardStats> {
        self.call::<_, ()>(
            Method::GET,
            "/api/admin/dashboard/stats",
            None,
            "Failed to load dashboard statistics",
        )
        .await
    }

    // ===== Users =====

    pub async fn list_users(&self, query: &AdminQuery) -> ClientResult<UserList> {
        self.admin_list("/api/admin/users", query, "Failed to load users")
            .await
    }

    pub async fn get_user(&self, user_id: Uuid) -> ClientResult<ManagedUser> {
        self.call::<_, ()>(
            Method::GET,
            &format!("/api/admin/users/{}", user_id),
            None,
            "Failed to load user",
        )
        .await
    }

    pub async fn update_user(
        &self,
        user_id: Uuid,
        update: &UpdateUserRequest,
    ) -> ClientResult<ManagedUser> {
        self.call(
            Method::PUT,
            &format!("/api/admin/users/{}", user_id),
            Some(update),
            "Failed to update user",
        )
        .await
    }

    /// Suspend, reactivate or hold an account.
    pub async fn set_user_status(&self, user_id: Uuid, status: UserStatus) -> ClientResult<ManagedUser> {
        let user = self
            .call(
                Method::PUT,
                &format!("/api/admin/users/{}/status", user_id),
                Some(&json!({ "status": status })),
                "Failed to change user status",
            )
            .await?;
        info!(user_id = %user_id, status = %status, "user status changed");
        Ok(user)
    }

    pub async fn set_user_role(&self, user_id: Uuid, role: &str) -> ClientResult<ManagedUser> {
        let user = self
            .call(
                Method::PUT,
                &format!("/api/admin/users/{}/role", user_id),
                Some(&json!({ "role": role })),
                "Failed to change user role",
            )
            .await?;
        info!(user_id = %user_id, role, "user role changed");
        Ok(user)
    }

    // ===== Boards =====

    /// Every board, including the ones hidden from the public site.
    pub async fn admin_boards(&self) -> ClientResult<Vec<Board>> {
        self.call::<_, ()>(Method::GET, "/api/admin/boards", None, "Failed to load boards")
            .await
    }

    pub async fn create_board(&self, board: &BoardRequest) -> ClientResult<Board> {
        self.call(
            Method::POST,
            "/api/admin/boards",
            Some(board),
            "Failed to create board",
        )
        .await
    }

    pub async fn update_board(&self, board_id: Uuid, board: &BoardRequest) -> ClientResult<Board> {
        self.call(
            Method::PUT,
            &format!("/api/admin/boards/{}", board_id),
            Some(board),
            "Failed to update board",
        )
        .await
    }

    pub async fn delete_board(&self, board_id: Uuid) -> ClientResult<()> {
        self.call_unit(
            Method::DELETE,
            &format!("/api/admin/boards/{}", board_id),
            "Failed to delete board",
        )
        .await
    }

    // ===== Moderation =====

    pub async fn moderated_posts(&self, query: &AdminQuery) -> ClientResult<ModeratedPostList> {
        self.admin_list("/api/admin/posts", query, "Failed to load posts")
            .await
    }

    pub async fn set_post_hidden(&self, post_id: Uuid, hidden: bool) -> ClientResult<()> {
        self.admin_command(
            Method::PUT,
            &format!("/api/admin/posts/{}/visibility", post_id),
            &json!({ "hidden": hidden }),
            "Failed to change post visibility",
        )
        .await
    }

    pub async fn moderated_comments(&self, query: &AdminQuery) -> ClientResult<ModeratedCommentList> {
        self.admin_list("/api/admin/comments", query, "Failed to load comments")
            .await
    }

    pub async fn set_comment_hidden(&self, comment_id: Uuid, hidden: bool) -> ClientResult<()> {
        self.admin_command(
            Method::PUT,
            &format!("/api/admin/comments/{}/visibility", comment_id),
            &json!({ "hidden": hidden }),
            "Failed to change comment visibility",
        )
        .await
    }

    /// Remove a comment as a moderator, regardless of its author.
    pub async fn remove_comment(&self, comment_id: Uuid) -> ClientResult<()> {
        self.call_unit(
            Method::DELETE,
            &format!("/api/admin/comments/{}", comment_id),
            "Failed to delete comment",
        )
        .await
    }

    // ===== Site =====

    /// Site-wide settings; the document is free-form.
    pub async fn site_settings(&self) -> ClientResult<serde_json::Value> {
        self.call::<_, ()>(
            Method::GET,
            "/api/admin/site/settings",
            None,
            "Failed to load site settings",
        )
        .await
    }

    pub async fn save_site_settings(
        &self,
        settings: &serde_json::Value,
    ) -> ClientResult<serde_json::Value> {
        self.call(
            Method::PUT,
            "/api/admin/site/settings",
            Some(settings),
            "Failed to save site settings",
        )
        .await
    }

    pub async fn admin_menus(&self) -> ClientResult<Vec<MenuTree>> {
        self.call::<_, ()>(Method::GET, "/api/admin/menus", None, "Failed to load menus")
            .await
    }

    /// Replace the whole navigation; the tree is sent flat with parent links.
    pub async fn save_menus(&self, menus: &[MenuTree]) -> ClientResult<Vec<MenuTree>> {
        let entries = MenuEntry::flatten(menus);
        self.call(
            Method::PUT,
            "/api/admin/menus",
            Some(&entries),
            "Failed to save menus",
        )
        .await
    }

    // ===== Pages =====

    pub async fn list_pages(&self, query: &AdminQuery) -> ClientResult<PageList> {
        self.admin_list("/api/admin/pages", query, "Failed to load pages")
            .await
    }

    pub async fn get_page(&self, page_id: &str) -> ClientResult<Page> {
        self.call::<_, ()>(
            Method::GET,
            &format!("/api/admin/pages/{}", page_id),
            None,
            "Failed to load page",
        )
        .await
    }

    pub async fn create_page(&self, page: &CreatePageRequest) -> ClientResult<Page> {
        self.call(Method::POST, "/api/admin/pages", Some(page), "Failed to create page")
            .await
    }

    pub async fn update_page(&self, page_id: &str, update: &UpdatePageRequest) -> ClientResult<Page> {
        self.call(
            Method::PUT,
            &format!("/api/admin/pages/{}", page_id),
            Some(update),
            "Failed to update page",
        )
        .await
    }

    pub async fn set_page_status(
        &self,
        page_id: &str,
        status: &PageStatusRequest,
    ) -> ClientResult<Page> {
        self.call(
            Method::PUT,
            &format!("/api/admin/pages/{}/status", page_id),
            Some(status),
            "Failed to change page status",
        )
        .await
    }

    pub async fn delete_page(&self, page_id: &str) -> ClientResult<()> {
        self.call_unit(
            Method::DELETE,
            &format!("/api/admin/pages/{}", page_id),
            "Failed to delete page",
        )
        .await
    }

    // ===== Notifications =====

    /// Draft a notification; it goes out with [`ApiClient::send_notification`].
    pub async fn create_notification(
        &self,
        notification: &CreateNotificationRequest,
    ) -> ClientResult<Notification> {
        self.call(
            Method::POST,
            "/api/admin/notifications",
            Some(notification),
            "Failed to create notification",
        )
        .await
    }

    pub async fn send_notification(&self, notification_id: &str) -> ClientResult<Notification> {
        let sent = self
            .call::<Notification, ()>(
                Method::POST,
                &format!("/api/admin/notifications/{}/send", notification_id),
                None,
                "Failed to send notification",
            )
            .await?;
        info!(notification_id, target = ?sent.target_users, "notification sent");
        Ok(sent)
    }

    // ===== Calendar =====

    pub async fn calendar_events(&self) -> ClientResult<Vec<CalendarEvent>> {
        self.call::<_, ()>(
            Method::GET,
            "/api/admin/calendar/events",
            None,
            "Failed to load calendar events",
        )
        .await
    }

    pub async fn create_calendar_event(
        &self,
        event: &CalendarEventRequest,
    ) -> ClientResult<CalendarEvent> {
        self.call(
            Method::POST,
            "/api/admin/calendar/events",
            Some(event),
            "Failed to create event",
        )
        .await
    }

    pub async fn update_calendar_event(
        &self,
        event_id: Uuid,
        event: &CalendarEventRequest,
    ) -> ClientResult<CalendarEvent> {
        self.call(
            Method::PUT,
            &format!("/api/admin/calendar/events/{}", event_id),
            Some(event),
            "Failed to update event",
        )
        .await
    }

    pub async fn delete_calendar_event(&self, event_id: Uuid) -> ClientResult<()> {
        self.call_unit(
            Method::DELETE,
            &format!("/api/admin/calendar/events/{}", event_id),
            "Failed to delete event",
        )
        .await
    }
}
