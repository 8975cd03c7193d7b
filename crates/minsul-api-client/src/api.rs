//! Domain methods for the Minsul API client.
//!
//! Community boards, posts, comments, likes and attachments; site menus and
//! pages; and the session endpoints. Response types come from
//! `minsul_core::models`. Every call goes through the envelope check, so a
//! `success: false` answer surfaces as [`ClientError::ApiError`] with the
//! backend's message or the fallback named at the call site.

use minsul_core::models::{
    AuthResponse, Board, Category, CommentDetail, CreateCommentRequest, CreatePostRequest,
    LikeStatus, LikeToggle, LoginRequest, Page, PostDetail, PostPage, PostQuery, RegisterRequest,
    SiteMenus, UpdateCommentRequest, UpdatePostRequest, User,
};
use reqwest::Method;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::auth::RequestOptions;
use crate::error::{ClientError, ClientResult};
use crate::{require_data, ApiClient};

impl ApiClient {
    /// Authenticated JSON request; returns `data`.
    pub(crate) async fn call<T: serde::de::DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        fallback: &str,
    ) -> ClientResult<T> {
        let options = match body {
            Some(body) => RequestOptions::new().json(body)?,
            None => RequestOptions::new(),
        };
        let envelope = self.send_authenticated(method, path, options, fallback).await?;
        require_data(envelope, fallback)
    }

    /// Authenticated request whose `data` is ignored.
    pub(crate) async fn call_unit(
        &self,
        method: Method,
        path: &str,
        fallback: &str,
    ) -> ClientResult<()> {
        self.send_authenticated::<serde_json::Value>(method, path, RequestOptions::new(), fallback)
            .await?;
        Ok(())
    }

    // ===== Session =====

    /// Sign in and store the returned token pair.
    pub async fn login(&self, email: &str, password: &str) -> ClientResult<User> {
        let body = LoginRequest {
            email,
            password,
            service_type: self.service_type(),
        };
        let envelope = self
            .post_public::<AuthResponse, _>(self.service_type().login_path(), &body, "Login failed")
            .await?;
        let auth = require_data(envelope, "Login failed")?;
        self.tokens.set_pair(&auth.token_pair())?;
        info!(service = %self.service_type(), user_id = %auth.user.id, "signed in");
        Ok(auth.user)
    }

    /// Notify the server (best effort) and clear the stored tokens.
    pub async fn logout(&self) -> ClientResult<()> {
        if let Some(token) = self.tokens.access_token() {
            let result = self
                .client
                .post(self.build_url(self.service_type().logout_path()))
                .bearer_auth(token)
                .send()
                .await;
            if let Err(e) = result {
                debug!(error = %e, "logout request failed; clearing tokens anyway");
            }
        }
        self.tokens.clear()?;
        info!(service = %self.service_type(), "signed out");
        Ok(())
    }

    /// Whether an unexpired access token is stored. Makes no request.
    pub fn is_authenticated(&self) -> bool {
        self.tokens.is_authenticated()
    }

    /// The signed-in account.
    pub async fn me(&self) -> ClientResult<User> {
        self.call::<User, ()>(
            Method::GET,
            self.service_type().me_path(),
            None,
            "Failed to load account",
        )
        .await
    }

    /// Create a site account. Does not sign in.
    pub async fn register(&self, email: &str, password: &str, name: &str) -> ClientResult<()> {
        let body = RegisterRequest {
            email,
            password,
            name,
        };
        self.post_public::<serde_json::Value, _>("/api/auth/register", &body, "Registration failed")
            .await?;
        Ok(())
    }

    /// Ask the server to email a password reset link.
    pub async fn request_password_reset(&self, email: &str) -> ClientResult<()> {
        let body = serde_json::json!({ "email": email });
        self.post_public::<serde_json::Value, _>(
            "/api/auth/forgot-password",
            &body,
            "Password reset request failed",
        )
        .await?;
        Ok(())
    }

    // ===== Boards =====

    pub async fn fetch_boards(&self) -> ClientResult<Vec<Board>> {
        let fallback = "Failed to load boards";
        let envelope = self
            .get_public("/api/community/boards", &[], fallback)
            .await?;
        require_data(envelope, fallback)
    }

    pub async fn fetch_board_by_slug(&self, slug: &str) -> ClientResult<Board> {
        let fallback = "Failed to load board";
        let envelope = self
            .get_public(&format!("/api/community/boards/{}", slug), &[], fallback)
            .await?;
        require_data(envelope, fallback)
    }

    pub async fn fetch_categories(&self, board_slug: &str) -> ClientResult<Vec<Category>> {
        let fallback = "Failed to load categories";
        let envelope = self
            .get_public(
                &format!("/api/community/boards/{}/categories", board_slug),
                &[],
                fallback,
            )
            .await?;
        require_data(envelope, fallback)
    }

    // ===== Posts =====

    /// List posts across boards with pagination.
    pub async fn fetch_posts(&self, query: &PostQuery) -> ClientResult<PostPage> {
        self.fetch_post_page("/api/community/posts", query).await
    }

    /// List posts of one board.
    pub async fn fetch_posts_by_slug(&self, slug: &str, query: &PostQuery) -> ClientResult<PostPage> {
        self.fetch_post_page(&format!("/api/community/boards/{}/posts", slug), query)
            .await
    }

    async fn fetch_post_page(&self, path: &str, query: &PostQuery) -> ClientResult<PostPage> {
        let fallback = "Failed to load posts";
        let envelope = self
            .get_public::<Vec<PostDetail>>(path, &query.to_query(), fallback)
            .await?;
        Ok(PostPage {
            posts: envelope.data.unwrap_or_default(),
            pagination: envelope.pagination,
        })
    }

    /// Latest posts, optionally limited to comma-separated board slugs.
    pub async fn fetch_recent_posts(
        &self,
        slugs: Option<&str>,
        limit: Option<u32>,
    ) -> ClientResult<Vec<PostDetail>> {
        let mut query: Vec<(&str, String)> = Vec::new();
        if let Some(s) = slugs.filter(|s| !s.is_empty()) {
            query.push(("slugs", s.to_string()));
        }
        if let Some(l) = limit {
            query.push(("limit", l.to_string()));
        }

        let fallback = "Failed to load recent posts";
        let envelope = self
            .get_public("/api/community/posts/recent", &query, fallback)
            .await?;
        require_data(envelope, fallback)
    }

    pub async fn fetch_post(&self, post_id: Uuid) -> ClientResult<PostDetail> {
        let fallback = "Failed to load post";
        let envelope = self
            .get_public(&format!("/api/community/posts/{}", post_id), &[], fallback)
            .await?;
        require_data(envelope, fallback)
    }

    pub async fn create_post(&self, post: &CreatePostRequest) -> ClientResult<PostDetail> {
        self.call(
            Method::POST,
            "/api/community/posts",
            Some(post),
            "Failed to create post",
        )
        .await
    }

    pub async fn create_post_by_slug(
        &self,
        slug: &str,
        post: &CreatePostRequest,
    ) -> ClientResult<PostDetail> {
        self.call(
            Method::POST,
            &format!("/api/community/boards/{}/posts", slug),
            Some(post),
            "Failed to create post",
        )
        .await
    }

    pub async fn update_post(
        &self,
        post_id: Uuid,
        update: &UpdatePostRequest,
    ) -> ClientResult<PostDetail> {
        self.call(
            Method::PUT,
            &format!("/api/community/posts/{}", post_id),
            Some(update),
            "Failed to update post",
        )
        .await
    }

    pub async fn delete_post(&self, post_id: Uuid) -> ClientResult<()> {
        self.call_unit(
            Method::DELETE,
            &format!("/api/community/posts/{}", post_id),
            "Failed to delete post",
        )
        .await
    }

    // ===== Comments =====

    pub async fn fetch_comments(&self, post_id: Uuid) -> ClientResult<Vec<CommentDetail>> {
        let fallback = "Failed to load comments";
        let envelope = self
            .get_public(
                &format!("/api/community/posts/{}/comments", post_id),
                &[],
                fallback,
            )
            .await?;
        require_data(envelope, fallback)
    }

    pub async fn create_comment(&self, comment: &CreateCommentRequest) -> ClientResult<CommentDetail> {
        self.call(
            Method::POST,
            "/api/community/comments",
            Some(comment),
            "Failed to create comment",
        )
        .await
    }

    pub async fn update_comment(
        &self,
        comment_id: Uuid,
        update: &UpdateCommentRequest,
    ) -> ClientResult<CommentDetail> {
        self.call(
            Method::PUT,
            &format!("/api/community/comments/{}", comment_id),
            Some(update),
            "Failed to update comment",
        )
        .await
    }

    pub async fn delete_comment(&self, comment_id: Uuid) -> ClientResult<()> {
        self.call_unit(
            Method::DELETE,
            &format!("/api/community/comments/{}", comment_id),
            "Failed to delete comment",
        )
        .await
    }

    // ===== Likes =====

    pub async fn toggle_post_like(&self, post_id: Uuid) -> ClientResult<LikeToggle> {
        self.call::<_, ()>(
            Method::POST,
            &format!("/api/community/posts/{}/like", post_id),
            None,
            "Failed to toggle like",
        )
        .await
    }

    pub async fn post_like_status(&self, post_id: Uuid) -> ClientResult<LikeStatus> {
        self.call::<_, ()>(
            Method::GET,
            &format!("/api/community/posts/{}/like/status", post_id),
            None,
            "Failed to load like status",
        )
        .await
    }

    pub async fn toggle_comment_like(&self, comment_id: Uuid) -> ClientResult<LikeToggle> {
        self.call::<_, ()>(
            Method::POST,
            &format!("/api/community/comments/{}/like", comment_id),
            None,
            "Failed to toggle like",
        )
        .await
    }

    pub async fn comment_like_status(&self, comment_id: Uuid) -> ClientResult<LikeStatus> {
        self.call::<_, ()>(
            Method::GET,
            &format!("/api/community/comments/{}/like/status", comment_id),
            None,
            "Failed to load like status",
        )
        .await
    }

    // ===== Files =====

    pub async fn delete_file(&self, file_id: &str) -> ClientResult<()> {
        self.call_unit(
            Method::DELETE,
            &format!("/api/upload/files/{}", file_id),
            "Failed to delete file",
        )
        .await
    }

    pub async fn delete_post_attachment(&self, post_id: Uuid, file_id: &str) -> ClientResult<()> {
        self.call_unit(
            Method::DELETE,
            &format!("/api/community/posts/{}/attachments/{}", post_id, file_id),
            "Failed to delete attachment",
        )
        .await
    }

    // ===== Site =====

    /// Navigation menus; the built-in defaults stand in when the server is unreachable.
    pub async fn fetch_site_menus(&self) -> ClientResult<SiteMenus> {
        let fallback = "Failed to load site menus";
        match self.get_public("/api/site/menus", &[], fallback).await {
            Ok(envelope) => require_data(envelope, fallback),
            Err(ClientError::Http(e)) => {
                warn!(error = %e, "menu endpoint unreachable; using default menus");
                Ok(SiteMenus::fallback())
            }
            Err(e) => Err(e),
        }
    }

    pub async fn fetch_page_by_slug(&self, slug: &str) -> ClientResult<Page> {
        let fallback = "Failed to load page";
        let envelope = self
            .get_public(&format!("/api/pages/{}", slug), &[], fallback)
            .await?;
        require_data(envelope, fallback)
    }
}
