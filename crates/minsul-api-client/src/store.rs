//! Observable state for front-ends.
//!
//! A [`Store`] holds one value and notifies subscribers on every change.
//! Controllers own their stores and a client handle; nothing here is global,
//! so a process can run several independent sessions side by side.

use minsul_core::models::{
    AdminQuery, Board, CommentDetail, ContentStatus, DashboardStats, LikeToggle, ManagedUser,
    ModeratedComment, ModeratedPost, Pagination, PostDetail, PostQuery, UpdateUserRequest, User,
    UserStatus,
};
use std::future::Future;
use tokio::sync::watch;
use uuid::Uuid;

use crate::error::ClientResult;
use crate::ApiClient;

/// Single observable value.
#[derive(Debug)]
pub struct Store<T> {
    tx: watch::Sender<T>,
}

impl<T: Clone> Store<T> {
    pub fn new(value: T) -> Self {
        let (tx, _rx) = watch::channel(value);
        Self { tx }
    }

    pub fn get(&self) -> T {
        self.tx.borrow().clone()
    }

    pub fn set(&self, value: T) {
        self.tx.send_replace(value);
    }

    pub fn update(&self, f: impl FnOnce(&mut T)) {
        self.tx.send_modify(f);
    }

    /// Receiver that observes every later change.
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }
}

impl<T: Clone + Default> Default for Store<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// Run `operation` with the loading flag raised, recording its error message.
async fn tracked<T>(
    is_loading: &Store<bool>,
    error: &Store<Option<String>>,
    operation: impl Future<Output = ClientResult<T>>,
) -> ClientResult<T> {
    is_loading.set(true);
    error.set(None);
    let result = operation.await;
    if let Err(e) = &result {
        error.set(Some(e.to_string()));
    }
    is_loading.set(false);
    result
}

/// Sign-in state of one session.
#[derive(Debug)]
pub struct AuthController {
    client: ApiClient,
    pub user: Store<Option<User>>,
    pub is_authenticated: Store<bool>,
    pub is_loading: Store<bool>,
    pub error: Store<Option<String>>,
}

impl AuthController {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            user: Store::default(),
            is_authenticated: Store::default(),
            is_loading: Store::default(),
            error: Store::default(),
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Restore the session from stored tokens.
    ///
    /// A missing or rejected session is not an error: the state is left signed out.
    pub async fn initialize(&self) -> ClientResult<Option<User>> {
        if self.client.tokens().access_token().is_none() {
            self.set_signed_out();
            return Ok(None);
        }

        match tracked(&self.is_loading, &self.error, self.client.me()).await {
            Ok(user) => {
                self.set_signed_in(user.clone());
                Ok(Some(user))
            }
            Err(e) if e.requires_login() => {
                self.error.set(None);
                self.set_signed_out();
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> ClientResult<User> {
        let user = tracked(
            &self.is_loading,
            &self.error,
            self.client.login(email, password),
        )
        .await?;
        self.set_signed_in(user.clone());
        Ok(user)
    }

    pub async fn logout(&self) -> ClientResult<()> {
        let result = self.client.logout().await;
        self.set_signed_out();
        result
    }

    fn set_signed_in(&self, user: User) {
        self.user.set(Some(user));
        self.is_authenticated.set(true);
    }

    fn set_signed_out(&self) {
        self.user.set(None);
        self.is_authenticated.set(false);
    }
}

/// Community listing and post view state.
#[derive(Debug)]
pub struct CommunityController {
    client: ApiClient,
    pub boards: Store<Vec<Board>>,
    pub posts: Store<Vec<PostDetail>>,
    pub pagination: Store<Option<Pagination>>,
    pub current_post: Store<Option<PostDetail>>,
    pub comments: Store<Vec<CommentDetail>>,
    pub is_loading: Store<bool>,
    pub error: Store<Option<String>>,
}

impl CommunityController {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            boards: Store::default(),
            posts: Store::default(),
            pagination: Store::default(),
            current_post: Store::default(),
            comments: Store::default(),
            is_loading: Store::default(),
            error: Store::default(),
        }
    }

    pub async fn load_boards(&self) -> ClientResult<()> {
        let boards = tracked(&self.is_loading, &self.error, self.client.fetch_boards()).await?;
        self.boards.set(boards);
        Ok(())
    }

    /// Load one page of posts, from one board when `board_slug` is given.
    pub async fn load_posts(&self, board_slug: Option<&str>, query: &PostQuery) -> ClientResult<()> {
        let page = tracked(&self.is_loading, &self.error, async {
            match board_slug {
                Some(slug) => self.client.fetch_posts_by_slug(slug, query).await,
                None => self.client.fetch_posts(query).await,
            }
        })
        .await?;
        self.posts.set(page.posts);
        self.pagination.set(page.pagination);
        Ok(())
    }

    /// Load a post together with its comments.
    pub async fn load_post(&self, post_id: Uuid) -> ClientResult<()> {
        let (post, comments) = tracked(&self.is_loading, &self.error, async {
            tokio::try_join!(
                self.client.fetch_post(post_id),
                self.client.fetch_comments(post_id)
            )
        })
        .await?;
        self.current_post.set(Some(post));
        self.comments.set(comments);
        Ok(())
    }

    /// Toggle the caller's like and adjust the cached like counts.
    pub async fn toggle_like(&self, post_id: Uuid) -> ClientResult<LikeToggle> {
        let toggle = self.client.toggle_post_like(post_id).await.inspect_err(|e| {
            self.error.set(Some(e.to_string()));
        })?;

        let delta = if toggle.liked { 1 } else { -1 };
        let adjust = |post: &mut PostDetail| {
            if post.id == post_id {
                post.likes = Some((post.likes.unwrap_or(0) + delta).max(0));
            }
        };
        self.current_post.update(|current| {
            if let Some(post) = current.as_mut() {
                adjust(post);
            }
        });
        self.posts.update(|posts| posts.iter_mut().for_each(adjust));
        Ok(toggle)
    }
}

/// Admin console lists and moderation actions.
///
/// Actions update the cached rows in place once the server has accepted them.
#[derive(Debug)]
pub struct AdminController {
    client: ApiClient,
    pub stats: Store<Option<DashboardStats>>,
    pub users: Store<Vec<ManagedUser>>,
    pub users_pagination: Store<Option<Pagination>>,
    pub posts: Store<Vec<ModeratedPost>>,
    pub posts_pagination: Store<Option<Pagination>>,
    pub comments: Store<Vec<ModeratedComment>>,
    pub comments_pagination: Store<Option<Pagination>>,
    pub boards: Store<Vec<Board>>,
    pub is_loading: Store<bool>,
    pub error: Store<Option<String>>,
}

impl AdminController {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            stats: Store::default(),
            users: Store::default(),
            users_pagination: Store::default(),
            posts: Store::default(),
            posts_pagination: Store::default(),
            comments: Store::default(),
            comments_pagination: Store::default(),
            boards: Store::default(),
            is_loading: Store::default(),
            error: Store::default(),
        }
    }

    pub async fn load_dashboard(&self) -> ClientResult<()> {
        let stats = tracked(&self.is_loading, &self.error, self.client.dashboard_stats()).await?;
        self.stats.set(Some(stats));
        Ok(())
    }

    pub async fn load_users(&self, query: &AdminQuery) -> ClientResult<()> {
        let list = tracked(&self.is_loading, &self.error, self.client.list_users(query)).await?;
        self.users.set(list.users);
        self.users_pagination.set(Some(list.pagination));
        Ok(())
    }

    pub async fn load_posts(&self, query: &AdminQuery) -> ClientResult<()> {
        let list = tracked(&self.is_loading, &self.error, self.client.moderated_posts(query)).await?;
        self.posts.set(list.posts);
        self.posts_pagination.set(Some(list.pagination));
        Ok(())
    }

    pub async fn load_comments(&self, query: &AdminQuery) -> ClientResult<()> {
        let list = tracked(
            &self.is_loading,
            &self.error,
            self.client.moderated_comments(query),
        )
        .await?;
        self.comments.set(list.comments);
        self.comments_pagination.set(Some(list.pagination));
        Ok(())
    }

    pub async fn load_boards(&self) -> ClientResult<()> {
        let boards = tracked(&self.is_loading, &self.error, self.client.admin_boards()).await?;
        self.boards.set(boards);
        Ok(())
    }

    /// Apply `update` and replace the cached row with the server's copy.
    pub async fn update_user(&self, user_id: Uuid, update: &UpdateUserRequest) -> ClientResult<()> {
        let updated = tracked(
            &self.is_loading,
            &self.error,
            self.client.update_user(user_id, update),
        )
        .await?;
        self.replace_user(updated);
        Ok(())
    }

    pub async fn suspend_user(&self, user_id: Uuid) -> ClientResult<()> {
        self.change_user_status(user_id, UserStatus::Suspended).await
    }

    pub async fn activate_user(&self, user_id: Uuid) -> ClientResult<()> {
        self.change_user_status(user_id, UserStatus::Active).await
    }

    async fn change_user_status(&self, user_id: Uuid, status: UserStatus) -> ClientResult<()> {
        let updated = tracked(
            &self.is_loading,
            &self.error,
            self.client.set_user_status(user_id, status),
        )
        .await?;
        self.replace_user(updated);
        Ok(())
    }

    fn replace_user(&self, updated: ManagedUser) {
        self.users.update(|users| {
            if let Some(user) = users.iter_mut().find(|u| u.id == updated.id) {
                *user = updated;
            }
        });
    }

    pub async fn hide_post(&self, post_id: Uuid) -> ClientResult<()> {
        tracked(
            &self.is_loading,
            &self.error,
            self.client.set_post_hidden(post_id, true),
        )
        .await?;
        self.posts.update(|posts| {
            posts
                .iter_mut()
                .filter(|p| p.id == post_id)
                .for_each(|p| p.status = ContentStatus::Hidden)
        });
        Ok(())
    }

    pub async fn hide_comment(&self, comment_id: Uuid) -> ClientResult<()> {
        tracked(
            &self.is_loading,
            &self.error,
            self.client.set_comment_hidden(comment_id, true),
        )
        .await?;
        self.comments.update(|comments| {
            comments
                .iter_mut()
                .filter(|c| c.id == comment_id)
                .for_each(|c| c.status = ContentStatus::Hidden)
        });
        Ok(())
    }
}
