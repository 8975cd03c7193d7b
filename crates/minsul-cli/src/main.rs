//! Minsul CLI: command-line client for the Minsul community API.
//!
//! Reads MINSUL_API_URL (or API_URL) and the other MINSUL_* variables; see
//! `ClientConfig::from_env`. Tokens persist in MINSUL_TOKEN_FILE, by default
//! `~/.minsul/tokens.json`.

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use minsul_api_client::{
    AdminQuery, ApiClient, ClientError, LogLevel, PostQuery, UploadCategory, UploadOptions,
    UploadSource, UserStatus,
};
use minsul_cli::{default_token_file, format_size, init_tracing, truncate_string, TokenStatus};
use minsul_core::{ClientConfig, ServiceType};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "minsul", about = "Minsul community API CLI")]
struct Cli {
    /// Session to use: site or admin (overrides MINSUL_SERVICE)
    #[arg(long, global = true)]
    service: Option<ServiceType>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "table")]
    format: Format,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and store the session tokens
    Login {
        email: String,
        /// Password (falls back to MINSUL_PASSWORD)
        #[arg(long, env = "MINSUL_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Sign out and delete the stored tokens
    Logout,
    /// Show the signed-in account
    Whoami,
    /// Show whether a session is stored and when it expires
    TokenStatus,
    /// Upload a file (chunked when larger than the threshold)
    Upload {
        file: PathBuf,
        /// Destination: posts, profiles or site
        #[arg(long, default_value = "posts")]
        category: UploadCategory,
    },
    /// List boards
    Boards,
    /// List posts, optionally of one board
    Posts {
        /// Board slug
        #[arg(long)]
        board: Option<String>,
        #[arg(long)]
        search: Option<String>,
        #[arg(long, default_value = "1")]
        page: u32,
        #[arg(long, default_value_t = minsul_core::constants::DEFAULT_PAGE_SIZE)]
        limit: u32,
    },
    /// Latest posts across boards
    Recent {
        /// Comma-separated board slugs
        #[arg(long)]
        slugs: Option<String>,
        #[arg(long, default_value = "5")]
        limit: u32,
    },
    /// Show one post
    Post { id: Uuid },
    /// List the comments of a post
    Comments { post_id: Uuid },
    /// Toggle your like on a post
    Like { post_id: Uuid },
    /// Show the site navigation menus
    Menus,
    /// Show a static page
    Page { slug: String },
    /// Admin console operations (always use the admin session)
    #[command(subcommand)]
    Admin(AdminCommands),
}

#[derive(Subcommand)]
enum AdminCommands {
    /// Show dashboard statistics
    Stats,
    /// List accounts
    Users {
        #[arg(long)]
        search: Option<String>,
        /// active, suspended or pending
        #[arg(long)]
        status: Option<UserStatus>,
        #[arg(long, default_value = "1")]
        page: u32,
    },
    /// Suspend an account
    Suspend { user_id: Uuid },
    /// Reactivate an account
    Activate { user_id: Uuid },
    /// Hide a post from the public site
    HidePost { post_id: Uuid },
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

fn build_client(service: Option<ServiceType>) -> anyhow::Result<ApiClient> {
    let mut config = ClientConfig::from_env().context("Invalid MINSUL_* configuration")?;
    if let Some(service) = service {
        config.service_type = service;
    }
    if config.token_file.is_none() {
        config.token_file = default_token_file(std::env::var_os("HOME").map(PathBuf::from));
    }
    config
        .upload
        .validate()
        .context("Invalid upload configuration")?;
    Ok(ApiClient::new(config)?)
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let service = match cli.command {
        Commands::Admin(_) => Some(ServiceType::Admin),
        _ => cli.service,
    };
    let client = build_client(service)?;
    let json = cli.format == Format::Json;

    match cli.command {
        Commands::Login { email, password } => {
            let user = client.login(&email, &password).await?;
            if json {
                print_json(&user)?;
            } else {
                println!("Signed in as {} <{}> ({})", user.name, user.email, user.role);
            }
        }
        Commands::Logout => {
            client.logout().await?;
            println!("Signed out");
        }
        Commands::Whoami => {
            let user = client.me().await?;
            if json {
                print_json(&user)?;
            } else {
                println!("{} <{}>", user.name, user.email);
                println!("role: {}", user.role);
                if let Some(permissions) = &user.permissions {
                    println!("permissions: {}", permissions.join(", "));
                }
            }
        }
        Commands::TokenStatus => {
            print_json(&TokenStatus::from_store(client.tokens()))?;
        }
        Commands::Upload { file, category } => {
            let source = UploadSource::open(&file)
                .await
                .with_context(|| format!("Failed to open file: {}", file.display()))?;
            let options = UploadOptions::new().on_progress(|p| {
                tracing::info!(
                    chunk = p.chunks_sent,
                    total = p.total_chunks,
                    "uploaded {:.0}%",
                    p.percent()
                );
            });
            let result = client.upload(&source, category, &options).await?;
            if json {
                print_json(&result)?;
            } else {
                println!(
                    "Uploaded {} ({}, {})",
                    source.name(),
                    format_size(result.size),
                    result.mime_type
                );
                println!("{}", result.url);
            }
        }
        Commands::Boards => {
            let boards = client.fetch_boards().await?;
            if json {
                print_json(&boards)?;
            } else {
                println!("{:<20} {:<24} DESCRIPTION", "SLUG", "NAME");
                for board in boards {
                    println!(
                        "{:<20} {:<24} {}",
                        board.slug.as_deref().unwrap_or("-"),
                        truncate_string(&board.name, 24),
                        truncate_string(board.description.as_deref().unwrap_or(""), 40)
                    );
                }
            }
        }
        Commands::Posts {
            board,
            search,
            page,
            limit,
        } => {
            let query = PostQuery {
                search,
                page: Some(page),
                limit: Some(limit),
                ..Default::default()
            };
            let result = match board.as_deref() {
                Some(slug) => client.fetch_posts_by_slug(slug, &query).await?,
                None => client.fetch_posts(&query).await?,
            };
            if json {
                print_json(&serde_json::json!({
                    "posts": result.posts,
                    "pagination": result.pagination,
                }))?;
            } else {
                print_post_table(&result.posts);
                if let Some(p) = result.pagination {
                    println!("page {}/{} ({} posts)", p.page, p.total_pages, p.total);
                }
            }
        }
        Commands::Recent { slugs, limit } => {
            let posts = client
                .fetch_recent_posts(slugs.as_deref(), Some(limit))
                .await?;
            if json {
                print_json(&posts)?;
            } else {
                print_post_table(&posts);
            }
        }
        Commands::Post { id } => {
            let post = client.fetch_post(id).await?;
            if json {
                print_json(&post)?;
            } else {
                println!("{}", post.title);
                println!(
                    "by {} in {} · {} views · {} likes",
                    post.user_name.as_deref().unwrap_or("unknown"),
                    post.board_name.as_deref().unwrap_or("-"),
                    post.views.unwrap_or(0),
                    post.likes.unwrap_or(0)
                );
                println!();
                println!("{}", post.content);
            }
        }
        Commands::Comments { post_id } => {
            let comments = client.fetch_comments(post_id).await?;
            if json {
                print_json(&comments)?;
            } else {
                for comment in comments {
                    let indent = if comment.parent_id.is_some() { "  ↳ " } else { "" };
                    println!(
                        "{}{}: {}",
                        indent,
                        comment.user_name.as_deref().unwrap_or("unknown"),
                        truncate_string(&comment.content, 80)
                    );
                }
            }
        }
        Commands::Like { post_id } => {
            let toggle = client.toggle_post_like(post_id).await?;
            if json {
                print_json(&toggle)?;
            } else if toggle.liked {
                println!("Liked");
            } else {
                println!("Like removed");
            }
        }
        Commands::Menus => {
            let menus = client.fetch_site_menus().await?;
            print_json(&menus)?;
        }
        Commands::Page { slug } => {
            let page = client.fetch_page_by_slug(&slug).await?;
            if json {
                print_json(&page)?;
            } else {
                println!("{}", page.title);
                println!();
                println!("{}", page.content);
            }
        }
        Commands::Admin(command) => run_admin(&client, command, json).await?,
    }

    Ok(())
}

async fn run_admin(client: &ApiClient, command: AdminCommands, json: bool) -> anyhow::Result<()> {
    match command {
        AdminCommands::Stats => {
            let stats = client.dashboard_stats().await?;
            if json {
                print_json(&stats)?;
            } else {
                println!("users:    {}", stats.total_users);
                println!("posts:    {} ({} this month)", stats.total_posts, stats.monthly_posts);
                println!("comments: {}", stats.total_comments);
                println!("boards:   {}", stats.total_boards);
                println!("visitors: {} this month", stats.monthly_visitors);
            }
        }
        AdminCommands::Users {
            search,
            status,
            page,
        } => {
            let query = AdminQuery {
                search,
                status: status.map(|s| s.to_string()),
                ..AdminQuery::for_page(page)
            };
            let list = client.list_users(&query).await?;
            if json {
                print_json(&list.users)?;
            } else {
                println!("{:<36} {:<24} {:<10} {:<10}", "ID", "EMAIL", "ROLE", "STATUS");
                for user in &list.users {
                    println!(
                        "{:<36} {:<24} {:<10} {:<10}",
                        user.id.to_string(),
                        truncate_string(&user.email, 24),
                        truncate_string(&user.role, 10),
                        user.status.as_str()
                    );
                }
                let p = list.pagination;
                println!("page {}/{} ({} users)", p.page, p.total_pages, p.total);
            }
        }
        AdminCommands::Suspend { user_id } => {
            let user = client.set_user_status(user_id, UserStatus::Suspended).await?;
            println!("{} is now {}", user.email, user.status);
        }
        AdminCommands::Activate { user_id } => {
            let user = client.set_user_status(user_id, UserStatus::Active).await?;
            println!("{} is now {}", user.email, user.status);
        }
        AdminCommands::HidePost { post_id } => {
            client.set_post_hidden(post_id, true).await?;
            println!("Post {} hidden", post_id);
        }
    }
    Ok(())
}

fn print_post_table(posts: &[minsul_api_client::PostDetail]) {
    println!("{:<36} {:<40} {:<12} LIKES", "ID", "TITLE", "AUTHOR");
    for post in posts {
        println!(
            "{:<36} {:<40} {:<12} {}",
            post.id.to_string(),
            truncate_string(&post.title, 40),
            truncate_string(post.user_name.as_deref().unwrap_or("-"), 12),
            post.likes.unwrap_or(0)
        );
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<ClientError>() {
                Some(client_err) => {
                    let code = client_err.error_code();
                    match client_err.log_level() {
                        LogLevel::Debug => tracing::debug!(error_code = code, "{}", client_err),
                        LogLevel::Warn => tracing::warn!(error_code = code, "{}", client_err),
                        LogLevel::Error => tracing::error!(error_code = code, "{}", client_err),
                    }
                    if client_err.requires_login() {
                        eprintln!("error: {} (run `minsul login <email>`)", client_err);
                    } else {
                        eprintln!("error: {}", client_err);
                    }
                }
                None => eprintln!("error: {:#}", err),
            }
            ExitCode::FAILURE
        }
    }
}
