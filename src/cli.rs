// CLI module - command-line argument parsing and handlers
//
// Every browsing command first navigates the router to the matching path so
// the same guards apply as for any other front end: `profile` while logged
// out lands on the login route, `login` while logged in lands on home.

use std::io::{BufRead, Write};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};

use crate::api::models::{AuthorQuery, PageParams, PoemQuery, RegisterRequest, UpdateProfileRequest, UserInfo};
use crate::app::App;
use crate::config::{Config, VERSION};
use crate::format::{format_dynasty, format_poem, page_footer, poem_summary, truncate_to_width};
use crate::hooks::HookError;
use crate::router::{Location, ResolvedRoute, View};

/// Output width for list lines
const LINE_WIDTH: usize = 80;

/// Environment variable consulted for the password when `--password` is absent
const PASSWORD_ENV: &str = "SHICI_PASSWORD";

/// shici - browse classical Chinese poetry from the terminal
#[derive(Parser)]
#[command(name = "shici")]
#[command(version = VERSION)]
#[command(about = "Browse classical Chinese poetry from a shici backend", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug, Clone, Copy, Default)]
pub struct Paging {
    /// Page number (1-based)
    #[arg(long)]
    pub page: Option<u32>,

    /// Items per page
    #[arg(long)]
    pub page_size: Option<u32>,
}

impl From<Paging> for PageParams {
    fn from(p: Paging) -> Self {
        PageParams {
            page: p.page,
            page_size: p.page_size,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Browse poems
    #[command(subcommand)]
    Poems(PoemsCommand),

    /// Full-text search over poems and authors
    Search {
        /// Search terms
        #[arg(required = true)]
        query: Vec<String>,

        #[command(flatten)]
        paging: Paging,
    },

    /// Browse authors
    #[command(subcommand)]
    Authors(AuthorsCommand),

    /// List dynasties
    Dynasties,

    /// List poem collections
    Categories,

    /// Create an account and log in
    Register {
        username: String,

        /// Password (falls back to $SHICI_PASSWORD, then stdin)
        #[arg(long)]
        password: Option<String>,

        #[arg(long)]
        nickname: Option<String>,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        phone: Option<String>,
    },

    /// Log in and remember the session
    Login {
        username: String,

        /// Password (falls back to $SHICI_PASSWORD, then stdin)
        #[arg(long)]
        password: Option<String>,
    },

    /// Forget the stored session
    Logout,

    /// Exchange the stored token for a fresh one
    Refresh,

    /// Your own profile
    #[command(subcommand)]
    Profile(ProfileCommand),

    /// Public profile of another user
    User { id: u64 },

    /// Show who is logged in
    Whoami,

    /// Resolve an application path (e.g. /poem/12) through the router
    Open { path: String },

    /// Manage configuration
    Config {
        /// Show effective configuration
        #[arg(long)]
        show: bool,

        /// Reset config file to defaults
        #[arg(long)]
        reset: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },
}

#[derive(Subcommand)]
pub enum PoemsCommand {
    /// One page of the catalog
    List {
        /// Collection key, e.g. tangshi
        #[arg(long)]
        category: Option<String>,

        #[command(flatten)]
        paging: Paging,
    },

    /// Full text of one poem
    Show { id: String },

    /// Random poems
    Random {
        #[arg(long, default_value_t = 1)]
        count: u32,

        /// Only draw from this collection
        #[arg(long)]
        category: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum AuthorsCommand {
    /// One page of authors
    List {
        /// Dynasty key, e.g. tang
        #[arg(long)]
        dynasty: Option<String>,

        #[command(flatten)]
        paging: Paging,
    },

    /// Biography of one author
    Show { name: String },

    /// Poems by one author
    Poems {
        name: String,

        #[command(flatten)]
        paging: Paging,
    },
}

#[derive(Subcommand)]
pub enum ProfileCommand {
    /// Fetch and show your profile
    Show,

    /// Change profile fields
    Update {
        #[arg(long)]
        nickname: Option<String>,

        #[arg(long)]
        avatar_url: Option<String>,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        phone: Option<String>,

        /// 0 unknown, 1 male, 2 female
        #[arg(long)]
        gender: Option<i32>,

        #[arg(long)]
        province: Option<String>,

        #[arg(long)]
        city: Option<String>,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Config commands (no backend needed)
// ─────────────────────────────────────────────────────────────────────────────

/// Handle `config` without building the app. Returns true if it was handled.
pub fn handle_config_command(command: &Commands) -> Result<bool> {
    let Commands::Config { show, reset, path } = command else {
        return Ok(false);
    };

    if *path {
        handle_config_path()?;
    } else if *show {
        handle_config_show()?;
    } else if *reset {
        handle_config_reset()?;
    } else {
        // No flag provided, show help
        println!("Usage: shici config [--show|--reset|--path]");
        println!();
        println!("Options:");
        println!("  --show    Display effective configuration");
        println!("  --reset   Reset config file to defaults");
        println!("  --path    Show config file path");
    }
    Ok(true)
}

fn handle_config_path() -> Result<()> {
    let path = Config::config_path().context("Could not determine config path")?;
    println!("{}", path.display());
    Ok(())
}

fn handle_config_show() -> Result<()> {
    let config = Config::load()?;

    println!("# Effective configuration (env > file > defaults)");
    println!();
    print!("{}", config.to_toml());

    // Show source info
    println!();
    if let Some(path) = Config::config_path() {
        if path.exists() {
            println!("# Source: {}", path.display());
        } else {
            println!("# Source: defaults (no config file)");
        }
    }
    Ok(())
}

fn handle_config_reset() -> Result<()> {
    let path = Config::config_path().context("Could not determine config path")?;

    // Confirm if file exists
    if path.exists() {
        eprint!(
            "Config file exists at {}. Overwrite? [y/N] ",
            path.display()
        );
        std::io::stderr().flush()?;

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;

        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Aborted.");
            return Ok(());
        }
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Error creating directory {}", parent.display()))?;
    }

    std::fs::write(&path, Config::default().to_toml())
        .with_context(|| format!("Error writing config {}", path.display()))?;

    println!("Config reset to defaults: {}", path.display());
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Backend commands
// ─────────────────────────────────────────────────────────────────────────────

fn hook_error(e: HookError) -> anyhow::Error {
    anyhow!(e.message())
}

/// Navigate, and explain when a guard sent us somewhere else
fn enter(app: &App, target: &str, expected: View) -> Result<Option<ResolvedRoute>> {
    let resolved = app.router.navigate(target)?;
    if resolved.view == expected {
        return Ok(Some(resolved));
    }

    match resolved.view {
        View::Login => println!("Not logged in. Run `shici login <username>` first."),
        View::Home if matches!(expected, View::Login | View::Register) => {
            match app.session.current_user_as::<UserInfo>() {
                Some(user) => println!(
                    "Already logged in as {}. Run `shici logout` first.",
                    user.display_name()
                ),
                None => println!("Already logged in. Run `shici logout` first."),
            }
        }
        other => println!("Redirected to {} ({:?})", resolved.location, other),
    }
    Ok(None)
}

/// Route target for a detail page keyed by a user-supplied id or name
fn detail_target(section: &str, key: &str) -> String {
    Location::from_segments(&[section, key]).to_string()
}

fn read_password(flag: Option<String>) -> Result<String> {
    if let Some(password) = flag {
        return Ok(password);
    }
    if let Ok(password) = std::env::var(PASSWORD_ENV) {
        return Ok(password);
    }

    eprint!("Password: ");
    std::io::stderr().flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        bail!("password must not be empty");
    }
    Ok(password)
}

fn print_user(user: &UserInfo) {
    println!("{} (@{}, id {})", user.display_name(), user.username, user.id);
    println!("level {}  exp {}  coins {}", user.level, user.experience, user.coins);
    if !user.email.is_empty() {
        println!("email: {}", user.email);
    }
    if !user.phone.is_empty() {
        println!("phone: {}", user.phone);
    }
}

/// Run one backend command
pub async fn run(app: &App, command: Commands) -> Result<()> {
    match command {
        Commands::Poems(cmd) => run_poems(app, cmd).await,
        Commands::Authors(cmd) => run_authors(app, cmd).await,

        Commands::Search { query, paging } => {
            let query = query.join(" ");
            let target = Location::parse("/search").with_query("q", &query).to_string();
            if enter(app, &target, View::Search)?.is_none() {
                return Ok(());
            }

            let hook = app.search_hook();
            match hook.search(&query, &paging.into()).await.map_err(hook_error)? {
                None => println!("Nothing to search for."),
                Some(found) => {
                    for work in &found.works {
                        println!("{}", poem_summary(work, LINE_WIDTH));
                    }
                    for author in &found.authors {
                        println!("author: {} [{}]", author.name, format_dynasty(&author.dynasty));
                    }
                    println!("{}", page_footer(found.page, found.total_pages, found.total));
                }
            }
            Ok(())
        }

        Commands::Dynasties | Commands::Categories => {
            if enter(app, "/catalog", View::Catalog)?.is_none() {
                return Ok(());
            }
            app.load_reference_data().await.map_err(hook_error)?;

            if matches!(command, Commands::Dynasties) {
                for dynasty in app.reference.dynasties() {
                    println!("{:<8} {}  {}", dynasty.id, dynasty.name, dynasty.period);
                }
            } else {
                for category in app.reference.categories() {
                    println!("{:<16} {}", category.name, app.reference.category_label(&category.name));
                }
            }
            Ok(())
        }

        Commands::Register {
            username,
            password,
            nickname,
            email,
            phone,
        } => {
            if enter(app, "/register", View::Register)?.is_none() {
                return Ok(());
            }
            let request = RegisterRequest {
                username,
                password: read_password(password)?,
                nickname: nickname.unwrap_or_default(),
                email: email.unwrap_or_default(),
                phone: phone.unwrap_or_default(),
            };
            let login = app
                .account
                .register(&request)
                .await
                .map_err(|e| anyhow!(e.user_message()))?;
            println!("Welcome, {}!", login.user.display_name());
            Ok(())
        }

        Commands::Login { username, password } => {
            if enter(app, "/login", View::Login)?.is_none() {
                return Ok(());
            }
            let password = read_password(password)?;
            let login = app
                .account
                .login(&username, &password)
                .await
                .map_err(|e| anyhow!(e.user_message()))?;

            print!("Logged in as {}", login.user.display_name());
            match login.expires_at_utc() {
                Some(expiry) => println!(" (token valid until {})", expiry.format("%Y-%m-%d %H:%M UTC")),
                None => println!(),
            }
            Ok(())
        }

        Commands::Logout => {
            if !app.session.is_authenticated() {
                println!("Not logged in.");
                return Ok(());
            }
            app.account.logout().map_err(|e| anyhow!(e.user_message()))?;
            println!("Logged out.");
            Ok(())
        }

        Commands::Refresh => {
            app.account
                .refresh()
                .await
                .map_err(|e| anyhow!(e.user_message()))?;
            println!("Token refreshed.");
            Ok(())
        }

        Commands::Profile(cmd) => {
            if enter(app, "/profile", View::Profile)?.is_none() {
                return Ok(());
            }
            match cmd {
                ProfileCommand::Show => {
                    let user = app
                        .account
                        .sync_profile()
                        .await
                        .map_err(|e| anyhow!(e.user_message()))?;
                    print_user(&user);
                }
                ProfileCommand::Update {
                    nickname,
                    avatar_url,
                    email,
                    phone,
                    gender,
                    province,
                    city,
                } => {
                    let request = UpdateProfileRequest {
                        nickname,
                        avatar_url,
                        email,
                        phone,
                        gender,
                        province,
                        city,
                    };
                    app.account
                        .update_profile(&request)
                        .await
                        .map_err(|e| anyhow!(e.user_message()))?;
                    println!("Profile updated.");
                }
            }
            Ok(())
        }

        Commands::User { id } => {
            let profile = app
                .account
                .public_profile(id)
                .await
                .map_err(|e| anyhow!(e.user_message()))?;
            let name = if profile.nickname.is_empty() {
                &profile.username
            } else {
                &profile.nickname
            };
            println!("{} (@{}, id {}) level {}", name, profile.username, profile.id, profile.level);
            Ok(())
        }

        Commands::Whoami => {
            match app.session.current_user_as::<UserInfo>() {
                Some(user) if app.session.is_authenticated() => print_user(&user),
                _ if app.session.is_authenticated() => println!("Logged in (no stored profile)."),
                _ => println!("Not logged in."),
            }
            Ok(())
        }

        Commands::Open { path } => {
            let resolved = app.router.navigate(&path)?;
            println!("{:?} {}", resolved.view, resolved.location);
            for (name, value) in &resolved.params {
                println!("  {} = {}", name, value);
            }
            Ok(())
        }

        // Handled before the app is built
        Commands::Config { .. } => handle_config_command(&command).map(|_| ()),
    }
}

async fn run_poems(app: &App, cmd: PoemsCommand) -> Result<()> {
    let hooks = app.poetry_hooks();

    match cmd {
        PoemsCommand::List { category, paging } => {
            if enter(app, "/catalog", View::Catalog)?.is_none() {
                return Ok(());
            }
            let query = PoemQuery {
                page: paging.page,
                page_size: paging.page_size,
                category,
            };
            let page = hooks.fetch_poems(&query).await.map_err(hook_error)?;
            for work in hooks.poems() {
                println!("{}", poem_summary(&work, LINE_WIDTH));
            }
            println!("{}", page_footer(page.page, page.total_pages, page.total));
        }

        PoemsCommand::Show { id } => {
            if enter(app, &detail_target("poem", &id), View::PoemDetail)?.is_none() {
                return Ok(());
            }
            let poem = hooks.fetch_poem_by_id(&id).await.map_err(hook_error)?;
            print!("{}", format_poem(&poem));
            if !poem.category.display_name.is_empty() {
                println!();
                println!("({})", poem.category.display_name);
            }
            app.reference.set_current_poem(Some(poem));
        }

        PoemsCommand::Random { count, category } => {
            if enter(app, "/", View::Home)?.is_none() {
                return Ok(());
            }
            let poems = hooks
                .fetch_random_poems(count, category.as_deref().unwrap_or_default())
                .await
                .map_err(hook_error)?;
            for (i, poem) in poems.iter().enumerate() {
                if i > 0 {
                    println!();
                }
                print!("{}", format_poem(poem));
            }
        }
    }
    Ok(())
}

async fn run_authors(app: &App, cmd: AuthorsCommand) -> Result<()> {
    match cmd {
        AuthorsCommand::List { dynasty, paging } => {
            if enter(app, "/authors", View::AuthorsCatalog)?.is_none() {
                return Ok(());
            }
            let hooks = app.author_hooks();
            let query = AuthorQuery {
                page: paging.page,
                page_size: paging.page_size,
                dynasty,
            };
            let page = hooks.fetch_authors(&query).await.map_err(hook_error)?;
            for author in hooks.authors() {
                let line = format!("{:<12} [{}]", author.name, format_dynasty(&author.dynasty));
                println!("{}", truncate_to_width(&line, LINE_WIDTH));
            }
            println!("{}", page_footer(page.page, page.total_pages, page.total));
        }

        AuthorsCommand::Show { name } => {
            if enter(app, &detail_target("author", &name), View::Author)?.is_none() {
                return Ok(());
            }
            let author = app.author_hooks().fetch_author(&name).await.map_err(hook_error)?;
            println!("{} [{}]", author.name, format_dynasty(&author.dynasty));
            if !author.biography.is_empty() {
                println!();
                println!("{}", author.biography);
            }
        }

        AuthorsCommand::Poems { name, paging } => {
            if enter(app, &detail_target("author", &name), View::Author)?.is_none() {
                return Ok(());
            }
            let page = app
                .poetry_hooks()
                .fetch_poems_by_author(&name, &paging.into())
                .await
                .map_err(hook_error)?;
            for work in &page.works {
                println!("{}", poem_summary(work, LINE_WIDTH));
            }
            println!("{}", page_footer(page.page, page.total_pages, page.total));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_nested_paging() {
        let cli = Cli::try_parse_from(["shici", "authors", "poems", "李白", "--page", "2"]).unwrap();
        match cli.command {
            Commands::Authors(AuthorsCommand::Poems { name, paging }) => {
                assert_eq!(name, "李白");
                assert_eq!(PageParams::from(paging), PageParams { page: Some(2), page_size: None });
            }
            _ => panic!("wrong command"),
        }
    }

    #[test]
    fn test_search_joins_terms() {
        let cli = Cli::try_parse_from(["shici", "search", "明月", "故乡"]).unwrap();
        let Commands::Search { query, .. } = cli.command else {
            panic!("wrong command");
        };
        assert_eq!(query.join(" "), "明月 故乡");
    }

    #[test]
    fn test_detail_target_routes_reserved_names() {
        let router = crate::router::Router::new(crate::store::SessionStore::in_memory().shared());

        let poem = router.navigate(&detail_target("poem", "12?x")).unwrap();
        assert_eq!(poem.view, View::PoemDetail);
        assert_eq!(poem.param("id"), Some("12?x"));

        let author = router.navigate(&detail_target("author", "AC/DC")).unwrap();
        assert_eq!(author.view, View::Author);
        assert_eq!(author.param("name"), Some("AC/DC"));
    }

    #[test]
    fn test_password_flag_wins() {
        assert_eq!(read_password(Some("pw".to_string())).unwrap(), "pw");
    }
}
