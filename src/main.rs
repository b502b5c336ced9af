mod auth;
mod database;
mod error;
mod media;
mod screens;
mod session;
mod utils;

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::database::{users, Database};
use crate::error::{AdminError, AdminResult, Notice, NoticeLevel};
use crate::screens::songs::UploadRequest;
use crate::screens::users::{create_user, NewUserForm};
use crate::screens::{Router, Screen};
use crate::session::SessionStore;
use crate::utils::config::{self, ConfigOverrides};

#[derive(Parser, Debug)]
#[command(author, version, about = "Back-office admin console for songs and users", long_about = None)]
struct Args {
    /// SQLite database file
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Session artifact holding the signed-in admin id
    #[arg(long, global = true)]
    session: Option<PathBuf>,

    #[arg(long, global = true, default_value = ".env")]
    env_file: PathBuf,

    /// Skip confirmation prompts for destructive actions
    #[arg(short = 'y', long, global = true)]
    yes: bool,

    #[command(subcommand)]
    command: Command,
}

/// One line typed into `shell`.
#[derive(Parser, Debug)]
#[command(no_binary_name = true, disable_version_flag = true)]
struct ShellLine {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the schema, optionally bootstrapping the first admin
    Init {
        #[arg(long, requires = "admin_password")]
        admin_email: Option<String>,
        #[arg(long)]
        admin_password: Option<String>,
        #[arg(long, default_value = "Admin")]
        first_name: String,
        #[arg(long, default_value = "User")]
        last_name: String,
        /// Save the resolved paths to the env file
        #[arg(long)]
        write_env: bool,
    },
    /// Sign in as an admin and store the session
    Login {
        email: String,
        /// Read from stdin when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Invalidate the stored session
    Logout,
    /// Show the signed-in admin
    #[command(visible_alias = "dashboard")]
    Whoami,
    Songs {
        #[command(subcommand)]
        action: SongsAction,
    },
    Users {
        #[command(subcommand)]
        action: UsersAction,
    },
    Artists {
        #[command(subcommand)]
        action: CatalogAction,
    },
    Genres {
        #[command(subcommand)]
        action: CatalogAction,
    },
    /// Interactive session; failures are reported and the prompt stays open
    Shell,
}

#[derive(Subcommand, Debug)]
enum SongsAction {
    List {
        #[arg(long)]
        json: bool,
    },
    Upload {
        path: PathBuf,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        artist: i64,
        #[arg(long)]
        genre: Option<i64>,
        #[arg(long)]
        album: Option<i64>,
        /// Accept files without an audio extension
        #[arg(long)]
        any_file: bool,
    },
    Delete {
        song_id: i64,
    },
}

#[derive(Subcommand, Debug)]
enum UsersAction {
    List {
        #[arg(long)]
        json: bool,
    },
    Add {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        confirm_password: String,
        /// Grant admin privileges
        #[arg(long)]
        admin: bool,
    },
    Delete {
        user_id: i64,
    },
    ToggleAdmin {
        user_id: i64,
    },
}

#[derive(Subcommand, Debug)]
enum CatalogAction {
    List {
        #[arg(long)]
        json: bool,
    },
    Add {
        name: String,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt().with_writer(io::stderr).init();
    let args = Args::parse();

    match run(args) {
        Ok(code) => code,
        Err(e) => {
            error!("Unhandled error: {:#}", e);
            eprintln!("[Error] An error occurred: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<ExitCode> {
    let overrides = ConfigOverrides {
        database_path: args.db,
        session_path: args.session,
    };
    let config = config::resolve_config(&args.env_file, overrides).context("Failed to load configuration")?;
    info!("DB: {:?}", config.database_path);

    if let Command::Init {
        admin_email,
        admin_password,
        first_name,
        last_name,
        write_env,
    } = args.command
    {
        let db = Database::create(&config.database_path).context("Failed to initialize database")?;
        if let (Some(email), Some(password)) = (admin_email, admin_password) {
            let form = NewUserForm {
                first_name,
                last_name,
                email,
                confirm_password: password.clone(),
                password,
                is_admin: true,
            };
            if let Err(e) = bootstrap_admin(&db, form) {
                report(&e);
                return Ok(ExitCode::FAILURE);
            }
        }
        if write_env {
            config::save_to_env(&args.env_file, &config)?;
        }
        return Ok(ExitCode::SUCCESS);
    }

    let db = Database::new(&config.database_path);
    let store = SessionStore::new(&config.session_path);
    let mut router = Router::new(&db, &store);

    if let Command::Shell = args.command {
        return run_shell(&mut router, args.yes);
    }

    match dispatch(&mut router, args.command, args.yes) {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            report(&e);
            Ok(ExitCode::FAILURE)
        }
    }
}

fn bootstrap_admin(db: &Database, form: NewUserForm) -> AdminResult<()> {
    if users::admin_exists(db)? {
        warn!("An admin already exists; skipping bootstrap of {}", form.email);
        return Ok(());
    }
    let admin_id = create_user(db, form)?;
    show(&Notice::success(format!("Admin account {} created", admin_id)));
    Ok(())
}

/// Runs one action against the current session. Errors are returned to
/// the caller, which reports them without ending the process.
fn dispatch(router: &mut Router<'_>, command: Command, yes: bool) -> AdminResult<()> {
    match command {
        Command::Init { .. } | Command::Shell => {
            show(&Notice::warning("Input Error", "Not available here"));
        }
        Command::Login { email, password } => {
            let password = match password {
                Some(password) => password,
                None => prompt("Password: ")?,
            };
            let admin = router.login(&email, &password)?;
            show(&Notice::success(format!("Welcome, {}", admin.profile().display_name())));
        }
        Command::Logout => {
            router.logout()?;
            show(&Notice::success("Signed out"));
        }
        Command::Whoami => {
            let admin = router.enter(Screen::Dashboard)?;
            let profile = admin.profile();
            println!(
                "{}  |  Admin: {} <{}> (id {})",
                Screen::Dashboard.title(),
                profile.display_name(),
                profile.email,
                profile.id
            );
        }
        Command::Songs { action } => {
            let mut screen = router.open_songs()?;
            match action {
                SongsAction::List { json } => {
                    if json {
                        print_json(screen.rows())?;
                    } else {
                        println!("{}", screen.render());
                    }
                }
                SongsAction::Upload {
                    path,
                    title,
                    artist,
                    genre,
                    album,
                    any_file,
                } => {
                    let song_id = screen.upload(UploadRequest {
                        path,
                        title,
                        artist_id: artist,
                        genre_id: genre,
                        album_id: album,
                        allow_any_file: any_file,
                    })?;
                    let title = screen.find(song_id).map(|row| row.title.clone()).unwrap_or_default();
                    show(&Notice::success(format!("Song '{}' uploaded successfully!", title)));
                    println!("{}", screen.render());
                }
                SongsAction::Delete { song_id } => {
                    let Some(row) = screen.find(song_id).cloned() else {
                        return Err(AdminError::NotFound { entity: "Song", id: song_id });
                    };
                    let question = format!(
                        "Are you sure you want to delete the song '{}'? This action cannot be undone.",
                        row.title
                    );
                    if !yes && !confirm(&question)? {
                        return Ok(());
                    }
                    screen.delete(song_id)?;
                    show(&Notice::success(format!("Song '{}' deleted successfully!", row.title)));
                    println!("{}", screen.render());
                }
            }
        }
        Command::Users { action } => {
            let mut screen = router.open_users()?;
            match action {
                UsersAction::List { json } => {
                    if json {
                        print_json(screen.rows())?;
                    } else {
                        println!("{}", screen.render());
                    }
                }
                UsersAction::Add {
                    first_name,
                    last_name,
                    email,
                    password,
                    confirm_password,
                    admin,
                } => {
                    let name = format!("{} {}", first_name.trim(), last_name.trim());
                    screen.add(NewUserForm {
                        first_name,
                        last_name,
                        email,
                        password,
                        confirm_password,
                        is_admin: admin,
                    })?;
                    show(&Notice::success(format!("User '{}' added successfully!", name)));
                    println!("{}", screen.render());
                }
                UsersAction::Delete { user_id } => {
                    let Some(row) = screen.find(user_id).cloned() else {
                        return Err(AdminError::NotFound { entity: "User", id: user_id });
                    };
                    let question = format!(
                        "Are you sure you want to delete the user '{}'? This will delete ALL data associated \
                         with this user, including playlists and listening history. This action cannot be undone.",
                        row.name
                    );
                    if !yes && !confirm(&question)? {
                        return Ok(());
                    }
                    screen.delete(user_id)?;
                    show(&Notice::success(format!("User '{}' deleted successfully!", row.name)));
                    println!("{}", screen.render());
                }
                UsersAction::ToggleAdmin { user_id } => {
                    let Some(row) = screen.find(user_id).cloned() else {
                        return Err(AdminError::NotFound { entity: "User", id: user_id });
                    };
                    let change = if row.is_admin {
                        "remove admin privileges from"
                    } else {
                        "grant admin privileges to"
                    };
                    if !yes && !confirm(&format!("Are you sure you want to {} '{}'?", change, row.name))? {
                        return Ok(());
                    }
                    let is_admin = screen.toggle_admin(user_id)?;
                    let status = if is_admin { "granted to" } else { "removed from" };
                    show(&Notice::success(format!(
                        "Admin privileges {} '{}' successfully!",
                        status, row.name
                    )));
                    println!("{}", screen.render());
                }
            }
        }
        Command::Artists { action } => {
            let screen = router.open_songs()?;
            match action {
                CatalogAction::List { json } => {
                    let artists = screen.artists()?;
                    if json {
                        print_json(&artists)?;
                    } else {
                        for artist in artists {
                            println!("{:>5}  {}", artist.artist_id, artist.name);
                        }
                    }
                }
                CatalogAction::Add { name } => {
                    let artist_id = screen.add_artist(&name)?;
                    show(&Notice::success(format!("Artist '{}' added with id {}", name.trim(), artist_id)));
                }
            }
        }
        Command::Genres { action } => {
            let screen = router.open_songs()?;
            match action {
                CatalogAction::List { json } => {
                    let genres = screen.genres()?;
                    if json {
                        print_json(&genres)?;
                    } else {
                        for genre in genres {
                            println!("{:>5}  {}", genre.genre_id, genre.name);
                        }
                    }
                }
                CatalogAction::Add { name } => {
                    let genre_id = screen.add_genre(&name)?;
                    show(&Notice::success(format!("Genre '{}' added with id {}", name.trim(), genre_id)));
                }
            }
        }
    }
    Ok(())
}

fn run_shell(router: &mut Router<'_>, yes: bool) -> Result<ExitCode> {
    // Entering the shell is entering the dashboard: no session, no shell.
    if let Err(e) = router.enter(Screen::Dashboard) {
        report(&e);
        if e.requires_login() {
            info!("Starting shell on the login screen");
        } else {
            return Ok(ExitCode::FAILURE);
        }
    }

    let stdin = io::stdin();
    loop {
        print!("{}> ", router.current().title());
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let tokens = split_line(&line);
        match tokens.first().map(String::as_str) {
            None => continue,
            Some("exit") | Some("quit") => break,
            _ => {}
        }

        match ShellLine::try_parse_from(tokens) {
            Ok(parsed) => {
                if let Err(e) = dispatch(router, parsed.command, yes) {
                    report(&e);
                }
            }
            Err(e) => {
                // clap renders help and usage errors itself
                e.print()?;
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Whitespace-separated words; double quotes group words with spaces.
fn split_line(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut has_token = false;

    for c in line.trim().chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                has_token = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if has_token {
                    tokens.push(std::mem::take(&mut current));
                    has_token = false;
                }
            }
            c => {
                current.push(c);
                has_token = true;
            }
        }
    }
    if has_token {
        tokens.push(current);
    }
    tokens
}

fn report(err: &AdminError) {
    error!("Action failed: {}", err);
    eprintln!("{}", Notice::from(err));
    if err.requires_login() {
        eprintln!("Please sign in again with `login <email>`.");
    }
}

fn show(notice: &Notice) {
    match notice.level {
        NoticeLevel::Info => println!("{}", notice),
        NoticeLevel::Warning | NoticeLevel::Error => eprintln!("{}", notice),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> AdminResult<()> {
    let json = serde_json::to_string_pretty(value).map_err(io::Error::from)?;
    println!("{}", json);
    Ok(())
}

fn prompt(label: &str) -> AdminResult<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn confirm(question: &str) -> AdminResult<bool> {
    let answer = prompt(&format!("{} [y/N] ", question))?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
