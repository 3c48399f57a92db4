//! # CLI Layer
//!
//! The CLI layer is the **only** place in the codebase that:
//! - Knows about terminal I/O (stdout, stderr)
//! - Handles argument parsing
//! - Formats output for human consumption
//! - Keeps a login session between invocations
//!
//! ## Responsibilities
//!
//! 1. **Argument Parsing**: shell arguments become typed [`Commands`] via clap
//! 2. **Backend Setup**: [`initialize`] picks the JSON file store or SQLite
//! 3. **Dispatch**: tracking commands run against any `ActivityStore +
//!    WeightStore`; account commands need the SQLite store and a session
//! 4. **Output Formatting**: listings and messages via `render`
//!
//! ## Structure
//!
//! - `run()`: Main dispatch logic (called by `main.rs`)
//! - `handle_*()`: Per-command handlers that call the store and print

use super::render::{
    print_activities, print_feed, print_friends, print_goal, print_info, print_stats,
    print_success, print_types, print_user, print_weights,
};
use super::session::{self, Session};
use super::setup::{ActivityArgs, ActivityChanges, Cli, Commands, FriendCommands, WeightCommands};
use anyhow::{anyhow, bail, Context, Result};
use chrono::{NaiveDateTime, Timelike};
use clap::Parser;
use fittrackapp::catalog::{estimate_calories, format_duration};
use fittrackapp::db::SqlStore;
use fittrackapp::error::{ErrorKind, FitError};
use fittrackapp::init::{initialize, Backend};
use fittrackapp::model::{
    parse_datetime, Intensity, NewActivity, NewWeightEntry, PreferenceUpdate, User,
};
use fittrackapp::period::{self, Period};
use fittrackapp::store::{ActivityQuery, ActivityStore, WeightStore};
use std::io::{BufRead, IsTerminal};
use std::path::Path;
use std::str::FromStr;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Tokens older than this are purged whenever someone logs in.
const REMEMBER_TOKEN_MAX_AGE_DAYS: i64 = 30;

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let command = cli.command.unwrap_or(Commands::List {
        period: "week".to_string(),
        limit: None,
        ids: false,
    });

    // Needs no storage at all.
    if let Commands::Types = command {
        print_types();
        return Ok(());
    }

    let ctx = initialize(cli.data_dir, cli.database_url)?;
    match ctx.backend {
        Backend::File(mut store) => handle_tracking(&mut store, command),
        Backend::Relational(db) => handle_relational(&db, &ctx.data_dir, command),
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("fittrack=debug,fittrackapp=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

/// Commands available on every backend.
fn handle_tracking<S>(store: &mut S, command: Commands) -> Result<()>
where
    S: ActivityStore + WeightStore,
{
    match command {
        Commands::Add(args) => handle_add(store, args),
        Commands::Edit { id, changes } => handle_edit(store, &id, changes),
        Commands::Delete { ids } => handle_delete(store, &ids),
        Commands::List { period, limit, ids } => handle_list(store, &period, limit, ids),
        Commands::Stats { days } => handle_stats(store, days),
        Commands::Weight(cmd) => handle_weight(store, cmd),
        Commands::Goal { value, clear } => handle_goal(store, value, clear),
        Commands::Types => {
            print_types();
            Ok(())
        }
        Commands::Register { .. }
        | Commands::Login { .. }
        | Commands::Logout
        | Commands::Friend(_)
        | Commands::Prefs { .. } => bail!(
            "This command needs the database backend. Pass --database-url or set FITTRACK_DATABASE_URL."
        ),
    }
}

fn handle_relational(db: &SqlStore, data_dir: &Path, command: Commands) -> Result<()> {
    match command {
        Commands::Register {
            username,
            email,
            password,
        } => {
            let password = read_password(password)?;
            let user = db.create_user(&username, &email, &password)?;
            print_success(&format!(
                "Registered {}. Log in with `fittrack login {}`.",
                user.username, user.username
            ));
            Ok(())
        }
        Commands::Login { username, password } => handle_login(db, data_dir, &username, password),
        Commands::Logout => handle_logout(db, data_dir),
        other => {
            let user = current_user(db, data_dir)?;
            debug!(user = %user.username, "session restored");
            match other {
                Commands::Friend(cmd) => handle_friend(db, &user, cmd),
                Commands::Prefs { key, value } => handle_prefs(db, &user, key, value),
                tracking => handle_tracking(&mut db.for_user(user.id), tracking),
            }
        }
    }
}

// --- Activities ---

fn handle_add<S: ActivityStore>(store: &mut S, args: ActivityArgs) -> Result<()> {
    let intensity: Intensity = args.intensity.parse().map_err(FitError::from)?;
    let date = date_or_now(args.date.as_deref())?;

    let mut activity = NewActivity::new(args.activity_type, args.duration, intensity, date);
    activity.description = non_empty(args.description);
    activity.adaptation = non_empty(args.adaptation);

    let id = store.add_activity(&activity)?;
    debug!(%id, "activity added");

    let kcal = estimate_calories(&activity.activity_type, activity.duration, intensity);
    print_success(&format!(
        "Logged {} for {} (~{} kcal)",
        activity.activity_type,
        format_duration(activity.duration),
        kcal
    ));
    Ok(())
}

fn handle_edit<S: ActivityStore>(
    store: &mut S,
    token: &str,
    changes: ActivityChanges,
) -> Result<()> {
    if changes.is_empty() {
        bail!("Nothing to change. Pass at least one of --type, --duration, --intensity, --date, --description, --adaptation.");
    }
    let id = resolve_activity_id(store, token)?;
    let current = store
        .list_activities(ActivityQuery::all())?
        .into_iter()
        .find(|a| a.id == id)
        .ok_or_else(|| FitError::ActivityNotFound(id.to_string()))?;

    let mut update = NewActivity {
        activity_type: current.activity_type,
        duration: current.duration,
        intensity: current.intensity,
        date: current.date,
        description: current.description,
        adaptation: current.adaptation,
    };
    if let Some(activity_type) = changes.activity_type {
        update.activity_type = activity_type;
    }
    if let Some(duration) = changes.duration {
        update.duration = duration;
    }
    if let Some(intensity) = changes.intensity {
        update.intensity = intensity.parse().map_err(FitError::from)?;
    }
    if let Some(date) = changes.date {
        update.date = parse_datetime(&date).map_err(FitError::from)?;
    }
    if let Some(description) = changes.description {
        update.description = non_empty(Some(description));
    }
    if let Some(adaptation) = changes.adaptation {
        update.adaptation = non_empty(Some(adaptation));
    }

    store.update_activity(&id, &update)?;
    print_success(&format!("Updated {} ({})", update.activity_type, id));
    Ok(())
}

fn handle_delete<S: ActivityStore>(store: &mut S, tokens: &[String]) -> Result<()> {
    // Resolve everything first so indexes refer to the listing the user saw.
    let ids = tokens
        .iter()
        .map(|token| resolve_activity_id(store, token))
        .collect::<Result<Vec<_>>>()?;

    for id in &ids {
        store.delete_activity(id)?;
        debug!(%id, "activity deleted");
    }
    let noun = if ids.len() == 1 { "activity" } else { "activities" };
    print_success(&format!("Deleted {} {}", ids.len(), noun));
    Ok(())
}

fn handle_list<S: ActivityStore>(
    store: &S,
    period: &str,
    limit: Option<usize>,
    show_ids: bool,
) -> Result<()> {
    let period = Period::parse(period);
    let now = period::now();
    let mut query = ActivityQuery::for_period(period, now);
    if let Some(limit) = limit {
        query = query.with_limit(limit);
    }
    let activities = store.list_activities(query)?;
    debug!(period = %period, count = activities.len(), "listing activities");
    print_activities(&activities, now, show_ids);
    Ok(())
}

fn handle_stats<S: ActivityStore>(store: &S, days: i64) -> Result<()> {
    if days < 1 {
        bail!("--days must be at least 1");
    }
    let stats = store.activity_stats(days)?;
    print_stats(&stats, days);
    Ok(())
}

// --- Weight ---

fn handle_weight<S: WeightStore>(store: &mut S, command: WeightCommands) -> Result<()> {
    match command {
        WeightCommands::Add { weight, date } => {
            let date = date_or_now(date.as_deref())?;
            store.add_weight_entry(&NewWeightEntry::new(weight, date))?;
            print_success(&format!("Recorded {:.1} kg", weight));
        }
        WeightCommands::Edit { id, weight, date } => {
            let id = resolve_weight_id(store, &id)?;
            let current = store
                .weight_entries()?
                .into_iter()
                .find(|e| e.id == id)
                .ok_or_else(|| FitError::WeightEntryNotFound(id.to_string()))?;
            let date = match date {
                Some(date) => parse_datetime(&date).map_err(FitError::from)?,
                None => current.date,
            };
            store.update_weight_entry(&id, &NewWeightEntry::new(weight, date))?;
            print_success(&format!(
                "Changed {:.1} kg to {:.1} kg",
                current.weight, weight
            ));
        }
        WeightCommands::Delete { id } => {
            let id = resolve_weight_id(store, &id)?;
            store.delete_weight_entry(&id)?;
            print_success("Deleted weight entry");
        }
        WeightCommands::List { ids } => {
            let entries = store.weight_entries()?;
            let goal = store.weight_goal()?;
            print_weights(&entries, goal, ids);
        }
    }
    Ok(())
}

fn handle_goal<S: WeightStore>(store: &mut S, value: Option<f64>, clear: bool) -> Result<()> {
    if clear {
        store.set_weight_goal(None)?;
        print_success("Weight goal cleared");
    } else if let Some(goal) = value {
        store.set_weight_goal(Some(goal))?;
        print_success(&format!("Weight goal set to {:.1} kg", goal));
    } else {
        let latest = store.weight_entries()?.last().map(|e| e.weight);
        print_goal(store.weight_goal()?, latest);
    }
    Ok(())
}

// --- Accounts ---

fn handle_login(
    db: &SqlStore,
    data_dir: &Path,
    username: &str,
    password: Option<String>,
) -> Result<()> {
    let password = read_password(password)?;
    let user = db.authenticate_user(username, &password)?;

    let purged = db.cleanup_old_tokens(REMEMBER_TOKEN_MAX_AGE_DAYS)?;
    debug!(purged, "expired remember tokens cleared");

    let token = db
        .set_remember_token(user.id, true)?
        .ok_or_else(|| anyhow!("no remember token was issued"))?;
    session::save(
        data_dir,
        &Session {
            username: user.username.clone(),
            token,
        },
    )?;
    print_success(&format!("Logged in as {}", user.username));
    Ok(())
}

fn handle_logout(db: &SqlStore, data_dir: &Path) -> Result<()> {
    if let Some(session) = session::load(data_dir) {
        if let Ok(user) = db.authenticate_by_token(&session.username, &session.token) {
            db.set_remember_token(user.id, false)?;
        }
    }
    if session::clear(data_dir)? {
        print_success("Logged out");
    } else {
        print_info("Not logged in");
    }
    Ok(())
}

fn current_user(db: &SqlStore, data_dir: &Path) -> Result<User> {
    let session = session::load(data_dir)
        .ok_or_else(|| anyhow!("Not logged in. Run `fittrack login <username>` first."))?;
    db.authenticate_by_token(&session.username, &session.token)
        .map_err(|e| match e.kind() {
            ErrorKind::Authentication => anyhow!(
                "Session expired. Run `fittrack login {}` again.",
                session.username
            ),
            _ => e.into(),
        })
}

fn handle_friend(db: &SqlStore, user: &User, command: FriendCommands) -> Result<()> {
    match command {
        FriendCommands::Add { username } => {
            let friend = db.add_friend(user.id, &username)?;
            print_success(&format!("You and {} are now friends", friend.username));
        }
        FriendCommands::List => print_friends(&db.get_user_friends(user.id)?),
        FriendCommands::Feed { limit } => {
            let feed = db.get_friends_recent_activities(user.id, limit)?;
            print_feed(&feed, period::now());
        }
    }
    Ok(())
}

fn handle_prefs(
    db: &SqlStore,
    user: &User,
    key: Option<String>,
    value: Option<String>,
) -> Result<()> {
    match (key, value) {
        (Some(key), Some(value)) => {
            let update = PreferenceUpdate::parse(&key, &value).map_err(FitError::from)?;
            let updated = db.update_user_preferences(user.id, &[update])?;
            print_user(&updated);
        }
        _ => print_user(user),
    }
    Ok(())
}

// --- Argument helpers ---

/// How a command line token names a record.
#[derive(Debug, PartialEq)]
enum Target<Id> {
    /// 1-based row of the listing.
    Index(usize),
    Id(Id),
}

/// Plain digits are a listing index; `#` forces a storage id; anything else
/// (a UUID, say) is tried as a storage id.
fn parse_target<Id: FromStr>(token: &str) -> Result<Target<Id>> {
    let token = token.trim();
    if let Some(raw) = token.strip_prefix('#') {
        return raw
            .parse()
            .map(Target::Id)
            .map_err(|_| anyhow!("Invalid id: {}", raw));
    }
    if !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit()) {
        let index: usize = token
            .parse()
            .with_context(|| format!("Invalid index: {}", token))?;
        if index == 0 {
            bail!("Indexes start at 1");
        }
        return Ok(Target::Index(index));
    }
    token
        .parse()
        .map(Target::Id)
        .map_err(|_| anyhow!("Invalid id or index: {}", token))
}

fn resolve_activity_id<S: ActivityStore>(store: &S, token: &str) -> Result<S::ActivityId> {
    match parse_target(token)? {
        Target::Id(id) => Ok(id),
        Target::Index(n) => store
            .recent_activities(n)?
            .into_iter()
            .nth(n - 1)
            .map(|a| a.id)
            .ok_or_else(|| anyhow!("No activity at index {}", n)),
    }
}

fn resolve_weight_id<S: WeightStore>(store: &S, token: &str) -> Result<S::EntryId> {
    match parse_target(token)? {
        Target::Id(id) => Ok(id),
        Target::Index(n) => store
            .weight_entries()?
            .into_iter()
            .nth(n - 1)
            .map(|e| e.id)
            .ok_or_else(|| anyhow!("No weight entry at index {}", n)),
    }
}

fn date_or_now(input: Option<&str>) -> Result<NaiveDateTime> {
    match input {
        Some(raw) => Ok(parse_datetime(raw).map_err(FitError::from)?),
        None => {
            let now = period::now();
            Ok(now.with_nanosecond(0).unwrap_or(now))
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn read_password(given: Option<String>) -> Result<String> {
    if let Some(password) = given {
        return Ok(password);
    }
    let stdin = std::io::stdin();
    if stdin.is_terminal() {
        eprint!("Password: ");
    }
    let mut line = String::new();
    stdin
        .lock()
        .read_line(&mut line)
        .context("reading password from stdin")?;
    let password = line.trim_end_matches(&['\r', '\n'][..]).to_string();
    if password.is_empty() {
        bail!("No password given");
    }
    Ok(password)
}
