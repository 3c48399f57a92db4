use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "fittrack", bin_name = "fittrack", version)]
#[command(about = "Log workouts and body weight from the terminal", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Directory holding the JSON data files and the login session
    #[arg(long, global = true, value_name = "DIR", help_heading = "Options")]
    pub data_dir: Option<PathBuf>,

    /// Use the SQLite store at this URL (sqlite://<path> or sqlite::memory:)
    #[arg(long, global = true, value_name = "URL", help_heading = "Options")]
    pub database_url: Option<String>,

    /// Verbose output (debug logging on stderr)
    #[arg(short, long, global = true, help_heading = "Options")]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log an activity
    #[command(display_order = 1)]
    Add(ActivityArgs),

    /// Change an activity (index from `list`, or #<id>)
    #[command(alias = "e", display_order = 2)]
    Edit {
        id: String,

        #[command(flatten)]
        changes: ActivityChanges,
    },

    /// Delete one or more activities
    #[command(alias = "rm", display_order = 3)]
    Delete {
        #[arg(required = true, num_args = 1..)]
        ids: Vec<String>,
    },

    /// List activities, newest first
    #[command(alias = "ls", display_order = 4)]
    List {
        /// week, month, season or all
        #[arg(short, long, default_value = "all")]
        period: String,

        /// Show at most this many
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        /// Show storage ids
        #[arg(long)]
        ids: bool,
    },

    /// Count, total and average duration over recent days
    #[command(display_order = 5)]
    Stats {
        #[arg(short, long, default_value_t = 30)]
        days: i64,
    },

    /// Known activity types and their calorie rates
    #[command(display_order = 6)]
    Types,

    /// Body-weight entries
    #[command(subcommand, display_order = 10)]
    Weight(WeightCommands),

    /// Show, set or clear the weight goal
    #[command(display_order = 11)]
    Goal {
        /// Target weight in kg
        value: Option<f64>,

        #[arg(long, conflicts_with = "value")]
        clear: bool,
    },

    /// Create an account (database only)
    #[command(display_order = 20)]
    Register {
        username: String,
        email: String,

        /// Read from stdin when omitted
        #[arg(long)]
        password: Option<String>,
    },

    /// Log in and remember the session (database only)
    #[command(display_order = 21)]
    Login {
        username: String,

        /// Read from stdin when omitted
        #[arg(long)]
        password: Option<String>,
    },

    /// Forget the session (database only)
    #[command(display_order = 22)]
    Logout,

    /// Friends and their activity (database only)
    #[command(subcommand, display_order = 23)]
    Friend(FriendCommands),

    /// Show preferences, or set one (database only)
    #[command(display_order = 24)]
    Prefs {
        /// preferred_language, dark_mode or weight_goal
        #[arg(requires = "value")]
        key: Option<String>,
        value: Option<String>,
    },
}

#[derive(Args, Debug)]
pub struct ActivityArgs {
    /// Activity type, e.g. Running (see `fittrack types`)
    #[arg(value_name = "TYPE")]
    pub activity_type: String,

    /// Minutes
    pub duration: i64,

    /// Low, Medium or High
    #[arg(short, long, default_value = "Medium")]
    pub intensity: String,

    /// When it happened (YYYY-MM-DD[ HH:MM[:SS]]); defaults to now
    #[arg(long)]
    pub date: Option<String>,

    #[arg(short, long)]
    pub description: Option<String>,

    /// Main training goal, e.g. Endurance
    #[arg(short, long)]
    pub adaptation: Option<String>,
}

#[derive(Args, Debug, Default)]
pub struct ActivityChanges {
    #[arg(long = "type", value_name = "TYPE")]
    pub activity_type: Option<String>,

    #[arg(long)]
    pub duration: Option<i64>,

    #[arg(short, long)]
    pub intensity: Option<String>,

    #[arg(long)]
    pub date: Option<String>,

    /// Empty string clears it
    #[arg(short, long)]
    pub description: Option<String>,

    /// Empty string clears it
    #[arg(short, long)]
    pub adaptation: Option<String>,
}

impl ActivityChanges {
    pub fn is_empty(&self) -> bool {
        self.activity_type.is_none()
            && self.duration.is_none()
            && self.intensity.is_none()
            && self.date.is_none()
            && self.description.is_none()
            && self.adaptation.is_none()
    }
}

#[derive(Subcommand, Debug)]
pub enum WeightCommands {
    /// Record a weigh-in
    Add {
        /// Kilograms
        weight: f64,

        #[arg(long)]
        date: Option<String>,
    },

    /// Correct a weigh-in (index from `weight list`, or #<id>)
    Edit {
        id: String,
        weight: f64,

        /// Keeps the current date when omitted
        #[arg(long)]
        date: Option<String>,
    },

    /// Delete a weigh-in
    #[command(alias = "rm")]
    Delete { id: String },

    /// List weigh-ins, oldest first
    #[command(alias = "ls")]
    List {
        #[arg(long)]
        ids: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum FriendCommands {
    /// Befriend another user
    Add { username: String },

    /// List your friends
    #[command(alias = "ls")]
    List,

    /// Your friends' latest activities
    Feed {
        #[arg(short = 'n', long, default_value_t = 10)]
        limit: usize,
    },
}
