use chrono::NaiveDateTime;
use colored::Colorize;
use fittrackapp::catalog::{self, ACTIVITY_TYPES};
use fittrackapp::model::{Activity, ActivityStats, FriendActivity, User, WeightEntry};
use std::fmt::Display;
use timeago::Formatter;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const LINE_WIDTH: usize = 100;
const TIME_WIDTH: usize = 14;
const TYPE_WIDTH: usize = 20;
const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

pub(super) fn print_success(message: &str) {
    println!("{}", message.green());
}

pub(super) fn print_info(message: &str) {
    println!("{}", message.dimmed());
}

/// One listing row: index, type, duration, intensity, calories, notes, age.
pub(super) fn format_activity_line<Id: Display>(
    index: usize,
    activity: &Activity<Id>,
    now: NaiveDateTime,
    show_id: bool,
) -> String {
    let idx = format!("{:>3}. ", index);
    let kind = pad_to_width(
        &truncate_to_width(&activity.activity_type, TYPE_WIDTH),
        TYPE_WIDTH,
    );
    let duration = format!("{:>7}", catalog::format_duration(activity.duration));
    let kcal = catalog::estimate_calories(
        &activity.activity_type,
        activity.duration,
        activity.intensity,
    );
    let stats = format!(" {:<6} {:>5} kcal  ", activity.intensity.as_str(), kcal);

    let mut notes = activity.description.clone().unwrap_or_default();
    if let Some(adaptation) = &activity.adaptation {
        if !notes.is_empty() {
            notes.push(' ');
        }
        notes.push_str(&format!("[{}]", adaptation));
    }
    if show_id {
        notes = format!("#{} {}", activity.id, notes);
    }

    let fixed = idx.width() + kind.width() + duration.width() + stats.width() + TIME_WIDTH;
    let available = LINE_WIDTH.saturating_sub(fixed);
    let notes = truncate_to_width(notes.trim_end(), available);
    let padding = available.saturating_sub(notes.width());

    format!(
        "{}{}{}{}{}{}{}",
        idx.yellow(),
        kind.bold(),
        duration,
        stats,
        notes.dimmed(),
        " ".repeat(padding),
        format_time_ago(activity.date, now).dimmed()
    )
}

pub(super) fn print_activities<Id: Display>(
    activities: &[Activity<Id>],
    now: NaiveDateTime,
    show_ids: bool,
) {
    if activities.is_empty() {
        println!("No activities found.");
        return;
    }
    for (i, activity) in activities.iter().enumerate() {
        println!("{}", format_activity_line(i + 1, activity, now, show_ids));
    }
}

pub(super) fn print_stats(stats: &ActivityStats, days: i64) {
    println!("{}", format!("Last {} days", days).bold());
    println!("  Activities:  {}", stats.total_activities);
    println!(
        "  Total time:  {}",
        catalog::format_duration(stats.total_duration)
    );
    println!("  Average:     {:.1} min", stats.avg_duration);
}

/// Weigh-ins oldest first, with the change against the previous entry.
pub(super) fn format_weight_lines<Id: Display>(
    entries: &[WeightEntry<Id>],
    show_ids: bool,
) -> Vec<String> {
    let mut previous: Option<f64> = None;
    entries
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let delta = match previous {
                Some(prev) => {
                    let diff = entry.weight - prev;
                    let text = format!("{:+.1}", diff);
                    if diff > 0.0 {
                        text.red().to_string()
                    } else if diff < 0.0 {
                        text.green().to_string()
                    } else {
                        text.dimmed().to_string()
                    }
                }
                None => String::new(),
            };
            previous = Some(entry.weight);
            let id = if show_ids {
                format!("  #{}", entry.id)
            } else {
                String::new()
            };
            format!(
                "{}{}  {:>6.1} kg  {}{}",
                format!("{:>3}. ", i + 1).yellow(),
                entry.date.format(DATE_FORMAT),
                entry.weight,
                delta,
                id.dimmed()
            )
        })
        .collect()
}

pub(super) fn print_weights<Id: Display>(
    entries: &[WeightEntry<Id>],
    goal: Option<f64>,
    show_ids: bool,
) {
    if entries.is_empty() {
        println!("No weight entries found.");
    }
    for line in format_weight_lines(entries, show_ids) {
        println!("{}", line);
    }
    if let Some(goal) = goal {
        print_goal(Some(goal), entries.last().map(|e| e.weight));
    }
}

pub(super) fn print_goal(goal: Option<f64>, latest: Option<f64>) {
    match (goal, latest) {
        (None, _) => println!("No weight goal set."),
        (Some(goal), None) => println!("Goal: {:.1} kg", goal),
        (Some(goal), Some(latest)) => println!(
            "Goal: {:.1} kg ({} to go)",
            goal,
            format!("{:.1} kg", (latest - goal).abs()).bold()
        ),
    }
}

pub(super) fn print_types() {
    for (name, kcal) in ACTIVITY_TYPES {
        println!("{} {:>3} kcal/min", pad_to_width(name, TYPE_WIDTH), kcal);
    }
}

pub(super) fn print_friends(friends: &[User]) {
    if friends.is_empty() {
        println!("No friends yet.");
        return;
    }
    for friend in friends {
        println!("  {}  {}", friend.username.bold(), friend.email.dimmed());
    }
}

pub(super) fn print_feed(feed: &[FriendActivity], now: NaiveDateTime) {
    if feed.is_empty() {
        println!("No recent activity from friends.");
        return;
    }
    for item in feed {
        let a = &item.activity;
        println!(
            "{} {} {:>7} {:<6} {}",
            pad_to_width(&truncate_to_width(&item.username, 16), 16).cyan(),
            pad_to_width(&truncate_to_width(&a.activity_type, TYPE_WIDTH), TYPE_WIDTH),
            catalog::format_duration(a.duration),
            a.intensity.as_str(),
            format_time_ago(a.date, now).trim_start().dimmed()
        );
    }
}

pub(super) fn print_user(user: &User) {
    println!("{}", user.username.bold());
    println!("  email:               {}", user.email);
    println!("  preferred_language:  {}", user.preferred_language);
    println!("  dark_mode:           {}", user.dark_mode);
    match user.weight_goal {
        Some(goal) => println!("  weight_goal:         {:.1}", goal),
        None => println!("  weight_goal:         -"),
    }
    println!(
        "  member since:        {}",
        user.created_at.format("%Y-%m-%d")
    );
}

fn pad_to_width(s: &str, width: usize) -> String {
    let pad = width.saturating_sub(s.width());
    format!("{}{}", s, " ".repeat(pad))
}

fn truncate_to_width(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }
    let mut result = String::new();
    let mut current_width = 0;

    for c in s.chars() {
        let char_width = c.width().unwrap_or(0);
        if current_width + char_width > max_width.saturating_sub(1) {
            result.push('…');
            return result;
        }
        result.push(c);
        current_width += char_width;
    }

    result
}

/// Relative age, right-aligned to a fixed column. Future dates read "now".
fn format_time_ago(date: NaiveDateTime, now: NaiveDateTime) -> String {
    let duration = now.signed_duration_since(date);

    let formatter = Formatter::new();
    let time_str = formatter.convert(duration.to_std().unwrap_or_default());

    format!("{:>width$}", time_str, width = TIME_WIDTH)
}
