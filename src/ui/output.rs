use crate::output::is_quiet;
use crate::task::TaskStatus;
use crate::ui::{theme, Icons};
use owo_colors::OwoColorize;

/// Title line plus a dimmed subtitle. Suppressed in quiet mode.
pub fn banner(title: &str, subtitle: &str) {
    if is_quiet() {
        return;
    }
    println!("{}", title.style(theme().header.clone()));
    println!("{}", subtitle.style(theme().dim.clone()));
    println!();
}

pub fn success(label: &str) {
    println!("{} {}", Icons::CHECK, label.style(theme().success.clone()));
}

pub fn error(label: &str) {
    eprintln!("{} {}", Icons::CROSS, label.style(theme().error.clone()));
}

pub fn info(label: &str, value: &str) {
    println!(
        "{} {}: {}",
        Icons::INFO.style(theme().info.clone()),
        label.style(theme().dim.clone()),
        value
    );
}

pub fn section(title: &str) {
    if is_quiet() {
        return;
    }
    println!();
    println!("━{}━", title.style(theme().header.clone()));
}

pub fn muted(text: &str) -> String {
    text.style(theme().muted.clone()).to_string()
}

pub fn status_badge(status: TaskStatus) -> String {
    format!("[{}]", status.as_str())
        .style(theme().status(status))
        .to_string()
}

pub fn summary_row(label: &str, value: &str) {
    println!("  {} {}", label.style(theme().dim.clone()), value);
}
