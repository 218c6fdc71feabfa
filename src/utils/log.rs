// src/utils/log.rs

//! Stage banners and progress lines on top of the `log` facade.
//!
//! Output goes wherever the binary pointed the logger (`env_logger` for the
//! CLI). The line builders are public so the layout can be tested without a
//! logger installed.

const RULE_WIDTH: usize = 60;

/// Lines of a boxed header.
pub fn header_lines(title: &str) -> [String; 3] {
    let border = "═".repeat(RULE_WIDTH);
    [border.clone(), format!("  {title}"), border]
}

pub fn step_line(step: usize, total: usize, message: &str) -> String {
    format!("[STEP {step}/{total}] {message}")
}

pub fn summary_lines(title: &str, items: &[(&str, String)]) -> Vec<String> {
    std::iter::once(format!("[SUMMARY] {title}"))
        .chain(items.iter().map(|(key, value)| format!("    {key}: {value}")))
        .collect()
}

/// Log an info message
pub fn info(message: &str) {
    ::log::info!("{message}");
}

/// Log a warning message
pub fn warn(message: &str) {
    ::log::warn!("{message}");
}

/// Log an error message
pub fn error(message: &str) {
    ::log::error!("{message}");
}

/// Log a success message
pub fn success(message: &str) {
    ::log::info!("✓ {message}");
}

/// Log an indented failure line
pub fn failure(message: &str) {
    ::log::error!("    ✗ {message}");
}

/// Log a step in a process
pub fn step(step: usize, total: usize, message: &str) {
    ::log::info!("{}", step_line(step, total, message));
}

/// Log a header
pub fn header(title: &str) {
    for line in header_lines(title) {
        ::log::info!("{line}");
    }
}

/// Log a sub-item (indented)
pub fn sub_item(message: &str) {
    ::log::info!("    {message}");
}

/// Log a summary section
pub fn summary(title: &str, items: &[(&str, String)]) {
    for line in summary_lines(title, items) {
        ::log::info!("{line}");
    }
}
