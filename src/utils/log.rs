// src/utils/log.rs

//! Console banners on top of the `log` facade.
//!
//! Everything goes through `log::info!` so `env_logger` filtering and
//! timestamps apply uniformly.

/// Width of separator and header rules.
const RULE_WIDTH: usize = 60;

/// Log a header
pub fn header(title: &str) {
    let border = "═".repeat(RULE_WIDTH);
    log::info!("{border}");
    log::info!("  {title}");
    log::info!("{border}");
}

/// Log a step in a process
pub fn step(step_num: usize, total: usize, message: &str) {
    log::info!("[STEP {step_num}/{total}] {message}");
}

/// Log a separator line
pub fn separator() {
    log::info!("{}", "─".repeat(RULE_WIDTH));
}

/// Log a sub-item (indented)
pub fn sub_item(message: &str) {
    log::info!("    {message}");
}

/// Log a summary section
pub fn summary(title: &str, items: &[(&str, String)]) {
    log::info!("[SUMMARY] {title}");
    for (key, value) in items {
        log::info!("    {key}: {value}");
    }
}

/// Format a unit position as `i/total - pct%`.
pub fn progress_label(position: usize, total: usize) -> String {
    let pct = if total == 0 {
        0.0
    } else {
        position as f64 / total as f64 * 100.0
    };
    format!("{position}/{total} - {pct:.1}%")
}
