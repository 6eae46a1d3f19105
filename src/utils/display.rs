use colored::*;

pub fn print_header(text: &str) {
    println!("\n{}", text.bright_cyan().bold());
    println!("{}", "=".repeat(text.len()).bright_cyan());
}

pub fn print_success(text: &str) {
    println!("{}", text.green());
}

pub fn print_error(text: &str) {
    eprintln!("{}", text.red().bold());
}

pub fn print_info(text: &str) {
    eprintln!("{}", text.blue());
}

/// One `label: value` line of a metric summary
pub fn print_metric(label: &str, value: impl std::fmt::Display) {
    println!("  {:<24} {}", format!("{}:", label).bold(), value);
}

/// Highlighted when a fetch filled its page and totals may be short
pub fn print_truncation_warning(truncated: bool) {
    if truncated {
        println!(
            "  {}",
            "warning: a fetch returned a full page; totals may be incomplete".yellow()
        );
    }
}
