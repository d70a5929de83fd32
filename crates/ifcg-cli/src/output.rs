//! Terminal output formatting.

use colored::Colorize;

use ifcg_core::CentralityRecord;

/// Print a centrality report as a table.
pub fn print_centrality_table(records: &[CentralityRecord]) {
    if records.is_empty() {
        println!("{}", "No nodes ranked.".dimmed());
        return;
    }

    println!("{:<4} {:<20} {:<32} {:>12}", "#", "ID", "Class", "Centrality");
    println!("{}", "-".repeat(71));

    for (i, record) in records.iter().enumerate() {
        let class = record.class.as_deref().unwrap_or("-");
        println!(
            "{:<4} {:<20} {:<32} {:>12}",
            (i + 1).to_string().dimmed(),
            truncate(&record.id, 20),
            truncate(class, 32).cyan(),
            format!("{:.4}", record.centrality).yellow()
        );
    }
}

/// Shorten to `max_len` characters, ending in `...`.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
