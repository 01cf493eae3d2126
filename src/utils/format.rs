//! Format - Text Rendering for the Terminal Front End

use crate::domain::Ladder;
use crate::state::{RowDisplay, RowPhase};

const NAME_WIDTH: usize = 24;

/// Truncate a string to `max_len` characters with ellipsis
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{head}...")
    }
}

/// Format a number with thousand separators
pub fn format_number(n: u64) -> String {
    let digits = n.to_string();
    let len = digits.len();
    let mut result = String::with_capacity(len + len / 3);

    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result
}

/// Rank label, e.g. `#1,204`
pub fn format_rank(rank: u64) -> String {
    format!("#{}", format_number(rank))
}

/// One list row: highlight mark, rank, name, challenge counts
pub fn format_row(row: &RowDisplay) -> String {
    let mark = if row.highlighted { '>' } else { ' ' };
    let name = match (&row.username, row.phase) {
        (Some(name), _) => truncate(name, NAME_WIDTH),
        (None, RowPhase::Loading) => "loading...".to_string(),
        (None, _) => String::new(),
    };

    let mut line = format!(
        "{mark} {:>8}  {name:<width$}",
        format_rank(row.rank),
        width = NAME_WIDTH
    );
    if row.username.is_some() {
        line.push_str(&format!("  out {:>2}  in {:>2}", row.outgoing, row.incoming));
        if !row.challengeable {
            line.push_str("  (no challenge)");
        }
    }
    line.trim_end().to_string()
}

/// Ladder header lines
pub fn format_header(ladder: &Ladder) -> Vec<String> {
    let mut lines = vec![format!(
        "{} ({} players)",
        ladder.name,
        format_number(ladder.size as u64)
    )];
    if let Some(url) = ladder.group_url() {
        lines.push(format!("Group: {url}"));
    }
    lines.push(format!(
        "Rules: {}  Handicap: {}",
        ladder.rules_text(),
        ladder.handicap_text()
    ));
    match ladder.own_rank() {
        Some(rank) => lines.push(format!("Your rank: {}", format_rank(rank))),
        None => lines.push("You are not on this ladder".to_string()),
    }
    lines
}
