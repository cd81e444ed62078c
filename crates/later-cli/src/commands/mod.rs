//! Command handlers

pub mod backup;
pub mod bookmark;
pub mod config;
pub mod group;
pub mod search;
pub mod settings;
pub mod tag;
pub mod transfer;

use std::io::{self, Write};

use anyhow::Result;

/// Ask for confirmation (returns false if not interactive)
pub fn confirm(prompt: &str) -> Result<bool> {
    // Check if stdin is a TTY
    if !atty::is(atty::Stream::Stdin) {
        return Ok(false);
    }

    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    let input = input.trim().to_lowercase();
    Ok(input == "y" || input == "yes")
}

/// Split a comma-separated list, dropping blanks
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_list() {
        assert_eq!(split_list("rust, web ,,docs"), vec!["rust", "web", "docs"]);
        assert!(split_list(" , ").is_empty());
    }
}
