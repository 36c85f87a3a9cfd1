mod threads;
mod timefmt;
mod types;

pub use threads::*;
pub use timefmt::*;
pub use types::*;

/// Returns the trimmed text when it contains anything beyond whitespace.
///
/// Empty or whitespace-only input is a silent no-op everywhere in the app
/// (journal save, chat send), so callers branch on `None` and do nothing.
pub fn trimmed_nonempty(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    if trimmed.is_empty() { None } else { Some(trimmed) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trimmed_nonempty_rejects_whitespace() {
        assert_eq!(trimmed_nonempty(""), None);
        assert_eq!(trimmed_nonempty("   \n\t "), None);
        assert_eq!(trimmed_nonempty("  hello "), Some("hello"));
    }
}
