//! Case-insensitive substring search shared by the list screens.

/// Returns true when `term` is blank or any field contains it, ignoring case.
#[must_use]
pub fn matches_any<'a, I>(term: &str, fields: I) -> bool
where
    I: IntoIterator<Item = &'a str>,
{
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    fields
        .into_iter()
        .any(|field| field.to_lowercase().contains(&needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_term_matches_everything() {
        assert!(matches_any("", ["anything"]));
        assert!(matches_any("   ", std::iter::empty()));
    }

    #[test]
    fn test_case_insensitive_substring() {
        assert!(matches_any("KUMAR", ["Rajesh Kumar", "9876543210"]));
        assert!(matches_any("9876", ["Rajesh Kumar", "9876543210"]));
        assert!(!matches_any("patel", ["Rajesh Kumar", "9876543210"]));
    }
}
