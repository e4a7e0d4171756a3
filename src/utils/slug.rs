/// URL slug from free text. Characters are transliterated to ASCII first, so
/// "Café" becomes "cafe"; remaining runs of anything else collapse to one hyphen.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;
    for c in text.chars() {
        for b in deunicode::deunicode_char(c).unwrap_or("-").bytes() {
            if b.is_ascii_alphanumeric() {
                if pending_dash && !slug.is_empty() {
                    slug.push('-');
                }
                pending_dash = false;
                slug.push(b.to_ascii_lowercase() as char);
            } else {
                pending_dash = true;
            }
        }
    }
    slug
}

/// Slugs are restricted to the characters `slugify` produces.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && !slug.contains("--")
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_punctuation_and_spaces() {
        assert_eq!(slugify("Budget 2024: What's new?"), "budget-2024-what-s-new");
        assert_eq!(slugify("  --Hello   World--  "), "hello-world");
    }

    #[test]
    fn transliterates_accents() {
        assert_eq!(slugify("Café révolution à Paris"), "cafe-revolution-a-paris");
        assert_eq!(slugify("Übersee Straße"), "ubersee-strasse");
    }

    #[test]
    fn transliterates_non_latin_scripts() {
        assert_eq!(slugify("北亰"), "bei-jing");
    }

    #[test]
    fn validity() {
        assert!(is_valid_slug("malaria-vaccine-2024"));
        assert!(!is_valid_slug("Bad Slug"));
        assert!(!is_valid_slug("-edge"));
        assert!(!is_valid_slug("double--dash"));
        assert!(!is_valid_slug(""));
    }
}
