use crate::models::{LookupField, LookupKey};

/// Classifies an operator-supplied identifier.
///
/// Anything containing `@` is an alias email (lowercased); everything else is a
/// phone number reduced to its digits. Never fails: input without digits
/// yields an empty phone key, which simply matches nothing downstream.
pub fn resolve(text: &str) -> LookupKey {
    let text = text.trim();
    if text.contains('@') {
        return LookupKey::new(LookupField::AliasEmail, text.to_lowercase());
    }
    let digits: String = text.chars().filter(|c| c.is_ascii_digit()).collect();
    LookupKey::new(LookupField::Whatsapp, digits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_is_trimmed_and_lowercased() {
        assert_eq!(
            resolve("A@B.com "),
            LookupKey::new(LookupField::AliasEmail, "a@b.com")
        );
    }

    #[test]
    fn test_international_phone_keeps_digits_only() {
        assert_eq!(
            resolve("+1 (555) 123-4567"),
            LookupKey::new(LookupField::Whatsapp, "15551234567")
        );
        assert_eq!(
            resolve("00216 98.765.432"),
            LookupKey::new(LookupField::Whatsapp, "0021698765432")
        );
    }

    #[test]
    fn test_no_digits_gives_empty_phone_key() {
        assert_eq!(resolve("n/a"), LookupKey::new(LookupField::Whatsapp, ""));
        assert_eq!(resolve(""), LookupKey::new(LookupField::Whatsapp, ""));
    }

    #[test]
    fn test_non_ascii_digits_are_dropped() {
        assert_eq!(resolve("٠١٢ 34").value, "34");
    }
}
