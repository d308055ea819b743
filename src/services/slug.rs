//! Slug assignment
//!
//! One shared utility derives URL-safe identifiers for every sluggable entity
//! (City, Category, Tag, Advertisement). Uniqueness is checked against the
//! entity's own collection through the `SlugLookup` trait implemented by each
//! repository, so no entity can end up with a divergent collision policy.
//!
//! Cyrillic input is transliterated so that listings titled in Russian still
//! get readable Latin slugs ("Велосипед" -> "velosiped").

use anyhow::Result;
use async_trait::async_trait;

/// Uniqueness scope for slug assignment.
///
/// Implemented by each repository; `exclude_id` lets a record re-save under
/// its own slug without tripping the collision check.
#[async_trait]
pub trait SlugLookup: Send + Sync {
    /// Whether any other record in this collection already holds `slug`.
    async fn slug_exists(&self, slug: &str, exclude_id: Option<i64>) -> Result<bool>;
}

/// Derive a URL-safe, lowercase, hyphenated slug from a display name.
///
/// Cyrillic letters are transliterated, ASCII alphanumerics pass through,
/// everything else becomes a hyphen; runs of hyphens collapse and the ends
/// are trimmed.
pub fn slugify(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut prev_hyphen = true; // suppresses a leading hyphen

    for c in name.to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            result.push(c);
            prev_hyphen = false;
        } else if let Some(tr) = transliterate(c) {
            if !tr.is_empty() {
                result.push_str(tr);
                prev_hyphen = false;
            }
        } else if !prev_hyphen {
            result.push('-');
            prev_hyphen = true;
        }
    }

    result.trim_end_matches('-').to_string()
}

/// Transliterate a single lowercase Cyrillic character.
///
/// Returns `None` for characters outside the table (they map to a hyphen),
/// and `Some("")` for signs that vanish entirely.
fn transliterate(c: char) -> Option<&'static str> {
    let tr = match c {
        'а' => "a",
        'б' => "b",
        'в' => "v",
        'г' => "g",
        'д' => "d",
        'е' => "e",
        'ё' => "e",
        'ж' => "zh",
        'з' => "z",
        'и' => "i",
        'й' => "y",
        'к' => "k",
        'л' => "l",
        'м' => "m",
        'н' => "n",
        'о' => "o",
        'п' => "p",
        'р' => "r",
        'с' => "s",
        'т' => "t",
        'у' => "u",
        'ф' => "f",
        'х' => "kh",
        'ц' => "ts",
        'ч' => "ch",
        'ш' => "sh",
        'щ' => "shch",
        'ъ' => "",
        'ы' => "y",
        'ь' => "",
        'э' => "e",
        'ю' => "yu",
        'я' => "ya",
        _ => return None,
    };
    Some(tr)
}

/// Derive a slug from `name` that is unique within the lookup's collection.
///
/// If the base slug is taken by another record, `-1`, `-2`, ... is appended
/// until a free candidate is found. Passing the record's own id in
/// `exclude_id` makes re-saves idempotent.
pub async fn assign_unique_slug(
    lookup: &dyn SlugLookup,
    name: &str,
    exclude_id: Option<i64>,
) -> Result<String> {
    let base = slugify(name);

    if !lookup.slug_exists(&base, exclude_id).await? {
        return Ok(base);
    }

    let mut suffix = 1u32;
    loop {
        let candidate = format!("{}-{}", base, suffix);
        if !lookup.slug_exists(&candidate, exclude_id).await? {
            return Ok(candidate);
        }
        suffix += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// In-memory lookup for exercising the uniqueness loop
    struct SetLookup {
        taken: Mutex<HashSet<String>>,
    }

    impl SetLookup {
        fn new(slugs: &[&str]) -> Self {
            Self {
                taken: Mutex::new(slugs.iter().map(|s| s.to_string()).collect()),
            }
        }
    }

    #[async_trait]
    impl SlugLookup for SetLookup {
        async fn slug_exists(&self, slug: &str, _exclude_id: Option<i64>) -> Result<bool> {
            Ok(self.taken.lock().unwrap().contains(slug))
        }
    }

    #[test]
    fn test_slugify_simple() {
        assert_eq!(slugify("Hello World"), "hello-world");
    }

    #[test]
    fn test_slugify_special_chars() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
        assert_eq!(slugify("  spaced   out  "), "spaced-out");
    }

    #[test]
    fn test_slugify_cyrillic() {
        assert_eq!(slugify("Велосипед"), "velosiped");
        assert_eq!(slugify("Стол"), "stol");
        assert_eq!(slugify("Объявление"), "obyavlenie");
        assert_eq!(slugify("Щука и ёрш"), "shchuka-i-ersh");
    }

    #[test]
    fn test_slugify_mixed() {
        assert_eq!(slugify("iPhone 13 Новый"), "iphone-13-novyy");
    }

    #[test]
    fn test_slugify_empty() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("!!!"), "");
    }

    #[tokio::test]
    async fn test_assign_unique_slug_no_collision() {
        let lookup = SetLookup::new(&[]);
        let slug = assign_unique_slug(&lookup, "Велосипед", None).await.unwrap();
        assert_eq!(slug, "velosiped");
    }

    #[tokio::test]
    async fn test_assign_unique_slug_suffixes_until_free() {
        let lookup = SetLookup::new(&["velosiped", "velosiped-1", "velosiped-2"]);
        let slug = assign_unique_slug(&lookup, "Велосипед", None).await.unwrap();
        assert_eq!(slug, "velosiped-3");
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Any input yields only lowercase ASCII alphanumerics and single
            /// interior hyphens, with no hyphen at either end.
            #[test]
            fn slugify_output_is_url_safe(input in "\\PC{0,60}") {
                let slug = slugify(&input);
                prop_assert!(slug
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
                prop_assert!(!slug.starts_with('-'));
                prop_assert!(!slug.ends_with('-'));
                prop_assert!(!slug.contains("--"));
            }

            /// Slugifying is idempotent: a slug slugifies to itself.
            #[test]
            fn slugify_is_idempotent(input in "[a-zA-Zа-яА-Я0-9 ]{0,40}") {
                let once = slugify(&input);
                prop_assert_eq!(slugify(&once), once.clone());
            }
        }
    }
}
