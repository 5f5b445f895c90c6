//! Built-in episode dataset and category colors

use std::collections::BTreeMap;

use crate::config::Episode;

fn episode(id: &str, title: &str, media: &str, theta: f32, phi: f32, themes: &[&str]) -> Episode {
    Episode {
        id: id.to_string(),
        title: title.to_string(),
        media_ref: format!("https://open.spotify.com/embed/episode/{}", media),
        theta,
        phi,
        themes: themes.iter().map(|t| t.to_string()).collect(),
    }
}

/// The episodes shipped with the binary
pub fn builtin_episodes() -> Vec<Episode> {
    vec![
        episode("episode-001", "The Future of Artificial Intelligence", "5XbBJJVI9Y4ZXWkzbT2ybN", 0.0, 90.0, &["technology", "science"]),
        episode("episode-002", "Understanding Human Psychology", "0Q86acNRm4y9BFLm7SqLXD", 72.0, 75.0, &["health", "science"]),
        episode("episode-003", "The Rise of Remote Work Culture", "3J3nDqjZgxzP5YqbLqnqbB", 144.0, 105.0, &["business", "culture"]),
        episode("episode-004", "Neuroscience and Decision Making", "7makf9oM1KMM7zBfRHGFVH", 216.0, 60.0, &["science", "health"]),
        episode("episode-005", "Building Sustainable Tech Companies", "2tIwlZEoEqXqNQaIkjYPAC", 288.0, 120.0, &["technology", "business"]),
        episode("episode-006", "The Science of Habit Formation", "4iUuGE1eWFHJR9vYP1fLwh", 45.0, 45.0, &["health", "science"]),
        episode("episode-007", "Cultural Shifts in the Digital Age", "1hB4ELq5f1T5Cg4Pg2WqOr", 180.0, 90.0, &["culture", "technology"]),
        episode("episode-008", "Innovation in Healthcare Technology", "6MD5H6LD5sVV2iq0uxKXOQ", 315.0, 135.0, &["health", "technology"]),
    ]
}

/// Theme tag -> `#rrggbb`
pub fn builtin_categories() -> BTreeMap<String, String> {
    [
        ("technology", "#00ffff"),
        ("science", "#ff00ff"),
        ("health", "#00ff00"),
        ("culture", "#ffff00"),
        ("business", "#ff8800"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_builtin_theme_has_a_color() {
        let categories = builtin_categories();
        for episode in builtin_episodes() {
            for theme in &episode.themes {
                assert!(categories.contains_key(theme), "{} has no color", theme);
            }
        }
    }

    #[test]
    fn test_builtin_angles_in_range() {
        for episode in builtin_episodes() {
            assert!((0.0..360.0).contains(&episode.theta));
            assert!((0.0..=180.0).contains(&episode.phi));
        }
    }
}
