/// Genres suggested when a mood is unknown.
pub const DEFAULT_GENRES: &[&str] = &["Action", "Adventure", "Comedy"];

/// Map a mood to the genre names used for discovery. Unknown moods
/// fall back to a broad default rather than failing the request.
pub fn genres_for_mood(mood: &str) -> &'static [&'static str] {
    match mood.trim().to_lowercase().as_str() {
        "happy" => &["Comedy", "Adventure", "Family"],
        "sad" => &["Drama", "Romance"],
        "excited" => &["Action", "Science Fiction", "Adventure"],
        "relaxed" => &["Animation", "Family", "Fantasy"],
        "scared" => &["Horror", "Thriller", "Mystery"],
        "thoughtful" => &["Documentary", "History", "Drama"],
        "romantic" => &["Romance", "Drama"],
        _ => DEFAULT_GENRES,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_moods() {
        assert_eq!(genres_for_mood("happy"), &["Comedy", "Adventure", "Family"]);
        assert_eq!(genres_for_mood("scared"), &["Horror", "Thriller", "Mystery"]);
        assert_eq!(genres_for_mood("romantic"), &["Romance", "Drama"]);
    }

    #[test]
    fn test_mood_is_case_insensitive() {
        assert_eq!(genres_for_mood("Happy"), genres_for_mood("happy"));
        assert_eq!(genres_for_mood("  SAD "), genres_for_mood("sad"));
    }

    #[test]
    fn test_unknown_mood_falls_back_to_default() {
        assert_eq!(genres_for_mood("hangry"), DEFAULT_GENRES);
        assert_eq!(genres_for_mood(""), DEFAULT_GENRES);
    }
}
