use proptest::prelude::*;
use skillsync_fs::NormalizedPath;

proptest! {
    #[test]
    fn normalization_is_idempotent(raw in "[a-z./\\\\]{0,24}") {
        let once = NormalizedPath::new(&raw);
        let twice = NormalizedPath::new(once.as_str());
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn join_then_relative_to_round_trips(
        base in "/[a-z]{1,6}(/[a-z]{1,6}){0,2}",
        rel in "[a-z]{1,6}(/[a-z]{1,6}){0,2}",
    ) {
        let base = NormalizedPath::new(&base);
        let joined = base.join(&rel);
        prop_assert_eq!(joined.relative_to(&base), Some(NormalizedPath::new(&rel)));
    }

    #[test]
    fn parent_segments_only_lead(raw in "(\\.\\.|[a-z]{1,3})(/(\\.\\.|[a-z]{1,3})){0,6}") {
        let path = NormalizedPath::new(&raw);
        let segments: Vec<&str> = path.segments().collect();
        let named = segments.iter().position(|s| *s != "..").unwrap_or(segments.len());
        prop_assert!(segments[named..].iter().all(|s| *s != ".."));
    }
}
