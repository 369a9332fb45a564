use rstest::rstest;
use skillsync_fs::NormalizedPath;

#[rstest]
#[case("foo/bar/baz", "foo/bar/baz")]
#[case("foo\\bar\\baz", "foo/bar/baz")]
#[case("foo/bar\\baz", "foo/bar/baz")]
#[case("./foo/bar/", "foo/bar")]
#[case("foo/baz/../bar", "foo/bar")]
#[case("foo\\..\\bar", "bar")]
fn test_normalize(#[case] input: &str, #[case] expected: &str) {
    assert_eq!(NormalizedPath::new(input).as_str(), expected);
}

#[test]
fn test_join_paths() {
    let base = NormalizedPath::new("foo/bar");
    let joined = base.join("baz");
    assert_eq!(joined.as_str(), "foo/bar/baz");
}

#[test]
fn test_join_onto_empty_base() {
    let base = NormalizedPath::new("");
    assert_eq!(base.join(".claude/skills").as_str(), ".claude/skills");
}

#[test]
fn test_parent() {
    let path = NormalizedPath::new("foo/bar/baz");
    let parent = path.parent().unwrap();
    assert_eq!(parent.as_str(), "foo/bar");
}

#[test]
fn test_parent_of_single_segment_is_none() {
    assert!(NormalizedPath::new("foo").parent().is_none());
}

#[test]
fn test_file_name_and_extension() {
    let path = NormalizedPath::new("foo/bar/baz.txt");
    assert_eq!(path.file_name(), Some("baz.txt"));
    assert_eq!(path.extension(), Some("txt"));
    assert_eq!(NormalizedPath::new("dir/.gitignore").extension(), None);
}

#[test]
fn test_relative_to_strips_base() {
    let base = NormalizedPath::new("/project");
    let path = NormalizedPath::new("/project/.claude/skills/a.md");
    assert_eq!(
        path.relative_to(&base).unwrap().as_str(),
        ".claude/skills/a.md"
    );
}

#[test]
fn test_relative_to_respects_segment_boundaries() {
    let base = NormalizedPath::new("/project/a");
    let path = NormalizedPath::new("/project/abc/file");
    assert!(path.relative_to(&base).is_none());
}

#[test]
fn test_relative_to_self_is_none() {
    let base = NormalizedPath::new("/project");
    assert!(base.relative_to(&base).is_none());
    assert!(base.starts_with(&base));
}

#[test]
fn test_segments() {
    let path = NormalizedPath::new("/a/b/c");
    assert_eq!(path.segments().collect::<Vec<_>>(), vec!["a", "b", "c"]);
}

#[test]
fn test_exists_false_for_nonexistent() {
    let path = NormalizedPath::new("/nonexistent/path/that/does/not/exist");
    assert!(!path.exists());
}
