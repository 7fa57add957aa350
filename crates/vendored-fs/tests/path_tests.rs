use proptest::prelude::*;
use rstest::rstest;
use vendored_fs::{NormalizedPath, escapes_root, normalize_relative};

#[rstest]
#[case(".vendored/install", ".vendored/install")]
#[case("./.tool/script.sh", ".tool/script.sh")]
#[case(".tool\\nested\\file.py", ".tool/nested/file.py")]
#[case("dir//file", "dir/file")]
#[case("dir/", "dir")]
fn normalizes_relative_paths(#[case] input: &str, #[case] expected: &str) {
    assert_eq!(normalize_relative(input), expected);
}

#[rstest]
#[case("../victim.txt", true)]
#[case(".tool/../../etc/passwd", true)]
#[case("..\\outside", true)]
#[case(".tool/..hidden", false)]
#[case(".vendored/pkg/tool/run.sh", false)]
fn parent_segments_escape_root(#[case] input: &str, #[case] expected: bool) {
    assert_eq!(escapes_root(input), expected);
}

#[test]
fn parent_of_root_child() {
    assert_eq!(NormalizedPath::new("/a").parent().unwrap().as_str(), "/");
    assert!(NormalizedPath::new("relative").parent().is_none());
}

proptest! {
    #[test]
    fn normalize_is_idempotent(input in "[a-z./\\\\]{0,24}") {
        let once = normalize_relative(&input);
        prop_assert_eq!(normalize_relative(&once), once.clone());
        prop_assert!(!once.starts_with('/'));
        prop_assert!(!once.contains("//"));
    }
}
