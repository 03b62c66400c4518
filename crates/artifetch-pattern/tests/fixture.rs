use artifetch_pattern::{MatchOptions, PatternFilter, filter};

const ROOT: &str = "ArtifactForTest";
const ITEMS: [&str; 7] = [
    "ArtifactForTest",
    "ArtifactForTest/File1.txt",
    "ArtifactForTest/Folder1",
    "ArtifactForTest/Folder1/File2.txt",
    "ArtifactForTest/Folder1/File21.txt",
    "ArtifactForTest/Folder1/Folder2",
    "ArtifactForTest/Folder1/Folder2/File3.txt",
];

fn run(patterns: &[&str]) -> Vec<String> {
    filter(&ITEMS, patterns, MatchOptions::artifact_defaults())
        .unwrap()
        .into_iter()
        .map(|path| path.to_string())
        .collect()
}

fn under_root(relative: &[&str]) -> Vec<String> {
    relative
        .iter()
        .map(|r| if r.is_empty() { ROOT.to_string() } else { format!("{ROOT}/{r}") })
        .collect()
}

#[test]
fn test_globstar_keeps_everything_in_order() {
    assert_eq!(run(&["**"]), ITEMS);
}

#[test]
fn test_exclude_single_file() {
    assert_eq!(
        run(&["**", "!**/File2.txt"]),
        under_root(&[
            "",
            "File1.txt",
            "Folder1",
            "Folder1/File21.txt",
            "Folder1/Folder2",
            "Folder1/Folder2/File3.txt",
        ])
    );
}

#[test]
fn test_exclude_wildcard_prefix() {
    assert_eq!(
        run(&["**", "!**/File2*"]),
        under_root(&["", "File1.txt", "Folder1", "Folder1/Folder2", "Folder1/Folder2/File3.txt"])
    );
}

#[test]
fn test_exclude_folder_contents() {
    assert_eq!(
        run(&["**", "!**/Folder2/**"]),
        under_root(&[
            "",
            "File1.txt",
            "Folder1",
            "Folder1/File2.txt",
            "Folder1/File21.txt",
            "Folder1/Folder2",
        ])
    );
}

#[test]
fn test_include_without_leading_globstar_skips_root() {
    assert_eq!(
        run(&["**/Folder1/**", "!**/File3.txt"]),
        under_root(&["Folder1/File2.txt", "Folder1/File21.txt", "Folder1/Folder2"])
    );
}

#[test]
fn test_file_prefix_pattern() {
    assert_eq!(
        run(&["**/File*.txt", "!**/File3.txt"]),
        under_root(&["File1.txt", "Folder1/File2.txt", "Folder1/File21.txt"])
    );
}

#[test]
fn test_double_negation_reincludes_without_ancestors() {
    let expected = under_root(&["", "File1.txt", "Folder1", "Folder1/Folder2/File3.txt"]);

    assert_eq!(run(&["**", "!**/Folder1/**", "!!**/File3.txt"]), expected);
    // Surrounding whitespace is trimmed.
    assert_eq!(run(&["**", "   !**/Folder1/**  ", "!!**/File3.txt"]), expected);
    // Comment and blank lines are no-ops.
    assert_eq!(run(&["**", "!**/Folder1/**", "#!**/Folder2/**", "!!**/File3.txt"]), expected);
    assert_eq!(run(&["**", "!**/Folder1/**", " ", "!!**/File3.txt"]), expected);
}

#[test]
fn test_empty_and_exclude_only_lists() {
    assert!(run(&[]).is_empty());
    assert!(run(&["!**/File1.txt"]).is_empty());
    assert!(run(&["  ", "#**"]).is_empty());
}

#[test]
fn test_output_is_ordered_subsequence_without_duplicates() {
    let pattern_sets: &[&[&str]] = &[
        &["**/File*.txt", "**", "**/Folder1/**"],
        &["**/Folder2/**", "**/File1.txt", "!**/File3.txt", "**/File1.txt"],
        &["!**", "**/File2*", "**/File2*"],
    ];

    for patterns in pattern_sets {
        let kept = run(patterns);
        let mut cursor = ITEMS.iter();
        for path in &kept {
            assert!(cursor.any(|item| item == path), "{path} out of order for {patterns:?}");
        }
        let mut deduped = kept.clone();
        deduped.dedup();
        assert_eq!(deduped, kept);
    }
}

#[test]
fn test_case_insensitive_filter() {
    let options = MatchOptions::artifact_defaults().no_case(true);
    let kept = filter(&ITEMS, ["**/file1.TXT"], options).unwrap();
    assert_eq!(kept, [&"ArtifactForTest/File1.txt"]);
}

#[test]
fn test_dot_entries_need_dot_option() {
    let items = ["a/.cache/x.bin", "a/y.bin"];
    let strict = MatchOptions::default();
    let kept = PatternFilter::new(["**/*.bin"], strict).unwrap().apply(&items);
    assert_eq!(kept, [&"a/y.bin"]);

    let kept = PatternFilter::new(["**/*.bin"], MatchOptions::artifact_defaults())
        .unwrap()
        .apply(&items);
    assert_eq!(kept.len(), 2);
}
