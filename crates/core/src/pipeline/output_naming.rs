use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::cropping::domain::crop_mode::CropMode;

/// File name without its last extension (`a.b.png` → `a.b`).
fn source_stem(source: &Path) -> String {
    source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string())
}

/// One output stem per input, distinct across the batch.
///
/// The first input with a given stem keeps it; later ones get `-2`, `-3`
/// and so on, skipping any suffix that another input already owns.
/// Comparison ignores case so outputs stay distinct on case-insensitive
/// filesystems.
pub fn unique_stems(sources: &[PathBuf]) -> Vec<String> {
    let stems: Vec<String> = sources.iter().map(|s| source_stem(s)).collect();
    let mut taken: HashSet<String> = stems.iter().map(|s| s.to_lowercase()).collect();
    let mut claimed = HashSet::new();

    stems
        .into_iter()
        .map(|stem| {
            if claimed.insert(stem.to_lowercase()) {
                return stem;
            }
            let mut n = 2;
            let mut candidate = format!("{stem}-{n}");
            while taken.contains(&candidate.to_lowercase()) {
                n += 1;
                candidate = format!("{stem}-{n}");
            }
            taken.insert(candidate.to_lowercase());
            candidate
        })
        .collect()
}

/// `{stem}__{mode}__{index}_{target_size}.png`, `index` counting from 1.
pub fn output_file_name(stem: &str, mode: CropMode, index: usize, target_size: u32) -> String {
    format!("{stem}__{mode}__{index}_{target_size}.png")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("cat", CropMode::Portrait, 1, 512, "cat__portrait__1_512.png")]
    #[case("cat.final", CropMode::Face, 3, 256, "cat.final__face__3_256.png")]
    #[case("cat-2", CropMode::Face, 2, 64, "cat-2__face__2_64.png")]
    fn test_output_file_name(
        #[case] stem: &str,
        #[case] mode: CropMode,
        #[case] index: usize,
        #[case] size: u32,
        #[case] expected: &str,
    ) {
        assert_eq!(output_file_name(stem, mode, index, size), expected);
    }

    #[rstest]
    #[case("shots/cat.jpg", "cat")]
    #[case("cat.final.png", "cat.final")]
    #[case("noext", "noext")]
    #[case(".hidden", ".hidden")]
    fn test_source_stem(#[case] source: &str, #[case] expected: &str) {
        assert_eq!(source_stem(Path::new(source)), expected);
    }

    fn paths(names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn test_distinct_stems_are_untouched() {
        assert_eq!(unique_stems(&paths(&["a/cat.png", "b/dog.png"])), vec!["cat", "dog"]);
    }

    #[test]
    fn test_repeated_stems_get_numbered() {
        let stems = unique_stems(&paths(&["a/cat.png", "b/cat.png", "cat.jpg"]));
        assert_eq!(stems, vec!["cat", "cat-2", "cat-3"]);
    }

    #[test]
    fn test_suffix_skips_stems_owned_by_other_inputs() {
        let stems = unique_stems(&paths(&["a/cat.png", "b/cat.png", "cat-2.png"]));
        assert_eq!(stems, vec!["cat", "cat-3", "cat-2"]);
    }

    #[test]
    fn test_case_only_difference_counts_as_collision() {
        let stems = unique_stems(&paths(&["a/Cat.png", "b/cat.png"]));
        assert_eq!(stems, vec!["Cat", "cat-2"]);
    }
}
