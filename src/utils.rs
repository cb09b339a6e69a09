use std::path::Path;

/// the input file's base name with its last extension removed.
/// `data/my_data_set.csv` gives `my_data_set`; a name without an extension is kept as-is.
pub fn file_stem_of(path: &Path) -> Option<String> {
    path.file_stem().map(|stem| stem.to_string_lossy().into_owned())
}
