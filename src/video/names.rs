/// Turn a raw filename into a display label.
///
/// Steps run in this order:
/// 1. underscores become spaces
/// 2. the last `.`-separated segment (the extension) is dropped
/// 3. remaining dots become spaces
/// 4. triple spaces collapse to one, then double spaces collapse to one
///
/// Step 4 is a single pass of each replacement, so long runs of spaces are
/// only partly collapsed (five spaces end up as two).
pub fn normalize(file_name: &str) -> String {
    let spaced = file_name.replace('_', " ");

    let mut segments: Vec<&str> = spaced.split('.').collect();
    segments.pop();
    let stem = segments.join(".");

    stem.replace('.', " ").replace("   ", " ").replace("  ", " ")
}
