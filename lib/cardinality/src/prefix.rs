/// Returns the number of leading characters that `a` and `b` share.
pub fn common_prefix_length(a: &str, b: &str) -> usize {
    a.chars()
        .zip(b.chars())
        .take_while(|(a, b)| a == b)
        .count()
}

/// Returns the key that shares the longest prefix with `value`.
///
/// Keys without any common prefix are never returned. On ties, the first key wins.
pub fn longest_matching_key<'key>(
    value: &str,
    keys: impl IntoIterator<Item = &'key str>,
) -> Option<&'key str> {
    let mut best = None;
    let mut best_length = 0;
    for key in keys {
        let length = common_prefix_length(value, key);
        if length > best_length {
            best = Some(key);
            best_length = length;
        }
    }
    best
}
