//! Wildcard name matching.
//!
//! A search string may carry the wildcard at either end: `name¤` matches
//! names starting with `name`, `¤name` names ending with it, `¤name¤` names
//! containing it, and a lone `¤` matches the first name. Without a wildcard
//! the match is exact.

/// Whether `pattern` carries the wildcard at either end.
pub fn is_wildcard(pattern: &str, wildcard: char) -> bool {
    pattern.starts_with(wildcard) || pattern.ends_with(wildcard)
}

/// Whether `name` satisfies `pattern`.
pub fn matches(name: &str, pattern: &str, wildcard: char) -> bool {
    let leading = pattern.starts_with(wildcard);
    let trailing = pattern.len() > wildcard.len_utf8() && pattern.ends_with(wildcard);
    if pattern.chars().count() == 1 && leading {
        return true;
    }
    let core = {
        let mut core = pattern;
        if leading {
            core = &core[wildcard.len_utf8()..];
        }
        if trailing {
            core = &core[..core.len() - wildcard.len_utf8()];
        }
        core
    };
    match (leading, trailing) {
        (true, true) => name.contains(core),
        (true, false) => name.ends_with(core),
        (false, true) => name.starts_with(core),
        (false, false) => name == core,
    }
}

/// Index of the first name matching `pattern`.
///
/// When `sorted` is true and the pattern is exact, a binary search is used;
/// every wildcard pattern is a linear scan, so the first match in table
/// order wins.
pub fn find_index<S: AsRef<str>>(
    names: &[S],
    pattern: &str,
    sorted: bool,
    wildcard: char,
) -> Option<usize> {
    if !is_wildcard(pattern, wildcard) {
        if sorted {
            return names.binary_search_by(|n| n.as_ref().cmp(pattern)).ok();
        }
        return names.iter().position(|n| n.as_ref() == pattern);
    }
    names
        .iter()
        .position(|n| matches(n.as_ref(), pattern, wildcard))
}

/// Every index whose name matches `pattern`, in table order.
pub fn find_all<S: AsRef<str>>(names: &[S], pattern: &str, wildcard: char) -> Vec<usize> {
    names
        .iter()
        .enumerate()
        .filter(|(_, n)| matches(n.as_ref(), pattern, wildcard))
        .map(|(i, _)| i)
        .collect()
}
