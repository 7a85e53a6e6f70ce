//! Informal phrase to canonical topic key rewriting.

use crate::knowledge::AliasTable;

/// Replace every informal phrase in `text` with its canonical topic key.
///
/// Aliases are applied longest first over the whole lowercased text. Each
/// occurrence claims its span; a shorter alias overlapping a claimed span is
/// skipped, wherever it starts. Replacements are spliced in at the end, so a
/// canonical name that itself contains an alias is never rescanned.
pub fn resolve_aliases(text: &str, aliases: &AliasTable) -> String {
    let lower = text.to_lowercase();
    if aliases.is_empty() {
        return lower;
    }

    // (start, end, canonical), byte offsets into `lower`
    let mut claims: Vec<(usize, usize, &str)> = Vec::new();
    for (alias, canonical) in aliases.entries() {
        let mut from = 0;
        while let Some(offset) = lower[from..].find(alias.as_str()) {
            let start = from + offset;
            let end = start + alias.len();
            if claims.iter().any(|&(s, e, _)| start < e && s < end) {
                from = start + lower[start..].chars().next().map_or(1, char::len_utf8);
            } else {
                claims.push((start, end, canonical.as_str()));
                from = end;
            }
        }
    }
    if claims.is_empty() {
        return lower;
    }
    claims.sort_by_key(|&(start, _, _)| start);

    let mut out = String::with_capacity(lower.len());
    let mut pos = 0;
    for (start, end, canonical) in claims {
        out.push_str(&lower[pos..start]);
        out.push_str(canonical);
        pos = end;
    }
    out.push_str(&lower[pos..]);
    out
}
