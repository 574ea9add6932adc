/// Collapses a resource alias onto its family name.
///
/// The text before the first underscore is kept when the underscore is not
/// leading and is followed by an ASCII letter, so `CellChatDB_complex`
/// becomes `CellChatDB` while `KEGG-PC`, `Wang_2019` and `_hidden` are left
/// alone. Compound names such as `GO_Intercell` collapse to `GO`.
pub fn normalize(name: &str) -> String {
    family_name(name).to_string()
}

pub fn family_name(name: &str) -> &str {
    let Some(idx) = name.find('_') else {
        return name;
    };
    if idx == 0 {
        return name;
    }
    match name[idx + 1..].chars().next() {
        Some(c) if c.is_ascii_alphabetic() => &name[..idx],
        _ => name,
    }
}

/// A raw spelling is canonical when it already is its own family name.
pub fn is_canonical(name: &str) -> bool {
    family_name(name) == name
}

/// Key used for case-insensitive matching against reference tables.
pub fn lookup_key(name: &str) -> String {
    family_name(name).to_lowercase()
}
