use sha2::{Digest, Sha256};

const MAX_STEM_LEN: usize = 80;

/// File name for a resource: `{id}.txt`, or `{sanitized_id}--{short_hash(id)}.txt`
/// when the raw id is not a safe file name on its own.
pub fn resource_filename(id: &str) -> String {
    let sanitized = sanitize_id(id);
    if sanitized == id {
        format!("{id}.txt")
    } else {
        format!("{sanitized}--{}.txt", short_hash(id))
    }
}

fn sanitize_id(input: &str) -> String {
    let mut cleaned = String::with_capacity(input.len());
    let mut prev_underscore = false;
    for c in input.chars() {
        let c = if is_forbidden(c) { '_' } else { c };
        if c == '_' && prev_underscore {
            continue;
        }
        prev_underscore = c == '_';
        cleaned.push(c);
    }
    let mut cleaned = cleaned.trim_matches(&['_', ' ', '.'][..]).to_string();
    if cleaned.is_empty() {
        cleaned = "resource".to_string();
    }
    if cleaned.len() > MAX_STEM_LEN {
        let mut end = MAX_STEM_LEN;
        while !cleaned.is_char_boundary(end) {
            end -= 1;
        }
        cleaned.truncate(end);
    }
    if is_reserved_windows_name(&cleaned) {
        cleaned.push('_');
    }
    cleaned
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}

fn short_hash(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    digest.iter().take(4).map(|byte| format!("{byte:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::resource_filename;

    #[test]
    fn numeric_ids_are_used_verbatim() {
        assert_eq!(resource_filename("100"), "100.txt");
    }

    #[test]
    fn unsafe_ids_are_sanitized_and_hashed() {
        let name = resource_filename("a?b");
        assert!(name.starts_with("a_b--"));
        assert!(name.ends_with(".txt"));
        assert_ne!(name, resource_filename("a*b"));
    }

    #[test]
    fn reserved_names_are_patched() {
        assert!(resource_filename("CON").starts_with("CON_--"));
    }
}
