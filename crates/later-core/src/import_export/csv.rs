//! Minimal CSV field handling
//!
//! Only what the bookmark export needs: quoting a field and splitting one
//! line with quote awareness. Records never span lines.

/// Wrap a field in double quotes, doubling any quote inside it
pub fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// Split one CSV line into fields
///
/// A comma inside quotes is part of the field, and a doubled quote inside
/// a quoted field is a literal quote. Quote characters themselves are not
/// kept.
pub fn parse_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }

    fields.push(current);
    fields
}
