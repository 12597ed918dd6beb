//! `$placeholder` status messages.
//!
//! Supports `$name`, `${name}` and `$$` (a literal dollar). Placeholders
//! without a value, and `$` signs that start no placeholder, are copied
//! through unchanged; rendering never fails.

use std::path::Path;

/// A status line template, e.g. `"SENT $path TO $printer"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusTemplate {
    template: String,
}

/// Values available to a status line.
#[derive(Debug, Clone, Copy)]
pub struct StatusFields<'a> {
    pub printer: &'a str,
    pub path: &'a Path,
    pub document: &'a str,
    pub stem: &'a str,
}

impl StatusTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Render with the standard printing fields.
    pub fn render(&self, fields: &StatusFields<'_>) -> String {
        let path = fields.path.display().to_string();
        self.render_with(|name| match name {
            "printer" => Some(fields.printer),
            "path" => Some(path.as_str()),
            "document" => Some(fields.document),
            "stem" => Some(fields.stem),
            _ => None,
        })
    }

    /// Render, looking each placeholder up with `lookup`.
    pub fn render_with<'v, F>(&self, lookup: F) -> String
    where
        F: Fn(&str) -> Option<&'v str>,
    {
        let s = self.template.as_str();
        let bytes = s.as_bytes();
        let mut out = String::with_capacity(s.len());
        let mut last = 0;
        let mut i = 0;

        while i < bytes.len() {
            if bytes[i] != b'$' {
                i += 1;
                continue;
            }
            out.push_str(&s[last..i]);

            match bytes.get(i + 1) {
                Some(b'$') => {
                    out.push('$');
                    i += 2;
                }
                Some(b'{') => {
                    let braced = s[i + 2..].find('}').and_then(|len| {
                        let name = &s[i + 2..i + 2 + len];
                        if identifier_len(name) == name.len() && !name.is_empty() {
                            lookup(name).map(|value| (value, len))
                        } else {
                            None
                        }
                    });
                    match braced {
                        Some((value, len)) => {
                            out.push_str(value);
                            i += 2 + len + 1;
                        }
                        None => {
                            out.push('$');
                            i += 1;
                        }
                    }
                }
                _ => {
                    let len = identifier_len(&s[i + 1..]);
                    match (len > 0).then(|| lookup(&s[i + 1..i + 1 + len])).flatten() {
                        Some(value) => {
                            out.push_str(value);
                            i += 1 + len;
                        }
                        None => {
                            out.push('$');
                            i += 1;
                        }
                    }
                }
            }
            last = i;
        }

        out.push_str(&s[last..]);
        out
    }
}

impl From<&str> for StatusTemplate {
    fn from(s: &str) -> Self {
        StatusTemplate::new(s)
    }
}

/// Length in bytes of the ASCII identifier at the start of `s`.
fn identifier_len(s: &str) -> usize {
    let bytes = s.as_bytes();
    match bytes.first() {
        Some(b) if b.is_ascii_alphabetic() || *b == b'_' => bytes
            .iter()
            .take_while(|b| b.is_ascii_alphanumeric() || **b == b'_')
            .count(),
        _ => 0,
    }
}
