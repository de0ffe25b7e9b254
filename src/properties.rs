//! Properties file loader
//!
//! Reads the `key=value` files operators already keep next to their domains:
//!
//! ```text
//! # admin connection
//! admin.username=weblogic
//! admin.password=welcome1
//! admin.url=t3://localhost:7001
//! sv.name: ms1
//! ```
//!
//! `=`, `:` or whitespace separates key from value. Lines starting with `#`
//! or `!` are comments and a trailing backslash continues the value on the
//! next line. `\uXXXX` escapes decode to the character they name.

use crate::constants::{PROP_ADMIN_PASSWORD, PROP_ADMIN_URL, PROP_ADMIN_USERNAME};
use crate::models::{AdminUrl, Credentials, SecureString, Username};
use crate::utils::PropertiesError;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::debug;
use zeroize::Zeroize;

#[derive(Clone, Default, PartialEq, Eq)]
pub struct Properties {
    entries: BTreeMap<String, String>,
}

impl Properties {
    pub fn load(path: &Path) -> Result<Self, PropertiesError> {
        let raw = fs::read_to_string(path).map_err(|source| PropertiesError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let props = Self::parse(&raw);
        debug!(path = %path.display(), keys = props.entries.len(), "properties loaded");
        Ok(props)
    }

    pub fn parse(raw: &str) -> Self {
        let mut entries = BTreeMap::new();
        let mut pending = String::new();

        for line in raw.lines() {
            let line = line.trim_start();
            if pending.is_empty() && (line.is_empty() || line.starts_with('#') || line.starts_with('!')) {
                continue;
            }

            if let Some(stripped) = strip_continuation(line) {
                pending.push_str(stripped);
                continue;
            }
            pending.push_str(line);

            let logical = std::mem::take(&mut pending);
            let (key, value) = split_entry(&logical);
            if !key.is_empty() {
                entries.insert(unescape(key), unescape(value));
            }
        }

        // A continuation on the last line still ends the entry
        if !pending.is_empty() {
            let (key, value) = split_entry(&pending);
            if !key.is_empty() {
                entries.insert(unescape(key), unescape(value));
            }
        }

        Self { entries }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Value for `key`; missing and empty values are both errors
    pub fn require(&self, key: &str) -> Result<&str, PropertiesError> {
        self.get(key)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| PropertiesError::MissingKey(key.to_string()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Admin credentials from `admin.username`, `admin.password` and `admin.url`
    ///
    /// # Security
    /// - The password moves straight into a [`SecureString`]
    pub fn credentials(&self) -> Result<Credentials, PropertiesError> {
        let username = Username::new(self.require(PROP_ADMIN_USERNAME)?.trim())?;
        let password = SecureString::new(self.require(PROP_ADMIN_PASSWORD)?);
        let admin_url = AdminUrl::parse(self.require(PROP_ADMIN_URL)?)?;
        Ok(Credentials::new(username, password, admin_url)?)
    }
}

impl std::fmt::Debug for Properties {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // SECURITY: Never reveal the password content
        let mut map = f.debug_map();
        for (key, value) in &self.entries {
            if key == PROP_ADMIN_PASSWORD {
                map.entry(key, &crate::constants::MASKED_PASSWORD);
            } else {
                map.entry(key, value);
            }
        }
        map.finish()
    }
}

impl Drop for Properties {
    fn drop(&mut self) {
        // SECURITY: Clear the password before the map is freed
        if let Some(password) = self.entries.get_mut(PROP_ADMIN_PASSWORD) {
            password.zeroize();
        }
    }
}

/// Text before a trailing unescaped backslash, if the line continues
fn strip_continuation(line: &str) -> Option<&str> {
    let trailing = line.chars().rev().take_while(|&c| c == '\\').count();
    if trailing % 2 == 1 {
        Some(&line[..line.len() - 1])
    } else {
        None
    }
}

fn split_entry(line: &str) -> (&str, &str) {
    let mut escaped = false;
    for (idx, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' => return (line[..idx].trim(), line[idx + 1..].trim()),
            c if c.is_whitespace() => {
                let rest = line[idx..].trim_start();
                let rest = rest
                    .strip_prefix('=')
                    .or_else(|| rest.strip_prefix(':'))
                    .unwrap_or(rest);
                return (line[..idx].trim(), rest.trim());
            }
            _ => {}
        }
    }
    (line.trim(), "")
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('u') => {
                let hex: String = chars.clone().take(4).collect();
                let decoded = Some(&hex)
                    .filter(|h| h.len() == 4 && h.chars().all(|c| c.is_ascii_hexdigit()))
                    .and_then(|h| u32::from_str_radix(h, 16).ok())
                    .and_then(char::from_u32);
                match decoded {
                    Some(decoded) => {
                        out.push(decoded);
                        chars.nth(3);
                    }
                    // Malformed escapes are kept as written
                    None => out.push_str("\\u"),
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}
