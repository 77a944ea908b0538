use percent_encoding::percent_decode_str;

/// Cookie store with `document.cookie` semantics: a single `name=value; ...`
/// string that later assignments to the same name overwrite.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieJar {
    entries: Vec<(String, String)>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a jar from a `name=value; name2=value2` string
    pub fn parse(raw: &str) -> Self {
        let mut jar = CookieJar::new();
        for pair in raw.split(';') {
            jar.store_pair(pair);
        }
        jar
    }

    /// Record a `Set-Cookie` header, ignoring its attributes
    pub fn store_set_cookie(&mut self, header: &str) {
        if let Some(pair) = header.split(';').next() {
            self.store_pair(pair);
        }
    }

    pub fn set(&mut self, name: &str, value: &str) {
        match self.entries.iter_mut().find(|(existing, _)| existing == name) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.entries.push((name.to_string(), value.to_string())),
        }
    }

    /// The raw cookie string, as sent in a `Cookie` header
    pub fn header_value(&self) -> String {
        self.entries
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("; ")
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Value of the cookie named exactly `name`, URL-decoded; empty if absent
    pub fn get_cookie(&self, name: &str) -> String {
        get_cookie(&self.header_value(), name)
    }

    fn store_pair(&mut self, pair: &str) {
        let pair = pair.trim();
        if let Some((name, value)) = pair.split_once('=') {
            let name = name.trim();
            if !name.is_empty() {
                self.set(name, value.trim());
            }
        }
    }
}

/// Look a cookie up in a raw cookie string.
///
/// The whole string is decoded first, then split on `;`; a segment matches
/// when it starts with `name=` once leading spaces are dropped.
pub fn get_cookie(raw: &str, name: &str) -> String {
    let prefix = format!("{}=", name);
    let decoded = percent_decode_str(raw).decode_utf8_lossy();

    decoded
        .split(';')
        .map(|segment| segment.trim_start_matches(' '))
        .find_map(|segment| segment.strip_prefix(prefix.as_str()))
        .map(str::to_string)
        .unwrap_or_default()
}
