use std::collections::BTreeMap;

/// Walks `key=value&key=value` pairs left to right, handing each raw (still
/// percent-encoded) pair to `visit`.
///
/// Malformed segments are dropped rather than reported: a segment with no
/// `=` before the next `&` is skipped, and parsing stops as soon as no `=`
/// remains in the tail.
pub fn parse_query<'a, F>(query: &'a str, mut visit: F)
where
    F: FnMut(&'a str, &'a str),
{
    let mut pos = 0;
    loop {
        let rest = &query[pos..];
        let Some(eq) = rest.find('=') else {
            break;
        };
        let amp = rest.find('&');
        if let Some(amp) = amp {
            if amp < eq {
                pos += amp + 1;
                continue;
            }
        }
        let end = amp.unwrap_or(rest.len());
        visit(&rest[..eq], &rest[eq + 1..end]);
        match amp {
            Some(amp) => pos += amp + 1,
            None => break,
        }
    }
}

/// Decodes one query component: `+` becomes a space, then `%XX` escapes are
/// expanded. Invalid escapes pass through untouched and invalid UTF-8 is
/// replaced.
pub fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    let bytes = urlencoding::decode_binary(spaced.as_bytes());
    String::from_utf8_lossy(&bytes).into_owned()
}

/// Decoded values for a fixed set of recognised keys. Unknown keys are
/// ignored; a repeated key keeps its last value.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct QueryParams {
    values: BTreeMap<&'static str, String>,
}

impl QueryParams {
    pub fn parse(query: &str, known: &[&'static str]) -> Self {
        let mut values = BTreeMap::new();
        parse_query(query, |key, val| {
            if let Some(known_key) = known.iter().find(|k| **k == key) {
                values.insert(*known_key, decode_component(val));
            }
        });
        Self { values }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
