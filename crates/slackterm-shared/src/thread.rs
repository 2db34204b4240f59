//! Thread aliasing.
//!
//! Thread identifiers are fractional timestamps such as
//! `"1700000000.000100"`, far too long to type when replying. The whole-second
//! part is encoded in base 62 to produce a short alias, and the alias is
//! remembered in a [`ThreadTable`] for the lifetime of the process so that
//! `/thread <alias> <text>` can be mapped back to the real identifier.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::types::ThreadReference;

const BASE62_ALPHABET: &[u8; 62] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ1234567890";

/// Encode an integer in base 62. Zero encodes as the first alphabet symbol
/// so that every alias is non-empty.
pub fn base62(mut input: u64) -> String {
    if input == 0 {
        return (BASE62_ALPHABET[0] as char).to_string();
    }

    let mut digits = Vec::new();
    while input > 0 {
        digits.push(BASE62_ALPHABET[(input % 62) as usize]);
        input /= 62;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}

/// Derive the alias of a thread timestamp. Only the whole seconds take part.
pub fn thread_alias(thread_ts: &str) -> String {
    let seconds = thread_ts
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite() && *f >= 0.0)
        .map(|f| f as u64)
        .unwrap_or(0);
    base62(seconds)
}

/// Add-only alias table shared by the message builder and the command path.
#[derive(Debug, Default)]
pub struct ThreadTable {
    aliases: RwLock<HashMap<String, String>>,
}

impl ThreadTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a thread timestamp and return its reference.
    pub fn register(&self, thread_ts: &str) -> ThreadReference {
        let alias = thread_alias(thread_ts);
        if let Ok(mut aliases) = self.aliases.write() {
            aliases.insert(alias.clone(), thread_ts.to_string());
        }
        ThreadReference {
            alias,
            thread_ts: thread_ts.to_string(),
        }
    }

    /// Map an alias back to the real thread timestamp.
    pub fn lookup(&self, alias: &str) -> Option<String> {
        self.aliases
            .read()
            .ok()
            .and_then(|aliases| aliases.get(alias).cloned())
    }

    pub fn len(&self) -> usize {
        self.aliases.read().map(|a| a.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base62() {
        assert_eq!(base62(0), "a");
        assert_eq!(base62(1), "b");
        assert_eq!(base62(61), "0");
        assert_eq!(base62(62), "ba");
        assert_eq!(base62(100), "bM");
    }

    #[test]
    fn test_alias_is_deterministic() {
        let ts = "1700000000.000100";
        assert_eq!(thread_alias(ts), thread_alias(ts));
        assert!(!thread_alias("100.000000").is_empty());
    }

    #[test]
    fn test_alias_ignores_fraction() {
        assert_eq!(thread_alias("100.000000"), thread_alias("100.999999"));
    }

    #[test]
    fn test_distinct_inputs_distinct_aliases() {
        let mut seen = std::collections::HashSet::new();
        for secs in 0..5_000u64 {
            assert!(seen.insert(base62(secs)), "collision at {secs}");
        }
        assert!(seen.insert(base62(1_700_000_000)));
    }

    #[test]
    fn test_table_register_and_lookup() {
        let table = ThreadTable::new();
        assert!(table.is_empty());

        let reference = table.register("1700000000.000100");
        assert_eq!(reference.thread_ts, "1700000000.000100");
        assert_eq!(
            table.lookup(&reference.alias).as_deref(),
            Some("1700000000.000100")
        );
        assert_eq!(table.lookup("nope"), None);

        table.register("1700000001.000100");
        assert_eq!(table.len(), 2);
        assert!(table.lookup(&reference.alias).is_some());
    }
}
