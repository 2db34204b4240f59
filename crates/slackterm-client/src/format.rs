//! Message body post-processing.
//!
//! Stages run exactly once, in order: emoji codes, user mentions, HTML
//! entities. A later stage never re-scans for an earlier stage's tokens, so
//! an `:emoji:` that appears inside a resolved user name stays verbatim.
//!
//! Entity decoding covers the markup escapes, numeric references and the
//! common Latin-1 and typographic names (see [`NAMED_ENTITIES`]). Any other
//! named reference is left as written.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use regex::{Captures, Regex};

use slackterm_shared::emoji;

use crate::identity::IdentityCache;

fn emoji_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r":[A-Za-z0-9_+\-]+:").expect("valid emoji regex"))
}

// `<@U12345>` or `<@U12345|hint>`. The hint is ignored.
fn mention_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"<@(\w+)(?:\|[^>]*)?>").expect("valid mention regex"))
}

pub struct BodyFormatter {
    identities: Arc<IdentityCache>,
    emoji: bool,
}

impl BodyFormatter {
    pub fn new(identities: Arc<IdentityCache>, emoji: bool) -> Self {
        Self { identities, emoji }
    }

    pub async fn format(&self, text: &str) -> String {
        let text = if self.emoji {
            replace_emoji(text)
        } else {
            Cow::Borrowed(text)
        };
        let text = self.replace_mentions(&text).await;
        unescape_html(&text).into_owned()
    }

    async fn replace_mentions<'a>(&self, text: &'a str) -> Cow<'a, str> {
        let pattern = mention_pattern();

        let user_ids: Vec<String> = pattern
            .captures_iter(text)
            .map(|caps| caps[1].to_string())
            .collect();

        let mut names: HashMap<String, String> = HashMap::new();
        for user_id in user_ids {
            if !names.contains_key(&user_id) {
                let name = self.identities.resolve_or_placeholder(&user_id).await;
                names.insert(user_id, name);
            }
        }

        if names.is_empty() {
            return Cow::Borrowed(text);
        }

        pattern.replace_all(text, |caps: &Captures| {
            let user_id = &caps[1];
            let name = names.get(user_id).map(String::as_str).unwrap_or(user_id);
            format!("@{name}")
        })
    }
}

/// Replace known `:code:` tokens; unknown codes are left untouched.
pub fn replace_emoji(text: &str) -> Cow<'_, str> {
    emoji_pattern().replace_all(text, |caps: &Captures| {
        let code = &caps[0];
        emoji::lookup(code).unwrap_or(code).to_string()
    })
}

/// Named character references decoded by [`unescape_html`].
pub const NAMED_ENTITIES: &[(&str, char)] = &[
    ("amp", '&'),
    ("lt", '<'),
    ("gt", '>'),
    ("quot", '"'),
    ("apos", '\''),
    ("nbsp", '\u{a0}'),
    ("iexcl", '¡'),
    ("cent", '¢'),
    ("pound", '£'),
    ("curren", '¤'),
    ("yen", '¥'),
    ("brvbar", '¦'),
    ("sect", '§'),
    ("uml", '¨'),
    ("copy", '©'),
    ("ordf", 'ª'),
    ("laquo", '«'),
    ("not", '¬'),
    ("shy", '\u{ad}'),
    ("reg", '®'),
    ("macr", '¯'),
    ("deg", '°'),
    ("plusmn", '±'),
    ("sup2", '²'),
    ("sup3", '³'),
    ("acute", '´'),
    ("micro", 'µ'),
    ("para", '¶'),
    ("middot", '·'),
    ("cedil", '¸'),
    ("sup1", '¹'),
    ("ordm", 'º'),
    ("raquo", '»'),
    ("frac14", '¼'),
    ("frac12", '½'),
    ("frac34", '¾'),
    ("iquest", '¿'),
    ("times", '×'),
    ("divide", '÷'),
    ("szlig", 'ß'),
    ("agrave", 'à'),
    ("aacute", 'á'),
    ("acirc", 'â'),
    ("atilde", 'ã'),
    ("auml", 'ä'),
    ("aring", 'å'),
    ("aelig", 'æ'),
    ("ccedil", 'ç'),
    ("egrave", 'è'),
    ("eacute", 'é'),
    ("ecirc", 'ê'),
    ("euml", 'ë'),
    ("igrave", 'ì'),
    ("iacute", 'í'),
    ("icirc", 'î'),
    ("iuml", 'ï'),
    ("ntilde", 'ñ'),
    ("ograve", 'ò'),
    ("oacute", 'ó'),
    ("ocirc", 'ô'),
    ("otilde", 'õ'),
    ("ouml", 'ö'),
    ("oslash", 'ø'),
    ("ugrave", 'ù'),
    ("uacute", 'ú'),
    ("ucirc", 'û'),
    ("uuml", 'ü'),
    ("yacute", 'ý'),
    ("yuml", 'ÿ'),
    ("Agrave", 'À'),
    ("Aacute", 'Á'),
    ("Auml", 'Ä'),
    ("Ccedil", 'Ç'),
    ("Eacute", 'É'),
    ("Ntilde", 'Ñ'),
    ("Ouml", 'Ö'),
    ("Uuml", 'Ü'),
    ("ensp", '\u{2002}'),
    ("emsp", '\u{2003}'),
    ("thinsp", '\u{2009}'),
    ("zwnj", '\u{200c}'),
    ("zwj", '\u{200d}'),
    ("ndash", '\u{2013}'),
    ("mdash", '\u{2014}'),
    ("lsquo", '\u{2018}'),
    ("rsquo", '\u{2019}'),
    ("sbquo", '\u{201a}'),
    ("ldquo", '\u{201c}'),
    ("rdquo", '\u{201d}'),
    ("bdquo", '\u{201e}'),
    ("dagger", '\u{2020}'),
    ("Dagger", '\u{2021}'),
    ("bull", '\u{2022}'),
    ("hellip", '\u{2026}'),
    ("permil", '\u{2030}'),
    ("prime", '\u{2032}'),
    ("Prime", '\u{2033}'),
    ("lsaquo", '\u{2039}'),
    ("rsaquo", '\u{203a}'),
    ("euro", '\u{20ac}'),
    ("trade", '\u{2122}'),
    ("larr", '\u{2190}'),
    ("uarr", '\u{2191}'),
    ("rarr", '\u{2192}'),
    ("darr", '\u{2193}'),
    ("harr", '\u{2194}'),
    ("minus", '\u{2212}'),
    ("ne", '\u{2260}'),
    ("le", '\u{2264}'),
    ("ge", '\u{2265}'),
    ("infin", '\u{221e}'),
    ("check", '\u{2713}'),
];

/// Decode named (see [`NAMED_ENTITIES`]) and numeric (`&#39;`, `&#x1F600;`)
/// character references in a single pass.
pub fn unescape_html(input: &str) -> Cow<'_, str> {
    if !input.contains('&') {
        return Cow::Borrowed(input);
    }

    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        let decoded = tail
            .find(';')
            .filter(|&end| end <= 12)
            .and_then(|end| decode_entity(&tail[1..end]).map(|ch| (ch, end)));

        match decoded {
            Some((ch, end)) => {
                out.push(ch);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    Cow::Owned(out)
}

fn decode_entity(name: &str) -> Option<char> {
    match name.strip_prefix('#') {
        Some(number) => {
            let code = match number.strip_prefix(|c| c == 'x' || c == 'X') {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => number.parse::<u32>().ok()?,
            };
            char::from_u32(code)
        }
        None => NAMED_ENTITIES
            .iter()
            .find(|(entity, _)| *entity == name)
            .map(|&(_, ch)| ch),
    }
}

#[cfg(test)]
mod tests {
    use slackterm_net::RateLimiter;

    use super::*;
    use crate::test_utils::MockSlackApi;

    fn formatter(api: MockSlackApi, emoji: bool) -> BodyFormatter {
        let identities = Arc::new(IdentityCache::without_store(
            Arc::new(api),
            RateLimiter::default(),
        ));
        BodyFormatter::new(identities, emoji)
    }

    #[test]
    fn test_replace_emoji() {
        assert_eq!(replace_emoji("ship it :+1: :rocket:"), "ship it 👍 🚀");
        assert_eq!(replace_emoji(":no_such_code: at 10:30"), ":no_such_code: at 10:30");
        assert!(matches!(replace_emoji("plain"), Cow::Borrowed("plain")));
    }

    #[test]
    fn test_unescape_html() {
        assert_eq!(unescape_html("a &lt;b&gt; &amp; &quot;c&quot;"), "a <b> & \"c\"");
        assert_eq!(unescape_html("it&#39;s &apos;ok&apos;"), "it's 'ok'");
        assert_eq!(unescape_html("&#x1F600;"), "😀");
        // Decoding is single pass.
        assert_eq!(unescape_html("&amp;lt;"), "&lt;");
        assert_eq!(
            unescape_html("wait&hellip; 3&ndash;4 &mdash; &ldquo;hi&rdquo; &copy; &euro;5"),
            "wait\u{2026} 3\u{2013}4 \u{2014} \u{201c}hi\u{201d} \u{a9} \u{20ac}5"
        );
        // Names are case sensitive.
        assert_eq!(unescape_html("&Eacute;t&eacute; &AMP;"), "\u{c9}t\u{e9} &AMP;");
        // Unknown or unterminated references are kept.
        assert_eq!(unescape_html("fish & chips &bogus; &#xZZ;"), "fish & chips &bogus; &#xZZ;");
    }

    #[tokio::test]
    async fn test_pipeline_order() {
        let fmt = formatter(MockSlackApi::default().with_user("U1", "alice"), true);
        let out = fmt.format("<@U1|ally> says &lt;3 :smile:").await;
        assert_eq!(out, "@alice says <3 😄");
    }

    #[tokio::test]
    async fn test_emoji_inside_mention_name_is_not_substituted() {
        let fmt = formatter(MockSlackApi::default().with_user("U1", ":smile:"), true);
        let out = fmt.format("hi <@U1> :smile:").await;
        assert_eq!(out, "hi @:smile: 😄");
    }

    #[tokio::test]
    async fn test_unknown_mention_uses_placeholder() {
        let fmt = formatter(MockSlackApi::default(), true);
        assert_eq!(fmt.format("cc <@U999>").await, "cc @unknown (U999)");
    }

    #[tokio::test]
    async fn test_emoji_stage_can_be_disabled() {
        let fmt = formatter(MockSlackApi::default(), false);
        assert_eq!(fmt.format(":smile: &amp;").await, ":smile: &");
    }
}
