use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

/// One complete reference, anchored: matched against the tail of the output.
static ENTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^&(#[0-9]{1,8}|#[xX][0-9a-fA-F]{1,8}|[A-Za-z][A-Za-z0-9]{1,31});$").unwrap()
});

/// Longest reference `ENTITY_RE` accepts: `&` + 32-char name + `;`.
const MAX_ENTITY_LEN: usize = 34;

/// Named entities. Built once, read-only afterwards.
static NAMED_ENTITIES: LazyLock<HashMap<&'static str, char>> = LazyLock::new(|| {
    const TABLE: &[(&str, char)] = &[
        // core
        ("amp", '&'), ("lt", '<'), ("gt", '>'), ("quot", '"'), ("apos", '\''), ("nbsp", ' '),
        // latin-1 symbols
        ("iexcl", '¡'), ("cent", '¢'), ("pound", '£'), ("curren", '¤'), ("yen", '¥'),
        ("brvbar", '¦'), ("sect", '§'), ("uml", '¨'), ("copy", '©'), ("ordf", 'ª'),
        ("laquo", '«'), ("not", '¬'), ("shy", '\u{00AD}'), ("reg", '®'), ("macr", '¯'),
        ("deg", '°'), ("plusmn", '±'), ("sup2", '²'), ("sup3", '³'), ("acute", '´'),
        ("micro", 'µ'), ("para", '¶'), ("middot", '·'), ("cedil", '¸'), ("sup1", '¹'),
        ("ordm", 'º'), ("raquo", '»'), ("frac14", '¼'), ("frac12", '½'), ("frac34", '¾'),
        ("iquest", '¿'), ("times", '×'), ("divide", '÷'),
        // latin-1 letters
        ("Agrave", 'À'), ("Aacute", 'Á'), ("Acirc", 'Â'), ("Atilde", 'Ã'), ("Auml", 'Ä'),
        ("Aring", 'Å'), ("AElig", 'Æ'), ("Ccedil", 'Ç'), ("Egrave", 'È'), ("Eacute", 'É'),
        ("Ecirc", 'Ê'), ("Euml", 'Ë'), ("Igrave", 'Ì'), ("Iacute", 'Í'), ("Icirc", 'Î'),
        ("Iuml", 'Ï'), ("ETH", 'Ð'), ("Ntilde", 'Ñ'), ("Ograve", 'Ò'), ("Oacute", 'Ó'),
        ("Ocirc", 'Ô'), ("Otilde", 'Õ'), ("Ouml", 'Ö'), ("Oslash", 'Ø'), ("Ugrave", 'Ù'),
        ("Uacute", 'Ú'), ("Ucirc", 'Û'), ("Uuml", 'Ü'), ("Yacute", 'Ý'), ("THORN", 'Þ'),
        ("szlig", 'ß'), ("agrave", 'à'), ("aacute", 'á'), ("acirc", 'â'), ("atilde", 'ã'),
        ("auml", 'ä'), ("aring", 'å'), ("aelig", 'æ'), ("ccedil", 'ç'), ("egrave", 'è'),
        ("eacute", 'é'), ("ecirc", 'ê'), ("euml", 'ë'), ("igrave", 'ì'), ("iacute", 'í'),
        ("icirc", 'î'), ("iuml", 'ï'), ("eth", 'ð'), ("ntilde", 'ñ'), ("ograve", 'ò'),
        ("oacute", 'ó'), ("ocirc", 'ô'), ("otilde", 'õ'), ("ouml", 'ö'), ("oslash", 'ø'),
        ("ugrave", 'ù'), ("uacute", 'ú'), ("ucirc", 'û'), ("uuml", 'ü'), ("yacute", 'ý'),
        ("thorn", 'þ'), ("yuml", 'ÿ'), ("OElig", 'Œ'), ("oelig", 'œ'), ("Scaron", 'Š'),
        ("scaron", 'š'), ("Yuml", 'Ÿ'),
        // punctuation
        ("ensp", '\u{2002}'), ("emsp", '\u{2003}'), ("thinsp", '\u{2009}'),
        ("ndash", '–'), ("mdash", '—'), ("lsquo", '‘'), ("rsquo", '’'), ("sbquo", '‚'),
        ("ldquo", '“'), ("rdquo", '”'), ("bdquo", '„'), ("bull", '•'), ("hellip", '…'),
        ("prime", '′'), ("Prime", '″'), ("frasl", '⁄'), ("minus", '−'), ("euro", '€'),
        ("trade", '™'),
    ];
    TABLE.iter().copied().collect()
});

/// Entities that are matched regardless of case (`&AMP;`, `&Quot;`).
const CASE_INSENSITIVE: &[&str] = &["amp", "lt", "gt", "quot", "apos", "nbsp"];

/// Replace HTML entities and numeric character references with literal text.
///
/// Decoding runs to a fixpoint, so double-escaped input (`&amp;amp;`) is fully
/// decoded and the function is idempotent. `None` yields an empty string.
pub fn decode_entities(input: Option<&str>) -> String {
    let Some(s) = input else {
        return String::new();
    };

    if !s.contains('&') {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        push_decoded(&mut out, c);
    }
    out
}

/// `decode_entities` for a present string.
pub fn decode(s: &str) -> String {
    decode_entities(Some(s))
}

/// Decode and trim; `None` when nothing is left.
pub fn clean(s: &str) -> Option<String> {
    let decoded = decode(s);
    let trimmed = decoded.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Append `c`. A `;` that closes a known reference collapses it in place, and
/// the decoded char goes through the same check, so `&amp;amp;` unwinds in a
/// single left-to-right pass.
fn push_decoded(out: &mut String, mut c: char) {
    loop {
        out.push(c);
        if c != ';' {
            return;
        }
        let floor = out.len().saturating_sub(MAX_ENTITY_LEN);
        let Some(amp) = out.as_bytes()[floor..]
            .iter()
            .rposition(|&b| b == b'&')
            .map(|i| floor + i)
        else {
            return;
        };
        let Some(decoded) = ENTITY_RE
            .captures(&out[amp..])
            .and_then(|caps| resolve(&caps[1]))
        else {
            return;
        };
        out.truncate(amp);
        c = decoded;
    }
}

fn resolve(name: &str) -> Option<char> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse::<u32>().ok()?,
        };
        if code == 0 {
            return None;
        }
        return char::from_u32(code);
    }

    if let Some(c) = NAMED_ENTITIES.get(name) {
        return Some(*c);
    }
    let lower = name.to_ascii_lowercase();
    if CASE_INSENSITIVE.contains(&lower.as_str()) {
        return NAMED_ENTITIES.get(lower.as_str()).copied();
    }
    None
}
