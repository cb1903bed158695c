// ── Local id escaping ──
//
// Gateway topics carry device and service ids as single path segments, so
// the MQTT wildcard and separator characters must not appear verbatim.

/// Characters that are escaped, with their percent-encoded form.
/// `%` is listed so that already-escaped looking input survives a round trip.
const ESCAPES: [(char, &str); 4] = [('%', "%25"), ('+', "%2B"), ('#', "%23"), ('/', "%2F")];

/// Percent-encode `%`, `+`, `#` and `/`. Every other character passes
/// through unchanged.
pub fn encode(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match ESCAPES.iter().find(|(ch, _)| *ch == c) {
            Some((_, escaped)) => out.push_str(escaped),
            None => out.push(c),
        }
    }
    out
}

/// Exact inverse of [`encode`]. Only the four sequences produced by
/// `encode` are unescaped; any other `%` is copied as is.
pub fn decode(encoded: &str) -> String {
    let mut out = String::with_capacity(encoded.len());
    let mut rest = encoded;
    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        match tail.get(..3).and_then(unescape) {
            Some(c) => {
                out.push(c);
                rest = &tail[3..];
            }
            None => {
                out.push('%');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn unescape(sequence: &str) -> Option<char> {
    ESCAPES
        .iter()
        .find(|(_, escaped)| *escaped == sequence)
        .map(|(c, _)| *c)
}
