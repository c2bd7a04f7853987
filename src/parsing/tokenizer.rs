use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Alternatives are tried left to right at each position, which gives the precedence:
    // bracket run, quoted run, bare word. A stray `[`, `]` or `"` that never closed is kept as
    // a literal character. Adjacent segments with no whitespace between them form one token.
    static ref TOKEN_RE: Regex =
        Regex::new(r#"(?:\[[^\[\]]*\]|"[^"]*"|[^\s"\[\]]+|["\[\]])+"#)
            .expect("token pattern should compile");
}

/// Split a raw command line into its tokens, in order.
///
/// `[...]` runs and `"..."` runs keep their delimiters and may contain whitespace. Outside of
/// them tokens are split on whitespace only. Empty or whitespace-only input gives no tokens.
pub fn tokenize(raw: &str) -> Vec<&str> {
    TOKEN_RE.find_iter(raw).map(|m| m.as_str()).collect()
}
