use std::fmt;

/// Kind of a command argument, decided only by its delimiters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgType {
    String,
    Number,
    List,
    Flag,
    Other,
}

/// Parsed value of an argument. Each variant carries the payload for its kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgValue {
    String(String),
    /// `None` when the text after `#` is not a number that fits.
    Number(Option<u64>),
    List(Vec<String>),
    Flag(String),
    Other(String),
}

impl ArgValue {
    pub fn arg_type(&self) -> ArgType {
        match self {
            ArgValue::String(_) => ArgType::String,
            ArgValue::Number(_) => ArgType::Number,
            ArgValue::List(_) => ArgType::List,
            ArgValue::Flag(_) => ArgType::Flag,
            ArgValue::Other(_) => ArgType::Other,
        }
    }
}

/// One argument token of a command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub raw: String,
    pub value: ArgValue,
}

impl Token {
    pub fn new(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
            value: parse(raw, classify(raw)),
        }
    }

    pub fn arg_type(&self) -> ArgType {
        self.value.arg_type()
    }

    /// Text a user meant by this token: quoted strings lose their quotes, everything else is
    /// taken as typed.
    pub fn text(&self) -> &str {
        match &self.value {
            ArgValue::String(s) | ArgValue::Other(s) => s,
            _ => &self.raw,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn wrapped_in(raw: &str, open: char, close: char) -> bool {
    let mut chars = raw.chars();
    // A lone delimiter is both first and last char; it needs a real partner
    matches!((chars.next(), chars.next_back()), (Some(first), Some(last)) if first == open && last == close)
}

/// Decide the type of an argument from its opening and closing characters.
///
/// Priority is STRING, NUMBER, FLAG, LIST, then OTHER. Nothing is evaluated here.
pub fn classify(raw: &str) -> ArgType {
    if wrapped_in(raw, '"', '"') {
        return ArgType::String;
    }

    if let Some(digits) = raw.strip_prefix('#') {
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            return ArgType::Number;
        }
    }

    if raw.len() > 2 && raw.starts_with("--") {
        return ArgType::Flag;
    }

    if wrapped_in(raw, '[', ']') || wrapped_in(raw, '(', ')') {
        return ArgType::List;
    }

    ArgType::Other
}

// Drop the first and last char, whatever they are.
fn strip_outer(raw: &str) -> &str {
    let mut chars = raw.chars();
    chars.next();
    chars.next_back();
    chars.as_str()
}

/// Turn an argument into a usable value for the given type.
///
/// The type is trusted, not checked: a number parsed as a string still loses its first and
/// last char. Never panics; a bad number comes back as `Number(None)`.
pub fn parse(raw: &str, arg_type: ArgType) -> ArgValue {
    match arg_type {
        ArgType::String => ArgValue::String(strip_outer(raw).to_string()),
        ArgType::Number => {
            let digits = raw.strip_prefix('#').unwrap_or(raw);
            let value = if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
                digits.parse::<u64>().ok()
            } else {
                None
            };
            ArgValue::Number(value)
        }
        ArgType::List => {
            let inner = strip_outer(raw);
            if inner.trim().is_empty() {
                ArgValue::List(Vec::new())
            } else {
                ArgValue::List(inner.split(',').map(|part| part.trim().to_string()).collect())
            }
        }
        ArgType::Flag => ArgValue::Flag(raw.strip_prefix("--").unwrap_or(raw).to_string()),
        ArgType::Other => ArgValue::Other(raw.to_string()),
    }
}
