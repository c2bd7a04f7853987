pub mod argument;
pub mod tokenizer;

pub use argument::{ArgType, ArgValue, Token};

/// A command line broken into its keyword and typed arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub raw: String,
    /// First token, lowercased.
    pub command: String,
    pub args: Vec<Token>,
}

impl Message {
    /// Parse a raw command line. Returns `None` when there is nothing to parse.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut tokens = tokenizer::tokenize(raw).into_iter();
        let command = tokens.next()?.to_lowercase();

        Some(Self {
            raw: raw.to_string(),
            command,
            args: tokens.map(Token::new).collect(),
        })
    }

    // First argument of the given type, if any
    #[cfg(test)]
    pub fn first_of(&self, arg_type: ArgType) -> Option<&Token> {
        self.args.iter().find(|arg| arg.arg_type() == arg_type)
    }
}
