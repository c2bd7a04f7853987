use thiserror::Error;

/// Reasons a command could not be carried out. All of them end up as a reply to the user.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("{0}")]
    Format(String),

    #[error("A poll can have at most {max} choices, got {given}.")]
    TooManyChoices { given: usize, max: usize },

    #[error("Poll #{0} does not exist here.")]
    UnknownPoll(u64),

    #[error("There are no open polls here.")]
    NoActivePoll,

    #[error("Several polls are open here ({}); pick one with `#<id>`.", list_ids(.0))]
    AmbiguousPoll(Vec<u64>),

    #[error("Only members with the `{0}` role can vote in this poll.")]
    RoleRequired(String),

    #[error("Only the creator of poll #{0} can close it.")]
    NotCreator(u64),
}

fn list_ids(ids: &[u64]) -> String {
    ids.iter().map(|id| format!("#{}", id)).collect::<Vec<_>>().join(", ")
}

/// Problems with a recognised creation flag. Never fatal: the flag is dropped and this text
/// goes into the poll's footnote.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FlagValidationError {
    #[error("--{flag} needs a value; ignored.")]
    MissingArgument { flag: String },

    #[error("--{flag} expects {expected}, got `{given}`; ignored.")]
    InvalidArgument {
        flag: String,
        expected: &'static str,
        given: String,
    },

    #[error("--{flag} supports at most {max} choices; using letters instead.")]
    TooManyChoices { flag: String, max: usize },

    #[error("--{dropped} cannot be combined with --{kept}; ignored.")]
    Conflict { dropped: String, kept: String },
}

/// Startup failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("DISCORD_TOKEN is not set")]
    MissingToken,

    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid value for {key}: `{value}`")]
    InvalidValue { key: String, value: String },
}
