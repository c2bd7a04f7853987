use std::collections::BTreeMap;

use log::debug;

use crate::error::{CommandError, FlagValidationError};
use crate::parsing::{ArgType, ArgValue, Token};

/// Upper bound for `--color`. Anything above 0xFFFFFF is masked when rendered.
pub const MAX_COLOR: u32 = 256 * 256 * 256;

/// Keys voters type (and see next to each choice).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAlphabet {
    Letters,
    Numbers,
    YesNo,
}

impl KeyAlphabet {
    pub fn capacity(self) -> usize {
        match self {
            KeyAlphabet::Letters => 26,
            KeyAlphabet::Numbers => 11,
            KeyAlphabet::YesNo => 2,
        }
    }

    pub fn keys(self, count: usize) -> Vec<String> {
        match self {
            KeyAlphabet::Letters => (b'A'..=b'Z')
                .take(count)
                .map(|b| char::from(b).to_string())
                .collect(),
            KeyAlphabet::Numbers => (0..count.min(11)).map(|n| n.to_string()).collect(),
            KeyAlphabet::YesNo => ["YES", "NO"].iter().take(count).map(|k| k.to_string()).collect(),
        }
    }
}

/// Boolean switches of a poll, one field per concept after alias resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollFlags {
    pub lock_edits: bool,
    pub blind: bool,
    // Recorded only; voting stays single-choice.
    pub multiple: bool,
    // Recorded only; there is no reaction voting.
    pub reactions: bool,
    // Recorded only; the close timer still fires.
    pub leave_open: bool,
    pub include_unsure: bool,
    /// Flags nobody recognised, kept as typed.
    pub extra: BTreeMap<String, bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KnownFlag {
    Time,
    Color,
    Role,
    Numbers,
    YesNo,
    Lock,
    Blind,
    Multiple,
    Reactions,
    LeaveOpen,
    Maybe,
}

impl KnownFlag {
    fn resolve(name: &str) -> Option<Self> {
        let flag = match name {
            "time" | "timeout" => KnownFlag::Time,
            "color" | "colour" => KnownFlag::Color,
            "role" => KnownFlag::Role,
            "numbers" | "num" => KnownFlag::Numbers,
            "yesno" | "yn" => KnownFlag::YesNo,
            "lock" => KnownFlag::Lock,
            "blind" => KnownFlag::Blind,
            "mult" | "multiple" => KnownFlag::Multiple,
            "reactions" | "rxn" => KnownFlag::Reactions,
            "lo" | "leaveopen" | "dontcloseearly" => KnownFlag::LeaveOpen,
            "maybe" | "idk" => KnownFlag::Maybe,
            _ => return None,
        };
        Some(flag)
    }

    fn takes_value(self) -> bool {
        matches!(self, KnownFlag::Time | KnownFlag::Color | KnownFlag::Role)
    }
}

/// Values used when a flag is absent or rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollDefaults {
    pub timeout_minutes: u64,
    pub color: u32,
}

/// Where a poll was asked for, and by whom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollOrigin {
    pub scope_id: String,
    pub channel_id: String,
    pub creator_id: String,
}

/// Validated creation request for a poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollOptions {
    pub name: String,
    pub choices: Vec<String>,
    pub alphabet: KeyAlphabet,
    pub timeout_minutes: u64,
    pub color: u32,
    pub flags: PollFlags,
    pub restrict_role: Option<String>,
    pub origin: PollOrigin,
    /// Non-fatal flag problems, shown in the footnote.
    pub notes: Vec<FlagValidationError>,
}

fn integer_value(token: &Token) -> Option<u64> {
    match &token.value {
        ArgValue::Number(n) => *n,
        ArgValue::Other(s) => s.parse::<u64>().ok(),
        _ => None,
    }
}

impl PollOptions {
    /// Build options from the arguments of a create command.
    ///
    /// The first quoted string is the title and the first list holds the choices. A flag
    /// that takes a value consumes the next token unless that token is another flag.
    pub fn from_args(
        args: &[Token],
        origin: PollOrigin,
        defaults: &PollDefaults,
    ) -> Result<Self, CommandError> {
        let mut title: Option<String> = None;
        let mut labels: Option<Vec<String>> = None;
        let mut timeout_minutes = defaults.timeout_minutes;
        let mut color = defaults.color;
        let mut restrict_role: Option<String> = None;
        let mut alphabet_request: Option<(KeyAlphabet, String)> = None;
        let mut flags = PollFlags::default();
        let mut notes = Vec::new();

        let mut iter = args.iter().peekable();
        while let Some(token) = iter.next() {
            let name = match &token.value {
                ArgValue::String(s) if title.is_none() => {
                    title = Some(s.clone());
                    continue;
                }
                ArgValue::List(items) if labels.is_none() => {
                    labels = Some(items.clone());
                    continue;
                }
                ArgValue::Flag(name) => name,
                _ => {
                    debug!("Ignoring stray poll argument {}", token);
                    continue;
                }
            };

            let Some(flag) = KnownFlag::resolve(name) else {
                flags.extra.insert(name.clone(), true);
                continue;
            };

            if !flag.takes_value() {
                match flag {
                    KnownFlag::Numbers => alphabet_request = Some((KeyAlphabet::Numbers, name.clone())),
                    KnownFlag::YesNo => alphabet_request = Some((KeyAlphabet::YesNo, name.clone())),
                    KnownFlag::Lock => flags.lock_edits = true,
                    KnownFlag::Blind => flags.blind = true,
                    KnownFlag::Multiple => flags.multiple = true,
                    KnownFlag::Reactions => flags.reactions = true,
                    KnownFlag::LeaveOpen => flags.leave_open = true,
                    KnownFlag::Maybe => flags.include_unsure = true,
                    KnownFlag::Time | KnownFlag::Color | KnownFlag::Role => {}
                }
                continue;
            }

            let Some(value) = iter.next_if(|next| next.arg_type() != ArgType::Flag) else {
                notes.push(FlagValidationError::MissingArgument { flag: name.clone() });
                continue;
            };

            match flag {
                KnownFlag::Time => match integer_value(value) {
                    Some(minutes) if minutes > 0 => timeout_minutes = minutes,
                    _ => notes.push(FlagValidationError::InvalidArgument {
                        flag: name.clone(),
                        expected: "a positive number of minutes",
                        given: value.raw.clone(),
                    }),
                },
                KnownFlag::Color => match integer_value(value) {
                    Some(code) if code <= u64::from(MAX_COLOR) => color = code as u32,
                    _ => notes.push(FlagValidationError::InvalidArgument {
                        flag: name.clone(),
                        expected: "a color code from 0 to 16777216",
                        given: value.raw.clone(),
                    }),
                },
                KnownFlag::Role => match &value.value {
                    ArgValue::String(role) | ArgValue::Other(role) if !role.trim().is_empty() => {
                        restrict_role = Some(role.trim().to_string())
                    }
                    _ => notes.push(FlagValidationError::InvalidArgument {
                        flag: name.clone(),
                        expected: "a quoted role name",
                        given: value.raw.clone(),
                    }),
                },
                _ => {}
            }
        }

        let name = match title {
            Some(t) if !t.trim().is_empty() => t.trim().to_string(),
            _ => {
                return Err(CommandError::Format(
                    "A poll needs a quoted title.".to_string(),
                ));
            }
        };
        let labels = labels.ok_or_else(|| {
            CommandError::Format("A poll needs a bracketed list of choices.".to_string())
        })?;
        let mut choices: Vec<String> = labels.into_iter().filter(|l| !l.is_empty()).collect();

        if choices.is_empty() {
            if matches!(alphabet_request, Some((KeyAlphabet::YesNo, _))) {
                choices = vec!["Yes".to_string(), "No".to_string()];
            } else {
                return Err(CommandError::Format(
                    "The list of choices is empty.".to_string(),
                ));
            }
        }

        let alphabet = match alphabet_request {
            Some((requested, flag)) if choices.len() > requested.capacity() => {
                notes.push(FlagValidationError::TooManyChoices {
                    flag,
                    max: requested.capacity(),
                });
                KeyAlphabet::Letters
            }
            Some((requested, _)) => requested,
            None => KeyAlphabet::Letters,
        };

        if choices.len() > alphabet.capacity() {
            return Err(CommandError::TooManyChoices {
                given: choices.len(),
                max: alphabet.capacity(),
            });
        }

        if restrict_role.is_some() && flags.reactions {
            flags.reactions = false;
            notes.push(FlagValidationError::Conflict {
                dropped: "reactions".to_string(),
                kept: "role".to_string(),
            });
        }

        Ok(Self {
            name,
            choices,
            alphabet,
            timeout_minutes,
            color,
            flags,
            restrict_role,
            origin,
            notes,
        })
    }

    /// Footnote text built from the collected notes.
    pub fn footnote(&self) -> Option<String> {
        if self.notes.is_empty() {
            None
        } else {
            Some(
                self.notes
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("\n"),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::Message;

    const DEFAULTS: PollDefaults = PollDefaults {
        timeout_minutes: 60,
        color: 0x3498db,
    };

    fn origin() -> PollOrigin {
        PollOrigin {
            scope_id: "guild-1".into(),
            channel_id: "42".into(),
            creator_id: "alice".into(),
        }
    }

    fn options(line: &str) -> Result<PollOptions, CommandError> {
        let msg = Message::parse(line).unwrap();
        PollOptions::from_args(&msg.args, origin(), &DEFAULTS)
    }

    #[test]
    fn plain_poll_uses_defaults() {
        let opts = options(r#"poll "Lunch?" [pizza, tacos, salad]"#).unwrap();
        assert_eq!(opts.name, "Lunch?");
        assert_eq!(opts.choices, vec!["pizza", "tacos", "salad"]);
        assert_eq!(opts.alphabet, KeyAlphabet::Letters);
        assert_eq!(opts.timeout_minutes, 60);
        assert_eq!(opts.color, 0x3498db);
        assert!(opts.notes.is_empty());
        assert_eq!(opts.footnote(), None);
    }

    #[test]
    fn aliases_resolve_to_one_field() {
        let a = options(r#"poll "Q" [a,b] --timeout 5 --colour 255 --mult --rxn --dontcloseearly --idk"#).unwrap();
        let b = options(r#"poll "Q" [a,b] --time #5 --color 255 --multiple --reactions --lo --maybe"#).unwrap();
        assert_eq!(a.timeout_minutes, 5);
        assert_eq!(a.color, 255);
        assert_eq!(a.flags, b.flags);
        assert_eq!(a.timeout_minutes, b.timeout_minutes);
        assert!(a.flags.multiple && a.flags.reactions && a.flags.leave_open && a.flags.include_unsure);
    }

    #[test]
    fn missing_title_or_list_is_a_format_error() {
        assert!(matches!(options("poll [a,b]"), Err(CommandError::Format(_))));
        assert!(matches!(options(r#"poll "Q""#), Err(CommandError::Format(_))));
        assert!(matches!(options(r#"poll "Q" []"#), Err(CommandError::Format(_))));
        assert!(matches!(options(r#"poll "  " [a]"#), Err(CommandError::Format(_))));
    }

    #[test]
    fn numbers_with_twelve_choices_falls_back_to_letters() {
        let opts = options(r#"poll "Q" [a,b,c,d,e,f,g,h,i,j,k,l] --numbers"#).unwrap();
        assert_eq!(opts.alphabet, KeyAlphabet::Letters);
        assert_eq!(opts.choices.len(), 12);
        let note = opts.footnote().unwrap();
        assert!(note.contains("--numbers"), "{}", note);
        assert!(note.contains("11"), "{}", note);
    }

    #[test]
    fn numbers_with_eleven_choices_is_kept() {
        let opts = options(r#"poll "Q" [a,b,c,d,e,f,g,h,i,j,k] --num"#).unwrap();
        assert_eq!(opts.alphabet, KeyAlphabet::Numbers);
        assert!(opts.notes.is_empty());
    }

    #[test]
    fn yesno_limits_and_defaults() {
        let opts = options(r#"poll "Q" [a,b,c] --yn"#).unwrap();
        assert_eq!(opts.alphabet, KeyAlphabet::Letters);
        assert_eq!(opts.notes.len(), 1);

        let opts = options(r#"poll "Ship it?" [] --yesno"#).unwrap();
        assert_eq!(opts.alphabet, KeyAlphabet::YesNo);
        assert_eq!(opts.choices, vec!["Yes", "No"]);
    }

    #[test]
    fn bad_flag_values_are_dropped_with_a_note() {
        let opts = options(r#"poll "Q" [a,b] --time 0 --color 99999999 --role"#).unwrap();
        assert_eq!(opts.timeout_minutes, 60);
        assert_eq!(opts.color, 0x3498db);
        assert_eq!(opts.restrict_role, None);
        assert_eq!(opts.notes.len(), 3);
        assert_eq!(
            opts.notes[2],
            FlagValidationError::MissingArgument { flag: "role".into() }
        );
    }

    #[test]
    fn value_flag_does_not_swallow_next_flag() {
        let opts = options(r#"poll "Q" [a,b] --time --lock"#).unwrap();
        assert!(opts.flags.lock_edits);
        assert_eq!(
            opts.notes,
            vec![FlagValidationError::MissingArgument { flag: "time".into() }]
        );
    }

    #[test]
    fn color_bounds_are_inclusive() {
        assert_eq!(options(r#"poll "Q" [a] --color 16777216"#).unwrap().color, MAX_COLOR);
        assert_eq!(options(r#"poll "Q" [a] --color 0"#).unwrap().color, 0);
    }

    #[test]
    fn role_is_read_from_quoted_string() {
        let opts = options(r#"poll --role "Board Members" "Budget" [yes, no]"#).unwrap();
        assert_eq!(opts.restrict_role.as_deref(), Some("Board Members"));
        assert_eq!(opts.name, "Budget");
    }

    #[test]
    fn role_wins_over_reactions() {
        let opts = options(r#"poll "Q" [a,b] --rxn --role "Mods""#).unwrap();
        assert!(!opts.flags.reactions);
        assert_eq!(opts.restrict_role.as_deref(), Some("Mods"));
        assert!(matches!(opts.notes[0], FlagValidationError::Conflict { .. }));
    }

    #[test]
    fn unknown_flags_are_kept_verbatim() {
        let opts = options(r#"poll "Q" [a,b] --Fancy --chart"#).unwrap();
        assert_eq!(opts.flags.extra.get("Fancy"), Some(&true));
        assert_eq!(opts.flags.extra.get("chart"), Some(&true));
        // Flag names are case-sensitive
        let opts = options(r#"poll "Q" [a,b] --LOCK"#).unwrap();
        assert!(!opts.flags.lock_edits);
        assert!(opts.flags.extra.contains_key("LOCK"));
    }

    #[test]
    fn too_many_letter_choices_is_rejected() {
        let labels: Vec<String> = (0..27).map(|n| format!("c{}", n)).collect();
        let line = format!(r#"poll "Q" [{}]"#, labels.join(","));
        assert_eq!(
            options(&line),
            Err(CommandError::TooManyChoices { given: 27, max: 26 })
        );
    }

    #[test]
    fn blank_labels_are_dropped() {
        let opts = options(r#"poll "Q" [a, , b,]"#).unwrap();
        assert_eq!(opts.choices, vec!["a", "b"]);
    }

    #[test]
    fn alphabet_keys() {
        assert_eq!(KeyAlphabet::Letters.keys(3), vec!["A", "B", "C"]);
        assert_eq!(KeyAlphabet::Numbers.keys(11).last().map(String::as_str), Some("10"));
        assert_eq!(KeyAlphabet::YesNo.keys(2), vec!["YES", "NO"]);
    }
}
