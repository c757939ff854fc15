use std::collections::HashMap;

use clap::Command;

/// Raw tokens sorted by whether a clap command recognises them
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SplitTokens {
    /// Recognised flags, with their values where they take one
    pub known: Vec<String>,
    /// Bare words and everything after `--`
    pub positional: Vec<String>,
    /// Option-like tokens the command doesn't define, in the order they were seen
    pub unknown: Vec<String>,
}

impl SplitTokens {
    /// Argument vector clap can parse strictly
    pub fn clap_args(&self, bin_name: &str) -> Vec<String> {
        let mut args = Vec::with_capacity(self.known.len() + self.positional.len() + 2);
        args.push(bin_name.to_string());
        args.extend(self.known.iter().cloned());
        if !self.positional.is_empty() {
            args.push("--".to_string());
            args.extend(self.positional.iter().cloned());
        }
        args
    }
}

/// Flags a clap command defines, and whether each one takes a value
#[derive(Debug)]
pub struct FlagTable {
    longs: HashMap<String, bool>,
    shorts: HashMap<char, bool>,
}

impl FlagTable {
    pub fn from_command(mut command: Command) -> FlagTable {
        // help and version only exist once the command is built
        command.build();
        let mut longs = HashMap::new();
        let mut shorts = HashMap::new();
        for arg in command.get_arguments().filter(|arg| !arg.is_positional()) {
            let takes_value = arg.get_action().takes_values();
            if let Some(long) = arg.get_long() {
                longs.insert(long.to_string(), takes_value);
            }
            if let Some(short) = arg.get_short() {
                shorts.insert(short, takes_value);
            }
        }
        FlagTable { longs, shorts }
    }

    /// Split tokens without failing on anything unknown
    pub fn split<I>(&self, tokens: I) -> SplitTokens
    where
        I: IntoIterator<Item = String>,
    {
        let mut split = SplitTokens::default();
        let mut tokens = tokens.into_iter().peekable();

        while let Some(token) = tokens.next() {
            if token == "--" {
                split.positional.extend(tokens);
                break;
            }
            if !looks_like_option(&token) {
                split.positional.push(token);
                continue;
            }

            let takes_value = match token.strip_prefix("--") {
                Some(body) => match body.split_once('=') {
                    Some((name, _)) => self.longs.get(name).map(|_| false),
                    None => self.longs.get(body).copied(),
                },
                None => {
                    let mut chars = token.chars().skip(1);
                    match (chars.next(), chars.next()) {
                        (Some(short), None) => self.shorts.get(&short).copied(),
                        _ => None,
                    }
                }
            };

            match takes_value {
                Some(true) => {
                    split.known.push(token);
                    if let Some(value) = tokens.next_if(|next| !looks_like_option(next)) {
                        split.known.push(value);
                    }
                }
                Some(false) => split.known.push(token),
                None => split.unknown.push(token),
            }
        }

        split
    }
}

/// `-x`, `--xyz`, but not a lone `-` or a negative number
fn looks_like_option(token: &str) -> bool {
    match token.strip_prefix('-') {
        Some(rest) => !rest.is_empty() && !rest.starts_with(|c: char| c.is_ascii_digit() || c == '.'),
        None => false,
    }
}
