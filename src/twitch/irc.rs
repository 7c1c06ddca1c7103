//! IRCv3 line codec.

use std::collections::HashMap;

use crate::domain::frame::{IrcLine, ParseError};

/// Parses one line, with or without its trailing CRLF.
pub fn parse_line(raw: &str) -> Result<IrcLine, ParseError> {
    let mut rest = raw.trim_end_matches(['\r', '\n']);
    if rest.trim().is_empty() {
        return Err(ParseError::MalformedLine("empty line".to_owned()));
    }

    let mut tags = HashMap::new();
    if let Some(stripped) = rest.strip_prefix('@') {
        let (raw_tags, remainder) = split_word(stripped);
        for pair in raw_tags.split(';').filter(|pair| !pair.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            tags.insert(key.to_owned(), unescape_tag_value(value));
        }
        rest = remainder;
    }

    let mut prefix = None;
    if let Some(stripped) = rest.strip_prefix(':') {
        let (raw_prefix, remainder) = split_word(stripped);
        prefix = Some(raw_prefix.to_owned());
        rest = remainder;
    }

    let (command, mut rest) = split_word(rest);
    if command.is_empty() {
        return Err(ParseError::MalformedLine(raw.to_owned()));
    }

    let mut params = Vec::new();
    while !rest.is_empty() {
        if let Some(trailing) = rest.strip_prefix(':') {
            params.push(trailing.to_owned());
            break;
        }
        let (param, remainder) = split_word(rest);
        params.push(param.to_owned());
        rest = remainder;
    }

    Ok(IrcLine {
        tags,
        prefix,
        command: command.to_ascii_uppercase(),
        params,
    })
}

fn split_word(input: &str) -> (&str, &str) {
    match input.split_once(' ') {
        Some((word, rest)) => (word, rest.trim_start_matches(' ')),
        None => (input, ""),
    }
}

fn unescape_tag_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some(':') => out.push(';'),
            Some('s') => out.push(' '),
            Some('\\') => out.push('\\'),
            Some('r') => out.push('\r'),
            Some('n') => out.push('\n'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

/// Lines the client writes to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundCommand {
    CapabilityRequest,
    Pass(String),
    Nick(String),
    Join(String),
    Part(String),
    Privmsg { channel: String, text: String },
    Pong(Option<String>),
    Quit,
}

impl OutboundCommand {
    /// Serializes the command, CRLF included.
    pub fn to_wire(&self) -> String {
        let line = match self {
            Self::CapabilityRequest => "CAP REQ :twitch.tv/tags twitch.tv/commands".to_owned(),
            Self::Pass(token) => format!("PASS {}", oauth_token(token)),
            Self::Nick(nick) => format!("NICK {}", nick.to_ascii_lowercase()),
            Self::Join(channel) => format!("JOIN #{channel}"),
            Self::Part(channel) => format!("PART #{channel}"),
            Self::Privmsg { channel, text } => {
                format!("PRIVMSG #{channel} :{}", single_line(text))
            }
            Self::Pong(Some(server)) => format!("PONG :{server}"),
            Self::Pong(None) => "PONG".to_owned(),
            Self::Quit => "QUIT".to_owned(),
        };
        format!("{line}\r\n")
    }

    /// Label safe to log; never includes credentials.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CapabilityRequest => "CAP",
            Self::Pass(_) => "PASS",
            Self::Nick(_) => "NICK",
            Self::Join(_) => "JOIN",
            Self::Part(_) => "PART",
            Self::Privmsg { .. } => "PRIVMSG",
            Self::Pong(_) => "PONG",
            Self::Quit => "QUIT",
        }
    }
}

fn oauth_token(token: &str) -> String {
    if token.starts_with("oauth:") {
        token.to_owned()
    } else {
        format!("oauth:{token}")
    }
}

fn single_line(text: &str) -> String {
    text.replace(['\r', '\n'], " ")
}
