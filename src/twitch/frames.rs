//! Mapping between Twitch IRC lines and tagged frames, plus the payload
//! decoders the dispatcher handlers use.

use std::collections::HashMap;

use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use crate::domain::{
    color::Color,
    frame::{FrameTag, IrcLine, ParseError, RawFrame},
    message::MessageKind,
    room_state::{FollowersOnly, RoomStateUpdate},
    user::User,
};

const ACTION_PREFIX: &str = "\u{1}ACTION ";
const CTCP_DELIMITER: char = '\u{1}';
const ME_COMMAND: &str = "/me ";

/// Tags of USERSTATE/GLOBALUSERSTATE that describe the logged-in account.
const OWN_USER_TAGS: [&str; 7] = [
    "user-id",
    "display-name",
    "color",
    "badges",
    "mod",
    "subscriber",
    "vip",
];

/// Turns one server line into the frames it stands for, in order.
///
/// Connection plumbing (PING, RECONNECT) is handled by the transport and
/// must not be passed here.
pub fn map_line(line: IrcLine, own_login: &str) -> Vec<RawFrame> {
    let command = line.command.clone();
    match command.as_str() {
        "001" => vec![RawFrame::line(FrameTag::Logon, line)],
        "JOIN" if is_own(&line, own_login) => vec![RawFrame::line(FrameTag::Join, line)],
        "PRIVMSG" | "WHISPER" => vec![RawFrame::line(FrameTag::Message, line)],
        "NOTICE" => vec![RawFrame::line(FrameTag::Notice, line)],
        "ROOMSTATE" => {
            // A full state carries every flag; a toggle carries only the
            // flag that changed.
            let is_toggle = !line.tags.contains_key("subs-only");
            let followers_toggle = is_toggle && line.tags.contains_key("followers-only");

            if followers_toggle {
                vec![
                    RawFrame::line(FrameTag::RoomState, line.clone()),
                    RawFrame::line(FrameTag::FollowersOnly, line),
                ]
            } else {
                vec![RawFrame::line(FrameTag::RoomState, line)]
            }
        }
        other => {
            let tag = FrameTag::Other(other.to_owned());
            vec![RawFrame::line(tag, line)]
        }
    }
}

/// Keeps the account tags the server reports for us, for local echoes.
pub fn remember_own_tags(line: &IrcLine, own_tags: &mut HashMap<String, String>) {
    for name in OWN_USER_TAGS {
        if let Some(value) = line.tag(name) {
            own_tags.insert(name.to_owned(), value.to_owned());
        }
    }
}

/// The line the server would have sent for our own PRIVMSG. Twitch does not
/// echo it, so the transport builds it locally after a successful write.
pub fn own_message(
    own_login: &str,
    own_tags: &HashMap<String, String>,
    channel: &str,
    text: &str,
) -> IrcLine {
    let mut tags = own_tags.clone();
    tags.insert("id".to_owned(), Uuid::new_v4().to_string());
    tags.insert(
        "tmi-sent-ts".to_owned(),
        Utc::now().timestamp_millis().to_string(),
    );

    let text = text.replace(['\r', '\n'], " ");
    let body = match text.strip_prefix(ME_COMMAND) {
        Some(action) => format!("{ACTION_PREFIX}{action}{CTCP_DELIMITER}"),
        None => text,
    };

    IrcLine {
        tags,
        prefix: Some(format!("{own_login}!{own_login}@{own_login}.tmi.twitch.tv")),
        command: "PRIVMSG".to_owned(),
        params: vec![format!("#{channel}"), body],
    }
}

fn is_own(line: &IrcLine, own_login: &str) -> bool {
    line.nick()
        .is_some_and(|nick| nick.eq_ignore_ascii_case(own_login))
}

pub fn message_kind(line: &IrcLine) -> Result<MessageKind, ParseError> {
    match line.command.as_str() {
        "WHISPER" => Ok(MessageKind::Whisper),
        "PRIVMSG" => {
            let text = chat_body(line)?;
            if text.starts_with(ACTION_PREFIX) {
                Ok(MessageKind::Action)
            } else {
                Ok(MessageKind::Chat)
            }
        }
        other => Err(ParseError::MalformedLine(format!(
            "`{other}` is not a chat line"
        ))),
    }
}

/// Message body with the `/me` wrapper removed.
pub fn message_text(line: &IrcLine) -> Result<&str, ParseError> {
    let text = chat_body(line)?;

    Ok(match text.strip_prefix(ACTION_PREFIX) {
        Some(action) => action.strip_suffix(CTCP_DELIMITER).unwrap_or(action),
        None => text,
    })
}

/// The text param of `PRIVMSG #channel :text`; the channel alone is not a body.
fn chat_body(line: &IrcLine) -> Result<&str, ParseError> {
    match line.params.as_slice() {
        [_, .., text] => Ok(text.as_str()),
        _ => Err(ParseError::Missing("message text")),
    }
}

/// Builds the sender from the line tags. Returns the user and whether the
/// sender is the logged-in account.
pub fn sender(line: &IrcLine, own_login: &str) -> Result<(User, bool), ParseError> {
    let login = line
        .nick()
        .ok_or(ParseError::Missing("sender prefix"))?
        .to_ascii_lowercase();
    let is_self = login.eq_ignore_ascii_case(own_login);
    let badges = line.tag("badges").unwrap_or_default();

    let user = User {
        id: line
            .tag("user-id")
            .filter(|id| !id.is_empty())
            .map_or_else(|| login.clone(), str::to_owned),
        display_name: line.tag("display-name").unwrap_or_default().to_owned(),
        color: line
            .tag("color")
            .filter(|color| !color.is_empty())
            .map(Color::new),
        is_self,
        is_moderator: flag_tag(line, "mod") || has_badge(badges, "moderator"),
        is_broadcaster: has_badge(badges, "broadcaster"),
        is_subscriber: flag_tag(line, "subscriber") || has_badge(badges, "subscriber"),
        is_vip: flag_tag(line, "vip") || has_badge(badges, "vip"),
        login,
    };

    Ok((user, is_self))
}

fn flag_tag(line: &IrcLine, name: &str) -> bool {
    line.tag(name) == Some("1")
}

fn has_badge(badges: &str, name: &str) -> bool {
    badges
        .split(',')
        .filter_map(|badge| badge.split('/').next())
        .any(|badge| badge == name)
}

/// Raw `badges` markup, if the sender has any.
pub fn badges(line: &IrcLine) -> Option<String> {
    line.tag("badges")
        .filter(|badges| !badges.is_empty())
        .map(str::to_owned)
}

pub fn message_id(line: &IrcLine) -> Option<String> {
    line.tag("id").filter(|id| !id.is_empty()).map(str::to_owned)
}

pub fn sent_at(line: &IrcLine) -> Option<DateTime<Utc>> {
    let millis = line.tag("tmi-sent-ts")?.parse::<i64>().ok()?;
    Utc.timestamp_millis_opt(millis).single()
}

pub fn channel(line: &IrcLine) -> Result<String, ParseError> {
    line.channel()
        .map(str::to_ascii_lowercase)
        .ok_or(ParseError::Missing("channel"))
}

/// Decodes the flags present on a ROOMSTATE line.
pub fn room_state_update(line: &IrcLine) -> Result<RoomStateUpdate, ParseError> {
    Ok(RoomStateUpdate {
        room_id: line.tag("room-id").map(str::to_owned),
        slow_mode_secs: line
            .tag("slow")
            .map(|value| parse_number::<u64>("slow", value))
            .transpose()?,
        followers_only: line
            .tag("followers-only")
            .map(parse_followers_only)
            .transpose()?,
        emote_only: optional_bool(line, "emote-only")?,
        r9k: optional_bool(line, "r9k")?,
        subscribers_only: optional_bool(line, "subs-only")?,
    })
}

pub fn followers_only(line: &IrcLine) -> Result<FollowersOnly, ParseError> {
    let value = line
        .tag("followers-only")
        .ok_or(ParseError::Missing("followers-only"))?;
    parse_followers_only(value)
}

fn parse_followers_only(value: &str) -> Result<FollowersOnly, ParseError> {
    let minutes = parse_number::<i64>("followers-only", value)?;
    if minutes < 0 {
        return Ok(FollowersOnly::Disabled);
    }

    let minutes = u32::try_from(minutes).map_err(|_| ParseError::InvalidTag {
        name: "followers-only",
        value: value.to_owned(),
    })?;
    Ok(FollowersOnly::Enabled { minutes })
}

fn optional_bool(line: &IrcLine, name: &'static str) -> Result<Option<bool>, ParseError> {
    line.tag(name)
        .map(|value| match value {
            "0" => Ok(false),
            "1" => Ok(true),
            other => Err(ParseError::InvalidTag {
                name,
                value: other.to_owned(),
            }),
        })
        .transpose()
}

fn parse_number<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ParseError> {
    value.parse::<T>().map_err(|_| ParseError::InvalidTag {
        name,
        value: value.to_owned(),
    })
}

/// Server notice text and its optional `msg-id`.
pub fn notice(line: &IrcLine) -> Result<(String, Option<String>), ParseError> {
    let text = line.trailing().ok_or(ParseError::Missing("notice text"))?;
    Ok((text.to_owned(), line.tag("msg-id").map(str::to_owned)))
}

/// Whether a NOTICE is the server rejecting our credentials.
pub fn is_login_failure(line: &IrcLine) -> bool {
    line.command == "NOTICE"
        && line.trailing().is_some_and(|text| {
            text.starts_with("Login authentication failed")
                || text.starts_with("Improperly formatted auth")
                || text.starts_with("Login unsuccessful")
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::twitch::irc::parse_line;

    fn line(raw: &str) -> IrcLine {
        parse_line(raw).expect("fixture line should parse")
    }

    #[test]
    fn full_room_state_maps_to_one_frame() {
        let frames = map_line(
            line("@emote-only=0;followers-only=-1;r9k=0;room-id=1;slow=0;subs-only=0 :tmi.twitch.tv ROOMSTATE #chan"),
            "me",
        );

        let tags: Vec<_> = frames.iter().map(|frame| frame.tag.clone()).collect();
        assert_eq!(tags, vec![FrameTag::RoomState]);
    }

    #[test]
    fn followers_toggle_maps_to_room_state_then_followers_only() {
        let frames = map_line(
            line("@followers-only=10;room-id=1 :tmi.twitch.tv ROOMSTATE #chan"),
            "me",
        );

        let tags: Vec<_> = frames.iter().map(|frame| frame.tag.clone()).collect();
        assert_eq!(tags, vec![FrameTag::RoomState, FrameTag::FollowersOnly]);
    }

    #[test]
    fn only_own_join_is_a_join_frame() {
        let own = map_line(line(":me!me@me.tmi.twitch.tv JOIN #chan"), "Me");
        let other = map_line(line(":you!you@you.tmi.twitch.tv JOIN #chan"), "me");

        assert_eq!(own[0].tag, FrameTag::Join);
        assert_eq!(other[0].tag, FrameTag::Other("JOIN".to_owned()));
    }

    #[test]
    fn detects_action_and_unwraps_its_text() {
        let action = line(":u!u@u PRIVMSG #chan :\u{1}ACTION waves\u{1}");

        assert_eq!(message_kind(&action), Ok(MessageKind::Action));
        assert_eq!(message_text(&action), Ok("waves"));
    }

    #[test]
    fn own_message_is_a_self_chat_line_with_known_tags() {
        let mut own_tags = HashMap::new();
        remember_own_tags(
            &line("@color=#00FF7F;display-name=Me;user-id=99;emote-sets=0 :tmi.twitch.tv GLOBALUSERSTATE"),
            &mut own_tags,
        );

        let echo = own_message("me", &own_tags, "chan", "hello\nthere");

        let (user, is_self) = sender(&echo, "me").expect("echo should carry a sender");
        assert!(is_self);
        assert_eq!(user.id, "99");
        assert_eq!(user.color, Some(Color::new("#00FF7F")));
        assert_eq!(echo.channel(), Some("chan"));
        assert_eq!(message_kind(&echo), Ok(MessageKind::Chat));
        assert_eq!(message_text(&echo), Ok("hello there"));
        assert!(message_id(&echo).is_some());
        assert!(!own_tags.contains_key("emote-sets"));
    }

    #[test]
    fn own_me_command_becomes_an_action() {
        let echo = own_message("me", &HashMap::new(), "chan", "/me waves");

        assert_eq!(message_kind(&echo), Ok(MessageKind::Action));
        assert_eq!(message_text(&echo), Ok("waves"));
    }

    #[test]
    fn privmsg_without_text_is_rejected() {
        let bare = line(":viewer!viewer@viewer PRIVMSG #chan");

        assert_eq!(
            message_text(&bare),
            Err(ParseError::Missing("message text"))
        );
        assert_eq!(
            message_kind(&bare),
            Err(ParseError::Missing("message text"))
        );
    }

    #[test]
    fn whisper_lines_have_whisper_kind() {
        let whisper = line(":u!u@u WHISPER me :psst");

        assert_eq!(message_kind(&whisper), Ok(MessageKind::Whisper));
    }

    #[test]
    fn sender_reads_tags_and_badges() {
        let privmsg = line(
            "@badges=broadcaster/1,subscriber/0;color=;display-name=Streamer;mod=0;user-id=7 \
             :streamer!streamer@streamer PRIVMSG #streamer :hi",
        );

        let (user, is_self) = sender(&privmsg, "viewer").expect("sender should decode");

        assert_eq!(user.id, "7");
        assert_eq!(user.login, "streamer");
        assert_eq!(user.display_name, "Streamer");
        assert_eq!(user.color, None);
        assert!(user.is_broadcaster);
        assert!(user.is_subscriber);
        assert!(!user.is_moderator);
        assert!(!is_self);
    }

    #[test]
    fn sender_id_falls_back_to_login() {
        let privmsg = line(":Viewer!viewer@viewer PRIVMSG #chan :hi");

        let (user, is_self) = sender(&privmsg, "viewer").expect("sender should decode");

        assert_eq!(user.id, "viewer");
        assert!(is_self);
    }

    #[test]
    fn room_state_decodes_present_flags_only() {
        let update = room_state_update(&line(
            "@slow=30;emote-only=1;room-id=9 :tmi.twitch.tv ROOMSTATE #chan",
        ))
        .expect("update should decode");

        assert_eq!(update.slow_mode_secs, Some(30));
        assert_eq!(update.emote_only, Some(true));
        assert_eq!(update.room_id.as_deref(), Some("9"));
        assert_eq!(update.followers_only, None);
        assert_eq!(update.r9k, None);
    }

    #[test]
    fn room_state_rejects_values_of_the_wrong_type() {
        let result = room_state_update(&line("@slow=fast :tmi.twitch.tv ROOMSTATE #chan"));

        assert_eq!(
            result,
            Err(ParseError::InvalidTag {
                name: "slow",
                value: "fast".to_owned()
            })
        );
    }

    #[test]
    fn followers_only_decodes_disabled_and_duration() {
        assert_eq!(parse_followers_only("-1"), Ok(FollowersOnly::Disabled));
        assert_eq!(
            parse_followers_only("0"),
            Ok(FollowersOnly::Enabled { minutes: 0 })
        );
        assert_eq!(
            parse_followers_only("30"),
            Ok(FollowersOnly::Enabled { minutes: 30 })
        );
    }

    #[test]
    fn reads_sent_timestamp() {
        let privmsg = line("@tmi-sent-ts=1700000000000 :u!u@u PRIVMSG #chan :hi");

        let sent = sent_at(&privmsg).expect("timestamp should decode");
        assert_eq!(sent.timestamp_millis(), 1_700_000_000_000);
    }

    #[test]
    fn recognizes_login_failure_notice() {
        let failure = line(":tmi.twitch.tv NOTICE * :Login authentication failed");
        let regular = line("@msg-id=slow_on :tmi.twitch.tv NOTICE #chan :This room is now in slow mode.");

        assert!(is_login_failure(&failure));
        assert!(!is_login_failure(&regular));
    }
}
