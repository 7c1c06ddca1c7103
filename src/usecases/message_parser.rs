use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::{
    domain::{
        color::ColorCache,
        frame::{ParseError, RawFrame},
        message::Message,
        user::User,
    },
    twitch::frames,
    usecases::color_assigner::ColorAssigner,
};

/// Turns chat frames into log messages.
#[derive(Debug, Clone)]
pub struct MessageParser {
    colors: ColorAssigner,
}

impl MessageParser {
    pub fn new(colors: ColorAssigner) -> Self {
        Self { colors }
    }

    /// Returns `Ok(None)` for frames that are not channel chat or actions.
    pub fn parse(
        &mut self,
        frame: &RawFrame,
        mut sender: User,
        is_self: bool,
        cache: &mut ColorCache,
    ) -> Result<Option<Message>, ParseError> {
        let line = frame.irc()?;
        let kind = frames::message_kind(line)?;
        if !kind.is_loggable() {
            return Ok(None);
        }

        let color = match &sender.color {
            Some(color) => color.clone(),
            None => self.colors.assign(cache, &sender.id),
        };
        sender.color = Some(color.clone());
        sender.is_self = is_self;

        Ok(Some(Message {
            id: frames::message_id(line).unwrap_or_else(|| Uuid::new_v4().to_string()),
            time: frames::sent_at(line).unwrap_or_else(Utc::now),
            kind,
            user: Arc::new(sender),
            text: strip_control_chars(frames::message_text(line)?),
            badges: frames::badges(line),
            color,
        }))
    }
}

fn strip_control_chars(text: &str) -> String {
    text.chars().filter(|ch| !ch.is_control()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{color::Color, frame::FrameTag, message::MessageKind},
        twitch::irc::parse_line,
        usecases::color_assigner::ColorStrategy,
    };

    fn frame(raw: &str) -> RawFrame {
        RawFrame::line(
            FrameTag::Message,
            parse_line(raw).expect("fixture line should parse"),
        )
    }

    fn parse(
        parser: &mut MessageParser,
        cache: &mut ColorCache,
        raw: &str,
    ) -> Result<Option<Message>, ParseError> {
        let frame = frame(raw);
        let (sender, is_self) =
            frames::sender(frame.irc().expect("line"), "me").expect("sender should decode");
        parser.parse(&frame, sender, is_self, cache)
    }

    fn parser() -> MessageParser {
        MessageParser::new(ColorAssigner::new(ColorStrategy::RoundRobin))
    }

    #[test]
    fn chat_line_becomes_a_message() {
        let mut cache = ColorCache::default();
        let message = parse(
            &mut parser(),
            &mut cache,
            "@badges=vip/1;color=#FF69B4;display-name=Someone;id=abc;tmi-sent-ts=1700000000000;user-id=1 \
             :someone!someone@someone PRIVMSG #chan :hello",
        )
        .expect("parse should succeed")
        .expect("chat should yield a message");

        assert_eq!(message.id, "abc");
        assert_eq!(message.kind, MessageKind::Chat);
        assert_eq!(message.text, "hello");
        assert_eq!(message.badges.as_deref(), Some("vip/1"));
        assert_eq!(message.color, Color::new("#FF69B4"));
        assert_eq!(message.user.color, Some(Color::new("#FF69B4")));
        assert_eq!(message.time.timestamp_millis(), 1_700_000_000_000);
        assert!(cache.is_empty(), "sender colors are not cached");
    }

    #[test]
    fn action_line_becomes_an_action_message() {
        let mut cache = ColorCache::default();
        let message = parse(
            &mut parser(),
            &mut cache,
            "@user-id=1 :someone!someone@someone PRIVMSG #chan :\u{1}ACTION dances\u{1}",
        )
        .expect("parse should succeed")
        .expect("action should yield a message");

        assert_eq!(message.kind, MessageKind::Action);
        assert_eq!(message.text, "dances");
    }

    #[test]
    fn whisper_yields_no_message() {
        let mut cache = ColorCache::default();
        let message = parse(
            &mut parser(),
            &mut cache,
            "@user-id=1 :someone!someone@someone WHISPER me :psst",
        )
        .expect("whisper is not an error");

        assert_eq!(message, None);
        assert!(cache.is_empty());
    }

    #[test]
    fn colorless_sender_keeps_one_assigned_color() {
        let mut parser = parser();
        let mut cache = ColorCache::default();
        let raw = "@user-id=7;color= :plain!plain@plain PRIVMSG #chan :hi";

        let first = parse(&mut parser, &mut cache, raw)
            .expect("parse should succeed")
            .expect("message");
        let other = parse(
            &mut parser,
            &mut cache,
            "@user-id=8 :other!other@other PRIVMSG #chan :yo",
        )
        .expect("parse should succeed")
        .expect("message");
        let second = parse(&mut parser, &mut cache, raw)
            .expect("parse should succeed")
            .expect("message");

        assert_eq!(first.color, second.color);
        assert_ne!(first.color, other.color);
        assert_eq!(second.user.color.as_ref(), Some(&first.color));
        assert_eq!(cache.get("7"), Some(&first.color));
    }

    #[test]
    fn control_characters_are_stripped() {
        let mut cache = ColorCache::default();
        let message = parse(
            &mut parser(),
            &mut cache,
            "@user-id=1 :someone!someone@someone PRIVMSG #chan :he\u{7}llo\u{1b} there",
        )
        .expect("parse should succeed")
        .expect("message");

        assert_eq!(message.text, "hello there");
    }

    #[test]
    fn own_messages_are_flagged_and_get_generated_ids() {
        let mut cache = ColorCache::default();
        let message = parse(
            &mut parser(),
            &mut cache,
            ":me!me@me PRIVMSG #chan :my line",
        )
        .expect("parse should succeed")
        .expect("message");

        assert!(message.user.is_self);
        assert!(Uuid::parse_str(&message.id).is_ok());
    }

    #[test]
    fn lifecycle_frame_is_a_parse_error() {
        let mut cache = ColorCache::default();

        let result = parser().parse(
            &RawFrame::lifecycle(FrameTag::Message),
            User::default(),
            false,
            &mut cache,
        );

        assert!(matches!(result, Err(ParseError::UnexpectedPayload { .. })));
    }
}
