use std::collections::HashMap;

use async_trait::async_trait;
use tokio::{
    io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader},
    net::TcpStream,
};

use crate::{
    domain::frame::{FrameTag, RawFrame},
    twitch::{
        frames,
        irc::{self, OutboundCommand},
    },
    usecases::contracts::{LinkClosed, Transport, TransportError, TransportLink},
};

const TRANSPORT_CONNECTED: &str = "TWITCH_TRANSPORT_CONNECTED";
const TRANSPORT_LINE_UNPARSABLE: &str = "TWITCH_TRANSPORT_LINE_UNPARSABLE";
const TRANSPORT_RECONNECT_REQUESTED: &str = "TWITCH_TRANSPORT_RECONNECT_REQUESTED";
const TRANSPORT_LOGIN_REJECTED: &str = "TWITCH_TRANSPORT_LOGIN_REJECTED";

pub const DEFAULT_HOST: &str = "irc.chat.twitch.tv";
pub const DEFAULT_PORT: u16 = 6667;

/// Plain-TCP Twitch IRC transport.
#[derive(Debug, Clone)]
pub struct TcpTransport {
    host: String,
    port: u16,
}

impl TcpTransport {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for TcpTransport {
    fn default() -> Self {
        Self::new(DEFAULT_HOST, DEFAULT_PORT)
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn run(&self, link: TransportLink<'_>) -> Result<LinkClosed, TransportError> {
        let addr = self.addr();
        let stream = tokio::select! {
            _ = link.shutdown.changed() => return Ok(LinkClosed::Shutdown),
            stream = TcpStream::connect(addr.as_str()) => stream
                .map_err(|source| TransportError::Connect { addr: addr.clone(), source })?,
        };

        tracing::info!(code = TRANSPORT_CONNECTED, addr = %addr, "chat transport connected");
        let (reader, writer) = stream.into_split();
        serve(BufReader::new(reader), writer, link).await
    }
}

/// Runs the IRC conversation over an established byte stream.
pub async fn serve<R, W>(
    mut reader: R,
    mut writer: W,
    link: TransportLink<'_>,
) -> Result<LinkClosed, TransportError>
where
    R: tokio::io::AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    if link
        .frames
        .send(RawFrame::lifecycle(FrameTag::Connected))
        .is_err()
    {
        return Ok(LinkClosed::Shutdown);
    }

    let login = link.identity.login();
    for command in [
        OutboundCommand::CapabilityRequest,
        OutboundCommand::Pass(link.identity.token.clone()),
        OutboundCommand::Nick(login.clone()),
    ] {
        write(&mut writer, &command).await?;
    }

    let mut own_tags = HashMap::new();
    let mut joined = false;
    let mut buffer = Vec::new();
    loop {
        tokio::select! {
            biased;

            changed = link.shutdown.changed() => {
                if changed.is_err() || *link.shutdown.borrow() {
                    part_and_quit(&mut writer, link.channel).await;
                    return Ok(LinkClosed::Shutdown);
                }
            }
            // Held back until the channel is joined; earlier PRIVMSGs are dropped by the server.
            command = link.outbound.recv(), if joined => match command {
                Some(command) => {
                    write(&mut writer, &command).await?;
                    if let OutboundCommand::Privmsg { channel, text } = &command {
                        let echo = frames::own_message(&login, &own_tags, channel, text);
                        if link.frames.send(RawFrame::line(FrameTag::Message, echo)).is_err() {
                            return Ok(LinkClosed::Shutdown);
                        }
                    }
                }
                None => {
                    part_and_quit(&mut writer, link.channel).await;
                    return Ok(LinkClosed::Shutdown);
                }
            },
            read = reader.read_until(b'\n', &mut buffer) => {
                if read? == 0 {
                    return Ok(LinkClosed::Remote("server closed the connection".to_owned()));
                }

                let raw = String::from_utf8_lossy(&buffer).into_owned();
                buffer.clear();

                let line = match irc::parse_line(&raw) {
                    Ok(line) => line,
                    Err(error) => {
                        tracing::debug!(
                            code = TRANSPORT_LINE_UNPARSABLE,
                            error = %error,
                            "dropping unparsable line"
                        );
                        continue;
                    }
                };

                match line.command.as_str() {
                    "PING" => {
                        let server = line.trailing().map(str::to_owned);
                        write(&mut writer, &OutboundCommand::Pong(server)).await?;
                        continue;
                    }
                    "RECONNECT" => {
                        tracing::info!(
                            code = TRANSPORT_RECONNECT_REQUESTED,
                            "server asked the client to reconnect"
                        );
                        return Ok(LinkClosed::Remote("server requested reconnect".to_owned()));
                    }
                    "001" => {
                        write(&mut writer, &OutboundCommand::Join(link.channel.to_owned())).await?;
                    }
                    "GLOBALUSERSTATE" | "USERSTATE" => frames::remember_own_tags(&line, &mut own_tags),
                    _ => {}
                }

                let login_failed = frames::is_login_failure(&line);
                let reason = line.trailing().unwrap_or_default().to_owned();

                for frame in frames::map_line(line, &login) {
                    joined |= frame.tag == FrameTag::Join;
                    if link.frames.send(frame).is_err() {
                        return Ok(LinkClosed::Shutdown);
                    }
                }

                if login_failed {
                    tracing::error!(
                        code = TRANSPORT_LOGIN_REJECTED,
                        reason = %reason,
                        "server rejected the credentials"
                    );
                    return Err(TransportError::AuthenticationFailed(reason));
                }
            }
        }
    }
}

async fn write<W>(writer: &mut W, command: &OutboundCommand) -> Result<(), TransportError>
where
    W: AsyncWrite + Unpin + Send,
{
    tracing::trace!(command = command.kind(), "writing outbound command");
    writer.write_all(command.to_wire().as_bytes()).await?;
    writer.flush().await?;
    Ok(())
}

async fn part_and_quit<W>(writer: &mut W, channel: &str)
where
    W: AsyncWrite + Unpin + Send,
{
    // Best effort: the link is going away either way.
    let _ = write(writer, &OutboundCommand::Part(channel.to_owned())).await;
    let _ = write(writer, &OutboundCommand::Quit).await;
}

#[cfg(test)]
mod tests {
    use tokio::{
        io::{duplex, AsyncReadExt},
        sync::{mpsc, watch},
    };

    use super::*;
    use crate::domain::identity::Identity;

    struct Harness {
        identity: Identity,
        frames_tx: mpsc::UnboundedSender<RawFrame>,
        frames_rx: mpsc::UnboundedReceiver<RawFrame>,
        outbound_tx: mpsc::UnboundedSender<OutboundCommand>,
        outbound_rx: mpsc::UnboundedReceiver<OutboundCommand>,
        shutdown_tx: watch::Sender<bool>,
        shutdown_rx: watch::Receiver<bool>,
    }

    impl Harness {
        fn new() -> Self {
            let (frames_tx, frames_rx) = mpsc::unbounded_channel();
            let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
            let (shutdown_tx, shutdown_rx) = watch::channel(false);
            Self {
                identity: Identity::new("Me", "secret"),
                frames_tx,
                frames_rx,
                outbound_tx,
                outbound_rx,
                shutdown_tx,
                shutdown_rx,
            }
        }

        fn drain_frames(&mut self) -> Vec<RawFrame> {
            let mut frames = Vec::new();
            while let Ok(frame) = self.frames_rx.try_recv() {
                frames.push(frame);
            }
            frames
        }

        fn drain_tags(&mut self) -> Vec<FrameTag> {
            self.drain_frames()
                .into_iter()
                .map(|frame| frame.tag)
                .collect()
        }
    }

    async fn run_script(
        harness: &mut Harness,
        server_lines: impl AsRef<[u8]>,
    ) -> (Result<LinkClosed, TransportError>, String) {
        let (client_io, mut server_io) = duplex(64 * 1024);
        let (client_read, client_write) = tokio::io::split(client_io);

        server_io
            .write_all(server_lines.as_ref())
            .await
            .expect("script should be writable");
        server_io.shutdown().await.expect("server half should close");

        let outcome = serve(
            BufReader::new(client_read),
            client_write,
            TransportLink {
                identity: &harness.identity,
                channel: "chan",
                frames: &harness.frames_tx,
                outbound: &mut harness.outbound_rx,
                shutdown: &mut harness.shutdown_rx,
            },
        )
        .await;

        let mut written = String::new();
        server_io
            .read_to_string(&mut written)
            .await
            .expect("client output should be readable");
        (outcome, written)
    }

    #[tokio::test]
    async fn performs_handshake_and_maps_lines() {
        let mut harness = Harness::new();

        let (outcome, written) = run_script(
            &mut harness,
            ":tmi.twitch.tv 001 me :Welcome, GLHF!\r\n\
             :me!me@me.tmi.twitch.tv JOIN #chan\r\n\
             @room-id=1;slow=0;subs-only=0;emote-only=0;r9k=0;followers-only=-1 :tmi.twitch.tv ROOMSTATE #chan\r\n\
             @user-id=2 :viewer!viewer@viewer PRIVMSG #chan :hi\r\n",
        )
        .await;

        assert!(matches!(outcome, Ok(LinkClosed::Remote(_))));
        assert_eq!(
            harness.drain_tags(),
            vec![
                FrameTag::Connected,
                FrameTag::Logon,
                FrameTag::Join,
                FrameTag::RoomState,
                FrameTag::Message
            ]
        );
        assert!(written.starts_with(
            "CAP REQ :twitch.tv/tags twitch.tv/commands\r\nPASS oauth:secret\r\nNICK me\r\n"
        ));
        assert!(written.contains("JOIN #chan\r\n"));
    }

    #[tokio::test]
    async fn answers_ping_without_emitting_frames() {
        let mut harness = Harness::new();

        let (_, written) = run_script(&mut harness, "PING :tmi.twitch.tv\r\n").await;

        assert!(written.contains("PONG :tmi.twitch.tv\r\n"));
        assert_eq!(harness.drain_tags(), vec![FrameTag::Connected]);
    }

    #[tokio::test]
    async fn reconnect_request_closes_the_link() {
        let mut harness = Harness::new();

        let (outcome, _) = run_script(
            &mut harness,
            ":tmi.twitch.tv RECONNECT\r\n@user-id=2 :viewer!viewer@viewer PRIVMSG #chan :late\r\n",
        )
        .await;

        assert!(
            matches!(outcome, Ok(LinkClosed::Remote(reason)) if reason == "server requested reconnect")
        );
        assert_eq!(harness.drain_tags(), vec![FrameTag::Connected]);
    }

    #[tokio::test]
    async fn login_failure_is_fatal_and_reported_as_notice() {
        let mut harness = Harness::new();

        let (outcome, _) = run_script(
            &mut harness,
            ":tmi.twitch.tv NOTICE * :Login authentication failed\r\n",
        )
        .await;

        match outcome {
            Err(error) => assert!(error.is_fatal()),
            Ok(closed) => panic!("expected a fatal error, got {closed:?}"),
        }
        assert_eq!(
            harness.drain_tags(),
            vec![FrameTag::Connected, FrameTag::Notice]
        );
    }

    #[tokio::test]
    async fn unparsable_lines_are_skipped() {
        let mut harness = Harness::new();

        let (_, _) = run_script(
            &mut harness,
            "\r\n:tmi.twitch.tv\r\n@user-id=2 :viewer!viewer@viewer PRIVMSG #chan :ok\r\n",
        )
        .await;

        assert_eq!(
            harness.drain_tags(),
            vec![FrameTag::Connected, FrameTag::Message]
        );
    }

    #[tokio::test]
    async fn invalid_utf8_does_not_drop_the_link() {
        let mut harness = Harness::new();

        let (outcome, _) = run_script(
            &mut harness,
            b"@user-id=2 :viewer!viewer@viewer PRIVMSG #chan :bad \xff\xfe byte\r\n\
              @user-id=2 :viewer!viewer@viewer PRIVMSG #chan :after\r\n",
        )
        .await;

        assert!(matches!(outcome, Ok(LinkClosed::Remote(_))));
        let received = harness.drain_frames();
        let texts: Vec<_> = received
            .iter()
            .filter(|frame| frame.tag == FrameTag::Message)
            .map(|frame| {
                let line = frame.irc().expect("message frames carry a line");
                frames::message_text(line)
                    .expect("message should have text")
                    .to_owned()
            })
            .collect();
        assert_eq!(texts.len(), 2);
        assert!(texts[0].starts_with("bad "));
        assert_eq!(texts[1], "after");
    }

    #[tokio::test]
    async fn outbound_waits_for_join_and_is_echoed_as_own_message() {
        let mut harness = Harness::new();
        harness
            .outbound_tx
            .send(OutboundCommand::Privmsg {
                channel: "chan".to_owned(),
                text: "hello".to_owned(),
            })
            .expect("receiver should be alive");

        let (outcome, written) = run_script(
            &mut harness,
            ":tmi.twitch.tv 001 me :Welcome, GLHF!\r\n\
             @color=#00FF7F;display-name=Me;user-id=99 :tmi.twitch.tv GLOBALUSERSTATE\r\n\
             :me!me@me.tmi.twitch.tv JOIN #chan\r\n",
        )
        .await;

        assert!(matches!(outcome, Ok(LinkClosed::Remote(_))));
        let join_at = written.find("JOIN #chan\r\n").expect("JOIN should be written");
        let say_at = written
            .find("PRIVMSG #chan :hello\r\n")
            .expect("queued line should be written");
        assert!(join_at < say_at);

        let received = harness.drain_frames();
        let echo = received.last().expect("echo frame should be emitted");
        assert_eq!(echo.tag, FrameTag::Message);
        let line = echo.irc().expect("echo carries a line");
        let (user, is_self) = frames::sender(line, "me").expect("echo has a sender");
        assert!(is_self);
        assert_eq!(user.id, "99");
        assert_eq!(frames::message_text(line), Ok("hello"));
    }

    #[tokio::test]
    async fn shutdown_parts_and_quits() {
        let mut harness = Harness::new();
        let (client_io, mut server_io) = duplex(64 * 1024);
        let (client_read, client_write) = tokio::io::split(client_io);
        harness
            .shutdown_tx
            .send(true)
            .expect("receiver should be alive");
        harness
            .outbound_tx
            .send(OutboundCommand::Privmsg {
                channel: "chan".to_owned(),
                text: "queued".to_owned(),
            })
            .expect("receiver should be alive");

        let outcome = serve(
            BufReader::new(client_read),
            client_write,
            TransportLink {
                identity: &harness.identity,
                channel: "chan",
                frames: &harness.frames_tx,
                outbound: &mut harness.outbound_rx,
                shutdown: &mut harness.shutdown_rx,
            },
        )
        .await;

        assert!(matches!(outcome, Ok(LinkClosed::Shutdown)));
        let mut written = String::new();
        server_io
            .read_to_string(&mut written)
            .await
            .expect("client output should be readable");
        assert!(written.starts_with("CAP REQ"));
        assert!(written.ends_with("PART #chan\r\nQUIT\r\n"));
    }
}
