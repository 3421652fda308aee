use super::*;
use crate::subscription::StreamEvent;
use pon::Pon;
use tokio::sync::oneshot;

#[test]
fn codec_waits_for_complete_lines() {
    let mut codec = InboundCodec::new(1024);
    let mut buf = BytesMut::from(&b"1 ok { x:"[..]);
    assert_eq!(codec.decode(&mut buf).unwrap(), None);

    buf.extend_from_slice(b" 1 }\n2 ok ()\n3 ok");
    assert_eq!(codec.decode(&mut buf).unwrap(), Some(Line::Text("1 ok { x: 1 }".into())));
    assert_eq!(codec.decode(&mut buf).unwrap(), Some(Line::Text("2 ok ()".into())));
    assert_eq!(codec.decode(&mut buf).unwrap(), None);
}

#[test]
fn codec_drops_unterminated_fragment_at_eof() {
    let mut codec = InboundCodec::new(1024);
    let mut buf = BytesMut::from(&b"2 ok ()\n1 ok 12"[..]);
    assert_eq!(codec.decode_eof(&mut buf).unwrap(), Some(Line::Text("2 ok ()".into())));
    assert_eq!(codec.decode_eof(&mut buf).unwrap(), None);
    assert!(buf.is_empty());
}

#[test]
fn codec_reports_invalid_utf8_and_keeps_reading() {
    let mut codec = InboundCodec::new(1024);
    let mut buf = BytesMut::from(&b"7 ok '\xff'\n2 ok 5\nx\xfe\n"[..]);
    assert_eq!(codec.decode(&mut buf).unwrap(), Some(Line::Invalid(Some(7))));
    assert_eq!(codec.decode(&mut buf).unwrap(), Some(Line::Text("2 ok 5".into())));
    assert_eq!(codec.decode(&mut buf).unwrap(), Some(Line::Invalid(None)));
    assert_eq!(codec.decode(&mut buf).unwrap(), None);
}

#[test]
fn codec_does_not_guess_id_after_oversized_line() {
    let mut codec = InboundCodec::new(8);
    let mut buf = BytesMut::from(&b"1 ok 'far too long'\n9 ok \xff\n"[..]);
    assert_eq!(codec.decode(&mut buf).unwrap(), Some(Line::Oversized));
    assert_eq!(codec.decode(&mut buf).unwrap(), Some(Line::Invalid(None)));
}

#[test]
fn codec_skips_oversized_line_and_recovers() {
    let mut codec = InboundCodec::new(8);
    let mut buf = BytesMut::from(&b"1 ok 'this is far too long'\n2 ok 5\n"[..]);
    assert_eq!(codec.decode(&mut buf).unwrap(), Some(Line::Oversized));

    let mut seen = Vec::new();
    while let Some(line) = codec.decode(&mut buf).unwrap() {
        seen.push(line);
    }
    assert_eq!(seen, vec![Line::Text("2 ok 5".into())]);
}

#[test]
fn handle_line_routes_and_ignores_garbage() {
    let shared = Shared::new();
    let (tx, mut rx) = oneshot::channel();
    {
        let mut inner = shared.lock();
        let id = inner.channels.allocate_id();
        inner.channels.register_single_shot(id, tx);
    }

    shared.handle_line("garbage");
    shared.handle_line("99 ok 1");
    assert!(rx.try_recv().is_err());

    shared.handle_line("1 ok 'done'");
    assert_eq!(rx.try_recv().unwrap().unwrap(), Pon::string("done"));
}

#[test]
fn rejected_line_fails_only_its_waiter() {
    let shared = Shared::new();
    let (bad_tx, mut bad_rx) = oneshot::channel();
    let (good_tx, mut good_rx) = oneshot::channel();
    {
        let mut inner = shared.lock();
        let bad = inner.channels.allocate_id();
        inner.channels.register_single_shot(bad, bad_tx);
        let good = inner.channels.allocate_id();
        inner.channels.register_single_shot(good, good_tx);
    }

    shared.reject_line(Some(1));
    shared.reject_line(None);
    assert!(matches!(bad_rx.try_recv().unwrap(), Err(ClientError::Wire(_))));
    assert!(good_rx.try_recv().is_err());
    assert!(shared.lock().channels.contains(2));
}

#[test]
fn teardown_fails_waiters_and_emits_disconnected() {
    let shared = Shared::new();
    let mut events = shared.subscribe_events();
    let (stream_tx, mut stream_rx) = mpsc::unbounded_channel();
    let (writer, _writer_rx) = mpsc::unbounded_channel();
    {
        let mut inner = shared.lock();
        inner.writer = Some(writer);
        let id = inner.channels.allocate_id();
        inner.channels.register_stream(id, stream_tx);
    }
    shared.set_state(ConnectionState::Connected);

    shared.teardown();

    assert_eq!(shared.state(), ConnectionState::Disconnected);
    assert!(shared.lock().writer.is_none());
    assert!(matches!(stream_rx.try_recv().unwrap(), StreamEvent::Error(ClientError::ConnectionLost)));
    assert_eq!(events.try_recv().unwrap(), ConnectionEvent::Disconnected);
}

#[tokio::test]
async fn open_reports_refused_connection() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap().to_string();
    drop(listener);

    let shared = Shared::new();
    let err = open(&shared, &address).await.unwrap_err();
    assert!(matches!(err, ClientError::Transport(_)));
    assert_eq!(shared.state(), ConnectionState::Disconnected);
}
