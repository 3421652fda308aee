use super::*;

#[test]
fn parse_inbound_splits_three_parts() {
    let line = parse_inbound("1 ok { arg: { name: 'a' } }").unwrap();
    assert_eq!(line.channel_id, 1);
    assert_eq!(line.status, Status::Ok);
    assert_eq!(line.body, "{ arg: { name: 'a' } }");
}

#[test]
fn parse_inbound_empty_body_and_crlf() {
    let line = parse_inbound("42 ok\r").unwrap();
    assert_eq!(line.channel_id, 42);
    assert_eq!(line.body, "");
    assert_eq!(decode_body(line.body).unwrap(), Pon::Nil);
}

#[test]
fn unknown_status_word_is_an_error_status() {
    assert_eq!(parse_inbound("3 err some_error").unwrap().status, Status::Err);
    assert_eq!(parse_inbound("3 nope x").unwrap().status, Status::Err);
    assert_eq!(Status::Err.to_string(), "err");
}

#[test]
fn parse_inbound_rejects_bad_ids() {
    for line in ["", "   ", "abc ok ()", "0 ok ()", "-1 ok ()", "7"] {
        let err = parse_inbound(line).expect_err(line);
        assert!(matches!(err, ClientError::Wire(_)), "{line:?} -> {err:?}");
    }
}

#[test]
fn decode_body_reports_malformed_pon() {
    let err = decode_body("{ x: ").unwrap_err();
    assert!(matches!(err, ClientError::MalformedInput(_)));
}

#[test]
fn format_request_prefixes_id_and_flattens_newlines() {
    let payload = Payload::Pon(Pon::call("request_x", Pon::map([("name", Pon::string("a"))])));
    assert_eq!(format_request(1, &payload), "1 request_x { name: 'a' }");

    let text = Payload::from("multi\nline\r\ncall ()");
    assert_eq!(format_request(12, &text), "12 multi line  call ()");
}

#[test]
fn text_payload_is_sent_verbatim() {
    let payload = Payload::from("not { really pon");
    assert_eq!(format_request(5, &payload), "5 not { really pon");
}

#[test]
fn close_stream_payload_quotes_the_id() {
    let line = format_request(9, &close_stream_payload(4));
    assert_eq!(line, "9 close_stream { channel_id: '4' }");
}
