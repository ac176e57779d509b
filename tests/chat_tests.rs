mod support;

use battleship_arena::{ClientIntent, GameMode, Rejection, ServerEvent};
use support::{Harness, FIRST_SHIPS, SECOND_SHIPS};

fn say(text: &str) -> ClientIntent {
    ClientIntent::SendChatMessage {
        text: text.to_string(),
    }
}

#[test]
fn test_chat_reaches_both_players() {
    let mut h = Harness::new();
    let (a, b, sid) = h.start(GameMode::Blitz, FIRST_SHIPS, SECOND_SHIPS);

    h.send(a, say("  good luck  "));
    h.send(b, say("you too"));

    let to_b = h.drain(b);
    let messages: Vec<_> = to_b
        .iter()
        .filter_map(|e| match e {
            ServerEvent::ChatMessage(msg) => Some(msg),
            _ => None,
        })
        .collect();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].message, "good luck");
    assert_eq!(messages[0].player_id, a);
    assert_eq!(
        messages[0].player_name,
        h.engine.registry().get(a).unwrap().nickname
    );
    assert_eq!(messages[0].game_id, sid);
    assert!(messages[1].id > messages[0].id);
    assert_eq!(h.drain(a).len(), 2);
}

#[test]
fn test_chat_only_in_blitz() {
    let mut h = Harness::new();
    let (a, _b, _sid) = h.start(GameMode::Classic, FIRST_SHIPS, SECOND_SHIPS);
    h.send(a, say("hello"));
    assert_eq!(h.rejections(a), vec![Rejection::ChatUnavailable]);

    let lobby = h.connect("carol");
    h.send(lobby, say("anyone?"));
    assert_eq!(h.rejections(lobby), vec![Rejection::NotInGame]);
}

#[test]
fn test_chat_length_limits() {
    let mut h = Harness::new();
    let (a, b, _sid) = h.start(GameMode::Blitz, FIRST_SHIPS, SECOND_SHIPS);

    h.send(a, say("   "));
    assert_eq!(h.rejections(a), vec![Rejection::InvalidChatMessage]);
    h.send(a, say(&"y".repeat(201)));
    assert_eq!(h.rejections(a), vec![Rejection::InvalidChatMessage]);
    assert!(h.drain(b).is_empty());

    h.send(a, say(&"é".repeat(200)));
    assert_eq!(h.drain(b).len(), 1);
}
