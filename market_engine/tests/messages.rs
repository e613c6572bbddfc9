mod support;

use market_engine::{db_types::NewMessage, MessagesApi};
use support::{new_test_db, seed_product};

const ALICE: i64 = 1;
const BOB: i64 = 2;
const CAROL: i64 = 3;

#[tokio::test]
async fn inbox_is_newest_first() {
    let db = new_test_db().await;
    let api = MessagesApi::new(db);

    api.send(NewMessage::new(Some(ALICE), BOB, "first")).await.unwrap();
    api.send(NewMessage::new(Some(CAROL), BOB, "second")).await.unwrap();
    api.send(NewMessage::new(None, BOB, "third")).await.unwrap();

    let inbox = api.messages_for_user(BOB).await.unwrap();
    let contents: Vec<&str> = inbox.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["third", "second", "first"]);
    assert!(inbox.iter().all(|m| !m.is_read));
}

#[tokio::test]
async fn conversation_is_two_way_and_oldest_first() {
    let db = new_test_db().await;
    let api = MessagesApi::new(db);

    api.send(NewMessage::new(Some(ALICE), BOB, "hi Bob")).await.unwrap();
    api.send(NewMessage::new(Some(BOB), ALICE, "hi Alice")).await.unwrap();
    api.send(NewMessage::new(Some(ALICE), CAROL, "hi Carol")).await.unwrap();
    api.send(NewMessage::new(Some(ALICE), BOB, "are the apples fresh?")).await.unwrap();

    let thread = api.conversation(ALICE, BOB, None).await.unwrap();
    let contents: Vec<&str> = thread.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["hi Bob", "hi Alice", "are the apples fresh?"]);
}

#[tokio::test]
async fn conversation_can_be_narrowed_to_a_product() {
    let db = new_test_db().await;
    let apples = seed_product(&db, BOB, "Apples", 1500, 5).await;
    let api = MessagesApi::new(db);

    api.send(NewMessage::new(Some(ALICE), BOB, "about the apples").with_product(apples.id)).await.unwrap();
    api.send(NewMessage::new(Some(ALICE), BOB, "unrelated")).await.unwrap();

    let thread = api.conversation(ALICE, BOB, Some(apples.id)).await.unwrap();
    assert_eq!(thread.len(), 1);
    assert_eq!(thread[0].content, "about the apples");
}

#[tokio::test]
async fn mark_read_flips_only_matching_unread_messages() {
    let db = new_test_db().await;
    let api = MessagesApi::new(db);

    api.send(NewMessage::new(Some(ALICE), BOB, "one")).await.unwrap();
    api.send(NewMessage::new(Some(ALICE), BOB, "two")).await.unwrap();
    api.send(NewMessage::new(Some(CAROL), BOB, "three")).await.unwrap();

    let flipped = api.mark_read(Some(ALICE), BOB).await.unwrap();
    assert_eq!(flipped, 2);

    let inbox = api.messages_for_user(BOB).await.unwrap();
    for message in &inbox {
        let expect_read = message.sender_id == Some(ALICE);
        assert_eq!(message.is_read, expect_read, "message '{}' read state", message.content);
    }

    // Second acknowledgement finds nothing left to flip.
    let flipped = api.mark_read(Some(ALICE), BOB).await.unwrap();
    assert_eq!(flipped, 0);
}

#[tokio::test]
async fn system_messages_are_acknowledged_with_a_null_sender() {
    let db = new_test_db().await;
    let api = MessagesApi::new(db);

    api.send(NewMessage::new(None, BOB, "system notice")).await.unwrap();
    api.send(NewMessage::new(Some(ALICE), BOB, "personal note")).await.unwrap();

    let flipped = api.mark_read(None, BOB).await.unwrap();
    assert_eq!(flipped, 1);
    let inbox = api.messages_for_user(BOB).await.unwrap();
    let system = inbox.iter().find(|m| m.sender_id.is_none()).unwrap();
    assert!(system.is_read);
    let personal = inbox.iter().find(|m| m.sender_id == Some(ALICE)).unwrap();
    assert!(!personal.is_read);
}
