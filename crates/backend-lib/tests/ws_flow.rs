// ============================
// crates/backend-lib/tests/ws_flow.rs
// ============================
//! Integration tests driving the server over real WebSocket connections.

use craftchat_backend_lib::{config::Settings, ws_router, AppState};
use craftchat_common::{ClientEvent, InviteKind, ServerEvent};
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{timeout, Duration};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn spawn_server() -> (SocketAddr, Arc<AppState>) {
    let state = Arc::new(AppState::new(Settings::default()));
    let app = ws_router::create_router(state.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, state)
}

async fn connect(addr: SocketAddr) -> WsClient {
    let (ws, _) = connect_async(format!("ws://{addr}/ws"))
        .await
        .expect("Failed to connect");
    ws
}

async fn send(ws: &mut WsClient, event: &ClientEvent) {
    ws.send(Message::Text(
        serde_json::to_string(event).unwrap().into(),
    ))
    .await
    .unwrap();
}

/// Next text frame as a `ServerEvent`, with a timeout naming the wait.
async fn recv(ws: &mut WsClient, what: &str) -> ServerEvent {
    loop {
        let message = timeout(Duration::from_secs(5), ws.next())
            .await
            .unwrap_or_else(|_| panic!("Timed out waiting for {what}"))
            .expect("Connection closed")
            .expect("WebSocket error");
        if let Message::Text(text) = message {
            return serde_json::from_str(&text).expect("Unparsable server event");
        }
    }
}

#[tokio::test]
async fn test_group_chat_lifecycle() {
    let (addr, state) = spawn_server().await;
    let (alice, _) = state.coordinator.create_identity("Alice", None).unwrap();
    let (bob, _) = state.coordinator.create_identity("Bob", None).unwrap();

    let mut ws_a = connect(addr).await;
    let mut ws_b = connect(addr).await;

    // Alice creates a group room named "Test".
    send(
        &mut ws_a,
        &ClientEvent::RegisterUser {
            user_id: alice.clone(),
        },
    )
    .await;
    send(
        &mut ws_a,
        &ClientEvent::CreateInvite {
            user_id: alice.clone(),
            kind: InviteKind::Group,
            room_name: Some("Test".to_string()),
            existing_room_id: None,
            invite_code: None,
        },
    )
    .await;
    let (code, room_id) = match recv(&mut ws_a, "invite_created").await {
        ServerEvent::InviteCreated { code, room_id, .. } => (code, room_id),
        other => panic!("Expected InviteCreated, got {other:?}"),
    };

    // Bob joins through the code and sees both members plus the room name.
    send(
        &mut ws_b,
        &ClientEvent::RegisterUser {
            user_id: bob.clone(),
        },
    )
    .await;
    send(
        &mut ws_b,
        &ClientEvent::JoinInvite {
            user_id: bob.clone(),
            code: code.clone(),
        },
    )
    .await;
    match recv(&mut ws_b, "join_success").await {
        ServerEvent::JoinSuccess {
            room_name, members, ..
        } => {
            assert_eq!(room_name, "Test");
            let ids: Vec<_> = members.iter().map(|m| m.user_id.clone()).collect();
            assert_eq!(ids, vec![alice.clone(), bob.clone()]);
        },
        other => panic!("Expected JoinSuccess, got {other:?}"),
    }

    // Alice is notified about Bob.
    match recv(&mut ws_a, "user_joined").await {
        ServerEvent::UserJoined { user_id, nickname, .. } => {
            assert_eq!(user_id, bob);
            assert_eq!(nickname, "Bob");
        },
        other => panic!("Expected UserJoined, got {other:?}"),
    }

    // Bob says hi; both members receive the broadcast.
    send(
        &mut ws_b,
        &ClientEvent::SendMessage {
            user_id: bob.clone(),
            room_id: room_id.clone(),
            content: "hi".to_string(),
            kind: "text".to_string(),
        },
    )
    .await;
    for (ws, who) in [(&mut ws_a, "alice"), (&mut ws_b, "bob")] {
        match recv(ws, &format!("new_message for {who}")).await {
            ServerEvent::NewMessage { message } => {
                assert_eq!(message.content, "hi");
                assert_eq!(message.nickname, "Bob");
            },
            other => panic!("Expected NewMessage, got {other:?}"),
        }
    }

    // Alice deletes the room; everyone hears about it once, by name.
    send(
        &mut ws_a,
        &ClientEvent::DeleteRoom {
            user_id: alice.clone(),
            room_id: room_id.clone(),
        },
    )
    .await;
    for (ws, who) in [(&mut ws_a, "alice"), (&mut ws_b, "bob")] {
        match recv(ws, &format!("room_deleted for {who}")).await {
            ServerEvent::RoomDeleted { room_name, .. } => assert_eq!(room_name, "Test"),
            other => panic!("Expected RoomDeleted, got {other:?}"),
        }
    }

    // Both room lists are now empty.
    for (ws, user_id) in [(&mut ws_a, alice.clone()), (&mut ws_b, bob.clone())] {
        send(ws, &ClientEvent::GetRooms { user_id }).await;
        match recv(ws, "rooms_list").await {
            ServerEvent::RoomsList { rooms } => assert!(rooms.is_empty()),
            other => panic!("Expected RoomsList, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_disconnect_broadcasts_user_left() {
    let (addr, state) = spawn_server().await;
    let (alice, _) = state.coordinator.create_identity("Alice", None).unwrap();
    let (bob, _) = state.coordinator.create_identity("Bob", None).unwrap();

    let mut ws_a = connect(addr).await;
    let mut ws_b = connect(addr).await;

    send(
        &mut ws_a,
        &ClientEvent::RegisterUser {
            user_id: alice.clone(),
        },
    )
    .await;
    send(
        &mut ws_a,
        &ClientEvent::CreateInvite {
            user_id: alice.clone(),
            kind: InviteKind::Group,
            room_name: Some("Test".to_string()),
            existing_room_id: None,
            invite_code: None,
        },
    )
    .await;
    let (code, room_id) = match recv(&mut ws_a, "invite_created").await {
        ServerEvent::InviteCreated { code, room_id, .. } => (code, room_id),
        other => panic!("Expected InviteCreated, got {other:?}"),
    };

    send(
        &mut ws_b,
        &ClientEvent::JoinInvite {
            user_id: bob.clone(),
            code,
        },
    )
    .await;
    let ServerEvent::JoinSuccess { .. } = recv(&mut ws_b, "join_success").await else {
        panic!("Expected JoinSuccess")
    };
    let ServerEvent::UserJoined { .. } = recv(&mut ws_a, "user_joined").await else {
        panic!("Expected UserJoined")
    };

    // Bob's connection drops; Alice gets the cascade's user_left.
    ws_b.close(None).await.unwrap();
    match recv(&mut ws_a, "user_left").await {
        ServerEvent::UserLeft { user_id, nickname } => {
            assert_eq!(user_id, bob);
            assert_eq!(nickname, "Bob");
        },
        other => panic!("Expected UserLeft, got {other:?}"),
    }

    // The member list no longer carries Bob.
    send(
        &mut ws_a,
        &ClientEvent::GetRoomMembers {
            room_id: room_id.clone(),
        },
    )
    .await;
    match recv(&mut ws_a, "room_members_list").await {
        ServerEvent::RoomMembersList {
            members,
            member_count,
            ..
        } => {
            assert_eq!(member_count, 1);
            assert_eq!(members[0].user_id, alice);
        },
        other => panic!("Expected RoomMembersList, got {other:?}"),
    }
}

#[tokio::test]
async fn test_voice_presence_and_targeted_offer() {
    let (addr, state) = spawn_server().await;
    let (alice, _) = state.coordinator.create_identity("Alice", None).unwrap();
    let (bob, _) = state.coordinator.create_identity("Bob", None).unwrap();

    let mut ws_a = connect(addr).await;
    let mut ws_b = connect(addr).await;

    send(
        &mut ws_a,
        &ClientEvent::RegisterUser {
            user_id: alice.clone(),
        },
    )
    .await;
    send(
        &mut ws_a,
        &ClientEvent::CreateInvite {
            user_id: alice.clone(),
            kind: InviteKind::Group,
            room_name: Some("Voice".to_string()),
            existing_room_id: None,
            invite_code: None,
        },
    )
    .await;
    let (code, room_id) = match recv(&mut ws_a, "invite_created").await {
        ServerEvent::InviteCreated { code, room_id, .. } => (code, room_id),
        other => panic!("Expected InviteCreated, got {other:?}"),
    };
    send(
        &mut ws_b,
        &ClientEvent::JoinInvite {
            user_id: bob.clone(),
            code,
        },
    )
    .await;
    let ServerEvent::JoinSuccess { .. } = recv(&mut ws_b, "join_success").await else {
        panic!("Expected JoinSuccess")
    };
    let ServerEvent::UserJoined { .. } = recv(&mut ws_a, "user_joined").await else {
        panic!("Expected UserJoined")
    };

    // Alice joins voice: she gets the occupant list, Bob the notification.
    send(
        &mut ws_a,
        &ClientEvent::JoinVoiceRoom {
            user_id: alice.clone(),
            room_id: room_id.clone(),
        },
    )
    .await;
    match recv(&mut ws_a, "voice_room_users").await {
        ServerEvent::VoiceRoomUsers { users } => {
            assert_eq!(users.len(), 1);
            assert_eq!(users[0].user_id, bob);
        },
        other => panic!("Expected VoiceRoomUsers, got {other:?}"),
    }
    match recv(&mut ws_b, "user_joined_voice").await {
        ServerEvent::UserJoinedVoice { user_id, .. } => assert_eq!(user_id, alice),
        other => panic!("Expected UserJoinedVoice, got {other:?}"),
    }

    // Offer goes to Bob only, tagged with Alice's nickname.
    send(
        &mut ws_a,
        &ClientEvent::WebrtcOffer {
            room_id: room_id.clone(),
            target_user_id: bob.clone(),
            from_user_id: alice.clone(),
            offer: serde_json::json!({"type": "offer", "sdp": "v=0"}),
        },
    )
    .await;
    match recv(&mut ws_b, "webrtc_offer").await {
        ServerEvent::WebrtcOffer {
            from_user_id,
            from_nickname,
            offer,
        } => {
            assert_eq!(from_user_id, alice);
            assert_eq!(from_nickname, "Alice");
            assert_eq!(offer["sdp"], "v=0");
        },
        other => panic!("Expected WebrtcOffer, got {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_frame_gets_error_reply() {
    let (addr, _state) = spawn_server().await;
    let mut ws = connect(addr).await;

    ws.send(Message::Text("this is not json".into())).await.unwrap();
    match recv(&mut ws, "malformed_event").await {
        ServerEvent::MalformedEvent { .. } => {},
        other => panic!("Expected MalformedEvent, got {other:?}"),
    }
}
