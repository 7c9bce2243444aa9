use std::time::Duration;

use futures_util::StreamExt;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use widgetry_protocol::{actions, ErrorCode, Message, ServerReply};
use widgetry_shared::{handler_fn, BridgeConfig, BridgeLink};

use super::test_support::*;
use crate::app::App;

fn fruit_options() -> Value {
    json!([
        {"id": "1", "text": "Apple", "value": "apple"},
        {"id": "2", "text": "Banana", "value": "banana"},
        {"id": "3", "text": "Cherry", "value": "cherry"},
    ])
}

async fn load_select(conn: &mut TestConn, extra: Value) -> String {
    let mut line = json!({
        "type": "load_component",
        "id": "load",
        "name": "Select",
        "title": "Fruit",
        "options": fruit_options(),
    });
    if let (Some(line), Value::Object(extra)) = (line.as_object_mut(), extra) {
        line.extend(extra);
    }
    match request(conn, line).await {
        ServerReply::ComponentLoaded { component_id, .. } => component_id,
        other => panic!("expected component_loaded, got {other:?}"),
    }
}

async fn call(conn: &mut TestConn, component_id: &str, method: &str, args: Value) -> ServerReply {
    request(
        conn,
        json!({
            "type": "call_method",
            "id": format!("call-{method}"),
            "component_id": component_id,
            "method": method,
            "args": args,
        }),
    )
    .await
}

async fn call_ok(conn: &mut TestConn, component_id: &str, method: &str, args: Value) -> Value {
    match call(conn, component_id, method, args).await {
        ServerReply::MethodResult { result, .. } => result,
        other => panic!("expected method_result for {method}, got {other:?}"),
    }
}

async fn state_of(conn: &mut TestConn, component_id: &str) -> Value {
    match request(
        conn,
        json!({"type": "get_state", "id": "state", "component_id": component_id}),
    )
    .await
    {
        ServerReply::ComponentState { state, .. } => state,
        other => panic!("expected component_state, got {other:?}"),
    }
}

#[tokio::test]
async fn ping_replies_pong() {
    let server = spawn_detached_server().await;
    let mut conn = connect(server.addr).await;

    let reply = request(&mut conn, json!({"type": "ping", "id": "p1"})).await;
    assert_eq!(reply, ServerReply::Pong { id: "p1".into() });
}

#[tokio::test]
async fn select_scenario_end_to_end() {
    let server = spawn_detached_server().await;
    let mut conn = connect(server.addr).await;

    let reply = request(
        &mut conn,
        json!({
            "type": "load_component",
            "id": "r1",
            "name": "Select",
            "title": "Fruit",
            "options": fruit_options(),
        }),
    )
    .await;
    let ServerReply::ComponentLoaded {
        success,
        name,
        component_id: id,
        methods,
        ..
    } = reply
    else {
        panic!("expected component_loaded, got {reply:?}");
    };
    assert!(success);
    assert_eq!(name, "Select");
    assert!(id.starts_with("select-"));
    assert!(methods.iter().any(|m| m == "select_focused_option"));

    assert_eq!(call_ok(&mut conn, &id, "open", json!([])).await, json!(true));
    call_ok(&mut conn, &id, "focus_next_option", json!([])).await;
    call_ok(&mut conn, &id, "focus_next_option", json!([])).await;
    call_ok(&mut conn, &id, "select_focused_option", json!([])).await;

    let state = state_of(&mut conn, &id).await;
    assert_eq!(state["selected_value"], json!("banana"));
    assert_eq!(state["selected_text"], json!("Banana"));
    assert_eq!(state["selected_option_index"], json!(1));
    assert_eq!(state["is_open"], json!(false));

    let lines = server.app.buffers.lines_for(&id).unwrap();
    assert!(lines.iter().any(|l| l.contains("Selected: Banana")));

    let unloaded = request(
        &mut conn,
        json!({"type": "unload_component", "id": "u1", "component_id": id}),
    )
    .await;
    assert_eq!(
        unloaded,
        ServerReply::ComponentUnloaded {
            id: "u1".into(),
            component_id: id.clone(),
            success: true,
        }
    );
    assert!(server.app.buffers.lines_for(&id).is_none());
}

#[tokio::test]
async fn focus_and_select_by_index_over_tcp() {
    let server = spawn_detached_server().await;
    let mut conn = connect(server.addr).await;

    let reply = request(
        &mut conn,
        json!({
            "type": "load_component",
            "id": "r1",
            "name": "Select",
            "options": [
                {"id": "1", "text": "Option 1", "value": "option1"},
                {"id": "2", "text": "Option 2", "value": "option2"},
                {"id": "3", "text": "Option 3", "value": "option3"},
            ],
        }),
    )
    .await;
    let ServerReply::ComponentLoaded { component_id: id, .. } = reply else {
        panic!("expected component_loaded, got {reply:?}");
    };

    let state = state_of(&mut conn, &id).await;
    assert_eq!(state["selected_value"], Value::Null);
    assert_eq!(state["options"].as_array().unwrap().len(), 3);

    assert_eq!(call_ok(&mut conn, &id, "focus_option", json!([1])).await, json!(true));
    assert_eq!(state_of(&mut conn, &id).await["focused_option_index"], json!(1));

    assert_eq!(call_ok(&mut conn, &id, "select_option", json!([1])).await, json!(true));
    assert_eq!(state_of(&mut conn, &id).await["selected_value"], json!("option2"));
}

/// Every component-addressed command against `component_id`.
async fn expect_not_found_everywhere(conn: &mut TestConn, component_id: &str) {
    let commands = [
        json!({"type": "call_method", "id": "nf-call", "component_id": component_id, "method": "open", "args": []}),
        json!({"type": "get_state", "id": "nf-state", "component_id": component_id}),
        json!({"type": "set_props", "id": "nf-props", "component_id": component_id, "props": {"disabled": true}}),
        json!({"type": "unload_component", "id": "nf-unload", "component_id": component_id}),
    ];
    for command in commands {
        let kind = command["type"].clone();
        let reply = request(conn, command).await;
        assert_eq!(
            reply.error_code(),
            Some(ErrorCode::ComponentNotFound),
            "{kind} on {component_id}: {reply:?}"
        );
    }
}

#[tokio::test]
async fn never_loaded_and_unloaded_components_are_not_found() {
    let server = spawn_detached_server().await;
    let mut conn = connect(server.addr).await;

    expect_not_found_everywhere(&mut conn, "ghost").await;

    let id = load_select(&mut conn, json!({})).await;
    let reply = request(
        &mut conn,
        json!({"type": "unload_component", "id": "u1", "component_id": id}),
    )
    .await;
    assert!(!reply.is_error());

    expect_not_found_everywhere(&mut conn, &id).await;

    // The connection is still usable
    let reply = request(&mut conn, json!({"type": "ping", "id": "after"})).await;
    assert_eq!(reply, ServerReply::Pong { id: "after".into() });
}

#[tokio::test]
async fn focus_navigation_clamps_at_the_last_option() {
    let server = spawn_detached_server().await;
    let mut conn = connect(server.addr).await;
    let id = load_select(&mut conn, json!({})).await;

    call_ok(&mut conn, &id, "open", json!([])).await;
    for _ in 0..(3 + 5) {
        call_ok(&mut conn, &id, "focus_next_option", json!([])).await;
    }

    let state = state_of(&mut conn, &id).await;
    assert_eq!(state["focused_option_index"], json!(2));
}

#[tokio::test]
async fn multi_select_toggles_entries() {
    let server = spawn_detached_server().await;
    let mut conn = connect(server.addr).await;
    let id = load_select(&mut conn, json!({"multi": true})).await;

    call_ok(&mut conn, &id, "select_option", json!([0])).await;
    call_ok(&mut conn, &id, "select_option", json!([2])).await;
    let state = state_of(&mut conn, &id).await;
    assert_eq!(state["selected_options"].as_array().unwrap().len(), 2);

    call_ok(&mut conn, &id, "select_option", json!([2])).await;
    let state = state_of(&mut conn, &id).await;
    assert_eq!(state["selected_options"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn disabled_select_declines_to_open() {
    let server = spawn_detached_server().await;
    let mut conn = connect(server.addr).await;
    let id = load_select(&mut conn, json!({"disabled": true})).await;

    assert_eq!(call_ok(&mut conn, &id, "open", json!([])).await, json!(false));
    let state = state_of(&mut conn, &id).await;
    assert_eq!(state["is_open"], json!(false));
}

#[tokio::test]
async fn unknown_component_type_is_unsupported() {
    let server = spawn_detached_server().await;
    let mut conn = connect(server.addr).await;

    let reply = request(
        &mut conn,
        json!({"type": "load_component", "id": "r1", "name": "TreeView"}),
    )
    .await;

    assert_eq!(reply.request_id(), Some("r1"));
    assert_eq!(reply.error_code(), Some(ErrorCode::UnsupportedType));
    assert!(server.app.components.is_empty());
}

#[tokio::test]
async fn missing_component_is_not_found() {
    let server = spawn_detached_server().await;
    let mut conn = connect(server.addr).await;

    let reply = call(&mut conn, "select-missing", "open", json!([])).await;
    assert_eq!(reply.error_code(), Some(ErrorCode::ComponentNotFound));

    let reply = request(
        &mut conn,
        json!({"type": "get_state", "id": "g", "component_id": "select-missing"}),
    )
    .await;
    assert_eq!(reply.error_code(), Some(ErrorCode::ComponentNotFound));
}

#[tokio::test]
async fn method_errors_keep_the_connection_open() {
    let server = spawn_detached_server().await;
    let mut conn = connect(server.addr).await;
    let id = load_select(&mut conn, json!({})).await;

    let reply = call(&mut conn, &id, "explode", json!([])).await;
    assert_eq!(reply.error_code(), Some(ErrorCode::MethodNotFound));

    let reply = call(&mut conn, &id, "select_option", json!(["first"])).await;
    assert_eq!(reply.error_code(), Some(ErrorCode::InvalidArgument));

    let reply = request(&mut conn, json!({"type": "ping", "id": "still-here"})).await;
    assert_eq!(reply, ServerReply::Pong { id: "still-here".into() });
}

#[tokio::test]
async fn set_props_options_round_trip() {
    let server = spawn_detached_server().await;
    let mut conn = connect(server.addr).await;
    let id = load_select(&mut conn, json!({})).await;

    let options = json!([
        {"id": "a", "text": "One", "value": 1},
        {"id": "b", "text": "Two", "value": 2},
        {"id": "c", "text": "Three", "value": 3},
        {"id": "d", "text": "Four", "value": 4},
    ]);
    let reply = request(
        &mut conn,
        json!({
            "type": "set_props",
            "id": "sp",
            "component_id": id,
            "props": {"options": options, "placeholder": "Pick a number"},
        }),
    )
    .await;
    assert_eq!(
        reply,
        ServerReply::PropsSet {
            id: "sp".into(),
            component_id: id.clone(),
            success: true,
        }
    );

    let state = state_of(&mut conn, &id).await;
    assert_eq!(state["options"], options);
    assert_eq!(state["placeholder"], json!("Pick a number"));

    let reply = request(
        &mut conn,
        json!({"type": "set_props", "id": "bad", "component_id": id, "props": "nope"}),
    )
    .await;
    assert_eq!(reply.error_code(), Some(ErrorCode::InvalidArgument));
}

#[tokio::test]
async fn fixed_ids_conflict_unless_forced() {
    let server = spawn_detached_server().await;
    let mut conn = connect(server.addr).await;

    let id = load_select(&mut conn, json!({"component_id": "picker"})).await;
    assert_eq!(id, "picker");
    call_ok(&mut conn, &id, "open", json!([])).await;

    let reply = request(
        &mut conn,
        json!({"type": "load_component", "id": "again", "name": "Select", "component_id": "picker"}),
    )
    .await;
    assert_eq!(reply.error_code(), Some(ErrorCode::ComponentExists));

    let id = load_select(&mut conn, json!({"component_id": "picker", "force": true})).await;
    let state = state_of(&mut conn, &id).await;
    assert_eq!(state["is_open"], json!(false));
    assert_eq!(server.app.components.len(), 1);
    assert_eq!(server.app.buffers.open_count(), 1);
}

#[tokio::test]
async fn clean_all_destroys_everything() {
    let server = spawn_detached_server().await;
    let mut conn = connect(server.addr).await;
    let first = load_select(&mut conn, json!({})).await;
    load_select(&mut conn, json!({})).await;

    let reply = request(&mut conn, json!({"type": "clean_all", "id": "c"})).await;
    assert_eq!(
        reply,
        ServerReply::AllCleaned {
            id: "c".into(),
            count: 2
        }
    );
    assert_eq!(server.app.buffers.open_count(), 0);

    let reply = call(&mut conn, &first, "open", json!([])).await;
    assert_eq!(reply.error_code(), Some(ErrorCode::ComponentNotFound));
}

#[tokio::test]
async fn malformed_lines_get_error_replies() {
    let server = spawn_detached_server().await;
    let mut conn = connect(server.addr).await;

    send_line(&mut conn, "this is not json").await;
    let reply = recv_reply(&mut conn).await;
    assert_eq!(reply.request_id(), None);
    assert_eq!(reply.error_code(), Some(ErrorCode::InvalidRequest));

    send_line(&mut conn, "[1, 2, 3]").await;
    let reply = recv_reply(&mut conn).await;
    assert_eq!(reply.error_code(), Some(ErrorCode::InvalidRequest));

    send_json(&mut conn, json!({"type": "ping", "id": 7})).await;
    let reply = recv_reply(&mut conn).await;
    assert_eq!(reply.request_id(), Some("7"));
    assert_eq!(reply.error_code(), Some(ErrorCode::InvalidRequest));

    send_json(&mut conn, json!({"type": "frobnicate", "id": "f"})).await;
    let reply = recv_reply(&mut conn).await;
    assert_eq!(reply.request_id(), Some("f"));
    assert_eq!(reply.error_code(), Some(ErrorCode::UnknownCommand));

    send_json(&mut conn, json!({"type": "call_method", "id": "half"})).await;
    let reply = recv_reply(&mut conn).await;
    assert_eq!(reply.request_id(), Some("half"));
    assert_eq!(reply.error_code(), Some(ErrorCode::InvalidRequest));

    // Blank lines are skipped, not answered
    send_line(&mut conn, "   ").await;
    let reply = request(&mut conn, json!({"type": "ping", "id": "after"})).await;
    assert_eq!(reply, ServerReply::Pong { id: "after".into() });
}

#[tokio::test]
async fn replies_keep_request_order() {
    let server = spawn_detached_server().await;
    let mut conn = connect(server.addr).await;

    for i in 0..5 {
        send_json(&mut conn, json!({"type": "ping", "id": format!("p{i}")})).await;
    }
    for i in 0..5 {
        let reply = recv_reply(&mut conn).await;
        assert_eq!(reply.request_id(), Some(format!("p{i}").as_str()));
    }
}

#[tokio::test]
async fn registry_is_shared_between_connections() {
    let server = spawn_detached_server().await;
    let mut first = connect(server.addr).await;
    let mut second = connect(server.addr).await;

    let id = load_select(&mut first, json!({})).await;
    call_ok(&mut second, &id, "open", json!([])).await;

    let state = state_of(&mut first, &id).await;
    assert_eq!(state["is_open"], json!(true));
}

#[tokio::test]
async fn overlong_line_closes_the_connection() {
    let server = spawn_detached_server().await;
    let mut conn = connect(server.addr).await;

    let long = "x".repeat(test_config().max_line_bytes + 100);
    send_line(&mut conn, &long).await;

    // The error reply may or may not beat the close
    loop {
        let next = tokio::time::timeout(REPLY_TIMEOUT, conn.next())
            .await
            .expect("connection should close");
        match next {
            Some(Ok(line)) => {
                let reply: ServerReply = serde_json::from_str(&line).unwrap();
                assert_eq!(reply.error_code(), Some(ErrorCode::InvalidRequest));
            }
            Some(Err(_)) | None => break,
        }
    }

    // Other connections are unaffected
    let mut other = connect(server.addr).await;
    let reply = request(&mut other, json!({"type": "ping", "id": "ok"})).await;
    assert_eq!(reply, ServerReply::Pong { id: "ok".into() });
}

#[tokio::test]
async fn loaded_components_answer_on_the_bridge() {
    let link = BridgeLink::pair(BridgeConfig::with_timeout(Duration::from_secs(1)));
    let server = spawn_server(App::new(test_config(), link.engine.clone())).await;
    let mut conn = connect(server.addr).await;

    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    link.host.register_handler(
        "bridged",
        handler_fn(move |m: Message| {
            let tx = tx.clone();
            async move {
                let _ = tx.send(m.action);
                Ok(Value::Null)
            }
        }),
    );

    let id = load_select(&mut conn, json!({"component_id": "bridged"})).await;
    assert_eq!(rx.recv().await.unwrap(), "component:mounted");

    call_ok(&mut conn, &id, "open", json!([])).await;
    assert_eq!(rx.recv().await.unwrap(), "select:opened");

    let state = link.host.request(&id, actions::GET_STATE, Value::Null).await.unwrap();
    assert_eq!(state["is_open"], json!(true));

    let closed = link
        .host
        .request(&id, actions::CALL_METHOD, json!({"method": "close", "args": []}))
        .await
        .unwrap();
    assert_eq!(closed, json!(true));
    assert_eq!(rx.recv().await.unwrap(), "select:closed");
}

#[tokio::test]
async fn shutdown_stops_the_server_and_destroys_components() {
    let server = spawn_detached_server().await;
    let mut conn = connect(server.addr).await;
    load_select(&mut conn, json!({})).await;

    server.cancel.cancel();
    tokio::time::timeout(REPLY_TIMEOUT, server.handle)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(server.app.shutdown().await, 1);
    assert!(server.app.components.is_empty());
    assert_eq!(server.app.buffers.open_count(), 0);
}
