//! Trigger delegation: debounce, throttle, and duplicate-request
//! coordination through the dispatch surface.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use markwire::{
    Document, DomEvent, Element, Engine, EngineError, RequestDescriptor, Response, Transport,
};

fn ok_response(body: &str) -> Response {
    let mut headers = BTreeMap::new();
    headers.insert("content-type".to_string(), "text/plain".to_string());
    Response {
        status: 200,
        headers,
        body: body.as_bytes().to_vec(),
    }
}

/// Replies instantly, recording request URLs.
struct RecordingTransport {
    urls: Mutex<Vec<String>>,
}

impl RecordingTransport {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            urls: Mutex::new(Vec::new()),
        })
    }

    fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(
        &self,
        request: &RequestDescriptor,
        _cancel: CancellationToken,
    ) -> Result<Response, EngineError> {
        self.urls.lock().unwrap().push(request.url.clone());
        Ok(ok_response("ok"))
    }
}

/// Parks every request until released; observes cancellation.
struct GatedTransport {
    release: Notify,
    calls: AtomicU32,
}

impl GatedTransport {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            release: Notify::new(),
            calls: AtomicU32::new(0),
        })
    }
}

#[async_trait]
impl Transport for GatedTransport {
    async fn send(
        &self,
        _request: &RequestDescriptor,
        cancel: CancellationToken,
    ) -> Result<Response, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::select! {
            _ = self.release.notified() => Ok(ok_response("done")),
            _ = cancel.cancelled() => Err(EngineError::Aborted {
                reason: "cancelled in flight".to_string(),
            }),
        }
    }
}

fn debounced_search(doc: &Document) -> Element {
    let input = doc.create_element("input");
    input.set_attr("name", "q");
    input.set_attr("mw-get", "/api/search");
    input.set_attr("mw-trigger", "input delay:500ms");
    doc.root().append_child(&input);
    input
}

#[tokio::test(start_paused = true)]
async fn test_debounce_coalesces_a_typing_burst() {
    let doc = Document::new();
    let input = debounced_search(&doc);
    let transport = RecordingTransport::new();
    let engine = Engine::builder(doc, transport.clone()).build().unwrap();
    engine.init(json!({})).unwrap();

    // Keystrokes at t=0, t=200, t=400; the 500ms window resets each time.
    input.set_value("a");
    assert!(engine
        .dispatch(&DomEvent::new("input", input.clone()))
        .await
        .unwrap()
        .is_none());
    tokio::time::advance(Duration::from_millis(200)).await;
    input.set_value("ab");
    engine.dispatch(&DomEvent::new("input", input.clone())).await.unwrap();
    tokio::time::advance(Duration::from_millis(200)).await;
    input.set_value("abc");
    engine.dispatch(&DomEvent::new("input", input.clone())).await.unwrap();

    // Nothing fires before t=900.
    tokio::time::advance(Duration::from_millis(499)).await;
    tokio::task::yield_now().await;
    assert!(transport.urls().is_empty());

    // One request at t=900 reading the final value.
    tokio::time::sleep(Duration::from_millis(2)).await;
    tokio::task::yield_now().await;
    assert_eq!(transport.urls(), ["/api/search?q=abc"]);
}

#[tokio::test(start_paused = true)]
async fn test_throttle_drops_inside_the_interval() {
    let doc = Document::new();
    let button = doc.create_element("button");
    button.set_attr("mw-get", "/api/poll");
    button.set_attr("mw-trigger", "click throttle:200ms");
    doc.root().append_child(&button);

    let transport = RecordingTransport::new();
    let engine = Engine::builder(doc, transport.clone()).build().unwrap();
    engine.init(json!({})).unwrap();

    let first = engine
        .dispatch(&DomEvent::new("click", button.clone()))
        .await
        .unwrap();
    assert!(first.is_some());

    tokio::time::advance(Duration::from_millis(50)).await;
    let second = engine
        .dispatch(&DomEvent::new("click", button.clone()))
        .await
        .unwrap();
    assert!(second.is_none());
    assert_eq!(transport.urls().len(), 1);

    tokio::time::advance(Duration::from_millis(200)).await;
    let third = engine
        .dispatch(&DomEvent::new("click", button.clone()))
        .await
        .unwrap();
    assert!(third.is_some());
    assert_eq!(transport.urls().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_throttle_gates_the_debounce_when_combined() {
    let doc = Document::new();
    let input = doc.create_element("input");
    input.set_attr("name", "q");
    input.set_attr("mw-get", "/api/search");
    input.set_attr("mw-trigger", "input delay:200ms throttle:500ms");
    doc.root().append_child(&input);

    let transport = RecordingTransport::new();
    let engine = Engine::builder(doc, transport.clone()).build().unwrap();
    engine.init(json!({})).unwrap();

    // t=0 passes the throttle and arms the debounce.
    input.set_value("a");
    assert!(engine
        .dispatch(&DomEvent::new("input", input.clone()))
        .await
        .unwrap()
        .is_none());

    // t=100 is inside the throttle interval: dropped, the pending debounce
    // is not re-armed.
    tokio::time::advance(Duration::from_millis(100)).await;
    input.set_value("ab");
    engine.dispatch(&DomEvent::new("input", input.clone())).await.unwrap();

    tokio::time::advance(Duration::from_millis(99)).await;
    tokio::task::yield_now().await;
    assert!(transport.urls().is_empty());

    // The t=0 debounce fires at t=200 reading the live value.
    tokio::time::sleep(Duration::from_millis(2)).await;
    tokio::task::yield_now().await;
    assert_eq!(transport.urls(), ["/api/search?q=ab"]);

    // t=600 clears the throttle and arms a fresh debounce.
    tokio::time::advance(Duration::from_millis(399)).await;
    input.set_value("abc");
    engine.dispatch(&DomEvent::new("input", input.clone())).await.unwrap();
    tokio::time::sleep(Duration::from_millis(201)).await;
    tokio::task::yield_now().await;
    assert_eq!(transport.urls(), ["/api/search?q=ab", "/api/search?q=abc"]);
}

#[tokio::test(start_paused = true)]
async fn test_modified_triggers_leave_native_default_alone() {
    let doc = Document::new();
    let button = doc.create_element("button");
    button.set_attr("mw-get", "/api/poll");
    button.set_attr("mw-trigger", "click throttle:200ms");
    doc.root().append_child(&button);
    let input = debounced_search(&doc);

    let engine = Engine::builder(doc, RecordingTransport::new()).build().unwrap();
    engine.init(json!({})).unwrap();

    let click = DomEvent::new("click", button);
    assert!(engine.dispatch(&click).await.unwrap().is_some());
    assert!(!click.default_prevented());

    let typing = DomEvent::new("input", input);
    assert!(engine.dispatch(&typing).await.unwrap().is_none());
    assert!(!typing.default_prevented());
}

#[tokio::test]
async fn test_dispatch_ignores_unmarked_targets() {
    let doc = Document::new();
    let div = doc.create_element("div");
    doc.root().append_child(&div);

    let engine = Engine::builder(doc, RecordingTransport::new()).build().unwrap();
    engine.init(json!({})).unwrap();

    let event = DomEvent::new("click", div);
    assert!(engine.dispatch(&event).await.unwrap().is_none());
    assert!(!event.default_prevented());
}

#[tokio::test]
async fn test_dispatch_resolves_through_descendants_and_prevents_default() {
    let doc = Document::new();
    let button = doc.create_element("button");
    button.set_attr("mw-get", "/api/items");
    doc.root().append_child(&button);
    let icon = doc.create_element("span");
    button.append_child(&icon);

    let transport = RecordingTransport::new();
    let engine = Engine::builder(doc, transport.clone()).build().unwrap();
    engine.init(json!({})).unwrap();

    let event = DomEvent::new("click", icon);
    let cx = engine.dispatch(&event).await.unwrap().unwrap();
    assert!(cx.success);
    assert!(event.default_prevented());
    assert_eq!(transport.urls(), ["/api/items"]);
}

#[tokio::test]
async fn test_force_trigger_bypasses_the_declared_spec() {
    let doc = Document::new();
    let input = debounced_search(&doc);
    input.set_value("now");

    let transport = RecordingTransport::new();
    let engine = Engine::builder(doc, transport.clone()).build().unwrap();
    engine.init(json!({})).unwrap();

    // Force events run inline, skipping the 500ms debounce.
    let cx = engine
        .dispatch(&DomEvent::force(input.clone()))
        .await
        .unwrap()
        .unwrap();
    assert!(cx.success);
    assert_eq!(transport.urls(), ["/api/search?q=now"]);
}

#[tokio::test(start_paused = true)]
async fn test_ignore_policy_drops_duplicate_runs() {
    let doc = Document::new();
    let button = doc.create_element("button");
    button.set_attr("mw-get", "/api/slow");
    doc.root().append_child(&button);

    let transport = GatedTransport::new();
    let engine = Engine::builder(doc, transport.clone()).build().unwrap();
    engine.init(json!({})).unwrap();

    let first = {
        let engine = engine.clone();
        let button = button.clone();
        tokio::spawn(async move { engine.trigger(&button, json!({})).await })
    };
    tokio::task::yield_now().await;
    assert_eq!(transport.calls.load(Ordering::SeqCst), 1);

    // Default sync policy: a duplicate on a busy element never proceeds.
    let duplicate = engine.trigger(&button, json!({})).await.unwrap();
    assert!(duplicate.state.aborted);
    assert!(!duplicate.success);
    assert_eq!(transport.calls.load(Ordering::SeqCst), 1);

    transport.release.notify_one();
    let cx = first.await.unwrap().unwrap();
    assert!(cx.success);
}

#[tokio::test(start_paused = true)]
async fn test_abort_previous_cancels_the_in_flight_run() {
    let doc = Document::new();
    let button = doc.create_element("button");
    button.set_attr("mw-get", "/api/slow");
    button.set_attr("mw-sync", "abort-previous");
    doc.root().append_child(&button);

    let transport = GatedTransport::new();
    let engine = Engine::builder(doc, transport.clone()).build().unwrap();
    engine.init(json!({})).unwrap();

    let first = {
        let engine = engine.clone();
        let button = button.clone();
        tokio::spawn(async move { engine.trigger(&button, json!({})).await })
    };
    tokio::task::yield_now().await;
    assert_eq!(transport.calls.load(Ordering::SeqCst), 1);

    let second = {
        let engine = engine.clone();
        let button = button.clone();
        tokio::spawn(async move { engine.trigger(&button, json!({})).await })
    };
    tokio::task::yield_now().await;

    // The first run was cancelled by the supersession.
    let first_result = first.await.unwrap();
    assert!(matches!(first_result, Err(EngineError::Aborted { .. })));

    transport.release.notify_one();
    let cx = second.await.unwrap().unwrap();
    assert!(cx.success);
    assert_eq!(transport.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_teardown_stops_dispatch() {
    let doc = Document::new();
    let button = doc.create_element("button");
    button.set_attr("mw-get", "/api/items");
    doc.root().append_child(&button);

    let transport = RecordingTransport::new();
    let engine = Engine::builder(doc, transport.clone()).build().unwrap();
    engine.init(json!({})).unwrap();
    engine.teardown();

    assert!(engine
        .dispatch(&DomEvent::new("click", button))
        .await
        .unwrap()
        .is_none());
    assert!(transport.urls().is_empty());
}
