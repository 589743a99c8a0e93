// SPDX-License-Identifier: Apache-2.0

use canvass_model::{
    AnswerKind, Question, QuestionId, ResponseSet, ResponseSetId, ScreenKey,
};
use canvass_server::{build_router, AppState, FakeStore};
use canvass_store::ResponseStore;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

pub fn qid(n: u8) -> QuestionId {
    QuestionId::parse(&format!("00000000-0000-0000-0000-0000000000{n:02x}")).expect("question id")
}

pub fn sid(n: u8) -> ResponseSetId {
    ResponseSetId::parse(&format!("00000000-0000-0000-0000-00000000ff{n:02x}"))
        .expect("response set id")
}

pub fn screen() -> ScreenKey {
    ScreenKey::parse("intake").expect("screen key")
}

#[allow(dead_code)]
pub fn question(
    n: u8,
    kind: AnswerKind,
    options: &[&str],
    parent: Option<u8>,
    rules: &[&str],
) -> Question {
    Question::new(
        qid(n),
        screen(),
        u32::from(n),
        format!("q{n}"),
        kind,
        options.iter().map(|o| (*o).to_string()).collect(),
        parent.map(qid),
        if rules.is_empty() {
            None
        } else {
            Some(rules.iter().map(|r| (*r).to_string()).collect())
        },
    )
}

/// Boolean root q1 with a dependent long-text q2, one response set.
#[allow(dead_code)]
pub async fn seed_basic(store: &FakeStore) {
    store
        .insert_question(&question(1, AnswerKind::Boolean, &[], None, &[]))
        .await
        .expect("seed q1");
    store
        .insert_question(&question(
            2,
            AnswerKind::LongText,
            &[],
            Some(1),
            &["true"],
        ))
        .await
        .expect("seed q2");
    store
        .create_response_set(&ResponseSet::new(sid(1), 1_700_000_000))
        .await
        .expect("seed response set");
}

pub async fn spawn_app(store: Arc<FakeStore>) -> SocketAddr {
    let state = AppState::new(store);
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve app");
    });
    addr
}

pub struct HttpReply {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpReply {
    #[allow(dead_code)]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[allow(dead_code)]
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).expect("json body")
    }

    #[allow(dead_code)]
    pub fn error_code(&self) -> String {
        self.json()["error"]["code"]
            .as_str()
            .expect("error code")
            .to_string()
    }
}

pub async fn send_request(
    addr: SocketAddr,
    method: &str,
    path: &str,
    headers: &[(&str, &str)],
    body: Option<&str>,
) -> HttpReply {
    let mut stream = tokio::net::TcpStream::connect(addr)
        .await
        .expect("connect server");
    let mut request = format!("{method} {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n");
    for (name, value) in headers {
        request.push_str(&format!("{name}: {value}\r\n"));
    }
    if let Some(body) = body {
        request.push_str(&format!(
            "content-type: application/json\r\ncontent-length: {}\r\n",
            body.len()
        ));
    }
    request.push_str("\r\n");
    if let Some(body) = body {
        request.push_str(body);
    }
    stream
        .write_all(request.as_bytes())
        .await
        .expect("write request");

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.expect("read response");
    let raw = String::from_utf8(raw).expect("utf8 response");

    let (head, body) = raw.split_once("\r\n\r\n").expect("header separator");
    let mut lines = head.lines();
    let status_line = lines.next().expect("status line");
    let status: u16 = status_line
        .split_whitespace()
        .nth(1)
        .expect("status code")
        .parse()
        .expect("numeric status");
    let headers = lines
        .filter_map(|line| {
            line.split_once(':')
                .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        })
        .collect();
    HttpReply {
        status,
        headers,
        body: body.to_string(),
    }
}
