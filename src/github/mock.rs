//! Scripted in-memory transport for unit tests

use std::cell::RefCell;
use std::collections::VecDeque;

use super::{HttpRequest, HttpResponse, Transport};
use crate::types::{Result, TrendsError};

/// Replays queued responses in order and records every request
#[derive(Default)]
pub struct ScriptedTransport {
    responses: RefCell<VecDeque<HttpResponse>>,
    requests: RefCell<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new(responses: Vec<HttpResponse>) -> Self {
        Self {
            responses: RefCell::new(responses.into()),
            requests: RefCell::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.borrow().clone()
    }

    pub fn remaining(&self) -> usize {
        self.responses.borrow().len()
    }
}

impl Transport for ScriptedTransport {
    fn get(&self, request: &HttpRequest) -> Result<HttpResponse> {
        self.requests.borrow_mut().push(request.clone());
        self.responses
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| TrendsError::Http(format!("unexpected request to {}", request.url)))
    }
}

pub fn ok(body: impl Into<String>) -> HttpResponse {
    HttpResponse {
        status: 200,
        body: body.into(),
        ..Default::default()
    }
}

pub fn status(code: u16, body: &str) -> HttpResponse {
    HttpResponse {
        status: code,
        body: body.to_string(),
        ..Default::default()
    }
}

/// Search response with `n` items created at `created_at`
pub fn search_page(n: usize, created_at: &str) -> HttpResponse {
    let items: Vec<String> = (0..n)
        .map(|i| format!(r#"{{"number":{},"created_at":"{}"}}"#, i + 1, created_at))
        .collect();
    ok(format!(
        r#"{{"total_count":{},"incomplete_results":false,"items":[{}]}}"#,
        n,
        items.join(",")
    ))
}

/// Commit listing page with `n` commits by `login` at `date`
pub fn commit_page(n: usize, login: &str, date: &str) -> HttpResponse {
    let commits: Vec<String> = (0..n)
        .map(|i| {
            format!(
                r#"{{"sha":"{:040}","author":{{"login":"{}"}},"commit":{{"author":{{"email":"{}@example.com","date":"{}"}}}}}}"#,
                i, login, login, date
            )
        })
        .collect();
    ok(format!("[{}]", commits.join(",")))
}
