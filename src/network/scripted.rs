//! Scripted network with a fixed URL table

use super::{Network, NetworkError, Request, Response};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Clone)]
enum Route {
    Respond(Response),
    Fail(String),
}

/// Network that answers from a URL table and records every request.
///
/// Unknown URLs fail as unreachable, which makes it double as an
/// "offline" network.
#[derive(Debug, Default)]
pub struct StaticNetwork {
    routes: Mutex<HashMap<String, Route>>,
    log: Mutex<Vec<Request>>,
}

impl StaticNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` with status 200 for `url`
    pub fn serve(&self, url: &str, body: impl Into<Vec<u8>>) -> &Self {
        self.respond(url, Response::new(url, 200, body))
    }

    /// Serve an arbitrary response for `url`
    pub fn respond(&self, url: &str, response: Response) -> &Self {
        self.lock_routes()
            .insert(url.to_string(), Route::Respond(response));
        self
    }

    /// Make `url` fail at the transport level
    pub fn fail(&self, url: &str, reason: &str) -> &Self {
        self.lock_routes()
            .insert(url.to_string(), Route::Fail(reason.to_string()));
        self
    }

    /// Drop every route, so all requests fail
    pub fn go_offline(&self) {
        self.lock_routes().clear();
    }

    /// Requests served so far, in order
    pub fn requests(&self) -> Vec<Request> {
        self.log.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Number of requests made for `url`
    pub fn hits(&self, url: &str) -> usize {
        self.requests().iter().filter(|r| r.url == url).count()
    }

    fn lock_routes(&self) -> std::sync::MutexGuard<'_, HashMap<String, Route>> {
        self.routes.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl Network for StaticNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
        self.log
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());

        let route = self.lock_routes().get(&request.url).cloned();
        match route {
            Some(Route::Respond(response)) => Ok(response),
            Some(Route::Fail(reason)) => Err(NetworkError::Unreachable {
                url: request.url.clone(),
                reason,
            }),
            None => Err(NetworkError::Unreachable {
                url: request.url.clone(),
                reason: "no route".to_string(),
            }),
        }
    }
}
