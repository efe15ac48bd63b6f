// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Coordination Service's accept loop, wrapping [`crate::coordination::dispatch`]
//! over `warden_wire`'s length-prefixed framing.
//!
//! Wire shape per connection: one session-id frame (raw UTF-8 bytes, same
//! length-prefix framing as every other message) followed by one request/
//! response pair, then the connection closes. Workers read their own id
//! from the `WARDEN_SESSION_ID` env var `warden_adapters::worker` sets on
//! spawn and send it as that first frame.

use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use warden_core::Clock;
use warden_wire::{read_message, read_request, write_response};

use crate::coordination::dispatch;
use crate::error::OrchestratorError;

/// Accepts coordination-service connections and dispatches each one against
/// the durable store. Generic over `C: Clock` for the same reason the
/// Budget Monitor is: each request is timestamped with `clock.epoch_ms()`
/// at dispatch time, so tests can control it.
pub struct CoordinationListener<C: Clock> {
    paths: warden_store::ProjectPaths,
    clock: C,
    test_command: String,
}

impl<C: Clock + 'static> CoordinationListener<C> {
    pub fn new(paths: warden_store::ProjectPaths, clock: C, test_command: impl Into<String>) -> Self {
        Self { paths, clock, test_command: test_command.into() }
    }

    /// Bind `addr` and return the listener plus the address actually bound
    /// (useful when `addr` ends in `:0` and the OS picks the port).
    pub async fn bind(self, addr: &str) -> Result<(BoundListener, std::net::SocketAddr), OrchestratorError> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        Ok((BoundListener { inner: Arc::new(self), listener }, local_addr))
    }
}

/// A [`CoordinationListener`] that has bound its socket and is ready to
/// accept connections.
pub struct BoundListener {
    inner: Arc<CoordinationListenerDyn>,
    listener: TcpListener,
}

// Type-erased so `BoundListener` doesn't need to carry `C` as a generic
// parameter into `tokio::spawn`'s `'static` bound.
type CoordinationListenerDyn = dyn DispatchOne + Send + Sync;

#[async_trait::async_trait]
trait DispatchOne {
    async fn dispatch_one(&self, session_id: &str, request: warden_wire::Request) -> warden_wire::Response;
}

#[async_trait::async_trait]
impl<C: Clock> DispatchOne for CoordinationListener<C> {
    async fn dispatch_one(&self, session_id: &str, request: warden_wire::Request) -> warden_wire::Response {
        dispatch(&self.paths, session_id, request, self.clock.epoch_ms(), &self.test_command).await
    }
}

impl BoundListener {
    /// Run the accept loop until the process is shut down. Each connection
    /// is handled on its own task so one slow or malformed peer can't stall
    /// the others.
    pub async fn run(self) -> Result<(), OrchestratorError> {
        loop {
            let (stream, _peer) = self.listener.accept().await?;
            let dispatcher = self.inner.clone();
            tokio::spawn(async move {
                if let Err(err) = handle_connection(stream, dispatcher.as_ref()).await {
                    tracing::warn!(error = %err, "coordination connection failed");
                }
            });
        }
    }
}

async fn handle_connection(mut stream: TcpStream, dispatcher: &CoordinationListenerDyn) -> Result<(), OrchestratorError> {
    let session_id_bytes = read_message(&mut stream).await?;
    let session_id = String::from_utf8_lossy(&session_id_bytes).to_string();
    let request = read_request(&mut stream).await?;
    let response = dispatcher.dispatch_one(&session_id, request).await;
    write_response(&mut stream, &response).await?;
    Ok(())
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
