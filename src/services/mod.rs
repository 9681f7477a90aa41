/// Game server websocket link and reconnect loop.
pub mod connection;
/// One-second countdown state.
pub mod countdown;
/// Inbound frame decoding and routing.
pub mod dispatcher;
/// Runtime loop feeding the round controller.
pub mod display_loop;
/// Health check service.
pub mod health_service;
/// Render gateway and its SSE implementation.
pub mod presentation;
/// Round lifecycle orchestration.
pub mod round_service;
/// Server-Sent Events broadcasting service.
pub mod sse_service;
/// Tokio timers reporting fires to the display loop.
pub mod timers;
/// Vote accumulation for the current round.
pub mod votes;
/// Winners showcase pagination.
pub mod winners;
