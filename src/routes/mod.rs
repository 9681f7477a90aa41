use axum::Router;

use crate::state::SharedState;

/// Health endpoint.
pub mod health;
/// Display event stream endpoint.
pub mod sse;

/// Compose all route trees and wire in shared state.
pub fn router(state: SharedState) -> Router<()> {
    health::router().merge(sse::router()).with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode},
    };
    use futures::StreamExt;
    use serde_json::{Value, json};
    use tokio::{sync::watch, time::timeout};
    use tower::ServiceExt;

    use super::*;
    use crate::{
        services::{
            connection::LinkState,
            presentation::{PresentationGateway, SsePresentation},
        },
        state::{
            AppState,
            state_machine::{RoundPhase, RoundStateMachine},
        },
    };

    #[tokio::test]
    async fn healthcheck_reports_degraded_without_link() {
        let (_tx, link) = watch::channel(LinkState::Disconnected);
        let app = router(AppState::new(RoundStateMachine::new().snapshot(), link));

        let response = app
            .oneshot(Request::get("/healthcheck").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            value,
            json!({"status": "degraded", "phase": "welcome", "link": "disconnected"})
        );
    }

    #[tokio::test]
    async fn display_stream_starts_with_current_screen() {
        let (_tx, link) = watch::channel(LinkState::Open);
        let state = AppState::new(RoundStateMachine::new().snapshot(), link);
        SsePresentation::new(state.clone()).show_phase_screen(RoundPhase::Revealing);

        let response = router(state)
            .oneshot(Request::get("/sse/display").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let mut body = response.into_body().into_data_stream();
        let first = timeout(std::time::Duration::from_secs(5), body.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        let text = String::from_utf8(first.to_vec()).unwrap();
        assert!(text.contains("event: phase"), "unexpected frame: {text}");
        assert!(text.contains("revealing"), "unexpected frame: {text}");
    }
}
