pub mod participants;
pub mod trips;

use std::time::Duration;

use axum::{
    error_handling::HandleErrorLayer,
    extract::{rejection::JsonRejection, Json},
    http::{StatusCode, Uri},
    response::Response,
    BoxError, Router,
};
use tower::{timeout::error::Elapsed, ServiceBuilder};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::{
    error::{message_response, TripError},
    state::AppState,
};

pub fn create_router(state: AppState) -> Router {
    let timeout = state.config.request_timeout;
    let router = Router::new()
        .merge(trips::router())
        .merge(participants::router())
        .fallback(no_route);
    with_layers(router, timeout).with_state(state)
}

/// Tracing plus a per-request deadline; dropping the handler future on expiry
/// rolls back any open transaction.
fn with_layers<S>(router: Router<S>, timeout: Duration) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(HandleErrorLayer::new(layer_failure))
            .timeout(timeout),
    )
}

async fn layer_failure(err: BoxError) -> Response {
    if err.is::<Elapsed>() {
        message_response(StatusCode::REQUEST_TIMEOUT, "request timed out, try again later")
    } else {
        message_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "something went wrong, try again later",
        )
    }
}

async fn no_route(uri: Uri) -> Response {
    message_response(StatusCode::NOT_FOUND, format!("no route for {}", uri.path()))
}

fn parse_id(raw: &str) -> Result<Uuid, TripError> {
    Uuid::parse_str(raw).map_err(|err| TripError::validation(format!("invalid uuid: {err}")))
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, TripError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| TripError::validation(rejection.body_text()))
}

#[cfg(test)]
mod tests {
    use axum::{body::Body, http::Request, routing::get};
    use tower::ServiceExt;

    use super::*;

    async fn message_of(response: Response) -> (StatusCode, String) {
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let json: serde_json::Value = serde_json::from_slice(&bytes).expect("json envelope");
        (status, json["message"].as_str().unwrap_or_default().to_string())
    }

    #[tokio::test]
    async fn slow_requests_time_out_with_the_envelope() {
        let router: Router = with_layers(
            Router::new().route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_millis(500)).await;
                    "late"
                }),
            ),
            Duration::from_millis(20),
        );

        let response = router
            .oneshot(Request::get("/slow").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let (status, message) = message_of(response).await;
        assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
        assert_eq!(message, "request timed out, try again later");
    }

    #[tokio::test]
    async fn unknown_routes_answer_with_the_envelope() {
        let response = no_route(Uri::from_static("/nowhere?x=1")).await;
        let (status, message) = message_of(response).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(message, "no route for /nowhere");
    }
}
