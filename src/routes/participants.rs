use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::patch,
    Router,
};

use crate::{error::TripError, state::AppState};

use super::parse_id;

pub fn router() -> Router<AppState> {
    Router::new().route("/participants/:participant_id/confirm", patch(confirm_participant))
}

async fn confirm_participant(
    State(state): State<AppState>,
    Path(participant_id): Path<String>,
) -> Result<StatusCode, TripError> {
    let participant_id = parse_id(&participant_id)?;
    state.planner.confirm_participant(participant_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
