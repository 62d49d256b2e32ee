use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::TripError,
    models::{
        activity::ActivityDay,
        link::Link,
        participant::ParticipantView,
        trip::{NewTrip, Trip, TripUpdate},
    },
    state::AppState,
};

use super::{body, parse_id};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/trips", post(create_trip))
        .route("/trips/:trip_id", get(get_trip).put(update_trip))
        .route("/trips/:trip_id/confirm", get(confirm_trip))
        .route(
            "/trips/:trip_id/activities",
            get(list_activities).post(create_activity),
        )
        .route("/trips/:trip_id/links", get(list_links).post(create_link))
        .route("/trips/:trip_id/participants", get(list_participants))
        .route("/trips/:trip_id/invites", post(invite_participant))
}

#[derive(Serialize)]
struct CreateTripResponse {
    trip_id: Uuid,
}

async fn create_trip(
    State(state): State<AppState>,
    payload: Result<Json<NewTrip>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateTripResponse>), TripError> {
    let new_trip = body(payload)?;
    let trip_id = state.planner.create_trip(new_trip).await?;
    Ok((StatusCode::CREATED, Json(CreateTripResponse { trip_id })))
}

#[derive(Serialize)]
struct TripDetails {
    id: Uuid,
    destination: String,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
    is_confirmed: bool,
}

impl From<Trip> for TripDetails {
    fn from(trip: Trip) -> Self {
        Self {
            id: trip.id,
            destination: trip.destination,
            starts_at: trip.starts_at,
            ends_at: trip.ends_at,
            is_confirmed: trip.is_confirmed,
        }
    }
}

#[derive(Serialize)]
struct TripDetailsResponse {
    trip: TripDetails,
}

async fn get_trip(
    State(state): State<AppState>,
    Path(trip_id): Path<String>,
) -> Result<Json<TripDetailsResponse>, TripError> {
    let trip = state.planner.get_trip(parse_id(&trip_id)?).await?;
    Ok(Json(TripDetailsResponse { trip: trip.into() }))
}

async fn update_trip(
    State(state): State<AppState>,
    Path(trip_id): Path<String>,
    payload: Result<Json<TripUpdate>, JsonRejection>,
) -> Result<StatusCode, TripError> {
    let trip_id = parse_id(&trip_id)?;
    let update = body(payload)?;
    state.planner.update_trip(trip_id, update).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn confirm_trip(
    State(state): State<AppState>,
    Path(trip_id): Path<String>,
) -> Result<StatusCode, TripError> {
    state.planner.confirm_trip(parse_id(&trip_id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Serialize)]
struct ActivitiesResponse {
    activities: Vec<ActivityDay>,
}

async fn list_activities(
    State(state): State<AppState>,
    Path(trip_id): Path<String>,
) -> Result<Json<ActivitiesResponse>, TripError> {
    let activities = state.planner.activities_by_date(parse_id(&trip_id)?).await?;
    Ok(Json(ActivitiesResponse { activities }))
}

#[derive(Deserialize)]
struct CreateActivityRequest {
    title: String,
    occurs_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct CreateActivityResponse {
    activity_id: Uuid,
}

async fn create_activity(
    State(state): State<AppState>,
    Path(trip_id): Path<String>,
    payload: Result<Json<CreateActivityRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateActivityResponse>), TripError> {
    let trip_id = parse_id(&trip_id)?;
    let request = body(payload)?;
    let activity_id = state
        .planner
        .create_activity(trip_id, &request.title, request.occurs_at)
        .await?;
    Ok((StatusCode::CREATED, Json(CreateActivityResponse { activity_id })))
}

#[derive(Serialize)]
struct LinkEntry {
    id: Uuid,
    title: String,
    url: String,
}

impl From<Link> for LinkEntry {
    fn from(link: Link) -> Self {
        Self {
            id: link.id,
            title: link.title,
            url: link.url,
        }
    }
}

#[derive(Serialize)]
struct LinksResponse {
    links: Vec<LinkEntry>,
}

async fn list_links(
    State(state): State<AppState>,
    Path(trip_id): Path<String>,
) -> Result<Json<LinksResponse>, TripError> {
    let links = state.planner.links(parse_id(&trip_id)?).await?;
    Ok(Json(LinksResponse {
        links: links.into_iter().map(LinkEntry::from).collect(),
    }))
}

#[derive(Deserialize)]
struct CreateLinkRequest {
    title: String,
    url: String,
}

#[derive(Serialize)]
struct CreateLinkResponse {
    link_id: Uuid,
}

async fn create_link(
    State(state): State<AppState>,
    Path(trip_id): Path<String>,
    payload: Result<Json<CreateLinkRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreateLinkResponse>), TripError> {
    let trip_id = parse_id(&trip_id)?;
    let request = body(payload)?;
    let link_id = state
        .planner
        .create_link(trip_id, &request.title, &request.url)
        .await?;
    Ok((StatusCode::CREATED, Json(CreateLinkResponse { link_id })))
}

#[derive(Serialize)]
struct ParticipantsResponse {
    participants: Vec<ParticipantView>,
}

async fn list_participants(
    State(state): State<AppState>,
    Path(trip_id): Path<String>,
) -> Result<Json<ParticipantsResponse>, TripError> {
    let participants = state.planner.participants(parse_id(&trip_id)?).await?;
    Ok(Json(ParticipantsResponse { participants }))
}

#[derive(Deserialize)]
struct InviteRequest {
    email: String,
}

#[derive(Serialize)]
struct InviteResponse {
    participant_id: Uuid,
}

async fn invite_participant(
    State(state): State<AppState>,
    Path(trip_id): Path<String>,
    payload: Result<Json<InviteRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<InviteResponse>), TripError> {
    let trip_id = parse_id(&trip_id)?;
    let request = body(payload)?;
    let participant_id = state
        .planner
        .invite_participant(trip_id, &request.email)
        .await?;
    Ok((StatusCode::CREATED, Json(InviteResponse { participant_id })))
}
