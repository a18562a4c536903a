use crate::data::configuration::Configuration;
use crate::data::dbconnector::SQLConnector;
use crate::entity::helpers;
use crate::entity::{artists, shows, venues};
pub(crate) mod types;
use axum::extract::Path;
use axum::routing::{delete, patch};
use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use chrono::Utc;
use log::{debug, error};
use sea_orm::{DatabaseConnection, Set};
use std::sync::Arc;
use types::{
    ArtistDetailResponse, ArtistListItem, ArtistShowDescriptor, CreateArtistRequest,
    CreateArtistResponse, CreateShowRequest, CreateShowResponse, CreateVenueRequest,
    CreateVenueResponse, MessageResponse, SearchRequest, SearchResponse, SearchResultItem,
    ShowListItem, UpdateArtistRequest, UpdateVenueRequest, VenueAreaResponse, VenueDetailResponse,
    VenueShowDescriptor,
};

#[derive(Clone)]
pub struct ServerConfig {
    pub database_connection: Arc<SQLConnector>,
}

pub async fn run(_config: Configuration, database_connection: SQLConnector, port: u16) {
    debug!("Starting server on port {}", port);

    let shared_db = Arc::new(database_connection);

    let app = Router::new()
        .route("/venues", get(list_venues))
        .route("/venues", post(create_venue))
        .route("/venues/search", post(search_venues))
        .route("/venues/{venue_id}", get(get_venue))
        .route("/venues/{venue_id}", patch(update_venue))
        .route("/venues/{venue_id}", delete(remove_venue))
        .route("/artists", get(list_artists))
        .route("/artists", post(create_artist))
        .route("/artists/search", post(search_artists))
        .route("/artists/{artist_id}", get(get_artist))
        .route("/artists/{artist_id}", patch(update_artist))
        .route("/artists/{artist_id}", delete(remove_artist))
        .route("/shows", get(list_shows))
        .route("/shows", post(create_show))
        .with_state(ServerConfig {
            database_connection: shared_db.clone(),
        });

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .unwrap();

    axum::serve(listener, app.into_make_service())
        .await
        .unwrap();
}

async fn summarize_venues(
    db: &DatabaseConnection,
    venues: Vec<venues::Model>,
) -> anyhow::Result<Vec<SearchResultItem>> {
    let now = Utc::now();
    let mut items = Vec::new();
    for venue in venues {
        let shows = helpers::shows_for_venue(db, venue.id).await?;
        items.push(SearchResultItem {
            id: venue.id,
            name: venue.name,
            num_upcoming_shows: helpers::upcoming_count(&shows, now),
        });
    }
    Ok(items)
}

async fn summarize_artists(
    db: &DatabaseConnection,
    artists: Vec<artists::Model>,
) -> anyhow::Result<Vec<SearchResultItem>> {
    let now = Utc::now();
    let mut items = Vec::new();
    for artist in artists {
        let shows = helpers::shows_for_artist(db, artist.id).await?;
        items.push(SearchResultItem {
            id: artist.id,
            name: artist.name,
            num_upcoming_shows: helpers::upcoming_count(&shows, now),
        });
    }
    Ok(items)
}

async fn artist_descriptors(
    db: &DatabaseConnection,
    shows: Vec<shows::Model>,
) -> anyhow::Result<Vec<ArtistShowDescriptor>> {
    use anyhow::Context;
    let mut descriptors = Vec::new();
    for show in shows {
        let artist = helpers::find_artist(db, show.artist_id)
            .await?
            .with_context(|| format!("show {} references a missing artist", show.id))?;
        descriptors.push(ArtistShowDescriptor {
            artist_id: artist.id,
            artist_name: artist.name,
            artist_image_link: artist.image_link,
            start_time: helpers::format_start_time(show.start_time),
        });
    }
    Ok(descriptors)
}

async fn venue_descriptors(
    db: &DatabaseConnection,
    shows: Vec<shows::Model>,
) -> anyhow::Result<Vec<VenueShowDescriptor>> {
    use anyhow::Context;
    let mut descriptors = Vec::new();
    for show in shows {
        let venue = helpers::find_venue(db, show.venue_id)
            .await?
            .with_context(|| format!("show {} references a missing venue", show.id))?;
        descriptors.push(VenueShowDescriptor {
            venue_id: venue.id,
            venue_name: venue.name,
            venue_image_link: venue.image_link,
            start_time: helpers::format_start_time(show.start_time),
        });
    }
    Ok(descriptors)
}

async fn list_venues(
    State(state): State<ServerConfig>,
) -> Result<Json<Vec<VenueAreaResponse>>, (StatusCode, String)> {
    let db = state
        .database_connection
        .connection()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    let venues = helpers::all_venues(db)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let mut areas = Vec::new();
    for ((city, state_code), members) in helpers::group_by_location(venues) {
        let venues = summarize_venues(db, members)
            .await
            .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
        areas.push(VenueAreaResponse {
            city,
            state: state_code,
            venues,
        });
    }
    Ok(Json(areas))
}

async fn search_venues(
    State(state): State<ServerConfig>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, (StatusCode, String)> {
    let db = state
        .database_connection
        .connection()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    let matches = helpers::search_venues(db, request.search_term.trim())
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    let data = summarize_venues(db, matches)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(Json(SearchResponse {
        count: data.len(),
        data,
    }))
}

async fn get_venue(
    State(state): State<ServerConfig>,
    Path(venue_id): Path<i32>,
) -> Result<Json<VenueDetailResponse>, (StatusCode, String)> {
    let db = state
        .database_connection
        .connection()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    let venue = helpers::find_venue(db, venue_id)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let Some(venue) = venue else {
        return Err((
            StatusCode::NOT_FOUND,
            format!("No venue with id {venue_id}"),
        ));
    };

    let shows = helpers::shows_for_venue(db, venue.id)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    let (past, upcoming) = helpers::partition_shows(shows, Utc::now());
    let past_shows = artist_descriptors(db, past)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    let upcoming_shows = artist_descriptors(db, upcoming)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(Json(VenueDetailResponse {
        id: venue.id,
        name: venue.name,
        city: venue.city,
        state: venue.state,
        address: venue.address,
        phone: venue.phone,
        image_link: venue.image_link,
        facebook_link: venue.facebook_link,
        website: venue.website,
        description: venue.description,
        seeking_talent: venue.seeking_talent,
        genres: helpers::split_genres(&venue.genres),
        past_shows_count: past_shows.len(),
        upcoming_shows_count: upcoming_shows.len(),
        past_shows,
        upcoming_shows,
    }))
}

async fn create_venue(
    State(state): State<ServerConfig>,
    Json(request): Json<CreateVenueRequest>,
) -> Result<(StatusCode, Json<CreateVenueResponse>), (StatusCode, String)> {
    if request.name.trim().is_empty() {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            "venue name is required".to_string(),
        ));
    }
    let db = state
        .database_connection
        .connection()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let venue = venues::ActiveModel {
        name: Set(request.name.trim().to_string()),
        city: Set(request.city),
        state: Set(request.state),
        address: Set(request.address),
        phone: Set(request.phone),
        image_link: Set(request.image_link),
        facebook_link: Set(request.facebook_link),
        website: Set(request.website),
        description: Set(request.description),
        seeking_talent: Set(request.seeking_talent),
        genres: Set(helpers::join_genres(&request.genres)),
        ..Default::default()
    };

    match helpers::insert_venue(db, venue).await {
        Ok(created) => Ok((
            StatusCode::CREATED,
            Json(CreateVenueResponse {
                id: created.id,
                message: format!("Venue {} was successfully listed!", created.name),
            }),
        )),
        Err(e) => {
            error!("failed to insert venue: {e:#}");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                format!(
                    "An error occurred. Venue {} could not be listed.",
                    request.name
                ),
            ))
        }
    }
}

async fn update_venue(
    State(state): State<ServerConfig>,
    Path(venue_id): Path<i32>,
    Json(request): Json<UpdateVenueRequest>,
) -> Result<Json<MessageResponse>, (StatusCode, String)> {
    if request.name.trim().is_empty() {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            "venue name is required".to_string(),
        ));
    }
    let db = state
        .database_connection
        .connection()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    let existing = helpers::find_venue(db, venue_id)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let Some(existing) = existing else {
        return Err((
            StatusCode::NOT_FOUND,
            format!("No venue with id {venue_id}"),
        ));
    };

    let mut venue: venues::ActiveModel = existing.into();
    venue.name = Set(request.name.trim().to_string());
    venue.city = Set(request.city);
    venue.state = Set(request.state);
    venue.address = Set(request.address);
    venue.phone = Set(request.phone);
    venue.image_link = Set(request.image_link);
    venue.facebook_link = Set(request.facebook_link);
    venue.website = Set(request.website);
    venue.description = Set(request.description);
    venue.seeking_talent = Set(request.seeking_talent);
    venue.genres = Set(helpers::join_genres(&request.genres));

    match helpers::update_venue(db, venue).await {
        Ok(updated) => Ok(Json(MessageResponse {
            message: format!("Venue {} was successfully updated!", updated.name),
        })),
        Err(e) => {
            error!("failed to update venue {venue_id}: {e:#}");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                format!(
                    "An error occurred. Venue {} could not be updated.",
                    request.name
                ),
            ))
        }
    }
}

async fn remove_venue(
    State(state): State<ServerConfig>,
    Path(venue_id): Path<i32>,
) -> Result<Json<MessageResponse>, (StatusCode, String)> {
    let db = state
        .database_connection
        .connection()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    match helpers::delete_venue(db, venue_id).await {
        Ok(true) => Ok(Json(MessageResponse {
            message: "Venue was successfully deleted!".to_string(),
        })),
        Ok(false) => Err((
            StatusCode::NOT_FOUND,
            format!("No venue with id {venue_id}"),
        )),
        Err(e) => {
            error!("failed to delete venue {venue_id}: {e:#}");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "An error occurred. Venue could not be deleted.".to_string(),
            ))
        }
    }
}

async fn list_artists(
    State(state): State<ServerConfig>,
) -> Result<Json<Vec<ArtistListItem>>, (StatusCode, String)> {
    let db = state
        .database_connection
        .connection()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    let artists = helpers::all_artists(db)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(Json(
        artists
            .into_iter()
            .map(|artist| ArtistListItem {
                id: artist.id,
                name: artist.name,
            })
            .collect(),
    ))
}

async fn search_artists(
    State(state): State<ServerConfig>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, (StatusCode, String)> {
    let db = state
        .database_connection
        .connection()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    let matches = helpers::search_artists(db, request.search_term.trim())
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    let data = summarize_artists(db, matches)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(Json(SearchResponse {
        count: data.len(),
        data,
    }))
}

async fn get_artist(
    State(state): State<ServerConfig>,
    Path(artist_id): Path<i32>,
) -> Result<Json<ArtistDetailResponse>, (StatusCode, String)> {
    let db = state
        .database_connection
        .connection()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    let artist = helpers::find_artist(db, artist_id)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let Some(artist) = artist else {
        return Err((
            StatusCode::NOT_FOUND,
            format!("No artist with id {artist_id}"),
        ));
    };

    let shows = helpers::shows_for_artist(db, artist.id)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    let (past, upcoming) = helpers::partition_shows(shows, Utc::now());
    let past_shows = venue_descriptors(db, past)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    let upcoming_shows = venue_descriptors(db, upcoming)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    Ok(Json(ArtistDetailResponse {
        id: artist.id,
        name: artist.name,
        city: artist.city,
        state: artist.state,
        phone: artist.phone,
        image_link: artist.image_link,
        facebook_link: artist.facebook_link,
        website: artist.website,
        seeking_venue: artist.seeking_venue,
        seeking_description: artist.seeking_description,
        genres: helpers::split_genres(&artist.genres),
        past_shows_count: past_shows.len(),
        upcoming_shows_count: upcoming_shows.len(),
        past_shows,
        upcoming_shows,
    }))
}

async fn create_artist(
    State(state): State<ServerConfig>,
    Json(request): Json<CreateArtistRequest>,
) -> Result<(StatusCode, Json<CreateArtistResponse>), (StatusCode, String)> {
    if request.name.trim().is_empty() {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            "artist name is required".to_string(),
        ));
    }
    let db = state
        .database_connection
        .connection()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let artist = artists::ActiveModel {
        name: Set(request.name.trim().to_string()),
        city: Set(request.city),
        state: Set(request.state),
        phone: Set(request.phone),
        image_link: Set(request.image_link),
        facebook_link: Set(request.facebook_link),
        website: Set(request.website),
        seeking_venue: Set(request.seeking_venue),
        seeking_description: Set(request.seeking_description),
        genres: Set(helpers::join_genres(&request.genres)),
        ..Default::default()
    };

    match helpers::insert_artist(db, artist).await {
        Ok(created) => Ok((
            StatusCode::CREATED,
            Json(CreateArtistResponse {
                id: created.id,
                message: format!("Artist {} was successfully listed!", created.name),
            }),
        )),
        Err(e) => {
            error!("failed to insert artist: {e:#}");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                format!(
                    "An error occurred. Artist {} could not be listed.",
                    request.name
                ),
            ))
        }
    }
}

async fn update_artist(
    State(state): State<ServerConfig>,
    Path(artist_id): Path<i32>,
    Json(request): Json<UpdateArtistRequest>,
) -> Result<Json<MessageResponse>, (StatusCode, String)> {
    if request.name.trim().is_empty() {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            "artist name is required".to_string(),
        ));
    }
    let db = state
        .database_connection
        .connection()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    let existing = helpers::find_artist(db, artist_id)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let Some(existing) = existing else {
        return Err((
            StatusCode::NOT_FOUND,
            format!("No artist with id {artist_id}"),
        ));
    };

    let mut artist: artists::ActiveModel = existing.into();
    artist.name = Set(request.name.trim().to_string());
    artist.city = Set(request.city);
    artist.state = Set(request.state);
    artist.phone = Set(request.phone);
    artist.image_link = Set(request.image_link);
    artist.facebook_link = Set(request.facebook_link);
    artist.website = Set(request.website);
    artist.seeking_venue = Set(request.seeking_venue);
    artist.seeking_description = Set(request.seeking_description);
    artist.genres = Set(helpers::join_genres(&request.genres));

    match helpers::update_artist(db, artist).await {
        Ok(updated) => Ok(Json(MessageResponse {
            message: format!("Artist {} was successfully updated!", updated.name),
        })),
        Err(e) => {
            error!("failed to update artist {artist_id}: {e:#}");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                format!(
                    "An error occurred. Artist {} could not be updated.",
                    request.name
                ),
            ))
        }
    }
}

async fn remove_artist(
    State(state): State<ServerConfig>,
    Path(artist_id): Path<i32>,
) -> Result<Json<MessageResponse>, (StatusCode, String)> {
    let db = state
        .database_connection
        .connection()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    match helpers::delete_artist(db, artist_id).await {
        Ok(true) => Ok(Json(MessageResponse {
            message: "Artist was successfully deleted!".to_string(),
        })),
        Ok(false) => Err((
            StatusCode::NOT_FOUND,
            format!("No artist with id {artist_id}"),
        )),
        Err(e) => {
            error!("failed to delete artist {artist_id}: {e:#}");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "An error occurred. Artist could not be deleted.".to_string(),
            ))
        }
    }
}

async fn list_shows(
    State(state): State<ServerConfig>,
) -> Result<Json<Vec<ShowListItem>>, (StatusCode, String)> {
    use anyhow::Context;

    let db = state
        .database_connection
        .connection()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    let shows = helpers::all_shows(db)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let mut items = Vec::new();
    for show in shows {
        let venue = helpers::find_venue(db, show.venue_id)
            .await
            .and_then(|v| {
                v.with_context(|| format!("show {} references a missing venue", show.id))
            })
            .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
        let artist = helpers::find_artist(db, show.artist_id)
            .await
            .and_then(|a| {
                a.with_context(|| format!("show {} references a missing artist", show.id))
            })
            .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
        items.push(ShowListItem {
            venue_id: venue.id,
            venue_name: venue.name,
            artist_id: artist.id,
            artist_name: artist.name,
            artist_image_link: artist.image_link,
            start_time: show.start_time.to_rfc3339(),
        });
    }
    Ok(Json(items))
}

async fn create_show(
    State(state): State<ServerConfig>,
    Json(request): Json<CreateShowRequest>,
) -> Result<(StatusCode, Json<CreateShowResponse>), (StatusCode, String)> {
    let db = state
        .database_connection
        .connection()
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let artist = helpers::find_artist(db, request.artist_id)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    if artist.is_none() {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("No artist with id {}", request.artist_id),
        ));
    }
    let venue = helpers::find_venue(db, request.venue_id)
        .await
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    if venue.is_none() {
        return Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("No venue with id {}", request.venue_id),
        ));
    }

    let show = shows::ActiveModel {
        start_time: Set(request.start_time),
        artist_id: Set(request.artist_id),
        venue_id: Set(request.venue_id),
        ..Default::default()
    };

    match helpers::insert_show(db, show).await {
        Ok(created) => Ok((
            StatusCode::CREATED,
            Json(CreateShowResponse {
                id: created.id,
                message: "Show was successfully listed!".to_string(),
            }),
        )),
        Err(e) => {
            error!("failed to insert show: {e:#}");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Oops! Something wrong happened, your show could not be listed!".to_string(),
            ))
        }
    }
}
