use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub search_term: String,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub count: usize,
    pub data: Vec<SearchResultItem>,
}

#[derive(Debug, Serialize)]
pub struct SearchResultItem {
    pub id: i32,
    pub name: String,
    pub num_upcoming_shows: usize,
}

#[derive(Debug, Serialize)]
pub struct VenueAreaResponse {
    pub city: String,
    pub state: String,
    pub venues: Vec<SearchResultItem>,
}

#[derive(Debug, Serialize)]
pub struct ArtistListItem {
    pub id: i32,
    pub name: String,
}

/// A show as seen from a venue page: who is playing, and when.
#[derive(Debug, Serialize, PartialEq)]
pub struct ArtistShowDescriptor {
    pub artist_id: i32,
    pub artist_name: String,
    pub artist_image_link: String,
    pub start_time: String,
}

/// A show as seen from an artist page: where it happens, and when.
#[derive(Debug, Serialize, PartialEq)]
pub struct VenueShowDescriptor {
    pub venue_id: i32,
    pub venue_name: String,
    pub venue_image_link: String,
    pub start_time: String,
}

#[derive(Debug, Serialize)]
pub struct VenueDetailResponse {
    pub id: i32,
    pub name: String,
    pub city: String,
    pub state: String,
    pub address: String,
    pub phone: String,
    pub image_link: String,
    pub facebook_link: String,
    pub website: String,
    pub description: String,
    pub seeking_talent: bool,
    pub genres: Vec<String>,
    pub past_shows: Vec<ArtistShowDescriptor>,
    pub upcoming_shows: Vec<ArtistShowDescriptor>,
    pub past_shows_count: usize,
    pub upcoming_shows_count: usize,
}

#[derive(Debug, Serialize)]
pub struct ArtistDetailResponse {
    pub id: i32,
    pub name: String,
    pub city: String,
    pub state: String,
    pub phone: String,
    pub image_link: String,
    pub facebook_link: String,
    pub website: String,
    pub seeking_venue: bool,
    pub seeking_description: String,
    pub genres: Vec<String>,
    pub past_shows: Vec<VenueShowDescriptor>,
    pub upcoming_shows: Vec<VenueShowDescriptor>,
    pub past_shows_count: usize,
    pub upcoming_shows_count: usize,
}

#[derive(Debug, Deserialize)]
pub struct CreateVenueRequest {
    pub name: String,
    pub city: String,
    pub state: String,
    pub address: String,
    pub phone: String,
    #[serde(default)]
    pub image_link: String,
    #[serde(default)]
    pub facebook_link: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub seeking_talent: bool,
    #[serde(default)]
    pub genres: Vec<String>,
}

// The edit form submits the same field set as the create form.
pub type UpdateVenueRequest = CreateVenueRequest;

#[derive(Debug, Deserialize)]
pub struct CreateArtistRequest {
    pub name: String,
    pub city: String,
    pub state: String,
    pub phone: String,
    #[serde(default)]
    pub image_link: String,
    #[serde(default)]
    pub facebook_link: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub seeking_venue: bool,
    #[serde(default)]
    pub seeking_description: String,
    #[serde(default)]
    pub genres: Vec<String>,
}

pub type UpdateArtistRequest = CreateArtistRequest;

#[derive(Debug, Deserialize)]
pub struct CreateShowRequest {
    pub artist_id: i32,
    pub venue_id: i32,
    pub start_time: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct CreateVenueResponse {
    pub id: i32,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct CreateArtistResponse {
    pub id: i32,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct CreateShowResponse {
    pub id: i32,
    pub message: String,
}

/// Flash-style outcome report for updates and deletes.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ShowListItem {
    pub venue_id: i32,
    pub venue_name: String,
    pub artist_id: i32,
    pub artist_name: String,
    pub artist_image_link: String,
    pub start_time: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn search_response_serializes_count_and_data() {
        let response = SearchResponse {
            count: 1,
            data: vec![SearchResultItem {
                id: 2,
                name: "The Dueling Pianos Bar".to_string(),
                num_upcoming_shows: 0,
            }],
        };
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "count": 1,
                "data": [
                    {"id": 2, "name": "The Dueling Pianos Bar", "num_upcoming_shows": 0}
                ]
            })
        );
    }

    #[test]
    fn artist_show_descriptor_names_the_counterpart() {
        let descriptor = ArtistShowDescriptor {
            artist_id: 6,
            artist_name: "The Wild Sax Band".to_string(),
            artist_image_link: "https://example.com/sax.jpg".to_string(),
            start_time: "2035-04-01 20:00".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&descriptor).unwrap(),
            json!({
                "artist_id": 6,
                "artist_name": "The Wild Sax Band",
                "artist_image_link": "https://example.com/sax.jpg",
                "start_time": "2035-04-01 20:00"
            })
        );
    }

    #[test]
    fn create_show_request_parses_rfc3339_start_time() {
        let request: CreateShowRequest = serde_json::from_value(json!({
            "artist_id": 6,
            "venue_id": 3,
            "start_time": "2035-04-01T20:00:00Z"
        }))
        .unwrap();
        assert_eq!(request.artist_id, 6);
        assert_eq!(request.venue_id, 3);
        assert_eq!(request.start_time.to_rfc3339(), "2035-04-01T20:00:00+00:00");
    }

    #[test]
    fn create_venue_request_defaults_optional_fields() {
        let request: CreateVenueRequest = serde_json::from_value(json!({
            "name": "The Musical Hop",
            "city": "San Francisco",
            "state": "CA",
            "address": "1015 Folsom Street",
            "phone": "123-123-1234"
        }))
        .unwrap();
        assert!(!request.seeking_talent);
        assert!(request.genres.is_empty());
        assert_eq!(request.description, "");
    }
}
