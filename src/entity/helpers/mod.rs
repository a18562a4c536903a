use anyhow::Context;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder,
};

use crate::entity::{artists, shows, venues};

/// A show is upcoming iff it starts strictly after the evaluation instant.
/// A show starting exactly at `now` counts as past.
pub fn is_upcoming(start_time: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    start_time > now
}

/// Splits shows into (past, upcoming) relative to `now`, preserving order.
pub fn partition_shows(
    all: Vec<shows::Model>,
    now: DateTime<Utc>,
) -> (Vec<shows::Model>, Vec<shows::Model>) {
    all.into_iter()
        .partition(|show| !is_upcoming(show.start_time, now))
}

pub fn upcoming_count(shows: &[shows::Model], now: DateTime<Utc>) -> usize {
    shows
        .iter()
        .filter(|show| is_upcoming(show.start_time, now))
        .count()
}

/// Case-insensitive substring match anywhere in the name.
pub fn name_matches(name: &str, term: &str) -> bool {
    name.to_lowercase().contains(&term.to_lowercase())
}

/// Groups venues by (city, state). Groups are ordered by state then city;
/// every venue lands in exactly one group.
pub fn group_by_location(
    venues: Vec<venues::Model>,
) -> Vec<((String, String), Vec<venues::Model>)> {
    let mut locations: Vec<(String, String)> = Vec::new();
    for venue in &venues {
        let location = (venue.city.clone(), venue.state.clone());
        if !locations.contains(&location) {
            locations.push(location);
        }
    }
    locations.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)));

    locations
        .into_iter()
        .map(|location| {
            let members = venues
                .iter()
                .filter(|v| v.city == location.0 && v.state == location.1)
                .cloned()
                .collect();
            (location, members)
        })
        .collect()
}

/// Parses the stored comma-separated genre column into a list.
pub fn split_genres(stored: &str) -> Vec<String> {
    stored
        .split(',')
        .map(str::trim)
        .filter(|genre| !genre.is_empty())
        .map(str::to_string)
        .collect()
}

/// Joins a genre list back into the stored comma-separated form.
pub fn join_genres(genres: &[String]) -> String {
    genres
        .iter()
        .map(|genre| genre.trim())
        .filter(|genre| !genre.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}

/// Show descriptor time format, e.g. "2035-04-01 20:00".
pub fn format_start_time(start_time: DateTime<Utc>) -> String {
    start_time.format("%Y-%m-%d %H:%M").to_string()
}

pub async fn all_venues(db: &DatabaseConnection) -> anyhow::Result<Vec<venues::Model>> {
    venues::Entity::find()
        .all(db)
        .await
        .context("failed to list venues")
}

pub async fn all_artists(db: &DatabaseConnection) -> anyhow::Result<Vec<artists::Model>> {
    artists::Entity::find()
        .order_by_asc(artists::Column::Name)
        .all(db)
        .await
        .context("failed to list artists")
}

pub async fn all_shows(db: &DatabaseConnection) -> anyhow::Result<Vec<shows::Model>> {
    shows::Entity::find()
        .all(db)
        .await
        .context("failed to list shows")
}

pub async fn find_venue(
    db: &DatabaseConnection,
    venue_id: i32,
) -> anyhow::Result<Option<venues::Model>> {
    venues::Entity::find_by_id(venue_id)
        .one(db)
        .await
        .with_context(|| format!("failed to look up venue {venue_id}"))
}

pub async fn find_artist(
    db: &DatabaseConnection,
    artist_id: i32,
) -> anyhow::Result<Option<artists::Model>> {
    artists::Entity::find_by_id(artist_id)
        .one(db)
        .await
        .with_context(|| format!("failed to look up artist {artist_id}"))
}

pub async fn shows_for_venue(
    db: &DatabaseConnection,
    venue_id: i32,
) -> anyhow::Result<Vec<shows::Model>> {
    shows::Entity::find()
        .filter(shows::Column::VenueId.eq(venue_id))
        .all(db)
        .await
        .with_context(|| format!("failed to list shows for venue {venue_id}"))
}

pub async fn shows_for_artist(
    db: &DatabaseConnection,
    artist_id: i32,
) -> anyhow::Result<Vec<shows::Model>> {
    shows::Entity::find()
        .filter(shows::Column::ArtistId.eq(artist_id))
        .all(db)
        .await
        .with_context(|| format!("failed to list shows for artist {artist_id}"))
}

// Search fetches then filters in Rust so the match is case-insensitive on
// every backend, not just the ones with ILIKE.
pub async fn search_venues(
    db: &DatabaseConnection,
    term: &str,
) -> anyhow::Result<Vec<venues::Model>> {
    let venues = all_venues(db).await?;
    Ok(venues
        .into_iter()
        .filter(|venue| name_matches(&venue.name, term))
        .collect())
}

pub async fn search_artists(
    db: &DatabaseConnection,
    term: &str,
) -> anyhow::Result<Vec<artists::Model>> {
    let artists = all_artists(db).await?;
    Ok(artists
        .into_iter()
        .filter(|artist| name_matches(&artist.name, term))
        .collect())
}

pub async fn insert_venue(
    db: &DatabaseConnection,
    venue: venues::ActiveModel,
) -> anyhow::Result<venues::Model> {
    venue.insert(db).await.context("failed to insert venue")
}

pub async fn insert_artist(
    db: &DatabaseConnection,
    artist: artists::ActiveModel,
) -> anyhow::Result<artists::Model> {
    artist.insert(db).await.context("failed to insert artist")
}

pub async fn insert_show(
    db: &DatabaseConnection,
    show: shows::ActiveModel,
) -> anyhow::Result<shows::Model> {
    show.insert(db).await.context("failed to insert show")
}

pub async fn update_venue(
    db: &DatabaseConnection,
    venue: venues::ActiveModel,
) -> anyhow::Result<venues::Model> {
    venue.update(db).await.context("failed to update venue")
}

pub async fn update_artist(
    db: &DatabaseConnection,
    artist: artists::ActiveModel,
) -> anyhow::Result<artists::Model> {
    artist.update(db).await.context("failed to update artist")
}

/// Deletes a venue and its shows. Returns false when the venue is absent.
/// Shows go first so no dangling rows survive even without FK enforcement.
pub async fn delete_venue(db: &DatabaseConnection, venue_id: i32) -> anyhow::Result<bool> {
    let Some(venue) = find_venue(db, venue_id).await? else {
        return Ok(false);
    };
    shows::Entity::delete_many()
        .filter(shows::Column::VenueId.eq(venue_id))
        .exec(db)
        .await
        .with_context(|| format!("failed to delete shows for venue {venue_id}"))?;
    venue
        .delete(db)
        .await
        .with_context(|| format!("failed to delete venue {venue_id}"))?;
    Ok(true)
}

/// Same policy as [`delete_venue`], for artists.
pub async fn delete_artist(db: &DatabaseConnection, artist_id: i32) -> anyhow::Result<bool> {
    let Some(artist) = find_artist(db, artist_id).await? else {
        return Ok(false);
    };
    shows::Entity::delete_many()
        .filter(shows::Column::ArtistId.eq(artist_id))
        .exec(db)
        .await
        .with_context(|| format!("failed to delete shows for artist {artist_id}"))?;
    artist
        .delete(db)
        .await
        .with_context(|| format!("failed to delete artist {artist_id}"))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn venue(id: i32, name: &str, city: &str, state: &str) -> venues::Model {
        venues::Model {
            id,
            name: name.to_string(),
            city: city.to_string(),
            state: state.to_string(),
            address: String::new(),
            phone: String::new(),
            image_link: String::new(),
            facebook_link: String::new(),
            website: String::new(),
            description: String::new(),
            seeking_talent: false,
            genres: String::new(),
        }
    }

    fn artist(id: i32, name: &str) -> artists::Model {
        artists::Model {
            id,
            name: name.to_string(),
            city: String::new(),
            state: String::new(),
            phone: String::new(),
            image_link: String::new(),
            facebook_link: String::new(),
            website: String::new(),
            seeking_venue: false,
            seeking_description: String::new(),
            genres: String::new(),
        }
    }

    fn show(id: i32, start_time: DateTime<Utc>) -> shows::Model {
        shows::Model {
            id,
            start_time,
            artist_id: 1,
            venue_id: 1,
        }
    }

    fn at(y: i32, mo: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, 0, 0).unwrap()
    }

    #[test]
    fn upcoming_is_a_strict_comparison() {
        let now = at(2026, 6, 1, 12);
        assert!(is_upcoming(at(2026, 6, 1, 13), now));
        assert!(!is_upcoming(at(2026, 6, 1, 11), now));
        // a show starting exactly now is past
        assert!(!is_upcoming(now, now));
    }

    #[test]
    fn partition_preserves_every_show() {
        let now = at(2026, 6, 1, 12);
        let all = vec![
            show(1, at(2019, 5, 21, 21)),
            show(2, at(2035, 4, 1, 20)),
            show(3, at(2026, 6, 1, 12)),
            show(4, at(2035, 4, 8, 20)),
        ];
        let (past, upcoming) = partition_shows(all.clone(), now);
        assert_eq!(past.len() + upcoming.len(), all.len());
        assert_eq!(past.iter().map(|s| s.id).collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(
            upcoming.iter().map(|s| s.id).collect::<Vec<_>>(),
            vec![2, 4]
        );
        assert_eq!(upcoming_count(&all, now), 2);
    }

    #[test]
    fn grouping_partitions_the_venue_set() {
        let all = vec![
            venue(1, "The Musical Hop", "San Francisco", "CA"),
            venue(2, "The Dueling Pianos Bar", "New York", "NY"),
            venue(3, "Park Square Live Music & Coffee", "San Francisco", "CA"),
            venue(4, "Red Rocks", "Morrison", "CO"),
        ];
        let groups = group_by_location(all.clone());

        // state first, then city
        let keys: Vec<_> = groups.iter().map(|(loc, _)| loc.clone()).collect();
        assert_eq!(
            keys,
            vec![
                ("San Francisco".to_string(), "CA".to_string()),
                ("Morrison".to_string(), "CO".to_string()),
                ("New York".to_string(), "NY".to_string()),
            ]
        );

        let mut seen: Vec<i32> = groups
            .iter()
            .flat_map(|(_, members)| members.iter().map(|v| v.id))
            .collect();
        seen.sort();
        assert_eq!(seen, vec![1, 2, 3, 4]);

        let (_, sf) = &groups[0];
        assert_eq!(sf.len(), 2);
        assert!(
            sf.iter()
                .all(|v| v.city == "San Francisco" && v.state == "CA")
        );
    }

    #[test]
    fn name_matching_ignores_case_and_position() {
        assert!(name_matches("The Musical Hop", "Hop"));
        assert!(name_matches("The Musical Hop", "music"));
        assert!(name_matches("The Wild Sax Band", "BAND"));
        assert!(name_matches("Guns N Petals", "a"));
        assert!(!name_matches("Matt Quevedo", "band"));
        // empty term matches everything
        assert!(name_matches("Anything", ""));
    }

    #[test]
    fn genres_round_trip_through_storage() {
        assert_eq!(
            split_genres("Jazz,Classical,Rock n Roll"),
            vec!["Jazz", "Classical", "Rock n Roll"]
        );
        assert_eq!(split_genres(""), Vec::<String>::new());
        assert_eq!(split_genres("Jazz, ,Folk"), vec!["Jazz", "Folk"]);

        let genres = vec!["Jazz".to_string(), "Folk".to_string()];
        assert_eq!(join_genres(&genres), "Jazz,Folk");
        assert_eq!(split_genres(&join_genres(&genres)), genres);
        assert_eq!(join_genres(&[]), "");
    }

    #[test]
    fn start_time_formats_for_display() {
        assert_eq!(format_start_time(at(2035, 4, 1, 20)), "2035-04-01 20:00");
    }

    #[tokio::test]
    async fn venue_search_is_case_insensitive() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_query_results([vec![
                venue(1, "The Musical Hop", "San Francisco", "CA"),
                venue(2, "The Dueling Pianos Bar", "New York", "NY"),
                venue(3, "Park Square Live Music & Coffee", "San Francisco", "CA"),
            ]])
            .into_connection();

        let found = search_venues(&db, "MUSIC").await.unwrap();
        let ids: Vec<i32> = found.iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[tokio::test]
    async fn artist_search_matches_substrings() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_query_results([vec![
                artist(4, "Guns N Petals"),
                artist(5, "Matt Quevedo"),
                artist(6, "The Wild Sax Band"),
            ]])
            .into_connection();

        let found = search_artists(&db, "band").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "The Wild Sax Band");
    }

    #[tokio::test]
    async fn deleting_a_venue_removes_its_shows_first() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_query_results([vec![venue(
                3,
                "Park Square Live Music & Coffee",
                "San Francisco",
                "CA",
            )]])
            .append_exec_results([
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 2,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
            ])
            .into_connection();

        assert!(delete_venue(&db, 3).await.unwrap());

        // lookup, then the child shows, then the venue itself
        let log: Vec<String> = db
            .into_transaction_log()
            .iter()
            .map(|t| format!("{t:?}"))
            .collect();
        assert_eq!(log.len(), 3);
        assert!(log[0].contains("SELECT"));
        assert!(log[1].contains("DELETE FROM") && log[1].contains("shows"));
        assert!(log[2].contains("DELETE FROM") && log[2].contains("venues"));
    }

    #[tokio::test]
    async fn deleting_an_artist_removes_its_shows_first() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_query_results([vec![artist(6, "The Wild Sax Band")]])
            .append_exec_results([
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 3,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
            ])
            .into_connection();

        assert!(delete_artist(&db, 6).await.unwrap());

        let log: Vec<String> = db
            .into_transaction_log()
            .iter()
            .map(|t| format!("{t:?}"))
            .collect();
        assert_eq!(log.len(), 3);
        assert!(log[1].contains("DELETE FROM") && log[1].contains("shows"));
        assert!(log[2].contains("DELETE FROM") && log[2].contains("artists"));
    }

    #[tokio::test]
    async fn deleting_a_missing_artist_reports_absence() {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_query_results([Vec::<artists::Model>::new()])
            .into_connection();

        assert!(!delete_artist(&db, 99).await.unwrap());
        // only the lookup ran, nothing was deleted
        assert_eq!(db.into_transaction_log().len(), 1);
    }
}
