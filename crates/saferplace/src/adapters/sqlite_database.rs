// Rust guideline compliant 2026-10-15

//! SQLite adapter for the `Database` port.
//!
//! Three tables: `incidents`, `comments` (one row per review, with the
//! resolution it set) and `sessions`. Timestamps are stored as Unix
//! milliseconds. A review writes its comment row and the new resolution in
//! one transaction.
//!
//! Saving an incident uses a plain `INSERT`: a second save of the same id is
//! reported as `AlreadyExists` and the stored row is left untouched.

use chrono::{DateTime, Utc};
use domain::{
    Comment, Coordinates, Database, DatabaseError, Incident, Location, Resolution, Session,
    ValidRegion,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

const SCHEMA: [&str; 4] = [
    "CREATE TABLE IF NOT EXISTS incidents (
        id          TEXT    PRIMARY KEY,
        timestamp   INTEGER NOT NULL,
        description TEXT    NOT NULL,
        lat         REAL,
        lon         REAL,
        location    TEXT    NOT NULL,
        resolution  TEXT    NOT NULL,
        image       TEXT
    )",
    "CREATE TABLE IF NOT EXISTS comments (
        id          TEXT    PRIMARY KEY,
        incident_id TEXT    NOT NULL REFERENCES incidents(id),
        timestamp   INTEGER NOT NULL,
        author      TEXT    NOT NULL,
        comment     TEXT    NOT NULL,
        resolution  TEXT    NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS comments_by_incident ON comments (incident_id)",
    "CREATE TABLE IF NOT EXISTS sessions (
        id     TEXT    PRIMARY KEY,
        expiry INTEGER NOT NULL
    )",
];

const INCIDENT_COLUMNS: &str =
    "SELECT id, timestamp, description, lat, lon, location, resolution, image FROM incidents";

type IncidentRow = (String, i64, String, Option<f64>, Option<f64>, String, String, Option<String>);

/// `Database` adapter backed by a SQLite database via `sqlx`.
#[derive(Debug, Clone)]
pub struct SqliteDatabase {
    pool: sqlx::SqlitePool,
}

impl SqliteDatabase {
    /// Open or create a SQLite database and initialize the schema.
    ///
    /// In-memory URLs get a single connection that is never recycled: every
    /// SQLite connection to `:memory:` is a separate database.
    ///
    /// # Errors
    ///
    /// Returns `sqlx::Error` when the connection or schema creation fails.
    pub async fn new(db_url: &str) -> Result<Self, sqlx::Error> {
        let opts = db_url.parse::<SqliteConnectOptions>()?.create_if_missing(true);
        let pool_opts = if db_url.contains(":memory:") {
            SqlitePoolOptions::new().max_connections(1).idle_timeout(None).max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(4)
        };
        let pool = pool_opts.connect_with(opts).await?;
        for statement in SCHEMA {
            sqlx::query(statement).execute(&pool).await?;
        }
        Ok(Self { pool })
    }

    async fn comments_for(&self, incident_id: &str) -> Result<Vec<Comment>, DatabaseError> {
        let rows: Vec<(String, i64, String)> = sqlx::query_as(
            "SELECT author, timestamp, comment FROM comments
             WHERE incident_id = ? ORDER BY timestamp, rowid",
        )
        .bind(incident_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| unavailable("comments_for", &e))?;

        rows.into_iter()
            .map(|(author_id, millis, message)| {
                Ok(Comment { author_id, timestamp: from_millis(millis)?, message })
            })
            .collect()
    }

    async fn hydrate(&self, rows: Vec<IncidentRow>) -> Result<Vec<Incident>, DatabaseError> {
        let mut incidents = Vec::with_capacity(rows.len());
        for row in rows {
            let mut incident = incident_from_row(row)?;
            incident.reviewer_comments = self.comments_for(&incident.id).await?;
            incidents.push(incident);
        }
        Ok(incidents)
    }

    /// Incidents with one of `resolutions`, inside `region`, at or after
    /// `since`, oldest first.
    async fn select_in_region(
        &self,
        since: DateTime<Utc>,
        region: &ValidRegion,
        resolutions: &[Resolution],
    ) -> Result<Vec<Incident>, DatabaseError> {
        let placeholders = vec!["?"; resolutions.len()].join(", ");
        let sql = format!(
            "{INCIDENT_COLUMNS}
             WHERE resolution IN ({placeholders})
               AND timestamp >= ?
               AND lat IS NOT NULL AND lon IS NOT NULL
             ORDER BY timestamp, rowid"
        );
        let mut query = sqlx::query_as::<_, IncidentRow>(&sql);
        for resolution in resolutions {
            query = query.bind(resolution.as_str());
        }
        let rows = query
            .bind(since.timestamp_millis())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| unavailable("select_in_region", &e))?;

        // Containment uses the same predicate as every other adapter.
        let inside = rows
            .into_iter()
            .filter(|(_, _, _, lat, lon, ..)| match (lat, lon) {
                (Some(lat), Some(lon)) => region.contains(&Coordinates::new(*lat, *lon)),
                _ => false,
            })
            .collect();
        self.hydrate(inside).await
    }
}

fn unavailable(op: &str, e: &sqlx::Error) -> DatabaseError {
    tracing::error!(error = %e, "sqlite.{op}");
    DatabaseError::Unavailable { reason: e.to_string() }
}

/// Map a write error, reporting primary-key collisions as `AlreadyExists`.
fn write_error(op: &str, e: &sqlx::Error) -> DatabaseError {
    match e {
        sqlx::Error::Database(db) if db.is_unique_violation() => DatabaseError::AlreadyExists,
        _ => unavailable(op, e),
    }
}

fn from_millis(millis: i64) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::from_timestamp_millis(millis).ok_or_else(|| DatabaseError::Unavailable {
        reason: format!("stored timestamp out of range: {millis}"),
    })
}

fn incident_from_row(row: IncidentRow) -> Result<Incident, DatabaseError> {
    let (id, millis, description, lat, lon, location, resolution, image_id) = row;
    Ok(Incident {
        id,
        timestamp: from_millis(millis)?,
        description,
        coordinates: lat.zip(lon).map(|(lat, lon)| Coordinates::new(lat, lon)),
        location: Location::from_name(&location),
        resolution: Resolution::from_name(&resolution),
        image_id,
        reviewer_comments: vec![],
    })
}

impl Database for SqliteDatabase {
    /// # Errors
    ///
    /// `AlreadyExists` when the id is stored; `Unavailable` on any other
    /// `sqlx` error, logged at `error` level.
    async fn save_incident(&self, incident: &Incident) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO incidents
             (id, timestamp, description, lat, lon, location, resolution, image)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&incident.id)
        .bind(incident.timestamp.timestamp_millis())
        .bind(&incident.description)
        .bind(incident.coordinates.map(|c| c.lat))
        .bind(incident.coordinates.map(|c| c.lon))
        .bind(incident.location.as_str())
        .bind(incident.resolution.as_str())
        .bind(incident.image_id.as_deref())
        .execute(&self.pool)
        .await
        .map_err(|e| write_error("save_incident", &e))?;
        Ok(())
    }

    async fn save_review(
        &self,
        id: &str,
        resolution: Resolution,
        comment: Comment,
    ) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await.map_err(|e| unavailable("save_review", &e))?;

        let updated = sqlx::query("UPDATE incidents SET resolution = ? WHERE id = ?")
            .bind(resolution.as_str())
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| unavailable("save_review", &e))?;
        if updated.rows_affected() == 0 {
            // Dropping `tx` rolls back.
            return Err(DatabaseError::DoesNotExist);
        }

        sqlx::query(
            "INSERT INTO comments (id, incident_id, timestamp, author, comment, resolution)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(id)
        .bind(comment.timestamp.timestamp_millis())
        .bind(&comment.author_id)
        .bind(&comment.message)
        .bind(resolution.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| unavailable("save_review", &e))?;

        tx.commit().await.map_err(|e| unavailable("save_review", &e))
    }

    async fn view_incident(&self, id: &str) -> Result<Incident, DatabaseError> {
        let row: Option<IncidentRow> = sqlx::query_as(&format!("{INCIDENT_COLUMNS} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| unavailable("view_incident", &e))?;
        let mut incident = incident_from_row(row.ok_or(DatabaseError::DoesNotExist)?)?;
        incident.reviewer_comments = self.comments_for(id).await?;
        Ok(incident)
    }

    async fn incidents_without_review(&self) -> Result<Vec<Incident>, DatabaseError> {
        let rows: Vec<IncidentRow> = sqlx::query_as(&format!(
            "{INCIDENT_COLUMNS} WHERE resolution = ? ORDER BY timestamp, rowid"
        ))
        .bind(Resolution::Unspecified.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| unavailable("incidents_without_review", &e))?;
        // Unreviewed incidents carry no comments.
        rows.into_iter().map(incident_from_row).collect()
    }

    async fn incidents_in_region(
        &self,
        since: DateTime<Utc>,
        region: &ValidRegion,
    ) -> Result<Vec<Incident>, DatabaseError> {
        self.select_in_region(since, region, &[Resolution::Accepted, Resolution::Alerted]).await
    }

    async fn alerting_incidents(
        &self,
        since: DateTime<Utc>,
        region: &ValidRegion,
    ) -> Result<Vec<Incident>, DatabaseError> {
        self.select_in_region(since, region, &[Resolution::Alerted]).await
    }

    async fn save_session(&self, session: &Session) -> Result<(), DatabaseError> {
        sqlx::query("INSERT INTO sessions (id, expiry) VALUES (?, ?)")
            .bind(&session.token)
            .bind(session.expiry.timestamp_millis())
            .execute(&self.pool)
            .await
            .map_err(|e| write_error("save_session", &e))?;
        Ok(())
    }

    async fn is_valid_session(&self, token: &str) -> Result<(), DatabaseError> {
        let expiry: Option<i64> = sqlx::query_scalar("SELECT expiry FROM sessions WHERE id = ?")
            .bind(token)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| unavailable("is_valid_session", &e))?;
        let session = Session {
            token: token.to_owned(),
            expiry: from_millis(expiry.ok_or(DatabaseError::DoesNotExist)?)?,
        };
        if session.is_valid_at(Utc::now()) {
            Ok(())
        } else {
            Err(DatabaseError::SessionExpired)
        }
    }

    async fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, DatabaseError> {
        let purged = sqlx::query("DELETE FROM sessions WHERE expiry <= ?")
            .bind(now.timestamp_millis())
            .execute(&self.pool)
            .await
            .map_err(|e| unavailable("purge_expired_sessions", &e))?;
        Ok(purged.rows_affected())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::SqliteDatabase;
    use chrono::{TimeDelta, Utc};
    use domain::{
        Comment, Coordinates, Database as _, DatabaseError, Incident, Location, Region, Resolution,
        Session,
    };

    // A fresh pool per test, each on its own in-memory database.
    async fn make_db() -> SqliteDatabase {
        SqliteDatabase::new("sqlite::memory:").await.expect("in-memory SQLite should open")
    }

    fn incident(id: &str, lat: f64, lon: f64) -> Incident {
        Incident {
            id: id.to_owned(),
            // Millisecond precision survives the round trip through storage.
            timestamp: Utc::now() - TimeDelta::minutes(5),
            description: "bike stolen".to_owned(),
            coordinates: Some(Coordinates::new(lat, lon)),
            location: Location::FixedPlace,
            resolution: Resolution::Unspecified,
            image_id: Some("img-1".to_owned()),
            reviewer_comments: vec![],
        }
    }

    fn comment(author: &str, seconds_ago: i64) -> Comment {
        Comment {
            author_id: author.to_owned(),
            timestamp: Utc::now() - TimeDelta::seconds(seconds_ago),
            message: format!("checked by {author}"),
        }
    }

    #[tokio::test]
    async fn saved_incident_reads_back() {
        let db = make_db().await;
        let stored = incident("a", 53.345, -6.295);
        db.save_incident(&stored).await.unwrap();

        let read = db.view_incident("a").await.unwrap();
        assert_eq!(read.id, "a");
        assert_eq!(read.description, "bike stolen");
        assert_eq!(read.coordinates, stored.coordinates);
        assert_eq!(read.image_id.as_deref(), Some("img-1"));
        assert_eq!(read.resolution, Resolution::Unspecified);
        assert_eq!(read.timestamp.timestamp_millis(), stored.timestamp.timestamp_millis());
    }

    #[tokio::test]
    async fn transportation_incident_without_coordinates_reads_back() {
        let db = make_db().await;
        let mut bus = incident("bus", 0.0, 0.0);
        bus.coordinates = None;
        bus.location = Location::Transportation;
        db.save_incident(&bus).await.unwrap();

        let read = db.view_incident("bus").await.unwrap();
        assert_eq!(read.coordinates, None);
        assert_eq!(read.location, Location::Transportation);
    }

    #[tokio::test]
    async fn duplicate_id_is_already_exists_and_first_row_survives() {
        let db = make_db().await;
        db.save_incident(&incident("a", 53.345, -6.295)).await.unwrap();

        let mut second = incident("a", 1.0, 1.0);
        second.description = "replacement".to_owned();
        assert_eq!(db.save_incident(&second).await, Err(DatabaseError::AlreadyExists));

        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM incidents").fetch_one(&db.pool).await.unwrap();
        assert_eq!(count, 1);
        assert_eq!(db.view_incident("a").await.unwrap().description, "bike stolen");
    }

    #[tokio::test]
    async fn missing_incident_is_does_not_exist() {
        let db = make_db().await;
        assert_eq!(db.view_incident("ghost").await, Err(DatabaseError::DoesNotExist));
        assert_eq!(
            db.save_review("ghost", Resolution::Accepted, comment("x", 0)).await,
            Err(DatabaseError::DoesNotExist)
        );
        let comments: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM comments").fetch_one(&db.pool).await.unwrap();
        assert_eq!(comments, 0, "rolled-back review must leave no comment");
    }

    #[tokio::test]
    async fn reviews_set_latest_resolution_and_comments_read_in_time_order() {
        let db = make_db().await;
        db.save_incident(&incident("a", 53.345, -6.295)).await.unwrap();
        db.save_review("a", Resolution::Accepted, comment("second", 10)).await.unwrap();
        db.save_review("a", Resolution::Alerted, comment("first", 60)).await.unwrap();

        let read = db.view_incident("a").await.unwrap();
        assert_eq!(read.resolution, Resolution::Alerted);
        let authors: Vec<_> = read.reviewer_comments.iter().map(|c| c.author_id.as_str()).collect();
        assert_eq!(authors, ["first", "second"]);
    }

    #[tokio::test]
    async fn backlog_holds_only_unreviewed() {
        let db = make_db().await;
        for id in ["a", "b", "c"] {
            db.save_incident(&incident(id, 53.345, -6.295)).await.unwrap();
        }
        db.save_review("a", Resolution::Rejected, comment("x", 0)).await.unwrap();

        let ids: Vec<_> =
            db.incidents_without_review().await.unwrap().into_iter().map(|i| i.id).collect();
        assert_eq!(ids, ["b", "c"]);
    }

    #[tokio::test]
    async fn region_queries_return_public_incidents_inside_the_box() {
        let db = make_db().await;
        for (id, lat, lon, resolution) in [
            ("accepted", 53.345, -6.295, Resolution::Accepted),
            ("alerted", 53.341, -6.299, Resolution::Alerted),
            ("rejected", 53.345, -6.295, Resolution::Rejected),
            ("galway", 53.270, -9.050, Resolution::Alerted),
        ] {
            db.save_incident(&incident(id, lat, lon)).await.unwrap();
            db.save_review(id, resolution, comment("mod", 0)).await.unwrap();
        }
        db.save_incident(&incident("pending", 53.345, -6.295)).await.unwrap();

        let region = Region::new(5335, 5334, -629, -630).validate().unwrap();
        let since = Utc::now() - TimeDelta::hours(1);

        let public: Vec<_> = db
            .incidents_in_region(since, &region)
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.id)
            .collect();
        assert_eq!(public.len(), 2);
        assert!(public.contains(&"accepted".to_owned()));
        assert!(public.contains(&"alerted".to_owned()));

        let alerts = db.alerting_incidents(since, &region).await.unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].id, "alerted");
        assert_eq!(alerts[0].reviewer_comments.len(), 1);

        let later = Utc::now() + TimeDelta::minutes(1);
        assert!(db.incidents_in_region(later, &region).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn sessions_expire_and_purge() {
        let db = make_db().await;
        let live = Session { token: "live".to_owned(), expiry: Utc::now() + TimeDelta::hours(1) };
        let dead = Session { token: "dead".to_owned(), expiry: Utc::now() - TimeDelta::minutes(1) };
        db.save_session(&live).await.unwrap();
        db.save_session(&dead).await.unwrap();

        assert_eq!(db.save_session(&live).await, Err(DatabaseError::AlreadyExists));
        assert_eq!(db.is_valid_session("live").await, Ok(()));
        assert_eq!(db.is_valid_session("dead").await, Err(DatabaseError::SessionExpired));
        assert_eq!(db.is_valid_session("unknown").await, Err(DatabaseError::DoesNotExist));

        assert_eq!(db.purge_expired_sessions(Utc::now()).await.unwrap(), 1);
        assert_eq!(db.is_valid_session("dead").await, Err(DatabaseError::DoesNotExist));
        assert_eq!(db.is_valid_session("live").await, Ok(()));
    }
}
