use anyhow::Context;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};

use crate::data::configuration::Configuration;
use crate::entity::{artists, shows, venues};

pub(crate) trait BandstandDBConnection {
    async fn connect(&mut self) -> Result<(), anyhow::Error>;
    async fn check(&self) -> Result<(), anyhow::Error>;
    async fn close(&self) -> Result<(), anyhow::Error>;
}

pub struct SQLConnector {
    path: String,
    database_connection: Option<DatabaseConnection>,
}

impl SQLConnector {
    pub fn new(path: &str) -> Self {
        SQLConnector {
            path: path.to_string(),
            database_connection: None,
        }
    }

    pub fn connection(&self) -> anyhow::Result<&DatabaseConnection> {
        self.database_connection
            .as_ref()
            .context("database connection is not open")
    }

    pub async fn is_initialized(&self) -> anyhow::Result<bool> {
        let db = self.connection()?;
        // Probe the venues table; a missing schema surfaces as a query error.
        Ok(venues::Entity::find().one(db).await.is_ok())
    }

    pub async fn initialize(&self, _config: &Configuration) -> anyhow::Result<()> {
        let db = self.connection()?;
        let backend = db.get_database_backend();
        let schema = Schema::new(backend);
        for mut statement in [
            schema.create_table_from_entity(venues::Entity),
            schema.create_table_from_entity(artists::Entity),
            schema.create_table_from_entity(shows::Entity),
        ] {
            statement.if_not_exists();
            db.execute(backend.build(&statement))
                .await
                .context("failed to create table")?;
        }
        Ok(())
    }
}

impl BandstandDBConnection for SQLConnector {
    async fn connect(&mut self) -> Result<(), anyhow::Error> {
        let db =
            Database::connect(format!("sqlite://{}/db.sqlite?mode=rwc", self.path.clone())).await?;

        self.database_connection = Some(db);
        Ok(())
    }
    async fn check(&self) -> Result<(), anyhow::Error> {
        if let Some(ref db) = self.database_connection {
            db.ping().await?;
        }
        Ok(())
    }
    async fn close(&self) -> Result<(), anyhow::Error> {
        if let Some(ref db) = self.database_connection {
            db.close_by_ref().await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_requires_connect() {
        let connector = SQLConnector::new(".");
        assert!(connector.connection().is_err());
    }

    #[tokio::test]
    async fn close_without_a_connection_is_a_no_op() {
        let connector = SQLConnector::new(".");
        assert!(connector.close().await.is_ok());
    }
}
