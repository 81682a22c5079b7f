// Connexion à la base + création du schéma

use sea_orm::{
    ConnectionTrait, ConnectOptions, Database, DatabaseConnection, DbErr, EntityTrait, Schema,
};

use crate::models::{academic_details, documents, students, users};

pub async fn establish_connection(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(database_url.to_owned());
    options.sqlx_logging(false);

    Database::connect(options).await
}

/// Crée les tables (et leurs index) qui n'existent pas encore.
/// Les parents d'abord pour que les clés étrangères se résolvent.
pub async fn create_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    create_table(db, users::Entity).await?;
    create_table(db, students::Entity).await?;
    create_table(db, academic_details::Entity).await?;
    create_table(db, documents::Entity).await?;
    Ok(())
}

async fn create_table<E>(db: &DatabaseConnection, entity: E) -> Result<(), DbErr>
where
    E: EntityTrait,
{
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    let mut table = schema.create_table_from_entity(entity);
    table.if_not_exists();
    db.execute(backend.build(&table)).await?;

    for mut index in schema.create_index_from_entity(entity) {
        index.if_not_exists();
        db.execute(backend.build(&index)).await?;
    }

    Ok(())
}

pub async fn ping(db: &DatabaseConnection) -> bool {
    db.ping().await.is_ok()
}

#[cfg(test)]
pub async fn test_connection() -> DatabaseConnection {
    // une seule connexion : chaque connexion du pool aurait sa propre base en mémoire
    let mut options = ConnectOptions::new("sqlite::memory:".to_owned());
    options.max_connections(1).min_connections(1).sqlx_logging(false);

    let db = Database::connect(options).await.expect("sqlite in-memory database");
    create_schema(&db).await.expect("schema creation");
    db
}
