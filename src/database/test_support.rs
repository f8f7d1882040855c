use crate::database::SeaOrmStore;
use crate::entities::{code_entity as codes, winner_entity as winners};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, Schema};

/// SQLite 内存库，按实体定义建表；单连接保证所有请求看到同一个库
pub async fn sqlite_store() -> SeaOrmStore {
    let mut opt = ConnectOptions::new("sqlite::memory:".to_string());
    opt.max_connections(1).sqlx_logging(false);
    let pool = Database::connect(opt).await.unwrap();

    let backend = pool.get_database_backend();
    let schema = Schema::new(backend);
    pool.execute(backend.build(&schema.create_table_from_entity(codes::Entity)))
        .await
        .unwrap();
    pool.execute(backend.build(&schema.create_table_from_entity(winners::Entity)))
        .await
        .unwrap();

    SeaOrmStore::new(pool)
}
