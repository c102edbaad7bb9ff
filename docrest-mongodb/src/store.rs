use async_trait::async_trait;
use bson::{Document, doc, oid::ObjectId};
use futures::TryStreamExt;
use mongodb::{
    Client, Collection as MongoCollection, IndexModel,
    error::{Error as MongoError, ErrorKind, WriteFailure},
    options::{
        ClientOptions, FindOneOptions, FindOptions, IndexOptions,
        ReturnDocument as MongoReturnDocument,
    },
};
use tracing::{debug, instrument};

use docrest_core::{
    backend::{ReturnDocument, StoreBackend, StoreBackendBuilder},
    config::StoreConfig,
    error::{StoreError, StoreResult},
    query::{Criteria, CriteriaVisitor, FindQuery, Projection},
    retry,
    schema::ID_FIELD,
};

use crate::query::{MongoQueryTranslator, projection_document, sort_document};

/// Server error code for unique index violations.
const DUPLICATE_KEY_CODE: i32 = 11000;

fn is_duplicate_key(err: &MongoError) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) => e.code == DUPLICATE_KEY_CODE,
        ErrorKind::InsertMany(e) => e
            .write_errors
            .as_ref()
            .is_some_and(|errors| errors.iter().any(|e| e.code == DUPLICATE_KEY_CODE)),
        ErrorKind::Command(e) => e.code == DUPLICATE_KEY_CODE,
        _ => false,
    }
}

fn backend_error(err: MongoError, collection: &str) -> StoreError {
    if is_duplicate_key(&err) {
        StoreError::DuplicateKey { collection: collection.to_string(), detail: err.to_string() }
    } else {
        StoreError::Backend(err.to_string())
    }
}

#[derive(Debug)]
pub struct MongoDbStore {
    client: Client,
    database: String,
}

impl MongoDbStore {
    pub fn new(client: Client, database: String) -> Self {
        Self { client, database }
    }

    pub fn builder(dsn: &str, database: &str) -> MongoDbStoreBuilder {
        MongoDbStoreBuilder::new(dsn, database)
    }

    /// Connects with the settings in `config`, retrying per its retry policy.
    pub async fn connect(config: &StoreConfig) -> StoreResult<Self> {
        retry::connect(
            MongoDbStoreBuilder::new(&config.connection_string, &config.database),
            &config.retry,
        )
        .await
    }

    fn get_collection(&self, collection_name: &str) -> MongoCollection<Document> {
        self.client
            .database(&self.database)
            .collection(collection_name)
    }

    fn filter(criteria: &Criteria) -> StoreResult<Document> {
        MongoQueryTranslator.visit_criteria(criteria)
    }
}

#[async_trait]
impl StoreBackend for MongoDbStore {
    #[instrument(skip(self, projection), level = "debug")]
    async fn find_one(
        &self,
        id: ObjectId,
        projection: &Projection,
        collection: &str,
    ) -> StoreResult<Option<Document>> {
        let mut options = FindOneOptions::default();
        options.projection = projection_document(projection);

        self.get_collection(collection)
            .find_one(doc! { ID_FIELD: id })
            .with_options(options)
            .await
            .map_err(|e| backend_error(e, collection))
    }

    #[instrument(skip(self, query), level = "debug")]
    async fn find(&self, query: &FindQuery, collection: &str) -> StoreResult<Vec<Document>> {
        let filter = Self::filter(&query.criteria)?;
        debug!(%filter, "find");

        let mut options = FindOptions::default();
        options.projection = projection_document(&query.projection);
        options.sort = sort_document(&query.sort);
        options.skip = query.skip;
        options.limit = query.limit.map(|limit| limit as i64);

        self.get_collection(collection)
            .find(filter)
            .with_options(options)
            .await
            .map_err(|e| backend_error(e, collection))?
            .try_collect::<Vec<Document>>()
            .await
            .map_err(|e| backend_error(e, collection))
    }

    #[instrument(skip(self, criteria), level = "debug")]
    async fn count(&self, criteria: &Criteria, collection: &str) -> StoreResult<u64> {
        self.get_collection(collection)
            .count_documents(Self::filter(criteria)?)
            .await
            .map_err(|e| backend_error(e, collection))
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), level = "debug")]
    async fn find_by_ids(&self, ids: Vec<ObjectId>, collection: &str) -> StoreResult<Vec<Document>> {
        self.get_collection(collection)
            .find(doc! { ID_FIELD: { "$in": ids } })
            .await
            .map_err(|e| backend_error(e, collection))?
            .try_collect::<Vec<Document>>()
            .await
            .map_err(|e| backend_error(e, collection))
    }

    #[instrument(skip(self, documents), fields(count = documents.len()), level = "debug")]
    async fn insert_many(&self, documents: Vec<Document>, collection: &str) -> StoreResult<()> {
        self.get_collection(collection)
            .insert_many(documents)
            .await
            .map_err(|e| backend_error(e, collection))?;

        Ok(())
    }

    #[instrument(skip(self, set), level = "debug")]
    async fn find_one_and_update(
        &self,
        id: ObjectId,
        set: Document,
        returning: ReturnDocument,
        collection: &str,
    ) -> StoreResult<Option<Document>> {
        self.get_collection(collection)
            .find_one_and_update(doc! { ID_FIELD: id }, doc! { "$set": set })
            .return_document(match returning {
                ReturnDocument::Before => MongoReturnDocument::Before,
                ReturnDocument::After => MongoReturnDocument::After,
            })
            .await
            .map_err(|e| backend_error(e, collection))
    }

    async fn add_index(&self, collection: &str, field: &str, unique: bool) -> StoreResult<()> {
        self.get_collection(collection)
            .create_index(
                IndexModel::builder()
                    .keys(doc! { field: 1 })
                    .options(IndexOptions::builder().unique(unique).build())
                    .build(),
            )
            .await
            .map_err(|e| backend_error(e, collection))?;

        Ok(())
    }

    async fn drop_collection(&self, name: &str) -> StoreResult<()> {
        self.get_collection(name)
            .drop()
            .await
            .map_err(|e| backend_error(e, name))
    }

    async fn shutdown(self) -> StoreResult<()> {
        self.client.shutdown().await;

        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct MongoDbStoreBuilder {
    dsn: String,
    database: String,
}

impl MongoDbStoreBuilder {
    pub fn new(dsn: &str, database: &str) -> Self {
        Self { dsn: dsn.to_string(), database: database.to_string() }
    }
}

#[async_trait]
impl StoreBackendBuilder for MongoDbStoreBuilder {
    type Backend = MongoDbStore;

    /// Parses the connection string and pings the server before returning.
    async fn build(self) -> StoreResult<Self::Backend> {
        let client = Client::with_options(
            ClientOptions::parse(&self.dsn)
                .await
                .map_err(|e| StoreError::Initialization(e.to_string()))?,
        )
        .map_err(|e| StoreError::Initialization(e.to_string()))?;

        client
            .database(&self.database)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        debug!(database = %self.database, "connected");

        Ok(MongoDbStore::new(client, self.database))
    }
}
