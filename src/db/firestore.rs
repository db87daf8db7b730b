// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore-backed [`RosterStore`].
//!
//! Layout:
//! - `users/{id}`: roster profiles, IDs allocated from `counters/users`
//! - `contest_history/{id}`, `submission_history/{id}`: manifests naming the
//!   current snapshot generation
//! - `contest_chunks`, `submission_chunks`: the snapshot entries, split into
//!   documents of at most `CHUNK_ENTRIES` each
//!
//! A history replacement writes every chunk of a new generation first and
//! only then overwrites the manifest. The single manifest write is the commit
//! point, so a failure part-way through leaves the previous snapshot visible.

use crate::db::{collections, RosterStore};
use crate::error::AppError;
use crate::models::{ContestResult, NewUser, ProfileUpdate, SubmissionRecord, User};
use async_trait::async_trait;
use firestore::errors::{BackoffError, FirestoreError};
use firestore::FirestoreWritePrecondition;
use futures_util::{stream, StreamExt};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

const MAX_CONCURRENT_DB_OPS: usize = 50;
// Firestore limits batch/transaction writes to 500 operations.
// We use a safe limit of 400 to allow headroom.
const BATCH_SIZE: usize = 400;
/// Entries per snapshot chunk; keeps each document far below the 1 MiB limit.
const CHUNK_ENTRIES: usize = 400;
const USER_ID_COUNTER: &str = "users";

/// Monotonic counter document.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct IdCounter {
    value: u64,
}

/// Points at the generation of chunks that make up a user's current history.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct HistoryManifest {
    user_id: u64,
    generation: u64,
    chunk_count: u32,
    entry_count: u32,
    synced_at: String,
}

/// A slice of one snapshot generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct HistoryChunk<T> {
    user_id: u64,
    generation: u64,
    index: u32,
    entries: Vec<T>,
}

/// Which history a manifest/chunk pair belongs to.
#[derive(Debug, Clone, Copy)]
struct HistoryKind {
    manifests: &'static str,
    chunks: &'static str,
}

const CONTESTS: HistoryKind = HistoryKind {
    manifests: collections::CONTEST_MANIFESTS,
    chunks: collections::CONTEST_CHUNKS,
};

const SUBMISSIONS: HistoryKind = HistoryKind {
    manifests: collections::SUBMISSION_MANIFESTS,
    chunks: collections::SUBMISSION_CHUNKS,
};

fn chunk_doc_id(user_id: u64, generation: u64, index: u32) -> String {
    format!("{}_{}_{}", user_id, generation, index)
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // The emulator needs an unauthenticated connection.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create an offline client; every operation returns an error.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    /// Create or overwrite a user document.
    async fn upsert_user(&self, user: &User) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(user.id.to_string())
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    async fn require_user(&self, user_id: u64) -> Result<User, AppError> {
        self.get_user(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {}", user_id)))
    }

    // ─── Snapshot Helpers ────────────────────────────────────────

    async fn get_manifest(
        &self,
        kind: HistoryKind,
        user_id: u64,
    ) -> Result<Option<HistoryManifest>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(kind.manifests)
            .obj()
            .one(&user_id.to_string())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Read every entry of the user's current generation, in stored order.
    async fn load_history<T>(&self, kind: HistoryKind, user_id: u64) -> Result<Vec<T>, AppError>
    where
        T: DeserializeOwned + Send,
    {
        let Some(manifest) = self.get_manifest(kind, user_id).await? else {
            return Ok(Vec::new());
        };

        let client = self.get_client()?;
        let mut entries = Vec::with_capacity(manifest.entry_count as usize);

        for index in 0..manifest.chunk_count {
            let doc_id = chunk_doc_id(user_id, manifest.generation, index);
            let chunk: Option<HistoryChunk<T>> = client
                .fluent()
                .select()
                .by_id_in(kind.chunks)
                .obj()
                .one(&doc_id)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;

            let chunk = chunk.ok_or_else(|| {
                AppError::Internal(anyhow::anyhow!(
                    "Snapshot chunk {} missing from {}",
                    doc_id,
                    kind.chunks
                ))
            })?;
            entries.extend(chunk.entries);
        }

        Ok(entries)
    }

    /// Write a new generation and make it current.
    async fn replace_history<T>(
        &self,
        kind: HistoryKind,
        user_id: u64,
        entries: Vec<T>,
    ) -> Result<(), AppError>
    where
        T: Serialize + DeserializeOwned + Clone + Send + Sync,
    {
        let client = self.get_client()?;
        let previous = self.get_manifest(kind, user_id).await?;

        let mut generation = chrono::Utc::now()
            .timestamp_nanos_opt()
            .unwrap_or_default()
            .unsigned_abs();
        if previous.as_ref().map(|m| m.generation) == Some(generation) {
            generation += 1;
        }

        let chunks: Vec<HistoryChunk<T>> = entries
            .chunks(CHUNK_ENTRIES)
            .enumerate()
            .map(|(index, slice)| HistoryChunk {
                user_id,
                generation,
                index: index as u32,
                entries: slice.to_vec(),
            })
            .collect();
        let chunk_count = chunks.len() as u32;

        // 1. Chunks of the new generation (invisible until the manifest flips)
        stream::iter(chunks)
            .map(|chunk| async move {
                let doc_id = chunk_doc_id(user_id, generation, chunk.index);
                let _: () = client
                    .fluent()
                    .update()
                    .in_col(kind.chunks)
                    .document_id(&doc_id)
                    .object(&chunk)
                    .execute()
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                Ok::<_, AppError>(())
            })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<(), AppError>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<()>, AppError>>()?;

        // 2. Commit point
        let manifest = HistoryManifest {
            user_id,
            generation,
            chunk_count,
            entry_count: entries.len() as u32,
            synced_at: chrono::Utc::now().to_rfc3339(),
        };
        let _: () = client
            .fluent()
            .update()
            .in_col(kind.manifests)
            .document_id(user_id.to_string())
            .object(&manifest)
            .execute()
            .await
            .map_err(|e| AppError::Database(format!("Failed to commit snapshot: {}", e)))?;

        // 3. Drop the superseded generation. Leftovers are unreachable, so
        //    a failure here only costs storage.
        if let Some(previous) = previous {
            let ids: Vec<String> = (0..previous.chunk_count)
                .map(|index| chunk_doc_id(user_id, previous.generation, index))
                .collect();
            if let Err(e) = self.batch_delete(&ids, kind.chunks).await {
                tracing::warn!(
                    user_id,
                    generation = previous.generation,
                    error = %e,
                    "Failed to delete superseded snapshot chunks"
                );
            }
        }

        tracing::debug!(
            user_id,
            collection = kind.manifests,
            generation,
            chunk_count,
            entries = manifest.entry_count,
            "Snapshot replaced"
        );

        Ok(())
    }

    /// Remove a user's history of one kind, manifest first.
    async fn delete_history(&self, kind: HistoryKind, user_id: u64) -> Result<usize, AppError> {
        let Some(manifest) = self.get_manifest(kind, user_id).await? else {
            return Ok(0);
        };

        self.get_client()?
            .fluent()
            .delete()
            .from(kind.manifests)
            .document_id(user_id.to_string())
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let ids: Vec<String> = (0..manifest.chunk_count)
            .map(|index| chunk_doc_id(user_id, manifest.generation, index))
            .collect();
        self.batch_delete(&ids, kind.chunks).await?;

        Ok(ids.len() + 1)
    }

    /// Helper to batch delete documents using transactions.
    async fn batch_delete(&self, doc_ids: &[String], collection: &str) -> Result<(), AppError> {
        let client = self.get_client()?;

        for chunk in doc_ids.chunks(BATCH_SIZE) {
            let mut transaction = client
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

            for doc_id in chunk {
                client
                    .fluent()
                    .delete()
                    .from(collection)
                    .document_id(doc_id)
                    .add_to_transaction(&mut transaction)
                    .map_err(|e| {
                        AppError::Database(format!(
                            "Failed to add deletion to transaction for {}: {}",
                            collection, e
                        ))
                    })?;
            }

            transaction.commit().await.map_err(|e| {
                AppError::Database(format!("Failed to commit batch deletion: {}", e))
            })?;
        }

        Ok(())
    }
}

#[async_trait]
impl RosterStore for FirestoreDb {
    // ─── User Operations ─────────────────────────────────────────

    async fn get_user(&self, user_id: u64) -> Result<Option<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(&user_id.to_string())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .order_by([("id", firestore::FirestoreQueryDirection::Ascending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn find_user_by_handle(&self, handle: &str) -> Result<Option<User>, AppError> {
        let users: Vec<User> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::USERS)
            .filter(|q| q.for_all([q.field("handle").eq(handle)]))
            .limit(1)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(users.into_iter().next())
    }

    async fn create_user(&self, new_user: NewUser) -> Result<User, AppError> {
        let client = self.get_client()?;
        let created_at = chrono::Utc::now().to_rfc3339();

        // The counter read goes through the transaction-bound client, so a
        // concurrent registration forces a retry instead of reusing the ID.
        let user = client
            .run_transaction(|db, transaction| {
                let new_user = new_user.clone();
                let created_at = created_at.clone();
                Box::pin(async move {
                    let counter: Option<IdCounter> = db
                        .fluent()
                        .select()
                        .by_id_in(collections::COUNTERS)
                        .obj()
                        .one(USER_ID_COUNTER)
                        .await?;
                    let id = counter.map(|c| c.value).unwrap_or(0) + 1;

                    db.fluent()
                        .update()
                        .in_col(collections::COUNTERS)
                        .document_id(USER_ID_COUNTER)
                        .object(&IdCounter { value: id })
                        .add_to_transaction(transaction)?;

                    let user = User::register(id, new_user, created_at);
                    db.fluent()
                        .update()
                        .in_col(collections::USERS)
                        .precondition(FirestoreWritePrecondition::Exists(false))
                        .document_id(id.to_string())
                        .object(&user)
                        .add_to_transaction(transaction)?;

                    Ok::<User, BackoffError<FirestoreError>>(user)
                })
            })
            .await
            .map_err(|e| AppError::Database(format!("Failed to register user: {}", e)))?;

        tracing::info!(user_id = user.id, handle = ?user.handle, "User registered");
        Ok(user)
    }

    async fn update_user(&self, user_id: u64, update: ProfileUpdate) -> Result<User, AppError> {
        let mut user = self.require_user(user_id).await?;
        update.apply(&mut user);
        self.upsert_user(&user).await?;
        Ok(user)
    }

    async fn update_ratings(
        &self,
        user_id: u64,
        current_rating: i32,
        max_rating: i32,
        synced_at: &str,
    ) -> Result<(), AppError> {
        // Fetch-modify-write to preserve the other fields
        let mut user = self.require_user(user_id).await?;
        user.current_rating = Some(current_rating);
        user.max_rating = Some(max_rating);
        user.last_synced_at = Some(synced_at.to_string());
        self.upsert_user(&user).await
    }

    async fn increment_reminders(&self, user_id: u64) -> Result<u32, AppError> {
        let mut user = self.require_user(user_id).await?;
        user.reminders_sent += 1;
        self.upsert_user(&user).await?;
        Ok(user.reminders_sent)
    }

    async fn delete_user(&self, user_id: u64) -> Result<bool, AppError> {
        let existed = self.get_user(user_id).await?.is_some();

        let mut deleted_count = self.delete_history(CONTESTS, user_id).await?;
        deleted_count += self.delete_history(SUBMISSIONS, user_id).await?;

        self.get_client()?
            .fluent()
            .delete()
            .from(collections::USERS)
            .document_id(user_id.to_string())
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::info!(user_id, deleted_count, "User data deletion complete");
        Ok(existed)
    }

    // ─── History Operations ──────────────────────────────────────

    async fn replace_contests(
        &self,
        user_id: u64,
        contests: Vec<ContestResult>,
    ) -> Result<(), AppError> {
        self.replace_history(CONTESTS, user_id, contests).await
    }

    async fn replace_submissions(
        &self,
        user_id: u64,
        submissions: Vec<SubmissionRecord>,
    ) -> Result<(), AppError> {
        self.replace_history(SUBMISSIONS, user_id, submissions).await
    }

    async fn contests_since(
        &self,
        user_id: u64,
        since: i64,
    ) -> Result<Vec<ContestResult>, AppError> {
        let mut contests: Vec<ContestResult> = self
            .load_history::<ContestResult>(CONTESTS, user_id)
            .await?
            .into_iter()
            .filter(|c| c.timestamp >= since)
            .collect();
        contests.sort_by_key(|c| c.timestamp);
        Ok(contests)
    }

    async fn submissions_since(
        &self,
        user_id: u64,
        since: i64,
    ) -> Result<Vec<SubmissionRecord>, AppError> {
        Ok(self
            .load_history::<SubmissionRecord>(SUBMISSIONS, user_id)
            .await?
            .into_iter()
            .filter(|s| s.timestamp >= since)
            .collect())
    }

    async fn count_submissions_since(&self, user_id: u64, since: i64) -> Result<usize, AppError> {
        Ok(self.submissions_since(user_id, since).await?.len())
    }
}
