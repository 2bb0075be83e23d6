//! Saving a record, uploading its staged assets first.
//!
//! A save moves through named states:
//!
//! ```text
//! Start ──(no local assets)──────────────────────────────▶ DirectSave ──▶ Done
//!   └──(local assets)──▶ TokenRequest ──▶ Uploading ──▶ FinalizeSave ──▶ Done
//! ```
//!
//! Any error ends the save. Uploads that already finished are not rolled
//! back, and dropping the future stops further requests.

use futures_util::future::join_all;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, instrument, warn};

use crate::config::MissingAssetPolicy;
use crate::error::{Error, InvalidInputError};
use crate::record::{Completeness, Record, codec};
use crate::types::Scope;
use crate::value::{Asset, AssetDescriptor, FieldValue};
use crate::ws::WsClient;
use crate::ws::endpoints::{
    ASSETS_UPLOAD, AssetTokenEntry, AssetTokenRequest, AssetTokenResponse, AssetUploadToken,
    ModifyRequest, OperationType, RECORDS_MODIFY, RecordOperation, RecordsResponse,
};

/// How a save treats the copy already on the server.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SavePolicy {
    /// Update only if the change tag still matches (`update`).
    #[default]
    IfServerRecordUnchanged,
    /// Overwrite the sent fields regardless of the change tag (`forceUpdate`).
    ChangedKeys,
    /// Replace the whole record regardless of the change tag (`forceReplace`).
    AllKeys,
}

impl SavePolicy {
    /// Unsaved records are always created.
    pub fn operation_type(&self, persisted: bool) -> OperationType {
        match (persisted, self) {
            (false, _) => OperationType::Create,
            (true, SavePolicy::IfServerRecordUnchanged) => OperationType::Update,
            (true, SavePolicy::ChangedKeys) => OperationType::ForceUpdate,
            (true, SavePolicy::AllKeys) => OperationType::ForceReplace,
        }
    }
}

/// A local asset waiting for upload: the `index`-th asset of `field`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct StagedAsset {
    pub field: String,
    pub index: usize,
    pub path: PathBuf,
}

/// A staged asset paired with the URL it uploads to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Assignment {
    pub staged: StagedAsset,
    pub url: String,
}

/// Upload results keyed by `(field, index)`.
pub(crate) type Uploaded = HashMap<(String, usize), AssetDescriptor>;

enum State {
    Start,
    DirectSave,
    TokenRequest(Vec<StagedAsset>),
    Uploading(Vec<Assignment>),
    FinalizeSave(Uploaded),
    Done(Record),
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            State::Start => "Start",
            State::DirectSave => "DirectSave",
            State::TokenRequest(_) => "TokenRequest",
            State::Uploading(_) => "Uploading",
            State::FinalizeSave(_) => "FinalizeSave",
            State::Done(_) => "Done",
        };
        f.write_str(name)
    }
}

/// One save call. All state is scoped to the call.
pub(crate) struct SaveOperation<'a> {
    client: &'a WsClient,
    scope: Scope,
    record: &'a Record,
    policy: SavePolicy,
}

impl<'a> SaveOperation<'a> {
    pub fn new(client: &'a WsClient, scope: Scope, record: &'a Record, policy: SavePolicy) -> Self {
        Self {
            client,
            scope,
            record,
            policy,
        }
    }

    #[instrument(skip(self), fields(record = %self.record.id(), scope = %self.scope))]
    pub async fn run(self) -> Result<Record, Error> {
        let mut state = State::Start;
        loop {
            let phase = state.to_string();
            state = match self.advance(state).await {
                Ok(State::Done(record)) => {
                    debug!(from = %phase, "save done");
                    return Ok(record);
                }
                Ok(next) => {
                    debug!(from = %phase, to = %next, "save transition");
                    next
                }
                Err(e) => {
                    debug!(phase = %phase, error = %e, "save failed");
                    return Err(e);
                }
            };
        }
    }

    async fn advance(&self, state: State) -> Result<State, Error> {
        match state {
            State::Start => {
                let staged = stage(self.record);
                if staged.is_empty() {
                    Ok(State::DirectSave)
                } else {
                    Ok(State::TokenRequest(staged))
                }
            }
            State::DirectSave => Ok(State::Done(self.commit(self.record.clone()).await?)),
            State::TokenRequest(staged) => {
                let tokens = self.request_tokens(&staged).await?;
                Ok(State::Uploading(assign(tokens, staged)))
            }
            State::Uploading(assignments) => Ok(State::FinalizeSave(self.upload_all(assignments).await?)),
            State::FinalizeSave(uploaded) => {
                let policy = self.client.config().missing_asset_policy();
                let record = finalize(self.record, uploaded, policy)?;
                Ok(State::Done(self.commit(record).await?))
            }
            State::Done(record) => Ok(State::Done(record)),
        }
    }

    async fn request_tokens(&self, staged: &[StagedAsset]) -> Result<Vec<AssetUploadToken>, Error> {
        let request = AssetTokenRequest {
            tokens: staged
                .iter()
                .map(|asset| AssetTokenEntry {
                    record_name: self.record.id().name().to_string(),
                    record_type: self.record.record_type().to_string(),
                    field_name: asset.field.clone(),
                })
                .collect(),
            zone_id: None,
        };
        debug!(count = request.tokens.len(), "requesting upload tokens");
        let response: AssetTokenResponse = self.client.post(self.scope, ASSETS_UPLOAD, &request).await?;
        Ok(response.tokens)
    }

    /// Upload every assignment concurrently. Results keep assignment order,
    /// and the first failure in that order is the one reported.
    async fn upload_all(&self, assignments: Vec<Assignment>) -> Result<Uploaded, Error> {
        let uploads = assignments.into_iter().map(|assignment| async move {
            let bytes = self.client.read_asset(&assignment.staged.path).await?;
            let descriptor = self
                .client
                .upload(&assignment.url, &assignment.staged.path, bytes)
                .await?;
            Ok::<_, Error>((assignment.staged, descriptor))
        });

        let mut uploaded = Uploaded::new();
        for result in join_all(uploads).await {
            let (staged, descriptor) = result?;
            uploaded.insert((staged.field, staged.index), descriptor);
        }
        Ok(uploaded)
    }

    async fn commit(&self, record: Record) -> Result<Record, Error> {
        let operation = RecordOperation {
            operation_type: self.policy.operation_type(record.is_persisted()),
            desired_keys: None,
            record: codec::encode_record(&record)?,
        };
        debug!(operation = ?operation.operation_type, "saving record");
        let request = ModifyRequest {
            operations: vec![operation],
            zone_id: None,
        };
        let response: RecordsResponse = self.client.post(self.scope, RECORDS_MODIFY, &request).await?;
        let saved = super::single(response.records)?;
        Ok(codec::decode_record(saved, Completeness::Saved)?)
    }
}

/// Collect every local asset in field order, then list order.
pub(crate) fn stage(record: &Record) -> Vec<StagedAsset> {
    record
        .fields()
        .iter()
        .flat_map(|(field, value)| {
            value
                .assets()
                .iter()
                .enumerate()
                .filter_map(move |(index, asset)| {
                    asset.local_path().map(|path| StagedAsset {
                        field: field.clone(),
                        index,
                        path: path.to_path_buf(),
                    })
                })
        })
        .collect()
}

/// Pair tokens with staged assets by field name. Each token takes the
/// first staged asset of its field that no earlier token took.
pub(crate) fn assign(tokens: Vec<AssetUploadToken>, staged: Vec<StagedAsset>) -> Vec<Assignment> {
    let mut pending: Vec<Option<StagedAsset>> = staged.into_iter().map(Some).collect();

    tokens
        .into_iter()
        .filter_map(|token| {
            let slot = pending
                .iter_mut()
                .find(|slot| slot.as_ref().is_some_and(|s| s.field == token.field_name));
            match slot.and_then(Option::take) {
                Some(staged) => Some(Assignment {
                    staged,
                    url: token.url,
                }),
                None => {
                    warn!(field = %token.field_name, "upload token has no staged asset; ignoring");
                    None
                }
            }
        })
        .collect()
}

/// Replace local assets with their uploaded descriptors.
///
/// A field with a local asset that was not uploaded is dropped under
/// [`MissingAssetPolicy::Omit`] and fails the save under
/// [`MissingAssetPolicy::Error`].
pub(crate) fn finalize(
    record: &Record,
    mut uploaded: Uploaded,
    policy: MissingAssetPolicy,
) -> Result<Record, Error> {
    let mut finalized = record.clone();

    for (field, value) in record.fields() {
        if !value.has_local_assets() {
            continue;
        }
        let assets: Option<Vec<Asset>> = value
            .assets()
            .iter()
            .enumerate()
            .map(|(index, asset)| match asset {
                Asset::Remote(_) => Some(asset.clone()),
                Asset::Local(_) => uploaded.remove(&(field.clone(), index)).map(Asset::Remote),
            })
            .collect();

        match (assets, value) {
            (Some(mut assets), FieldValue::Asset(_)) if assets.len() == 1 => {
                finalized.set(field.clone(), assets.remove(0));
            }
            (Some(assets), _) => {
                finalized.set(field.clone(), assets);
            }
            (None, _) => match policy {
                MissingAssetPolicy::Omit => {
                    warn!(field = %field, "asset field has no upload result; omitting it");
                    finalized.remove(field);
                }
                MissingAssetPolicy::Error => {
                    return Err(InvalidInputError::MissingUpload {
                        field: field.clone(),
                    }
                    .into());
                }
            },
        }
    }

    Ok(finalized)
}
