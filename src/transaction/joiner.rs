use std::collections::HashMap;

use tracing::{debug, error};

use crate::{
    domain::Version,
    error::{FeedError, FeedResult, IntegrityError},
    source::LedgerAnalyticsStore,
    transaction::record::{
        BlockMetadataTransaction, GenesisTransaction, ScriptUserTransaction, TransactionKind,
        TransactionRecord, UserTransaction,
    },
};

/// Results of the four per-table lookups for one page.
#[derive(Debug, Default, Clone)]
pub struct TransactionMaps {
    pub genesis: HashMap<Version, GenesisTransaction>,
    pub block_metadata: HashMap<Version, BlockMetadataTransaction>,
    pub script_user: HashMap<Version, ScriptUserTransaction>,
    pub user: HashMap<Version, UserTransaction>,
}

impl TransactionMaps {
    fn take(&mut self, kind: TransactionKind, version: Version) -> Option<TransactionRecord> {
        match kind {
            TransactionKind::Genesis => self.genesis.remove(&version).map(Into::into),
            TransactionKind::BlockMetadata => self.block_metadata.remove(&version).map(Into::into),
            TransactionKind::ScriptUser => self.script_user.remove(&version).map(Into::into),
            TransactionKind::User => self.user.remove(&version).map(Into::into),
        }
    }

    /// Picks the record for `version` following [`TransactionKind::PRIORITY`].
    pub fn resolve(&mut self, version: Version) -> Option<TransactionRecord> {
        TransactionKind::PRIORITY
            .iter()
            .find_map(|&kind| self.take(kind, version))
    }
}

/// Issues the four table lookups concurrently. The first failure aborts the rest.
#[tracing::instrument(skip_all, fields(versions = versions.len()))]
pub async fn fetch<S: LedgerAnalyticsStore>(
    store: &S,
    versions: &[Version],
) -> FeedResult<TransactionMaps> {
    if versions.is_empty() {
        return Ok(TransactionMaps::default());
    }

    let (genesis, block_metadata, script_user, user) = tokio::try_join!(
        store.genesis_transactions(versions),
        store.block_metadata_transactions(versions),
        store.script_user_transactions(versions),
        store.user_transactions(versions),
    )?;

    debug!(
        genesis = genesis.len(),
        block_metadata = block_metadata.len(),
        script_user = script_user.len(),
        user = user.len(),
        "Fetched transaction tables"
    );

    Ok(TransactionMaps {
        genesis,
        block_metadata,
        script_user,
        user,
    })
}

/// Resolves one record per version, in the order of `versions`.
///
/// # Errors
/// Returns `IntegrityError::UnresolvedTransaction` for the first version no table knows.
pub fn join(versions: &[Version], mut maps: TransactionMaps) -> FeedResult<Vec<TransactionRecord>> {
    versions
        .iter()
        .map(|&version| {
            maps.resolve(version).ok_or_else(|| {
                error!(
                    %version,
                    "Version below stability horizon has no transaction record in any table"
                );
                FeedError::from(IntegrityError::UnresolvedTransaction { version })
            })
        })
        .collect()
}
