//! Campus-code reconciliation across the store and the JSON mirror.
//!
//! Works from [`Vocabulary::corrections`]: every incident on a deprecated
//! campus row is repointed at the canonical row, then the mirror's campus
//! fields are rewritten the same way. Campus rows themselves are never
//! deleted, so a second run finds nothing left to move.

use serde::Serialize;

use crate::{
  campus::{CampusCorrection, Vocabulary},
  mirror::{Mirror, MirrorReconciliation},
  store::{Census, IncidentStore},
};

/// Incidents moved by one correction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Repointed {
  pub correction: CampusCorrection,
  pub incidents:  u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreReconciliation {
  pub before:    Census,
  pub after:     Census,
  pub repointed: Vec<Repointed>,
}

impl StoreReconciliation {
  pub fn fixes_applied(&self) -> u64 {
    self.repointed.iter().map(|r| r.incidents).sum()
  }

  /// `true` when incidents still fail to resolve to a campus after the pass.
  pub fn has_orphans(&self) -> bool { self.after.orphans > 0 }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
  pub store:  StoreReconciliation,
  pub mirror: Option<MirrorReconciliation>,
}

impl ReconcileReport {
  /// Codes in the mirror that only exist as deprecated variants.
  pub fn deprecated_codes_left(&self, vocab: &Vocabulary) -> Vec<String> {
    self
      .mirror
      .iter()
      .flat_map(|m| m.codes_after.iter())
      .filter(|code| vocab.correction_for(code).is_some())
      .cloned()
      .collect()
  }
}

/// Repoint incidents away from every deprecated campus row.
pub async fn reconcile_store<S: IncidentStore>(
  store: &S,
  vocab: &Vocabulary,
) -> Result<StoreReconciliation, S::Error> {
  let before = store.census().await?;
  if before.orphans > 0 {
    tracing::warn!(orphans = before.orphans, "store has orphaned incidents before reconciliation");
  }

  let mut repointed = Vec::new();
  for correction in vocab.corrections() {
    let incidents = store
      .repoint_campus(&correction.deprecated, &correction.canonical)
      .await?;
    if incidents > 0 {
      tracing::info!(
        from = %correction.deprecated,
        to = %correction.canonical,
        incidents,
        "repointed incidents"
      );
    }
    repointed.push(Repointed { correction, incidents });
  }

  let after = store.census().await?;
  if after.orphans > 0 {
    tracing::error!(
      orphans = after.orphans,
      "orphaned incidents remain after reconciliation"
    );
  }

  Ok(StoreReconciliation { before, after, repointed })
}

/// Reconcile the store, then the mirror if one is supplied.
pub async fn reconcile<S: IncidentStore>(
  store: &S,
  mirror: Option<&mut Mirror>,
  vocab: &Vocabulary,
) -> Result<ReconcileReport, S::Error> {
  let store_report = reconcile_store(store, vocab).await?;
  let mirror_report = mirror.map(|m| {
    let report = m.apply_corrections(vocab);
    tracing::info!(
      records = report.records,
      fixes = report.fixes,
      "reconciled mirror campus codes"
    );
    report
  });

  Ok(ReconcileReport {
    store:  store_report,
    mirror: mirror_report,
  })
}
