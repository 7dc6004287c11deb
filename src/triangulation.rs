//! Query triangulation.
//!
//! This module fans one ambiguous identity out into candidate queries and merges
//! what comes back:
//! 1. Generate candidates from the fixed tier tables
//! 2. Dispatch every candidate concurrently, retrying a failed call once
//! 3. Wait for all candidates, swallowing per-candidate failures
//! 4. Keep the strongest record per metering point id
//! 5. Annotate each record with supplier-switch reading need
use crate::candidates::generate_candidates;
use crate::errors::{AppError, ResultExt};
use crate::gateway_client::MeteringPointGateway;
use crate::holidays::HolidayCalendar;
use crate::models::{
    CandidateQuery, IdentityQuery, MeteringPointRequest, MeteringRecord, ReadingType,
    ServiceOutcome,
};
use crate::reading_need::{civil_today, needs_reading};
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinSet;

/// Initial attempt plus one retry.
const MAX_ATTEMPTS: u32 = 2;

pub struct Triangulator {
    gateway: Arc<dyn MeteringPointGateway>,
    calendar: Arc<dyn HolidayCalendar>,
    timezone: Tz,
}

impl Triangulator {
    pub fn new(
        gateway: Arc<dyn MeteringPointGateway>,
        calendar: Arc<dyn HolidayCalendar>,
        timezone: Tz,
    ) -> Self {
        Self {
            gateway,
            calendar,
            timezone,
        }
    }

    /// Current civil date in the operator timezone.
    pub fn today(&self) -> NaiveDate {
        civil_today(Utc::now(), self.timezone)
    }

    /// Triangulates a request, annotating reading need as of today.
    pub async fn triangulate(
        &self,
        request: MeteringPointRequest,
    ) -> Result<Vec<MeteringRecord>, AppError> {
        self.triangulate_on(request, self.today()).await
    }

    /// Triangulates a request, annotating reading need as of `today`.
    ///
    /// Only an invalid request is an error. Candidate failures reduce recall and
    /// are logged, never returned.
    pub async fn triangulate_on(
        &self,
        request: MeteringPointRequest,
        today: NaiveDate,
    ) -> Result<Vec<MeteringRecord>, AppError> {
        let query = IdentityQuery::try_from(request)?;
        let candidates = generate_candidates(&query);
        if candidates.is_empty() {
            tracing::info!("No candidate query could be built; skipping lookup");
            return Ok(Vec::new());
        }

        let candidate_count = candidates.len();
        tracing::info!("Triangulating with {} candidate queries", candidate_count);

        let mut tasks = JoinSet::new();
        for (index, candidate) in candidates.into_iter().enumerate() {
            let gateway = Arc::clone(&self.gateway);
            tasks.spawn(async move {
                let records = dispatch_candidate(gateway.as_ref(), candidate).await;
                (index, records)
            });
        }

        // Slot per candidate so the merge order never depends on completion order
        let mut per_candidate: Vec<Vec<MeteringRecord>> = vec![Vec::new(); candidate_count];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, records)) => per_candidate[index] = records,
                Err(e) => tracing::warn!("Candidate task did not complete: {}", e),
            }
        }

        let merged = merge_by_metering_point(per_candidate.into_iter().flatten());
        tracing::info!(
            "✓ Triangulation finished with {} distinct metering point(s)",
            merged.len()
        );

        Ok(self.annotate(merged, today))
    }

    /// Single direct lookup with the caller's full query; no candidates, no retry.
    pub async fn lookup(
        &self,
        request: MeteringPointRequest,
    ) -> Result<Vec<MeteringRecord>, AppError> {
        self.lookup_on(request, self.today()).await
    }

    pub async fn lookup_on(
        &self,
        request: MeteringPointRequest,
        today: NaiveDate,
    ) -> Result<Vec<MeteringRecord>, AppError> {
        let query = IdentityQuery::try_from(request)?;
        match self
            .gateway
            .call(&query)
            .await
            .context("direct metering point lookup")?
        {
            ServiceOutcome::Found(records) => Ok(self.annotate(records, today)),
            ServiceOutcome::NotFound => Ok(Vec::new()),
            ServiceOutcome::ServiceError(description) => Err(AppError::ServiceFault(description)),
        }
    }

    /// Reading need as of today in the operator timezone.
    pub fn needs_reading_today(
        &self,
        last_reading_date: Option<NaiveDate>,
        reading_type: ReadingType,
    ) -> Result<bool, AppError> {
        needs_reading(
            last_reading_date,
            reading_type,
            self.today(),
            self.calendar.as_ref(),
        )
    }

    /// Sets `can_change_supplier_without_reading` on every record.
    ///
    /// Without holiday data the need cannot be ruled out, so such records are
    /// marked as not switchable.
    fn annotate(&self, records: Vec<MeteringRecord>, today: NaiveDate) -> Vec<MeteringRecord> {
        records
            .into_iter()
            .map(|mut record| {
                let installation = &record.installation;
                record.can_change_supplier_without_reading = match needs_reading(
                    installation.last_meter_reading_date,
                    installation.reading_type,
                    today,
                    self.calendar.as_ref(),
                ) {
                    Ok(needs) => !needs,
                    Err(e) => {
                        tracing::warn!(
                            "Could not estimate reading need for {}: {}",
                            installation.metering_point_id,
                            e
                        );
                        false
                    }
                };
                record
            })
            .collect()
    }
}

/// Runs one candidate with a single retry; failures contribute no records.
async fn dispatch_candidate(
    gateway: &dyn MeteringPointGateway,
    candidate: CandidateQuery,
) -> Vec<MeteringRecord> {
    let CandidateQuery {
        query,
        confidence_tier,
    } = candidate;

    for attempt in 1..=MAX_ATTEMPTS {
        match gateway.call(&query).await {
            Ok(ServiceOutcome::Found(records)) => {
                tracing::debug!(
                    "Tier {} candidate returned {} record(s)",
                    confidence_tier,
                    records.len()
                );
                return records
                    .into_iter()
                    .map(|mut record| {
                        record.result_strength = Some(confidence_tier);
                        record
                    })
                    .collect();
            }
            Ok(ServiceOutcome::NotFound) => {
                tracing::debug!("Tier {} candidate found nothing", confidence_tier);
                return Vec::new();
            }
            Ok(ServiceOutcome::ServiceError(description)) => {
                tracing::warn!(
                    "Tier {} candidate attempt {}/{} reported fault: {}",
                    confidence_tier,
                    attempt,
                    MAX_ATTEMPTS,
                    description
                );
            }
            Err(e) => {
                tracing::warn!(
                    "Tier {} candidate attempt {}/{} failed: {}",
                    confidence_tier,
                    attempt,
                    MAX_ATTEMPTS,
                    e
                );
            }
        }
    }

    Vec::new()
}

/// Keeps one record per metering point id, preferring the lowest result strength.
///
/// On equal strength the record seen first wins, so callers control the tie-break
/// through input order. Output keeps first-appearance order.
pub fn merge_by_metering_point(
    records: impl IntoIterator<Item = MeteringRecord>,
) -> Vec<MeteringRecord> {
    let strength = |record: &MeteringRecord| record.result_strength.unwrap_or(u32::MAX);

    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut merged: Vec<MeteringRecord> = Vec::new();

    for record in records {
        let existing = positions.get(record.metering_point_id()).copied();
        match existing {
            Some(index) => {
                if strength(&record) < strength(&merged[index]) {
                    merged[index] = record;
                }
            }
            None => {
                positions.insert(record.metering_point_id().to_string(), merged.len());
                merged.push(record);
            }
        }
    }

    merged
}
