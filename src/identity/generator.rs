//! Identifier generation.
//!
//! Sequences live behind the [`SequenceStore`] trait so the same generation
//! rules work against any backend that can perform an atomic
//! read-modify-write on a named counter.

use std::collections::{HashMap, HashSet};
use std::ops::RangeInclusive;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::WorkAreaKind;

use super::formats::{CompanyId, LinkingId, PayrollId, VenueId, WorkAreaId};

/// Attempts made to find an unused company number before giving up.
pub const MAX_COMPANY_ID_ATTEMPTS: usize = 50;

/// The base that employee and payroll numbers count up from.
pub const EMPLOYEE_NUMBER_BASE: i64 = 100_000;

const MAX_SIX_DIGIT: i64 = 999_999;
const MAX_FIVE_DIGIT: i64 = 99_999;
const TWO_DIGIT_SEQUENCE: RangeInclusive<i64> = 10..=99;
const TWO_DIGIT_STEP: i64 = 11;

/// Storage for named counters and claimed keys.
///
/// Implementations must apply `advance` atomically: two concurrent callers
/// never observe the same stored value.
pub trait SequenceStore: Send + Sync {
    /// Replaces counter `name` with `advance(current)` and returns the new value.
    /// `current` is `None` when the counter does not exist yet.
    fn advance(&self, name: &str, advance: &dyn Fn(Option<i64>) -> i64) -> EngineResult<i64>;

    /// Claims `key` within `namespace`. Returns false if it was already claimed.
    fn claim(&self, namespace: &str, key: &str) -> EngineResult<bool>;
}

/// An in-process [`SequenceStore`].
#[derive(Debug, Default)]
pub struct MemorySequenceStore {
    counters: Mutex<HashMap<String, i64>>,
    claimed: Mutex<HashSet<(String, String)>>,
}

impl MemorySequenceStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> EngineError {
    EngineError::Storage {
        message: "sequence store lock poisoned".to_string(),
    }
}

impl SequenceStore for MemorySequenceStore {
    fn advance(&self, name: &str, advance: &dyn Fn(Option<i64>) -> i64) -> EngineResult<i64> {
        let mut counters = self.counters.lock().map_err(poisoned)?;
        let next = advance(counters.get(name).copied());
        counters.insert(name.to_string(), next);
        Ok(next)
    }

    fn claim(&self, namespace: &str, key: &str) -> EngineResult<bool> {
        let mut claimed = self.claimed.lock().map_err(poisoned)?;
        Ok(claimed.insert((namespace.to_string(), key.to_string())))
    }
}

fn fallback_request_id() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("FALLBACK-{}", &hex[..10])
}

/// Wraps a two-digit sequence value back into 10..=99.
fn wrap_two_digit(value: i64) -> i64 {
    (value - 10).rem_euclid(90) + 10
}

/// Generates company, venue, work-area, employee, payroll and request IDs.
///
/// # Example
///
/// ```
/// use repertoire_engine::identity::IdService;
/// use repertoire_engine::models::WorkAreaKind;
///
/// let ids = IdService::in_memory_seeded(7);
/// let company = ids.generate_company_id().unwrap();
/// let venue = ids.generate_venue_id(&company).unwrap();
/// let work_area = ids.generate_work_area_id(&company, &venue).unwrap();
/// let linking = ids.generate_linking_id(&company, &work_area).unwrap();
/// let payroll = ids.generate_payroll_id(WorkAreaKind::Bar).unwrap();
///
/// assert!(venue.belongs_to(&company));
/// assert_eq!(linking.work_area_suffix(), work_area.suffix());
/// assert_eq!(payroll.as_str(), "DB-100001");
/// ```
pub struct IdService {
    store: Arc<dyn SequenceStore>,
    rng: Mutex<StdRng>,
}

impl IdService {
    /// Creates a service over `store` with an entropy-seeded random source.
    pub fn new(store: Arc<dyn SequenceStore>) -> Self {
        Self {
            store,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Creates a service with a deterministic random source.
    pub fn with_seed(store: Arc<dyn SequenceStore>, seed: u64) -> Self {
        Self {
            store,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Creates a service over a fresh [`MemorySequenceStore`].
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemorySequenceStore::new()))
    }

    /// Creates a deterministic service over a fresh [`MemorySequenceStore`].
    pub fn in_memory_seeded(seed: u64) -> Self {
        Self::with_seed(Arc::new(MemorySequenceStore::new()), seed)
    }

    fn random_in(&self, range: RangeInclusive<i64>) -> EngineResult<i64> {
        let mut rng = self.rng.lock().map_err(|_| EngineError::Storage {
            message: "random source lock poisoned".to_string(),
        })?;
        Ok(rng.gen_range(range))
    }

    /// Generates an unused company ID with a random four-digit number.
    pub fn generate_company_id(&self) -> EngineResult<CompanyId> {
        for _ in 0..MAX_COMPANY_ID_ATTEMPTS {
            let number = self.random_in(1000..=9999)?;
            let candidate = format!("CNY-{}", number);
            if self.store.claim("company", &candidate)? {
                debug!(company_id = %candidate, "Generated company ID");
                return CompanyId::parse(&candidate);
            }
        }

        Err(EngineError::IdGeneration {
            kind: "company".to_string(),
            message: format!(
                "no unused company number found after {} attempts",
                MAX_COMPANY_ID_ATTEMPTS
            ),
        })
    }

    /// Advances a two-digit sequence until it yields an unclaimed key.
    ///
    /// The first value of a new sequence is a random seed in 10..=99 plus the step.
    fn next_two_digit(
        &self,
        sequence: &str,
        namespace: &str,
        render: impl Fn(i64) -> String,
        kind: &str,
    ) -> EngineResult<String> {
        let seed = self.random_in(TWO_DIGIT_SEQUENCE)?;

        for _ in TWO_DIGIT_SEQUENCE {
            let value = self.store.advance(sequence, &|current: Option<i64>| {
                wrap_two_digit(current.unwrap_or(seed) + TWO_DIGIT_STEP)
            })?;
            let candidate = render(value);
            if self.store.claim(namespace, &candidate)? {
                return Ok(candidate);
            }
        }

        Err(EngineError::IdGeneration {
            kind: kind.to_string(),
            message: format!("sequence '{}' is exhausted", sequence),
        })
    }

    /// Generates the next venue ID for a company.
    pub fn generate_venue_id(&self, company: &CompanyId) -> EngineResult<VenueId> {
        let number = company.number();
        let id = self.next_two_digit(
            &format!("venue_{}", number),
            "venue",
            |value| format!("VEN-{}-{:02}", number, value),
            "venue",
        )?;
        debug!(company_id = %company, venue_id = %id, "Generated venue ID");
        VenueId::parse(&id)
    }

    /// Generates the next work area ID for a venue of a company.
    pub fn generate_work_area_id(
        &self,
        company: &CompanyId,
        venue: &VenueId,
    ) -> EngineResult<WorkAreaId> {
        if !venue.belongs_to(company) {
            return Err(EngineError::validation(
                "venue_id",
                format!("venue {} does not belong to company {}", venue, company),
            ));
        }

        let number = company.number();
        let venue_sequence = venue.sequence();
        let id = self.next_two_digit(
            &format!("work_area_{}_{}", number, venue_sequence),
            "work_area",
            |value| format!("WAI-{}-{}{:02}", number, venue_sequence, value),
            "work area",
        )?;
        debug!(venue_id = %venue, work_area_id = %id, "Generated work area ID");
        WorkAreaId::parse(&id)
    }

    /// Generates the next employee linking ID for a work area.
    pub fn generate_linking_id(
        &self,
        company: &CompanyId,
        work_area: &WorkAreaId,
    ) -> EngineResult<LinkingId> {
        if !work_area.belongs_to(company) {
            return Err(EngineError::validation(
                "work_area_id",
                format!("work area {} does not belong to company {}", work_area, company),
            ));
        }

        let sequence = format!("employee_{}_{}", company.number(), work_area.suffix());
        let number = self.next_six_digit(&sequence, "linking")?;
        LinkingId::parse(&format!(
            "EMP-{}-{}-{}",
            company.number(),
            work_area.suffix(),
            number
        ))
    }

    /// Generates the next payroll ID for a work area.
    pub fn generate_payroll_id(&self, work_area: WorkAreaKind) -> EngineResult<PayrollId> {
        let number = self.next_six_digit("payroll_id", "payroll")?;
        PayrollId::parse(&format!("D{}-{:06}", work_area.code(), number))
    }

    fn next_six_digit(&self, sequence: &str, kind: &str) -> EngineResult<i64> {
        let number = self.store.advance(sequence, &|current: Option<i64>| {
            current.unwrap_or(EMPLOYEE_NUMBER_BASE) + 1
        })?;

        if number > MAX_SIX_DIGIT {
            return Err(EngineError::IdGeneration {
                kind: kind.to_string(),
                message: format!("sequence '{}' exceeded six digits", sequence),
            });
        }
        Ok(number)
    }

    /// Generates a request ID, `REQ-YYYYMMDD-NNNNN`, numbered per day from 1.
    ///
    /// Never fails: if the sequence store is unavailable, or the day has used
    /// all five digits, a `FALLBACK-` ID built from a random UUID is returned
    /// instead.
    pub fn generate_request_id(&self, date: NaiveDate) -> String {
        let day = date.format("%Y%m%d").to_string();
        match self
            .store
            .advance(&format!("request_{}", day), &|current: Option<i64>| current.unwrap_or(0) + 1)
        {
            Ok(number) if number <= MAX_FIVE_DIGIT => format!("REQ-{}-{:05}", day, number),
            Ok(number) => {
                warn!(day = %day, number, "Daily request ID sequence exhausted, using fallback");
                fallback_request_id()
            }
            Err(err) => {
                error!(error = %err, "Request ID sequence unavailable, using fallback");
                fallback_request_id()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::IdKind;

    struct FailingStore;

    impl SequenceStore for FailingStore {
        fn advance(&self, _: &str, _: &dyn Fn(Option<i64>) -> i64) -> EngineResult<i64> {
            Err(EngineError::Storage {
                message: "offline".to_string(),
            })
        }

        fn claim(&self, _: &str, _: &str) -> EngineResult<bool> {
            Err(EngineError::Storage {
                message: "offline".to_string(),
            })
        }
    }

    fn company() -> CompanyId {
        CompanyId::parse("CNY-2976").unwrap()
    }

    #[test]
    fn test_wrap_two_digit_stays_in_range() {
        assert_eq!(wrap_two_digit(99), 99);
        assert_eq!(wrap_two_digit(100), 10);
        assert_eq!(wrap_two_digit(110), 20);
        for value in 10..=110 {
            assert!(TWO_DIGIT_SEQUENCE.contains(&wrap_two_digit(value)));
        }
    }

    #[test]
    fn test_company_ids_are_unique() {
        let ids = IdService::in_memory_seeded(1);
        let mut seen = HashSet::new();
        for _ in 0..200 {
            let id = ids.generate_company_id().unwrap();
            assert!(seen.insert(id.to_string()), "duplicate {}", id);
        }
    }

    #[test]
    fn test_venue_ids_step_by_eleven() {
        let ids = IdService::in_memory_seeded(3);
        let first = ids.generate_venue_id(&company()).unwrap();
        let second = ids.generate_venue_id(&company()).unwrap();

        let a: i64 = first.sequence().parse().unwrap();
        let b: i64 = second.sequence().parse().unwrap();
        assert_eq!(b, wrap_two_digit(a + 11));
        assert!(first.belongs_to(&company()));
    }

    #[test]
    fn test_venue_sequence_exhausts_after_ninety_ids() {
        let ids = IdService::in_memory_seeded(5);
        let mut seen = HashSet::new();
        for _ in 0..90 {
            let venue = ids.generate_venue_id(&company()).unwrap();
            assert!(seen.insert(venue.to_string()));
        }
        assert!(matches!(
            ids.generate_venue_id(&company()),
            Err(EngineError::IdGeneration { .. })
        ));
    }

    #[test]
    fn test_work_area_id_carries_venue_sequence() {
        let ids = IdService::in_memory_seeded(9);
        let venue = VenueId::parse("VEN-2976-30").unwrap();
        let work_area = ids.generate_work_area_id(&company(), &venue).unwrap();
        assert!(work_area.belongs_to_venue(&venue));
    }

    #[test]
    fn test_work_area_for_foreign_venue_is_rejected() {
        let ids = IdService::in_memory_seeded(9);
        let venue = VenueId::parse("VEN-1111-30").unwrap();
        assert!(matches!(
            ids.generate_work_area_id(&company(), &venue),
            Err(EngineError::Validation { .. })
        ));
    }

    #[test]
    fn test_linking_ids_count_from_base() {
        let ids = IdService::in_memory_seeded(11);
        let work_area = WorkAreaId::parse("WAI-2976-3087").unwrap();
        let first = ids.generate_linking_id(&company(), &work_area).unwrap();
        let second = ids.generate_linking_id(&company(), &work_area).unwrap();
        assert_eq!(first.as_str(), "EMP-2976-3087-100001");
        assert_eq!(second.as_str(), "EMP-2976-3087-100002");

        let other_area = WorkAreaId::parse("WAI-2976-3088").unwrap();
        let other = ids.generate_linking_id(&company(), &other_area).unwrap();
        assert_eq!(other.as_str(), "EMP-2976-3088-100001");
    }

    #[test]
    fn test_payroll_ids_share_one_global_sequence() {
        let ids = IdService::in_memory_seeded(13);
        assert_eq!(
            ids.generate_payroll_id(WorkAreaKind::Kitchen).unwrap().as_str(),
            "DK-100001"
        );
        assert_eq!(
            ids.generate_payroll_id(WorkAreaKind::Restaurant).unwrap().as_str(),
            "DR-100002"
        );
    }

    #[test]
    fn test_request_ids_restart_each_day() {
        let ids = IdService::in_memory_seeded(17);
        let day_one = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
        let day_two = NaiveDate::from_ymd_opt(2024, 7, 2).unwrap();

        assert_eq!(ids.generate_request_id(day_one), "REQ-20240701-00001");
        assert_eq!(ids.generate_request_id(day_one), "REQ-20240701-00002");
        assert_eq!(ids.generate_request_id(day_two), "REQ-20240702-00001");
        assert!(IdKind::Request.matches(&ids.generate_request_id(day_two)));
    }

    #[test]
    fn test_request_id_falls_back_when_store_fails() {
        let ids = IdService::new(Arc::new(FailingStore));
        let id = ids.generate_request_id(NaiveDate::from_ymd_opt(2024, 7, 1).unwrap());
        assert!(id.starts_with("FALLBACK-"));
        assert_eq!(id.len(), "FALLBACK-".len() + 10);
    }

    #[test]
    fn test_request_id_past_five_digits_falls_back() {
        let store = Arc::new(MemorySequenceStore::new());
        store
            .advance("request_20240701", &|_: Option<i64>| MAX_FIVE_DIGIT - 1)
            .unwrap();
        let ids = IdService::new(store);
        let day = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();

        assert_eq!(ids.generate_request_id(day), "REQ-20240701-99999");
        let id = ids.generate_request_id(day);
        assert!(id.starts_with("FALLBACK-"), "{}", id);
        assert!(!IdKind::Request.matches(&id));
    }

    #[test]
    fn test_store_failure_propagates_for_company_ids() {
        let ids = IdService::new(Arc::new(FailingStore));
        assert!(matches!(
            ids.generate_company_id(),
            Err(EngineError::Storage { .. })
        ));
    }
}
