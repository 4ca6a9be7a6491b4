// In-memory stand-ins for every core port, shared by the unit tests.
//
// Each fake records what it was asked to do so tests can assert on the
// traffic, and each can be told to fail.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use dashmap::DashMap;

use crate::core::calendar::{AllDayDraft, CalendarEntry, CalendarError, CalendarService, EntryTime};
use crate::core::cases::{ActiveJudge, Appointment, CaseApi, CaseError, DutyPoolEntry, FetchOutcome};
use crate::core::credentials::{AuthError, CaseLogin, Credential};
use crate::core::notify::{ChatSender, NotifyError};
use crate::core::sheets::{AllowedEmailSource, AuditLog, AuditRecord, ConfigSource, SheetError};

/// A hearing with fixed reason and room.
pub fn appointment(case_id: &str, time: &str) -> Appointment {
    Appointment {
        case_id: case_id.to_string(),
        reason: "สืบพยาน".to_string(),
        room: "5".to_string(),
        time: time.to_string(),
        appoint_date: String::new(),
    }
}

// ---------------------------------------------------------------------------
// Case API
// ---------------------------------------------------------------------------

pub struct FakeCaseApi {
    logins: AtomicUsize,
    login_header: Mutex<Option<String>>,
    login_failure: Mutex<Option<String>>,
    days: DashMap<String, Result<FetchOutcome, CaseError>>,
    searched: Mutex<Vec<String>>,
    rejections_left: AtomicU32,
    search_delay: Mutex<Option<Duration>>,
    judges: Mutex<Vec<ActiveJudge>>,
    pool: Mutex<Result<Vec<DutyPoolEntry>, String>>,
    pool_requests: Mutex<Vec<(u32, i32)>>,
}

impl FakeCaseApi {
    pub fn new() -> Self {
        Self {
            logins: AtomicUsize::new(0),
            login_header: Mutex::new(Some("Bearer fake-token".to_string())),
            login_failure: Mutex::new(None),
            days: DashMap::new(),
            searched: Mutex::new(Vec::new()),
            rejections_left: AtomicU32::new(0),
            search_delay: Mutex::new(None),
            judges: Mutex::new(Vec::new()),
            pool: Mutex::new(Ok(Vec::new())),
            pool_requests: Mutex::new(Vec::new()),
        }
    }

    pub fn login_count(&self) -> usize {
        self.logins.load(Ordering::SeqCst)
    }

    pub fn set_login_header(&self, header: Option<&str>) {
        *self.login_header.lock().unwrap() = header.map(str::to_string);
    }

    pub fn fail_login(&self, reason: &str) {
        *self.login_failure.lock().unwrap() = Some(reason.to_string());
    }

    /// Scripts the search result for one `DD/MM/YYYY` key. Unscripted days are empty.
    pub fn set_day(&self, appoint_date: &str, outcome: Result<FetchOutcome, CaseError>) {
        self.days.insert(appoint_date.to_string(), outcome);
    }

    pub fn searched_dates(&self) -> Vec<String> {
        self.searched.lock().unwrap().clone()
    }

    /// The next `n` authorized calls answer 401.
    pub fn reject_credentials(&self, n: u32) {
        self.rejections_left.store(n, Ordering::SeqCst);
    }

    pub fn set_search_delay(&self, delay: Duration) {
        *self.search_delay.lock().unwrap() = Some(delay);
    }

    pub fn set_judges(&self, judges: Vec<ActiveJudge>) {
        *self.judges.lock().unwrap() = judges;
    }

    pub fn set_pool(&self, pool: Vec<DutyPoolEntry>) {
        *self.pool.lock().unwrap() = Ok(pool);
    }

    pub fn fail_pool(&self, reason: &str) {
        *self.pool.lock().unwrap() = Err(reason.to_string());
    }

    pub fn pool_requests(&self) -> Vec<(u32, i32)> {
        self.pool_requests.lock().unwrap().clone()
    }

    fn check_credential(&self) -> Result<(), CaseError> {
        let rejected = self
            .rejections_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if rejected {
            Err(CaseError::Unauthorized("401 Unauthorized".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl CaseLogin for FakeCaseApi {
    async fn login(&self) -> Result<Option<String>, AuthError> {
        self.logins.fetch_add(1, Ordering::SeqCst);
        if let Some(reason) = self.login_failure.lock().unwrap().clone() {
            return Err(AuthError::Login(reason));
        }
        Ok(self.login_header.lock().unwrap().clone())
    }
}

#[async_trait]
impl CaseApi for FakeCaseApi {
    async fn search_appointments(
        &self,
        appoint_date: &str,
        _credential: &Credential,
    ) -> Result<FetchOutcome, CaseError> {
        let delay = *self.search_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.searched.lock().unwrap().push(appoint_date.to_string());
        self.check_credential()?;

        match self.days.get(appoint_date) {
            Some(outcome) => outcome.value().clone(),
            None => Ok(FetchOutcome::Empty),
        }
    }

    async fn list_active_judges(&self, _credential: &Credential) -> Result<Vec<ActiveJudge>, CaseError> {
        self.check_credential()?;
        Ok(self.judges.lock().unwrap().clone())
    }

    async fn duty_pool(
        &self,
        month: u32,
        year: i32,
        _credential: &Credential,
    ) -> Result<Vec<DutyPoolEntry>, CaseError> {
        self.check_credential()?;
        self.pool_requests.lock().unwrap().push((month, year));
        self.pool.lock().unwrap().clone().map_err(CaseError::Api)
    }
}

// ---------------------------------------------------------------------------
// Calendar
// ---------------------------------------------------------------------------

pub struct FakeCalendar {
    entries: DashMap<String, CalendarEntry>,
    next_id: AtomicUsize,
    inserts: AtomicUsize,
    updates: AtomicUsize,
    failure: Mutex<Option<String>>,
    utc_offset_secs: i64,
}

impl FakeCalendar {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            next_id: AtomicUsize::new(1),
            inserts: AtomicUsize::new(0),
            updates: AtomicUsize::new(0),
            failure: Mutex::new(None),
            utc_offset_secs: 0,
        }
    }

    /// Places the calendar's all-day dates in a zone `hours` ahead of UTC.
    pub fn with_utc_offset_hours(mut self, hours: i64) -> Self {
        self.utc_offset_secs = hours * 3600;
        self
    }

    pub fn insert_count(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }

    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    pub fn entry(&self, id: &str) -> Option<CalendarEntry> {
        self.entries.get(id).map(|e| e.value().clone())
    }

    pub fn entries(&self) -> Vec<CalendarEntry> {
        let mut all: Vec<_> = self.entries.iter().map(|e| e.value().clone()).collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    /// Adds a one-day all-day entry without counting it as an insert.
    pub fn seed_all_day(&self, id: &str, title: &str, day: NaiveDate) {
        self.entries.insert(
            id.to_string(),
            CalendarEntry {
                id: id.to_string(),
                title: title.to_string(),
                start: Some(EntryTime::AllDay(day)),
                end: day.succ_opt().map(EntryTime::AllDay),
            },
        );
    }

    pub fn fail_with(&self, reason: &str) {
        *self.failure.lock().unwrap() = Some(reason.to_string());
    }

    fn check(&self) -> Result<(), CalendarError> {
        match self.failure.lock().unwrap().clone() {
            Some(reason) => Err(CalendarError::Api(reason)),
            None => Ok(()),
        }
    }

    /// All-day dates begin at the calendar's local midnight.
    fn instant(&self, time: &EntryTime) -> DateTime<Utc> {
        match time {
            EntryTime::AllDay(day) => {
                Utc.from_utc_datetime(&day.and_time(NaiveTime::MIN))
                    - chrono::Duration::seconds(self.utc_offset_secs)
            }
            EntryTime::Timed(at) => *at,
        }
    }

    fn draft_entry(id: &str, draft: &AllDayDraft) -> CalendarEntry {
        CalendarEntry {
            id: id.to_string(),
            title: draft.title.clone(),
            start: Some(EntryTime::AllDay(draft.start)),
            end: Some(EntryTime::AllDay(draft.end)),
        }
    }
}


#[async_trait]
impl CalendarService for FakeCalendar {
    async fn find_entries(
        &self,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
        query: &str,
    ) -> Result<Vec<CalendarEntry>, CalendarError> {
        self.check()?;
        let mut found: Vec<CalendarEntry> = self
            .entries
            .iter()
            .map(|e| e.value().clone())
            .filter(|entry| {
                let (Some(start), Some(end)) = (&entry.start, &entry.end) else {
                    return false;
                };
                // End is exclusive.
                self.instant(end) > time_min && self.instant(start) <= time_max
            })
            .filter(|entry| entry.title.contains(query))
            .collect();
        found.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(found)
    }

    async fn insert_all_day(&self, draft: &AllDayDraft) -> Result<String, CalendarError> {
        self.check()?;
        let id = format!("evt-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        self.entries.insert(id.clone(), Self::draft_entry(&id, draft));
        self.inserts.fetch_add(1, Ordering::SeqCst);
        Ok(id)
    }

    async fn update_all_day(&self, entry_id: &str, draft: &AllDayDraft) -> Result<(), CalendarError> {
        self.check()?;
        if !self.entries.contains_key(entry_id) {
            return Err(CalendarError::Api(format!("404 Not Found: {}", entry_id)));
        }
        self.entries
            .insert(entry_id.to_string(), Self::draft_entry(entry_id, draft));
        self.updates.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Spreadsheet
// ---------------------------------------------------------------------------

pub struct FakeSheets {
    config: DashMap<String, String>,
    emails: DashMap<String, ()>,
    audit: Mutex<Vec<AuditRecord>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl FakeSheets {
    pub fn new() -> Self {
        Self {
            config: DashMap::new(),
            emails: DashMap::new(),
            audit: Mutex::new(Vec::new()),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
        }
    }

    pub fn set_config(&self, key: &str, value: &str) {
        self.config.insert(key.to_string(), value.to_string());
    }

    /// Whitelists an email exactly as it would sit in the sheet.
    pub fn allow_email(&self, email: &str) {
        self.emails.insert(email.trim().to_lowercase(), ());
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn audit_rows(&self) -> Vec<AuditRecord> {
        self.audit.lock().unwrap().clone()
    }

    fn check_read(&self) -> Result<(), SheetError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            Err(SheetError::Api("read failed".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ConfigSource for FakeSheets {
    async fn read_config(&self) -> Result<HashMap<String, String>, SheetError> {
        self.check_read()?;
        Ok(self
            .config
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect())
    }
}

#[async_trait]
impl AllowedEmailSource for FakeSheets {
    async fn allowed_emails(&self) -> Result<BTreeSet<String>, SheetError> {
        self.check_read()?;
        Ok(self.emails.iter().map(|e| e.key().clone()).collect())
    }
}

#[async_trait]
impl AuditLog for FakeSheets {
    async fn append(&self, record: AuditRecord) -> Result<(), SheetError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(SheetError::Api("write failed".to_string()));
        }
        self.audit.lock().unwrap().push(record);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

pub struct FakeChat {
    sent: Mutex<Vec<(String, String, String)>>,
    fail: AtomicBool,
}

impl FakeChat {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
        }
    }

    /// `(bot_token, chat_id, text)` for every delivered message, in order.
    pub fn sent(&self) -> Vec<(String, String, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn fail_deliveries(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ChatSender for FakeChat {
    async fn send_message(&self, bot_token: &str, chat_id: &str, text: &str) -> Result<(), NotifyError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(NotifyError::Delivery("chat unavailable".to_string()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((bot_token.to_string(), chat_id.to_string(), text.to_string()));
        Ok(())
    }
}
