//! Fixtures and collaborator doubles shared by the unit tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::Notify;
use uuid::Uuid;

use crate::bilingual::{BilingualRecord, TranslationPayload, Translator};
use crate::errors::{PersistenceError, TranslationError};
use crate::models::{
    DocumentMetadata, Education, EducationEntry, ExperienceEntry, Language, PersonalInfo,
    ResumeDocument, SkillEntry, SkillLevel, Skills,
};
use crate::store::{MemoryStore, ResumeStore};
use crate::timeline::Clock;

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
}

pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

pub fn fixed_clock() -> Arc<dyn Clock> {
    Arc::new(FixedClock(today()))
}

/// Two experience entries (newest first), one degree, no military block.
pub fn sample_document() -> ResumeDocument {
    ResumeDocument {
        personal_info: Arc::new(PersonalInfo {
            full_name: "Dana Levi".into(),
            title: "Senior Engineer".into(),
            email: "dana@example.com".into(),
            phone: "+972-50-000-0000".into(),
            location: "Tel Aviv".into(),
            linkedin: "linkedin.com/in/dana".into(),
            website: None,
            summary: "Backend engineer focused on storage systems.".into(),
        }),
        experience: Arc::new(vec![
            Arc::new(ExperienceEntry {
                position: "Senior Engineer".into(),
                company: "Acme".into(),
                start_date: "03/2021".into(),
                end_date: "Present".into(),
                location: Some("Tel Aviv".into()),
                description: vec!["Own the ingestion pipeline".into()],
                achievements: vec!["Cut p99 latency by 40%".into()],
            }),
            Arc::new(ExperienceEntry {
                position: "Engineer".into(),
                company: "Initech".into(),
                start_date: "2017".into(),
                end_date: "02/2021".into(),
                location: None,
                description: vec!["Built the billing service".into()],
                achievements: Vec::new(),
            }),
        ]),
        education: Arc::new(Education {
            degrees: Arc::new(vec![Arc::new(EducationEntry {
                degree_type: "B.Sc.".into(),
                field: "Computer Science".into(),
                institution: "Technion".into(),
                start_date: "2013".into(),
                end_date: "2017".into(),
                specialization: None,
            })]),
        }),
        skills: Arc::new(Skills {
            technical: Arc::new(vec![Arc::new(SkillEntry {
                name: "Rust".into(),
                level: SkillLevel::new(5).unwrap(),
            })]),
            ..Default::default()
        }),
        military: None,
        metadata: Arc::new(DocumentMetadata {
            content_language: Language::English,
            ..Default::default()
        }),
    }
}

/// One ongoing experience entry starting in 2018.
pub fn single_entry_document() -> ResumeDocument {
    ResumeDocument {
        experience: Arc::new(vec![Arc::new(ExperienceEntry {
            position: "Engineer".into(),
            company: "Acme".into(),
            start_date: "2018".into(),
            end_date: "Present".into(),
            ..Default::default()
        })]),
        ..Default::default()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Store double
// ────────────────────────────────────────────────────────────────────────────

/// `MemoryStore` with injectable failures and a gate that holds document
/// saves in flight until released.
#[derive(Default)]
pub struct TestStore {
    inner: MemoryStore,
    saved: AtomicUsize,
    failing: AtomicBool,
    held: AtomicBool,
    started: Notify,
    release: Notify,
}

impl TestStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_saves(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn hold_saves(&self) {
        self.held.store(true, Ordering::SeqCst);
    }

    pub fn release_saves(&self) {
        self.held.store(false, Ordering::SeqCst);
        self.release.notify_one();
    }

    pub async fn wait_until_save_started(&self) {
        self.started.notified().await;
    }

    /// Successful document saves so far.
    pub fn saved_count(&self) -> usize {
        self.saved.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResumeStore for TestStore {
    async fn save_document(
        &self,
        session_id: Uuid,
        document: &ResumeDocument,
    ) -> Result<(), PersistenceError> {
        self.started.notify_one();
        if self.held.load(Ordering::SeqCst) {
            self.release.notified().await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(PersistenceError::Unavailable("injected failure".into()));
        }
        self.inner.save_document(session_id, document).await?;
        self.saved.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn load_document(&self, session_id: Uuid) -> Result<Option<ResumeDocument>, PersistenceError> {
        self.inner.load_document(session_id).await
    }

    async fn save_bilingual(&self, record: &BilingualRecord) -> Result<(), PersistenceError> {
        self.inner.save_bilingual(record).await
    }

    async fn load_bilingual(&self, session_id: Uuid) -> Result<Option<BilingualRecord>, PersistenceError> {
        self.inner.load_bilingual(session_id).await
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Translator double
// ────────────────────────────────────────────────────────────────────────────

/// Counts outbound calls. Translation prefixes the title with the target
/// language code and relabels the document.
#[derive(Default)]
pub struct CountingTranslator {
    calls: AtomicUsize,
    failing: AtomicBool,
    unstructured: AtomicBool,
    held: AtomicBool,
    started: Notify,
    release: Notify,
}

impl CountingTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn reply_unstructured(&self, unstructured: bool) {
        self.unstructured.store(unstructured, Ordering::SeqCst);
    }

    pub fn hold(&self) {
        self.held.store(true, Ordering::SeqCst);
    }

    pub fn release(&self) {
        self.held.store(false, Ordering::SeqCst);
        self.release.notify_one();
    }

    pub async fn wait_until_started(&self) {
        self.started.notified().await;
    }
}

#[async_trait]
impl Translator for CountingTranslator {
    async fn translate(
        &self,
        _session_id: Uuid,
        target: Language,
        native: &ResumeDocument,
    ) -> Result<TranslationPayload, TranslationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.started.notify_one();
        if self.held.load(Ordering::SeqCst) {
            self.release.notified().await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(TranslationError::Service("injected failure".into()));
        }
        if self.unstructured.load(Ordering::SeqCst) {
            return Ok(TranslationPayload::Raw("Sorry, I cannot help with that.".into()));
        }

        let mut translated = native.clone();
        let info = Arc::make_mut(&mut translated.personal_info);
        info.title = format!("[{}] {}", target.code(), info.title);
        Arc::make_mut(&mut translated.metadata).content_language = target;
        Ok(TranslationPayload::Structured(translated))
    }
}
