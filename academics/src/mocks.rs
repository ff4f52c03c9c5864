//! Scripted doubles for the remote lookups and the credential verifier.
//!
//! Each lookup answers every call with the same scripted result and counts
//! calls, so tests can assert that a denied gate stopped later lookups.

use crate::access::{AccessContext, CredentialVerifier};
use crate::remote::{
    ClearanceLookup, RemoteError, RemoteResult, RemoteService, StandingLookup, TuitionLookup,
};
use crate::types::{AcademicStanding, LibraryClearance, StudentProfile, SubjectId, TuitionStatus};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

#[derive(Debug)]
struct Script<T> {
    default: Option<RemoteResult<T>>,
    per_subject: HashMap<SubjectId, RemoteResult<T>>,
    delay: Option<Duration>,
}

/// Scripted answers plus a call counter
#[derive(Debug)]
struct Scripted<T> {
    script: RwLock<Script<T>>,
    calls: AtomicUsize,
}

impl<T: Clone> Scripted<T> {
    fn new(default: RemoteResult<T>) -> Self {
        Self {
            script: RwLock::new(Script {
                default: Some(default),
                per_subject: HashMap::new(),
                delay: None,
            }),
            calls: AtomicUsize::new(0),
        }
    }

    fn set(&self, subject: &SubjectId, result: RemoteResult<T>) {
        self.script
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .per_subject
            .insert(subject.clone(), result);
    }

    fn set_default(&self, result: RemoteResult<T>) {
        self.script
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .default = Some(result);
    }

    fn set_delay(&self, delay: Duration) {
        self.script
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .delay = Some(delay);
    }

    async fn answer(&self, service: RemoteService, subject: &SubjectId) -> RemoteResult<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let (result, delay) = {
            let script = self.script.read().unwrap_or_else(PoisonError::into_inner);
            let result = script
                .per_subject
                .get(subject)
                .or(script.default.as_ref())
                .cloned()
                .unwrap_or_else(|| {
                    Err(RemoteError::MalformedResponse {
                        service,
                        detail: "no scripted answer".to_string(),
                    })
                });
            (result, script.delay)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        result
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

macro_rules! scripted_lookup {
    ($(#[$doc:meta])* $name:ident, $value:ty, $service:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone)]
        pub struct $name(Arc<Scripted<$value>>);

        impl $name {
            /// Answer every subject with `result`
            #[must_use]
            pub fn returning(result: RemoteResult<$value>) -> Self {
                Self(Arc::new(Scripted::new(result)))
            }

            /// Answer every subject with `error`
            #[must_use]
            pub fn failing(error: RemoteError) -> Self {
                Self::returning(Err(error))
            }

            /// Override the answer for one subject
            pub fn set(&self, subject: &SubjectId, result: RemoteResult<$value>) {
                self.0.set(subject, result);
            }

            /// Replace the answer for subjects without an override
            pub fn set_default(&self, result: RemoteResult<$value>) {
                self.0.set_default(result);
            }

            /// Wait `delay` before answering
            pub fn set_delay(&self, delay: Duration) {
                self.0.set_delay(delay);
            }

            /// Number of lookups so far
            #[must_use]
            pub fn calls(&self) -> usize {
                self.0.calls()
            }

            async fn answer(&self, subject: &SubjectId) -> RemoteResult<$value> {
                self.0.answer($service, subject).await
            }
        }
    };
}

scripted_lookup!(
    /// Scripted [`TuitionLookup`]
    ScriptedTuition,
    TuitionStatus,
    RemoteService::Finance
);
scripted_lookup!(
    /// Scripted [`StandingLookup`]
    ScriptedStanding,
    StudentProfile,
    RemoteService::Student
);
scripted_lookup!(
    /// Scripted [`ClearanceLookup`]
    ScriptedClearance,
    Option<LibraryClearance>,
    RemoteService::Library
);

impl ScriptedTuition {
    /// Every subject has paid
    #[must_use]
    pub fn paid() -> Self {
        Self::returning(Ok(TuitionStatus::Paid))
    }
}

impl ScriptedStanding {
    /// Every subject is active
    #[must_use]
    pub fn active() -> Self {
        Self::returning(Ok(profile("any", AcademicStanding::Active)))
    }
}

impl ScriptedClearance {
    /// Every subject is cleared
    #[must_use]
    pub fn approved() -> Self {
        Self::returning(Ok(Some(LibraryClearance {
            approved: true,
            reason: None,
        })))
    }
}

#[async_trait]
impl TuitionLookup for ScriptedTuition {
    async fn tuition_status(&self, subject: &SubjectId) -> RemoteResult<TuitionStatus> {
        self.answer(subject).await
    }
}

#[async_trait]
impl StandingLookup for ScriptedStanding {
    async fn student_profile(&self, subject: &SubjectId) -> RemoteResult<StudentProfile> {
        self.answer(subject).await.map(|profile| StudentProfile {
            subject: subject.clone(),
            ..profile
        })
    }
}

#[async_trait]
impl ClearanceLookup for ScriptedClearance {
    async fn library_clearance(
        &self,
        subject: &SubjectId,
    ) -> RemoteResult<Option<LibraryClearance>> {
        self.answer(subject).await
    }
}

/// Student profile with the given standing
#[must_use]
pub fn profile(subject: &str, standing: AcademicStanding) -> StudentProfile {
    StudentProfile {
        subject: SubjectId::new(subject),
        name: format!("Student {subject}"),
        program: "Informatics".to_string(),
        standing,
    }
}

/// Verifier mapping fixed tokens to fixed contexts
#[derive(Debug, Clone, Default)]
pub struct StaticVerifier {
    tokens: HashMap<String, AccessContext>,
}

impl StaticVerifier {
    /// Verifier that knows no tokens
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `token` to `context`
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>, context: AccessContext) -> Self {
        self.tokens.insert(token.into(), context);
        self
    }
}

impl CredentialVerifier for StaticVerifier {
    fn resolve(&self, credential: Option<&str>) -> AccessContext {
        credential
            .and_then(|token| self.tokens.get(token))
            .cloned()
            .unwrap_or_default()
    }
}
