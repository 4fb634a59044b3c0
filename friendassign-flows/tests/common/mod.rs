#![allow(dead_code)]

use std::sync::Arc;

use friendassign_api::client::Client;
use friendassign_api::services::api_service::{ApiRequest, ApiService};
use friendassign_api::session::{Session, SessionStore};
use friendassign_api::testing::{FakeAuth, FakeBackend};
use friendassign_flows::board::{ConfirmPrompt, Confirmer};

pub struct World {
    pub backend: Arc<FakeBackend>,
    pub store: SessionStore,
    pub auth: FakeAuth,
}

impl World {
    pub fn new() -> Self {
        let store = SessionStore::new();
        Self {
            backend: FakeBackend::new(),
            auth: FakeAuth::new(store.clone()),
            store,
        }
    }

    pub fn client(&self) -> Client<impl ApiService + use<>> {
        Client::new(self.backend.service())
    }

    pub fn session(&self) -> Session {
        self.store.session()
    }

    pub fn sign_in(&self, email: &str) -> Session {
        let name = email.split('@').next().unwrap_or(email);
        self.auth.sign_in_as(email, name);
        self.session()
    }

    pub fn requests_with(&self, method: &str) -> Vec<ApiRequest> {
        self.backend
            .requests()
            .into_iter()
            .filter(|request| request.method().as_str() == method)
            .collect()
    }
}

/// Answers every prompt the same way and remembers what it was asked.
#[derive(Default)]
pub struct ScriptedConfirmer {
    pub answer: bool,
    pub asked: std::sync::Mutex<Vec<ConfirmPrompt>>,
}

impl ScriptedConfirmer {
    pub fn answering(answer: bool) -> Self {
        Self {
            answer,
            ..Self::default()
        }
    }

    pub fn times_asked(&self) -> usize {
        self.asked.lock().unwrap().len()
    }
}

impl Confirmer for ScriptedConfirmer {
    async fn confirm(&self, prompt: &ConfirmPrompt) -> bool {
        self.asked.lock().unwrap().push(prompt.clone());
        self.answer
    }
}
