//! Shared fakes for handler unit tests.

use crate::identity::{Identity, IdentityProvider, IdentityUpdate};
use crate::konfirmo::email::Mailer;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use axum::extract::Extension;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Coerce a fake provider into the handler's trait-object extension.
pub(crate) fn identity_ext(
    provider: &Arc<MockIdentityProvider>,
) -> Extension<Arc<dyn IdentityProvider>> {
    Extension(provider.clone())
}

pub(crate) fn mailer_ext(mailer: &Arc<CaptureMailer>) -> Extension<Arc<dyn Mailer>> {
    Extension(mailer.clone())
}

/// In-memory identity provider fake.
#[derive(Debug, Default)]
pub(crate) struct MockIdentityProvider {
    users: Mutex<HashMap<String, Identity>>,
    lookups: Mutex<Vec<String>>,
    verified: Mutex<Vec<String>>,
    passwords: Mutex<HashMap<String, String>>,
    fail_updates: bool,
}

impl MockIdentityProvider {
    pub(crate) fn with_user(id: &str, email: &str) -> Self {
        let provider = Self::default();

        provider.users.lock().unwrap().insert(
            email.to_string(),
            Identity {
                id: id.to_string(),
                email: email.to_string(),
                email_verified: false,
            },
        );

        provider
    }

    pub(crate) fn failing_updates(mut self) -> Self {
        self.fail_updates = true;
        self
    }

    pub(crate) fn lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }

    pub(crate) fn verified_ids(&self) -> Vec<String> {
        self.verified.lock().unwrap().clone()
    }

    pub(crate) fn password_for(&self, id: &str) -> Option<String> {
        self.passwords.lock().unwrap().get(id).cloned()
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn get_by_email(&self, email: &str) -> Result<Identity> {
        self.lookups.lock().unwrap().push(email.to_string());

        self.users
            .lock()
            .unwrap()
            .get(email)
            .cloned()
            .ok_or_else(|| anyhow!("no user for {email}"))
    }

    async fn update_user(&self, id: &str, update: IdentityUpdate) -> Result<()> {
        if self.fail_updates {
            return Err(anyhow!("update rejected for {id}"));
        }

        let update = serde_json::to_value(&update)?;

        if update["emailVerified"].as_bool() == Some(true) {
            self.verified.lock().unwrap().push(id.to_string());
        }

        if let Some(password) = update["password"].as_str() {
            self.passwords
                .lock()
                .unwrap()
                .insert(id.to_string(), password.to_string());
        }

        Ok(())
    }
}

/// Mailer fake recording every message; optionally fails each send.
#[derive(Debug, Default)]
pub(crate) struct CaptureMailer {
    sent: Mutex<Vec<(String, String, String)>>,
    failing: bool,
}

impl CaptureMailer {
    pub(crate) fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failing: true,
        }
    }

    pub(crate) fn sent(&self) -> Vec<(String, String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for CaptureMailer {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<()> {
        if self.failing {
            return Err(anyhow!("relay unavailable"));
        }

        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), subject.to_string(), html.to_string()));

        Ok(())
    }

    async fn verify_connection(&self) -> Result<()> {
        Ok(())
    }
}
