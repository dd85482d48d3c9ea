use std::collections::HashSet;
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::checker::ReachabilityCheck;
use crate::store::{PolicyStore, PolicyUrl};

/// Answers `true` only for the URLs it was told about and remembers what it was asked.
#[derive(Default)]
pub(crate) struct FakeChecker {
    reachable: HashSet<String>,
    checked: Mutex<Vec<String>>,
}

impl FakeChecker {
    pub(crate) fn reachable<'a>(urls: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            reachable: urls.into_iter().map(String::from).collect(),
            checked: Mutex::default(),
        }
    }

    pub(crate) fn checked(&self) -> Vec<String> {
        self.checked.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReachabilityCheck for FakeChecker {
    async fn check(&self, url: &str) -> bool {
        self.checked.lock().unwrap().push(url.to_string());
        self.reachable.contains(url)
    }
}

/// In-memory store with upsert semantics that records every accepted write.
#[derive(Default)]
pub(crate) struct MemoryStore {
    policies: Mutex<Vec<PolicyUrl>>,
    writes: Mutex<Vec<(String, bool)>>,
    failing_urls: HashSet<String>,
    fail_load: bool,
}

impl MemoryStore {
    pub(crate) fn new(policies: Vec<PolicyUrl>) -> Self {
        Self {
            policies: Mutex::new(policies),
            ..Default::default()
        }
    }

    pub(crate) fn failing_writes_for(mut self, url: &str) -> Self {
        self.failing_urls.insert(url.to_string());
        self
    }

    pub(crate) fn failing_load(mut self) -> Self {
        self.fail_load = true;
        self
    }

    pub(crate) fn policies(&self) -> Vec<PolicyUrl> {
        self.policies.lock().unwrap().clone()
    }

    pub(crate) fn writes(&self) -> Vec<(String, bool)> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl PolicyStore for MemoryStore {
    async fn policy_urls_and_active(&self) -> Result<Vec<PolicyUrl>> {
        if self.fail_load {
            bail!("connection reset")
        }
        Ok(self.policies())
    }

    async fn insert_policy(&self, url: &str, is_url_active: bool) -> Result<()> {
        if self.failing_urls.contains(url) {
            bail!("lock wait timeout exceeded for {}", url)
        }

        let mut policies = self.policies.lock().unwrap();
        match policies.iter_mut().find(|p| p.url == url) {
            Some(policy) => policy.previously_active = Some(is_url_active),
            None => policies.push(PolicyUrl::new(url, is_url_active)),
        }
        self.writes
            .lock()
            .unwrap()
            .push((url.to_string(), is_url_active));
        Ok(())
    }
}
