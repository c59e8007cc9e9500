//! Shared fixtures for integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use orgdir::config::DirectoryConfig;
use orgdir::directory::{
    Attributes, DirectoryEntry, DirectoryStore, InMemoryDirectory, KindFilter, SearchScope,
};
use orgdir::error::{DirectoryError, DirectoryResult};
use orgdir::path::{Branch, EntryPath, PathGrammar};
use orgdir::service::DirectoryService;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

pub const BRANCH: Branch = Branch::Internal;

pub fn grammar() -> Arc<PathGrammar> {
    Arc::new(PathGrammar::new(&DirectoryConfig::default()).unwrap())
}

/// In-memory directory plus a service over it
pub struct TestDirectory {
    pub grammar: Arc<PathGrammar>,
    pub store: Arc<InMemoryDirectory>,
    pub service: DirectoryService,
}

impl TestDirectory {
    pub fn new() -> Self {
        let grammar = grammar();
        let store = Arc::new(InMemoryDirectory::new(grammar.clone()));
        let service = DirectoryService::new(store.clone(), grammar.clone());
        Self {
            grammar,
            store,
            service,
        }
    }

    async fn add_member(&self, group: &EntryPath, uid: &str) {
        let value = self.grammar.member_reference(group, uid).unwrap();
        self.store
            .add_attribute_value(group, "member", &value)
            .await
            .unwrap();
    }

    pub async fn super_admin(&self, branch: Branch, uid: &str) {
        let group = self.grammar.super_admin_group(branch).unwrap();
        self.add_member(&group, uid).await;
    }

    /// Top-level organization in the internal branch
    pub async fn org(&self, name: &str) -> EntryPath {
        self.service
            .lifecycle()
            .create_organization(name, BRANCH)
            .await
            .unwrap()
    }

    pub async fn sub_org(&self, parent: &EntryPath, name: &str) -> EntryPath {
        self.service
            .lifecycle()
            .create_sub_organization(name, parent)
            .await
            .unwrap()
    }

    /// Chain of nested organizations, outermost first
    pub async fn chain(&self, names: &[&str]) -> Vec<EntryPath> {
        let mut orgs = Vec::new();
        for name in names {
            let org = match orgs.last() {
                None => self.org(name).await,
                Some(parent) => self.sub_org(parent, name).await,
            };
            orgs.push(org);
        }
        orgs
    }

    pub async fn group(&self, org: &EntryPath, name: &str) -> EntryPath {
        self.service
            .lifecycle()
            .create_group(name, org)
            .await
            .unwrap()
    }

    pub async fn org_admin(&self, org: &EntryPath, uid: &str) {
        self.service.lifecycle().add_org_admin(org, uid).await.unwrap();
    }

    pub async fn group_admin(&self, group: &EntryPath, uid: &str) {
        self.service
            .lifecycle()
            .add_group_admin(group, uid)
            .await
            .unwrap();
    }
}

pub fn names(paths: &[EntryPath]) -> Vec<String> {
    paths
        .iter()
        .map(|p| p.name().unwrap().to_string())
        .collect()
}

/// Store wrapper that injects failures
///
/// `fail_add_at` makes the n-th `add_entry` call (1-based) fail with
/// `Unavailable`; `fail_reads` makes every read and search fail.
pub struct FailingStore {
    pub inner: InMemoryDirectory,
    adds: AtomicUsize,
    fail_add_at: AtomicUsize,
    fail_reads: AtomicBool,
}

impl FailingStore {
    pub fn new(grammar: Arc<PathGrammar>) -> Self {
        Self {
            inner: InMemoryDirectory::new(grammar),
            adds: AtomicUsize::new(0),
            fail_add_at: AtomicUsize::new(0),
            fail_reads: AtomicBool::new(false),
        }
    }

    /// Fail the `n`-th add from now on
    pub fn fail_add_after(&self, n: usize) {
        self.adds.store(0, Ordering::SeqCst);
        self.fail_add_at.store(n, Ordering::SeqCst);
    }

    pub fn heal(&self) {
        self.fail_add_at.store(0, Ordering::SeqCst);
        self.fail_reads.store(false, Ordering::SeqCst);
    }

    pub fn fail_reads(&self) {
        self.fail_reads.store(true, Ordering::SeqCst);
    }

    fn check_reads(&self) -> DirectoryResult<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(DirectoryError::Unavailable("connection reset".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl DirectoryStore for FailingStore {
    async fn search(
        &self,
        base: &EntryPath,
        scope: SearchScope,
        filter: KindFilter,
    ) -> DirectoryResult<Vec<DirectoryEntry>> {
        self.check_reads()?;
        self.inner.search(base, scope, filter).await
    }

    async fn read_entry(&self, path: &EntryPath) -> DirectoryResult<Option<Attributes>> {
        self.check_reads()?;
        self.inner.read_entry(path).await
    }

    async fn add_entry(&self, path: &EntryPath, attributes: Attributes) -> DirectoryResult<()> {
        let n = self.adds.fetch_add(1, Ordering::SeqCst) + 1;
        if n == self.fail_add_at.load(Ordering::SeqCst) {
            return Err(DirectoryError::Unavailable("write timed out".into()));
        }
        self.inner.add_entry(path, attributes).await
    }

    async fn add_attribute_value(
        &self,
        path: &EntryPath,
        attribute: &str,
        value: &str,
    ) -> DirectoryResult<()> {
        self.inner.add_attribute_value(path, attribute, value).await
    }

    async fn remove_attribute_value(
        &self,
        path: &EntryPath,
        attribute: &str,
        value: &str,
    ) -> DirectoryResult<()> {
        self.inner
            .remove_attribute_value(path, attribute, value)
            .await
    }

    fn store_type(&self) -> &'static str {
        "failing"
    }
}
