// cadre-core/src/graph.rs
// The extends-from relation between buckets, as explicit enumerable edges.
// Nothing here is inferred from naming conventions; the single implicit
// extension the model admits (default suite -> production) is materialized
// as an ordinary edge so the isolation invariant is checkable by
// construction.
use std::collections::HashSet;
use std::fmt;

use cadre_common::error::{CadreError, Result};
use cadre_common::model::kind::{BucketRole, ClasspathKind};
use tracing::debug;

use crate::suite::{ProductionLink, SuiteRegistry};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BucketOwner {
    Production,
    Suite(String),
}

impl fmt::Display for BucketOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Production => write!(f, "main"),
            Self::Suite(name) => write!(f, "{name}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BucketId {
    pub owner: BucketOwner,
    pub role: BucketRole,
}

impl BucketId {
    pub fn production(role: BucketRole) -> Self {
        Self {
            owner: BucketOwner::Production,
            role,
        }
    }

    pub fn suite(name: &str, role: BucketRole) -> Self {
        Self {
            owner: BucketOwner::Suite(name.to_string()),
            role,
        }
    }
}

impl fmt::Display for BucketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.role)
    }
}

/// One extension: `bucket` extends from `extends_from`, so the extended
/// bucket's contents participate in every resolution the extending bucket
/// participates in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendsEdge {
    pub bucket: BucketId,
    pub extends_from: BucketId,
}

pub struct BucketGraph {
    edges: Vec<ExtendsEdge>,
}

impl BucketGraph {
    /// Enumerate the extension edges present in a registry. Exactly the
    /// suites whose production link is `Leaking` — the default suite —
    /// contribute an implementation -> production-implementation edge;
    /// there are no other implicit edges, and in particular no edge ever
    /// targets another custom suite's buckets.
    pub fn for_registry(registry: &SuiteRegistry) -> Self {
        let mut edges = Vec::new();
        for suite in registry.suites() {
            if suite.production_link() == ProductionLink::Leaking {
                edges.push(ExtendsEdge {
                    bucket: BucketId::suite(suite.name(), BucketRole::Implementation),
                    extends_from: BucketId::production(BucketRole::Implementation),
                });
            }
        }
        debug!("Bucket graph carries {} extension edges", edges.len());
        Self { edges }
    }

    pub fn from_edges(edges: Vec<ExtendsEdge>) -> Self {
        Self { edges }
    }

    pub fn edges(&self) -> &[ExtendsEdge] {
        &self.edges
    }

    /// The buckets participating in one (suite, kind) domain, in merge
    /// order: extended buckets ahead of the buckets extending them, the
    /// suite's implementation ahead of its kind-specific bucket.
    pub fn buckets_for(&self, suite: &str, kind: ClasspathKind) -> Result<Vec<BucketId>> {
        let mut ordered = Vec::new();
        let mut seen = HashSet::new();
        for role in BucketRole::ALL {
            if !role.extends_into(kind) {
                continue;
            }
            let mut visiting = HashSet::new();
            self.visit(
                BucketId::suite(suite, role),
                kind,
                &mut ordered,
                &mut seen,
                &mut visiting,
            )?;
        }
        Ok(ordered)
    }

    fn visit(
        &self,
        id: BucketId,
        kind: ClasspathKind,
        ordered: &mut Vec<BucketId>,
        seen: &mut HashSet<BucketId>,
        visiting: &mut HashSet<BucketId>,
    ) -> Result<()> {
        if seen.contains(&id) {
            return Ok(());
        }
        if !visiting.insert(id.clone()) {
            return Err(CadreError::DependencyError(format!(
                "extends-from cycle detected involving bucket '{id}'"
            )));
        }
        for edge in self.edges.iter().filter(|e| e.bucket == id) {
            if edge.extends_from.role.extends_into(kind) {
                self.visit(edge.extends_from.clone(), kind, ordered, seen, visiting)?;
            }
        }
        visiting.remove(&id);
        seen.insert(id.clone());
        ordered.push(id);
        Ok(())
    }

    /// Check the invariant directly: restricted to either classpath kind,
    /// the extends-from relation is acyclic.
    pub fn validate(&self) -> Result<()> {
        for kind in [ClasspathKind::Compile, ClasspathKind::Runtime] {
            let mut ordered = Vec::new();
            let mut seen = HashSet::new();
            for edge in &self.edges {
                let mut visiting = HashSet::new();
                self.visit(edge.bucket.clone(), kind, &mut ordered, &mut seen, &mut visiting)?;
            }
        }
        Ok(())
    }
}
