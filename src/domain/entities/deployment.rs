//! Deployment entities
//!
//! A deployment is one bootable tree checked out from a commit. The list is
//! ordered: position 0 is what the bootloader starts by default, everything
//! after it is a rollback candidate. Lists are never edited in place; every
//! change produces a new list that the store swaps in wholesale.

use crate::domain::value_objects::Revision;

/// Position the rollback candidate always occupies.
///
/// The store's default retention keeps the new default and the previous one,
/// so with two deployments "the other one" is unambiguous.
pub const ROLLBACK_INDEX: usize = 1;

/// One bootable, checksummed system image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployment {
    checksum: Revision,
    osname: String,
    /// Distinguishes repeated deployments of the same commit
    serial: u32,
}

impl Deployment {
    pub fn new(checksum: impl Into<Revision>) -> Self {
        Self {
            checksum: checksum.into(),
            osname: String::new(),
            serial: 0,
        }
    }

    pub fn with_osname(mut self, osname: impl Into<String>) -> Self {
        self.osname = osname.into();
        self
    }

    pub fn with_serial(mut self, serial: u32) -> Self {
        self.serial = serial;
        self
    }

    pub fn checksum(&self) -> &Revision {
        &self.checksum
    }

    pub fn osname(&self) -> &str {
        &self.osname
    }

    pub fn serial(&self) -> u32 {
        self.serial
    }
}

/// Ordered sequence of deployments, default boot target first
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeploymentList {
    deployments: Vec<Deployment>,
}

impl DeploymentList {
    pub fn new(deployments: Vec<Deployment>) -> Self {
        Self { deployments }
    }

    pub fn len(&self) -> usize {
        self.deployments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deployments.is_empty()
    }

    pub fn get(&self, position: usize) -> Option<&Deployment> {
        self.deployments.get(position)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Deployment> {
        self.deployments.iter()
    }

    /// The deployment the bootloader starts by default
    pub fn default_deployment(&self) -> Option<&Deployment> {
        self.deployments.first()
    }

    pub fn default_revision(&self) -> Option<&Revision> {
        self.default_deployment().map(Deployment::checksum)
    }

    /// Position of the rollback candidate, if there is one
    pub fn rollback_index(&self) -> Option<usize> {
        (self.deployments.len() > ROLLBACK_INDEX).then_some(ROLLBACK_INDEX)
    }

    pub fn rollback_candidate(&self) -> Option<&Deployment> {
        self.rollback_index().and_then(|i| self.deployments.get(i))
    }

    /// Build the list a rollback would persist.
    ///
    /// The candidate moves to position 0, every other deployment keeps its
    /// relative order. Returns `None` when there is nothing to roll back to.
    pub fn rolled_back(&self) -> Option<DeploymentList> {
        let index = self.rollback_index()?;
        let mut reordered = Vec::with_capacity(self.deployments.len());
        reordered.push(self.deployments[index].clone());
        reordered.extend(
            self.deployments
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != index)
                .map(|(_, d)| d.clone()),
        );
        Some(DeploymentList::new(reordered))
    }

    /// Positions to move to the front, one after another, to turn this list
    /// into `target`.
    ///
    /// Each step moves the deployment at that position to position 0 and
    /// keeps the rest in order, which is the one reorder the store tooling
    /// offers. Entries already in the right relative order at the tail are
    /// left alone. Returns `None` unless `target` is a permutation of this
    /// list.
    pub fn promotions_to(&self, target: &DeploymentList) -> Option<Vec<usize>> {
        if self.len() != target.len() || !target.iter().all(|d| self.deployments.contains(d)) {
            return None;
        }
        if self.iter().any(|d| !target.deployments.contains(d)) {
            return None;
        }

        let position = |d: &Deployment| self.deployments.iter().position(|x| x == d);
        let mut untouched = target.len();
        let mut bound = self.len();
        for (i, deployment) in target.deployments.iter().enumerate().rev() {
            match position(deployment) {
                Some(p) if p < bound => {
                    bound = p;
                    untouched = i;
                }
                _ => break,
            }
        }

        let mut working = self.deployments.clone();
        let mut steps = Vec::with_capacity(untouched);
        for deployment in target.deployments[..untouched].iter().rev() {
            let index = working.iter().position(|x| x == deployment)?;
            let moved = working.remove(index);
            working.insert(0, moved);
            steps.push(index);
        }
        Some(steps)
    }
}

impl FromIterator<Deployment> for DeploymentList {
    fn from_iter<I: IntoIterator<Item = Deployment>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
