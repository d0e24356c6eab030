//! Storage capability for process rows.
//!
//! The formation model never talks to a database. Whatever persists
//! process rows implements [`ProcessRepository`]; storage errors come back
//! exactly as the backend produced them.

use std::collections::BTreeMap;
use std::convert::Infallible;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use formation_id::{ProcessId, ReleaseId};

use crate::formation::Formation;
use crate::process::Process;

/// Insert-or-update of single process rows.
#[async_trait]
pub trait ProcessRepository: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Saves one row.
    ///
    /// A process without an ID is given a fresh [`ProcessId`] and inserted;
    /// one with an ID replaces the stored row with that ID.
    async fn update_process(&self, process: &mut Process) -> Result<(), Self::Error>;
}

/// Saves every process of a formation, stopping at the first error.
///
/// IDs assigned by the repository are written back into `formation`, so
/// saving it again updates the same rows. Rows written before a failure
/// stay written; wrap the call in a storage transaction when all-or-nothing
/// is required.
pub async fn save_formation<R>(repository: &R, formation: &mut Formation) -> Result<(), R::Error>
where
    R: ProcessRepository + ?Sized,
{
    for process in formation.processes_mut() {
        repository.update_process(process).await?;
    }
    Ok(())
}

/// In-process repository for tests and tooling.
#[derive(Debug, Default)]
pub struct MemoryProcessRepository {
    rows: Mutex<BTreeMap<ProcessId, Process>>,
}

impl MemoryProcessRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored rows owned by `release_id`.
    pub fn processes_for_release(&self, release_id: ReleaseId) -> Vec<Process> {
        self.rows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|p| p.release_id == Some(release_id))
            .cloned()
            .collect()
    }

    /// The stored row with `id`.
    pub fn get(&self, id: ProcessId) -> Option<Process> {
        self.rows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ProcessRepository for MemoryProcessRepository {
    type Error = Infallible;

    async fn update_process(&self, process: &mut Process) -> Result<(), Self::Error> {
        let id = *process.id.get_or_insert_with(ProcessId::new);
        let mut row = process.clone();
        row.port = None;
        self.rows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, row);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command_map::CommandMap;

    #[tokio::test]
    async fn test_update_assigns_id_once() {
        let repo = MemoryProcessRepository::new();
        let mut p = Process::new("web".into(), "./web".into());

        repo.update_process(&mut p).await.unwrap();
        let id = p.id.expect("id assigned");

        p.quantity = 5;
        repo.update_process(&mut p).await.unwrap();

        assert_eq!(p.id, Some(id));
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn test_port_not_stored() {
        let repo = MemoryProcessRepository::new();
        let release_id = ReleaseId::new();
        let mut p = Process::new("web".into(), "./web".into());
        p.release_id = Some(release_id);
        p.port = Some(8080);

        repo.update_process(&mut p).await.unwrap();

        let stored = repo.processes_for_release(release_id);
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].port, None);
    }

    #[tokio::test]
    async fn test_save_and_reload_formation() {
        let repo = MemoryProcessRepository::new();
        let release_id = ReleaseId::new();
        let mut f = Formation::reconcile(
            None,
            &CommandMap::from_declaration([("web", "./web"), ("worker", "./worker")]),
        );
        f.bind_release(release_id);

        save_formation(&repo, &mut f).await.unwrap();

        let reloaded = Formation::from_processes(repo.processes_for_release(release_id));
        assert_eq!(reloaded, f);
    }

    #[tokio::test]
    async fn test_saving_twice_updates_the_same_rows() {
        let repo = MemoryProcessRepository::new();
        let mut f = Formation::reconcile(
            None,
            &CommandMap::from_declaration([("web", "./web"), ("worker", "./worker")]),
        );

        save_formation(&repo, &mut f).await.unwrap();
        assert!(f.iter().all(|(_, p)| p.id.is_some()));
        let first_ids: Vec<_> = f.iter().map(|(_, p)| p.id).collect();

        f.scale("worker", Some(2), None).unwrap();
        save_formation(&repo, &mut f).await.unwrap();

        assert_eq!(repo.len(), 2);
        let second_ids: Vec<_> = f.iter().map(|(_, p)| p.id).collect();
        assert_eq!(first_ids, second_ids);

        let worker_id = f.get("worker").unwrap().id.unwrap();
        let stored = repo.get(worker_id).unwrap();
        assert_eq!(stored.quantity, 2);
    }
}
