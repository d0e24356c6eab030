//! Formations and the reconciliation that carries them across releases.
//!
//! A formation is the full desired process topology of an application for
//! one release. Each new release declares a fresh [`CommandMap`]; the next
//! formation takes its type set and commands from that map and its scale
//! and size from the previous formation, so operator tuning survives
//! deploys.
//!
//! Reconciliation is pure. Two release workflows for the same application
//! that both read the same prior formation will each compute a result from
//! it, and whichever persists last wins; callers serialize release creation
//! per application.

use std::collections::BTreeMap;

use formation_id::{ProcessId, ReleaseId};

use crate::command_map::CommandMap;
use crate::constraints::Constraints;
use crate::error::FormationError;
use crate::process::{Process, ProcessQuantityMap, ProcessType};

/// Process type to process, for a single release.
///
/// Every entry is keyed by its own process's type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Formation {
    processes: BTreeMap<ProcessType, Process>,
}

impl Formation {
    /// Builds the formation for a new release.
    ///
    /// The result has exactly the process types of `commands`. Types also
    /// present in `prior` keep their quantity and constraints; new types get
    /// the defaults. Types only in `prior` are dropped. A missing prior
    /// formation is a first release.
    pub fn reconcile(prior: Option<&Formation>, commands: &CommandMap) -> Self {
        let processes = commands
            .iter()
            .map(|(process_type, command)| {
                let mut process = Process::new(process_type.clone(), command.clone());
                if let Some(existing) = prior.and_then(|f| f.get(process_type.as_str())) {
                    process.quantity = existing.quantity;
                    process.constraints = existing.constraints;
                }
                (process_type.clone(), process)
            })
            .collect();

        Self { processes }
    }

    /// Indexes persisted rows by type.
    ///
    /// Rows are not checked for uniqueness; if two share a type, the later
    /// one wins.
    pub fn from_processes<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = Process>,
    {
        let processes = rows
            .into_iter()
            .map(|p| (p.process_type.clone(), p))
            .collect();
        Self { processes }
    }

    pub fn get(&self, process_type: &str) -> Option<&Process> {
        self.processes.get(process_type)
    }

    pub fn contains(&self, process_type: &str) -> bool {
        self.processes.contains_key(process_type)
    }

    pub fn len(&self) -> usize {
        self.processes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }

    pub fn process_types(&self) -> impl Iterator<Item = &ProcessType> {
        self.processes.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ProcessType, &Process)> {
        self.processes.iter()
    }

    /// The processes to run. Consumers must not depend on the order.
    pub fn processes(&self) -> Vec<&Process> {
        self.processes.values().collect()
    }

    /// Rows in type order, for writers that fill in storage-assigned fields.
    pub(crate) fn processes_mut(&mut self) -> impl Iterator<Item = &mut Process> {
        self.processes.values_mut()
    }

    pub fn into_processes(self) -> Vec<Process> {
        self.processes.into_values().collect()
    }

    /// Desired instance count per type.
    pub fn quantities(&self) -> ProcessQuantityMap {
        self.processes
            .iter()
            .map(|(t, p)| (t.clone(), p.quantity))
            .collect()
    }

    /// Assigns every process to `release_id` with a fresh row ID.
    pub fn bind_release(&mut self, release_id: ReleaseId) {
        for process in self.processes.values_mut() {
            process.release_id = Some(release_id);
            process.id = Some(ProcessId::new());
        }
    }

    /// Applies an operator scale or resize to one process type.
    ///
    /// `None` leaves the corresponding field as it is.
    pub fn scale(
        &mut self,
        process_type: &str,
        quantity: Option<u32>,
        constraints: Option<Constraints>,
    ) -> Result<&Process, FormationError> {
        let process = self
            .processes
            .get_mut(process_type)
            .ok_or_else(|| FormationError::UnknownProcessType(ProcessType::from(process_type)))?;

        if let Some(quantity) = quantity {
            process.quantity = quantity;
        }
        if let Some(constraints) = constraints {
            process.constraints = constraints;
        }

        Ok(process)
    }
}

impl FromIterator<Process> for Formation {
    fn from_iter<T: IntoIterator<Item = Process>>(iter: T) -> Self {
        Self::from_processes(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::{parse_constraints, CONSTRAINTS_1X, CONSTRAINTS_2X, CONSTRAINTS_PX};

    fn process(t: &str, command: &str, quantity: u32, constraints: Constraints) -> Process {
        let mut p = Process::new(t.into(), command.into());
        p.quantity = quantity;
        p.constraints = constraints;
        p
    }

    #[test]
    fn test_first_release_uses_defaults() {
        let commands = CommandMap::from_declaration([("web", "./web"), ("worker", "./worker")]);
        let f = Formation::reconcile(None, &commands);

        assert_eq!(f.len(), 2);
        let web = f.get("web").unwrap();
        assert_eq!(web.quantity, 1);
        assert_eq!(web.constraints, CONSTRAINTS_1X);
        let worker = f.get("worker").unwrap();
        assert_eq!(worker.quantity, 0);
        assert_eq!(worker.constraints, CONSTRAINTS_1X);
    }

    #[test]
    fn test_scale_survives_new_release() {
        let prior = Formation::from_processes([process("web", "./old-web", 3, CONSTRAINTS_2X)]);
        let commands = CommandMap::from_declaration([("web", "./web"), ("worker", "./worker")]);

        let f = Formation::reconcile(Some(&prior), &commands);

        let web = f.get("web").unwrap();
        assert_eq!(web.quantity, 3);
        assert_eq!(web.constraints, CONSTRAINTS_2X);
        assert_eq!(web.command.as_str(), "./web");

        let worker = f.get("worker").unwrap();
        assert_eq!(worker.quantity, 0);
        assert_eq!(worker.constraints, CONSTRAINTS_1X);
        assert_eq!(worker.command.as_str(), "./worker");
    }

    #[test]
    fn test_removed_types_are_dropped() {
        let prior = Formation::from_processes([
            process("web", "./web", 2, CONSTRAINTS_1X),
            process("clock", "./clock", 1, CONSTRAINTS_PX),
        ]);
        let commands = CommandMap::from_declaration([("web", "./web")]);

        let f = Formation::reconcile(Some(&prior), &commands);

        assert_eq!(f.len(), 1);
        assert!(f.contains("web"));
        assert!(!f.contains("clock"));
    }

    #[test]
    fn test_readded_type_starts_from_defaults() {
        let prior = Formation::from_processes([process("web", "./web", 2, CONSTRAINTS_1X)]);
        let without_clock =
            Formation::reconcile(Some(&prior), &CommandMap::from_declaration([("web", "./web")]));
        let f = Formation::reconcile(
            Some(&without_clock),
            &CommandMap::from_declaration([("web", "./web"), ("clock", "./clock")]),
        );
        assert_eq!(f.get("clock").unwrap().quantity, 0);
    }

    #[test]
    fn test_empty_prior_equals_absent_prior() {
        let commands = CommandMap::from_declaration([("web", "./web")]);
        assert_eq!(
            Formation::reconcile(Some(&Formation::default()), &commands),
            Formation::reconcile(None, &commands)
        );
    }

    #[test]
    fn test_reconcile_does_not_carry_ids_or_port() {
        let mut prior = Formation::from_processes([process("web", "./web", 2, CONSTRAINTS_1X)]);
        prior.bind_release(ReleaseId::new());
        let f =
            Formation::reconcile(Some(&prior), &CommandMap::from_declaration([("web", "./web")]));
        let web = f.get("web").unwrap();
        assert_eq!(web.release_id, None);
        assert_eq!(web.id, None);
        assert_eq!(web.port, None);
    }

    #[test]
    fn test_from_processes_last_wins() {
        let f = Formation::from_processes([
            process("web", "./first", 1, CONSTRAINTS_1X),
            process("web", "./second", 5, CONSTRAINTS_2X),
        ]);
        assert_eq!(f.len(), 1);
        assert_eq!(f.get("web").unwrap().command.as_str(), "./second");
    }

    #[test]
    fn test_entries_keyed_by_own_type() {
        let f = Formation::from_processes([
            process("web", "./web", 1, CONSTRAINTS_1X),
            process("worker", "./worker", 0, CONSTRAINTS_1X),
        ]);
        for (t, p) in f.iter() {
            assert_eq!(t, &p.process_type);
        }
        assert_eq!(f.processes().len(), 2);
    }

    #[test]
    fn test_bind_release_assigns_distinct_ids() {
        let release_id = ReleaseId::new();
        let mut f = Formation::reconcile(
            None,
            &CommandMap::from_declaration([("web", "./web"), ("worker", "./worker")]),
        );
        f.bind_release(release_id);

        let processes = f.processes();
        assert!(processes.iter().all(|p| p.release_id == Some(release_id)));
        assert!(processes.iter().all(|p| p.id.is_some()));
        assert_ne!(processes[0].id, processes[1].id);
    }

    #[test]
    fn test_scale_updates_only_given_fields() {
        let mut f = Formation::reconcile(None, &CommandMap::from_declaration([("web", "./web")]));

        let web = f.scale("web", Some(4), None).unwrap();
        assert_eq!(web.quantity, 4);
        assert_eq!(web.constraints, CONSTRAINTS_1X);

        let size = parse_constraints("").unwrap();
        let web = f.scale("web", None, size).unwrap();
        assert_eq!(web.constraints, CONSTRAINTS_1X);

        let web = f.scale("web", None, Some(CONSTRAINTS_PX)).unwrap();
        assert_eq!(web.quantity, 4);
        assert_eq!(web.constraints, CONSTRAINTS_PX);
    }

    #[test]
    fn test_scale_unknown_type() {
        let mut f = Formation::default();
        assert_eq!(
            f.scale("worker", Some(1), None).unwrap_err(),
            FormationError::UnknownProcessType("worker".into())
        );
    }

    #[test]
    fn test_quantities() {
        let f = Formation::reconcile(
            None,
            &CommandMap::from_declaration([("web", "./web"), ("worker", "./worker")]),
        );
        let q = f.quantities();
        assert_eq!(q.get("web"), Some(&1));
        assert_eq!(q.get("worker"), Some(&0));
    }
}
