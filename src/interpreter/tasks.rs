//! Background task registry for the async builtins.
//!
//! Tasks run on detached worker threads and report through a channel.
//! Readiness checks never block; `take` blocks until the worker reports.
//! Task ids are positive and never reused. Dropping the registry discards
//! outstanding tasks without awaiting them.

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use super::error::RuntimeError;
use super::value::Value;

pub type TaskOutcome = Result<Value, RuntimeError>;

struct TaskHandle {
    receiver: Receiver<TaskOutcome>,
    outcome: Option<TaskOutcome>,
}

/// Registry of in-flight background tasks
pub struct TaskRegistry {
    tasks: HashMap<i64, TaskHandle>,
    next_id: i64,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self {
            tasks: HashMap::new(),
            next_id: 1,
        }
    }

    /// Launch a job on a worker thread and return its task id.
    pub fn spawn<F>(&mut self, job: F) -> i64
    where
        F: FnOnce() -> TaskOutcome + Send + 'static,
    {
        let (sender, receiver) = mpsc::channel();
        thread::spawn(move || {
            let _ = sender.send(job());
        });

        let task_id = self.next_id;
        self.next_id += 1;
        self.tasks.insert(
            task_id,
            TaskHandle {
                receiver,
                outcome: None,
            },
        );
        task_id
    }

    /// Non-blocking readiness check. `None` when the id is unknown.
    pub fn ready(&mut self, task_id: i64) -> Option<bool> {
        let handle = self.tasks.get_mut(&task_id)?;

        if handle.outcome.is_some() {
            return Some(true);
        }

        match handle.receiver.try_recv() {
            Ok(outcome) => {
                handle.outcome = Some(outcome);
                Some(true)
            }
            Err(TryRecvError::Empty) => Some(false),
            Err(TryRecvError::Disconnected) => {
                handle.outcome = Some(Err(RuntimeError::internal("task worker terminated")));
                Some(true)
            }
        }
    }

    /// Block until the task completes, remove it, and return its outcome.
    /// `None` when the id is unknown.
    pub fn take(&mut self, task_id: i64) -> Option<TaskOutcome> {
        let handle = self.tasks.remove(&task_id)?;

        if let Some(outcome) = handle.outcome {
            return Some(outcome);
        }

        Some(
            handle
                .receiver
                .recv()
                .unwrap_or_else(|_| Err(RuntimeError::internal("task worker terminated"))),
        )
    }
}

impl Default for TaskRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn ids_start_at_one_and_never_repeat() {
        let mut registry = TaskRegistry::new();
        let first = registry.spawn(|| Ok(Value::Int(1)));
        let second = registry.spawn(|| Ok(Value::Int(2)));
        assert_eq!(first, 1);
        assert_eq!(second, 2);

        registry.take(first).unwrap().unwrap();
        let third = registry.spawn(|| Ok(Value::Int(3)));
        assert_eq!(third, 3);
    }

    #[test]
    fn take_blocks_until_the_outcome_arrives() {
        let mut registry = TaskRegistry::new();
        let id = registry.spawn(|| {
            thread::sleep(Duration::from_millis(20));
            Ok(Value::Str("done".into()))
        });

        let outcome = registry.take(id).unwrap().unwrap();
        assert_eq!(outcome, Value::Str("done".into()));
        assert!(registry.take(id).is_none());
    }

    #[test]
    fn ready_is_non_blocking_and_idempotent() {
        let mut registry = TaskRegistry::new();
        let id = registry.spawn(|| {
            thread::sleep(Duration::from_millis(30));
            Ok(Value::Int(7))
        });

        // May or may not be ready yet; must answer immediately either way.
        let _ = registry.ready(id).unwrap();

        thread::sleep(Duration::from_millis(60));
        assert_eq!(registry.ready(id), Some(true));
        assert_eq!(registry.ready(id), Some(true));
        assert_eq!(registry.take(id).unwrap().unwrap(), Value::Int(7));
    }

    #[test]
    fn unknown_ids_are_reported() {
        let mut registry = TaskRegistry::new();
        assert!(registry.ready(99).is_none());
        assert!(registry.take(99).is_none());
    }
}
