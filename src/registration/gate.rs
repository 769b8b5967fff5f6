//! Bounded-concurrency gate in front of a registration checker.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;

use crate::error::{AppError, Result};
use crate::registration::RegistrationChecker;

/// Runs registration checks with at most `capacity` in flight.
///
/// The permit is an owned guard, so it is returned on success, failure,
/// timeout and panic alike.
pub struct RegistrationGate {
    checker: Arc<dyn RegistrationChecker>,
    semaphore: Arc<Semaphore>,
    capacity: usize,
    timeout: Option<Duration>,
}

impl RegistrationGate {
    pub fn new(checker: Arc<dyn RegistrationChecker>, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            checker,
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
            timeout: None,
        }
    }

    /// Give every check a deadline; a timeout counts as a failed check.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots not currently held by a check.
    pub fn available_slots(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Run one check inside a slot.
    pub async fn check(&self, link: &str) -> Result<bool> {
        let _permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| AppError::config("registration gate is closed"))?;

        log::debug!("Checking registration status for {}", link);
        let result = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, self.checker.check(link)).await {
                Ok(result) => result,
                Err(_) => Err(AppError::timeout(format!(
                    "registration check for {} exceeded {}s",
                    link,
                    limit.as_secs_f32()
                ))),
            },
            None => self.checker.check(link).await,
        };
        log::debug!("Finished checking registration status for {}", link);
        result
    }
}
