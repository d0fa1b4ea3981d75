//! Scoped role and warehouse switching
//!
//! Each guard records the value the session had before the switch and puts it
//! back in `Drop`, so the prior role or warehouse is restored on every exit
//! path: normal return, early `?` return and panic unwind. Restoration
//! failures are logged because `Drop` cannot report them.

use crate::error::DbResult;
use crate::traits::{current_role, current_warehouse, Session};

/// Restores the previous session role when dropped
#[must_use = "the previous role is restored as soon as the guard is dropped"]
pub struct RoleGuard<'a> {
    session: &'a dyn Session,
    previous: Option<String>,
}

impl<'a> RoleGuard<'a> {
    /// Switch the session to `role` unless it is already active (case-insensitive)
    pub fn switch(session: &'a dyn Session, role: &str) -> DbResult<Self> {
        let previous = current_role(session)?;
        if previous.eq_ignore_ascii_case(role) {
            return Ok(Self {
                session,
                previous: None,
            });
        }
        log::debug!("Switching to role: {}", role);
        session.execute(&format!("use role {}", role))?;
        Ok(Self {
            session,
            previous: Some(previous),
        })
    }

    /// Whether the guard changed the role and will restore it
    pub fn switched(&self) -> bool {
        self.previous.is_some()
    }
}

impl Drop for RoleGuard<'_> {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            log::debug!("Switching back to role: {}", previous);
            if let Err(e) = self.session.execute(&format!("use role {}", previous)) {
                log::warn!("Failed to restore role {}: {}", previous, e);
            }
        }
    }
}

/// Restores the previous session warehouse when dropped
#[must_use = "the previous warehouse is restored as soon as the guard is dropped"]
pub struct WarehouseGuard<'a> {
    session: &'a dyn Session,
    previous: Option<String>,
}

impl<'a> WarehouseGuard<'a> {
    /// Switch the session to `warehouse`; `None` leaves the session untouched
    pub fn switch(session: &'a dyn Session, warehouse: Option<&str>) -> DbResult<Self> {
        let mut guard = Self {
            session,
            previous: None,
        };
        let Some(warehouse) = warehouse else {
            return Ok(guard);
        };

        let previous = current_warehouse(session)?;
        if previous
            .as_deref()
            .is_some_and(|p| p.eq_ignore_ascii_case(warehouse))
        {
            return Ok(guard);
        }
        log::debug!("Using warehouse: {}", warehouse);
        session.execute(&format!("use warehouse {}", warehouse))?;
        guard.previous = previous;
        Ok(guard)
    }
}

impl Drop for WarehouseGuard<'_> {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            log::debug!("Switching back to warehouse: {}", previous);
            if let Err(e) = self
                .session
                .execute(&format!("use warehouse {}", previous))
            {
                log::warn!("Failed to restore warehouse {}: {}", previous, e);
            }
        }
    }
}

#[cfg(test)]
#[path = "guard_test.rs"]
mod tests;
