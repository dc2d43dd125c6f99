use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::{
    repository::Entity,
    services::{AnonymousUser, Clock, CurrentUser, SystemClock},
};

/// Entities that remember who created them and who changed them last.
///
/// Opt in by implementing this and returning `Some(self)` from
/// [`Entity::as_auditable_mut`]; command repositories then stamp the entity
/// on `add` and `update`.
pub trait Auditable {
    fn stamp_created(&mut self, by: Option<String>, at: DateTime<Utc>);
    fn stamp_modified(&mut self, by: Option<String>, at: DateTime<Utc>);
}

/// The acting user and clock of one unit of work.
#[derive(Clone)]
pub struct ChangeStamper {
    user: Arc<dyn CurrentUser>,
    clock: Arc<dyn Clock>,
}

impl ChangeStamper {
    pub fn new(user: Arc<dyn CurrentUser>, clock: Arc<dyn Clock>) -> Self {
        Self { user, clock }
    }

    pub fn on_added<T: Entity>(&self, entity: &mut T) {
        if let Some(auditable) = entity.as_auditable_mut() {
            auditable.stamp_created(self.user.user_id(), self.clock.now_utc());
        }
    }

    /// Leaves the creation stamp alone.
    pub fn on_modified<T: Entity>(&self, entity: &mut T) {
        if let Some(auditable) = entity.as_auditable_mut() {
            auditable.stamp_modified(self.user.user_id(), self.clock.now_utc());
        }
    }
}

/// Anonymous user, system clock.
impl Default for ChangeStamper {
    fn default() -> Self {
        Self::new(Arc::new(AnonymousUser), Arc::new(SystemClock))
    }
}
