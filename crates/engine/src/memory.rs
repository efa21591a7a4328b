//! In-process [`QueueStore`] implementation.
//!
//! All state sits behind one `std::sync::Mutex`; no lock is held across an
//! `.await`. Ticket ids come from a monotonic counter and are never reused.
//!
//! [`QueueStore`]: boothline_core::store::QueueStore

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use boothline_core::error::StoreError;
use boothline_core::eta::{position, sort_queue};
use boothline_core::point::{Point, PointSpec};
use boothline_core::settings::Settings;
use boothline_core::store::{
    DeleteOutcome, InsertOutcome, PointRegistry, SettingsStore, StoreResult, TicketStore,
    Transition,
};
use boothline_core::ticket::{Ticket, TicketStatus};
use boothline_core::types::DbId;
use chrono::Utc;

#[derive(Default)]
struct State {
    points: BTreeMap<DbId, Point>,
    tickets: BTreeMap<DbId, Ticket>,
    last_point_id: DbId,
    last_ticket_id: DbId,
    settings: Settings,
}

impl State {
    fn active(&self) -> impl Iterator<Item = &Ticket> {
        self.tickets.values().filter(|t| t.is_active())
    }

    fn active_for_point(&self, point_id: DbId) -> Vec<Ticket> {
        let mut queue: Vec<Ticket> = self
            .active()
            .filter(|t| t.point_id == point_id)
            .cloned()
            .collect();
        sort_queue(&mut queue);
        queue
    }

    fn queued_at(&self, point_id: DbId) -> u32 {
        self.active().filter(|t| t.point_id == point_id).count() as u32
    }

    fn finish(&mut self, ticket_id: DbId, status: TicketStatus) -> Option<Transition> {
        let ticket = self.tickets.get_mut(&ticket_id)?;
        if !ticket.is_active() {
            return None;
        }
        ticket.status = status;
        ticket.finished_at = Some(Utc::now());
        let ticket = ticket.clone();
        let queued = self.queued_at(ticket.point_id);
        Some(Transition { ticket, queued })
    }
}

/// Queue store kept entirely in memory.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> StoreResult<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| StoreError::Backend("memory store mutex poisoned".into()))
    }
}

#[async_trait]
impl PointRegistry for MemoryStore {
    async fn get_point(&self, id: DbId) -> StoreResult<Option<Point>> {
        Ok(self.state()?.points.get(&id).cloned())
    }

    async fn list_points(&self, include_inactive: bool) -> StoreResult<Vec<Point>> {
        Ok(self
            .state()?
            .points
            .values()
            .filter(|p| include_inactive || p.is_active)
            .cloned()
            .collect())
    }

    async fn create_point(&self, spec: &PointSpec) -> StoreResult<Point> {
        let mut state = self.state()?;
        state.last_point_id += 1;
        let point = Point {
            id: state.last_point_id,
            name: spec.name.clone(),
            sector: spec.sector.clone(),
            description: spec.description.clone(),
            avg_service_time_sec: spec.avg_service_time_sec,
            max_queue: spec.max_queue,
            is_active: spec.is_active.unwrap_or(true),
            created_at: Utc::now(),
        };
        state.points.insert(point.id, point.clone());
        Ok(point)
    }

    async fn update_point(&self, id: DbId, spec: &PointSpec) -> StoreResult<Option<Point>> {
        let mut state = self.state()?;
        let Some(point) = state.points.get_mut(&id) else {
            return Ok(None);
        };
        point.name = spec.name.clone();
        point.sector = spec.sector.clone();
        point.description = spec.description.clone();
        point.avg_service_time_sec = spec.avg_service_time_sec;
        point.max_queue = spec.max_queue;
        if let Some(active) = spec.is_active {
            point.is_active = active;
        }
        Ok(Some(point.clone()))
    }

    async fn set_point_active(&self, id: DbId, is_active: bool) -> StoreResult<Option<Point>> {
        let mut state = self.state()?;
        Ok(state.points.get_mut(&id).map(|point| {
            point.is_active = is_active;
            point.clone()
        }))
    }

    async fn delete_point(&self, id: DbId) -> StoreResult<DeleteOutcome> {
        let mut state = self.state()?;
        if !state.points.contains_key(&id) {
            return Ok(DeleteOutcome::NotFound);
        }
        let tickets = state.tickets.values().filter(|t| t.point_id == id).count() as u64;
        if tickets > 0 {
            return Ok(DeleteOutcome::Referenced { tickets });
        }
        state.points.remove(&id);
        Ok(DeleteOutcome::Deleted)
    }
}

#[async_trait]
impl TicketStore for MemoryStore {
    async fn active_tickets_for_point(&self, point_id: DbId) -> StoreResult<Vec<Ticket>> {
        Ok(self.state()?.active_for_point(point_id))
    }

    async fn active_tickets_for_user(&self, user_id: &str) -> StoreResult<Vec<Ticket>> {
        let state = self.state()?;
        let mut tickets: Vec<Ticket> = state
            .active()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        sort_queue(&mut tickets);
        Ok(tickets)
    }

    async fn find_active(&self, user_id: &str, point_id: DbId) -> StoreResult<Option<Ticket>> {
        Ok(self
            .state()?
            .active()
            .find(|t| t.user_id == user_id && t.point_id == point_id)
            .cloned())
    }

    async fn find_ticket(&self, ticket_id: DbId) -> StoreResult<Option<Ticket>> {
        Ok(self.state()?.tickets.get(&ticket_id).cloned())
    }

    async fn active_counts(&self) -> StoreResult<HashMap<DbId, u32>> {
        let state = self.state()?;
        let mut counts = HashMap::new();
        for ticket in state.active() {
            *counts.entry(ticket.point_id).or_insert(0) += 1;
        }
        Ok(counts)
    }

    async fn insert(&self, user_id: &str, point_id: DbId) -> StoreResult<InsertOutcome> {
        let mut state = self.state()?;

        let Some(point) = state.points.get(&point_id).filter(|p| p.is_active) else {
            return Ok(InsertOutcome::PointClosed);
        };
        let max_queue = point.max_queue;

        if let Some(existing) = state
            .active()
            .find(|t| t.user_id == user_id && t.point_id == point_id)
        {
            return Ok(InsertOutcome::AlreadyActive(existing.clone()));
        }

        let held = state.active().filter(|t| t.user_id == user_id).count();
        if !state.settings.allows_another(held) {
            return Ok(InsertOutcome::LimitReached {
                limit: state.settings.active_limit,
            });
        }

        let queued = state.queued_at(point_id);
        if max_queue > 0 && queued >= max_queue {
            return Ok(InsertOutcome::QueueFull { max_queue });
        }

        state.last_ticket_id += 1;
        let ticket = Ticket {
            id: state.last_ticket_id,
            user_id: user_id.to_string(),
            point_id,
            status: TicketStatus::Active,
            created_at: Utc::now(),
            finished_at: None,
        };
        state.tickets.insert(ticket.id, ticket.clone());
        let queue = state.active_for_point(point_id);
        Ok(InsertOutcome::Inserted {
            position: position(&queue, &ticket),
            queued: queued + 1,
            ticket,
        })
    }

    async fn cancel(&self, ticket_id: DbId, user_id: &str) -> StoreResult<Option<Transition>> {
        let mut state = self.state()?;
        let owned = state
            .tickets
            .get(&ticket_id)
            .is_some_and(|t| t.user_id == user_id);
        if !owned {
            return Ok(None);
        }
        Ok(state.finish(ticket_id, TicketStatus::Canceled))
    }

    async fn serve_next(&self, point_id: DbId) -> StoreResult<Option<Transition>> {
        let mut state = self.state()?;
        let Some(head) = state.active_for_point(point_id).first().map(|t| t.id) else {
            return Ok(None);
        };
        Ok(state.finish(head, TicketStatus::Served))
    }

    async fn mark_served(&self, ticket_id: DbId) -> StoreResult<Option<Transition>> {
        Ok(self.state()?.finish(ticket_id, TicketStatus::Served))
    }
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn get_settings(&self) -> StoreResult<Settings> {
        Ok(self.state()?.settings)
    }

    async fn save_settings(&self, settings: &Settings) -> StoreResult<()> {
        self.state()?.settings = *settings;
        Ok(())
    }
}
