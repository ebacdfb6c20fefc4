//! In-memory copy of the signed-in owner's appointments.
//!
//! Never mutated piecemeal: every write goes to the repository and the
//! whole list is reloaded afterwards, so readers see either the old or
//! the new collection. Reloads are serialized so a slower one can never
//! swap in an older list over a newer one.

use std::sync::{Mutex, RwLock};

use uuid::Uuid;

use crate::core_state::CoreError;
use crate::db::AppointmentRepository;
use crate::models::Appointment;

pub struct AppointmentBook {
    owner_id: Uuid,
    appointments: RwLock<Vec<Appointment>>,
    reload_lock: Mutex<()>,
}

impl AppointmentBook {
    pub fn new(owner_id: Uuid) -> Self {
        Self {
            owner_id,
            appointments: RwLock::new(Vec::new()),
            reload_lock: Mutex::new(()),
        }
    }

    pub fn owner_id(&self) -> Uuid {
        self.owner_id
    }

    /// Fetch the owner's full list and swap it in. The list is read and
    /// swapped under one guard.
    pub fn reload(&self, repo: &dyn AppointmentRepository) -> Result<usize, CoreError> {
        let _reloading = self.reload_lock.lock().map_err(|_| CoreError::LockPoisoned)?;
        let fresh = repo.list(&self.owner_id)?;
        let count = fresh.len();
        self.replace(fresh)?;
        tracing::debug!(owner_id = %self.owner_id, count, "Appointment book reloaded");
        Ok(count)
    }

    pub fn replace(&self, appointments: Vec<Appointment>) -> Result<(), CoreError> {
        let mut guard = self.appointments.write().map_err(|_| CoreError::LockPoisoned)?;
        *guard = appointments;
        Ok(())
    }

    pub fn snapshot(&self) -> Result<Vec<Appointment>, CoreError> {
        let guard = self.appointments.read().map_err(|_| CoreError::LockPoisoned)?;
        Ok(guard.clone())
    }

    pub fn find(&self, id: &Uuid) -> Result<Option<Appointment>, CoreError> {
        let guard = self.appointments.read().map_err(|_| CoreError::LockPoisoned)?;
        Ok(guard.iter().find(|a| a.id == *id).cloned())
    }

    /// Unpaid appointments in scheduled order. Paid ones live in the
    /// financial history only.
    pub fn upcoming(&self) -> Result<Vec<Appointment>, CoreError> {
        let guard = self.appointments.read().map_err(|_| CoreError::LockPoisoned)?;
        Ok(guard.iter().filter(|a| !a.is_paid()).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_user, Store};
    use crate::models::enums::PaymentState;
    use crate::models::*;
    use chrono::{TimeZone, Utc};

    fn seeded_store() -> (Store, Uuid) {
        let store = Store::open_in_memory().unwrap();
        let user = store
            .with_conn(|conn| {
                create_user(conn, &NewUser {
                    email: "ana@example.com".into(),
                    password: "secreto123".into(),
                    business_name: "Salon Ana".into(),
                })
            })
            .unwrap();
        (store, user.id)
    }

    fn new_appt(owner_id: Uuid, client: &str, day: u32) -> NewAppointment {
        NewAppointment {
            owner_id,
            client_name: client.into(),
            scheduled_at: Utc.with_ymd_and_hms(2024, 6, day, 15, 0, 0).unwrap(),
            task: None,
            estimated_price: Some(100.0),
        }
    }

    #[test]
    fn reload_replaces_the_whole_list() {
        let (store, owner) = seeded_store();
        let book = AppointmentBook::new(owner);
        store.create(&new_appt(owner, "Ana", 2)).unwrap();
        assert_eq!(book.reload(&store).unwrap(), 1);

        store.create(&new_appt(owner, "Luz", 1)).unwrap();
        assert_eq!(book.snapshot().unwrap().len(), 1);
        book.reload(&store).unwrap();

        let names: Vec<_> = book.snapshot().unwrap().into_iter().map(|a| a.client_name).collect();
        assert_eq!(names, vec!["Luz", "Ana"]);
    }

    #[test]
    fn upcoming_hides_paid() {
        let (store, owner) = seeded_store();
        let paid = store.create(&new_appt(owner, "Ana", 1)).unwrap();
        store.create(&new_appt(owner, "Luz", 2)).unwrap();
        store
            .update(&paid, &AppointmentPatch {
                payment: Some(PaymentState::Paid),
                ..AppointmentPatch::default()
            })
            .unwrap();

        let book = AppointmentBook::new(owner);
        book.reload(&store).unwrap();
        let upcoming = book.upcoming().unwrap();
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].client_name, "Luz");
        assert!(book.find(&paid).unwrap().is_some());
    }

    /// Lists, tells the test it has read, then stalls before returning.
    struct SlowListing<'a> {
        store: &'a Store,
        listed: std::sync::mpsc::Sender<()>,
    }

    impl AppointmentRepository for SlowListing<'_> {
        fn list(&self, owner_id: &Uuid) -> Result<Vec<Appointment>, crate::db::DatabaseError> {
            let rows = self.store.list(owner_id)?;
            let _ = self.listed.send(());
            std::thread::sleep(std::time::Duration::from_millis(200));
            Ok(rows)
        }
        fn get(&self, id: &Uuid) -> Result<Option<Appointment>, crate::db::DatabaseError> {
            self.store.get(id)
        }
        fn create(&self, appointment: &NewAppointment) -> Result<Uuid, crate::db::DatabaseError> {
            self.store.create(appointment)
        }
        fn update(&self, id: &Uuid, patch: &AppointmentPatch) -> Result<(), crate::db::DatabaseError> {
            self.store.update(id, patch)
        }
        fn delete(&self, id: &Uuid) -> Result<(), crate::db::DatabaseError> {
            self.store.delete(id)
        }
    }

    #[test]
    fn overlapping_reloads_keep_the_latest_write() {
        let (store, owner) = seeded_store();
        let id = store.create(&new_appt(owner, "Ana", 2)).unwrap();
        let book = AppointmentBook::new(owner);
        let (listed_tx, listed_rx) = std::sync::mpsc::channel();
        let slow = SlowListing {
            store: &store,
            listed: listed_tx,
        };

        std::thread::scope(|scope| {
            let stale = scope.spawn(|| book.reload(&slow).unwrap());
            listed_rx.recv().unwrap();

            store
                .update(&id, &AppointmentPatch {
                    estimated_price: Some(Some(250.0)),
                    ..AppointmentPatch::default()
                })
                .unwrap();
            book.reload(&store).unwrap();
            stale.join().unwrap();
        });

        let price = book.find(&id).unwrap().unwrap().estimated_price;
        assert_eq!(price, Some(250.0));
    }
}
