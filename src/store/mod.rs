use std::fmt;
use std::sync::{Arc, Mutex, Weak};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};
use tracing::warn;
use uuid::Uuid;

use crate::engine::earnings_for_stop_count;
use crate::error::AppError;
use crate::geo::path_length_km;
use crate::models::route::Route;
use crate::models::stop::{DeliveryStop, StopStatus};
use crate::models::user::UserProfile;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Deliveries,
    Routes,
    Users,
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Collection::Deliveries => "deliveries",
            Collection::Routes => "routes",
            Collection::Users => "users",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct ChangeEvent {
    pub collection: Collection,
    pub key: Uuid,
}

/// Full contents of one collection. Each snapshot replaces the previous one.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub collection: Collection,
    pub taken_at: DateTime<Utc>,
    pub records: Vec<serde_json::Value>,
}

pub struct DataStore {
    deliveries: DashMap<Uuid, DeliveryStop>,
    routes: DashMap<Uuid, Route>,
    users: DashMap<Uuid, UserProfile>,
    changes_tx: broadcast::Sender<ChangeEvent>,
    // Serialises status transitions so two routes cannot claim one stop.
    accept_lock: Mutex<()>,
}

impl DataStore {
    pub fn new(event_buffer_size: usize) -> Self {
        let (changes_tx, _unused_rx) = broadcast::channel(event_buffer_size);
        Self {
            deliveries: DashMap::new(),
            routes: DashMap::new(),
            users: DashMap::new(),
            changes_tx,
            accept_lock: Mutex::new(()),
        }
    }

    pub fn put_delivery(&self, stop: DeliveryStop) {
        let key = stop.id;
        self.deliveries.insert(key, stop);
        self.publish(Collection::Deliveries, key);
    }

    pub fn delivery(&self, id: &Uuid) -> Option<DeliveryStop> {
        self.deliveries.get(id).map(|entry| entry.value().clone())
    }

    /// All stops, oldest first.
    pub fn deliveries(&self) -> Vec<DeliveryStop> {
        let mut stops: Vec<DeliveryStop> = self
            .deliveries
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        stops.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        stops
    }

    pub fn pending_deliveries(&self) -> Vec<DeliveryStop> {
        self.deliveries()
            .into_iter()
            .filter(DeliveryStop::is_pending)
            .collect()
    }

    pub fn put_route(&self, route: Route) {
        let key = route.id;
        self.routes.insert(key, route);
        self.publish(Collection::Routes, key);
    }

    pub fn route(&self, id: &Uuid) -> Option<Route> {
        self.routes.get(id).map(|entry| entry.value().clone())
    }

    pub fn routes(&self) -> Vec<Route> {
        let mut routes: Vec<Route> = self
            .routes
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        routes.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        routes
    }

    pub fn put_user(&self, user: UserProfile) {
        let key = user.id;
        self.users.insert(key, user);
        self.publish(Collection::Users, key);
    }

    pub fn user(&self, id: &Uuid) -> Option<UserProfile> {
        self.users.get(id).map(|entry| entry.value().clone())
    }

    pub fn update_user<F>(&self, id: &Uuid, update: F) -> Result<UserProfile, AppError>
    where
        F: FnOnce(&mut UserProfile),
    {
        let updated = {
            let mut user = self
                .users
                .get_mut(id)
                .ok_or_else(|| AppError::NotFound(format!("user {id} not found")))?;
            update(user.value_mut());
            user.clone()
        };
        self.publish(Collection::Users, *id);
        Ok(updated)
    }

    pub fn count(&self, collection: Collection) -> usize {
        match collection {
            Collection::Deliveries => self.deliveries.len(),
            Collection::Routes => self.routes.len(),
            Collection::Users => self.users.len(),
        }
    }

    /// Marks a pending stop as accepted. With a `route_id` the stop is also
    /// appended to that route, whose polyline, distance and earnings are
    /// recomputed at `price_per_stop`.
    pub fn accept_stop(
        &self,
        id: &Uuid,
        route_id: Option<Uuid>,
        price_per_stop: f64,
    ) -> Result<DeliveryStop, AppError> {
        let _guard = self
            .accept_lock
            .lock()
            .map_err(|err| AppError::Internal(format!("accept lock poisoned: {err}")))?;

        if let Some(route_id) = route_id {
            if !self.routes.contains_key(&route_id) {
                return Err(AppError::NotFound(format!("route {route_id} not found")));
            }
        }

        let accepted = {
            let mut stop = self
                .deliveries
                .get_mut(id)
                .ok_or_else(|| AppError::NotFound(format!("delivery {id} not found")))?;
            if stop.status != StopStatus::Pending {
                return Err(AppError::Conflict(format!(
                    "delivery {id} is already accepted"
                )));
            }
            stop.status = StopStatus::Accepted;
            stop.route_id = route_id;
            stop.clone()
        };

        if let Some(route_id) = route_id {
            if let Some(mut route) = self.routes.get_mut(&route_id) {
                route.ordered_stops.push(accepted.id);
                route.polyline.push(accepted.pickup_coordinate);
                route.total_distance_km = path_length_km(&route.polyline);
                route.estimated_earnings =
                    earnings_for_stop_count(route.ordered_stops.len(), price_per_stop);
            }
            self.publish(Collection::Routes, route_id);
        }

        self.publish(Collection::Deliveries, *id);
        Ok(accepted)
    }

    /// Stores `route`, accepts every stop on it and makes it the user's
    /// current route. Nothing is written if any stop is no longer pending.
    pub fn commit_route(&self, user_id: &Uuid, route: Route) -> Result<Route, AppError> {
        if !self.users.contains_key(user_id) {
            return Err(AppError::NotFound(format!("user {user_id} not found")));
        }

        {
            let _guard = self
                .accept_lock
                .lock()
                .map_err(|err| AppError::Internal(format!("accept lock poisoned: {err}")))?;

            for stop_id in &route.ordered_stops {
                let pending = self
                    .deliveries
                    .get(stop_id)
                    .is_some_and(|stop| stop.is_pending());
                if !pending {
                    return Err(AppError::Conflict(format!(
                        "delivery {stop_id} is no longer pending; plan the route again"
                    )));
                }
            }

            for stop_id in &route.ordered_stops {
                if let Some(mut stop) = self.deliveries.get_mut(stop_id) {
                    stop.status = StopStatus::Accepted;
                    stop.route_id = Some(route.id);
                }
            }
        }

        for stop_id in &route.ordered_stops {
            self.publish(Collection::Deliveries, *stop_id);
        }
        self.put_route(route.clone());
        self.update_user(user_id, |user| user.current_route_id = Some(route.id))?;

        Ok(route)
    }

    pub fn snapshot(&self, collection: Collection) -> Snapshot {
        let records = match collection {
            Collection::Deliveries => to_records(&self.deliveries()),
            Collection::Routes => to_records(&self.routes()),
            Collection::Users => {
                let users: Vec<UserProfile> =
                    self.users.iter().map(|entry| entry.value().clone()).collect();
                to_records(&users)
            }
        };

        Snapshot {
            collection,
            taken_at: Utc::now(),
            records,
        }
    }

    /// The current snapshot, then a fresh one after every change to
    /// `collection`. Ends once the last `Arc<DataStore>` is dropped, since
    /// the stream only holds a weak reference and the change channel closes
    /// with the store.
    pub fn subscribe(
        self: &Arc<Self>,
        collection: Collection,
    ) -> impl Stream<Item = Snapshot> + Send + use<> {
        let rx = self.changes_tx.subscribe();
        let initial = self.snapshot(collection);
        let store: Weak<Self> = Arc::downgrade(self);

        let updates = BroadcastStream::new(rx).filter_map(move |event| {
            let store = store.upgrade()?;
            match event {
                Ok(change) if change.collection == collection => {
                    Some(store.snapshot(collection))
                }
                Ok(_) => None,
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    warn!(%collection, skipped, "subscriber lagged; resending snapshot");
                    Some(store.snapshot(collection))
                }
            }
        });

        tokio_stream::once(initial).chain(updates)
    }

    fn publish(&self, collection: Collection, key: Uuid) {
        // No receivers is fine; nobody is watching.
        let _ = self.changes_tx.send(ChangeEvent { collection, key });
    }
}

fn to_records<T: Serialize>(items: &[T]) -> Vec<serde_json::Value> {
    items
        .iter()
        .filter_map(|item| match serde_json::to_value(item) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(error = %err, "failed to serialize record for snapshot");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio_stream::StreamExt;

    use super::{Collection, DataStore};
    use crate::error::AppError;
    use crate::models::coordinate::Coordinate;
    use crate::models::route::Route;
    use crate::models::stop::{Cargo, DeliveryStop, StopStatus};
    use crate::models::user::{Role, UserProfile};

    fn stop(details: &str) -> DeliveryStop {
        DeliveryStop::new(
            Coordinate::new(55.4, 10.38),
            "Odense, Denmark".to_string(),
            details.to_string(),
            Cargo {
                weight_kg: 10.0,
                height_cm: 10.0,
                width_cm: 10.0,
                length_cm: 10.0,
            },
        )
    }

    fn route_over(stops: &[&DeliveryStop]) -> Route {
        let mut route = Route::empty(Coordinate::new(55.676, 12.568));
        route.ordered_stops = stops.iter().map(|s| s.id).collect();
        route.polyline.extend(stops.iter().map(|s| s.pickup_coordinate));
        route
    }

    #[test]
    fn accepting_twice_conflicts() {
        let store = DataStore::new(16);
        let s = stop("boxes");
        store.put_delivery(s.clone());

        let accepted = store.accept_stop(&s.id, None, 250.0).unwrap();
        assert_eq!(accepted.status, StopStatus::Accepted);

        let err = store.accept_stop(&s.id, None, 250.0).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[test]
    fn accepting_unknown_stop_is_not_found() {
        let store = DataStore::new(16);
        let err = store.accept_stop(&uuid::Uuid::nil(), None, 250.0).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn commit_route_accepts_stops_and_sets_current_route() {
        let store = DataStore::new(16);
        let trucker = UserProfile::new(Role::Trucker);
        let a = stop("a");
        let b = stop("b");
        store.put_user(trucker.clone());
        store.put_delivery(a.clone());
        store.put_delivery(b.clone());

        let route = store.commit_route(&trucker.id, route_over(&[&a, &b])).unwrap();

        for id in [a.id, b.id] {
            let stored = store.delivery(&id).unwrap();
            assert_eq!(stored.status, StopStatus::Accepted);
            assert_eq!(stored.route_id, Some(route.id));
        }
        assert_eq!(store.user(&trucker.id).unwrap().current_route_id, Some(route.id));
        assert!(store.route(&route.id).is_some());
    }

    #[test]
    fn accepting_into_a_route_extends_it() {
        let store = DataStore::new(16);
        let trucker = UserProfile::new(Role::Trucker);
        let odense = stop("odense");
        let mut aarhus = stop("aarhus");
        aarhus.pickup_coordinate = Coordinate::new(56.1567, 10.2108);
        store.put_user(trucker.clone());
        store.put_delivery(odense.clone());
        store.put_delivery(aarhus.clone());

        let mut planned = route_over(&[&odense]);
        planned.estimated_earnings = 250.0;
        let committed = store.commit_route(&trucker.id, planned).unwrap();
        let distance_before = crate::geo::path_length_km(&committed.polyline);

        let accepted = store
            .accept_stop(&aarhus.id, Some(committed.id), 250.0)
            .unwrap();
        assert_eq!(accepted.route_id, Some(committed.id));

        let route = store.route(&committed.id).unwrap();
        assert_eq!(route.ordered_stops, vec![odense.id, aarhus.id]);
        assert_eq!(route.polyline.len(), 3);
        assert_eq!(route.polyline.last(), Some(&aarhus.pickup_coordinate));
        assert_eq!(route.estimated_earnings, 500.0);
        assert!(route.total_distance_km > distance_before);
    }

    #[test]
    fn accepting_into_unknown_route_leaves_stop_pending() {
        let store = DataStore::new(16);
        let s = stop("boxes");
        store.put_delivery(s.clone());

        let err = store
            .accept_stop(&s.id, Some(uuid::Uuid::new_v4()), 250.0)
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
        assert!(store.delivery(&s.id).unwrap().is_pending());
    }

    #[test]
    fn commit_route_with_taken_stop_writes_nothing() {
        let store = DataStore::new(16);
        let trucker = UserProfile::new(Role::Trucker);
        let a = stop("a");
        let b = stop("b");
        store.put_user(trucker.clone());
        store.put_delivery(a.clone());
        store.put_delivery(b.clone());
        store.accept_stop(&b.id, None, 250.0).unwrap();

        let err = store.commit_route(&trucker.id, route_over(&[&a, &b])).unwrap_err();

        assert!(matches!(err, AppError::Conflict(_)));
        assert!(store.delivery(&a.id).unwrap().is_pending());
        assert_eq!(store.count(Collection::Routes), 0);
        assert_eq!(store.user(&trucker.id).unwrap().current_route_id, None);
    }

    #[test]
    fn deliveries_come_back_oldest_first() {
        let store = DataStore::new(16);
        let first = stop("first");
        let mut second = stop("second");
        second.created_at = first.created_at + chrono::Duration::seconds(1);
        store.put_delivery(second.clone());
        store.put_delivery(first.clone());

        let ids: Vec<_> = store.deliveries().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);
    }

    #[tokio::test]
    async fn subscription_yields_current_then_full_snapshots() {
        let store = Arc::new(DataStore::new(16));
        store.put_delivery(stop("existing"));

        let mut snapshots = Box::pin(store.subscribe(Collection::Deliveries));

        let initial = snapshots.next().await.unwrap();
        assert_eq!(initial.records.len(), 1);

        store.put_user(UserProfile::new(Role::Company));
        store.put_delivery(stop("new"));

        let next = snapshots.next().await.unwrap();
        assert_eq!(next.collection, Collection::Deliveries);
        assert_eq!(next.records.len(), 2);
    }

    #[tokio::test]
    async fn subscription_ends_when_store_is_dropped() {
        let store = Arc::new(DataStore::new(16));
        let mut snapshots = Box::pin(store.subscribe(Collection::Routes));

        assert!(snapshots.next().await.is_some());
        drop(store);

        assert!(snapshots.next().await.is_none());
    }
}
