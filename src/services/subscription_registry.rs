use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::citizen_subscription::{CitizenSubscription, NotificationPreferences};
use crate::store::{NewCitizenSubscription, Store};

/// Per-incident lock guarding subscribe/unsubscribe while allowing parallel
/// reads; rebuildable from the store on restart since it only caches what
/// is already persisted.
pub struct SubscriptionRegistry {
    store: Arc<dyn Store>,
    locks: RwLock<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl SubscriptionRegistry {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            locks: RwLock::new(HashMap::new()),
        }
    }

    async fn lock_for(&self, incident_id: Uuid) -> Arc<Mutex<()>> {
        if let Some(lock) = self.locks.read().await.get(&incident_id) {
            return lock.clone();
        }
        let mut locks = self.locks.write().await;
        locks.entry(incident_id).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
    }

    pub async fn subscribe(
        &self,
        incident_id: Uuid,
        push_token: Option<String>,
        email: Option<String>,
        phone: Option<String>,
        preferences: NotificationPreferences,
    ) -> AppResult<CitizenSubscription> {
        let lock = self.lock_for(incident_id).await;
        let _guard = lock.lock().await;

        self.store
            .create_subscription(NewCitizenSubscription {
                incident_id,
                push_token,
                email,
                phone,
                preferences,
            })
            .await
    }

    pub async fn unsubscribe(&self, incident_id: Uuid, subscription_id: Uuid) -> AppResult<()> {
        let lock = self.lock_for(incident_id).await;
        let _guard = lock.lock().await;
        self.store.deactivate_subscription(subscription_id).await
    }

    pub async fn list_active(&self, incident_id: Uuid) -> AppResult<Vec<CitizenSubscription>> {
        self.store.subscriptions_for_incident(incident_id).await
    }
}
