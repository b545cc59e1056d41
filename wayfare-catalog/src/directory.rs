use std::collections::HashMap;

use tokio::sync::RwLock;
use uuid::Uuid;
use wayfare_domain::Tour;

/// Registry of listed tours; the booking core reads price and ownership from
/// here and never writes back.
pub struct TourDirectory {
    tours: RwLock<HashMap<Uuid, Tour>>,
}

impl TourDirectory {
    pub fn new() -> Self {
        Self {
            tours: RwLock::new(HashMap::new()),
        }
    }

    pub async fn add(&self, tour: Tour) {
        self.tours.write().await.insert(tour.id, tour);
    }

    pub async fn get(&self, tour_id: Uuid) -> Option<Tour> {
        self.tours.read().await.get(&tour_id).cloned()
    }
}

impl Default for TourDirectory {
    fn default() -> Self {
        Self::new()
    }
}
