use crate::pkg::internal::{adaptors::jobs::spec::JobCollection, store::JobStore};

pub struct JobSelector<'a> {
    store: &'a JobStore,
}

impl<'a> JobSelector<'a> {
    pub fn new(store: &'a JobStore) -> Self {
        JobSelector { store }
    }

    pub async fn get_all(&self) -> JobCollection {
        self.store.current().await
    }

    pub async fn count(&self) -> usize {
        self.store.current().await.len()
    }
}
