//! Clients and technicians lookup

use crate::{
    error::AppResult,
    models::person::{Client, Technician},
    repository::Repository,
};

#[derive(Clone)]
pub struct PersonsService {
    repository: Repository,
}

impl PersonsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn get_client(&self, id: i32) -> AppResult<Client> {
        self.repository.persons.get_client(id).await
    }

    pub async fn get_technician(&self, id: i32) -> AppResult<Technician> {
        self.repository.persons.get_technician(id).await
    }
}
