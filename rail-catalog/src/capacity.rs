use crate::{CatalogError, Train};

impl Train {
    /// Seats to seed a new ledger row with for `class`.
    ///
    /// Falls back to `total_seats` when the class has no entry of its own.
    pub fn seat_capacity(&self, class: &str) -> Result<u32, CatalogError> {
        match self.classes.get(class) {
            Some(&seats) if seats > 0 => Ok(seats),
            _ if self.total_seats > 0 => Ok(self.total_seats),
            _ => Err(CatalogError::MissingCapacity {
                train_no: self.train_no.clone(),
                class: class.to_string(),
            }),
        }
    }
}
