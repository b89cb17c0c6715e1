use crate::entities::user;
use crate::error::ApiError;

/// Capability checked before a mutating operation.
#[derive(Clone, Copy, Debug)]
pub enum Action {
    /// Create/update/delete categories and authors, list users.
    ManageCatalog,
    /// Create/update/delete books.
    PublishBook,
    /// Mutate a record owned by `owner_id` (review, order, payment).
    AccessOwned { owner_id: i32 },
}

/// Explicit capability check, evaluated by handlers before every mutating
/// operation. Identity is always passed in, never pulled from ambient state.
pub fn authorize(actor: &user::Model, action: Action) -> Result<(), ApiError> {
    let allowed = match action {
        Action::ManageCatalog => actor.is_staff,
        Action::PublishBook => actor.is_seller || actor.is_staff,
        Action::AccessOwned { owner_id } => actor.is_staff || actor.id == owner_id,
    };

    if allowed {
        Ok(())
    } else {
        Err(ApiError::Permission(format!(
            "User {} is not allowed to perform this operation",
            actor.id
        )))
    }
}

/// Read scope for listings: staff (and sellers, for orders) see everything,
/// everyone else only their own records.
pub fn sees_all_orders(actor: &user::Model) -> bool {
    actor.is_staff || actor.is_seller
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: i32, is_seller: bool, is_staff: bool) -> user::Model {
        user::Model {
            id,
            username: format!("u{}", id),
            email: format!("u{}@example.com", id),
            password: String::new(),
            phone_number: None,
            is_seller,
            is_staff,
        }
    }

    #[test]
    fn staff_manages_catalog() {
        assert!(authorize(&user(1, false, true), Action::ManageCatalog).is_ok());
        assert!(authorize(&user(1, true, false), Action::ManageCatalog).is_err());
        assert!(authorize(&user(1, false, false), Action::ManageCatalog).is_err());
    }

    #[test]
    fn sellers_and_staff_publish_books() {
        assert!(authorize(&user(1, true, false), Action::PublishBook).is_ok());
        assert!(authorize(&user(1, false, true), Action::PublishBook).is_ok());
        assert!(authorize(&user(1, false, false), Action::PublishBook).is_err());
    }

    #[test]
    fn owned_records_need_owner_or_staff() {
        assert!(authorize(&user(7, false, false), Action::AccessOwned { owner_id: 7 }).is_ok());
        assert!(authorize(&user(7, false, false), Action::AccessOwned { owner_id: 8 }).is_err());
        assert!(authorize(&user(1, false, true), Action::AccessOwned { owner_id: 8 }).is_ok());
    }
}
