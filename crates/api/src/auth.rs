// Copyright (C) 2026 Rebook Systems
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Actor roles and authorization checks.
//!
//! Authentication itself is an external collaborator; the server
//! layer hands this crate an already-authenticated actor and the
//! handlers enforce what that actor may do.

use crate::error::ApiError;

/// Actor roles for authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Staff with review and refund authority.
    Admin,
    /// A customer acting on their own bookings.
    Customer,
}

/// An authenticated actor with an associated role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedActor {
    /// The actor's user identifier.
    pub id: i64,
    /// The role assigned to this actor.
    pub role: Role,
}

impl AuthenticatedActor {
    /// Creates a new authenticated actor.
    #[must_use]
    pub const fn new(id: i64, role: Role) -> Self {
        Self { id, role }
    }

    /// Requires the admin role.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] if the actor is not an
    /// admin.
    pub fn require_admin(&self, action: &str) -> Result<(), ApiError> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(ApiError::Unauthorized {
                action: action.to_string(),
            })
        }
    }

    /// Requires the actor to own the resource, or to be an admin.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] if the actor is a customer
    /// other than the owner.
    pub fn require_owner(&self, owner_id: i64, action: &str) -> Result<(), ApiError> {
        match self.role {
            Role::Admin => Ok(()),
            Role::Customer if self.id == owner_id => Ok(()),
            Role::Customer => Err(ApiError::Unauthorized {
                action: action.to_string(),
            }),
        }
    }
}
