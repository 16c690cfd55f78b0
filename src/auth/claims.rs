use serde::{Deserialize, Serialize};

use crate::users::repo_types::{MembershipTier, Role, User};

/// JWT payload used for authentication.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: i64,                        // user ID
    pub email: String,                   // email at issuance
    pub role: Role,                      // role at issuance
    pub membership_tier: MembershipTier, // tier at issuance
    pub iat: i64,                        // issued at (unix timestamp)
    pub exp: i64,                        // expires at (unix timestamp)
    pub iss: String,                     // issuer
    pub aud: String,                     // audience
}

impl Claims {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Identity a token is minted for.
#[derive(Debug, Clone, Copy)]
pub struct TokenSubject<'a> {
    pub id: i64,
    pub email: &'a str,
    pub role: Role,
    pub membership_tier: MembershipTier,
}

impl<'a> From<&'a User> for TokenSubject<'a> {
    fn from(user: &'a User) -> Self {
        Self {
            id: user.id,
            email: &user.email,
            role: user.role,
            membership_tier: user.membership_tier,
        }
    }
}
