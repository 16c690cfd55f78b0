pub mod repo;
pub mod repo_types;
pub mod services;

/// Action labels written to the audit log.
pub mod actions {
    pub const USER_REGISTERED: &str = "user_registered";
    pub const USER_LOGIN: &str = "user_login";
    pub const USER_LOGOUT: &str = "user_logout";
    pub const PASSWORD_RESET_REQUESTED: &str = "password_reset_requested";
    pub const PROFILE_UPDATED: &str = "profile_updated";
    pub const ADMIN_USER_UPDATED: &str = "admin_user_updated";
    pub const ADMIN_USER_DELETED: &str = "admin_user_deleted";
    pub const ADMIN_SETTINGS_UPDATED: &str = "admin_settings_updated";
}
