//! Shared site constants

/// API client defaults.
pub mod api {
    pub const BASE_URL: &str = "http://localhost:3000/api";
    pub const TIMEOUT_MS: u64 = 10_000;
    pub const RETRY_ATTEMPTS: u32 = 3;
    pub const CACHE_DURATION_MS: u64 = 5 * 60 * 1000;
}

pub mod pagination {
    pub const DEFAULT_PAGE_SIZE: usize = 10;
    pub const MAX_PAGE_SIZE: usize = 50;
    pub const PAGE_SIZE_OPTIONS: [usize; 3] = [10, 25, 50];
}

pub mod upload {
    pub const MAX_FILE_SIZE_BYTES: u64 = 5 * 1024 * 1024;
    pub const ALLOWED_IMAGE_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/webp"];
    pub const ALLOWED_DOCUMENT_TYPES: [&str; 3] = [
        "application/pdf",
        "application/msword",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ];
}

/// Share intent endpoints for the supported platforms.
pub mod social {
    pub const TWITTER_SHARE_URL: &str = "https://twitter.com/intent/tweet";
    pub const FACEBOOK_SHARE_URL: &str = "https://www.facebook.com/sharer/sharer.php";
    pub const LINKEDIN_SHARE_URL: &str = "https://www.linkedin.com/sharing/share-offsite";
}

/// User-facing message strings.
pub mod messages {
    pub const GENERAL_ERROR: &str = "An error occurred. Please try again later.";
    pub const NETWORK_ERROR: &str = "Network error. Please check your internet connection.";

    pub const INVALID_CREDENTIALS: &str = "Invalid email or password";
    pub const SESSION_EXPIRED: &str = "Your session has expired. Please sign in again.";
    pub const UNAUTHORIZED: &str = "You are not authorized to perform this action";

    pub const FILE_TOO_LARGE: &str = "File size must be less than 5MB";
    pub const INVALID_FILE_TYPE: &str = "Invalid file type";

    pub const LOGIN_SUCCESS: &str = "Successfully signed in";
    pub const LOGOUT_SUCCESS: &str = "Successfully signed out";
    pub const REGISTER_SUCCESS: &str = "Account created successfully";
    pub const SAVE_SUCCESS: &str = "Changes saved successfully";
    pub const SUBMIT_SUCCESS: &str = "Form submitted successfully";
    pub const DELETE_SUCCESS: &str = "Item deleted successfully";
    pub const UPLOAD_SUCCESS: &str = "File uploaded successfully";
}

/// Switches for optional site behavior; everything ships enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Features {
    pub dark_mode: bool,
    pub comments: bool,
    pub notifications: bool,
    pub analytics: bool,
    pub file_upload: bool,
    pub social_share: bool,
    pub infinite_scroll: bool,
}

impl Default for Features {
    fn default() -> Self {
        Self {
            dark_mode: true,
            comments: true,
            notifications: true,
            analytics: true,
            file_upload: true,
            social_share: true,
            infinite_scroll: true,
        }
    }
}
