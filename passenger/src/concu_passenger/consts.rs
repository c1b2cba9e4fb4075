/// Requests sent before giving up, counting re-requests after a cancel or expiry
pub const MAX_REQUEST_ATTEMPTS: u32 = 3;
