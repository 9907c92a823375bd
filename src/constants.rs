pub const ENV_SERVERS_FILE: &str = "GDGATE_SERVERS_FILE";
pub const ENV_REQUEST_TIMEOUT: &str = "GDGATE_REQUEST_TIMEOUT";

// Rate-limit key for requests issued from the local command line.
pub const LOCAL_CLIENT_KEY: &str = "local";
