pub type UserId = i64; // Alias for the id the host and backend share for a user
